//! [`Query`] collection related to a single [`RentAgreement`].

use common::operations::By;

use crate::domain::{rent_agreement, RentAgreement};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`RentAgreement`] by its [`rent_agreement::Id`].
pub type ById = DatabaseQuery<By<Option<RentAgreement>, rent_agreement::Id>>;
