//! [`Query`] collection related to [`Installments`].

use common::operations::By;

#[cfg(doc)]
use crate::{domain::RentAgreement, Query};
use crate::domain::{rent_agreement, Installments};

use super::DatabaseQuery;

/// Queries [`Installments`] of a [`RentAgreement`], ordered by their number.
pub type ByRentAgreement =
    DatabaseQuery<By<Installments, rent_agreement::Id>>;
