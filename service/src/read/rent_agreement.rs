//! [`RentAgreement`] read model definitions.

#[cfg(doc)]
use crate::domain::{rent_agreement::Status, RentAgreement};

/// Wrapper around a [`RentAgreement`] with [`Status::Active`] stored.
#[derive(Clone, Debug)]
pub struct Active<T>(pub T);

/// Wrapper around [`RentAgreement`]s whose period has elapsed while being
/// [`Status::Active`], so they're due to become [`Status::Expired`].
#[derive(Clone, Copy, Debug)]
pub struct Elapsed<T>(pub T);
