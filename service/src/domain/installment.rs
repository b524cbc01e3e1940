//! [`Installment`] definitions.

use common::{unit as marker, DateOf, Money};
use derive_more::{Display, From, Into};

use crate::domain::rent_agreement;
#[cfg(doc)]
use crate::domain::RentAgreement;

/// Single dated payment of a [`RentAgreement`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Installment {
    /// 1-based position of this [`Installment`] in its [`Installments`].
    pub number: Number,

    /// Start date of the [`RentAgreement`] this [`Installment`] belongs to.
    pub start_date: rent_agreement::StartDate,

    /// Date this [`Installment`] is due at.
    pub due_date: DueDate,

    /// Date the period covered by this [`Installment`] ends at.
    pub end_date: EndDate,

    /// Amount to be paid.
    pub amount: Money,
}

/// Ordered [`Installment`]s of a single [`RentAgreement`].
///
/// Always replaced as a whole.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Installments {
    /// ID of the [`RentAgreement`] these [`Installments`] belong to.
    pub rent_agreement_id: rent_agreement::Id,

    /// [`Installment`]s ordered by their [`Number`].
    pub items: Vec<Installment>,
}

/// Caller-edited [`Installment`] submitted for validation.
///
/// The remaining [`Installment`] fields are derived from the
/// [`RentAgreement`] terms.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Draft {
    /// Date the [`Installment`] is due at.
    pub due_date: DueDate,

    /// Amount to be paid.
    pub amount: Money,
}

/// 1-based position of an [`Installment`].
#[derive(
    Clone,
    Copy,
    Debug,
    Display,
    Eq,
    From,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
)]
pub struct Number(u16);

/// Date an [`Installment`] is due at.
pub type DueDate = DateOf<(Installment, marker::Due)>;

/// Date the period covered by an [`Installment`] ends at.
pub type EndDate = DateOf<(Installment, marker::End)>;
