//! [`Installment`]-related definitions.

use common::{Date, Money};
use juniper::{GraphQLInputObject, GraphQLObject};
use service::domain::{
    self,
    schedule::{GenerationError, ValidationError},
};

use crate::{AsError, Error};

/// A single dated payment of a `RentAgreement`.
#[derive(Clone, Debug, GraphQLObject)]
pub struct Installment {
    /// 1-based position of this `Installment` in its schedule.
    pub number: i32,

    /// `Date` the `RentAgreement` period starts at.
    pub start_date: Date,

    /// `Date` this `Installment` is due at.
    pub due_date: Date,

    /// `Date` the period covered by this `Installment` ends at.
    pub end_date: Date,

    /// Amount to be paid.
    pub amount: Money,
}

impl From<domain::Installment> for Installment {
    fn from(installment: domain::Installment) -> Self {
        let domain::Installment {
            number,
            start_date,
            due_date,
            end_date,
            amount,
        } = installment;

        Self {
            number: u16::from(number).into(),
            start_date: start_date.coerce(),
            due_date: due_date.coerce(),
            end_date: end_date.coerce(),
            amount,
        }
    }
}

/// Hand-edited `Installment` replacing a generated one.
///
/// `Installment`s are numbered in the order they are provided.
#[derive(Clone, Copy, Debug, GraphQLInputObject)]
#[graphql(name = "InstallmentInput")]
pub struct Input {
    /// `Date` the `Installment` is due at.
    pub due_date: Date,

    /// Amount to be paid.
    pub amount: Money,
}

impl From<Input> for domain::installment::Draft {
    fn from(Input { due_date, amount }: Input) -> Self {
        Self {
            due_date: due_date.coerce(),
            amount,
        }
    }
}

/// Converts the provided [`Input`]s into [`domain::installment::Draft`]s.
pub(crate) fn drafts(
    inputs: impl IntoIterator<Item = Input>,
) -> Vec<domain::installment::Draft> {
    inputs.into_iter().map(Into::into).collect()
}

impl AsError for GenerationError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::NonPositiveAmount(_) => {
                Error::bad_request("SCHEDULE_ROUNDING", self)
            }
            Self::AmountOutOfRange
            | Self::DateOutOfRange
            | Self::TooManyInstallments(_) => {
                Error::bad_request("INVALID_TERMS", self)
            }
        })
    }
}

impl AsError for ValidationError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::TotalMismatch { expected } => Error::bad_request(
                "INSTALLMENT_TOTAL_MISMATCH",
                &format!("{self}, expected {expected}"),
            ),
            Self::Empty
            | Self::TooManyInstallments
            | Self::NonPositiveAmount(_)
            | Self::CurrencyMismatch(_)
            | Self::UnorderedDueDates(_)
            | Self::DueDateOutOfRange(_) => {
                Error::bad_request("INVALID_INSTALLMENTS", self)
            }
        })
    }
}
