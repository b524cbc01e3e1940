//! [`RentAgreement`]-related definitions.

use common::{Date, DateTime, Handler as _, Money};
use derive_more::{Display, From, Into};
use futures::TryFutureExt as _;
use juniper::{graphql_object, GraphQLEnum, GraphQLScalar};
use service::{domain, query};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{api, AsError, Context, Error};

/// A rent agreement.
#[derive(Clone, Debug)]
pub struct RentAgreement {
    /// Underlying [`domain::RentAgreement`].
    agreement: domain::RentAgreement,

    /// [`api::Installment`]s of this [`RentAgreement`].
    installments: OnceCell<Vec<api::Installment>>,
}

impl From<domain::RentAgreement> for RentAgreement {
    fn from(agreement: domain::RentAgreement) -> Self {
        Self {
            agreement,
            installments: OnceCell::new(),
        }
    }
}

impl From<(domain::RentAgreement, domain::Installments)> for RentAgreement {
    fn from(
        (agreement, installments): (
            domain::RentAgreement,
            domain::Installments,
        ),
    ) -> Self {
        Self {
            agreement,
            installments: OnceCell::new_with(Some(
                installments.items.into_iter().map(Into::into).collect(),
            )),
        }
    }
}

/// A rent agreement.
#[graphql_object(context = Context)]
impl RentAgreement {
    /// Unique identifier of this `RentAgreement`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "RentAgreement.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.agreement.id.into()
    }

    /// ID of the property the rented unit belongs to.
    pub fn property_id(&self) -> api::property::Id {
        self.agreement.property_id.into()
    }

    /// ID of the rented unit.
    pub fn unit_id(&self) -> api::unit::Id {
        self.agreement.unit_id.into()
    }

    /// ID of the renter.
    pub fn renter_id(&self) -> api::renter::Id {
        self.agreement.renter_id.into()
    }

    /// `Date` the rent period starts at.
    pub fn start_date(&self) -> Date {
        self.agreement.terms.start_date().coerce()
    }

    /// `Date` the rent period ends at.
    pub fn end_date(&self) -> Date {
        self.agreement.terms.end_date().coerce()
    }

    /// Price of the whole rent period.
    pub fn total_price(&self) -> Money {
        self.agreement.terms.total_price()
    }

    /// Discount subtracted from the `totalPrice`, if any.
    pub fn discount(&self) -> Option<Money> {
        self.agreement.terms.discount()
    }

    /// Price of the whole rent period with the `discount` subtracted.
    ///
    /// `Installment` amounts always sum up to it.
    pub fn discounted_total(&self) -> Money {
        self.agreement.terms.discounted_total()
    }

    /// How often `Installment`s are collected.
    pub fn collection_period(&self) -> CollectionPeriod {
        self.agreement.terms.collection_period().into()
    }

    /// Current status of this `RentAgreement`.
    pub fn status(&self) -> Status {
        self.agreement.status_at(Date::today()).into()
    }

    /// `DateTime` when this `RentAgreement` was created.
    pub fn created_at(&self) -> DateTime {
        self.agreement.created_at.coerce()
    }

    /// `DateTime` when this `RentAgreement` was renewed last time.
    pub fn renewed_at(&self) -> Option<DateTime> {
        self.agreement.renewed_at.map(|at| at.coerce())
    }

    /// `DateTime` when this `RentAgreement` was canceled.
    pub fn canceled_at(&self) -> Option<DateTime> {
        self.agreement.canceled_at.map(|at| at.coerce())
    }

    /// `Installment`s of this `RentAgreement`, ordered by their number.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "RentAgreement.installments",
            id = %self.agreement.id,
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn installments(
        &self,
        ctx: &Context,
    ) -> Result<Vec<api::Installment>, Error> {
        let id = self.agreement.id;
        self.installments
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::installments::ByRentAgreement::by(id))
                    .map_ok(|i| i.items.into_iter().map(Into::into).collect())
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
            })
            .await
            .cloned()
    }
}

/// Unique identifier of a `RentAgreement`.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::rent_agreement::Id)]
#[into(domain::rent_agreement::Id)]
#[graphql(name = "RentAgreementId", transparent)]
pub struct Id(Uuid);

/// Period between two consecutive `Installment`s of a `RentAgreement`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "CollectionPeriod")]
pub enum CollectionPeriod {
    /// Every two months.
    TwoMonths,

    /// Every three months.
    ThreeMonths,

    /// Every four months.
    FourMonths,

    /// Every six months.
    SixMonths,

    /// Once a year.
    OneYear,
}

impl From<domain::rent_agreement::CollectionPeriod> for CollectionPeriod {
    fn from(period: domain::rent_agreement::CollectionPeriod) -> Self {
        use domain::rent_agreement::CollectionPeriod as P;
        match period {
            P::TwoMonths => Self::TwoMonths,
            P::ThreeMonths => Self::ThreeMonths,
            P::FourMonths => Self::FourMonths,
            P::SixMonths => Self::SixMonths,
            P::OneYear => Self::OneYear,
        }
    }
}

impl From<CollectionPeriod> for domain::rent_agreement::CollectionPeriod {
    fn from(period: CollectionPeriod) -> Self {
        use CollectionPeriod as P;
        match period {
            P::TwoMonths => Self::TwoMonths,
            P::ThreeMonths => Self::ThreeMonths,
            P::FourMonths => Self::FourMonths,
            P::SixMonths => Self::SixMonths,
            P::OneYear => Self::OneYear,
        }
    }
}

/// Status of a `RentAgreement`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "RentAgreementStatus")]
pub enum Status {
    /// `RentAgreement` is in force.
    Active,

    /// `RentAgreement` was canceled before its end date.
    Canceled,

    /// `RentAgreement` period has elapsed without a renewal.
    Expired,
}

impl From<domain::rent_agreement::Status> for Status {
    fn from(status: domain::rent_agreement::Status) -> Self {
        use domain::rent_agreement::Status as S;
        match status {
            S::Active => Self::Active,
            S::Canceled => Self::Canceled,
            S::Expired => Self::Expired,
        }
    }
}

/// Builds [`domain::rent_agreement::Terms`] out of the provided GraphQL
/// arguments.
///
/// # Errors
///
/// With `INVALID_TERMS` code if the provided values are inconsistent.
pub(crate) fn terms(
    start_date: Date,
    end_date: Date,
    total_price: Money,
    discount: Option<Money>,
    collection_period: CollectionPeriod,
) -> Result<domain::rent_agreement::Terms, Error> {
    domain::rent_agreement::Terms::new(
        start_date.coerce(),
        end_date.coerce(),
        total_price,
        discount,
        collection_period.into(),
    )
    .map_err(AsError::into_error)
}

impl AsError for domain::rent_agreement::TermsError {
    fn try_as_error(&self) -> Option<Error> {
        Some(Error::bad_request("INVALID_TERMS", self))
    }
}

#[cfg(test)]
mod spec {
    use common::{money::Currency, Date, Money};
    use service::domain::rent_agreement;

    use super::{terms, CollectionPeriod};

    fn aed(amount: i64) -> Money {
        Money {
            amount: amount.into(),
            currency: Currency::Aed,
        }
    }

    fn date(s: &str) -> Date {
        s.parse().unwrap()
    }

    #[test]
    fn builds_terms() {
        let terms = terms(
            date("2024-01-01"),
            date("2025-01-01"),
            aed(10_000),
            Some(aed(500)),
            CollectionPeriod::OneYear,
        )
        .unwrap();

        assert_eq!(terms.discounted_total(), aed(9_500));
        assert_eq!(
            terms.collection_period(),
            rent_agreement::CollectionPeriod::OneYear,
        );
    }

    #[test]
    fn rejects_inverted_range() {
        let err = terms(
            date("2025-01-01"),
            date("2024-01-01"),
            aed(10_000),
            None,
            CollectionPeriod::TwoMonths,
        )
        .unwrap_err();

        assert_eq!(err.code, "INVALID_TERMS");
        assert_eq!(err.status_code, http::StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "end date must be after start date");
    }
}
