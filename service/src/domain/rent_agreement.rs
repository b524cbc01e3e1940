//! [`RentAgreement`] definitions.

use common::{
    define_kind, unit as marker, Date, DateOf, DateTime, DateTimeOf, Money,
};
use derive_more::{Display, Error, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{property, renter, unit};

/// Agreement renting a unit of a property to a renter for a fixed period.
#[derive(Clone, Debug)]
pub struct RentAgreement {
    /// ID of this [`RentAgreement`].
    pub id: Id,

    /// ID of the property the rented unit belongs to.
    pub property_id: property::Id,

    /// ID of the rented unit.
    pub unit_id: unit::Id,

    /// ID of the renter.
    pub renter_id: renter::Id,

    /// [`Terms`] this [`RentAgreement`] is currently bound by.
    pub terms: Terms,

    /// Stored [`Status`] of this [`RentAgreement`].
    ///
    /// Use [`RentAgreement::status_at()`] to account for an elapsed period.
    pub status: Status,

    /// [`DateTime`] when this [`RentAgreement`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`RentAgreement`] was renewed last time, if it
    /// was.
    pub renewed_at: Option<RenewalDateTime>,

    /// [`DateTime`] when this [`RentAgreement`] was canceled, if it was.
    pub canceled_at: Option<CancellationDateTime>,
}

impl RentAgreement {
    /// Returns the [`Status`] of this [`RentAgreement`] as of the provided
    /// `today`.
    ///
    /// An [`Status::Active`] agreement whose end date has already passed is
    /// considered [`Status::Expired`], even if it's not marked so yet.
    #[must_use]
    pub fn status_at(&self, today: Date) -> Status {
        match self.status {
            Status::Active if self.terms.end_date().coerce() < today => {
                Status::Expired
            }
            Status::Active | Status::Canceled | Status::Expired => self.status,
        }
    }

    /// Renews this [`RentAgreement`] with the provided [`Terms`], making it
    /// [`Status::Active`] again.
    ///
    /// # Errors
    ///
    /// If this [`RentAgreement`] is [`Status::Canceled`].
    pub fn renew(
        &mut self,
        terms: Terms,
        today: Date,
    ) -> Result<(), StatusError> {
        match self.status_at(today) {
            Status::Active | Status::Expired => {
                self.terms = terms;
                self.status = Status::Active;
                self.renewed_at = Some(DateTime::now().coerce());
                Ok(())
            }
            s @ Status::Canceled => Err(StatusError(s)),
        }
    }

    /// Cancels this [`RentAgreement`].
    ///
    /// # Errors
    ///
    /// If this [`RentAgreement`] is not [`Status::Active`].
    pub fn cancel(&mut self, today: Date) -> Result<(), StatusError> {
        match self.status_at(today) {
            Status::Active => {
                self.status = Status::Canceled;
                self.canceled_at = Some(DateTime::now().coerce());
                Ok(())
            }
            s @ (Status::Canceled | Status::Expired) => Err(StatusError(s)),
        }
    }
}

/// ID of a [`RentAgreement`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Terms of a [`RentAgreement`] its installments are scheduled from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Terms {
    /// [`Date`] the rent period starts at.
    start_date: StartDate,

    /// [`Date`] the rent period ends at.
    end_date: EndDate,

    /// Price of the whole rent period.
    total_price: Money,

    /// Discount subtracted from the [`Terms::total_price()`], if any.
    discount: Option<Money>,

    /// How often installments are collected.
    collection_period: CollectionPeriod,
}

impl Terms {
    /// Creates new [`Terms`] if the provided values are consistent.
    ///
    /// # Errors
    ///
    /// - If `end_date` is not after `start_date`.
    /// - If `discount` is negative or in a different currency.
    /// - If the discounted total is not positive.
    pub fn new(
        start_date: StartDate,
        end_date: EndDate,
        total_price: Money,
        discount: Option<Money>,
        collection_period: CollectionPeriod,
    ) -> Result<Self, TermsError> {
        use TermsError as E;

        if end_date.coerce::<()>() <= start_date.coerce() {
            return Err(E::InvalidDateRange);
        }
        if let Some(d) = discount {
            if d.currency != total_price.currency {
                return Err(E::CurrencyMismatch);
            }
            if d.amount < Decimal::ZERO {
                return Err(E::NegativeDiscount);
            }
        }

        let this = Self {
            start_date,
            end_date,
            total_price,
            discount,
            collection_period,
        };
        if this.discounted_total().amount <= Decimal::ZERO {
            return Err(E::NonPositiveTotal);
        }
        Ok(this)
    }

    /// Creates new [`Terms`] without checking their consistency.
    ///
    /// # Safety
    ///
    /// The caller must ensure the values satisfy [`Terms::new()`] checks.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub const unsafe fn new_unchecked(
        start_date: StartDate,
        end_date: EndDate,
        total_price: Money,
        discount: Option<Money>,
        collection_period: CollectionPeriod,
    ) -> Self {
        Self {
            start_date,
            end_date,
            total_price,
            discount,
            collection_period,
        }
    }

    /// Returns the [`Date`] the rent period starts at.
    #[must_use]
    pub const fn start_date(&self) -> StartDate {
        self.start_date
    }

    /// Returns the [`Date`] the rent period ends at.
    #[must_use]
    pub const fn end_date(&self) -> EndDate {
        self.end_date
    }

    /// Returns the price of the whole rent period.
    #[must_use]
    pub const fn total_price(&self) -> Money {
        self.total_price
    }

    /// Returns the discount, if any.
    #[must_use]
    pub const fn discount(&self) -> Option<Money> {
        self.discount
    }

    /// Returns how often installments are collected.
    #[must_use]
    pub const fn collection_period(&self) -> CollectionPeriod {
        self.collection_period
    }

    /// Returns the total price with the discount subtracted.
    #[must_use]
    pub fn discounted_total(&self) -> Money {
        let discount = self.discount.map_or(Decimal::ZERO, |d| d.amount);
        Money {
            amount: self.total_price.amount - discount,
            currency: self.total_price.currency,
        }
    }
}

/// Error of constructing [`Terms`].
#[derive(Clone, Copy, Debug, Display, Eq, Error, PartialEq)]
pub enum TermsError {
    /// End date is not after the start date.
    #[display("end date must be after start date")]
    InvalidDateRange,

    /// Discount is negative.
    #[display("discount must not be negative")]
    NegativeDiscount,

    /// Discount currency differs from the price currency.
    #[display("discount currency must match price currency")]
    CurrencyMismatch,

    /// Discount is not less than the total price.
    #[display("discounted total must be positive")]
    NonPositiveTotal,
}

define_kind! {
    #[doc = "Period between two consecutive installments of a \
             [`RentAgreement`]."]
    enum CollectionPeriod {
        #[doc = "Every two months."]
        TwoMonths = 1,

        #[doc = "Every three months."]
        ThreeMonths = 2,

        #[doc = "Every four months."]
        FourMonths = 3,

        #[doc = "Every six months."]
        SixMonths = 4,

        #[doc = "Once a year."]
        OneYear = 5,
    }
}

impl CollectionPeriod {
    /// Returns the number of calendar months in this [`CollectionPeriod`].
    #[must_use]
    pub const fn months(self) -> u8 {
        match self {
            Self::TwoMonths => 2,
            Self::ThreeMonths => 3,
            Self::FourMonths => 4,
            Self::SixMonths => 6,
            Self::OneYear => 12,
        }
    }
}

define_kind! {
    #[doc = "Status of a [`RentAgreement`]."]
    enum Status {
        #[doc = "[`RentAgreement`] is in force."]
        Active = 1,

        #[doc = "[`RentAgreement`] was canceled before its end date."]
        Canceled = 2,

        #[doc = "[`RentAgreement`] period has elapsed without a renewal."]
        Expired = 3,
    }
}

/// Error of a [`RentAgreement`] transition not allowed from its current
/// [`Status`].
#[derive(Clone, Copy, Debug, Display, Eq, Error, PartialEq)]
#[display("`RentAgreement` is {_0}")]
pub struct StatusError(#[error(not(source))] pub Status);

/// [`Date`] a [`RentAgreement`] period starts at.
pub type StartDate = DateOf<(RentAgreement, marker::Start)>;

/// [`Date`] a [`RentAgreement`] period ends at.
pub type EndDate = DateOf<(RentAgreement, marker::End)>;

/// [`DateTime`] when a [`RentAgreement`] was created.
pub type CreationDateTime = DateTimeOf<(RentAgreement, marker::Creation)>;

/// [`DateTime`] when a [`RentAgreement`] was renewed.
pub type RenewalDateTime = DateTimeOf<(RentAgreement, marker::Renewal)>;

/// [`DateTime`] when a [`RentAgreement`] was canceled.
pub type CancellationDateTime =
    DateTimeOf<(RentAgreement, marker::Cancellation)>;
