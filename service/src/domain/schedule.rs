//! Installment schedule of a [`RentAgreement`].
//!
//! The schedule is computed from the agreement [`Terms`] only:
//! - [`installment_count()`] partitions the agreement period by its
//!   [`CollectionPeriod`];
//! - [`allocate()`] spreads the discounted total over the installments,
//!   rounding every non-final amount to a [`RoundingUnit`] and leaving the
//!   remainder to the final one;
//! - [`validate()`] checks installments submitted by a caller against the
//!   same [`Terms`].
//!
//! [`CollectionPeriod`]: crate::domain::rent_agreement::CollectionPeriod

use common::Money;
use derive_more::{Display, Error};
use rust_decimal::{Decimal, RoundingStrategy};

#[cfg(doc)]
use crate::domain::RentAgreement;
use crate::domain::{
    installment::{self, Draft, Installment},
    rent_agreement::Terms,
};

/// Unit every non-final installment amount is rounded to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RoundingUnit(Decimal);

impl RoundingUnit {
    /// Default [`RoundingUnit`] of `50` currency units.
    pub const DEFAULT: Self = Self(Decimal::from_parts(50, 0, 0, false, 0));

    /// Creates a new [`RoundingUnit`] if the provided `unit` is positive.
    #[must_use]
    pub fn new(unit: Decimal) -> Option<Self> {
        (unit > Decimal::ZERO).then_some(Self(unit))
    }

    /// Returns the amount of this [`RoundingUnit`].
    #[must_use]
    pub const fn get(self) -> Decimal {
        self.0
    }

    /// Rounds the provided `amount` to the nearest multiple of this
    /// [`RoundingUnit`], halves rounded up.
    ///
    /// [`None`] is returned if the amount of units overflows a [`Decimal`].
    #[must_use]
    pub fn round(self, amount: Decimal) -> Option<Decimal> {
        amount
            .checked_div(self.0)?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .checked_mul(self.0)
    }
}

impl Default for RoundingUnit {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Returns the number of installments the provided [`Terms`] are split into.
///
/// The agreement period is measured in whole calendar months between the
/// months of its start and end dates (days are ignored), and divided by the
/// collection period rounding up. A period within a single calendar month
/// still yields one installment.
#[must_use]
pub fn installment_count(terms: &Terms) -> u32 {
    let span = terms.start_date().months_until(&terms.end_date());
    let cadence = i32::from(terms.collection_period().months());
    u32::try_from((span + cadence - 1) / cadence)
        .unwrap_or_default()
        .max(1)
}

/// Spreads the provided `total` over `count` installments.
///
/// Every non-final amount is `total / count` rounded to the `unit`, while the
/// final one takes whatever remains, so the amounts always sum up to `total`
/// exactly. The final amount may become non-positive if rounding overshoots.
///
/// [`None`] is returned if the amounts don't fit into a [`Decimal`] in the
/// provided `unit`.
#[must_use]
pub fn allocate(
    total: Decimal,
    count: u32,
    unit: RoundingUnit,
) -> Option<Vec<Decimal>> {
    if count <= 1 {
        return Some(vec![total]);
    }

    let share = unit.round(total.checked_div(Decimal::from(count))?)?;
    let mut remaining = total;
    let mut amounts = Vec::with_capacity(count as usize);
    for _ in 1..count {
        amounts.push(share);
        remaining = remaining.checked_sub(share)?;
    }
    amounts.push(remaining);
    Some(amounts)
}

/// Generates the [`Installment`]s of the provided [`Terms`].
///
/// The `i`-th installment is due `i` collection periods after the start date
/// and covers one collection period.
///
/// # Errors
///
/// - If rounding leaves a non-positive amount for any installment.
/// - If amounts overflow in the provided [`RoundingUnit`].
/// - If a date falls out of the supported range.
pub fn generate(
    terms: &Terms,
    unit: RoundingUnit,
) -> Result<Vec<Installment>, GenerationError> {
    use GenerationError as E;

    let total = terms.discounted_total();
    let count = installment_count(terms);
    let amounts =
        allocate(total.amount, count, unit).ok_or(E::AmountOutOfRange)?;
    if let Some(amount) = amounts.iter().find(|a| **a <= Decimal::ZERO) {
        return Err(E::NonPositiveAmount(Money {
            amount: *amount,
            currency: total.currency,
        }));
    }

    let cadence = u32::from(terms.collection_period().months());
    amounts
        .into_iter()
        .zip(0..count)
        .map(|(amount, i)| {
            let number = u16::try_from(i + 1)
                .map_err(|_| E::TooManyInstallments(count))?;
            let due_date = terms
                .start_date()
                .checked_add_months(i * cadence)
                .ok_or(E::DateOutOfRange)?
                .coerce();
            Ok(Installment {
                number: number.into(),
                start_date: terms.start_date(),
                due_date,
                end_date: end_date(due_date, terms)
                    .ok_or(E::DateOutOfRange)?,
                amount: Money {
                    amount,
                    currency: total.currency,
                },
            })
        })
        .collect()
}

/// Checks whether the provided `installments` sum up exactly to the
/// `total_price` with the `discount` subtracted.
///
/// Installments in a currency other than the `total_price` one never
/// reconcile.
#[must_use]
pub fn reconciles(
    total_price: Money,
    discount: Option<Money>,
    installments: &[Installment],
) -> bool {
    let Some(expected) =
        discount.map_or(Some(total_price), |d| total_price.checked_sub(d))
    else {
        return false;
    };

    installments
        .iter()
        .try_fold(Money::zero(expected.currency), |sum, i| {
            sum.checked_add(i.amount)
        })
        .is_some_and(|sum| sum == expected)
}

/// Validates the provided `installments` against the [`Terms`] they're
/// submitted for.
///
/// # Errors
///
/// - If there are no `installments`.
/// - If any amount is not positive or is in a foreign currency.
/// - If due dates are not strictly increasing.
/// - If amounts don't sum up to the discounted total exactly.
pub fn validate(
    terms: &Terms,
    installments: &[Installment],
) -> Result<(), ValidationError> {
    use ValidationError as E;

    if installments.is_empty() {
        return Err(E::Empty);
    }

    let currency = terms.total_price().currency;
    for i in installments {
        if i.amount.currency != currency {
            return Err(E::CurrencyMismatch(i.number));
        }
        if i.amount.amount <= Decimal::ZERO {
            return Err(E::NonPositiveAmount(i.number));
        }
    }
    if let Some(w) = installments
        .windows(2)
        .find(|w| w[1].due_date <= w[0].due_date)
    {
        return Err(E::UnorderedDueDates(w[1].number));
    }

    if !reconciles(terms.total_price(), terms.discount(), installments) {
        return Err(E::TotalMismatch {
            expected: terms.discounted_total(),
        });
    }
    Ok(())
}

/// Builds [`Installment`]s out of the provided caller-edited [`Draft`]s and
/// [`validate()`]s them against the [`Terms`].
///
/// # Errors
///
/// If the resulting [`Installment`]s are not valid.
pub fn from_drafts(
    terms: &Terms,
    drafts: Vec<Draft>,
) -> Result<Vec<Installment>, ValidationError> {
    use ValidationError as E;

    let installments = drafts
        .into_iter()
        .enumerate()
        .map(|(i, Draft { due_date, amount })| {
            let number = u16::try_from(i + 1)
                .map_err(|_| E::TooManyInstallments)?
                .into();
            Ok(Installment {
                number,
                start_date: terms.start_date(),
                due_date,
                end_date: end_date(due_date, terms)
                    .ok_or(E::DueDateOutOfRange(number))?,
                amount,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    validate(terms, &installments)?;
    Ok(installments)
}

/// Returns the end of the period covered by an installment due at the
/// provided `due_date`.
fn end_date(
    due_date: installment::DueDate,
    terms: &Terms,
) -> Option<installment::EndDate> {
    due_date
        .checked_add_months(terms.collection_period().months().into())
        .map(|d| d.coerce())
}

/// Error of [`generate()`]ing [`Installment`]s.
#[derive(Clone, Copy, Debug, Display, Eq, Error, PartialEq)]
pub enum GenerationError {
    /// Rounding produced a non-positive installment amount.
    #[display(
        "rounding produces an installment of {_0}, adjust the terms or edit \
         installments manually"
    )]
    NonPositiveAmount(#[error(not(source))] Money),

    /// Installment amounts overflow in the configured [`RoundingUnit`].
    #[display("installment amounts are out of range")]
    AmountOutOfRange,

    /// Installment dates are out of the supported range.
    #[display("installment dates are out of range")]
    DateOutOfRange,

    /// Too many installments to number.
    #[display("too many installments: {_0}")]
    TooManyInstallments(#[error(not(source))] u32),
}

/// Error of [`validate()`]ing [`Installment`]s.
#[derive(Clone, Copy, Debug, Display, Eq, Error, PartialEq)]
pub enum ValidationError {
    /// No installments were provided.
    #[display("at least one installment is required")]
    Empty,

    /// Too many installments to number.
    #[display("too many installments")]
    TooManyInstallments,

    /// Installment amount is zero or negative.
    #[display("installment #{_0} amount must be positive")]
    NonPositiveAmount(#[error(not(source))] installment::Number),

    /// Installment amount is in a currency other than the price one.
    #[display("installment #{_0} currency must match price currency")]
    CurrencyMismatch(#[error(not(source))] installment::Number),

    /// Installment is not due strictly after the previous one.
    #[display("installment #{_0} must be due after the previous one")]
    UnorderedDueDates(#[error(not(source))] installment::Number),

    /// Installment period end is out of the supported range.
    #[display("installment #{_0} due date is out of range")]
    DueDateOutOfRange(#[error(not(source))] installment::Number),

    /// Installment amounts don't sum up to the discounted total.
    #[display("installment total does not match contract total")]
    TotalMismatch {
        /// Discounted total the amounts must sum up to.
        #[error(not(source))]
        expected: Money,
    },
}

#[cfg(test)]
mod spec {
    use common::{money::Currency, Date, Money};
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    use crate::domain::{
        installment::Draft,
        rent_agreement::{CollectionPeriod, Terms},
    };

    use super::{
        allocate, from_drafts, generate, installment_count, reconciles,
        validate, GenerationError, RoundingUnit, ValidationError,
    };

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn aed(amount: &str) -> Money {
        Money {
            amount: dec(amount),
            currency: Currency::Aed,
        }
    }

    fn date(s: &str) -> Date {
        s.parse().unwrap()
    }

    fn terms(
        start: &str,
        end: &str,
        price: &str,
        discount: Option<&str>,
        period: CollectionPeriod,
    ) -> Terms {
        Terms::new(
            date(start).coerce(),
            date(end).coerce(),
            aed(price),
            discount.map(aed),
            period,
        )
        .unwrap()
    }

    #[test]
    fn quarterly_year_splits_evenly() {
        let t = terms(
            "2024-01-01",
            "2025-01-01",
            "12000",
            None,
            CollectionPeriod::ThreeMonths,
        );

        let installments = generate(&t, RoundingUnit::DEFAULT).unwrap();

        assert_eq!(
            installments
                .iter()
                .map(|i| (
                    u16::from(i.number),
                    i.due_date.to_string(),
                    i.end_date.to_string(),
                    i.amount,
                ))
                .collect::<Vec<_>>(),
            vec![
                (1, "2024-01-01".into(), "2024-04-01".into(), aed("3000")),
                (2, "2024-04-01".into(), "2024-07-01".into(), aed("3000")),
                (3, "2024-07-01".into(), "2024-10-01".into(), aed("3000")),
                (4, "2024-10-01".into(), "2025-01-01".into(), aed("3000")),
            ],
        );
        assert!(installments.iter().all(|i| i.start_date == t.start_date()));
    }

    #[test]
    fn yearly_with_discount_is_single_installment() {
        let t = terms(
            "2024-01-01",
            "2025-01-01",
            "10000",
            Some("500"),
            CollectionPeriod::OneYear,
        );

        let installments = generate(&t, RoundingUnit::DEFAULT).unwrap();

        assert_eq!(installments.len(), 1);
        assert_eq!(installments[0].amount, aed("9500"));
        assert_eq!(installments[0].due_date.to_string(), "2024-01-01");
    }

    #[test]
    fn final_installment_takes_remainder() {
        let t = terms(
            "2024-01-01",
            "2024-07-01",
            "7777",
            None,
            CollectionPeriod::TwoMonths,
        );

        let amounts = generate(&t, RoundingUnit::DEFAULT)
            .unwrap()
            .into_iter()
            .map(|i| i.amount)
            .collect::<Vec<_>>();

        assert_eq!(amounts, vec![aed("2600"), aed("2600"), aed("2577")]);
    }

    #[test]
    fn mismatching_sum_does_not_reconcile() {
        let mut installments = generate(
            &terms(
                "2024-01-01",
                "2025-01-01",
                "12000",
                None,
                CollectionPeriod::ThreeMonths,
            ),
            RoundingUnit::DEFAULT,
        )
        .unwrap();
        installments[3].amount = aed("2950");

        assert!(!reconciles(aed("12000"), Some(aed("0")), &installments));
        assert!(!reconciles(aed("12000"), None, &installments));

        installments[3].amount = aed("3000.00");
        assert!(reconciles(aed("12000"), Some(aed("0")), &installments));
    }

    #[test]
    fn foreign_currency_never_reconciles() {
        let mut installments = generate(
            &terms(
                "2024-01-01",
                "2025-01-01",
                "12000",
                None,
                CollectionPeriod::SixMonths,
            ),
            RoundingUnit::DEFAULT,
        )
        .unwrap();
        installments[0].amount.currency = Currency::Usd;

        assert!(!reconciles(aed("12000"), None, &installments));
        assert!(!reconciles(
            aed("12000"),
            Some(Money {
                amount: Decimal::ZERO,
                currency: Currency::Usd,
            }),
            &installments,
        ));
    }

    #[test]
    fn counts_installments_by_calendar_months() {
        let count = |start, end, period| {
            installment_count(&terms(start, end, "100", None, period))
        };

        assert_eq!(
            count("2024-01-15", "2024-01-20", CollectionPeriod::TwoMonths),
            1,
        );
        assert_eq!(
            count("2024-01-31", "2024-02-01", CollectionPeriod::TwoMonths),
            1,
        );
        assert_eq!(
            count("2024-01-01", "2024-07-01", CollectionPeriod::FourMonths),
            2,
        );
        assert_eq!(
            count("2024-01-01", "2025-01-01", CollectionPeriod::TwoMonths),
            6,
        );
        assert_eq!(
            count("2024-01-20", "2026-01-05", CollectionPeriod::OneYear),
            2,
        );
    }

    #[test]
    fn clamps_due_dates_to_month_end() {
        let t = terms(
            "2024-01-31",
            "2024-07-31",
            "6000",
            None,
            CollectionPeriod::TwoMonths,
        );

        let dates = generate(&t, RoundingUnit::DEFAULT)
            .unwrap()
            .into_iter()
            .map(|i| (i.due_date.to_string(), i.end_date.to_string()))
            .collect::<Vec<_>>();

        assert_eq!(
            dates,
            vec![
                ("2024-01-31".into(), "2024-03-31".into()),
                ("2024-03-31".into(), "2024-05-31".into()),
                ("2024-05-31".into(), "2024-07-31".into()),
            ],
        );
    }

    #[test]
    fn rounds_to_configured_unit() {
        let unit = RoundingUnit::new(dec("100")).unwrap();

        assert_eq!(
            allocate(dec("1000"), 3, unit),
            Some(vec![dec("300"), dec("300"), dec("400")]),
        );
        assert_eq!(
            allocate(dec("1000"), 3, RoundingUnit::new(dec("0.01")).unwrap()),
            Some(vec![dec("333.33"), dec("333.33"), dec("333.34")]),
        );
        assert_eq!(
            allocate(dec("999.99"), 1, unit),
            Some(vec![dec("999.99")]),
        );
        assert_eq!(
            allocate(dec("250"), 2, unit),
            Some(vec![dec("100"), dec("150")]),
        );

        assert!(RoundingUnit::new(Decimal::ZERO).is_none());
        assert!(RoundingUnit::new(dec("-50")).is_none());
        assert_eq!(RoundingUnit::default().get(), dec("50"));
    }

    #[test]
    fn rounds_halves_up() {
        let unit = RoundingUnit::DEFAULT;

        assert_eq!(unit.round(dec("25")), Some(dec("50")));
        assert_eq!(unit.round(dec("74.99")), Some(dec("50")));
        assert_eq!(unit.round(dec("75")), Some(dec("100")));
    }

    #[test]
    fn rejects_amounts_overflowing_fine_unit() {
        let t = terms(
            "2024-01-01",
            "2025-01-01",
            "70000000000000000000000000000",
            None,
            CollectionPeriod::TwoMonths,
        );
        let cent = RoundingUnit::new(dec("0.01")).unwrap();

        assert_eq!(cent.round(Decimal::MAX), None);
        assert_eq!(generate(&t, cent), Err(GenerationError::AmountOutOfRange));
        assert_eq!(generate(&t, RoundingUnit::DEFAULT).unwrap().len(), 6);
    }

    #[test]
    fn rejects_non_positive_rounded_amounts() {
        let bimonthly = |price| {
            terms(
                "2024-01-01",
                "2025-01-01",
                price,
                None,
                CollectionPeriod::TwoMonths,
            )
        };

        assert_eq!(
            generate(&bimonthly("170"), RoundingUnit::DEFAULT),
            Err(GenerationError::NonPositiveAmount(aed("-80"))),
        );
        assert_eq!(
            generate(&bimonthly("90"), RoundingUnit::DEFAULT),
            Err(GenerationError::NonPositiveAmount(aed("0"))),
        );
        assert!(generate(&bimonthly("300"), RoundingUnit::DEFAULT).is_ok());
    }

    #[test]
    fn amounts_always_reconcile() {
        let periods = [
            CollectionPeriod::TwoMonths,
            CollectionPeriod::ThreeMonths,
            CollectionPeriod::FourMonths,
            CollectionPeriod::SixMonths,
            CollectionPeriod::OneYear,
        ];
        let ends = ["2024-02-10", "2024-08-31", "2025-01-01", "2026-12-15"];
        let prices = ["999.99", "7777", "12000", "150000.5"];

        for period in periods {
            for end in ends {
                for price in prices {
                    let t = terms("2024-01-10", end, price, Some("1"), period);
                    let Ok(installments) = generate(&t, RoundingUnit::DEFAULT)
                    else {
                        continue;
                    };

                    assert!(reconciles(
                        t.total_price(),
                        t.discount(),
                        &installments,
                    ));
                    assert_eq!(validate(&t, &installments), Ok(()));
                    for w in installments.windows(2) {
                        assert!(w[0].due_date < w[1].due_date);
                        assert_eq!(
                            w[0].amount.amount % dec("50"),
                            Decimal::ZERO,
                        );
                    }
                    assert_eq!(
                        generate(&t, RoundingUnit::DEFAULT),
                        Ok(installments),
                    );
                }
            }
        }
    }

    #[test]
    fn validates_drafts() {
        let t = terms(
            "2024-01-01",
            "2025-01-01",
            "12000",
            None,
            CollectionPeriod::SixMonths,
        );
        let draft = |due: &str, amount: &str| Draft {
            due_date: date(due).coerce(),
            amount: aed(amount),
        };

        let installments = from_drafts(
            &t,
            vec![draft("2024-01-01", "5000"), draft("2024-07-01", "7000")],
        )
        .unwrap();
        assert_eq!(installments[1].end_date.to_string(), "2025-01-01");
        assert_eq!(u16::from(installments[1].number), 2);

        assert_eq!(from_drafts(&t, vec![]), Err(ValidationError::Empty));
        assert_eq!(
            from_drafts(
                &t,
                vec![draft("2024-01-01", "5000"), draft("2024-07-01", "6950")],
            ),
            Err(ValidationError::TotalMismatch {
                expected: aed("12000"),
            }),
        );
        assert_eq!(
            from_drafts(
                &t,
                vec![draft("2024-01-01", "12500"), draft("2024-07-01", "-500")],
            ),
            Err(ValidationError::NonPositiveAmount(2.into())),
        );
        assert_eq!(
            from_drafts(
                &t,
                vec![draft("2024-07-01", "5000"), draft("2024-01-01", "7000")],
            ),
            Err(ValidationError::UnorderedDueDates(2.into())),
        );
        assert_eq!(
            ValidationError::TotalMismatch {
                expected: aed("12000"),
            }
            .to_string(),
            "installment total does not match contract total",
        );
    }
}
