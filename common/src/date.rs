//! Calendar date utilities.

#[cfg(feature = "postgres")]
use std::error::Error as StdError;
use std::{cmp::Ordering, fmt, hash, marker::PhantomData, str::FromStr};

use derive_more::Debug;
#[cfg(feature = "postgres")]
use postgres_types::{
    accepts, private::BytesMut, to_sql_checked, FromSql, IsNull, ToSql, Type,
};
use time::macros::format_description;

pub use time::error::Parse as ParseError;

/// Untyped calendar date.
pub type Date = DateOf;

/// Calendar date without a time-of-day and an offset.
#[derive(Debug)]
pub struct DateOf<Of: ?Sized = ()> {
    /// Inner representation of the date.
    inner: time::Date,

    /// Type parameter describing the kind of date.
    #[debug(skip)]
    _of: PhantomData<Of>,
}

impl<Of: ?Sized> DateOf<Of> {
    /// Creates a new [`Date`] from the provided calendar components.
    ///
    /// [`None`] is returned if the components don't form a valid date.
    #[must_use]
    pub fn from_calendar(year: i32, month: u8, day: u8) -> Option<Self> {
        let month = time::Month::try_from(month).ok()?;
        time::Date::from_calendar_date(year, month, day)
            .ok()
            .map(Self::wrap)
    }

    /// Returns the current [`Date`] in UTC.
    #[must_use]
    pub fn today() -> Self {
        Self::wrap(time::OffsetDateTime::now_utc().date())
    }

    /// Returns the year of this [`Date`].
    #[must_use]
    pub fn year(&self) -> i32 {
        self.inner.year()
    }

    /// Returns the month of this [`Date`] in `1..=12` range.
    #[must_use]
    pub fn month(&self) -> u8 {
        self.inner.month().into()
    }

    /// Returns the day of the month of this [`Date`].
    #[must_use]
    pub fn day(&self) -> u8 {
        self.inner.day()
    }

    /// Returns the number of whole calendar months between the month of this
    /// [`Date`] and the month of the `other` one.
    ///
    /// Days of month are ignored: both dates are truncated to the first day
    /// of their month before differencing. The result is negative if `other`
    /// lies in an earlier month.
    #[must_use]
    pub fn months_until<T: ?Sized>(&self, other: &DateOf<T>) -> i32 {
        (other.year() - self.year()) * 12 + i32::from(other.month())
            - i32::from(self.month())
    }

    /// Adds the provided number of calendar `months` to this [`Date`].
    ///
    /// The day of month is clamped to the last day of the resulting month,
    /// so `2024-01-31` plus one month is `2024-02-29`.
    ///
    /// [`None`] is returned if the result is out of the supported range.
    #[must_use]
    pub fn checked_add_months(self, months: u32) -> Option<Self> {
        let total = i64::from(self.year()) * 12
            + i64::from(self.month() - 1)
            + i64::from(months);
        let year = i32::try_from(total.div_euclid(12)).ok()?;
        let month = time::Month::try_from(
            u8::try_from(total.rem_euclid(12) + 1).ok()?,
        )
        .ok()?;
        let day = self.day().min(month.length(year));
        time::Date::from_calendar_date(year, month, day)
            .ok()
            .map(Self::wrap)
    }

    /// Parses a new [`Date`] from the provided `YYYY-MM-DD` string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid `YYYY-MM-DD` date.
    pub fn from_iso8601(input: &str) -> Result<Self, ParseError> {
        time::Date::parse(input, format_description!("[year]-[month]-[day]"))
            .map(Self::wrap)
    }

    /// Returns this [`Date`] as a `YYYY-MM-DD` string.
    #[expect(clippy::missing_panics_doc, reason = "infallible")]
    #[must_use]
    pub fn to_iso8601(&self) -> String {
        self.inner
            .format(format_description!("[year]-[month]-[day]"))
            .unwrap_or_else(|e| panic!("cannot format `Date`: {e}"))
    }

    /// Coerces one kind of [`Date`] into another.
    #[must_use]
    pub fn coerce<NewOf: ?Sized>(self) -> DateOf<NewOf> {
        DateOf::wrap(self.inner)
    }

    /// Wraps the provided [`time::Date`].
    fn wrap(inner: time::Date) -> Self {
        Self {
            inner,
            _of: PhantomData,
        }
    }
}

impl<Of: ?Sized> Copy for DateOf<Of> {}
impl<Of: ?Sized> Clone for DateOf<Of> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Of: ?Sized> Eq for DateOf<Of> {}
impl<Of: ?Sized> PartialEq for DateOf<Of> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<Of: ?Sized> hash::Hash for DateOf<Of> {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        self.inner.hash(state);
    }
}

impl<Of: ?Sized> Ord for DateOf<Of> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.cmp(&other.inner)
    }
}
impl<Of: ?Sized> PartialOrd for DateOf<Of> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<Of: ?Sized> fmt::Display for DateOf<Of> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

impl<Of: ?Sized> FromStr for DateOf<Of> {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_iso8601(s)
    }
}

impl<Of: ?Sized> From<time::Date> for DateOf<Of> {
    fn from(date: time::Date) -> Self {
        Self::wrap(date)
    }
}

impl<Of: ?Sized> From<DateOf<Of>> for time::Date {
    fn from(date: DateOf<Of>) -> Self {
        date.inner
    }
}

#[cfg(feature = "postgres")]
impl<Of: ?Sized> FromSql<'_> for DateOf<Of> {
    accepts!(DATE);

    fn from_sql(
        ty: &Type,
        raw: &[u8],
    ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        time::Date::from_sql(ty, raw).map(Self::wrap)
    }
}

#[cfg(feature = "postgres")]
impl<Of: ?Sized> ToSql for DateOf<Of> {
    accepts!(DATE);
    to_sql_checked!();

    fn to_sql(
        &self,
        ty: &Type,
        w: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        self.inner.to_sql(ty, w)
    }
}

#[cfg(feature = "juniper")]
mod juniper {
    //! Module providing integration with [`juniper`] crate.

    use juniper::{graphql_scalar, InputValue, ScalarValue, Value};

    /// Calendar date in `YYYY-MM-DD` format.
    #[graphql_scalar(with = Self, parse_token(String))]
    type Date = crate::Date;

    impl Date {
        fn to_output<S: ScalarValue>(d: &Date) -> Value<S> {
            Value::scalar(d.to_iso8601())
        }

        fn from_input<S: ScalarValue>(
            input: &InputValue<S>,
        ) -> Result<Self, String> {
            input
                .as_string_value()
                .ok_or_else(|| {
                    format!(
                        "Cannot parse `Date` input scalar from \
                         non-string value: {input}",
                    )
                })
                .and_then(|s| {
                    Self::from_iso8601(s).map_err(|e| {
                        format!("Cannot parse `Date` input scalar: {e}")
                    })
                })
        }
    }
}

#[cfg(test)]
mod spec {
    use super::Date;

    fn date(s: &str) -> Date {
        s.parse().unwrap()
    }

    #[test]
    fn parses_and_formats_iso8601() {
        let d = date("2024-03-09");
        assert_eq!((d.year(), d.month(), d.day()), (2024, 3, 9));
        assert_eq!(d.to_string(), "2024-03-09");

        assert!("2024-3-9".parse::<Date>().is_err());
        assert!("2024-02-30".parse::<Date>().is_err());
        assert!("09.03.2024".parse::<Date>().is_err());
    }

    #[test]
    fn counts_months_ignoring_days() {
        assert_eq!(date("2024-01-01").months_until(&date("2025-01-01")), 12);
        assert_eq!(date("2024-01-31").months_until(&date("2024-02-01")), 1);
        assert_eq!(date("2024-01-01").months_until(&date("2024-01-31")), 0);
        assert_eq!(date("2024-11-20").months_until(&date("2025-02-03")), 3);
        assert_eq!(date("2024-05-01").months_until(&date("2024-03-01")), -2);
    }

    #[test]
    fn adds_months_clamping_day() {
        let add = |s, m| date(s).checked_add_months(m).unwrap();

        assert_eq!(add("2024-01-15", 0), date("2024-01-15"));
        assert_eq!(add("2024-01-15", 3), date("2024-04-15"));
        assert_eq!(add("2024-11-15", 3), date("2025-02-15"));
        assert_eq!(add("2024-01-31", 1), date("2024-02-29"));
        assert_eq!(add("2023-01-31", 1), date("2023-02-28"));
        assert_eq!(add("2024-03-31", 6), date("2024-09-30"));
        assert_eq!(add("2024-01-31", 24), date("2026-01-31"));
    }

    #[test]
    fn builds_from_calendar() {
        assert_eq!(Date::from_calendar(2024, 2, 29), Some(date("2024-02-29")));
        assert!(Date::from_calendar(2023, 2, 29).is_none());
        assert!(Date::from_calendar(2024, 13, 1).is_none());
    }
}
