use crate::types::Decimal;
use serde::{Deserialize, Serialize};

// timestamp - Date/time/timezone moments of arbitrary precision
// Mostly ISO 8601
//
// Ion follows the “Unknown Local Offset Convention” of RFC3339:
// > If the time in UTC is known, but the offset to local time is unknown, this can be
// > represented with an offset of “-00:00”. This differs semantically from an offset of “Z” or
// > “+00:00”, which imply that UTC is the preferred reference point for the specified time.
//
// The binary encoding always carries an offset, and "-00:00" is encoded as a negative-zero
// VarInt. Here an unknown offset is `None`.
//
// Zero and negative dates are not valid, so the earliest instant in time that can be
// represented as a timestamp is Jan 01, 0001. As per the W3C note, leap seconds cannot be
// represented.

/// How far into the year…second sequence a timestamp goes. Fractional seconds are an optional
/// extension of `Second`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Precision {
    Year,
    Month,
    Day,
    Minute,
    Second,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Timestamp {
    precision: Precision,
    // Minutes difference from UTC. Option::None indicates an unknown local offset.
    offset: Option<i32>,
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
    fraction: Option<Decimal>,
}

impl Timestamp {
    pub fn year(year: u16) -> Self {
        Timestamp {
            precision: Precision::Year,
            offset: None,
            year,
            month: 1,
            day: 1,
            hour: 0,
            minute: 0,
            second: 0,
            fraction: None,
        }
    }

    pub fn month(year: u16, month: u8) -> Self {
        Timestamp {
            precision: Precision::Month,
            month,
            ..Timestamp::year(year)
        }
    }

    pub fn day(year: u16, month: u8, day: u8) -> Self {
        Timestamp {
            precision: Precision::Day,
            day,
            ..Timestamp::month(year, month)
        }
    }

    pub fn minute(offset: Option<i32>, year: u16, month: u8, day: u8, hour: u8, minute: u8) -> Self {
        Timestamp {
            precision: Precision::Minute,
            offset,
            hour,
            minute,
            ..Timestamp::day(year, month, day)
        }
    }

    pub fn second(
        offset: Option<i32>,
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
    ) -> Self {
        Timestamp {
            precision: Precision::Second,
            second,
            ..Timestamp::minute(offset, year, month, day, hour, minute)
        }
    }

    /// Sets the offset, which the binary encoding carries at every precision.
    pub fn with_offset(mut self, offset: Option<i32>) -> Self {
        self.offset = offset;
        self
    }

    /// Adds a fractional second to a second-precision timestamp. A zero fraction with a
    /// non-negative exponent adds no precision and is dropped.
    pub fn with_fraction(mut self, fraction: Decimal) -> Self {
        if self.precision == Precision::Second && !(fraction.is_zero() && fraction.exponent() >= 0)
        {
            self.fraction = Some(fraction);
        }
        self
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    pub fn offset(&self) -> Option<i32> {
        self.offset
    }

    pub fn year_component(&self) -> u16 {
        self.year
    }

    pub fn month_component(&self) -> u8 {
        self.month
    }

    pub fn day_component(&self) -> u8 {
        self.day
    }

    pub fn hour_component(&self) -> u8 {
        self.hour
    }

    pub fn minute_component(&self) -> u8 {
        self.minute
    }

    pub fn second_component(&self) -> u8 {
        self.second
    }

    pub fn fraction(&self) -> Option<&Decimal> {
        self.fraction.as_ref()
    }
}

pub(crate) fn days_in_month(year: u16, month: u8) -> usize {
    match month {
        2 if year % 4 == 0 && (year % 100 != 0 || year % 400 == 0) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;
    use num_traits::Zero;
    use pretty_assertions::assert_eq;

    #[test]
    fn precision_is_ordered() {
        assert!(Precision::Year < Precision::Month);
        assert!(Precision::Minute < Precision::Second);
    }

    #[test]
    fn leap_years() {
        assert_eq!(days_in_month(2000, 2), 29);
        assert_eq!(days_in_month(1900, 2), 28);
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 4), 30);
    }

    #[test]
    fn zero_fraction_without_digits_is_dropped() {
        let base = Timestamp::second(Some(0), 2020, 2, 29, 23, 59, 59);
        assert_eq!(base.clone().with_fraction(Decimal::new(BigInt::zero(), 0)), base);

        let precise = base.clone().with_fraction(Decimal::new(BigInt::zero(), -3));
        assert_ne!(precise, base);
        assert_eq!(precise.fraction().map(Decimal::exponent), Some(-3));
    }
}
