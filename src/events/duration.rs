//! Serde codec for elapsed-time values.
//!
//! Durations are written as a signed integer number of nanoseconds. When
//! reading, duration strings such as `"1.5s"`, `"-250ms"` or `"1h2m3s"` are
//! accepted as well.

use std::fmt;

use chrono::TimeDelta;
use serde::de::{self, Visitor};
use serde::{Deserializer, Serializer};

const NANOS_PER_SECOND: u64 = 1_000_000_000;

const UNITS: &[(&str, u64)] = &[
    ("ns", 1),
    ("us", 1_000),
    ("µs", 1_000),
    ("μs", 1_000),
    ("ms", 1_000_000),
    ("s", NANOS_PER_SECOND),
    ("m", 60 * NANOS_PER_SECOND),
    ("h", 3_600 * NANOS_PER_SECOND),
];

/// Errors produced when parsing a duration string.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DurationError {
    #[error("invalid duration {0:?}")]
    Invalid(String),

    #[error("missing unit in duration {0:?}")]
    MissingUnit(String),

    #[error("unknown unit {unit:?} in duration {input:?}")]
    UnknownUnit { unit: String, input: String },

    #[error("duration {0:?} overflows")]
    Overflow(String),
}

/// Parse a duration string like `"300ms"`, `"-1.5h"` or `"2h45m"`.
///
/// A bare `"0"` is accepted without a unit.
///
/// # Errors
///
/// Returns a [`DurationError`] if the string is empty, lacks a unit, uses an
/// unknown unit, or does not fit in signed 64-bit nanoseconds.
pub fn parse(input: &str) -> Result<TimeDelta, DurationError> {
    let (negative, mut rest) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input.strip_prefix('+').unwrap_or(input)),
    };
    if rest == "0" {
        return Ok(TimeDelta::zero());
    }
    if rest.is_empty() {
        return Err(DurationError::Invalid(input.to_string()));
    }

    let overflow = || DurationError::Overflow(input.to_string());
    let mut total: u128 = 0;

    while !rest.is_empty() {
        let int_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        let (int_part, tail) = rest.split_at(int_len);

        let (frac_part, tail) = match tail.strip_prefix('.') {
            Some(after_dot) => {
                let frac_len = after_dot.bytes().take_while(u8::is_ascii_digit).count();
                after_dot.split_at(frac_len)
            }
            None => ("", tail),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(DurationError::Invalid(input.to_string()));
        }

        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_len);
        if unit.is_empty() {
            return Err(DurationError::MissingUnit(input.to_string()));
        }
        let scale = UNITS
            .iter()
            .find(|(name, _)| *name == unit)
            .map(|(_, scale)| u128::from(*scale))
            .ok_or_else(|| DurationError::UnknownUnit {
                unit: unit.to_string(),
                input: input.to_string(),
            })?;

        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| overflow())?
        };
        let mut nanos = whole.checked_mul(scale).ok_or_else(overflow)?;

        // Digits past nanosecond precision of an hour cannot change the result.
        let mut frac: u128 = 0;
        let mut denom: u128 = 1;
        for digit in frac_part.bytes().take(18) {
            frac = frac * 10 + u128::from(digit - b'0');
            denom *= 10;
        }
        nanos = nanos.checked_add(frac * scale / denom).ok_or_else(overflow)?;

        total = total.checked_add(nanos).ok_or_else(overflow)?;
        rest = tail;
    }

    let magnitude = i128::try_from(total).map_err(|_| overflow())?;
    let signed = if negative { -magnitude } else { magnitude };
    i64::try_from(signed)
        .map(TimeDelta::nanoseconds)
        .map_err(|_| overflow())
}

/// Serialize a duration as integer nanoseconds.
///
/// # Errors
///
/// Fails if the duration does not fit in an `i64` of nanoseconds.
pub fn serialize<S>(value: &TimeDelta, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let nanos = value
        .num_nanoseconds()
        .ok_or_else(|| serde::ser::Error::custom("duration overflows i64 nanoseconds"))?;
    serializer.serialize_i64(nanos)
}

/// Deserialize a duration from integer nanoseconds or a duration string.
///
/// # Errors
///
/// Fails on fractional numbers, out-of-range values, and malformed strings.
pub fn deserialize<'de, D>(deserializer: D) -> Result<TimeDelta, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(DurationVisitor)
}

struct DurationVisitor;

impl Visitor<'_> for DurationVisitor {
    type Value = TimeDelta;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an integer number of nanoseconds or a duration string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<TimeDelta, E> {
        i64::try_from(v)
            .map(TimeDelta::nanoseconds)
            .map_err(|_| E::custom(format!("duration {v} overflows i64 nanoseconds")))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<TimeDelta, E> {
        Ok(TimeDelta::nanoseconds(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<TimeDelta, E> {
        parse(v).map_err(E::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    struct Wrapper {
        #[serde(with = "super")]
        time: TimeDelta,
    }

    #[test]
    fn test_parse_single_units() {
        assert_eq!(parse("900ns").unwrap(), TimeDelta::nanoseconds(900));
        assert_eq!(parse("40us").unwrap(), TimeDelta::microseconds(40));
        assert_eq!(parse("40µs").unwrap(), TimeDelta::microseconds(40));
        assert_eq!(parse("250ms").unwrap(), TimeDelta::milliseconds(250));
        assert_eq!(parse("3s").unwrap(), TimeDelta::seconds(3));
        assert_eq!(parse("2m").unwrap(), TimeDelta::seconds(120));
        assert_eq!(parse("1h").unwrap(), TimeDelta::seconds(3600));
    }

    #[test]
    fn test_parse_fractions_and_compounds() {
        assert_eq!(parse("1.5s").unwrap(), TimeDelta::milliseconds(1500));
        assert_eq!(parse(".5ms").unwrap(), TimeDelta::microseconds(500));
        assert_eq!(parse("1h2m3s").unwrap(), TimeDelta::seconds(3723));
        assert_eq!(parse("+10ms").unwrap(), TimeDelta::milliseconds(10));
        assert_eq!(parse("0").unwrap(), TimeDelta::zero());
    }

    #[test]
    fn test_parse_negative() {
        assert_eq!(parse("-1s").unwrap(), TimeDelta::seconds(-1));
        assert_eq!(parse("-1.5ms").unwrap(), TimeDelta::microseconds(-1500));
        assert_eq!(parse("-0").unwrap(), TimeDelta::zero());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(parse(""), Err(DurationError::Invalid(_))));
        assert!(matches!(parse("-"), Err(DurationError::Invalid(_))));
        assert!(matches!(parse("."), Err(DurationError::Invalid(_))));
        assert!(matches!(parse("10"), Err(DurationError::MissingUnit(_))));
        assert!(matches!(
            parse("3d"),
            Err(DurationError::UnknownUnit { .. })
        ));
        assert!(matches!(
            parse("99999999999999999999h"),
            Err(DurationError::Overflow(_))
        ));
    }

    #[test]
    fn test_parse_fraction_overflow_is_rejected() {
        // The whole part fits in u128 nanoseconds; adding the fraction does not.
        assert!(matches!(
            parse("340282366920938463463374607431768211.999us"),
            Err(DurationError::Overflow(_))
        ));
    }

    #[test]
    fn test_parse_rejects_past_i64_range() {
        assert_eq!(
            parse("9223372036854775807ns").unwrap(),
            TimeDelta::nanoseconds(i64::MAX)
        );
        assert!(matches!(
            parse("9223372036854775808ns"),
            Err(DurationError::Overflow(_))
        ));
    }

    #[test]
    fn test_unknown_unit_display() {
        let err = parse("5 s").unwrap_err();
        assert_eq!(err.to_string(), r#"unknown unit " s" in duration "5 s""#);
    }

    #[test]
    fn test_deserialize_integer_nanos() {
        let w: Wrapper = serde_json::from_str(r#"{"time":1500000}"#).unwrap();
        assert_eq!(w.time, TimeDelta::microseconds(1500));
    }

    #[test]
    fn test_deserialize_negative_nanos() {
        let w: Wrapper = serde_json::from_str(r#"{"time":-5}"#).unwrap();
        assert_eq!(w.time, TimeDelta::nanoseconds(-5));
    }

    #[test]
    fn test_deserialize_string() {
        let w: Wrapper = serde_json::from_str(r#"{"time":"1.5ms"}"#).unwrap();
        assert_eq!(w.time, TimeDelta::microseconds(1500));
    }

    #[test]
    fn test_deserialize_rejects_float_and_huge() {
        assert!(serde_json::from_str::<Wrapper>(r#"{"time":1.5}"#).is_err());
        assert!(serde_json::from_str::<Wrapper>(r#"{"time":18446744073709551615}"#).is_err());
    }

    #[test]
    fn test_serialize_as_nanos() {
        let w = Wrapper {
            time: TimeDelta::milliseconds(7),
        };
        assert_eq!(serde_json::to_string(&w).unwrap(), r#"{"time":7000000}"#);
    }
}
