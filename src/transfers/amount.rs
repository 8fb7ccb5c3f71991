//! Fixed-point money amounts.
//!
//! Amounts are held as an `i64` count of minor units (hundredths). They
//! serialize as decimal strings so no precision is lost on the wire.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

const SCALE: i64 = 100;
const FRACTION_DIGITS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountParseError {
    #[error("amount is empty")]
    Empty,

    #[error("invalid amount: {0:?}")]
    Invalid(String),

    #[error("amount {0:?} has more than two decimal places")]
    Precision(String),

    #[error("amount {0:?} is out of range")]
    Overflow(String),
}

/// A monetary amount with two decimal places.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(i64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub const fn from_minor_units(units: i64) -> Self {
        Self(units)
    }

    pub const fn minor_units(self) -> i64 {
        self.0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }
}

impl FromStr for Amount {
    type Err = AmountParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(AmountParseError::Empty);
        }
        let invalid = || AmountParseError::Invalid(s.to_string());
        let overflow = || AmountParseError::Overflow(s.to_string());

        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));

        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if (whole.is_empty() && fraction.is_empty()) || !all_digits(whole) || !all_digits(fraction) {
            return Err(invalid());
        }

        // Trailing zeros beyond the second place do not change the value.
        let (kept, extra) = fraction.split_at(fraction.len().min(FRACTION_DIGITS));
        if extra.bytes().any(|b| b != b'0') {
            return Err(AmountParseError::Precision(s.to_string()));
        }

        let mut units: i64 = 0;
        for b in whole.bytes() {
            units = units
                .checked_mul(10)
                .and_then(|u| u.checked_add(i64::from(b - b'0')))
                .ok_or_else(overflow)?;
        }
        units = units.checked_mul(SCALE).ok_or_else(overflow)?;

        let mut cents: i64 = 0;
        for (i, b) in kept.bytes().enumerate() {
            let place = if i == 0 { 10 } else { 1 };
            cents += i64::from(b - b'0') * place;
        }
        units = units.checked_add(cents).ok_or_else(overflow)?;

        Ok(Amount(if negative { -units } else { units }))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let abs = self.0.unsigned_abs();
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{sign}{}.{:02}", abs / SCALE as u64, abs % SCALE as u64)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(AmountVisitor)
    }
}

struct AmountVisitor;

impl Visitor<'_> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal amount with at most two decimal places")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
        v.checked_mul(SCALE)
            .map(Amount)
            .ok_or_else(|| E::custom(AmountParseError::Overflow(v.to_string())))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
        i64::try_from(v)
            .map_err(|_| E::custom(AmountParseError::Overflow(v.to_string())))
            .and_then(|v| self.visit_i64(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Amount, E> {
        self.visit_str(&v.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_common_forms() {
        assert_eq!("100".parse::<Amount>(), Ok(Amount(100_00)));
        assert_eq!("100.5".parse::<Amount>(), Ok(Amount(100_50)));
        assert_eq!("100.50".parse::<Amount>(), Ok(Amount(100_50)));
        assert_eq!("0.01".parse::<Amount>(), Ok(Amount(1)));
        assert_eq!(".5".parse::<Amount>(), Ok(Amount(50)));
        assert_eq!("-3.25".parse::<Amount>(), Ok(Amount(-3_25)));
        assert_eq!("7.000".parse::<Amount>(), Ok(Amount(7_00)));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!("".parse::<Amount>(), Err(AmountParseError::Empty));
        assert!(matches!("abc".parse::<Amount>(), Err(AmountParseError::Invalid(_))));
        assert!(matches!("+5".parse::<Amount>(), Err(AmountParseError::Invalid(_))));
        assert!(matches!("1.2.3".parse::<Amount>(), Err(AmountParseError::Invalid(_))));
        assert!(matches!(".".parse::<Amount>(), Err(AmountParseError::Invalid(_))));
        assert!(matches!("1.005".parse::<Amount>(), Err(AmountParseError::Precision(_))));
        assert!(matches!(
            "99999999999999999999".parse::<Amount>(),
            Err(AmountParseError::Overflow(_))
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(Amount(100_00).to_string(), "100.00");
        assert_eq!(Amount(5).to_string(), "0.05");
        assert_eq!(Amount(-1_50).to_string(), "-1.50");
    }

    #[test]
    fn test_json_forms() {
        assert_eq!(serde_json::to_string(&Amount(12_30)).unwrap(), "\"12.30\"");
        assert_eq!(serde_json::from_str::<Amount>("\"12.3\"").unwrap(), Amount(12_30));
        assert_eq!(serde_json::from_str::<Amount>("12").unwrap(), Amount(12_00));
        assert_eq!(serde_json::from_str::<Amount>("12.5").unwrap(), Amount(12_50));
        assert!(serde_json::from_str::<Amount>("\"1.234\"").is_err());
    }

    #[test]
    fn test_checked_arithmetic() {
        assert_eq!(Amount(5).checked_sub(Amount(7)), Some(Amount(-2)));
        assert_eq!(Amount(i64::MAX).checked_add(Amount(1)), None);
    }
}
