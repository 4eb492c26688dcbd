use std::fmt;
use std::str::FromStr;

use diesel::deserialize::{FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::serialize;
use diesel::serialize::{IsNull, Output, ToSql};
use diesel::sql_types::BigInt;
use diesel::sqlite::{Sqlite, SqliteValue};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Largest number of digits allowed before the decimal point
pub const MAX_INTEGER_DIGITS: usize = 8;

/// Number of digits kept after the decimal point
pub const DECIMAL_PLACES: usize = 2;

/// A non-negative stock quantity with two decimal places
///
/// Stored as a whole number of hundredths in a `BIGINT` column and exchanged
/// on the wire as a string such as `"10.00"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, AsExpression, FromSqlRow)]
#[diesel(sql_type = BigInt)]
pub struct Quantity(i64);

/// Reasons a quantity could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantityError {
    #[error("A valid number is required.")]
    Invalid,
    #[error("Ensure this value is greater than or equal to 0.")]
    Negative,
    #[error("Ensure that there are no more than 2 decimal places.")]
    TooManyDecimalPlaces,
    #[error("Ensure that there are no more than 8 digits before the decimal point.")]
    TooManyDigits,
}

impl Quantity {
    /// Builds a quantity from a count of hundredths
    pub fn from_cents(cents: i64) -> Result<Self, QuantityError> {
        if cents < 0 {
            return Err(QuantityError::Negative);
        }
        if cents / 100 >= 10i64.pow(MAX_INTEGER_DIGITS as u32) {
            return Err(QuantityError::TooManyDigits);
        }
        Ok(Self(cents))
    }

    /// Builds a quantity from a whole number of units
    pub fn from_units(units: u32) -> Self {
        Self(i64::from(units) * 100)
    }

    pub fn cents(&self) -> i64 {
        self.0
    }

    /// Parses a JSON value, accepting either a string or a number
    pub fn from_json(value: &serde_json::Value) -> Result<Self, QuantityError> {
        match value {
            serde_json::Value::String(text) => text.parse(),
            serde_json::Value::Number(number) => number.to_string().parse(),
            _ => Err(QuantityError::Invalid),
        }
    }
}

impl FromStr for Quantity {
    type Err = QuantityError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let input = input.trim();
        let unsigned = match input.strip_prefix('-') {
            Some(rest) => {
                // "-0" and "-0.00" are still zero
                if !rest.is_empty() && rest.chars().all(|c| c == '0' || c == '.') {
                    rest
                } else {
                    rest.parse::<Quantity>()?;
                    return Err(QuantityError::Negative);
                }
            }
            None => input.strip_prefix('+').unwrap_or(input),
        };

        let (whole, fraction) = match unsigned.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (unsigned, ""),
        };

        let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
        if whole.is_empty() && fraction.is_empty() {
            return Err(QuantityError::Invalid);
        }
        if !all_digits(whole) || !all_digits(fraction) {
            return Err(QuantityError::Invalid);
        }

        // Trailing zeros beyond the second place carry no information
        let fraction = fraction.trim_end_matches('0');
        if fraction.len() > DECIMAL_PLACES {
            return Err(QuantityError::TooManyDecimalPlaces);
        }
        let whole = whole.trim_start_matches('0');
        if whole.len() > MAX_INTEGER_DIGITS {
            return Err(QuantityError::TooManyDigits);
        }

        let whole_value: i64 = if whole.is_empty() { 0 } else { whole.parse().map_err(|_| QuantityError::Invalid)? };
        let fraction_value: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| QuantityError::Invalid)? * 10,
            _ => fraction.parse().map_err(|_| QuantityError::Invalid)?,
        };

        Self::from_cents(whole_value * 100 + fraction_value)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct QuantityVisitor;

impl Visitor<'_> for QuantityVisitor {
    type Value = Quantity;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative decimal with at most two decimal places")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Quantity, E> {
        value.parse().map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Quantity, E> {
        value.to_string().parse().map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Quantity, E> {
        value.to_string().parse().map_err(E::custom)
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Quantity, E> {
        serde_json::Number::from_f64(value)
            .ok_or(QuantityError::Invalid)
            .and_then(|number| number.to_string().parse())
            .map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(QuantityVisitor)
    }
}

impl FromSql<BigInt, Sqlite> for Quantity {
    fn from_sql(value: SqliteValue<'_, '_, '_>) -> diesel::deserialize::Result<Self> {
        let cents = <i64 as FromSql<BigInt, Sqlite>>::from_sql(value)?;
        Ok(Quantity::from_cents(cents)?)
    }
}

impl ToSql<BigInt, Sqlite> for Quantity {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
        out.set_value(self.0);
        Ok(IsNull::No)
    }
}
