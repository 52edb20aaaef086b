//! Exact decimal arithmetic for weights, thresholds and tallies.
//!
//! Wraps [`rust_decimal::Decimal`] so that every value in the system is a
//! base-10 fixed-point number. Binary floating point never appears: two nodes
//! tallying the same votes must produce byte-identical results.
//!
//! Values serialize as their normalized string form (`"2"`, `"0.5"`), which
//! keeps the encoding stable under both JSON and bincode.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::TypesError;

/// A non-NaN, exactly represented decimal number.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Dec(Decimal);

impl Dec {
    pub const ZERO: Self = Self(Decimal::ZERO);
    pub const ONE: Self = Self(Decimal::ONE);

    /// Parse any well-formed decimal string (sign allowed).
    ///
    /// Accepted grammar: `-?[0-9]+(\.[0-9]+)?`. Exponents, `+`, underscores,
    /// surrounding whitespace and inputs that cannot be held without rounding
    /// are rejected.
    pub fn parse(raw: &str) -> Result<Self, TypesError> {
        if !is_plain_decimal(raw) {
            return Err(TypesError::InvalidDecimal(raw.to_string()));
        }
        Decimal::from_str_exact(raw)
            .map(Self)
            .map_err(|_| TypesError::InvalidDecimal(raw.to_string()))
    }

    /// Parse a decimal that must be strictly greater than zero.
    pub fn parse_positive(raw: &str) -> Result<Self, TypesError> {
        let d = Self::parse(raw)?;
        if !d.is_positive() {
            return Err(TypesError::NotPositive(raw.to_string()));
        }
        Ok(d)
    }

    /// Parse a decimal that must be zero or greater.
    pub fn parse_non_negative(raw: &str) -> Result<Self, TypesError> {
        let d = Self::parse(raw)?;
        if d.0.is_sign_negative() && !d.0.is_zero() {
            return Err(TypesError::Negative(raw.to_string()));
        }
        Ok(d)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn checked_add(self, other: Self) -> Result<Self, TypesError> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or(TypesError::DecimalOverflow)
    }

    /// Subtract, failing if the result would be negative.
    pub fn checked_sub(self, other: Self) -> Result<Self, TypesError> {
        let diff = self.0.checked_sub(other.0).ok_or(TypesError::DecimalOverflow)?;
        if diff < Decimal::ZERO {
            return Err(TypesError::Negative(format!("{} - {}", self, other)));
        }
        Ok(Self(diff))
    }

    /// Subtract, flooring the result at zero.
    pub fn saturating_sub(self, other: Self) -> Self {
        match self.0.checked_sub(other.0) {
            Some(d) if d > Decimal::ZERO => Self(d),
            _ => Self::ZERO,
        }
    }

    pub fn checked_mul(self, other: Self) -> Result<Self, TypesError> {
        self.0
            .checked_mul(other.0)
            .map(Self)
            .ok_or(TypesError::DecimalOverflow)
    }

    pub fn checked_div(self, other: Self) -> Result<Self, TypesError> {
        if other.is_zero() {
            return Err(TypesError::DivisionByZero);
        }
        self.0
            .checked_div(other.0)
            .map(Self)
            .ok_or(TypesError::DecimalOverflow)
    }

    pub fn inner(&self) -> Decimal {
        self.0
    }
}

fn is_plain_decimal(raw: &str) -> bool {
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    let mut parts = digits.splitn(2, '.');
    let int_part = parts.next().unwrap_or("");
    let frac_ok = match parts.next() {
        None => true,
        Some(frac) => !frac.is_empty() && frac.bytes().all(|b| b.is_ascii_digit()),
    };
    !int_part.is_empty() && int_part.bytes().all(|b| b.is_ascii_digit()) && frac_ok
}

impl From<u64> for Dec {
    fn from(v: u64) -> Self {
        Self(Decimal::from(v))
    }
}

impl FromStr for Dec {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl fmt::Debug for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dec({})", self)
    }
}

impl Serialize for Dec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Dec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Dec::parse(&raw).map_err(serde::de::Error::custom)
    }
}
