//! Decimal types for prices and quantities
//!
//! Thin newtypes over `rust_decimal::Decimal` so money math never touches
//! binary floating point. Both types are non-negative; zero is meaningful
//! (a market order stores price 0, a fresh order has filled quantity 0).
//! On the wire both serialize as plain JSON numbers.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, Mul, Sub, SubAssign};

/// Price of one unit of an instrument. Non-negative.
///
/// A price of zero means "no price": an empty side of the book, or a
/// market order that carries no limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(Decimal);

impl Price {
    pub const ZERO: Price = Price(Decimal::ZERO);

    /// Create a new Price from a Decimal.
    ///
    /// # Panics
    /// Panics if the value is negative.
    pub fn new(value: Decimal) -> Self {
        assert!(value >= Decimal::ZERO, "Price must be non-negative");
        Self(value)
    }

    /// Try to create a Price, returning None if negative.
    pub fn try_new(value: Decimal) -> Option<Self> {
        if value >= Decimal::ZERO {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Create from integer (for testing/convenience).
    pub fn from_u64(value: u64) -> Self {
        Self(Decimal::from(value))
    }

    /// Create from a decimal string.
    pub fn from_str(s: &str) -> Result<Self, rust_decimal::Error> {
        let value = Decimal::from_str(s)?;
        Ok(Self::new(value))
    }

    /// Inner decimal value.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Lossy conversion for statistics ratios. Not for money math.
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(0.0)
    }

    /// Create from a float (config plumbing); `None` for negative or
    /// non-finite input.
    pub fn try_new_f64(value: f64) -> Option<Self> {
        Decimal::from_f64(value).and_then(Self::try_new)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Price {
    type Output = Decimal;

    /// Difference of two prices; may be negative (a spread with one empty
    /// side is), so the output is a raw decimal.
    fn sub(self, rhs: Self) -> Self::Output {
        self.0 - rhs.0
    }
}

impl Mul<Quantity> for Price {
    type Output = Decimal;

    fn mul(self, rhs: Quantity) -> Self::Output {
        self.0 * rhs.as_decimal()
    }
}

impl Div<Decimal> for Price {
    type Output = Price;

    fn div(self, rhs: Decimal) -> Self::Output {
        assert!(!rhs.is_zero(), "Division by zero");
        Price(self.0 / rhs)
    }
}

impl Serialize for Price {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self.0.to_f64() {
            Some(v) => serializer.serialize_f64(v),
            None => Err(serde::ser::Error::custom("Price not representable as f64")),
        }
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        let decimal = Decimal::from_f64(value)
            .ok_or_else(|| serde::de::Error::custom("Price is not a finite number"))?;
        Self::try_new(decimal).ok_or_else(|| serde::de::Error::custom("Price must be non-negative"))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Quantity of an instrument. Non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Quantity(Decimal);

impl Quantity {
    pub const ZERO: Quantity = Quantity(Decimal::ZERO);

    /// Create a new Quantity from a Decimal.
    ///
    /// # Panics
    /// Panics if the value is negative.
    pub fn new(value: Decimal) -> Self {
        assert!(value >= Decimal::ZERO, "Quantity must be non-negative");
        Self(value)
    }

    /// Try to create a Quantity, returning None if negative.
    pub fn try_new(value: Decimal) -> Option<Self> {
        if value >= Decimal::ZERO {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Create from integer (for testing/convenience).
    pub fn from_u64(value: u64) -> Self {
        Self(Decimal::from(value))
    }

    /// Create from a decimal string.
    pub fn from_str(s: &str) -> Result<Self, rust_decimal::Error> {
        let value = Decimal::from_str(s)?;
        Ok(Self::new(value))
    }

    /// Inner decimal value.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Lossy conversion for statistics ratios. Not for money math.
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(0.0)
    }

    /// Create from a float (config plumbing); `None` for negative or
    /// non-finite input.
    pub fn try_new_f64(value: f64) -> Option<Self> {
        Decimal::from_f64(value).and_then(Self::try_new)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// The smaller of two quantities (a fill is the min of both sides).
    pub fn min(self, other: Self) -> Self {
        if self.0 <= other.0 {
            self
        } else {
            other
        }
    }
}

impl Add for Quantity {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Quantity {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Quantity {
    type Output = Self;

    /// # Panics
    /// Panics if the result would be negative.
    fn sub(self, rhs: Self) -> Self::Output {
        assert!(self.0 >= rhs.0, "Quantity subtraction would go negative");
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Quantity {
    fn sub_assign(&mut self, rhs: Self) {
        assert!(self.0 >= rhs.0, "Quantity subtraction would go negative");
        self.0 -= rhs.0;
    }
}

impl Mul<Price> for Quantity {
    type Output = Decimal;

    fn mul(self, rhs: Price) -> Self::Output {
        self.0 * rhs.as_decimal()
    }
}

impl Sum for Quantity {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Quantity::ZERO, |acc, q| acc + q)
    }
}

impl Serialize for Quantity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self.0.to_f64() {
            Some(v) => serializer.serialize_f64(v),
            None => Err(serde::ser::Error::custom(
                "Quantity not representable as f64",
            )),
        }
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        let decimal = Decimal::from_f64(value)
            .ok_or_else(|| serde::de::Error::custom("Quantity is not a finite number"))?;
        Self::try_new(decimal)
            .ok_or_else(|| serde::de::Error::custom("Quantity must be non-negative"))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_creation() {
        let price = Price::from_u64(50);
        assert_eq!(price.as_decimal(), Decimal::from(50));
        assert!(Price::ZERO.is_zero());
    }

    #[test]
    #[should_panic(expected = "Price must be non-negative")]
    fn test_price_negative_panics() {
        Price::new(Decimal::from(-1));
    }

    #[test]
    fn test_price_try_new() {
        assert!(Price::try_new(Decimal::ZERO).is_some());
        assert!(Price::try_new(Decimal::from(-1)).is_none());
    }

    #[test]
    fn test_price_spread_can_be_negative() {
        let bid = Price::from_u64(50);
        let ask = Price::ZERO;
        assert_eq!(ask - bid, Decimal::from(-50));
    }

    #[test]
    fn test_notional() {
        let qty = Quantity::from_str("100").unwrap();
        let price = Price::from_str("50.0").unwrap();
        assert_eq!(qty * price, Decimal::from(5000));
        assert_eq!(price * qty, Decimal::from(5000));
    }

    #[test]
    fn test_quantity_min() {
        let a = Quantity::from_u64(75);
        let b = Quantity::from_u64(200);
        assert_eq!(a.min(b), a);
        assert_eq!(b.min(a), a);
    }

    #[test]
    fn test_quantity_sub_assign() {
        let mut q = Quantity::from_u64(200);
        q -= Quantity::from_u64(75);
        assert_eq!(q, Quantity::from_u64(125));
    }

    #[test]
    #[should_panic(expected = "Quantity subtraction would go negative")]
    fn test_quantity_underflow_panics() {
        let _ = Quantity::from_u64(1) - Quantity::from_u64(2);
    }

    #[test]
    fn test_quantity_sum() {
        let total: Quantity = [1u64, 2, 3].iter().map(|&v| Quantity::from_u64(v)).sum();
        assert_eq!(total, Quantity::from_u64(6));
    }

    #[test]
    fn test_serde_as_json_numbers() {
        let price = Price::from_str("50.5").unwrap();
        assert_eq!(serde_json::to_string(&price).unwrap(), "50.5");

        let qty: Quantity = serde_json::from_str("100").unwrap();
        assert_eq!(qty, Quantity::from_u64(100));

        let err: Result<Quantity, _> = serde_json::from_str("-3");
        assert!(err.is_err());
    }
}
