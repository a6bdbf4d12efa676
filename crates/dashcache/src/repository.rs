//! Read-only aggregation queries the reports are built from

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::error::Result;

/// Exact fixed-point number as stored by the transactional store
///
/// `mantissa * 10^-scale`; `1999` with scale `2` is `19.99`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FixedDecimal {
    mantissa: i64,
    scale: u32,
}

/// Largest scale for which `10^scale` is exact in an `f64`
const MAX_EXACT_SCALE: u32 = 22;

impl FixedDecimal {
    pub const fn new(mantissa: i64, scale: u32) -> Self {
        Self { mantissa, scale }
    }

    /// Whole number with no fractional digits
    pub const fn from_integer(value: i64) -> Self {
        Self::new(value, 0)
    }

    pub fn mantissa(&self) -> i64 {
        self.mantissa
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// Floating display value
    pub fn to_f64(&self) -> f64 {
        let scale = self.scale.min(MAX_EXACT_SCALE);
        let mut value = self.mantissa as f64 / 10f64.powi(scale as i32);
        for _ in scale..self.scale {
            value /= 10.0;
        }
        value
    }
}

impl fmt::Display for FixedDecimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scale == 0 {
            return write!(f, "{}", self.mantissa);
        }
        let digits = self.mantissa.unsigned_abs().to_string();
        let scale = self.scale as usize;
        let padded = format!("{:0>width$}", digits, width = scale + 1);
        let (whole, frac) = padded.split_at(padded.len() - scale);
        let sign = if self.mantissa < 0 { "-" } else { "" };
        write!(f, "{}{}.{}", sign, whole, frac)
    }
}

/// Error parsing a [`FixedDecimal`] from text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid decimal literal: {0:?}")]
pub struct ParseDecimalError(String);

impl FromStr for FixedDecimal {
    type Err = ParseDecimalError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = || ParseDecimalError(s.to_string());
        let trimmed = s.trim();
        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let (whole, frac) = unsigned.split_once('.').unwrap_or((unsigned, ""));

        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if (whole.is_empty() && frac.is_empty()) || !all_digits(whole) || !all_digits(frac) {
            return Err(invalid());
        }

        let digits = format!("{}{}", whole, frac);
        let magnitude: i64 = if digits.is_empty() {
            0
        } else {
            digits.parse().map_err(|_| invalid())?
        };
        let mantissa = if negative { -magnitude } else { magnitude };

        Ok(Self::new(mantissa, frac.len() as u32))
    }
}

/// Aggregate product totals
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductTotalsRow {
    pub total_products: i64,
    pub total_stock: i64,
    pub avg_price: FixedDecimal,
}

/// A recently created product
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRow {
    pub id: String,
    pub name: String,
    pub price: FixedDecimal,
    pub stock_quantity: i32,
    pub created_at: DateTime<Utc>,
}

/// A customer with aggregated spend
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub total_spent: FixedDecimal,
    pub total_orders: i64,
}

/// Read-only aggregate queries against the transactional store
///
/// Every query is assumed expensive. Failures should be reported with
/// [`ReportError::repository`](crate::ReportError::repository); they reach the
/// callers unchanged.
#[async_trait]
pub trait AggregationRepository: Send + Sync + 'static {
    /// Product count, total stock and average price
    async fn fetch_product_totals(&self) -> Result<ProductTotalsRow>;

    /// The `limit` most recently created products, newest first
    async fn fetch_recent_products(&self, limit: u32) -> Result<Vec<ProductRow>>;

    /// Up to `limit` customers by total spend, descending, in a deterministic order
    async fn fetch_top_customers(&self, limit: u32) -> Result<Vec<CustomerRow>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_f64() {
        assert_eq!(FixedDecimal::new(1999, 2).to_f64(), 19.99);
        assert_eq!(FixedDecimal::new(-250, 1).to_f64(), -25.0);
        assert_eq!(FixedDecimal::from_integer(12).to_f64(), 12.0);
        assert_eq!(FixedDecimal::default().to_f64(), 0.0);
    }

    #[test]
    fn test_parse() {
        assert_eq!("19.99".parse::<FixedDecimal>().unwrap(), FixedDecimal::new(1999, 2));
        assert_eq!("-0.5".parse::<FixedDecimal>().unwrap(), FixedDecimal::new(-5, 1));
        assert_eq!("42".parse::<FixedDecimal>().unwrap(), FixedDecimal::from_integer(42));
        assert_eq!(".25".parse::<FixedDecimal>().unwrap(), FixedDecimal::new(25, 2));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("".parse::<FixedDecimal>().is_err());
        assert!(".".parse::<FixedDecimal>().is_err());
        assert!("12a".parse::<FixedDecimal>().is_err());
        assert!("1.2.3".parse::<FixedDecimal>().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(FixedDecimal::new(1999, 2).to_string(), "19.99");
        assert_eq!(FixedDecimal::new(5, 3).to_string(), "0.005");
        assert_eq!(FixedDecimal::new(-120, 2).to_string(), "-1.20");
        assert_eq!(FixedDecimal::from_integer(7).to_string(), "7");
    }
}
