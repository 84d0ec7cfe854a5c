use std::fmt;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
#[error("invalid unit value: {0:?}")]
pub struct ParseUnitsError(String);

/// Unit count attached to a course, term, or whole flowchart. Catalog data
/// expresses these as strings, either exact ("4") or a range ("4-6"); all
/// arithmetic happens on this type and the string form only exists on the
/// wire.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UnitRange {
    pub low: f64,
    pub high: f64,
}

impl UnitRange {
    pub fn exact(value: f64) -> Self {
        Self {
            low: value,
            high: value,
        }
    }

    pub fn is_exact(&self) -> bool {
        self.low == self.high
    }

    /// Lenient parse for values coming out of stored term data: anything
    /// malformed counts as zero units rather than poisoning a whole merge.
    pub fn parse_or_zero(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }

    /// Range-aware subtraction: the result spans the smallest through the
    /// largest possible remainder, floored at zero. Removing "4-6" from "18"
    /// leaves "12-14", so the bounds stay ordered for any valid operands.
    pub fn saturating_sub(self, other: Self) -> Self {
        Self {
            low: (self.low - other.high).max(0.0),
            high: (self.high - other.low).max(0.0),
        }
    }
}

impl Add for UnitRange {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            low: self.low + other.low,
            high: self.high + other.high,
        }
    }
}

impl AddAssign for UnitRange {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl FromStr for UnitRange {
    type Err = ParseUnitsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let parse_bound = |part: &str| {
            part.trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite() && *v >= 0.0)
        };
        let mut parts = trimmed.split('-');
        let low = parts
            .next()
            .and_then(parse_bound)
            .ok_or_else(|| ParseUnitsError(s.to_string()))?;
        let high = match parts.next() {
            Some(part) => parse_bound(part).ok_or_else(|| ParseUnitsError(s.to_string()))?,
            None => low,
        };
        if parts.next().is_some() || high < low {
            return Err(ParseUnitsError(s.to_string()));
        }
        Ok(Self { low, high })
    }
}

fn fmt_bound(value: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if value.fract() == 0.0 {
        write!(f, "{}", value as i64)
    } else {
        write!(f, "{}", value)
    }
}

impl fmt::Display for UnitRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_bound(self.low, f)?;
        if !self.is_exact() {
            write!(f, "-")?;
            fmt_bound(self.high, f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_exact_values() {
        assert_eq!("4".parse::<UnitRange>().unwrap(), UnitRange::exact(4.0));
        assert_eq!("0".parse::<UnitRange>().unwrap(), UnitRange::exact(0.0));
        assert_eq!(
            "2.5".parse::<UnitRange>().unwrap(),
            UnitRange::exact(2.5)
        );
    }

    #[test]
    fn parses_ranges() {
        let range = "4-6".parse::<UnitRange>().unwrap();
        assert_eq!(range.low, 4.0);
        assert_eq!(range.high, 6.0);
        assert!(!range.is_exact());
    }

    #[test]
    fn rejects_malformed_values() {
        assert!("".parse::<UnitRange>().is_err());
        assert!("abc".parse::<UnitRange>().is_err());
        assert!("4-6-8".parse::<UnitRange>().is_err());
        assert!("6-4".parse::<UnitRange>().is_err());
    }

    #[test]
    fn parse_or_zero_swallows_garbage() {
        assert_eq!(UnitRange::parse_or_zero("junk"), UnitRange::exact(0.0));
        assert_eq!(UnitRange::parse_or_zero("18"), UnitRange::exact(18.0));
    }

    #[test]
    fn addition_sums_bounds_independently() {
        let sum = "4-6".parse::<UnitRange>().unwrap() + "12".parse::<UnitRange>().unwrap();
        assert_eq!(sum.to_string(), "16-18");

        let exact = "4".parse::<UnitRange>().unwrap() + "14".parse::<UnitRange>().unwrap();
        assert_eq!(exact.to_string(), "18");
    }

    #[test]
    fn subtraction_floors_at_zero() {
        let units = "18".parse::<UnitRange>().unwrap();
        let removed = "4".parse::<UnitRange>().unwrap();
        assert_eq!(units.saturating_sub(removed).to_string(), "14");

        let small = "2".parse::<UnitRange>().unwrap();
        assert_eq!(small.saturating_sub(units).to_string(), "0");
    }

    #[test]
    fn subtracting_a_range_keeps_bounds_ordered() {
        let units = "18".parse::<UnitRange>().unwrap();
        let removed = "4-6".parse::<UnitRange>().unwrap();
        let left = units.saturating_sub(removed);
        assert!(left.low <= left.high);
        assert_eq!(left.to_string(), "12-14");

        let narrow = "5-7".parse::<UnitRange>().unwrap();
        let wide = "4-6".parse::<UnitRange>().unwrap();
        assert_eq!(narrow.saturating_sub(wide).to_string(), "0-3");
    }

    #[test]
    fn renders_without_trailing_decimals() {
        assert_eq!(UnitRange::exact(18.0).to_string(), "18");
        assert_eq!(UnitRange::exact(2.5).to_string(), "2.5");
        assert_eq!(
            UnitRange { low: 4.0, high: 6.0 }.to_string(),
            "4-6"
        );
    }
}
