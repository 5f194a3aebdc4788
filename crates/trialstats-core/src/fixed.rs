// Two-decimal rounded values for rates and means.

use serde::{Serialize, Serializer};
use std::fmt;

/// A value rounded to two decimal places.
///
/// Rates and means leave the engine in this form and serialize as strings
/// (`"80.00"`), so consumers see a stable textual shape regardless of float
/// formatting. Comparisons operate on the rounded value, which means two
/// athletes whose rates differ only past the second decimal tie on rank.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Fixed2(f64);

impl Fixed2 {
    pub const ZERO: Fixed2 = Fixed2(0.0);

    /// Round `value` half away from zero to two decimals.
    pub fn new(value: f64) -> Self {
        if !value.is_finite() {
            return Self::ZERO;
        }
        Fixed2((value * 100.0).round() / 100.0)
    }

    /// `100 * part / whole`, capped at 100.00. Zero when `whole` is zero.
    pub fn percent(part: u64, whole: u64) -> Self {
        if whole == 0 {
            return Self::ZERO;
        }
        Self::new((part as f64 / whole as f64 * 100.0).min(100.0))
    }

    /// Arithmetic mean of `sum` over `count` items. Zero when `count` is zero.
    pub fn mean(sum: f64, count: usize) -> Self {
        if count == 0 {
            return Self::ZERO;
        }
        Self::new(sum / count as f64)
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Fixed2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Serialize for Fixed2 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
