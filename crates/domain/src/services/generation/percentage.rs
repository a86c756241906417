//! Ratio to percentage conversion.

use rust_decimal::{Decimal, RoundingStrategy};

/// Converts part/whole ratios into percentages.
///
/// Results are rounded to `scale` decimal places, half away from zero. One
/// calculator is used for every percentage of a generation run so sibling
/// values are comparable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PercentageCalculator {
    scale: u32,
}

impl PercentageCalculator {
    pub const DEFAULT_SCALE: u32 = 2;

    pub fn new(scale: u32) -> Self {
        Self { scale }
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// `100 * part / whole`, or zero when `whole` is zero.
    pub fn percentage(&self, part: Decimal, whole: Decimal) -> Decimal {
        if whole.is_zero() {
            return Decimal::ZERO;
        }
        (part * Decimal::ONE_HUNDRED / whole)
            .round_dp_with_strategy(self.scale, RoundingStrategy::MidpointAwayFromZero)
    }
}

impl Default for PercentageCalculator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SCALE)
    }
}
