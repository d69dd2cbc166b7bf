//! Per-class call-tree features.
//!
//! Extraction runs in two phases: [`CallTreeExtractor::extract`] walks the
//! tree once and fills an [`Accumulation`] of raw per-class counts, then
//! [`Accumulation::finalize`] turns the counts into a [`FeatureTable`] of
//! derived ratios.

pub mod accumulator;
pub mod extractor;
pub mod table;

pub use accumulator::{Accumulation, ClassAccumulator};
pub use extractor::CallTreeExtractor;
pub use table::{ClassFeatures, FeatureTable};

/// Emitted for any ratio whose denominator is zero.
pub const UNDEFINED: f64 = -1.0;

/// Decimal digits kept on every derived value.
pub const ROUND_DIGITS: i32 = 3;

/// Round to [`ROUND_DIGITS`] decimals, halves to even.
pub fn round(value: f64) -> f64 {
    let scale = 10f64.powi(ROUND_DIGITS);
    (value * scale).round_ties_even() / scale
}

/// `numerator / denominator`, rounded, or [`UNDEFINED`] when the
/// denominator is zero.
pub fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        UNDEFINED
    } else {
        round(numerator as f64 / denominator as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_uses_sentinel_for_zero_denominator() {
        assert_eq!(ratio(0, 0), UNDEFINED);
        assert_eq!(ratio(7, 0), UNDEFINED);
        assert_eq!(ratio(0, 4), 0.0);
    }

    #[test]
    fn ratio_rounds_to_three_digits() {
        assert_eq!(ratio(1, 3), 0.333);
        assert_eq!(ratio(2, 3), 0.667);
        assert_eq!(ratio(10, 4), 2.5);
    }

    #[test]
    fn ties_round_to_even() {
        assert_eq!(ratio(1, 16), 0.062);
        assert_eq!(ratio(5, 16), 0.312);
        assert_eq!(ratio(3, 16), 0.188);
    }
}
