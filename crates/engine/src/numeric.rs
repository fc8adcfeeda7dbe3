//! Decimal arithmetic helpers with explicit rounding.
//!
//! All amounts are `rust_decimal::Decimal`; no `f64` anywhere. Nothing in
//! the engine rounds implicitly: a combining function that needs rounding
//! states the decimal places and strategy through [`Rounding`].

use rust_decimal::Decimal;
pub use rust_decimal::RoundingStrategy;

/// Decimal places plus rounding strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rounding {
    pub dp: u32,
    pub strategy: RoundingStrategy,
}

impl Rounding {
    pub const fn new(dp: u32, strategy: RoundingStrategy) -> Self {
        Rounding { dp, strategy }
    }

    /// Round to whole units.
    pub const fn whole(strategy: RoundingStrategy) -> Self {
        Rounding { dp: 0, strategy }
    }

    pub fn apply(&self, value: Decimal) -> Decimal {
        value.round_dp_with_strategy(self.dp, self.strategy)
    }
}

/// Exact product. The empty product is one. `None` on overflow.
pub fn product(values: impl IntoIterator<Item = Decimal>) -> Option<Decimal> {
    values
        .into_iter()
        .try_fold(Decimal::ONE, |acc, v| acc.checked_mul(v))
}

/// `numerator / denominator`, rounded. `None` on division by zero or
/// overflow.
pub fn divide(numerator: Decimal, denominator: Decimal, rounding: Rounding) -> Option<Decimal> {
    numerator
        .checked_div(denominator)
        .map(|quotient| rounding.apply(quotient))
}

/// `percent` percent of `value`, rounded. `None` on overflow.
pub fn percent_of(value: Decimal, percent: Decimal, rounding: Rounding) -> Option<Decimal> {
    value
        .checked_mul(percent)
        .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
        .map(|v| rounding.apply(v))
}
