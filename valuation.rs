//! Shared small helpers used by both the primary-action dynamics and the
//! reward function, so "current cargo value" always means the same thing
//! everywhere it's read.

use crate::constants::N_COMMODITIES;

/// Mark-to-market value of a cargo hold at current prices.
#[inline]
pub fn cargo_value(cargo: &[f64; N_COMMODITIES], price: &[f64; N_COMMODITIES]) -> f64 {
    cargo.iter().zip(price.iter()).map(|(&q, &p)| q * p).sum()
}

/// Sell-order slippage fraction (spec §4.5): `clamp(0.25r + 0.2*sqrt(r), 0, 0.70)`
/// with `r = q / max(1, inv + q)`.
#[inline]
pub fn slippage(q: f64, inventory: f64) -> f64 {
    let r = q / (inventory + q).max(1.0);
    (0.25 * r + 0.2 * r.sqrt()).clamp(0.0, 0.70)
}

/// Logistic function, `1 / (1 + e^-x)`.
#[inline]
pub fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
