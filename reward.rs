//! Closed-form shaped reward (spec §4.6). Every term is a plain difference
//! of a pre/post snapshot; the whole function is pure and must never
//! produce NaN/Inf (checked by the episode-level finiteness test).

use crate::constants::{HEAT_MAX, N_COMMODITIES};
use crate::valuation::cargo_value;

/// Scalars captured before a step's primary action runs (spec §4.5 step 1).
#[derive(Clone, Copy, Debug)]
pub struct Snapshot {
    pub credits: f64,
    pub fuel: f64,
    pub hull: f64,
    pub tool: f64,
    pub heat: f64,
    pub cargo_value: f64,
    pub value_lost_to_pirates: f64,
}

impl Snapshot {
    pub fn take(
        ship: &crate::state::Ship,
        counters: &crate::state::Counters,
        price: &[f64; N_COMMODITIES],
    ) -> Self {
        Snapshot {
            credits: ship.credits,
            fuel: ship.fuel,
            hull: ship.hull,
            tool: ship.tool,
            heat: ship.heat,
            cargo_value: cargo_value(&ship.cargo, price),
            value_lost_to_pirates: counters.value_lost_to_pirates,
        }
    }
}

/// Terminal classification a step can end in, feeding `r_terminal`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Terminal {
    None,
    Stranded,
    Destroyed,
    CleanDone,
}

#[allow(clippy::too_many_arguments)]
pub fn compute(
    before: Snapshot,
    after: Snapshot,
    dt: u16,
    is_scan_action: bool,
    invalid_action: bool,
    invalid_action_penalty: f64,
    terminal: Terminal,
    credits_after: f64,
) -> f32 {
    let dt_f = (dt as f64).max(0.0);

    let r_sell = (after.credits - before.credits) / 1000.0;
    let r_extract = 0.02 * (after.cargo_value - before.cargo_value).max(0.0) / 1000.0;
    let r_fuel = -0.10 * (before.fuel - after.fuel).max(0.0) / 100.0;
    let r_time = -0.001 * dt_f;
    let r_wear = -0.05 * (before.tool - after.tool).max(0.0) / 10.0;
    let r_damage = -1.00 * (before.hull - after.hull).max(0.0) / 10.0;

    let heat_excess = (after.heat - 0.7 * HEAT_MAX).max(0.0) / HEAT_MAX;
    let r_heat = -0.20 * heat_excess * heat_excess;

    let r_scan = if is_scan_action { -0.005 } else { 0.0 };
    let r_invalid = if invalid_action { -invalid_action_penalty } else { 0.0 };

    let r_pirate = -1.00 * (after.value_lost_to_pirates - before.value_lost_to_pirates) / 1000.0;

    let r_terminal = match terminal {
        Terminal::None => 0.0,
        Terminal::Stranded => -50.0,
        Terminal::Destroyed => -100.0,
        Terminal::CleanDone => 0.002 * credits_after / 1000.0,
    };

    let r = r_sell
        + r_extract
        + r_fuel
        + r_time
        + r_wear
        + r_damage
        + r_heat
        + r_scan
        + r_invalid
        + r_pirate
        + r_terminal;

    r as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_snapshot() -> Snapshot {
        Snapshot {
            credits: 0.0,
            fuel: 1000.0,
            hull: 100.0,
            tool: 100.0,
            heat: 0.0,
            cargo_value: 0.0,
            value_lost_to_pirates: 0.0,
        }
    }

    #[test]
    fn zero_change_hold_yields_only_time_penalty() {
        let before = base_snapshot();
        let after = before;
        let r = compute(before, after, 1, false, false, 0.01, Terminal::None, 0.0);
        assert!((r - (-0.001)).abs() < 1e-6);
    }

    #[test]
    fn invalid_action_adds_fixed_penalty() {
        let before = base_snapshot();
        let after = before;
        let r = compute(before, after, 1, false, true, 0.01, Terminal::None, 0.0);
        assert!((r - (-0.011)).abs() < 1e-6);
    }

    #[test]
    fn destroyed_terminal_dominates() {
        let before = base_snapshot();
        let mut after = before;
        after.hull = 0.0;
        let r = compute(before, after, 1, false, false, 0.01, Terminal::Destroyed, 0.0);
        assert!(r < -100.0);
    }

    #[test]
    fn reward_is_always_finite() {
        let before = base_snapshot();
        let mut after = before;
        after.credits = 1e12;
        after.cargo_value = 1e12;
        after.value_lost_to_pirates = -1e12;
        let r = compute(before, after, u16::MAX, true, true, 0.01, Terminal::CleanDone, 1e12);
        assert!(r.is_finite());
    }
}
