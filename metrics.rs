//! Thirteen-scalar step metric record (spec §4.8).

use crate::state::{Counters, Ship};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StepMetrics {
    pub credits: f64,
    pub net_profit: f64,
    pub profit_per_tick: f64,
    pub survival: f64,
    pub overheat_ticks: u64,
    pub pirate_encounters: u64,
    pub value_lost_to_pirates: f64,
    pub fuel_used: f64,
    pub hull_damage: f64,
    pub tool_wear: f64,
    pub scan_count: u64,
    pub mining_ticks: u64,
    pub cargo_utilization_avg: f64,
}

pub fn compute(ship: &Ship, counters: &Counters, survived: bool) -> StepMetrics {
    let net_profit = ship.credits - counters.total_spend;
    let cargo_utilization_avg = if counters.ticks_elapsed == 0 {
        // cargo_util_weight tracks dt-weighted ticks, not step count; guard
        // the same way since both start at zero together.
        0.0
    } else {
        (ship.cargo_util_sum / ship.cargo_util_weight.max(1.0)).clamp(0.0, 1.0)
    };

    StepMetrics {
        credits: ship.credits,
        net_profit,
        profit_per_tick: net_profit / (counters.ticks_elapsed.max(1) as f64),
        survival: if survived { 1.0 } else { 0.0 },
        overheat_ticks: counters.overheat_ticks,
        pirate_encounters: counters.pirate_encounters,
        value_lost_to_pirates: counters.value_lost_to_pirates,
        fuel_used: (counters.fuel_start - ship.fuel).max(0.0),
        hull_damage: (counters.hull_start - ship.hull).max(0.0),
        tool_wear: (counters.tool_start - ship.tool).max(0.0),
        scan_count: counters.scan_count,
        mining_ticks: counters.mining_ticks,
        cargo_utilization_avg,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_ship_has_zero_derived_metrics() {
        let ship = Ship::empty();
        let mut counters = Counters::empty();
        counters.ticks_elapsed = 1;
        let m = compute(&ship, &counters, true);
        assert_eq!(m.fuel_used, 0.0);
        assert_eq!(m.hull_damage, 0.0);
        assert_eq!(m.tool_wear, 0.0);
        assert_eq!(m.net_profit, 0.0);
        assert_eq!(m.survival, 1.0);
    }

    #[test]
    fn survival_reflects_flag() {
        let ship = Ship::empty();
        let counters = Counters::empty();
        assert_eq!(compute(&ship, &counters, false).survival, 0.0);
    }
}
