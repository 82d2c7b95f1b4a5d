//! Action decoding and precondition validation (spec §4.4). Decoding is a
//! dense match over the frozen id ranges — a total function, allocation
//! free. Validation depends on current episode state and is checked
//! separately by `dynamics.rs` before applying an action's primary effect.

use crate::constants::*;
use crate::state::{AsteroidField, Graph, Ship};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MiningMode {
    Conservative,
    Standard,
    Aggressive,
}

impl MiningMode {
    /// `(yield, heat, wear, alert, noise)` multipliers (SPEC_FULL §3).
    pub fn multipliers(self) -> (f64, f64, f64, f64, f64) {
        match self {
            MiningMode::Conservative => MINE_MULT_CONSERVATIVE,
            MiningMode::Standard => MINE_MULT_STANDARD,
            MiningMode::Aggressive => MINE_MULT_AGGRESSIVE,
        }
    }

    /// Fracture-risk weight contributed by the chosen aggressiveness,
    /// feeding the fracture-roll logistic in `dynamics::apply_mine`.
    pub fn aggression(self) -> f64 {
        match self {
            MiningMode::Conservative => 0.2,
            MiningMode::Standard => 0.5,
            MiningMode::Aggressive => 0.9,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SellBucket {
    Pct25,
    Pct50,
    Pct100,
}

impl SellBucket {
    pub fn fraction(self) -> f64 {
        match self {
            SellBucket::Pct25 => 0.25,
            SellBucket::Pct50 => 0.50,
            SellBucket::Pct100 => 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FuelSize {
    Small,
    Medium,
    Large,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Travel(usize),
    Hold,
    EmergencyBurn,
    ScanWide,
    ScanFocused,
    ScanDeep,
    PassiveListen,
    Select(usize),
    Mine(MiningMode),
    Stabilize,
    Refine,
    Cooldown,
    ToolMaintenance,
    HullPatch,
    Jettison(usize),
    Dock,
    Sell(usize, SellBucket),
    BuyFuel(FuelSize),
    BuyRepairKit,
    BuyStabilizer,
    BuyDecoy,
    Overhaul,
    CashOut,
}

/// Decode a raw action id. `None` for any id `>= N_ACTIONS` (spec §4.4:
/// "any integer >= 69 is invalid").
pub fn decode(action_id: u8) -> Option<Action> {
    match action_id {
        ACTION_TRAVEL_LO..=ACTION_TRAVEL_HI => Some(Action::Travel(action_id as usize)),
        ACTION_HOLD => Some(Action::Hold),
        ACTION_EMERGENCY_BURN => Some(Action::EmergencyBurn),
        ACTION_SCAN_WIDE => Some(Action::ScanWide),
        ACTION_SCAN_FOCUSED => Some(Action::ScanFocused),
        ACTION_SCAN_DEEP => Some(Action::ScanDeep),
        ACTION_PASSIVE_LISTEN => Some(Action::PassiveListen),
        ACTION_SELECT_LO..=ACTION_SELECT_HI => {
            Some(Action::Select((action_id - ACTION_SELECT_LO) as usize))
        }
        ACTION_MINE_CONSERVATIVE => Some(Action::Mine(MiningMode::Conservative)),
        ACTION_MINE_STANDARD => Some(Action::Mine(MiningMode::Standard)),
        ACTION_MINE_AGGRESSIVE => Some(Action::Mine(MiningMode::Aggressive)),
        ACTION_STABILIZE => Some(Action::Stabilize),
        ACTION_REFINE => Some(Action::Refine),
        ACTION_COOLDOWN => Some(Action::Cooldown),
        ACTION_TOOL_MAINTENANCE => Some(Action::ToolMaintenance),
        ACTION_HULL_PATCH => Some(Action::HullPatch),
        ACTION_JETTISON_LO..=ACTION_JETTISON_HI => {
            Some(Action::Jettison((action_id - ACTION_JETTISON_LO) as usize))
        }
        ACTION_DOCK => Some(Action::Dock),
        ACTION_SELL_LO..=ACTION_SELL_HI => {
            let offset = action_id - ACTION_SELL_LO;
            let commodity = (offset / 3) as usize;
            let bucket = match offset % 3 {
                0 => SellBucket::Pct25,
                1 => SellBucket::Pct50,
                _ => SellBucket::Pct100,
            };
            Some(Action::Sell(commodity, bucket))
        }
        ACTION_BUY_FUEL_SMALL => Some(Action::BuyFuel(FuelSize::Small)),
        ACTION_BUY_FUEL_MED => Some(Action::BuyFuel(FuelSize::Medium)),
        ACTION_BUY_FUEL_LARGE => Some(Action::BuyFuel(FuelSize::Large)),
        ACTION_BUY_REPAIR_KIT => Some(Action::BuyRepairKit),
        ACTION_BUY_STABILIZER => Some(Action::BuyStabilizer),
        ACTION_BUY_DECOY => Some(Action::BuyDecoy),
        ACTION_OVERHAUL => Some(Action::Overhaul),
        ACTION_CASH_OUT => Some(Action::CashOut),
        _ => None,
    }
}

/// Price of each purchasable bundle: `(fuel_delta, credit_cost)`.
pub fn fuel_bundle(size: FuelSize) -> (f64, f64) {
    match size {
        FuelSize::Small => (150.0, 30.0),
        FuelSize::Medium => (400.0, 70.0),
        FuelSize::Large => (1000.0, 150.0),
    }
}

pub const REPAIR_KIT_COST: f64 = 40.0;
pub const STABILIZER_COST: f64 = 35.0;
pub const DECOY_COST: f64 = 25.0;
pub const OVERHAUL_COST: f64 = 500.0;

/// Check whether `action`'s precondition holds against the current state.
/// A `false` result means the caller must fall back to the hold body with
/// the invalid-action penalty (spec §4.4/§4.5).
pub fn is_valid(action: Action, ship: &Ship, graph: &Graph, asteroids: &AsteroidField) -> bool {
    let node = ship.current_node;
    let at_station = ship.at_station();
    let selection_ok = |a: usize| asteroids.valid[node][a] && !asteroids.is_depleted(node, a);

    match action {
        Action::Travel(slot) => graph.neighbor[node][slot] >= 0,
        Action::Hold => true,
        Action::EmergencyBurn => ship.fuel >= 60.0,
        Action::ScanWide => graph.node_type[node] == NODE_CLUSTER,
        Action::ScanFocused | Action::ScanDeep => {
            graph.node_type[node] == NODE_CLUSTER
                && ship.selected_asteroid.is_some_and(selection_ok)
        }
        Action::PassiveListen => true,
        Action::Select(a) => graph.node_type[node] == NODE_CLUSTER && a < MAX_ASTEROIDS && selection_ok(a),
        Action::Mine(_) => ship.selected_asteroid.is_some_and(selection_ok),
        Action::Stabilize => ship.selected_asteroid.is_some_and(selection_ok) && ship.stabilizers > 0,
        Action::Refine => ship.cargo_total() > 0.0,
        Action::Cooldown => true,
        Action::ToolMaintenance => true,
        Action::HullPatch => ship.repair_kits > 0,
        Action::Jettison(c) => c < N_COMMODITIES,
        Action::Dock => at_station,
        Action::Sell(c, _) => at_station && c < N_COMMODITIES,
        Action::BuyFuel(size) => {
            at_station && ship.credits >= fuel_bundle(size).1
        }
        Action::BuyRepairKit => at_station && ship.credits >= REPAIR_KIT_COST,
        Action::BuyStabilizer => at_station && ship.credits >= STABILIZER_COST,
        Action::BuyDecoy => at_station && ship.credits >= DECOY_COST,
        Action::Overhaul => at_station && ship.credits >= OVERHAUL_COST,
        Action::CashOut => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_id_below_69_decodes() {
        for id in 0..N_ACTIONS as u16 {
            assert!(decode(id as u8).is_some(), "action {id} failed to decode");
        }
    }

    #[test]
    fn ids_at_or_above_69_are_invalid() {
        for id in N_ACTIONS as u16..256 {
            assert!(decode(id as u8).is_none());
        }
    }

    #[test]
    fn sell_action_ids_cover_all_commodity_bucket_pairs() {
        let mut seen = std::collections::HashSet::new();
        for id in ACTION_SELL_LO..=ACTION_SELL_HI {
            if let Some(Action::Sell(c, bucket)) = decode(id) {
                assert!(seen.insert((c, bucket as u8 as usize)));
                assert!(c < N_COMMODITIES);
            } else {
                panic!("action {id} did not decode as Sell");
            }
        }
        assert_eq!(seen.len(), N_COMMODITIES * 3);
    }
}
