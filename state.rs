//! Fixed-size per-episode state container (spec §3). Every array here is
//! sized by the frozen constants in `constants.rs` and owned inline — no
//! heap allocation happens once an `EpisodeState` exists, satisfying the
//! steady-state zero-allocation requirement of spec §5.

use crate::constants::*;

/// Undirected travel/hazard graph over up to `MAX_NODES` nodes.
#[derive(Clone, Debug)]
pub struct Graph {
    pub n_nodes: usize,
    pub node_type: [u8; MAX_NODES],
    pub node_hazard: [f64; MAX_NODES],
    pub node_pirate: [f64; MAX_NODES],
    /// `-1` marks an absent neighbor slot.
    pub neighbor: [[i16; MAX_NEIGHBORS]; MAX_NODES],
    pub travel_time: [[u16; MAX_NEIGHBORS]; MAX_NODES],
    pub fuel_cost: [[f64; MAX_NEIGHBORS]; MAX_NODES],
    pub edge_threat_true: [[f64; MAX_NEIGHBORS]; MAX_NODES],
    pub edge_threat_est: [[f64; MAX_NEIGHBORS]; MAX_NODES],
    /// BFS distance to node 0, capped at `n_nodes - 1`. Computed once at
    /// generation (spec §3 "Derived").
    pub steps_to_station: [u16; MAX_NODES],
}

impl Graph {
    pub fn empty() -> Self {
        Graph {
            n_nodes: 0,
            node_type: [NODE_STATION; MAX_NODES],
            node_hazard: [0.0; MAX_NODES],
            node_pirate: [0.0; MAX_NODES],
            neighbor: [[-1; MAX_NEIGHBORS]; MAX_NODES],
            travel_time: [[0; MAX_NEIGHBORS]; MAX_NODES],
            fuel_cost: [[0.0; MAX_NEIGHBORS]; MAX_NODES],
            edge_threat_true: [[0.0; MAX_NEIGHBORS]; MAX_NODES],
            edge_threat_est: [[0.5; MAX_NEIGHBORS]; MAX_NODES],
            steps_to_station: [0; MAX_NODES],
        }
    }

    /// Index of the first free neighbor slot at `node`, if any.
    pub fn free_slot(&self, node: usize) -> Option<usize> {
        (0..MAX_NEIGHBORS).find(|&s| self.neighbor[node][s] < 0)
    }

    /// True if `node` already has an edge to `other`.
    pub fn has_edge(&self, node: usize, other: usize) -> bool {
        self.neighbor[node][..MAX_NEIGHBORS].contains(&(other as i16))
    }
}

/// Hidden and estimated per-asteroid fields for every node (spec §3
/// `AsteroidField`). Only cluster nodes ever mark slots `valid`.
#[derive(Clone, Debug)]
pub struct AsteroidField {
    pub valid: [[bool; MAX_ASTEROIDS]; MAX_NODES],
    pub true_comp: [[[f64; N_COMMODITIES]; MAX_ASTEROIDS]; MAX_NODES],
    pub richness: [[f64; MAX_ASTEROIDS]; MAX_NODES],
    pub stability_true: [[f64; MAX_ASTEROIDS]; MAX_NODES],
    pub noise_profile: [[f64; MAX_ASTEROIDS]; MAX_NODES],
    pub comp_est: [[[f64; N_COMMODITIES]; MAX_ASTEROIDS]; MAX_NODES],
    pub stability_est: [[f64; MAX_ASTEROIDS]; MAX_NODES],
    pub scan_conf: [[f64; MAX_ASTEROIDS]; MAX_NODES],
    pub depletion: [[f64; MAX_ASTEROIDS]; MAX_NODES],
}

impl AsteroidField {
    pub fn empty() -> Self {
        AsteroidField {
            valid: [[false; MAX_ASTEROIDS]; MAX_NODES],
            true_comp: [[[0.0; N_COMMODITIES]; MAX_ASTEROIDS]; MAX_NODES],
            richness: [[0.0; MAX_ASTEROIDS]; MAX_NODES],
            stability_true: [[0.0; MAX_ASTEROIDS]; MAX_NODES],
            noise_profile: [[0.0; MAX_ASTEROIDS]; MAX_NODES],
            comp_est: [[[0.0; N_COMMODITIES]; MAX_ASTEROIDS]; MAX_NODES],
            stability_est: [[0.0; MAX_ASTEROIDS]; MAX_NODES],
            scan_conf: [[0.0; MAX_ASTEROIDS]; MAX_NODES],
            depletion: [[0.0; MAX_ASTEROIDS]; MAX_NODES],
        }
    }

    /// True once `depletion` has reached 1.0 (spec §3: unmineable).
    #[inline]
    pub fn is_depleted(&self, node: usize, a: usize) -> bool {
        self.depletion[node][a] >= 1.0
    }
}

/// Per-episode market regime (spec §3 `MarketRegime`).
#[derive(Clone, Debug)]
pub struct Market {
    pub phase: [f64; N_COMMODITIES],
    pub period: [f64; N_COMMODITIES],
    pub amplitude: [f64; N_COMMODITIES],
    pub price: [f64; N_COMMODITIES],
    pub prev_price: [f64; N_COMMODITIES],
    pub station_inventory: [f64; N_COMMODITIES],
    pub recent_sales: [f64; N_COMMODITIES],
    pub price_min: [f64; N_COMMODITIES],
    pub price_max: [f64; N_COMMODITIES],
    /// Cumulative elapsed ticks, drives the sinusoidal regime.
    pub t: f64,
}

impl Market {
    pub fn empty() -> Self {
        Market {
            phase: [0.0; N_COMMODITIES],
            period: [0.0; N_COMMODITIES],
            amplitude: [0.0; N_COMMODITIES],
            price: BASE_PRICE,
            prev_price: BASE_PRICE,
            station_inventory: [0.0; N_COMMODITIES],
            recent_sales: [0.0; N_COMMODITIES],
            price_min: BASE_PRICE.map(|p| p * PRICE_MIN_MULT),
            price_max: BASE_PRICE.map(|p| p * PRICE_MAX_MULT),
            t: 0.0,
        }
    }
}

/// Ship scalars, cargo, consumables, and transient buffs (spec §3 `Ship`).
#[derive(Clone, Debug)]
pub struct Ship {
    pub fuel: f64,
    pub hull: f64,
    pub heat: f64,
    pub tool: f64,
    pub alert: f64,
    pub credits: f64,
    pub cargo: [f64; N_COMMODITIES],
    pub repair_kits: u32,
    pub stabilizers: u32,
    pub decoys: u32,
    pub escape_buff_ticks: f64,
    /// Indexed by asteroid slot at the ship's current node.
    pub stabilize_buff_ticks: [f64; MAX_ASTEROIDS],
    pub current_node: usize,
    /// `None` if no asteroid is selected at the current node.
    pub selected_asteroid: Option<usize>,
    /// Set true during a step whose primary action was a mine action;
    /// cleared at the start of every step. Feeds the obs "mining-active"
    /// flag (spec §4.7).
    pub mining_active_this_step: bool,

    pub cargo_util_sum: f64,
    pub cargo_util_weight: f64,
}

impl Ship {
    pub fn empty() -> Self {
        Ship {
            fuel: FUEL_MAX,
            hull: HULL_MAX,
            heat: 0.0,
            tool: TOOL_MAX,
            alert: 0.0,
            credits: 0.0,
            cargo: [0.0; N_COMMODITIES],
            repair_kits: 0,
            stabilizers: 0,
            decoys: 0,
            escape_buff_ticks: 0.0,
            stabilize_buff_ticks: [0.0; MAX_ASTEROIDS],
            current_node: 0,
            selected_asteroid: None,
            mining_active_this_step: false,
            cargo_util_sum: 0.0,
            cargo_util_weight: 0.0,
        }
    }

    #[inline]
    pub fn cargo_total(&self) -> f64 {
        self.cargo.iter().sum()
    }

    #[inline]
    pub fn at_station(&self) -> bool {
        self.current_node == 0
    }
}

/// Monotonic running counters (spec §3 `Counters`).
#[derive(Clone, Debug)]
pub struct Counters {
    pub total_spend: f64,
    pub overheat_ticks: u64,
    pub pirate_encounters: u64,
    pub value_lost_to_pirates: f64,
    pub scan_count: u64,
    pub mining_ticks: u64,
    pub fuel_start: f64,
    pub hull_start: f64,
    pub tool_start: f64,
    pub ticks_elapsed: u64,
}

impl Counters {
    pub fn empty() -> Self {
        Counters {
            total_spend: 0.0,
            overheat_ticks: 0,
            pirate_encounters: 0,
            value_lost_to_pirates: 0.0,
            scan_count: 0,
            mining_ticks: 0,
            fuel_start: FUEL_MAX,
            hull_start: HULL_MAX,
            tool_start: TOOL_MAX,
            ticks_elapsed: 0,
        }
    }
}
