//! Frozen sizes and bounds. Every number here is part of the wire contract
//! with external consumers (training loop, human-play harness, parity
//! harness) — changing any of them changes the observation layout or the
//! action space and must never happen silently.

/// Observation vector length (spec §4.7).
pub const OBS_DIM: usize = 260;

/// Number of distinct action ids, 0..=68 (spec §4.4).
pub const N_ACTIONS: usize = 69;

/// Graph node count is sampled in `[MIN_NODES, MAX_NODES]`; arrays are
/// always padded to `MAX_NODES`.
pub const MIN_NODES: usize = 8;
pub const MAX_NODES: usize = 32;

/// Neighbor slots per node (undirected adjacency, spec §3).
pub const MAX_NEIGHBORS: usize = 6;

/// Asteroids per cluster node (spec §3).
pub const MAX_ASTEROIDS: usize = 16;

/// Tradeable commodities (spec §3/§4.7), frozen index order.
pub const N_COMMODITIES: usize = 6;

/// Index order for `N_COMMODITIES`. Station-inventory obs fields
/// (256..259) use the first four of these, in this order (spec §4.7).
pub const COMMODITY_IRON: usize = 0;
pub const COMMODITY_WATER_ICE: usize = 1;
pub const COMMODITY_PGE: usize = 2;
pub const COMMODITY_RARE_ISOTOPES: usize = 3;
pub const COMMODITY_SILICATES: usize = 4;
pub const COMMODITY_VOLATILES: usize = 5;

/// Base prices per commodity, in frozen index order (SPEC_FULL §3).
pub const BASE_PRICE: [f64; N_COMMODITIES] = [40.0, 12.0, 2200.0, 5200.0, 6.0, 20.0];

/// Per-commodity clamp bounds as multiples of `BASE_PRICE` (SPEC_FULL §3).
pub const PRICE_MIN_MULT: f64 = 0.15;
pub const PRICE_MAX_MULT: f64 = 6.0;

/// Ship scalar bounds (spec §3).
pub const FUEL_MAX: f64 = 1000.0;
pub const HULL_MAX: f64 = 100.0;
pub const HEAT_MAX: f64 = 100.0;
pub const TOOL_MAX: f64 = 100.0;
pub const CARGO_MAX: f64 = 200.0;
pub const ALERT_MAX: f64 = 100.0;

/// Fixed PCG32 stream used by every episode (spec §3: "Rng").
pub const EPISODE_STREAM: u64 = 54;

/// Node types (spec §3).
pub const NODE_STATION: u8 = 0;
pub const NODE_CLUSTER: u8 = 1;
pub const NODE_HAZARD: u8 = 2;

/// Action id boundaries (spec §4.4), kept as named ranges so `action.rs`
/// never hand-writes a magic number twice.
pub const ACTION_TRAVEL_LO: u8 = 0;
pub const ACTION_TRAVEL_HI: u8 = 5;
pub const ACTION_HOLD: u8 = 6;
pub const ACTION_EMERGENCY_BURN: u8 = 7;
pub const ACTION_SCAN_WIDE: u8 = 8;
pub const ACTION_SCAN_FOCUSED: u8 = 9;
pub const ACTION_SCAN_DEEP: u8 = 10;
pub const ACTION_PASSIVE_LISTEN: u8 = 11;
pub const ACTION_SELECT_LO: u8 = 12;
pub const ACTION_SELECT_HI: u8 = 27;
pub const ACTION_MINE_CONSERVATIVE: u8 = 28;
pub const ACTION_MINE_STANDARD: u8 = 29;
pub const ACTION_MINE_AGGRESSIVE: u8 = 30;
pub const ACTION_STABILIZE: u8 = 31;
pub const ACTION_REFINE: u8 = 32;
pub const ACTION_COOLDOWN: u8 = 33;
pub const ACTION_TOOL_MAINTENANCE: u8 = 34;
pub const ACTION_HULL_PATCH: u8 = 35;
pub const ACTION_JETTISON_LO: u8 = 36;
pub const ACTION_JETTISON_HI: u8 = 41;
pub const ACTION_DOCK: u8 = 42;
pub const ACTION_SELL_LO: u8 = 43;
pub const ACTION_SELL_HI: u8 = 60;
pub const ACTION_BUY_FUEL_SMALL: u8 = 61;
pub const ACTION_BUY_FUEL_MED: u8 = 62;
pub const ACTION_BUY_FUEL_LARGE: u8 = 63;
pub const ACTION_BUY_REPAIR_KIT: u8 = 64;
pub const ACTION_BUY_STABILIZER: u8 = 65;
pub const ACTION_BUY_DECOY: u8 = 66;
pub const ACTION_OVERHAUL: u8 = 67;
pub const ACTION_CASH_OUT: u8 = 68;

/// Mining mode multipliers: (yield, heat, wear, alert, noise) (SPEC_FULL §3).
pub const MINE_MULT_CONSERVATIVE: (f64, f64, f64, f64, f64) = (0.6, 0.5, 0.5, 0.4, 0.8);
pub const MINE_MULT_STANDARD: (f64, f64, f64, f64, f64) = (1.0, 1.0, 1.0, 1.0, 1.0);
pub const MINE_MULT_AGGRESSIVE: (f64, f64, f64, f64, f64) = (1.6, 2.0, 1.8, 1.8, 1.3);

/// Scan mode parameters: (blend, conf_gain, noise_mult) (spec §4.5).
pub const SCAN_WIDE: (f64, f64, f64) = (0.22, 0.10, 1.35);
pub const SCAN_FOCUSED: (f64, f64, f64) = (0.42, 0.20, 1.0);
pub const SCAN_DEEP: (f64, f64, f64) = (0.80, 0.45, 0.55);

/// Default episode time budget and invalid-action penalty (spec §6).
pub const DEFAULT_TIME_MAX: f64 = 20_000.0;
pub const DEFAULT_INVALID_ACTION_PENALTY: f64 = 0.01;

/// Normalization caps used only by the observation packer (spec §4.7);
/// never appear in the dynamics, only in how state is presented.
pub const OBS_CREDITS_LOG_CAP: f64 = 1e7;
pub const OBS_CONSUMABLE_CAP: f64 = 10.0;
pub const OBS_TRAVEL_TIME_CAP: f64 = 8.0;
pub const OBS_FUEL_COST_CAP: f64 = 160.0;
pub const OBS_STATION_INVENTORY_CAP: f64 = 500.0;
pub const OBS_ASTEROID_COMPONENT_FLOOR: f64 = 1e-8;
