//! Observation packer (spec §4.7). Writes the frozen 260-float layout in
//! place; fields never explicitly set are left at zero from the caller's
//! buffer reset. Field boundaries are exact and must never drift — this is
//! the tightest external contract the core has, tighter even than the
//! action space.

use crate::constants::*;
use crate::state::{AsteroidField, Graph, Market, Ship};

/// Write the 260-field observation for the current state into `out`.
/// `time_remaining`/`time_max` are owned by `Episode`, not `Ship`.
pub fn pack(
    out: &mut [f32; OBS_DIM],
    ship: &Ship,
    graph: &Graph,
    asteroids: &AsteroidField,
    market: &Market,
    time_remaining: f64,
    time_max: f64,
) {
    out.fill(0.0);
    pack_scalars(out, ship, graph, time_remaining, time_max);
    pack_neighbors(out, ship, graph);
    pack_asteroids(out, ship, asteroids);
    pack_market(out, market);
}

fn frac(x: f64, max: f64) -> f32 {
    (x / max).clamp(0.0, 1.0) as f32
}

fn pack_scalars(out: &mut [f32; OBS_DIM], ship: &Ship, graph: &Graph, time_remaining: f64, time_max: f64) {
    out[0] = frac(ship.fuel, FUEL_MAX);
    out[1] = frac(ship.hull, HULL_MAX);
    out[2] = frac(ship.heat, HEAT_MAX);
    out[3] = frac(ship.tool, TOOL_MAX);
    out[4] = frac(ship.cargo_total(), CARGO_MAX);
    out[5] = frac(ship.alert, ALERT_MAX);
    out[6] = frac(time_remaining, time_max);

    out[7] = ((ship.credits.max(0.0) + 1.0).ln() / (OBS_CREDITS_LOG_CAP + 1.0).ln())
        .clamp(0.0, 1.0) as f32;

    for c in 0..N_COMMODITIES {
        out[8 + c] = frac(ship.cargo[c], CARGO_MAX);
    }

    out[14] = (ship.repair_kits as f64 / OBS_CONSUMABLE_CAP).clamp(0.0, 1.0) as f32;
    out[15] = (ship.stabilizers as f64 / OBS_CONSUMABLE_CAP).clamp(0.0, 1.0) as f32;
    out[16] = (ship.decoys as f64 / OBS_CONSUMABLE_CAP).clamp(0.0, 1.0) as f32;

    out[17] = if ship.at_station() { 1.0 } else { 0.0 };
    out[18] = if ship.mining_active_this_step { 1.0 } else { 0.0 };

    let node_type = graph.node_type[ship.current_node];
    out[19] = (node_type == NODE_STATION) as u8 as f32;
    out[20] = (node_type == NODE_CLUSTER) as u8 as f32;
    out[21] = (node_type == NODE_HAZARD) as u8 as f32;

    let node_denom = (MAX_NODES - 1) as f64;
    out[22] = (ship.current_node as f64 / node_denom) as f32;
    out[23] = (graph.steps_to_station[ship.current_node] as f64 / node_denom) as f32;
}

fn pack_neighbors(out: &mut [f32; OBS_DIM], ship: &Ship, graph: &Graph) {
    let node = ship.current_node;
    for slot in 0..MAX_NEIGHBORS {
        let base = 24 + slot * 7;
        let neighbor = graph.neighbor[node][slot];
        if neighbor < 0 {
            continue;
        }
        let ntype = graph.node_type[neighbor as usize];
        out[base] = 1.0;
        out[base + 1] = (ntype == NODE_STATION) as u8 as f32;
        out[base + 2] = (ntype == NODE_CLUSTER) as u8 as f32;
        out[base + 3] = (ntype == NODE_HAZARD) as u8 as f32;
        out[base + 4] = frac(graph.travel_time[node][slot] as f64, OBS_TRAVEL_TIME_CAP);
        out[base + 5] = frac(graph.fuel_cost[node][slot], OBS_FUEL_COST_CAP);
        out[base + 6] = graph.edge_threat_est[node][slot] as f32;
    }
}

fn pack_asteroids(out: &mut [f32; OBS_DIM], ship: &Ship, asteroids: &AsteroidField) {
    let node = ship.current_node;
    for a in 0..MAX_ASTEROIDS {
        if !asteroids.valid[node][a] {
            continue;
        }
        let base = 68 + a * 11;
        out[base] = 1.0;

        let comp = &asteroids.comp_est[node][a];
        let mut floored = [0.0f64; N_COMMODITIES];
        for c in 0..N_COMMODITIES {
            floored[c] = comp[c].max(OBS_ASTEROID_COMPONENT_FLOOR);
        }
        let sum: f64 = floored.iter().sum();
        for c in 0..N_COMMODITIES {
            out[base + 1 + c] = (floored[c] / sum) as f32;
        }

        out[base + 7] = asteroids.stability_est[node][a] as f32;
        out[base + 8] = asteroids.depletion[node][a] as f32;
        out[base + 9] = asteroids.scan_conf[node][a] as f32;
        out[base + 10] = (ship.selected_asteroid == Some(a)) as u8 as f32;
    }
}

fn pack_market(out: &mut [f32; OBS_DIM], market: &Market) {
    for c in 0..N_COMMODITIES {
        out[244 + c] = (market.price[c] / BASE_PRICE[c]).clamp(0.0, 1.0) as f32;
        out[250 + c] = ((market.price[c] - market.prev_price[c]) / 100.0).clamp(-1.0, 1.0) as f32;
    }
    // spec §4.7: only iron, water_ice, pge, rare_isotopes, in that order.
    let station_commodities = [
        COMMODITY_IRON,
        COMMODITY_WATER_ICE,
        COMMODITY_PGE,
        COMMODITY_RARE_ISOTOPES,
    ];
    for (i, &c) in station_commodities.iter().enumerate() {
        out[256 + i] = frac(market.station_inventory[c], OBS_STATION_INVENTORY_CAP);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::Rng;
    use crate::world;

    #[test]
    fn all_entries_finite_and_in_bounds() {
        let mut rng = Rng::seed(9, EPISODE_STREAM);
        let (graph, asteroids, market) = world::generate(&mut rng);
        let ship = Ship::empty();
        let mut out = [0.0f32; OBS_DIM];
        pack(&mut out, &ship, &graph, &asteroids, &market, 20_000.0, 20_000.0);
        for (i, &v) in out.iter().enumerate() {
            assert!(v.is_finite(), "obs[{i}] not finite");
            if (250..256).contains(&i) {
                assert!((-1.0..=1.0).contains(&v), "obs[{i}]={v} out of [-1,1]");
            } else {
                assert!((0.0..=1.0).contains(&v), "obs[{i}]={v} out of [0,1]");
            }
        }
    }

    #[test]
    fn node_type_one_hot_is_exclusive() {
        let mut rng = Rng::seed(9, EPISODE_STREAM);
        let (graph, asteroids, market) = world::generate(&mut rng);
        let ship = Ship::empty();
        let mut out = [0.0f32; OBS_DIM];
        pack(&mut out, &ship, &graph, &asteroids, &market, 20_000.0, 20_000.0);
        let sum = out[19] + out[20] + out[21];
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn asteroid_component_estimate_sums_to_one() {
        let mut rng = Rng::seed(10, EPISODE_STREAM);
        let (graph, asteroids, market) = world::generate(&mut rng);
        let mut ship = Ship::empty();
        let cluster = (0..graph.n_nodes).find(|&n| asteroids.valid[n][0]).unwrap();
        ship.current_node = cluster;
        let mut out = [0.0f32; OBS_DIM];
        pack(&mut out, &ship, &graph, &asteroids, &market, 20_000.0, 20_000.0);
        let base = 68;
        let sum: f32 = out[base + 1..base + 7].iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
    }
}
