//! JSON-serializable render-state projection for an external replay
//! recorder (spec §6). Deliberately looser than the core contract: no
//! tolerance rules apply to this view, and its schema may grow without
//! breaking parity, as long as it stays a pure function of the state with
//! no hidden RNG draws.

use serde::Serialize;

use crate::constants::N_COMMODITIES;
use crate::state::{AsteroidField, Graph, Market, Ship};

#[derive(Clone, Debug, Serialize)]
pub struct NeighborSummary {
    pub slot: usize,
    pub node: usize,
    pub node_type: &'static str,
    pub travel_time: u16,
    pub fuel_cost: f64,
    pub edge_threat_est: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct AsteroidSummary {
    pub slot: usize,
    pub comp_est: [f64; N_COMMODITIES],
    pub stability_est: f64,
    pub depletion: f64,
    pub scan_conf: f64,
    pub selected: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct RenderState {
    pub fuel: f64,
    pub hull: f64,
    pub heat: f64,
    pub tool: f64,
    pub alert: f64,
    pub credits: f64,
    pub cargo: [f64; N_COMMODITIES],
    pub current_node: usize,
    pub current_node_type: &'static str,
    pub neighbors: Vec<NeighborSummary>,
    pub asteroids: Vec<AsteroidSummary>,
    pub prices: [f64; N_COMMODITIES],
}

fn node_type_name(t: u8) -> &'static str {
    match t {
        crate::constants::NODE_STATION => "station",
        crate::constants::NODE_CLUSTER => "cluster",
        _ => "hazard",
    }
}

impl RenderState {
    pub fn capture(ship: &Ship, graph: &Graph, asteroids: &AsteroidField, market: &Market) -> Self {
        let node = ship.current_node;

        let neighbors = (0..crate::constants::MAX_NEIGHBORS)
            .filter(|&slot| graph.neighbor[node][slot] >= 0)
            .map(|slot| {
                let n = graph.neighbor[node][slot] as usize;
                NeighborSummary {
                    slot,
                    node: n,
                    node_type: node_type_name(graph.node_type[n]),
                    travel_time: graph.travel_time[node][slot],
                    fuel_cost: graph.fuel_cost[node][slot],
                    edge_threat_est: graph.edge_threat_est[node][slot],
                }
            })
            .collect();

        let asteroid_summaries = (0..crate::constants::MAX_ASTEROIDS)
            .filter(|&a| asteroids.valid[node][a])
            .map(|a| AsteroidSummary {
                slot: a,
                comp_est: asteroids.comp_est[node][a],
                stability_est: asteroids.stability_est[node][a],
                depletion: asteroids.depletion[node][a],
                scan_conf: asteroids.scan_conf[node][a],
                selected: ship.selected_asteroid == Some(a),
            })
            .collect();

        RenderState {
            fuel: ship.fuel,
            hull: ship.hull,
            heat: ship.heat,
            tool: ship.tool,
            alert: ship.alert,
            credits: ship.credits,
            cargo: ship.cargo,
            current_node: node,
            current_node_type: node_type_name(graph.node_type[node]),
            neighbors,
            asteroids: asteroid_summaries,
            prices: market.price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::Rng;
    use crate::world;

    #[test]
    fn capture_round_trips_through_json() {
        let mut rng = Rng::seed(3, crate::constants::EPISODE_STREAM);
        let (graph, asteroids, market) = world::generate(&mut rng);
        let ship = Ship::empty();
        let state = RenderState::capture(&ship, &graph, &asteroids, &market);
        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"current_node\""));
    }

    #[test]
    fn identical_states_produce_identical_render_state() {
        let mut rng = Rng::seed(3, crate::constants::EPISODE_STREAM);
        let (graph, asteroids, market) = world::generate(&mut rng);
        let ship = Ship::empty();
        let a = serde_json::to_string(&RenderState::capture(&ship, &graph, &asteroids, &market)).unwrap();
        let b = serde_json::to_string(&RenderState::capture(&ship, &graph, &asteroids, &market)).unwrap();
        assert_eq!(a, b);
    }
}
