//! Per-episode world generation (spec §4.3). Draw order is part of the
//! parity contract: node count, then per-node type/hazard/pirate, then the
//! spanning tree, then extra random edges, then BFS distances, then
//! per-cluster asteroid fields, then the market regime. `reference.rs`
//! reproduces this order independently over its own (non-fixed-array)
//! representation.

use crate::constants::*;
use crate::dist;
use crate::rng::Rng;
use crate::state::{AsteroidField, Graph, Market};

const HAZARD_PROB: f64 = 0.25;
const MIN_ASTEROIDS_PER_CLUSTER: u32 = 4;
const MAX_ASTEROIDS_PER_CLUSTER: u32 = MAX_ASTEROIDS as u32;

/// Generate a fresh graph, asteroid field, and market regime, consuming
/// `rng` in the documented order.
pub fn generate(rng: &mut Rng) -> (Graph, AsteroidField, Market) {
    let graph = generate_graph(rng);
    let asteroids = generate_asteroids(rng, &graph);
    let market = generate_market(rng);
    (graph, asteroids, market)
}

fn generate_graph(rng: &mut Rng) -> Graph {
    let mut g = Graph::empty();

    let n_nodes = MIN_NODES + dist::u32_range(rng, 0, (MAX_NODES - MIN_NODES + 1) as u32) as usize;
    g.n_nodes = n_nodes;
    g.node_type[0] = NODE_STATION;

    for i in 1..n_nodes {
        let is_hazard = dist::uniform(rng, 0.0, 1.0) < HAZARD_PROB;
        g.node_type[i] = if is_hazard { NODE_HAZARD } else { NODE_CLUSTER };
        if is_hazard {
            g.node_hazard[i] = dist::uniform(rng, 0.35, 1.0);
            g.node_pirate[i] = dist::uniform(rng, 0.25, 0.9);
        } else {
            g.node_hazard[i] = dist::uniform(rng, 0.0, 0.3);
            g.node_pirate[i] = dist::uniform(rng, 0.0, 0.25);
        }
    }

    // Spanning tree: connect each new node to a uniformly chosen
    // already-present parent.
    for i in 1..n_nodes {
        let parent = dist::u32_range(rng, 0, i as u32) as usize;
        add_edge(rng, &mut g, i, parent);
    }

    // N extra random edge attempts.
    for _ in 0..n_nodes {
        let a = dist::u32_range(rng, 0, n_nodes as u32) as usize;
        let b = dist::u32_range(rng, 0, n_nodes as u32) as usize;
        if a == b || g.has_edge(a, b) {
            continue;
        }
        if g.free_slot(a).is_some() && g.free_slot(b).is_some() {
            add_edge(rng, &mut g, a, b);
        }
    }

    compute_steps_to_station(&mut g);
    g
}

fn add_edge(rng: &mut Rng, g: &mut Graph, a: usize, b: usize) {
    let (Some(sa), Some(sb)) = (g.free_slot(a), g.free_slot(b)) else {
        return;
    };
    let travel_time = 1 + dist::u32_range(rng, 0, 8) as u16;
    let fuel_cost = dist::uniform(rng, 20.0, 112.0);
    let threat_true = dist::uniform(rng, 0.0, 1.0);

    g.neighbor[a][sa] = b as i16;
    g.travel_time[a][sa] = travel_time;
    g.fuel_cost[a][sa] = fuel_cost;
    g.edge_threat_true[a][sa] = threat_true;
    g.edge_threat_est[a][sa] = 0.5;

    g.neighbor[b][sb] = a as i16;
    g.travel_time[b][sb] = travel_time;
    g.fuel_cost[b][sb] = fuel_cost;
    g.edge_threat_true[b][sb] = threat_true;
    g.edge_threat_est[b][sb] = 0.5;
}

fn compute_steps_to_station(g: &mut Graph) {
    let mut dist_arr = [u16::MAX; MAX_NODES];
    let mut queue: Vec<usize> = Vec::with_capacity(g.n_nodes);
    dist_arr[0] = 0;
    queue.push(0);
    let mut head = 0;
    while head < queue.len() {
        let node = queue[head];
        head += 1;
        for slot in 0..MAX_NEIGHBORS {
            let nb = g.neighbor[node][slot];
            if nb < 0 {
                continue;
            }
            let nb = nb as usize;
            if dist_arr[nb] == u16::MAX {
                dist_arr[nb] = dist_arr[node] + 1;
                queue.push(nb);
            }
        }
    }
    let cap = (g.n_nodes.max(1) - 1) as u16;
    for i in 0..g.n_nodes {
        g.steps_to_station[i] = dist_arr[i].min(cap);
    }
}

fn generate_asteroids(rng: &mut Rng, g: &Graph) -> AsteroidField {
    let mut field = AsteroidField::empty();
    for node in 0..g.n_nodes {
        if g.node_type[node] != NODE_CLUSTER {
            continue;
        }
        let span = MAX_ASTEROIDS_PER_CLUSTER - MIN_ASTEROIDS_PER_CLUSTER + 1;
        let count = MIN_ASTEROIDS_PER_CLUSTER + dist::u32_range(rng, 0, span);
        for a in 0..count as usize {
            field.valid[node][a] = true;
            dist::dirichlet_ones_into(rng, N_COMMODITIES, &mut field.true_comp[node][a]);
            let richness = dist::lognormal(rng, 0.0, 0.6).clamp(0.2, 4.0);
            field.richness[node][a] = richness;
            field.stability_true[node][a] = dist::beta_3_2(rng);
            field.noise_profile[node][a] = dist::uniform(rng, 0.04, 0.22);
            dist::dirichlet_ones_into(rng, N_COMMODITIES, &mut field.comp_est[node][a]);
            field.stability_est[node][a] = 0.5;
            field.scan_conf[node][a] = 0.1;
            field.depletion[node][a] = 0.0;
        }
    }
    field
}

fn generate_market(rng: &mut Rng) -> Market {
    let mut m = Market::empty();
    for c in 0..N_COMMODITIES {
        m.phase[c] = dist::uniform(rng, 0.0, std::f64::consts::TAU);
        m.period[c] = dist::uniform(rng, 180.0, 380.0);
        m.amplitude[c] = BASE_PRICE[c] * dist::uniform(rng, 0.10, 0.30);
        m.station_inventory[c] = dist::uniform(rng, 20.0, 120.0);
        m.recent_sales[c] = 0.0;
        m.price[c] = BASE_PRICE[c];
        m.prev_price[c] = BASE_PRICE[c];
    }
    m.t = 0.0;
    m
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_is_connected_and_node_zero_is_station() {
        for seed in 0..50u64 {
            let mut rng = Rng::seed(seed, EPISODE_STREAM);
            let (g, _, _) = generate(&mut rng);
            assert_eq!(g.node_type[0], NODE_STATION);
            assert!((MIN_NODES..=MAX_NODES).contains(&g.n_nodes));
            for i in 0..g.n_nodes {
                assert_ne!(g.steps_to_station[i], u16::MAX, "node {i} unreachable");
            }
        }
    }

    #[test]
    fn station_nodes_never_get_asteroids() {
        let mut rng = Rng::seed(1, EPISODE_STREAM);
        let (g, asteroids, _) = generate(&mut rng);
        assert!(!asteroids.valid[0].iter().any(|&v| v));
        for i in 0..g.n_nodes {
            if g.node_type[i] != NODE_CLUSTER {
                assert!(
                    !asteroids.valid[i].iter().any(|&v| v),
                    "non-cluster node {i} has asteroids"
                );
            }
        }
    }

    #[test]
    fn asteroid_composition_sums_to_one() {
        let mut rng = Rng::seed(2, EPISODE_STREAM);
        let (g, asteroids, _) = generate(&mut rng);
        for node in 0..g.n_nodes {
            for a in 0..MAX_ASTEROIDS {
                if asteroids.valid[node][a] {
                    let sum: f64 = asteroids.true_comp[node][a].iter().sum();
                    assert!((sum - 1.0).abs() < 1e-9);
                    let sum_est: f64 = asteroids.comp_est[node][a].iter().sum();
                    assert!((sum_est - 1.0).abs() < 1e-9);
                }
            }
        }
    }

    #[test]
    fn generation_is_deterministic() {
        let mut a = Rng::seed(123, EPISODE_STREAM);
        let mut b = Rng::seed(123, EPISODE_STREAM);
        let (ga, aa, ma) = generate(&mut a);
        let (gb, ab, mb) = generate(&mut b);
        assert_eq!(ga.n_nodes, gb.n_nodes);
        assert_eq!(ga.node_type, gb.node_type);
        assert_eq!(aa.valid, ab.valid);
        assert_eq!(ma.price, mb.price);
    }
}
