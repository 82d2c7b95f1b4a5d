//! Readable reference core (spec §4.10/§9): an independent, `Vec`-based
//! implementation of the same episode semantics as `episode::Episode`.
//! Shares only `rng.rs`/`dist.rs`/`constants.rs` and the frozen action
//! table in `action.rs` with the fast core — world generation, dynamics,
//! and observation packing are written fresh here, over idiomatic growable
//! collections instead of fixed arrays, so the parity harness is comparing
//! two genuinely different code paths rather than one path called twice.
//! The RNG draw order must still match `world.rs`/`dynamics.rs` exactly;
//! that ordering, not the data structures, is the part of the contract
//! that has to agree.

use crate::action::{self, Action, MiningMode, SellBucket};
use crate::config::EpisodeConfig;
use crate::constants::*;
use crate::dist;
use crate::episode::StepResult;
use crate::metrics::StepMetrics;
use crate::reward::{self, Snapshot, Terminal};
use crate::rng::Rng;
use crate::valuation::{cargo_value, logistic};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Station,
    Cluster,
    Hazard,
}

#[derive(Clone, Debug)]
pub struct RefEdge {
    pub to: usize,
    pub travel_time: u16,
    pub fuel_cost: f64,
    pub threat_true: f64,
    pub threat_est: f64,
}

#[derive(Clone, Debug)]
pub struct RefAsteroid {
    pub true_comp: [f64; N_COMMODITIES],
    pub richness: f64,
    pub stability_true: f64,
    pub noise_profile: f64,
    pub comp_est: [f64; N_COMMODITIES],
    pub stability_est: f64,
    pub scan_conf: f64,
    pub depletion: f64,
}

impl RefAsteroid {
    fn is_depleted(&self) -> bool {
        self.depletion >= 1.0
    }
}

#[derive(Clone, Debug)]
pub struct RefNode {
    pub kind: NodeKind,
    pub hazard: f64,
    pub pirate: f64,
    pub edges: Vec<RefEdge>,
    pub asteroids: Vec<RefAsteroid>,
    pub steps_to_station: u32,
}

#[derive(Clone, Debug)]
pub struct RefMarket {
    pub phase: [f64; N_COMMODITIES],
    pub period: [f64; N_COMMODITIES],
    pub amplitude: [f64; N_COMMODITIES],
    pub price: [f64; N_COMMODITIES],
    pub prev_price: [f64; N_COMMODITIES],
    pub station_inventory: [f64; N_COMMODITIES],
    pub recent_sales: [f64; N_COMMODITIES],
    pub price_min: [f64; N_COMMODITIES],
    pub price_max: [f64; N_COMMODITIES],
    pub t: f64,
}

#[derive(Clone, Debug)]
pub struct RefShip {
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
    pub stabilize_buff_ticks: Vec<f64>,
    pub current_node: usize,
    pub selected_asteroid: Option<usize>,
    pub mining_active_this_step: bool,
    pub cargo_util_sum: f64,
    pub cargo_util_weight: f64,
}

impl RefShip {
    fn fresh() -> Self {
        RefShip {
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
            stabilize_buff_ticks: vec![0.0; MAX_ASTEROIDS],
            current_node: 0,
            selected_asteroid: None,
            mining_active_this_step: false,
            cargo_util_sum: 0.0,
            cargo_util_weight: 0.0,
        }
    }

    fn cargo_total(&self) -> f64 {
        self.cargo.iter().sum()
    }

    fn at_station(&self) -> bool {
        self.current_node == 0
    }
}

#[derive(Clone, Debug, Default)]
pub struct RefCounters {
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

impl RefCounters {
    fn fresh() -> Self {
        RefCounters {
            fuel_start: FUEL_MAX,
            hull_start: HULL_MAX,
            tool_start: TOOL_MAX,
            ..Default::default()
        }
    }
}

pub struct ReferenceEpisode {
    config: EpisodeConfig,
    rng: Rng,
    nodes: Vec<RefNode>,
    market: RefMarket,
    ship: RefShip,
    counters: RefCounters,
    time_remaining: f64,
    needs_reset: bool,
    obs: [f32; OBS_DIM],
}

const HAZARD_PROB: f64 = 0.25;
const MIN_ASTEROIDS_PER_CLUSTER: u32 = 4;
const MAX_ASTEROIDS_PER_CLUSTER: u32 = MAX_ASTEROIDS as u32;

impl ReferenceEpisode {
    pub fn new(config: EpisodeConfig) -> Self {
        ReferenceEpisode {
            config,
            rng: Rng::seed(0, EPISODE_STREAM),
            nodes: Vec::new(),
            market: empty_market(),
            ship: RefShip::fresh(),
            counters: RefCounters::fresh(),
            time_remaining: 0.0,
            needs_reset: true,
            obs: [0.0; OBS_DIM],
        }
    }

    pub fn reset(&mut self, seed: u64) {
        self.rng = Rng::seed(seed, EPISODE_STREAM);
        self.nodes = generate_nodes(&mut self.rng);
        self.market = generate_market(&mut self.rng);
        self.ship = RefShip::fresh();
        self.counters = RefCounters::fresh();
        self.time_remaining = self.config.time_max;
        self.needs_reset = false;
        self.pack_obs();
    }

    pub fn obs(&self) -> &[f32; OBS_DIM] {
        &self.obs
    }

    pub fn step(&mut self, action_id: u8) -> StepResult {
        if self.needs_reset {
            self.pack_obs();
            return StepResult {
                obs: self.obs,
                reward: 0.0,
                terminated: true,
                truncated: false,
                invalid_action: true,
                dt: 0,
                action: -1,
                metrics: self.compute_metrics(false),
                time_remaining: self.time_remaining as f32,
            };
        }

        self.ship.mining_active_this_step = false;
        let decoded = action::decode(action_id);
        let precondition_ok = decoded.map(|a| self.is_valid(a)).unwrap_or(false);

        let before = Snapshot {
            credits: self.ship.credits,
            fuel: self.ship.fuel,
            hull: self.ship.hull,
            tool: self.ship.tool,
            heat: self.ship.heat,
            cargo_value: cargo_value(&self.ship.cargo, &self.market.price),
            value_lost_to_pirates: self.counters.value_lost_to_pirates,
        };

        let (resolved_action, invalid_action, dt) = if precondition_ok {
            let a = decoded.unwrap();
            if matches!(a, Action::Mine(_)) {
                self.ship.mining_active_this_step = true;
            }
            let dt = self.apply_primary(a);
            (action_id as i16, false, dt)
        } else {
            (ACTION_HOLD as i16, true, 1)
        };

        let is_scan_action = matches!(
            decoded,
            Some(Action::ScanWide) | Some(Action::ScanFocused) | Some(Action::ScanDeep)
        );

        self.apply_passive(dt);
        self.counters.ticks_elapsed += dt as u64;

        let destroyed = self.ship.hull <= 0.0;
        let stranded = !destroyed && self.ship.fuel <= 0.0 && !self.ship.at_station();
        let forced_terminated = matches!(decoded, Some(Action::CashOut)) && precondition_ok;
        let terminated = destroyed || stranded || forced_terminated;
        let truncated = !terminated && self.time_remaining <= 0.0;
        let done = terminated || truncated;

        let terminal = if destroyed {
            Terminal::Destroyed
        } else if stranded {
            Terminal::Stranded
        } else if done {
            Terminal::CleanDone
        } else {
            Terminal::None
        };

        let after = Snapshot {
            credits: self.ship.credits,
            fuel: self.ship.fuel,
            hull: self.ship.hull,
            tool: self.ship.tool,
            heat: self.ship.heat,
            cargo_value: cargo_value(&self.ship.cargo, &self.market.price),
            value_lost_to_pirates: self.counters.value_lost_to_pirates,
        };
        let reward = reward::compute(
            before,
            after,
            dt,
            is_scan_action,
            invalid_action,
            self.config.invalid_action_penalty,
            terminal,
            self.ship.credits,
        );

        self.pack_obs();
        let survived = !destroyed && !stranded;
        let metrics = self.compute_metrics(survived);

        if done {
            self.needs_reset = true;
        }

        StepResult {
            obs: self.obs,
            reward,
            terminated,
            truncated,
            invalid_action,
            dt,
            action: resolved_action,
            metrics,
            time_remaining: self.time_remaining as f32,
        }
    }

    fn compute_metrics(&self, survived: bool) -> StepMetrics {
        let net_profit = self.ship.credits - self.counters.total_spend;
        let cargo_utilization_avg = if self.counters.ticks_elapsed == 0 {
            0.0
        } else {
            (self.ship.cargo_util_sum / self.ship.cargo_util_weight.max(1.0)).clamp(0.0, 1.0)
        };
        StepMetrics {
            credits: self.ship.credits,
            net_profit,
            profit_per_tick: net_profit / (self.counters.ticks_elapsed.max(1) as f64),
            survival: if survived { 1.0 } else { 0.0 },
            overheat_ticks: self.counters.overheat_ticks,
            pirate_encounters: self.counters.pirate_encounters,
            value_lost_to_pirates: self.counters.value_lost_to_pirates,
            fuel_used: (self.counters.fuel_start - self.ship.fuel).max(0.0),
            hull_damage: (self.counters.hull_start - self.ship.hull).max(0.0),
            tool_wear: (self.counters.tool_start - self.ship.tool).max(0.0),
            scan_count: self.counters.scan_count,
            mining_ticks: self.counters.mining_ticks,
            cargo_utilization_avg,
        }
    }

    fn selection_ok(&self, a: usize) -> bool {
        self.nodes[self.ship.current_node]
            .asteroids
            .get(a)
            .is_some_and(|ast| !ast.is_depleted())
    }

    fn is_valid(&self, action: Action) -> bool {
        let node = &self.nodes[self.ship.current_node];
        let at_station = self.ship.at_station();
        match action {
            Action::Travel(slot) => node.edges.get(slot).is_some(),
            Action::Hold => true,
            Action::EmergencyBurn => self.ship.fuel >= 60.0,
            Action::ScanWide => node.kind == NodeKind::Cluster,
            Action::ScanFocused | Action::ScanDeep => {
                node.kind == NodeKind::Cluster && self.ship.selected_asteroid.is_some_and(|a| self.selection_ok(a))
            }
            Action::PassiveListen => true,
            Action::Select(a) => node.kind == NodeKind::Cluster && self.selection_ok(a),
            Action::Mine(_) => self.ship.selected_asteroid.is_some_and(|a| self.selection_ok(a)),
            Action::Stabilize => {
                self.ship.selected_asteroid.is_some_and(|a| self.selection_ok(a)) && self.ship.stabilizers > 0
            }
            Action::Refine => self.ship.cargo_total() > 0.0,
            Action::Cooldown => true,
            Action::ToolMaintenance => true,
            Action::HullPatch => self.ship.repair_kits > 0,
            Action::Jettison(c) => c < N_COMMODITIES,
            Action::Dock => at_station,
            Action::Sell(c, _) => at_station && c < N_COMMODITIES,
            Action::BuyFuel(size) => at_station && self.ship.credits >= action::fuel_bundle(size).1,
            Action::BuyRepairKit => at_station && self.ship.credits >= action::REPAIR_KIT_COST,
            Action::BuyStabilizer => at_station && self.ship.credits >= action::STABILIZER_COST,
            Action::BuyDecoy => at_station && self.ship.credits >= action::DECOY_COST,
            Action::Overhaul => at_station && self.ship.credits >= action::OVERHAUL_COST,
            Action::CashOut => true,
        }
    }

    fn apply_primary(&mut self, action: Action) -> u16 {
        match action {
            Action::Travel(slot) => self.travel(slot),
            Action::Hold => 1,
            Action::EmergencyBurn => {
                self.ship.fuel -= 60.0;
                self.ship.heat += 15.0;
                self.ship.escape_buff_ticks = 5.0;
                1
            }
            Action::ScanWide | Action::ScanFocused | Action::ScanDeep => self.scan(action),
            Action::PassiveListen => {
                self.passive_listen();
                1
            }
            Action::Select(a) => {
                self.ship.selected_asteroid = Some(a);
                1
            }
            Action::Mine(mode) => self.mine(mode),
            Action::Stabilize => {
                if let Some(a) = self.ship.selected_asteroid {
                    self.ship.stabilizers -= 1;
                    self.ship.stabilize_buff_ticks[a] = 10.0;
                }
                2
            }
            Action::Refine => {
                if self.ship.cargo_total() > 0.0 {
                    for q in self.ship.cargo.iter_mut() {
                        *q *= 1.03;
                    }
                    rescale_cargo(&mut self.ship.cargo);
                }
                self.ship.heat += 8.0;
                self.ship.tool -= 3.0;
                3
            }
            Action::Cooldown => {
                self.ship.heat -= 15.0;
                2
            }
            Action::ToolMaintenance => {
                self.ship.tool = (self.ship.tool + 40.0).min(TOOL_MAX);
                self.ship.heat += 5.0;
                2
            }
            Action::HullPatch => {
                self.ship.repair_kits -= 1;
                self.ship.hull = (self.ship.hull + 35.0).min(HULL_MAX);
                2
            }
            Action::Jettison(c) => {
                self.ship.cargo[c] = 0.0;
                1
            }
            Action::Dock => {
                self.ship.alert = (self.ship.alert - 20.0).max(0.0);
                1
            }
            Action::Sell(c, bucket) => self.sell(c, bucket),
            Action::BuyFuel(size) => {
                let (fuel_delta, cost) = action::fuel_bundle(size);
                self.ship.fuel = (self.ship.fuel + fuel_delta).min(FUEL_MAX);
                self.ship.credits -= cost;
                self.counters.total_spend += cost;
                1
            }
            Action::BuyRepairKit => {
                self.ship.credits -= action::REPAIR_KIT_COST;
                self.counters.total_spend += action::REPAIR_KIT_COST;
                self.ship.repair_kits += 1;
                1
            }
            Action::BuyStabilizer => {
                self.ship.credits -= action::STABILIZER_COST;
                self.counters.total_spend += action::STABILIZER_COST;
                self.ship.stabilizers += 1;
                1
            }
            Action::BuyDecoy => {
                self.ship.credits -= action::DECOY_COST;
                self.counters.total_spend += action::DECOY_COST;
                self.ship.decoys += 1;
                1
            }
            Action::Overhaul => {
                self.ship.credits -= action::OVERHAUL_COST;
                self.counters.total_spend += action::OVERHAUL_COST;
                self.ship.hull = HULL_MAX;
                self.ship.tool = TOOL_MAX;
                self.ship.heat = 0.0;
                5
            }
            Action::CashOut => 1,
        }
    }

    fn travel(&mut self, slot: usize) -> u16 {
        let node = self.ship.current_node;
        let edge = self.nodes[node].edges[slot].clone();
        self.ship.fuel -= edge.fuel_cost;
        self.ship.current_node = edge.to;
        self.ship.selected_asteroid = None;
        self.hazard_and_pirate_tick(edge.threat_true, edge.threat_true, edge.travel_time);
        edge.travel_time
    }

    fn hazard_and_pirate_tick(&mut self, hazard_level: f64, pirate_level: f64, dt: u16) {
        if dt == 0 {
            return;
        }
        let dt_f = dt as f64;
        let jitter = dist::uniform(&mut self.rng, 0.8, 1.2);
        let hazard_effect = hazard_level * dt_f * jitter;
        self.ship.hull -= 0.8 * hazard_effect;
        self.ship.heat += 1.0 * hazard_effect;
        self.ship.alert += 0.5 * hazard_effect;

        let cargo_val = cargo_value(&self.ship.cargo, &self.market.price);
        let escape_norm = (self.ship.escape_buff_ticks.min(5.0) / 5.0).max(0.0);
        let x = 4.0 * pirate_level + 2.0 * (self.ship.alert / ALERT_MAX) + 0.6 * (1.0 + cargo_val / 1000.0).ln()
            - 3.0 * escape_norm
            - 3.0;
        let p = logistic(x);
        let p_dt = 1.0 - (1.0 - p).powf(dt_f);
        if dist::uniform(&mut self.rng, 0.0, 1.0) < p_dt {
            self.realize_pirate_encounter();
        }
    }

    fn realize_pirate_encounter(&mut self) {
        let mut loss = dist::uniform(&mut self.rng, 0.08, 0.20);
        if self.ship.decoys > 0 && dist::uniform(&mut self.rng, 0.0, 1.0) < 0.6 {
            self.ship.decoys -= 1;
            loss *= 0.30;
        }
        let value_before = cargo_value(&self.ship.cargo, &self.market.price);
        for q in self.ship.cargo.iter_mut() {
            *q *= 1.0 - loss;
        }
        let value_after = cargo_value(&self.ship.cargo, &self.market.price);
        self.counters.value_lost_to_pirates += value_before - value_after;

        self.ship.hull -= (1 + dist::u32_range(&mut self.rng, 0, 4)) as f64;
        self.ship.alert = (self.ship.alert + dist::uniform(&mut self.rng, 5.0, 15.0)).min(ALERT_MAX);
        self.counters.pirate_encounters += 1;
    }

    fn scan(&mut self, action: Action) -> u16 {
        let node = self.ship.current_node;
        let (blend, conf_gain, noise_mult, dt) = match action {
            Action::ScanWide => (SCAN_WIDE.0, SCAN_WIDE.1, SCAN_WIDE.2, 3),
            Action::ScanFocused => (SCAN_FOCUSED.0, SCAN_FOCUSED.1, SCAN_FOCUSED.2, 2),
            Action::ScanDeep => (SCAN_DEEP.0, SCAN_DEEP.1, SCAN_DEEP.2, 4),
            _ => unreachable!(),
        };
        let targets: Vec<usize> = match action {
            Action::ScanWide => (0..self.nodes[node].asteroids.len()).collect(),
            _ => self.ship.selected_asteroid.into_iter().collect(),
        };
        for a in targets {
            self.scan_one(node, a, blend, conf_gain, noise_mult);
        }
        self.counters.scan_count += 1;
        dt
    }

    fn scan_one(&mut self, node: usize, a: usize, blend: f64, conf_gain: f64, noise_mult: f64) {
        let sigma = {
            let ast = &self.nodes[node].asteroids[a];
            ast.noise_profile * (1.0 - ast.scan_conf + 0.1) * noise_mult
        };
        let mut noisy = [0.0f64; N_COMMODITIES];
        for c in 0..N_COMMODITIES {
            let truth = self.nodes[node].asteroids[a].true_comp[c];
            noisy[c] = (truth + dist::normal(&mut self.rng, 0.0, sigma)).max(1e-8);
        }
        let sum: f64 = noisy.iter().sum();
        for v in noisy.iter_mut() {
            *v /= sum;
        }
        let noisy_stability =
            (self.nodes[node].asteroids[a].stability_true + dist::normal(&mut self.rng, 0.0, sigma)).clamp(0.0, 1.0);

        let ast = &mut self.nodes[node].asteroids[a];
        let mut blended = [0.0f64; N_COMMODITIES];
        for c in 0..N_COMMODITIES {
            blended[c] = blend * noisy[c] + (1.0 - blend) * ast.comp_est[c];
        }
        let sum: f64 = blended.iter().sum();
        for c in 0..N_COMMODITIES {
            ast.comp_est[c] = (blended[c] / sum).max(1e-8);
        }
        let renorm: f64 = ast.comp_est.iter().sum();
        for v in ast.comp_est.iter_mut() {
            *v /= renorm;
        }
        ast.stability_est = (blend * noisy_stability + (1.0 - blend) * ast.stability_est).clamp(0.0, 1.0);
        ast.scan_conf = (ast.scan_conf + conf_gain).min(1.0);
    }

    fn passive_listen(&mut self) {
        let node = self.ship.current_node;
        for edge in self.nodes[node].edges.iter_mut() {
            edge.threat_est = 0.3 * edge.threat_true + 0.7 * edge.threat_est;
        }
    }

    fn mine(&mut self, mode: MiningMode) -> u16 {
        let node = self.ship.current_node;
        let a = match self.ship.selected_asteroid {
            Some(a) => a,
            None => return 1,
        };
        let (mult_yield, mult_heat, mult_wear, mult_alert, mult_noise) = mode.multipliers();
        let heat_frac = self.ship.heat / HEAT_MAX;
        let tool_frac = self.ship.tool / TOOL_MAX;

        let (richness, depletion, sigma, true_comp, stability_true) = {
            let ast = &self.nodes[node].asteroids[a];
            (
                ast.richness,
                ast.depletion,
                ast.noise_profile * mult_noise,
                ast.true_comp,
                ast.stability_true,
            )
        };

        let scalar = richness
            * (1.0 - depletion)
            * eff_tool(self.ship.tool)
            * eff_heat(heat_frac)
            * mult_yield
            * dist::normal(&mut self.rng, 0.0, sigma).exp();

        let mut extraction = [0.0f64; N_COMMODITIES];
        for c in 0..N_COMMODITIES {
            extraction[c] = scalar * true_comp[c];
        }
        let mut total: f64 = extraction.iter().sum();
        let remaining_capacity = (CARGO_MAX - self.ship.cargo_total()).max(0.0);
        if total > remaining_capacity && total > 0.0 {
            let scale = remaining_capacity / total;
            for v in extraction.iter_mut() {
                *v *= scale;
            }
            total = remaining_capacity;
        }
        for c in 0..N_COMMODITIES {
            self.ship.cargo[c] += extraction[c];
        }

        self.nodes[node].asteroids[a].depletion = (depletion + 0.01 * total).min(1.0);
        self.ship.heat += 6.0 * mult_heat;
        self.ship.tool -= 2.0 * mult_wear;
        self.ship.alert += 1.0 * mult_alert;
        self.counters.mining_ticks += 1;

        let aggression = mode.aggression();
        let heat_excess = ((heat_frac - 0.7) / 0.3).clamp(0.0, 1.0);
        let stabilize_norm = (self.ship.stabilize_buff_ticks[a].min(10.0) / 10.0).max(0.0);
        let x = 2.0 * aggression
            + 2.5 * (1.0 - stability_true)
            + 2.0 * heat_excess
            + 1.0 * (1.0 - tool_frac)
            - 3.0 * stabilize_norm
            - 4.0;
        let p_fracture = logistic(x);
        if dist::uniform(&mut self.rng, 0.0, 1.0) < p_fracture {
            let severity = dist::uniform(&mut self.rng, 0.5, 1.5);
            self.ship.hull -= 12.0 * severity;
            self.nodes[node].asteroids[a].depletion = 1.0;
            self.nodes[node].hazard = (self.nodes[node].hazard + 0.05).min(1.0);
        }

        1
    }

    fn sell(&mut self, c: usize, bucket: SellBucket) -> u16 {
        let q = bucket.fraction() * self.ship.cargo[c];
        if q > 0.0 {
            let slip = crate::valuation::slippage(q, self.market.station_inventory[c]);
            let eff_price = self.market.price[c] * (1.0 - slip);
            self.ship.credits += eff_price * q;
            self.ship.cargo[c] -= q;
            self.market.station_inventory[c] += q;
            self.market.recent_sales[c] += q;
        }
        1
    }

    fn apply_passive(&mut self, dt: u16) {
        let dt_f = dt as f64;
        self.time_remaining = (self.time_remaining - dt_f).max(0.0);
        self.ship.heat -= 2.5 * dt_f;
        self.ship.escape_buff_ticks = (self.ship.escape_buff_ticks - dt_f).max(0.0);
        for buff in self.ship.stabilize_buff_ticks.iter_mut() {
            *buff = (*buff - dt_f).max(0.0);
        }
        if self.ship.heat > HEAT_MAX {
            self.ship.hull -= 1.25 * (self.ship.heat - HEAT_MAX);
            self.ship.heat = HEAT_MAX;
            self.counters.overheat_ticks += dt as u64;
        }

        if !self.ship.at_station() {
            let node = &self.nodes[self.ship.current_node];
            let (hazard, pirate) = (node.hazard, node.pirate);
            self.hazard_and_pirate_tick(hazard, pirate, dt);
        }

        self.market_tick(dt_f);

        self.ship.fuel = self.ship.fuel.clamp(0.0, FUEL_MAX);
        self.ship.hull = self.ship.hull.clamp(0.0, HULL_MAX);
        self.ship.heat = self.ship.heat.clamp(0.0, HEAT_MAX);
        self.ship.tool = self.ship.tool.clamp(0.0, TOOL_MAX);
        self.ship.alert = self.ship.alert.clamp(0.0, ALERT_MAX);
        rescale_cargo(&mut self.ship.cargo);

        let util = (self.ship.cargo_total() / CARGO_MAX).clamp(0.0, 1.0);
        self.ship.cargo_util_sum += util * dt_f;
        self.ship.cargo_util_weight += dt_f;
    }

    fn market_tick(&mut self, dt_f: f64) {
        self.market.t += dt_f;
        for c in 0..N_COMMODITIES {
            self.market.prev_price[c] = self.market.price[c];
            let cycle = self.market.amplitude[c]
                * (std::f64::consts::TAU * self.market.t / self.market.period[c] + self.market.phase[c]).sin();
            let noise = dist::normal(&mut self.rng, 0.0, 0.03 * BASE_PRICE[c] * dt_f.sqrt());
            let raw = BASE_PRICE[c] + cycle - 0.04 * self.market.station_inventory[c]
                - 0.05 * self.market.recent_sales[c]
                + noise;
            self.market.price[c] = raw.clamp(self.market.price_min[c], self.market.price_max[c]);
            self.market.recent_sales[c] *= (-dt_f / 14.0).exp();
            self.market.station_inventory[c] *= 0.998;
        }
    }

    fn pack_obs(&mut self) {
        self.obs.fill(0.0);
        let ship = &self.ship;
        let node = &self.nodes[ship.current_node];

        self.obs[0] = frac(ship.fuel, FUEL_MAX);
        self.obs[1] = frac(ship.hull, HULL_MAX);
        self.obs[2] = frac(ship.heat, HEAT_MAX);
        self.obs[3] = frac(ship.tool, TOOL_MAX);
        self.obs[4] = frac(ship.cargo_total(), CARGO_MAX);
        self.obs[5] = frac(ship.alert, ALERT_MAX);
        self.obs[6] = frac(self.time_remaining, self.config.time_max);
        self.obs[7] = ((ship.credits.max(0.0) + 1.0).ln() / (OBS_CREDITS_LOG_CAP + 1.0).ln()).clamp(0.0, 1.0) as f32;
        for c in 0..N_COMMODITIES {
            self.obs[8 + c] = frac(ship.cargo[c], CARGO_MAX);
        }
        self.obs[14] = (ship.repair_kits as f64 / OBS_CONSUMABLE_CAP).clamp(0.0, 1.0) as f32;
        self.obs[15] = (ship.stabilizers as f64 / OBS_CONSUMABLE_CAP).clamp(0.0, 1.0) as f32;
        self.obs[16] = (ship.decoys as f64 / OBS_CONSUMABLE_CAP).clamp(0.0, 1.0) as f32;
        self.obs[17] = if ship.at_station() { 1.0 } else { 0.0 };
        self.obs[18] = if ship.mining_active_this_step { 1.0 } else { 0.0 };
        self.obs[19] = (node.kind == NodeKind::Station) as u8 as f32;
        self.obs[20] = (node.kind == NodeKind::Cluster) as u8 as f32;
        self.obs[21] = (node.kind == NodeKind::Hazard) as u8 as f32;
        let node_denom = (MAX_NODES - 1) as f64;
        self.obs[22] = (ship.current_node as f64 / node_denom) as f32;
        self.obs[23] = (node.steps_to_station as f64 / node_denom) as f32;

        for (slot, edge) in node.edges.iter().enumerate() {
            let base = 24 + slot * 7;
            let target_kind = self.nodes[edge.to].kind;
            self.obs[base] = 1.0;
            self.obs[base + 1] = (target_kind == NodeKind::Station) as u8 as f32;
            self.obs[base + 2] = (target_kind == NodeKind::Cluster) as u8 as f32;
            self.obs[base + 3] = (target_kind == NodeKind::Hazard) as u8 as f32;
            self.obs[base + 4] = frac(edge.travel_time as f64, OBS_TRAVEL_TIME_CAP);
            self.obs[base + 5] = frac(edge.fuel_cost, OBS_FUEL_COST_CAP);
            self.obs[base + 6] = edge.threat_est as f32;
        }

        for (a, ast) in node.asteroids.iter().enumerate() {
            let base = 68 + a * 11;
            self.obs[base] = 1.0;
            let mut floored = [0.0f64; N_COMMODITIES];
            for c in 0..N_COMMODITIES {
                floored[c] = ast.comp_est[c].max(OBS_ASTEROID_COMPONENT_FLOOR);
            }
            let sum: f64 = floored.iter().sum();
            for c in 0..N_COMMODITIES {
                self.obs[base + 1 + c] = (floored[c] / sum) as f32;
            }
            self.obs[base + 7] = ast.stability_est as f32;
            self.obs[base + 8] = ast.depletion as f32;
            self.obs[base + 9] = ast.scan_conf as f32;
            self.obs[base + 10] = (ship.selected_asteroid == Some(a)) as u8 as f32;
        }

        for c in 0..N_COMMODITIES {
            self.obs[244 + c] = (self.market.price[c] / BASE_PRICE[c]).clamp(0.0, 1.0) as f32;
            self.obs[250 + c] = ((self.market.price[c] - self.market.prev_price[c]) / 100.0).clamp(-1.0, 1.0) as f32;
        }
        let station_commodities = [COMMODITY_IRON, COMMODITY_WATER_ICE, COMMODITY_PGE, COMMODITY_RARE_ISOTOPES];
        for (i, &c) in station_commodities.iter().enumerate() {
            self.obs[256 + i] = frac(self.market.station_inventory[c], OBS_STATION_INVENTORY_CAP);
        }
    }
}

fn frac(x: f64, max: f64) -> f32 {
    (x / max).clamp(0.0, 1.0) as f32
}

fn eff_tool(tool: f64) -> f64 {
    0.4 + 0.6 * (tool / TOOL_MAX)
}

fn eff_heat(heat_frac: f64) -> f64 {
    if heat_frac <= 0.7 {
        1.0
    } else {
        let over = ((heat_frac - 0.7) / 0.3).min(1.0);
        1.0 - over * 0.9
    }
}

fn rescale_cargo(cargo: &mut [f64; N_COMMODITIES]) {
    let total: f64 = cargo.iter().sum();
    if total > CARGO_MAX && total > 0.0 {
        let scale = CARGO_MAX / total;
        for q in cargo.iter_mut() {
            *q *= scale;
        }
    }
}

fn empty_market() -> RefMarket {
    RefMarket {
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

fn generate_nodes(rng: &mut Rng) -> Vec<RefNode> {
    let n_nodes = MIN_NODES + dist::u32_range(rng, 0, (MAX_NODES - MIN_NODES + 1) as u32) as usize;
    let mut nodes: Vec<RefNode> = Vec::with_capacity(n_nodes);
    nodes.push(RefNode {
        kind: NodeKind::Station,
        hazard: 0.0,
        pirate: 0.0,
        edges: Vec::new(),
        asteroids: Vec::new(),
        steps_to_station: 0,
    });
    for _ in 1..n_nodes {
        let is_hazard = dist::uniform(rng, 0.0, 1.0) < HAZARD_PROB;
        let (kind, hazard, pirate) = if is_hazard {
            (NodeKind::Hazard, dist::uniform(rng, 0.35, 1.0), dist::uniform(rng, 0.25, 0.9))
        } else {
            (NodeKind::Cluster, dist::uniform(rng, 0.0, 0.3), dist::uniform(rng, 0.0, 0.25))
        };
        nodes.push(RefNode {
            kind,
            hazard,
            pirate,
            edges: Vec::new(),
            asteroids: Vec::new(),
            steps_to_station: 0,
        });
    }

    for i in 1..n_nodes {
        let parent = dist::u32_range(rng, 0, i as u32) as usize;
        try_add_edge(rng, &mut nodes, i, parent);
    }
    for _ in 0..n_nodes {
        let a = dist::u32_range(rng, 0, n_nodes as u32) as usize;
        let b = dist::u32_range(rng, 0, n_nodes as u32) as usize;
        if a == b || has_edge(&nodes, a, b) {
            continue;
        }
        if nodes[a].edges.len() < MAX_NEIGHBORS && nodes[b].edges.len() < MAX_NEIGHBORS {
            try_add_edge(rng, &mut nodes, a, b);
        }
    }

    compute_steps_to_station(&mut nodes);

    for (idx, node) in nodes.iter_mut().enumerate() {
        if node.kind != NodeKind::Cluster {
            continue;
        }
        let _ = idx;
        let span = MAX_ASTEROIDS_PER_CLUSTER - MIN_ASTEROIDS_PER_CLUSTER + 1;
        let count = MIN_ASTEROIDS_PER_CLUSTER + dist::u32_range(rng, 0, span);
        for _ in 0..count {
            let mut true_comp = [0.0; N_COMMODITIES];
            dist::dirichlet_ones_into(rng, N_COMMODITIES, &mut true_comp);
            let richness = dist::lognormal(rng, 0.0, 0.6).clamp(0.2, 4.0);
            let stability_true = dist::beta_3_2(rng);
            let noise_profile = dist::uniform(rng, 0.04, 0.22);
            let mut comp_est = [0.0; N_COMMODITIES];
            dist::dirichlet_ones_into(rng, N_COMMODITIES, &mut comp_est);
            node.asteroids.push(RefAsteroid {
                true_comp,
                richness,
                stability_true,
                noise_profile,
                comp_est,
                stability_est: 0.5,
                scan_conf: 0.1,
                depletion: 0.0,
            });
        }
    }

    nodes
}

fn has_edge(nodes: &[RefNode], a: usize, b: usize) -> bool {
    nodes[a].edges.iter().any(|e| e.to == b)
}

fn try_add_edge(rng: &mut Rng, nodes: &mut [RefNode], a: usize, b: usize) {
    if nodes[a].edges.len() >= MAX_NEIGHBORS || nodes[b].edges.len() >= MAX_NEIGHBORS {
        return;
    }
    let travel_time = 1 + dist::u32_range(rng, 0, 8) as u16;
    let fuel_cost = dist::uniform(rng, 20.0, 112.0);
    let threat_true = dist::uniform(rng, 0.0, 1.0);

    nodes[a].edges.push(RefEdge { to: b, travel_time, fuel_cost, threat_true, threat_est: 0.5 });
    nodes[b].edges.push(RefEdge { to: a, travel_time, fuel_cost, threat_true, threat_est: 0.5 });
}

fn compute_steps_to_station(nodes: &mut [RefNode]) {
    let n = nodes.len();
    let mut dist_arr = vec![u32::MAX; n];
    let mut queue = Vec::with_capacity(n);
    dist_arr[0] = 0;
    queue.push(0usize);
    let mut head = 0;
    while head < queue.len() {
        let node = queue[head];
        head += 1;
        let targets: Vec<usize> = nodes[node].edges.iter().map(|e| e.to).collect();
        for t in targets {
            if dist_arr[t] == u32::MAX {
                dist_arr[t] = dist_arr[node] + 1;
                queue.push(t);
            }
        }
    }
    let cap = (n.max(1) - 1) as u32;
    for (i, node) in nodes.iter_mut().enumerate() {
        node.steps_to_station = dist_arr[i].min(cap);
    }
}

fn generate_market(rng: &mut Rng) -> RefMarket {
    let mut m = empty_market();
    for c in 0..N_COMMODITIES {
        m.phase[c] = dist::uniform(rng, 0.0, std::f64::consts::TAU);
        m.period[c] = dist::uniform(rng, 180.0, 380.0);
        m.amplitude[c] = BASE_PRICE[c] * dist::uniform(rng, 0.10, 0.30);
        m.station_inventory[c] = dist::uniform(rng, 20.0, 120.0);
    }
    m
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_generation_matches_fast_core_node_count_and_station() {
        let mut a = Rng::seed(55, EPISODE_STREAM);
        let mut b = Rng::seed(55, EPISODE_STREAM);
        let nodes = generate_nodes(&mut a);
        let (graph, _, _) = crate::world::generate(&mut b);
        assert_eq!(nodes.len(), graph.n_nodes);
        assert_eq!(nodes[0].kind, NodeKind::Station);
    }

    #[test]
    fn reference_cash_out_matches_fast_core() {
        let mut reference = ReferenceEpisode::new(EpisodeConfig::default());
        let mut fast = crate::episode::Episode::new(EpisodeConfig::default());
        reference.reset(0);
        fast.reset(0, None);
        let r1 = reference.step(ACTION_CASH_OUT);
        let r2 = fast.step(ACTION_CASH_OUT);
        assert_eq!(r1.terminated, r2.terminated);
        assert_eq!(r1.dt, r2.dt);
        assert!((r1.reward - r2.reward).abs() < 1e-5);
    }

    #[test]
    fn reference_obs_matches_fast_core_after_reset() {
        let mut reference = ReferenceEpisode::new(EpisodeConfig::default());
        let mut fast = crate::episode::Episode::new(EpisodeConfig::default());
        reference.reset(7);
        fast.reset(7, None);
        for (a, b) in reference.obs().iter().zip(fast.obs().iter()) {
            assert!((a - b).abs() < 1e-5);
        }
    }
}
