//! Primary action effects (spec §4.5 steps 1-3) plus the shared edge/node
//! hazard-and-pirate roll used both by travel (per-edge) and by the passive
//! node tick in `passive.rs` (per-node). Dt assignment for each action
//! follows spec §4.5: travel uses the edge's travel_time, mining is always
//! 1, scans/refine/cooldown/maintenance/patch/dock/overhaul carry their own
//! fixed cost, everything else defaults to 1.

use crate::action::{self, Action, FuelSize, MiningMode};
use crate::constants::*;
use crate::dist;
use crate::rng::Rng;
use crate::state::{AsteroidField, Counters, Graph, Market, Ship};
use crate::valuation::{cargo_value, logistic};

/// Borrowed handles to every piece of mutable episode state a primary
/// action might touch. Constructed fresh each step from disjoint fields of
/// `Episode`, never stored.
pub struct StepCtx<'a> {
    pub rng: &'a mut Rng,
    pub graph: &'a mut Graph,
    pub asteroids: &'a mut AsteroidField,
    pub market: &'a mut Market,
    pub ship: &'a mut Ship,
    pub counters: &'a mut Counters,
    pub time_remaining: &'a mut f64,
}

/// Fixed dt for non-travel, non-mining actions (spec §4.5).
fn fixed_dt(action: Action) -> u16 {
    match action {
        Action::ScanWide => 3,
        Action::ScanFocused => 2,
        Action::ScanDeep => 4,
        Action::Refine => 3,
        Action::Cooldown => 2,
        Action::ToolMaintenance => 2,
        Action::HullPatch => 2,
        Action::Dock => 1,
        Action::Overhaul => 5,
        Action::Stabilize => 2,
        Action::Mine(_) => 1,
        _ => 1,
    }
}

/// Apply `action`'s primary effect, assuming its precondition already
/// holds. Returns the dt the action consumes.
pub fn apply_primary(action: Action, ctx: &mut StepCtx) -> u16 {
    match action {
        Action::Travel(slot) => apply_travel(slot, ctx),
        Action::Hold => 1,
        Action::EmergencyBurn => {
            ctx.ship.fuel -= 60.0;
            ctx.ship.heat += 15.0;
            ctx.ship.escape_buff_ticks = 5.0;
            1
        }
        Action::ScanWide | Action::ScanFocused | Action::ScanDeep => apply_scan(action, ctx),
        Action::PassiveListen => {
            apply_passive_listen(ctx);
            1
        }
        Action::Select(a) => {
            ctx.ship.selected_asteroid = Some(a);
            1
        }
        Action::Mine(mode) => apply_mine(mode, ctx),
        Action::Stabilize => {
            if let Some(a) = ctx.ship.selected_asteroid {
                ctx.ship.stabilizers -= 1;
                ctx.ship.stabilize_buff_ticks[a] = 10.0;
            }
            fixed_dt(action)
        }
        Action::Refine => {
            let total = ctx.ship.cargo_total();
            if total > 0.0 {
                for q in ctx.ship.cargo.iter_mut() {
                    *q *= 1.03;
                }
                clamp_cargo(&mut ctx.ship.cargo);
            }
            ctx.ship.heat += 8.0;
            ctx.ship.tool -= 3.0;
            fixed_dt(action)
        }
        Action::Cooldown => {
            ctx.ship.heat -= 15.0;
            fixed_dt(action)
        }
        Action::ToolMaintenance => {
            ctx.ship.tool = (ctx.ship.tool + 40.0).min(TOOL_MAX);
            ctx.ship.heat += 5.0;
            fixed_dt(action)
        }
        Action::HullPatch => {
            ctx.ship.repair_kits -= 1;
            ctx.ship.hull = (ctx.ship.hull + 35.0).min(HULL_MAX);
            fixed_dt(action)
        }
        Action::Jettison(c) => {
            ctx.ship.cargo[c] = 0.0;
            1
        }
        Action::Dock => {
            ctx.ship.alert = (ctx.ship.alert - 20.0).max(0.0);
            fixed_dt(action)
        }
        Action::Sell(c, bucket) => apply_sell(c, bucket, ctx),
        Action::BuyFuel(size) => {
            let (fuel_delta, cost) = action::fuel_bundle(size);
            ctx.ship.fuel = (ctx.ship.fuel + fuel_delta).min(FUEL_MAX);
            ctx.ship.credits -= cost;
            ctx.counters.total_spend += cost;
            1
        }
        Action::BuyRepairKit => {
            ctx.ship.credits -= action::REPAIR_KIT_COST;
            ctx.counters.total_spend += action::REPAIR_KIT_COST;
            ctx.ship.repair_kits += 1;
            1
        }
        Action::BuyStabilizer => {
            ctx.ship.credits -= action::STABILIZER_COST;
            ctx.counters.total_spend += action::STABILIZER_COST;
            ctx.ship.stabilizers += 1;
            1
        }
        Action::BuyDecoy => {
            ctx.ship.credits -= action::DECOY_COST;
            ctx.counters.total_spend += action::DECOY_COST;
            ctx.ship.decoys += 1;
            1
        }
        Action::Overhaul => {
            ctx.ship.credits -= action::OVERHAUL_COST;
            ctx.counters.total_spend += action::OVERHAUL_COST;
            ctx.ship.hull = HULL_MAX;
            ctx.ship.tool = TOOL_MAX;
            ctx.ship.heat = 0.0;
            fixed_dt(action)
        }
        Action::CashOut => 1,
    }
}

/// The hold body: no state change beyond consuming one tick. Used both for
/// action id 6 and as the fallback for any invalid action.
pub fn apply_hold() -> u16 {
    1
}

fn apply_travel(slot: usize, ctx: &mut StepCtx) -> u16 {
    let node = ctx.ship.current_node;
    let dest = ctx.graph.neighbor[node][slot] as usize;
    let dt = ctx.graph.travel_time[node][slot];
    let fuel_cost = ctx.graph.fuel_cost[node][slot];
    let threat = ctx.graph.edge_threat_true[node][slot];

    ctx.ship.fuel -= fuel_cost;
    ctx.ship.current_node = dest;
    ctx.ship.selected_asteroid = None;

    apply_hazard_and_pirate_tick(ctx.rng, threat, threat, dt, ctx.ship, ctx.counters, &ctx.market.price);

    dt
}

/// Shared hazard-damage + pirate-encounter roll, used for travel (edge
/// threat) and for the passive per-tick node check (node hazard/pirate).
pub fn apply_hazard_and_pirate_tick(
    rng: &mut Rng,
    hazard_level: f64,
    pirate_level: f64,
    dt: u16,
    ship: &mut Ship,
    counters: &mut Counters,
    price: &[f64; N_COMMODITIES],
) {
    if dt == 0 {
        return;
    }
    let dt_f = dt as f64;

    let jitter = dist::uniform(rng, 0.8, 1.2);
    let hazard_effect = hazard_level * dt_f * jitter;
    ship.hull -= 0.8 * hazard_effect;
    ship.heat += 1.0 * hazard_effect;
    ship.alert += 0.5 * hazard_effect;

    let cargo_val = cargo_value(&ship.cargo, price);
    let escape_norm = (ship.escape_buff_ticks.min(5.0) / 5.0).max(0.0);
    let x = 4.0 * pirate_level + 2.0 * (ship.alert / ALERT_MAX) + 0.6 * (1.0 + cargo_val / 1000.0).ln()
        - 3.0 * escape_norm
        - 3.0;
    let p = logistic(x);
    let p_dt = 1.0 - (1.0 - p).powf(dt_f);

    if dist::uniform(rng, 0.0, 1.0) < p_dt {
        realize_pirate_encounter(rng, ship, counters, price);
    }
}

fn realize_pirate_encounter(rng: &mut Rng, ship: &mut Ship, counters: &mut Counters, price: &[f64; N_COMMODITIES]) {
    let mut loss = dist::uniform(rng, 0.08, 0.20);
    if ship.decoys > 0 && dist::uniform(rng, 0.0, 1.0) < 0.6 {
        ship.decoys -= 1;
        loss *= 0.30;
    }

    let value_before = cargo_value(&ship.cargo, price);
    for q in ship.cargo.iter_mut() {
        *q *= 1.0 - loss;
    }
    let value_after = cargo_value(&ship.cargo, price);
    counters.value_lost_to_pirates += value_before - value_after;

    ship.hull -= (1 + dist::u32_range(rng, 0, 4)) as f64;
    ship.alert = (ship.alert + dist::uniform(rng, 5.0, 15.0)).min(ALERT_MAX);
    counters.pirate_encounters += 1;
}

fn apply_scan(action: Action, ctx: &mut StepCtx) -> u16 {
    let node = ctx.ship.current_node;
    let (blend, conf_gain, noise_mult) = match action {
        Action::ScanWide => SCAN_WIDE,
        Action::ScanFocused => SCAN_FOCUSED,
        Action::ScanDeep => SCAN_DEEP,
        _ => unreachable!(),
    };

    match action {
        Action::ScanWide => {
            for a in 0..MAX_ASTEROIDS {
                if ctx.asteroids.valid[node][a] {
                    scan_one(ctx.rng, ctx.asteroids, node, a, blend, conf_gain, noise_mult);
                }
            }
        }
        _ => {
            if let Some(a) = ctx.ship.selected_asteroid {
                scan_one(ctx.rng, ctx.asteroids, node, a, blend, conf_gain, noise_mult);
            }
        }
    }
    ctx.counters.scan_count += 1;
    fixed_dt(action)
}

fn scan_one(
    rng: &mut Rng,
    asteroids: &mut AsteroidField,
    node: usize,
    a: usize,
    blend: f64,
    conf_gain: f64,
    noise_mult: f64,
) {
    let sigma = asteroids.noise_profile[node][a] * (1.0 - asteroids.scan_conf[node][a] + 0.1) * noise_mult;

    let mut noisy = [0.0f64; N_COMMODITIES];
    for c in 0..N_COMMODITIES {
        noisy[c] = (asteroids.true_comp[node][a][c] + dist::normal(rng, 0.0, sigma)).max(1e-8);
    }
    let sum: f64 = noisy.iter().sum();
    for v in noisy.iter_mut() {
        *v /= sum;
    }

    let est = &mut asteroids.comp_est[node][a];
    let mut blended = [0.0f64; N_COMMODITIES];
    for c in 0..N_COMMODITIES {
        blended[c] = blend * noisy[c] + (1.0 - blend) * est[c];
    }
    let sum: f64 = blended.iter().sum();
    for c in 0..N_COMMODITIES {
        est[c] = (blended[c] / sum).max(1e-8);
    }
    let renorm: f64 = est.iter().sum();
    for v in est.iter_mut() {
        *v /= renorm;
    }

    let noisy_stability = (asteroids.stability_true[node][a] + dist::normal(rng, 0.0, sigma)).clamp(0.0, 1.0);
    let blended_stability = blend * noisy_stability + (1.0 - blend) * asteroids.stability_est[node][a];
    asteroids.stability_est[node][a] = blended_stability.clamp(0.0, 1.0);

    asteroids.scan_conf[node][a] = (asteroids.scan_conf[node][a] + conf_gain).min(1.0);
}

fn apply_passive_listen(ctx: &mut StepCtx) {
    let node = ctx.ship.current_node;
    for slot in 0..MAX_NEIGHBORS {
        if ctx.graph.neighbor[node][slot] < 0 {
            continue;
        }
        let truth = ctx.graph.edge_threat_true[node][slot];
        let est = &mut ctx.graph.edge_threat_est[node][slot];
        *est = 0.3 * truth + 0.7 * *est;
    }
}

const EFF_TOOL_FLOOR: f64 = 0.4;
const HEAT_FULL_EFFICIENCY: f64 = 0.7;
const EFF_HEAT_FLOOR: f64 = 0.1;

fn eff_tool(tool: f64) -> f64 {
    EFF_TOOL_FLOOR + (1.0 - EFF_TOOL_FLOOR) * (tool / TOOL_MAX)
}

fn eff_heat(heat_frac: f64) -> f64 {
    if heat_frac <= HEAT_FULL_EFFICIENCY {
        1.0
    } else {
        let span = 1.0 - HEAT_FULL_EFFICIENCY;
        let over = ((heat_frac - HEAT_FULL_EFFICIENCY) / span).min(1.0);
        1.0 - over * (1.0 - EFF_HEAT_FLOOR)
    }
}

fn apply_mine(mode: MiningMode, ctx: &mut StepCtx) -> u16 {
    let node = ctx.ship.current_node;
    let a = match ctx.ship.selected_asteroid {
        Some(a) => a,
        None => return 1,
    };
    let (mult_yield, mult_heat, mult_wear, mult_alert, mult_noise) = mode.multipliers();

    let heat_frac = ctx.ship.heat / HEAT_MAX;
    let tool_frac = ctx.ship.tool / TOOL_MAX;
    let richness = ctx.asteroids.richness[node][a];
    let depletion = ctx.asteroids.depletion[node][a];
    let sigma = ctx.asteroids.noise_profile[node][a] * mult_noise;

    let scalar = richness
        * (1.0 - depletion)
        * eff_tool(ctx.ship.tool)
        * eff_heat(heat_frac)
        * mult_yield
        * dist::normal(ctx.rng, 0.0, sigma).exp();

    let mut extraction = [0.0f64; N_COMMODITIES];
    for c in 0..N_COMMODITIES {
        extraction[c] = scalar * ctx.asteroids.true_comp[node][a][c];
    }
    let mut total: f64 = extraction.iter().sum();

    let remaining_capacity = (CARGO_MAX - ctx.ship.cargo_total()).max(0.0);
    if total > remaining_capacity && total > 0.0 {
        let scale = remaining_capacity / total;
        for v in extraction.iter_mut() {
            *v *= scale;
        }
        total = remaining_capacity;
    }
    for c in 0..N_COMMODITIES {
        ctx.ship.cargo[c] += extraction[c];
    }

    ctx.asteroids.depletion[node][a] = (depletion + 0.01 * total).min(1.0);
    ctx.ship.heat += 6.0 * mult_heat;
    ctx.ship.tool -= 2.0 * mult_wear;
    ctx.ship.alert += 1.0 * mult_alert;
    ctx.counters.mining_ticks += 1;

    let aggression = mode.aggression();
    let heat_excess = ((heat_frac - HEAT_FULL_EFFICIENCY) / (1.0 - HEAT_FULL_EFFICIENCY)).clamp(0.0, 1.0);
    let stabilize_norm = (ctx.ship.stabilize_buff_ticks[a].min(10.0) / 10.0).max(0.0);
    let x = 2.0 * aggression
        + 2.5 * (1.0 - ctx.asteroids.stability_true[node][a])
        + 2.0 * heat_excess
        + 1.0 * (1.0 - tool_frac)
        - 3.0 * stabilize_norm
        - 4.0;
    let p_fracture = logistic(x);
    if dist::uniform(ctx.rng, 0.0, 1.0) < p_fracture {
        let severity = dist::uniform(ctx.rng, 0.5, 1.5);
        ctx.ship.hull -= 12.0 * severity;
        ctx.asteroids.depletion[node][a] = 1.0;
        ctx.graph.node_hazard[node] = (ctx.graph.node_hazard[node] + 0.05).min(1.0);
    }

    1
}

fn apply_sell(c: usize, bucket: crate::action::SellBucket, ctx: &mut StepCtx) -> u16 {
    let q = bucket.fraction() * ctx.ship.cargo[c];
    if q > 0.0 {
        let slip = crate::valuation::slippage(q, ctx.market.station_inventory[c]);
        let eff_price = ctx.market.price[c] * (1.0 - slip);
        ctx.ship.credits += eff_price * q;
        ctx.ship.cargo[c] -= q;
        ctx.market.station_inventory[c] += q;
        ctx.market.recent_sales[c] += q;
    }
    1
}

/// Rescale cargo proportionally if the total exceeds `CARGO_MAX` (spec §4.5
/// step 7). Shared by any primary effect that can grow cargo in place.
pub fn clamp_cargo(cargo: &mut [f64; N_COMMODITIES]) {
    let total: f64 = cargo.iter().sum();
    if total > CARGO_MAX && total > 0.0 {
        let scale = CARGO_MAX / total;
        for q in cargo.iter_mut() {
            *q *= scale;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eff_heat_is_one_below_threshold_and_floors_at_cap() {
        assert_eq!(eff_heat(0.5), 1.0);
        assert_eq!(eff_heat(0.7), 1.0);
        assert!((eff_heat(1.0) - EFF_HEAT_FLOOR).abs() < 1e-9);
    }

    #[test]
    fn eff_tool_increases_with_tool() {
        assert!(eff_tool(0.0) < eff_tool(TOOL_MAX));
        assert_eq!(eff_tool(0.0), EFF_TOOL_FLOOR);
        assert_eq!(eff_tool(TOOL_MAX), 1.0);
    }

    #[test]
    fn clamp_cargo_rescales_proportionally() {
        let mut cargo = [100.0, 100.0, 50.0, 0.0, 0.0, 0.0];
        clamp_cargo(&mut cargo);
        let total: f64 = cargo.iter().sum();
        assert!((total - CARGO_MAX).abs() < 1e-9);
        assert!((cargo[0] / cargo[1] - 1.0).abs() < 1e-9);
    }
}
