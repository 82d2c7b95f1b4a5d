//! Passive dynamics applied after every primary action, scaled by its dt
//! (spec §4.5 steps 4-7): time decay, heat dissipation, buff countdown,
//! overheat damage, node hazard/pirate exposure, the market tick, and the
//! final clamp + cargo-utilization accumulation.

use crate::constants::*;
use crate::dist;
use crate::dynamics::{apply_hazard_and_pirate_tick, clamp_cargo, StepCtx};

const HEAT_DISSIPATION_PER_TICK: f64 = 2.5;
const OVERHEAT_DAMAGE_PER_DEGREE: f64 = 1.25;
const MARKET_INVENTORY_PRESSURE: f64 = 0.04;
const MARKET_SALES_PRESSURE: f64 = 0.05;
const MARKET_NOISE_SCALE: f64 = 0.03;
const RECENT_SALES_DECAY_TAU: f64 = 14.0;
const INVENTORY_DECAY_FACTOR: f64 = 0.998;

/// Run steps 4-7 of spec §4.5.
pub fn apply(ctx: &mut StepCtx, dt: u16) {
    let dt_f = dt as f64;

    *ctx.time_remaining = (*ctx.time_remaining - dt_f).max(0.0);
    ctx.ship.heat -= HEAT_DISSIPATION_PER_TICK * dt_f;

    ctx.ship.escape_buff_ticks = (ctx.ship.escape_buff_ticks - dt_f).max(0.0);
    for buff in ctx.ship.stabilize_buff_ticks.iter_mut() {
        *buff = (*buff - dt_f).max(0.0);
    }

    if ctx.ship.heat > HEAT_MAX {
        ctx.ship.hull -= OVERHEAT_DAMAGE_PER_DEGREE * (ctx.ship.heat - HEAT_MAX);
        ctx.ship.heat = HEAT_MAX;
        ctx.counters.overheat_ticks += dt as u64;
    }

    if !ctx.ship.at_station() {
        let node = ctx.ship.current_node;
        let hazard = ctx.graph.node_hazard[node];
        let pirate = ctx.graph.node_pirate[node];
        apply_hazard_and_pirate_tick(ctx.rng, hazard, pirate, dt, ctx.ship, ctx.counters, &ctx.market.price);
    }

    market_tick(ctx, dt_f);

    clamp_ship_scalars(ctx);
    clamp_cargo(&mut ctx.ship.cargo);

    let util = (ctx.ship.cargo_total() / CARGO_MAX).clamp(0.0, 1.0);
    ctx.ship.cargo_util_sum += util * dt_f;
    ctx.ship.cargo_util_weight += dt_f;
}

fn market_tick(ctx: &mut StepCtx, dt_f: f64) {
    let m = &mut *ctx.market;
    m.t += dt_f;

    for c in 0..N_COMMODITIES {
        m.prev_price[c] = m.price[c];
        let cycle = m.amplitude[c] * (std::f64::consts::TAU * m.t / m.period[c] + m.phase[c]).sin();
        let noise = dist::normal(ctx.rng, 0.0, MARKET_NOISE_SCALE * BASE_PRICE[c] * dt_f.sqrt());
        let raw = BASE_PRICE[c] + cycle - MARKET_INVENTORY_PRESSURE * m.station_inventory[c]
            - MARKET_SALES_PRESSURE * m.recent_sales[c]
            + noise;
        m.price[c] = raw.clamp(m.price_min[c], m.price_max[c]);

        m.recent_sales[c] *= (-dt_f / RECENT_SALES_DECAY_TAU).exp();
        m.station_inventory[c] *= INVENTORY_DECAY_FACTOR;
    }
}

fn clamp_ship_scalars(ctx: &mut StepCtx) {
    let ship = &mut *ctx.ship;
    ship.fuel = ship.fuel.clamp(0.0, FUEL_MAX);
    ship.hull = ship.hull.clamp(0.0, HULL_MAX);
    ship.heat = ship.heat.clamp(0.0, HEAT_MAX);
    ship.tool = ship.tool.clamp(0.0, TOOL_MAX);
    ship.alert = ship.alert.clamp(0.0, ALERT_MAX);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::Rng;
    use crate::state::{AsteroidField, Counters, Graph, Market, Ship};

    fn fresh_ctx() -> (Rng, Graph, AsteroidField, Market, Ship, Counters) {
        (
            Rng::seed(7, EPISODE_STREAM),
            Graph::empty(),
            AsteroidField::empty(),
            Market::empty(),
            Ship::empty(),
            Counters::empty(),
        )
    }

    #[test]
    fn heat_dissipates_and_never_goes_negative() {
        let (mut rng, mut graph, mut asteroids, mut market, mut ship, mut counters) = fresh_ctx();
        ship.heat = 1.0;
        let mut time_remaining = 100.0;
        let mut ctx = StepCtx {
            rng: &mut rng,
            graph: &mut graph,
            asteroids: &mut asteroids,
            market: &mut market,
            ship: &mut ship,
            counters: &mut counters,
            time_remaining: &mut time_remaining,
        };
        apply(&mut ctx, 5);
        assert_eq!(ship.heat, 0.0);
    }

    #[test]
    fn overheat_damages_hull_and_clamps_heat() {
        let (mut rng, mut graph, mut asteroids, mut market, mut ship, mut counters) = fresh_ctx();
        ship.heat = HEAT_MAX + 10.0;
        let hull_before = ship.hull;
        let mut time_remaining = 100.0;
        let mut ctx = StepCtx {
            rng: &mut rng,
            graph: &mut graph,
            asteroids: &mut asteroids,
            market: &mut market,
            ship: &mut ship,
            counters: &mut counters,
            time_remaining: &mut time_remaining,
        };
        apply(&mut ctx, 1);
        assert_eq!(ship.heat, HEAT_MAX);
        assert!(ship.hull < hull_before);
        assert_eq!(counters.overheat_ticks, 1);
    }

    #[test]
    fn market_prices_stay_within_clamp_bounds() {
        let (mut rng, mut graph, mut asteroids, mut market, mut ship, mut counters) = fresh_ctx();
        let mut time_remaining = 100.0;
        for _ in 0..200 {
            let mut ctx = StepCtx {
                rng: &mut rng,
                graph: &mut graph,
                asteroids: &mut asteroids,
                market: &mut market,
                ship: &mut ship,
                counters: &mut counters,
                time_remaining: &mut time_remaining,
            };
            apply(&mut ctx, 3);
        }
        for c in 0..N_COMMODITIES {
            assert!(market.price[c] >= market.price_min[c] - 1e-9);
            assert!(market.price[c] <= market.price_max[c] + 1e-9);
        }
    }
}
