//! `Episode`: the single state machine described in spec §3/§4. Owns every
//! piece of per-episode state and exposes only `reset`/`step` (spec §6).
//! A step is the orchestration spine: snapshot, decode, apply primary
//! effect, passive dynamics, terminal detection, reward, pack, metrics.

use crate::action::{self, Action};
use crate::config::EpisodeConfig;
use crate::constants::*;
use crate::dynamics::{self, StepCtx};
use crate::metrics::{self, StepMetrics};
use crate::obs;
use crate::passive;
use crate::reward::{self, Snapshot, Terminal};
use crate::rng::Rng;
use crate::state::{AsteroidField, Counters, Graph, Market, Ship};
use crate::world;

/// Everything returned by `step()` (spec §6 `StepResult`).
#[derive(Clone, Copy, Debug)]
pub struct StepResult {
    pub obs: [f32; OBS_DIM],
    pub reward: f32,
    pub terminated: bool,
    pub truncated: bool,
    pub invalid_action: bool,
    pub dt: u16,
    /// Resolved action id after normalization: the original id if valid,
    /// `ACTION_HOLD` if it fell back to hold, or `-1` if the call landed
    /// on a `needs_reset` episode and nothing ran.
    pub action: i16,
    pub metrics: StepMetrics,
    pub time_remaining: f32,
}

pub struct Episode {
    config: EpisodeConfig,
    rng: Rng,
    graph: Graph,
    asteroids: AsteroidField,
    market: Market,
    ship: Ship,
    counters: Counters,
    time_remaining: f64,
    needs_reset: bool,
    obs: [f32; OBS_DIM],
}

impl Episode {
    /// Build an episode with a validated config. Infallible: `config` is
    /// assumed already validated by `EpisodeConfig::build`.
    pub fn new(config: EpisodeConfig) -> Self {
        Episode {
            config,
            rng: Rng::seed(0, EPISODE_STREAM),
            graph: Graph::empty(),
            asteroids: AsteroidField::empty(),
            market: Market::empty(),
            ship: Ship::empty(),
            counters: Counters::empty(),
            time_remaining: 0.0,
            needs_reset: true,
            obs: [0.0; OBS_DIM],
        }
    }

    /// Initialize (or re-initialize) the episode from `seed`. Writes the
    /// fresh observation into `obs_out` if supplied (spec §6).
    pub fn reset(&mut self, seed: u64, obs_out: Option<&mut [f32; OBS_DIM]>) {
        self.rng = Rng::seed(seed, EPISODE_STREAM);
        let (graph, asteroids, market) = world::generate(&mut self.rng);
        self.graph = graph;
        self.asteroids = asteroids;
        self.market = market;
        self.ship = Ship::empty();
        self.counters = Counters::empty();
        self.time_remaining = self.config.time_max;
        self.needs_reset = false;

        obs::pack(
            &mut self.obs,
            &self.ship,
            &self.graph,
            &self.asteroids,
            &self.market,
            self.time_remaining,
            self.config.time_max,
        );
        if let Some(out) = obs_out {
            *out = self.obs;
        }
    }

    /// Current observation buffer, valid until the next `step`/`reset`
    /// call (spec §3 Episode invariant).
    pub fn obs(&self) -> &[f32; OBS_DIM] {
        &self.obs
    }

    pub fn render_state(&self) -> crate::render::RenderState {
        crate::render::RenderState::capture(&self.ship, &self.graph, &self.asteroids, &self.market)
    }

    pub fn step(&mut self, action_id: u8) -> StepResult {
        if self.needs_reset {
            return self.post_terminal_result();
        }

        self.ship.mining_active_this_step = false;

        let decoded = action::decode(action_id);
        let precondition_ok = decoded
            .map(|a| action::is_valid(a, &self.ship, &self.graph, &self.asteroids))
            .unwrap_or(false);

        let before = Snapshot::take(&self.ship, &self.counters, &self.market.price);

        let (resolved_action, invalid_action, dt) = if precondition_ok {
            let action = decoded.unwrap();
            if matches!(action, Action::Mine(_)) {
                self.ship.mining_active_this_step = true;
            }
            let mut ctx = StepCtx {
                rng: &mut self.rng,
                graph: &mut self.graph,
                asteroids: &mut self.asteroids,
                market: &mut self.market,
                ship: &mut self.ship,
                counters: &mut self.counters,
                time_remaining: &mut self.time_remaining,
            };
            let dt = dynamics::apply_primary(action, &mut ctx);
            (action_id as i16, false, dt)
        } else {
            let dt = dynamics::apply_hold();
            (ACTION_HOLD as i16, true, dt)
        };

        let is_scan_action = matches!(
            decoded,
            Some(Action::ScanWide) | Some(Action::ScanFocused) | Some(Action::ScanDeep)
        );

        {
            let mut ctx = StepCtx {
                rng: &mut self.rng,
                graph: &mut self.graph,
                asteroids: &mut self.asteroids,
                market: &mut self.market,
                ship: &mut self.ship,
                counters: &mut self.counters,
                time_remaining: &mut self.time_remaining,
            };
            passive::apply(&mut ctx, dt);
        }
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

        let after = Snapshot::take(&self.ship, &self.counters, &self.market.price);
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

        obs::pack(
            &mut self.obs,
            &self.ship,
            &self.graph,
            &self.asteroids,
            &self.market,
            self.time_remaining,
            self.config.time_max,
        );
        let survived = !destroyed && !stranded;
        let metrics = metrics::compute(&self.ship, &self.counters, survived);

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

    /// Spec §4.11/§7: a step call while `needs_reset` is set is terminal
    /// and invalid with dt=0, repacking the observation without mutating
    /// any state.
    fn post_terminal_result(&mut self) -> StepResult {
        obs::pack(
            &mut self.obs,
            &self.ship,
            &self.graph,
            &self.asteroids,
            &self.market,
            self.time_remaining,
            self.config.time_max,
        );
        StepResult {
            obs: self.obs,
            reward: 0.0,
            terminated: true,
            truncated: false,
            invalid_action: true,
            dt: 0,
            action: -1,
            metrics: metrics::compute(&self.ship, &self.counters, false),
            time_remaining: self.time_remaining as f32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cash_out_terminates_immediately_with_zero_reward_bonus() {
        let mut ep = Episode::new(EpisodeConfig::default());
        ep.reset(0, None);
        let r = ep.step(ACTION_CASH_OUT);
        assert!(r.terminated);
        assert!(!r.truncated);
        assert_eq!(ep_credits(&ep), 0.0);
    }

    fn ep_credits(ep: &Episode) -> f64 {
        ep.ship.credits
    }

    #[test]
    fn holding_until_time_max_truncates() {
        let mut ep = Episode::new(EpisodeConfig::build(&[("time_max", 10.0)]).unwrap());
        ep.reset(0, None);
        let mut last = None;
        for _ in 0..10 {
            last = Some(ep.step(ACTION_HOLD));
        }
        let r = last.unwrap();
        assert!(r.truncated);
        assert!(!r.terminated);
    }

    #[test]
    fn docking_at_station_from_reset_is_valid() {
        let mut ep = Episode::new(EpisodeConfig::default());
        ep.reset(0, None);
        let r = ep.step(ACTION_DOCK);
        assert!(!r.invalid_action);
        assert_eq!(r.dt, 1);
    }

    #[test]
    fn selling_zero_cargo_is_not_invalid() {
        let mut ep = Episode::new(EpisodeConfig::default());
        ep.reset(0, None);
        let r = ep.step(ACTION_SELL_LO);
        assert!(!r.invalid_action);
        assert_eq!(ep_credits(&ep), 0.0);
    }

    #[test]
    fn action_id_above_68_behaves_like_hold_plus_penalty() {
        let mut ep = Episode::new(EpisodeConfig::default());
        ep.reset(0, None);
        let r = ep.step(200);
        assert!(r.invalid_action);
        assert_eq!(r.dt, 1);
        assert_eq!(r.action, ACTION_HOLD as i16);
    }

    #[test]
    fn needs_reset_is_sticky_until_reset() {
        let mut ep = Episode::new(EpisodeConfig::default());
        ep.reset(0, None);
        let r1 = ep.step(ACTION_CASH_OUT);
        assert!(r1.terminated);
        let r2 = ep.step(ACTION_HOLD);
        assert!(r2.terminated);
        assert!(r2.invalid_action);
        assert_eq!(r2.dt, 0);
    }

    #[test]
    fn reset_is_idempotent_for_a_fixed_seed() {
        let mut a = Episode::new(EpisodeConfig::default());
        let mut b = Episode::new(EpisodeConfig::default());
        a.reset(123, None);
        b.reset(123, None);
        assert_eq!(a.obs(), b.obs());
    }

    #[test]
    fn reward_and_obs_are_always_finite_over_a_random_run() {
        let mut ep = Episode::new(EpisodeConfig::default());
        ep.reset(42, None);
        let mut rng = Rng::seed(999, 1);
        for _ in 0..500 {
            let action = (crate::dist::u32_range(&mut rng, 0, 80)) as u8;
            let r = ep.step(action);
            assert!(r.reward.is_finite());
            for v in r.obs.iter() {
                assert!(v.is_finite());
            }
            if r.terminated || r.truncated {
                ep.reset(42, None);
            }
        }
    }
}
