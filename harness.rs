//! Parity harness (spec §4.10/§9): drives the fast core and the reference
//! core through identical action sequences and diffs their `TraceRecord`s
//! within the documented tolerances. A harness run never touches episode
//! internals directly — only `CoreImpl`, so either core can be swapped for
//! a differently-tuned implementation without changing this file.

use crate::config::EpisodeConfig;
use crate::constants::N_ACTIONS;
use crate::dist;
use crate::episode::Episode;
use crate::reference::ReferenceEpisode;
use crate::rng::Rng;
use crate::trace::{CoreImpl, TraceRecord};

const HARNESS_STREAM: u64 = 9001;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Suite {
    Uniform,
    Adversarial,
    Scripted,
}

impl Suite {
    pub fn name(self) -> &'static str {
        match self {
            Suite::Uniform => "uniform",
            Suite::Adversarial => "adversarial",
            Suite::Scripted => "scripted",
        }
    }
}

/// One disagreement between the two cores on a single trace field.
#[derive(Clone, Debug)]
pub struct Mismatch {
    pub t: usize,
    pub field: String,
    pub fast: String,
    pub reference: String,
}

/// Outcome of running one seed through one suite.
#[derive(Clone, Debug)]
pub struct ParityReport {
    pub seed: u64,
    pub suite: &'static str,
    pub steps_run: usize,
    pub mismatches: Vec<Mismatch>,
}

impl ParityReport {
    pub fn is_clean(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Build the action sequence for `suite` against `seed`, `steps` long.
/// `Scripted` ignores `seed`/`rng` — it is a fixed curated sequence, repeated
/// to fill `steps` (spec §8's concrete end-to-end scenarios).
fn action_sequence(suite: Suite, seed: u64, steps: usize) -> Vec<u8> {
    match suite {
        Suite::Uniform => {
            let mut rng = Rng::seed(seed, HARNESS_STREAM);
            (0..steps)
                .map(|_| dist::u32_range(&mut rng, 0, (N_ACTIONS + 20) as u32) as u8)
                .collect()
        }
        Suite::Adversarial => {
            // Biased toward the actions most likely to expose edge cases:
            // repeated aggressive mining, emergency burns, cash-outs, and a
            // steady trickle of out-of-range ids to exercise the invalid path.
            const RISKY: &[u8] = &[
                crate::constants::ACTION_MINE_AGGRESSIVE,
                crate::constants::ACTION_EMERGENCY_BURN,
                crate::constants::ACTION_CASH_OUT,
                crate::constants::ACTION_DOCK,
                crate::constants::ACTION_OVERHAUL,
                crate::constants::ACTION_SELL_HI,
                crate::constants::ACTION_TRAVEL_HI,
                crate::constants::ACTION_SCAN_DEEP,
            ];
            let mut rng = Rng::seed(seed, HARNESS_STREAM + 1);
            (0..steps)
                .map(|_| {
                    if dist::uniform(&mut rng, 0.0, 1.0) < 0.15 {
                        dist::u32_range(&mut rng, N_ACTIONS as u32, (N_ACTIONS + 40) as u32) as u8
                    } else {
                        RISKY[dist::u32_range(&mut rng, 0, RISKY.len() as u32) as usize]
                    }
                })
                .collect()
        }
        Suite::Scripted => {
            use crate::constants::*;
            let script: &[u8] = &[
                ACTION_DOCK,
                ACTION_BUY_FUEL_LARGE,
                ACTION_BUY_REPAIR_KIT,
                ACTION_BUY_STABILIZER,
                ACTION_TRAVEL_LO,
                ACTION_SCAN_WIDE,
                ACTION_SELECT_LO,
                ACTION_SCAN_FOCUSED,
                ACTION_STABILIZE,
                ACTION_MINE_STANDARD,
                ACTION_MINE_STANDARD,
                ACTION_MINE_AGGRESSIVE,
                ACTION_REFINE,
                ACTION_TRAVEL_LO,
                ACTION_SELL_LO,
                ACTION_DOCK,
                ACTION_CASH_OUT,
            ];
            script.iter().copied().cycle().take(steps).collect()
        }
    }
}

fn approx_eq(a: f64, b: f64) -> bool {
    let abs_ok = (a - b).abs() <= 1e-6;
    let denom = a.abs().max(b.abs()).max(1.0);
    let rel_ok = (a - b).abs() / denom <= 1e-5;
    abs_ok || rel_ok
}

fn cumulative_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-4 * a.abs().max(b.abs()).max(1.0)
}

fn compare(t: usize, fast: &TraceRecord, reference: &TraceRecord, out: &mut Vec<Mismatch>) {
    macro_rules! exact {
        ($field:expr, $a:expr, $b:expr) => {
            if $a != $b {
                out.push(Mismatch {
                    t,
                    field: $field.to_string(),
                    fast: format!("{:?}", $a),
                    reference: format!("{:?}", $b),
                });
            }
        };
    }
    macro_rules! approx {
        ($field:expr, $a:expr, $b:expr) => {
            if !approx_eq($a as f64, $b as f64) {
                out.push(Mismatch {
                    t,
                    field: $field.to_string(),
                    fast: format!("{}", $a),
                    reference: format!("{}", $b),
                });
            }
        };
    }
    macro_rules! cumulative {
        ($field:expr, $a:expr, $b:expr) => {
            if !cumulative_eq($a, $b) {
                out.push(Mismatch {
                    t,
                    field: $field.to_string(),
                    fast: format!("{}", $a),
                    reference: format!("{}", $b),
                });
            }
        };
    }

    exact!("action", fast.action, reference.action);
    exact!("dt", fast.dt, reference.dt);
    exact!("terminated", fast.terminated, reference.terminated);
    exact!("truncated", fast.truncated, reference.truncated);
    approx!("reward", fast.reward, reference.reward);

    for i in 0..fast.obs.len() {
        if !approx_eq(fast.obs[i] as f64, reference.obs[i] as f64) {
            out.push(Mismatch {
                t,
                field: format!("obs[{i}]"),
                fast: format!("{}", fast.obs[i]),
                reference: format!("{}", reference.obs[i]),
            });
        }
    }

    cumulative!("metrics.credits", fast.metrics.credits, reference.metrics.credits);
    cumulative!("metrics.net_profit", fast.metrics.net_profit, reference.metrics.net_profit);
    cumulative!(
        "metrics.value_lost_to_pirates",
        fast.metrics.value_lost_to_pirates,
        reference.metrics.value_lost_to_pirates
    );
    approx!("metrics.profit_per_tick", fast.metrics.profit_per_tick, reference.metrics.profit_per_tick);
    approx!("metrics.survival", fast.metrics.survival, reference.metrics.survival);
    approx!("metrics.fuel_used", fast.metrics.fuel_used, reference.metrics.fuel_used);
    approx!("metrics.hull_damage", fast.metrics.hull_damage, reference.metrics.hull_damage);
    approx!("metrics.tool_wear", fast.metrics.tool_wear, reference.metrics.tool_wear);
    approx!(
        "metrics.cargo_utilization_avg",
        fast.metrics.cargo_utilization_avg,
        reference.metrics.cargo_utilization_avg
    );
    exact!("metrics.overheat_ticks", fast.metrics.overheat_ticks, reference.metrics.overheat_ticks);
    exact!("metrics.pirate_encounters", fast.metrics.pirate_encounters, reference.metrics.pirate_encounters);
    exact!("metrics.scan_count", fast.metrics.scan_count, reference.metrics.scan_count);
    exact!("metrics.mining_ticks", fast.metrics.mining_ticks, reference.metrics.mining_ticks);
}

/// Run one seed through one suite for `steps` ticks, comparing the fast
/// core against the reference core at every tick.
pub fn run_one(seed: u64, suite: Suite, steps: usize, config: EpisodeConfig) -> ParityReport {
    let mut fast = Episode::new(config.clone());
    let mut reference = ReferenceEpisode::new(config);
    CoreImpl::reset(&mut fast, seed);
    CoreImpl::reset(&mut reference, seed);

    let actions = action_sequence(suite, seed, steps);
    let mut mismatches = Vec::new();
    for (t, &action) in actions.iter().enumerate() {
        let fast_rec = fast.step_record(action, t);
        let reference_rec = reference.step_record(action, t);
        compare(t, &fast_rec, &reference_rec, &mut mismatches);
    }

    ParityReport {
        seed,
        suite: suite.name(),
        steps_run: actions.len(),
        mismatches,
    }
}

/// Run every `(seed, suite)` pair in the minimum coverage matrix (spec
/// §4.10: at least 10 seeds x 3 suites x 2 time budgets x ~2000 steps).
pub fn run_matrix(seeds: &[u64], steps: usize) -> Vec<ParityReport> {
    let suites = [Suite::Uniform, Suite::Adversarial, Suite::Scripted];
    let budgets = [EpisodeConfig::default(), EpisodeConfig::build(&[("time_max", 500.0)]).unwrap()];

    let mut reports = Vec::with_capacity(seeds.len() * suites.len() * budgets.len());
    for &seed in seeds {
        for &suite in &suites {
            for budget in &budgets {
                reports.push(run_one(seed, suite, steps, budget.clone()));
            }
        }
    }
    reports
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fast_and_reference_agree_on_a_short_uniform_run() {
        let report = run_one(1, Suite::Uniform, 300, EpisodeConfig::default());
        assert!(
            report.is_clean(),
            "seed {} suite {}: {} mismatches, first: {:?}",
            report.seed,
            report.suite,
            report.mismatches.len(),
            report.mismatches.first()
        );
    }

    #[test]
    fn fast_and_reference_agree_on_a_short_adversarial_run() {
        let report = run_one(2, Suite::Adversarial, 300, EpisodeConfig::default());
        assert!(
            report.is_clean(),
            "seed {} suite {}: {} mismatches, first: {:?}",
            report.seed,
            report.suite,
            report.mismatches.len(),
            report.mismatches.first()
        );
    }

    #[test]
    fn fast_and_reference_agree_on_the_scripted_scenario() {
        let report = run_one(3, Suite::Scripted, 200, EpisodeConfig::default());
        assert!(
            report.is_clean(),
            "seed {} suite {}: {} mismatches, first: {:?}",
            report.seed,
            report.suite,
            report.mismatches.len(),
            report.mismatches.first()
        );
    }
}
