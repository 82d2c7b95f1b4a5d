//! Batch driver (spec §4.9): reset/step over N independent episodes with
//! preallocated, contiguous output buffers. Each episode is fully
//! independent — no shared mutable state crosses slots — so the rayon
//! split here is purely a throughput optimization; scalar callers of
//! `Episode::reset`/`Episode::step` must see identical per-slot results.

use rayon::prelude::*;

use crate::episode::{Episode, StepResult};

/// Reset every episode in `episodes` to its paired seed, writing each
/// resulting observation into the matching slot of `obs_out`.
pub fn reset_many(episodes: &mut [Episode], seeds: &[u64], obs_out: &mut [[f32; crate::constants::OBS_DIM]]) {
    assert_eq!(episodes.len(), seeds.len());
    assert_eq!(episodes.len(), obs_out.len());
    episodes
        .par_iter_mut()
        .zip(seeds.par_iter())
        .zip(obs_out.par_iter_mut())
        .for_each(|((ep, &seed), out)| {
            ep.reset(seed, Some(out));
        });
}

/// Step every episode in `episodes` with its paired action.
pub fn step_many(episodes: &mut [Episode], actions: &[u8]) -> Vec<StepResult> {
    assert_eq!(episodes.len(), actions.len());
    episodes
        .par_iter_mut()
        .zip(actions.par_iter())
        .map(|(ep, &action)| ep.step(action))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EpisodeConfig;
    use crate::constants::{ACTION_HOLD, OBS_DIM};

    #[test]
    fn batched_reset_matches_scalar_reset() {
        let seeds = [1u64, 2, 3, 4];
        let mut batched: Vec<Episode> = seeds.iter().map(|_| Episode::new(EpisodeConfig::default())).collect();
        let mut obs_out = vec![[0.0f32; OBS_DIM]; seeds.len()];
        reset_many(&mut batched, &seeds, &mut obs_out);

        for (i, &seed) in seeds.iter().enumerate() {
            let mut scalar = Episode::new(EpisodeConfig::default());
            scalar.reset(seed, None);
            assert_eq!(scalar.obs(), &obs_out[i]);
        }
    }

    #[test]
    fn batched_step_matches_scalar_step() {
        let seeds = [10u64, 20, 30];
        let mut batched: Vec<Episode> = seeds.iter().map(|_| Episode::new(EpisodeConfig::default())).collect();
        for (ep, &seed) in batched.iter_mut().zip(seeds.iter()) {
            ep.reset(seed, None);
        }
        let actions = [ACTION_HOLD; 3];
        let results = step_many(&mut batched, &actions);

        for (i, &seed) in seeds.iter().enumerate() {
            let mut scalar = Episode::new(EpisodeConfig::default());
            scalar.reset(seed, None);
            let scalar_result = scalar.step(ACTION_HOLD);
            assert_eq!(results[i].dt, scalar_result.dt);
            assert_eq!(results[i].obs, scalar_result.obs);
        }
    }
}
