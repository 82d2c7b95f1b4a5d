//! Capability used by the parity harness (spec §9 design note: "represent
//! as a capability... the harness depends on the capability, not a
//! concrete type"). Both the fast core (`episode::Episode`) and the
//! readable reference (`reference::ReferenceEpisode`) implement it.

use crate::constants::OBS_DIM;
use crate::metrics::StepMetrics;

#[derive(Clone, Debug)]
pub struct TraceRecord {
    pub t: usize,
    pub action: i16,
    pub dt: u16,
    pub reward: f32,
    pub terminated: bool,
    pub truncated: bool,
    pub obs: [f32; OBS_DIM],
    pub metrics: StepMetrics,
}

pub trait CoreImpl {
    fn reset(&mut self, seed: u64);
    fn step_record(&mut self, action: u8, t: usize) -> TraceRecord;
}

impl CoreImpl for crate::episode::Episode {
    fn reset(&mut self, seed: u64) {
        crate::episode::Episode::reset(self, seed, None);
    }

    fn step_record(&mut self, action: u8, t: usize) -> TraceRecord {
        let r = self.step(action);
        TraceRecord {
            t,
            action: r.action,
            dt: r.dt,
            reward: r.reward,
            terminated: r.terminated,
            truncated: r.truncated,
            obs: r.obs,
            metrics: r.metrics,
        }
    }
}

impl CoreImpl for crate::reference::ReferenceEpisode {
    fn reset(&mut self, seed: u64) {
        crate::reference::ReferenceEpisode::reset(self, seed);
    }

    fn step_record(&mut self, action: u8, t: usize) -> TraceRecord {
        let r = self.step(action);
        TraceRecord {
            t,
            action: r.action,
            dt: r.dt,
            reward: r.reward,
            terminated: r.terminated,
            truncated: r.truncated,
            obs: r.obs,
            metrics: r.metrics,
        }
    }
}
