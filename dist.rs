//! Distribution helpers built on top of `Rng`. Every formula here is part
//! of the parity contract (spec §4.2): the fast core and the reference core
//! must call these exact functions, in the exact draw order documented on
//! each call site, never substitute an equivalent-in-distribution but
//! differently-ordered draw.

use crate::rng::Rng;

/// `lo + next_u32() mod (hi - lo)`. Biased (not rejection-sampled) by
/// design — both implementations must agree on the bias, and avoiding
/// rejection keeps the number of `next_u32()` draws fixed per call.
#[inline]
pub fn u32_range(rng: &mut Rng, lo: u32, hi_excl: u32) -> u32 {
    debug_assert!(hi_excl > lo);
    lo + rng.next_u32() % (hi_excl - lo)
}

/// Uniform float in `[a, b)`.
#[inline]
pub fn uniform(rng: &mut Rng, a: f64, b: f64) -> f64 {
    a + (b - a) * rng.next_f32() as f64
}

/// Unit-rate exponential draw: `-ln(max(next_f32(), 1e-8))`.
#[inline]
pub fn exp_unit(rng: &mut Rng) -> f64 {
    -(rng.next_f32() as f64).max(1e-8).ln()
}

/// Standard normal via Box–Muller, consuming two consecutive `f32` draws
/// in the order `u1` then `u2`. `u1` feeds the radius term and is clamped
/// to `1e-8` on underflow rather than redrawn (spec open question,
/// resolved in SPEC_FULL.md §4 to keep draw count fixed).
#[inline]
pub fn normal(rng: &mut Rng, mu: f64, sigma: f64) -> f64 {
    let u1 = (rng.next_f32() as f64).max(1e-8);
    let u2 = rng.next_f32() as f64;
    let radius = (-2.0 * u1.ln()).sqrt();
    let z = radius * (2.0 * std::f64::consts::PI * u2).cos();
    mu + sigma * z
}

/// `exp(normal(mu, sigma))`.
#[inline]
pub fn lognormal(rng: &mut Rng, mu: f64, sigma: f64) -> f64 {
    normal(rng, mu, sigma).exp()
}

/// Beta(3,2) via a ratio of Erlang (summed-exponential) draws:
/// `A / (A + B)` with `A` the sum of 3 unit-exponential draws and `B` the
/// sum of 2. Returns 0.5 if the sum is non-positive (degenerate, should not
/// occur since every exponential draw is positive, but guards division).
pub fn beta_3_2(rng: &mut Rng) -> f64 {
    let a: f64 = (0..3).map(|_| exp_unit(rng)).sum();
    let b: f64 = (0..2).map(|_| exp_unit(rng)).sum();
    let sum = a + b;
    if sum <= 0.0 {
        0.5
    } else {
        a / sum
    }
}

/// Dirichlet(1,...,1) over `k` components: normalize `k` unit-exponential
/// draws. Falls back to a uniform `1/k` fill if the sum is degenerate.
pub fn dirichlet_ones(rng: &mut Rng, k: usize) -> Vec<f64> {
    let draws: Vec<f64> = (0..k).map(|_| exp_unit(rng)).collect();
    let sum: f64 = draws.iter().sum();
    if sum <= 0.0 {
        vec![1.0 / k as f64; k]
    } else {
        draws.iter().map(|&d| d / sum).collect()
    }
}

/// Same as [`dirichlet_ones`] but written into a caller-owned fixed slice,
/// for use in the allocation-free fast core. `out[..k]` is written;
/// remaining entries are left untouched.
pub fn dirichlet_ones_into(rng: &mut Rng, k: usize, out: &mut [f64]) {
    debug_assert!(out.len() >= k);
    let mut sum = 0.0;
    for slot in out.iter_mut().take(k) {
        let d = exp_unit(rng);
        *slot = d;
        sum += d;
    }
    if sum <= 0.0 {
        let fill = 1.0 / k as f64;
        for slot in out.iter_mut().take(k) {
            *slot = fill;
        }
    } else {
        for slot in out.iter_mut().take(k) {
            *slot /= sum;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u32_range_stays_in_bounds() {
        let mut rng = Rng::seed(1, crate::constants::EPISODE_STREAM as u64);
        for _ in 0..10_000 {
            let v = u32_range(&mut rng, 5, 9);
            assert!((5..9).contains(&v));
        }
    }

    #[test]
    fn uniform_stays_in_bounds() {
        let mut rng = Rng::seed(2, 54);
        for _ in 0..10_000 {
            let v = uniform(&mut rng, -3.0, 7.0);
            assert!(v >= -3.0 && v < 7.0);
        }
    }

    #[test]
    fn exp_unit_is_nonnegative_and_finite() {
        let mut rng = Rng::seed(3, 54);
        for _ in 0..10_000 {
            let v = exp_unit(&mut rng);
            assert!(v >= 0.0 && v.is_finite());
        }
    }

    #[test]
    fn normal_is_finite_and_roughly_zero_mean() {
        let mut rng = Rng::seed(4, 54);
        let n = 50_000;
        let sum: f64 = (0..n).map(|_| normal(&mut rng, 0.0, 1.0)).sum();
        let mean = sum / n as f64;
        assert!(mean.abs() < 0.05, "mean drifted: {mean}");
    }

    #[test]
    fn beta_3_2_in_unit_interval() {
        let mut rng = Rng::seed(5, 54);
        for _ in 0..10_000 {
            let v = beta_3_2(&mut rng);
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn dirichlet_ones_sums_to_one() {
        let mut rng = Rng::seed(6, 54);
        for _ in 0..1_000 {
            let v = dirichlet_ones(&mut rng, 6);
            let sum: f64 = v.iter().sum();
            assert!((sum - 1.0).abs() < 1e-9);
            assert!(v.iter().all(|&x| x >= 0.0));
        }
    }

    #[test]
    fn dirichlet_ones_into_matches_vec_version_draw_count() {
        // Same seed, same number of `exp_unit` draws consumed either way.
        let mut rng_a = Rng::seed(11, 54);
        let mut rng_b = Rng::seed(11, 54);
        let _ = dirichlet_ones(&mut rng_a, 6);
        let mut out = [0.0; 8];
        dirichlet_ones_into(&mut rng_b, 6, &mut out);
        // Both consumed exactly 6 draws; next draw from each agrees.
        assert_eq!(rng_a.next_u32(), rng_b.next_u32());
    }
}
