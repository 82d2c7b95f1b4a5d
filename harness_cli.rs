use anyhow::{bail, Result};
use clap::{Parser, Subcommand};

use asteroid_prospector_core::config::EpisodeConfig;
use asteroid_prospector_core::episode::Episode;
use asteroid_prospector_core::harness::{self, Suite};

#[derive(Parser)]
#[command(name = "parity-harness", about = "Fast-core vs reference-core parity runner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full minimum-coverage matrix: N seeds x 3 suites x 2 time budgets.
    Matrix {
        #[arg(long, default_value_t = 10)]
        seeds: u64,
        #[arg(long, default_value_t = 2000)]
        steps: usize,
    },
    /// Diff a single seed/suite pair and print every mismatch found.
    Diff {
        #[arg(long)]
        seed: u64,
        #[arg(long, default_value = "uniform")]
        suite: String,
        #[arg(long, default_value_t = 2000)]
        steps: usize,
    },
    /// Measure batched step throughput of the fast core.
    Bench {
        #[arg(long, default_value_t = 64)]
        episodes: usize,
        #[arg(long, default_value_t = 5000)]
        steps: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Matrix { seeds, steps } => matrix_cmd(seeds, steps),
        Commands::Diff { seed, suite, steps } => diff_cmd(seed, &suite, steps),
        Commands::Bench { episodes, steps } => bench_cmd(episodes, steps),
    }
}

fn parse_suite(name: &str) -> Result<Suite> {
    match name {
        "uniform" => Ok(Suite::Uniform),
        "adversarial" => Ok(Suite::Adversarial),
        "scripted" => Ok(Suite::Scripted),
        other => bail!("unknown suite: {other} (expected uniform | adversarial | scripted)"),
    }
}

fn matrix_cmd(seed_count: u64, steps: usize) -> Result<()> {
    let seeds: Vec<u64> = (0..seed_count).collect();
    let reports = harness::run_matrix(&seeds, steps);

    let mut clean = 0;
    let mut dirty = 0;
    for report in &reports {
        if report.is_clean() {
            clean += 1;
        } else {
            dirty += 1;
            println!(
                "[MISMATCH] seed={} suite={} steps={} first={:?}",
                report.seed,
                report.suite,
                report.steps_run,
                report.mismatches.first()
            );
        }
    }
    println!("\n{clean} clean, {dirty} with mismatches, {} total runs", reports.len());
    if dirty > 0 {
        bail!("{dirty} parity run(s) disagreed");
    }
    Ok(())
}

fn diff_cmd(seed: u64, suite: &str, steps: usize) -> Result<()> {
    let suite = parse_suite(suite)?;
    let report = harness::run_one(seed, suite, steps, EpisodeConfig::default());
    if report.is_clean() {
        println!("clean: seed={seed} suite={} steps={}", report.suite, report.steps_run);
        return Ok(());
    }
    println!("{} mismatches (seed={seed} suite={}):", report.mismatches.len(), report.suite);
    for m in &report.mismatches {
        println!("  t={} field={} fast={} reference={}", m.t, m.field, m.fast, m.reference);
    }
    bail!("parity run disagreed");
}

fn bench_cmd(episode_count: usize, steps: usize) -> Result<()> {
    use asteroid_prospector_core::batch;
    use asteroid_prospector_core::constants::{ACTION_HOLD, OBS_DIM};
    use std::time::Instant;

    let mut episodes: Vec<Episode> = (0..episode_count).map(|_| Episode::new(EpisodeConfig::default())).collect();
    let seeds: Vec<u64> = (0..episode_count as u64).collect();
    let mut obs_out = vec![[0.0f32; OBS_DIM]; episode_count];
    batch::reset_many(&mut episodes, &seeds, &mut obs_out);

    let actions = vec![ACTION_HOLD; episode_count];
    let start = Instant::now();
    for _ in 0..steps {
        batch::step_many(&mut episodes, &actions);
    }
    let elapsed = start.elapsed();
    let total_steps = episode_count * steps;
    println!(
        "{total_steps} episode-steps in {:.3}s ({:.0} steps/sec)",
        elapsed.as_secs_f64(),
        total_steps as f64 / elapsed.as_secs_f64()
    );
    Ok(())
}
