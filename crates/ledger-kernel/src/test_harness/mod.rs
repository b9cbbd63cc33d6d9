//! Test harness module
//!
//! Randomized simulation of the ledger against a value model

pub mod simulator;

pub use simulator::*;

/// Test harness for running multi-seed certification
pub struct TestHarness;

impl TestHarness {
    /// Run the simulator once per seed in `0..seeds`
    pub fn run_certification(seeds: u64, base: SimulatorConfig) -> CertificationReport {
        tracing::info!(seeds, "Running certification simulation");

        let mut failed_seeds = Vec::new();
        let mut total_violations = 0;
        let mut batches_committed = 0;

        for seed in 0..seeds {
            let report = run_simulator(SimulatorConfig {
                seed,
                ..base.clone()
            });
            if !report.passed() {
                failed_seeds.push(seed);
            }
            total_violations += report.violations.len();
            batches_committed += report.stats.batches_committed;
        }

        CertificationReport {
            passed: failed_seeds.is_empty(),
            total_violations,
            seeds_tested: seeds,
            failed_seeds,
            batches_committed,
        }
    }
}

/// Report from certification
#[derive(Debug, Clone, serde::Serialize)]
pub struct CertificationReport {
    /// True when no seed failed
    pub passed: bool,
    /// Violations summed over all seeds
    pub total_violations: usize,
    /// Seeds run
    pub seeds_tested: u64,
    /// Seeds with at least one violation
    pub failed_seeds: Vec<u64>,
    /// Committed batches summed over all seeds
    pub batches_committed: u64,
}
