//! Fixed-duration, multi-threaded scenario driver.
//!
//! Each iteration spawns one scoped thread per group member, releases them
//! together through a [`Barrier`], lets them loop on [`Scenario::op`] until a
//! shared stop flag flips, and then joins them. A panic inside an operation is
//! re-raised on the calling thread once every worker has stopped.

use std::panic;
use std::sync::Barrier;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info};

use crate::error::ConfigError;
use crate::harness::config::RunConfig;
use crate::harness::scenario::{GroupSpec, Scenario};

/// Operations completed by one group across all measured iterations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupReport {
    pub name: &'static str,
    pub threads: usize,
    pub operations: u64,
}

/// Result of [`run`].
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub scenario: String,
    pub groups: Vec<GroupReport>,
    /// Measured wall-clock duration of each iteration.
    pub iterations: Vec<Duration>,
    /// Scenario counters read after the last iteration.
    pub aux_counters: Vec<(&'static str, u64)>,
}

impl RunReport {
    /// Operations summed over every group.
    pub fn total_operations(&self) -> u64 {
        self.groups.iter().map(|group| group.operations).sum()
    }

    /// Total measured time.
    pub fn elapsed(&self) -> Duration {
        self.iterations.iter().sum()
    }

    /// Operations per second over all measured iterations.
    pub fn throughput(&self) -> f64 {
        let seconds = self.elapsed().as_secs_f64();
        if seconds == 0.0 {
            return 0.0;
        }
        self.total_operations() as f64 / seconds
    }

    /// Operations per second of one group.
    pub fn group_throughput(&self, name: &str) -> Option<f64> {
        let seconds = self.elapsed().as_secs_f64();
        self.group(name).map(|group| {
            if seconds == 0.0 {
                0.0
            } else {
                group.operations as f64 / seconds
            }
        })
    }

    pub fn group(&self, name: &str) -> Option<&GroupReport> {
        self.groups.iter().find(|group| group.name == name)
    }

    pub fn aux_counter(&self, name: &str) -> Option<u64> {
        self.aux_counters
            .iter()
            .find(|(counter, _)| *counter == name)
            .map(|(_, value)| *value)
    }
}

/// Runs `scenario` under `config`.
///
/// Calls `setup`, then `warmup_iterations` unmeasured and `iterations`
/// measured iterations (each followed by `iteration_teardown`), reads the
/// auxiliary counters, and finally calls `teardown`.
///
/// # Errors
///
/// Returns [`ConfigError`] if `config` is invalid or the scenario has no
/// threads to run. Nothing is set up in that case.
///
/// # Panics
///
/// Re-raises a panic from any scenario operation.
pub fn run<S: Scenario>(scenario: &mut S, config: &RunConfig) -> Result<RunReport, ConfigError> {
    config.validate()?;
    let groups = scenario.groups();
    let total_threads: usize = groups.iter().map(|group| group.threads).sum();
    if total_threads == 0 {
        return Err(ConfigError::new(format!(
            "scenario {} has no threads to run",
            scenario.name()
        )));
    }

    let name = scenario.name();
    info!(
        "{}: setup ({} threads in {} groups)",
        name,
        total_threads,
        groups.len()
    );
    scenario.setup();

    let shared: &S = scenario;
    for iteration in 0..config.warmup_iterations {
        let (_, elapsed) = run_iteration(shared, &groups, config.iteration_duration);
        shared.iteration_teardown();
        debug!("{}: warmup {} took {:?}", name, iteration, elapsed);
    }

    let mut operations = vec![0u64; groups.len()];
    let mut iterations = Vec::with_capacity(config.iterations);
    for iteration in 0..config.iterations {
        let (counts, elapsed) = run_iteration(shared, &groups, config.iteration_duration);
        shared.iteration_teardown();
        debug!(
            "{}: iteration {} took {:?}, {} ops",
            name,
            iteration,
            elapsed,
            counts.iter().sum::<u64>()
        );
        for (total, count) in operations.iter_mut().zip(counts) {
            *total += count;
        }
        iterations.push(elapsed);
    }
    let aux_counters = shared.aux_counters();

    scenario.teardown();

    let report = RunReport {
        scenario: name,
        groups: groups
            .iter()
            .zip(operations)
            .map(|(group, operations)| GroupReport {
                name: group.name,
                threads: group.threads,
                operations,
            })
            .collect(),
        iterations,
        aux_counters,
    };
    info!(
        "{}: {} ops in {:?} ({:.0} ops/s)",
        report.scenario,
        report.total_operations(),
        report.elapsed(),
        report.throughput()
    );
    Ok(report)
}

fn run_iteration<S: Scenario>(
    scenario: &S,
    groups: &[GroupSpec],
    duration: Duration,
) -> (Vec<u64>, Duration) {
    let total_threads: usize = groups.iter().map(|group| group.threads).sum();
    let barrier = Barrier::new(total_threads + 1);
    let stop = AtomicBool::new(false);

    thread::scope(|scope| {
        let mut workers = Vec::with_capacity(total_threads);
        let mut thread_index = 0;
        for (group, spec) in groups.iter().enumerate() {
            for _ in 0..spec.threads {
                let mut state = scenario.thread_state(group, thread_index);
                thread_index += 1;
                let (barrier, stop) = (&barrier, &stop);
                let worker = scope.spawn(move || {
                    barrier.wait();
                    let mut operations = 0u64;
                    while !stop.load(Ordering::Relaxed) {
                        scenario.op(group, &mut state);
                        operations += 1;
                    }
                    operations
                });
                workers.push((group, worker));
            }
        }

        barrier.wait();
        let started = Instant::now();
        thread::sleep(duration);
        stop.store(true, Ordering::Relaxed);

        let mut counts = vec![0u64; groups.len()];
        let mut failure = None;
        for (group, worker) in workers {
            match worker.join() {
                Ok(operations) => counts[group] += operations,
                Err(payload) => failure = Some(payload),
            }
        }
        let elapsed = started.elapsed();

        if let Some(payload) = failure {
            panic::resume_unwind(payload);
        }
        (counts, elapsed)
    })
}
