use crate::constants::perf::{HISTORY_SIZE, STEP_BUDGET_MS};
use std::collections::VecDeque;
use std::time::Duration;

/// Timings and counters for the most recent step
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepStats {
    pub reset: Duration,
    pub densities: Duration,
    pub forces: Duration,
    pub inter_hook: Duration,
    pub integrate: Duration,
    pub post_hook: Duration,
    pub migrate: Duration,

    pub particle_count: usize,

    /// Particles whose position fell outside the grid at migration
    pub out_of_domain: usize,

    /// Steps completed by the solver, including this one
    pub steps_run: u64,
}

impl StepStats {
    pub fn total(&self) -> Duration {
        self.reset
            + self.densities
            + self.forces
            + self.inter_hook
            + self.integrate
            + self.post_hook
            + self.migrate
    }

    /// Solver work only, hooks excluded
    pub fn solver_time(&self) -> Duration {
        self.total() - self.inter_hook - self.post_hook
    }
}

/// Rolling step timing averages
#[derive(Debug, Clone, Default)]
pub struct FluidPerformanceMetrics {
    pub step_time_ms: f32,
    pub max_step_time_ms: f32,
    pub solver_time_ms: f32,
    pub hook_time_ms: f32,
    pub particle_count: usize,
    pub out_of_domain: usize,
}

/// Performance monitor for the fluid solver
pub struct FluidPerformanceMonitor {
    step_times: VecDeque<Duration>,
    solver_times: VecDeque<Duration>,
    history_size: usize,

    /// Per-step budget in milliseconds
    budget_ms: f32,

    current_metrics: FluidPerformanceMetrics,

    warnings_enabled: bool,
}

impl FluidPerformanceMonitor {
    pub fn new() -> Self {
        Self::with_budget(STEP_BUDGET_MS)
    }

    pub fn with_budget(budget_ms: f32) -> Self {
        Self {
            step_times: VecDeque::with_capacity(HISTORY_SIZE),
            solver_times: VecDeque::with_capacity(HISTORY_SIZE),
            history_size: HISTORY_SIZE,
            budget_ms,
            current_metrics: FluidPerformanceMetrics::default(),
            warnings_enabled: true,
        }
    }

    pub fn set_warnings_enabled(&mut self, enabled: bool) {
        self.warnings_enabled = enabled;
    }

    pub fn get_metrics(&self) -> &FluidPerformanceMetrics {
        &self.current_metrics
    }

    pub fn samples(&self) -> usize {
        self.step_times.len()
    }

    /// Average step time against the budget
    pub fn check_performance(&self) -> PerformanceStatus {
        let average = self.current_metrics.step_time_ms;
        if average <= self.budget_ms {
            PerformanceStatus::Good
        } else if average <= self.budget_ms * 2.0 {
            PerformanceStatus::Acceptable
        } else {
            PerformanceStatus::Poor
        }
    }
}

impl Default for FluidPerformanceMonitor {
    fn default() -> Self {
        Self::new()
    }
}

/// Record a finished step (DOP)
pub fn record_step(monitor: &mut FluidPerformanceMonitor, stats: &StepStats) {
    push_bounded(&mut monitor.step_times, stats.total(), monitor.history_size);
    push_bounded(&mut monitor.solver_times, stats.solver_time(), monitor.history_size);

    monitor.current_metrics.particle_count = stats.particle_count;
    monitor.current_metrics.out_of_domain = stats.out_of_domain;

    update_metrics(monitor);
}

fn push_bounded(history: &mut VecDeque<Duration>, sample: Duration, limit: usize) {
    history.push_back(sample);
    while history.len() > limit {
        history.pop_front();
    }
}

fn average_ms(history: &VecDeque<Duration>) -> f32 {
    if history.is_empty() {
        return 0.0;
    }
    let total: Duration = history.iter().sum();
    total.as_secs_f32() * 1000.0 / history.len() as f32
}

/// Update internal metrics (DOP)
fn update_metrics(monitor: &mut FluidPerformanceMonitor) {
    let metrics = &mut monitor.current_metrics;
    metrics.step_time_ms = average_ms(&monitor.step_times);
    metrics.solver_time_ms = average_ms(&monitor.solver_times);
    metrics.hook_time_ms = (metrics.step_time_ms - metrics.solver_time_ms).max(0.0);
    metrics.max_step_time_ms = monitor
        .step_times
        .iter()
        .max()
        .map(|d| d.as_secs_f32() * 1000.0)
        .unwrap_or(0.0);

    // Only once the history is full, a cold start is not representative
    if monitor.warnings_enabled
        && monitor.step_times.len() == monitor.history_size
        && monitor.check_performance() == PerformanceStatus::Poor
    {
        log::warn!(
            "Fluid step time {:.2} ms over budget {:.2} ms",
            monitor.current_metrics.step_time_ms,
            monitor.budget_ms
        );
    }
}

/// Performance status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceStatus {
    Good,       // within budget
    Acceptable, // up to twice the budget
    Poor,
}
