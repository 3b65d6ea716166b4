//! SPH solver and its step state machine

use super::accumulate::{accumulate_densities, accumulate_forces, reset_accumulators};
use super::config::SolverConfig;
use super::error::{ensure_mass, FluidResult};
use super::grid::{GridStats, SpatialGrid};
use super::hooks::{HookContext, NoHook, StepHook};
use super::integrator::integrate;
use super::kernels::SmoothingKernels;
use super::material::FluidMaterial;
use super::particle::{Particle, ParticleId, ParticleStore};
use super::performance::StepStats;
use super::snapshot::VoxelInstance;
use crate::error::WaveError;
use glam::Vec3;
use std::time::Instant;

/// Phase of the step cycle the solver is in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepPhase {
    Idle,
    ResetAccumulators,
    AccumulateDensities,
    AccumulateForces,
    InterHook,
    Integrate,
    PostHook,
    Migrate,
}

impl StepPhase {
    /// Successor in the cycle; `Migrate` wraps back to `Idle`
    pub fn next(self) -> Self {
        match self {
            StepPhase::Idle => StepPhase::ResetAccumulators,
            StepPhase::ResetAccumulators => StepPhase::AccumulateDensities,
            StepPhase::AccumulateDensities => StepPhase::AccumulateForces,
            StepPhase::AccumulateForces => StepPhase::InterHook,
            StepPhase::InterHook => StepPhase::Integrate,
            StepPhase::Integrate => StepPhase::PostHook,
            StepPhase::PostHook => StepPhase::Migrate,
            StepPhase::Migrate => StepPhase::Idle,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            StepPhase::Idle => "idle",
            StepPhase::ResetAccumulators => "reset",
            StepPhase::AccumulateDensities => "densities",
            StepPhase::AccumulateForces => "forces",
            StepPhase::InterHook => "inter_hook",
            StepPhase::Integrate => "integrate",
            StepPhase::PostHook => "post_hook",
            StepPhase::Migrate => "migrate",
        }
    }
}

/// Grid-accelerated SPH solver
///
/// Owns the particles and the double-buffered grid. Each [`step`](Self::step)
/// runs one full cycle of [`StepPhase`] and returns to `Idle`.
pub struct SphSolver {
    config: SolverConfig,
    kernels: SmoothingKernels,
    grid: SpatialGrid,
    particles: ParticleStore,
    phase: StepPhase,
    stats: StepStats,
    steps: u64,
    initialized: bool,
}

impl SphSolver {
    pub fn new(config: SolverConfig) -> FluidResult<Self> {
        config.validate()?;
        let grid = SpatialGrid::for_domain(&config.domain, config.core_radius)?;
        let dims = grid.dimensions();

        log::info!(
            "[SphSolver] Grid {}x{}x{} ({} cells), core radius {}, timestep {}, {:?} execution",
            dims.width,
            dims.height,
            dims.depth,
            dims.cell_count(),
            config.core_radius,
            config.timestep,
            config.execution
        );

        Ok(Self {
            kernels: SmoothingKernels::new(config.core_radius),
            grid,
            particles: ParticleStore::new(),
            phase: StepPhase::Idle,
            stats: StepStats::default(),
            steps: 0,
            initialized: false,
            config,
        })
    }

    /// Construct and seed in one call
    pub fn with_particles(
        config: SolverConfig,
        particles: impl IntoIterator<Item = Particle>,
    ) -> FluidResult<Self> {
        let mut solver = Self::new(config)?;
        solver.init_particles(particles)?;
        Ok(solver)
    }

    /// Take ownership of the fixed particle batch and bucket it
    ///
    /// Ids follow batch order. May be called once.
    pub fn init_particles(&mut self, particles: impl IntoIterator<Item = Particle>) -> FluidResult<()> {
        if self.initialized {
            return Err(WaveError::AlreadyInitialized {
                count: self.particles.len(),
            });
        }

        let batch: Vec<Particle> = particles.into_iter().collect();
        for (index, particle) in batch.iter().enumerate() {
            ensure_mass(index, particle.mass())?;
        }

        self.particles = ParticleStore::from_batch(batch);
        self.grid.clear();
        let mut outside = 0usize;
        for particle in self.particles.iter() {
            if !self.grid.insert(particle) {
                outside += 1;
            }
        }
        if outside > 0 {
            log::warn!("[SphSolver] {} initial particles outside the domain were clamped", outside);
        }

        self.initialized = true;
        self.stats.particle_count = self.particles.len();
        log::info!(
            "[SphSolver] Initialized {} particles in {} occupied cells",
            self.particles.len(),
            self.grid.stats().occupied_cells
        );
        Ok(())
    }

    /// Advance one timestep with no hooks
    pub fn step(&mut self) {
        self.step_with(&mut NoHook, &mut NoHook);
    }

    /// Advance one timestep
    ///
    /// `inter` runs after force accumulation, `post` after integration. Pass
    /// [`NoHook`] for either to skip it.
    pub fn step_with<I, P>(&mut self, inter: &mut I, post: &mut P)
    where
        I: StepHook + ?Sized,
        P: StepHook + ?Sized,
    {
        let mode = self.config.execution;
        let mut stats = StepStats {
            particle_count: self.particles.len(),
            ..StepStats::default()
        };

        let started = self.enter(StepPhase::ResetAccumulators);
        reset_accumulators(&mut self.particles, mode);
        stats.reset = started.elapsed();

        let started = self.enter(StepPhase::AccumulateDensities);
        accumulate_densities(&self.grid, &mut self.particles, &self.kernels, mode);
        stats.densities = started.elapsed();

        let started = self.enter(StepPhase::AccumulateForces);
        accumulate_forces(
            &self.grid,
            &mut self.particles,
            &self.kernels,
            &self.config.material,
            mode,
        );
        stats.forces = started.elapsed();

        let started = self.enter(StepPhase::InterHook);
        self.run_hook(inter);
        stats.inter_hook = started.elapsed();

        let started = self.enter(StepPhase::Integrate);
        integrate(
            &mut self.particles,
            &self.config.material,
            self.config.timestep,
            mode,
        );
        stats.integrate = started.elapsed();

        let started = self.enter(StepPhase::PostHook);
        self.run_hook(post);
        stats.post_hook = started.elapsed();

        let started = self.enter(StepPhase::Migrate);
        let report = self.grid.migrate(&self.particles);
        stats.migrate = started.elapsed();
        stats.out_of_domain = report.out_of_domain;

        self.enter(StepPhase::Idle);
        self.steps += 1;
        stats.steps_run = self.steps;
        let previously_outside = self.stats.out_of_domain;
        self.stats = stats;

        // Warn when particles start leaving the domain, not on every step they stay out
        if report.out_of_domain > 0 && previously_outside == 0 {
            log::warn!(
                "[SphSolver] Step {}: {} particles outside the domain clamped to boundary cells",
                self.steps,
                report.out_of_domain
            );
        } else if report.out_of_domain > 0 {
            log::debug!(
                "[SphSolver] Step {}: {} particles still outside the domain",
                self.steps,
                report.out_of_domain
            );
        }
        log::debug!(
            "[SphSolver] Step {} took {:.3} ms ({} particles)",
            self.steps,
            stats.total().as_secs_f64() * 1000.0,
            stats.particle_count
        );
    }

    /// Run `count` steps with the same hooks
    pub fn run_steps<I, P>(&mut self, count: u32, inter: &mut I, post: &mut P)
    where
        I: StepHook + ?Sized,
        P: StepHook + ?Sized,
    {
        for _ in 0..count {
            self.step_with(inter, post);
        }
    }

    fn enter(&mut self, phase: StepPhase) -> Instant {
        debug_assert_eq!(self.phase.next(), phase, "step phases out of order");
        log::trace!("[SphSolver] {} -> {}", self.phase.name(), phase.name());
        self.phase = phase;
        Instant::now()
    }

    fn run_hook<H: StepHook + ?Sized>(&mut self, hook: &mut H) {
        let mut ctx = HookContext::new(
            &self.grid,
            &mut self.particles,
            self.config.domain,
            self.phase,
            self.steps,
            self.config.timestep,
        );
        hook.run(&mut ctx);
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn material(&self) -> &FluidMaterial {
        &self.config.material
    }

    pub fn kernels(&self) -> &SmoothingKernels {
        &self.kernels
    }

    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    pub fn grid_stats(&self) -> GridStats {
        self.grid.stats()
    }

    pub fn particles(&self) -> &ParticleStore {
        &self.particles
    }

    pub fn particle(&self, id: ParticleId) -> Option<&Particle> {
        self.particles.get(id)
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    pub fn phase(&self) -> StepPhase {
        self.phase
    }

    pub fn steps_run(&self) -> u64 {
        self.steps
    }

    /// Timings of the last completed step
    pub fn last_step_stats(&self) -> &StepStats {
        &self.stats
    }

    /// Read-only visit of every particle in grid order
    pub fn for_each_particle(&self, mut visit: impl FnMut(&Particle)) {
        for id in self.grid.particle_order() {
            visit(&self.particles[id]);
        }
    }

    /// One voxel per particle in grid order, offset by `origin`
    pub fn snapshot(&self, origin: Vec3) -> Vec<VoxelInstance> {
        let mut instances = Vec::with_capacity(self.particles.len());
        self.snapshot_into(origin, &mut instances);
        instances
    }

    /// Like [`snapshot`](Self::snapshot), reusing `out`
    pub fn snapshot_into(&self, origin: Vec3, out: &mut Vec<VoxelInstance>) {
        out.clear();
        out.reserve(self.particles.len());
        self.for_each_particle(|p| out.push(VoxelInstance::from_particle(p, origin)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fluid::config::DomainExtents;

    fn small_config() -> SolverConfig {
        SolverConfig {
            domain: DomainExtents::new(9.0, 9.0, 9.0),
            ..SolverConfig::default()
        }
    }

    #[test]
    fn test_phase_cycle_returns_to_idle() {
        let mut phase = StepPhase::Idle;
        let mut seen = Vec::new();
        for _ in 0..8 {
            phase = phase.next();
            seen.push(phase);
        }
        assert_eq!(phase, StepPhase::Idle);
        assert_eq!(seen[0], StepPhase::ResetAccumulators);
        assert_eq!(seen[6], StepPhase::Migrate);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = SolverConfig {
            core_radius: 0.0,
            ..small_config()
        };
        assert!(matches!(SphSolver::new(config), Err(WaveError::InvalidCoreRadius { .. })));
    }

    #[test]
    fn test_init_once() {
        let mut solver = SphSolver::new(small_config()).unwrap();
        solver.init_particles([Particle::new(Vec3::ONE)]).unwrap();
        let err = solver.init_particles([Particle::new(Vec3::ONE)]).unwrap_err();
        assert!(matches!(err, WaveError::AlreadyInitialized { count: 1 }));
    }

    #[test]
    fn test_rejects_non_positive_mass() {
        let mut solver = SphSolver::new(small_config()).unwrap();
        let err = solver
            .init_particles([Particle::new(Vec3::ONE), Particle::with_mass(Vec3::ONE, 0.0)])
            .unwrap_err();
        assert!(matches!(err, WaveError::InvalidParticleMass { index: 1, .. }));
    }

    #[test]
    fn test_empty_solver_steps() {
        let mut solver = SphSolver::new(small_config()).unwrap();
        solver.step();
        assert_eq!(solver.steps_run(), 1);
        assert_eq!(solver.phase(), StepPhase::Idle);
        assert!(solver.snapshot(Vec3::ZERO).is_empty());
    }

    #[test]
    fn test_hooks_run_in_their_phases() {
        let mut solver =
            SphSolver::with_particles(small_config(), [Particle::new(Vec3::splat(4.0))]).unwrap();

        let mut phases = Vec::new();
        let mut inter = |ctx: &mut HookContext<'_>| {
            // Forces are final, positions not yet integrated
            ctx.for_each_particle(|p| {
                assert_eq!(p.position, Vec3::splat(4.0));
                p.force += Vec3::new(0.0, -10.0, 0.0);
            });
            phases.push(ctx.phase());
        };
        let mut post_seen = Vec3::ZERO;
        let mut post = |ctx: &mut HookContext<'_>| {
            ctx.for_each_particle(|p| post_seen = p.position);
        };

        solver.step_with(&mut inter, &mut post);

        assert_eq!(phases, vec![StepPhase::InterHook]);
        assert!(post_seen.y < 4.0);
        assert_eq!(solver.last_step_stats().steps_run, 1);
        assert_eq!(solver.last_step_stats().particle_count, 1);
    }

    #[test]
    fn test_snapshot_into_reuses_buffer() {
        let mut solver = SphSolver::with_particles(
            small_config(),
            [Particle::new(Vec3::new(1.0, 1.0, 1.0)), Particle::new(Vec3::new(5.0, 5.0, 5.0))],
        )
        .unwrap();
        solver.step();

        let mut out = vec![VoxelInstance::from_particle(&Particle::new(Vec3::ZERO), Vec3::ZERO); 7];
        solver.snapshot_into(Vec3::new(10.0, 0.0, 0.0), &mut out);

        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|v| v.position[0] > 10.0 && v.scale > 0.0));
    }
}
