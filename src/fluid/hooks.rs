//! Step hooks
//!
//! The solver exposes two injection points per step: the inter hook runs after
//! force accumulation and before integration, the post hook runs after
//! integration and before grid migration. Hooks see the particles through a
//! [`HookContext`] borrowed from the solver for the duration of the call.

use super::config::DomainExtents;
use super::grid::SpatialGrid;
use super::particle::{Particle, ParticleStore};
use super::solver::StepPhase;

/// Mutable view handed to a hook
pub struct HookContext<'a> {
    grid: &'a SpatialGrid,
    particles: &'a mut ParticleStore,
    domain: DomainExtents,
    phase: StepPhase,
    step_index: u64,
    timestep: f32,
}

impl<'a> HookContext<'a> {
    pub(crate) fn new(
        grid: &'a SpatialGrid,
        particles: &'a mut ParticleStore,
        domain: DomainExtents,
        phase: StepPhase,
        step_index: u64,
        timestep: f32,
    ) -> Self {
        Self {
            grid,
            particles,
            domain,
            phase,
            step_index,
            timestep,
        }
    }

    /// Visit every particle in grid order
    ///
    /// Grid order is the cell-linear order of the active buffer, insertion order
    /// within a cell. Positions written here are picked up by the next
    /// migration, not immediately.
    pub fn for_each_particle(&mut self, mut visit: impl FnMut(&mut Particle)) {
        for id in self.grid.particle_order() {
            visit(self.particles.get_mut(id));
        }
    }

    pub fn particles(&self) -> &ParticleStore {
        &*self.particles
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    /// `StepPhase::InterHook` or `StepPhase::PostHook`
    pub fn phase(&self) -> StepPhase {
        self.phase
    }

    /// Zero-based index of the step in progress
    pub fn step_index(&self) -> u64 {
        self.step_index
    }

    pub fn timestep(&self) -> f32 {
        self.timestep
    }

    pub fn core_radius(&self) -> f32 {
        self.grid.core_radius()
    }

    pub fn domain(&self) -> DomainExtents {
        self.domain
    }
}

/// Caller-supplied step callback
///
/// Implemented for any `FnMut(&mut HookContext)` closure, so hooks can carry
/// their own captured state.
pub trait StepHook {
    fn run(&mut self, ctx: &mut HookContext<'_>);
}

impl<F> StepHook for F
where
    F: FnMut(&mut HookContext<'_>),
{
    fn run(&mut self, ctx: &mut HookContext<'_>) {
        self(ctx)
    }
}

/// Absent hook
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHook;

impl StepHook for NoHook {
    fn run(&mut self, _ctx: &mut HookContext<'_>) {}
}
