//! SPH Fluid System
//!
//! Grid-accelerated smoothed-particle hydrodynamics on the CPU. Particles live
//! in a flat store indexed by id; a double-buffered uniform grid with cells
//! the size of the interaction radius limits every pair search to a 27-cell
//! neighborhood. Each step runs reset, density, force, inter hook, integrate,
//! post hook and migrate in that order.

pub mod accumulate;
pub mod config;
pub mod error;
pub mod grid;
pub mod hooks;
pub mod integrator;
pub mod kernels;
pub mod material;
pub mod particle;
pub mod performance;
pub mod snapshot;
pub mod solver;

pub use accumulate::{accumulate_densities, accumulate_forces, reset_accumulators};
pub use config::{DomainExtents, ExecutionMode, SolverConfig};
pub use error::{FluidErrorContext, FluidResult};
pub use grid::{CellCoord, GridDimensions, GridStats, MigrationReport, SpatialGrid};
pub use hooks::{HookContext, NoHook, StepHook};
pub use integrator::{integrate, integrate_particle, surface_tension_force};
pub use kernels::SmoothingKernels;
pub use material::FluidMaterial;
pub use particle::{Particle, ParticleId, ParticleStore};
pub use performance::{
    record_step, FluidPerformanceMetrics, FluidPerformanceMonitor, PerformanceStatus, StepStats,
};
pub use snapshot::{surface_color, visual_scale, VoxelInstance};
pub use solver::{SphSolver, StepPhase};
