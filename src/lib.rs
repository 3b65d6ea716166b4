pub mod constants;
pub mod error;
pub mod fluid;
pub mod scene;

pub use error::{WaveError, WaveResult};
pub use fluid::{
    DomainExtents, ExecutionMode, FluidMaterial, HookContext, NoHook, Particle, ParticleId,
    SolverConfig, SphSolver, StepHook, StepPhase, StepStats, VoxelInstance,
};
pub use scene::{BoundaryKind, CylinderBoundary, BoxBoundary, GravityHook, HookChain, WaveScene, WaveSceneConfig};
