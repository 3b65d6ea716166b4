/// Wave scene
///
/// The collaborators that drive the solver: gravity as the inter hook, a
/// container as the post hook, a lattice seeding and the per-frame driver that
/// turns particles into voxels.

pub mod hooks;
pub mod lattice;
pub mod wave;

pub use hooks::{Boundary, BoxBoundary, CylinderBoundary, GravityHook, HookChain, OscillatingWall};
pub use lattice::lattice_positions;
pub use wave::{BoundaryKind, WaveScene, WaveSceneConfig};
