// voxel-wave constants
//
// Numeric defaults shared by the solver, the scene hooks and the voxel snapshot.
// Config structs take their `Default` values from here.

/// Solver geometry and numerical guards
pub mod solver {
    /// Default domain extents (width, height, depth)
    pub const DOMAIN_WIDTH: f32 = 60.0;
    pub const DOMAIN_HEIGHT: f32 = 45.0;
    pub const DOMAIN_DEPTH: f32 = 20.0;

    /// Interaction radius, also the grid cell size
    pub const CORE_RADIUS: f32 = 1.5;
    pub const TIMESTEP: f32 = 0.01;

    /// Mass given to particles that do not override it
    pub const PARTICLE_MASS: f32 = 1.0;

    /// Separations shorter than this give a zero pressure gradient
    pub const PRESSURE_GRADIENT_EPSILON: f32 = 0.001;

    /// Color-field gradient magnitude below which surface tension is skipped
    pub const SURFACE_NORMAL_THRESHOLD: f32 = 0.001;

    /// The self pair adds `m * W(0)` to both of its sides, so a particle's own
    /// weight enters its density this many times
    pub const SELF_PAIR_WEIGHT: f32 = 2.0;

    /// Hard ceiling on grid cells per buffer
    pub const MAX_GRID_CELLS: u64 = 1 << 26;

    /// Minimum cells handed to one rayon task in parallel passes
    pub const PARALLEL_MIN_CELLS: usize = 32;
}

/// Water-like material used by the wave scene
pub mod material {
    pub const GAS_CONSTANT: f32 = 1000.0;
    pub const VISCOSITY: f32 = 0.1;
    pub const REST_DENSITY: f32 = 1.2;
    pub const SURFACE_TENSION: f32 = 1.0;
    pub const DAMPING: f32 = 1.0;
}

/// Wave scene collaborators
pub mod scene {
    pub const GRAVITY: f32 = 15.0;
    pub const RESTITUTION: f32 = 1.1;
    pub const PARTICLE_COUNT: usize = 8192;
    pub const LATTICE_SPACING: f32 = 1.0;
    pub const STEPS_PER_FRAME: u32 = 2;

    /// Oscillating wall: amplitude, phase advance per particle visit (degrees)
    /// and the curvature divisor applied to height
    pub const WALL_AMPLITUDE: f32 = 30.0;
    pub const WALL_PHASE_STEP: f32 = 0.00005;
    pub const WALL_CURVATURE: f32 = 80.0;
}

/// Voxel snapshot mapping
pub mod render {
    /// scale = SCALE_NUMERATOR / (density * DENSITY_FACTOR)
    pub const SCALE_NUMERATOR: f32 = 32.0;
    pub const DENSITY_FACTOR: f32 = 100.0;

    /// Base water color in 8-bit RGBA, divided by COLOR_DIVISOR
    pub const BASE_COLOR: [f32; 4] = [31.0, 71.0, 136.0, 255.0];
    pub const COLOR_DIVISOR: f32 = 128.0;
}

/// Step timing history
pub mod perf {
    pub const HISTORY_SIZE: usize = 120;
    /// Per-step budget in milliseconds (two steps per 60 Hz frame)
    pub const STEP_BUDGET_MS: f32 = 8.0;
}
