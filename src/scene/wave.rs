use super::hooks::{Boundary, BoxBoundary, CylinderBoundary, GravityHook, OscillatingWall};
use super::lattice::lattice_positions;
use crate::constants::scene::{GRAVITY, LATTICE_SPACING, PARTICLE_COUNT, RESTITUTION, STEPS_PER_FRAME};
use crate::error::{WaveError, WaveResult};
use crate::fluid::config::read_toml;
use crate::fluid::error::{config_parse_error, FluidErrorContext};
use crate::fluid::performance::{record_step, FluidPerformanceMonitor};
use crate::fluid::{Particle, SolverConfig, SphSolver, VoxelInstance};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Container the scene keeps the fluid in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryKind {
    /// Static box matching the domain
    Box,
    /// Box whose x wall sweeps in and out
    #[default]
    OscillatingBox,
    Cylinder,
}

/// Wave scene parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveSceneConfig {
    /// World offset added to every voxel
    pub origin: Vec3,
    pub particle_count: usize,
    pub lattice_spacing: f32,
    pub gravity: f32,
    pub gravity_direction: Vec3,
    pub boundary: BoundaryKind,
    pub restitution: f32,
    pub steps_per_frame: u32,
    pub solver: SolverConfig,
}

impl Default for WaveSceneConfig {
    fn default() -> Self {
        Self {
            origin: Vec3::ZERO,
            particle_count: PARTICLE_COUNT,
            lattice_spacing: LATTICE_SPACING,
            gravity: GRAVITY,
            gravity_direction: Vec3::NEG_Y,
            boundary: BoundaryKind::default(),
            restitution: RESTITUTION,
            steps_per_frame: STEPS_PER_FRAME,
            solver: SolverConfig::default(),
        }
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> WaveError {
    WaveError::InvalidScene {
        field,
        reason: reason.into(),
    }
}

impl WaveSceneConfig {
    pub fn validate(&self) -> WaveResult<()> {
        self.solver.validate()?;

        if !self.origin.is_finite() {
            return Err(invalid("origin", format!("{} is not finite", self.origin)));
        }
        if self.particle_count == 0 {
            return Err(invalid("particle_count", "must be at least 1"));
        }
        if !(self.lattice_spacing.is_finite() && self.lattice_spacing > 0.0) {
            return Err(invalid(
                "lattice_spacing",
                format!("{} is not a positive length", self.lattice_spacing),
            ));
        }
        if !self.gravity.is_finite() {
            return Err(invalid("gravity", format!("{} is not finite", self.gravity)));
        }
        if !self.gravity_direction.is_finite() || self.gravity_direction.length_squared() == 0.0 {
            return Err(invalid(
                "gravity_direction",
                format!("{} has no direction", self.gravity_direction),
            ));
        }
        if !(self.restitution.is_finite() && self.restitution >= 0.0) {
            return Err(invalid(
                "restitution",
                format!("{} is not a non-negative factor", self.restitution),
            ));
        }
        if self.steps_per_frame == 0 {
            return Err(invalid("steps_per_frame", "must be at least 1"));
        }

        Ok(())
    }

    pub fn from_toml_str(source: &str) -> WaveResult<Self> {
        let config: Self = toml::from_str(source).map_err(|e| config_parse_error("<inline>", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> WaveResult<Self> {
        let config: Self = read_toml(path.as_ref())?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> WaveResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> WaveResult<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_toml_string()?).config_context(path)
    }

    fn build_boundary(&self) -> Boundary {
        let extents = self.solver.domain;
        match self.boundary {
            BoundaryKind::Box => Boundary::Box(BoxBoundary::new(extents, self.restitution)),
            BoundaryKind::OscillatingBox => Boundary::Box(
                BoxBoundary::new(extents, self.restitution).with_wall(OscillatingWall::default()),
            ),
            BoundaryKind::Cylinder => Boundary::Cylinder(CylinderBoundary::new(extents, self.restitution)),
        }
    }
}

/// A block of water dropped into a container
///
/// Owns the solver and its hooks. Every [`update`](Self::update) advances the
/// fluid by `steps_per_frame` steps and rebuilds the voxel list.
pub struct WaveScene {
    solver: SphSolver,
    gravity: GravityHook,
    boundary: Boundary,
    origin: Vec3,
    steps_per_frame: u32,
    voxels: Vec<VoxelInstance>,
    monitor: FluidPerformanceMonitor,
    frames: u64,
}

impl WaveScene {
    pub fn new(config: WaveSceneConfig) -> WaveResult<Self> {
        config.validate()?;

        let seeds = lattice_positions(config.particle_count, config.solver.domain, config.lattice_spacing);
        let solver = SphSolver::with_particles(config.solver.clone(), seeds.into_iter().map(Particle::new))?;

        log::info!(
            "[WaveScene] {} particles, {:?} boundary, {} steps per frame, origin {}",
            config.particle_count,
            config.boundary,
            config.steps_per_frame,
            config.origin
        );

        Ok(Self {
            gravity: GravityHook::new(config.gravity, config.gravity_direction),
            boundary: config.build_boundary(),
            origin: config.origin,
            steps_per_frame: config.steps_per_frame,
            voxels: Vec::with_capacity(config.particle_count),
            monitor: FluidPerformanceMonitor::new(),
            frames: 0,
            solver,
        })
    }

    /// Advance one frame and rebuild the voxel list
    pub fn update(&mut self) {
        for _ in 0..self.steps_per_frame {
            self.solver.step_with(&mut self.gravity, &mut self.boundary);
            record_step(&mut self.monitor, self.solver.last_step_stats());
        }
        self.solver.snapshot_into(self.origin, &mut self.voxels);
        self.frames += 1;
    }

    /// Voxels from the last update; empty before the first one
    pub fn voxels(&self) -> &[VoxelInstance] {
        &self.voxels
    }

    pub fn solver(&self) -> &SphSolver {
        &self.solver
    }

    pub fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    pub fn performance(&self) -> &FluidPerformanceMonitor {
        &self.monitor
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}
