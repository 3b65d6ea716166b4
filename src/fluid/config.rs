use super::error::{config_parse_error, ensure_extent, FluidErrorContext, FluidResult};
use super::material::FluidMaterial;
use crate::constants::solver;
use crate::error::WaveError;
use glam::Vec3;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Physical size of the simulation domain
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DomainExtents {
    pub width: f32,
    pub height: f32,
    pub depth: f32,
}

impl DomainExtents {
    pub fn new(width: f32, height: f32, depth: f32) -> Self {
        Self { width, height, depth }
    }

    pub fn as_vec3(&self) -> Vec3 {
        Vec3::new(self.width, self.height, self.depth)
    }

    pub fn validate(&self) -> FluidResult<()> {
        ensure_extent('x', self.width)?;
        ensure_extent('y', self.height)?;
        ensure_extent('z', self.depth)
    }

    /// Whether a position lies inside `[0, extent]` on every axis
    pub fn contains(&self, position: Vec3) -> bool {
        position.cmpge(Vec3::ZERO).all() && position.cmple(self.as_vec3()).all()
    }
}

impl Default for DomainExtents {
    fn default() -> Self {
        Self {
            width: solver::DOMAIN_WIDTH,
            height: solver::DOMAIN_HEIGHT,
            depth: solver::DOMAIN_DEPTH,
        }
    }
}

/// How the density and force passes are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Single-threaded, grid order
    #[default]
    Serial,
    /// Cells split across rayon workers, each accumulating into its own
    /// buffer; buffers are summed once the pass completes
    Parallel,
}

/// Solver construction parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub domain: DomainExtents,
    /// Interaction radius and grid cell size
    pub core_radius: f32,
    pub timestep: f32,
    pub material: FluidMaterial,
    pub execution: ExecutionMode,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            domain: DomainExtents::default(),
            core_radius: solver::CORE_RADIUS,
            timestep: solver::TIMESTEP,
            material: FluidMaterial::default(),
            execution: ExecutionMode::Serial,
        }
    }
}

impl SolverConfig {
    pub fn new(domain: DomainExtents, core_radius: f32, timestep: f32, material: FluidMaterial) -> Self {
        Self {
            domain,
            core_radius,
            timestep,
            material,
            execution: ExecutionMode::Serial,
        }
    }

    pub fn with_execution(mut self, execution: ExecutionMode) -> Self {
        self.execution = execution;
        self
    }

    /// Check everything construction depends on
    pub fn validate(&self) -> FluidResult<()> {
        self.domain.validate()?;

        if !(self.core_radius.is_finite() && self.core_radius > 0.0) {
            return Err(WaveError::InvalidCoreRadius {
                value: self.core_radius,
            });
        }

        if !(self.timestep.is_finite() && self.timestep > 0.0) {
            return Err(WaveError::InvalidTimestep {
                value: self.timestep,
            });
        }

        self.material.validate()
    }

    pub fn from_toml_str(source: &str) -> FluidResult<Self> {
        let config: Self = toml::from_str(source).map_err(|e| config_parse_error("<inline>", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> FluidResult<Self> {
        let config: Self = read_toml(path.as_ref())?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> FluidResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> FluidResult<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_toml_string()?).config_context(path)
    }
}

/// Read and deserialize a TOML file
pub(crate) fn read_toml<T: DeserializeOwned>(path: &Path) -> FluidResult<T> {
    let raw = std::fs::read_to_string(path).config_context(path)?;
    toml::from_str(&raw).map_err(|e| config_parse_error(path.display(), e))
}
