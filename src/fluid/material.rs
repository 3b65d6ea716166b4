use super::error::{ensure_material, FluidResult};
use crate::constants::material;
use crate::error::WaveError;
use serde::{Deserialize, Serialize};

/// Fluid material constants, fixed for the lifetime of a solver
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FluidMaterial {
    /// Pressure stiffness
    pub gas_constant: f32,
    /// Dynamic viscosity
    pub viscosity: f32,
    pub rest_density: f32,
    /// Surface tension coefficient
    pub surface_tension: f32,
    /// Velocity damping
    pub damping: f32,
}

impl FluidMaterial {
    pub fn new(
        gas_constant: f32,
        viscosity: f32,
        rest_density: f32,
        surface_tension: f32,
        damping: f32,
    ) -> Self {
        Self {
            gas_constant,
            viscosity,
            rest_density,
            surface_tension,
            damping,
        }
    }

    pub fn validate(&self) -> FluidResult<()> {
        ensure_material("gas_constant", self.gas_constant)?;
        ensure_material("viscosity", self.viscosity)?;
        ensure_material("surface_tension", self.surface_tension)?;
        ensure_material("damping", self.damping)?;

        if !(self.rest_density.is_finite() && self.rest_density > 0.0) {
            return Err(WaveError::InvalidMaterial {
                field: "rest_density",
                value: self.rest_density,
            });
        }

        Ok(())
    }
}

impl Default for FluidMaterial {
    fn default() -> Self {
        Self {
            gas_constant: material::GAS_CONSTANT,
            viscosity: material::VISCOSITY,
            rest_density: material::REST_DENSITY,
            surface_tension: material::SURFACE_TENSION,
            damping: material::DAMPING,
        }
    }
}
