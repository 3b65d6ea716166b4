//! Fluid subsystem error handling
//!
//! Type aliases and helper functions for solver construction and config loading,
//! so call sites can use `?` instead of building `WaveError` variants inline.

use crate::error::{WaveError, WaveResult};
use std::path::Path;

/// Type alias for fluid operation results
pub type FluidResult<T> = WaveResult<T>;

/// Helper trait for attaching a config path to I/O failures
pub trait FluidErrorContext<T> {
    fn config_context(self, path: &Path) -> FluidResult<T>;
}

impl<T> FluidErrorContext<T> for Result<T, std::io::Error> {
    fn config_context(self, path: &Path) -> FluidResult<T> {
        self.map_err(|source| WaveError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Create a config parse error
pub fn config_parse_error(origin: impl std::fmt::Display, source: toml::de::Error) -> WaveError {
    WaveError::ConfigParse {
        origin: origin.to_string(),
        source,
    }
}

/// Reject non-finite or non-positive domain extents
pub fn ensure_extent(axis: char, value: f32) -> FluidResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(WaveError::InvalidDomain { axis, value })
    }
}

/// Reject non-finite or negative material constants
pub fn ensure_material(field: &'static str, value: f32) -> FluidResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(WaveError::InvalidMaterial { field, value })
    }
}

/// Reject a non-finite or non-positive particle mass
pub fn ensure_mass(index: usize, value: f32) -> FluidResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(WaveError::InvalidParticleMass { index, value })
    }
}
