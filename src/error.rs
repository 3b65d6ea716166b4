//! Crate-wide error type
//!
//! Every failure the solver can report is a configuration or lifecycle defect
//! surfaced at construction. Stepping never fails.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WaveError {
    #[error("Invalid domain extent on {axis} axis: {value}")]
    InvalidDomain { axis: char, value: f32 },

    #[error("Invalid core radius: {value}")]
    InvalidCoreRadius { value: f32 },

    #[error("Invalid timestep: {value}")]
    InvalidTimestep { value: f32 },

    #[error("Invalid material parameter {field}: {value}")]
    InvalidMaterial { field: &'static str, value: f32 },

    #[error("Invalid mass {value} for particle {index}")]
    InvalidParticleMass { index: usize, value: f32 },

    #[error("Grid too large: {cells} cells")]
    GridTooLarge { cells: u64 },

    #[error("Particles already initialized ({count} particles)")]
    AlreadyInitialized { count: usize },

    #[error("Invalid scene parameter {field}: {reason}")]
    InvalidScene { field: &'static str, reason: String },

    #[error("Failed to read config {}: {source}", .path.display())]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {origin}: {source}")]
    ConfigParse {
        origin: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),
}

pub type WaveResult<T> = Result<T, WaveError>;
