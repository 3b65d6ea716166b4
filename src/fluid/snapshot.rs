use super::particle::Particle;
use crate::constants::render::{BASE_COLOR, COLOR_DIVISOR, DENSITY_FACTOR, SCALE_NUMERATOR};
use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// One renderable voxel per particle, laid out for direct GPU upload
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct VoxelInstance {
    pub position: [f32; 3],
    pub scale: f32,
    pub color: [f32; 4],
}

impl VoxelInstance {
    pub fn from_particle(particle: &Particle, origin: Vec3) -> Self {
        Self {
            position: (origin + particle.position).to_array(),
            scale: visual_scale(particle.density),
            color: surface_color(particle.color_gradient),
        }
    }
}

/// Voxel scale shrinks as density grows
pub fn visual_scale(density: f32) -> f32 {
    if density.is_finite() && density > 0.0 {
        SCALE_NUMERATOR / (density * DENSITY_FACTOR)
    } else {
        0.0
    }
}

/// Surface particles (large color-field gradient) render brighter
pub fn surface_color(color_gradient: Vec3) -> [f32; 4] {
    let intensity = color_gradient.length() / COLOR_DIVISOR;
    BASE_COLOR.map(|channel| channel * intensity)
}
