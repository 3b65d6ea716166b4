use super::config::ExecutionMode;
use super::material::FluidMaterial;
use super::particle::{Particle, ParticleStore};
use crate::constants::solver::SURFACE_NORMAL_THRESHOLD;
use glam::Vec3;
use rayon::prelude::*;

/// Surface tension from the color field, zero where the normal is ill-defined
#[inline]
pub fn surface_tension_force(particle: &Particle, material: &FluidMaterial) -> Vec3 {
    let gradient = particle.color_gradient;
    if gradient.length() > SURFACE_NORMAL_THRESHOLD {
        -material.surface_tension * particle.color_laplacian * gradient.normalize()
    } else {
        Vec3::ZERO
    }
}

/// Semi-implicit Euler: velocity first, then position from the new velocity
#[inline]
pub fn integrate_particle(particle: &mut Particle, material: &FluidMaterial, dt: f32) {
    particle.force += surface_tension_force(particle, material);

    let acceleration =
        particle.force / particle.density - material.damping * particle.velocity / particle.mass;
    particle.velocity += dt * acceleration;
    particle.position += dt * particle.velocity;
}

pub fn integrate(particles: &mut ParticleStore, material: &FluidMaterial, dt: f32, mode: ExecutionMode) {
    match mode {
        ExecutionMode::Serial => particles
            .as_mut_slice()
            .iter_mut()
            .for_each(|p| integrate_particle(p, material, dt)),
        ExecutionMode::Parallel => particles
            .as_mut_slice()
            .par_iter_mut()
            .for_each(|p| integrate_particle(p, material, dt)),
    }
}
