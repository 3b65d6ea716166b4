use crate::constants::solver::PARTICLE_MASS;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::ops::Index;

/// Stable particle identity, assigned once at initialization and never reused.
/// Ordering on ids decides which particle of a pair owns the interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParticleId(pub u32);

impl ParticleId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for ParticleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single fluid particle
///
/// Position, velocity and force are open to hooks. Identity and mass are fixed
/// once the solver owns the particle, and the remaining fields are per-step
/// accumulators the solver recomputes.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub(crate) id: ParticleId,
    pub(crate) mass: f32,
    pub position: Vec3,
    pub velocity: Vec3,
    /// Total force for the current step
    pub force: Vec3,
    pub(crate) density: f32,
    pub(crate) pressure_force: Vec3,
    pub(crate) viscosity_force: Vec3,
    pub(crate) color_gradient: Vec3,
    pub(crate) color_laplacian: f32,
}

impl Particle {
    /// Create a particle of unit mass at rest
    pub fn new(position: Vec3) -> Self {
        Self::with_mass(position, PARTICLE_MASS)
    }

    pub fn with_mass(position: Vec3, mass: f32) -> Self {
        Self {
            id: ParticleId(0),
            mass,
            position,
            velocity: Vec3::ZERO,
            force: Vec3::ZERO,
            density: 0.0,
            pressure_force: Vec3::ZERO,
            viscosity_force: Vec3::ZERO,
            color_gradient: Vec3::ZERO,
            color_laplacian: 0.0,
        }
    }

    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn id(&self) -> ParticleId {
        self.id
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn density(&self) -> f32 {
        self.density
    }

    pub fn pressure_force(&self) -> Vec3 {
        self.pressure_force
    }

    pub fn viscosity_force(&self) -> Vec3 {
        self.viscosity_force
    }

    pub fn color_gradient(&self) -> Vec3 {
        self.color_gradient
    }

    pub fn color_laplacian(&self) -> f32 {
        self.color_laplacian
    }

    /// Zero density, force and every diagnostic accumulator
    pub(crate) fn reset_accumulators(&mut self) {
        self.density = 0.0;
        self.force = Vec3::ZERO;
        self.pressure_force = Vec3::ZERO;
        self.viscosity_force = Vec3::ZERO;
        self.color_gradient = Vec3::ZERO;
        self.color_laplacian = 0.0;
    }
}

/// Owns every particle; the id of a particle is its index
#[derive(Debug, Default, Clone)]
pub struct ParticleStore {
    particles: Vec<Particle>,
}

impl ParticleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a batch and assign ids in batch order
    pub(crate) fn from_batch(batch: Vec<Particle>) -> Self {
        let mut particles = batch;
        for (index, particle) in particles.iter_mut().enumerate() {
            particle.id = ParticleId(index as u32);
        }
        Self { particles }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn get(&self, id: ParticleId) -> Option<&Particle> {
        self.particles.get(id.index())
    }

    pub fn as_slice(&self) -> &[Particle] {
        &self.particles
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Particle> {
        self.particles.iter()
    }

    pub(crate) fn get_mut(&mut self, id: ParticleId) -> &mut Particle {
        &mut self.particles[id.index()]
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    /// Mutable access to two distinct particles
    pub(crate) fn pair_mut(&mut self, a: ParticleId, b: ParticleId) -> (&mut Particle, &mut Particle) {
        let (ia, ib) = (a.index(), b.index());
        debug_assert_ne!(ia, ib, "pair_mut needs two distinct particles");
        if ia < ib {
            let (left, right) = self.particles.split_at_mut(ib);
            (&mut left[ia], &mut right[0])
        } else {
            let (left, right) = self.particles.split_at_mut(ia);
            (&mut right[0], &mut left[ib])
        }
    }
}

impl Index<ParticleId> for ParticleStore {
    type Output = Particle;

    /// Ids are only handed out by the store, so every id indexes it
    fn index(&self, id: ParticleId) -> &Particle {
        &self.particles[id.index()]
    }
}
