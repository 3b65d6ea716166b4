//! Density and force accumulation over the 27-cell neighborhood
//!
//! Each unordered pair is evaluated once and written to both particles. The
//! density pass keeps pairs with `a.id <= b.id`, so a particle meets itself and
//! its own weight lands on both sides of that pair; the force pass keeps
//! `a.id < b.id` only, so there is no self force.
//!
//! Parallel passes split cells across rayon workers. A pair may touch particles
//! owned by other workers' cells, so each worker writes into its own buffer and
//! the buffers are summed after the pass.

use super::config::ExecutionMode;
use super::grid::SpatialGrid;
use super::kernels::SmoothingKernels;
use super::material::FluidMaterial;
use super::particle::{Particle, ParticleId, ParticleStore};
use crate::constants::solver::{PARALLEL_MIN_CELLS, SELF_PAIR_WEIGHT};
use glam::Vec3;
use rayon::prelude::*;
use std::ops::AddAssign;

/// Force-pass contribution to one particle
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct ForceContribution {
    pub force: Vec3,
    pub pressure_force: Vec3,
    pub viscosity_force: Vec3,
    pub color_gradient: Vec3,
    pub color_laplacian: f32,
}

impl AddAssign for ForceContribution {
    fn add_assign(&mut self, rhs: Self) {
        self.force += rhs.force;
        self.pressure_force += rhs.pressure_force;
        self.viscosity_force += rhs.viscosity_force;
        self.color_gradient += rhs.color_gradient;
        self.color_laplacian += rhs.color_laplacian;
    }
}

impl ForceContribution {
    fn apply_to(&self, particle: &mut Particle) {
        particle.force += self.force;
        particle.pressure_force += self.pressure_force;
        particle.viscosity_force += self.viscosity_force;
        particle.color_gradient += self.color_gradient;
        particle.color_laplacian += self.color_laplacian;
    }
}

/// Density added to `a` and `b` by their pair, or `None` beyond the cutoff
#[inline]
pub(crate) fn pair_density(a: &Particle, b: &Particle, kernels: &SmoothingKernels) -> Option<(f32, f32)> {
    let r = a.position - b.position;
    if r.length_squared() > kernels.radius_squared() {
        return None;
    }
    let w = kernels.poly6(r);
    Some((b.mass * w, a.mass * w))
}

/// Density a particle receives from its own self pair
#[inline]
pub(crate) fn self_density(particle: &Particle, kernels: &SmoothingKernels) -> f32 {
    SELF_PAIR_WEIGHT * particle.mass * kernels.poly6(Vec3::ZERO)
}

/// Pressure, viscosity and color-field contributions of a pair to `a` and `b`
#[inline]
pub(crate) fn pair_forces(
    a: &Particle,
    b: &Particle,
    kernels: &SmoothingKernels,
    material: &FluidMaterial,
) -> Option<(ForceContribution, ForceContribution)> {
    let r = a.position - b.position;
    if r.length_squared() > kernels.radius_squared() {
        return None;
    }

    let weight_a = b.mass / b.density; // applied to a
    let weight_b = a.mass / a.density; // applied to b

    let pressure = 0.5
        * material.gas_constant
        * ((a.density - material.rest_density) + (b.density - material.rest_density))
        * kernels.pressure_gradient(r);
    let viscosity = material.viscosity * (b.velocity - a.velocity) * kernels.viscosity_laplacian(r);
    let gradient = kernels.poly6_gradient(r);
    let laplacian = kernels.poly6_laplacian(r);

    let to_a = ForceContribution {
        force: -weight_a * pressure + weight_a * viscosity,
        pressure_force: -weight_a * pressure,
        viscosity_force: weight_a * viscosity,
        color_gradient: weight_a * gradient,
        color_laplacian: weight_a * laplacian,
    };
    let to_b = ForceContribution {
        force: weight_b * pressure - weight_b * viscosity,
        pressure_force: weight_b * pressure,
        viscosity_force: -weight_b * viscosity,
        color_gradient: -weight_b * gradient,
        color_laplacian: weight_b * laplacian,
    };

    Some((to_a, to_b))
}

/// Zero every particle's density and accumulators
pub fn reset_accumulators(particles: &mut ParticleStore, mode: ExecutionMode) {
    match mode {
        ExecutionMode::Serial => particles.as_mut_slice().iter_mut().for_each(Particle::reset_accumulators),
        ExecutionMode::Parallel => particles
            .as_mut_slice()
            .par_iter_mut()
            .for_each(Particle::reset_accumulators),
    }
}

/// Visit every `(a, b)` candidate pair whose cells are neighbors, with `a` drawn
/// from the cell at `index`
#[inline]
fn for_each_candidate(grid: &SpatialGrid, index: usize, mut visit: impl FnMut(ParticleId, ParticleId)) {
    let members = grid.cell_at(index);
    if members.is_empty() {
        return;
    }
    let coord = grid.coord_of(index);
    for &a in members {
        for neighbor in grid.neighbor_cells(coord) {
            for &b in grid.cell_at(neighbor) {
                visit(a, b);
            }
        }
    }
}

pub fn accumulate_densities(
    grid: &SpatialGrid,
    particles: &mut ParticleStore,
    kernels: &SmoothingKernels,
    mode: ExecutionMode,
) {
    match mode {
        ExecutionMode::Serial => densities_serial(grid, particles, kernels),
        ExecutionMode::Parallel => densities_parallel(grid, particles, kernels),
    }
}

fn densities_serial(grid: &SpatialGrid, particles: &mut ParticleStore, kernels: &SmoothingKernels) {
    for index in 0..grid.cell_count() {
        for_each_candidate(grid, index, |a, b| {
            if a > b {
                return;
            }
            if a == b {
                let p = particles.get_mut(a);
                p.density += self_density(p, kernels);
                return;
            }
            let (pa, pb) = particles.pair_mut(a, b);
            if let Some((to_a, to_b)) = pair_density(pa, pb, kernels) {
                pa.density += to_a;
                pb.density += to_b;
            }
        });
    }
}

fn densities_parallel(grid: &SpatialGrid, particles: &mut ParticleStore, kernels: &SmoothingKernels) {
    let count = particles.len();
    let cells = grid.occupied_cells();
    let snapshot = particles.as_slice();

    let totals = cells
        .par_iter()
        .with_min_len(PARALLEL_MIN_CELLS)
        .fold(
            || vec![0.0f32; count],
            |mut acc, &index| {
                for_each_candidate(grid, index, |a, b| {
                    if a > b {
                        return;
                    }
                    let pa = &snapshot[a.index()];
                    if a == b {
                        acc[a.index()] += self_density(pa, kernels);
                        return;
                    }
                    if let Some((to_a, to_b)) = pair_density(pa, &snapshot[b.index()], kernels) {
                        acc[a.index()] += to_a;
                        acc[b.index()] += to_b;
                    }
                });
                acc
            },
        )
        .reduce(
            || vec![0.0f32; count],
            |mut left, right| {
                left.iter_mut().zip(right).for_each(|(l, r)| *l += r);
                left
            },
        );

    particles
        .as_mut_slice()
        .par_iter_mut()
        .zip(totals.into_par_iter())
        .for_each(|(particle, density)| particle.density += density);
}

/// Must run after every density is final
pub fn accumulate_forces(
    grid: &SpatialGrid,
    particles: &mut ParticleStore,
    kernels: &SmoothingKernels,
    material: &FluidMaterial,
    mode: ExecutionMode,
) {
    match mode {
        ExecutionMode::Serial => forces_serial(grid, particles, kernels, material),
        ExecutionMode::Parallel => forces_parallel(grid, particles, kernels, material),
    }
}

fn forces_serial(
    grid: &SpatialGrid,
    particles: &mut ParticleStore,
    kernels: &SmoothingKernels,
    material: &FluidMaterial,
) {
    for index in 0..grid.cell_count() {
        for_each_candidate(grid, index, |a, b| {
            if a >= b {
                return;
            }
            let (pa, pb) = particles.pair_mut(a, b);
            if let Some((to_a, to_b)) = pair_forces(pa, pb, kernels, material) {
                to_a.apply_to(pa);
                to_b.apply_to(pb);
            }
        });
    }
}

fn forces_parallel(
    grid: &SpatialGrid,
    particles: &mut ParticleStore,
    kernels: &SmoothingKernels,
    material: &FluidMaterial,
) {
    let count = particles.len();
    let cells = grid.occupied_cells();
    let snapshot = particles.as_slice();

    let totals = cells
        .par_iter()
        .with_min_len(PARALLEL_MIN_CELLS)
        .fold(
            || vec![ForceContribution::default(); count],
            |mut acc, &index| {
                for_each_candidate(grid, index, |a, b| {
                    if a >= b {
                        return;
                    }
                    let pair = pair_forces(&snapshot[a.index()], &snapshot[b.index()], kernels, material);
                    if let Some((to_a, to_b)) = pair {
                        acc[a.index()] += to_a;
                        acc[b.index()] += to_b;
                    }
                });
                acc
            },
        )
        .reduce(
            || vec![ForceContribution::default(); count],
            |mut left, right| {
                left.iter_mut().zip(right).for_each(|(l, r)| *l += r);
                left
            },
        );

    particles
        .as_mut_slice()
        .par_iter_mut()
        .zip(totals.into_par_iter())
        .for_each(|(particle, total)| total.apply_to(particle));
}
