//! Solver-level properties checked through the public API

use glam::Vec3;
use voxel_wave::fluid::kernels::{
    poly6, poly6_gradient, poly6_laplacian, pressure_gradient, spiky_gradient, viscosity_laplacian,
};
use voxel_wave::fluid::{
    CellCoord, DomainExtents, ExecutionMode, FluidMaterial, HookContext, NoHook, Particle, ParticleId,
    SmoothingKernels, SolverConfig, SphSolver, StepPhase,
};
use voxel_wave::WaveError;

const H: f32 = 1.5;

fn config() -> SolverConfig {
    SolverConfig {
        domain: DomainExtents::new(9.0, 9.0, 9.0),
        core_radius: H,
        ..SolverConfig::default()
    }
}

/// Density a particle of `mass` gets from itself: its self pair lands on both sides
fn self_density(mass: f32) -> f32 {
    2.0 * mass * SmoothingKernels::new(H).poly6(Vec3::ZERO)
}

/// Offsets of the 26 neighboring cells
fn neighbor_offsets() -> Vec<(i32, i32, i32)> {
    let mut offsets = Vec::with_capacity(26);
    for dz in -1..=1 {
        for dy in -1..=1 {
            for dx in -1..=1 {
                if (dx, dy, dz) != (0, 0, 0) {
                    offsets.push((dx, dy, dz));
                }
            }
        }
    }
    offsets
}

fn neighbor_directions() -> Vec<Vec3> {
    neighbor_offsets()
        .into_iter()
        .map(|(dx, dy, dz)| Vec3::new(dx as f32, dy as f32, dz as f32).normalize())
        .collect()
}

fn block(nx: usize, ny: usize, nz: usize, spacing: f32, start: Vec3) -> Vec<Particle> {
    let mut particles = Vec::with_capacity(nx * ny * nz);
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                let offset = Vec3::new(i as f32, j as f32, k as f32) * spacing;
                let jitter = Vec3::new((j % 2) as f32, (k % 3) as f32, (i % 2) as f32) * 0.05;
                particles.push(Particle::new(start + offset + jitter));
            }
        }
    }
    particles
}

#[test]
fn test_kernels_vanish_outside_support() {
    for h in [0.5, 1.0, 1.5, 4.0] {
        for scale in [1.0001, 1.5, 10.0] {
            for direction in neighbor_directions() {
                let r = direction * h * scale;
                assert_eq!(poly6(r, h), 0.0);
                assert_eq!(poly6_gradient(r, h), Vec3::ZERO);
                assert_eq!(poly6_laplacian(r, h), 0.0);
                assert_eq!(spiky_gradient(r, h), Vec3::ZERO);
                assert_eq!(pressure_gradient(r, h), Vec3::ZERO);
                assert_eq!(viscosity_laplacian(r, h), 0.0);
            }
        }
    }
}

#[test]
fn test_pair_density_counts_each_side_once() {
    let a = Vec3::new(4.0, 4.0, 4.0);
    let b = Vec3::new(4.5, 4.4, 3.7);
    let mut solver = SphSolver::with_particles(
        config(),
        [Particle::with_mass(a, 1.0), Particle::with_mass(b, 2.0)],
    )
    .unwrap();

    solver.step();

    let w = poly6(a - b, H);
    assert!(w > 0.0);
    let pa = solver.particle(ParticleId(0)).unwrap();
    let pb = solver.particle(ParticleId(1)).unwrap();
    assert!((pa.density() - (2.0 * w + self_density(1.0))).abs() < 1e-6);
    assert!((pb.density() - (1.0 * w + self_density(2.0))).abs() < 1e-6);
}

#[test]
fn test_isolated_pair_exchanges_zero_net_force() {
    let mut solver = SphSolver::with_particles(
        config(),
        [
            Particle::new(Vec3::new(4.0, 4.0, 4.0)).with_velocity(Vec3::new(1.0, -2.0, 0.5)),
            Particle::new(Vec3::new(4.6, 4.3, 4.2)).with_velocity(Vec3::new(-0.5, 0.0, 3.0)),
        ],
    )
    .unwrap();

    solver.step();

    let particles = solver.particles().as_slice();
    let total: Vec3 = particles
        .iter()
        .map(|p| p.pressure_force() + p.viscosity_force())
        .sum();
    assert!(particles[0].pressure_force().length() > 1e-3);
    assert!(particles[0].viscosity_force().length() > 1e-3);
    assert!(total.length() < 1e-4, "net force {:?}", total);
}

fn assert_neighbor_found(center: Vec3, direction: Vec3, expected_cell: CellCoord) {
    let near_position = center + direction * 0.9 * H;
    let mut near =
        SphSolver::with_particles(config(), [Particle::new(center), Particle::new(near_position)]).unwrap();
    assert_eq!(near.grid().cell_of(near_position), expected_cell);
    near.step();
    let density = near.particle(ParticleId(0)).unwrap().density();
    assert!(density > self_density(1.0), "missed neighbor along {:?} from {:?}", direction, center);

    let mut far = SphSolver::with_particles(
        config(),
        [Particle::new(center), Particle::new(center + direction * 1.01 * H)],
    )
    .unwrap();
    far.step();
    let density = far.particle(ParticleId(0)).unwrap().density();
    assert_eq!(density, self_density(1.0), "phantom neighbor along {:?} from {:?}", direction, center);
}

#[test]
fn test_neighbors_found_in_all_adjacent_cells() {
    // Middle of cell (2, 2, 2); 0.9h in any direction lands in the adjacent cell
    let center = Vec3::splat(2.5 * H);
    let home = CellCoord::new(2, 2, 2);
    let solver = SphSolver::new(config()).unwrap();
    assert_eq!(solver.grid().cell_of(center), home);

    for (dx, dy, dz) in neighbor_offsets() {
        let direction = Vec3::new(dx as f32, dy as f32, dz as f32).normalize();
        assert_neighbor_found(center, direction, CellCoord::new(2 + dx, 2 + dy, 2 + dz));
    }
}

#[test]
fn test_neighbors_found_from_cell_corner() {
    // Lower corner of cell (2, 2, 2): every negative step crosses into the
    // lower adjacent cell, positive steps stay home
    let center = Vec3::splat(2.0 * H);
    let solver = SphSolver::new(config()).unwrap();
    assert_eq!(solver.grid().cell_of(center), CellCoord::new(2, 2, 2));

    for (dx, dy, dz) in neighbor_offsets() {
        let direction = Vec3::new(dx as f32, dy as f32, dz as f32).normalize();
        let expected = CellCoord::new(2 + dx.min(0), 2 + dy.min(0), 2 + dz.min(0));
        assert_neighbor_found(center, direction, expected);
    }
}

#[test]
fn test_migration_rebuckets_every_particle_once() {
    let particles: Vec<Particle> = block(5, 5, 5, 1.0, Vec3::splat(2.0))
        .into_iter()
        .enumerate()
        .map(|(i, p)| {
            let v = Vec3::new((i % 7) as f32 - 3.0, (i % 5) as f32 - 2.0, (i % 3) as f32 - 1.0) * 20.0;
            p.with_velocity(v)
        })
        .collect();
    let count = particles.len();
    let mut solver = SphSolver::with_particles(config(), particles).unwrap();

    solver.step();

    let grid = solver.grid();
    assert_eq!(grid.len(), count);
    assert_eq!(solver.last_step_stats().out_of_domain, 0);

    let mut seen = vec![0usize; count];
    for particle in solver.particles().iter() {
        let coord = CellCoord::from_position(particle.position, H);
        let members = grid.cell(coord).expect("particle stayed inside the domain");
        assert!(members.contains(&particle.id()));
    }
    for id in grid.particle_order() {
        seen[id.index()] += 1;
    }
    assert!(seen.iter().all(|&n| n == 1));
}

#[test]
fn test_identical_runs_match() {
    let seed = block(4, 4, 4, 0.9, Vec3::splat(2.0));
    let mut first = SphSolver::with_particles(config(), seed.clone()).unwrap();
    let mut second = SphSolver::with_particles(config(), seed).unwrap();

    let mut gravity = |ctx: &mut HookContext<'_>| {
        ctx.for_each_particle(|p| p.force += Vec3::new(0.0, -15.0, 0.0) * p.density());
    };
    let mut gravity_again = |ctx: &mut HookContext<'_>| {
        ctx.for_each_particle(|p| p.force += Vec3::new(0.0, -15.0, 0.0) * p.density());
    };

    for _ in 0..5 {
        first.step_with(&mut gravity, &mut NoHook);
        second.step_with(&mut gravity_again, &mut NoHook);
    }

    for (a, b) in first.particles().iter().zip(second.particles().iter()) {
        assert_eq!(a.position, b.position);
        assert_eq!(a.velocity, b.velocity);
    }
}

#[test]
fn test_lattice_density_sums_neighbor_weights() {
    let material = FluidMaterial::default();
    let kernels = SmoothingKernels::new(H);

    // At 1.1 the six face neighbors are inside h, the edge diagonals
    // (1.1 * sqrt 2 > h) are not
    let spacing = 1.1;
    let mut solver = SphSolver::with_particles(config(), block_exact(3, spacing, Vec3::splat(H))).unwrap();
    solver.step_with(&mut NoHook, &mut NoHook);

    let interior = solver.particle(ParticleId(13)).unwrap();
    assert!((interior.position - Vec3::splat(H + spacing)).length() < 1e-3);
    let expected = self_density(1.0) + 6.0 * kernels.poly6(Vec3::X * spacing);
    assert!(
        (interior.density() - expected).abs() / expected < 1e-5,
        "interior density {} expected {}",
        interior.density(),
        expected
    );

    // Within 1% of the default material's rest density
    let rest = material.rest_density;
    assert!(
        (interior.density() - rest).abs() / rest < 0.01,
        "interior density {} against rest {}",
        interior.density(),
        rest
    );

    // Pulled equally by opposite neighbors
    assert!(interior.pressure_force().length() < 1e-3);
    assert!(interior.color_gradient().length() < 1e-4);

    // Face-center particles miss one neighbor and sit below the interior
    let face = solver.particle(ParticleId(4)).unwrap();
    let face_expected = self_density(1.0) + 5.0 * kernels.poly6(Vec3::X * spacing);
    assert!((face.density() - face_expected).abs() / face_expected < 1e-5);
    assert!(face.density() < interior.density());
}

#[test]
fn test_lattice_at_core_radius_sees_only_itself() {
    // Neighbors exactly h apart sit on the kernel cutoff and add nothing
    let mut solver = SphSolver::with_particles(config(), block_exact(3, H, Vec3::splat(H))).unwrap();
    solver.step();

    for particle in solver.particles().iter() {
        assert_eq!(particle.density(), self_density(1.0));
        assert!(particle.force.length() < 1e-4);
    }
}

fn block_exact(n: usize, spacing: f32, start: Vec3) -> Vec<Particle> {
    let mut particles = Vec::with_capacity(n * n * n);
    for k in 0..n {
        for j in 0..n {
            for i in 0..n {
                particles.push(Particle::new(start + Vec3::new(i as f32, j as f32, k as f32) * spacing));
            }
        }
    }
    particles
}

#[test]
fn test_construction_rejects_unusable_parameters() {
    let bad_domain = SolverConfig {
        domain: DomainExtents::new(10.0, -1.0, 10.0),
        ..config()
    };
    assert!(matches!(
        SphSolver::new(bad_domain),
        Err(WaveError::InvalidDomain { axis: 'y', .. })
    ));

    let bad_radius = SolverConfig {
        core_radius: 0.0,
        ..config()
    };
    assert!(matches!(SphSolver::new(bad_radius), Err(WaveError::InvalidCoreRadius { .. })));

    let bad_timestep = SolverConfig {
        timestep: f32::NAN,
        ..config()
    };
    assert!(matches!(SphSolver::new(bad_timestep), Err(WaveError::InvalidTimestep { .. })));

    let too_fine = SolverConfig {
        domain: DomainExtents::new(1000.0, 1000.0, 1000.0),
        core_radius: 0.01,
        ..config()
    };
    assert!(matches!(SphSolver::new(too_fine), Err(WaveError::GridTooLarge { .. })));

    // Finite, positive, and far too many cells for any integer cast
    let huge_extent = SolverConfig {
        domain: DomainExtents::new(f32::MAX, 9.0, 9.0),
        ..config()
    };
    assert!(matches!(SphSolver::new(huge_extent), Err(WaveError::GridTooLarge { .. })));

    let tiny_radius = SolverConfig {
        core_radius: 1.0e-38,
        ..config()
    };
    assert!(matches!(SphSolver::new(tiny_radius), Err(WaveError::GridTooLarge { .. })));
}

#[test]
fn test_parallel_steps_track_serial() {
    let seed = block(6, 5, 5, 0.8, Vec3::splat(2.0));
    let mut serial = SphSolver::with_particles(config(), seed.clone()).unwrap();
    let mut parallel =
        SphSolver::with_particles(config().with_execution(ExecutionMode::Parallel), seed).unwrap();

    for _ in 0..3 {
        serial.step();
        parallel.step();
    }

    for (s, p) in serial.particles().iter().zip(parallel.particles().iter()) {
        assert!((s.density() - p.density()).abs() <= 1e-4 * s.density());
        assert!((s.position - p.position).length() <= 1e-3);
    }
}

#[test]
fn test_escaped_particle_is_tolerated() {
    let mut solver = SphSolver::with_particles(
        config(),
        [
            Particle::new(Vec3::new(4.0, 4.0, 4.0)),
            Particle::new(Vec3::new(8.9, 4.0, 4.0)).with_velocity(Vec3::new(500.0, 0.0, 0.0)),
        ],
    )
    .unwrap();

    solver.step();
    assert_eq!(solver.last_step_stats().out_of_domain, 1);
    assert_eq!(solver.grid().len(), 2);

    // Clamped onto the last column of cells; the next step still runs
    let domain = solver.config().domain;
    let escaped = solver.particle(ParticleId(1)).unwrap().position;
    assert!(escaped.x > domain.as_vec3().x);
    assert!(!domain.contains(escaped));
    assert!(domain.contains(solver.particle(ParticleId(0)).unwrap().position));
    let dims = solver.grid().dimensions();
    let edge = CellCoord::new(dims.width as i32 - 1, 2, 2);
    assert!(solver.grid().cell(edge).unwrap().contains(&ParticleId(1)));

    solver.step();
    assert_eq!(solver.steps_run(), 2);
    assert_eq!(solver.phase(), StepPhase::Idle);
}
