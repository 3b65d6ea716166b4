//! Headless wave scene - runs the fluid without a renderer and reports stats
//!
//! Run with: cargo run --release --bin wave_headless [scene.toml] [frames]

use anyhow::{Context, Result};
use std::time::Instant;
use voxel_wave::fluid::PerformanceStatus;
use voxel_wave::{WaveScene, WaveSceneConfig};

const DEFAULT_FRAMES: u64 = 120;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => WaveSceneConfig::load(&path).with_context(|| format!("loading scene {}", path))?,
        None => WaveSceneConfig::default(),
    };
    let frames = match args.next() {
        Some(raw) => raw
            .parse::<u64>()
            .with_context(|| format!("frame count must be a non-negative integer, got {:?}", raw))?,
        None => DEFAULT_FRAMES,
    };

    let mut scene = WaveScene::new(config).context("building wave scene")?;
    let started = Instant::now();

    for frame in 0..frames {
        scene.update();

        let stats = scene.solver().last_step_stats();
        log::info!(
            "frame {:>4}: step {:.2} ms (densities {:.2}, forces {:.2}, migrate {:.2}), {} outside",
            frame,
            stats.total().as_secs_f64() * 1000.0,
            stats.densities.as_secs_f64() * 1000.0,
            stats.forces.as_secs_f64() * 1000.0,
            stats.migrate.as_secs_f64() * 1000.0,
            stats.out_of_domain
        );
    }

    let elapsed = started.elapsed();
    let solver = scene.solver();
    let (min_density, max_density) = solver
        .particles()
        .iter()
        .map(|p| p.density())
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), d| (lo.min(d), hi.max(d)));
    let voxels = scene.voxels();
    let mean_scale = if voxels.is_empty() {
        0.0
    } else {
        voxels.iter().map(|v| v.scale).sum::<f32>() / voxels.len() as f32
    };
    let grid = solver.grid_stats();
    let metrics = scene.performance().get_metrics();

    println!("=== WAVE HEADLESS ===");
    println!("Frames: {} ({} steps) in {:.2}s", frames, solver.steps_run(), elapsed.as_secs_f32());
    println!("Particles: {}", solver.particle_count());
    println!("Density range: {:.4} .. {:.4}", min_density, max_density);
    println!("Mean voxel scale: {:.4}", mean_scale);
    println!(
        "Grid: {}/{} cells occupied, max {} per cell, mean {:.2}",
        grid.occupied_cells, grid.total_cells, grid.max_particles_per_cell, grid.avg_particles_per_occupied_cell
    );
    println!(
        "Step time: avg {:.2} ms, max {:.2} ms, hooks {:.2} ms",
        metrics.step_time_ms, metrics.max_step_time_ms, metrics.hook_time_ms
    );

    match scene.performance().check_performance() {
        PerformanceStatus::Good => println!("Performance: within budget"),
        PerformanceStatus::Acceptable => println!("Performance: acceptable"),
        PerformanceStatus::Poor => println!("Performance: over budget"),
    }

    Ok(())
}
