use crate::fluid::DomainExtents;
use glam::Vec3;

/// Lattice points per axis for an extent; at least one
fn axis_steps(extent: f32, spacing: f32) -> usize {
    let steps = (extent / spacing).floor();
    if steps.is_finite() && steps >= 1.0 {
        steps as usize
    } else {
        1
    }
}

/// `count` seed positions on a regular lattice inside `extents`
///
/// Fills x fastest, then z, then y, so the fluid settles as horizontal layers
/// stacked from the floor. When the lattice holds fewer than `count` points it
/// wraps around and repeats from the first layer.
pub fn lattice_positions(count: usize, extents: DomainExtents, spacing: f32) -> Vec<Vec3> {
    let width = axis_steps(extents.width, spacing);
    let height = axis_steps(extents.height, spacing);
    let depth = axis_steps(extents.depth, spacing);
    let layer = width.saturating_mul(depth);

    (0..count)
        .map(|n| {
            let i = n % width;
            let k = (n / width) % depth;
            let j = (n / layer) % height;
            Vec3::new(i as f32, j as f32, k as f32) * spacing
        })
        .collect()
}
