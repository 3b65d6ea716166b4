//! Uniform cell grid with double-buffered membership lists
//!
//! Cells are cubes of side `core_radius`. Each buffer is a pre-allocated arena of
//! per-cell particle lists; migration reads the active buffer, writes the staging
//! buffer, then swaps the two by index so every particle moves exactly once.

use super::config::DomainExtents;
use super::error::FluidResult;
use super::particle::{Particle, ParticleId, ParticleStore};
use crate::constants::solver::MAX_GRID_CELLS;
use crate::error::WaveError;
use glam::Vec3;

/// Integer cell coordinate, possibly outside the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellCoord {
    pub i: i32,
    pub j: i32,
    pub k: i32,
}

impl CellCoord {
    pub fn new(i: i32, j: i32, k: i32) -> Self {
        Self { i, j, k }
    }

    /// `floor(position / core_radius)` per axis
    pub fn from_position(position: Vec3, core_radius: f32) -> Self {
        let scaled = (position / core_radius).floor();
        Self::new(scaled.x as i32, scaled.y as i32, scaled.z as i32)
    }

    /// The 27 coordinates centered on this cell, itself included
    pub fn neighborhood(self) -> impl Iterator<Item = CellCoord> {
        (-1..=1).flat_map(move |dz| {
            (-1..=1).flat_map(move |dy| {
                (-1..=1).map(move |dx| CellCoord::new(self.i + dx, self.j + dy, self.k + dz))
            })
        })
    }
}

/// Cell counts per axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridDimensions {
    pub width: usize,
    pub height: usize,
    pub depth: usize,
}

impl GridDimensions {
    /// `floor(extent / core_radius) + 1` cells per axis
    ///
    /// Fails with `GridTooLarge` when the product exceeds `MAX_GRID_CELLS` or
    /// any axis ratio is not finite.
    pub fn from_domain(domain: &DomainExtents, core_radius: f32) -> FluidResult<Self> {
        let axis = |extent: f32| -> FluidResult<u64> {
            let ratio = (f64::from(extent) / f64::from(core_radius)).floor();
            if !ratio.is_finite() || ratio >= MAX_GRID_CELLS as f64 {
                return Err(WaveError::GridTooLarge {
                    cells: if ratio.is_finite() { ratio as u64 } else { u64::MAX },
                });
            }
            (ratio as u64)
                .checked_add(1)
                .ok_or(WaveError::GridTooLarge { cells: u64::MAX })
        };
        let (w, h, d) = (axis(domain.width)?, axis(domain.height)?, axis(domain.depth)?);

        let cells = w
            .checked_mul(h)
            .and_then(|wh| wh.checked_mul(d))
            .ok_or(WaveError::GridTooLarge { cells: u64::MAX })?;
        if cells > MAX_GRID_CELLS {
            return Err(WaveError::GridTooLarge { cells });
        }

        Ok(Self {
            width: w as usize,
            height: h as usize,
            depth: d as usize,
        })
    }

    pub fn cell_count(&self) -> usize {
        self.width * self.height * self.depth
    }

    pub fn contains(&self, coord: CellCoord) -> bool {
        coord.i >= 0
            && coord.j >= 0
            && coord.k >= 0
            && (coord.i as usize) < self.width
            && (coord.j as usize) < self.height
            && (coord.k as usize) < self.depth
    }

    /// Pull an out-of-range coordinate onto the nearest boundary cell
    pub fn clamp(&self, coord: CellCoord) -> CellCoord {
        CellCoord::new(
            coord.i.clamp(0, self.width as i32 - 1),
            coord.j.clamp(0, self.height as i32 - 1),
            coord.k.clamp(0, self.depth as i32 - 1),
        )
    }
}

/// One membership buffer: a particle list per cell
type CellBuffer = Vec<Vec<ParticleId>>;

/// Result of one migration pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub migrated: usize,
    /// Particles whose position fell outside the grid and were clamped
    /// onto a boundary cell
    pub out_of_domain: usize,
}

/// Occupancy summary
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GridStats {
    pub total_cells: usize,
    pub occupied_cells: usize,
    pub total_particles: usize,
    pub max_particles_per_cell: usize,
    pub avg_particles_per_occupied_cell: f32,
}

/// Index of the cell a position is bucketed into, and whether it had to be
/// clamped onto a boundary cell to get there
#[inline]
fn bucket_of(dims: GridDimensions, core_radius: f32, position: Vec3) -> (usize, bool) {
    let coord = CellCoord::from_position(position, core_radius);
    let inside = dims.contains(coord);
    let coord = if inside { coord } else { dims.clamp(coord) };
    let index = dims.width * (coord.k as usize * dims.height + coord.j as usize) + coord.i as usize;
    (index, !inside)
}

#[derive(Debug, Clone)]
pub struct SpatialGrid {
    dims: GridDimensions,
    core_radius: f32,
    buffers: [CellBuffer; 2],
    active: usize,
}

impl SpatialGrid {
    pub fn new(dims: GridDimensions, core_radius: f32) -> Self {
        let cells = dims.cell_count();
        Self {
            dims,
            core_radius,
            buffers: [vec![Vec::new(); cells], vec![Vec::new(); cells]],
            active: 0,
        }
    }

    pub fn for_domain(domain: &DomainExtents, core_radius: f32) -> FluidResult<Self> {
        Ok(Self::new(GridDimensions::from_domain(domain, core_radius)?, core_radius))
    }

    pub fn dimensions(&self) -> GridDimensions {
        self.dims
    }

    pub fn core_radius(&self) -> f32 {
        self.core_radius
    }

    pub fn cell_count(&self) -> usize {
        self.dims.cell_count()
    }

    /// Linear index of an in-range cell. Range checks belong to the caller.
    #[inline]
    pub fn cell_index(&self, i: usize, j: usize, k: usize) -> usize {
        debug_assert!(i < self.dims.width && j < self.dims.height && k < self.dims.depth);
        self.dims.width * (k * self.dims.height + j) + i
    }

    /// Inverse of [`cell_index`](Self::cell_index)
    #[inline]
    pub fn coord_of(&self, index: usize) -> CellCoord {
        let i = index % self.dims.width;
        let rest = index / self.dims.width;
        let j = rest % self.dims.height;
        let k = rest / self.dims.height;
        CellCoord::new(i as i32, j as i32, k as i32)
    }

    /// Unclamped cell of a position
    pub fn cell_of(&self, position: Vec3) -> CellCoord {
        CellCoord::from_position(position, self.core_radius)
    }

    /// Append a particle to the active cell matching its position.
    /// Returns false when the position was outside the grid and got clamped.
    pub fn insert(&mut self, particle: &Particle) -> bool {
        let (index, clamped) = bucket_of(self.dims, self.core_radius, particle.position);
        self.buffers[self.active][index].push(particle.id());
        !clamped
    }

    /// Members of an active cell, in insertion order
    pub fn cell(&self, coord: CellCoord) -> Option<&[ParticleId]> {
        if !self.dims.contains(coord) {
            return None;
        }
        let index = self.cell_index(coord.i as usize, coord.j as usize, coord.k as usize);
        Some(&self.buffers[self.active][index])
    }

    #[inline]
    pub fn cell_at(&self, index: usize) -> &[ParticleId] {
        &self.buffers[self.active][index]
    }

    /// Linear indices of the in-range cells among the 27 around `coord`
    pub fn neighbor_cells(&self, coord: CellCoord) -> impl Iterator<Item = usize> + '_ {
        coord
            .neighborhood()
            .filter(move |c| self.dims.contains(*c))
            .map(move |c| self.cell_index(c.i as usize, c.j as usize, c.k as usize))
    }

    /// Visit every particle in the 27 cells centered on `coord`, skipping
    /// coordinates outside the grid
    pub fn for_each_neighbor(&self, coord: CellCoord, mut visit: impl FnMut(ParticleId)) {
        for index in self.neighbor_cells(coord) {
            for &id in self.cell_at(index) {
                visit(id);
            }
        }
    }

    /// Every particle in grid order: k, then j, then i, then insertion order
    pub fn particle_order(&self) -> impl Iterator<Item = ParticleId> + '_ {
        self.buffers[self.active].iter().flatten().copied()
    }

    /// Linear indices of non-empty active cells
    pub fn occupied_cells(&self) -> Vec<usize> {
        self.buffers[self.active]
            .iter()
            .enumerate()
            .filter(|(_, members)| !members.is_empty())
            .map(|(index, _)| index)
            .collect()
    }

    /// Total membership across the active buffer
    pub fn len(&self) -> usize {
        self.buffers[self.active].iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers[self.active].iter().all(Vec::is_empty)
    }

    /// Re-bucket every particle by its current position into the staging
    /// buffer, clear the old cells and swap roles
    pub fn migrate(&mut self, particles: &ParticleStore) -> MigrationReport {
        let mut report = MigrationReport::default();
        let (dims, core_radius) = (self.dims, self.core_radius);
        let staging = 1 - self.active;

        // Staging was emptied on the previous swap
        let (first, second) = self.buffers.split_at_mut(1);
        let (source, target) = if self.active == 0 {
            (&mut first[0], &mut second[0])
        } else {
            (&mut second[0], &mut first[0])
        };

        for cell in source.iter_mut() {
            for id in cell.drain(..) {
                let (index, clamped) = bucket_of(dims, core_radius, particles[id].position);
                target[index].push(id);
                report.migrated += 1;
                if clamped {
                    report.out_of_domain += 1;
                }
            }
        }
        self.active = staging;

        report
    }

    pub fn clear(&mut self) {
        for buffer in self.buffers.iter_mut() {
            for cell in buffer.iter_mut() {
                cell.clear();
            }
        }
    }

    pub fn stats(&self) -> GridStats {
        let mut stats = GridStats {
            total_cells: self.cell_count(),
            ..GridStats::default()
        };

        for members in self.buffers[self.active].iter().filter(|m| !m.is_empty()) {
            stats.occupied_cells += 1;
            stats.total_particles += members.len();
            stats.max_particles_per_cell = stats.max_particles_per_cell.max(members.len());
        }

        if stats.occupied_cells > 0 {
            stats.avg_particles_per_occupied_cell =
                stats.total_particles as f32 / stats.occupied_cells as f32;
        }

        stats
    }
}
