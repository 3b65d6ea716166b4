//! SPH smoothing kernels
//!
//! Poly6 for density and the color field, spiky for pressure, and the
//! viscosity Laplacian. Every kernel is exactly zero for `|r| >= h`.
//!
//! The free functions take an arbitrary radius. The passes use
//! [`SmoothingKernels`], which holds the coefficients for one fixed radius.

use crate::constants::solver::PRESSURE_GRADIENT_EPSILON;
use glam::Vec3;
use std::f32::consts::PI;

/// Kernel coefficients precomputed for a single smoothing radius
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothingKernels {
    h: f32,
    h2: f32,
    poly6_coeff: f32,      // 315 / (64 pi h^9)
    poly6_grad_coeff: f32, // -945 / (32 pi h^9)
    poly6_lap_coeff: f32,  // 945 / (32 pi h^9)
    spiky_coeff: f32,      // -45 / (pi h^6)
    visc_coeff: f32,       // 45 / (pi h^6)
}

impl SmoothingKernels {
    pub fn new(h: f32) -> Self {
        let h3 = h * h * h;
        let h6 = h3 * h3;
        let h9 = h6 * h3;

        Self {
            h,
            h2: h * h,
            poly6_coeff: 315.0 / (64.0 * PI * h9),
            poly6_grad_coeff: -945.0 / (32.0 * PI * h9),
            poly6_lap_coeff: 945.0 / (32.0 * PI * h9),
            spiky_coeff: -45.0 / (PI * h6),
            visc_coeff: 45.0 / (PI * h6),
        }
    }

    pub fn radius(&self) -> f32 {
        self.h
    }

    pub fn radius_squared(&self) -> f32 {
        self.h2
    }

    /// Density weight
    #[inline]
    pub fn poly6(&self, r: Vec3) -> f32 {
        let r2 = r.length_squared();
        if r2 >= self.h2 {
            return 0.0;
        }
        let diff = self.h2 - r2;
        self.poly6_coeff * diff * diff * diff
    }

    /// Color-field gradient
    #[inline]
    pub fn poly6_gradient(&self, r: Vec3) -> Vec3 {
        let r2 = r.length_squared();
        if r2 >= self.h2 {
            return Vec3::ZERO;
        }
        let diff = self.h2 - r2;
        self.poly6_grad_coeff * diff * diff * r
    }

    /// Color-field Laplacian
    #[inline]
    pub fn poly6_laplacian(&self, r: Vec3) -> f32 {
        let r2 = r.length_squared();
        if r2 >= self.h2 {
            return 0.0;
        }
        self.poly6_lap_coeff * (self.h2 - r2) * (7.0 * r2 - 3.0 * self.h2)
    }

    /// Pressure gradient. Near-coincident particles get the zero vector.
    #[inline]
    pub fn spiky_gradient(&self, r: Vec3) -> Vec3 {
        let r2 = r.length_squared();
        if r2 >= self.h2 || r2 < PRESSURE_GRADIENT_EPSILON * PRESSURE_GRADIENT_EPSILON {
            return Vec3::ZERO;
        }
        let len = r2.sqrt();
        let diff = self.h - len;
        self.spiky_coeff * diff * diff * (r / len)
    }

    #[inline]
    pub fn pressure_gradient(&self, r: Vec3) -> Vec3 {
        self.spiky_gradient(r)
    }

    /// Viscosity Laplacian, non-negative inside the support
    #[inline]
    pub fn viscosity_laplacian(&self, r: Vec3) -> f32 {
        let r2 = r.length_squared();
        if r2 >= self.h2 {
            return 0.0;
        }
        self.visc_coeff * (self.h - r2.sqrt())
    }
}

pub fn poly6(r: Vec3, h: f32) -> f32 {
    SmoothingKernels::new(h).poly6(r)
}

pub fn poly6_gradient(r: Vec3, h: f32) -> Vec3 {
    SmoothingKernels::new(h).poly6_gradient(r)
}

pub fn poly6_laplacian(r: Vec3, h: f32) -> f32 {
    SmoothingKernels::new(h).poly6_laplacian(r)
}

pub fn spiky_gradient(r: Vec3, h: f32) -> Vec3 {
    SmoothingKernels::new(h).spiky_gradient(r)
}

pub fn pressure_gradient(r: Vec3, h: f32) -> Vec3 {
    SmoothingKernels::new(h).pressure_gradient(r)
}

pub fn viscosity_laplacian(r: Vec3, h: f32) -> f32 {
    SmoothingKernels::new(h).viscosity_laplacian(r)
}
