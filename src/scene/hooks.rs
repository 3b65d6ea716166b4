use crate::constants::scene::{GRAVITY, RESTITUTION, WALL_AMPLITUDE, WALL_CURVATURE, WALL_PHASE_STEP};
use crate::fluid::{DomainExtents, HookContext, Particle, StepHook};
use glam::Vec3;

/// Uniform body force scaled by density (inter hook)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GravityHook {
    pub strength: f32,
    direction: Vec3,
}

impl GravityHook {
    pub fn new(strength: f32, direction: Vec3) -> Self {
        Self {
            strength,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    #[inline]
    pub fn apply(&self, particle: &mut Particle) {
        particle.force += self.strength * self.direction * particle.density();
    }
}

impl Default for GravityHook {
    fn default() -> Self {
        Self::new(GRAVITY, Vec3::NEG_Y)
    }
}

impl StepHook for GravityHook {
    fn run(&mut self, ctx: &mut HookContext<'_>) {
        let gravity = *self;
        ctx.for_each_particle(|p| gravity.apply(p));
    }
}

/// Moving x wall: `width + sin(phase) * amplitude - y^2 / curvature`
///
/// The phase (degrees) advances once per particle checked, so the wall sweeps
/// at a rate proportional to the particle count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OscillatingWall {
    pub phase: f32,
    pub amplitude: f32,
    pub phase_step: f32,
    pub curvature: f32,
}

impl OscillatingWall {
    /// Wall position for a particle at height `y`, then advance the phase
    pub fn next_limit(&mut self, width: f32, y: f32) -> f32 {
        let limit = width + self.phase.to_radians().sin() * self.amplitude - y * y / self.curvature;
        self.phase += self.phase_step;
        if self.phase >= 360.0 {
            self.phase = 0.0;
        }
        limit
    }
}

impl Default for OscillatingWall {
    fn default() -> Self {
        Self {
            phase: 0.0,
            amplitude: WALL_AMPLITUDE,
            phase_step: WALL_PHASE_STEP,
            curvature: WALL_CURVATURE,
        }
    }
}

/// Clamp `value` into `[0, limit]`, reflecting `velocity` if it was outside
#[inline]
fn reflect_axis(value: &mut f32, velocity: &mut f32, limit: f32, restitution: f32) {
    if *value < 0.0 || *value > limit {
        *value = value.max(0.0).min(limit);
        *velocity *= -restitution;
    }
}

/// Axis-aligned container `[0, extent]` (post hook)
#[derive(Debug, Clone, PartialEq)]
pub struct BoxBoundary {
    pub extents: DomainExtents,
    pub restitution: f32,
    pub wall: Option<OscillatingWall>,
}

impl BoxBoundary {
    pub fn new(extents: DomainExtents, restitution: f32) -> Self {
        Self {
            extents,
            restitution,
            wall: None,
        }
    }

    pub fn with_wall(mut self, wall: OscillatingWall) -> Self {
        self.wall = Some(wall);
        self
    }

    pub fn apply(&mut self, particle: &mut Particle) {
        let limit_x = match self.wall.as_mut() {
            Some(wall) => wall.next_limit(self.extents.width, particle.position.y),
            None => self.extents.width,
        };

        let (position, velocity) = (&mut particle.position, &mut particle.velocity);
        reflect_axis(&mut position.x, &mut velocity.x, limit_x, self.restitution);
        reflect_axis(&mut position.y, &mut velocity.y, self.extents.height, self.restitution);
        reflect_axis(&mut position.z, &mut velocity.z, self.extents.depth, self.restitution);
    }
}

impl Default for BoxBoundary {
    fn default() -> Self {
        Self::new(DomainExtents::default(), RESTITUTION)
    }
}

impl StepHook for BoxBoundary {
    fn run(&mut self, ctx: &mut HookContext<'_>) {
        ctx.for_each_particle(|p| self.apply(p));
    }
}

/// Vertical cylinder centered on the domain's x/z midpoint (post hook)
///
/// Radius is half the domain width. The side wall reflects velocity about the
/// radial normal; floor and ceiling reflect with restitution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CylinderBoundary {
    pub extents: DomainExtents,
    pub restitution: f32,
}

impl CylinderBoundary {
    pub fn new(extents: DomainExtents, restitution: f32) -> Self {
        Self { extents, restitution }
    }

    pub fn radius(&self) -> f32 {
        self.extents.width / 2.0
    }

    pub fn center(&self) -> Vec3 {
        Vec3::new(self.extents.width, 0.0, self.extents.depth) / 2.0
    }

    pub fn apply(&self, particle: &mut Particle) {
        let center = self.center();
        let radius = self.radius();
        let offset = Vec3::new(particle.position.x, 0.0, particle.position.z) - center;

        if offset.length() >= radius {
            let normal = offset.normalize_or_zero();
            let wall = center + radius * normal;
            particle.position.x = wall.x;
            particle.position.z = wall.z;
            particle.velocity -= 2.0 * particle.velocity.dot(normal) * normal;
        }

        let ceiling = self.extents.height - 1.0;
        if particle.position.y >= ceiling {
            particle.position.y = ceiling;
            particle.velocity.y *= -self.restitution;
        } else if particle.position.y < 0.0 {
            particle.position.y = 0.0;
            particle.velocity.y *= -self.restitution;
        }
    }
}

impl StepHook for CylinderBoundary {
    fn run(&mut self, ctx: &mut HookContext<'_>) {
        let boundary = *self;
        ctx.for_each_particle(|p| boundary.apply(p));
    }
}

/// Several hooks run in sequence as one
#[derive(Default)]
pub struct HookChain {
    hooks: Vec<Box<dyn StepHook>>,
}

impl HookChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, hook: impl StepHook + 'static) {
        self.hooks.push(Box::new(hook));
    }

    pub fn with(mut self, hook: impl StepHook + 'static) -> Self {
        self.push(hook);
        self
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl StepHook for HookChain {
    fn run(&mut self, ctx: &mut HookContext<'_>) {
        for hook in self.hooks.iter_mut() {
            hook.run(ctx);
        }
    }
}

impl std::fmt::Debug for HookChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookChain").field("hooks", &self.hooks.len()).finish()
    }
}

/// The boundary a scene runs as its post hook
#[derive(Debug, Clone, PartialEq)]
pub enum Boundary {
    Box(BoxBoundary),
    Cylinder(CylinderBoundary),
}

impl StepHook for Boundary {
    fn run(&mut self, ctx: &mut HookContext<'_>) {
        match self {
            Boundary::Box(boundary) => boundary.run(ctx),
            Boundary::Cylinder(boundary) => boundary.run(ctx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extents() -> DomainExtents {
        DomainExtents::new(60.0, 45.0, 20.0)
    }

    #[test]
    fn test_gravity_scales_with_density() {
        let hook = GravityHook::new(15.0, Vec3::new(0.0, -3.0, 0.0));
        assert_eq!(hook.direction(), Vec3::NEG_Y);

        let mut particle = Particle::new(Vec3::ZERO);
        hook.apply(&mut particle);
        // Zero density, zero force
        assert_eq!(particle.force, Vec3::ZERO);
    }

    #[test]
    fn test_box_clamps_and_reflects() {
        let mut boundary = BoxBoundary::new(extents(), 1.1);
        let mut particle = Particle::new(Vec3::new(-0.5, 50.0, 10.0)).with_velocity(Vec3::new(-1.0, 2.0, 3.0));

        boundary.apply(&mut particle);

        assert_eq!(particle.position, Vec3::new(0.0, 45.0, 10.0));
        assert!((particle.velocity.x - 1.1).abs() < 1e-6);
        assert!((particle.velocity.y + 2.2).abs() < 1e-6);
        assert_eq!(particle.velocity.z, 3.0);
    }

    #[test]
    fn test_box_leaves_interior_alone() {
        let mut boundary = BoxBoundary::new(extents(), 1.1);
        let mut particle = Particle::new(Vec3::new(30.0, 20.0, 10.0)).with_velocity(Vec3::ONE);
        boundary.apply(&mut particle);
        assert_eq!(particle.position, Vec3::new(30.0, 20.0, 10.0));
        assert_eq!(particle.velocity, Vec3::ONE);
    }

    #[test]
    fn test_wall_curves_with_height_and_advances() {
        let mut wall = OscillatingWall::default();
        assert_eq!(wall.next_limit(60.0, 0.0), 60.0);
        assert!(wall.next_limit(60.0, 40.0) < 41.0);
        assert!((wall.phase - 2.0 * WALL_PHASE_STEP).abs() < 1e-9);

        let mut wall = OscillatingWall {
            phase: 90.0,
            ..OscillatingWall::default()
        };
        assert!((wall.next_limit(60.0, 0.0) - 90.0).abs() < 1e-3);

        let mut wall = OscillatingWall {
            phase: 359.8,
            phase_step: 0.5,
            ..OscillatingWall::default()
        };
        wall.next_limit(60.0, 0.0);
        assert_eq!(wall.phase, 0.0);
    }

    #[test]
    fn test_cylinder_projects_onto_wall() {
        let boundary = CylinderBoundary::new(extents(), 1.1);
        // Center (30, 0, 10), radius 30
        let mut particle = Particle::new(Vec3::new(65.0, 10.0, 10.0)).with_velocity(Vec3::new(2.0, 0.0, 1.0));

        boundary.apply(&mut particle);

        assert!((particle.position.x - 60.0).abs() < 1e-4);
        assert!((particle.position.z - 10.0).abs() < 1e-4);
        assert_eq!(particle.velocity, Vec3::new(-2.0, 0.0, 1.0));
    }

    #[test]
    fn test_cylinder_floor_and_ceiling() {
        let boundary = CylinderBoundary::new(extents(), 1.0);
        let mut high = Particle::new(Vec3::new(30.0, 44.5, 10.0)).with_velocity(Vec3::Y);
        let mut low = Particle::new(Vec3::new(30.0, -1.0, 10.0)).with_velocity(Vec3::NEG_Y);

        boundary.apply(&mut high);
        boundary.apply(&mut low);

        assert_eq!(high.position.y, 44.0);
        assert_eq!(high.velocity.y, -1.0);
        assert_eq!(low.position.y, 0.0);
        assert_eq!(low.velocity.y, 1.0);
    }
}
