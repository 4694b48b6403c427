//! Verlet particles and the append-only particle store.
//!
//! A particle stores its position at the current and previous sub-step;
//! velocity is the difference between the two. Position-based contact
//! resolution only ever moves `position`, and the next integration step
//! picks the velocity change up for free.

use glam::Vec2;

use crate::physics::VELOCITY_DAMPING;

/// A single particle. Radius is global, see [`crate::physics::PARTICLE_RADIUS`].
#[derive(Clone, Copy, Debug)]
pub struct Particle {
    /// Position at the current sub-step, world coordinates.
    pub position: Vec2,
    /// Position at the previous sub-step. `position - last_position` is the
    /// per-sub-step velocity.
    pub last_position: Vec2,
    /// Accumulated acceleration, cleared by every integration step.
    pub acceleration: Vec2,
    /// RGB color for the renderer.
    pub color: [u8; 3],
}

impl Particle {
    /// Create a particle at rest.
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            last_position: position,
            acceleration: Vec2::ZERO,
            color: [255, 255, 255],
        }
    }

    /// One Verlet step of duration `dt`.
    ///
    /// Extrapolates along the implicit velocity, applies the accumulated
    /// acceleration minus a damping term, then clears the accumulator.
    pub fn integrate(&mut self, dt: f32) {
        let velocity = self.position - self.last_position;
        let new_position =
            self.position + velocity + (self.acceleration - velocity * VELOCITY_DAMPING) * (dt * dt);
        self.last_position = self.position;
        self.position = new_position;
        self.acceleration = Vec2::ZERO;
    }

    /// Per-sub-step velocity.
    #[inline]
    pub fn velocity(&self) -> Vec2 {
        self.position - self.last_position
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.velocity().length()
    }

    /// Overwrite the velocity by rewriting the previous position.
    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.last_position = self.position - velocity;
    }

    pub fn add_velocity(&mut self, velocity: Vec2) {
        self.last_position -= velocity;
    }

    /// Zero the velocity in place.
    pub fn stop(&mut self) {
        self.last_position = self.position;
    }

    /// Scale the velocity by `1 - ratio`.
    pub fn slowdown(&mut self, ratio: f32) {
        self.last_position += ratio * (self.position - self.last_position);
    }

    /// Teleport with zero velocity.
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
        self.last_position = position;
    }

    /// Teleport, keeping the current velocity vector.
    pub fn set_position_same_speed(&mut self, new_position: Vec2) {
        let to_last = self.last_position - self.position;
        self.position = new_position;
        self.last_position = new_position + to_last;
    }
}

/// Append-only particle collection.
///
/// Indices are handed out at insertion and stay valid for the lifetime of
/// the store: particles are never erased or reordered, so the collision
/// grid can reference them by bare `u32`.
pub struct Particles {
    pub list: Vec<Particle>,
}

impl Particles {
    pub fn new() -> Self {
        Self { list: Vec::new() }
    }

    /// Append a particle and return its permanent index.
    pub fn push(&mut self, particle: Particle) -> u32 {
        let index = self.list.len() as u32;
        self.list.push(particle);
        index
    }

    /// Append a particle at rest at `position`.
    pub fn emplace(&mut self, position: Vec2) -> u32 {
        self.push(Particle::new(position))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.list.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Particle> {
        self.list.iter_mut()
    }
}

impl Default for Particles {
    fn default() -> Self {
        Self::new()
    }
}
