//! Unified physics constants for the particle simulation.
//!
//! All simulation modules use these constants instead of defining their own.
//! This prevents drift between subsystems and makes tuning easier.

use glam::Vec2;

/// Solving passes per `update` call.
///
/// Each sub-step rebuilds the grid, resolves contacts and integrates, so a
/// higher count trades throughput for stiffer-looking piles.
pub const SUB_STEPS: u32 = 8;

/// Downward gravity in world units/s², screen coordinates (+y is down).
pub const GRAVITY: Vec2 = Vec2::new(0.0, 20.0);

/// Velocity damping applied inside the Verlet step, approximating air
/// friction. Strong enough to visibly damp; a physically-motivated value
/// is still open.
pub const VELOCITY_DAMPING: f32 = 40.0;

/// Particle radius in world units. One grid cell is exactly one diameter.
pub const PARTICLE_RADIUS: f32 = 0.5;

/// Hard clamp band at the world edges, in world units.
pub const MARGIN: f32 = 2.0;

/// Squared distance below which a pair is treated as coincident and left
/// alone. Guards the contact normal against a zero-length division.
pub const MIN_CONTACT_DIST_SQ: f32 = 1e-4;

/// Fraction of the measured overlap resolved per contact.
pub const RESPONSE_COEF: f32 = 1.0;
