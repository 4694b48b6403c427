//! Stream spawning policy and particle coloring.
//!
//! The solver does not decide which particles exist; drivers do. This is
//! the stock driver policy: a vertical burst of rows emitted from a fixed
//! origin each frame, pushed sideways, colored by spawn index.

use glam::Vec2;
use rand::Rng;
use std::f32::consts::TAU;

use crate::solver::Solver;

/// Squared-sine RGB ramp. `t` is unbounded; the channels wrap naturally.
pub fn rainbow(t: f32) -> [u8; 3] {
    let r = t.sin();
    let g = (t + 0.33 * TAU).sin();
    let b = (t + 0.66 * TAU).sin();
    [
        (255.0 * r * r) as u8,
        (255.0 * g * g) as u8,
        (255.0 * b * b) as u8,
    ]
}

/// Emits a vertical stack of particles each frame until a population cap.
pub struct StreamEmitter {
    pub origin: Vec2,
    /// Initial velocity, in per-sub-step displacement units.
    pub velocity: Vec2,
    /// Particles per burst.
    pub rows: u32,
    /// Vertical spacing between rows.
    pub spacing: f32,
    /// Stop emitting once the solver holds this many particles.
    pub max_particles: usize,
    /// Rainbow phase advance per particle index.
    pub color_rate: f32,
}

impl StreamEmitter {
    pub fn new(origin: Vec2, velocity: Vec2) -> Self {
        Self {
            origin,
            velocity,
            rows: 20,
            spacing: 1.1,
            max_particles: 80_000,
            color_rate: 1e-4,
        }
    }

    /// Spawn one burst. Returns how many particles were created.
    pub fn emit(&self, solver: &mut Solver) -> u32 {
        if solver.particles.len() >= self.max_particles {
            return 0;
        }
        for i in 0..self.rows {
            let position = self.origin + Vec2::new(0.0, self.spacing * i as f32);
            let id = solver.create_particle(position);
            let particle = solver.particle_mut(id);
            particle.add_velocity(self.velocity);
            particle.color = rainbow(id as f32 * self.color_rate);
        }
        self.rows
    }

    /// Spawn one burst with position and velocity jitter, for visually
    /// denser streams.
    pub fn emit_jittered<R: Rng>(&self, solver: &mut Solver, rng: &mut R) -> u32 {
        if solver.particles.len() >= self.max_particles {
            return 0;
        }
        for i in 0..self.rows {
            let offset = Vec2::new(rng.gen::<f32>() - 0.5, rng.gen::<f32>() - 0.5) * 0.4;
            let position = self.origin + Vec2::new(0.0, self.spacing * i as f32) + offset;
            let kick = Vec2::new(rng.gen::<f32>() - 0.5, rng.gen::<f32>() - 0.5) * 0.05;
            let id = solver.create_particle(position);
            let particle = solver.particle_mut(id);
            particle.add_velocity(self.velocity + kick);
            particle.color = rainbow(id as f32 * self.color_rate);
        }
        self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thread_pool::ThreadPool;
    use glam::IVec2;
    use std::sync::Arc;

    fn test_solver() -> Solver {
        Solver::new(IVec2::new(50, 50), Arc::new(ThreadPool::new(1)))
    }

    #[test]
    fn emit_spawns_a_burst_with_velocity_and_color() {
        let mut solver = test_solver();
        let emitter = StreamEmitter::new(Vec2::new(2.0, 10.0), Vec2::new(0.2, 0.0));
        let spawned = emitter.emit(&mut solver);

        assert_eq!(spawned, emitter.rows);
        assert_eq!(solver.particles.len(), emitter.rows as usize);

        let first = solver.particle(0);
        assert_eq!(first.position, Vec2::new(2.0, 10.0));
        assert!((first.velocity() - Vec2::new(0.2, 0.0)).length() < 1e-6);
        assert_ne!(first.color, [255, 255, 255], "spawn index picks a rainbow color");

        let last = solver.particle(emitter.rows - 1);
        assert!((last.position.y - (10.0 + 1.1 * 19.0)).abs() < 1e-5);
    }

    #[test]
    fn emit_respects_the_population_cap() {
        let mut solver = test_solver();
        let mut emitter = StreamEmitter::new(Vec2::new(2.0, 10.0), Vec2::ZERO);
        emitter.max_particles = 30;

        assert_eq!(emitter.emit(&mut solver), 20);
        assert_eq!(emitter.emit(&mut solver), 20);
        // Cap reached; further bursts are refused.
        assert_eq!(emitter.emit(&mut solver), 0);
        assert_eq!(solver.particles.len(), 40);
    }

    #[test]
    fn rainbow_stays_in_byte_range_and_varies() {
        let a = rainbow(0.0);
        let b = rainbow(1.5);
        assert_ne!(a, b);
        // sin^2 keeps every channel in [0, 255]; the cast cannot wrap.
        for t in 0..100 {
            let _ = rainbow(t as f32 * 0.37);
        }
    }
}
