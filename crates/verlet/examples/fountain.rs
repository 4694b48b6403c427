//! Headless emitter scenario: a sideways particle stream filling a box.
//!
//! Mirrors an interactive driver loop minus the window: emit a jittered
//! burst, step the solver, report diagnostics once a second.
//!
//! Run with: cargo run --release --example fountain -p verlet

use glam::{IVec2, Vec2};
use std::sync::Arc;
use verlet::{Solver, StreamEmitter, ThreadPool};

fn main() {
    const DT: f32 = 1.0 / 60.0;
    const FRAMES: usize = 900;

    let pool = Arc::new(ThreadPool::new(10));
    let mut solver = Solver::new(IVec2::new(300, 300), pool);

    let mut rng = rand::thread_rng();
    let mut emitter = StreamEmitter::new(Vec2::new(2.0, 10.0), Vec2::new(0.2, 0.0));
    emitter.max_particles = 20_000;

    for frame in 0..FRAMES {
        emitter.emit_jittered(&mut solver, &mut rng);
        solver.update(DT);

        if frame % 60 == 59 {
            let stats = solver.grid_stats();
            println!(
                "t={:.0}s: {} particles, ke={:.1}, max speed={:.3}, occupied cells={}, dropped={}",
                (frame + 1) as f32 * DT,
                solver.particles.len(),
                solver.kinetic_energy(),
                solver.max_speed(),
                stats.occupied_cells,
                stats.dropped
            );
        }
    }

    println!("done: {} particles settled", solver.particles.len());
}
