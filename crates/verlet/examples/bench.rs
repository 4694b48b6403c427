//! Quick benchmark for profiling the collision solver.
//!
//! Run with: cargo run --release --example bench -p verlet
//! Profile with: cargo flamegraph --example bench -p verlet

use glam::{IVec2, Vec2};
use std::sync::Arc;
use std::time::Instant;
use verlet::{Solver, StreamEmitter, ThreadPool};

fn main() {
    const FRAMES: usize = 600;
    const DT: f32 = 1.0 / 60.0;

    let threads = std::thread::available_parallelism()
        .map(|n| n.get().min(16))
        .unwrap_or(4);
    let pool = Arc::new(ThreadPool::new(threads));
    let mut solver = Solver::new(IVec2::new(300, 300), pool);

    let mut emitter = StreamEmitter::new(Vec2::new(2.0, 10.0), Vec2::new(0.2, 0.0));
    emitter.max_particles = 60_000;

    println!("world 300x300, {threads} workers, {FRAMES} frames");

    let start = Instant::now();
    for frame in 0..FRAMES {
        emitter.emit(&mut solver);
        solver.update(DT);

        if frame % 60 == 0 {
            println!("  frame {frame}: {} particles", solver.particles.len());
        }
    }
    let elapsed = start.elapsed();

    let avg = elapsed.as_secs_f64() / FRAMES as f64;
    println!("\ntotal {elapsed:.2?}");
    println!("avg frame {:.2}ms, effective fps {:.1}", avg * 1000.0, 1.0 / avg);
    println!("final particles: {}", solver.particles.len());

    let stats = solver.grid_stats();
    println!(
        "grid: {} occupied cells, max occupancy {}, {} dropped inserts",
        stats.occupied_cells, stats.max_occupancy, stats.dropped
    );
}
