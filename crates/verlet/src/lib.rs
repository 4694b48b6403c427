//! Multithreaded 2D Verlet particle simulation.
//!
//! A dense cloud of equal-radius particles resolved with position-based
//! contacts over a uniform grid:
//! - Verlet integration with implicit velocity and damping
//! - fixed-capacity collision cells, column-major so a slab of columns is
//!   one contiguous range
//! - a fixed thread pool whose two-wave slab schedule keeps concurrent
//!   contact tasks off each other's cells
//!
//! This crate is framework-agnostic - it handles simulation only. Drivers
//! own the window, read particle positions and colors between updates, and
//! draw.

pub mod diagnostics;
pub mod emitter;
pub mod grid;
pub mod particle;
pub mod physics;
pub mod solver;
pub mod thread_pool;

pub use diagnostics::GridStats;
pub use emitter::{rainbow, StreamEmitter};
pub use grid::{CollisionCell, CollisionGrid, CELL_CAPACITY, NO_SLOT};
pub use particle::{Particle, Particles};
pub use solver::Solver;
pub use thread_pool::ThreadPool;
