//! Parallel position-based collision solver.
//!
//! Each sub-step rebuilds the uniform grid from particle positions,
//! resolves contacts in two parallel waves over column slabs, then
//! integrates every particle through the pool. Phases are strictly
//! sequential; parallelism only exists inside a phase.
//!
//! The slab schedule carries the whole synchronization argument: columns
//! split into `2T` slabs, the even-indexed slabs run in the first wave and
//! the odd-indexed ones after a barrier. Any two slabs active at the same
//! time are separated by an idle slab at least two columns wide, so the 3x3
//! cell neighborhoods they read and the particles they move can never
//! overlap. No lock is taken on the hot path.

use std::sync::Arc;

use glam::{IVec2, Vec2};

use crate::grid::{CollisionGrid, NO_SLOT};
use crate::particle::{Particle, Particles};
use crate::physics::{GRAVITY, MARGIN, MIN_CONTACT_DIST_SQ, RESPONSE_COEF, SUB_STEPS};
use crate::thread_pool::ThreadPool;

pub struct Solver {
    pub particles: Particles,
    pub grid: CollisionGrid,
    /// World extent in units; constant after construction.
    pub world_size: Vec2,
    pub gravity: Vec2,
    /// Solving passes per `update` call.
    pub sub_steps: u32,
    thread_pool: Arc<ThreadPool>,
    /// Inserts dropped by full cells during the last grid rebuild.
    pub(crate) dropped_inserts: u32,
}

impl Solver {
    /// The world must be wide enough for two slabs per worker with every
    /// slab at least two columns wide; a one-column slab could not keep the
    /// 3x3 neighborhoods of its two active neighbors apart.
    pub fn new(size: IVec2, thread_pool: Arc<ThreadPool>) -> Self {
        assert!(size.x > 0 && size.y > 0, "world must span at least one cell");
        assert!(
            size.x as usize >= 4 * thread_pool.thread_count(),
            "world width {} cannot host two slabs of width >= 2 per worker (workers: {})",
            size.x,
            thread_pool.thread_count()
        );
        Self {
            particles: Particles::new(),
            grid: CollisionGrid::new(size.x as usize, size.y as usize),
            world_size: size.as_vec2(),
            gravity: GRAVITY,
            sub_steps: SUB_STEPS,
            thread_pool,
            dropped_inserts: 0,
        }
    }

    /// Append a particle at rest and return its permanent index.
    pub fn create_particle(&mut self, position: Vec2) -> u32 {
        self.particles.emplace(position)
    }

    /// Append a fully-formed particle.
    pub fn add_particle(&mut self, particle: Particle) -> u32 {
        self.particles.push(particle)
    }

    /// Out-of-range indices panic.
    #[inline]
    pub fn particle(&self, index: u32) -> &Particle {
        &self.particles.list[index as usize]
    }

    #[inline]
    pub fn particle_mut(&mut self, index: u32) -> &mut Particle {
        &mut self.particles.list[index as usize]
    }

    /// Read-only view for the renderer. Never runs concurrently with
    /// `update`; the two do not overlap in time.
    pub fn particles(&self) -> impl Iterator<Item = &Particle> {
        self.particles.list.iter()
    }

    /// Advance the simulation by one frame of `sub_steps` sub-steps.
    /// Synchronous; returns once the last barrier has drained.
    pub fn update(&mut self, dt: f32) {
        let sub_dt = dt / self.sub_steps as f32;
        for _ in 0..self.sub_steps {
            self.rebuild_grid();
            self.solve_collisions();
            self.integrate(sub_dt);
        }
    }

    /// Re-home every in-band particle into the cell under it.
    ///
    /// Sequential: inserts target arbitrary cells and the write is cheap.
    /// Particles outside the band `(1, W-1) x (1, H-1)` stay out of the
    /// grid and see no contacts this sub-step.
    pub fn rebuild_grid(&mut self) {
        self.grid.clear();
        self.dropped_inserts = 0;
        let width = self.world_size.x;
        let height = self.world_size.y;
        for (index, particle) in self.particles.list.iter().enumerate() {
            let pos = particle.position;
            if pos.x > 1.0 && pos.x < width - 1.0 && pos.y > 1.0 && pos.y < height - 1.0 {
                let slot = self.grid.add(pos.x as usize, pos.y as usize, index as u32);
                if slot == NO_SLOT {
                    // Full cell: the particle is unlinked from the grid
                    // until a later rebuild finds it room.
                    self.dropped_inserts += 1;
                }
            }
        }
    }

    /// Two parallel waves over column slabs, with a barrier between them.
    pub fn solve_collisions(&mut self) {
        let thread_count = self.thread_pool.thread_count();
        let slab_count = 2 * thread_count;
        let slab_width = self.grid.width / slab_count;
        let view = SolverView::new(&self.grid, &mut self.particles);

        // Even slabs, plus whatever trailing columns the division left
        // over. The tail sits right of the last odd slab, which is idle in
        // this wave, so it keeps the one-slab separation.
        for i in 0..thread_count {
            let start = 2 * i * slab_width;
            self.thread_pool
                .add_task(move || unsafe { view.solve_columns(start, start + slab_width) });
        }
        let tail = slab_count * slab_width;
        if tail < self.grid.width {
            let width = self.grid.width;
            self.thread_pool
                .add_task(move || unsafe { view.solve_columns(tail, width) });
        }
        self.thread_pool.wait_for_completion();

        // Odd slabs.
        for i in 0..thread_count {
            let start = (2 * i + 1) * slab_width;
            self.thread_pool
                .add_task(move || unsafe { view.solve_columns(start, start + slab_width) });
        }
        self.thread_pool.wait_for_completion();
    }

    /// Gravity, Verlet step and boundary clamp for every particle, spread
    /// over the pool; the caller thread takes the tail range.
    fn integrate(&mut self, dt: f32) {
        let count = self.particles.len();
        let gravity = self.gravity;
        let min = Vec2::splat(MARGIN);
        let max = self.world_size - MARGIN;
        let particles = ParticleRange::new(&mut self.particles);
        self.thread_pool.dispatch(count, &|start, end| {
            // SAFETY: dispatch hands every caller a disjoint index range.
            let slice = unsafe { particles.slice_mut(start, end) };
            for particle in slice {
                particle.acceleration += gravity;
                particle.integrate(dt);
                particle.position = particle.position.clamp(min, max);
            }
        });
    }
}

/// Raw view of the solver state captured by contact tasks.
///
/// The wave schedule guarantees that tasks alive at the same time own
/// column ranges separated by at least two idle columns, so the cells they
/// scan and the particles reachable from them are disjoint and the writes
/// never alias.
#[derive(Clone, Copy)]
struct SolverView {
    grid: *const CollisionGrid,
    particles: *mut Particle,
}

unsafe impl Send for SolverView {}

impl SolverView {
    fn new(grid: &CollisionGrid, particles: &mut Particles) -> Self {
        Self {
            grid,
            particles: particles.list.as_mut_ptr(),
        }
    }

    /// Resolve every contact whose center cell lies in columns
    /// `[col_start, col_end)`.
    ///
    /// Traversal is deterministic within the range: ascending cell index,
    /// ascending slot within a cell.
    ///
    /// # Safety
    /// No concurrently running task may own a column range closer than two
    /// columns, and the particle array must not be resized while any view
    /// is live.
    unsafe fn solve_columns(self, col_start: usize, col_end: usize) {
        let grid = &*self.grid;
        let height = grid.height as isize;
        // Border cells are never centers, which keeps every 3x3 neighbor
        // index in bounds without a check in the inner loop.
        let col_start = col_start.max(1);
        let col_end = col_end.min(grid.width - 1);
        for x in col_start..col_end {
            for y in 1..grid.height - 1 {
                let cell_index = x * grid.height + y;
                for &index in grid.data[cell_index].indices() {
                    for dx in [-1isize, 0, 1] {
                        for dy in [-1isize, 0, 1] {
                            let neighbor = (cell_index as isize + dx * height + dy) as usize;
                            for &other in grid.data[neighbor].indices() {
                                solve_contact(self.particles, index, other);
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Raw slice handle so dispatch callers can mutate disjoint particle ranges.
#[derive(Clone, Copy)]
struct ParticleRange {
    ptr: *mut Particle,
    len: usize,
}

unsafe impl Send for ParticleRange {}
unsafe impl Sync for ParticleRange {}

impl ParticleRange {
    fn new(particles: &mut Particles) -> Self {
        Self {
            ptr: particles.list.as_mut_ptr(),
            len: particles.list.len(),
        }
    }

    /// # Safety
    /// Ranges handed to concurrent callers must be disjoint.
    unsafe fn slice_mut<'a>(self, start: usize, end: usize) -> &'a mut [Particle] {
        debug_assert!(start <= end && end <= self.len);
        std::slice::from_raw_parts_mut(self.ptr.add(start), end - start)
    }
}

/// Push two overlapping particles apart, half the measured overlap each,
/// preserving their midpoint. Velocity is untouched; the next Verlet step
/// recovers it from the moved positions.
///
/// Works through raw places: the neighborhood scan visits the `(i, i)`
/// self-pair, which the distance guard rejects before any write, and a
/// reference-based signature would alias in that case.
///
/// # Safety
/// `particles` must be valid for indices `a` and `b`, and no other thread
/// may touch either particle during the call.
#[inline]
unsafe fn solve_contact(particles: *mut Particle, a: u32, b: u32) {
    let pa = particles.add(a as usize);
    let pb = particles.add(b as usize);
    let delta = (*pa).position - (*pb).position;
    let dist2 = delta.length_squared();
    // Radii are all 0.5, so contact distance is 1. The lower guard skips
    // coincident pairs whose normal would blow up.
    if dist2 < 1.0 && dist2 > MIN_CONTACT_DIST_SQ {
        let dist = dist2.sqrt();
        let correction = (delta / dist) * (RESPONSE_COEF * 0.5 * (1.0 - dist));
        (*pa).position += correction;
        (*pb).position -= correction;
    }
}
