//! Measurement helpers for tests, benchmarks and drivers.

use crate::solver::Solver;

/// Snapshot of grid occupancy after a rebuild.
#[derive(Clone, Copy, Debug, Default)]
pub struct GridStats {
    /// Indices currently stored across all cells.
    pub stored: usize,
    /// Inserts dropped by full cells during the last rebuild.
    pub dropped: usize,
    /// Cells holding at least one index.
    pub occupied_cells: usize,
    /// Largest per-cell count observed.
    pub max_occupancy: u8,
}

impl Solver {
    /// Total kinetic energy: KE = 1/2 * sum(|v|^2), unit mass, velocity in
    /// per-sub-step displacement units.
    pub fn kinetic_energy(&self) -> f32 {
        self.particles
            .iter()
            .map(|p| 0.5 * p.velocity().length_squared())
            .sum()
    }

    /// Fastest particle, same units as `kinetic_energy`.
    pub fn max_speed(&self) -> f32 {
        self.particles.iter().map(|p| p.speed()).fold(0.0, f32::max)
    }

    /// Occupancy of the grid as of the last rebuild.
    pub fn grid_stats(&self) -> GridStats {
        let mut stats = GridStats {
            dropped: self.dropped_inserts as usize,
            ..Default::default()
        };
        for cell in &self.grid.data {
            if cell.count > 0 {
                stats.occupied_cells += 1;
                stats.stored += cell.count as usize;
                stats.max_occupancy = stats.max_occupancy.max(cell.count);
            }
        }
        stats
    }

    /// Count particle pairs closer than `sqrt(1 - slack)`. O(N^2) scan,
    /// intended for tests and diagnostics only.
    pub fn overlap_violations(&self, slack: f32) -> usize {
        let limit = 1.0 - slack;
        let list = &self.particles.list;
        let mut violations = 0;
        for i in 0..list.len() {
            for j in (i + 1)..list.len() {
                if (list[i].position - list[j].position).length_squared() < limit {
                    violations += 1;
                }
            }
        }
        violations
    }
}
