use crate::discretization::generator::TubeGeometry;
use crate::discretization::grid::Grid;
#[allow(unused)]
use crate::numerics::timing::{finalize_and_print, record_clamp, record_sweep, reset_timing};
use crate::physics::bc::DirichletSet;
use thiserror::Error;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[cfg(feature = "timing")]
use std::time::Instant;

/// Progress is logged at debug level every this many iterations.
const LOG_EVERY: u32 = 500;

/// Jacobi relaxation of the 5-point Laplace stencil with Dirichlet regions.
#[derive(Clone, Copy, Debug)]
pub struct RelaxationSolver {
    /// Bound on the largest single-cell change between two iterations.
    pub tolerance: f64,
    pub max_iterations: u32,
}

impl Default for RelaxationSolver {
    fn default() -> Self {
        Self {
            tolerance: 1e-3,
            max_iterations: 10_000,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SolverError {
    #[error("tolerance must be a non-negative number, got {0}")]
    InvalidTolerance(f64),
    #[error("grid has no cells ({0}x{1})")]
    EmptyGrid(usize, usize),
}

/// Outcome of a relaxation run. Hitting the iteration cap is not an error:
/// `converged` is false and `solution` holds the last iterate.
#[derive(Clone, Debug)]
pub struct SolverResult {
    pub solution: Grid,
    pub iterations: u32,
    pub final_delta: f64,
    pub converged: bool,
    /// Max-norm change recorded after each iteration.
    pub history: Vec<f64>,
}

impl RelaxationSolver {
    pub fn new(tolerance: f64, max_iterations: u32) -> Self {
        Self {
            tolerance,
            max_iterations,
        }
    }

    /// Relax the tube's initial grid against its own fixed regions.
    pub fn solve_tube(&self, geometry: &TubeGeometry) -> Result<SolverResult, SolverError> {
        self.solve(geometry.initial_grid(), &geometry.dirichlet_set())
    }

    pub fn solve(&self, initial: Grid, fixed: &DirichletSet) -> Result<SolverResult, SolverError> {
        if self.tolerance.is_nan() || self.tolerance < 0.0 {
            return Err(SolverError::InvalidTolerance(self.tolerance));
        }
        let (ny, nx) = initial.shape();
        if ny == 0 || nx == 0 {
            return Err(SolverError::EmptyGrid(ny, nx));
        }

        reset_timing();
        #[cfg(feature = "timing")]
        let solve_start = Instant::now();

        let mut current = initial;
        fixed.apply(&mut current);
        let mut next = current.clone();

        let mut history = Vec::new();
        let mut final_delta = f64::INFINITY;
        let mut converged = false;
        let mut iterations = 0;

        log::debug!(
            "relaxing {}x{} grid, {} fixed regions, tol {:.1e}, cap {}",
            ny,
            nx,
            fixed.len(),
            self.tolerance,
            self.max_iterations
        );
        for (a, b) in fixed.conflicting_overlaps() {
            log::debug!("fixed regions {} and {} overlap, region {} wins", a, b, b);
        }

        while iterations < self.max_iterations {
            record_sweep(|| relax_interior(&current, &mut next));
            record_clamp(|| fixed.apply(&mut next));

            final_delta = max_abs_diff(&current, &next);
            std::mem::swap(&mut current, &mut next);
            iterations += 1;
            history.push(final_delta);

            if iterations % LOG_EVERY == 0 {
                log::debug!("iteration {:>6} | delta {:.3e}", iterations, final_delta);
            }

            if final_delta <= self.tolerance {
                converged = true;
                break;
            }
        }

        #[cfg(feature = "timing")]
        finalize_and_print(solve_start.elapsed());

        if converged {
            log::info!(
                "relaxation converged in {} iterations (delta = {:.2e})",
                iterations,
                final_delta
            );
        } else {
            log::warn!(
                "relaxation stopped at the {}-iteration cap (delta = {:.2e} > tol {:.1e})",
                iterations,
                final_delta,
                self.tolerance
            );
        }

        Ok(SolverResult {
            solution: current,
            iterations,
            final_delta,
            converged,
            history,
        })
    }
}

/// Write the 4-neighbour mean of `old` into every interior cell of `new`.
/// Reads only from `old`, so columns can be processed in any order.
pub fn relax_interior(old: &Grid, new: &mut Grid) {
    let (ny, nx) = old.shape();
    if ny < 3 || nx < 3 {
        return;
    }
    let src = old.as_slice();

    #[cfg(not(feature = "parallel"))]
    new.as_mut_slice()
        .chunks_mut(ny)
        .enumerate()
        .filter(|(col, _)| *col > 0 && *col < nx - 1)
        .for_each(|(col, out)| relax_column(src, ny, col, out));

    #[cfg(feature = "parallel")]
    new.as_mut_slice()
        .par_chunks_mut(ny)
        .enumerate()
        .filter(|(col, _)| *col > 0 && *col < nx - 1)
        .for_each(|(col, out)| relax_column(src, ny, col, out));
}

// Storage is column-major: column `col` occupies `src[col * ny..(col + 1) * ny]`.
#[inline]
fn relax_column(src: &[f64], ny: usize, col: usize, out: &mut [f64]) {
    let left = &src[(col - 1) * ny..col * ny];
    let mid = &src[col * ny..(col + 1) * ny];
    let right = &src[(col + 1) * ny..(col + 2) * ny];
    for row in 1..ny - 1 {
        out[row] = 0.25 * ((mid[row + 1] + mid[row - 1]) + (left[row] + right[row]));
    }
}

/// Largest absolute cell-wise difference.
pub fn max_abs_diff(a: &Grid, b: &Grid) -> f64 {
    a.iter()
        .zip(b.iter())
        .fold(0.0_f64, |acc, (x, y)| acc.max((x - y).abs()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discretization::grid::Rect;
    use crate::physics::bc::{FixedRegion, RegionSource};

    fn plate(ny: usize, nx: usize, rect: Rect, value: f64) -> DirichletSet {
        let mut set = DirichletSet::grounded_border(ny, nx);
        set.add(FixedRegion {
            rect,
            value,
            source: RegionSource::Electrode(0),
        });
        set
    }

    #[test]
    fn grounded_box_converges_immediately() {
        let set = DirichletSet::grounded_border(8, 9);
        let result = RelaxationSolver::default()
            .solve(Grid::zeros(8, 9), &set)
            .unwrap();
        assert_eq!(result.iterations, 1);
        assert_eq!(result.final_delta, 0.0);
        assert!(result.converged);
        assert!(result.solution.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn interior_update_uses_previous_iterate_only() {
        // One sweep from a single hot cell: a Gauss-Seidel sweep would leak
        // into the second neighbour, Jacobi must not.
        let mut grid = Grid::zeros(5, 7);
        grid[(2, 2)] = 4.0;
        let mut next = grid.clone();
        relax_interior(&grid, &mut next);

        assert_eq!(next[(2, 2)], 0.0);
        assert_eq!(next[(2, 3)], 1.0);
        assert_eq!(next[(2, 1)], 1.0);
        assert_eq!(next[(1, 2)], 1.0);
        assert_eq!(next[(3, 2)], 1.0);
        assert_eq!(next[(2, 4)], 0.0);
    }

    #[test]
    fn iteration_cap_is_not_an_error() {
        let set = plate(12, 12, Rect::new(3, 6, 6, 1), 100.0);
        let solver = RelaxationSolver::new(1e-12, 5);
        let result = solver.solve(Grid::zeros(12, 12), &set).unwrap();
        assert_eq!(result.iterations, 5);
        assert!(!result.converged);
        assert!(result.final_delta > 1e-12);
        assert_eq!(result.history.len(), 5);
    }

    #[test]
    fn zero_iteration_cap_returns_clamped_initial_grid() {
        let set = plate(6, 6, Rect::new(2, 2, 2, 1), 50.0);
        let solver = RelaxationSolver::new(1e-3, 0);
        let result = solver.solve(Grid::from_element(6, 6, 1.0), &set).unwrap();
        assert_eq!(result.iterations, 0);
        assert!(result.final_delta.is_infinite());
        assert_eq!(result.solution[(2, 3)], 50.0);
        assert_eq!(result.solution[(0, 0)], 0.0);
        assert_eq!(result.solution[(3, 3)], 1.0);
    }

    #[test]
    fn rejects_bad_tolerance() {
        let set = DirichletSet::grounded_border(4, 4);
        let solver = RelaxationSolver::new(f64::NAN, 10);
        assert!(matches!(
            solver.solve(Grid::zeros(4, 4), &set),
            Err(SolverError::InvalidTolerance(_))
        ));
        let solver = RelaxationSolver::new(-1.0, 10);
        assert!(solver.solve(Grid::zeros(4, 4), &set).is_err());
    }

    #[test]
    fn rejects_empty_grid() {
        let set = DirichletSet::new();
        assert_eq!(
            RelaxationSolver::default()
                .solve(Grid::zeros(0, 4), &set)
                .unwrap_err(),
            SolverError::EmptyGrid(0, 4)
        );
    }

    #[test]
    fn history_ends_with_final_delta() {
        let set = plate(10, 10, Rect::new(2, 5, 6, 1), 100.0);
        let result = RelaxationSolver::default()
            .solve(Grid::zeros(10, 10), &set)
            .unwrap();
        assert!(result.converged);
        assert_eq!(result.history.last().copied(), Some(result.final_delta));
        assert!(result.final_delta <= 1e-3);
    }
}
