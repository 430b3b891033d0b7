use crate::discretization::grid::Grid;
use crate::numerics::interpolation::Sampling;
use glam::DVec2;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum FieldError {
    #[error("field components disagree in shape: Ex is {ex:?}, Ey is {ey:?}")]
    ComponentMismatch {
        ex: (usize, usize),
        ey: (usize, usize),
    },
    #[error("field shape {field:?} does not match potential grid {grid:?}")]
    GridMismatch {
        field: (usize, usize),
        grid: (usize, usize),
    },
    #[error("grid of {0}x{1} cells is too small to differentiate")]
    GridTooSmall(usize, usize),
    #[error("cell scale must be positive and finite, got {0}")]
    InvalidScale(f64),
}

/// Electric field `E = -grad V` sampled on the potential grid, in volts per
/// physical length unit.
#[derive(Clone, Debug)]
pub struct ElectricField {
    pub ex: Grid,
    pub ey: Grid,
}

impl ElectricField {
    pub fn from_components(ex: Grid, ey: Grid) -> Result<Self, FieldError> {
        if ex.shape() != ey.shape() {
            return Err(FieldError::ComponentMismatch {
                ex: ex.shape(),
                ey: ey.shape(),
            });
        }
        Ok(Self { ex, ey })
    }

    /// Zero field of the given shape.
    pub fn zeros(ny: usize, nx: usize) -> Self {
        Self {
            ex: Grid::zeros(ny, nx),
            ey: Grid::zeros(ny, nx),
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        self.ex.shape()
    }

    pub fn ensure_matches(&self, grid: &Grid) -> Result<(), FieldError> {
        if self.shape() != grid.shape() {
            return Err(FieldError::GridMismatch {
                field: self.shape(),
                grid: grid.shape(),
            });
        }
        Ok(())
    }

    /// Bilinear sample at a continuous position in cell units, zero outside the grid.
    pub fn sample(&self, position: DVec2) -> DVec2 {
        self.sample_with(position, Sampling::Bilinear)
    }

    pub fn sample_with(&self, position: DVec2, sampling: Sampling) -> DVec2 {
        let ex = sampling.sample(&self.ex, position.x, position.y).unwrap_or(0.0);
        let ey = sampling.sample(&self.ey, position.x, position.y).unwrap_or(0.0);
        DVec2::new(ex, ey)
    }

    /// Magnitude `|E|` at every cell.
    pub fn magnitude(&self) -> Grid {
        self.ex.zip_map(&self.ey, |x, y| x.hypot(y))
    }
}

/// Differentiate the potential: central differences inside, one-sided
/// differences on the border rows and columns. `scale` is cells per length
/// unit, so one cell spans `1 / scale`.
pub fn compute_field(potential: &Grid, scale: f64) -> Result<ElectricField, FieldError> {
    let (ny, nx) = potential.shape();
    if ny < 2 || nx < 2 {
        return Err(FieldError::GridTooSmall(ny, nx));
    }
    if !scale.is_finite() || scale <= 0.0 {
        return Err(FieldError::InvalidScale(scale));
    }

    let ex = Grid::from_fn(ny, nx, |row, col| {
        let grad = if col == 0 {
            potential[(row, 1)] - potential[(row, 0)]
        } else if col == nx - 1 {
            potential[(row, col)] - potential[(row, col - 1)]
        } else {
            (potential[(row, col + 1)] - potential[(row, col - 1)]) / 2.0
        };
        -grad * scale
    });

    let ey = Grid::from_fn(ny, nx, |row, col| {
        let grad = if row == 0 {
            potential[(1, col)] - potential[(0, col)]
        } else if row == ny - 1 {
            potential[(row, col)] - potential[(row - 1, col)]
        } else {
            (potential[(row + 1, col)] - potential[(row - 1, col)]) / 2.0
        };
        -grad * scale
    });

    ElectricField::from_components(ex, ey)
}
