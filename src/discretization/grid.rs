use nalgebra::DMatrix;

/// Scalar potential on the grid. Rows follow the vertical axis, columns the
/// horizontal one, so `grid[(row, col)]` is the value at `(x = col, y = row)`.
pub type Grid = DMatrix<f64>;

/// Axis-aligned rectangle in grid cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Rect {
    pub fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// One past the last column covered.
    pub fn x_end(&self) -> usize {
        self.x + self.width
    }

    /// One past the last row covered.
    pub fn y_end(&self) -> usize {
        self.y + self.height
    }

    /// Whether the cell `(row, col)` is covered by the rectangle.
    pub fn contains_cell(&self, row: usize, col: usize) -> bool {
        (self.x..self.x_end()).contains(&col) && (self.y..self.y_end()).contains(&row)
    }

    /// Inclusive containment of a continuous position, edges included.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.x as f64
            && x <= self.x_end() as f64
            && y >= self.y as f64
            && y <= self.y_end() as f64
    }

    /// Row and column ranges of the rectangle clipped to an `ny x nx` grid.
    pub fn clipped(&self, ny: usize, nx: usize) -> (std::ops::Range<usize>, std::ops::Range<usize>) {
        let rows = self.y.min(ny)..self.y_end().min(ny);
        let cols = self.x.min(nx)..self.x_end().min(nx);
        (rows, cols)
    }
}

/// A fixed-potential plate (dynode) embedded in the tube.
#[derive(Clone, Debug, PartialEq)]
pub struct Electrode {
    pub rect: Rect,
    pub potential: f64,
    /// Position in the order the electron is expected to strike the dynodes.
    pub sequence_index: usize,
}

impl Electrode {
    pub fn new(rect: Rect, potential: f64, sequence_index: usize) -> Self {
        Self {
            rect,
            potential,
            sequence_index,
        }
    }
}
