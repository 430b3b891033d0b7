use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

/// Interpolation used to sample a grid at off-node positions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sampling {
    #[default]
    Bilinear,
    /// Catmull-Rom cubic convolution over a 4x4 stencil. Falls back to
    /// bilinear on grids with fewer than 4 rows or columns.
    Bicubic,
}

impl Sampling {
    pub fn sample(self, m: &DMatrix<f64>, x: f64, y: f64) -> Option<f64> {
        match self {
            Sampling::Bilinear => bilinear(m, x, y),
            Sampling::Bicubic => bicubic(m, x, y),
        }
    }
}

/// Bilinear interpolation of `m` at column `x`, row `y` (cell units).
/// Returns `None` outside `[0, nx - 1] x [0, ny - 1]`.
pub fn bilinear(m: &DMatrix<f64>, x: f64, y: f64) -> Option<f64> {
    let (ny, nx) = m.shape();
    if ny == 0 || nx == 0 {
        return None;
    }
    // NaN fails every comparison and falls through to None
    if !(x >= 0.0 && y >= 0.0 && x <= (nx - 1) as f64 && y <= (ny - 1) as f64) {
        return None;
    }

    let x0 = (x.floor() as usize).min(nx.saturating_sub(2));
    let y0 = (y.floor() as usize).min(ny.saturating_sub(2));
    let x1 = (x0 + 1).min(nx - 1);
    let y1 = (y0 + 1).min(ny - 1);
    let tx = x - x0 as f64;
    let ty = y - y0 as f64;

    let v0 = m[(y0, x0)] * (1.0 - tx) + m[(y0, x1)] * tx;
    let v1 = m[(y1, x0)] * (1.0 - tx) + m[(y1, x1)] * tx;
    Some(v0 * (1.0 - ty) + v1 * ty)
}

fn catmull_rom_weights(t: f64) -> [f64; 4] {
    let t2 = t * t;
    let t3 = t2 * t;
    [
        0.5 * (-t3 + 2.0 * t2 - t),
        0.5 * (3.0 * t3 - 5.0 * t2 + 2.0),
        0.5 * (-3.0 * t3 + 4.0 * t2 + t),
        0.5 * (t3 - t2),
    ]
}

/// Bicubic interpolation on the same domain as [`bilinear`]. Stencil indices
/// past the border are clamped to the edge row or column.
pub fn bicubic(m: &DMatrix<f64>, x: f64, y: f64) -> Option<f64> {
    let (ny, nx) = m.shape();
    if ny < 4 || nx < 4 {
        return bilinear(m, x, y);
    }
    if !(x >= 0.0 && y >= 0.0 && x <= (nx - 1) as f64 && y <= (ny - 1) as f64) {
        return None;
    }

    let x0 = (x.floor() as usize).min(nx - 2);
    let y0 = (y.floor() as usize).min(ny - 2);
    let wx = catmull_rom_weights(x - x0 as f64);
    let wy = catmull_rom_weights(y - y0 as f64);
    let clamp = |i: isize, n: usize| i.clamp(0, n as isize - 1) as usize;

    let mut acc = 0.0;
    for (j, wyj) in wy.iter().enumerate() {
        let row = clamp(y0 as isize + j as isize - 1, ny);
        let mut line = 0.0;
        for (i, wxi) in wx.iter().enumerate() {
            let col = clamp(x0 as isize + i as isize - 1, nx);
            line += wxi * m[(row, col)];
        }
        acc += wyj * line;
    }
    Some(acc)
}

/// Value of the cell nearest to `(x, y)`, or `None` when that cell is off the grid.
pub fn nearest(m: &DMatrix<f64>, x: f64, y: f64) -> Option<f64> {
    let (ny, nx) = m.shape();
    let col = x.round();
    let row = y.round();
    if !(col >= 0.0 && row >= 0.0) {
        return None;
    }
    let (row, col) = (row as usize, col as usize);
    if row >= ny || col >= nx {
        return None;
    }
    Some(m[(row, col)])
}
