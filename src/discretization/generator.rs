use super::grid::{Electrode, Grid, Rect};
use crate::config::ConfigError;
use crate::physics::bc::DirichletSet;
use serde::{Deserialize, Serialize};

/// Vertical placement of the two dynode rows.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Layout {
    /// Bottom row sits `wall_gap` above the floor, top row `wall_gap` below the ceiling.
    WallAnchored,
    /// Both rows sit `offset` mm above and below the tube axis.
    Centered { offset: f64 },
}

impl Default for Layout {
    fn default() -> Self {
        Layout::WallAnchored
    }
}

/// Physical description of the tube. Lengths are in mm, `scale` in cells per mm.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TubeDimensions {
    pub scale: f64,
    /// Gap between the tube ends and the first/last dynode.
    pub end_gap: f64,
    /// Gap between a dynode and the tube wall it faces.
    pub wall_gap: f64,
    /// Dynode length along x.
    pub length: f64,
    /// Distance between consecutive dynodes on the same side.
    pub spacing: f64,
    /// Dynode thickness along y.
    pub thickness: f64,
    pub height: f64,
    /// Explicit tube width; derived from the dynode row when absent.
    pub width: Option<f64>,
    pub count: usize,
    pub voltage_step: f64,
    pub layout: Layout,
}

impl Default for TubeDimensions {
    fn default() -> Self {
        Self {
            scale: 10.0,
            end_gap: 3.0,
            wall_gap: 2.0,
            length: 4.0,
            spacing: 2.0,
            thickness: 0.2,
            height: 6.0,
            width: None,
            count: 4,
            voltage_step: 100.0,
            layout: Layout::WallAnchored,
        }
    }
}

/// Grid size and dynode placement derived from [`TubeDimensions`].
#[derive(Clone, Debug)]
pub struct TubeGeometry {
    pub ny: usize,
    pub nx: usize,
    pub scale: f64,
    /// Electrodes in strike order; `electrodes[k].sequence_index == k`.
    pub electrodes: Vec<Electrode>,
}

impl TubeDimensions {
    /// Convert a physical length to whole cells, truncating.
    fn cells(&self, mm: f64) -> usize {
        // absorb representation error such as 0.2 * 10 = 1.9999...
        (mm * self.scale + 1e-9).floor() as usize
    }

    fn check_length(name: &'static str, value: f64) -> Result<(), ConfigError> {
        if !value.is_finite() || value < 0.0 {
            return Err(ConfigError::InvalidLength { name, value });
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(ConfigError::InvalidScale(self.scale));
        }
        Self::check_length("end_gap", self.end_gap)?;
        Self::check_length("wall_gap", self.wall_gap)?;
        Self::check_length("length", self.length)?;
        Self::check_length("spacing", self.spacing)?;
        Self::check_length("thickness", self.thickness)?;
        Self::check_length("height", self.height)?;
        if let Some(width) = self.width {
            Self::check_length("width", width)?;
        }
        if let Layout::Centered { offset } = self.layout {
            Self::check_length("offset", offset)?;
        }
        if !self.voltage_step.is_finite() {
            return Err(ConfigError::InvalidVoltage(self.voltage_step));
        }
        if self.count == 0 {
            return Err(ConfigError::NoElectrodes);
        }
        if self.cells(self.length) == 0 {
            return Err(ConfigError::SubCellFeature {
                name: "length",
                value: self.length,
            });
        }
        if self.cells(self.thickness) == 0 {
            return Err(ConfigError::SubCellFeature {
                name: "thickness",
                value: self.thickness,
            });
        }
        Ok(())
    }

    /// Build the grid size and electrode rectangles.
    pub fn build(&self) -> Result<TubeGeometry, ConfigError> {
        self.validate()?;

        let end_gap = self.cells(self.end_gap);
        let length = self.cells(self.length);
        let thickness = self.cells(self.thickness);
        let pitch = length + self.cells(self.spacing);
        let n_bottom = self.count.div_ceil(2);

        let ny = self.cells(self.height);
        let nx = match self.width {
            Some(width) => self.cells(width),
            None => 2 * end_gap + ((n_bottom as f64 - 0.5) * pitch as f64) as usize + length,
        };
        if ny < 3 || nx < 3 {
            return Err(ConfigError::GridTooSmall { ny, nx });
        }

        let (y_bottom, y_top) = self.row_positions(ny, nx, thickness)?;

        let mut electrodes = Vec::with_capacity(self.count);
        for k in 0..self.count {
            let i = k / 2;
            let (x, y) = if k % 2 == 0 {
                (end_gap + i * pitch, y_bottom)
            } else {
                (end_gap + ((i as f64 + 0.5) * pitch as f64) as usize, y_top)
            };
            let rect = Rect::new(x, y, length, thickness);
            if x < 1 || y < 1 || rect.x_end() > nx - 1 || rect.y_end() > ny - 1 {
                return Err(ConfigError::ElectrodeOutOfBounds {
                    index: k,
                    rect,
                    ny,
                    nx,
                });
            }
            electrodes.push(Electrode::new(
                rect,
                self.voltage_step * (k + 1) as f64,
                k,
            ));
        }

        log::debug!(
            "tube geometry: {}x{} cells, {} electrodes, pitch {} cells",
            ny,
            nx,
            electrodes.len(),
            pitch
        );

        Ok(TubeGeometry {
            ny,
            nx,
            scale: self.scale,
            electrodes,
        })
    }

    /// First row of the bottom and top dynode rows.
    fn row_positions(
        &self,
        ny: usize,
        nx: usize,
        thickness: usize,
    ) -> Result<(usize, usize), ConfigError> {
        match self.layout {
            Layout::WallAnchored => {
                let wall_gap = self.cells(self.wall_gap);
                let top = ny
                    .checked_sub(wall_gap + thickness)
                    .ok_or(ConfigError::GridTooSmall { ny, nx })?;
                Ok((wall_gap, top))
            }
            Layout::Centered { offset } => {
                // axis and half-thickness are whole cells, rounded down
                let center = (ny / 2) as f64;
                let offset = offset * self.scale;
                let half = (thickness / 2) as f64;
                let bottom = center - offset - half;
                let top = center + offset - half;
                if bottom < 0.0 {
                    return Err(ConfigError::InvalidLength {
                        name: "offset",
                        value: offset / self.scale,
                    });
                }
                Ok((bottom as usize, top as usize))
            }
        }
    }
}

impl TubeGeometry {
    /// Grounded border followed by every electrode in strike order.
    pub fn dirichlet_set(&self) -> DirichletSet {
        let mut set = DirichletSet::grounded_border(self.ny, self.nx);
        for electrode in &self.electrodes {
            set.add_electrode(electrode);
        }
        set
    }

    /// All-zero grid with the fixed regions already imposed.
    pub fn initial_grid(&self) -> Grid {
        let mut grid = Grid::zeros(self.ny, self.nx);
        self.dirichlet_set().apply(&mut grid);
        grid
    }

    pub fn potentials(&self) -> Vec<f64> {
        self.electrodes.iter().map(|e| e.potential).collect()
    }

    /// Physical extent of the grid in mm, `(width, height)`.
    pub fn extent_mm(&self) -> (f64, f64) {
        (self.nx as f64 / self.scale, self.ny as f64 / self.scale)
    }
}
