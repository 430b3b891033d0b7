use crate::discretization::grid::{Electrode, Grid, Rect};

/// Where a fixed region came from. Only used for reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegionSource {
    Border,
    Electrode(usize),
}

/// Rectangle of cells held at a fixed potential (Dirichlet condition).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedRegion {
    pub rect: Rect,
    pub value: f64,
    pub source: RegionSource,
}

/// Ordered set of fixed regions, re-imposed after every relaxation sweep.
///
/// Regions are applied in insertion order, so when two regions claim the same
/// cell the later one wins.
#[derive(Clone, Debug, Default)]
pub struct DirichletSet {
    regions: Vec<FixedRegion>,
}

impl DirichletSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The four outer rows/columns of an `ny x nx` grid held at 0 V.
    pub fn grounded_border(ny: usize, nx: usize) -> Self {
        let mut set = Self::new();
        if ny == 0 || nx == 0 {
            return set;
        }
        for rect in [
            Rect::new(0, 0, nx, 1),
            Rect::new(0, ny - 1, nx, 1),
            Rect::new(0, 0, 1, ny),
            Rect::new(nx - 1, 0, 1, ny),
        ] {
            set.add(FixedRegion {
                rect,
                value: 0.0,
                source: RegionSource::Border,
            });
        }
        set
    }

    pub fn add(&mut self, region: FixedRegion) {
        self.regions.push(region);
    }

    pub fn add_electrode(&mut self, electrode: &Electrode) {
        self.add(FixedRegion {
            rect: electrode.rect,
            value: electrode.potential,
            source: RegionSource::Electrode(electrode.sequence_index),
        });
    }

    pub fn regions(&self) -> &[FixedRegion] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Overwrite every covered cell with its region's value. Parts of a
    /// region outside the grid are ignored.
    pub fn apply(&self, grid: &mut Grid) {
        let (ny, nx) = grid.shape();
        for region in &self.regions {
            let (rows, cols) = region.rect.clipped(ny, nx);
            if rows.is_empty() || cols.is_empty() {
                continue;
            }
            grid.view_mut((rows.start, cols.start), (rows.len(), cols.len()))
                .fill(region.value);
        }
    }

    /// Value imposed on `(row, col)`, if any. Mirrors [`apply`](Self::apply):
    /// the last matching region decides.
    pub fn value_at(&self, row: usize, col: usize) -> Option<f64> {
        self.regions
            .iter()
            .rev()
            .find(|r| r.rect.contains_cell(row, col))
            .map(|r| r.value)
    }

    /// Pairs of electrode regions that share at least one cell with different
    /// values. Such overlaps are resolved by order, this only reports them.
    pub fn conflicting_overlaps(&self) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        for (i, a) in self.regions.iter().enumerate() {
            for (j, b) in self.regions.iter().enumerate().skip(i + 1) {
                if a.source == RegionSource::Border || b.source == RegionSource::Border {
                    continue;
                }
                if a.value != b.value && overlaps(&a.rect, &b.rect) {
                    out.push((i, j));
                }
            }
        }
        out
    }
}

fn overlaps(a: &Rect, b: &Rect) -> bool {
    a.x < b.x_end() && b.x < a.x_end() && a.y < b.y_end() && b.y < a.y_end()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn border_covers_outer_ring_only() {
        let set = DirichletSet::grounded_border(5, 6);
        let mut grid = Grid::from_element(5, 6, 7.0);
        set.apply(&mut grid);
        for row in 0..5 {
            for col in 0..6 {
                let on_border = row == 0 || row == 4 || col == 0 || col == 5;
                let expected = if on_border { 0.0 } else { 7.0 };
                assert_eq!(grid[(row, col)], expected, "cell ({row}, {col})");
            }
        }
    }

    #[test]
    fn later_region_wins_on_overlap() {
        let mut set = DirichletSet::new();
        set.add(FixedRegion {
            rect: Rect::new(1, 1, 3, 1),
            value: 100.0,
            source: RegionSource::Electrode(0),
        });
        set.add(FixedRegion {
            rect: Rect::new(2, 1, 3, 1),
            value: 200.0,
            source: RegionSource::Electrode(1),
        });
        let mut grid = Grid::zeros(4, 6);
        set.apply(&mut grid);

        assert_eq!(grid[(1, 1)], 100.0);
        assert_eq!(grid[(1, 2)], 200.0);
        assert_eq!(grid[(1, 4)], 200.0);
        assert_eq!(set.value_at(1, 2), Some(200.0));
        assert_eq!(set.value_at(2, 2), None);
        assert_eq!(set.conflicting_overlaps(), vec![(0, 1)]);
    }

    #[test]
    fn region_past_grid_edge_is_clipped() {
        let mut set = DirichletSet::new();
        set.add(FixedRegion {
            rect: Rect::new(3, 2, 10, 10),
            value: 1.0,
            source: RegionSource::Electrode(0),
        });
        let mut grid = Grid::zeros(4, 5);
        set.apply(&mut grid);
        assert_eq!(grid.sum(), 2.0 * 2.0);
    }
}
