//! Incremental fractional coverage.

use common::BAD_DATA;
use tracing::debug;

use super::{check_width, per_slice};
use crate::error::Result;
use crate::grid::DataPlane;
use crate::threshold::Threshold;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cell {
    Invalid,
    Off,
    On,
}

/// Classification of the `wdth x wdth` box around the current point.
///
/// Rows are stored in circular slots so that a step in `y` only
/// reclassifies the one row entering the box.
struct CoverageWindow {
    wdth: usize,
    cells: Vec<Cell>,
    n_on: usize,
    n_valid: usize,
}

impl CoverageWindow {
    fn new(wdth: usize) -> Self {
        Self {
            wdth,
            cells: vec![Cell::Invalid; wdth * wdth],
            n_on: 0,
            n_valid: 0,
        }
    }

    fn classify(field: &DataPlane, thresh: &Threshold, x: isize, y: isize) -> Cell {
        if x < 0 || y < 0 || x as usize >= field.nx() || y as usize >= field.ny() {
            return Cell::Invalid;
        }
        let v = field.get(x as usize, y as usize, 0);
        if common::is_bad_data(v) {
            Cell::Invalid
        } else if thresh.check(v) {
            Cell::On
        } else {
            Cell::Off
        }
    }

    fn set(&mut self, n: usize, cell: Cell) {
        match self.cells[n] {
            Cell::On => {
                self.n_on -= 1;
                self.n_valid -= 1;
            }
            Cell::Off => self.n_valid -= 1,
            Cell::Invalid => {}
        }
        match cell {
            Cell::On => {
                self.n_on += 1;
                self.n_valid += 1;
            }
            Cell::Off => self.n_valid += 1,
            Cell::Invalid => {}
        }
        self.cells[n] = cell;
    }

    /// Reclassify slot `slot` with grid row `y`, columns `x_ll..x_ll + wdth`.
    fn load_row(&mut self, field: &DataPlane, thresh: &Threshold, slot: usize, x_ll: isize, y: isize) {
        for i in 0..self.wdth {
            let cell = Self::classify(field, thresh, x_ll + i as isize, y);
            self.set(i + self.wdth * slot, cell);
        }
    }

    fn value(&self, vld_thresh: f64) -> f64 {
        let area = (self.wdth * self.wdth) as f64;
        if self.n_valid == 0 || (self.n_valid as f64) / area < vld_thresh {
            BAD_DATA
        } else {
            self.n_on as f64 / self.n_valid as f64
        }
    }
}

/// Fraction of valid cells passing `thresh` in the centered `wdth x wdth` box.
///
/// Points whose box has no valid cells, or a valid fraction below
/// `vld_thresh`, are set to bad data. `wdth` must be odd.
pub fn fractional_coverage(
    field: &DataPlane,
    wdth: usize,
    thresh: &Threshold,
    vld_thresh: f64,
) -> Result<DataPlane> {
    check_width("fractional_coverage.wdth", wdth)?;
    debug!(
        "Computing fractional coverage for {thresh} over {} points",
        wdth * wdth
    );
    per_slice(field, |slice| Ok(coverage_slice(slice, wdth, thresh, vld_thresh)))
}

fn coverage_slice(field: &DataPlane, wdth: usize, thresh: &Threshold, vld_thresh: f64) -> DataPlane {
    let (nx, ny) = (field.nx(), field.ny());
    let half = (wdth / 2) as isize;
    let mut out = DataPlane::new_bad(nx, ny, 1).with_projection(field.projection().copied());

    for x in 0..nx {
        let x_ll = x as isize - half;
        let mut window = CoverageWindow::new(wdth);

        for y in 0..ny {
            let yi = y as isize;
            if y == 0 {
                for slot in 0..wdth {
                    window.load_row(field, thresh, slot, x_ll, yi - half + slot as isize);
                }
            } else {
                // The slot holding row y - 1 - half takes row y + half.
                let slot = (y - 1) % wdth;
                window.load_row(field, thresh, slot, x_ll, yi + half);
            }
            out.put(window.value(vld_thresh), x, y, 0);
        }
    }
    out
}
