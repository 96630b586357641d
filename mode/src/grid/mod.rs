//! Dense 2D/3D grids with a bad-data sentinel.
//!
//! Every gridded quantity in the pipeline (raw fields, convolved fields,
//! label fields) lives in a [`Grid`]. Samples are stored in a single
//! contiguous buffer addressed by `x + nx * (y + ny * t)`; all components
//! go through [`three_to_one`] so the mapping is shared.

#[cfg(test)]
mod tests;

use std::ops::{Index, IndexMut};

use common::{BAD_DATA, is_bad_data};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Linear index of `(x, y, t)` in a `nx * ny * nt` grid.
#[inline]
pub fn three_to_one(nx: usize, ny: usize, nt: usize, x: usize, y: usize, t: usize) -> usize {
    debug_assert!(x < nx && y < ny && t < nt);
    x + nx * (y + ny * t)
}

/// Regular latitude/longitude projection anchored at the lower-left cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLonProjection {
    pub lat_ll: f64,
    pub lon_ll: f64,
    pub delta_lat: f64,
    pub delta_lon: f64,
}

impl LatLonProjection {
    /// Convert (possibly fractional) grid coordinates to `(lat, lon)` degrees.
    pub fn xy_to_latlon(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.lat_ll + y * self.delta_lat,
            self.lon_ll + x * self.delta_lon,
        )
    }
}

/// Dense grid of samples indexed by `(x, y, t)`.
///
/// `Clone` is a deep copy; no two grids ever share storage.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    data: Vec<T>,
    nx: usize,
    ny: usize,
    nt: usize,
    projection: Option<LatLonProjection>,
}

impl<T> Grid<T> {
    pub fn from_vec(nx: usize, ny: usize, nt: usize, data: Vec<T>) -> Self {
        assert_eq!(
            data.len(),
            nx * ny * nt,
            "data length must equal nx * ny * nt"
        );
        Self {
            data,
            nx,
            ny,
            nt,
            projection: None,
        }
    }

    pub fn with_projection(mut self, projection: Option<LatLonProjection>) -> Self {
        self.projection = projection;
        self
    }

    #[inline]
    pub fn nx(&self) -> usize {
        self.nx
    }

    #[inline]
    pub fn ny(&self) -> usize {
        self.ny
    }

    #[inline]
    pub fn nt(&self) -> usize {
        self.nt
    }

    #[inline]
    pub fn dims(&self) -> (usize, usize, usize) {
        (self.nx, self.ny, self.nt)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    #[inline]
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    #[inline]
    pub fn projection(&self) -> Option<&LatLonProjection> {
        self.projection.as_ref()
    }

    pub fn set_projection(&mut self, projection: Option<LatLonProjection>) {
        self.projection = projection;
    }

    /// Linear index of `(x, y, t)`. Panics when the coordinate is outside the grid.
    #[inline]
    pub fn index_of(&self, x: usize, y: usize, t: usize) -> usize {
        assert!(
            x < self.nx && y < self.ny && t < self.nt,
            "grid coordinate ({x}, {y}, {t}) out of range for {} x {} x {}",
            self.nx,
            self.ny,
            self.nt
        );
        three_to_one(self.nx, self.ny, self.nt, x, y, t)
    }

    /// True when both grids have the same dimensions and projection.
    pub fn same_grid<U>(&self, other: &Grid<U>) -> bool {
        self.dims() == other.dims() && self.projection == other.projection
    }

    pub fn check_same_grid<U>(&self, other: &Grid<U>, context: &'static str) -> Result<()> {
        if self.same_grid(other) {
            Ok(())
        } else {
            Err(Error::DimensionMismatch {
                context,
                expected: self.dims(),
                actual: other.dims(),
            })
        }
    }

    pub fn map<U, F: FnMut(&T) -> U>(&self, f: F) -> Grid<U> {
        Grid {
            data: self.data.iter().map(f).collect(),
            nx: self.nx,
            ny: self.ny,
            nt: self.nt,
            projection: self.projection,
        }
    }
}

impl<T: Copy> Grid<T> {
    #[inline]
    pub fn get(&self, x: usize, y: usize, t: usize) -> T {
        self.data[self.index_of(x, y, t)]
    }

    #[inline]
    pub fn put(&mut self, value: T, x: usize, y: usize, t: usize) {
        let n = self.index_of(x, y, t);
        self.data[n] = value;
    }

    pub fn set_constant(&mut self, value: T) {
        self.data.fill(value);
    }

    /// Copy of one time slice as a single-slice grid.
    pub fn const_t_slice(&self, t: usize) -> Grid<T> {
        assert!(
            t < self.nt,
            "time slice {t} out of range for nt = {}",
            self.nt
        );
        let nxy = self.nx * self.ny;
        let start = three_to_one(self.nx, self.ny, self.nt, 0, 0, t);
        Grid {
            data: self.data[start..start + nxy].to_vec(),
            nx: self.nx,
            ny: self.ny,
            nt: 1,
            projection: self.projection,
        }
    }

    /// Overwrite time slice `t` with the contents of a single-slice grid.
    pub fn put_t_slice(&mut self, slice: &Grid<T>, t: usize) {
        assert_eq!(slice.nt, 1, "source must be a constant-time slice");
        assert_eq!(
            (slice.nx, slice.ny),
            (self.nx, self.ny),
            "slice dimensions must match"
        );
        assert!(t < self.nt, "time slice {t} out of range for nt = {}", self.nt);
        let nxy = self.nx * self.ny;
        let start = three_to_one(self.nx, self.ny, self.nt, 0, 0, t);
        self.data[start..start + nxy].copy_from_slice(&slice.data);
    }
}

impl<T: Default + Clone> Grid<T> {
    /// Zero-filled (default-filled) grid.
    pub fn new(nx: usize, ny: usize, nt: usize) -> Self {
        Self {
            data: vec![T::default(); nx * ny * nt],
            nx,
            ny,
            nt,
            projection: None,
        }
    }

    /// Reallocate to new dimensions and zero-fill. The projection is kept.
    pub fn set_size(&mut self, nx: usize, ny: usize, nt: usize) {
        self.data = vec![T::default(); nx * ny * nt];
        self.nx = nx;
        self.ny = ny;
        self.nt = nt;
    }

    pub fn clear(&mut self) {
        self.data = Vec::new();
        self.nx = 0;
        self.ny = 0;
        self.nt = 0;
        self.projection = None;
    }
}

/// Raw or derived floating point field.
pub type DataPlane = Grid<f64>;

impl Grid<f64> {
    /// Grid filled with the bad-data sentinel.
    pub fn new_bad(nx: usize, ny: usize, nt: usize) -> Self {
        Self {
            data: vec![BAD_DATA; nx * ny * nt],
            nx,
            ny,
            nt,
            projection: None,
        }
    }

    #[inline]
    pub fn is_bad(&self, x: usize, y: usize, t: usize) -> bool {
        is_bad_data(self.get(x, y, t))
    }

    /// Minimum and maximum over valid samples; `None` when every sample is bad.
    pub fn data_range(&self) -> Option<(f64, f64)> {
        self.data
            .iter()
            .copied()
            .filter(|v| !is_bad_data(*v))
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    pub fn n_valid(&self) -> usize {
        self.data.iter().filter(|v| !is_bad_data(**v)).count()
    }
}

impl<T> Index<(usize, usize, usize)> for Grid<T> {
    type Output = T;

    #[inline]
    fn index(&self, (x, y, t): (usize, usize, usize)) -> &Self::Output {
        &self.data[self.index_of(x, y, t)]
    }
}

impl<T> IndexMut<(usize, usize, usize)> for Grid<T> {
    #[inline]
    fn index_mut(&mut self, (x, y, t): (usize, usize, usize)) -> &mut Self::Output {
        let n = self.index_of(x, y, t);
        &mut self.data[n]
    }
}

impl<T> Index<usize> for Grid<T> {
    type Output = T;

    #[inline]
    fn index(&self, idx: usize) -> &Self::Output {
        &self.data[idx]
    }
}

impl<T> IndexMut<usize> for Grid<T> {
    #[inline]
    fn index_mut(&mut self, idx: usize) -> &mut Self::Output {
        &mut self.data[idx]
    }
}
