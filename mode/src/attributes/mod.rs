//! Per-object geometric and intensity attributes.
//!
//! One pass over the label grid collects the member cells of every object;
//! everything else is derived from those cells and the raw field:
//! moments, axis, boundary, convex hull, curvature, complexity and
//! intensity percentiles.


mod moments;
pub mod polyline;

use common::{BAD_DATA, is_bad_data};
use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::grid::DataPlane;
use crate::labeling::{BoundingBox, ObjectField};

pub use moments::Moments;

/// Intensity percentiles of the raw values inside an object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntensityStats {
    pub p10: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
    /// Percentile at the configured `inten_perc_value`.
    pub user: f64,
    pub user_perc: u32,
    pub sum: f64,
    pub n_valid: usize,
}

impl IntensityStats {
    fn compute(mut values: Vec<f64>, user_perc: u32) -> Self {
        values.retain(|v| !is_bad_data(*v));
        values.sort_unstable_by(|a, b| a.total_cmp(b));
        let p = |q: f64| percentile(&values, q);
        Self {
            p10: p(10.0),
            p25: p(25.0),
            p50: p(50.0),
            p75: p(75.0),
            p90: p(90.0),
            user: p(user_perc as f64),
            user_perc,
            sum: values.iter().sum(),
            n_valid: values.len(),
        }
    }
}

/// Linear-interpolated percentile of sorted values; bad data when empty.
pub fn percentile(sorted: &[f64], perc: f64) -> f64 {
    match sorted.len() {
        0 => BAD_DATA,
        1 => sorted[0],
        n => {
            let pos = (perc / 100.0).clamp(0.0, 1.0) * (n - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = (lo + 1).min(n - 1);
            sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
        }
    }
}

/// Attributes of one object (or cluster of objects).
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectAttributes {
    pub area: usize,
    pub centroid: DVec2,
    /// `(lat, lon)` of the centroid when the field carries a projection.
    pub centroid_latlon: Option<(f64, f64)>,
    pub bbox: BoundingBox,
    /// Major axis angle in degrees, in (-90, 90].
    pub axis_angle: f64,
    pub length: f64,
    pub width: f64,
    /// `width / length`, in (0, 1].
    pub aspect_ratio: f64,
    pub boundary: Vec<DVec2>,
    pub convex_hull: Vec<DVec2>,
    /// Inverse radius of the circle best fitting the boundary; 0 for straight shapes.
    pub curvature: f64,
    pub curvature_center: Option<DVec2>,
    /// `1 - area / hull area`.
    pub complexity: f64,
    pub intensity: IntensityStats,
    /// Member cells, sorted by `(y, x)`.
    cells: Vec<(usize, usize)>,
}

impl ObjectAttributes {
    /// Attributes of the object made of `cells` in single-slice `raw`.
    pub fn compute(cells: &[(usize, usize)], raw: &DataPlane, inten_perc_value: u32) -> Result<Self> {
        if cells.is_empty() {
            return Err(Error::EmptyObject {
                context: "object attributes",
            });
        }
        let mut cells = cells.to_vec();
        cells.sort_unstable_by_key(|&(x, y)| (y, x));
        cells.dedup();

        let mut moments = Moments::default();
        let mut bbox = BoundingBox {
            x_min: raw.nx(),
            x_max: 0,
            y_min: raw.ny(),
            y_max: 0,
            t_min: 0,
            t_max: 0,
        };
        let mut values = Vec::with_capacity(cells.len());
        for &(x, y) in &cells {
            moments.add(x as f64, y as f64, 0.0);
            bbox.x_min = bbox.x_min.min(x);
            bbox.x_max = bbox.x_max.max(x);
            bbox.y_min = bbox.y_min.min(y);
            bbox.y_max = bbox.y_max.max(y);
            values.push(raw.get(x, y, 0));
        }

        let centroid = moments.centroid_xy()?;
        let axis_angle = moments.axis_angle()?;
        let (length, width) = moments.axis_lengths()?;

        let boundary = polyline::outer_boundary(&cells);
        let convex_hull = polyline::convex_hull(&boundary);
        let hull_area = polyline::polygon_area(&convex_hull);
        let area = cells.len();
        let complexity = if hull_area > 0.0 {
            (1.0 - area as f64 / hull_area).max(0.0)
        } else {
            0.0
        };
        let circle = polyline::fit_circle(&boundary);

        Ok(Self {
            area,
            centroid,
            centroid_latlon: raw
                .projection()
                .map(|p| p.xy_to_latlon(centroid.x, centroid.y)),
            bbox,
            axis_angle,
            length,
            width,
            aspect_ratio: width / length,
            boundary,
            convex_hull,
            curvature: circle.map_or(0.0, |(_, r)| 1.0 / r),
            curvature_center: circle.map(|(c, _)| c),
            complexity,
            intensity: IntensityStats::compute(values, inten_perc_value),
            cells,
        })
    }

    /// Attributes of every object of a split single-slice field.
    pub fn compute_all(
        objects: &ObjectField,
        raw: &DataPlane,
        inten_perc_value: u32,
    ) -> Result<Vec<Self>> {
        if objects.dims() != raw.dims() {
            return Err(Error::DimensionMismatch {
                context: "object attributes",
                expected: objects.dims(),
                actual: raw.dims(),
            });
        }
        if objects.nt() != 1 {
            return Err(Error::NotConstTimeSlice {
                context: "object attributes",
                nt: objects.nt(),
            });
        }
        if !objects.is_split() {
            return Err(Error::NotSplit {
                context: "object attributes",
            });
        }

        object_cells(objects)
            .iter()
            .map(|cells| Self::compute(cells, raw, inten_perc_value))
            .collect()
    }

    /// Attributes of the union of several objects.
    pub fn compute_union(parts: &[&ObjectAttributes], raw: &DataPlane, inten_perc_value: u32) -> Result<Self> {
        let cells: Vec<(usize, usize)> = parts.iter().flat_map(|p| p.cells.iter().copied()).collect();
        Self::compute(&cells, raw, inten_perc_value)
    }

    pub fn cells(&self) -> &[(usize, usize)] {
        &self.cells
    }

    /// Number of cells shared with `other`.
    pub fn intersection_area(&self, other: &ObjectAttributes) -> usize {
        let key = |&(x, y): &(usize, usize)| (y, x);
        let (mut i, mut j, mut n) = (0, 0, 0);
        while i < self.cells.len() && j < other.cells.len() {
            match key(&self.cells[i]).cmp(&key(&other.cells[j])) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    n += 1;
                    i += 1;
                    j += 1;
                }
            }
        }
        n
    }

    pub fn union_area(&self, other: &ObjectAttributes) -> usize {
        self.area + other.area - self.intersection_area(other)
    }
}

/// Member cells of objects `1..=n_objects`, in one pass over the grid.
pub fn object_cells(objects: &ObjectField) -> Vec<Vec<(usize, usize)>> {
    let mut cells = vec![Vec::new(); objects.n_objects()];
    for y in 0..objects.ny() {
        for x in 0..objects.nx() {
            let k = objects.get(x, y, 0) as usize;
            if k != 0 {
                cells[k - 1].push((x, y));
            }
        }
    }
    cells
}
