//! Object fields and connected component labeling.
//!
//! An [`ObjectField`] is a label grid (`0` = background) plus the bookkeeping
//! needed by later stages: object count, per-object volumes once the field
//! has been split, and the convolution radius, threshold and data range it
//! came from.
//!
//! Labeling is a single causal raster pass per time slice. Provisional
//! labels that turn out to touch are recorded in a [`Partition`] and
//! remapped to `class + 1` afterwards, so final numbers follow scan order.


mod temporal;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::attributes::Moments;
use crate::config::Connectivity;
use crate::error::{Error, Result};
use crate::grid::{DataPlane, Grid};
use crate::partition::Partition;
use crate::threshold::Threshold;

pub use temporal::{adjust_obj_numbers, find_overlap};

/// Inclusive bounding box of the non-zero voxels of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x_min: usize,
    pub x_max: usize,
    pub y_min: usize,
    pub y_max: usize,
    pub t_min: usize,
    pub t_max: usize,
}

/// Label grid with object bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectField {
    labels: Grid<u32>,
    n_objects: usize,
    /// Present only after the field has been split.
    volumes: Option<Vec<usize>>,
    radius: Option<usize>,
    threshold: Option<f64>,
    data_min: u32,
    data_max: u32,
}

impl ObjectField {
    /// All-zero field.
    pub fn new(nx: usize, ny: usize, nt: usize) -> Self {
        Self::from_labels(Grid::new(nx, ny, nt))
    }

    /// Wrap an existing label grid. The field counts as unsplit.
    pub fn from_labels(labels: Grid<u32>) -> Self {
        let mut field = Self {
            labels,
            n_objects: 0,
            volumes: None,
            radius: None,
            threshold: None,
            data_min: 0,
            data_max: 0,
        };
        field.calc_data_minmax();
        field
    }

    /// Binary mask: `1` where `thresh` passes, `0` elsewhere (bad data included).
    pub fn from_threshold(field: &DataPlane, thresh: &Threshold) -> Self {
        let labels = field.map(|&v| u32::from(thresh.check(v)));
        let mut mask = Self::from_labels(labels);
        mask.threshold = Some(thresh.value);
        mask
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    pub fn labels(&self) -> &Grid<u32> {
        &self.labels
    }

    #[inline]
    pub fn nx(&self) -> usize {
        self.labels.nx()
    }

    #[inline]
    pub fn ny(&self) -> usize {
        self.labels.ny()
    }

    #[inline]
    pub fn nt(&self) -> usize {
        self.labels.nt()
    }

    #[inline]
    pub fn dims(&self) -> (usize, usize, usize) {
        self.labels.dims()
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize, t: usize) -> u32 {
        self.labels.get(x, y, t)
    }

    /// Set one voxel. Any per-object bookkeeping is invalidated.
    pub fn put(&mut self, value: u32, x: usize, y: usize, t: usize) {
        self.labels.put(value, x, y, t);
        self.volumes = None;
    }

    #[inline]
    pub fn n_objects(&self) -> usize {
        self.n_objects
    }

    #[inline]
    pub fn is_split(&self) -> bool {
        self.volumes.is_some()
    }

    pub fn volumes(&self) -> Option<&[usize]> {
        self.volumes.as_deref()
    }

    pub fn radius(&self) -> Option<usize> {
        self.radius
    }

    pub fn set_radius(&mut self, radius: usize) {
        self.radius = Some(radius);
    }

    pub fn threshold(&self) -> Option<f64> {
        self.threshold
    }

    pub fn set_threshold(&mut self, threshold: f64) {
        self.threshold = Some(threshold);
    }

    pub fn data_min(&self) -> u32 {
        self.data_min
    }

    pub fn data_max(&self) -> u32 {
        self.data_max
    }

    pub fn set_data_minmax(&mut self, data_min: u32, data_max: u32) {
        self.data_min = data_min;
        self.data_max = data_max;
    }

    pub fn calc_data_minmax(&mut self) {
        let data = self.labels.data();
        self.data_min = data.iter().copied().min().unwrap_or(0);
        self.data_max = data.iter().copied().max().unwrap_or(0);
    }

    /// Number of non-zero voxels.
    pub fn count_nonzero(&self) -> usize {
        self.labels.data().iter().filter(|&&v| v != 0).count()
    }

    pub(crate) fn set_split(&mut self, labels: Grid<u32>, n_objects: usize, volumes: Vec<usize>) {
        debug_assert_eq!(volumes.len(), n_objects);
        self.labels = labels;
        self.n_objects = n_objects;
        self.volumes = Some(volumes);
        self.data_min = 0;
        self.data_max = n_objects as u32;
    }

    // ========================================================================
    // Whole-field edits
    // ========================================================================

    /// Zero every voxel and drop the object bookkeeping.
    pub fn set_to_zeroes(&mut self) {
        self.labels.set_constant(0);
        self.n_objects = 0;
        self.volumes = None;
        self.data_min = 0;
        self.data_max = 0;
    }

    /// Zero an `n`-wide frame around every time slice.
    pub fn zero_border(&mut self, n: usize) -> Result<()> {
        let (nx, ny, nt) = self.dims();
        if 2 * n >= nx.min(ny) {
            return Err(Error::BorderTooLarge { border: n, nx, ny });
        }
        if n == 0 {
            return Ok(());
        }
        for t in 0..nt {
            for y in 0..ny {
                for x in 0..nx {
                    let on_frame = x < n || x >= nx - n || y < n || y >= ny - n;
                    if on_frame {
                        self.labels.put(0, x, y, t);
                    }
                }
            }
        }
        if self.volumes.is_some() {
            self.recount_volumes();
        }
        Ok(())
    }

    /// Grow each on-cell into its `(x+1, y)`, `(x, y+1)` and `(x+1, y+1)` neighbours.
    pub fn fatten(&mut self) -> Result<()> {
        self.require_const_t("fatten")?;
        let (nx, ny, _) = self.dims();
        let before = self.labels.clone();
        for y in 0..ny {
            for x in 0..nx {
                if before.get(x, y, 0) == 0 {
                    continue;
                }
                if x + 1 < nx {
                    self.labels.put(1, x + 1, y, 0);
                }
                if y + 1 < ny {
                    self.labels.put(1, x, y + 1, 0);
                }
                if x + 1 < nx && y + 1 < ny {
                    self.labels.put(1, x + 1, y + 1, 0);
                }
            }
        }
        self.volumes = None;
        self.calc_data_minmax();
        Ok(())
    }

    /// Binary field holding only object `n` (1-based).
    pub fn select(&self, n: u32) -> ObjectField {
        assert!(
            n >= 1 && n as usize <= self.n_objects,
            "object {n} out of range 1..={}",
            self.n_objects
        );
        let labels = self.labels.map(|&v| u32::from(v == n));
        let volume = labels.data().iter().filter(|&&v| v != 0).count();
        ObjectField {
            labels,
            n_objects: 1,
            volumes: Some(vec![volume]),
            radius: self.radius,
            threshold: self.threshold,
            data_min: 0,
            data_max: 1,
        }
    }

    /// Single-slice copy of time slice `t`, unsplit.
    pub fn const_t_slice(&self, t: usize) -> ObjectField {
        let mut slice = Self::from_labels(self.labels.const_t_slice(t));
        slice.radius = self.radius;
        slice.threshold = self.threshold;
        slice
    }

    // ========================================================================
    // Labeling
    // ========================================================================

    /// Label the connected regions of a single time slice.
    ///
    /// Returns the labeled field (split, with volumes) and the shape count.
    pub fn split_const_t(&self, connectivity: Connectivity) -> Result<(ObjectField, usize)> {
        self.require_const_t("split_const_t")?;
        let (nx, ny, _) = self.dims();
        let (labels, n_shapes) = label_slice(self.labels.data(), nx, ny, connectivity);

        let mut out = self.clone();
        let labels = Grid::from_vec(nx, ny, 1, labels).with_projection(self.labels.projection().copied());
        let volumes = tally_volumes(labels.data(), n_shapes);
        out.set_split(labels, n_shapes, volumes);
        Ok((out, n_shapes))
    }

    // ========================================================================
    // Geometry
    // ========================================================================

    /// Moments of all non-zero voxels.
    pub fn calc_moments(&self) -> Moments {
        let (nx, ny, nt) = self.dims();
        let mut m = Moments::default();
        for t in 0..nt {
            for y in 0..ny {
                for x in 0..nx {
                    if self.labels.get(x, y, t) != 0 {
                        m.add(x as f64, y as f64, t as f64);
                    }
                }
            }
        }
        m
    }

    pub fn calc_centroid(&self) -> Result<DVec3> {
        self.calc_moments().centroid()
    }

    /// Bounding box of the non-zero voxels.
    pub fn calc_bbox(&self) -> Result<BoundingBox> {
        let (nx, ny, nt) = self.dims();
        let mut bbox = BoundingBox {
            x_min: nx.saturating_sub(1),
            x_max: 0,
            y_min: ny.saturating_sub(1),
            y_max: 0,
            t_min: nt.saturating_sub(1),
            t_max: 0,
        };
        let mut found = false;
        for t in 0..nt {
            for y in 0..ny {
                for x in 0..nx {
                    if self.labels.get(x, y, t) == 0 {
                        continue;
                    }
                    found = true;
                    bbox.x_min = bbox.x_min.min(x);
                    bbox.x_max = bbox.x_max.max(x);
                    bbox.y_min = bbox.y_min.min(y);
                    bbox.y_max = bbox.y_max.max(y);
                    bbox.t_min = bbox.t_min.min(t);
                    bbox.t_max = bbox.t_max.max(t);
                }
            }
        }
        if !found {
            return Err(Error::EmptyObject {
                context: "calc_bbox",
            });
        }
        Ok(bbox)
    }

    fn require_const_t(&self, context: &'static str) -> Result<()> {
        if self.nt() != 1 {
            return Err(Error::NotConstTimeSlice {
                context,
                nt: self.nt(),
            });
        }
        Ok(())
    }

    fn recount_volumes(&mut self) {
        self.volumes = Some(tally_volumes(self.labels.data(), self.n_objects));
    }
}

/// Voxel count per label `1..=n_objects`.
pub(crate) fn tally_volumes(labels: &[u32], n_objects: usize) -> Vec<usize> {
    let mut volumes = vec![0usize; n_objects];
    for &v in labels {
        if v != 0 {
            volumes[v as usize - 1] += 1;
        }
    }
    volumes
}

/// Label one `nx * ny` slice of a mask. Any non-zero voxel is "on".
///
/// Scans from the top row down and right to left, so the causal neighbours
/// of `(x, y)` are `(x-1, y+1)`, `(x, y+1)`, `(x+1, y+1)` and `(x+1, y)`.
/// Returns compact labels `1..=n_shapes` and `n_shapes`.
pub(crate) fn label_slice(
    mask: &[u32],
    nx: usize,
    ny: usize,
    connectivity: Connectivity,
) -> (Vec<u32>, usize) {
    debug_assert_eq!(mask.len(), nx * ny);
    let mut provisional = vec![0u32; nx * ny];
    let mut partition = Partition::new();
    let mut next_label = 0u32;

    for y in (0..ny).rev() {
        for x in (0..nx).rev() {
            let n = x + nx * y;
            if mask[n] == 0 {
                continue;
            }

            let mut current = 0u32;
            let mut visit = |label: u32, partition: &mut Partition| {
                if label == 0 {
                    return;
                }
                if current == 0 {
                    current = label;
                } else {
                    partition.merge_values(current, label);
                }
            };

            let has_above = y + 1 < ny;
            if has_above {
                let above = n + nx;
                if connectivity == Connectivity::Eight && x > 0 {
                    visit(provisional[above - 1], &mut partition);
                }
                visit(provisional[above], &mut partition);
                if connectivity == Connectivity::Eight && x + 1 < nx {
                    visit(provisional[above + 1], &mut partition);
                }
            }
            if x + 1 < nx {
                visit(provisional[n + 1], &mut partition);
            }

            if current == 0 {
                next_label += 1;
                current = next_label;
                partition.add_no_repeat(current);
            }
            provisional[n] = current;
        }
    }

    for label in provisional.iter_mut().filter(|l| **l != 0) {
        // Every provisional label was registered when it was created.
        if let Some(class) = partition.which_class(*label) {
            *label = class as u32 + 1;
        }
    }

    (provisional, partition.n_elements())
}
