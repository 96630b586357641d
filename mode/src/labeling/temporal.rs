//! Linking per-slice labelings into space-time objects, and object sifting.

use tracing::debug;

use super::{ObjectField, label_slice, tally_volumes};
use crate::config::Connectivity;
use crate::error::{Error, Result};
use crate::grid::Grid;
use crate::partition::Partition;

/// Shift every non-zero label by `delta`.
pub fn adjust_obj_numbers(labels: &mut [u32], delta: u32) {
    if delta == 0 {
        return;
    }
    for v in labels.iter_mut().filter(|v| **v != 0) {
        *v += delta;
    }
}

/// Merge every pair of labels that share an `(x, y)` position in two slices.
pub fn find_overlap(before: &[u32], after: &[u32], partition: &mut Partition) {
    debug_assert_eq!(before.len(), after.len());
    for (&a, &b) in before.iter().zip(after) {
        if a != 0 && b != 0 {
            partition.merge_values(a, b);
        }
    }
}

impl ObjectField {
    /// Label the whole space-time volume.
    ///
    /// Each slice is labeled on its own after zeroing a `border`-wide frame,
    /// shifted so numbers are unique across time, and objects that overlap
    /// in consecutive slices are unified.
    pub fn split(&self, border: usize, connectivity: Connectivity) -> Result<ObjectField> {
        let mut mask = self.clone();
        mask.zero_border(border)?;

        let (nx, ny, nt) = mask.dims();
        let nxy = nx * ny;
        let mut partition = Partition::new();
        let mut slices: Vec<Vec<u32>> = Vec::with_capacity(nt);
        let mut n_so_far = 0u32;

        for t in 0..nt {
            let mask_slice = &mask.labels.data()[t * nxy..(t + 1) * nxy];
            let (mut labels, n_shapes) = label_slice(mask_slice, nx, ny, connectivity);
            adjust_obj_numbers(&mut labels, n_so_far);
            for k in 1..=n_shapes as u32 {
                partition.add_no_repeat(n_so_far + k);
            }
            if let Some(prev) = slices.last() {
                find_overlap(prev, &labels, &mut partition);
            }
            n_so_far += n_shapes as u32;
            slices.push(labels);
        }

        let mut data = Vec::with_capacity(nxy * nt);
        for labels in &slices {
            data.extend(labels.iter().map(|&l| match l {
                0 => 0,
                l => partition.which_class(l).map_or(0, |c| c as u32 + 1),
            }));
        }

        let n_objects = partition.n_elements();
        let labels = Grid::from_vec(nx, ny, nt, data)
            .with_projection(mask.labels.projection().copied());
        let volumes = tally_volumes(labels.data(), n_objects);
        debug!(
            n_objects,
            n_provisional = n_so_far,
            nt,
            "Split object field"
        );

        mask.set_split(labels, n_objects, volumes);
        Ok(mask)
    }

    /// Volume of object `k + 1`.
    pub fn volume(&self, k: usize) -> Result<usize> {
        let volumes = self.volumes.as_ref().ok_or(Error::NotSplit { context: "volume" })?;
        assert!(
            k < self.n_objects,
            "object index {k} out of range for {} objects",
            self.n_objects
        );
        Ok(volumes[k])
    }

    pub fn total_volume(&self) -> Result<usize> {
        let volumes = self.volumes.as_ref().ok_or(Error::NotSplit {
            context: "total_volume",
        })?;
        Ok(volumes.iter().sum())
    }

    /// Discard objects smaller than `min_volume` voxels.
    pub fn toss_small_objects(&mut self, min_volume: usize) -> Result<()> {
        let volumes = self.volumes.as_ref().ok_or(Error::NotSplit {
            context: "toss_small_objects",
        })?;
        let keep: Vec<usize> = volumes
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v >= min_volume)
            .map(|(k, _)| k)
            .collect();
        self.sift_objects(&keep)
    }

    /// Keep only the objects listed in `new_to_old` (0-based old indices, in
    /// increasing order) and renumber them `1..=new_to_old.len()`.
    pub fn sift_objects(&mut self, new_to_old: &[usize]) -> Result<()> {
        let volumes = self.volumes.as_ref().ok_or(Error::NotSplit {
            context: "sift_objects",
        })?;
        let n_old = self.n_objects;
        let n_new = new_to_old.len();
        assert!(
            new_to_old.windows(2).all(|w| w[0] < w[1]),
            "new_to_old must be strictly increasing"
        );
        if n_new == n_old {
            return Ok(());
        }
        if n_new == 0 {
            return Err(Error::NoObjectsLeft { n_objects: n_old });
        }

        let mut old_to_new = vec![0u32; n_old];
        for (j, &old) in new_to_old.iter().enumerate() {
            assert!(old < n_old, "object index {old} out of range for {n_old} objects");
            old_to_new[old] = j as u32 + 1;
        }
        let new_volumes: Vec<usize> = new_to_old.iter().map(|&old| volumes[old]).collect();

        for v in self.labels.data_mut().iter_mut().filter(|v| **v != 0) {
            *v = old_to_new[*v as usize - 1];
        }

        debug!(n_old, n_new, "Sifted objects");
        self.n_objects = n_new;
        self.volumes = Some(new_volumes);
        self.data_min = 0;
        self.data_max = n_new as u32;
        Ok(())
    }
}
