//! Space-time object identification over fields with several time slices.
//!
//! Each side is convolved slice by slice, thresholded, labeled across time
//! with [`ObjectField::split`] and sifted by `min_volume`. No merging or
//! matching is done here.

use std::path::Path;

use glam::DVec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{Config, FieldConfig};
use crate::error::Result;
use crate::grid::DataPlane;
use crate::labeling::{BoundingBox, ObjectField};
use crate::matching::{mask_missing, prepare_raw};
use crate::neighborhood::convolve_circular;
use crate::object_file::{read_file, write_file};

/// Forecast and observation space-time objects on a shared grid.
#[derive(Debug, Clone, PartialEq)]
pub struct SpaceTimeObjects {
    pub fcst: ObjectField,
    pub obs: ObjectField,
}

/// One space-time object as written to the summary file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpaceTimeSummary {
    pub id: u32,
    pub volume: usize,
    /// `(x, y, t)` mean of the object's voxels.
    pub centroid: DVec3,
    pub bbox: BoundingBox,
}

/// Identify space-time objects in both fields.
///
/// Fails with [`crate::Error::NoObjectsLeft`] when `min_volume` discards
/// every object of a side that had some.
pub fn identify_space_time_objects(
    config: &Config,
    mut fcst: DataPlane,
    mut obs: DataPlane,
) -> Result<SpaceTimeObjects> {
    config.validate()?;
    fcst.check_same_grid(&obs, "space-time fields")?;
    mask_missing(config.mask_missing_flag, &mut fcst, &mut obs)?;

    let fcst = space_time_side(fcst, &config.fcst, config)?;
    let obs = space_time_side(obs, &config.obs, config)?;
    info!(
        n_fcst = fcst.n_objects(),
        n_obs = obs.n_objects(),
        nt = fcst.nt(),
        "Identified space-time objects"
    );
    Ok(SpaceTimeObjects { fcst, obs })
}

fn space_time_side(
    mut raw: DataPlane,
    field_config: &FieldConfig,
    config: &Config,
) -> Result<ObjectField> {
    let filtered = prepare_raw(&mut raw, field_config)?;
    let convolved = convolve_circular(&filtered, field_config.conv_radius, field_config.vld_thresh)?;

    let mut mask = ObjectField::from_threshold(&convolved, &field_config.conv_thresh);
    mask.set_radius(field_config.conv_radius);
    let mut objects = mask.split(config.zero_border, config.connectivity)?;
    let n_split = objects.n_objects();

    if let Some(min_volume) = field_config.min_volume {
        objects.toss_small_objects(min_volume)?;
    }
    debug!(
        field = %field_config.name,
        n_split,
        n_kept = objects.n_objects(),
        min_volume = ?field_config.min_volume,
        "Sifted space-time objects"
    );
    Ok(objects)
}

/// Volume, centroid and bounding box of every object in a split field.
pub fn summarize(objects: &ObjectField) -> Result<Vec<SpaceTimeSummary>> {
    (1..=objects.n_objects() as u32)
        .map(|id| {
            let object = objects.select(id);
            Ok(SpaceTimeSummary {
                id,
                volume: objects.volume(id as usize - 1)?,
                centroid: object.calc_centroid()?,
                bbox: object.calc_bbox()?,
            })
        })
        .collect()
}

pub fn write_summary(summary: &[SpaceTimeSummary], path: &Path) -> Result<()> {
    write_file(&summary, path)
}

pub fn read_summary(path: &Path) -> Result<Vec<SpaceTimeSummary>> {
    read_file(path)
}
