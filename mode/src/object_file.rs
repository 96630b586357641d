//! On-disk records for input fields, object fields and engine results.
//!
//! Every file is YAML or JSON, chosen by extension through
//! [`common::FileFormat`].

use std::path::Path;

use common::{BAD_DATA, FileFormat};
use glam::DVec2;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::attributes::{IntensityStats, ObjectAttributes};
use crate::error::{Error, Result};
use crate::grid::{DataPlane, Grid, LatLonProjection};
use crate::labeling::{BoundingBox, ObjectField, tally_volumes};
use crate::matching::{ContingencyTables, Engine, EngineState, FieldObjects, MatchedPair, PairInterest};

// ============================================================================
// File helpers
// ============================================================================

fn file_format(path: &Path) -> Result<FileFormat> {
    FileFormat::from_path(path).map_err(|e| Error::Format {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

pub(crate) fn write_file<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let format = file_format(path)?;
    let text = common::serialize(value, format).map_err(|e| Error::Format {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    std::fs::write(path, text).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "Wrote file");
    Ok(())
}

pub(crate) fn read_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let format = file_format(path)?;
    let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    common::deserialize(&text, format).map_err(|e| Error::Format {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

// ============================================================================
// Input fields
// ============================================================================

/// A gridded input field with one or more time slices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRecord {
    pub name: String,
    #[serde(default)]
    pub valid_time: Option<String>,
    pub nx: usize,
    pub ny: usize,
    #[serde(default = "single_slice")]
    pub nt: usize,
    #[serde(default)]
    pub projection: Option<LatLonProjection>,
    /// Values in `x + nx * (y + ny * t)` order; `-9999` marks missing data.
    pub data: Vec<f64>,
}

fn single_slice() -> usize {
    1
}

impl FieldRecord {
    pub fn from_data_plane(name: impl Into<String>, field: &DataPlane) -> Self {
        Self {
            name: name.into(),
            valid_time: None,
            nx: field.nx(),
            ny: field.ny(),
            nt: field.nt(),
            projection: field.projection().copied(),
            data: field.data().to_vec(),
        }
    }

    pub fn into_data_plane(self) -> Result<DataPlane> {
        if self.nt == 0 || self.data.len() != self.nx * self.ny * self.nt {
            return Err(Error::DimensionMismatch {
                context: "field record",
                expected: (self.nx, self.ny, self.nt),
                actual: (self.data.len(), 1, 1),
            });
        }
        Ok(Grid::from_vec(self.nx, self.ny, self.nt, self.data).with_projection(self.projection))
    }

    pub fn read(path: &Path) -> Result<Self> {
        read_file(path)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        write_file(self, path)
    }
}

// ============================================================================
// Object fields
// ============================================================================

/// Serialized form of an [`ObjectField`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectFieldRecord {
    pub nx: usize,
    pub ny: usize,
    pub nt: usize,
    /// Labels in `x + nx * (y + ny * t)` order.
    pub labels: Vec<u32>,
    /// Per-object volumes; absent for unsplit fields.
    pub volumes: Option<Vec<usize>>,
    pub radius: Option<usize>,
    pub threshold: Option<f64>,
    pub data_min: u32,
    pub data_max: u32,
}

impl ObjectField {
    pub fn to_record(&self) -> ObjectFieldRecord {
        let (nx, ny, nt) = self.dims();
        ObjectFieldRecord {
            nx,
            ny,
            nt,
            labels: self.labels().data().to_vec(),
            volumes: self.volumes().map(<[usize]>::to_vec),
            radius: self.radius(),
            threshold: self.threshold(),
            data_min: self.data_min(),
            data_max: self.data_max(),
        }
    }

    pub fn from_record(record: ObjectFieldRecord) -> Result<Self> {
        let ObjectFieldRecord {
            nx,
            ny,
            nt,
            labels,
            volumes,
            radius,
            threshold,
            data_min,
            data_max,
        } = record;

        if labels.len() != nx * ny * nt {
            return Err(Error::DimensionMismatch {
                context: "object record labels",
                expected: (nx, ny, nt),
                actual: (labels.len(), 1, 1),
            });
        }
        let labels = Grid::from_vec(nx, ny, nt, labels);

        let mut field = match volumes {
            Some(volumes) => {
                let max_label = labels.data().iter().copied().max().unwrap_or(0) as usize;
                if max_label > volumes.len() {
                    return Err(Error::DimensionMismatch {
                        context: "object record volumes",
                        expected: (max_label, 1, 1),
                        actual: (volumes.len(), 1, 1),
                    });
                }
                let tallied = tally_volumes(labels.data(), volumes.len());
                if let Some(k) = (0..volumes.len()).find(|&k| tallied[k] != volumes[k]) {
                    return Err(Error::DimensionMismatch {
                        context: "object record volumes",
                        expected: (tallied[k], 1, 1),
                        actual: (volumes[k], 1, 1),
                    });
                }
                let mut field = ObjectField::new(nx, ny, nt);
                field.set_split(labels, volumes.len(), volumes);
                field
            }
            None => ObjectField::from_labels(labels),
        };

        if let Some(radius) = radius {
            field.set_radius(radius);
        }
        if let Some(threshold) = threshold {
            field.set_threshold(threshold);
        }
        field.set_data_minmax(data_min, data_max);
        Ok(field)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        write_file(&self.to_record(), path)
    }

    pub fn read(path: &Path) -> Result<Self> {
        Self::from_record(read_file(path)?)
    }
}

// ============================================================================
// Engine results
// ============================================================================

/// Per-object attributes as written to the result file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSummary {
    pub id: u32,
    pub area: usize,
    pub centroid: DVec2,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub centroid_latlon: Option<(f64, f64)>,
    pub bbox: BoundingBox,
    pub axis_angle: f64,
    pub length: f64,
    pub width: f64,
    pub aspect_ratio: f64,
    pub curvature: f64,
    pub complexity: f64,
    pub intensity: IntensityStats,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub boundary: Option<Vec<DVec2>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub convex_hull: Option<Vec<DVec2>>,
}

impl ObjectSummary {
    fn new(id: u32, attr: &ObjectAttributes, do_latlon: bool, do_polylines: bool) -> Self {
        Self {
            id,
            area: attr.area,
            centroid: attr.centroid,
            centroid_latlon: attr.centroid_latlon.filter(|_| do_latlon),
            bbox: attr.bbox,
            axis_angle: attr.axis_angle,
            length: attr.length,
            width: attr.width,
            aspect_ratio: attr.aspect_ratio,
            curvature: attr.curvature,
            complexity: attr.complexity,
            intensity: attr.intensity,
            boundary: do_polylines.then(|| attr.boundary.clone()),
            convex_hull: do_polylines.then(|| attr.convex_hull.clone()),
        }
    }
}

/// Objects and optional derived grids of one side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldOutput {
    pub name: String,
    pub n_objects: usize,
    pub n_clusters: usize,
    pub objects: Vec<ObjectSummary>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub lat: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub lon: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub raw: Option<Vec<f64>>,
    /// Raw values inside objects, bad data elsewhere.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub object_raw: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub object_id: Option<Vec<u32>>,
    /// Matched pair number (1-based) of each cell, 0 when unmatched.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub cluster_id: Option<Vec<u32>>,
}

/// Everything a finished engine run reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineOutput {
    pub model: String,
    pub obtype: String,
    pub desc: String,
    pub fcst: FieldOutput,
    pub obs: FieldOutput,
    /// Scored pairs at or above `print_interest_thresh`.
    pub pairs: Vec<PairInterest>,
    pub matches: Vec<MatchedPair>,
    pub unmatched_fcst: Vec<u32>,
    pub unmatched_obs: Vec<u32>,
    pub contingency: ContingencyTables,
}

impl EngineOutput {
    /// Collect the results of an engine that has finished matching.
    pub fn from_engine(engine: &Engine) -> Result<Self> {
        if engine.state() != EngineState::Matched {
            return Err(Error::InvalidState {
                requested: "output",
                current: engine.state().to_string(),
            });
        }
        let config = engine.config();

        Ok(Self {
            model: config.model.clone(),
            obtype: config.obtype.clone(),
            desc: config.desc.clone(),
            fcst: field_output(engine, true),
            obs: field_output(engine, false),
            pairs: engine
                .pairs()
                .iter()
                .filter(|p| p.total >= config.print_interest_thresh)
                .cloned()
                .collect(),
            matches: engine.matches().to_vec(),
            unmatched_fcst: engine.unmatched_fcst().to_vec(),
            unmatched_obs: engine.unmatched_obs().to_vec(),
            contingency: *engine.contingency(),
        })
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        write_file(self, path)
    }

    pub fn read(path: &Path) -> Result<Self> {
        read_file(path)
    }
}

fn field_output(engine: &Engine, fcst: bool) -> FieldOutput {
    let flags = engine.config().output;
    let (side, name): (&FieldObjects, &str) = if fcst {
        (engine.fcst(), engine.config().fcst.name.as_str())
    } else {
        (engine.obs(), engine.config().obs.name.as_str())
    };
    let labels = side.objects.labels();

    let (lat, lon) = match side.raw.projection().filter(|_| flags.do_latlon) {
        Some(projection) => {
            let (nx, ny) = (side.raw.nx(), side.raw.ny());
            let (lat, lon): (Vec<f64>, Vec<f64>) = (0..nx * ny)
                .map(|i| projection.xy_to_latlon((i % nx) as f64, (i / nx) as f64))
                .unzip();
            (Some(lat), Some(lon))
        }
        None => (None, None),
    };

    FieldOutput {
        name: name.to_string(),
        n_objects: side.n_objects(),
        n_clusters: side.clusters.n_clusters(),
        objects: side
            .attributes
            .iter()
            .enumerate()
            .map(|(k, attr)| {
                ObjectSummary::new(k as u32 + 1, attr, flags.do_latlon, flags.do_polylines)
            })
            .collect(),
        lat,
        lon,
        raw: flags.do_raw.then(|| side.raw.data().to_vec()),
        object_raw: flags.do_object_raw.then(|| {
            side.raw
                .data()
                .iter()
                .zip(labels.data())
                .map(|(&v, &k)| if k == 0 { BAD_DATA } else { v })
                .collect()
        }),
        object_id: flags.do_object_id.then(|| labels.data().to_vec()),
        cluster_id: flags
            .do_cluster_id
            .then(|| engine.cluster_ids(fcst).into_vec()),
    }
}
