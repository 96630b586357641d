//! Configuration types for object identification and matching.
//!
//! This module defines the flat [`Config`] struct and associated enums used by
//! the verification engine. Defaults follow the standard MODE configuration
//! for a 4 km grid; [`Config::for_grid_res`] rescales every distance setting
//! for other grid spacings.

use std::path::Path;

use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use strum_macros::{Display, EnumIter};

use crate::error::{Error, Result};
use crate::matching::PiecewiseLinear;
use crate::threshold::Threshold;

// ============================================================================
// Enums
// ============================================================================

/// Cell connectivity for connected component labeling.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Connectivity {
    /// Only horizontal and vertical neighbors touch.
    Four,
    /// Diagonal neighbors touch as well.
    #[default]
    Eight,
}

/// How simple objects within one field are combined into clusters.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MergeType {
    None,
    /// Double-threshold merging using `merge_thresh`.
    #[default]
    Thresh,
    /// Fuzzy-engine self-matching of the field against itself.
    Engine,
    Both,
}

impl MergeType {
    pub fn uses_thresh(self) -> bool {
        matches!(self, MergeType::Thresh | MergeType::Both)
    }

    pub fn uses_engine(self) -> bool {
        matches!(self, MergeType::Engine | MergeType::Both)
    }
}

/// How forecast objects are matched to observation objects.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MatchType {
    None,
    /// Greedy one-to-one matching by descending interest.
    NoMerge,
    /// Each forecast object goes to its best observation cluster.
    MergeFcst,
    /// Every pair above threshold links; clusters are the connected components.
    #[default]
    MergeBoth,
}

/// Which field gets bad data copied over from the other one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MaskMissing {
    #[default]
    None,
    Fcst,
    Obs,
    Both,
}

/// Object pair attribute scored by the fuzzy engine.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InterestAttribute {
    CentroidDist,
    BoundaryDist,
    ConvexHullDist,
    AngleDiff,
    AspectDiff,
    AreaRatio,
    IntAreaRatio,
    CurvatureRatio,
    ComplexityRatio,
    IntenPercRatio,
}

// ============================================================================
// Per-field settings
// ============================================================================

/// Settings applied to one side (forecast or observation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Field name used in log messages and output.
    pub name: String,
    /// Raw values failing this threshold are zeroed before convolution.
    pub raw_thresh: Option<Threshold>,
    /// Convolution radius in grid squares.
    pub conv_radius: usize,
    /// Threshold applied to the convolved field to define objects.
    pub conv_thresh: Threshold,
    /// Minimum fraction of valid points in the convolution disk.
    pub vld_thresh: f64,
    /// Objects whose area fails this threshold are discarded.
    pub area_thresh: Option<Threshold>,
    /// Objects whose `inten_perc_value` percentile fails this threshold are discarded.
    pub inten_perc_thresh: Option<Threshold>,
    /// Looser convolution threshold for double-threshold merging.
    pub merge_thresh: Option<Threshold>,
    pub merge_flag: MergeType,
    /// Space-time objects smaller than this many voxels are discarded.
    pub min_volume: Option<usize>,
    /// Probability field; values in percent are rescaled to [0, 1].
    pub is_prob: bool,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            raw_thresh: None,
            conv_radius: 15,
            conv_thresh: Threshold::ge(5.0),
            vld_thresh: 0.5,
            area_thresh: None,
            inten_perc_thresh: None,
            merge_thresh: Some(Threshold::ge(1.25)),
            merge_flag: MergeType::Thresh,
            min_volume: None,
            is_prob: false,
        }
    }
}

impl FieldConfig {
    fn validate(&self, side: &str) -> Result<()> {
        if !(0.0..=1.0).contains(&self.vld_thresh) {
            return Err(Error::config(
                format!("{side}.vld_thresh"),
                format!("must be in [0, 1], got {}", self.vld_thresh),
            ));
        }
        if self.merge_flag.uses_thresh() && self.merge_thresh.is_none() {
            return Err(Error::config(
                format!("{side}.merge_thresh"),
                format!("required when merge_flag is '{}'", self.merge_flag),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Weights and interest functions
// ============================================================================

/// Relative weight of each attribute in the total interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterestWeights {
    pub centroid_dist: f64,
    pub boundary_dist: f64,
    pub convex_hull_dist: f64,
    pub angle_diff: f64,
    pub aspect_diff: f64,
    pub area_ratio: f64,
    pub int_area_ratio: f64,
    pub curvature_ratio: f64,
    pub complexity_ratio: f64,
    pub inten_perc_ratio: f64,
}

impl Default for InterestWeights {
    fn default() -> Self {
        Self {
            centroid_dist: 2.0,
            boundary_dist: 4.0,
            convex_hull_dist: 0.0,
            angle_diff: 1.0,
            aspect_diff: 0.0,
            area_ratio: 1.0,
            int_area_ratio: 2.0,
            curvature_ratio: 0.0,
            complexity_ratio: 0.0,
            inten_perc_ratio: 0.0,
        }
    }
}

impl InterestWeights {
    pub fn get(&self, attr: InterestAttribute) -> f64 {
        match attr {
            InterestAttribute::CentroidDist => self.centroid_dist,
            InterestAttribute::BoundaryDist => self.boundary_dist,
            InterestAttribute::ConvexHullDist => self.convex_hull_dist,
            InterestAttribute::AngleDiff => self.angle_diff,
            InterestAttribute::AspectDiff => self.aspect_diff,
            InterestAttribute::AreaRatio => self.area_ratio,
            InterestAttribute::IntAreaRatio => self.int_area_ratio,
            InterestAttribute::CurvatureRatio => self.curvature_ratio,
            InterestAttribute::ComplexityRatio => self.complexity_ratio,
            InterestAttribute::IntenPercRatio => self.inten_perc_ratio,
        }
    }
}

/// Interest function for each attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterestFunctions {
    pub centroid_dist: PiecewiseLinear,
    pub boundary_dist: PiecewiseLinear,
    pub convex_hull_dist: PiecewiseLinear,
    pub angle_diff: PiecewiseLinear,
    pub aspect_diff: PiecewiseLinear,
    pub area_ratio: PiecewiseLinear,
    pub int_area_ratio: PiecewiseLinear,
    pub curvature_ratio: PiecewiseLinear,
    pub complexity_ratio: PiecewiseLinear,
    pub inten_perc_ratio: PiecewiseLinear,
}

impl Default for InterestFunctions {
    fn default() -> Self {
        Self::for_grid_res(DEFAULT_GRID_RES)
    }
}

impl InterestFunctions {
    /// Standard functions with distance breakpoints expressed in grid squares.
    pub fn for_grid_res(grid_res: f64) -> Self {
        let ratio = || pl(vec![(0.0, 0.0), (0.8, 1.0), (1.0, 1.0)]);
        Self {
            centroid_dist: pl(vec![
                (0.0, 1.0),
                (60.0 / grid_res, 1.0),
                (600.0 / grid_res, 0.0),
            ]),
            boundary_dist: pl(vec![(0.0, 1.0), (400.0 / grid_res, 0.0)]),
            convex_hull_dist: pl(vec![(0.0, 1.0), (400.0 / grid_res, 0.0)]),
            angle_diff: pl(vec![(0.0, 1.0), (30.0, 1.0), (90.0, 0.0)]),
            aspect_diff: pl(vec![(0.0, 1.0), (1.0, 0.0)]),
            area_ratio: ratio(),
            int_area_ratio: pl(vec![(0.0, 0.0), (0.1, 0.5), (0.25, 1.0), (1.0, 1.0)]),
            curvature_ratio: ratio(),
            complexity_ratio: ratio(),
            inten_perc_ratio: ratio(),
        }
    }

    pub fn get(&self, attr: InterestAttribute) -> &PiecewiseLinear {
        match attr {
            InterestAttribute::CentroidDist => &self.centroid_dist,
            InterestAttribute::BoundaryDist => &self.boundary_dist,
            InterestAttribute::ConvexHullDist => &self.convex_hull_dist,
            InterestAttribute::AngleDiff => &self.angle_diff,
            InterestAttribute::AspectDiff => &self.aspect_diff,
            InterestAttribute::AreaRatio => &self.area_ratio,
            InterestAttribute::IntAreaRatio => &self.int_area_ratio,
            InterestAttribute::CurvatureRatio => &self.curvature_ratio,
            InterestAttribute::ComplexityRatio => &self.complexity_ratio,
            InterestAttribute::IntenPercRatio => &self.inten_perc_ratio,
        }
    }
}

fn pl(points: Vec<(f64, f64)>) -> PiecewiseLinear {
    PiecewiseLinear::from_points_unchecked(points)
}

// ============================================================================
// Output selection
// ============================================================================

/// Which derived fields are written alongside the object statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputFlags {
    pub do_latlon: bool,
    pub do_raw: bool,
    pub do_object_raw: bool,
    pub do_object_id: bool,
    pub do_cluster_id: bool,
    pub do_polylines: bool,
}

impl Default for OutputFlags {
    fn default() -> Self {
        Self {
            do_latlon: true,
            do_raw: true,
            do_object_raw: true,
            do_object_id: true,
            do_cluster_id: true,
            do_polylines: true,
        }
    }
}

// ============================================================================
// Config
// ============================================================================

pub const DEFAULT_GRID_RES: f64 = 4.0;

/// Engine configuration.
///
/// Deserializing fills every missing key from `Config::for_grid_res(grid_res)`,
/// so a file that only sets `grid_res` gets distances scaled to that grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    // -- Run description --
    pub model: String,
    pub obtype: String,
    pub desc: String,

    /// Nominal grid spacing in km; scales the defaults of every distance setting.
    pub grid_res: f64,

    // -- Object identification --
    pub fcst: FieldConfig,
    pub obs: FieldConfig,
    pub connectivity: Connectivity,
    /// Width of the frame zeroed before labeling.
    pub zero_border: usize,
    pub mask_missing_flag: MaskMissing,
    /// Percentile used by the intensity percentile ratio (0..=100).
    pub inten_perc_value: u32,

    // -- Fuzzy engine --
    pub match_flag: MatchType,
    /// Only pairs whose centroids are this close (grid squares) are scored.
    pub max_centroid_dist: f64,
    pub weight: InterestWeights,
    pub interest_function: InterestFunctions,
    pub total_interest_thresh: f64,
    /// Pairs below this interest are left out of the output.
    pub print_interest_thresh: f64,

    pub output: OutputFlags,
}

impl Default for Config {
    fn default() -> Self {
        Self::for_grid_res(DEFAULT_GRID_RES)
    }
}

impl Config {
    /// Default configuration with distances scaled to `grid_res` km.
    pub fn for_grid_res(grid_res: f64) -> Self {
        let conv_radius = (60.0 / grid_res).round().max(0.0) as usize;
        let field = FieldConfig {
            conv_radius,
            ..FieldConfig::default()
        };
        Self {
            model: "WRF".to_string(),
            obtype: "ANALYS".to_string(),
            desc: "NA".to_string(),
            grid_res,
            fcst: field.clone(),
            obs: field,
            connectivity: Connectivity::Eight,
            zero_border: 0,
            mask_missing_flag: MaskMissing::None,
            inten_perc_value: 50,
            match_flag: MatchType::MergeBoth,
            max_centroid_dist: 800.0 / grid_res,
            weight: InterestWeights::default(),
            interest_function: InterestFunctions::for_grid_res(grid_res),
            total_interest_thresh: 0.7,
            print_interest_thresh: 0.0,
            output: OutputFlags::default(),
        }
    }

    /// Read a YAML or JSON configuration, filling unset keys with defaults.
    pub fn read(path: &Path) -> Result<Self> {
        let config: Self = crate::object_file::read_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Sum of all attribute weights.
    pub fn total_weight(&self) -> f64 {
        use strum::IntoEnumIterator;
        InterestAttribute::iter().map(|a| self.weight.get(a)).sum()
    }

    /// Check every setting, reporting the first invalid key.
    pub fn validate(&self) -> Result<()> {
        use strum::IntoEnumIterator;

        if !(self.grid_res > 0.0) {
            return Err(Error::config(
                "grid_res",
                format!("must be positive, got {}", self.grid_res),
            ));
        }
        self.fcst.validate("fcst")?;
        self.obs.validate("obs")?;

        if self.inten_perc_value > 100 {
            return Err(Error::config(
                "inten_perc_value",
                format!("must be in [0, 100], got {}", self.inten_perc_value),
            ));
        }
        if !(self.max_centroid_dist >= 0.0) {
            return Err(Error::config(
                "max_centroid_dist",
                format!("must be non-negative, got {}", self.max_centroid_dist),
            ));
        }
        for attr in InterestAttribute::iter() {
            let w = self.weight.get(attr);
            if !w.is_finite() || w < 0.0 {
                return Err(Error::config(
                    format!("weight.{attr}"),
                    format!("must be a non-negative number, got {w}"),
                ));
            }
        }
        for attr in InterestAttribute::iter() {
            if let Err(Error::Config { reason, .. }) = self.interest_function.get(attr).validate() {
                return Err(Error::config(format!("interest_function.{attr}"), reason));
            }
        }
        if self.total_weight() <= 0.0 {
            return Err(Error::config("weight", "at least one weight must be positive"));
        }
        for (key, value) in [
            ("total_interest_thresh", self.total_interest_thresh),
            ("print_interest_thresh", self.print_interest_thresh),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::config(key, format!("must be in [0, 1], got {value}")));
            }
        }
        Ok(())
    }
}

impl<'de> Deserialize<'de> for Config {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let overrides = Value::deserialize(deserializer)?;
        Config::from_overrides(overrides).map_err(de::Error::custom)
    }
}

impl Config {
    /// Overlay `overrides` key by key onto the defaults for its `grid_res`.
    fn from_overrides(overrides: Value) -> serde_json::Result<Self> {
        let overrides = match overrides {
            Value::Null => Value::Object(Map::new()),
            Value::Object(map) => Value::Object(map),
            other => {
                return Err(de::Error::custom(format!(
                    "configuration must be a mapping, got {other}"
                )));
            }
        };
        let grid_res = overrides
            .get("grid_res")
            .and_then(Value::as_f64)
            .filter(|&g| g > 0.0)
            .unwrap_or(DEFAULT_GRID_RES);

        let mut merged = serde_json::to_value(Self::for_grid_res(grid_res))?;
        overlay(&mut merged, overrides);
        let Value::Object(mut map) = merged else {
            return Err(de::Error::custom("configuration must be a mapping"));
        };

        fn take<T: DeserializeOwned>(map: &mut Map<String, Value>, key: &str) -> serde_json::Result<T> {
            serde_json::from_value(map.remove(key).unwrap_or(Value::Null))
                .map_err(|e| de::Error::custom(format!("{key}: {e}")))
        }

        Ok(Self {
            model: take(&mut map, "model")?,
            obtype: take(&mut map, "obtype")?,
            desc: take(&mut map, "desc")?,
            grid_res: take(&mut map, "grid_res")?,
            fcst: take(&mut map, "fcst")?,
            obs: take(&mut map, "obs")?,
            connectivity: take(&mut map, "connectivity")?,
            zero_border: take(&mut map, "zero_border")?,
            mask_missing_flag: take(&mut map, "mask_missing_flag")?,
            inten_perc_value: take(&mut map, "inten_perc_value")?,
            match_flag: take(&mut map, "match_flag")?,
            max_centroid_dist: take(&mut map, "max_centroid_dist")?,
            weight: take(&mut map, "weight")?,
            interest_function: take(&mut map, "interest_function")?,
            total_interest_thresh: take(&mut map, "total_interest_thresh")?,
            print_interest_thresh: take(&mut map, "print_interest_thresh")?,
            output: take(&mut map, "output")?,
        })
    }
}

/// Recursively replace entries of `base` with those of `overrides`.
/// Mappings merge key by key; every other value replaces wholesale.
fn overlay(base: &mut Value, overrides: Value) {
    match (base, overrides) {
        (Value::Object(base), Value::Object(overrides)) => {
            for (key, value) in overrides {
                match base.get_mut(&key) {
                    Some(slot) => overlay(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overrides) => *base = overrides,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::threshold::ThreshOp;
    use strum::IntoEnumIterator;

    #[test]
    fn test_default_is_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.fcst.conv_radius, 15);
        assert!((config.max_centroid_dist - 200.0).abs() < 1e-12);
        assert!((config.total_weight() - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_default_interest_functions() {
        let f = &Config::default().interest_function;
        assert_eq!(f.centroid_dist.points(), &[(0.0, 1.0), (15.0, 1.0), (150.0, 0.0)]);
        assert_eq!(f.boundary_dist.points(), &[(0.0, 1.0), (100.0, 0.0)]);
        assert!((f.int_area_ratio.eval(0.1) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_for_grid_res_scales_distances() {
        let config = Config::for_grid_res(12.0);
        assert_eq!(config.obs.conv_radius, 5);
        assert!((config.max_centroid_dist - 800.0 / 12.0).abs() < 1e-9);
        assert!((config.interest_function.centroid_dist.points()[2].0 - 50.0).abs() < 1e-9);
        // Angles are not distances.
        assert_eq!(config.interest_function.angle_diff.points()[1], (30.0, 1.0));
    }

    #[test]
    fn test_weight_lookup_covers_every_attribute() {
        let config = Config::default();
        let listed: Vec<f64> = InterestAttribute::iter()
            .map(|a| config.weight.get(a))
            .collect();
        assert_eq!(listed, vec![2.0, 4.0, 0.0, 1.0, 0.0, 1.0, 2.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "
match_flag: no_merge
total_interest_thresh: 0.5
fcst:
  conv_radius: 2
  conv_thresh: { op: gt, value: 10.0 }
  merge_flag: none
  merge_thresh: null
weight:
  boundary_dist: 0.0
";
        let config: Config = serde_yml::from_str(yaml).unwrap();
        config.validate().unwrap();
        assert_eq!(config.match_flag, MatchType::NoMerge);
        assert_eq!(config.fcst.conv_radius, 2);
        assert_eq!(config.fcst.conv_thresh.op, ThreshOp::Gt);
        assert_eq!(config.fcst.merge_thresh, None);
        assert_eq!(config.obs.merge_flag, MergeType::Thresh);
        assert_eq!(config.weight.boundary_dist, 0.0);
        assert_eq!(config.weight.centroid_dist, 2.0);
    }

    #[test]
    fn test_json_roundtrip() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_validate_reports_key() {
        let mut config = Config::default();
        config.obs.vld_thresh = 1.5;
        let err = config.validate().unwrap_err();
        assert!(matches!(&err, Error::Config { key, .. } if key == "obs.vld_thresh"));

        let mut config = Config::default();
        config.fcst.merge_thresh = None;
        let err = config.validate().unwrap_err();
        assert!(matches!(&err, Error::Config { key, .. } if key == "fcst.merge_thresh"));

        let mut config = Config::default();
        config.weight.angle_diff = -1.0;
        let err = config.validate().unwrap_err();
        assert!(matches!(&err, Error::Config { key, .. } if key == "weight.angle_diff"));
    }

    #[test]
    fn test_validate_rejects_zero_total_weight() {
        let mut config = Config::default();
        config.weight = InterestWeights {
            centroid_dist: 0.0,
            boundary_dist: 0.0,
            angle_diff: 0.0,
            area_ratio: 0.0,
            int_area_ratio: 0.0,
            ..InterestWeights::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config { .. })));
    }

    #[test]
    fn test_validate_checks_grid_res_before_functions() {
        let config = Config::for_grid_res(-4.0);
        let err = config.validate().unwrap_err();
        assert!(matches!(&err, Error::Config { key, .. } if key == "grid_res"));
    }

    #[test]
    fn test_read_validates() {
        let path = common::test_utils::test_output_path("config_read_test.yaml");
        std::fs::write(&path, "total_interest_thresh: 0.5\n").unwrap();
        assert_eq!(Config::read(&path).unwrap().total_interest_thresh, 0.5);

        std::fs::write(&path, "total_interest_thresh: 2.0\n").unwrap();
        assert!(matches!(Config::read(&path), Err(Error::Config { .. })));
    }

    #[test]
    fn test_grid_res_scales_unset_keys() {
        let config: Config = serde_yml::from_str("grid_res: 12\n").unwrap();
        assert_eq!(config, Config::for_grid_res(12.0));
        assert_eq!(config.fcst.conv_radius, 5);
        assert!((config.max_centroid_dist - 800.0 / 12.0).abs() < 1e-9);
        assert!((config.interest_function.boundary_dist.points()[1].0 - 400.0 / 12.0).abs() < 1e-9);

        // A partial field section keeps the scaled radius.
        let yaml = "
grid_res: 12
fcst:
  conv_thresh: { op: gt, value: 1.0 }
max_centroid_dist: 30
";
        let config: Config = serde_yml::from_str(yaml).unwrap();
        assert_eq!(config.fcst.conv_radius, 5);
        assert_eq!(config.fcst.conv_thresh, Threshold::gt(1.0));
        assert_eq!(config.max_centroid_dist, 30.0);
    }

    #[test]
    fn test_read_scales_by_grid_res() {
        let path = common::test_utils::test_output_path("config_grid_res_test.yaml");
        std::fs::write(&path, "grid_res: 12\n").unwrap();
        let config = Config::read(&path).unwrap();
        assert_eq!(config.obs.conv_radius, 5);
        assert!((config.interest_function.centroid_dist.points()[2].0 - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_non_mapping_config_is_rejected() {
        assert!(serde_yml::from_str::<Config>("- 1\n- 2\n").is_err());
        assert_eq!(serde_yml::from_str::<Config>("{}").unwrap(), Config::default());
    }

    #[test]
    fn test_unknown_enum_value_is_rejected() {
        assert!(serde_yml::from_str::<Config>("match_flag: sometimes\n").is_err());
    }

    #[test]
    fn test_enum_names() {
        assert_eq!(MergeType::Both.to_string(), "both");
        assert_eq!(MatchType::MergeFcst.to_string(), "merge_fcst");
        assert_eq!(InterestAttribute::IntenPercRatio.to_string(), "inten_perc_ratio");
        assert!(MergeType::Both.uses_thresh() && MergeType::Both.uses_engine());
        assert!(!MergeType::None.uses_thresh());
    }
}
