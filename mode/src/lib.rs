//! Mode - object-based spatial verification of gridded forecasts.
//!
//! This library identifies coherent features ("objects") in gridded forecast
//! and observation fields and compares them, including:
//! - Bad-data-aware 2D/3D grids
//! - Connected-component labeling per time slice and across time, with
//!   minimum-volume sifting of space-time objects
//! - Fractional coverage and convolution neighborhood statistics
//! - Per-object geometric and intensity attributes
//! - Fuzzy-logic merging and matching of forecast and observation objects
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use mode::{Config, Engine};
//!
//! let config = Config::default();
//! let mut engine = Engine::new(config, fcst_field, obs_field)?;
//! engine.run()?;
//!
//! for pair in engine.matches() {
//!     println!("{:?} <-> {:?}: {:.3}", pair.fcst_objects, pair.obs_objects, pair.interest);
//! }
//! ```

pub mod attributes;
pub mod config;
mod error;
pub mod grid;
pub mod labeling;
pub mod matching;
pub mod neighborhood;
pub mod object_file;
pub mod partition;
pub mod space_time;
pub mod threshold;

#[cfg(test)]
pub(crate) mod test_utils;

pub use error::{Error, Result};

// ============================================================================
// Grids and thresholds
// ============================================================================

pub use grid::{DataPlane, Grid, LatLonProjection};
pub use threshold::{ThreshOp, Threshold};

// ============================================================================
// Object identification
// ============================================================================

pub use labeling::{BoundingBox, ObjectField};
pub use partition::Partition;

// ============================================================================
// Attributes and matching
// ============================================================================

pub use attributes::{IntensityStats, Moments, ObjectAttributes};
pub use config::{
    Config, Connectivity, FieldConfig, InterestAttribute, MaskMissing, MatchType, MergeType,
    OutputFlags,
};
pub use matching::{
    Clusters, ContingencyCounts, ContingencyTables, Engine, EngineState, FieldObjects,
    MatchedPair, PairFeatures, PairInterest, PiecewiseLinear,
};
pub use neighborhood::InterpMethod;
pub use object_file::{EngineOutput, FieldRecord, ObjectFieldRecord};
pub use space_time::{SpaceTimeObjects, SpaceTimeSummary, identify_space_time_objects};
