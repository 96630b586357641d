//! Fuzzy-logic merging and matching of forecast and observation objects.
//!
//! The [`Engine`] drives one forecast/observation comparison through a fixed
//! sequence of stages:
//!
//! 1. **Convolve**: mask missing data, apply the raw threshold, disk-average.
//! 2. **Label**: threshold the convolved fields, label and filter objects.
//! 3. **Merge**: group simple objects of each field into clusters.
//! 4. **Match**: score forecast/observation pairs and pair up clusters.
//!
//! Pair scoring lives in [`features`], interest functions in [`interest`] and
//! the merge/match policies in [`merge`].

#[cfg(test)]
mod tests;

mod engine;
pub mod features;
pub mod interest;
pub mod merge;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

pub use engine::{Engine, FieldObjects};
pub(crate) use engine::{mask_missing, prepare_raw};
pub use features::{PairFeatures, PairInterest, score_pair, total_interest};
pub use interest::PiecewiseLinear;
pub use merge::{Clusters, MatchedPair};

/// Pipeline stage the engine has completed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EngineState {
    #[default]
    Raw,
    Convolved,
    Labeled,
    Merged,
    Matched,
}

/// 2x2 contingency table of forecast and observation event masks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContingencyCounts {
    pub fy_oy: usize,
    pub fy_on: usize,
    pub fn_oy: usize,
    pub fn_on: usize,
}

impl ContingencyCounts {
    pub fn add(&mut self, fcst_event: bool, obs_event: bool) {
        match (fcst_event, obs_event) {
            (true, true) => self.fy_oy += 1,
            (true, false) => self.fy_on += 1,
            (false, true) => self.fn_oy += 1,
            (false, false) => self.fn_on += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.fy_oy + self.fy_on + self.fn_oy + self.fn_on
    }
}

/// Contingency counts for the raw, filtered and matched-object masks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContingencyTables {
    /// Raw values passing the convolution threshold.
    pub raw: ContingencyCounts,
    /// Cells covered by objects that survived filtering.
    pub filter: ContingencyCounts,
    /// Cells covered by matched objects.
    pub object: ContingencyCounts,
}
