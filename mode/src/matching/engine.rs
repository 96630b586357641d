use common::is_bad_data;
use tracing::{debug, info};

use super::features::{PairInterest, score_pair, total_interest};
use super::merge::{self, Clusters, MatchedPair};
use super::{ContingencyCounts, ContingencyTables, EngineState, PairFeatures};
use crate::attributes::ObjectAttributes;
use crate::config::{Config, FieldConfig, MaskMissing};
use crate::error::{Error, Result};
use crate::grid::{DataPlane, Grid};
use crate::labeling::ObjectField;
use crate::neighborhood::{convolve_circular, mask_bad_data, rescale_probability};

/// Everything the engine derives for one side of the comparison.
#[derive(Debug, Clone)]
pub struct FieldObjects {
    pub raw: DataPlane,
    /// Convolved field; a copy of `raw` until the convolve stage has run.
    pub convolved: DataPlane,
    /// Simple objects, numbered `1..=n` after filtering.
    pub objects: ObjectField,
    /// Attributes of object `k` at index `k - 1`.
    pub attributes: Vec<ObjectAttributes>,
    pub clusters: Clusters,
}

impl FieldObjects {
    fn new(raw: DataPlane) -> Self {
        let (nx, ny, nt) = raw.dims();
        Self {
            convolved: raw.clone(),
            objects: ObjectField::new(nx, ny, nt),
            attributes: Vec::new(),
            clusters: Clusters::singletons(0),
            raw,
        }
    }

    pub fn n_objects(&self) -> usize {
        self.objects.n_objects()
    }
}

/// One forecast/observation comparison.
#[derive(Debug, Clone)]
pub struct Engine {
    config: Config,
    state: EngineState,
    fcst: FieldObjects,
    obs: FieldObjects,
    pairs: Vec<PairInterest>,
    matches: Vec<MatchedPair>,
    unmatched_fcst: Vec<u32>,
    unmatched_obs: Vec<u32>,
    contingency: ContingencyTables,
}

impl Engine {
    /// Validate the configuration and the two single-slice fields.
    pub fn new(config: Config, fcst: DataPlane, obs: DataPlane) -> Result<Self> {
        config.validate()?;
        fcst.check_same_grid(&obs, "engine fields")?;
        if fcst.nt() != 1 {
            return Err(Error::NotConstTimeSlice {
                context: "engine fields",
                nt: fcst.nt(),
            });
        }

        Ok(Self {
            config,
            state: EngineState::Raw,
            fcst: FieldObjects::new(fcst),
            obs: FieldObjects::new(obs),
            pairs: Vec::new(),
            matches: Vec::new(),
            unmatched_fcst: Vec::new(),
            unmatched_obs: Vec::new(),
            contingency: ContingencyTables::default(),
        })
    }

    /// Run every remaining stage in order.
    pub fn run(&mut self) -> Result<()> {
        if self.state == EngineState::Raw {
            self.convolve()?;
        }
        if self.state == EngineState::Convolved {
            self.label()?;
        }
        if self.state == EngineState::Labeled {
            self.merge()?;
        }
        if self.state == EngineState::Merged {
            self.match_objects()?;
        }
        Ok(())
    }

    // ========================================================================
    // Stages
    // ========================================================================

    /// Mask missing data, zero raw values failing `raw_thresh` and convolve.
    pub fn convolve(&mut self) -> Result<()> {
        self.require("convolve", EngineState::Raw)?;

        mask_missing(self.config.mask_missing_flag, &mut self.fcst.raw, &mut self.obs.raw)?;

        for (side, field_config) in [
            (&mut self.fcst, &self.config.fcst),
            (&mut self.obs, &self.config.obs),
        ] {
            let filtered = prepare_raw(&mut side.raw, field_config)?;
            side.convolved =
                convolve_circular(&filtered, field_config.conv_radius, field_config.vld_thresh)?;
            debug!(
                field = %field_config.name,
                radius = field_config.conv_radius,
                "Convolved field"
            );
        }

        self.state = EngineState::Convolved;
        Ok(())
    }

    /// Threshold the convolved fields, label objects and drop those failing
    /// the area and intensity filters.
    pub fn label(&mut self) -> Result<()> {
        self.require("label", EngineState::Convolved)?;

        for (side, field_config) in [
            (&mut self.fcst, &self.config.fcst),
            (&mut self.obs, &self.config.obs),
        ] {
            let (objects, attributes) = identify_objects(side, field_config, &self.config)?;
            side.objects = objects;
            side.attributes = attributes;
            side.clusters = Clusters::singletons(side.objects.n_objects());
        }

        let fcst_thresh = &self.config.fcst.conv_thresh;
        let obs_thresh = &self.config.obs.conv_thresh;
        let mut raw = ContingencyCounts::default();
        let mut filter = ContingencyCounts::default();
        for (i, (&f, &o)) in self
            .fcst
            .raw
            .data()
            .iter()
            .zip(self.obs.raw.data())
            .enumerate()
        {
            if is_bad_data(f) || is_bad_data(o) {
                continue;
            }
            raw.add(fcst_thresh.check(f), obs_thresh.check(o));
            filter.add(
                self.fcst.objects.labels()[i] != 0,
                self.obs.objects.labels()[i] != 0,
            );
        }
        self.contingency.raw = raw;
        self.contingency.filter = filter;

        info!(
            n_fcst = self.fcst.n_objects(),
            n_obs = self.obs.n_objects(),
            "Identified objects"
        );
        self.state = EngineState::Labeled;
        Ok(())
    }

    /// Group simple objects of each field into clusters per `merge_flag`.
    pub fn merge(&mut self) -> Result<()> {
        self.require("merge", EngineState::Labeled)?;

        for (side, field_config) in [
            (&mut self.fcst, &self.config.fcst),
            (&mut self.obs, &self.config.obs),
        ] {
            let n = side.objects.n_objects();
            let mut partition = merge::object_partition(n);

            if field_config.merge_flag.uses_thresh() {
                if let Some(merge_thresh) = &field_config.merge_thresh {
                    let mut mask = ObjectField::from_threshold(&side.convolved, merge_thresh);
                    mask.zero_border(self.config.zero_border)?;
                    let (merge_objects, n_merge) = mask.split_const_t(self.config.connectivity)?;
                    debug!(field = %field_config.name, n_merge, "Labeled merge objects");
                    merge::thresh_merge(&side.objects, &merge_objects, &mut partition);
                }
            }
            if field_config.merge_flag.uses_engine() {
                merge::engine_merge(&side.attributes, &self.config, &mut partition);
            }

            side.clusters = Clusters::from_partition(n, &partition);
            debug!(
                field = %field_config.name,
                merge_flag = %field_config.merge_flag,
                n_objects = n,
                n_clusters = side.clusters.n_clusters(),
                "Merged objects"
            );
        }

        self.state = EngineState::Merged;
        Ok(())
    }

    /// Score every forecast/observation pair and group matches per `match_flag`.
    pub fn match_objects(&mut self) -> Result<()> {
        self.require("match", EngineState::Merged)?;

        self.pairs.clear();
        for (i, a) in self.fcst.attributes.iter().enumerate() {
            for (j, b) in self.obs.attributes.iter().enumerate() {
                if let Some(pair) = score_pair(i as u32 + 1, j as u32 + 1, a, b, &self.config) {
                    self.pairs.push(pair);
                }
            }
        }

        let groups = merge::match_groups(
            self.config.match_flag,
            &self.pairs,
            &self.fcst.clusters,
            &self.obs.clusters,
            &self.config,
        );

        self.matches = groups
            .groups
            .into_iter()
            .map(|(fcst_objects, obs_objects)| -> Result<MatchedPair> {
                let interest = self.cluster_interest(&fcst_objects, &obs_objects)?;
                Ok(MatchedPair {
                    fcst_objects,
                    obs_objects,
                    interest,
                })
            })
            .collect::<Result<_>>()?;
        self.unmatched_fcst = groups.unmatched_fcst;
        self.unmatched_obs = groups.unmatched_obs;

        let fcst_matched = self.matched_mask(true);
        let obs_matched = self.matched_mask(false);
        let mut object = ContingencyCounts::default();
        for (i, (&f, &o)) in self.fcst.raw.data().iter().zip(self.obs.raw.data()).enumerate() {
            if is_bad_data(f) || is_bad_data(o) {
                continue;
            }
            object.add(fcst_matched[i], obs_matched[i]);
        }
        self.contingency.object = object;

        info!(
            match_flag = %self.config.match_flag,
            n_pairs = self.pairs.len(),
            n_matches = self.matches.len(),
            n_unmatched_fcst = self.unmatched_fcst.len(),
            n_unmatched_obs = self.unmatched_obs.len(),
            "Matched objects"
        );
        self.state = EngineState::Matched;
        Ok(())
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn fcst(&self) -> &FieldObjects {
        &self.fcst
    }

    pub fn obs(&self) -> &FieldObjects {
        &self.obs
    }

    /// Every scored pair, in forecast-major order.
    pub fn pairs(&self) -> &[PairInterest] {
        &self.pairs
    }

    pub fn matches(&self) -> &[MatchedPair] {
        &self.matches
    }

    /// Forecast objects without a match (false alarms).
    pub fn unmatched_fcst(&self) -> &[u32] {
        &self.unmatched_fcst
    }

    /// Observation objects without a match (misses).
    pub fn unmatched_obs(&self) -> &[u32] {
        &self.unmatched_obs
    }

    pub fn contingency(&self) -> &ContingencyTables {
        &self.contingency
    }

    /// Cluster id grid for one side: `k` for cells of matched pair `k - 1`, 0 elsewhere.
    pub fn cluster_ids(&self, fcst: bool) -> Grid<u32> {
        let side = if fcst { &self.fcst } else { &self.obs };
        let mut pair_of = vec![0u32; side.n_objects()];
        for (p, pair) in self.matches.iter().enumerate() {
            let members = if fcst { &pair.fcst_objects } else { &pair.obs_objects };
            for &k in members {
                pair_of[k as usize - 1] = p as u32 + 1;
            }
        }
        side.objects
            .labels()
            .map(|&k| if k == 0 { 0 } else { pair_of[k as usize - 1] })
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn require(&self, requested: &'static str, expected: EngineState) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(Error::InvalidState {
                requested,
                current: self.state.to_string(),
            })
        }
    }

    /// Total interest between the merged shapes of two object groups.
    fn cluster_interest(&self, fcst_objects: &[u32], obs_objects: &[u32]) -> Result<f64> {
        let perc = self.config.inten_perc_value;
        let fcst_parts: Vec<&ObjectAttributes> = fcst_objects
            .iter()
            .map(|&k| &self.fcst.attributes[k as usize - 1])
            .collect();
        let obs_parts: Vec<&ObjectAttributes> = obs_objects
            .iter()
            .map(|&k| &self.obs.attributes[k as usize - 1])
            .collect();
        let fcst_union = ObjectAttributes::compute_union(&fcst_parts, &self.fcst.raw, perc)?;
        let obs_union = ObjectAttributes::compute_union(&obs_parts, &self.obs.raw, perc)?;

        let features = PairFeatures::compute(&fcst_union, &obs_union);
        let (_, total) = total_interest(&features, &self.config);
        Ok(total)
    }

    fn matched_mask(&self, fcst: bool) -> Vec<bool> {
        self.cluster_ids(fcst).data().iter().map(|&c| c != 0).collect()
    }
}

/// Raw field with values failing `raw_thresh` set to zero. Bad data is kept.
/// Copy bad data between the two fields as `flag` requests.
pub(crate) fn mask_missing(flag: MaskMissing, fcst: &mut DataPlane, obs: &mut DataPlane) -> Result<()> {
    let (mask_fcst, mask_obs) = match flag {
        MaskMissing::None => (false, false),
        MaskMissing::Fcst => (true, false),
        MaskMissing::Obs => (false, true),
        MaskMissing::Both => (true, true),
    };
    if mask_fcst {
        mask_bad_data(fcst, obs)?;
    }
    if mask_obs {
        mask_bad_data(obs, fcst)?;
    }
    Ok(())
}

/// Rescale probability fields in place, then return `raw` with values
/// failing `raw_thresh` zeroed.
pub(crate) fn prepare_raw(raw: &mut DataPlane, field_config: &FieldConfig) -> Result<DataPlane> {
    if field_config.is_prob {
        rescale_probability(raw)?;
    }
    Ok(apply_raw_thresh(raw, field_config))
}

fn apply_raw_thresh(raw: &DataPlane, field_config: &FieldConfig) -> DataPlane {
    match &field_config.raw_thresh {
        Some(thresh) => raw.map(|&v| {
            if is_bad_data(v) || thresh.check(v) {
                v
            } else {
                0.0
            }
        }),
        None => raw.clone(),
    }
}

/// Label the convolved field and keep objects passing the attribute filters.
fn identify_objects(
    side: &FieldObjects,
    field_config: &FieldConfig,
    config: &Config,
) -> Result<(ObjectField, Vec<ObjectAttributes>)> {
    let mut mask = ObjectField::from_threshold(&side.convolved, &field_config.conv_thresh);
    mask.set_radius(field_config.conv_radius);
    mask.zero_border(config.zero_border)?;
    let (mut objects, n_shapes) = mask.split_const_t(config.connectivity)?;

    let attributes = if n_shapes == 0 {
        Vec::new()
    } else {
        ObjectAttributes::compute_all(&objects, &side.raw, config.inten_perc_value)?
    };

    let keep: Vec<usize> = attributes
        .iter()
        .enumerate()
        .filter(|(_, attr)| {
            let area_ok = field_config
                .area_thresh
                .as_ref()
                .is_none_or(|t| t.check(attr.area as f64));
            let inten_ok = field_config
                .inten_perc_thresh
                .as_ref()
                .is_none_or(|t| t.check(attr.intensity.user));
            area_ok && inten_ok
        })
        .map(|(k, _)| k)
        .collect();

    debug!(
        field = %field_config.name,
        n_shapes,
        n_kept = keep.len(),
        "Filtered objects"
    );

    if keep.is_empty() && n_shapes > 0 {
        let (nx, ny, nt) = objects.dims();
        objects.set_split(Grid::new(nx, ny, nt), 0, Vec::new());
        return Ok((objects, Vec::new()));
    }
    objects.sift_objects(&keep)?;

    let mut attributes = attributes;
    let mut k = 0;
    attributes.retain(|_| {
        let kept = keep.binary_search(&k).is_ok();
        k += 1;
        kept
    });
    Ok((objects, attributes))
}
