use super::merge::{MatchGroups, match_groups};
use super::*;
use crate::config::{Config, InterestAttribute, MaskMissing, MatchType, MergeType};
use crate::error::Error;
use crate::grid::DataPlane;
use crate::test_utils::{field_with_blocks, init_tracing};
use crate::threshold::Threshold;
use crate::attributes::ObjectAttributes;
use common::BAD_DATA;

/// No convolution, objects at `>= 5`, no merging.
fn test_config() -> Config {
    let mut config = Config::default();
    for field in [&mut config.fcst, &mut config.obs] {
        field.conv_radius = 0;
        field.conv_thresh = Threshold::ge(5.0);
        field.merge_flag = MergeType::None;
    }
    config
}

fn run_engine(config: Config, fcst: DataPlane, obs: DataPlane) -> Engine {
    init_tracing();
    let mut engine = Engine::new(config, fcst, obs).unwrap();
    engine.run().unwrap();
    engine
}

fn zero_features() -> PairFeatures {
    PairFeatures {
        centroid_dist: 0.0,
        boundary_dist: 0.0,
        convex_hull_dist: 0.0,
        angle_diff: 0.0,
        aspect_diff: 0.0,
        area_ratio: 1.0,
        int_area_ratio: 1.0,
        curvature_ratio: 1.0,
        complexity_ratio: 1.0,
        inten_perc_ratio: 1.0,
    }
}

fn pair(fcst: u32, obs: u32, total: f64) -> PairInterest {
    PairInterest {
        fcst,
        obs,
        features: zero_features(),
        interests: Vec::new(),
        total,
    }
}

fn block_attributes(x0: usize, y0: usize, x1: usize, y1: usize) -> ObjectAttributes {
    let raw = field_with_blocks(20, 20, &[(x0, y0, x1, y1)], 10.0);
    let cells: Vec<(usize, usize)> = (y0..=y1)
        .flat_map(|y| (x0..=x1).map(move |x| (x, y)))
        .collect();
    ObjectAttributes::compute(&cells, &raw, 50).unwrap()
}

// ============================================================================
// Pair features and interest
// ============================================================================

#[test]
fn test_identical_objects_have_full_interest() {
    let a = block_attributes(5, 5, 9, 8);
    let features = PairFeatures::compute(&a, &a);
    assert_eq!(features.centroid_dist, 0.0);
    assert_eq!(features.boundary_dist, 0.0);
    assert_eq!(features.angle_diff, 0.0);
    assert_eq!(features.area_ratio, 1.0);
    assert_eq!(features.int_area_ratio, 1.0);
    assert_eq!(features.inten_perc_ratio, 1.0);

    let (interests, total) = total_interest(&features, &Config::default());
    assert!((total - 1.0).abs() < 1e-12);
    // Only attributes with a non-zero default weight are reported.
    let attrs: Vec<InterestAttribute> = interests.iter().map(|(a, _)| *a).collect();
    assert_eq!(
        attrs,
        vec![
            InterestAttribute::CentroidDist,
            InterestAttribute::BoundaryDist,
            InterestAttribute::AngleDiff,
            InterestAttribute::AreaRatio,
            InterestAttribute::IntAreaRatio,
        ]
    );
}

#[test]
fn test_disjoint_blocks_features() {
    let a = block_attributes(1, 1, 3, 3);
    let b = block_attributes(6, 1, 8, 3);
    let features = PairFeatures::compute(&a, &b);
    assert!((features.centroid_dist - 5.0).abs() < 1e-9);
    assert!((features.boundary_dist - 2.0).abs() < 1e-9);
    assert_eq!(features.int_area_ratio, 0.0);
    assert_eq!(features.area_ratio, 1.0);

    let small = block_attributes(6, 1, 7, 2);
    let features = PairFeatures::compute(&a, &small);
    assert!((features.area_ratio - 4.0 / 9.0).abs() < 1e-12);
    // Ratios do not depend on argument order.
    let swapped = PairFeatures::compute(&small, &a);
    assert_eq!(features.area_ratio, swapped.area_ratio);
}

#[test]
fn test_total_interest_single_weight() {
    let mut config = Config::default();
    config.weight = crate::config::InterestWeights {
        centroid_dist: 1.0,
        boundary_dist: 0.0,
        convex_hull_dist: 0.0,
        angle_diff: 0.0,
        aspect_diff: 0.0,
        area_ratio: 0.0,
        int_area_ratio: 0.0,
        curvature_ratio: 0.0,
        complexity_ratio: 0.0,
        inten_perc_ratio: 0.0,
    };
    let mut features = zero_features();
    // Halfway between the 15 and 150 grid square breakpoints.
    features.centroid_dist = 82.5;
    let (interests, total) = total_interest(&features, &config);
    assert_eq!(interests.len(), 1);
    assert!((total - 0.5).abs() < 1e-12);
}

#[test]
fn test_score_pair_respects_max_centroid_dist() {
    let a = block_attributes(1, 1, 3, 3);
    let b = block_attributes(14, 14, 16, 16);
    let mut config = Config::default();
    assert!(score_pair(1, 1, &a, &b, &config).is_some());
    config.max_centroid_dist = 5.0;
    assert!(score_pair(1, 1, &a, &b, &config).is_none());
}

// ============================================================================
// Clusters and match policies
// ============================================================================

#[test]
fn test_clusters_from_partition() {
    let mut partition = merge::object_partition(4);
    partition.merge_values(2, 4);
    let clusters = Clusters::from_partition(4, &partition);
    assert_eq!(clusters.n_clusters(), 3);
    assert_eq!(clusters.members(0), &[1]);
    assert_eq!(clusters.members(1), &[2, 4]);
    assert_eq!(clusters.members(2), &[3]);
    assert_eq!(clusters.cluster_of(4), 1);
    assert_eq!(clusters.cluster_of(3), 2);
}

fn policy_pairs() -> Vec<PairInterest> {
    vec![pair(1, 1, 0.9), pair(1, 2, 0.95), pair(2, 2, 0.8), pair(2, 1, 0.3)]
}

fn run_policy(match_flag: MatchType) -> MatchGroups {
    match_groups(
        match_flag,
        &policy_pairs(),
        &Clusters::singletons(2),
        &Clusters::singletons(2),
        &Config::default(),
    )
}

#[test]
fn test_match_none() {
    let groups = run_policy(MatchType::None);
    assert!(groups.groups.is_empty());
    assert_eq!(groups.unmatched_fcst, vec![1, 2]);
    assert_eq!(groups.unmatched_obs, vec![1, 2]);
}

#[test]
fn test_match_no_merge_is_greedy_one_to_one() {
    let groups = run_policy(MatchType::NoMerge);
    assert_eq!(groups.groups, vec![(vec![1], vec![2])]);
    assert_eq!(groups.unmatched_fcst, vec![2]);
    assert_eq!(groups.unmatched_obs, vec![1]);
}

#[test]
fn test_match_merge_fcst_groups_by_best_obs() {
    let groups = run_policy(MatchType::MergeFcst);
    assert_eq!(groups.groups, vec![(vec![1, 2], vec![2])]);
    assert!(groups.unmatched_fcst.is_empty());
    assert_eq!(groups.unmatched_obs, vec![1]);
}

#[test]
fn test_match_merge_fcst_takes_whole_obs_cluster() {
    let mut partition = merge::object_partition(2);
    partition.merge_values(1, 2);
    let obs_clusters = Clusters::from_partition(2, &partition);
    let groups = match_groups(
        MatchType::MergeFcst,
        &[pair(1, 2, 0.9)],
        &Clusters::singletons(1),
        &obs_clusters,
        &Config::default(),
    );
    assert_eq!(groups.groups, vec![(vec![1], vec![1, 2])]);
    assert!(groups.unmatched_obs.is_empty());
}

#[test]
fn test_match_merge_both_links_components() {
    let groups = run_policy(MatchType::MergeBoth);
    assert_eq!(groups.groups, vec![(vec![1, 2], vec![1, 2])]);
    assert!(groups.unmatched_fcst.is_empty());
    assert!(groups.unmatched_obs.is_empty());
}

#[test]
fn test_match_merge_both_keeps_separate_components() {
    let pairs = [pair(1, 2, 0.9), pair(2, 1, 0.75), pair(3, 3, 0.5)];
    let groups = match_groups(
        MatchType::MergeBoth,
        &pairs,
        &Clusters::singletons(3),
        &Clusters::singletons(3),
        &Config::default(),
    );
    assert_eq!(groups.groups, vec![(vec![1], vec![2]), (vec![2], vec![1])]);
    assert_eq!(groups.unmatched_fcst, vec![3]);
    assert_eq!(groups.unmatched_obs, vec![3]);
}

#[test]
fn test_match_no_merge_pairs_whole_clusters() {
    let mut partition = merge::object_partition(2);
    partition.merge_values(1, 2);
    let fcst_clusters = Clusters::from_partition(2, &partition);
    let groups = match_groups(
        MatchType::NoMerge,
        &[pair(1, 1, 0.95), pair(2, 1, 0.95), pair(2, 2, 0.9)],
        &fcst_clusters,
        &Clusters::singletons(2),
        &Config::default(),
    );
    // The cluster is used once, with its best observation.
    assert_eq!(groups.groups, vec![(vec![1, 2], vec![1])]);
    assert!(groups.unmatched_fcst.is_empty());
    assert_eq!(groups.unmatched_obs, vec![2]);
}

#[test]
fn test_match_merge_fcst_carries_fcst_cluster() {
    let mut partition = merge::object_partition(3);
    partition.merge_values(1, 3);
    let fcst_clusters = Clusters::from_partition(3, &partition);
    let groups = match_groups(
        MatchType::MergeFcst,
        &[pair(1, 1, 0.9), pair(2, 1, 0.8)],
        &fcst_clusters,
        &Clusters::singletons(1),
        &Config::default(),
    );
    // Object 3 never scored on its own but rides along with object 1.
    assert_eq!(groups.groups, vec![(vec![1, 2, 3], vec![1])]);
    assert!(groups.unmatched_fcst.is_empty());
}

// ============================================================================
// Engine
// ============================================================================

#[test]
fn test_identical_fields_match_fully() {
    let field = field_with_blocks(20, 20, &[(5, 5, 9, 9)], 10.0);
    let engine = run_engine(test_config(), field.clone(), field);

    assert_eq!(engine.state(), EngineState::Matched);
    assert_eq!(engine.fcst().n_objects(), 1);
    assert_eq!(engine.obs().n_objects(), 1);
    assert_eq!(engine.pairs().len(), 1);
    assert!((engine.pairs()[0].total - 1.0).abs() < 1e-12);
    assert!(engine.pairs()[0].is_match(engine.config()));

    assert_eq!(engine.matches().len(), 1);
    let matched = &engine.matches()[0];
    assert_eq!(matched.fcst_objects, vec![1]);
    assert_eq!(matched.obs_objects, vec![1]);
    assert!((matched.interest - 1.0).abs() < 1e-12);
    assert!(engine.unmatched_fcst().is_empty());
    assert!(engine.unmatched_obs().is_empty());
}

#[test]
fn test_double_threshold_merge() {
    // Two 3x3 blocks joined by a column of 3s.
    let mut field = field_with_blocks(9, 5, &[(1, 1, 3, 3), (5, 1, 7, 3)], 10.0);
    for y in 1..=3 {
        field.put(3.0, 4, y, 0);
    }
    let mut config = test_config();
    config.fcst.merge_flag = MergeType::Thresh;
    config.fcst.merge_thresh = Some(Threshold::ge(2.0));

    let engine = run_engine(config, field.clone(), field);
    assert_eq!(engine.fcst().n_objects(), 2);
    assert_eq!(engine.fcst().clusters.n_clusters(), 1);
    assert_eq!(engine.fcst().clusters.members(0), &[1, 2]);
    // Observation side does not merge.
    assert_eq!(engine.obs().clusters.n_clusters(), 2);
}

/// Forecast: two blocks joined by a column of 3s, merged at `>= 2`.
/// Observation: one block covering both.
fn merged_cluster_engine(match_flag: MatchType) -> Engine {
    let mut fcst = field_with_blocks(9, 5, &[(1, 1, 3, 3), (5, 1, 7, 3)], 10.0);
    for y in 1..=3 {
        fcst.put(3.0, 4, y, 0);
    }
    let obs = field_with_blocks(9, 5, &[(1, 1, 7, 3)], 10.0);
    let mut config = test_config();
    config.fcst.merge_flag = MergeType::Thresh;
    config.fcst.merge_thresh = Some(Threshold::ge(2.0));
    config.match_flag = match_flag;
    run_engine(config, fcst, obs)
}

#[test]
fn test_thresh_cluster_matches_as_one_unit() {
    for match_flag in [MatchType::NoMerge, MatchType::MergeFcst, MatchType::MergeBoth] {
        let engine = merged_cluster_engine(match_flag);
        assert_eq!(engine.fcst().clusters.n_clusters(), 1, "{match_flag}");
        assert!(engine.pairs().iter().all(|p| p.is_match(engine.config())));
        assert_eq!(engine.matches().len(), 1, "{match_flag}");
        assert_eq!(engine.matches()[0].fcst_objects, vec![1, 2], "{match_flag}");
        assert_eq!(engine.matches()[0].obs_objects, vec![1], "{match_flag}");
        assert!(engine.unmatched_fcst().is_empty(), "{match_flag}");
        assert!(engine.unmatched_obs().is_empty(), "{match_flag}");
    }

    let engine = merged_cluster_engine(MatchType::None);
    assert!(engine.matches().is_empty());
    assert_eq!(engine.unmatched_fcst(), &[1, 2]);
    assert_eq!(engine.unmatched_obs(), &[1]);
}

#[test]
fn test_engine_merge_joins_nearby_objects() {
    let field = field_with_blocks(12, 5, &[(1, 1, 3, 3), (6, 1, 8, 3)], 10.0);
    let mut config = test_config();
    config.fcst.merge_flag = MergeType::Engine;

    let engine = run_engine(config, field.clone(), field);
    assert_eq!(engine.fcst().n_objects(), 2);
    assert_eq!(engine.fcst().clusters.n_clusters(), 1);
}

#[test]
fn test_stages_out_of_order() {
    let field = field_with_blocks(10, 10, &[(2, 2, 4, 4)], 10.0);
    let mut engine = Engine::new(test_config(), field.clone(), field).unwrap();

    match engine.label() {
        Err(Error::InvalidState { requested, current }) => {
            assert_eq!(requested, "label");
            assert_eq!(current, "raw");
        }
        other => panic!("expected InvalidState, got {other:?}"),
    }
    assert!(matches!(engine.match_objects(), Err(Error::InvalidState { .. })));

    engine.convolve().unwrap();
    assert_eq!(engine.state(), EngineState::Convolved);
    assert!(matches!(engine.convolve(), Err(Error::InvalidState { .. })));
    assert!(matches!(engine.merge(), Err(Error::InvalidState { .. })));

    engine.run().unwrap();
    assert_eq!(engine.state(), EngineState::Matched);
    assert!(matches!(engine.label(), Err(Error::InvalidState { .. })));
}

#[test]
fn test_engine_rejects_mismatched_fields() {
    let fcst = DataPlane::new(10, 10, 1);
    let obs = DataPlane::new(10, 11, 1);
    assert!(matches!(
        Engine::new(test_config(), fcst, obs),
        Err(Error::DimensionMismatch { .. })
    ));

    let fcst = DataPlane::new(10, 10, 2);
    let obs = DataPlane::new(10, 10, 2);
    assert!(matches!(
        Engine::new(test_config(), fcst, obs),
        Err(Error::NotConstTimeSlice { nt: 2, .. })
    ));

    let mut config = test_config();
    config.total_interest_thresh = 1.5;
    assert!(matches!(
        Engine::new(config, DataPlane::new(4, 4, 1), DataPlane::new(4, 4, 1)),
        Err(Error::Config { .. })
    ));
}

#[test]
fn test_area_filter_drops_small_objects() {
    let fcst = field_with_blocks(20, 10, &[(1, 1, 2, 2), (10, 1, 14, 5)], 10.0);
    let obs = field_with_blocks(20, 10, &[(10, 1, 14, 5)], 10.0);
    let mut config = test_config();
    config.fcst.area_thresh = Some(Threshold::ge(10.0));

    let engine = run_engine(config, fcst, obs);
    assert_eq!(engine.fcst().n_objects(), 1);
    assert_eq!(engine.fcst().attributes.len(), 1);
    assert_eq!(engine.fcst().attributes[0].area, 25);
    assert_eq!(engine.fcst().objects.get(1, 1, 0), 0);
    assert_eq!(engine.fcst().objects.get(12, 3, 0), 1);
    assert_eq!(engine.matches().len(), 1);
}

#[test]
fn test_everything_filtered_is_not_an_error() {
    let field = field_with_blocks(10, 10, &[(2, 2, 4, 4)], 10.0);
    let mut config = test_config();
    config.fcst.area_thresh = Some(Threshold::ge(1000.0));

    let engine = run_engine(config, field.clone(), field);
    assert_eq!(engine.fcst().n_objects(), 0);
    assert!(engine.fcst().objects.is_split());
    assert_eq!(engine.obs().n_objects(), 1);
    assert!(engine.pairs().is_empty());
    assert!(engine.matches().is_empty());
    assert_eq!(engine.unmatched_obs(), &[1]);
}

#[test]
fn test_distant_objects_stay_unmatched() {
    let fcst = field_with_blocks(30, 30, &[(1, 1, 3, 3)], 10.0);
    let obs = field_with_blocks(30, 30, &[(20, 20, 22, 22)], 10.0);
    let mut config = test_config();
    config.max_centroid_dist = 10.0;

    let engine = run_engine(config, fcst, obs);
    assert!(engine.pairs().is_empty());
    assert!(engine.matches().is_empty());
    assert_eq!(engine.unmatched_fcst(), &[1]);
    assert_eq!(engine.unmatched_obs(), &[1]);
    assert_eq!(engine.contingency().object.fy_oy, 0);
    assert_eq!(engine.contingency().object.fy_on, 0);
    assert_eq!(engine.contingency().filter.fy_on, 9);
    assert_eq!(engine.contingency().filter.fn_oy, 9);
}

#[test]
fn test_contingency_counts_identical_fields() {
    let field = field_with_blocks(10, 10, &[(2, 2, 6, 6)], 10.0);
    let engine = run_engine(test_config(), field.clone(), field);
    let tables = engine.contingency();
    for counts in [tables.raw, tables.filter, tables.object] {
        assert_eq!(counts.fy_oy, 25);
        assert_eq!(counts.fy_on, 0);
        assert_eq!(counts.fn_oy, 0);
        assert_eq!(counts.fn_on, 75);
        assert_eq!(counts.total(), 100);
    }
}

#[test]
fn test_mask_missing_copies_bad_data() {
    let fcst = field_with_blocks(10, 10, &[(2, 2, 6, 6)], 10.0);
    let mut obs = fcst.clone();
    obs.put(BAD_DATA, 4, 4, 0);
    obs.put(BAD_DATA, 0, 0, 0);
    let mut config = test_config();
    config.mask_missing_flag = MaskMissing::Fcst;

    let mut engine = Engine::new(config, fcst, obs).unwrap();
    engine.convolve().unwrap();
    assert!(engine.fcst().raw.is_bad(4, 4, 0));
    assert!(engine.fcst().raw.is_bad(0, 0, 0));
    assert_eq!(engine.fcst().raw.n_valid(), 98);

    engine.run().unwrap();
    assert_eq!(engine.contingency().raw.total(), 98);
}

#[test]
fn test_raw_thresh_zeroes_before_convolution() {
    let mut fcst = field_with_blocks(10, 10, &[(2, 2, 6, 6)], 10.0);
    fcst.put(6.0, 2, 2, 0);
    let mut config = test_config();
    config.fcst.raw_thresh = Some(Threshold::ge(8.0));

    let mut engine = Engine::new(config, fcst.clone(), fcst).unwrap();
    engine.convolve().unwrap();
    assert_eq!(engine.fcst().convolved.get(2, 2, 0), 0.0);
    assert_eq!(engine.obs().convolved.get(2, 2, 0), 6.0);
    assert_eq!(engine.fcst().raw.get(2, 2, 0), 6.0);
}

#[test]
fn test_probability_field_is_rescaled() {
    let fcst = field_with_blocks(10, 10, &[(2, 2, 6, 6)], 80.0);
    let mut config = test_config();
    config.fcst.is_prob = true;
    config.fcst.conv_thresh = Threshold::ge(0.5);

    let mut engine = Engine::new(config, fcst.clone(), fcst).unwrap();
    engine.convolve().unwrap();
    assert!((engine.fcst().raw.get(3, 3, 0) - 0.8).abs() < 1e-12);
    assert!((engine.fcst().convolved.get(3, 3, 0) - 0.8).abs() < 1e-12);
    assert_eq!(engine.obs().convolved.get(3, 3, 0), 80.0);

    engine.run().unwrap();
    assert_eq!(engine.fcst().n_objects(), 1);
}

#[test]
fn test_probability_field_out_of_range_is_rejected() {
    let fcst = field_with_blocks(6, 6, &[(1, 1, 2, 2)], 150.0);
    let mut config = test_config();
    config.fcst.is_prob = true;

    let mut engine = Engine::new(config, fcst.clone(), fcst).unwrap();
    assert!(matches!(engine.convolve(), Err(Error::Config { .. })));
}

#[test]
fn test_cluster_ids_follow_matches() {
    let fcst = field_with_blocks(30, 10, &[(1, 1, 3, 3), (20, 1, 22, 3)], 10.0);
    let obs = field_with_blocks(30, 10, &[(1, 1, 3, 3)], 10.0);
    let mut config = test_config();
    config.max_centroid_dist = 5.0;

    let engine = run_engine(config, fcst, obs);
    // Labels follow the scan from the top-right corner.
    assert_eq!(engine.fcst().objects.get(21, 2, 0), 1);
    let ids = engine.cluster_ids(true);
    assert_eq!(ids.get(2, 2, 0), 1);
    assert_eq!(ids.get(21, 2, 0), 0);
    assert_eq!(engine.unmatched_fcst(), &[1]);
}
