//! Merging simple objects into clusters and matching clusters across fields.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use super::features::{PairInterest, score_pair};
use crate::attributes::ObjectAttributes;
use crate::config::{Config, MatchType};
use crate::labeling::ObjectField;
use crate::partition::Partition;

// ============================================================================
// Clusters
// ============================================================================

/// Grouping of objects `1..=n` into clusters.
///
/// Clusters are ordered by their lowest member and members are sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clusters {
    members: Vec<Vec<u32>>,
    cluster_of: Vec<usize>,
}

impl Clusters {
    /// Every object in its own cluster.
    pub fn singletons(n_objects: usize) -> Self {
        Self {
            members: (1..=n_objects as u32).map(|k| vec![k]).collect(),
            cluster_of: (0..n_objects).collect(),
        }
    }

    /// Clusters from a partition over object numbers `1..=n_objects`.
    ///
    /// Objects missing from the partition become singletons.
    pub fn from_partition(n_objects: usize, partition: &Partition) -> Self {
        let mut members: Vec<Vec<u32>> = Vec::new();
        let mut class_to_cluster: HashMap<usize, usize> = HashMap::new();
        let mut cluster_of = vec![0; n_objects];

        for k in 1..=n_objects as u32 {
            let cluster = match partition.which_class(k) {
                Some(class) => *class_to_cluster.entry(class).or_insert_with(|| {
                    members.push(Vec::new());
                    members.len() - 1
                }),
                None => {
                    members.push(Vec::new());
                    members.len() - 1
                }
            };
            members[cluster].push(k);
            cluster_of[k as usize - 1] = cluster;
        }
        Self {
            members,
            cluster_of,
        }
    }

    pub fn n_clusters(&self) -> usize {
        self.members.len()
    }

    pub fn n_objects(&self) -> usize {
        self.cluster_of.len()
    }

    pub fn members(&self, cluster: usize) -> &[u32] {
        &self.members[cluster]
    }

    pub fn iter(&self) -> impl Iterator<Item = &[u32]> {
        self.members.iter().map(|m| m.as_slice())
    }

    /// 0-based cluster of 1-based object `k`.
    pub fn cluster_of(&self, k: u32) -> usize {
        self.cluster_of[k as usize - 1]
    }
}

/// Partition with every object `1..=n_objects` registered.
pub fn object_partition(n_objects: usize) -> Partition {
    let mut partition = Partition::new();
    for k in 1..=n_objects as u32 {
        partition.add_no_repeat(k);
    }
    partition
}

// ============================================================================
// Merging
// ============================================================================

/// Double-threshold merging: simple objects covered by the same object of
/// the looser `merge_objects` labeling end up in one class.
pub fn thresh_merge(objects: &ObjectField, merge_objects: &ObjectField, partition: &mut Partition) {
    debug_assert_eq!(objects.dims(), merge_objects.dims());
    let mut first_object: HashMap<u32, u32> = HashMap::new();
    for (&k, &m) in objects
        .labels()
        .data()
        .iter()
        .zip(merge_objects.labels().data())
    {
        if k == 0 || m == 0 {
            continue;
        }
        let first = *first_object.entry(m).or_insert(k);
        partition.merge_values(first, k);
    }
}

/// Fuzzy-engine merging: objects of one field whose mutual interest reaches
/// `total_interest_thresh` end up in one class.
pub fn engine_merge(attributes: &[ObjectAttributes], config: &Config, partition: &mut Partition) {
    for (i, a) in attributes.iter().enumerate() {
        for (j, b) in attributes.iter().enumerate().skip(i + 1) {
            let (ki, kj) = (i as u32 + 1, j as u32 + 1);
            let linked = score_pair(ki, kj, a, b, config).is_some_and(|p| p.is_match(config));
            if linked {
                partition.merge_values(ki, kj);
            }
        }
    }
}

// ============================================================================
// Matching
// ============================================================================

/// Forecast and observation objects matched to each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedPair {
    pub fcst_objects: Vec<u32>,
    pub obs_objects: Vec<u32>,
    /// Total interest between the merged forecast and observation shapes.
    pub interest: f64,
}

/// Object groups produced by a match policy, before cluster interest is computed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchGroups {
    pub groups: Vec<(Vec<u32>, Vec<u32>)>,
    pub unmatched_fcst: Vec<u32>,
    pub unmatched_obs: Vec<u32>,
}

/// Group objects according to `match_flag`.
///
/// Unmatched objects are listed, never errors.
pub fn match_groups(
    match_flag: MatchType,
    pairs: &[PairInterest],
    fcst_clusters: &Clusters,
    obs_clusters: &Clusters,
    config: &Config,
) -> MatchGroups {
    let n_fcst = fcst_clusters.n_objects();
    let n_obs = obs_clusters.n_objects();
    let matching: Vec<&PairInterest> = pairs.iter().filter(|p| p.is_match(config)).collect();

    let groups = match match_flag {
        MatchType::None => Vec::new(),
        MatchType::NoMerge => {
            greedy_one_to_one(&cluster_scores(&matching, fcst_clusters, obs_clusters))
        }
        MatchType::MergeFcst => {
            best_obs_cluster(&cluster_scores(&matching, fcst_clusters, obs_clusters))
        }
        MatchType::MergeBoth => linked_components(&matching, fcst_clusters, obs_clusters),
    }
    .into_iter()
    .map(|(fcst, obs)| {
        (
            cluster_members(fcst_clusters, &fcst),
            cluster_members(obs_clusters, &obs),
        )
    })
    .collect::<Vec<_>>();

    let mut fcst_used = vec![false; n_fcst];
    let mut obs_used = vec![false; n_obs];
    for (fcst, obs) in &groups {
        fcst.iter().for_each(|&k| fcst_used[k as usize - 1] = true);
        obs.iter().for_each(|&k| obs_used[k as usize - 1] = true);
    }
    let unused = |used: &[bool]| -> Vec<u32> {
        used.iter()
            .enumerate()
            .filter(|(_, u)| !**u)
            .map(|(k, _)| k as u32 + 1)
            .collect()
    };

    MatchGroups {
        unmatched_fcst: unused(&fcst_used),
        unmatched_obs: unused(&obs_used),
        groups,
    }
}

/// Best member-pair interest between a forecast and an observation cluster.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ClusterScore {
    fcst: usize,
    obs: usize,
    total: f64,
}

/// One score per cluster pair linked by at least one matching object pair,
/// ordered by `(fcst, obs)` cluster index.
fn cluster_scores(
    matching: &[&PairInterest],
    fcst_clusters: &Clusters,
    obs_clusters: &Clusters,
) -> Vec<ClusterScore> {
    let mut best: HashMap<(usize, usize), f64> = HashMap::new();
    for pair in matching {
        let key = (
            fcst_clusters.cluster_of(pair.fcst),
            obs_clusters.cluster_of(pair.obs),
        );
        let total = best.entry(key).or_insert(pair.total);
        *total = total.max(pair.total);
    }
    let mut scores: Vec<ClusterScore> = best
        .into_iter()
        .map(|((fcst, obs), total)| ClusterScore { fcst, obs, total })
        .collect();
    scores.sort_by_key(|s| (s.fcst, s.obs));
    scores
}

/// Sorted objects of the listed clusters.
fn cluster_members(clusters: &Clusters, listed: &[usize]) -> Vec<u32> {
    let mut members: Vec<u32> = listed
        .iter()
        .flat_map(|&c| clusters.members(c).iter().copied())
        .collect();
    members.sort_unstable();
    members
}

/// Cluster pairs taken in descending interest, each cluster used at most once.
fn greedy_one_to_one(scores: &[ClusterScore]) -> Vec<(Vec<usize>, Vec<usize>)> {
    let mut sorted = scores.to_vec();
    sorted.sort_by(|a, b| {
        b.total
            .total_cmp(&a.total)
            .then(a.fcst.cmp(&b.fcst))
            .then(a.obs.cmp(&b.obs))
    });

    let mut fcst_taken = hashbrown::HashSet::new();
    let mut obs_taken = hashbrown::HashSet::new();
    let mut groups = Vec::new();
    for score in sorted {
        if fcst_taken.contains(&score.fcst) || obs_taken.contains(&score.obs) {
            continue;
        }
        fcst_taken.insert(score.fcst);
        obs_taken.insert(score.obs);
        groups.push((vec![score.fcst], vec![score.obs]));
    }
    groups
}

/// Each forecast cluster joins its best observation cluster; forecast
/// clusters sharing an observation cluster form one group.
fn best_obs_cluster(scores: &[ClusterScore]) -> Vec<(Vec<usize>, Vec<usize>)> {
    let mut best: Vec<ClusterScore> = Vec::new();
    for &score in scores {
        match best.iter_mut().find(|b| b.fcst == score.fcst) {
            Some(b) if score.total > b.total => *b = score,
            Some(_) => {}
            None => best.push(score),
        }
    }

    let mut by_obs: Vec<(usize, Vec<usize>)> = Vec::new();
    for score in best {
        match by_obs.iter_mut().find(|(obs, _)| *obs == score.obs) {
            Some((_, fcst)) => fcst.push(score.fcst),
            None => by_obs.push((score.obs, vec![score.fcst])),
        }
    }
    by_obs.into_iter().map(|(obs, fcst)| (fcst, vec![obs])).collect()
}

/// Connected components of the bipartite graph of clusters linked by
/// matching pairs.
fn linked_components(
    matching: &[&PairInterest],
    fcst_clusters: &Clusters,
    obs_clusters: &Clusters,
) -> Vec<(Vec<usize>, Vec<usize>)> {
    // Forecast clusters are 1..=n_fcst, observation clusters follow them.
    let n_fcst = fcst_clusters.n_clusters();
    let mut partition = object_partition(n_fcst + obs_clusters.n_clusters());
    for pair in matching {
        let f = fcst_clusters.cluster_of(pair.fcst) + 1;
        let o = n_fcst + obs_clusters.cluster_of(pair.obs) + 1;
        partition.merge_values(f as u32, o as u32);
    }

    partition
        .classes()
        .filter_map(|class| {
            let mut fcst: Vec<usize> = Vec::new();
            let mut obs: Vec<usize> = Vec::new();
            for &k in class {
                let k = k as usize - 1;
                if k < n_fcst {
                    fcst.push(k);
                } else {
                    obs.push(k - n_fcst);
                }
            }
            if fcst.is_empty() || obs.is_empty() {
                return None;
            }
            fcst.sort_unstable();
            obs.sort_unstable();
            Some((fcst, obs))
        })
        .collect()
}
