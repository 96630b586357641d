//! Pairwise attribute differences and total interest.

use common::{EPSILON, is_bad_data};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::attributes::ObjectAttributes;
use crate::attributes::polyline::polyline_distance;
use crate::config::{Config, InterestAttribute};

/// Raw attribute differences between two objects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairFeatures {
    pub centroid_dist: f64,
    pub boundary_dist: f64,
    pub convex_hull_dist: f64,
    /// Axis angle difference folded into [0, 90] degrees.
    pub angle_diff: f64,
    pub aspect_diff: f64,
    pub area_ratio: f64,
    /// Intersection area over union area.
    pub int_area_ratio: f64,
    pub curvature_ratio: f64,
    pub complexity_ratio: f64,
    pub inten_perc_ratio: f64,
}

impl PairFeatures {
    pub fn compute(a: &ObjectAttributes, b: &ObjectAttributes) -> Self {
        let mut angle_diff = (a.axis_angle - b.axis_angle).abs();
        if angle_diff > 90.0 {
            angle_diff = 180.0 - angle_diff;
        }
        let union = a.union_area(b);

        Self {
            centroid_dist: a.centroid.distance(b.centroid),
            boundary_dist: polyline_distance(&a.boundary, &b.boundary),
            convex_hull_dist: polyline_distance(&a.convex_hull, &b.convex_hull),
            angle_diff,
            aspect_diff: (a.aspect_ratio - b.aspect_ratio).abs(),
            area_ratio: ratio(a.area as f64, b.area as f64),
            int_area_ratio: if union == 0 {
                0.0
            } else {
                a.intersection_area(b) as f64 / union as f64
            },
            curvature_ratio: ratio(a.curvature, b.curvature),
            complexity_ratio: ratio(a.complexity, b.complexity),
            inten_perc_ratio: ratio(a.intensity.user, b.intensity.user),
        }
    }

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

/// `min / max` of two magnitudes; two zeros count as identical, bad data as nothing alike.
fn ratio(a: f64, b: f64) -> f64 {
    if is_bad_data(a) || is_bad_data(b) {
        return 0.0;
    }
    let (a, b) = (a.abs(), b.abs());
    let hi = a.max(b);
    if hi < EPSILON { 1.0 } else { a.min(b) / hi }
}

/// Interest of one forecast/observation object pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairInterest {
    /// 1-based forecast object number.
    pub fcst: u32,
    /// 1-based observation object number.
    pub obs: u32,
    pub features: PairFeatures,
    /// Interest per attribute with a non-zero weight.
    pub interests: Vec<(InterestAttribute, f64)>,
    pub total: f64,
}

impl PairInterest {
    pub fn is_match(&self, config: &Config) -> bool {
        self.total >= config.total_interest_thresh
    }
}

/// Weighted mean of the per-attribute interests over non-zero weights.
pub fn total_interest(features: &PairFeatures, config: &Config) -> (Vec<(InterestAttribute, f64)>, f64) {
    let mut interests = Vec::new();
    let mut weighted = 0.0;
    let mut weight_sum = 0.0;
    for attr in InterestAttribute::iter() {
        let w = config.weight.get(attr);
        if w <= 0.0 {
            continue;
        }
        let interest = config.interest_function.get(attr).eval(features.get(attr));
        interests.push((attr, interest));
        weighted += w * interest;
        weight_sum += w;
    }
    let total = if weight_sum > 0.0 { weighted / weight_sum } else { 0.0 };
    (interests, total)
}

/// Score one pair; `None` when the centroids are farther apart than `max_centroid_dist`.
pub fn score_pair(
    fcst: u32,
    obs: u32,
    a: &ObjectAttributes,
    b: &ObjectAttributes,
    config: &Config,
) -> Option<PairInterest> {
    if a.centroid.distance(b.centroid) > config.max_centroid_dist {
        return None;
    }
    let features = PairFeatures::compute(a, b);
    let (interests, total) = total_interest(&features, config);
    Some(PairInterest {
        fcst,
        obs,
        features,
        interests,
        total,
    })
}
