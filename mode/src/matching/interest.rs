//! Piecewise-linear interest functions.

use common::is_bad_data;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Monotone piecewise-linear map from an attribute value to interest in [0, 1].
///
/// Breakpoints have strictly increasing x and y in [0, 1]; outside the
/// breakpoints the function is clamped to the first/last y.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<(f64, f64)>", into = "Vec<(f64, f64)>")]
pub struct PiecewiseLinear {
    points: Vec<(f64, f64)>,
}

impl PiecewiseLinear {
    pub fn new(points: Vec<(f64, f64)>) -> Result<Self> {
        let f = Self { points };
        f.validate()?;
        Ok(f)
    }

    /// Breakpoints taken as-is; callers run [`PiecewiseLinear::validate`].
    pub(crate) fn from_points_unchecked(points: Vec<(f64, f64)>) -> Self {
        Self { points }
    }

    pub fn validate(&self) -> Result<()> {
        let points = &self.points;
        let reason = if points.is_empty() {
            Some("needs at least one breakpoint".to_string())
        } else if let Some(w) = points.windows(2).find(|w| !(w[1].0 > w[0].0)) {
            Some(format!(
                "x values must be strictly increasing, got {} then {}",
                w[0].0, w[1].0
            ))
        } else if let Some(p) = points.iter().find(|p| !(0.0..=1.0).contains(&p.1)) {
            Some(format!("y value {} outside [0, 1]", p.1))
        } else {
            let rising = points.windows(2).all(|w| w[1].1 >= w[0].1);
            let falling = points.windows(2).all(|w| w[1].1 <= w[0].1);
            (!rising && !falling).then(|| "y values must be monotone".to_string())
        };

        match reason {
            Some(reason) => Err(Error::config("interest_function", reason)),
            None => Ok(()),
        }
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// Interest at `x`. Bad data maps to zero interest.
    pub fn eval(&self, x: f64) -> f64 {
        if is_bad_data(x) {
            return 0.0;
        }
        let first = self.points[0];
        let last = self.points[self.points.len() - 1];
        if x <= first.0 {
            return first.1;
        }
        if x >= last.0 {
            return last.1;
        }

        let seg = self
            .points
            .windows(2)
            .find(|w| x <= w[1].0)
            .map(|w| (w[0], w[1]))
            .unwrap_or((last, last));
        let ((x0, y0), (x1, y1)) = seg;
        y0 + (y1 - y0) * (x - x0) / (x1 - x0)
    }
}

impl TryFrom<Vec<(f64, f64)>> for PiecewiseLinear {
    type Error = Error;

    fn try_from(points: Vec<(f64, f64)>) -> Result<Self> {
        Self::new(points)
    }
}

impl From<PiecewiseLinear> for Vec<(f64, f64)> {
    fn from(f: PiecewiseLinear) -> Self {
        f.points
    }
}
