//! Neighborhood statistics over gridded fields.
//!
//! - [`fractional_coverage`]: fraction of threshold-passing cells in a box,
//!   updated incrementally along each column.
//! - [`smooth_field`]: min / max / median / mean over a box.
//! - [`convolve_circular`]: disk average used to turn raw fields into
//!   convolved fields before object identification.
//!
//! Every routine works one time slice at a time.


mod coverage;
mod smooth;

use common::{BAD_DATA, is_bad_data};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};
use tracing::debug;

use crate::error::{Error, Result};
use crate::grid::DataPlane;

pub use coverage::fractional_coverage;
pub use smooth::{convolve_circular, smooth_field};

/// Statistic computed over a smoothing box.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InterpMethod {
    Min,
    Max,
    Median,
    /// Unweighted mean.
    #[default]
    UwMean,
}

/// Copy bad data from `mask` into `field`.
pub fn mask_bad_data(field: &mut DataPlane, mask: &DataPlane) -> Result<()> {
    if field.dims() != mask.dims() {
        return Err(Error::DimensionMismatch {
            context: "mask_bad_data",
            expected: field.dims(),
            actual: mask.dims(),
        });
    }
    for (v, &m) in field.data_mut().iter_mut().zip(mask.data()) {
        if is_bad_data(m) {
            *v = BAD_DATA;
        }
    }
    Ok(())
}

/// Rescale a probability field from percent to [0, 1] if needed.
///
/// Fields whose valid values already lie in [0, 1] are left alone.
pub fn rescale_probability(field: &mut DataPlane) -> Result<()> {
    const TOL: f64 = 1e-5;

    let Some((min_v, max_v)) = field.data_range() else {
        return Ok(());
    };
    if min_v < -TOL || max_v > 100.0 + TOL {
        return Err(Error::config(
            "probability",
            format!("invalid range of data for a probability field: [{min_v}, {max_v}]"),
        ));
    }
    if max_v > 1.0 {
        debug!("Rescaling probability field from [0, 100] to [0, 1]");
        for v in field.data_mut().iter_mut().filter(|v| !is_bad_data(**v)) {
            *v /= 100.0;
        }
    }
    Ok(())
}

/// Apply a single-slice operation to every time slice of `field`.
fn per_slice<F>(field: &DataPlane, mut op: F) -> Result<DataPlane>
where
    F: FnMut(&DataPlane) -> Result<DataPlane>,
{
    if field.nt() == 1 {
        return op(field);
    }
    let mut out = field.clone();
    for t in 0..field.nt() {
        let slice = op(&field.const_t_slice(t))?;
        out.put_t_slice(&slice, t);
    }
    Ok(out)
}

/// Odd box width check shared by the box statistics.
fn check_width(key: &str, wdth: usize) -> Result<()> {
    if wdth == 0 || wdth % 2 == 0 {
        return Err(Error::config(
            key,
            format!("box width must be odd and at least 1, got {wdth}"),
        ));
    }
    Ok(())
}
