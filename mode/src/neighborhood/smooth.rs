//! Box smoothing and circular convolution.

use common::{BAD_DATA, is_bad_data};
use tracing::debug;

use super::{InterpMethod, check_width, per_slice};
use crate::error::Result;
use crate::grid::DataPlane;

/// Smooth `field` with `method` over a centered `wdth x wdth` box.
///
/// A point is bad data when fewer than `vld_thresh` of its box is valid.
/// `wdth <= 1` returns an unchanged copy.
pub fn smooth_field(
    field: &DataPlane,
    method: InterpMethod,
    wdth: usize,
    vld_thresh: f64,
) -> Result<DataPlane> {
    if wdth <= 1 {
        return Ok(field.clone());
    }
    check_width("smooth_field.wdth", wdth)?;
    debug!("Smoothing field with {method}({} points)", wdth * wdth);

    per_slice(field, |slice| {
        let (nx, ny) = (slice.nx(), slice.ny());
        let half = (wdth / 2) as isize;
        let area = (wdth * wdth) as f64;
        let mut out = slice.clone();
        let mut values = Vec::with_capacity(wdth * wdth);

        for y in 0..ny {
            for x in 0..nx {
                values.clear();
                for dy in -half..=half {
                    for dx in -half..=half {
                        if let Some(v) = sample(slice, x as isize + dx, y as isize + dy) {
                            values.push(v);
                        }
                    }
                }
                let v = if values.is_empty() || (values.len() as f64) / area < vld_thresh {
                    BAD_DATA
                } else {
                    box_statistic(method, &mut values)
                };
                out.put(v, x, y, 0);
            }
        }
        Ok(out)
    })
}

/// Average over a disk of `radius` grid squares, as used for MODE's
/// raw-to-convolved step.
///
/// Only in-grid disk points count toward the valid fraction. A bad center
/// point stays bad. `radius == 0` returns an unchanged copy.
pub fn convolve_circular(field: &DataPlane, radius: usize, vld_thresh: f64) -> Result<DataPlane> {
    if radius == 0 {
        return Ok(field.clone());
    }
    let r = radius as isize;
    let offsets: Vec<(isize, isize)> = (-r..=r)
        .flat_map(|dy| (-r..=r).map(move |dx| (dx, dy)))
        .filter(|&(dx, dy)| dx * dx + dy * dy <= r * r)
        .collect();
    debug!(radius, n_offsets = offsets.len(), "Convolving field");

    per_slice(field, |slice| {
        let (nx, ny) = (slice.nx(), slice.ny());
        let mut out = DataPlane::new_bad(nx, ny, 1).with_projection(slice.projection().copied());

        for y in 0..ny {
            for x in 0..nx {
                if slice.is_bad(x, y, 0) {
                    continue;
                }
                let mut n_in_grid = 0usize;
                let mut n_valid = 0usize;
                let mut sum = 0.0;
                for &(dx, dy) in &offsets {
                    let (xx, yy) = (x as isize + dx, y as isize + dy);
                    if xx < 0 || yy < 0 || xx as usize >= nx || yy as usize >= ny {
                        continue;
                    }
                    n_in_grid += 1;
                    let v = slice.get(xx as usize, yy as usize, 0);
                    if !is_bad_data(v) {
                        n_valid += 1;
                        sum += v;
                    }
                }
                if n_valid > 0 && (n_valid as f64) / (n_in_grid as f64) >= vld_thresh {
                    out.put(sum / n_valid as f64, x, y, 0);
                }
            }
        }
        Ok(out)
    })
}

#[inline]
fn sample(field: &DataPlane, x: isize, y: isize) -> Option<f64> {
    if x < 0 || y < 0 || x as usize >= field.nx() || y as usize >= field.ny() {
        return None;
    }
    let v = field.get(x as usize, y as usize, 0);
    (!is_bad_data(v)).then_some(v)
}

/// `values` must be non-empty; it is reordered in place.
fn box_statistic(method: InterpMethod, values: &mut [f64]) -> f64 {
    match method {
        InterpMethod::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
        InterpMethod::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        InterpMethod::UwMean => values.iter().sum::<f64>() / values.len() as f64,
        InterpMethod::Median => {
            values.sort_unstable_by(|a, b| a.total_cmp(b));
            let mid = values.len() / 2;
            if values.len() % 2 == 1 {
                values[mid]
            } else {
                0.5 * (values[mid - 1] + values[mid])
            }
        }
    }
}
