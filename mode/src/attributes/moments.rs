//! Raw moment accumulation over object voxels.

use glam::{DVec2, DVec3};

use crate::error::{Error, Result};

/// Raw sums over member voxels, accumulated in one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Moments {
    pub n: f64,
    pub sx: f64,
    pub sy: f64,
    pub st: f64,
    pub sxx: f64,
    pub syy: f64,
    pub stt: f64,
    pub sxy: f64,
    pub sxt: f64,
    pub syt: f64,
}

impl Moments {
    #[inline]
    pub fn add(&mut self, x: f64, y: f64, t: f64) {
        self.n += 1.0;
        self.sx += x;
        self.sy += y;
        self.st += t;
        self.sxx += x * x;
        self.syy += y * y;
        self.stt += t * t;
        self.sxy += x * y;
        self.sxt += x * t;
        self.syt += y * t;
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0.0
    }

    pub fn centroid(&self) -> Result<DVec3> {
        if self.is_empty() {
            return Err(Error::EmptyObject {
                context: "centroid",
            });
        }
        Ok(DVec3::new(self.sx, self.sy, self.st) / self.n)
    }

    pub fn centroid_xy(&self) -> Result<DVec2> {
        self.centroid().map(|c| c.truncate())
    }

    /// Central second moments `(mu_xx, mu_yy, mu_xy)` in the x-y plane.
    pub fn central_xy(&self) -> Result<(f64, f64, f64)> {
        let c = self.centroid()?;
        let mxx = self.sxx / self.n - c.x * c.x;
        let myy = self.syy / self.n - c.y * c.y;
        let mxy = self.sxy / self.n - c.x * c.y;
        Ok((mxx.max(0.0), myy.max(0.0), mxy))
    }

    /// Major axis angle in degrees, in (-90, 90], counterclockwise from +x.
    pub fn axis_angle(&self) -> Result<f64> {
        let (mxx, myy, mxy) = self.central_xy()?;
        Ok(0.5 * (2.0 * mxy).atan2(mxx - myy).to_degrees())
    }

    /// `(length, width)` of the equivalent rectangle.
    ///
    /// A rectangle of `L x W` cells has axis variances `(L^2 - 1) / 12` and
    /// `(W^2 - 1) / 12`, so each axis is `sqrt(12 * lambda + 1)`.
    pub fn axis_lengths(&self) -> Result<(f64, f64)> {
        let (mxx, myy, mxy) = self.central_xy()?;
        let half_trace = 0.5 * (mxx + myy);
        let disc = (0.25 * (mxx - myy) * (mxx - myy) + mxy * mxy).sqrt();
        let major = (half_trace + disc).max(0.0);
        let minor = (half_trace - disc).max(0.0);
        Ok(((12.0 * major + 1.0).sqrt(), (12.0 * minor + 1.0).sqrt()))
    }
}
