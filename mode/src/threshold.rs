//! Scalar threshold predicate used to turn raw fields into object masks.

use std::fmt;

use common::{FloatExt, is_bad_data};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

/// Comparison applied by a [`Threshold`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ThreshOp {
    Lt,
    Le,
    Eq,
    Ne,
    Gt,
    #[default]
    Ge,
    /// No threshold: every valid value passes.
    Na,
}

impl ThreshOp {
    fn symbol(self) -> &'static str {
        match self {
            ThreshOp::Lt => "<",
            ThreshOp::Le => "<=",
            ThreshOp::Eq => "==",
            ThreshOp::Ne => "!=",
            ThreshOp::Gt => ">",
            ThreshOp::Ge => ">=",
            ThreshOp::Na => "NA",
        }
    }
}

/// `value <op> threshold` predicate. Bad data never passes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Threshold {
    pub op: ThreshOp,
    #[serde(default)]
    pub value: f64,
}

impl Threshold {
    pub const NA: Threshold = Threshold {
        op: ThreshOp::Na,
        value: 0.0,
    };

    pub fn new(op: ThreshOp, value: f64) -> Self {
        Self { op, value }
    }

    pub fn ge(value: f64) -> Self {
        Self::new(ThreshOp::Ge, value)
    }

    pub fn gt(value: f64) -> Self {
        Self::new(ThreshOp::Gt, value)
    }

    pub fn lt(value: f64) -> Self {
        Self::new(ThreshOp::Lt, value)
    }

    #[inline]
    pub fn check(&self, v: f64) -> bool {
        if is_bad_data(v) {
            return false;
        }
        match self.op {
            ThreshOp::Lt => v < self.value,
            ThreshOp::Le => v <= self.value,
            ThreshOp::Eq => v.approximately_eq(self.value),
            ThreshOp::Ne => !v.approximately_eq(self.value),
            ThreshOp::Gt => v > self.value,
            ThreshOp::Ge => v >= self.value,
            ThreshOp::Na => true,
        }
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.op {
            ThreshOp::Na => write!(f, "NA"),
            op => write!(f, "{}{}", op.symbol(), self.value),
        }
    }
}
