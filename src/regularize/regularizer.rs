use serde::{Serialize, Deserialize};

use crate::error::{NnError, Result};
use crate::math::matrix::Matrix;

pub const DEFAULT_L1: f64 = 0.01;
pub const DEFAULT_L2: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegularizerType {
    #[default]
    None,
    L1,
    L2,
    L1L2,
}

impl RegularizerType {
    pub fn tag(&self) -> i32 {
        match self {
            RegularizerType::None => 0,
            RegularizerType::L1 => 1,
            RegularizerType::L2 => 2,
            RegularizerType::L1L2 => 3,
        }
    }

    pub fn from_tag(tag: i32) -> Result<Self> {
        match tag {
            0 => Ok(RegularizerType::None),
            1 => Ok(RegularizerType::L1),
            2 => Ok(RegularizerType::L2),
            3 => Ok(RegularizerType::L1L2),
            _ => Err(NnError::UnknownTag { kind: "regularizer", tag }),
        }
    }
}

/// Weight-decay term added to an averaged weight gradient.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Regularizer {
    pub kind: RegularizerType,
    pub l1: f64,
    pub l2: f64,
}

impl Regularizer {
    pub fn new(kind: RegularizerType) -> Self {
        Regularizer { kind, l1: DEFAULT_L1, l2: DEFAULT_L2 }
    }

    pub fn with_strength(kind: RegularizerType, l1: f64, l2: f64) -> Self {
        Regularizer { kind, l1, l2 }
    }

    /// Adds the penalty gradient for `weights` into `gradient`:
    /// L1 `sign(w)·λ₁`, L2 `2λ₂·w`, L1L2 both. `sign(0) = 0`.
    pub fn regularize(&self, weights: &Matrix, gradient: &mut Matrix) {
        let (l1, l2) = match self.kind {
            RegularizerType::None => return,
            RegularizerType::L1 => (self.l1, 0.0),
            RegularizerType::L2 => (0.0, self.l2),
            RegularizerType::L1L2 => (self.l1, self.l2),
        };
        *gradient += &weights.map(|w| sign(w) * l1 + 2.0 * l2 * w);
    }
}

impl Default for Regularizer {
    fn default() -> Self {
        Regularizer::new(RegularizerType::None)
    }
}

impl From<RegularizerType> for Regularizer {
    fn from(kind: RegularizerType) -> Self {
        Regularizer::new(kind)
    }
}

// f64::signum maps 0.0 to 1.0.
fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}
