use serde::{Serialize, Deserialize};

use crate::error::{NnError, Result};
use crate::math::matrix::Matrix;

/// Default slope / scale for `LeakyReLU` and `Elu`.
pub const DEFAULT_ALPHA: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ActivationFunction {
    Sigmoid,
    ReLU,
    LeakyReLU { alpha: f64 },
    Elu { alpha: f64 },
    Tanh,
    /// Normalises a whole column: `exp(z_i) / sum_j exp(z_j)`.
    Softmax,
}

impl ActivationFunction {
    pub fn leaky_relu() -> Self {
        ActivationFunction::LeakyReLU { alpha: DEFAULT_ALPHA }
    }

    pub fn elu() -> Self {
        ActivationFunction::Elu { alpha: DEFAULT_ALPHA }
    }

    /// The slope / scale of `LeakyReLU` and `Elu`, `None` for the others.
    pub fn alpha(&self) -> Option<f64> {
        match *self {
            ActivationFunction::LeakyReLU { alpha } | ActivationFunction::Elu { alpha } => Some(alpha),
            _ => None,
        }
    }

    /// Applies the activation to a weighted-sum column.
    pub fn function(&self, z: &Matrix) -> Matrix {
        match *self {
            ActivationFunction::Sigmoid => z.map(|x| 1.0 / (1.0 + (-x).exp())),
            ActivationFunction::ReLU => z.map(|x| if x >= 0.0 { x } else { 0.0 }),
            ActivationFunction::LeakyReLU { alpha } => z.map(|x| if x >= 0.0 { x } else { alpha * x }),
            ActivationFunction::Elu { alpha } => {
                z.map(|x| if x >= 0.0 { x } else { alpha * (x.exp() - 1.0) })
            }
            ActivationFunction::Tanh => z.map(f64::tanh),
            ActivationFunction::Softmax => softmax(z),
        }
    }

    /// Derivative of the activation at `z`.
    ///
    /// Sigmoid, Tanh and Softmax are expressed through `activation`, the output
    /// of the `function` call on the same `z`; the other variants read `z`
    /// directly. Softmax uses the diagonal term `y * (1 - y)` only.
    pub fn derivative(&self, z: &Matrix, activation: &Matrix) -> Matrix {
        match *self {
            ActivationFunction::Sigmoid | ActivationFunction::Softmax => {
                activation.map(|y| y * (1.0 - y))
            }
            ActivationFunction::Tanh => activation.map(|y| 1.0 - y * y),
            ActivationFunction::ReLU => z.map(|x| if x >= 0.0 { 1.0 } else { 0.0 }),
            ActivationFunction::LeakyReLU { alpha } => z.map(|x| if x >= 0.0 { 1.0 } else { alpha }),
            ActivationFunction::Elu { alpha } => {
                z.map(|x| if x >= 0.0 { 1.0 } else { alpha * x.exp() })
            }
        }
    }

    /// Numeric tag stored in the binary model file.
    pub fn tag(&self) -> i32 {
        match self {
            ActivationFunction::Sigmoid => 0,
            ActivationFunction::ReLU => 1,
            ActivationFunction::LeakyReLU { .. } => 2,
            ActivationFunction::Elu { .. } => 3,
            ActivationFunction::Tanh => 4,
            ActivationFunction::Softmax => 5,
        }
    }

    /// Inverse of [`tag`](Self::tag); parameterised variants get `DEFAULT_ALPHA`.
    pub fn from_tag(tag: i32) -> Result<Self> {
        match tag {
            0 => Ok(ActivationFunction::Sigmoid),
            1 => Ok(ActivationFunction::ReLU),
            2 => Ok(ActivationFunction::leaky_relu()),
            3 => Ok(ActivationFunction::elu()),
            4 => Ok(ActivationFunction::Tanh),
            5 => Ok(ActivationFunction::Softmax),
            _ => Err(NnError::UnknownTag { kind: "activation", tag }),
        }
    }
}

/// Column-wise softmax, shifted by the column maximum so `exp` cannot overflow.
fn softmax(z: &Matrix) -> Matrix {
    let mut res = Matrix::zeros(z.rows, z.cols);
    for j in 0..z.cols {
        let max = (0..z.rows)
            .map(|i| z.get(i, j))
            .fold(f64::NEG_INFINITY, f64::max);
        let mut sum = 0.0;
        for i in 0..z.rows {
            let e = (z.get(i, j) - max).exp();
            res.set(i, j, e);
            sum += e;
        }
        for i in 0..z.rows {
            res.set(i, j, res.get(i, j) / sum);
        }
    }
    res
}
