use crate::math::matrix::Matrix;

pub struct MseLoss;

impl MseLoss {
    /// Scalar MSE: mean((predicted - expected)²)
    pub fn loss(predicted: &Matrix, expected: &Matrix) -> f64 {
        (predicted - expected).map(|x| x * x).sum() / predicted.len() as f64
    }

    /// Per-output gradient: 2·(predicted - expected) / n
    pub fn derivative(predicted: &Matrix, expected: &Matrix) -> Matrix {
        (predicted - expected) * (2.0 / predicted.len() as f64)
    }
}
