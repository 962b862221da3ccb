use crate::math::matrix::Matrix;

pub struct MaeLoss;

impl MaeLoss {
    /// Scalar MAE: mean(|predicted - expected|)
    pub fn loss(predicted: &Matrix, expected: &Matrix) -> f64 {
        (predicted - expected).map(f64::abs).sum() / predicted.len() as f64
    }

    /// Per-output subgradient: sign(p - y) / n  (0 when equal)
    pub fn derivative(predicted: &Matrix, expected: &Matrix) -> Matrix {
        let n = predicted.len() as f64;
        (predicted - expected).map(|diff| {
            if diff > 0.0 { 1.0 / n } else if diff < 0.0 { -1.0 / n } else { 0.0 }
        })
    }
}
