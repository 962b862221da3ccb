use crate::math::matrix::Matrix;

/// Sum of squared errors.
pub struct QuadraticLoss;

impl QuadraticLoss {
    pub fn loss(predicted: &Matrix, expected: &Matrix) -> f64 {
        (predicted - expected).map(|x| x * x).sum()
    }

    pub fn derivative(predicted: &Matrix, expected: &Matrix) -> Matrix {
        (predicted - expected) * 2.0
    }
}

/// Half the sum of squared errors; its gradient is the plain residual.
pub struct HalfQuadraticLoss;

impl HalfQuadraticLoss {
    pub fn loss(predicted: &Matrix, expected: &Matrix) -> f64 {
        QuadraticLoss::loss(predicted, expected) / 2.0
    }

    pub fn derivative(predicted: &Matrix, expected: &Matrix) -> Matrix {
        predicted - expected
    }
}
