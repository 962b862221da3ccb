use crate::math::matrix::Matrix;

/// Binary cross-entropy summed over the output column.
pub struct CrossEntropyLoss;

impl CrossEntropyLoss {
    /// L = sum(-t·ln(p) - (1 - t)·ln(1 - p))
    ///
    /// Terms that evaluate to NaN (e.g. `0 · ln(0)`) are skipped rather than
    /// poisoning the sum.
    pub fn loss(predicted: &Matrix, expected: &Matrix) -> f64 {
        predicted.zip_map(expected, |p, t| -t * p.ln() - (1.0 - t) * (1.0 - p).ln())
            .data
            .into_iter()
            .filter(|value| !value.is_nan())
            .sum()
    }

    /// Gradient w.r.t. the prediction under the sigmoid / softmax pairing
    /// used upstream: `predicted - expected`.
    pub fn derivative(predicted: &Matrix, expected: &Matrix) -> Matrix {
        predicted - expected
    }
}

/// Negative log-likelihood for one-hot targets.
pub struct NllLoss;

impl NllLoss {
    /// L = -sum(t·ln(p)), NaN terms skipped.
    pub fn loss(predicted: &Matrix, expected: &Matrix) -> f64 {
        -predicted.zip_map(expected, |p, t| t * p.ln())
            .data
            .into_iter()
            .filter(|value| !value.is_nan())
            .sum::<f64>()
    }

    pub fn derivative(predicted: &Matrix, expected: &Matrix) -> Matrix {
        predicted - expected
    }
}
