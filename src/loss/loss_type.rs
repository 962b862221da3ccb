use serde::{Serialize, Deserialize};

use crate::error::{NnError, Result};
use crate::layers::dense::Layer;
use crate::loss::cross_entropy::{CrossEntropyLoss, NllLoss};
use crate::loss::mae::MaeLoss;
use crate::loss::mse::MseLoss;
use crate::loss::quadratic::{HalfQuadraticLoss, QuadraticLoss};
use crate::math::matrix::Matrix;

/// Selects the loss function a network is trained against.
///
/// - `Mae`            - mean absolute error.
/// - `Mse`            - mean squared error.
/// - `Quadratic`      - sum of squared errors.
/// - `HalfQuadratic`  - half the sum of squared errors.
/// - `CrossEntropy`   - binary cross-entropy; pair with Sigmoid output.
/// - `Nll`            - negative log-likelihood; pair with Softmax output.
///
/// `CrossEntropy` and `Nll` both report `predicted - expected` as their
/// derivative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossType {
    Mae,
    Mse,
    Quadratic,
    HalfQuadratic,
    CrossEntropy,
    Nll,
}

impl LossType {
    /// Scalar loss for one prediction column.
    pub fn loss(&self, predicted: &Matrix, expected: &Matrix) -> f64 {
        match self {
            LossType::Mae           => MaeLoss::loss(predicted, expected),
            LossType::Mse           => MseLoss::loss(predicted, expected),
            LossType::Quadratic     => QuadraticLoss::loss(predicted, expected),
            LossType::HalfQuadratic => HalfQuadraticLoss::loss(predicted, expected),
            LossType::CrossEntropy  => CrossEntropyLoss::loss(predicted, expected),
            LossType::Nll           => NllLoss::loss(predicted, expected),
        }
    }

    /// ∂loss/∂prediction for one prediction column.
    pub fn derivative(&self, predicted: &Matrix, expected: &Matrix) -> Matrix {
        match self {
            LossType::Mae           => MaeLoss::derivative(predicted, expected),
            LossType::Mse           => MseLoss::derivative(predicted, expected),
            LossType::Quadratic     => QuadraticLoss::derivative(predicted, expected),
            LossType::HalfQuadratic => HalfQuadraticLoss::derivative(predicted, expected),
            LossType::CrossEntropy  => CrossEntropyLoss::derivative(predicted, expected),
            LossType::Nll           => NllLoss::derivative(predicted, expected),
        }
    }

    /// Local gradient at the layer's pre-activation:
    /// `σ'(weighted_sum) ⊙ error`.
    ///
    /// Reads the caches written by the layer's most recent `forward`, so it
    /// must run before any other example is pushed through that layer.
    pub fn backward(&self, layer: &Layer, error: &Matrix) -> Matrix {
        let mut gradient = layer.activation_derivative();
        gradient.hadamard_in_place(error);
        gradient
    }

    /// Replaces `error` with `Wᵀ × error`, the signal for the previous layer.
    ///
    /// Must see the layer's weights before the optimizer updates them.
    pub fn propagate_error(&self, layer: &Layer, error: &mut Matrix) {
        *error = &layer.weights.transpose() * &*error;
    }

    pub fn tag(&self) -> i32 {
        match self {
            LossType::Mae => 0,
            LossType::Mse => 1,
            LossType::Quadratic => 2,
            LossType::HalfQuadratic => 3,
            LossType::CrossEntropy => 4,
            LossType::Nll => 5,
        }
    }

    pub fn from_tag(tag: i32) -> Result<Self> {
        match tag {
            0 => Ok(LossType::Mae),
            1 => Ok(LossType::Mse),
            2 => Ok(LossType::Quadratic),
            3 => Ok(LossType::HalfQuadratic),
            4 => Ok(LossType::CrossEntropy),
            5 => Ok(LossType::Nll),
            _ => Err(NnError::UnknownTag { kind: "loss", tag }),
        }
    }
}
