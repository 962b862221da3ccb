use crate::{math::matrix::Matrix, layers::dense::Layer};
use crate::optim::adam::Moments;
use crate::optim::amsgrad::AmsGradState;
use crate::optim::slots::LayerSlots;
use crate::optim::{bias_correction, Optimizer, OptimizerType, EPSILON};

/// Dynamic clamp on the per-parameter step size.
///
/// Both bounds converge to `final_lr` as the epoch grows; `gamma` sets how
/// quickly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepBounds {
    pub step_size: f64,
    pub lower: f64,
    pub upper: f64,
}

impl StepBounds {
    pub fn at(learning_rate: f64, beta1: f64, beta2: f64, final_lr: f64, gamma: f64, epoch: usize) -> StepBounds {
        let t = epoch.max(1) as f64;
        StepBounds {
            step_size: learning_rate * bias_correction(beta2, epoch).sqrt() / bias_correction(beta1, epoch),
            lower: final_lr * (1.0 - 1.0 / (gamma * t + 1.0)),
            upper: final_lr * (1.0 + 1.0 / (gamma * t)),
        }
    }

    /// `m ⊙ clamp(step_size / (√v + ε), lower, upper)`.
    fn apply(&self, first: &Matrix, second: &Matrix) -> Matrix {
        let rates = second.map(|v| (self.step_size / (v.sqrt() + EPSILON)).max(self.lower).min(self.upper));
        first.hadamard(&rates)
    }
}

/// Adam with the step size clamped into bounds that tighten around `final_lr`.
#[derive(Debug, Clone)]
pub struct Adabound {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub final_lr: f64,
    pub gamma: f64,
    moments: LayerSlots<Moments>,
}

impl Adabound {
    pub fn new(learning_rate: f64, beta1: f64, beta2: f64, final_lr: f64, gamma: f64) -> Adabound {
        Adabound { learning_rate, beta1, beta2, final_lr, gamma, moments: LayerSlots::new() }
    }

    fn bounds(&self, epoch: usize) -> StepBounds {
        StepBounds::at(self.learning_rate, self.beta1, self.beta2, self.final_lr, self.gamma, epoch)
    }
}

impl Optimizer for Adabound {
    fn update_layer(
        &mut self,
        layer: &mut Layer,
        delta_weight: &Matrix,
        delta_bias: &Matrix,
        layer_index: usize,
        epoch: usize,
    ) {
        let bounds = self.bounds(epoch);
        let (beta1, beta2) = (self.beta1, self.beta2);
        let state = self.moments.accumulate(
            layer_index,
            delta_weight,
            delta_bias,
            |g| Moments::new(g, beta1, beta2),
            |m, g| m.update(g, beta1, beta2),
        );
        layer.weights -= &bounds.apply(&state.weight.first, &state.weight.second);
        layer.biases -= &bounds.apply(&state.bias.first, &state.bias.second);
    }

    fn reset(&mut self) {
        self.moments.clear();
    }

    fn kind(&self) -> OptimizerType {
        OptimizerType::Adabound
    }
}

/// Adabound on the AMSGrad running maximum of the second moment.
#[derive(Debug, Clone)]
pub struct AmsBound {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub final_lr: f64,
    pub gamma: f64,
    state: LayerSlots<AmsGradState>,
}

impl AmsBound {
    pub fn new(learning_rate: f64, beta1: f64, beta2: f64, final_lr: f64, gamma: f64) -> AmsBound {
        AmsBound { learning_rate, beta1, beta2, final_lr, gamma, state: LayerSlots::new() }
    }
}

impl Optimizer for AmsBound {
    fn update_layer(
        &mut self,
        layer: &mut Layer,
        delta_weight: &Matrix,
        delta_bias: &Matrix,
        layer_index: usize,
        epoch: usize,
    ) {
        let bounds = StepBounds::at(self.learning_rate, self.beta1, self.beta2, self.final_lr, self.gamma, epoch);
        let (beta1, beta2) = (self.beta1, self.beta2);
        let state = self.state.accumulate(
            layer_index,
            delta_weight,
            delta_bias,
            |g| AmsGradState::new(g, beta1, beta2),
            |s, g| s.update(g, beta1, beta2),
        );
        layer.weights -= &bounds.apply(&state.weight.moments.first, &state.weight.max_second);
        layer.biases -= &bounds.apply(&state.bias.moments.first, &state.bias.max_second);
    }

    fn reset(&mut self) {
        self.state.clear();
    }

    fn kind(&self) -> OptimizerType {
        OptimizerType::AmsBound
    }
}
