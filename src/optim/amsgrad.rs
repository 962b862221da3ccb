use crate::{math::matrix::Matrix, layers::dense::Layer};
use crate::optim::adam::Moments;
use crate::optim::slots::LayerSlots;
use crate::optim::{scale_by_root, Optimizer, OptimizerType};

#[derive(Debug, Clone)]
pub struct AmsGradState {
    pub moments: Moments,
    /// Running element-wise maximum of the second moment.
    pub max_second: Matrix,
}

impl AmsGradState {
    pub(crate) fn new(gradient: &Matrix, beta1: f64, beta2: f64) -> AmsGradState {
        let moments = Moments::new(gradient, beta1, beta2);
        let max_second = moments.second.clone();
        AmsGradState { moments, max_second }
    }

    pub(crate) fn update(&mut self, gradient: &Matrix, beta1: f64, beta2: f64) {
        self.moments.update(gradient, beta1, beta2);
        self.max_second = Matrix::max(&self.max_second, &self.moments.second);
    }
}

/// Adam whose denominator uses the non-decreasing maximum of the second
/// moment: `W -= lr · m / (√v̂ₘₐₓ + ε)`.
#[derive(Debug, Clone)]
pub struct AmsGrad {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    state: LayerSlots<AmsGradState>,
}

impl AmsGrad {
    pub fn new(learning_rate: f64, beta1: f64, beta2: f64) -> AmsGrad {
        AmsGrad { learning_rate, beta1, beta2, state: LayerSlots::new() }
    }

    pub fn state(&self) -> &LayerSlots<AmsGradState> {
        &self.state
    }
}

impl Optimizer for AmsGrad {
    fn update_layer(
        &mut self,
        layer: &mut Layer,
        delta_weight: &Matrix,
        delta_bias: &Matrix,
        layer_index: usize,
        _epoch: usize,
    ) {
        let (beta1, beta2) = (self.beta1, self.beta2);
        let state = self.state.accumulate(
            layer_index,
            delta_weight,
            delta_bias,
            |g| AmsGradState::new(g, beta1, beta2),
            |s, g| s.update(g, beta1, beta2),
        );
        layer.weights -= &(scale_by_root(&state.weight.moments.first, &state.weight.max_second) * self.learning_rate);
        layer.biases -= &(scale_by_root(&state.bias.moments.first, &state.bias.max_second) * self.learning_rate);
    }

    fn reset(&mut self) {
        self.state.clear();
    }

    fn kind(&self) -> OptimizerType {
        OptimizerType::AmsGrad
    }
}
