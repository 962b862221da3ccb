use crate::{math::matrix::Matrix, layers::dense::Layer};
use crate::optim::{Optimizer, OptimizerType};

/// Plain gradient descent: `W -= lr · ΔW`.
#[derive(Debug, Clone)]
pub struct Sgd {
    pub learning_rate: f64,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Sgd {
        Sgd { learning_rate }
    }
}

impl Optimizer for Sgd {
    fn update_layer(
        &mut self,
        layer: &mut Layer,
        delta_weight: &Matrix,
        delta_bias: &Matrix,
        _layer_index: usize,
        _epoch: usize,
    ) {
        layer.weights -= &(delta_weight * self.learning_rate);
        layer.biases -= &(delta_bias * self.learning_rate);
    }

    fn kind(&self) -> OptimizerType {
        OptimizerType::Sgd
    }
}
