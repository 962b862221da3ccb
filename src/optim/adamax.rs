use crate::{math::matrix::Matrix, layers::dense::Layer};
use crate::optim::slots::{decay_into, LayerSlots};
use crate::optim::{bias_correction, Optimizer, OptimizerType, EPSILON};

#[derive(Debug, Clone)]
pub struct AdamaxState {
    pub first: Matrix,
    /// Exponentially decayed infinity norm of the gradients.
    pub infinity_norm: Matrix,
}

/// Adam variant bounded by the infinity norm:
/// `u = max(β₂·u, |ΔW|)`, `W -= lr / (1 - β₁ᵗ) · m / (u + ε)`.
#[derive(Debug, Clone)]
pub struct Adamax {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    state: LayerSlots<AdamaxState>,
}

impl Adamax {
    pub fn new(learning_rate: f64, beta1: f64, beta2: f64) -> Adamax {
        Adamax { learning_rate, beta1, beta2, state: LayerSlots::new() }
    }

    fn step(state: &AdamaxState, rate: f64) -> Matrix {
        state.first.zip_map(&state.infinity_norm, |m, u| rate * m / (u + EPSILON))
    }
}

impl Optimizer for Adamax {
    fn update_layer(
        &mut self,
        layer: &mut Layer,
        delta_weight: &Matrix,
        delta_bias: &Matrix,
        layer_index: usize,
        epoch: usize,
    ) {
        let (beta1, beta2) = (self.beta1, self.beta2);
        let state = self.state.accumulate(
            layer_index,
            delta_weight,
            delta_bias,
            |g| AdamaxState {
                first: g * (1.0 - beta1),
                infinity_norm: g.map(f64::abs),
            },
            |s, g| {
                decay_into(&mut s.first, beta1, g);
                s.infinity_norm = Matrix::max(&(&s.infinity_norm * beta2), &g.map(f64::abs));
            },
        );
        let rate = self.learning_rate / bias_correction(beta1, epoch);
        layer.weights -= &Adamax::step(&state.weight, rate);
        layer.biases -= &Adamax::step(&state.bias, rate);
    }

    fn reset(&mut self) {
        self.state.clear();
    }

    fn kind(&self) -> OptimizerType {
        OptimizerType::Adamax
    }
}
