use crate::{math::matrix::Matrix, layers::dense::Layer};
use crate::optim::slots::{decay_into, squared, LayerSlots};
use crate::optim::{scale_by_root, Optimizer, OptimizerType, EPSILON};

/// Adagrad with an exponential moving average in place of the unbounded sum:
/// `E = β·E + (1 - β)·ΔW²`, `W -= lr · ΔW / (√E + ε)`.
#[derive(Debug, Clone)]
pub struct RmsProp {
    pub learning_rate: f64,
    pub beta: f64,
    mean_squared: LayerSlots<Matrix>,
}

impl RmsProp {
    pub fn new(learning_rate: f64, beta: f64) -> RmsProp {
        RmsProp { learning_rate, beta, mean_squared: LayerSlots::new() }
    }
}

impl Optimizer for RmsProp {
    fn update_layer(
        &mut self,
        layer: &mut Layer,
        delta_weight: &Matrix,
        delta_bias: &Matrix,
        layer_index: usize,
        _epoch: usize,
    ) {
        let beta = self.beta;
        let mean = self.mean_squared.accumulate(
            layer_index,
            delta_weight,
            delta_bias,
            |g| squared(g) * (1.0 - beta),
            |acc, g| decay_into(acc, beta, &squared(g)),
        );
        layer.weights -= &(scale_by_root(delta_weight, &mean.weight) * self.learning_rate);
        layer.biases -= &(scale_by_root(delta_bias, &mean.bias) * self.learning_rate);
    }

    fn reset(&mut self) {
        self.mean_squared.clear();
    }

    fn kind(&self) -> OptimizerType {
        OptimizerType::RmsProp
    }
}

#[derive(Debug, Clone)]
struct AdadeltaState {
    grad_squared: Matrix,
    update_squared: Matrix,
}

/// Adadelta: the step is `√(E[Δx²] + ε) / √(E[g²] + ε) · g`, both averages
/// decayed with `β`, then scaled by `lr`.
#[derive(Debug, Clone)]
pub struct Adadelta {
    pub learning_rate: f64,
    pub beta: f64,
    state: LayerSlots<AdadeltaState>,
}

impl Adadelta {
    pub fn new(learning_rate: f64, beta: f64) -> Adadelta {
        Adadelta { learning_rate, beta, state: LayerSlots::new() }
    }

    fn step(state: &mut AdadeltaState, gradient: &Matrix, beta: f64) -> Matrix {
        let ratio = state.update_squared.zip_map(&state.grad_squared, |u, g| {
            (u + EPSILON).sqrt() / (g + EPSILON).sqrt()
        });
        let delta = ratio.hadamard(gradient);
        decay_into(&mut state.update_squared, beta, &squared(&delta));
        delta
    }
}

impl Optimizer for Adadelta {
    fn update_layer(
        &mut self,
        layer: &mut Layer,
        delta_weight: &Matrix,
        delta_bias: &Matrix,
        layer_index: usize,
        _epoch: usize,
    ) {
        let beta = self.beta;
        let state = self.state.accumulate(
            layer_index,
            delta_weight,
            delta_bias,
            |g| AdadeltaState {
                grad_squared: squared(g) * (1.0 - beta),
                update_squared: Matrix::zeros(g.rows, g.cols),
            },
            |s, g| decay_into(&mut s.grad_squared, beta, &squared(g)),
        );
        let step_w = Adadelta::step(&mut state.weight, delta_weight, beta);
        let step_b = Adadelta::step(&mut state.bias, delta_bias, beta);
        layer.weights -= &(step_w * self.learning_rate);
        layer.biases -= &(step_b * self.learning_rate);
    }

    fn reset(&mut self) {
        self.state.clear();
    }

    fn kind(&self) -> OptimizerType {
        OptimizerType::Adadelta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::ActivationFunction;
    use approx::assert_abs_diff_eq;

    fn layer() -> Layer {
        Layer::from_parts(Matrix::zeros(1, 1), Matrix::zeros(1, 1), ActivationFunction::Tanh)
    }

    #[test]
    fn rmsprop_first_step_is_normalised() {
        let mut opt = RmsProp::new(0.01, 0.99);
        let mut l = layer();
        let g = Matrix::filled(1, 1, 4.0);
        opt.update_layer(&mut l, &g, &g, 0, 1);
        // E = 0.01 * 16 = 0.16, step = 0.01 * 4 / 0.4
        assert_abs_diff_eq!(l.weights.data[0], -0.1, epsilon = 1e-6);
    }

    #[test]
    fn adadelta_moves_against_the_gradient_and_tracks_updates() {
        let mut opt = Adadelta::new(1.0, 0.9);
        let mut l = layer();
        let g = Matrix::filled(1, 1, 1.0);
        opt.update_layer(&mut l, &g, &g, 0, 1);
        let first = l.weights.data[0];
        assert!(first < 0.0);
        opt.update_layer(&mut l, &g, &g, 0, 1);
        let second = l.weights.data[0] - first;
        // The update average grows, so the second step is larger.
        assert!(second < first);
        assert_eq!(opt.state.occupied(), 1);
    }
}
