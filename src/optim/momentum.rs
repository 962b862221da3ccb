use crate::{math::matrix::Matrix, layers::dense::Layer};
use crate::optim::slots::{decay_into, LayerSlots};
use crate::optim::{Optimizer, OptimizerType};

/// Gradient descent on an exponentially weighted running delta:
/// `v = μ·v + (1 - μ)·ΔW`, `W -= lr · v`.
#[derive(Debug, Clone)]
pub struct Momentum {
    pub learning_rate: f64,
    pub momentum: f64,
    velocity: LayerSlots<Matrix>,
}

impl Momentum {
    pub fn new(learning_rate: f64, momentum: f64) -> Momentum {
        Momentum { learning_rate, momentum, velocity: LayerSlots::new() }
    }

    pub fn velocity(&self) -> &LayerSlots<Matrix> {
        &self.velocity
    }
}

impl Optimizer for Momentum {
    fn update_layer(
        &mut self,
        layer: &mut Layer,
        delta_weight: &Matrix,
        delta_bias: &Matrix,
        layer_index: usize,
        _epoch: usize,
    ) {
        let mu = self.momentum;
        let v = self.velocity.accumulate(
            layer_index,
            delta_weight,
            delta_bias,
            |g| g * (1.0 - mu),
            |v, g| decay_into(v, mu, g),
        );
        layer.weights -= &(&v.weight * self.learning_rate);
        layer.biases -= &(&v.bias * self.learning_rate);
    }

    fn reset(&mut self) {
        self.velocity.clear();
    }

    fn kind(&self) -> OptimizerType {
        OptimizerType::Momentum
    }
}

/// Nesterov accelerated gradient in its look-ahead form:
/// `v' = μ·v - lr·ΔW`, `W += -μ·v + (1 + μ)·v'`.
#[derive(Debug, Clone)]
pub struct Nesterov {
    pub learning_rate: f64,
    pub momentum: f64,
    velocity: LayerSlots<Matrix>,
}

impl Nesterov {
    pub fn new(learning_rate: f64, momentum: f64) -> Nesterov {
        Nesterov { learning_rate, momentum, velocity: LayerSlots::new() }
    }
}

impl Optimizer for Nesterov {
    fn update_layer(
        &mut self,
        layer: &mut Layer,
        delta_weight: &Matrix,
        delta_bias: &Matrix,
        layer_index: usize,
        _epoch: usize,
    ) {
        let (mu, lr) = (self.momentum, self.learning_rate);
        // Velocity before this step; zero for a fresh slot.
        let previous = self.velocity.get(layer_index).map(|v| (v.weight.clone(), v.bias.clone()));
        let v = self.velocity.accumulate(
            layer_index,
            delta_weight,
            delta_bias,
            |g| g * -lr,
            |v, g| {
                *v *= mu;
                *v -= &(g * lr);
            },
        );
        let (prev_w, prev_b) = previous.unwrap_or_else(|| {
            (
                Matrix::zeros(delta_weight.rows, delta_weight.cols),
                Matrix::zeros(delta_bias.rows, delta_bias.cols),
            )
        });
        layer.weights += &(&v.weight * (1.0 + mu) - prev_w * mu);
        layer.biases += &(&v.bias * (1.0 + mu) - prev_b * mu);
    }

    fn reset(&mut self) {
        self.velocity.clear();
    }

    fn kind(&self) -> OptimizerType {
        OptimizerType::Nesterov
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::ActivationFunction;
    use approx::assert_abs_diff_eq;

    fn layer() -> Layer {
        Layer::from_parts(Matrix::zeros(1, 1), Matrix::zeros(1, 1), ActivationFunction::Sigmoid)
    }

    #[test]
    fn momentum_accumulates_across_updates() {
        let mut opt = Momentum::new(1.0, 0.5);
        let mut l = layer();
        let g = Matrix::filled(1, 1, 1.0);
        opt.update_layer(&mut l, &g, &g, 0, 1);
        assert_abs_diff_eq!(l.weights.data[0], -0.5, epsilon = 1e-12);
        opt.update_layer(&mut l, &g, &g, 0, 1);
        // v = 0.5 * 0.5 + 0.5 * 1 = 0.75
        assert_abs_diff_eq!(l.weights.data[0], -1.25, epsilon = 1e-12);
        opt.reset();
        assert_eq!(opt.velocity().occupied(), 0);
    }

    #[test]
    fn nesterov_first_step_includes_look_ahead() {
        let mut opt = Nesterov::new(0.1, 0.9);
        let mut l = layer();
        let g = Matrix::filled(1, 1, 1.0);
        opt.update_layer(&mut l, &g, &g, 0, 1);
        // v' = -0.1, W += 1.9 * -0.1
        assert_abs_diff_eq!(l.weights.data[0], -0.19, epsilon = 1e-12);
        opt.update_layer(&mut l, &g, &g, 0, 1);
        // v' = 0.9 * -0.1 - 0.1 = -0.19, W += -0.9 * -0.1 + 1.9 * -0.19
        assert_abs_diff_eq!(l.weights.data[0], -0.19 + 0.09 - 0.361, epsilon = 1e-12);
    }
}
