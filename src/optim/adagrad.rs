use crate::{math::matrix::Matrix, layers::dense::Layer};
use crate::optim::slots::{squared, LayerSlots};
use crate::optim::{scale_by_root, Optimizer, OptimizerType};

/// Per-parameter step scaled by the running sum of squared gradients:
/// `G += ΔW²`, `W -= lr · ΔW / (√G + ε)`.
#[derive(Debug, Clone)]
pub struct Adagrad {
    pub learning_rate: f64,
    grad_squared: LayerSlots<Matrix>,
}

impl Adagrad {
    pub fn new(learning_rate: f64) -> Adagrad {
        Adagrad { learning_rate, grad_squared: LayerSlots::new() }
    }
}

impl Optimizer for Adagrad {
    fn update_layer(
        &mut self,
        layer: &mut Layer,
        delta_weight: &Matrix,
        delta_bias: &Matrix,
        layer_index: usize,
        _epoch: usize,
    ) {
        let sums = self.grad_squared.accumulate(
            layer_index,
            delta_weight,
            delta_bias,
            squared,
            |acc, g| *acc += &squared(g),
        );
        layer.weights -= &(scale_by_root(delta_weight, &sums.weight) * self.learning_rate);
        layer.biases -= &(scale_by_root(delta_bias, &sums.bias) * self.learning_rate);
    }

    fn reset(&mut self) {
        self.grad_squared.clear();
    }

    fn kind(&self) -> OptimizerType {
        OptimizerType::Adagrad
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::ActivationFunction;
    use approx::assert_abs_diff_eq;

    #[test]
    fn steps_shrink_as_squared_gradients_pile_up() {
        let mut opt = Adagrad::new(1.0);
        let mut layer = Layer::from_parts(Matrix::zeros(1, 1), Matrix::zeros(1, 1), ActivationFunction::ReLU);
        let g = Matrix::filled(1, 1, 2.0);
        opt.update_layer(&mut layer, &g, &g, 0, 1);
        assert_abs_diff_eq!(layer.weights.data[0], -1.0, epsilon = 1e-6);
        opt.update_layer(&mut layer, &g, &g, 0, 1);
        assert_abs_diff_eq!(layer.weights.data[0], -1.0 - 2.0 / 8.0f64.sqrt(), epsilon = 1e-6);
    }
}
