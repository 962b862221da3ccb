use crate::{math::matrix::Matrix, layers::dense::Layer};
use crate::optim::slots::{decay_into, squared, LayerSlots};
use crate::optim::{bias_correction, scale_by_root, Optimizer, OptimizerType};

/// First and second moment of one parameter tensor's gradient.
#[derive(Debug, Clone, PartialEq)]
pub struct Moments {
    pub first: Matrix,
    pub second: Matrix,
}

impl Moments {
    pub(crate) fn new(gradient: &Matrix, beta1: f64, beta2: f64) -> Moments {
        Moments {
            first: gradient * (1.0 - beta1),
            second: squared(gradient) * (1.0 - beta2),
        }
    }

    pub(crate) fn update(&mut self, gradient: &Matrix, beta1: f64, beta2: f64) {
        decay_into(&mut self.first, beta1, gradient);
        decay_into(&mut self.second, beta2, &squared(gradient));
    }
}

/// Adam with bias-corrected moments, using `epoch` as the time step:
/// `W -= lr · m̂ / (√v̂ + ε)`.
#[derive(Debug, Clone)]
pub struct Adam {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    moments: LayerSlots<Moments>,
}

impl Adam {
    pub fn new(learning_rate: f64, beta1: f64, beta2: f64) -> Adam {
        Adam { learning_rate, beta1, beta2, moments: LayerSlots::new() }
    }

    pub fn moments(&self) -> &LayerSlots<Moments> {
        &self.moments
    }

    fn step(m: &Moments, learning_rate: f64, beta1: f64, beta2: f64, epoch: usize) -> Matrix {
        let m_hat = &m.first / bias_correction(beta1, epoch);
        let v_hat = &m.second / bias_correction(beta2, epoch);
        scale_by_root(&m_hat, &v_hat) * learning_rate
    }
}

impl Optimizer for Adam {
    fn update_layer(
        &mut self,
        layer: &mut Layer,
        delta_weight: &Matrix,
        delta_bias: &Matrix,
        layer_index: usize,
        epoch: usize,
    ) {
        let (lr, beta1, beta2) = (self.learning_rate, self.beta1, self.beta2);
        let state = self.moments.accumulate(
            layer_index,
            delta_weight,
            delta_bias,
            |g| Moments::new(g, beta1, beta2),
            |m, g| m.update(g, beta1, beta2),
        );
        layer.weights -= &Adam::step(&state.weight, lr, beta1, beta2, epoch);
        layer.biases -= &Adam::step(&state.bias, lr, beta1, beta2, epoch);
    }

    fn reset(&mut self) {
        self.moments.clear();
    }

    fn kind(&self) -> OptimizerType {
        OptimizerType::Adam
    }
}

/// Adam with a Nesterov look-ahead on the first moment:
/// `W -= lr · (β₁·m̂ + (1 - β₁)·ΔW / (1 - β₁ᵗ)) / (√v̂ + ε)`.
#[derive(Debug, Clone)]
pub struct Nadam {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    moments: LayerSlots<Moments>,
}

impl Nadam {
    pub fn new(learning_rate: f64, beta1: f64, beta2: f64) -> Nadam {
        Nadam { learning_rate, beta1, beta2, moments: LayerSlots::new() }
    }

    fn step(
        m: &Moments,
        gradient: &Matrix,
        learning_rate: f64,
        beta1: f64,
        beta2: f64,
        epoch: usize,
    ) -> Matrix {
        let correction1 = bias_correction(beta1, epoch);
        let m_hat = &m.first / correction1;
        let v_hat = &m.second / bias_correction(beta2, epoch);
        let look_ahead = m_hat * beta1 + gradient * ((1.0 - beta1) / correction1);
        scale_by_root(&look_ahead, &v_hat) * learning_rate
    }
}

impl Optimizer for Nadam {
    fn update_layer(
        &mut self,
        layer: &mut Layer,
        delta_weight: &Matrix,
        delta_bias: &Matrix,
        layer_index: usize,
        epoch: usize,
    ) {
        let (lr, beta1, beta2) = (self.learning_rate, self.beta1, self.beta2);
        let state = self.moments.accumulate(
            layer_index,
            delta_weight,
            delta_bias,
            |g| Moments::new(g, beta1, beta2),
            |m, g| m.update(g, beta1, beta2),
        );
        layer.weights -= &Nadam::step(&state.weight, delta_weight, lr, beta1, beta2, epoch);
        layer.biases -= &Nadam::step(&state.bias, delta_bias, lr, beta1, beta2, epoch);
    }

    fn reset(&mut self) {
        self.moments.clear();
    }

    fn kind(&self) -> OptimizerType {
        OptimizerType::Nadam
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::ActivationFunction;
    use approx::assert_abs_diff_eq;

    fn layer() -> Layer {
        Layer::from_parts(Matrix::zeros(2, 1), Matrix::zeros(2, 1), ActivationFunction::Sigmoid)
    }

    #[test]
    fn adam_first_step_has_magnitude_lr() {
        let mut opt = Adam::new(0.01, 0.9, 0.999);
        let mut l = layer();
        let g = Matrix::column(&[3.0, -0.5]);
        opt.update_layer(&mut l, &g, &g, 0, 1);
        assert_abs_diff_eq!(l.weights.data[0], -0.01, epsilon = 1e-8);
        assert_abs_diff_eq!(l.weights.data[1], 0.01, epsilon = 1e-8);
        assert_eq!(opt.moments().occupied(), 1);
    }

    #[test]
    fn adam_state_is_kept_per_layer_index() {
        let mut opt = Adam::new(0.01, 0.9, 0.999);
        let (mut a, mut b) = (layer(), layer());
        let g = Matrix::column(&[1.0, 1.0]);
        opt.update_layer(&mut a, &g, &g, 0, 1);
        opt.update_layer(&mut b, &(&g * 2.0), &g, 1, 1);
        let m0 = &opt.moments().get(0).unwrap().weight.first;
        let m1 = &opt.moments().get(1).unwrap().weight.first;
        assert_abs_diff_eq!(m0.data[0], 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(m1.data[0], 0.2, epsilon = 1e-12);
        opt.reset();
        assert_eq!(opt.moments().occupied(), 0);
    }

    #[test]
    fn nadam_first_step_combines_moment_and_gradient() {
        let mut opt = Nadam::new(0.01, 0.9, 0.999);
        let mut l = layer();
        let g = Matrix::column(&[2.0, 2.0]);
        opt.update_layer(&mut l, &g, &g, 0, 1);
        // m̂ = g, v̂ = g², look-ahead = 0.9 g + 0.1 g / 0.1 = 1.9 g
        assert_abs_diff_eq!(l.weights.data[0], -0.019, epsilon = 1e-8);
    }
}
