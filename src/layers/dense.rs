use rand::Rng;
use serde::{Serialize, Deserialize};
use std::io::{Read, Write};

use crate::activation::activation::{ActivationFunction, DEFAULT_ALPHA};
use crate::error::{NnError, Result};
use crate::init::initializer::WeightInitializer;
use crate::math::{codec, matrix::Matrix};

/// Fully-connected layer: `a = σ(W·x + b)` on column vectors.
///
/// `weights` is `size x input_size`, `biases` is `size x 1`. The two caches
/// hold the values of the most recent `forward` call and are overwritten by
/// the next one, so only one example may be in flight per layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
    pub weights: Matrix,
    pub biases: Matrix,
    pub activator: ActivationFunction,
    #[serde(skip)]
    weighted_sum: Matrix, // pre-activation z = Wx + b
    #[serde(skip)]
    activation: Matrix,
}

impl Layer {
    /// Creates a layer with uniform `[-1, 1)` weights and biases.
    pub fn with_rng<R: Rng + ?Sized>(
        size: usize,
        input_size: usize,
        activation: ActivationFunction,
        rng: &mut R,
    ) -> Layer {
        let weights = Matrix::random_with_rng(size, input_size, rng);
        let biases = Matrix::random_with_rng(size, 1, rng);
        Layer::from_parts(weights, biases, activation)
    }

    /// Wraps existing parameters. Panics unless `biases` is `weights.rows x 1`.
    pub fn from_parts(weights: Matrix, biases: Matrix, activation: ActivationFunction) -> Layer {
        if biases.rows != weights.rows || biases.cols != 1 {
            panic!(
                "Bias of shape {}x{} does not match weights of shape {}x{}",
                biases.rows, biases.cols, weights.rows, weights.cols
            )
        }
        let size = weights.rows;
        Layer {
            weights,
            biases,
            activator: activation,
            weighted_sum: Matrix::zeros(size, 1),
            activation: Matrix::zeros(size, 1),
        }
    }

    /// Number of neurons (outputs).
    pub fn size(&self) -> usize {
        self.weights.rows
    }

    pub fn input_size(&self) -> usize {
        self.weights.cols
    }

    /// Seeds the weight matrix; biases keep their construction values.
    pub fn initialize<R: Rng + ?Sized>(&mut self, initializer: WeightInitializer, rng: &mut R) {
        initializer.initialize_with_rng(&mut self.weights, rng);
    }

    /// Computes `σ(W·input + b)` and caches both the weighted sum and the activation.
    pub fn forward(&mut self, input: &Matrix) -> Matrix {
        let z = &(&self.weights * input) + &self.biases;
        let a = self.activator.function(&z);
        self.weighted_sum = z;
        self.activation = a.clone();
        a
    }

    pub fn weighted_sum(&self) -> &Matrix {
        &self.weighted_sum
    }

    pub fn activation(&self) -> &Matrix {
        &self.activation
    }

    /// σ'(z) evaluated against the caches of the last `forward` call.
    pub fn activation_derivative(&self) -> Matrix {
        self.activator.derivative(&self.weighted_sum, &self.activation)
    }

    /// Fails when the activation carries a parameter the model file has no
    /// room for, i.e. a `LeakyReLU`/`Elu` alpha other than [`DEFAULT_ALPHA`].
    pub fn check_saveable(&self) -> Result<()> {
        match self.activator.alpha() {
            Some(alpha) if alpha != DEFAULT_ALPHA => Err(NnError::InvalidConfig(format!(
                "{:?} cannot be stored in a model file, only alpha = {DEFAULT_ALPHA} is",
                self.activator
            ))),
            _ => Ok(()),
        }
    }

    /// Writes the weight matrix, the bias matrix and the activation tag.
    pub fn save<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.check_saveable()?;
        self.weights.write_to(writer)?;
        self.biases.write_to(writer)?;
        codec::write_i32(writer, self.activator.tag())?;
        Ok(())
    }

    /// Reads a layer written by [`save`](Self::save), sized from the stored weights.
    pub fn load<R: Read>(reader: &mut R) -> Result<Layer> {
        let weights = Matrix::read_from(reader)?;
        let biases = Matrix::read_from(reader)?;
        let activation = ActivationFunction::from_tag(codec::read_i32(reader)?)?;
        if biases.rows != weights.rows || biases.cols != 1 {
            return Err(NnError::CorruptModel(format!(
                "bias of shape {}x{} stored for weights of shape {}x{}",
                biases.rows, biases.cols, weights.rows, weights.cols
            )));
        }
        Ok(Layer::from_parts(weights, biases, activation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn fixed_layer() -> Layer {
        Layer::from_parts(
            Matrix::from_data(vec![vec![1.0, -1.0], vec![0.5, 2.0]]),
            Matrix::column(&[0.0, -1.0]),
            ActivationFunction::ReLU,
        )
    }

    #[test]
    fn forward_caches_weighted_sum_and_activation() {
        let mut layer = fixed_layer();
        let out = layer.forward(&Matrix::column(&[1.0, 2.0]));
        assert_eq!(layer.weighted_sum().data, vec![-1.0, 3.5]);
        assert_eq!(out.data, vec![0.0, 3.5]);
        assert_eq!(layer.activation(), &out);
        assert_eq!(layer.activation_derivative().data, vec![0.0, 1.0]);
    }

    #[test]
    fn initialize_touches_weights_only() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut layer = fixed_layer();
        layer.initialize(WeightInitializer::XavierUniform, &mut rng);
        assert_eq!(layer.biases.data, vec![0.0, -1.0]);
        assert_ne!(layer.weights.data, vec![1.0, -1.0, 0.5, 2.0]);
    }

    #[test]
    fn save_then_load_keeps_parameters_and_activation() {
        let layer = Layer::with_rng(3, 4, ActivationFunction::Tanh, &mut StdRng::seed_from_u64(1));
        let mut buf = Vec::new();
        layer.save(&mut buf).unwrap();
        let back = Layer::load(&mut buf.as_slice()).unwrap();
        assert_eq!(back.weights, layer.weights);
        assert_eq!(back.biases, layer.biases);
        assert_eq!(back.activator, ActivationFunction::Tanh);
        assert_eq!((back.size(), back.input_size()), (3, 4));
    }

    #[test]
    fn load_rejects_mismatched_bias() {
        let mut buf = Vec::new();
        Matrix::zeros(2, 2).write_to(&mut buf).unwrap();
        Matrix::zeros(3, 1).write_to(&mut buf).unwrap();
        codec::write_i32(&mut buf, 0).unwrap();
        assert!(matches!(Layer::load(&mut buf.as_slice()), Err(NnError::CorruptModel(_))));
    }
}
