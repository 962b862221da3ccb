use serde::{Serialize, Deserialize};

use crate::math::matrix::Matrix;

/// One labelled example: an input vector and the expected output column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingData {
    pub inputs: Vec<f64>,
    pub target: Vec<f64>,
}

impl TrainingData {
    pub fn new(inputs: Vec<f64>, target: Vec<f64>) -> TrainingData {
        TrainingData { inputs, target }
    }

    /// Single-output regression or binary example.
    pub fn scalar(inputs: Vec<f64>, target: f64) -> TrainingData {
        TrainingData { inputs, target: vec![target] }
    }

    /// Classification example whose target is the one-hot encoding of `class`.
    ///
    /// # Panics
    /// If `class >= classes`, like [`Matrix::one_hot`].
    pub fn one_hot(inputs: Vec<f64>, class: usize, classes: usize) -> TrainingData {
        TrainingData { inputs, target: Matrix::one_hot(class, classes).data }
    }
}
