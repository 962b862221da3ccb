use rand::prelude::*;
use serde::{Serialize, Deserialize};
use std::f64::consts::PI;

use crate::error::{NnError, Result};
use crate::math::matrix::Matrix;

/// Weight seeding strategy applied once at network construction.
///
/// For a weight matrix of shape `(outputs, inputs)`, `fan_in = cols` and
/// `fan_out = rows`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightInitializer {
    /// Uniform on `[-1, 1)`.
    Random,
    /// Uniform on `±sqrt(6 / (fan_in + fan_out))`.
    XavierUniform,
    /// N(0, sqrt(2 / (fan_in + fan_out))).
    XavierNormal,
    /// Uniform on `±sqrt(6 / fan_in)`. Suited to ReLU layers.
    HeUniform,
    /// N(0, sqrt(2 / fan_in)).
    HeNormal,
    /// Uniform on `±sqrt(3 / fan_in)`.
    LeCunUniform,
    /// N(0, sqrt(1 / fan_in)).
    LeCunNormal,
    /// Leaves the matrix untouched. Used for networks loaded from disk.
    None,
}

impl WeightInitializer {
    pub fn initialize(&self, matrix: &mut Matrix) {
        self.initialize_with_rng(matrix, &mut rand::thread_rng());
    }

    pub fn initialize_with_rng<R: Rng + ?Sized>(&self, matrix: &mut Matrix, rng: &mut R) {
        let fan_in = matrix.cols.max(1) as f64;
        let fan_out = matrix.rows.max(1) as f64;
        match self {
            WeightInitializer::Random => fill_uniform(matrix, 1.0, rng),
            WeightInitializer::XavierUniform => {
                fill_uniform(matrix, (6.0 / (fan_in + fan_out)).sqrt(), rng)
            }
            WeightInitializer::XavierNormal => {
                fill_normal(matrix, (2.0 / (fan_in + fan_out)).sqrt(), rng)
            }
            WeightInitializer::HeUniform => fill_uniform(matrix, (6.0 / fan_in).sqrt(), rng),
            WeightInitializer::HeNormal => fill_normal(matrix, (2.0 / fan_in).sqrt(), rng),
            WeightInitializer::LeCunUniform => fill_uniform(matrix, (3.0 / fan_in).sqrt(), rng),
            WeightInitializer::LeCunNormal => fill_normal(matrix, (1.0 / fan_in).sqrt(), rng),
            WeightInitializer::None => {}
        }
    }

    pub fn tag(&self) -> i32 {
        match self {
            WeightInitializer::Random => 0,
            WeightInitializer::XavierUniform => 1,
            WeightInitializer::XavierNormal => 2,
            WeightInitializer::HeUniform => 3,
            WeightInitializer::HeNormal => 4,
            WeightInitializer::LeCunUniform => 5,
            WeightInitializer::LeCunNormal => 6,
            WeightInitializer::None => 7,
        }
    }

    pub fn from_tag(tag: i32) -> Result<Self> {
        match tag {
            0 => Ok(WeightInitializer::Random),
            1 => Ok(WeightInitializer::XavierUniform),
            2 => Ok(WeightInitializer::XavierNormal),
            3 => Ok(WeightInitializer::HeUniform),
            4 => Ok(WeightInitializer::HeNormal),
            5 => Ok(WeightInitializer::LeCunUniform),
            6 => Ok(WeightInitializer::LeCunNormal),
            7 => Ok(WeightInitializer::None),
            _ => Err(NnError::UnknownTag { kind: "initializer", tag }),
        }
    }
}

fn fill_uniform<R: Rng + ?Sized>(matrix: &mut Matrix, limit: f64, rng: &mut R) {
    matrix.map_in_place(|_| (rng.gen::<f64>() * 2.0 - 1.0) * limit);
}

fn fill_normal<R: Rng + ?Sized>(matrix: &mut Matrix, std_dev: f64, rng: &mut R) {
    matrix.map_in_place(|_| sample_standard_normal(rng) * std_dev);
}

/// Samples a single value from N(0, 1) using the Box-Muller transform.
fn sample_standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    // Uniform samples in (0, 1] keep ln() finite.
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = 1.0 - rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;

    #[test]
    fn uniform_initializers_respect_their_limit() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut m = Matrix::zeros(8, 24);
        WeightInitializer::HeUniform.initialize_with_rng(&mut m, &mut rng);
        let limit = (6.0f64 / 24.0).sqrt();
        assert!(m.data.iter().all(|x| x.abs() <= limit));
        assert!(m.data.iter().any(|&x| x != 0.0));
    }

    #[test]
    fn normal_initializer_has_roughly_expected_spread() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut m = Matrix::zeros(200, 50);
        WeightInitializer::HeNormal.initialize_with_rng(&mut m, &mut rng);
        let n = m.len() as f64;
        let mean = m.sum() / n;
        let var = m.data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        assert!(mean.abs() < 0.02);
        assert!((var - 2.0 / 50.0).abs() < 0.005);
    }

    #[test]
    fn none_leaves_weights_untouched() {
        let mut m = Matrix::filled(2, 2, 0.5);
        WeightInitializer::None.initialize(&mut m);
        assert_eq!(m, Matrix::filled(2, 2, 0.5));
    }

    #[test]
    fn unknown_tag_is_an_error() {
        assert_eq!(WeightInitializer::from_tag(4).unwrap(), WeightInitializer::HeNormal);
        assert!(WeightInitializer::from_tag(8).is_err());
    }
}
