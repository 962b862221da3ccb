//! Parameter update rules.
//!
//! Every optimizer consumes the batch-averaged (and regularized) gradient of
//! one layer at a time. Stateful optimizers keep their accumulators in a
//! [`LayerSlots`] addressed by layer position, so one optimizer instance must
//! only ever be used with networks of the same topology.

pub mod slots;
pub mod sgd;
pub mod momentum;
pub mod adagrad;
pub mod rmsprop;
pub mod adam;
pub mod adamax;
pub mod amsgrad;
pub mod adabound;
pub mod config;

pub use slots::{LayerSlots, ParamPair};
pub use sgd::Sgd;
pub use momentum::{Momentum, Nesterov};
pub use adagrad::Adagrad;
pub use rmsprop::{Adadelta, RmsProp};
pub use adam::{Adam, Nadam};
pub use adamax::Adamax;
pub use amsgrad::AmsGrad;
pub use adabound::{Adabound, AmsBound};
pub use config::{OptimizerConfig, OptimizerType};

use crate::layers::dense::Layer;
use crate::math::matrix::Matrix;

/// Added to every square-root denominator.
pub const EPSILON: f64 = 1e-7;

pub trait Optimizer {
    /// Applies one update to `layer` from its averaged gradients.
    ///
    /// `layer_index` selects the accumulator slot; `epoch` (1-based) is the
    /// time step used for bias correction and bound schedules.
    fn update_layer(
        &mut self,
        layer: &mut Layer,
        delta_weight: &Matrix,
        delta_bias: &Matrix,
        layer_index: usize,
        epoch: usize,
    );

    /// Drops all per-layer accumulators.
    fn reset(&mut self) {}

    fn kind(&self) -> OptimizerType;
}

impl<O: Optimizer + ?Sized> Optimizer for Box<O> {
    fn update_layer(
        &mut self,
        layer: &mut Layer,
        delta_weight: &Matrix,
        delta_bias: &Matrix,
        layer_index: usize,
        epoch: usize,
    ) {
        (**self).update_layer(layer, delta_weight, delta_bias, layer_index, epoch)
    }

    fn reset(&mut self) {
        (**self).reset()
    }

    fn kind(&self) -> OptimizerType {
        (**self).kind()
    }
}

/// `1 - beta^t` with `t` clamped to at least 1.
pub(crate) fn bias_correction(beta: f64, epoch: usize) -> f64 {
    let t = epoch.clamp(1, i32::MAX as usize) as i32;
    1.0 - beta.powi(t)
}

/// `value / (sqrt(denominator) + EPSILON)` element-wise.
pub(crate) fn scale_by_root(value: &Matrix, denominator: &Matrix) -> Matrix {
    value.zip_map(denominator, |v, d| v / (d.sqrt() + EPSILON))
}
