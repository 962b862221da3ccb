//! Incremental builder around a [`Network`].
//!
//! A `Session` collects layer descriptions and training samples one call at a
//! time, compiles them into a network and then trains, evaluates and
//! persists it. Every piece of state lives in the handle; two sessions never
//! share anything.

use rand::Rng;
use serde::{Serialize, Deserialize};
use std::path::Path;
use tracing::debug;

use crate::activation::activation::ActivationFunction;
use crate::error::{NnError, Result};
use crate::init::initializer::WeightInitializer;
use crate::loss::loss_type::LossType;
use crate::network::network::{Network, Output};
use crate::network::spec::LayerSpec;
use crate::optim::config::OptimizerConfig;
use crate::optim::Optimizer;
use crate::regularize::regularizer::RegularizerType;
use crate::train::data::TrainingData;
use crate::train::epoch_stats::EpochStats;
use crate::train::loop_fn::train_loop;
use crate::train::train_config::TrainConfig;

/// One dense layer to append; its input width is the previous layer's size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DenseSpec {
    pub size: usize,
    pub activation: ActivationFunction,
}

impl DenseSpec {
    pub fn new(size: usize, activation: ActivationFunction) -> DenseSpec {
        DenseSpec { size, activation }
    }

    pub fn from_tag(size: usize, activation_tag: i32) -> Result<DenseSpec> {
        Ok(DenseSpec { size, activation: ActivationFunction::from_tag(activation_tag)? })
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    input_size: usize,
    initializer: WeightInitializer,
    loss: LossType,
    layers: Vec<DenseSpec>,
    samples: Vec<TrainingData>,
    network: Option<Network>,
}

impl Session {
    pub fn new(input_size: usize, initializer: WeightInitializer, loss: LossType) -> Session {
        Session {
            input_size,
            initializer,
            loss,
            layers: Vec::new(),
            samples: Vec::new(),
            network: None,
        }
    }

    /// Same as [`new`](Self::new) with the initializer and loss given as
    /// numeric tags.
    pub fn from_tags(input_size: usize, initializer_tag: i32, loss_tag: i32) -> Result<Session> {
        Ok(Session::new(
            input_size,
            WeightInitializer::from_tag(initializer_tag)?,
            LossType::from_tag(loss_tag)?,
        ))
    }

    pub fn add_dense(&mut self, spec: DenseSpec) -> Result<()> {
        if self.network.is_some() {
            return Err(NnError::InvalidConfig("cannot add layers to a compiled session".into()));
        }
        if spec.size == 0 {
            return Err(NnError::InvalidConfig("dense layer needs at least one neuron".into()));
        }
        self.layers.push(spec);
        Ok(())
    }

    /// Queues one example. The input width is checked now, the target width
    /// when training starts.
    pub fn add_training_sample(&mut self, inputs: Vec<f64>, target: Vec<f64>) -> Result<()> {
        if inputs.len() != self.input_size {
            return Err(NnError::InputSize { expected: self.input_size, actual: inputs.len() });
        }
        self.samples.push(TrainingData::new(inputs, target));
        Ok(())
    }

    pub fn samples(&self) -> &[TrainingData] {
        &self.samples
    }

    /// Builds the network from the queued layers. Compiling again discards the
    /// previous weights.
    pub fn compile(&mut self) -> Result<&Network> {
        self.compile_with_rng(&mut rand::thread_rng())
    }

    pub fn compile_with_rng<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<&Network> {
        let mut input_size = self.input_size;
        let specs = self
            .layers
            .iter()
            .map(|dense| {
                let spec = LayerSpec::new(dense.size, input_size, dense.activation);
                input_size = dense.size;
                spec
            })
            .collect();
        let network = Network::with_rng(self.input_size, specs, self.initializer, self.loss, rng)?;
        debug!(layers = network.layer_count(), "compiled session");
        Ok(self.network.insert(network))
    }

    pub fn network(&self) -> Option<&Network> {
        self.network.as_ref()
    }

    /// Trains the compiled network on the queued samples with a fresh
    /// optimizer built from `optimizer`.
    pub fn train(
        &mut self,
        optimizer: &OptimizerConfig,
        epochs: usize,
        batch_size: usize,
        regularizer: RegularizerType,
    ) -> Result<Vec<EpochStats>> {
        let mut optimizer = optimizer.build()?;
        let config = TrainConfig::new(epochs, batch_size).with_regularizer(regularizer.into());
        self.train_with(&mut optimizer, &config)
    }

    /// Trains with a caller-owned optimizer, whose state survives the call.
    pub fn train_with(&mut self, optimizer: &mut dyn Optimizer, config: &TrainConfig) -> Result<Vec<EpochStats>> {
        let network = self.network.as_mut().ok_or_else(not_compiled)?;
        train_loop(network, optimizer, &self.samples, config)
    }

    pub fn eval(&mut self, input: &[f64]) -> Result<Output> {
        self.network.as_mut().ok_or_else(not_compiled)?.eval(input)
    }

    pub fn save_model<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.network.as_ref().ok_or_else(not_compiled)?.save_model(path)
    }

    /// Opens a compiled session around a saved model. Its layer list mirrors
    /// the file, so it accepts samples but no further layers.
    pub fn load_model<P: AsRef<Path>>(path: P) -> Result<Session> {
        let network = Network::load_model(path)?;
        let layers = network
            .layers()
            .iter()
            .map(|layer| DenseSpec::new(layer.size(), layer.activator))
            .collect();
        Ok(Session {
            input_size: network.input_size(),
            initializer: WeightInitializer::None,
            loss: network.loss(),
            layers,
            samples: Vec::new(),
            network: Some(network),
        })
    }
}

fn not_compiled() -> NnError {
    NnError::InvalidConfig("session has not been compiled".into())
}
