use rand::Rng;
use serde::{Serialize, Deserialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::debug;

use crate::error::{NnError, Result};
use crate::init::initializer::WeightInitializer;
use crate::layers::dense::Layer;
use crate::loss::loss_type::LossType;
use crate::math::{codec, matrix::Matrix};
use crate::network::spec::LayerSpec;
use crate::optim::{Optimizer, ParamPair};
use crate::regularize::regularizer::{Regularizer, RegularizerType};
use crate::train::data::TrainingData;
use crate::train::epoch_stats::EpochStats;
use crate::train::loop_fn::train_loop;
use crate::train::train_config::TrainConfig;

/// Result of [`Network::eval`]: the largest output value and its row.
///
/// For a single-neuron regression head `index` is always 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Output {
    pub value: f64,
    pub index: usize,
}

/// Per-layer gradient sums (or averages) for one mini-batch.
#[derive(Debug, Clone)]
pub struct BatchGradients {
    /// Indexed like the network's layers.
    pub layers: Vec<ParamPair<Matrix>>,
    /// Sum of the per-example losses.
    pub loss: f64,
    pub examples: usize,
}

impl BatchGradients {
    /// Divides every gradient sum by the number of examples in the batch.
    pub fn average(&mut self) {
        if self.examples == 0 {
            return;
        }
        let n = self.examples as f64;
        for pair in &mut self.layers {
            pair.weight /= n;
            pair.bias /= n;
        }
    }
}

/// A sequential stack of dense layers trained against one loss function.
///
/// Layer `i` consumes the output of layer `i - 1`; the first layer consumes
/// an `input_size` column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    input_size: usize,
    layers: Vec<Layer>,
    loss: LossType,
}

impl Network {
    /// Builds a network from layer specs and seeds every weight matrix with
    /// `initializer`.
    pub fn new(
        input_size: usize,
        layer_specs: Vec<LayerSpec>,
        initializer: WeightInitializer,
        loss: LossType,
    ) -> Result<Network> {
        Network::with_rng(input_size, layer_specs, initializer, loss, &mut rand::thread_rng())
    }

    pub fn with_rng<R: Rng + ?Sized>(
        input_size: usize,
        layer_specs: Vec<LayerSpec>,
        initializer: WeightInitializer,
        loss: LossType,
        rng: &mut R,
    ) -> Result<Network> {
        check_chain(input_size, layer_specs.iter().map(|s| (s.size, s.input_size)))?;
        let layers = layer_specs
            .into_iter()
            .map(|spec| {
                let mut layer = Layer::with_rng(spec.size, spec.input_size, spec.activation, rng);
                layer.initialize(initializer, rng);
                layer
            })
            .collect();
        Ok(Network { input_size, layers, loss })
    }

    /// Wraps already-trained layers without touching their weights.
    pub fn from_layers(input_size: usize, layers: Vec<Layer>, loss: LossType) -> Result<Network> {
        check_chain(input_size, layers.iter().map(|l| (l.size(), l.input_size())))?;
        Ok(Network { input_size, layers, loss })
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn output_size(&self) -> usize {
        self.layers.last().map_or(self.input_size, Layer::size)
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn loss(&self) -> LossType {
        self.loss
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layers_mut(&mut self) -> &mut [Layer] {
        &mut self.layers
    }

    /// Threads a column through every layer, refreshing each layer's caches.
    ///
    /// Panics if `input` is not `input_size x 1`.
    pub fn feed_forward(&mut self, input: &Matrix) -> Matrix {
        let mut current = input.clone();
        for layer in &mut self.layers {
            current = layer.forward(&current);
        }
        current
    }

    /// Full output column for `input`.
    pub fn predict(&mut self, input: &[f64]) -> Result<Vec<f64>> {
        self.check_input(input)?;
        Ok(self.feed_forward(&Matrix::column(input)).column_vector())
    }

    /// Forward pass reduced to the maximum output and its index.
    pub fn eval(&mut self, input: &[f64]) -> Result<Output> {
        let output = self.predict(input)?;
        Ok(arg_max(&output))
    }

    /// Forward and backward pass over `batch`, summing each layer's weight and
    /// bias gradient over the examples.
    ///
    /// The sums are not averaged and no parameter is changed, so every
    /// example's backward sweep sees the same weights.
    pub fn backpropagation<'a, I>(&mut self, batch: I) -> BatchGradients
    where
        I: IntoIterator<Item = &'a TrainingData>,
    {
        let mut sums: Vec<ParamPair<Matrix>> = self
            .layers
            .iter()
            .map(|layer| ParamPair {
                weight: Matrix::zeros(layer.weights.rows, layer.weights.cols),
                bias: Matrix::zeros(layer.biases.rows, layer.biases.cols),
            })
            .collect();
        let mut loss = 0.0;
        let mut examples = 0;

        for example in batch {
            let input = Matrix::column(&example.inputs);
            let target = Matrix::column(&example.target);
            let prediction = self.feed_forward(&input);
            loss += self.loss.loss(&prediction, &target);

            let mut error = self.loss.derivative(&prediction, &target);
            for index in (0..self.layers.len()).rev() {
                let layer = &self.layers[index];
                let mut gradient = self.loss.backward(layer, &error);
                let previous = if index == 0 { &input } else { self.layers[index - 1].activation() };
                sums[index].weight += &(&gradient * &previous.transpose());
                sums[index].bias += &gradient;
                if index > 0 {
                    self.loss.propagate_error(layer, &mut gradient);
                    error = gradient;
                }
            }
            examples += 1;
        }

        BatchGradients { layers: sums, loss, examples }
    }

    /// Regularizes each averaged weight gradient and hands it to `optimizer`,
    /// output layer first.
    pub fn apply_gradients(
        &mut self,
        optimizer: &mut dyn Optimizer,
        gradients: BatchGradients,
        regularizer: &Regularizer,
        epoch: usize,
    ) {
        let pairs = self.layers.iter_mut().zip(gradients.layers);
        for (index, (layer, mut delta)) in pairs.enumerate().rev() {
            regularizer.regularize(&layer.weights, &mut delta.weight);
            optimizer.update_layer(layer, &delta.weight, &delta.bias, index, epoch);
        }
    }

    /// Mini-batch training with the optimizer reset at the start of every epoch.
    ///
    /// See [`train_loop`] for the full set of options.
    pub fn train(
        &mut self,
        optimizer: &mut dyn Optimizer,
        epochs: usize,
        data: &[TrainingData],
        batch_size: usize,
        regularizer: RegularizerType,
    ) -> Result<Vec<EpochStats>> {
        let config = TrainConfig::new(epochs, batch_size).with_regularizer(regularizer.into());
        train_loop(self, optimizer, data, &config)
    }

    /// Checks every example against the input and output widths.
    pub fn validate_data(&self, data: &[TrainingData]) -> Result<()> {
        let output_size = self.output_size();
        for example in data {
            self.check_input(&example.inputs)?;
            if example.target.len() != output_size {
                return Err(NnError::TargetSize { expected: output_size, actual: example.target.len() });
            }
        }
        Ok(())
    }

    /// Mean loss over `data` without updating any parameter.
    pub fn evaluate_loss(&mut self, data: &[TrainingData]) -> Result<f64> {
        self.validate_data(data)?;
        if data.is_empty() {
            return Ok(0.0);
        }
        let mut total = 0.0;
        for example in data {
            let prediction = self.feed_forward(&Matrix::column(&example.inputs));
            total += self.loss.loss(&prediction, &Matrix::column(&example.target));
        }
        Ok(total / data.len() as f64)
    }

    /// Fraction of examples whose output argmax matches the target argmax.
    pub fn accuracy(&mut self, data: &[TrainingData]) -> Result<f64> {
        self.validate_data(data)?;
        if data.is_empty() {
            return Ok(0.0);
        }
        let mut correct = 0;
        for example in data {
            let output = self.feed_forward(&Matrix::column(&example.inputs)).column_vector();
            if arg_max(&output).index == arg_max(&example.target).index {
                correct += 1;
            }
        }
        Ok(correct as f64 / data.len() as f64)
    }

    /// Writes the binary model file:
    /// `[input_size u32][layer_count u32][loss tag i32]` then every layer.
    pub fn save_model<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        self.check_saveable()?;
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_to(&mut writer)?;
        writer.flush()?;
        debug!(path = %path.display(), layers = self.layers.len(), "saved model");
        Ok(())
    }

    /// Reads a model file. The loaded layers keep their stored weights.
    pub fn load_model<P: AsRef<Path>>(path: P) -> Result<Network> {
        let path = path.as_ref();
        let mut reader = BufReader::new(File::open(path)?);
        let network = Network::read_from(&mut reader)?;
        debug!(path = %path.display(), layers = network.layers.len(), "loaded model");
        Ok(network)
    }

    /// Writes the binary model layout. Nothing is written when a layer's
    /// activation cannot be represented by its tag.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.check_saveable()?;
        codec::write_u32(writer, codec::dim_to_u32(self.input_size)?)?;
        codec::write_u32(writer, codec::dim_to_u32(self.layers.len())?)?;
        codec::write_i32(writer, self.loss.tag())?;
        for layer in &self.layers {
            layer.save(writer)?;
        }
        Ok(())
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Network> {
        let input_size = codec::read_u32(reader)? as usize;
        let layer_count = codec::read_u32(reader)? as usize;
        let loss = LossType::from_tag(codec::read_i32(reader)?)?;
        let mut layers = Vec::new();
        for _ in 0..layer_count {
            layers.push(Layer::load(reader)?);
        }
        Network::from_layers(input_size, layers, loss).map_err(|e| match e {
            NnError::InvalidConfig(msg) => NnError::CorruptModel(msg),
            other => other,
        })
    }

    /// Serializes layers, weights and loss as pretty-printed JSON.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a network previously written by `save_json`.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Network> {
        let file = File::open(path)?;
        let stored: Network = serde_json::from_reader(BufReader::new(file))?;
        // Rebuild so the forward caches match the layer sizes.
        let mut layers = Vec::with_capacity(stored.layers.len());
        for (index, layer) in stored.layers.into_iter().enumerate() {
            let (w, b) = (&layer.weights, &layer.biases);
            if w.data.len() != w.rows * w.cols
                || b.data.len() != b.rows * b.cols
                || b.rows != w.rows
                || b.cols != 1
            {
                return Err(NnError::CorruptModel(format!("layer {index} has inconsistent shapes")));
            }
            layers.push(Layer::from_parts(layer.weights, layer.biases, layer.activator));
        }
        Network::from_layers(stored.input_size, layers, stored.loss)
    }

    fn check_saveable(&self) -> Result<()> {
        self.layers.iter().try_for_each(Layer::check_saveable)
    }

    fn check_input(&self, input: &[f64]) -> Result<()> {
        if input.len() != self.input_size {
            return Err(NnError::InputSize { expected: self.input_size, actual: input.len() });
        }
        Ok(())
    }
}

/// Requires at least one layer, no empty layer, and each layer's input width
/// to equal the previous layer's size.
fn check_chain<I>(input_size: usize, shapes: I) -> Result<()>
where
    I: IntoIterator<Item = (usize, usize)>,
{
    if input_size == 0 {
        return Err(NnError::InvalidConfig("input size must be at least 1".into()));
    }
    let mut expected = input_size;
    let mut count = 0;
    for (index, (size, input)) in shapes.into_iter().enumerate() {
        if size == 0 {
            return Err(NnError::InvalidConfig(format!("layer {index} has no neurons")));
        }
        if input != expected {
            return Err(NnError::InvalidConfig(format!(
                "layer {index} expects {input} inputs but receives {expected}"
            )));
        }
        expected = size;
        count += 1;
    }
    if count == 0 {
        return Err(NnError::InvalidConfig("network needs at least one layer".into()));
    }
    Ok(())
}

/// First maximum; NaN entries never win.
fn arg_max(values: &[f64]) -> Output {
    let mut best = Output { value: f64::NEG_INFINITY, index: 0 };
    for (index, &value) in values.iter().enumerate() {
        if value > best.value {
            best = Output { value, index };
        }
    }
    if best.value == f64::NEG_INFINITY {
        if let Some(&first) = values.first() {
            best.value = first;
        }
    }
    best
}
