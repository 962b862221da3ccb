use serde::{Serialize, Deserialize};
use std::path::Path;

use crate::activation::activation::ActivationFunction;
use crate::error::Result;
use crate::init::initializer::WeightInitializer;
use crate::loss::loss_type::LossType;
use crate::network::network::Network;

/// Describes one layer in a network specification.
///
/// Fields:
/// - `size`       - number of neurons in this layer
/// - `input_size` - number of neurons feeding into this layer (i.e. the output
///                  size of the previous layer, or the raw input dimension for
///                  the first layer)
/// - `activation` - activation function applied after the linear transform
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub size: usize,
    pub input_size: usize,
    pub activation: ActivationFunction,
}

impl LayerSpec {
    pub fn new(size: usize, input_size: usize, activation: ActivationFunction) -> LayerSpec {
        LayerSpec { size, input_size, activation }
    }
}

fn default_initializer() -> WeightInitializer {
    WeightInitializer::Random
}

/// A fully serializable description of a network architecture plus its
/// training loss type and weight initializer.
///
/// `NetworkSpec` can be saved to / loaded from JSON independently of the
/// trained weights, making it possible to store architecture configurations
/// before training starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    /// Human-readable name used as the model file stem.
    pub name: String,
    pub input_size: usize,
    /// Ordered list of layer descriptions (input → output).
    pub layers: Vec<LayerSpec>,
    /// Loss function to pair with this network during training.
    pub loss: LossType,
    #[serde(default = "default_initializer")]
    pub initializer: WeightInitializer,
}

impl NetworkSpec {
    /// Constructs a freshly initialized network from this description.
    pub fn build(&self) -> Result<Network> {
        Network::new(self.input_size, self.layers.clone(), self.initializer, self.loss)
    }

    /// Serializes the spec to a pretty-printed JSON file.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a `NetworkSpec` from a JSON file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<NetworkSpec> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}
