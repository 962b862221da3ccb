pub mod error;
pub mod math;
pub mod activation;
pub mod init;
pub mod layers;
pub mod loss;
pub mod regularize;
pub mod optim;
pub mod network;
pub mod train;
pub mod session;

// Convenience re-exports
pub use error::{NnError, Result};
pub use math::matrix::Matrix;
pub use activation::activation::ActivationFunction;
pub use init::initializer::WeightInitializer;
pub use layers::dense::Layer;
pub use loss::loss_type::LossType;
pub use regularize::regularizer::{Regularizer, RegularizerType};
pub use optim::{Optimizer, OptimizerConfig, OptimizerType};
pub use network::{LayerSpec, Network, NetworkSpec, Output};
pub use train::{train_loop, EpochStats, ResetPolicy, TrainConfig, TrainingData};
pub use session::{DenseSpec, Session};
