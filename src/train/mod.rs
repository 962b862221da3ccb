pub mod data;
pub mod epoch_stats;
pub mod train_config;
pub mod loop_fn;

pub use data::TrainingData;
pub use epoch_stats::EpochStats;
pub use train_config::{ResetPolicy, TrainConfig};
pub use loop_fn::train_loop;
