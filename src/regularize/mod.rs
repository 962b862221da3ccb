pub mod regularizer;

pub use regularizer::{Regularizer, RegularizerType};
