pub mod network;
pub mod spec;

pub use network::{BatchGradients, Network, Output};
pub use spec::{NetworkSpec, LayerSpec};
