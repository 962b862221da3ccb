pub mod mae;
pub mod mse;
pub mod quadratic;
pub mod cross_entropy;
pub mod loss_type;

pub use mae::MaeLoss;
pub use mse::MseLoss;
pub use quadratic::{QuadraticLoss, HalfQuadraticLoss};
pub use cross_entropy::{CrossEntropyLoss, NllLoss};
pub use loss_type::LossType;
