use serde::{Serialize, Deserialize};

use crate::error::{NnError, Result};
use crate::optim::{
    Adabound, Adadelta, Adagrad, Adam, Adamax, AmsBound, AmsGrad, Momentum, Nadam, Nesterov,
    Optimizer, RmsProp, Sgd,
};

pub const DEFAULT_LEARNING_RATE: f64 = 0.01;
pub const DEFAULT_ADADELTA_LEARNING_RATE: f64 = 1.0;
pub const DEFAULT_MOMENTUM: f64 = 0.9;
pub const DEFAULT_BETA: f64 = 0.99;
pub const DEFAULT_BETA1: f64 = 0.9;
pub const DEFAULT_BETA2: f64 = 0.999;
pub const DEFAULT_FINAL_LR: f64 = 0.1;
pub const DEFAULT_GAMMA: f64 = 1e-3;

fn default_lr() -> f64 { DEFAULT_LEARNING_RATE }
fn default_adadelta_lr() -> f64 { DEFAULT_ADADELTA_LEARNING_RATE }
fn default_momentum() -> f64 { DEFAULT_MOMENTUM }
fn default_beta() -> f64 { DEFAULT_BETA }
fn default_beta1() -> f64 { DEFAULT_BETA1 }
fn default_beta2() -> f64 { DEFAULT_BETA2 }
fn default_final_lr() -> f64 { DEFAULT_FINAL_LR }
fn default_gamma() -> f64 { DEFAULT_GAMMA }

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerType {
    Sgd,
    Momentum,
    Nesterov,
    Adagrad,
    RmsProp,
    Adadelta,
    Adam,
    Nadam,
    Adamax,
    AmsGrad,
    Adabound,
    AmsBound,
}

impl OptimizerType {
    pub const ALL: [OptimizerType; 12] = [
        OptimizerType::Sgd,
        OptimizerType::Momentum,
        OptimizerType::Nesterov,
        OptimizerType::Adagrad,
        OptimizerType::RmsProp,
        OptimizerType::Adadelta,
        OptimizerType::Adam,
        OptimizerType::Nadam,
        OptimizerType::Adamax,
        OptimizerType::AmsGrad,
        OptimizerType::Adabound,
        OptimizerType::AmsBound,
    ];

    pub fn tag(&self) -> i32 {
        match self {
            OptimizerType::Sgd => 0,
            OptimizerType::Momentum => 1,
            OptimizerType::Nesterov => 2,
            OptimizerType::Adagrad => 3,
            OptimizerType::RmsProp => 4,
            OptimizerType::Adadelta => 5,
            OptimizerType::Adam => 6,
            OptimizerType::Nadam => 7,
            OptimizerType::Adamax => 8,
            OptimizerType::AmsGrad => 9,
            OptimizerType::Adabound => 10,
            OptimizerType::AmsBound => 11,
        }
    }

    pub fn from_tag(tag: i32) -> Result<Self> {
        usize::try_from(tag)
            .ok()
            .and_then(|i| OptimizerType::ALL.get(i).copied())
            .ok_or(NnError::UnknownTag { kind: "optimizer", tag })
    }
}

/// Hyper-parameters for one optimizer, serialised with a `"type"` tag:
///
/// ```json
/// { "type": "adam", "learning_rate": 0.001 }
/// ```
///
/// Missing fields fall back to the `DEFAULT_*` constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OptimizerConfig {
    Sgd {
        #[serde(default = "default_lr")]
        learning_rate: f64,
    },
    Momentum {
        #[serde(default = "default_lr")]
        learning_rate: f64,
        #[serde(default = "default_momentum")]
        momentum: f64,
    },
    Nesterov {
        #[serde(default = "default_lr")]
        learning_rate: f64,
        #[serde(default = "default_momentum")]
        momentum: f64,
    },
    Adagrad {
        #[serde(default = "default_lr")]
        learning_rate: f64,
    },
    RmsProp {
        #[serde(default = "default_lr")]
        learning_rate: f64,
        #[serde(default = "default_beta")]
        beta: f64,
    },
    Adadelta {
        #[serde(default = "default_adadelta_lr")]
        learning_rate: f64,
        #[serde(default = "default_beta")]
        beta: f64,
    },
    Adam {
        #[serde(default = "default_lr")]
        learning_rate: f64,
        #[serde(default = "default_beta1")]
        beta1: f64,
        #[serde(default = "default_beta2")]
        beta2: f64,
    },
    Nadam {
        #[serde(default = "default_lr")]
        learning_rate: f64,
        #[serde(default = "default_beta1")]
        beta1: f64,
        #[serde(default = "default_beta2")]
        beta2: f64,
    },
    Adamax {
        #[serde(default = "default_lr")]
        learning_rate: f64,
        #[serde(default = "default_beta1")]
        beta1: f64,
        #[serde(default = "default_beta2")]
        beta2: f64,
    },
    AmsGrad {
        #[serde(default = "default_lr")]
        learning_rate: f64,
        #[serde(default = "default_beta1")]
        beta1: f64,
        #[serde(default = "default_beta2")]
        beta2: f64,
    },
    Adabound {
        #[serde(default = "default_lr")]
        learning_rate: f64,
        #[serde(default = "default_beta1")]
        beta1: f64,
        #[serde(default = "default_beta2")]
        beta2: f64,
        #[serde(default = "default_final_lr")]
        final_lr: f64,
        #[serde(default = "default_gamma")]
        gamma: f64,
    },
    AmsBound {
        #[serde(default = "default_lr")]
        learning_rate: f64,
        #[serde(default = "default_beta1")]
        beta1: f64,
        #[serde(default = "default_beta2")]
        beta2: f64,
        #[serde(default = "default_final_lr")]
        final_lr: f64,
        #[serde(default = "default_gamma")]
        gamma: f64,
    },
}

impl OptimizerConfig {
    /// Config for `kind` with every hyper-parameter at its default.
    pub fn default_for(kind: OptimizerType) -> OptimizerConfig {
        let learning_rate = DEFAULT_LEARNING_RATE;
        let (beta1, beta2) = (DEFAULT_BETA1, DEFAULT_BETA2);
        let (final_lr, gamma) = (DEFAULT_FINAL_LR, DEFAULT_GAMMA);
        match kind {
            OptimizerType::Sgd => OptimizerConfig::Sgd { learning_rate },
            OptimizerType::Momentum => OptimizerConfig::Momentum { learning_rate, momentum: DEFAULT_MOMENTUM },
            OptimizerType::Nesterov => OptimizerConfig::Nesterov { learning_rate, momentum: DEFAULT_MOMENTUM },
            OptimizerType::Adagrad => OptimizerConfig::Adagrad { learning_rate },
            OptimizerType::RmsProp => OptimizerConfig::RmsProp { learning_rate, beta: DEFAULT_BETA },
            OptimizerType::Adadelta => OptimizerConfig::Adadelta {
                learning_rate: DEFAULT_ADADELTA_LEARNING_RATE,
                beta: DEFAULT_BETA,
            },
            OptimizerType::Adam => OptimizerConfig::Adam { learning_rate, beta1, beta2 },
            OptimizerType::Nadam => OptimizerConfig::Nadam { learning_rate, beta1, beta2 },
            OptimizerType::Adamax => OptimizerConfig::Adamax { learning_rate, beta1, beta2 },
            OptimizerType::AmsGrad => OptimizerConfig::AmsGrad { learning_rate, beta1, beta2 },
            OptimizerType::Adabound => OptimizerConfig::Adabound { learning_rate, beta1, beta2, final_lr, gamma },
            OptimizerType::AmsBound => OptimizerConfig::AmsBound { learning_rate, beta1, beta2, final_lr, gamma },
        }
    }

    pub fn kind(&self) -> OptimizerType {
        match self {
            OptimizerConfig::Sgd { .. } => OptimizerType::Sgd,
            OptimizerConfig::Momentum { .. } => OptimizerType::Momentum,
            OptimizerConfig::Nesterov { .. } => OptimizerType::Nesterov,
            OptimizerConfig::Adagrad { .. } => OptimizerType::Adagrad,
            OptimizerConfig::RmsProp { .. } => OptimizerType::RmsProp,
            OptimizerConfig::Adadelta { .. } => OptimizerType::Adadelta,
            OptimizerConfig::Adam { .. } => OptimizerType::Adam,
            OptimizerConfig::Nadam { .. } => OptimizerType::Nadam,
            OptimizerConfig::Adamax { .. } => OptimizerType::Adamax,
            OptimizerConfig::AmsGrad { .. } => OptimizerType::AmsGrad,
            OptimizerConfig::Adabound { .. } => OptimizerType::Adabound,
            OptimizerConfig::AmsBound { .. } => OptimizerType::AmsBound,
        }
    }

    pub fn learning_rate(&self) -> f64 {
        match *self {
            OptimizerConfig::Sgd { learning_rate }
            | OptimizerConfig::Momentum { learning_rate, .. }
            | OptimizerConfig::Nesterov { learning_rate, .. }
            | OptimizerConfig::Adagrad { learning_rate }
            | OptimizerConfig::RmsProp { learning_rate, .. }
            | OptimizerConfig::Adadelta { learning_rate, .. }
            | OptimizerConfig::Adam { learning_rate, .. }
            | OptimizerConfig::Nadam { learning_rate, .. }
            | OptimizerConfig::Adamax { learning_rate, .. }
            | OptimizerConfig::AmsGrad { learning_rate, .. }
            | OptimizerConfig::Adabound { learning_rate, .. }
            | OptimizerConfig::AmsBound { learning_rate, .. } => learning_rate,
        }
    }

    /// Rejects non-positive rates and decay factors outside `[0, 1)`.
    pub fn validate(&self) -> Result<()> {
        check_positive("learning_rate", self.learning_rate())?;
        match *self {
            OptimizerConfig::Sgd { .. } | OptimizerConfig::Adagrad { .. } => Ok(()),
            OptimizerConfig::Momentum { momentum, .. } | OptimizerConfig::Nesterov { momentum, .. } => {
                check_decay("momentum", momentum)
            }
            OptimizerConfig::RmsProp { beta, .. } | OptimizerConfig::Adadelta { beta, .. } => {
                check_decay("beta", beta)
            }
            OptimizerConfig::Adam { beta1, beta2, .. }
            | OptimizerConfig::Nadam { beta1, beta2, .. }
            | OptimizerConfig::Adamax { beta1, beta2, .. }
            | OptimizerConfig::AmsGrad { beta1, beta2, .. } => {
                check_decay("beta1", beta1)?;
                check_decay("beta2", beta2)
            }
            OptimizerConfig::Adabound { beta1, beta2, final_lr, gamma, .. }
            | OptimizerConfig::AmsBound { beta1, beta2, final_lr, gamma, .. } => {
                check_decay("beta1", beta1)?;
                check_decay("beta2", beta2)?;
                check_positive("final_lr", final_lr)?;
                check_positive("gamma", gamma)
            }
        }
    }

    /// Validates the config and constructs a fresh optimizer with empty state.
    pub fn build(&self) -> Result<Box<dyn Optimizer>> {
        self.validate()?;
        let optimizer: Box<dyn Optimizer> = match *self {
            OptimizerConfig::Sgd { learning_rate } => Box::new(Sgd::new(learning_rate)),
            OptimizerConfig::Momentum { learning_rate, momentum } => {
                Box::new(Momentum::new(learning_rate, momentum))
            }
            OptimizerConfig::Nesterov { learning_rate, momentum } => {
                Box::new(Nesterov::new(learning_rate, momentum))
            }
            OptimizerConfig::Adagrad { learning_rate } => Box::new(Adagrad::new(learning_rate)),
            OptimizerConfig::RmsProp { learning_rate, beta } => Box::new(RmsProp::new(learning_rate, beta)),
            OptimizerConfig::Adadelta { learning_rate, beta } => Box::new(Adadelta::new(learning_rate, beta)),
            OptimizerConfig::Adam { learning_rate, beta1, beta2 } => {
                Box::new(Adam::new(learning_rate, beta1, beta2))
            }
            OptimizerConfig::Nadam { learning_rate, beta1, beta2 } => {
                Box::new(Nadam::new(learning_rate, beta1, beta2))
            }
            OptimizerConfig::Adamax { learning_rate, beta1, beta2 } => {
                Box::new(Adamax::new(learning_rate, beta1, beta2))
            }
            OptimizerConfig::AmsGrad { learning_rate, beta1, beta2 } => {
                Box::new(AmsGrad::new(learning_rate, beta1, beta2))
            }
            OptimizerConfig::Adabound { learning_rate, beta1, beta2, final_lr, gamma } => {
                Box::new(Adabound::new(learning_rate, beta1, beta2, final_lr, gamma))
            }
            OptimizerConfig::AmsBound { learning_rate, beta1, beta2, final_lr, gamma } => {
                Box::new(AmsBound::new(learning_rate, beta1, beta2, final_lr, gamma))
            }
        };
        Ok(optimizer)
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        OptimizerConfig::default_for(OptimizerType::Adam)
    }
}

fn check_positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(NnError::InvalidConfig(format!("{name} must be positive, got {value}")))
    }
}

fn check_decay(name: &str, value: f64) -> Result<()> {
    if (0.0..1.0).contains(&value) {
        Ok(())
    } else {
        Err(NnError::InvalidConfig(format!("{name} must lie in [0, 1), got {value}")))
    }
}
