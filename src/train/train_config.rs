use serde::{Serialize, Deserialize};
use std::sync::mpsc;
use std::sync::{Arc, atomic::AtomicBool};

use crate::error::{NnError, Result};
use crate::regularize::regularizer::Regularizer;
use crate::train::epoch_stats::EpochStats;

/// When optimizer accumulators are dropped during a `train_loop` run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetPolicy {
    /// `Optimizer::reset` at the start of every epoch, so moments and
    /// velocities never carry over between epochs.
    #[default]
    EveryEpoch,
    /// Accumulators persist for the whole run and across runs until the
    /// caller resets the optimizer.
    Never,
}

/// Configuration for a `train_loop` run.
///
/// # Fields
/// - `epochs`       - total number of full passes over the training data
/// - `batch_size`   - samples per mini-batch; use `1` for online training
/// - `regularizer`  - weight penalty added to each averaged weight gradient
/// - `reset_policy` - when the optimizer state is cleared
/// - `seed`         - seeds the per-epoch shuffle; `None` draws from entropy
/// - `progress_tx`  - optional channel sender; one `EpochStats` is sent per
///                    completed epoch.  If the receiver is dropped the loop
///                    terminates early (clean shutdown).
/// - `stop_flag`    - optional atomic flag; when set to `true` from another
///                    thread the loop terminates after the current epoch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub epochs: usize,
    pub batch_size: usize,
    #[serde(default)]
    pub regularizer: Regularizer,
    #[serde(default)]
    pub reset_policy: ResetPolicy,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(skip)]
    pub progress_tx: Option<mpsc::Sender<EpochStats>>,
    #[serde(skip)]
    pub stop_flag: Option<Arc<AtomicBool>>,
}

impl TrainConfig {
    /// Creates a minimal `TrainConfig` with no regularization, a per-epoch
    /// optimizer reset, no progress channel and no stop flag.
    pub fn new(epochs: usize, batch_size: usize) -> Self {
        TrainConfig {
            epochs,
            batch_size,
            regularizer: Regularizer::default(),
            reset_policy: ResetPolicy::default(),
            seed: None,
            progress_tx: None,
            stop_flag: None,
        }
    }

    pub fn with_regularizer(mut self, regularizer: Regularizer) -> Self {
        self.regularizer = regularizer;
        self
    }

    pub fn with_reset_policy(mut self, reset_policy: ResetPolicy) -> Self {
        self.reset_policy = reset_policy;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_progress(mut self, tx: mpsc::Sender<EpochStats>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    pub fn with_stop_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.stop_flag = Some(flag);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(NnError::InvalidConfig("batch_size must be at least 1".into()));
        }
        let (l1, l2) = (self.regularizer.l1, self.regularizer.l2);
        if !(l1.is_finite() && l1 >= 0.0 && l2.is_finite() && l2 >= 0.0) {
            return Err(NnError::InvalidConfig(format!(
                "regularization strengths must be non-negative, got l1={l1} l2={l2}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regularize::RegularizerType;

    #[test]
    fn zero_batch_size_is_invalid() {
        assert!(TrainConfig::new(1, 0).validate().is_err());
        assert!(TrainConfig::new(0, 1).validate().is_ok());
    }

    #[test]
    fn json_config_defaults() {
        let config: TrainConfig = serde_json::from_str(r#"{ "epochs": 10, "batch_size": 4 }"#).unwrap();
        assert_eq!(config.reset_policy, ResetPolicy::EveryEpoch);
        assert_eq!(config.regularizer.kind, RegularizerType::None);
        assert!(config.seed.is_none() && config.progress_tx.is_none());

        let config: TrainConfig = serde_json::from_str(
            r#"{ "epochs": 1, "batch_size": 1, "reset_policy": "never", "seed": 9,
                 "regularizer": { "kind": "l2", "l1": 0.0, "l2": 0.5 } }"#,
        )
        .unwrap();
        assert_eq!(config.reset_policy, ResetPolicy::Never);
        assert_eq!(config.regularizer.l2, 0.5);
        assert_eq!(config.seed, Some(9));
    }
}
