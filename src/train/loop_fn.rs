use std::sync::atomic::Ordering;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::error::{NnError, Result};
use crate::network::network::Network;
use crate::optim::Optimizer;
use crate::train::data::TrainingData;
use crate::train::epoch_stats::EpochStats;
use crate::train::train_config::{ResetPolicy, TrainConfig};

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Trains `network` for `config.epochs` epochs and returns one `EpochStats`
/// per completed epoch.
///
/// Every epoch shuffles a private ordering of `data`, splits it into batches
/// of `config.batch_size` (the last one may be shorter) and, per batch:
/// backpropagates every example, averages the gradient sums, regularizes the
/// weight gradients and updates the layers from output to input.
///
/// # Early termination
/// The loop breaks early if:
/// - the `progress_tx` receiver has been dropped, **or**
/// - `config.stop_flag` is set to `true`.
///
/// # Errors
/// `InvalidConfig` for a zero batch size, negative regularization or empty
/// data; `InputSize` / `TargetSize` for examples that do not fit the network.
/// Nothing is trained when an error is returned.
pub fn train_loop(
    network: &mut Network,
    optimizer: &mut dyn Optimizer,
    data: &[TrainingData],
    config: &TrainConfig,
) -> Result<Vec<EpochStats>> {
    config.validate()?;
    if data.is_empty() {
        return Err(NnError::InvalidConfig("training data must not be empty".into()));
    }
    network.validate_data(data)?;

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut order: Vec<&TrainingData> = data.iter().collect();
    let mut history = Vec::with_capacity(config.epochs);

    debug!(
        epochs = config.epochs,
        batch_size = config.batch_size,
        examples = data.len(),
        optimizer = ?optimizer.kind(),
        "starting training"
    );

    for epoch in 1..=config.epochs {
        if stop_requested(config) {
            debug!(epoch, "stop flag set, ending training");
            break;
        }

        let t_start = Instant::now();

        if config.reset_policy == ResetPolicy::EveryEpoch {
            optimizer.reset();
        }

        // ── One full pass over the training data ───────────────────────────
        order.shuffle(&mut rng);
        let (loss, batches) = run_one_epoch(network, optimizer, &order, config, epoch);

        let elapsed_ms = t_start.elapsed().as_millis() as u64;
        info!(epoch, loss, elapsed_ms, "epoch complete");
        if !loss.is_finite() {
            warn!(epoch, loss, "epoch loss is not finite");
        }

        // ── Emit progress ─────────────────────────────────────────────────
        let stats = EpochStats {
            epoch,
            total_epochs: config.epochs,
            loss,
            batches,
            elapsed_ms,
        };
        history.push(stats.clone());

        if let Some(ref tx) = config.progress_tx {
            // If the receiver has been dropped, stop training.
            if tx.send(stats).is_err() {
                debug!(epoch, "progress receiver dropped, ending training");
                break;
            }
        }
    }

    Ok(history)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// Runs one epoch over `order` and returns the mean per-example loss and the
/// number of batches.
fn run_one_epoch(
    network: &mut Network,
    optimizer: &mut dyn Optimizer,
    order: &[&TrainingData],
    config: &TrainConfig,
    epoch: usize,
) -> (f64, usize) {
    let mut total_loss = 0.0;
    let mut examples = 0;
    let mut batches = 0;

    for batch in order.chunks(config.batch_size) {
        let mut gradients = network.backpropagation(batch.iter().copied());
        total_loss += gradients.loss;
        examples += gradients.examples;
        gradients.average();
        network.apply_gradients(optimizer, gradients, &config.regularizer, epoch);
        batches += 1;
    }

    (total_loss / examples.max(1) as f64, batches)
}

fn stop_requested(config: &TrainConfig) -> bool {
    config
        .stop_flag
        .as_ref()
        .is_some_and(|flag| flag.load(Ordering::Relaxed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::ActivationFunction;
    use crate::init::WeightInitializer;
    use crate::loss::LossType;
    use crate::network::LayerSpec;
    use crate::optim::{Adam, OptimizerType, Sgd};
    use crate::layers::Layer;
    use crate::math::Matrix;
    use std::sync::atomic::AtomicBool;
    use std::sync::{mpsc, Arc};

    fn linear_net() -> Network {
        Network::with_rng(
            1,
            vec![LayerSpec::new(1, 1, ActivationFunction::leaky_relu())],
            WeightInitializer::Random,
            LossType::Mse,
            &mut StdRng::seed_from_u64(1),
        )
        .unwrap()
    }

    fn line() -> Vec<TrainingData> {
        (0..8)
            .map(|i| {
                let x = i as f64 / 8.0;
                TrainingData::scalar(vec![x], 0.5 * x + 0.25)
            })
            .collect()
    }

    /// Records how the loop drives the optimizer.
    struct Recorder {
        resets: usize,
        calls: Vec<(usize, usize)>,
    }

    impl Optimizer for Recorder {
        fn update_layer(&mut self, _: &mut Layer, _: &Matrix, _: &Matrix, index: usize, epoch: usize) {
            self.calls.push((index, epoch));
        }

        fn reset(&mut self) {
            self.resets += 1;
        }

        fn kind(&self) -> OptimizerType {
            OptimizerType::Sgd
        }
    }

    fn two_layer_net() -> Network {
        Network::new(
            2,
            vec![
                LayerSpec::new(3, 2, ActivationFunction::Sigmoid),
                LayerSpec::new(1, 3, ActivationFunction::Sigmoid),
            ],
            WeightInitializer::XavierNormal,
            LossType::Mse,
        )
        .unwrap()
    }

    #[test]
    fn updates_run_output_first_once_per_batch() {
        let mut net = two_layer_net();
        let data = vec![TrainingData::scalar(vec![0.0, 1.0], 1.0); 5];
        let mut rec = Recorder { resets: 0, calls: Vec::new() };
        let history = train_loop(&mut net, &mut rec, &data, &TrainConfig::new(2, 2)).unwrap();

        assert_eq!(history.len(), 2);
        assert_eq!(history[0].batches, 3);
        assert_eq!(rec.resets, 2);
        assert_eq!(&rec.calls[..2], &[(1, 1), (0, 1)]);
        assert_eq!(rec.calls.len(), 2 * 3 * 2);
        assert_eq!(rec.calls.last(), Some(&(0, 2)));
    }

    #[test]
    fn never_policy_keeps_optimizer_state() {
        let mut net = two_layer_net();
        let data = vec![TrainingData::scalar(vec![1.0, 0.0], 0.0)];
        let mut rec = Recorder { resets: 0, calls: Vec::new() };
        let config = TrainConfig::new(3, 1).with_reset_policy(ResetPolicy::Never);
        train_loop(&mut net, &mut rec, &data, &config).unwrap();
        assert_eq!(rec.resets, 0);
    }

    #[test]
    fn sgd_reduces_loss_on_a_line() {
        let mut net = linear_net();
        let data = line();
        let before = net.evaluate_loss(&data).unwrap();
        let mut sgd = Sgd::new(0.1);
        let config = TrainConfig::new(200, 2).with_seed(3);
        let history = train_loop(&mut net, &mut sgd, &data, &config).unwrap();
        let after = net.evaluate_loss(&data).unwrap();
        assert!(after < before);
        assert!(history.last().unwrap().loss < history[0].loss);
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let data = line();
        let run = || {
            let mut net = linear_net();
            let mut adam = Adam::new(0.01, 0.9, 0.999);
            let config = TrainConfig::new(5, 3).with_seed(42);
            train_loop(&mut net, &mut adam, &data, &config).unwrap();
            net.predict(&[0.3]).unwrap()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn stop_flag_halts_before_the_first_epoch() {
        let mut net = linear_net();
        let flag = Arc::new(AtomicBool::new(true));
        let config = TrainConfig::new(10, 1).with_stop_flag(flag);
        let history = train_loop(&mut net, &mut Sgd::new(0.1), &line(), &config).unwrap();
        assert!(history.is_empty());
    }

    #[test]
    fn progress_channel_receives_every_epoch() {
        let mut net = linear_net();
        let (tx, rx) = mpsc::channel();
        let config = TrainConfig::new(4, 8).with_progress(tx);
        train_loop(&mut net, &mut Sgd::new(0.05), &line(), &config).unwrap();
        drop(config);
        let epochs: Vec<usize> = rx.iter().map(|s| s.epoch).collect();
        assert_eq!(epochs, vec![1, 2, 3, 4]);
    }

    #[test]
    fn dropped_receiver_ends_training() {
        let mut net = linear_net();
        let (tx, rx) = mpsc::channel();
        drop(rx);
        let config = TrainConfig::new(50, 8).with_progress(tx);
        let history = train_loop(&mut net, &mut Sgd::new(0.05), &line(), &config).unwrap();
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn empty_data_and_zero_batch_are_errors() {
        let mut net = linear_net();
        let mut sgd = Sgd::new(0.1);
        assert!(train_loop(&mut net, &mut sgd, &[], &TrainConfig::new(1, 1)).is_err());
        assert!(train_loop(&mut net, &mut sgd, &line(), &TrainConfig::new(1, 0)).is_err());
    }
}
