use feedforward::optim::Adam;
use feedforward::{
    ActivationFunction, LayerSpec, LossType, Network, RegularizerType, TrainingData,
    WeightInitializer,
};
use tracing_subscriber::EnvFilter;

fn main() -> feedforward::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let mut network = Network::new(
        2,
        vec![
            LayerSpec::new(4, 2, ActivationFunction::Sigmoid),
            LayerSpec::new(4, 4, ActivationFunction::Sigmoid),
            LayerSpec::new(1, 4, ActivationFunction::Sigmoid),
        ],
        WeightInitializer::XavierUniform,
        LossType::Mse,
    )?;

    let data = vec![
        TrainingData::scalar(vec![1.0, 0.0], 1.0),
        TrainingData::scalar(vec![1.0, 1.0], 0.0),
        TrainingData::scalar(vec![0.0, 1.0], 1.0),
        TrainingData::scalar(vec![0.0, 0.0], 0.0),
    ];

    let mut optimizer = Adam::new(0.01, 0.9, 0.999);
    let epochs = 2000;

    let history = network.train(&mut optimizer, epochs, &data, 1, RegularizerType::None)?;
    for stats in history.iter().step_by(200) {
        println!("Epoch {}: loss = {:.6}", stats.epoch, stats.loss);
    }

    for example in &data {
        let output = network.eval(&example.inputs)?;
        println!("Input: {:?} -> Output: {:.4}", example.inputs, output.value);
    }
    Ok(())
}
