//! # Matrix Benchmarks
//!
//! Run: `cargo bench --bench matrix`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use feedforward::optim::Adam;
use feedforward::{ActivationFunction, LayerSpec, LossType, Network, TrainingData, WeightInitializer};
use feedforward::{Matrix, TrainConfig};
use rand::{rngs::StdRng, SeedableRng};

fn bench_multiply(c: &mut Criterion) {
    let mut group = c.benchmark_group("matrix_multiply");
    let mut rng = StdRng::seed_from_u64(0);

    for size in [16usize, 64, 128] {
        let a = Matrix::random_with_rng(size, size, &mut rng);
        let b = Matrix::random_with_rng(size, size, &mut rng);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |bench, _| {
            bench.iter(|| black_box(&a * &b))
        });
    }

    let w = Matrix::random_with_rng(128, 784, &mut rng);
    let x = Matrix::random_with_rng(784, 1, &mut rng);
    group.bench_function("layer_128x784_times_column", |bench| {
        bench.iter(|| black_box(&w * &x))
    });

    group.finish();
}

fn bench_transpose(c: &mut Criterion) {
    let m = Matrix::random_with_rng(256, 256, &mut StdRng::seed_from_u64(1));
    c.bench_function("transpose_256", |bench| bench.iter(|| black_box(m.transpose())));
}

fn bench_training_epoch(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(2);
    let data: Vec<TrainingData> = (0..64)
        .map(|i| TrainingData::one_hot(Matrix::random_with_rng(32, 1, &mut rng).data, i % 4, 4))
        .collect();
    let mut network = Network::with_rng(
        32,
        vec![
            LayerSpec::new(16, 32, ActivationFunction::ReLU),
            LayerSpec::new(4, 16, ActivationFunction::Softmax),
        ],
        WeightInitializer::HeNormal,
        LossType::Nll,
        &mut rng,
    )
    .expect("valid layer chain");
    let mut adam = Adam::new(0.001, 0.9, 0.999);
    let config = TrainConfig::new(1, 8).with_seed(3);

    c.bench_function("epoch_64x32_batch8_adam", |bench| {
        bench.iter(|| feedforward::train_loop(&mut network, &mut adam, &data, &config).expect("training"))
    });
}

criterion_group!(benches, bench_multiply, bench_transpose, bench_training_epoch);
criterion_main!(benches);
