// Finite-difference checks of the analytic gradients produced by
// `Network::backpropagation`.

use feedforward::{
    ActivationFunction, Layer, LossType, Matrix, Network, TrainingData,
};

const H: f64 = 1e-5;

fn loss_at(network: &mut Network, example: &TrainingData) -> f64 {
    network.evaluate_loss(std::slice::from_ref(example)).unwrap()
}

fn assert_close(analytic: f64, numeric: f64, what: &str) {
    let diff = (analytic - numeric).abs();
    let scale = analytic.abs().max(numeric.abs());
    assert!(
        diff < 1e-9 || diff / scale < 1e-4,
        "{what}: analytic {analytic} vs numeric {numeric}"
    );
}

/// Central differences for every weight and bias of every layer.
fn check_network(mut network: Network, example: TrainingData) {
    let grads = network.backpropagation(std::iter::once(&example));

    for l in 0..network.layer_count() {
        let (rows, cols) = network.layers()[l].weights.shape();
        for r in 0..rows {
            for c in 0..cols {
                let original = network.layers()[l].weights.get(r, c);
                network.layers_mut()[l].weights.set(r, c, original + H);
                let plus = loss_at(&mut network, &example);
                network.layers_mut()[l].weights.set(r, c, original - H);
                let minus = loss_at(&mut network, &example);
                network.layers_mut()[l].weights.set(r, c, original);

                let numeric = (plus - minus) / (2.0 * H);
                assert_close(grads.layers[l].weight.get(r, c), numeric, &format!("w[{l}][{r},{c}]"));
            }

            let original = network.layers()[l].biases.get(r, 0);
            network.layers_mut()[l].biases.set(r, 0, original + H);
            let plus = loss_at(&mut network, &example);
            network.layers_mut()[l].biases.set(r, 0, original - H);
            let minus = loss_at(&mut network, &example);
            network.layers_mut()[l].biases.set(r, 0, original);

            let numeric = (plus - minus) / (2.0 * H);
            assert_close(grads.layers[l].bias.get(r, 0), numeric, &format!("b[{l}][{r}]"));
        }
    }
}

fn layer(weights: Vec<Vec<f64>>, biases: &[f64], activation: ActivationFunction) -> Layer {
    Layer::from_parts(Matrix::from_data(weights), Matrix::column(biases), activation)
}

#[test]
fn single_sigmoid_layer_matches_finite_differences() {
    let network = Network::from_layers(
        3,
        vec![layer(
            vec![vec![0.4, -0.7, 0.2], vec![-0.3, 0.5, 0.9]],
            &[0.1, -0.2],
            ActivationFunction::Sigmoid,
        )],
        LossType::HalfQuadratic,
    )
    .unwrap();
    check_network(network, TrainingData::new(vec![0.5, -1.0, 2.0], vec![1.0, 0.0]));
}

#[test]
fn single_tanh_layer_with_mse_matches_finite_differences() {
    let network = Network::from_layers(
        2,
        vec![layer(vec![vec![0.8, -0.6], vec![0.3, 0.3], vec![-1.1, 0.2]], &[0.0, 0.5, -0.5], ActivationFunction::Tanh)],
        LossType::Mse,
    )
    .unwrap();
    check_network(network, TrainingData::new(vec![0.7, -0.4], vec![0.2, -0.3, 0.9]));
}

#[test]
fn stacked_layers_match_finite_differences() {
    let network = Network::from_layers(
        2,
        vec![
            layer(vec![vec![0.5, -0.4], vec![0.9, 0.1], vec![-0.6, 0.8]], &[0.1, 0.0, -0.1], ActivationFunction::Tanh),
            layer(vec![vec![0.3, -0.8, 0.6], vec![-0.2, 0.4, 0.7]], &[0.2, -0.3], ActivationFunction::elu()),
            layer(vec![vec![1.2, -0.9]], &[0.05], ActivationFunction::Sigmoid),
        ],
        LossType::Quadratic,
    )
    .unwrap();
    check_network(network, TrainingData::scalar(vec![0.6, -0.9], 1.0));
}
