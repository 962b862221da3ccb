// The builder handle: layers, samples, compile, train, eval, persist.

use feedforward::{
    ActivationFunction, DenseSpec, LossType, OptimizerConfig, RegularizerType, Session,
    WeightInitializer,
};

fn and_gate() -> Session {
    let mut session = Session::new(2, WeightInitializer::XavierUniform, LossType::Mse);
    session.add_dense(DenseSpec::new(3, ActivationFunction::Tanh)).unwrap();
    session.add_dense(DenseSpec::new(1, ActivationFunction::Sigmoid)).unwrap();
    for (a, b) in [(0.0, 0.0), (0.0, 1.0), (1.0, 0.0), (1.0, 1.0)] {
        let y = if a > 0.5 && b > 0.5 { 1.0 } else { 0.0 };
        session.add_training_sample(vec![a, b], vec![y]).unwrap();
    }
    session
}

#[test]
fn session_trains_and_reports_history() {
    let mut session = and_gate();
    session.compile().unwrap();
    let optimizer: OptimizerConfig =
        serde_json::from_str(r#"{ "type": "adam", "learning_rate": 0.05 }"#).unwrap();
    let history = session.train(&optimizer, 300, 4, RegularizerType::L2).unwrap();
    assert_eq!(history.len(), 300);
    assert!(history[299].loss < history[0].loss);
    assert!(session.eval(&[1.0, 1.0]).unwrap().value > session.eval(&[0.0, 0.0]).unwrap().value);
}

#[test]
fn saved_session_reopens_with_the_same_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("and.bin");

    let mut session = and_gate();
    session.compile().unwrap();
    session.save_model(&path).unwrap();

    let mut reopened = Session::load_model(&path).unwrap();
    assert!(reopened.samples().is_empty());
    assert_eq!(reopened.network().unwrap().layer_count(), 2);
    for input in [[0.0, 1.0], [1.0, 1.0]] {
        assert_eq!(reopened.eval(&input).unwrap(), session.eval(&input).unwrap());
    }
    assert!(reopened.add_dense(DenseSpec::new(2, ActivationFunction::ReLU)).is_err());
}

#[test]
fn mismatched_target_width_fails_at_train_time() {
    let mut session = Session::new(1, WeightInitializer::Random, LossType::Mse);
    session.add_dense(DenseSpec::new(2, ActivationFunction::Sigmoid)).unwrap();
    session.add_training_sample(vec![0.5], vec![1.0]).unwrap();
    session.compile().unwrap();
    let sgd = OptimizerConfig::default_for(feedforward::OptimizerType::Sgd);
    assert!(session.train(&sgd, 1, 1, RegularizerType::None).is_err());
}
