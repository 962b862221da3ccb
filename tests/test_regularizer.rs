// Weight penalties leave the gradient untouched when every weight is zero.

use feedforward::{Matrix, Regularizer, RegularizerType};

#[test]
fn zero_weights_contribute_nothing() {
    let weights = Matrix::zeros(4, 3);
    let gradient = Matrix::from_data(vec![
        vec![0.5, -0.25, 1.0],
        vec![0.0, 2.0, -3.0],
        vec![1e-9, -1e-9, 0.0],
        vec![7.0, 8.0, 9.0],
    ]);
    for kind in [RegularizerType::None, RegularizerType::L1, RegularizerType::L2, RegularizerType::L1L2] {
        for (l1, l2) in [(0.01, 0.01), (1.0, 5.0)] {
            let mut g = gradient.clone();
            Regularizer::with_strength(kind, l1, l2).regularize(&weights, &mut g);
            assert_eq!(g, gradient, "{kind:?} changed the gradient");
        }
    }
}

#[test]
fn tags_round_trip() {
    for tag in 0..4 {
        assert_eq!(RegularizerType::from_tag(tag).unwrap().tag(), tag);
    }
    assert!(RegularizerType::from_tag(4).is_err());
}
