use crate::math::matrix::Matrix;

/// Accumulator kept for one layer: one value for the weights, one for the biases.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamPair<T> {
    pub weight: T,
    pub bias: T,
}

/// Per-layer optimizer state addressed by layer position.
///
/// Slots are created lazily the first time a layer index is updated and the
/// vector grows to cover it. `clear` drops every slot.
#[derive(Debug, Clone)]
pub struct LayerSlots<T> {
    slots: Vec<Option<ParamPair<T>>>,
}

impl<T> LayerSlots<T> {
    pub fn new() -> Self {
        LayerSlots { slots: Vec::new() }
    }

    pub fn get(&self, index: usize) -> Option<&ParamPair<T>> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Number of layers that currently hold state.
    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Folds the gradients of layer `index` into its accumulators.
    ///
    /// On the first call for `index` the accumulators are built with `first`,
    /// afterwards `next` updates them in place. Returns the updated state.
    pub fn accumulate<F, N>(
        &mut self,
        index: usize,
        delta_weight: &Matrix,
        delta_bias: &Matrix,
        first: F,
        next: N,
    ) -> &mut ParamPair<T>
    where
        F: Fn(&Matrix) -> T,
        N: Fn(&mut T, &Matrix),
    {
        if index >= self.slots.len() {
            self.slots.resize_with(index + 1, || None);
        }
        let slot = &mut self.slots[index];
        let state = match slot.take() {
            Some(mut state) => {
                next(&mut state.weight, delta_weight);
                next(&mut state.bias, delta_bias);
                state
            }
            None => ParamPair {
                weight: first(delta_weight),
                bias: first(delta_bias),
            },
        };
        slot.insert(state)
    }
}

impl<T> Default for LayerSlots<T> {
    fn default() -> Self {
        LayerSlots::new()
    }
}

/// `acc = beta * acc + (1 - beta) * value`, in place.
pub fn decay_into(acc: &mut Matrix, beta: f64, value: &Matrix) {
    *acc *= beta;
    *acc += &(value * (1.0 - beta));
}

pub fn squared(m: &Matrix) -> Matrix {
    m.map(|x| x * x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulate_creates_then_updates() {
        let mut slots: LayerSlots<Matrix> = LayerSlots::new();
        let dw = Matrix::filled(2, 2, 1.0);
        let db = Matrix::filled(2, 1, 2.0);

        let state = slots.accumulate(2, &dw, &db, |g| g.clone(), |acc, g| *acc += g);
        assert_eq!(state.weight, dw);
        assert_eq!(slots.occupied(), 1);
        assert!(slots.get(0).is_none());

        let state = slots.accumulate(2, &dw, &db, |g| g.clone(), |acc, g| *acc += g);
        assert_eq!(state.bias, Matrix::filled(2, 1, 4.0));

        slots.clear();
        assert_eq!(slots.occupied(), 0);
    }

    #[test]
    fn decay_is_an_exponential_moving_average() {
        let mut acc = Matrix::filled(1, 1, 10.0);
        decay_into(&mut acc, 0.9, &Matrix::filled(1, 1, 0.0));
        assert_eq!(acc.data[0], 9.0);
    }
}
