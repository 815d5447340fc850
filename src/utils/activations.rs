//! Activation functions for the coordinate network
//!
//! - ReLU and its derivative for hidden layers
//! - Unit clamp for the output layer (colors live in [0, 1])

/// ReLU activation function applied in-place.
///
/// Sets all negative values to 0.0, keeps positive values unchanged.
pub fn relu_inplace(data: &mut [f32]) {
    for value in data.iter_mut() {
        if *value < 0.0 {
            *value = 0.0;
        }
    }
}

/// ReLU derivative from the pre-activation: 1 when positive, 0 otherwise.
pub fn relu_derivative(pre_activation: f32) -> f32 {
    if pre_activation > 0.0 {
        1.0
    } else {
        0.0
    }
}

/// Clamped linear output activation applied in-place.
///
/// Its derivative is treated as 1 everywhere during backpropagation.
pub fn clamp_unit_inplace(data: &mut [f32]) {
    for value in data.iter_mut() {
        *value = value.clamp(0.0, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relu_mixed() {
        let mut data = vec![-2.0, -1.0, 0.0, 1.0, 2.0];
        relu_inplace(&mut data);
        assert_eq!(data, vec![0.0, 0.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_relu_derivative_at_zero_is_zero() {
        assert_eq!(relu_derivative(0.0), 0.0);
        assert_eq!(relu_derivative(-3.0), 0.0);
        assert_eq!(relu_derivative(1e-6), 1.0);
    }

    #[test]
    fn test_clamp_unit() {
        let mut data = vec![-5.0, 0.25, 1.0, 42.0];
        clamp_unit_inplace(&mut data);
        assert_eq!(data, vec![0.0, 0.25, 1.0, 1.0]);
    }
}
