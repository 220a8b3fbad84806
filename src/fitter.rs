//! Online coefficient fitter
//!
//! MAP logistic regression: Bernoulli-logit likelihood with an independent
//! zero-mean Gaussian prior on every weight, i.e. L2-penalised logistic
//! regression. Plain batch gradient ascent, warm-started from the current
//! coefficients, for a fixed number of iterations. No randomness.

use serde::{Deserialize, Serialize};

use crate::core::config::RecalibrationConfig;
use crate::core::error::{Result, SimError};
use crate::core::math::sigmoid;

/// One training row: features and a 0/1 label
pub type Sample<const D: usize> = ([f64; D], f64);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitParams {
    /// Prior precision (1 / sigma^2)
    pub l2: f64,
    pub learning_rate: f64,
    pub iterations: u32,
}

impl From<&RecalibrationConfig> for FitParams {
    fn from(config: &RecalibrationConfig) -> Self {
        Self {
            l2: config.l2,
            learning_rate: config.learning_rate,
            iterations: config.iterations,
        }
    }
}

impl Default for FitParams {
    fn default() -> Self {
        Self::from(&RecalibrationConfig::default())
    }
}

/// Maximise `sum_i log Bern(y_i | sigmoid(w . x_i)) - l2/2 * |w|^2` from `initial`
///
/// Each iteration takes `w += lr / max(1, n) * (X^T (y - p) - l2 * w)`.
/// Fails only if the weights stop being finite.
pub fn fit_logistic_map<const D: usize>(
    samples: &[Sample<D>],
    initial: [f64; D],
    params: &FitParams,
) -> Result<[f64; D]> {
    let step = params.learning_rate / (samples.len().max(1) as f64);
    let mut w = initial;

    for _ in 0..params.iterations {
        let mut grad = w.map(|wk| -params.l2 * wk);
        for (x, y) in samples {
            let p = sigmoid(linear(&w, x));
            let residual = y - p;
            for (g, xk) in grad.iter_mut().zip(x) {
                *g += xk * residual;
            }
        }
        for (wk, g) in w.iter_mut().zip(grad) {
            *wk += step * g;
        }
    }

    if w.iter().all(|x| x.is_finite()) {
        Ok(w)
    } else {
        Err(SimError::Numerical(format!("logistic fit diverged: {w:?}")))
    }
}

/// Predicted probability of label 1 for one feature row
pub fn predict<const D: usize>(w: &[f64; D], x: &[f64; D]) -> f64 {
    sigmoid(linear(w, x))
}

fn linear<const D: usize>(w: &[f64; D], x: &[f64; D]) -> f64 {
    w.iter().zip(x).map(|(a, b)| a * b).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROW: [f64; 5] = [0.3, 0.4, 0.12, 0.1, 1.0];

    fn mean_prediction(w: &[f64; 5], samples: &[Sample<5>]) -> f64 {
        samples.iter().map(|(x, _)| predict(w, x)).sum::<f64>() / samples.len() as f64
    }

    #[test]
    fn test_all_zero_labels_push_predictions_down() {
        let samples: Vec<Sample<5>> = (0..200).map(|_| (ROW, 0.0)).collect();
        let start = [0.0; 5];
        let mut last = mean_prediction(&start, &samples);
        assert!((last - 0.5).abs() < 1e-12);

        for iterations in [10, 40, 160] {
            let params = FitParams {
                iterations,
                ..FitParams::default()
            };
            let w = fit_logistic_map(&samples, start, &params).unwrap();
            assert!(w.iter().all(|x| x.is_finite()));
            let mean = mean_prediction(&w, &samples);
            assert!(mean < last, "{iterations} iterations: {mean} !< {last}");
            last = mean;
        }
    }

    #[test]
    fn test_learns_direction_of_signal() {
        let samples: Vec<Sample<2>> = (0..100)
            .map(|i| {
                let x = if i % 2 == 0 { 1.0 } else { -1.0 };
                ([x, 1.0], if i % 2 == 0 { 1.0 } else { 0.0 })
            })
            .collect();
        let params = FitParams {
            iterations: 500,
            ..FitParams::default()
        };
        let w = fit_logistic_map(&samples, [0.0, 0.0], &params).unwrap();
        assert!(w[0] > 0.5);
        assert!(predict(&w, &[1.0, 1.0]) > 0.6);
        assert!(predict(&w, &[-1.0, 1.0]) < 0.4);
    }

    #[test]
    fn test_empty_samples_only_apply_prior() {
        let params = FitParams {
            iterations: 1,
            ..FitParams::default()
        };
        let w = fit_logistic_map::<2>(&[], [1.0, -1.0], &params).unwrap();
        // one step of w -= lr * l2 * w with lr = 0.25, l2 = 0.8
        assert!((w[0] - 0.8).abs() < 1e-12);
        assert!((w[1] + 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_deterministic() {
        let samples: Vec<Sample<5>> = (0..50).map(|i| (ROW, (i % 3 == 0) as u8 as f64)).collect();
        let params = FitParams::default();
        let a = fit_logistic_map(&samples, [0.1; 5], &params).unwrap();
        let b = fit_logistic_map(&samples, [0.1; 5], &params).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_non_finite_start_is_reported() {
        let samples: Vec<Sample<1>> = vec![([1.0], 1.0)];
        let result = fit_logistic_map(&samples, [f64::NAN], &FitParams::default());
        assert!(matches!(result, Err(SimError::Numerical(_))));
    }
}
