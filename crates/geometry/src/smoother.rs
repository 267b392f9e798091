//! Exponential moving-average smoothing for per-frame signal streams

/// Default smoothing decay used by the monitoring loop
pub const DEFAULT_ALPHA: f64 = 0.35;

/// Stateful exponential moving average over an `N`-component signal.
///
/// One instance per logical stream; the first observed sample initializes
/// the state undamped, and there is no reset other than recreating the
/// instance.
#[derive(Debug, Clone)]
pub struct Smoother<const N: usize> {
    alpha: f64,
    state: Option<[f64; N]>,
}

impl<const N: usize> Smoother<N> {
    pub fn new(alpha: f64) -> Self {
        assert!(alpha > 0.0 && alpha <= 1.0, "alpha must be in (0, 1]");
        Self { alpha, state: None }
    }

    /// Fold in a new sample: `state = alpha*new + (1-alpha)*state`.
    pub fn update(&mut self, sample: [f64; N]) -> [f64; N] {
        let next = match self.state {
            None => sample,
            Some(state) => {
                let mut next = [0.0; N];
                for i in 0..N {
                    next[i] = self.alpha * sample[i] + (1.0 - self.alpha) * state[i];
                }
                next
            }
        };
        self.state = Some(next);
        next
    }

    /// Current smoothed value, if any sample has been observed.
    pub fn value(&self) -> Option<[f64; N]> {
        self.state
    }
}

impl<const N: usize> Default for Smoother<N> {
    fn default() -> Self {
        Self::new(DEFAULT_ALPHA)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sample_passes_through() {
        let mut smoother = Smoother::<1>::default();
        assert_eq!(smoother.value(), None);
        assert_eq!(smoother.update([10.0]), [10.0]);
        assert_eq!(smoother.value(), Some([10.0]));
    }

    #[test]
    fn test_second_sample_exact_recursion() {
        let mut smoother = Smoother::<1>::new(0.35);
        smoother.update([10.0]);
        let [smoothed] = smoother.update([20.0]);
        // 0.35 * 20 + 0.65 * 10
        assert!((smoothed - 13.5).abs() < 1e-12);
    }

    #[test]
    fn test_vector_streams_smooth_componentwise() {
        let mut smoother = Smoother::<2>::new(0.5);
        smoother.update([0.0, 100.0]);
        let [x, y] = smoother.update([10.0, 0.0]);
        assert_eq!(x, 5.0);
        assert_eq!(y, 50.0);
    }

    #[test]
    fn test_converges_toward_constant_input() {
        let mut smoother = Smoother::<1>::new(0.35);
        smoother.update([0.0]);
        for _ in 0..50 {
            smoother.update([1.0]);
        }
        let [v] = smoother.value().unwrap();
        assert!((v - 1.0).abs() < 1e-6);
    }

    #[test]
    #[should_panic(expected = "alpha must be in (0, 1]")]
    fn test_rejects_out_of_range_alpha() {
        let _ = Smoother::<1>::new(0.0);
    }
}
