use std::collections::VecDeque;

/// Number of displacement samples the stability window holds.
pub const WINDOW_CAPACITY: usize = 15;

/// Maximum L1 norm of the mean displacement (in pixels) for the scene
/// to count as stationary.
pub const STABILITY_THRESHOLD: f64 = 20.0;

/// Estimated translation between two consecutive frames, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Displacement {
    pub x: f64,
    pub y: f64,
}

impl Displacement {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Decides from recent motion history whether the scene is stationary
/// enough to warrant running classification.
///
/// Averaging over a fixed window absorbs sensor noise and brief jitter;
/// a partially filled window is never considered stable. Callers must
/// serialize `record` and `is_stable` per frame — the FIFO invariant
/// depends on total ordering of calls.
pub struct StabilityGate {
    history: VecDeque<Displacement>,
}

impl StabilityGate {
    pub fn new() -> Self {
        Self {
            history: VecDeque::with_capacity(WINDOW_CAPACITY),
        }
    }

    /// Append a sample, evicting the oldest once the window is full.
    pub fn record(&mut self, sample: Displacement) {
        self.history.push_back(sample);
        if self.history.len() > WINDOW_CAPACITY {
            self.history.pop_front();
        }
    }

    /// Clear the window. Called whenever there is no valid
    /// previous-frame reference.
    pub fn reset(&mut self) {
        self.history.clear();
    }

    /// Mean displacement over the window, or `None` until it is full.
    pub fn mean_drift(&self) -> Option<Displacement> {
        if self.history.len() != WINDOW_CAPACITY {
            return None;
        }

        let mut sum = Displacement::new(0.0, 0.0);
        for sample in &self.history {
            sum.x += sample.x;
            sum.y += sample.y;
        }

        let n = WINDOW_CAPACITY as f64;
        Some(Displacement::new(sum.x / n, sum.y / n))
    }

    /// True iff the window is full and the L1 norm of the mean
    /// displacement is below the threshold. Pure query.
    pub fn is_stable(&self) -> bool {
        match self.mean_drift() {
            Some(mean) => mean.x.abs() + mean.y.abs() < STABILITY_THRESHOLD,
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }
}

impl Default for StabilityGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(gate: &mut StabilityGate, n: usize, x: f64, y: f64) {
        for _ in 0..n {
            gate.record(Displacement::new(x, y));
        }
    }

    #[test]
    fn test_partial_window_never_stable() {
        let mut gate = StabilityGate::new();
        for i in 0..WINDOW_CAPACITY - 1 {
            gate.record(Displacement::new(0.0, 0.0));
            assert!(!gate.is_stable(), "stable after {} samples", i + 1);
        }
    }

    #[test]
    fn test_full_window_of_zeros_is_stable() {
        let mut gate = StabilityGate::new();
        fill(&mut gate, WINDOW_CAPACITY, 0.0, 0.0);
        assert!(gate.is_stable());
    }

    #[test]
    fn test_small_drift_is_stable() {
        // mean = (2, 2), L1 = 4 < 20
        let mut gate = StabilityGate::new();
        fill(&mut gate, WINDOW_CAPACITY, 2.0, 2.0);
        assert!(gate.is_stable());
    }

    #[test]
    fn test_large_drift_is_not_stable() {
        // mean = (15, 15), L1 = 30 >= 20
        let mut gate = StabilityGate::new();
        fill(&mut gate, WINDOW_CAPACITY, 15.0, 15.0);
        assert!(!gate.is_stable());
    }

    #[test]
    fn test_fifo_keeps_most_recent_in_order() {
        let mut gate = StabilityGate::new();
        for i in 0..20 {
            gate.record(Displacement::new(i as f64, 0.0));
        }

        assert_eq!(gate.len(), WINDOW_CAPACITY);
        let kept: Vec<f64> = gate.history.iter().map(|s| s.x).collect();
        let expected: Vec<f64> = (5..20).map(|i| i as f64).collect();
        assert_eq!(kept, expected);
    }

    #[test]
    fn test_reset_clears_window() {
        let mut gate = StabilityGate::new();
        fill(&mut gate, WINDOW_CAPACITY, 0.0, 0.0);
        assert!(gate.is_stable());

        gate.reset();
        assert!(!gate.is_stable());
        assert_eq!(gate.len(), 0);
    }

    #[test]
    fn test_is_stable_is_idempotent() {
        let mut gate = StabilityGate::new();
        fill(&mut gate, WINDOW_CAPACITY, 1.0, -1.0);

        let first = gate.is_stable();
        for _ in 0..10 {
            assert_eq!(gate.is_stable(), first);
        }
        assert_eq!(gate.len(), WINDOW_CAPACITY);
    }

    #[test]
    fn test_mean_drift_mixed_samples() {
        let mut gate = StabilityGate::new();
        fill(&mut gate, 14, 0.0, 0.0);
        gate.record(Displacement::new(15.0, -30.0));

        let mean = gate.mean_drift().unwrap();
        assert!((mean.x - 1.0).abs() < 1e-9);
        assert!((mean.y + 2.0).abs() < 1e-9);
        // L1 of mean = 3 < 20
        assert!(gate.is_stable());
    }
}
