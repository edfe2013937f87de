// history.rs

/// Relative tolerance for matching a pushed timestamp against the grid.
/// Timestamps are derived as `index * dt`, so genuine matches agree to a
/// few ulps while a skipped or repeated step is off by a whole `dt`.
const GRID_TOL: f64 = 1e-9;

/// Fixed-length window of the most recent states, one sample per grid
/// step, stored as a ring so a push is O(1) instead of shifting the
/// whole window.
///
/// Timestamps are not stored; they are reconstructed from the grid index
/// of the newest sample, which keeps the spacing exact by construction.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    samples: Vec<Vec<f64>>,
    head: usize,
    newest: i64,
    dt: f64,
}

/// Ordered copy of a buffer's contents, oldest first, taken at a single
/// point in time for read-only use by the interpolator.
#[derive(Debug, Clone)]
pub struct HistorySnapshot {
    pub times: Vec<f64>,
    pub states: Vec<Vec<f64>>,
}

impl HistorySnapshot {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

impl HistoryBuffer {
    /// Seeds the window with `window` copies of the initial state at grid
    /// indices -(window-1)..=0, i.e. a constant history ending at t = 0.
    pub fn new(initial_state: &[f64], window: usize, dt: f64) -> Self {
        assert!(window > 0, "history window must not be empty");
        Self {
            samples: vec![initial_state.to_vec(); window],
            head: window - 1,
            newest: 0,
            dt,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn newest_time(&self) -> f64 {
        self.newest as f64 * self.dt
    }

    pub fn oldest_time(&self) -> f64 {
        (self.newest - (self.len() as i64 - 1)) as f64 * self.dt
    }

    /// Appends one sample and evicts the oldest. `time` must be exactly
    /// one grid step after the previous newest timestamp; anything else is
    /// a caller bug, not a runtime condition.
    pub fn push(&mut self, state: &[f64], time: f64) {
        let expected = (self.newest + 1) as f64 * self.dt;
        assert!(
            (time - expected).abs() <= GRID_TOL * expected.abs().max(1.0),
            "history push at t = {} is not one step after t = {}",
            time,
            self.newest_time(),
        );
        debug_assert_eq!(state.len(), self.samples[self.head].len());

        self.head = (self.head + 1) % self.samples.len();
        self.samples[self.head] = state.to_vec();
        self.newest += 1;
    }

    /// Materializes the window in chronological order.
    pub fn snapshot(&self) -> HistorySnapshot {
        let window = self.samples.len();
        let mut times = Vec::with_capacity(window);
        let mut states = Vec::with_capacity(window);
        for k in 0..window {
            let slot = (self.head + 1 + k) % window;
            let index = self.newest - (window - 1 - k) as i64;
            times.push(index as f64 * self.dt);
            states.push(self.samples[slot].clone());
        }
        HistorySnapshot { times, states }
    }
}
