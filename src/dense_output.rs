// dense_output.rs

use crate::common::{INTERP_DEGREE, INTERP_POINTS};
use crate::history::HistorySnapshot;
use crate::DdeError;

/// Allowed deviation of individual sample gaps, relative to the grid step.
const SPACING_TOL: f64 = 1e-6;

/// Piecewise quintic interpolant over a uniform history window. Each run
/// of six consecutive samples defines one Newton forward-difference
/// polynomial; evaluation picks the stencil centered on the query point,
/// falling back to the edge stencils near and beyond the window bounds,
/// so the interpolant doubles as an extrapolant.
#[derive(Debug, Clone)]
pub struct HistorySpline {
    start: f64,
    end: f64,
    h: f64,
    dims: usize,
    // diffs[s][k][dim] is the k-th forward difference at stencil s.
    diffs: Vec<Vec<Vec<f64>>>,
}

impl HistorySpline {
    /// Fits a chronological snapshot with at least six samples on a
    /// strictly increasing uniform grid.
    pub fn fit(snapshot: &HistorySnapshot) -> Result<Self, DdeError> {
        let n = snapshot.len();
        if n < INTERP_POINTS {
            return Err(DdeError::InsufficientHistory {
                available: n,
                required: INTERP_POINTS,
            });
        }

        let h = snapshot.times[1] - snapshot.times[0];
        if !(h > 0.0) {
            return Err(DdeError::MalformedHistory {
                message: format!("first sample gap is {}", h),
            });
        }
        for (i, pair) in snapshot.times.windows(2).enumerate() {
            let gap = pair[1] - pair[0];
            if (gap - h).abs() > SPACING_TOL * h {
                return Err(DdeError::MalformedHistory {
                    message: format!("gap {} after sample {} deviates from {}", gap, i, h),
                });
            }
        }

        let dims = snapshot.states[0].len();
        let n_stencils = n - INTERP_DEGREE;
        let mut diffs = Vec::with_capacity(n_stencils);
        for s in 0..n_stencils {
            let mut table: Vec<Vec<f64>> = snapshot.states[s..s + INTERP_POINTS].to_vec();
            let mut levels = Vec::with_capacity(INTERP_POINTS);
            levels.push(table[0].clone());
            for k in 1..=INTERP_DEGREE {
                for j in 0..INTERP_POINTS - k {
                    let delta: Vec<f64> = table[j + 1]
                        .iter()
                        .zip(&table[j])
                        .map(|(&above, &below)| above - below)
                        .collect();
                    table[j] = delta;
                }
                levels.push(table[0].clone());
            }
            diffs.push(levels);
        }

        Ok(Self {
            start: snapshot.times[0],
            end: snapshot.times[n - 1],
            h,
            dims,
            diffs,
        })
    }

    pub fn t_min(&self) -> f64 {
        self.start
    }

    pub fn t_max(&self) -> f64 {
        self.end
    }

    pub fn evaluate(&self, dim: usize, t: f64) -> f64 {
        assert!(dim < self.dims, "component {} out of range", dim);

        let offset = (t - self.start) / self.h;
        let interval = offset.floor() as i64;
        let stencil = (interval - 2).clamp(0, self.diffs.len() as i64 - 1) as usize;
        let u = offset - stencil as f64;

        let levels = &self.diffs[stencil];
        let mut value = levels[0][dim];
        let mut term = 1.0;
        for (k, level) in levels.iter().enumerate().skip(1) {
            term *= (u - (k - 1) as f64) / k as f64;
            value += term * level[dim];
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_from(times: Vec<f64>, f: impl Fn(f64) -> Vec<f64>) -> HistorySnapshot {
        let states = times.iter().map(|&t| f(t)).collect();
        HistorySnapshot { times, states }
    }

    #[test]
    fn reproduces_quintic_polynomial_everywhere() {
        let p = |t: f64| t.powi(5) - 3.0 * t.powi(4) + 2.0 * t.powi(3) - t + 7.0;
        let times: Vec<f64> = (0..11).map(|i| i as f64 * 0.5).collect();
        let snapshot = snapshot_from(times, |t| vec![p(t)]);
        let spline = HistorySpline::fit(&snapshot).unwrap();

        // Interior points, window edges, and extrapolation on both sides.
        for t in [0.13, 1.0, 2.71, 4.99, 5.0, -0.4, 5.6] {
            let got = spline.evaluate(0, t);
            let want = p(t);
            assert!(
                (got - want).abs() < 1e-9 * want.abs().max(1.0),
                "p({}) = {}, interpolant gave {}",
                t,
                want,
                got
            );
        }
    }

    #[test]
    fn passes_through_every_sample() {
        let times: Vec<f64> = (0..9).map(|i| i as f64 * 0.25).collect();
        let snapshot = snapshot_from(times.clone(), |t| vec![t.sin(), t.cos(), t * t]);
        let spline = HistorySpline::fit(&snapshot).unwrap();

        for (i, &t) in times.iter().enumerate() {
            for dim in 0..3 {
                let got = spline.evaluate(dim, t);
                let want = snapshot.states[i][dim];
                assert!(
                    (got - want).abs() < 1e-11,
                    "sample {} component {}: want {}, got {}",
                    i,
                    dim,
                    want,
                    got
                );
            }
        }
    }

    #[test]
    fn constant_history_extrapolates_flat() {
        let times: Vec<f64> = (0..6).map(|i| i as f64 * 0.5).collect();
        let snapshot = snapshot_from(times, |_| vec![2.5, -1.0]);
        let spline = HistorySpline::fit(&snapshot).unwrap();

        // Every forward difference vanishes, so the value is exact even
        // far outside the window.
        for t in [-4.0, -0.01, 1.3, 2.5, 7.0] {
            assert_eq!(spline.evaluate(0, t), 2.5);
            assert_eq!(spline.evaluate(1, t), -1.0);
        }
    }

    #[test]
    fn linear_history_extrapolates_linearly() {
        let times: Vec<f64> = (0..6).map(|i| i as f64 * 0.5).collect();
        let snapshot = snapshot_from(times, |t| vec![3.0 * t - 1.0]);
        let spline = HistorySpline::fit(&snapshot).unwrap();

        for t in [-0.75, 3.25] {
            let got = spline.evaluate(0, t);
            let want = 3.0 * t - 1.0;
            assert!((got - want).abs() < 1e-12, "at {}: {} vs {}", t, got, want);
        }
    }

    #[test]
    fn fit_requires_six_samples() {
        let times: Vec<f64> = (0..5).map(|i| i as f64).collect();
        let snapshot = snapshot_from(times, |t| vec![t]);
        match HistorySpline::fit(&snapshot) {
            Err(DdeError::InsufficientHistory {
                available,
                required,
            }) => {
                assert_eq!(available, 5);
                assert_eq!(required, INTERP_POINTS);
            }
            other => panic!("expected InsufficientHistory, got {:?}", other),
        }
    }

    #[test]
    fn fit_rejects_nonuniform_grids() {
        let uneven = snapshot_from(vec![0.0, 0.1, 0.2, 0.31, 0.4, 0.5], |t| vec![t]);
        assert!(matches!(
            HistorySpline::fit(&uneven),
            Err(DdeError::MalformedHistory { .. })
        ));

        let duplicated = snapshot_from(vec![0.0, 0.1, 0.1, 0.2, 0.3, 0.4], |t| vec![t]);
        assert!(matches!(
            HistorySpline::fit(&duplicated),
            Err(DdeError::MalformedHistory { .. })
        ));
    }

    #[test]
    fn window_bounds_follow_snapshot() {
        let times: Vec<f64> = (0..8).map(|i| -3.5 + i as f64 * 0.5).collect();
        let snapshot = snapshot_from(times, |t| vec![t]);
        let spline = HistorySpline::fit(&snapshot).unwrap();
        assert_eq!(spline.t_min(), -3.5);
        assert_eq!(spline.t_max(), 0.0);
    }
}
