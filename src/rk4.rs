// rk4.rs
use crate::common::*;
use crate::dense_output::*;
use crate::history::*;
use crate::{DdeError, DdeRhsFunction};
use anyhow::Result;

pub struct Rk4Solver {
    pub fun: DdeRhsFunction,
    pub t: f64,
    pub y: Vec<f64>,
    pub dt: f64,
    pub delays: Vec<f64>,
    pub status: SolverStatus,
    pub n: usize,
    pub step_index: usize,
    pub num_points: usize,
    pub halted_step: Option<usize>,
    pub nfev: usize,
    pub history: HistoryBuffer,
}

/// Derivative evaluator for a single step. The delayed lookups depend
/// only on the step's base time and the recorded history, so they are
/// interpolated once here and shared bit-for-bit by all four stages.
pub struct StepDerivative<'a> {
    fun: &'a DdeRhsFunction,
    t: f64,
    lagged: Vec<f64>,
}

impl<'a> StepDerivative<'a> {
    pub fn new(
        fun: &'a DdeRhsFunction,
        t: f64,
        delays: &[f64],
        history: &HistoryBuffer,
    ) -> Result<Self, DdeError> {
        let spline = HistorySpline::fit(&history.snapshot())?;
        let mut lagged = Vec::with_capacity(delays.len());
        for (dim, &delay) in delays.iter().enumerate() {
            let value = spline.evaluate(dim, t - delay);
            if !value.is_finite() {
                return Err(DdeError::NonFiniteInterpolation { t: t - delay });
            }
            lagged.push(value);
        }
        Ok(Self { fun, t, lagged })
    }

    pub fn eval(&self, y: &[f64]) -> Vec<f64> {
        (self.fun)(self.t, y, &self.lagged)
    }

    pub fn lagged(&self) -> &[f64] {
        &self.lagged
    }
}

impl Rk4Solver {
    pub fn new(
        fun: DdeRhsFunction,
        y0: Vec<f64>,
        delays: Vec<f64>,
        dt: f64,
        total_time: f64,
    ) -> Result<Self, DdeError> {
        if y0.is_empty() {
            return Err(DdeError::InvalidConfiguration {
                message: "initial state must not be empty".to_string(),
            });
        }
        if delays.len() != y0.len() {
            return Err(DdeError::InvalidConfiguration {
                message: format!(
                    "{} delays given for {} state components",
                    delays.len(),
                    y0.len()
                ),
            });
        }
        if !all_finite(&y0) {
            return Err(DdeError::InvalidConfiguration {
                message: "initial state must be finite".to_string(),
            });
        }
        validate_positive("dt", dt)?;
        validate_positive("total_time", total_time)?;
        for (i, &delay) in delays.iter().enumerate() {
            validate_positive(&format!("delay[{}]", i), delay)?;
        }

        let n = y0.len();
        let max_delay = delays.iter().fold(0.0_f64, |a, &b| a.max(b));
        let window = history_len(max_delay, dt)?;
        let steps = (total_time / dt).floor();
        if steps >= usize::MAX as f64 {
            return Err(DdeError::InvalidConfiguration {
                message: format!(
                    "total_time {} at dt = {} exceeds the addressable step count",
                    total_time, dt
                ),
            });
        }
        // Truncating mirrors the sample count of an inclusive grid over
        // [0, total_time]: the end point lands on the grid only when dt
        // divides total_time.
        let num_points = steps as usize + 1;
        let status = if num_points <= 1 {
            SolverStatus::Completed
        } else {
            SolverStatus::Running
        };

        Ok(Self {
            fun,
            t: 0.0,
            y: y0.clone(),
            dt,
            delays,
            status,
            n,
            step_index: 0,
            num_points,
            halted_step: None,
            nfev: 0,
            history: HistoryBuffer::new(&y0, window, dt),
        })
    }

    /// Advances one grid step. A non-finite lagged value or trial state
    /// halts the solver with `HaltedOverflow` and leaves `t` and `y` at
    /// the last finite sample; interpolator contract violations put it
    /// in `Failed` and surface the error.
    pub fn step(&mut self) -> Result<()> {
        assert_eq!(
            self.status,
            SolverStatus::Running,
            "step called after integration finished"
        );

        let derivative =
            match StepDerivative::new(&self.fun, self.t, &self.delays, &self.history) {
                Ok(derivative) => derivative,
                Err(DdeError::NonFiniteInterpolation { .. }) => {
                    self.status = SolverStatus::HaltedOverflow;
                    self.halted_step = Some(self.step_index + 1);
                    return Ok(());
                }
                Err(e) => {
                    self.status = SolverStatus::Failed;
                    return Err(e.into());
                }
            };

        let h = self.dt;
        let k1 = derivative.eval(&self.y);
        let y2: Vec<f64> = self
            .y
            .iter()
            .zip(&k1)
            .map(|(&yi, &ki)| yi + 0.5 * h * ki)
            .collect();
        let k2 = derivative.eval(&y2);
        let y3: Vec<f64> = self
            .y
            .iter()
            .zip(&k2)
            .map(|(&yi, &ki)| yi + 0.5 * h * ki)
            .collect();
        let k3 = derivative.eval(&y3);
        let y4: Vec<f64> = self
            .y
            .iter()
            .zip(&k3)
            .map(|(&yi, &ki)| yi + h * ki)
            .collect();
        let k4 = derivative.eval(&y4);
        self.nfev += 4;

        let y_next: Vec<f64> = (0..self.n)
            .map(|i| self.y[i] + h / 6.0 * (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i]))
            .collect();

        if !all_finite(&y_next) {
            self.status = SolverStatus::HaltedOverflow;
            self.halted_step = Some(self.step_index + 1);
            return Ok(());
        }

        self.step_index += 1;
        self.t = self.step_index as f64 * self.dt;
        self.y = y_next;
        self.history.push(&self.y, self.t);

        if self.step_index >= self.num_points - 1 {
            self.status = SolverStatus::Completed;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frozen(_t: f64, _y: &[f64], _lagged: &[f64]) -> Vec<f64> {
        vec![0.0, 0.0, 0.0]
    }

    #[test]
    fn seeded_history_yields_initial_state_as_lag() {
        let solver = Rk4Solver::new(
            Box::new(frozen),
            vec![1.5, -2.0, 0.25],
            vec![0.0014, 0.01, 0.05],
            0.001,
            1.0,
        )
        .unwrap();

        let derivative =
            StepDerivative::new(&solver.fun, solver.t, &solver.delays, &solver.history).unwrap();
        // Constant seeded history interpolates to the seed exactly.
        assert_eq!(derivative.lagged(), &[1.5, -2.0, 0.25]);
    }

    #[test]
    fn window_covers_largest_delay() {
        let solver = Rk4Solver::new(
            Box::new(frozen),
            vec![0.0, 1.0, 1.05],
            vec![0.0014, 0.01, 0.05],
            0.001,
            1.0,
        )
        .unwrap();
        assert_eq!(solver.history.len(), 51);
        assert_eq!(solver.num_points, 1001);
    }

    #[test]
    fn sample_count_truncates_partial_end_steps() {
        let make = |dt: f64, total_time: f64| {
            Rk4Solver::new(
                Box::new(frozen),
                vec![0.0, 1.0, 1.05],
                vec![0.0014, 0.01, 0.05],
                dt,
                total_time,
            )
            .unwrap()
        };
        assert_eq!(make(0.001, 0.05).num_points, 51);
        assert_eq!(make(0.001, 10.0).num_points, 10001);
        // A horizon shorter than one step leaves only the initial sample.
        let short = make(0.001, 0.0005);
        assert_eq!(short.num_points, 1);
        assert_eq!(short.status, SolverStatus::Completed);
    }

    #[test]
    fn stepping_tracks_grid_time_and_history() {
        let mut solver = Rk4Solver::new(
            Box::new(frozen),
            vec![4.0, -1.0, 0.5],
            vec![0.5, 0.5, 0.5],
            0.25,
            1.0,
        )
        .unwrap();
        assert_eq!(solver.num_points, 5);

        while solver.status == SolverStatus::Running {
            solver.step().unwrap();
        }

        assert_eq!(solver.status, SolverStatus::Completed);
        assert_eq!(solver.step_index, 4);
        assert_eq!(solver.t, 1.0);
        assert_eq!(solver.history.newest_time(), 1.0);
        assert_eq!(solver.y, vec![4.0, -1.0, 0.5]);
        assert_eq!(solver.nfev, 16);
        assert_eq!(solver.halted_step, None);
    }

    #[test]
    fn rejects_grids_with_unaddressable_step_counts() {
        // dt, T, and the delays pass the positivity checks individually,
        // but the horizon spans ~1e20 grid steps.
        let result = Rk4Solver::new(
            Box::new(frozen),
            vec![0.0, 1.0, 1.05],
            vec![1e-9, 1e-9, 1e-9],
            1e-10,
            1e10,
        );
        assert!(matches!(
            result,
            Err(DdeError::InvalidConfiguration { .. })
        ));

        // A delay window wider than any addressable buffer.
        let result = Rk4Solver::new(
            Box::new(frozen),
            vec![0.0, 1.0, 1.05],
            vec![1e10, 1e10, 1e10],
            1e-10,
            1.0,
        );
        assert!(matches!(
            result,
            Err(DdeError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn rejects_invalid_configuration() {
        let bad: Vec<(Vec<f64>, Vec<f64>, f64, f64)> = vec![
            (vec![], vec![], 0.001, 1.0),
            (vec![0.0, 1.0], vec![0.01], 0.001, 1.0),
            (vec![0.0, f64::NAN], vec![0.01, 0.01], 0.001, 1.0),
            (vec![0.0, 1.0], vec![0.01, 0.01], 0.0, 1.0),
            (vec![0.0, 1.0], vec![0.01, 0.01], -0.001, 1.0),
            (vec![0.0, 1.0], vec![0.01, 0.01], 0.001, f64::INFINITY),
            (vec![0.0, 1.0], vec![0.01, -0.01], 0.001, 1.0),
        ];
        for (y0, delays, dt, total_time) in bad {
            let result = Rk4Solver::new(Box::new(frozen), y0.clone(), delays, dt, total_time);
            assert!(
                matches!(result, Err(DdeError::InvalidConfiguration { .. })),
                "configuration {:?} dt {} T {} was not rejected",
                y0,
                dt,
                total_time
            );
        }
    }
}
