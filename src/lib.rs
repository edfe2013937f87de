// lib.rs
use thiserror::Error;

pub mod args;
pub mod common;
pub mod config;
pub mod dense_output;
pub mod history;
pub mod lorenz;
pub mod output;
pub mod rk4;
pub mod runner;

use common::*;
use rk4::*;

#[derive(Debug, Error, Clone)]
pub enum DdeError {
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("History window holds {available} samples but interpolation needs {required}")]
    InsufficientHistory { available: usize, required: usize },

    #[error("History grid is malformed: {message}")]
    MalformedHistory { message: String },

    #[error("Interpolated history value is not finite at t = {t}")]
    NonFiniteInterpolation { t: f64 },
}

#[derive(Debug)]
pub enum SolveResult {
    Completed {
        t: Vec<f64>,
        y: Vec<Vec<f64>>,
    },
    HaltedOverflow {
        t: Vec<f64>,
        y: Vec<Vec<f64>>,
        halted_step: usize,
    },
    Failed {
        error: anyhow::Error,
        t: Vec<f64>,
        y: Vec<Vec<f64>>,
    },
}

/// Right-hand side of a delay system: called as `f(t, y, lagged)` where
/// `lagged[i]` is state component `i` interpolated at `t - delays[i]`.
/// Within one step every stage receives the step's base time and the
/// same lagged values; only the trial state `y` varies between stages.
pub type DdeRhsFunction = Box<dyn Fn(f64, &[f64], &[f64]) -> Vec<f64>>;

/// Integrates a delay differential equation with fixed-step RK4 from a
/// constant pre-history equal to `y0`.
///
/// Configuration problems are reported as `Err` before any stepping.
/// Once stepping starts the outcome is always `Ok`: a non-finite state
/// ends the run early with `HaltedOverflow` and the trajectory recorded
/// so far, and internal contract violations surface as `Failed`.
pub fn solve_dde(
    fun: DdeRhsFunction,
    y0: Vec<f64>,
    delays: Vec<f64>,
    dt: f64,
    total_time: f64,
) -> Result<SolveResult, DdeError> {
    let mut solver = Rk4Solver::new(fun, y0, delays, dt, total_time)?;

    let mut t_values = vec![solver.t];
    let mut y_values = vec![solver.y.clone()];

    while solver.status == SolverStatus::Running {
        let recorded = solver.step_index;
        match solver.step() {
            Ok(()) => {}
            Err(e) => {
                return Ok(SolveResult::Failed {
                    error: e,
                    t: t_values,
                    y: y_values,
                });
            }
        }

        // A halted step leaves the index untouched and records nothing.
        if solver.step_index > recorded {
            t_values.push(solver.t);
            y_values.push(solver.y.clone());
        }
    }

    // The loop leaves only two statuses: fatal step errors already
    // returned above as Failed.
    if solver.status == SolverStatus::HaltedOverflow {
        let halted_step = solver.halted_step.unwrap_or(solver.step_index + 1);
        log::warn!("Overflow or invalid value detected at step {}", halted_step);
        return Ok(SolveResult::HaltedOverflow {
            t: t_values,
            y: y_values,
            halted_step,
        });
    }

    log::debug!("Integration completed after {} steps", solver.step_index);
    Ok(SolveResult::Completed {
        t: t_values,
        y: y_values,
    })
}
