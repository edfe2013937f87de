// common.rs
use crate::DdeError;

/// Degree of the history interpolation polynomial.
pub const INTERP_DEGREE: usize = 5;
/// Samples needed for one interpolation stencil.
pub const INTERP_POINTS: usize = INTERP_DEGREE + 1;

#[derive(Debug, Clone, PartialEq)]
pub enum SolverStatus {
    Running,
    Completed,
    HaltedOverflow,
    Failed,
}

/// Number of history samples required to cover `max_delay` at spacing `dt`.
///
/// Floored at the stencil size so the quintic fit stays well-posed when the
/// largest delay is shorter than a few grid steps; the window then spans
/// more than `max_delay`, which is harmless. Windows whose sample count
/// has no `usize` representation are rejected.
pub fn history_len(max_delay: f64, dt: f64) -> Result<usize, DdeError> {
    let cover = (max_delay / dt).ceil();
    if cover >= usize::MAX as f64 {
        return Err(DdeError::InvalidConfiguration {
            message: format!(
                "history window for max delay {} at dt = {} exceeds the addressable sample count",
                max_delay, dt
            ),
        });
    }
    Ok((cover as usize + 1).max(INTERP_POINTS))
}

pub fn all_finite(x: &[f64]) -> bool {
    x.iter().all(|&v| v.is_finite())
}

pub fn validate_positive(name: &str, value: f64) -> Result<(), DdeError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(DdeError::InvalidConfiguration {
            message: format!("{} must be positive and finite, got {}", name, value),
        });
    }
    Ok(())
}
