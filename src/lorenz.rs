// lorenz.rs
use crate::DdeRhsFunction;

/// Lorenz system with delayed coupling. The cross terms read the lagged
/// components while the damping terms act on the trial state:
///
///   dx/dt = sigma * (y(t - tau_y) - x)
///   dy/dt = x(t - tau_x) * (rho - z(t - tau_z)) - y
///   dz/dt = x(t - tau_x) * y(t - tau_y) - beta * z
pub fn delayed_lorenz(sigma: f64, rho: f64, beta: f64) -> DdeRhsFunction {
    Box::new(move |_t, y, lagged| {
        vec![
            sigma * (lagged[1] - y[0]),
            lagged[0] * (rho - lagged[2]) - y[1],
            lagged[0] * lagged[1] - beta * y[2],
        ]
    })
}
