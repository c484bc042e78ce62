use faer::Mat;

use crate::types::SindyError;
use crate::utils::validate_matrix;

/// Derivative estimation strategy.
///
/// The estimator is configurable because finite differencing amplifies
/// measurement noise: the plain scheme is unbiased on smooth data, while
/// the smoothed variant suppresses noise at the cost of some bias near
/// sharp features.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivativeMethod {
    /// One-sided differences at the boundaries, spacing-aware three-point
    /// differences in the interior (the classic central difference when
    /// spacing is uniform).
    FiniteDifference,
    /// Centered moving average of width `window` (odd) applied per variable
    /// before differencing. The window shrinks at the boundaries.
    SmoothedFiniteDifference { window: usize },
}

impl Default for DerivativeMethod {
    fn default() -> Self {
        DerivativeMethod::FiniteDifference
    }
}

/// Estimate per-sample, per-variable time derivatives of a trajectory.
///
/// # Arguments
/// * `times` - Sample times, strictly increasing.
/// * `states` - State matrix (samples × variables), rows aligned with `times`.
/// * `method` - Differencing strategy.
///
/// # Returns
/// Derivative matrix (samples × variables).
pub fn estimate_derivatives(
    times: &[f64],
    states: &Mat<f64>,
    method: &DerivativeMethod,
) -> Result<Mat<f64>, SindyError> {
    let m = times.len();
    if m < 2 {
        return Err(SindyError::InsufficientSamples { needed: 2, got: m });
    }
    validate_matrix(states, 2, 1)?;
    if states.nrows() != m {
        return Err(SindyError::InvalidInput(format!(
            "times has {m} entries but states has {} rows",
            states.nrows()
        )));
    }
    for w in times.windows(2) {
        if !w[0].is_finite() || !w[1].is_finite() || w[1] <= w[0] {
            return Err(SindyError::InvalidInput(
                "times must be finite and strictly increasing".to_string(),
            ));
        }
    }

    let work = match *method {
        DerivativeMethod::FiniteDifference => states.to_owned(),
        DerivativeMethod::SmoothedFiniteDifference { window } => {
            if window == 0 || window % 2 == 0 {
                return Err(SindyError::InvalidConfiguration(format!(
                    "smoothing window must be odd and positive, got {window}"
                )));
            }
            moving_average(states, window)
        }
    };

    let n = work.ncols();
    let mut xdot = Mat::<f64>::zeros(m, n);

    for v in 0..n {
        // Forward difference at the left boundary.
        xdot[(0, v)] = (work[(1, v)] - work[(0, v)]) / (times[1] - times[0]);

        // Interior: three-point stencil weighted by the two local spacings.
        // Exact for quadratics; reduces to (f[i+1] - f[i-1]) / 2h when
        // spacing is uniform.
        for i in 1..m - 1 {
            let h1 = times[i] - times[i - 1];
            let h2 = times[i + 1] - times[i];
            xdot[(i, v)] = (h1 * h1 * work[(i + 1, v)] - h2 * h2 * work[(i - 1, v)]
                + (h2 * h2 - h1 * h1) * work[(i, v)])
                / (h1 * h2 * (h1 + h2));
        }

        // Backward difference at the right boundary.
        xdot[(m - 1, v)] =
            (work[(m - 1, v)] - work[(m - 2, v)]) / (times[m - 1] - times[m - 2]);
    }

    Ok(xdot)
}

/// Centered moving average per column, window clamped at the edges.
fn moving_average(states: &Mat<f64>, window: usize) -> Mat<f64> {
    let m = states.nrows();
    let n = states.ncols();
    let half = window / 2;
    let mut out = Mat::<f64>::zeros(m, n);
    for v in 0..n {
        for i in 0..m {
            let lo = i.saturating_sub(half);
            let hi = (i + half).min(m - 1);
            let mut sum = 0.0;
            for k in lo..=hi {
                sum += states[(k, v)];
            }
            out[(i, v)] = sum / (hi - lo + 1) as f64;
        }
    }
    out
}
