use faer::Mat;

use crate::derivative::estimate_derivatives;
use crate::library::PolynomialLibrary;
use crate::model::SindyModel;
use crate::stlsq::stlsq;
use crate::types::{SindyConfig, SindyError};
use crate::utils::validate_matrix;

/// Fit a sparse model of the governing equations to a sampled trajectory.
///
/// # Arguments
/// * `times` - Sample times, strictly increasing.
/// * `states` - Observed states (samples × variables), rows aligned with
///   `times`. May be noisy; the STLSQ threshold is what makes the fit
///   tolerate it.
/// * `config` - Library degree, threshold, iteration budget, names,
///   derivative method.
///
/// # Pipeline
/// 1. Expand the states into the polynomial candidate library Θ.
/// 2. Estimate the derivative targets Ẋ by finite differencing.
/// 3. Run STLSQ to select the sparse coefficient matrix Ξ with Θ·Ξ ≈ Ẋ.
///
/// Configuration errors are rejected up front; numerical degeneracies
/// (rank-deficient active sets, exhausted iteration budget, fewer samples
/// than library terms) are reported on the returned model's
/// [`diagnostics`](SindyModel::diagnostics) and never abort the fit.
pub fn fit(
    times: &[f64],
    states: &Mat<f64>,
    config: &SindyConfig,
) -> Result<SindyModel, SindyError> {
    config.validate()?;

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

    let n_vars = states.ncols();
    let variable_names = match &config.variable_names {
        Some(names) => {
            if names.len() != n_vars {
                return Err(SindyError::InvalidConfiguration(format!(
                    "{} variable names supplied for {n_vars} state variables",
                    names.len()
                )));
            }
            names.clone()
        }
        None => (1..=n_vars).map(|i| format!("x{i}")).collect(),
    };

    let library = PolynomialLibrary::with_names(&variable_names, config.degree)?;
    let theta = library.design_matrix(states)?;
    let xdot = estimate_derivatives(times, states, &config.derivative)?;
    let (coefficients, diagnostics) =
        stlsq(&theta, &xdot, config.threshold, config.max_iterations)?;

    Ok(SindyModel {
        library,
        variable_names,
        coefficients,
        diagnostics,
    })
}
