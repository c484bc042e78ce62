use faer::Mat;
use rayon::prelude::*;

use crate::types::{FitDiagnostics, SindyError};
use crate::utils::{solve_min_norm, validate_matrix};

/// Sparse regression by Sequentially Thresholded Least Squares.
///
/// Finds a coefficient matrix Ξ (terms × variables) such that Θ·Ξ ≈ Ẋ with
/// most rows of Ξ exactly zero.
///
/// # Arguments
/// * `theta` - Design matrix Θ (samples × terms).
/// * `xdot` - Derivative targets Ẋ (samples × variables).
/// * `threshold` - Pruning threshold λ ≥ 0. Coefficients with magnitude
///   strictly below λ are zeroed; a magnitude of exactly λ survives.
/// * `max_iterations` - Prune/refit budget per variable.
///
/// # Algorithm
/// Each variable's column is fit independently:
/// 1. Start with every library term active.
/// 2. Solve minimum-norm least squares restricted to the active terms.
/// 3. Prune terms with |coefficient| < λ.
/// 4. Repeat until no term is pruned, pruning would empty the active set
///    (the pre-prune coefficients are kept instead of a degenerate empty
///    model), or the budget runs out.
///
/// Columns are dispatched across rayon workers; each owns its active set
/// exclusively and results are assembled in column order, so the output is
/// identical to a sequential run.
///
/// Rank-deficient active sets and budget exhaustion are reported through
/// [`FitDiagnostics`], never as errors.
pub fn stlsq(
    theta: &Mat<f64>,
    xdot: &Mat<f64>,
    threshold: f64,
    max_iterations: usize,
) -> Result<(Mat<f64>, FitDiagnostics), SindyError> {
    if !threshold.is_finite() || threshold < 0.0 {
        return Err(SindyError::InvalidConfiguration(format!(
            "threshold must be finite and non-negative, got {threshold}"
        )));
    }
    if max_iterations == 0 {
        return Err(SindyError::InvalidConfiguration(
            "max_iterations must be at least 1".to_string(),
        ));
    }

    let m = theta.nrows();
    if m < 2 {
        return Err(SindyError::InsufficientSamples { needed: 2, got: m });
    }
    validate_matrix(theta, 2, 1)?;
    validate_matrix(xdot, 2, 1)?;
    if xdot.nrows() != m {
        return Err(SindyError::InvalidInput(format!(
            "design matrix has {m} rows but derivative matrix has {}",
            xdot.nrows()
        )));
    }

    let n_terms = theta.ncols();
    let n_vars = xdot.ncols();

    let columns: Vec<ColumnFit> = (0..n_vars)
        .into_par_iter()
        .map(|j| {
            let rhs: Vec<f64> = (0..m).map(|i| xdot[(i, j)]).collect();
            fit_column(theta, &rhs, threshold, max_iterations)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut xi = Mat::<f64>::zeros(n_terms, n_vars);
    for (j, col) in columns.iter().enumerate() {
        for (&term, &value) in col.support.iter().zip(&col.values) {
            xi[(term, j)] = value;
        }
    }

    let diagnostics = FitDiagnostics {
        did_not_converge: columns.iter().any(|c| !c.converged),
        singular_design: columns.iter().any(|c| c.rank_deficient),
        underdetermined: m < n_terms,
        iterations: columns.iter().map(|c| c.iterations).collect(),
        converged: columns.iter().map(|c| c.converged).collect(),
    };

    Ok((xi, diagnostics))
}

struct ColumnFit {
    /// Term indices with non-zero coefficients.
    support: Vec<usize>,
    /// Coefficient values aligned with `support`.
    values: Vec<f64>,
    iterations: usize,
    converged: bool,
    rank_deficient: bool,
}

fn fit_column(
    theta: &Mat<f64>,
    rhs: &[f64],
    threshold: f64,
    max_iterations: usize,
) -> Result<ColumnFit, SindyError> {
    let n_terms = theta.ncols();
    let mut active: Vec<usize> = (0..n_terms).collect();
    let mut values: Vec<f64> = Vec::new();
    let mut iterations = 0usize;
    let mut converged = false;
    let mut rank_deficient = false;

    while iterations < max_iterations {
        iterations += 1;

        let sub = gather_columns(theta, &active);
        let fit = solve_min_norm(&sub, rhs)?;
        if fit.rank < active.len() {
            rank_deficient = true;
        }

        let survivors: Vec<usize> = (0..active.len())
            .filter(|&i| fit.x[i].abs() >= threshold)
            .collect();

        if survivors.len() == active.len() {
            // Nothing pruned: the active set is stable.
            values = fit.x;
            converged = true;
            break;
        }
        if survivors.is_empty() {
            // Every coefficient fell below λ. Keep this solve's values
            // rather than silently returning an empty model; a genuinely
            // zero system still yields zeros here because the
            // least-squares solution itself is zero.
            values = fit.x;
            converged = true;
            break;
        }

        // Best effort so far, in case the budget runs out mid-loop.
        values = survivors.iter().map(|&i| fit.x[i]).collect();
        active = survivors.iter().map(|&i| active[i]).collect();
    }

    Ok(ColumnFit {
        support: active,
        values,
        iterations,
        converged,
        rank_deficient,
    })
}

fn gather_columns(theta: &Mat<f64>, indices: &[usize]) -> Mat<f64> {
    let m = theta.nrows();
    let mut sub = Mat::<f64>::zeros(m, indices.len());
    for (j, &idx) in indices.iter().enumerate() {
        for i in 0..m {
            sub[(i, j)] = theta[(i, idx)];
        }
    }
    sub
}
