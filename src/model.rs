use std::fmt;

use faer::Mat;

use crate::library::PolynomialLibrary;
use crate::types::{FitDiagnostics, SindyError};

/// A fitted sparse model of the governing equations.
///
/// Wraps the candidate library, the state variable names, and the sparse
/// coefficient matrix Ξ (terms × variables). The coefficients are created
/// by the regression engine and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct SindyModel {
    /// Candidate-term library the model was fit against.
    pub library: PolynomialLibrary,
    /// State variable names, column order of the coefficient matrix.
    pub variable_names: Vec<String>,
    /// Sparse coefficient matrix Ξ (terms × variables). Pruned entries are
    /// exactly zero.
    pub coefficients: Mat<f64>,
    /// Degeneracy flags and per-variable convergence info from the fit.
    pub diagnostics: FitDiagnostics,
}

impl SindyModel {
    /// Number of state variables.
    pub fn n_vars(&self) -> usize {
        self.variable_names.len()
    }

    /// Number of candidate terms.
    pub fn n_terms(&self) -> usize {
        self.library.n_terms()
    }

    /// Indices of terms with non-zero coefficients for one variable.
    pub fn support(&self, var: usize) -> Vec<usize> {
        (0..self.coefficients.nrows())
            .filter(|&i| self.coefficients[(i, var)] != 0.0)
            .collect()
    }

    /// Total number of non-zero coefficients across all variables.
    pub fn nnz(&self) -> usize {
        let mut count = 0;
        for j in 0..self.coefficients.ncols() {
            for i in 0..self.coefficients.nrows() {
                if self.coefficients[(i, j)] != 0.0 {
                    count += 1;
                }
            }
        }
        count
    }

    /// Predicted derivative vector Θ(x)·Ξ at one state.
    pub fn evaluate(&self, state: &[f64]) -> Result<Vec<f64>, SindyError> {
        let features = self.library.evaluate(state)?;
        let n = self.n_vars();
        let mut out = vec![0.0; n];
        for j in 0..n {
            let mut val = 0.0;
            for (i, &f) in features.iter().enumerate() {
                let c = self.coefficients[(i, j)];
                if c != 0.0 {
                    val += c * f;
                }
            }
            out[j] = val;
        }
        Ok(out)
    }

    /// Human-readable equations, one `(variable name, right-hand side)`
    /// pair per state variable. Terms appear in library order; zero
    /// coefficients are omitted; an empty support renders as `0`.
    pub fn equations(&self) -> Vec<(String, String)> {
        (0..self.n_vars())
            .map(|j| {
                let name = self.variable_names[j].clone();
                (name, self.render_rhs(j))
            })
            .collect()
    }

    fn render_rhs(&self, var: usize) -> String {
        let mut rhs = String::new();
        for (i, term) in self.library.terms().iter().enumerate() {
            let c = self.coefficients[(i, var)];
            if c == 0.0 {
                continue;
            }
            if rhs.is_empty() {
                rhs.push_str(&format!("{c:.3}"));
            } else if c < 0.0 {
                rhs.push_str(&format!(" - {:.3}", -c));
            } else {
                rhs.push_str(&format!(" + {c:.3}"));
            }
            if term.name != "1" {
                rhs.push(' ');
                rhs.push_str(&term.name);
            }
        }
        if rhs.is_empty() {
            rhs.push('0');
        }
        rhs
    }
}

impl fmt::Display for SindyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, rhs) in self.equations() {
            writeln!(f, "{name}' = {rhs}")?;
        }
        Ok(())
    }
}
