use faer::Mat;

use crate::types::SindyError;
use crate::utils::validate_matrix;

/// One candidate term of the library: a monomial over the state variables.
///
/// The exponent vector and display name are fixed at library construction
/// and carried immutably through the pipeline, so coefficient row `i` always
/// means the same monomial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    /// Per-variable exponents (length = number of state variables).
    pub exponents: Vec<usize>,
    /// Display name, e.g. `1`, `x2`, `x1^2 x2`.
    pub name: String,
}

impl Term {
    /// Total degree of the monomial.
    pub fn degree(&self) -> usize {
        self.exponents.iter().sum()
    }
}

/// Polynomial candidate-term library: all monomials in `n_vars` variables up
/// to a maximum total degree, constant term included.
///
/// Term order is deterministic and stable across constructions: ascending
/// total degree, and within a degree earlier variables carry higher
/// exponents first (`1, x1, x2, x1^2, x1 x2, x2^2, ...`).
#[derive(Debug, Clone)]
pub struct PolynomialLibrary {
    n_vars: usize,
    degree: usize,
    terms: Vec<Term>,
}

impl PolynomialLibrary {
    /// Build the library with automatic variable names (`x1`, `x2`, ...).
    pub fn new(n_vars: usize, degree: usize) -> Result<Self, SindyError> {
        let names: Vec<String> = (1..=n_vars).map(|i| format!("x{i}")).collect();
        Self::with_names(&names, degree)
    }

    /// Build the library with caller-supplied variable names.
    pub fn with_names(names: &[String], degree: usize) -> Result<Self, SindyError> {
        let n_vars = names.len();
        if n_vars < 1 {
            return Err(SindyError::InvalidConfiguration(
                "library needs at least one state variable".to_string(),
            ));
        }

        let terms = monomial_exponents(n_vars, degree)
            .into_iter()
            .map(|exponents| {
                let name = term_name(&exponents, names);
                Term { exponents, name }
            })
            .collect();

        Ok(Self {
            n_vars,
            degree,
            terms,
        })
    }

    /// Number of state variables.
    pub fn n_vars(&self) -> usize {
        self.n_vars
    }

    /// Maximum total degree.
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Number of candidate terms T = C(n_vars + degree, degree).
    pub fn n_terms(&self) -> usize {
        self.terms.len()
    }

    /// The ordered candidate terms.
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Evaluate every term at one state vector, in library order.
    pub fn evaluate(&self, state: &[f64]) -> Result<Vec<f64>, SindyError> {
        if state.len() != self.n_vars {
            return Err(SindyError::InvalidInput(format!(
                "state has dimension {}, library expects {}",
                state.len(),
                self.n_vars
            )));
        }
        Ok(self
            .terms
            .iter()
            .map(|term| eval_monomial(&term.exponents, state))
            .collect())
    }

    /// Build the design matrix Θ (samples × terms) for a batch of states
    /// (samples × variables).
    pub fn design_matrix(&self, states: &Mat<f64>) -> Result<Mat<f64>, SindyError> {
        validate_matrix(states, 1, self.n_vars)?;
        if states.ncols() != self.n_vars {
            return Err(SindyError::InvalidInput(format!(
                "states have {} columns, library expects {}",
                states.ncols(),
                self.n_vars
            )));
        }

        let m = states.nrows();
        let mut theta = Mat::<f64>::zeros(m, self.terms.len());
        let mut state = vec![0.0; self.n_vars];
        for i in 0..m {
            for v in 0..self.n_vars {
                state[v] = states[(i, v)];
            }
            for (j, term) in self.terms.iter().enumerate() {
                theta[(i, j)] = eval_monomial(&term.exponents, &state);
            }
        }
        Ok(theta)
    }
}

fn eval_monomial(exponents: &[usize], state: &[f64]) -> f64 {
    let mut val = 1.0;
    for (&e, &x) in exponents.iter().zip(state) {
        if e > 0 {
            val *= x.powi(e as i32);
        }
    }
    val
}

/// Generate all monomial exponent vectors up to a given total degree,
/// ascending by total degree.
fn monomial_exponents(n_vars: usize, max_degree: usize) -> Vec<Vec<usize>> {
    let mut result = Vec::new();
    let mut current = Vec::with_capacity(n_vars);
    for total in 0..=max_degree {
        push_exponents(n_vars, total, &mut current, &mut result);
    }
    result
}

fn push_exponents(
    n_remaining: usize,
    remaining_degree: usize,
    current: &mut Vec<usize>,
    result: &mut Vec<Vec<usize>>,
) {
    if n_remaining == 1 {
        let mut mono = current.clone();
        mono.push(remaining_degree);
        result.push(mono);
        return;
    }

    // Descending so x1^2 sorts before x1 x2 before x2^2.
    for d in (0..=remaining_degree).rev() {
        current.push(d);
        push_exponents(n_remaining - 1, remaining_degree - d, current, result);
        current.pop();
    }
}

fn term_name(exponents: &[usize], names: &[String]) -> String {
    let mut parts = Vec::new();
    for (name, &e) in names.iter().zip(exponents) {
        match e {
            0 => {}
            1 => parts.push(name.clone()),
            _ => parts.push(format!("{name}^{e}")),
        }
    }
    if parts.is_empty() {
        "1".to_string()
    } else {
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_near(a: f64, b: f64, eps: f64) {
        assert!(
            (a - b).abs() < eps,
            "expected {a} ≈ {b} (diff = {})",
            (a - b).abs()
        );
    }

    fn binomial(n: usize, k: usize) -> usize {
        let mut result = 1usize;
        for i in 0..k {
            result = result * (n - i) / (i + 1);
        }
        result
    }

    #[test]
    fn test_term_count() {
        // T = C(n + d, d) for combinations with repetition.
        for &(n, d) in &[(1, 0), (1, 3), (2, 2), (2, 3), (3, 3), (4, 2)] {
            let lib = PolynomialLibrary::new(n, d).unwrap();
            assert_eq!(
                lib.n_terms(),
                binomial(n + d, d),
                "term count mismatch for n={n}, d={d}"
            );
        }
    }

    #[test]
    fn test_term_order_two_vars_degree_two() {
        let lib = PolynomialLibrary::new(2, 2).unwrap();
        let names: Vec<&str> = lib.terms().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["1", "x1", "x2", "x1^2", "x1 x2", "x2^2"]);
    }

    #[test]
    fn test_term_order_stable_across_constructions() {
        let a = PolynomialLibrary::new(3, 3).unwrap();
        let b = PolynomialLibrary::new(3, 3).unwrap();
        assert_eq!(a.terms(), b.terms());
    }

    #[test]
    fn test_degree_zero_is_constant_only() {
        let lib = PolynomialLibrary::new(2, 0).unwrap();
        assert_eq!(lib.n_terms(), 1);
        assert_eq!(lib.terms()[0].name, "1");
        let row = lib.evaluate(&[3.0, -7.0]).unwrap();
        assert_near(row[0], 1.0, 1e-15);
    }

    #[test]
    fn test_zero_vars_rejected() {
        assert!(PolynomialLibrary::new(0, 2).is_err());
    }

    #[test]
    fn test_evaluate_values() {
        let lib = PolynomialLibrary::new(2, 3).unwrap();
        let row = lib.evaluate(&[2.0, -3.0]).unwrap();
        // 1, x1, x2, x1^2, x1 x2, x2^2, x1^3, x1^2 x2, x1 x2^2, x2^3
        assert_eq!(row.len(), 10);
        assert_near(row[0], 1.0, 1e-12);
        assert_near(row[1], 2.0, 1e-12);
        assert_near(row[2], -3.0, 1e-12);
        assert_near(row[3], 4.0, 1e-12);
        assert_near(row[4], -6.0, 1e-12);
        assert_near(row[5], 9.0, 1e-12);
        assert_near(row[6], 8.0, 1e-12);
        assert_near(row[7], -12.0, 1e-12);
        assert_near(row[8], 18.0, 1e-12);
        assert_near(row[9], -27.0, 1e-12);
    }

    #[test]
    fn test_evaluate_dimension_mismatch() {
        let lib = PolynomialLibrary::new(2, 2).unwrap();
        assert!(lib.evaluate(&[1.0]).is_err());
        assert!(lib.evaluate(&[1.0, 2.0, 3.0]).is_err());
    }

    #[test]
    fn test_design_matrix() {
        let lib = PolynomialLibrary::new(2, 2).unwrap();
        let mut states = Mat::<f64>::zeros(3, 2);
        for i in 0..3 {
            states[(i, 0)] = i as f64;
            states[(i, 1)] = 2.0 * i as f64;
        }
        let theta = lib.design_matrix(&states).unwrap();
        assert_eq!(theta.nrows(), 3);
        assert_eq!(theta.ncols(), 6);
        // Row 2: state (2, 4) → 1, 2, 4, 4, 8, 16
        assert_near(theta[(2, 0)], 1.0, 1e-12);
        assert_near(theta[(2, 1)], 2.0, 1e-12);
        assert_near(theta[(2, 2)], 4.0, 1e-12);
        assert_near(theta[(2, 3)], 4.0, 1e-12);
        assert_near(theta[(2, 4)], 8.0, 1e-12);
        assert_near(theta[(2, 5)], 16.0, 1e-12);
    }

    #[test]
    fn test_design_matrix_wrong_width() {
        let lib = PolynomialLibrary::new(2, 2).unwrap();
        let states = Mat::<f64>::zeros(3, 3);
        assert!(lib.design_matrix(&states).is_err());
    }

    #[test]
    fn test_custom_names() {
        let names = vec!["u".to_string(), "v".to_string()];
        let lib = PolynomialLibrary::with_names(&names, 2).unwrap();
        let term_names: Vec<&str> = lib.terms().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(term_names, vec!["1", "u", "v", "u^2", "u v", "v^2"]);
    }
}
