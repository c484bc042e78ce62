use crate::derivative::DerivativeMethod;

/// Error types for SINDy operations.
#[derive(Debug, thiserror::Error)]
pub enum SindyError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("insufficient samples: need at least {needed}, got {got}")]
    InsufficientSamples { needed: usize, got: usize },

    #[error("SVD computation failed: {0}")]
    SvdFailed(String),
}

/// Configuration for a SINDy fit.
#[derive(Debug, Clone)]
pub struct SindyConfig {
    /// Maximum total degree of the polynomial candidate library.
    pub degree: usize,
    /// STLSQ pruning threshold λ. Coefficients with magnitude strictly
    /// below λ are zeroed; a magnitude of exactly λ survives.
    pub threshold: f64,
    /// Iteration budget for the prune/refit loop, per state variable.
    pub max_iterations: usize,
    /// State variable names. None for automatic naming (x1, x2, ...).
    pub variable_names: Option<Vec<String>>,
    /// Derivative estimation strategy.
    pub derivative: DerivativeMethod,
}

impl Default for SindyConfig {
    fn default() -> Self {
        Self {
            degree: 3,
            threshold: 0.45,
            max_iterations: 20,
            variable_names: None,
            derivative: DerivativeMethod::FiniteDifference,
        }
    }
}

impl SindyConfig {
    /// Reject bad configuration before any numerical work.
    pub(crate) fn validate(&self) -> Result<(), SindyError> {
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(SindyError::InvalidConfiguration(format!(
                "threshold must be finite and non-negative, got {}",
                self.threshold
            )));
        }
        if self.max_iterations == 0 {
            return Err(SindyError::InvalidConfiguration(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if let DerivativeMethod::SmoothedFiniteDifference { window } = self.derivative {
            if window == 0 || window % 2 == 0 {
                return Err(SindyError::InvalidConfiguration(format!(
                    "smoothing window must be odd and positive, got {window}"
                )));
            }
        }
        Ok(())
    }
}

/// Diagnostics attached to a fit result.
///
/// Numerical degeneracies are absorbed into these flags rather than raised:
/// the fit always returns its best current estimate.
#[derive(Debug, Clone)]
pub struct FitDiagnostics {
    /// True if any column exhausted the iteration budget before its active
    /// set stabilized.
    pub did_not_converge: bool,
    /// True if any active-set least-squares solve was rank-deficient and
    /// fell back to the minimum-norm solution.
    pub singular_design: bool,
    /// True if there were fewer samples than library terms (m < T).
    pub underdetermined: bool,
    /// Prune/refit iterations used, per state variable.
    pub iterations: Vec<usize>,
    /// Whether each state variable's active set stabilized within budget.
    pub converged: Vec<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SindyConfig::default();
        assert_eq!(config.degree, 3);
        assert_eq!(config.max_iterations, 20);
        assert!((config.threshold - 0.45).abs() < 1e-12);
        assert!(config.variable_names.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_negative_threshold_rejected() {
        let config = SindyConfig {
            threshold: -0.1,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SindyError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_nan_threshold_rejected() {
        let config = SindyConfig {
            threshold: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_budget_rejected() {
        let config = SindyConfig {
            max_iterations: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_even_window_rejected() {
        let config = SindyConfig {
            derivative: DerivativeMethod::SmoothedFiniteDifference { window: 4 },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_threshold_allowed() {
        let config = SindyConfig {
            threshold: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
