//! # sindy-stlsq
//!
//! Sparse Identification of Nonlinear Dynamics (SINDy) from noisy
//! time-series observations.
//!
//! Given a sampled trajectory of a dynamical system, this library discovers
//! governing equations as a sparse combination of polynomial candidate
//! terms:
//!
//! - **Feature library** ([`PolynomialLibrary`]): all monomials up to a
//!   configured total degree, with a fixed deterministic term order
//! - **Derivative estimation** ([`estimate_derivatives`],
//!   [`DerivativeMethod`]): spacing-aware finite differences, optionally
//!   smoothed for noisy data
//! - **Sparse regression** ([`stlsq`]): sequentially thresholded least
//!   squares: fit, prune small coefficients, refit on the survivors
//! - **One-call pipeline** ([`fit`]): trajectory in, [`SindyModel`] out,
//!   with numerical degeneracies reported as [`FitDiagnostics`] flags
//! - **Reference systems** ([`VanDerPol`], [`ClosureOde`], [`integrate`],
//!   [`add_noise`]): RK4 trajectory generation and seeded Gaussian noise
//!   for exercising the pipeline end to end
//!
//! ## Quick Start
//!
//! ```rust
//! use sindy_stlsq::{fit, integrate, SindyConfig, VanDerPol};
//!
//! // Sample the reference oscillator x1' = x2, x2' = -x1 + 4x2 - 4x1²x2
//! let system = VanDerPol::default();
//! let (times, states) = integrate(&system, &[2.0, 0.0], (0.0, 12.0), 201, 20).unwrap();
//!
//! // Recover its equations from the samples alone
//! let model = fit(&times, &states, &SindyConfig::default()).unwrap();
//! assert!(!model.diagnostics.did_not_converge);
//! println!("{model}");
//! ```
//!
//! ## References
//!
//! - Brunton, Proctor & Kutz (2016), *PNAS*, 113(15), 3932-3937
//! - Kutz et al. (2016), *Dynamic Mode Decomposition*, SIAM

pub mod derivative;
pub mod library;
pub mod types;

pub mod fit;
pub mod model;
pub mod stlsq;
pub mod systems;
pub mod utils;

pub use derivative::{estimate_derivatives, DerivativeMethod};
pub use fit::fit;
pub use library::{PolynomialLibrary, Term};
pub use model::SindyModel;
pub use stlsq::stlsq;
pub use systems::{add_noise, integrate, ClosureOde, OdeSystem, VanDerPol};
pub use types::{FitDiagnostics, SindyConfig, SindyError};
