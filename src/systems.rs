use faer::Mat;
use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::types::SindyError;
use crate::utils::validate_matrix;

/// Trait for continuous-time dynamical systems.
///
/// Implementors evaluate the vector field dx/dt at a given time and state.
pub trait OdeSystem: Send + Sync {
    /// Evaluate the vector field into `out`.
    fn eval(&self, t: f64, state: &[f64], out: &mut [f64]);

    /// State space dimension.
    fn dim(&self) -> usize;

    /// System name.
    fn name(&self) -> &str;
}

/// Van der Pol oscillator in first-order form.
///
/// x1' = x2
/// x2' = -x1 + μ·x2 - μ·x1²·x2
#[derive(Debug, Clone)]
pub struct VanDerPol {
    pub mu: f64,
}

impl Default for VanDerPol {
    fn default() -> Self {
        Self { mu: 4.0 }
    }
}

impl OdeSystem for VanDerPol {
    fn eval(&self, _t: f64, state: &[f64], out: &mut [f64]) {
        let (x1, x2) = (state[0], state[1]);
        out[0] = x2;
        out[1] = -x1 + self.mu * x2 - self.mu * x1 * x1 * x2;
    }
    fn dim(&self) -> usize {
        2
    }
    fn name(&self) -> &str {
        "van_der_pol"
    }
}

/// A wrapper that turns a closure into an OdeSystem.
pub struct ClosureOde<F: Fn(f64, &[f64], &mut [f64]) + Send + Sync> {
    func: F,
    dim: usize,
    name: String,
}

impl<F: Fn(f64, &[f64], &mut [f64]) + Send + Sync> ClosureOde<F> {
    pub fn new(func: F, dim: usize, name: impl Into<String>) -> Self {
        Self {
            func,
            dim,
            name: name.into(),
        }
    }
}

impl<F: Fn(f64, &[f64], &mut [f64]) + Send + Sync> OdeSystem for ClosureOde<F> {
    fn eval(&self, t: f64, state: &[f64], out: &mut [f64]) {
        (self.func)(t, state, out)
    }
    fn dim(&self) -> usize {
        self.dim
    }
    fn name(&self) -> &str {
        &self.name
    }
}

/// Integrate a system with fixed-step RK4, sampling at `n_out` evenly
/// spaced times over `t_span` (endpoints included).
///
/// `substeps` internal RK4 steps are taken per output interval, so the
/// integration step is `(t1 - t0) / ((n_out - 1) * substeps)`; keep it
/// small enough for the dynamics even when the output sampling is coarse.
///
/// # Returns
/// `(times, states)` with `states` of shape (n_out × dim), rows aligned
/// with `times`.
pub fn integrate(
    system: &dyn OdeSystem,
    initial_state: &[f64],
    t_span: (f64, f64),
    n_out: usize,
    substeps: usize,
) -> Result<(Vec<f64>, Mat<f64>), SindyError> {
    let dim = system.dim();
    if initial_state.len() != dim {
        return Err(SindyError::InvalidInput(format!(
            "initial state has dimension {}, system expects {dim}",
            initial_state.len()
        )));
    }
    if n_out < 2 {
        return Err(SindyError::InvalidConfiguration(
            "n_out must be at least 2".to_string(),
        ));
    }
    if substeps == 0 {
        return Err(SindyError::InvalidConfiguration(
            "substeps must be at least 1".to_string(),
        ));
    }
    let (t0, t1) = t_span;
    if !(t1 > t0) {
        return Err(SindyError::InvalidConfiguration(format!(
            "integration span must be increasing, got ({t0}, {t1})"
        )));
    }

    let out_dt = (t1 - t0) / (n_out - 1) as f64;
    let dt = out_dt / substeps as f64;

    let mut times = Vec::with_capacity(n_out);
    let mut states = Mat::<f64>::zeros(n_out, dim);

    let mut stepper = Rk4::new(dim);
    let mut t = t0;
    let mut state = initial_state.to_vec();

    times.push(t0);
    for v in 0..dim {
        states[(0, v)] = state[v];
    }

    for s in 1..n_out {
        for _ in 0..substeps {
            stepper.step(system, &mut t, &mut state, dt);
        }
        // Pin the sample time to the grid; accumulated dt rounding stays
        // out of the time stamps.
        let t_s = t0 + out_dt * s as f64;
        t = t_s;
        times.push(t_s);
        for v in 0..dim {
            states[(s, v)] = state[v];
        }
    }

    Ok((times, states))
}

/// Classic Runge-Kutta 4th order stepper with reusable stage buffers.
struct Rk4 {
    k1: Vec<f64>,
    k2: Vec<f64>,
    k3: Vec<f64>,
    k4: Vec<f64>,
    tmp: Vec<f64>,
}

impl Rk4 {
    fn new(dim: usize) -> Self {
        Self {
            k1: vec![0.0; dim],
            k2: vec![0.0; dim],
            k3: vec![0.0; dim],
            k4: vec![0.0; dim],
            tmp: vec![0.0; dim],
        }
    }

    fn step(&mut self, system: &dyn OdeSystem, t: &mut f64, state: &mut [f64], dt: f64) {
        let t0 = *t;

        // k1 = f(t, y)
        system.eval(t0, state, &mut self.k1);

        // k2 = f(t + dt/2, y + dt*k1/2)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + 0.5 * dt * self.k1[i];
        }
        system.eval(t0 + 0.5 * dt, &self.tmp, &mut self.k2);

        // k3 = f(t + dt/2, y + dt*k2/2)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + 0.5 * dt * self.k2[i];
        }
        system.eval(t0 + 0.5 * dt, &self.tmp, &mut self.k3);

        // k4 = f(t + dt, y + dt*k3)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * self.k3[i];
        }
        system.eval(t0 + dt, &self.tmp, &mut self.k4);

        // y_next = y + dt/6 * (k1 + 2k2 + 2k3 + k4)
        for i in 0..state.len() {
            state[i] +=
                dt / 6.0 * (self.k1[i] + 2.0 * self.k2[i] + 2.0 * self.k3[i] + self.k4[i]);
        }

        *t = t0 + dt;
    }
}

/// Add i.i.d. Gaussian noise to every entry of a state matrix.
///
/// The generator is caller-supplied so runs are reproducible with a seeded
/// RNG; there is no fallback to a process-global generator.
pub fn add_noise<R: Rng>(
    states: &Mat<f64>,
    std_dev: f64,
    rng: &mut R,
) -> Result<Mat<f64>, SindyError> {
    if !std_dev.is_finite() || std_dev < 0.0 {
        return Err(SindyError::InvalidConfiguration(format!(
            "noise standard deviation must be finite and non-negative, got {std_dev}"
        )));
    }
    validate_matrix(states, 1, 1)?;
    if std_dev == 0.0 {
        return Ok(states.to_owned());
    }

    let normal = Normal::new(0.0, std_dev).map_err(|e| {
        SindyError::InvalidConfiguration(format!("bad noise distribution: {e}"))
    })?;

    let mut noisy = states.to_owned();
    // Row-major draw order keeps a seeded run reproducible.
    for i in 0..noisy.nrows() {
        for j in 0..noisy.ncols() {
            noisy[(i, j)] += normal.sample(rng);
        }
    }
    Ok(noisy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn assert_near(a: f64, b: f64, eps: f64) {
        assert!(
            (a - b).abs() < eps,
            "expected {a} ≈ {b} (diff = {})",
            (a - b).abs()
        );
    }

    #[test]
    fn test_van_der_pol_vector_field() {
        let system = VanDerPol::default();
        let mut out = [0.0; 2];
        system.eval(0.0, &[2.0, 0.5], &mut out);
        assert_near(out[0], 0.5, 1e-12);
        // -2 + 4*0.5 - 4*4*0.5 = -8
        assert_near(out[1], -8.0, 1e-12);
    }

    #[test]
    fn test_integrate_harmonic_oscillator() {
        // x'' = -x has the exact solution (cos t, -sin t) from (1, 0).
        let system = ClosureOde::new(
            |_t: f64, x: &[f64], out: &mut [f64]| {
                out[0] = x[1];
                out[1] = -x[0];
            },
            2,
            "harmonic",
        );
        let (times, states) =
            integrate(&system, &[1.0, 0.0], (0.0, 2.0 * std::f64::consts::PI), 101, 10).unwrap();
        assert_eq!(times.len(), 101);
        assert_eq!(states.nrows(), 101);
        for (i, &t) in times.iter().enumerate() {
            assert_near(states[(i, 0)], t.cos(), 1e-6);
            assert_near(states[(i, 1)], -t.sin(), 1e-6);
        }
    }

    #[test]
    fn test_integrate_time_grid() {
        let system = VanDerPol::default();
        let (times, _) = integrate(&system, &[2.0, 0.0], (0.0, 12.0), 49, 20).unwrap();
        assert_eq!(times.len(), 49);
        assert_near(times[0], 0.0, 1e-15);
        assert_near(times[48], 12.0, 1e-12);
        assert_near(times[1] - times[0], 0.25, 1e-12);
    }

    #[test]
    fn test_integrate_rejects_bad_span() {
        let system = VanDerPol::default();
        assert!(integrate(&system, &[2.0, 0.0], (1.0, 1.0), 10, 5).is_err());
        assert!(integrate(&system, &[2.0, 0.0], (0.0, 1.0), 1, 5).is_err());
        assert!(integrate(&system, &[2.0, 0.0], (0.0, 1.0), 10, 0).is_err());
        assert!(integrate(&system, &[2.0], (0.0, 1.0), 10, 5).is_err());
    }

    #[test]
    fn test_add_noise_seeded_reproducible() {
        let states = Mat::<f64>::zeros(5, 2);
        let mut rng_a = StdRng::seed_from_u64(42);
        let mut rng_b = StdRng::seed_from_u64(42);
        let a = add_noise(&states, 0.1, &mut rng_a).unwrap();
        let b = add_noise(&states, 0.1, &mut rng_b).unwrap();
        for i in 0..5 {
            for j in 0..2 {
                assert_eq!(a[(i, j)].to_bits(), b[(i, j)].to_bits());
            }
        }
    }

    #[test]
    fn test_add_noise_zero_sigma_is_identity() {
        let mut states = Mat::<f64>::zeros(3, 2);
        states[(1, 1)] = 7.0;
        let mut rng = StdRng::seed_from_u64(1);
        let noisy = add_noise(&states, 0.0, &mut rng).unwrap();
        for i in 0..3 {
            for j in 0..2 {
                assert_eq!(noisy[(i, j)], states[(i, j)]);
            }
        }
    }

    #[test]
    fn test_add_noise_negative_sigma_rejected() {
        let states = Mat::<f64>::zeros(3, 2);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(add_noise(&states, -0.5, &mut rng).is_err());
    }
}
