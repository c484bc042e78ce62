use faer::Mat;

use crate::types::SindyError;

/// Validate that a matrix meets minimum dimension requirements and contains no NaN/Inf.
pub fn validate_matrix(x: &Mat<f64>, min_rows: usize, min_cols: usize) -> Result<(), SindyError> {
    let (rows, cols) = (x.nrows(), x.ncols());
    if rows < min_rows {
        return Err(SindyError::InvalidInput(format!(
            "matrix has {rows} rows, need at least {min_rows}"
        )));
    }
    if cols < min_cols {
        return Err(SindyError::InvalidInput(format!(
            "matrix has {cols} columns, need at least {min_cols}"
        )));
    }
    for j in 0..cols {
        for i in 0..rows {
            let val = x[(i, j)];
            if val.is_nan() || val.is_infinite() {
                return Err(SindyError::InvalidInput(
                    "matrix contains NaN or Inf values".to_string(),
                ));
            }
        }
    }
    Ok(())
}

/// A least-squares solution together with the effective rank of the system.
#[derive(Debug, Clone)]
pub struct LstsqFit {
    /// Solution vector (length = number of columns of the system matrix).
    pub x: Vec<f64>,
    /// Number of singular values above the truncation tolerance.
    pub rank: usize,
}

/// Minimum-norm least-squares solve of `a·x ≈ b` via SVD.
///
/// Singular values below `max_sv * max_dim * EPSILON` are dropped, so a
/// rank-deficient (or underdetermined) system yields the minimum-norm
/// solution instead of failing. `rank < a.ncols()` in the returned fit
/// signals that the drop actually happened.
pub fn solve_min_norm(a: &Mat<f64>, b: &[f64]) -> Result<LstsqFit, SindyError> {
    debug_assert_eq!(a.nrows(), b.len());

    let svd = a.svd().map_err(|e| SindyError::SvdFailed(format!("{e:?}")))?;
    let u = svd.U();
    let s_col = svd.S().column_vector();
    let v = svd.V();

    let m = a.nrows();
    let n = a.ncols();
    let k = s_col.nrows();

    let max_sv = (0..k).map(|i| s_col[i].abs()).fold(0.0_f64, f64::max);
    let tol = max_sv * m.max(n) as f64 * f64::EPSILON;

    // x = Σᵢ vᵢ (uᵢ·b) / sᵢ over singular values above tolerance
    let mut x = vec![0.0; n];
    let mut rank = 0usize;
    for idx in 0..k {
        let si = s_col[idx];
        if si.abs() > tol {
            rank += 1;
            let mut proj = 0.0;
            for i in 0..m {
                proj += u[(i, idx)] * b[i];
            }
            proj /= si;
            for j in 0..n {
                x[j] += v[(j, idx)] * proj;
            }
        }
    }

    Ok(LstsqFit { x, rank })
}
