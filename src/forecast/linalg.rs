//! Dense symmetric positive-definite solver for the normal equations.

/// Row-major square matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    n: usize,
    data: Vec<f64>,
}

impl Matrix {
    pub fn zeros(n: usize) -> Self {
        Self {
            n,
            data: vec![0.0; n * n],
        }
    }

    pub fn size(&self) -> usize {
        self.n
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.n + col]
    }

    pub fn add(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.n + col] += value;
    }

    /// `XᵀX` for a design given as rows.
    pub fn gram(rows: &[Vec<f64>], n: usize) -> Self {
        let mut out = Self::zeros(n);
        for row in rows {
            for i in 0..n {
                let xi = row[i];
                if xi == 0.0 {
                    continue;
                }
                for j in i..n {
                    out.data[i * n + j] += xi * row[j];
                }
            }
        }
        for i in 0..n {
            for j in 0..i {
                out.data[i * n + j] = out.data[j * n + i];
            }
        }
        out
    }
}

/// `Xᵀy` for a design given as rows.
pub fn cross(rows: &[Vec<f64>], y: &[f64], n: usize) -> Vec<f64> {
    let mut out = vec![0.0; n];
    for (row, &yi) in rows.iter().zip(y) {
        for (acc, &x) in out.iter_mut().zip(row) {
            *acc += x * yi;
        }
    }
    out
}

/// Solve `A x = b` by Cholesky factorisation.
///
/// Returns `None` when `A` is not numerically positive definite.
pub fn cholesky_solve(a: &Matrix, b: &[f64]) -> Option<Vec<f64>> {
    let n = a.size();
    debug_assert_eq!(b.len(), n);

    // Lower-triangular factor, row-major.
    let mut l = vec![0.0; n * n];
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a.get(i, j);
            for k in 0..j {
                sum -= l[i * n + k] * l[j * n + k];
            }
            if i == j {
                if !(sum > 0.0) || !sum.is_finite() {
                    return None;
                }
                l[i * n + i] = sum.sqrt();
            } else {
                l[i * n + j] = sum / l[j * n + j];
            }
        }
    }

    // L z = b
    let mut z = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for k in 0..i {
            sum -= l[i * n + k] * z[k];
        }
        z[i] = sum / l[i * n + i];
    }

    // Lᵀ x = z
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = z[i];
        for k in (i + 1)..n {
            sum -= l[k * n + i] * x[k];
        }
        x[i] = sum / l[i * n + i];
    }

    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_solves_spd_system() {
        // A = [[4, 2], [2, 3]], x = [1, -2] → b = [0, -4]
        let mut a = Matrix::zeros(2);
        a.add(0, 0, 4.0);
        a.add(0, 1, 2.0);
        a.add(1, 0, 2.0);
        a.add(1, 1, 3.0);
        let x = cholesky_solve(&a, &[0.0, -4.0]).unwrap();
        assert_relative_eq!(x[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(x[1], -2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rejects_singular_matrix() {
        let rows = vec![vec![1.0, 1.0], vec![2.0, 2.0]];
        let a = Matrix::gram(&rows, 2);
        assert!(cholesky_solve(&a, &[1.0, 1.0]).is_none());
    }

    #[test]
    fn test_gram_and_cross() {
        let rows = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
        let a = Matrix::gram(&rows, 2);
        assert_eq!(a.get(0, 0), 10.0);
        assert_eq!(a.get(0, 1), 14.0);
        assert_eq!(a.get(1, 0), 14.0);
        assert_eq!(a.get(1, 1), 20.0);
        assert_eq!(cross(&rows, &[1.0, 1.0], 2), vec![4.0, 6.0]);
    }
}
