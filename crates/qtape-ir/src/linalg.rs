//! Dense linear algebra used by observable diagonalization.

use nalgebra::{DMatrix, SymmetricEigen};
use num_complex::Complex64;

/// Eigendecomposition of a Hermitian matrix.
#[derive(Debug, Clone)]
pub struct Eigh {
    /// Eigenvalues in ascending order.
    pub eigvals: Vec<f64>,
    /// Eigenvectors as columns, ordered like `eigvals`.
    pub eigvecs: DMatrix<Complex64>,
}

impl Eigh {
    /// Row-major entries of the adjoint of the eigenvector matrix.
    ///
    /// Applying this unitary maps each eigenvector onto the matching
    /// computational basis state.
    pub fn diagonalizing_unitary(&self) -> Vec<Complex64> {
        row_major(&self.eigvecs.adjoint())
    }
}

/// Diagonalize a Hermitian matrix given row-major.
///
/// Eigenpairs are sorted by ascending eigenvalue. Within a degenerate
/// eigenspace the basis is whatever the solver produced.
pub fn eigh(dim: usize, data: &[Complex64]) -> Eigh {
    let m = DMatrix::from_row_slice(dim, dim, data);
    let eig = SymmetricEigen::new(m);

    let mut order: Vec<usize> = (0..dim).collect();
    order.sort_by(|&a, &b| eig.eigenvalues[a].total_cmp(&eig.eigenvalues[b]));

    let eigvals = order.iter().map(|&k| eig.eigenvalues[k]).collect();
    let eigvecs = DMatrix::from_fn(dim, dim, |r, c| eig.eigenvectors[(r, order[c])]);
    Eigh { eigvals, eigvecs }
}

/// Largest `|A[i][j] - conj(A[j][i])|` of a row-major matrix.
pub fn hermitian_deviation(dim: usize, data: &[Complex64]) -> f64 {
    let mut worst = 0.0_f64;
    for i in 0..dim {
        for j in i..dim {
            let d = (data[i * dim + j] - data[j * dim + i].conj()).norm();
            worst = worst.max(d);
        }
    }
    worst
}

/// Kronecker product of two eigenvalue vectors.
pub fn kron(a: &[f64], b: &[f64]) -> Vec<f64> {
    a.iter()
        .flat_map(|x| b.iter().map(move |y| x * y))
        .collect()
}

fn row_major(m: &DMatrix<Complex64>) -> Vec<Complex64> {
    let (rows, cols) = m.shape();
    (0..rows)
        .flat_map(|r| (0..cols).map(move |c| m[(r, c)]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-10;

    fn real(v: &[f64]) -> Vec<Complex64> {
        v.iter().map(|&x| Complex64::new(x, 0.0)).collect()
    }

    #[test]
    fn test_kron() {
        assert_eq!(kron(&[1.0, -1.0], &[1.0, -1.0]), vec![1.0, -1.0, -1.0, 1.0]);
        assert_eq!(kron(&[2.0], &[1.0, 3.0]), vec![2.0, 6.0]);
    }

    #[test]
    fn test_eigh_sorted() {
        let e = eigh(2, &real(&[1.0, 2.0, 2.0, 4.0]));
        assert!((e.eigvals[0] - 0.0).abs() < TOL);
        assert!((e.eigvals[1] - 5.0).abs() < TOL);
    }

    #[test]
    fn test_diagonalizing_unitary_diagonalizes() {
        let h = real(&[1.0, 2.0, 2.0, 4.0]);
        let e = eigh(2, &h);
        let u = DMatrix::from_row_slice(2, 2, &e.diagonalizing_unitary());
        let m = DMatrix::from_row_slice(2, 2, &h);
        let d = &u * m * u.adjoint();
        assert!(d[(0, 1)].norm() < TOL);
        assert!(d[(1, 0)].norm() < TOL);
        assert!((d[(0, 0)].re - e.eigvals[0]).abs() < TOL);
        assert!((d[(1, 1)].re - e.eigvals[1]).abs() < TOL);
    }

    #[test]
    fn test_complex_hermitian() {
        // Pauli-Y
        let y = vec![
            Complex64::new(0.0, 0.0),
            Complex64::new(0.0, -1.0),
            Complex64::new(0.0, 1.0),
            Complex64::new(0.0, 0.0),
        ];
        assert!(hermitian_deviation(2, &y) < TOL);
        let e = eigh(2, &y);
        assert!((e.eigvals[0] + 1.0).abs() < TOL);
        assert!((e.eigvals[1] - 1.0).abs() < TOL);
    }

    #[test]
    fn test_non_hermitian_deviation() {
        let m = real(&[1.0, 2.0, 3.0, 4.0]);
        assert!((hermitian_deviation(2, &m) - 1.0).abs() < TOL);
    }
}
