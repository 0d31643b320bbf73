//! Linear solvers for the Newton correction `J Δ = -F`.
use log::debug;
use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::convert::serial::convert_csr_dense;
use nalgebra_sparse::factorization::CscCholesky;
use nalgebra_sparse::ops::serial::spmm_csr_dense;
use nalgebra_sparse::ops::Op;
use nalgebra_sparse::{CscMatrix, CsrMatrix};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};

#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum LinearSolverError {
    /// The matrix is singular to working precision.
    Singular,
    NotPositiveDefinite,
    DimensionMismatch { rows: usize, cols: usize, rhs: usize },
    /// The iterative solver broke down at the given iteration.
    Breakdown(usize),
    /// The iterative solver did not reach the tolerance.
    NotConverged { iterations: usize, relative_residual: f64 },
    NonFiniteSolution,
}

impl Display for LinearSolverError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Singular => write!(f, "matrix is singular"),
            Self::NotPositiveDefinite => write!(f, "matrix is not positive definite"),
            Self::DimensionMismatch { rows, cols, rhs } => write!(
                f,
                "cannot solve system with {}x{} matrix and right-hand side of length {}",
                rows, cols, rhs
            ),
            Self::Breakdown(iteration) => write!(f, "iterative solver broke down at iteration {}", iteration),
            Self::NotConverged {
                iterations,
                relative_residual,
            } => write!(
                f,
                "iterative solver did not converge in {} iterations (relative residual {})",
                iterations, relative_residual
            ),
            Self::NonFiniteSolution => write!(f, "solution contains non-finite values"),
        }
    }
}

impl Error for LinearSolverError {}

/// A solver for sparse linear systems `A x = b`.
pub trait LinearSolver: Debug + Send + Sync {
    fn solve(&self, matrix: &CsrMatrix<f64>, rhs: &DVector<f64>) -> Result<DVector<f64>, LinearSolverError>;
}

impl<S: LinearSolver + ?Sized> LinearSolver for Box<S> {
    fn solve(&self, matrix: &CsrMatrix<f64>, rhs: &DVector<f64>) -> Result<DVector<f64>, LinearSolverError> {
        S::solve(self, matrix, rhs)
    }
}

fn check_dimensions(matrix: &CsrMatrix<f64>, rhs: &DVector<f64>) -> Result<(), LinearSolverError> {
    if matrix.nrows() != matrix.ncols() || matrix.nrows() != rhs.len() {
        Err(LinearSolverError::DimensionMismatch {
            rows: matrix.nrows(),
            cols: matrix.ncols(),
            rhs: rhs.len(),
        })
    } else {
        Ok(())
    }
}

fn check_finite(solution: DVector<f64>) -> Result<DVector<f64>, LinearSolverError> {
    if solution.iter().all(|x| x.is_finite()) {
        Ok(solution)
    } else {
        Err(LinearSolverError::NonFiniteSolution)
    }
}

/// Dense LU factorization with partial pivoting.
///
/// Robust for any nonsingular system, but the cost grows cubically with the system size.
#[derive(Debug, Copy, Clone, Default)]
pub struct DenseLu;

impl LinearSolver for DenseLu {
    fn solve(&self, matrix: &CsrMatrix<f64>, rhs: &DVector<f64>) -> Result<DVector<f64>, LinearSolverError> {
        check_dimensions(matrix, rhs)?;
        debug!("Dense LU solve with {} unknowns", rhs.len());
        let dense: DMatrix<f64> = convert_csr_dense(matrix);
        let solution = dense.lu().solve(rhs).ok_or(LinearSolverError::Singular)?;
        check_finite(solution)
    }
}

/// Sparse Cholesky factorization for symmetric positive definite systems.
#[derive(Debug, Copy, Clone, Default)]
pub struct SparseCholesky;

impl LinearSolver for SparseCholesky {
    fn solve(&self, matrix: &CsrMatrix<f64>, rhs: &DVector<f64>) -> Result<DVector<f64>, LinearSolverError> {
        check_dimensions(matrix, rhs)?;
        debug!(
            "Sparse Cholesky solve with {} unknowns and {} nonzeros",
            rhs.len(),
            matrix.nnz()
        );
        let csc = CscMatrix::from(matrix);
        let factorization = CscCholesky::factor(&csc).map_err(|_| LinearSolverError::NotPositiveDefinite)?;
        let b = DMatrix::from_column_slice(rhs.len(), 1, rhs.as_slice());
        let solution = factorization.solve(&b);
        check_finite(solution.column(0).into_owned())
    }
}

/// Jacobi-preconditioned BiCGSTAB for general sparse systems.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BiCgStab {
    pub max_iterations: usize,
    /// Tolerance on the residual relative to the right-hand side.
    pub tolerance: f64,
}

impl Default for BiCgStab {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            tolerance: 1e-12,
        }
    }
}

fn spmv(matrix: &CsrMatrix<f64>, x: &DVector<f64>, y: &mut DVector<f64>) {
    spmm_csr_dense(0.0, y, 1.0, Op::NoOp(matrix), Op::NoOp(x));
}

/// Jacobi preconditioner. Rows without a (nonzero) diagonal entry are left unscaled.
fn inverse_diagonal(matrix: &CsrMatrix<f64>) -> DVector<f64> {
    let mut m_inv = DVector::repeat(matrix.nrows(), 1.0);
    for (i, _, &a_ii) in matrix.diagonal_as_csr().triplet_iter() {
        if a_ii != 0.0 {
            m_inv[i] = 1.0 / a_ii;
        }
    }
    m_inv
}

impl LinearSolver for BiCgStab {
    fn solve(&self, matrix: &CsrMatrix<f64>, b: &DVector<f64>) -> Result<DVector<f64>, LinearSolverError> {
        check_dimensions(matrix, b)?;
        let n = b.len();
        let b_norm = b.norm();
        let mut x = DVector::zeros(n);
        if b_norm == 0.0 {
            return Ok(x);
        }

        let m_inv = inverse_diagonal(matrix);
        let mut r = b.clone();
        let r_hat = r.clone();
        let (mut rho, mut alpha, mut omega) = (1.0, 1.0, 1.0);
        let mut v = DVector::zeros(n);
        let mut p = DVector::zeros(n);
        let mut t = DVector::zeros(n);

        for iteration in 1..=self.max_iterations {
            let rho_next = r_hat.dot(&r);
            if rho_next.abs() < f64::MIN_POSITIVE || omega == 0.0 {
                return Err(LinearSolverError::Breakdown(iteration));
            }
            let beta = (rho_next / rho) * (alpha / omega);
            p = &r + (&p - &v * omega) * beta;

            let y = p.component_mul(&m_inv);
            spmv(matrix, &y, &mut v);
            let r_hat_v = r_hat.dot(&v);
            if r_hat_v == 0.0 {
                return Err(LinearSolverError::Breakdown(iteration));
            }
            alpha = rho_next / r_hat_v;
            x.axpy(alpha, &y, 1.0);
            let s = &r - &v * alpha;
            if s.norm() <= self.tolerance * b_norm {
                debug!("BiCGSTAB converged after {} iterations", iteration);
                return check_finite(x);
            }

            let z = s.component_mul(&m_inv);
            spmv(matrix, &z, &mut t);
            let t_t = t.dot(&t);
            if t_t == 0.0 {
                return Err(LinearSolverError::Breakdown(iteration));
            }
            omega = t.dot(&s) / t_t;
            x.axpy(omega, &z, 1.0);
            r = s - &t * omega;
            if r.norm() <= self.tolerance * b_norm {
                debug!("BiCGSTAB converged after {} iterations", iteration);
                return check_finite(x);
            }
            rho = rho_next;
        }

        Err(LinearSolverError::NotConverged {
            iterations: self.max_iterations,
            relative_residual: r.norm() / b_norm,
        })
    }
}

/// Selects the linear solver used by the Newton driver.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum LinearSolverBackend {
    #[default]
    DenseLu,
    SparseCholesky,
    BiCgStab { max_iterations: usize, tolerance: f64 },
}

impl LinearSolverBackend {
    pub fn build(&self) -> Box<dyn LinearSolver> {
        match *self {
            Self::DenseLu => Box::new(DenseLu),
            Self::SparseCholesky => Box::new(SparseCholesky),
            Self::BiCgStab {
                max_iterations,
                tolerance,
            } => Box::new(BiCgStab {
                max_iterations,
                tolerance,
            }),
        }
    }
}
