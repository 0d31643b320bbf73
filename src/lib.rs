//! Nonlinear elliptic finite element problems assembled from a library of weak-form terms.
//!
//! A problem is described by a [`weakform::WeakForm`], a collection of Jacobian (matrix) and
//! residual (vector) terms, bound to one [`space::H1Space`] per unknown in an
//! [`assembly::DiscreteProblem`]. The [`solver::NewtonSolver`] drives the nonlinear iteration,
//! delegating the linear corrections to an explicitly selected [`linear::LinearSolver`].
//!
//! Every term evaluates its integrand both numerically and in the symbolic [`order::Order`]
//! algebra. The latter selects the quadrature rule used for the term.
pub mod assembly;
pub mod coefficient;
pub mod config;
pub mod element;
pub mod error;
pub mod linear;
pub mod mesh;
pub mod order;
pub mod projection;
pub mod solver;
pub mod space;
pub mod weakform;

pub mod optimize {
    pub use weakforms_optimize::*;
}

pub mod quadrature {
    pub use weakforms_quadrature::*;
}

#[cfg(feature = "proptest")]
pub mod proptest;

pub extern crate nalgebra;
pub extern crate nalgebra_sparse;
