//! Gauss quadrature rules for the reference interval `[-1, 1]` and the reference
//! quadrilateral `[-1, 1]^2`.
//!
//! Rules are returned as a pair of weights and points. The crate also maps the polynomial
//! degree of an integrand to the smallest Gauss rule that integrates it exactly, which is how
//! `weakforms` turns symbolic order estimates into quadrature rules.

use std::fmt;
use std::fmt::{Display, Formatter};

pub mod tensor;
pub mod univariate;

/// The largest number of Gauss points per dimension that [`gauss_points_for_degree`] hands out.
pub const MAX_GAUSS_POINTS: usize = 20;

/// Library-wide error type.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// Indicates that a rule satisfying the given requirements is not available.
    NoRuleAvailable,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRuleAvailable => {
                write!(f, "There is no quadrature rule satisfying the requirements available")
            }
        }
    }
}

impl std::error::Error for Error {}

/// A D-dimensional point.
pub type Point<const D: usize> = [f64; D];

/// A D-dimensional rule.
pub type Rule<const D: usize> = (Vec<f64>, Vec<Point<D>>);

/// A one-dimensional quadrature rule.
pub type Rule1d = Rule<1>;

/// A two-dimensional quadrature rule.
pub type Rule2d = Rule<2>;

/// Approximates the integral of `f` over the reference domain of the rule.
pub fn integrate<const D: usize>(rule: &Rule<D>, mut f: impl FnMut(&Point<D>) -> f64) -> f64 {
    let (weights, points) = rule;
    weights.iter().zip(points).map(|(w, p)| w * f(p)).sum()
}

/// Returns the number of Gauss points per dimension needed to integrate polynomials of the
/// given degree (per dimension) exactly.
///
/// An `n`-point Gauss rule is exact for degree `2n - 1`, so `degree / 2 + 1` points suffice.
/// Returns [`Error::NoRuleAvailable`] if the required number of points exceeds
/// [`MAX_GAUSS_POINTS`].
pub fn gauss_points_for_degree(degree: usize) -> Result<usize, Error> {
    let n = degree / 2 + 1;
    if n > MAX_GAUSS_POINTS {
        Err(Error::NoRuleAvailable)
    } else {
        Ok(n)
    }
}
