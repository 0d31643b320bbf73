//! Symbolic polynomial degree algebra.
//!
//! Weak-form terms evaluate their integrands twice: once in floating point to obtain a value,
//! and once in the [`Order`] algebra to obtain an upper bound on the polynomial degree of the
//! integrand. The latter determines the quadrature rule used for the term.
//!
//! The algebra mirrors the behavior of polynomial degrees:
//!
//! - `a + b` is `max(a, b)`: the degree of a sum is at most the larger degree,
//! - `a * b` is `a + b` (as integers): degrees add under multiplication,
//! - constants have degree zero.
//!
//! On quadrilaterals, degrees are understood *per dimension*, which is what tensor-product
//! Gauss rules integrate exactly.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, MulAssign};

/// Upper bound on the polynomial degree of an expression.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Order(u32);

impl Order {
    /// The order of constants.
    pub const ZERO: Self = Order(0);

    pub const fn new(degree: u32) -> Self {
        Self(degree)
    }

    pub const fn degree(&self) -> u32 {
        self.0
    }

    /// The order of `self` raised to the `n`-th power.
    pub fn pow(self, n: u32) -> Self {
        Self(self.0.saturating_mul(n))
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Order({})", self.0)
    }
}

impl From<u32> for Order {
    fn from(degree: u32) -> Self {
        Self(degree)
    }
}

impl Add for Order {
    type Output = Order;

    fn add(self, rhs: Self) -> Self::Output {
        Order(self.0.max(rhs.0))
    }
}

impl AddAssign for Order {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Mul for Order {
    type Output = Order;

    fn mul(self, rhs: Self) -> Self::Output {
        Order(self.0.saturating_add(rhs.0))
    }
}

impl MulAssign for Order {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl Sum for Order {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Order::ZERO, Add::add)
    }
}
