//! Coefficient models for weak-form terms.
//!
//! Two families of coefficients appear in the term library:
//!
//! - [`SpatialFunction`]s depend on the physical position `(x, y)`. They scale mass, load and
//!   boundary terms.
//! - [`FieldFunction`]s depend on the value `u` of the unknown field. They model nonlinear
//!   material properties such as a temperature-dependent conductivity `κ(u)`, and must also
//!   provide `dκ/du` for the Jacobian terms.
//!
//! Both kinds report a symbolic [`Order`] used for quadrature selection. The estimate must
//! never under-estimate the polynomial degree of the value it describes.
//!
//! Terms take their coefficients through a [`CoefficientSource`], which makes ownership
//! explicit: a coefficient is either not provided (the term then owns a constant `1.0`),
//! borrowed from the caller, or handed over to the term.
use crate::config::ConfigurationError;
use crate::order::Order;
use nalgebra::{DMatrix, DVector, Vector2};
use std::fmt;
use std::fmt::Debug;
use std::ops::Deref;
use std::sync::Arc;

/// A scalar function of the physical position.
pub trait SpatialFunction: Debug + Send + Sync {
    fn value(&self, x: f64, y: f64) -> f64;

    /// Upper bound on the polynomial degree of the function, given the orders of `x` and `y`.
    fn order(&self, x: Order, y: Order) -> Order;
}

/// A scalar function of the unknown field value, with an analytic derivative.
pub trait FieldFunction: Debug + Send + Sync {
    fn value(&self, u: f64) -> f64;

    /// The derivative `d value / du` at `u`.
    fn derivative(&self, u: f64) -> f64;

    /// Upper bound on the polynomial degree of `value(u)` given the order of `u`.
    fn order(&self, u: Order) -> Order;

    /// Upper bound on the polynomial degree of `derivative(u)` given the order of `u`.
    fn derivative_order(&self, u: Order) -> Order;

    /// Whether the derivative vanishes identically.
    fn is_constant(&self) -> bool {
        false
    }
}

/// A constant coefficient.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Constant(pub f64);

impl Constant {
    pub fn new(value: f64) -> Self {
        Self(value)
    }
}

impl Default for Constant {
    fn default() -> Self {
        Self(1.0)
    }
}

impl SpatialFunction for Constant {
    fn value(&self, _x: f64, _y: f64) -> f64 {
        self.0
    }

    fn order(&self, _x: Order, _y: Order) -> Order {
        Order::ZERO
    }
}

impl FieldFunction for Constant {
    fn value(&self, _u: f64) -> f64 {
        self.0
    }

    fn derivative(&self, _u: f64) -> f64 {
        0.0
    }

    fn order(&self, _u: Order) -> Order {
        Order::ZERO
    }

    fn derivative_order(&self, _u: Order) -> Order {
        Order::ZERO
    }

    fn is_constant(&self) -> bool {
        true
    }
}

/// A spatial function defined by a closure, with a declared polynomial order.
///
/// For non-polynomial functions the declared order decides how accurately the function is
/// integrated.
#[derive(Clone)]
pub struct SpatialFn<F> {
    function: F,
    order: Order,
}

impl<F> SpatialFn<F>
where
    F: Fn(f64, f64) -> f64 + Send + Sync,
{
    pub fn new(order: impl Into<Order>, function: F) -> Self {
        Self {
            function,
            order: order.into(),
        }
    }
}

impl<F> Debug for SpatialFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpatialFn").field("order", &self.order).finish()
    }
}

impl<F> SpatialFunction for SpatialFn<F>
where
    F: Fn(f64, f64) -> f64 + Send + Sync,
{
    fn value(&self, x: f64, y: f64) -> f64 {
        (self.function)(x, y)
    }

    fn order(&self, _x: Order, _y: Order) -> Order {
        self.order
    }
}

/// A function of the position with a known gradient.
///
/// Used as initial guess for projections and as reference in error estimates.
pub trait ExactSolution: Debug + Send + Sync {
    fn value(&self, x: f64, y: f64) -> f64;

    fn gradient(&self, x: f64, y: f64) -> Vector2<f64>;

    /// Polynomial degree used to integrate the function. Non-polynomial functions should
    /// declare a degree large enough for the desired accuracy.
    fn order(&self) -> Order;
}

impl ExactSolution for Constant {
    fn value(&self, _x: f64, _y: f64) -> f64 {
        self.0
    }

    fn gradient(&self, _x: f64, _y: f64) -> Vector2<f64> {
        Vector2::zeros()
    }

    fn order(&self) -> Order {
        Order::ZERO
    }
}

/// An [`ExactSolution`] given by closures for its value and gradient.
#[derive(Clone)]
pub struct ExactFn<F, G> {
    value: F,
    gradient: G,
    order: Order,
}

impl<F, G> ExactFn<F, G>
where
    F: Fn(f64, f64) -> f64 + Send + Sync,
    G: Fn(f64, f64) -> Vector2<f64> + Send + Sync,
{
    pub fn new(order: impl Into<Order>, value: F, gradient: G) -> Self {
        Self {
            value,
            gradient,
            order: order.into(),
        }
    }
}

impl<F, G> Debug for ExactFn<F, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExactFn").field("order", &self.order).finish()
    }
}

impl<F, G> ExactSolution for ExactFn<F, G>
where
    F: Fn(f64, f64) -> f64 + Send + Sync,
    G: Fn(f64, f64) -> Vector2<f64> + Send + Sync,
{
    fn value(&self, x: f64, y: f64) -> f64 {
        (self.value)(x, y)
    }

    fn gradient(&self, x: f64, y: f64) -> Vector2<f64> {
        (self.gradient)(x, y)
    }

    fn order(&self) -> Order {
        self.order
    }
}

/// A polynomial `c_0 + c_1 u + ... + c_n u^n` in the field value.
#[derive(Debug, Clone, PartialEq)]
pub struct Polynomial {
    // Ascending powers
    coefficients: Vec<f64>,
}

impl Polynomial {
    /// Creates a polynomial from its coefficients in ascending powers of `u`.
    ///
    /// Trailing zero coefficients are dropped, so the reported degree is exact.
    pub fn new(coefficients: impl Into<Vec<f64>>) -> Self {
        let mut coefficients = coefficients.into();
        while coefficients.last() == Some(&0.0) {
            coefficients.pop();
        }
        Self { coefficients }
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn degree(&self) -> u32 {
        self.coefficients.len().saturating_sub(1) as u32
    }
}

impl FieldFunction for Polynomial {
    fn value(&self, u: f64) -> f64 {
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, &c| acc * u + c)
    }

    fn derivative(&self, u: f64) -> f64 {
        self.coefficients
            .iter()
            .enumerate()
            .skip(1)
            .rev()
            .fold(0.0, |acc, (k, &c)| acc * u + k as f64 * c)
    }

    fn order(&self, u: Order) -> Order {
        u.pow(self.degree())
    }

    fn derivative_order(&self, u: Order) -> Order {
        u.pow(self.degree().saturating_sub(1))
    }

    fn is_constant(&self) -> bool {
        self.degree() == 0
    }
}

/// Condition imposed at one end of a [`CubicSpline`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SplineEndCondition {
    /// Vanishing second derivative.
    Natural,
    /// Prescribed first derivative.
    Clamped(f64),
}

/// Behavior of a [`CubicSpline`] outside its table.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Extrapolation {
    /// Continue with the end value.
    Constant,
    /// Continue along the tangent at the end point.
    Linear,
}

/// A cubic spline interpolating a table `(u_i, κ_i)` with strictly increasing `u_i`.
#[derive(Debug, Clone, PartialEq)]
pub struct CubicSpline {
    points: Vec<f64>,
    values: Vec<f64>,
    second_derivatives: Vec<f64>,
    extrapolation: [Extrapolation; 2],
}

impl CubicSpline {
    pub fn new(
        points: impl Into<Vec<f64>>,
        values: impl Into<Vec<f64>>,
        left: SplineEndCondition,
        right: SplineEndCondition,
    ) -> Result<Self, ConfigurationError> {
        let points = points.into();
        let values = values.into();

        if points.len() != values.len() {
            return Err(ConfigurationError::InvalidSpline(format!(
                "{} points but {} values",
                points.len(),
                values.len()
            )));
        }
        if points.len() < 2 {
            return Err(ConfigurationError::InvalidSpline(
                "at least two points are required".to_string(),
            ));
        }
        if points.iter().chain(&values).any(|v| !v.is_finite()) {
            return Err(ConfigurationError::InvalidSpline(
                "table entries must be finite".to_string(),
            ));
        }
        if points.windows(2).any(|w| w[1] <= w[0]) {
            return Err(ConfigurationError::InvalidSpline(
                "points must be strictly increasing".to_string(),
            ));
        }

        let second_derivatives = solve_second_derivatives(&points, &values, left, right)?;
        Ok(Self {
            points,
            values,
            second_derivatives,
            extrapolation: [Extrapolation::Linear; 2],
        })
    }

    /// A spline with vanishing second derivatives at both ends.
    pub fn natural(points: impl Into<Vec<f64>>, values: impl Into<Vec<f64>>) -> Result<Self, ConfigurationError> {
        Self::new(points, values, SplineEndCondition::Natural, SplineEndCondition::Natural)
    }

    pub fn with_extrapolation(mut self, left: Extrapolation, right: Extrapolation) -> Self {
        self.extrapolation = [left, right];
        self
    }

    pub fn points(&self) -> &[f64] {
        &self.points
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    fn interval(&self, u: f64) -> usize {
        let n = self.points.len();
        self.points
            .partition_point(|&p| p <= u)
            .saturating_sub(1)
            .min(n - 2)
    }

    fn interpolate(&self, u: f64) -> (f64, f64) {
        let i = self.interval(u);
        let (x0, x1) = (self.points[i], self.points[i + 1]);
        let (y0, y1) = (self.values[i], self.values[i + 1]);
        let (m0, m1) = (self.second_derivatives[i], self.second_derivatives[i + 1]);
        let h = x1 - x0;
        let a = x1 - u;
        let b = u - x0;
        let c0 = y0 / h - m0 * h / 6.0;
        let c1 = y1 / h - m1 * h / 6.0;

        let value = m0 * a.powi(3) / (6.0 * h) + m1 * b.powi(3) / (6.0 * h) + c0 * a + c1 * b;
        let derivative = -m0 * a * a / (2.0 * h) + m1 * b * b / (2.0 * h) - c0 + c1;
        (value, derivative)
    }

    fn evaluate(&self, u: f64) -> (f64, f64) {
        let n = self.points.len();
        let (first, last) = (self.points[0], self.points[n - 1]);
        let (end, extrapolation) = if u < first {
            (first, self.extrapolation[0])
        } else if u > last {
            (last, self.extrapolation[1])
        } else {
            return self.interpolate(u);
        };

        let (value, slope) = self.interpolate(end);
        match extrapolation {
            Extrapolation::Constant => (value, 0.0),
            Extrapolation::Linear => (value + slope * (u - end), slope),
        }
    }
}

/// Solves the tridiagonal system for the second derivatives at the spline knots.
fn solve_second_derivatives(
    x: &[f64],
    y: &[f64],
    left: SplineEndCondition,
    right: SplineEndCondition,
) -> Result<Vec<f64>, ConfigurationError> {
    let n = x.len();
    let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
    let slope = |i: usize| (y[i + 1] - y[i]) / h[i];

    let mut system = DMatrix::zeros(n, n);
    let mut rhs = DVector::zeros(n);
    match left {
        SplineEndCondition::Natural => system[(0, 0)] = 1.0,
        SplineEndCondition::Clamped(s) => {
            system[(0, 0)] = 2.0 * h[0];
            system[(0, 1)] = h[0];
            rhs[0] = 6.0 * (slope(0) - s);
        }
    }
    for i in 1..n - 1 {
        system[(i, i - 1)] = h[i - 1];
        system[(i, i)] = 2.0 * (h[i - 1] + h[i]);
        system[(i, i + 1)] = h[i];
        rhs[i] = 6.0 * (slope(i) - slope(i - 1));
    }
    match right {
        SplineEndCondition::Natural => system[(n - 1, n - 1)] = 1.0,
        SplineEndCondition::Clamped(s) => {
            system[(n - 1, n - 2)] = h[n - 2];
            system[(n - 1, n - 1)] = 2.0 * h[n - 2];
            rhs[n - 1] = 6.0 * (s - slope(n - 2));
        }
    }

    let second_derivatives = system
        .lu()
        .solve(&rhs)
        .ok_or_else(|| ConfigurationError::InvalidSpline("spline system is singular".to_string()))?;
    Ok(second_derivatives.as_slice().to_vec())
}

impl FieldFunction for CubicSpline {
    fn value(&self, u: f64) -> f64 {
        self.evaluate(u).0
    }

    fn derivative(&self, u: f64) -> f64 {
        self.evaluate(u).1
    }

    fn order(&self, u: Order) -> Order {
        u.pow(3)
    }

    fn derivative_order(&self, u: Order) -> Order {
        u.pow(2)
    }
}

/// How a term obtains one of its coefficients.
#[derive(Debug)]
pub enum CoefficientSource<'a, F: ?Sized> {
    /// The term creates and owns a constant `1.0`.
    NotProvided,
    /// The caller keeps ownership. The coefficient must outlive the term.
    Borrowed(&'a F),
    /// Ownership is transferred to the term.
    Owned(Box<F>),
}

impl<'a, F: ?Sized> Default for CoefficientSource<'a, F> {
    fn default() -> Self {
        Self::NotProvided
    }
}

/// Source of a coefficient that depends on the field value.
pub type FieldCoefficientSource<'a> = CoefficientSource<'a, dyn FieldFunction + 'a>;

/// Source of a coefficient that depends on the position.
pub type SpatialCoefficientSource<'a> = CoefficientSource<'a, dyn SpatialFunction + 'a>;

impl<'a> FieldCoefficientSource<'a> {
    pub fn borrowed(coefficient: &'a (impl FieldFunction + 'a)) -> Self {
        Self::Borrowed(coefficient)
    }

    pub fn owned(coefficient: impl FieldFunction + 'a) -> Self {
        Self::Owned(Box::new(coefficient))
    }

    pub fn resolve(self) -> FieldCoefficient<'a> {
        match self {
            Self::NotProvided => Coefficient::Owned(Arc::new(Constant(1.0))),
            Self::Borrowed(coefficient) => Coefficient::Borrowed(coefficient),
            Self::Owned(coefficient) => Coefficient::Owned(Arc::from(coefficient)),
        }
    }
}

impl<'a> SpatialCoefficientSource<'a> {
    pub fn borrowed(coefficient: &'a (impl SpatialFunction + 'a)) -> Self {
        Self::Borrowed(coefficient)
    }

    pub fn owned(coefficient: impl SpatialFunction + 'a) -> Self {
        Self::Owned(Box::new(coefficient))
    }

    pub fn resolve(self) -> SpatialCoefficient<'a> {
        match self {
            Self::NotProvided => Coefficient::Owned(Arc::new(Constant(1.0))),
            Self::Borrowed(coefficient) => Coefficient::Borrowed(coefficient),
            Self::Owned(coefficient) => Coefficient::Owned(Arc::from(coefficient)),
        }
    }
}

/// A coefficient held by a term.
///
/// Owned coefficients are reference counted so that cloned terms share the (immutable) model
/// instead of copying it. The coefficient is released together with the last term using it.
#[derive(Debug)]
pub enum Coefficient<'a, F: ?Sized> {
    Borrowed(&'a F),
    Owned(Arc<F>),
}

pub type FieldCoefficient<'a> = Coefficient<'a, dyn FieldFunction + 'a>;
pub type SpatialCoefficient<'a> = Coefficient<'a, dyn SpatialFunction + 'a>;

impl<'a, F: ?Sized> Coefficient<'a, F> {
    pub fn is_owned(&self) -> bool {
        matches!(self, Self::Owned(_))
    }
}

impl<'a, F: ?Sized> Clone for Coefficient<'a, F> {
    fn clone(&self) -> Self {
        match self {
            Self::Borrowed(coefficient) => Self::Borrowed(*coefficient),
            Self::Owned(coefficient) => Self::Owned(Arc::clone(coefficient)),
        }
    }
}

impl<'a, F: ?Sized> Deref for Coefficient<'a, F> {
    type Target = F;

    fn deref(&self) -> &F {
        match self {
            Self::Borrowed(coefficient) => coefficient,
            Self::Owned(coefficient) => coefficient,
        }
    }
}
