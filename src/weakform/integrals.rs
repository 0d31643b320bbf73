//! Quadrature-point integrands shared by the term library.
//!
//! Every term writes its integrand once, generically over [`FormValue`], and evaluates it
//! both numerically (`f64`) and symbolically ([`Order`]). The geometry factor of axisymmetric
//! problems is applied through [`GeometryMode::factor`] only.
use crate::coefficient::{FieldFunction, SpatialFunction};
use crate::order::Order;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::ops::{Add, Mul};

/// Scalar algebra in which integrands are evaluated.
pub trait FormValue: Copy + Debug + Add<Output = Self> + Mul<Output = Self> {
    fn zero() -> Self;

    /// Embeds a constant.
    fn constant(c: f64) -> Self;

    /// Scales by a quadrature weight.
    fn weighted(self, weight: f64) -> Self;

    fn field(function: &dyn FieldFunction, u: Self) -> Self;

    fn field_derivative(function: &dyn FieldFunction, u: Self) -> Self;

    fn spatial(function: &dyn SpatialFunction, x: Self, y: Self) -> Self;
}

impl FormValue for f64 {
    fn zero() -> Self {
        0.0
    }

    fn constant(c: f64) -> Self {
        c
    }

    fn weighted(self, weight: f64) -> Self {
        weight * self
    }

    fn field(function: &dyn FieldFunction, u: Self) -> Self {
        function.value(u)
    }

    fn field_derivative(function: &dyn FieldFunction, u: Self) -> Self {
        function.derivative(u)
    }

    fn spatial(function: &dyn SpatialFunction, x: Self, y: Self) -> Self {
        function.value(x, y)
    }
}

impl FormValue for Order {
    fn zero() -> Self {
        Order::ZERO
    }

    fn constant(_c: f64) -> Self {
        Order::ZERO
    }

    fn weighted(self, _weight: f64) -> Self {
        self
    }

    fn field(function: &dyn FieldFunction, u: Self) -> Self {
        function.order(u)
    }

    fn field_derivative(function: &dyn FieldFunction, u: Self) -> Self {
        function.derivative_order(u)
    }

    fn spatial(function: &dyn SpatialFunction, x: Self, y: Self) -> Self {
        function.order(x, y)
    }
}

/// Values and first derivatives of a function at the quadrature points.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldSamples<V> {
    pub val: Vec<V>,
    pub dx: Vec<V>,
    pub dy: Vec<V>,
}

impl<V: Copy> FieldSamples<V> {
    pub fn new(val: Vec<V>, dx: Vec<V>, dy: Vec<V>) -> Self {
        assert_eq!(val.len(), dx.len());
        assert_eq!(val.len(), dy.len());
        Self { val, dx, dy }
    }

    /// The same value and derivatives at `n` points.
    pub fn uniform(n: usize, val: V, dx: V, dy: V) -> Self {
        Self {
            val: vec![val; n],
            dx: vec![dx; n],
            dy: vec![dy; n],
        }
    }

    pub fn len(&self) -> usize {
        self.val.len()
    }

    pub fn is_empty(&self) -> bool {
        self.val.is_empty()
    }

    pub fn clear(&mut self) {
        self.val.clear();
        self.dx.clear();
        self.dy.clear();
    }

    pub fn push(&mut self, val: V, dx: V, dy: V) {
        self.val.push(val);
        self.dx.push(dx);
        self.dy.push(dy);
    }
}

impl FieldSamples<Order> {
    /// A single symbolic sample of a polynomial of the given order.
    pub fn of_order(order: Order) -> Self {
        Self::uniform(1, order, order, order)
    }
}

/// Physical coordinates at the quadrature points.
///
/// Normals and tangents are only populated on boundary edges.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeomSamples<V> {
    pub x: Vec<V>,
    pub y: Vec<V>,
    pub nx: Vec<V>,
    pub ny: Vec<V>,
    pub tx: Vec<V>,
    pub ty: Vec<V>,
}

impl<V: Copy> GeomSamples<V> {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn clear(&mut self) {
        self.x.clear();
        self.y.clear();
        self.nx.clear();
        self.ny.clear();
        self.tx.clear();
        self.ty.clear();
    }

    pub fn push_point(&mut self, x: V, y: V) {
        self.x.push(x);
        self.y.push(y);
    }

    pub fn push_edge_point(&mut self, x: V, y: V, normal: [V; 2], tangent: [V; 2]) {
        self.push_point(x, y);
        self.nx.push(normal[0]);
        self.ny.push(normal[1]);
        self.tx.push(tangent[0]);
        self.ty.push(tangent[1]);
    }
}

impl GeomSamples<Order> {
    /// Symbolic geometry of a straight-sided element: coordinates are linear, normals and
    /// tangents constant.
    pub fn symbolic(boundary: bool) -> Self {
        let mut e = Self::default();
        let linear = Order::new(1);
        if boundary {
            e.push_edge_point(linear, linear, [Order::ZERO; 2], [Order::ZERO; 2]);
        } else {
            e.push_point(linear, linear);
        }
        e
    }
}

/// Planar or axisymmetric formulation of a two-dimensional problem.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GeometryMode {
    #[default]
    Planar,
    /// Rotational symmetry about the x-axis. The radial coordinate is `y`.
    AxisymX,
    /// Rotational symmetry about the y-axis. The radial coordinate is `x`.
    AxisymY,
}

impl GeometryMode {
    /// The measure factor of the formulation at quadrature point `i`.
    ///
    /// Every term multiplies its integrand by this factor, both numerically and symbolically.
    pub fn factor<V: FormValue>(&self, e: &GeomSamples<V>, i: usize) -> V {
        match self {
            GeometryMode::Planar => V::constant(1.0),
            GeometryMode::AxisymX => e.y[i],
            GeometryMode::AxisymY => e.x[i],
        }
    }

    pub fn is_planar(&self) -> bool {
        matches!(self, GeometryMode::Planar)
    }
}

/// Weighted sum `Σ_i wt[i] * integrand(i)` over the quadrature points.
pub fn integrate<V: FormValue>(wt: &[f64], mut integrand: impl FnMut(usize) -> V) -> V {
    wt.iter()
        .enumerate()
        .fold(V::zero(), |acc, (i, &w)| acc + integrand(i).weighted(w))
}

/// `∫ v`, including the geometry factor.
pub fn int_v<V: FormValue>(wt: &[f64], v: &FieldSamples<V>, e: &GeomSamples<V>, geometry: GeometryMode) -> V {
    integrate(wt, |i| geometry.factor(e, i) * v.val[i])
}

/// `∫ u v`, including the geometry factor.
pub fn int_u_v<V: FormValue>(
    wt: &[f64],
    u: &FieldSamples<V>,
    v: &FieldSamples<V>,
    e: &GeomSamples<V>,
    geometry: GeometryMode,
) -> V {
    integrate(wt, |i| geometry.factor(e, i) * u.val[i] * v.val[i])
}

/// `∫ ∇u · ∇v`, including the geometry factor.
pub fn int_grad_u_grad_v<V: FormValue>(
    wt: &[f64],
    u: &FieldSamples<V>,
    v: &FieldSamples<V>,
    e: &GeomSamples<V>,
    geometry: GeometryMode,
) -> V {
    integrate(wt, |i| geometry.factor(e, i) * grad_dot(u, v, i))
}

/// `∇u · ∇v` at quadrature point `i`.
pub fn grad_dot<V: FormValue>(u: &FieldSamples<V>, v: &FieldSamples<V>, i: usize) -> V {
    u.dx[i] * v.dx[i] + u.dy[i] * v.dy[i]
}
