//! Proptest strategies for the types of this crate.
use crate::coefficient::CubicSpline;
use crate::mesh::procedural::create_tensor_product_quad_mesh_2d;
use crate::mesh::QuadMesh2d;
use crate::order::Order;
use crate::weakform::{FieldSamples, GeomSamples};
use ::proptest::collection::vec;
use ::proptest::prelude::*;
use nalgebra::Point2;

pub fn point2() -> impl Strategy<Value = Point2<f64>> {
    // Keep coordinates moderate, so that products of several samples stay well conditioned
    let range = -10.0..10.0;
    [range.clone(), range].prop_map(|[x, y]| Point2::new(x, y))
}

impl Arbitrary for Order {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        (0..40u32).prop_map(Order::new).boxed()
    }
}

/// Values and derivatives at `n` points, drawn from `[-2, 2]`.
pub fn field_samples(n: usize) -> impl Strategy<Value = FieldSamples<f64>> {
    let values = || vec(-2.0..2.0, n);
    (values(), values(), values()).prop_map(|(val, dx, dy)| FieldSamples::new(val, dx, dy))
}

/// Coordinates at `n` points with strictly positive radial coordinates, plus unit normals
/// and tangents.
pub fn geom_samples(n: usize) -> impl Strategy<Value = GeomSamples<f64>> {
    (vec(0.1..5.0, n), vec(0.1..5.0, n), vec(0.0..std::f64::consts::TAU, n)).prop_map(|(xs, ys, angles)| {
        let mut e = GeomSamples::default();
        for ((x, y), angle) in xs.into_iter().zip(ys).zip(angles) {
            let (s, c) = angle.sin_cos();
            e.push_edge_point(x, y, [c, s], [-s, c]);
        }
        e
    })
}

/// Positive quadrature weights at `n` points.
pub fn weights(n: usize) -> impl Strategy<Value = Vec<f64>> {
    vec(0.01..1.0, n)
}

/// A natural spline through a table with strictly increasing abscissae.
pub fn cubic_spline() -> impl Strategy<Value = CubicSpline> {
    (2..8usize)
        .prop_flat_map(|n| (vec(0.1..2.0, n), vec(-5.0..5.0, n), -5.0..5.0))
        .prop_filter_map("spline table must be valid", |(gaps, values, start)| {
            let points: Vec<f64> = gaps
                .iter()
                .scan(start, |x, gap| {
                    *x += gap;
                    Some(*x)
                })
                .collect();
            CubicSpline::natural(points, values).ok()
        })
}

/// A tensor-product mesh of `[0, 1]^2` with randomly spaced grid lines.
pub fn tensor_product_mesh() -> impl Strategy<Value = QuadMesh2d> {
    let gaps = || vec(0.2..1.0, 1..5);
    (gaps(), gaps()).prop_map(|(x_gaps, y_gaps)| {
        let coordinates = |gaps: Vec<f64>| {
            let total: f64 = gaps.iter().sum();
            let mut coords = vec![0.0];
            coords.extend(gaps.iter().scan(0.0, |x, gap| {
                *x += gap / total;
                Some(*x)
            }));
            coords
        };
        create_tensor_product_quad_mesh_2d(&coordinates(x_gaps), &coordinates(y_gaps))
    })
}
