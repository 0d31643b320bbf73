//! Functionality for error estimation.
//!
//! Element contributions are independent and are summed in parallel.
use crate::assembly::quadrature_points_for_order;
use crate::coefficient::ExactSolution;
use crate::order::Order;
use crate::quadrature::tensor::quadrilateral_gauss;
use crate::quadrature::Rule2d;
use crate::space::H1Space;
use nalgebra::{DVectorView, Point2};
use rayon::prelude::*;

/// A Gauss rule that is accurate for errors of discrete solutions of `space`.
fn error_rule(space: &H1Space, u: &dyn ExactSolution) -> Rule2d {
    let discrete = Order::new(space.degree() as u32).pow(2);
    quadrilateral_gauss(quadrature_points_for_order(discrete + u.order().pow(2) + Order::new(4)))
}

fn sum_over_elements(
    space: &H1Space,
    u_h: DVectorView<f64>,
    offset: usize,
    rule: &Rule2d,
    error_density: impl Fn(&crate::space::PointEvaluation) -> f64 + Sync,
) -> eyre::Result<f64> {
    let (weights, points) = rule;
    (0..space.mesh().num_elements())
        .into_par_iter()
        .map(|element| {
            let mut nodal_values = Vec::new();
            space.populate_element_values(element, u_h, offset, &mut nodal_values);
            let mut result = 0.0;
            for (w, &[x, y]) in weights.iter().zip(points) {
                let evaluation = space.evaluate_at_reference(element, &nodal_values, &Point2::new(x, y))?;
                result += w * evaluation.jacobian_determinant.abs() * error_density(&evaluation);
            }
            Ok(result)
        })
        .sum()
}

/// Estimate the squared $L^2$ error $\norm{u_h - u}^2_{L^2}$ of the discrete function whose free
/// values are `u_h[offset..offset + space.num_dofs()]`.
#[allow(non_snake_case)]
pub fn estimate_L2_error_squared(
    space: &H1Space,
    u: &dyn ExactSolution,
    u_h: DVectorView<f64>,
    offset: usize,
) -> eyre::Result<f64> {
    let rule = error_rule(space, u);
    sum_over_elements(space, u_h, offset, &rule, |evaluation| {
        let x = &evaluation.point;
        (evaluation.value - u.value(x.x, x.y)).powi(2)
    })
}

/// Estimate the $L^2$ error $\norm{u_h - u}_{L^2}$.
#[allow(non_snake_case)]
pub fn estimate_L2_error(space: &H1Space, u: &dyn ExactSolution, u_h: DVectorView<f64>, offset: usize) -> eyre::Result<f64> {
    estimate_L2_error_squared(space, u, u_h, offset).map(f64::sqrt)
}

/// Estimate the squared $H^1$ *seminorm* error $\seminorm{u_h - u}^2_{H^1}$.
#[allow(non_snake_case)]
pub fn estimate_H1_seminorm_error_squared(
    space: &H1Space,
    u: &dyn ExactSolution,
    u_h: DVectorView<f64>,
    offset: usize,
) -> eyre::Result<f64> {
    let rule = error_rule(space, u);
    sum_over_elements(space, u_h, offset, &rule, |evaluation| {
        let x = &evaluation.point;
        (evaluation.gradient - u.gradient(x.x, x.y)).norm_squared()
    })
}

/// Estimate the $H^1$ *seminorm* error $\seminorm{u_h - u}_{H^1}$.
#[allow(non_snake_case)]
pub fn estimate_H1_seminorm_error(
    space: &H1Space,
    u: &dyn ExactSolution,
    u_h: DVectorView<f64>,
    offset: usize,
) -> eyre::Result<f64> {
    estimate_H1_seminorm_error_squared(space, u, u_h, offset).map(f64::sqrt)
}
