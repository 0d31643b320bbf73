use matrixcompare::assert_scalar_eq;
use proptest::prelude::*;
use weakforms::order::Order;
use weakforms::proptest::{field_samples, geom_samples, weights};
use weakforms::weakform::{
    grad_dot, int_grad_u_grad_v, int_u_v, int_v, integrate, FieldSamples, GeomSamples, GeometryMode,
};

fn samples_at(points: &[(f64, f64)]) -> GeomSamples<f64> {
    let mut e = GeomSamples::default();
    for &(x, y) in points {
        e.push_point(x, y);
    }
    e
}

#[test]
fn geometry_factor_selects_radial_coordinate() {
    let e = samples_at(&[(2.0, 3.0), (5.0, 7.0)]);
    assert_eq!(GeometryMode::Planar.factor(&e, 1), 1.0);
    assert_eq!(GeometryMode::AxisymX.factor(&e, 1), 7.0);
    assert_eq!(GeometryMode::AxisymY.factor(&e, 1), 5.0);
    assert!(GeometryMode::Planar.is_planar());
    assert!(!GeometryMode::AxisymX.is_planar());
    assert_eq!(GeometryMode::default(), GeometryMode::Planar);
}

#[test]
fn symbolic_geometry_factor_raises_order_only_in_axisymmetric_modes() {
    let e = GeomSamples::<Order>::symbolic(false);
    assert_eq!(GeometryMode::Planar.factor(&e, 0), Order::ZERO);
    assert_eq!(GeometryMode::AxisymX.factor(&e, 0), Order::new(1));
    assert_eq!(GeometryMode::AxisymY.factor(&e, 0), Order::new(1));

    let edge = GeomSamples::<Order>::symbolic(true);
    assert_eq!(edge.nx, vec![Order::ZERO]);
    assert_eq!(edge.tx, vec![Order::ZERO]);
}

#[test]
fn integrals_match_hand_computed_sums() {
    let wt = [0.5, 0.25];
    let u = FieldSamples::new(vec![1.0, 2.0], vec![3.0, -1.0], vec![0.0, 4.0]);
    let v = FieldSamples::new(vec![2.0, -1.0], vec![1.0, 1.0], vec![2.0, 0.5]);
    let e = samples_at(&[(1.0, 2.0), (3.0, 4.0)]);

    assert_scalar_eq!(int_v(&wt, &v, &e, GeometryMode::Planar), 0.75, comp = abs, tol = 1e-14);
    assert_scalar_eq!(int_v(&wt, &v, &e, GeometryMode::AxisymX), 1.0, comp = abs, tol = 1e-14);
    assert_scalar_eq!(int_u_v(&wt, &u, &v, &e, GeometryMode::Planar), 0.5, comp = abs, tol = 1e-14);
    assert_scalar_eq!(grad_dot(&u, &v, 1), 1.0, comp = abs, tol = 1e-14);
    assert_scalar_eq!(
        int_grad_u_grad_v(&wt, &u, &v, &e, GeometryMode::AxisymY),
        0.5 * 1.0 * 3.0 + 0.25 * 3.0 * 1.0,
        comp = abs,
        tol = 1e-14
    );
    assert_scalar_eq!(integrate(&wt, |i| u.val[i]), 1.0, comp = abs, tol = 1e-14);
}

#[test]
fn symbolic_integrals_combine_orders() {
    let wt = [1.0];
    let u = FieldSamples::<Order>::of_order(Order::new(2));
    let v = FieldSamples::<Order>::of_order(Order::new(3));
    let e = GeomSamples::<Order>::symbolic(false);
    assert_eq!(int_u_v(&wt, &u, &v, &e, GeometryMode::Planar), Order::new(5));
    assert_eq!(int_u_v(&wt, &u, &v, &e, GeometryMode::AxisymX), Order::new(6));
    assert_eq!(int_grad_u_grad_v(&wt, &u, &v, &e, GeometryMode::Planar), Order::new(5));
}

#[test]
fn field_samples_containers() {
    let mut samples = FieldSamples::uniform(3, 1.0, 2.0, 3.0);
    assert_eq!(samples.len(), 3);
    samples.clear();
    assert!(samples.is_empty());
    samples.push(4.0, 5.0, 6.0);
    assert_eq!(samples, FieldSamples::new(vec![4.0], vec![5.0], vec![6.0]));
}

proptest! {
    #[test]
    fn axisymmetric_integrals_reduce_to_planar_at_unit_radius(
        (wt, u, v, mut e) in (1..6usize).prop_flat_map(|n| (weights(n), field_samples(n), field_samples(n), geom_samples(n)))
    ) {
        let planar = int_grad_u_grad_v(&wt, &u, &v, &e, GeometryMode::Planar);
        let planar_mass = int_u_v(&wt, &u, &v, &e, GeometryMode::Planar);

        e.y.iter_mut().for_each(|y| *y = 1.0);
        let axisym_x = int_grad_u_grad_v(&wt, &u, &v, &e, GeometryMode::AxisymX);
        prop_assert!((planar - axisym_x).abs() <= 1e-12 * (1.0 + planar.abs()));

        e.x.iter_mut().for_each(|x| *x = 1.0);
        let axisym_y = int_u_v(&wt, &u, &v, &e, GeometryMode::AxisymY);
        prop_assert!((planar_mass - axisym_y).abs() <= 1e-12 * (1.0 + planar_mass.abs()));
    }
}
