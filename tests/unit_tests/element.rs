use matrixcompare::{assert_matrix_eq, assert_scalar_eq};
use nalgebra::{Matrix2, Point2, Vector2};
use proptest::prelude::*;
use weakforms::config::ConfigurationError;
use weakforms::element::{edge_reference_point, LagrangeQuad, Quad4Geometry};

fn point_in_quad_ref_domain() -> impl Strategy<Value = Point2<f64>> {
    let r = -1.0..=1.0;
    [r.clone(), r].prop_map(|[x, y]| Point2::new(x, y))
}

fn basis(degree: usize) -> LagrangeQuad {
    LagrangeQuad::new(degree).unwrap()
}

#[test]
fn only_linear_and_quadratic_elements_exist() {
    assert_eq!(LagrangeQuad::new(0), Err(ConfigurationError::UnsupportedPolynomialDegree(0)));
    assert_eq!(LagrangeQuad::new(3), Err(ConfigurationError::UnsupportedPolynomialDegree(3)));
    assert_eq!(basis(1).num_nodes(), 4);
    assert_eq!(basis(2).num_nodes(), 9);
}

#[test]
fn basis_functions_are_nodal() {
    for degree in [1, 2] {
        let element = basis(degree);
        let n = element.num_nodes();
        let mut values = vec![0.0; n];
        for k in 0..n {
            element.populate_basis(&mut values, &element.reference_node(k));
            for (l, &value) in values.iter().enumerate() {
                let expected = if k == l { 1.0 } else { 0.0 };
                assert_scalar_eq!(value, expected, comp = abs, tol = 1e-14);
            }
        }
    }
}

#[test]
fn node_classification_covers_every_node_once() {
    for degree in [1, 2] {
        let element = basis(degree);
        let mut nodes: Vec<usize> = (0..4).map(|c| element.corner_node(c)).collect();
        for edge in 0..4 {
            nodes.extend(element.edge_interior_nodes(edge));
        }
        nodes.extend(element.interior_nodes());
        nodes.sort_unstable();
        assert_eq!(nodes, (0..element.num_nodes()).collect::<Vec<_>>());
    }

    let q2 = basis(2);
    assert_eq!(q2.edge_nodes(0), vec![0, 1, 2]);
    assert_eq!(q2.edge_nodes(1), vec![2, 5, 8]);
    assert_eq!(q2.edge_nodes(2), vec![8, 7, 6]);
    assert_eq!(q2.edge_nodes(3), vec![6, 3, 0]);
    assert_eq!(q2.interior_nodes(), vec![4]);
}

#[test]
fn edge_nodes_lie_on_their_edge() {
    for degree in [1, 2] {
        let element = basis(degree);
        for edge in 0..4 {
            let start = edge_reference_point(edge, -1.0);
            let end = edge_reference_point(edge, 1.0);
            for node in element.edge_nodes(edge) {
                let p = element.reference_node(node);
                let cross = (end - start).perp(&(p - start));
                assert_scalar_eq!(cross, 0.0, comp = abs, tol = 1e-14);
            }
        }
    }
}

#[test]
fn reference_geometry_is_identity() {
    let geometry = Quad4Geometry::reference();
    let xi = Point2::new(0.3, -0.7);
    assert_matrix_eq!(geometry.map_reference_coords(&xi).coords, xi.coords, comp = abs, tol = 1e-14);
    assert_matrix_eq!(geometry.reference_jacobian(&xi), Matrix2::identity(), comp = abs, tol = 1e-14);
}

#[test]
fn rectangle_geometry_has_constant_jacobian_and_outward_normals() {
    let geometry = Quad4Geometry::from_vertices([
        Point2::new(1.0, 2.0),
        Point2::new(5.0, 2.0),
        Point2::new(5.0, 3.0),
        Point2::new(1.0, 3.0),
    ]);
    let expected = Matrix2::new(2.0, 0.0, 0.0, 0.5);
    assert_matrix_eq!(geometry.reference_jacobian(&Point2::new(0.9, -0.2)), expected, comp = abs, tol = 1e-14);
    assert_eq!(geometry.map_reference_coords(&Point2::new(-1.0, -1.0)), Point2::new(1.0, 2.0));

    let (normal, tangent, length) = geometry.edge_frame(0);
    assert_eq!(normal, Vector2::new(0.0, -1.0));
    assert_eq!(tangent, Vector2::new(1.0, 0.0));
    assert_eq!(length, 4.0);
    let (normal, _, length) = geometry.edge_frame(1);
    assert_eq!(normal, Vector2::new(1.0, 0.0));
    assert_eq!(length, 1.0);
    let (normal, _, _) = geometry.edge_frame(3);
    assert_eq!(normal, Vector2::new(-1.0, 0.0));
    assert_scalar_eq!(geometry.diameter(), 17.0f64.sqrt(), comp = abs, tol = 1e-14);
}

#[test]
fn edge_parametrization_maps_onto_edge_vertices() {
    let geometry = Quad4Geometry::from_vertices([
        Point2::new(0.0, 0.0),
        Point2::new(2.0, 0.2),
        Point2::new(2.5, 1.5),
        Point2::new(-0.2, 1.0),
    ]);
    for edge in 0..4 {
        let (a, b) = geometry.edge_vertices(edge);
        let start = geometry.map_reference_coords(&edge_reference_point(edge, -1.0));
        let end = geometry.map_reference_coords(&edge_reference_point(edge, 1.0));
        assert_matrix_eq!(start.coords, a.coords, comp = abs, tol = 1e-14);
        assert_matrix_eq!(end.coords, b.coords, comp = abs, tol = 1e-14);
    }
}

proptest! {
    #[test]
    fn basis_is_partition_of_unity(xi in point_in_quad_ref_domain()) {
        for degree in [1, 2] {
            let element = basis(degree);
            let mut values = vec![0.0; element.num_nodes()];
            let mut gradients = vec![Vector2::zeros(); element.num_nodes()];
            element.populate_basis(&mut values, &xi);
            element.populate_basis_gradients(&mut gradients, &xi);

            let sum: f64 = values.iter().sum();
            let gradient_sum: Vector2<f64> = gradients.iter().sum();
            prop_assert!((sum - 1.0).abs() < 1e-13);
            prop_assert!(gradient_sum.norm() < 1e-13);
        }
    }

    #[test]
    fn basis_gradients_match_finite_differences(xi in point_in_quad_ref_domain()) {
        let h = 1e-6;
        for degree in [1, 2] {
            let element = basis(degree);
            let n = element.num_nodes();
            let mut gradients = vec![Vector2::zeros(); n];
            element.populate_basis_gradients(&mut gradients, &xi);

            let mut plus = vec![0.0; n];
            let mut minus = vec![0.0; n];
            for (d, offset) in [Vector2::new(h, 0.0), Vector2::new(0.0, h)].into_iter().enumerate() {
                element.populate_basis(&mut plus, &(xi + offset));
                element.populate_basis(&mut minus, &(xi - offset));
                for k in 0..n {
                    let fd = (plus[k] - minus[k]) / (2.0 * h);
                    prop_assert!((gradients[k][d] - fd).abs() < 1e-8);
                }
            }
        }
    }
}
