use matrixcompare::{assert_matrix_eq, assert_scalar_eq};
use nalgebra::{DMatrix, DVector, DVectorView, DVectorViewMut};
use weakforms::assembly::{quadrature_points_for_order, DiscreteProblem};
use weakforms::coefficient::{Constant, FieldCoefficientSource, Polynomial, SpatialCoefficientSource, SpatialFn};
use weakforms::config::ConfigurationError;
use weakforms::mesh::procedural::{create_tensor_product_quad_mesh_2d, create_unit_square_uniform_quad_mesh_2d};
use weakforms::mesh::QuadMesh2d;
use weakforms::optimize::calculus::approximate_jacobian_fd;
use weakforms::order::Order;
use weakforms::space::{DirichletBoundary, H1Space};
use weakforms::weakform::*;

/// Skew-symmetric transport `∫ ∂ₓu v - u ∂ₓv`.
#[derive(Debug, Clone)]
struct SkewTransport {
    header: MatrixFormHeader,
}

impl SkewTransport {
    fn new(sym: SymFlag) -> Self {
        Self {
            header: MatrixFormHeader {
                i: 0,
                j: 0,
                area: Area::Any,
                sym,
                domain: Domain::Volume,
            },
        }
    }
}

impl<'a> MatrixForm<'a> for SkewTransport {
    fn header(&self) -> &MatrixFormHeader {
        &self.header
    }

    fn value(
        &self,
        wt: &[f64],
        _u_ext: &[FieldSamples<f64>],
        u: &FieldSamples<f64>,
        v: &FieldSamples<f64>,
        _e: &GeomSamples<f64>,
    ) -> f64 {
        integrate(wt, |k| u.dx[k] * v.val[k] - u.val[k] * v.dx[k])
    }

    fn order(
        &self,
        _u_ext: &[FieldSamples<Order>],
        u: &FieldSamples<Order>,
        v: &FieldSamples<Order>,
        _e: &GeomSamples<Order>,
    ) -> Order {
        u.dx[0] * v.val[0] + u.val[0] * v.dx[0]
    }

    fn clone_form(&self) -> Box<dyn MatrixForm<'a> + 'a> {
        Box::new(self.clone())
    }
}

/// A mesh away from the axes, so that axisymmetric weights stay positive.
fn shifted_mesh() -> QuadMesh2d {
    create_tensor_product_quad_mesh_2d(&[0.5, 0.9, 1.5], &[0.2, 0.7, 1.2])
}

fn sample_coefficients(n: usize) -> DVector<f64> {
    DVector::from_fn(n, |i, _| 0.3 + 0.5 * (1.7 * i as f64).sin())
}

fn finite_difference_jacobian(problem: &DiscreteProblem, x: &DVector<f64>) -> DMatrix<f64> {
    let mut x = x.clone();
    let residual = |x: DVectorView<f64>, mut r: DVectorViewMut<f64>| {
        r.copy_from(&problem.assemble_residual(x).unwrap());
    };
    approximate_jacobian_fd(problem.num_dofs(), residual, &mut x, 1e-6)
}

fn assert_jacobian_matches_residual(weak_form: &WeakForm, degree: usize) {
    let mesh = shifted_mesh();
    let g = SpatialFn::new(1, |x, y| 0.5 * x - y);
    let dirichlet = [DirichletBoundary::new("left", SpatialCoefficientSource::borrowed(&g))];
    let space = H1Space::with_dirichlet(&mesh, degree, &dirichlet).unwrap();
    let problem = DiscreteProblem::new(weak_form, vec![&space]).unwrap();

    let x = sample_coefficients(problem.num_dofs());
    let (jacobian, residual) = problem.assemble(x.as_view()).unwrap();
    let jacobian = DMatrix::from(&jacobian);
    let fd = finite_difference_jacobian(&problem, &x);
    assert_matrix_eq!(jacobian, fd, comp = abs, tol = 1e-6);

    let residual_only = problem.assemble_residual(x.as_view()).unwrap();
    assert_matrix_eq!(residual, residual_only, comp = abs, tol = 1e-14);
}

fn nonlinear_weak_form<'a>(kappa: &'a Polynomial, geometry: GeometryMode) -> WeakForm<'a> {
    let g = || SpatialCoefficientSource::owned(SpatialFn::new(1, |x, _y| 1.0 + x));
    let mut weak_form = WeakForm::new(1);
    weak_form
        .add_matrix_form(DefaultJacobianDiffusion::new(
            0,
            0,
            Area::Any,
            1.5,
            FieldCoefficientSource::borrowed(kappa),
            SymFlag::NonSymmetric,
            geometry,
        ))
        .unwrap()
        .add_vector_form(DefaultResidualDiffusion::new(
            0,
            Area::Any,
            1.5,
            FieldCoefficientSource::borrowed(kappa),
            geometry,
        ))
        .unwrap()
        .add_matrix_form(DefaultMatrixFormVol::new(
            0,
            0,
            Area::Any,
            0.5,
            SpatialCoefficientSource::NotProvided,
            SymFlag::Symmetric,
            geometry,
        ))
        .unwrap()
        .add_vector_form(DefaultResidualVol::new(
            0,
            Area::Any,
            0.5,
            SpatialCoefficientSource::NotProvided,
            geometry,
        ))
        .unwrap()
        .add_matrix_form(DefaultJacobianFormSurf::new(
            0,
            0,
            Area::markers(["right", "top"]),
            2.0,
            FieldCoefficientSource::borrowed(kappa),
            geometry,
        ))
        .unwrap()
        .add_vector_form(DefaultResidualFormSurf::new(
            0,
            Area::markers(["right", "top"]),
            2.0,
            FieldCoefficientSource::borrowed(kappa),
            geometry,
        ))
        .unwrap()
        .add_matrix_form(DefaultMatrixFormSurf::new(0, 0, "bottom", 0.7, g(), geometry))
        .unwrap()
        .add_vector_form(DefaultResidualSurf::new(0, "bottom", 0.7, g(), geometry))
        .unwrap()
        .add_vector_form(DefaultVectorFormVol::new(
            0,
            Area::Any,
            -3.0,
            SpatialCoefficientSource::NotProvided,
            geometry,
        ))
        .unwrap();
    weak_form
}

#[test]
fn jacobian_is_derivative_of_residual_in_every_geometry() {
    let kappa = Polynomial::new(vec![1.0, 0.5, 1.0]);
    for geometry in [GeometryMode::Planar, GeometryMode::AxisymX, GeometryMode::AxisymY] {
        let weak_form = nonlinear_weak_form(&kappa, geometry);
        assert_jacobian_matches_residual(&weak_form, 1);
        assert_jacobian_matches_residual(&weak_form, 2);
    }
}

#[test]
fn advection_jacobian_is_derivative_of_residual() {
    let kappa1 = Polynomial::new(vec![1.0, 2.0]);
    let kappa2 = Polynomial::new(vec![0.0, 0.0, 1.0]);
    let mut weak_form = WeakForm::new(1);
    weak_form
        .add_matrix_form(
            DefaultJacobianAdvection::new(
                0,
                0,
                Area::Any,
                1.0,
                -0.5,
                FieldCoefficientSource::borrowed(&kappa1),
                FieldCoefficientSource::borrowed(&kappa2),
                GeometryMode::Planar,
            )
            .unwrap(),
        )
        .unwrap()
        .add_vector_form(
            DefaultResidualAdvection::new(
                0,
                Area::Any,
                1.0,
                -0.5,
                FieldCoefficientSource::borrowed(&kappa1),
                FieldCoefficientSource::borrowed(&kappa2),
                GeometryMode::Planar,
            )
            .unwrap(),
        )
        .unwrap();
    assert_jacobian_matches_residual(&weak_form, 2);
}

#[test]
fn symmetric_forms_are_mirrored_from_upper_triangle() {
    let mesh = shifted_mesh();
    let space = H1Space::with_dirichlet(&mesh, 2, &[DirichletBoundary::zero("top")]).unwrap();

    let laplace = |sym| {
        let mut weak_form = WeakForm::new(1);
        weak_form
            .add_matrix_form(DefaultJacobianDiffusion::new(
                0,
                0,
                Area::Any,
                2.0,
                FieldCoefficientSource::owned(Constant(0.5)),
                sym,
                GeometryMode::AxisymX,
            ))
            .unwrap()
            .add_matrix_form(DefaultMatrixFormVol::new(
                0,
                0,
                Area::Any,
                1.0,
                SpatialCoefficientSource::NotProvided,
                sym,
                GeometryMode::AxisymX,
            ))
            .unwrap();
        weak_form
    };

    let assemble = |weak_form: &WeakForm| {
        let problem = DiscreteProblem::new(weak_form, vec![&space]).unwrap();
        let x = DVector::zeros(problem.num_dofs());
        DMatrix::from(&problem.assemble_jacobian(x.as_view()).unwrap())
    };

    let symmetric = assemble(&laplace(SymFlag::Symmetric));
    let full = assemble(&laplace(SymFlag::NonSymmetric));
    assert_matrix_eq!(symmetric, full, comp = abs, tol = 1e-13);
    // Every local block is mirrored exactly, but duplicate COO entries from different forms
    // may be summed in a different order for (i, j) and (j, i)
    assert_matrix_eq!(symmetric, symmetric.transpose(), comp = abs, tol = 1e-14);
}

#[test]
fn poisson_constant_coefficient_scales_diffusion() {
    let mesh = shifted_mesh();
    let space = H1Space::new(&mesh, 2).unwrap();
    let kappa = Polynomial::new(vec![1.0, 0.0, 1.0]);

    let assemble = |const_coeff: f64| {
        let weak_form = DefaultWeakFormPoisson::new(
            Area::Any,
            const_coeff,
            FieldCoefficientSource::borrowed(&kappa),
            SpatialCoefficientSource::owned(Constant(0.0)),
            GeometryMode::AxisymY,
        );
        let problem = DiscreteProblem::new(&weak_form, vec![&space]).unwrap();
        let x = sample_coefficients(problem.num_dofs());
        let (jacobian, residual) = problem.assemble(x.as_view()).unwrap();
        (DMatrix::from(&jacobian), residual)
    };

    let (unit_jacobian, unit_residual) = assemble(1.0);
    let (jacobian, residual) = assemble(2.5);
    assert!(unit_jacobian.norm() > 0.0 && unit_residual.norm() > 0.0);
    assert_matrix_eq!(jacobian, unit_jacobian * 2.5, comp = abs, tol = 1e-12);
    assert_matrix_eq!(residual, unit_residual * 2.5, comp = abs, tol = 1e-12);
}

#[test]
fn antisymmetric_forms_are_mirrored_with_opposite_sign() {
    let mesh = create_unit_square_uniform_quad_mesh_2d(3);
    let space = H1Space::new(&mesh, 2).unwrap();

    let assemble = |sym| {
        let mut weak_form = WeakForm::new(1);
        weak_form.add_matrix_form(SkewTransport::new(sym)).unwrap();
        let problem = DiscreteProblem::new(&weak_form, vec![&space]).unwrap();
        let x = DVector::zeros(problem.num_dofs());
        DMatrix::from(&problem.assemble_jacobian(x.as_view()).unwrap())
    };

    let antisymmetric = assemble(SymFlag::AntiSymmetric);
    let full = assemble(SymFlag::NonSymmetric);
    assert_matrix_eq!(antisymmetric, full, comp = abs, tol = 1e-13);
    assert_matrix_eq!(antisymmetric, -antisymmetric.transpose(), comp = abs, tol = 0.0);
    assert!(antisymmetric.diagonal().iter().all(|&d| d == 0.0));
}

#[test]
fn load_forms_respect_areas() {
    let mut mesh = shifted_mesh();
    mesh.set_element_marker(0, "inclusion");
    let inclusion_area = 0.4 * 0.5;

    for degree in [1, 2] {
        let space = H1Space::new(&mesh, degree).unwrap();
        let mut weak_form = WeakForm::new(1);
        weak_form
            .add_vector_form(DefaultVectorFormVol::new(
                0,
                "inclusion",
                1.0,
                SpatialCoefficientSource::NotProvided,
                GeometryMode::Planar,
            ))
            .unwrap();
        let problem = DiscreteProblem::new(&weak_form, vec![&space]).unwrap();
        let residual = problem
            .assemble_residual(DVector::zeros(problem.num_dofs()).as_view())
            .unwrap();
        // The basis is a partition of unity, so the entries sum to the integral of 1
        assert_scalar_eq!(residual.sum(), inclusion_area, comp = abs, tol = 1e-13);

        let mut weak_form = WeakForm::new(1);
        weak_form
            .add_vector_form(DefaultVectorFormSurf::new(
                0,
                "right",
                1.0,
                SpatialCoefficientSource::NotProvided,
                GeometryMode::AxisymY,
            ))
            .unwrap();
        let problem = DiscreteProblem::new(&weak_form, vec![&space]).unwrap();
        let residual = problem
            .assemble_residual(DVector::zeros(problem.num_dofs()).as_view())
            .unwrap();
        // ∫ x ds over x = 1.5, y in [0.2, 1.2]
        assert_scalar_eq!(residual.sum(), 1.5, comp = abs, tol = 1e-13);
    }
}

#[test]
fn multi_component_forms_fill_several_blocks() {
    let mesh = create_unit_square_uniform_quad_mesh_2d(2);
    let first = H1Space::new(&mesh, 1).unwrap();
    let second = H1Space::with_dirichlet(&mesh, 1, &[DirichletBoundary::zero("bottom")]).unwrap();

    let mut weak_form = WeakForm::new(2);
    weak_form
        .add_multi_component_vector_form(
            DefaultMultiComponentVectorFormSurf::new(vec![0, 1], "top", vec![2.0, -1.0], GeometryMode::Planar)
                .unwrap(),
        )
        .unwrap();
    let problem = DiscreteProblem::new(&weak_form, vec![&first, &second]).unwrap();
    assert_eq!(problem.offsets(), &[0, 9]);
    assert_eq!(problem.num_dofs(), 15);

    let residual = problem
        .assemble_residual(DVector::zeros(problem.num_dofs()).as_view())
        .unwrap();
    assert_scalar_eq!(residual.rows(0, 9).sum(), 2.0, comp = abs, tol = 1e-14);
    assert_scalar_eq!(residual.rows(9, 6).sum(), -1.0, comp = abs, tol = 1e-14);

    let quadratic = H1Space::new(&mesh, 2).unwrap();
    assert!(matches!(
        DiscreteProblem::new(&weak_form, vec![&first, &quadratic]),
        Err(ConfigurationError::InvalidMultiComponentForm(_))
    ));
}

#[test]
fn problem_configuration_is_validated() {
    let mesh = create_unit_square_uniform_quad_mesh_2d(2);
    let other_mesh = create_unit_square_uniform_quad_mesh_2d(2);
    let space = H1Space::new(&mesh, 1).unwrap();
    let other_space = H1Space::new(&other_mesh, 1).unwrap();

    let weak_form = WeakForm::new(2);
    assert_eq!(
        DiscreteProblem::new(&weak_form, vec![&space]).unwrap_err(),
        ConfigurationError::SpaceCountMismatch { expected: 2, actual: 1 }
    );
    assert_eq!(
        DiscreteProblem::new(&weak_form, vec![&space, &other_space]).unwrap_err(),
        ConfigurationError::MeshMismatch
    );

    let problem = DiscreteProblem::new(&weak_form, vec![&space, &space]).unwrap();
    assert!(problem
        .assemble_residual(DVector::zeros(3).as_view())
        .is_err());
}

#[test]
fn quadrature_points_follow_order() {
    assert_eq!(quadrature_points_for_order(Order::ZERO), 1);
    assert_eq!(quadrature_points_for_order(Order::new(1)), 1);
    assert_eq!(quadrature_points_for_order(Order::new(3)), 2);
    assert_eq!(quadrature_points_for_order(Order::new(12)), 7);
    assert_eq!(quadrature_points_for_order(Order::new(39)), 20);
    assert_eq!(quadrature_points_for_order(Order::new(1000)), 20);
}
