use weakforms::coefficient::{Constant, FieldCoefficientSource, Polynomial, SpatialCoefficientSource};
use weakforms::config::ConfigurationError;
use weakforms::weakform::*;

fn mass(i: usize, j: usize) -> DefaultMatrixFormVol<'static> {
    DefaultMatrixFormVol::new(
        i,
        j,
        Area::Any,
        1.0,
        SpatialCoefficientSource::NotProvided,
        SymFlag::Symmetric,
        GeometryMode::Planar,
    )
}

fn load(i: usize) -> DefaultVectorFormVol<'static> {
    DefaultVectorFormVol::new(i, Area::Any, 1.0, SpatialCoefficientSource::NotProvided, GeometryMode::Planar)
}

#[test]
fn form_indices_are_validated() {
    let mut weak_form = WeakForm::new(2);
    assert!(weak_form.add_matrix_form(mass(1, 0)).is_ok());
    assert_eq!(
        weak_form.add_matrix_form(mass(0, 2)).unwrap_err(),
        ConfigurationError::FormIndexOutOfBounds {
            index: 2,
            num_equations: 2
        }
    );
    assert_eq!(
        weak_form.add_vector_form(load(5)).unwrap_err(),
        ConfigurationError::FormIndexOutOfBounds {
            index: 5,
            num_equations: 2
        }
    );
    let multi = DefaultMultiComponentVectorFormSurf::new(vec![0, 3], Area::Any, vec![1.0, 1.0], GeometryMode::Planar)
        .unwrap();
    assert!(weak_form.add_multi_component_vector_form(multi).is_err());

    // Rejected forms are not registered
    assert_eq!(weak_form.matrix_forms().len(), 1);
    assert!(weak_form.vector_forms().is_empty());
    assert!(weak_form.multi_component_vector_forms().is_empty());
    assert!(!weak_form.has_surface_forms());
}

#[test]
fn boxed_forms_and_surface_detection() {
    let mut weak_form = WeakForm::new(1);
    weak_form
        .add_boxed_matrix_form(Box::new(mass(0, 0)))
        .unwrap()
        .add_boxed_vector_form(Box::new(DefaultVectorFormSurf::new(
            0,
            "right",
            1.0,
            SpatialCoefficientSource::NotProvided,
            GeometryMode::Planar,
        )))
        .unwrap();
    assert_eq!(weak_form.neq(), 1);
    assert!(weak_form.has_surface_forms());
    assert_eq!(weak_form.vector_forms()[0].header().area, Area::marker("right"));
}

#[test]
fn cloned_weak_form_keeps_every_term() {
    let mut weak_form = WeakForm::new(2);
    weak_form
        .add_matrix_form(mass(0, 1))
        .unwrap()
        .add_vector_form(load(1))
        .unwrap();
    let clone = weak_form.clone();
    drop(weak_form);
    assert_eq!(clone.matrix_forms().len(), 1);
    assert_eq!(clone.matrix_forms()[0].header().j, 1);
    assert_eq!(clone.vector_forms()[0].header().i, 1);
}

#[test]
fn areas_match_markers() {
    assert!(Area::Any.contains("anything"));
    assert!(Area::marker("a").contains("a"));
    assert!(!Area::marker("a").contains("b"));
    assert!(Area::markers(vec!["a", "b"]).contains("b"));
    assert_eq!(Area::from("a"), Area::Markers(vec!["a".to_string()]));
    assert_eq!(Area::default(), Area::Any);
}

#[test]
fn laplace_is_symmetric_only_for_constant_conductivity() {
    let linear = DefaultWeakFormLaplace::new(
        Area::Any,
        2.0,
        FieldCoefficientSource::owned(Constant(3.0)),
        GeometryMode::Planar,
    );
    assert_eq!(linear.matrix_forms().len(), 1);
    assert_eq!(linear.vector_forms().len(), 1);
    assert_eq!(linear.matrix_forms()[0].header().sym, SymFlag::Symmetric);

    let default = DefaultWeakFormLaplace::new(Area::Any, 1.0, FieldCoefficientSource::NotProvided, GeometryMode::AxisymX);
    assert_eq!(default.matrix_forms()[0].header().sym, SymFlag::Symmetric);

    let kappa = Polynomial::new(vec![1.0, 0.0, 1.0]);
    let nonlinear = DefaultWeakFormLaplace::new("domain", 1.0, FieldCoefficientSource::borrowed(&kappa), GeometryMode::Planar);
    let header = nonlinear.matrix_forms()[0].header();
    assert_eq!(header.sym, SymFlag::NonSymmetric);
    assert_eq!(header.area, Area::marker("domain"));

    let weak_form: WeakForm = nonlinear.into();
    assert_eq!(weak_form.neq(), 1);
}

#[test]
fn poisson_adds_source_term() {
    let poisson = DefaultWeakFormPoisson::new(
        Area::Any,
        1.0,
        FieldCoefficientSource::NotProvided,
        SpatialCoefficientSource::owned(Constant(4.0)),
        GeometryMode::Planar,
    );
    assert_eq!(poisson.matrix_forms().len(), 1);
    assert_eq!(poisson.vector_forms().len(), 2);
    assert_eq!(poisson.matrix_forms()[0].header().domain, Domain::Volume);

    // With u = 0 only the source contributes: -∫ 4 v
    let wt = [0.5, 0.5];
    let zero = FieldSamples::uniform(2, 0.0, 0.0, 0.0);
    let v = FieldSamples::uniform(2, 1.0, 0.0, 0.0);
    let mut e = GeomSamples::default();
    e.push_point(0.0, 0.0);
    e.push_point(1.0, 0.0);
    let total: f64 = poisson
        .vector_forms()
        .iter()
        .map(|form| form.value(&wt, &[zero.clone()], &v, &e))
        .sum();
    assert_eq!(total, -4.0);

    let weak_form = poisson.into_weak_form();
    assert_eq!(weak_form.vector_forms().len(), 2);
}
