//! Ready-made weak forms for single-unknown diffusion problems.
use crate::coefficient::{FieldCoefficientSource, SpatialCoefficientSource};
use crate::weakform::integrals::GeometryMode;
use crate::weakform::library::{DefaultJacobianDiffusion, DefaultResidualDiffusion, DefaultVectorFormVol};
use crate::weakform::{Area, SymFlag, WeakForm};
use std::ops::Deref;

/// The weak form of `-∇ · (c κ(u) ∇u) = 0`.
///
/// The Jacobian is registered as symmetric when `κ` is constant. Otherwise the linearization of
/// `κ` makes it nonsymmetric.
#[derive(Debug, Clone)]
pub struct DefaultWeakFormLaplace<'a> {
    weak_form: WeakForm<'a>,
}

impl<'a> DefaultWeakFormLaplace<'a> {
    pub fn new(
        area: impl Into<Area>,
        const_coeff: f64,
        coefficient: FieldCoefficientSource<'a>,
        geometry: GeometryMode,
    ) -> Self {
        let area = area.into();
        let kappa = coefficient.resolve();
        let sym = if kappa.is_constant() {
            SymFlag::Symmetric
        } else {
            SymFlag::NonSymmetric
        };

        let mut weak_form = WeakForm::new(1);
        weak_form
            .matrix_forms
            .push(Box::new(DefaultJacobianDiffusion::with_coefficient(
                0,
                0,
                area.clone(),
                const_coeff,
                kappa.clone(),
                sym,
                geometry,
            )));
        weak_form
            .vector_forms
            .push(Box::new(DefaultResidualDiffusion::with_coefficient(
                0,
                area,
                const_coeff,
                kappa,
                geometry,
            )));
        Self { weak_form }
    }

    pub fn into_weak_form(self) -> WeakForm<'a> {
        self.weak_form
    }
}

/// The weak form of `-∇ · (c κ(u) ∇u) = f`.
#[derive(Debug, Clone)]
pub struct DefaultWeakFormPoisson<'a> {
    weak_form: WeakForm<'a>,
}

impl<'a> DefaultWeakFormPoisson<'a> {
    pub fn new(
        area: impl Into<Area>,
        const_coeff: f64,
        coefficient: FieldCoefficientSource<'a>,
        rhs: SpatialCoefficientSource<'a>,
        geometry: GeometryMode,
    ) -> Self {
        let area = area.into();
        let kappa = coefficient.resolve();

        let mut weak_form = WeakForm::new(1);
        weak_form
            .matrix_forms
            .push(Box::new(DefaultJacobianDiffusion::with_coefficient(
                0,
                0,
                area.clone(),
                const_coeff,
                kappa.clone(),
                SymFlag::NonSymmetric,
                geometry,
            )));
        weak_form
            .vector_forms
            .push(Box::new(DefaultResidualDiffusion::with_coefficient(
                0,
                area.clone(),
                const_coeff,
                kappa,
                geometry,
            )));
        weak_form
            .vector_forms
            .push(Box::new(DefaultVectorFormVol::new(0, area, -1.0, rhs, geometry)));
        Self { weak_form }
    }

    pub fn into_weak_form(self) -> WeakForm<'a> {
        self.weak_form
    }
}

impl<'a> Deref for DefaultWeakFormLaplace<'a> {
    type Target = WeakForm<'a>;

    fn deref(&self) -> &Self::Target {
        &self.weak_form
    }
}

impl<'a> Deref for DefaultWeakFormPoisson<'a> {
    type Target = WeakForm<'a>;

    fn deref(&self) -> &Self::Target {
        &self.weak_form
    }
}

impl<'a> From<DefaultWeakFormLaplace<'a>> for WeakForm<'a> {
    fn from(form: DefaultWeakFormLaplace<'a>) -> Self {
        form.weak_form
    }
}

impl<'a> From<DefaultWeakFormPoisson<'a>> for WeakForm<'a> {
    fn from(form: DefaultWeakFormPoisson<'a>) -> Self {
        form.weak_form
    }
}
