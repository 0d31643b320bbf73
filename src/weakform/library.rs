//! The default term library.
//!
//! Jacobian terms come in pairs with residual terms, and the Jacobian must be the exact
//! derivative of the residual with respect to the coefficient of the trial function:
//!
//! | Jacobian                        | Residual                      |
//! |---------------------------------|-------------------------------|
//! | [`DefaultMatrixFormVol`]        | [`DefaultResidualVol`]        |
//! | [`DefaultJacobianDiffusion`]    | [`DefaultResidualDiffusion`]  |
//! | [`DefaultJacobianAdvection`]    | [`DefaultResidualAdvection`]  |
//! | [`DefaultMatrixFormSurf`]       | [`DefaultResidualSurf`]       |
//! | [`DefaultJacobianFormSurf`]     | [`DefaultResidualFormSurf`]   |
//!
//! Load terms ([`DefaultVectorFormVol`], [`DefaultVectorFormSurf`],
//! [`DefaultMultiComponentVectorFormSurf`]) do not depend on the iterate.
use crate::coefficient::{FieldCoefficient, FieldCoefficientSource, SpatialCoefficient, SpatialCoefficientSource};
use crate::config::ConfigurationError;
use crate::order::Order;
use crate::weakform::integrals::{grad_dot, integrate, int_v, FieldSamples, FormValue, GeomSamples, GeometryMode};
use crate::weakform::{
    Area, Domain, MatrixForm, MatrixFormHeader, MultiComponentFormHeader, MultiComponentVectorForm, SymFlag,
    VectorForm, VectorFormHeader,
};

/// Weights used when an integrand is evaluated symbolically at a single point.
const SYMBOLIC_WEIGHTS: [f64; 1] = [1.0];

fn matrix_header(i: usize, j: usize, area: Area, sym: SymFlag, domain: Domain) -> MatrixFormHeader {
    MatrixFormHeader {
        i,
        j,
        area,
        sym,
        domain,
    }
}

fn vector_header(i: usize, area: Area, domain: Domain) -> VectorFormHeader {
    VectorFormHeader { i, area, domain }
}

fn require_planar(term: &'static str, geometry: GeometryMode) -> Result<(), ConfigurationError> {
    if geometry.is_planar() {
        Ok(())
    } else {
        Err(ConfigurationError::UnsupportedGeometry { term, geometry })
    }
}

/// Implements the object-safe [`MatrixForm`] methods through the term's generic `evaluate`.
macro_rules! impl_matrix_form {
    ($term:ident) => {
        impl<'a> MatrixForm<'a> for $term<'a> {
            fn header(&self) -> &MatrixFormHeader {
                &self.header
            }

            fn value(
                &self,
                wt: &[f64],
                u_ext: &[FieldSamples<f64>],
                u: &FieldSamples<f64>,
                v: &FieldSamples<f64>,
                e: &GeomSamples<f64>,
            ) -> f64 {
                self.evaluate(wt, u_ext, u, v, e)
            }

            fn order(
                &self,
                u_ext: &[FieldSamples<Order>],
                u: &FieldSamples<Order>,
                v: &FieldSamples<Order>,
                e: &GeomSamples<Order>,
            ) -> Order {
                self.evaluate(&SYMBOLIC_WEIGHTS, u_ext, u, v, e)
            }

            fn clone_form(&self) -> Box<dyn MatrixForm<'a> + 'a> {
                Box::new(self.clone())
            }
        }
    };
}

macro_rules! impl_vector_form {
    ($term:ident) => {
        impl<'a> VectorForm<'a> for $term<'a> {
            fn header(&self) -> &VectorFormHeader {
                &self.header
            }

            fn value(
                &self,
                wt: &[f64],
                u_ext: &[FieldSamples<f64>],
                v: &FieldSamples<f64>,
                e: &GeomSamples<f64>,
            ) -> f64 {
                self.evaluate(wt, u_ext, v, e)
            }

            fn order(&self, u_ext: &[FieldSamples<Order>], v: &FieldSamples<Order>, e: &GeomSamples<Order>) -> Order {
                self.evaluate(&SYMBOLIC_WEIGHTS, u_ext, v, e)
            }

            fn clone_form(&self) -> Box<dyn VectorForm<'a> + 'a> {
                Box::new(self.clone())
            }
        }
    };
}

/// `c ∫ g(x, y) û v`: a (weighted) mass matrix.
#[derive(Debug, Clone)]
pub struct DefaultMatrixFormVol<'a> {
    header: MatrixFormHeader,
    const_coeff: f64,
    function_coeff: SpatialCoefficient<'a>,
    geometry: GeometryMode,
}

impl<'a> DefaultMatrixFormVol<'a> {
    pub fn new(
        i: usize,
        j: usize,
        area: impl Into<Area>,
        const_coeff: f64,
        function_coeff: SpatialCoefficientSource<'a>,
        sym: SymFlag,
        geometry: GeometryMode,
    ) -> Self {
        Self {
            header: matrix_header(i, j, area.into(), sym, Domain::Volume),
            const_coeff,
            function_coeff: function_coeff.resolve(),
            geometry,
        }
    }

    fn evaluate<V: FormValue>(
        &self,
        wt: &[f64],
        _u_ext: &[FieldSamples<V>],
        u: &FieldSamples<V>,
        v: &FieldSamples<V>,
        e: &GeomSamples<V>,
    ) -> V {
        let c = V::constant(self.const_coeff);
        let g = &*self.function_coeff;
        integrate(wt, |k| {
            self.geometry.factor(e, k) * c * V::spatial(g, e.x[k], e.y[k]) * u.val[k] * v.val[k]
        })
    }
}

impl_matrix_form!(DefaultMatrixFormVol);

/// Jacobian of the nonlinear diffusion residual `c ∫ κ(u) ∇u · ∇v`:
///
/// ```text
/// c ∫ κ'(u) û ∇u · ∇v + κ(u) ∇û · ∇v
/// ```
///
/// where `u` is the current iterate of unknown `j`.
#[derive(Debug, Clone)]
pub struct DefaultJacobianDiffusion<'a> {
    header: MatrixFormHeader,
    const_coeff: f64,
    coefficient: FieldCoefficient<'a>,
    geometry: GeometryMode,
}

impl<'a> DefaultJacobianDiffusion<'a> {
    pub fn new(
        i: usize,
        j: usize,
        area: impl Into<Area>,
        const_coeff: f64,
        coefficient: FieldCoefficientSource<'a>,
        sym: SymFlag,
        geometry: GeometryMode,
    ) -> Self {
        Self::with_coefficient(i, j, area, const_coeff, coefficient.resolve(), sym, geometry)
    }

    /// Creates the term from an already resolved coefficient, which may be shared with other terms.
    pub fn with_coefficient(
        i: usize,
        j: usize,
        area: impl Into<Area>,
        const_coeff: f64,
        coefficient: FieldCoefficient<'a>,
        sym: SymFlag,
        geometry: GeometryMode,
    ) -> Self {
        Self {
            header: matrix_header(i, j, area.into(), sym, Domain::Volume),
            const_coeff,
            coefficient,
            geometry,
        }
    }

    fn evaluate<V: FormValue>(
        &self,
        wt: &[f64],
        u_ext: &[FieldSamples<V>],
        u: &FieldSamples<V>,
        v: &FieldSamples<V>,
        e: &GeomSamples<V>,
    ) -> V {
        let c = V::constant(self.const_coeff);
        let kappa = &*self.coefficient;
        let u_prev = &u_ext[self.header.j];
        integrate(wt, |k| {
            let linearization = V::field_derivative(kappa, u_prev.val[k]) * u.val[k] * grad_dot(u_prev, v, k);
            let frozen = V::field(kappa, u_prev.val[k]) * grad_dot(u, v, k);
            self.geometry.factor(e, k) * c * (linearization + frozen)
        })
    }
}

impl_matrix_form!(DefaultJacobianDiffusion);

/// Jacobian of the advection residual `∫ c₁ κ₁(u) ∂ₓu v + c₂ κ₂(u) ∂ᵧu v`.
///
/// Only the planar formulation exists.
#[derive(Debug, Clone)]
pub struct DefaultJacobianAdvection<'a> {
    header: MatrixFormHeader,
    const_coeff1: f64,
    const_coeff2: f64,
    coefficient1: FieldCoefficient<'a>,
    coefficient2: FieldCoefficient<'a>,
    geometry: GeometryMode,
}

impl<'a> DefaultJacobianAdvection<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        i: usize,
        j: usize,
        area: impl Into<Area>,
        const_coeff1: f64,
        const_coeff2: f64,
        coefficient1: FieldCoefficientSource<'a>,
        coefficient2: FieldCoefficientSource<'a>,
        geometry: GeometryMode,
    ) -> Result<Self, ConfigurationError> {
        require_planar("DefaultJacobianAdvection", geometry)?;
        Ok(Self {
            header: matrix_header(i, j, area.into(), SymFlag::NonSymmetric, Domain::Volume),
            const_coeff1,
            const_coeff2,
            coefficient1: coefficient1.resolve(),
            coefficient2: coefficient2.resolve(),
            geometry,
        })
    }

    fn evaluate<V: FormValue>(
        &self,
        wt: &[f64],
        u_ext: &[FieldSamples<V>],
        u: &FieldSamples<V>,
        v: &FieldSamples<V>,
        e: &GeomSamples<V>,
    ) -> V {
        let (c1, c2) = (V::constant(self.const_coeff1), V::constant(self.const_coeff2));
        let (kappa1, kappa2) = (&*self.coefficient1, &*self.coefficient2);
        let u_prev = &u_ext[self.header.j];
        integrate(wt, |k| {
            let w = u_prev.val[k];
            let x_part = V::field_derivative(kappa1, w) * u.val[k] * u_prev.dx[k] + V::field(kappa1, w) * u.dx[k];
            let y_part = V::field_derivative(kappa2, w) * u.val[k] * u_prev.dy[k] + V::field(kappa2, w) * u.dy[k];
            self.geometry.factor(e, k) * (c1 * x_part + c2 * y_part) * v.val[k]
        })
    }
}

impl_matrix_form!(DefaultJacobianAdvection);

/// `c ∫ g(x, y) v`.
#[derive(Debug, Clone)]
pub struct DefaultVectorFormVol<'a> {
    header: VectorFormHeader,
    const_coeff: f64,
    function_coeff: SpatialCoefficient<'a>,
    geometry: GeometryMode,
}

impl<'a> DefaultVectorFormVol<'a> {
    pub fn new(
        i: usize,
        area: impl Into<Area>,
        const_coeff: f64,
        function_coeff: SpatialCoefficientSource<'a>,
        geometry: GeometryMode,
    ) -> Self {
        Self {
            header: vector_header(i, area.into(), Domain::Volume),
            const_coeff,
            function_coeff: function_coeff.resolve(),
            geometry,
        }
    }

    fn evaluate<V: FormValue>(
        &self,
        wt: &[f64],
        _u_ext: &[FieldSamples<V>],
        v: &FieldSamples<V>,
        e: &GeomSamples<V>,
    ) -> V {
        let c = V::constant(self.const_coeff);
        let g = &*self.function_coeff;
        integrate(wt, |k| self.geometry.factor(e, k) * c * V::spatial(g, e.x[k], e.y[k]) * v.val[k])
    }
}

impl_vector_form!(DefaultVectorFormVol);

/// `c ∫ g(x, y) u v`, where `u` is the current iterate of unknown `i`.
#[derive(Debug, Clone)]
pub struct DefaultResidualVol<'a> {
    header: VectorFormHeader,
    const_coeff: f64,
    function_coeff: SpatialCoefficient<'a>,
    geometry: GeometryMode,
}

impl<'a> DefaultResidualVol<'a> {
    pub fn new(
        i: usize,
        area: impl Into<Area>,
        const_coeff: f64,
        function_coeff: SpatialCoefficientSource<'a>,
        geometry: GeometryMode,
    ) -> Self {
        Self {
            header: vector_header(i, area.into(), Domain::Volume),
            const_coeff,
            function_coeff: function_coeff.resolve(),
            geometry,
        }
    }

    fn evaluate<V: FormValue>(
        &self,
        wt: &[f64],
        u_ext: &[FieldSamples<V>],
        v: &FieldSamples<V>,
        e: &GeomSamples<V>,
    ) -> V {
        let c = V::constant(self.const_coeff);
        let g = &*self.function_coeff;
        let u_prev = &u_ext[self.header.i];
        integrate(wt, |k| {
            self.geometry.factor(e, k) * c * V::spatial(g, e.x[k], e.y[k]) * u_prev.val[k] * v.val[k]
        })
    }
}

impl_vector_form!(DefaultResidualVol);

/// `c ∫ κ(u) ∇u · ∇v`, where `u` is the current iterate of unknown `i`.
#[derive(Debug, Clone)]
pub struct DefaultResidualDiffusion<'a> {
    header: VectorFormHeader,
    const_coeff: f64,
    coefficient: FieldCoefficient<'a>,
    geometry: GeometryMode,
}

impl<'a> DefaultResidualDiffusion<'a> {
    pub fn new(
        i: usize,
        area: impl Into<Area>,
        const_coeff: f64,
        coefficient: FieldCoefficientSource<'a>,
        geometry: GeometryMode,
    ) -> Self {
        Self::with_coefficient(i, area, const_coeff, coefficient.resolve(), geometry)
    }

    /// Creates the term from an already resolved coefficient, which may be shared with other terms.
    pub fn with_coefficient(
        i: usize,
        area: impl Into<Area>,
        const_coeff: f64,
        coefficient: FieldCoefficient<'a>,
        geometry: GeometryMode,
    ) -> Self {
        Self {
            header: vector_header(i, area.into(), Domain::Volume),
            const_coeff,
            coefficient,
            geometry,
        }
    }

    fn integrand<V: FormValue>(
        &self,
        wt: &[f64],
        u_ext: &[FieldSamples<V>],
        v: &FieldSamples<V>,
        e: &GeomSamples<V>,
        geometry: GeometryMode,
    ) -> V {
        let c = V::constant(self.const_coeff);
        let kappa = &*self.coefficient;
        let u_prev = &u_ext[self.header.i];
        integrate(wt, |k| {
            geometry.factor(e, k) * c * V::field(kappa, u_prev.val[k]) * grad_dot(u_prev, v, k)
        })
    }
}

impl<'a> VectorForm<'a> for DefaultResidualDiffusion<'a> {
    fn header(&self) -> &VectorFormHeader {
        &self.header
    }

    fn value(&self, wt: &[f64], u_ext: &[FieldSamples<f64>], v: &FieldSamples<f64>, e: &GeomSamples<f64>) -> f64 {
        self.integrand(wt, u_ext, v, e, self.geometry)
    }

    /// The planar estimate, with one extra unit of headroom in axisymmetric modes.
    fn order(&self, u_ext: &[FieldSamples<Order>], v: &FieldSamples<Order>, e: &GeomSamples<Order>) -> Order {
        let planar = self.integrand(&SYMBOLIC_WEIGHTS, u_ext, v, e, GeometryMode::Planar);
        if self.geometry.is_planar() {
            planar
        } else {
            planar * Order::new(1)
        }
    }

    fn clone_form(&self) -> Box<dyn VectorForm<'a> + 'a> {
        Box::new(self.clone())
    }
}

/// `∫ c₁ κ₁(u) ∂ₓu v + c₂ κ₂(u) ∂ᵧu v`, where `u` is the current iterate of unknown `i`.
///
/// Only the planar formulation exists.
#[derive(Debug, Clone)]
pub struct DefaultResidualAdvection<'a> {
    header: VectorFormHeader,
    const_coeff1: f64,
    const_coeff2: f64,
    coefficient1: FieldCoefficient<'a>,
    coefficient2: FieldCoefficient<'a>,
    geometry: GeometryMode,
}

impl<'a> DefaultResidualAdvection<'a> {
    pub fn new(
        i: usize,
        area: impl Into<Area>,
        const_coeff1: f64,
        const_coeff2: f64,
        coefficient1: FieldCoefficientSource<'a>,
        coefficient2: FieldCoefficientSource<'a>,
        geometry: GeometryMode,
    ) -> Result<Self, ConfigurationError> {
        require_planar("DefaultResidualAdvection", geometry)?;
        Ok(Self {
            header: vector_header(i, area.into(), Domain::Volume),
            const_coeff1,
            const_coeff2,
            coefficient1: coefficient1.resolve(),
            coefficient2: coefficient2.resolve(),
            geometry,
        })
    }

    fn evaluate<V: FormValue>(
        &self,
        wt: &[f64],
        u_ext: &[FieldSamples<V>],
        v: &FieldSamples<V>,
        e: &GeomSamples<V>,
    ) -> V {
        let (c1, c2) = (V::constant(self.const_coeff1), V::constant(self.const_coeff2));
        let (kappa1, kappa2) = (&*self.coefficient1, &*self.coefficient2);
        let u_prev = &u_ext[self.header.i];
        integrate(wt, |k| {
            let w = u_prev.val[k];
            let transport = c1 * V::field(kappa1, w) * u_prev.dx[k] + c2 * V::field(kappa2, w) * u_prev.dy[k];
            self.geometry.factor(e, k) * transport * v.val[k]
        })
    }
}

impl_vector_form!(DefaultResidualAdvection);

/// `c ∫_Γ g(x, y) û v` over boundary edges.
#[derive(Debug, Clone)]
pub struct DefaultMatrixFormSurf<'a> {
    header: MatrixFormHeader,
    const_coeff: f64,
    function_coeff: SpatialCoefficient<'a>,
    geometry: GeometryMode,
}

impl<'a> DefaultMatrixFormSurf<'a> {
    pub fn new(
        i: usize,
        j: usize,
        area: impl Into<Area>,
        const_coeff: f64,
        function_coeff: SpatialCoefficientSource<'a>,
        geometry: GeometryMode,
    ) -> Self {
        Self {
            header: matrix_header(i, j, area.into(), SymFlag::NonSymmetric, Domain::Surface),
            const_coeff,
            function_coeff: function_coeff.resolve(),
            geometry,
        }
    }

    fn evaluate<V: FormValue>(
        &self,
        wt: &[f64],
        _u_ext: &[FieldSamples<V>],
        u: &FieldSamples<V>,
        v: &FieldSamples<V>,
        e: &GeomSamples<V>,
    ) -> V {
        let c = V::constant(self.const_coeff);
        let g = &*self.function_coeff;
        integrate(wt, |k| {
            self.geometry.factor(e, k) * c * V::spatial(g, e.x[k], e.y[k]) * u.val[k] * v.val[k]
        })
    }
}

impl_matrix_form!(DefaultMatrixFormSurf);

/// Jacobian of [`DefaultResidualFormSurf`]: `c ∫_Γ (κ'(u) u + κ(u)) û v`.
#[derive(Debug, Clone)]
pub struct DefaultJacobianFormSurf<'a> {
    header: MatrixFormHeader,
    const_coeff: f64,
    coefficient: FieldCoefficient<'a>,
    geometry: GeometryMode,
}

impl<'a> DefaultJacobianFormSurf<'a> {
    pub fn new(
        i: usize,
        j: usize,
        area: impl Into<Area>,
        const_coeff: f64,
        coefficient: FieldCoefficientSource<'a>,
        geometry: GeometryMode,
    ) -> Self {
        Self {
            header: matrix_header(i, j, area.into(), SymFlag::NonSymmetric, Domain::Surface),
            const_coeff,
            coefficient: coefficient.resolve(),
            geometry,
        }
    }

    fn evaluate<V: FormValue>(
        &self,
        wt: &[f64],
        u_ext: &[FieldSamples<V>],
        u: &FieldSamples<V>,
        v: &FieldSamples<V>,
        e: &GeomSamples<V>,
    ) -> V {
        let c = V::constant(self.const_coeff);
        let kappa = &*self.coefficient;
        let u_prev = &u_ext[self.header.j];
        integrate(wt, |k| {
            let w = u_prev.val[k];
            let slope = V::field_derivative(kappa, w) * w + V::field(kappa, w);
            self.geometry.factor(e, k) * c * slope * u.val[k] * v.val[k]
        })
    }
}

impl_matrix_form!(DefaultJacobianFormSurf);

/// `c ∫_Γ g(x, y) v` over boundary edges, e.g. a prescribed flux.
#[derive(Debug, Clone)]
pub struct DefaultVectorFormSurf<'a> {
    header: VectorFormHeader,
    const_coeff: f64,
    function_coeff: SpatialCoefficient<'a>,
    geometry: GeometryMode,
}

impl<'a> DefaultVectorFormSurf<'a> {
    pub fn new(
        i: usize,
        area: impl Into<Area>,
        const_coeff: f64,
        function_coeff: SpatialCoefficientSource<'a>,
        geometry: GeometryMode,
    ) -> Self {
        Self {
            header: vector_header(i, area.into(), Domain::Surface),
            const_coeff,
            function_coeff: function_coeff.resolve(),
            geometry,
        }
    }

    fn evaluate<V: FormValue>(
        &self,
        wt: &[f64],
        _u_ext: &[FieldSamples<V>],
        v: &FieldSamples<V>,
        e: &GeomSamples<V>,
    ) -> V {
        let c = V::constant(self.const_coeff);
        let g = &*self.function_coeff;
        integrate(wt, |k| self.geometry.factor(e, k) * c * V::spatial(g, e.x[k], e.y[k]) * v.val[k])
    }
}

impl_vector_form!(DefaultVectorFormSurf);

/// `c ∫_Γ g(x, y) u v`, where `u` is the current iterate of unknown `i`.
#[derive(Debug, Clone)]
pub struct DefaultResidualSurf<'a> {
    header: VectorFormHeader,
    const_coeff: f64,
    function_coeff: SpatialCoefficient<'a>,
    geometry: GeometryMode,
}

impl<'a> DefaultResidualSurf<'a> {
    pub fn new(
        i: usize,
        area: impl Into<Area>,
        const_coeff: f64,
        function_coeff: SpatialCoefficientSource<'a>,
        geometry: GeometryMode,
    ) -> Self {
        Self {
            header: vector_header(i, area.into(), Domain::Surface),
            const_coeff,
            function_coeff: function_coeff.resolve(),
            geometry,
        }
    }

    fn evaluate<V: FormValue>(
        &self,
        wt: &[f64],
        u_ext: &[FieldSamples<V>],
        v: &FieldSamples<V>,
        e: &GeomSamples<V>,
    ) -> V {
        let c = V::constant(self.const_coeff);
        let g = &*self.function_coeff;
        let u_prev = &u_ext[self.header.i];
        integrate(wt, |k| {
            self.geometry.factor(e, k) * c * V::spatial(g, e.x[k], e.y[k]) * u_prev.val[k] * v.val[k]
        })
    }
}

impl_vector_form!(DefaultResidualSurf);

/// `c ∫_Γ κ(u) u v`, where `u` is the current iterate of unknown `i`.
#[derive(Debug, Clone)]
pub struct DefaultResidualFormSurf<'a> {
    header: VectorFormHeader,
    const_coeff: f64,
    coefficient: FieldCoefficient<'a>,
    geometry: GeometryMode,
}

impl<'a> DefaultResidualFormSurf<'a> {
    pub fn new(
        i: usize,
        area: impl Into<Area>,
        const_coeff: f64,
        coefficient: FieldCoefficientSource<'a>,
        geometry: GeometryMode,
    ) -> Self {
        Self {
            header: vector_header(i, area.into(), Domain::Surface),
            const_coeff,
            coefficient: coefficient.resolve(),
            geometry,
        }
    }

    fn evaluate<V: FormValue>(
        &self,
        wt: &[f64],
        u_ext: &[FieldSamples<V>],
        v: &FieldSamples<V>,
        e: &GeomSamples<V>,
    ) -> V {
        let c = V::constant(self.const_coeff);
        let kappa = &*self.coefficient;
        let u_prev = &u_ext[self.header.i];
        integrate(wt, |k| {
            let w = u_prev.val[k];
            self.geometry.factor(e, k) * c * V::field(kappa, w) * w * v.val[k]
        })
    }
}

impl_vector_form!(DefaultResidualFormSurf);

/// `c_k ∫_Γ v` for several equations `i_k` sharing one quadrature pass.
#[derive(Debug, Clone)]
pub struct DefaultMultiComponentVectorFormSurf {
    header: MultiComponentFormHeader,
    coefficients: Vec<f64>,
    geometry: GeometryMode,
}

impl DefaultMultiComponentVectorFormSurf {
    pub fn new(
        coordinates: Vec<usize>,
        area: impl Into<Area>,
        coefficients: Vec<f64>,
        geometry: GeometryMode,
    ) -> Result<Self, ConfigurationError> {
        if coordinates.is_empty() {
            return Err(ConfigurationError::InvalidMultiComponentForm(
                "no coordinates given".to_string(),
            ));
        }
        if coordinates.len() != coefficients.len() {
            return Err(ConfigurationError::InvalidMultiComponentForm(format!(
                "{} coordinates but {} coefficients",
                coordinates.len(),
                coefficients.len()
            )));
        }
        Ok(Self {
            header: MultiComponentFormHeader {
                coordinates,
                area: area.into(),
                domain: Domain::Surface,
            },
            coefficients,
            geometry,
        })
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }
}

impl<'a> MultiComponentVectorForm<'a> for DefaultMultiComponentVectorFormSurf {
    fn header(&self) -> &MultiComponentFormHeader {
        &self.header
    }

    fn value(
        &self,
        wt: &[f64],
        _u_ext: &[FieldSamples<f64>],
        v: &FieldSamples<f64>,
        e: &GeomSamples<f64>,
        result: &mut [f64],
    ) {
        assert_eq!(result.len(), self.coefficients.len(), "one output per coordinate");
        let base = int_v(wt, v, e, self.geometry);
        for (r, c) in result.iter_mut().zip(&self.coefficients) {
            *r = base * c;
        }
    }

    fn order(&self, _u_ext: &[FieldSamples<Order>], v: &FieldSamples<Order>, e: &GeomSamples<Order>) -> Order {
        int_v(&SYMBOLIC_WEIGHTS, v, e, self.geometry)
    }

    fn clone_form(&self) -> Box<dyn MultiComponentVectorForm<'a> + 'a> {
        Box::new(self.clone())
    }
}
