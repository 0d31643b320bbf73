//! Weak forms as collections of bilinear and linear terms.
//!
//! A [`WeakForm`] of a system with `neq` equations holds
//!
//! - matrix forms, contributing to block `(i, j)` of the Jacobian,
//! - vector forms, contributing to block `i` of the residual,
//! - multi-component vector forms, contributing to several residual blocks at once.
//!
//! Each form carries a header describing where it lives: its block indices, the mesh markers
//! it is restricted to, whether it is a volume or a surface term and (for matrix forms) its
//! symmetry. Assembly is driven entirely by these headers.
use crate::config::ConfigurationError;
use crate::order::Order;
use std::fmt::Debug;

pub mod composite;
pub mod integrals;
pub mod library;

pub use composite::*;
pub use integrals::*;
pub use library::*;

/// The region a form is integrated over.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Area {
    /// Every element (volume forms) or every boundary edge (surface forms).
    #[default]
    Any,
    /// Only elements or boundary edges carrying one of the given markers.
    Markers(Vec<String>),
}

impl Area {
    pub fn marker(marker: impl Into<String>) -> Self {
        Self::Markers(vec![marker.into()])
    }

    pub fn markers<S: Into<String>>(markers: impl IntoIterator<Item = S>) -> Self {
        Self::Markers(markers.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, marker: &str) -> bool {
        match self {
            Area::Any => true,
            Area::Markers(markers) => markers.iter().any(|m| m == marker),
        }
    }
}

impl From<&str> for Area {
    fn from(marker: &str) -> Self {
        Self::marker(marker)
    }
}

/// Symmetry of a matrix form with respect to swapping trial and test functions.
///
/// For diagonal blocks, assembly evaluates symmetric and antisymmetric forms on one triangle
/// of the local matrix only and mirrors the result.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum SymFlag {
    #[default]
    NonSymmetric,
    Symmetric,
    AntiSymmetric,
}

/// Whether a form is integrated over elements or over boundary edges.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Domain {
    Volume,
    Surface,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatrixFormHeader {
    /// Equation (test function block).
    pub i: usize,
    /// Unknown (trial function block).
    pub j: usize,
    pub area: Area,
    pub sym: SymFlag,
    pub domain: Domain,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VectorFormHeader {
    pub i: usize,
    pub area: Area,
    pub domain: Domain,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MultiComponentFormHeader {
    /// The equations the form contributes to, in output order.
    pub coordinates: Vec<usize>,
    pub area: Area,
    pub domain: Domain,
}

/// A bilinear (Jacobian) term.
///
/// `u_ext` holds the current iterate of every unknown at the quadrature points, `u` the trial
/// and `v` the test basis function. The weights `wt` already include the element measure.
pub trait MatrixForm<'a>: Debug + Send + Sync {
    fn header(&self) -> &MatrixFormHeader;

    fn value(
        &self,
        wt: &[f64],
        u_ext: &[FieldSamples<f64>],
        u: &FieldSamples<f64>,
        v: &FieldSamples<f64>,
        e: &GeomSamples<f64>,
    ) -> f64;

    /// Upper bound on the polynomial degree of the integrand.
    fn order(
        &self,
        u_ext: &[FieldSamples<Order>],
        u: &FieldSamples<Order>,
        v: &FieldSamples<Order>,
        e: &GeomSamples<Order>,
    ) -> Order;

    fn clone_form(&self) -> Box<dyn MatrixForm<'a> + 'a>;
}

/// A linear (residual) term.
pub trait VectorForm<'a>: Debug + Send + Sync {
    fn header(&self) -> &VectorFormHeader;

    fn value(&self, wt: &[f64], u_ext: &[FieldSamples<f64>], v: &FieldSamples<f64>, e: &GeomSamples<f64>) -> f64;

    fn order(&self, u_ext: &[FieldSamples<Order>], v: &FieldSamples<Order>, e: &GeomSamples<Order>) -> Order;

    fn clone_form(&self) -> Box<dyn VectorForm<'a> + 'a>;
}

/// A linear term contributing to several equations at once.
pub trait MultiComponentVectorForm<'a>: Debug + Send + Sync {
    fn header(&self) -> &MultiComponentFormHeader;

    /// Writes one value per coordinate of the header into `result`.
    fn value(
        &self,
        wt: &[f64],
        u_ext: &[FieldSamples<f64>],
        v: &FieldSamples<f64>,
        e: &GeomSamples<f64>,
        result: &mut [f64],
    );

    fn order(&self, u_ext: &[FieldSamples<Order>], v: &FieldSamples<Order>, e: &GeomSamples<Order>) -> Order;

    fn clone_form(&self) -> Box<dyn MultiComponentVectorForm<'a> + 'a>;
}

impl<'a> Clone for Box<dyn MatrixForm<'a> + 'a> {
    fn clone(&self) -> Self {
        self.clone_form()
    }
}

impl<'a> Clone for Box<dyn VectorForm<'a> + 'a> {
    fn clone(&self) -> Self {
        self.clone_form()
    }
}

impl<'a> Clone for Box<dyn MultiComponentVectorForm<'a> + 'a> {
    fn clone(&self) -> Self {
        self.clone_form()
    }
}

/// The weak formulation of a system of `neq` equations.
///
/// Cloning a weak form clones every term. Owned coefficients are shared between the clones.
#[derive(Debug, Clone)]
pub struct WeakForm<'a> {
    neq: usize,
    matrix_forms: Vec<Box<dyn MatrixForm<'a> + 'a>>,
    vector_forms: Vec<Box<dyn VectorForm<'a> + 'a>>,
    multi_component_vector_forms: Vec<Box<dyn MultiComponentVectorForm<'a> + 'a>>,
}

impl<'a> WeakForm<'a> {
    pub fn new(neq: usize) -> Self {
        Self {
            neq,
            matrix_forms: Vec::new(),
            vector_forms: Vec::new(),
            multi_component_vector_forms: Vec::new(),
        }
    }

    pub fn neq(&self) -> usize {
        self.neq
    }

    fn check_index(&self, index: usize) -> Result<(), ConfigurationError> {
        if index < self.neq {
            Ok(())
        } else {
            Err(ConfigurationError::FormIndexOutOfBounds {
                index,
                num_equations: self.neq,
            })
        }
    }

    pub fn add_matrix_form(&mut self, form: impl MatrixForm<'a> + 'a) -> Result<&mut Self, ConfigurationError> {
        self.add_boxed_matrix_form(Box::new(form))
    }

    pub fn add_boxed_matrix_form(
        &mut self,
        form: Box<dyn MatrixForm<'a> + 'a>,
    ) -> Result<&mut Self, ConfigurationError> {
        let header = form.header();
        self.check_index(header.i)?;
        self.check_index(header.j)?;
        self.matrix_forms.push(form);
        Ok(self)
    }

    pub fn add_vector_form(&mut self, form: impl VectorForm<'a> + 'a) -> Result<&mut Self, ConfigurationError> {
        self.add_boxed_vector_form(Box::new(form))
    }

    pub fn add_boxed_vector_form(
        &mut self,
        form: Box<dyn VectorForm<'a> + 'a>,
    ) -> Result<&mut Self, ConfigurationError> {
        self.check_index(form.header().i)?;
        self.vector_forms.push(form);
        Ok(self)
    }

    pub fn add_multi_component_vector_form(
        &mut self,
        form: impl MultiComponentVectorForm<'a> + 'a,
    ) -> Result<&mut Self, ConfigurationError> {
        for &index in &form.header().coordinates {
            self.check_index(index)?;
        }
        self.multi_component_vector_forms.push(Box::new(form));
        Ok(self)
    }

    pub fn matrix_forms(&self) -> &[Box<dyn MatrixForm<'a> + 'a>] {
        &self.matrix_forms
    }

    pub fn vector_forms(&self) -> &[Box<dyn VectorForm<'a> + 'a>] {
        &self.vector_forms
    }

    pub fn multi_component_vector_forms(&self) -> &[Box<dyn MultiComponentVectorForm<'a> + 'a>] {
        &self.multi_component_vector_forms
    }

    /// Whether any form is restricted to boundary edges.
    pub fn has_surface_forms(&self) -> bool {
        self.matrix_forms
            .iter()
            .any(|f| f.header().domain == Domain::Surface)
            || self
                .vector_forms
                .iter()
                .any(|f| f.header().domain == Domain::Surface)
            || self
                .multi_component_vector_forms
                .iter()
                .any(|f| f.header().domain == Domain::Surface)
    }
}
