//! Orthogonal projection of known functions onto H1 spaces.
//!
//! Projections provide the initial iterate of the Newton solver. The Dirichlet lift of each
//! space is kept fixed, so only the free degrees of freedom are projected.
use crate::assembly::DiscreteProblem;
use crate::coefficient::{CoefficientSource, ExactSolution};
use crate::linear::LinearSolver;
use crate::order::Order;
use crate::space::H1Space;
use crate::weakform::{
    integrate, Area, DefaultJacobianDiffusion, DefaultMatrixFormVol, DefaultResidualDiffusion, DefaultResidualVol,
    Domain, FieldSamples, GeomSamples, GeometryMode, SymFlag, VectorForm, VectorFormHeader, WeakForm,
};
use eyre::eyre;
use log::debug;
use nalgebra::DVector;
use serde::{Deserialize, Serialize};

/// The inner product of a projection.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProjectionNorm {
    L2,
    #[default]
    H1,
}

/// The load `-∫ f v` (L2), plus `-∫ ∇f · ∇v` for the H1 projection.
#[derive(Debug, Clone)]
struct ProjectionLoad<'a> {
    header: VectorFormHeader,
    target: &'a dyn ExactSolution,
    norm: ProjectionNorm,
}

impl<'a> VectorForm<'a> for ProjectionLoad<'a> {
    fn header(&self) -> &VectorFormHeader {
        &self.header
    }

    fn value(&self, wt: &[f64], _u_ext: &[FieldSamples<f64>], v: &FieldSamples<f64>, e: &GeomSamples<f64>) -> f64 {
        -integrate(wt, |k| {
            let (x, y) = (e.x[k], e.y[k]);
            let mut integrand = self.target.value(x, y) * v.val[k];
            if self.norm == ProjectionNorm::H1 {
                let gradient = self.target.gradient(x, y);
                integrand += gradient.x * v.dx[k] + gradient.y * v.dy[k];
            }
            integrand
        })
    }

    fn order(&self, _u_ext: &[FieldSamples<Order>], v: &FieldSamples<Order>, _e: &GeomSamples<Order>) -> Order {
        integrate(&[1.0], |k| self.target.order() * (v.val[k] + v.dx[k] + v.dy[k]))
    }

    fn clone_form(&self) -> Box<dyn VectorForm<'a> + 'a> {
        Box::new(self.clone())
    }
}

/// Projects `functions[i]` onto the free degrees of freedom of `spaces[i]`.
///
/// Returns the stacked coefficient vector of all spaces.
pub fn project_global(
    spaces: &[&H1Space],
    functions: &[&dyn ExactSolution],
    norm: ProjectionNorm,
    solver: &dyn LinearSolver,
) -> eyre::Result<DVector<f64>> {
    if spaces.len() != functions.len() {
        return Err(eyre!(
            "cannot project {} functions onto {} spaces",
            functions.len(),
            spaces.len()
        ));
    }

    let mut weak_form = WeakForm::new(spaces.len());
    for (i, &target) in functions.iter().enumerate() {
        let planar = GeometryMode::Planar;
        weak_form.add_matrix_form(DefaultMatrixFormVol::new(
            i,
            i,
            Area::Any,
            1.0,
            CoefficientSource::NotProvided,
            SymFlag::Symmetric,
            planar,
        ))?;
        weak_form.add_vector_form(DefaultResidualVol::new(i, Area::Any, 1.0, CoefficientSource::NotProvided, planar))?;
        if norm == ProjectionNorm::H1 {
            weak_form.add_matrix_form(DefaultJacobianDiffusion::new(
                i,
                i,
                Area::Any,
                1.0,
                CoefficientSource::NotProvided,
                SymFlag::Symmetric,
                planar,
            ))?;
            weak_form.add_vector_form(DefaultResidualDiffusion::new(
                i,
                Area::Any,
                1.0,
                CoefficientSource::NotProvided,
                planar,
            ))?;
        }
        weak_form.add_vector_form(ProjectionLoad {
            header: VectorFormHeader {
                i,
                area: Area::Any,
                domain: Domain::Volume,
            },
            target,
            norm,
        })?;
    }

    let problem = DiscreteProblem::new(&weak_form, spaces.to_vec())?;
    debug!("Projecting {} functions ({:?}), {} dofs", functions.len(), norm, problem.num_dofs());

    // The residual is affine in the coefficients, so a single Newton step from zero is exact
    let zero = DVector::zeros(problem.num_dofs());
    let (matrix, residual) = problem.assemble(zero.as_view())?;
    let solution = solver.solve(&matrix, &(-residual))?;
    Ok(solution)
}
