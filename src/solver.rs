//! The Newton driver for discrete nonlinear problems.
use crate::assembly::DiscreteProblem;
use crate::coefficient::ExactSolution;
use crate::config::{LineSearchKind, NewtonConfig, SolverConfig};
use crate::linear::LinearSolver;
use crate::optimize::calculus::{DifferentiableVectorFunction, FunctionError, VectorFunction};
use crate::optimize::newton::{newton, newton_line_search, BacktrackingLineSearch, NewtonError, NewtonOutput, NewtonSettings};
use crate::projection::{project_global, ProjectionNorm};
use log::info;
use nalgebra::{DVector, DVectorView, DVectorViewMut};

/// Solves `F(u) = 0` for the residual `F` of a [`DiscreteProblem`] with Newton's method.
///
/// Each iteration assembles the Jacobian and the residual at the current iterate, tests the
/// residual norm against the tolerance, solves `J Δ = -F` with the configured linear solver
/// and updates the iterate. Failures of the linear solver and exhausted iteration budgets are
/// reported as distinct [`NewtonError`] variants.
#[derive(Debug)]
pub struct NewtonSolver<'p, 'a> {
    problem: DiscreteProblem<'p, 'a>,
    linear_solver: Box<dyn LinearSolver>,
    config: NewtonConfig,
    projection: ProjectionNorm,
}

impl<'p, 'a> NewtonSolver<'p, 'a> {
    pub fn new(problem: DiscreteProblem<'p, 'a>, linear_solver: Box<dyn LinearSolver>, config: NewtonConfig) -> Self {
        Self {
            problem,
            linear_solver,
            config,
            projection: ProjectionNorm::default(),
        }
    }

    pub fn from_config(problem: DiscreteProblem<'p, 'a>, config: &SolverConfig) -> Self {
        Self::new(problem, config.linear_solver.build(), config.newton.clone()).with_projection_norm(config.projection)
    }

    /// The norm used by [`NewtonSolver::solve_from`] to project the initial guess.
    pub fn with_projection_norm(mut self, norm: ProjectionNorm) -> Self {
        self.projection = norm;
        self
    }

    pub fn problem(&self) -> &DiscreteProblem<'p, 'a> {
        &self.problem
    }

    pub fn config(&self) -> &NewtonConfig {
        &self.config
    }

    /// Runs Newton's method starting from `coefficients`, which holds the solution on success.
    pub fn solve(&self, coefficients: &mut DVector<f64>) -> Result<NewtonOutput<f64>, NewtonError> {
        let n = self.problem.num_dofs();
        if coefficients.len() != n {
            return Err(NewtonError::EvaluationFailure(Box::from(format!(
                "initial iterate has length {}, but the problem has {} degrees of freedom",
                coefficients.len(),
                n
            ))));
        }

        let function = NewtonProblem {
            problem: &self.problem,
            linear_solver: self.linear_solver.as_ref(),
        };
        let mut f = DVector::zeros(n);
        let mut dx = DVector::zeros(n);
        let settings = NewtonSettings {
            max_iterations: Some(self.config.max_iterations),
            tolerance: self.config.tolerance,
        };

        let output = match self.config.line_search {
            LineSearchKind::None => newton(function, &mut *coefficients, &mut f, &mut dx, settings),
            LineSearchKind::Backtracking => newton_line_search(
                function,
                &mut *coefficients,
                &mut f,
                &mut dx,
                settings,
                &mut BacktrackingLineSearch::default(),
            ),
        }?;
        info!(
            "Newton converged at iteration {} with residual l2 norm {}",
            output.iterations, output.residual_norm
        );
        Ok(output)
    }

    /// Projects `initial_guess` (one function per equation) onto the spaces and runs Newton's
    /// method from the projection.
    pub fn solve_from(
        &self,
        initial_guess: &[&dyn ExactSolution],
    ) -> Result<(DVector<f64>, NewtonOutput<f64>), NewtonError> {
        let mut coefficients = project_global(
            self.problem.spaces(),
            initial_guess,
            self.projection,
            self.linear_solver.as_ref(),
        )
        .map_err(|err| NewtonError::EvaluationFailure(err.into()))?;
        let output = self.solve(&mut coefficients)?;
        Ok((coefficients, output))
    }
}

/// Exposes a discrete problem to the generic Newton iteration.
struct NewtonProblem<'s, 'p, 'a> {
    problem: &'s DiscreteProblem<'p, 'a>,
    linear_solver: &'s dyn LinearSolver,
}

impl VectorFunction<f64> for NewtonProblem<'_, '_, '_> {
    fn dimension(&self) -> usize {
        self.problem.num_dofs()
    }

    fn eval_into(&mut self, f: &mut DVectorViewMut<f64>, x: &DVectorView<f64>) -> Result<(), FunctionError> {
        f.fill(0.0);
        self.problem
            .assemble_into(*x, None, Some(DVectorViewMut::from(&mut *f)))
            .map_err(FunctionError::from)
    }
}

impl DifferentiableVectorFunction<f64> for NewtonProblem<'_, '_, '_> {
    fn solve_jacobian_system(
        &mut self,
        sol: &mut DVectorViewMut<f64>,
        x: &DVectorView<f64>,
        rhs: &DVectorView<f64>,
    ) -> Result<(), FunctionError> {
        let jacobian = self.problem.assemble_jacobian(*x)?;
        let solution = self.linear_solver.solve(&jacobian, &rhs.clone_owned())?;
        sol.copy_from(&solution);
        Ok(())
    }
}
