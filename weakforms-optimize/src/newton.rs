use crate::calculus::{DifferentiableVectorFunction, FunctionError, VectorFunction};
use crate::Real;
use itertools::iterate;
use log::{debug, info, warn};
use nalgebra::{DVectorView, DVectorViewMut, Scalar};
use numeric_literals::replace_float_literals;
use std::error::Error;
use std::fmt;
use std::fmt::Display;

/// Stopping criteria for [`newton`].
///
/// The iteration has converged once `|F(x)|_2 < tolerance`. With `max_iterations == Some(k)`,
/// at most `k` residual evaluations are tested, i.e. at most `k - 1` Newton updates are taken.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct NewtonSettings<T> {
    pub max_iterations: Option<usize>,
    pub tolerance: T,
}

/// Summary of a converged Newton solve.
#[derive(Debug, Clone, PartialEq)]
pub struct NewtonOutput<T> {
    /// The iteration at which the residual norm was found to be below the tolerance.
    ///
    /// Iterations are counted from 1, and iteration `k` follows `k - 1` updates.
    pub iterations: usize,
    /// Norm of the residual at the returned solution.
    pub residual_norm: T,
    /// Residual norm observed at each iteration, starting with the initial guess.
    pub residual_history: Vec<T>,
}

#[derive(Debug)]
#[non_exhaustive]
pub enum NewtonError {
    /// The residual norm did not drop below the tolerance within the iteration budget.
    NonConvergence(usize),
    /// Solving the linear system with the Jacobian failed.
    SolverFailure(FunctionError),
    /// Evaluating the function failed.
    EvaluationFailure(FunctionError),
    /// The residual became infinite or NaN at the given iteration.
    NonFiniteResidual(usize),
    /// The line search failed to produce an acceptable step.
    LineSearchFailure(FunctionError),
}

impl Display for NewtonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            NewtonError::NonConvergence(iterations) => {
                write!(f, "Newton's method did not converge within {} iterations.", iterations)
            }
            NewtonError::SolverFailure(err) => {
                write!(f, "Failed to solve Jacobian system. Error: {}", err)
            }
            NewtonError::EvaluationFailure(err) => {
                write!(f, "Failed to evaluate the residual. Error: {}", err)
            }
            NewtonError::NonFiniteResidual(iteration) => {
                write!(f, "Residual is not finite at Newton iteration {}.", iteration)
            }
            NewtonError::LineSearchFailure(err) => {
                write!(f, "Line search failed to produce valid step direction. Error: {}", err)
            }
        }
    }
}

impl Error for NewtonError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            NewtonError::SolverFailure(err)
            | NewtonError::EvaluationFailure(err)
            | NewtonError::LineSearchFailure(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

/// Attempts to solve the non-linear equation `F(x) = 0` with Newton's method.
///
/// Each iteration evaluates `F`, tests `|F(x)|_2 < tolerance` and otherwise solves
/// `J(x) dx = -F(x)` before updating `x += dx`. The buffers `f` and `dx` are used as
/// workspace, and no heap allocation is performed beyond the residual history.
///
/// On success, `x` holds the solution and `f` the residual at the solution.
pub fn newton<'a, T, F>(
    function: F,
    x: impl Into<DVectorViewMut<'a, T>>,
    f: impl Into<DVectorViewMut<'a, T>>,
    dx: impl Into<DVectorViewMut<'a, T>>,
    settings: NewtonSettings<T>,
) -> Result<NewtonOutput<T>, NewtonError>
where
    T: Real,
    F: DifferentiableVectorFunction<T>,
{
    newton_line_search(function, x, f, dx, settings, &mut NoLineSearch {})
}

/// Same as `newton`, but allows specifying a line search.
#[replace_float_literals(T::from_f64(literal).unwrap())]
pub fn newton_line_search<'a, T, F>(
    mut function: F,
    x: impl Into<DVectorViewMut<'a, T>>,
    f: impl Into<DVectorViewMut<'a, T>>,
    dx: impl Into<DVectorViewMut<'a, T>>,
    settings: NewtonSettings<T>,
    line_search: &mut impl LineSearch<T, F>,
) -> Result<NewtonOutput<T>, NewtonError>
where
    T: Real,
    F: DifferentiableVectorFunction<T>,
{
    let mut x = x.into();
    let mut f = f.into();
    let mut minus_dx = dx.into();

    assert_eq!(x.nrows(), f.nrows());
    assert_eq!(minus_dx.nrows(), f.nrows());

    function
        .eval_into(&mut f, &DVectorView::from(&x))
        .map_err(NewtonError::EvaluationFailure)?;

    let mut iteration = 1;
    let mut residual_history = Vec::new();

    loop {
        let residual_norm = f.norm();
        residual_history.push(residual_norm);
        info!(
            "Newton iteration {}, ndof {}, residual l2 norm {}",
            iteration,
            x.nrows(),
            residual_norm
        );

        if !residual_norm.is_finite() {
            return Err(NewtonError::NonFiniteResidual(iteration));
        }

        if residual_norm < settings.tolerance {
            return Ok(NewtonOutput {
                iterations: iteration,
                residual_norm,
                residual_history,
            });
        }

        if settings
            .max_iterations
            .map(|max_iter| iteration >= max_iter)
            .unwrap_or(false)
        {
            warn!(
                "Newton's method did not converge: residual norm {} after {} iterations",
                residual_norm, iteration
            );
            return Err(NewtonError::NonConvergence(iteration));
        }

        // J dx = -f   <=>   J (-dx) = f
        function
            .solve_jacobian_system(&mut minus_dx, &DVectorView::from(&x), &DVectorView::from(&f))
            .map_err(NewtonError::SolverFailure)?;

        minus_dx *= -1.0;
        let dx = &minus_dx;

        let step_length = line_search.step(
            &mut function,
            DVectorViewMut::from(&mut f),
            DVectorViewMut::from(&mut x),
            DVectorView::from(dx),
        )?;
        debug!("Newton step length at iteration {}: {}", iteration, step_length);
        iteration += 1;
    }
}

/// Strategy for taking a step along a Newton direction.
///
/// Implementations update `x` in place and leave `F(x)` at the new point in `f`.
pub trait LineSearch<T: Scalar, F: VectorFunction<T>> {
    fn step(
        &mut self,
        function: &mut F,
        f: DVectorViewMut<T>,
        x: DVectorViewMut<T>,
        direction: DVectorView<T>,
    ) -> Result<T, NewtonError>;
}

/// A single, full Newton step.
#[derive(Clone, Debug)]
pub struct NoLineSearch;

impl<T, F> LineSearch<T, F> for NoLineSearch
where
    T: Real,
    F: VectorFunction<T>,
{
    fn step(
        &mut self,
        function: &mut F,
        mut f: DVectorViewMut<T>,
        mut x: DVectorViewMut<T>,
        direction: DVectorView<T>,
    ) -> Result<T, NewtonError> {
        x.axpy(T::one(), &direction, T::one());
        function
            .eval_into(&mut f, &DVectorView::from(&x))
            .map_err(NewtonError::EvaluationFailure)?;
        Ok(T::one())
    }
}

/// Backtracking line search using the Armijo condition.
///
/// See Nocedal & Wright (2006), Numerical Optimization, Chapter 3.1.
#[derive(Clone, Debug)]
pub struct BacktrackingLineSearch {
    /// Sufficient decrease parameter in `(0, 1)`.
    pub c: f64,
    /// Smallest step length tried before giving up.
    pub alpha_min: f64,
}

impl Default for BacktrackingLineSearch {
    fn default() -> Self {
        Self {
            c: 1e-4,
            alpha_min: 1e-6,
        }
    }
}

impl<T, F> LineSearch<T, F> for BacktrackingLineSearch
where
    T: Real,
    F: VectorFunction<T>,
{
    #[replace_float_literals(T::from_f64(literal).unwrap())]
    fn step(
        &mut self,
        function: &mut F,
        mut f: DVectorViewMut<T>,
        mut x: DVectorViewMut<T>,
        direction: DVectorView<T>,
    ) -> Result<T, NewtonError> {
        // Minimize g(x) = (1/2) |F(x)|^2. If p is the exact Newton direction, then
        // grad F^T p = -F(x_k), and the sufficient decrease condition becomes
        //  g(x_k + alpha p) <= (1 - c alpha) g(x_k)
        let c = T::from_f64(self.c).unwrap();
        let alpha_min = T::from_f64(self.alpha_min).unwrap();

        let p = direction;
        let g_initial = 0.5 * f.magnitude_squared();

        // Full step first, then decrease slowly before decreasing geometrically
        let mut alpha_iter = [0.75, 0.5]
            .into_iter()
            .chain(iterate(0.25, |alpha_i| 0.25 * *alpha_i));

        let mut alpha_prev = T::zero();
        let mut alpha = T::one();

        loop {
            // x^{k + 1} = x^k + (alpha^k - alpha^{k - 1}) p
            x.axpy(alpha - alpha_prev, &p, T::one());
            function
                .eval_into(&mut f, &DVectorView::from(&x))
                .map_err(NewtonError::EvaluationFailure)?;

            let g = 0.5 * f.magnitude_squared();
            if g <= (1.0 - c * alpha) * g_initial {
                return Ok(alpha);
            } else if alpha < alpha_min {
                return Err(NewtonError::LineSearchFailure(Box::from(format!(
                    "Alpha {} is smaller than minimum allowed alpha {}.",
                    alpha, alpha_min
                ))));
            }

            alpha_prev = alpha;
            // The tail of the sequence is infinite
            alpha = alpha_iter.next().unwrap_or(alpha * 0.25);
        }
    }
}
