//! Solver configuration and configuration errors.
use crate::linear::LinearSolverBackend;
use crate::projection::ProjectionNorm;
use crate::weakform::GeometryMode;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::fmt::{Display, Formatter};

/// Errors detected while setting up terms, weak forms or spaces.
///
/// These are always fatal: a misconfigured problem is rejected before any assembly happens.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ConfigurationError {
    /// The term has no formulation for the requested geometry.
    UnsupportedGeometry { term: &'static str, geometry: GeometryMode },
    /// A term refers to an equation or unknown the weak form does not have.
    FormIndexOutOfBounds { index: usize, num_equations: usize },
    /// The number of spaces does not match the number of equations of the weak form.
    SpaceCountMismatch { expected: usize, actual: usize },
    /// The spaces of a discrete problem are defined on different meshes.
    MeshMismatch,
    InvalidSpline(String),
    InvalidMultiComponentForm(String),
    /// Only polynomial degrees 1 and 2 are supported.
    UnsupportedPolynomialDegree(usize),
    /// A boundary condition refers to a marker that no boundary edge carries.
    UnknownBoundaryMarker(String),
}

impl Display for ConfigurationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedGeometry { term, geometry } => {
                write!(f, "{} is not available for geometry {:?}", term, geometry)
            }
            Self::FormIndexOutOfBounds { index, num_equations } => {
                write!(
                    f,
                    "form index {} out of bounds for weak form with {} equations",
                    index, num_equations
                )
            }
            Self::SpaceCountMismatch { expected, actual } => {
                write!(f, "expected {} spaces, got {}", expected, actual)
            }
            Self::MeshMismatch => write!(f, "all spaces must be defined on the same mesh"),
            Self::InvalidSpline(reason) => write!(f, "invalid spline table: {}", reason),
            Self::InvalidMultiComponentForm(reason) => write!(f, "invalid multi-component form: {}", reason),
            Self::UnsupportedPolynomialDegree(degree) => {
                write!(f, "polynomial degree {} is not supported (expected 1 or 2)", degree)
            }
            Self::UnknownBoundaryMarker(marker) => write!(f, "no boundary edge has marker \"{}\"", marker),
        }
    }
}

impl Error for ConfigurationError {}

/// Line search used by the Newton solver.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineSearchKind {
    /// Full Newton steps.
    #[default]
    None,
    /// Armijo backtracking.
    Backtracking,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewtonConfig {
    pub tolerance: f64,
    /// Largest iteration number at which convergence is still accepted.
    pub max_iterations: usize,
    pub line_search: LineSearchKind,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            max_iterations: 100,
            line_search: LineSearchKind::None,
        }
    }
}

/// Everything the Newton solver needs besides the discrete problem itself.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub newton: NewtonConfig,
    pub linear_solver: LinearSolverBackend,
    /// Norm used to project initial guesses.
    pub projection: ProjectionNorm,
}
