//! Continuous Lagrange spaces over quadrilateral meshes.
//!
//! Global nodes are numbered vertices first, then edge nodes in order of first appearance,
//! then element interior nodes. Nodes on Dirichlet boundaries are eliminated from the unknowns:
//! their values are fixed by nodal interpolation of the boundary data, and they only enter the
//! discrete problem through the samples of the current iterate.
use crate::coefficient::{Constant, SpatialCoefficient, SpatialCoefficientSource};
use crate::config::ConfigurationError;
use crate::element::LagrangeQuad;
use crate::mesh::QuadMesh2d;
use eyre::eyre;
use nalgebra::{DVectorView, Point2, Vector2};
use rustc_hash::FxHashMap;

/// Dirichlet data `u = g(x, y)` on the boundary edges carrying `marker`.
#[derive(Debug, Clone)]
pub struct DirichletBoundary<'a> {
    marker: String,
    value: SpatialCoefficient<'a>,
}

impl<'a> DirichletBoundary<'a> {
    pub fn new(marker: impl Into<String>, value: SpatialCoefficientSource<'a>) -> Self {
        Self {
            marker: marker.into(),
            value: value.resolve(),
        }
    }

    /// Homogeneous Dirichlet data.
    pub fn zero(marker: impl Into<String>) -> Self {
        Self::new(marker, SpatialCoefficientSource::owned(Constant(0.0)))
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    pub fn value_at(&self, point: &Point2<f64>) -> f64 {
        self.value.value(point.x, point.y)
    }
}

/// How a global node enters the discrete problem.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum NodeDof {
    /// The node carries the given degree of freedom.
    Free(usize),
    /// The node value is prescribed.
    Constrained(f64),
}

/// A finite element function evaluated at one point of an element.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointEvaluation {
    pub point: Point2<f64>,
    pub value: f64,
    pub gradient: Vector2<f64>,
    pub jacobian_determinant: f64,
}

/// An H1-conforming space of continuous, piecewise polynomial functions of degree 1 or 2.
#[derive(Debug, Clone)]
pub struct H1Space<'m> {
    mesh: &'m QuadMesh2d,
    basis: LagrangeQuad,
    // Global node of each local node, `basis.num_nodes()` entries per element
    element_nodes: Vec<usize>,
    node_coordinates: Vec<Point2<f64>>,
    node_dofs: Vec<NodeDof>,
    num_dofs: usize,
}

impl<'m> H1Space<'m> {
    /// A space without Dirichlet conditions.
    pub fn new(mesh: &'m QuadMesh2d, degree: usize) -> Result<Self, ConfigurationError> {
        Self::with_dirichlet(mesh, degree, &[])
    }

    pub fn with_dirichlet(
        mesh: &'m QuadMesh2d,
        degree: usize,
        dirichlet: &[DirichletBoundary],
    ) -> Result<Self, ConfigurationError> {
        let basis = LagrangeQuad::new(degree)?;
        for bc in dirichlet {
            if !mesh.has_boundary_marker(bc.marker()) {
                return Err(ConfigurationError::UnknownBoundaryMarker(bc.marker().to_string()));
            }
        }

        let (element_nodes, node_coordinates) = number_nodes(mesh, &basis);

        // Nodes shared by several boundaries take the value of the first condition in the list
        let mut constraints: Vec<Option<f64>> = vec![None; node_coordinates.len()];
        let nodes_per_element = basis.num_nodes();
        for bc in dirichlet {
            for edge in mesh.boundary_edges().iter().filter(|edge| edge.marker == bc.marker()) {
                let nodes = &element_nodes[edge.element * nodes_per_element..][..nodes_per_element];
                for local in basis.edge_nodes(edge.local_edge) {
                    let node = nodes[local];
                    constraints[node].get_or_insert_with(|| bc.value_at(&node_coordinates[node]));
                }
            }
        }

        let mut num_dofs = 0;
        let node_dofs = constraints
            .into_iter()
            .map(|constraint| match constraint {
                Some(value) => NodeDof::Constrained(value),
                None => {
                    num_dofs += 1;
                    NodeDof::Free(num_dofs - 1)
                }
            })
            .collect();

        Ok(Self {
            mesh,
            basis,
            element_nodes,
            node_coordinates,
            node_dofs,
            num_dofs,
        })
    }

    pub fn mesh(&self) -> &'m QuadMesh2d {
        self.mesh
    }

    pub fn basis(&self) -> &LagrangeQuad {
        &self.basis
    }

    pub fn degree(&self) -> usize {
        self.basis.degree()
    }

    pub fn num_dofs(&self) -> usize {
        self.num_dofs
    }

    pub fn num_nodes(&self) -> usize {
        self.node_coordinates.len()
    }

    pub fn node_coordinates(&self) -> &[Point2<f64>] {
        &self.node_coordinates
    }

    pub fn node_dof(&self, node: usize) -> NodeDof {
        self.node_dofs[node]
    }

    /// Global nodes of `element`, in local node order.
    pub fn element_nodes(&self, element: usize) -> &[usize] {
        let n = self.basis.num_nodes();
        &self.element_nodes[element * n..(element + 1) * n]
    }

    /// Writes the nodal values of `element` into `values`, reading free values from the
    /// global coefficient vector `coefficients` at `offset + dof`.
    pub fn populate_element_values(
        &self,
        element: usize,
        coefficients: DVectorView<f64>,
        offset: usize,
        values: &mut Vec<f64>,
    ) {
        values.clear();
        values.extend(
            self.element_nodes(element)
                .iter()
                .map(|&node| match self.node_dofs[node] {
                    NodeDof::Free(dof) => coefficients[offset + dof],
                    NodeDof::Constrained(value) => value,
                }),
        );
    }

    /// Evaluates the function with nodal values `nodal_values` on `element` at the reference
    /// point `xi`.
    pub fn evaluate_at_reference(
        &self,
        element: usize,
        nodal_values: &[f64],
        xi: &Point2<f64>,
    ) -> eyre::Result<PointEvaluation> {
        let geometry = self.mesh.element_geometry(element);
        let jacobian = geometry.reference_jacobian(xi);
        let inverse_transpose = jacobian
            .try_inverse()
            .ok_or_else(|| eyre!("element {} has a singular reference Jacobian", element))?
            .transpose();

        let n = self.basis.num_nodes();
        let mut phi = vec![0.0; n];
        let mut grad_phi = vec![Vector2::zeros(); n];
        self.basis.populate_basis(&mut phi, xi);
        self.basis.populate_basis_gradients(&mut grad_phi, xi);

        let value = phi.iter().zip(nodal_values).map(|(p, c)| p * c).sum();
        let reference_gradient: Vector2<f64> = grad_phi
            .iter()
            .zip(nodal_values)
            .map(|(g, c)| g * *c)
            .sum();

        Ok(PointEvaluation {
            point: geometry.map_reference_coords(xi),
            value,
            gradient: inverse_transpose * reference_gradient,
            jacobian_determinant: jacobian.determinant(),
        })
    }

    /// The nodal interpolant of `f` restricted to the free degrees of freedom.
    pub fn interpolate(&self, f: impl Fn(&Point2<f64>) -> f64) -> Vec<f64> {
        let mut values = vec![0.0; self.num_dofs];
        for (node, dof) in self.node_dofs.iter().enumerate() {
            if let NodeDof::Free(dof) = dof {
                values[*dof] = f(&self.node_coordinates[node]);
            }
        }
        values
    }
}

fn number_nodes(mesh: &QuadMesh2d, basis: &LagrangeQuad) -> (Vec<usize>, Vec<Point2<f64>>) {
    let nodes_per_element = basis.num_nodes();
    let mut node_coordinates = mesh.vertices().to_vec();
    let mut element_nodes = vec![usize::MAX; mesh.num_elements() * nodes_per_element];

    let mut edge_nodes: FxHashMap<[usize; 2], usize> = FxHashMap::default();
    for element in 0..mesh.num_elements() {
        let geometry = mesh.element_geometry(element);
        let conn = mesh.connectivity()[element];
        let nodes = &mut element_nodes[element * nodes_per_element..][..nodes_per_element];

        for corner in 0..4 {
            nodes[basis.corner_node(corner)] = conn[corner];
        }
        for edge in 0..4 {
            let [a, b] = mesh.edge_vertex_indices(element, edge);
            // Degree <= 2 has at most one node per edge, so the orientation does not matter
            for local in basis.edge_interior_nodes(edge) {
                nodes[local] = *edge_nodes.entry([a.min(b), a.max(b)]).or_insert_with(|| {
                    node_coordinates.push(geometry.map_reference_coords(&basis.reference_node(local)));
                    node_coordinates.len() - 1
                });
            }
        }
    }

    for element in 0..mesh.num_elements() {
        let geometry = mesh.element_geometry(element);
        for local in basis.interior_nodes() {
            node_coordinates.push(geometry.map_reference_coords(&basis.reference_node(local)));
            element_nodes[element * nodes_per_element + local] = node_coordinates.len() - 1;
        }
    }

    debug_assert!(element_nodes.iter().all(|&n| n != usize::MAX));
    (element_nodes, node_coordinates)
}
