//! Lagrange elements on quadrilaterals.
//!
//! The reference element is the square `[-1, 1]^2`. Basis functions are tensor products of
//! one-dimensional Lagrange polynomials of degree 1 or 2 with equispaced nodes, and local nodes
//! are numbered lexicographically: node `(a, b)` has index `b * (p + 1) + a`.
use crate::config::ConfigurationError;
use nalgebra::{Matrix2, Point2, Vector2};

/// Tensor-product Lagrange basis of degree `p` on the reference square.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LagrangeQuad {
    degree: usize,
}

impl LagrangeQuad {
    pub fn new(degree: usize) -> Result<Self, ConfigurationError> {
        match degree {
            1 | 2 => Ok(Self { degree }),
            _ => Err(ConfigurationError::UnsupportedPolynomialDegree(degree)),
        }
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Number of nodes along each reference axis.
    pub fn nodes_per_dim(&self) -> usize {
        self.degree + 1
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes_per_dim() * self.nodes_per_dim()
    }

    /// Reference coordinate of the `a`-th node along an axis.
    pub fn node_coordinate_1d(&self, a: usize) -> f64 {
        -1.0 + 2.0 * a as f64 / self.degree as f64
    }

    pub fn reference_node(&self, k: usize) -> Point2<f64> {
        let n = self.nodes_per_dim();
        Point2::new(self.node_coordinate_1d(k % n), self.node_coordinate_1d(k / n))
    }

    fn phi_1d(&self, a: usize, t: f64) -> f64 {
        match (self.degree, a) {
            (1, 0) => (1.0 - t) / 2.0,
            (1, _) => (1.0 + t) / 2.0,
            (_, 0) => t * (t - 1.0) / 2.0,
            (_, 1) => 1.0 - t * t,
            _ => t * (t + 1.0) / 2.0,
        }
    }

    fn phi_1d_derivative(&self, a: usize, t: f64) -> f64 {
        match (self.degree, a) {
            (1, 0) => -0.5,
            (1, _) => 0.5,
            (_, 0) => t - 0.5,
            (_, 1) => -2.0 * t,
            _ => t + 0.5,
        }
    }

    /// Evaluates every basis function at `xi`.
    pub fn populate_basis(&self, basis_values: &mut [f64], xi: &Point2<f64>) {
        assert_eq!(basis_values.len(), self.num_nodes(), "one value per node");
        let n = self.nodes_per_dim();
        for (k, value) in basis_values.iter_mut().enumerate() {
            let (a, b) = (k % n, k / n);
            *value = self.phi_1d(a, xi.x) * self.phi_1d(b, xi.y);
        }
    }

    /// Evaluates the reference gradient of every basis function at `xi`.
    pub fn populate_basis_gradients(&self, gradients: &mut [Vector2<f64>], xi: &Point2<f64>) {
        assert_eq!(gradients.len(), self.num_nodes(), "one gradient per node");
        let n = self.nodes_per_dim();
        for (k, gradient) in gradients.iter_mut().enumerate() {
            let (a, b) = (k % n, k / n);
            *gradient = Vector2::new(
                self.phi_1d_derivative(a, xi.x) * self.phi_1d(b, xi.y),
                self.phi_1d(a, xi.x) * self.phi_1d_derivative(b, xi.y),
            );
        }
    }

    /// The local node sitting at corner `corner` (counter-clockwise from `(-1, -1)`).
    pub fn corner_node(&self, corner: usize) -> usize {
        let p = self.degree;
        let n = self.nodes_per_dim();
        let (a, b) = match corner {
            0 => (0, 0),
            1 => (p, 0),
            2 => (p, p),
            _ => (0, p),
        };
        b * n + a
    }

    /// The local nodes on `edge`, excluding its two corners, in the direction of the edge.
    pub fn edge_interior_nodes(&self, edge: usize) -> Vec<usize> {
        let p = self.degree;
        let n = self.nodes_per_dim();
        (1..p)
            .map(|s| {
                let (a, b) = match edge {
                    0 => (s, 0),
                    1 => (p, s),
                    2 => (p - s, p),
                    _ => (0, p - s),
                };
                b * n + a
            })
            .collect()
    }

    /// Local nodes strictly inside the element.
    pub fn interior_nodes(&self) -> Vec<usize> {
        let n = self.nodes_per_dim();
        let p = self.degree;
        (1..p)
            .flat_map(|b| (1..p).map(move |a| b * n + a))
            .collect()
    }

    /// All local nodes on `edge`, corners included.
    pub fn edge_nodes(&self, edge: usize) -> Vec<usize> {
        let mut nodes = vec![self.corner_node(edge)];
        nodes.extend(self.edge_interior_nodes(edge));
        nodes.push(self.corner_node((edge + 1) % 4));
        nodes
    }
}

/// The bilinear map from the reference square onto a physical quadrilateral.
///
/// Vertices are given counter-clockwise, with vertex 0 mapped from `(-1, -1)`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Quad4Geometry {
    vertices: [Point2<f64>; 4],
}

/// Reference corners of the bilinear map, in vertex order.
const REFERENCE_CORNERS: [[f64; 2]; 4] = [[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0]];

impl Quad4Geometry {
    pub fn from_vertices(vertices: [Point2<f64>; 4]) -> Self {
        Self { vertices }
    }

    pub fn reference() -> Self {
        Self::from_vertices(REFERENCE_CORNERS.map(|[x, y]| Point2::new(x, y)))
    }

    pub fn vertices(&self) -> &[Point2<f64>; 4] {
        &self.vertices
    }

    fn shape(&self, xi: &Point2<f64>) -> [f64; 4] {
        REFERENCE_CORNERS.map(|[alpha, beta]| (1.0 + alpha * xi.x) * (1.0 + beta * xi.y) / 4.0)
    }

    fn shape_gradients(&self, xi: &Point2<f64>) -> [Vector2<f64>; 4] {
        REFERENCE_CORNERS.map(|[alpha, beta]| {
            Vector2::new(alpha * (1.0 + beta * xi.y) / 4.0, beta * (1.0 + alpha * xi.x) / 4.0)
        })
    }

    pub fn map_reference_coords(&self, xi: &Point2<f64>) -> Point2<f64> {
        let n = self.shape(xi);
        let mut x = Vector2::zeros();
        for (vertex, weight) in self.vertices.iter().zip(n) {
            x += vertex.coords * weight;
        }
        Point2::from(x)
    }

    /// The Jacobian `J_ij = ∂x_i / ∂ξ_j` of the reference map at `xi`.
    pub fn reference_jacobian(&self, xi: &Point2<f64>) -> Matrix2<f64> {
        let mut jacobian = Matrix2::zeros();
        for (vertex, gradient) in self.vertices.iter().zip(self.shape_gradients(xi)) {
            jacobian += vertex.coords * gradient.transpose();
        }
        jacobian
    }

    /// Endpoints of local edge `edge`, oriented counter-clockwise around the element.
    pub fn edge_vertices(&self, edge: usize) -> (Point2<f64>, Point2<f64>) {
        (self.vertices[edge % 4], self.vertices[(edge + 1) % 4])
    }

    /// Unit outward normal and unit tangent of local edge `edge`, and its length.
    pub fn edge_frame(&self, edge: usize) -> (Vector2<f64>, Vector2<f64>, f64) {
        let (a, b) = self.edge_vertices(edge);
        let d = b - a;
        let length = d.norm();
        let tangent = d / length;
        let normal = Vector2::new(tangent.y, -tangent.x);
        (normal, tangent, length)
    }

    pub fn diameter(&self) -> f64 {
        let v = &self.vertices;
        let diagonals = [(v[0] - v[2]).norm(), (v[1] - v[3]).norm()];
        diagonals[0].max(diagonals[1])
    }
}

/// The reference point at parameter `t ∈ [-1, 1]` along local edge `edge`.
///
/// The parametrization follows the counter-clockwise orientation of the element boundary.
pub fn edge_reference_point(edge: usize, t: f64) -> Point2<f64> {
    match edge % 4 {
        0 => Point2::new(t, -1.0),
        1 => Point2::new(1.0, t),
        2 => Point2::new(-t, 1.0),
        _ => Point2::new(-1.0, -t),
    }
}
