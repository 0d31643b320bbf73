//! Conforming quadrilateral meshes with region and boundary markers.
use crate::element::Quad4Geometry;
use eyre::eyre;
use nalgebra::Point2;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

pub mod procedural;

/// A boundary edge, identified by its element and the local edge index within that element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryEdge {
    pub element: usize,
    pub local_edge: usize,
    pub marker: String,
}

/// Index-based mesh of counter-clockwise quadrilaterals without hanging nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuadMesh2d {
    vertices: Vec<Point2<f64>>,
    connectivity: Vec<[usize; 4]>,
    element_markers: Vec<String>,
    boundary_edges: Vec<BoundaryEdge>,
}

impl QuadMesh2d {
    /// Constructs a mesh in which every element carries `region` and boundary edges are
    /// still unmarked. See [`QuadMesh2d::mark_boundary`].
    pub fn from_vertices_and_connectivity(
        vertices: Vec<Point2<f64>>,
        connectivity: Vec<[usize; 4]>,
        region: &str,
    ) -> eyre::Result<Self> {
        if let Some(index) = connectivity.iter().flatten().find(|&&v| v >= vertices.len()) {
            return Err(eyre!(
                "connectivity refers to vertex {} but the mesh has {} vertices",
                index,
                vertices.len()
            ));
        }
        let element_markers = vec![region.to_string(); connectivity.len()];
        Ok(Self {
            vertices,
            connectivity,
            element_markers,
            boundary_edges: Vec::new(),
        })
    }

    pub fn vertices(&self) -> &[Point2<f64>] {
        &self.vertices
    }

    pub fn connectivity(&self) -> &[[usize; 4]] {
        &self.connectivity
    }

    pub fn num_elements(&self) -> usize {
        self.connectivity.len()
    }

    pub fn element_marker(&self, element: usize) -> &str {
        &self.element_markers[element]
    }

    pub fn set_element_marker(&mut self, element: usize, marker: impl Into<String>) {
        self.element_markers[element] = marker.into();
    }

    pub fn boundary_edges(&self) -> &[BoundaryEdge] {
        &self.boundary_edges
    }

    pub fn element_geometry(&self, element: usize) -> Quad4Geometry {
        let conn = &self.connectivity[element];
        Quad4Geometry::from_vertices(conn.map(|v| self.vertices[v]))
    }

    /// Global vertex indices of local edge `edge` of `element`.
    pub fn edge_vertex_indices(&self, element: usize, edge: usize) -> [usize; 2] {
        let conn = &self.connectivity[element];
        [conn[edge % 4], conn[(edge + 1) % 4]]
    }

    /// Edges belonging to exactly one element, as `(element, local edge)` pairs.
    pub fn find_boundary_edges(&self) -> Vec<(usize, usize)> {
        let mut counts: FxHashMap<[usize; 2], (usize, usize, usize)> = FxHashMap::default();
        for element in 0..self.num_elements() {
            for edge in 0..4 {
                let [a, b] = self.edge_vertex_indices(element, edge);
                let key = [a.min(b), a.max(b)];
                counts.entry(key).or_insert((element, edge, 0)).2 += 1;
            }
        }
        let mut boundary: Vec<_> = counts
            .into_values()
            .filter(|&(_, _, count)| count == 1)
            .map(|(element, edge, _)| (element, edge))
            .collect();
        boundary.sort_unstable();
        boundary
    }

    /// Replaces the boundary markers, assigning each boundary edge the marker returned for its
    /// midpoint.
    pub fn mark_boundary(&mut self, mut marker: impl FnMut(&Point2<f64>) -> String) {
        self.boundary_edges = self
            .find_boundary_edges()
            .into_iter()
            .map(|(element, local_edge)| {
                let [a, b] = self.edge_vertex_indices(element, local_edge);
                let midpoint = nalgebra::center(&self.vertices[a], &self.vertices[b]);
                BoundaryEdge {
                    element,
                    local_edge,
                    marker: marker(&midpoint),
                }
            })
            .collect();
    }

    /// Whether any boundary edge carries `marker`.
    pub fn has_boundary_marker(&self, marker: &str) -> bool {
        self.boundary_edges.iter().any(|edge| edge.marker == marker)
    }

    pub fn transform_vertices(&mut self, mut transformation: impl FnMut(&mut Point2<f64>)) {
        for v in &mut self.vertices {
            transformation(v);
        }
    }
}
