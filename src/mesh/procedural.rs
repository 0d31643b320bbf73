//! Procedural generation of structured quadrilateral meshes.
//!
//! Generated meshes mark every element with the region `"domain"`, and boundary edges with
//! `"bottom"`, `"right"`, `"top"` or `"left"`.
use crate::mesh::{BoundaryEdge, QuadMesh2d};
use itertools::iproduct;
use nalgebra::Point2;

pub const DOMAIN_MARKER: &str = "domain";
pub const BOTTOM_MARKER: &str = "bottom";
pub const RIGHT_MARKER: &str = "right";
pub const TOP_MARKER: &str = "top";
pub const LEFT_MARKER: &str = "left";

/// `num_cells + 1` equispaced coordinates from `a` to `b`.
pub fn uniform_coordinates(a: f64, b: f64, num_cells: usize) -> Vec<f64> {
    assert!(num_cells > 0, "at least one cell is required");
    let h = (b - a) / num_cells as f64;
    (0..=num_cells)
        .map(|i| if i == num_cells { b } else { a + i as f64 * h })
        .collect()
}

/// Halves the first and the last cell of a coordinate list `times` times.
pub fn refine_towards_boundary(coordinates: &[f64], times: usize) -> Vec<f64> {
    let mut coordinates = coordinates.to_vec();
    for _ in 0..times {
        let n = coordinates.len();
        if n < 2 {
            break;
        }
        let first = 0.5 * (coordinates[0] + coordinates[1]);
        let last = 0.5 * (coordinates[n - 2] + coordinates[n - 1]);
        coordinates.insert(1, first);
        if n > 2 {
            let n = coordinates.len();
            coordinates.insert(n - 1, last);
        }
    }
    coordinates
}

/// The tensor-product mesh with vertex coordinates `xs × ys`.
///
/// Both coordinate lists must be strictly increasing and contain at least two entries.
pub fn create_tensor_product_quad_mesh_2d(xs: &[f64], ys: &[f64]) -> QuadMesh2d {
    assert!(xs.len() >= 2 && ys.len() >= 2, "at least one cell per dimension is required");
    assert!(
        xs.windows(2).chain(ys.windows(2)).all(|w| w[0] < w[1]),
        "coordinates must be strictly increasing"
    );
    let (nx, ny) = (xs.len() - 1, ys.len() - 1);
    let vertex_index = |i: usize, j: usize| j * (nx + 1) + i;

    let vertices = iproduct!(ys, xs).map(|(&y, &x)| Point2::new(x, y)).collect();
    let mut connectivity = Vec::with_capacity(nx * ny);
    let mut boundary_edges = Vec::new();
    for (j, i) in iproduct!(0..ny, 0..nx) {
        let element = connectivity.len();
        connectivity.push([
            vertex_index(i, j),
            vertex_index(i + 1, j),
            vertex_index(i + 1, j + 1),
            vertex_index(i, j + 1),
        ]);

        let sides = [
            (j == 0, 0, BOTTOM_MARKER),
            (i == nx - 1, 1, RIGHT_MARKER),
            (j == ny - 1, 2, TOP_MARKER),
            (i == 0, 3, LEFT_MARKER),
        ];
        for (on_boundary, local_edge, marker) in sides {
            if on_boundary {
                boundary_edges.push(BoundaryEdge {
                    element,
                    local_edge,
                    marker: marker.to_string(),
                });
            }
        }
    }

    QuadMesh2d {
        vertices,
        element_markers: vec![DOMAIN_MARKER.to_string(); connectivity.len()],
        connectivity,
        boundary_edges,
    }
}

/// A uniform mesh of the rectangle `[x0, x1] × [y0, y1]`.
pub fn create_rectangular_uniform_quad_mesh_2d(
    [x0, x1]: [f64; 2],
    [y0, y1]: [f64; 2],
    cells_x: usize,
    cells_y: usize,
) -> QuadMesh2d {
    create_tensor_product_quad_mesh_2d(&uniform_coordinates(x0, x1, cells_x), &uniform_coordinates(y0, y1, cells_y))
}

pub fn create_unit_square_uniform_quad_mesh_2d(cells_per_dim: usize) -> QuadMesh2d {
    create_rectangular_uniform_quad_mesh_2d([0.0, 1.0], [0.0, 1.0], cells_per_dim, cells_per_dim)
}
