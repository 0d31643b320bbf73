//! Assembly of the global Jacobian and residual of a weak form.
//!
//! The residual is the sum of all vector forms, tested against every free basis function.
//! The Jacobian is the sum of all matrix forms, with rows indexed by free test functions and
//! columns by free trial functions. Prescribed (Dirichlet) nodes never appear as rows or
//! columns, but their values enter every form through the samples of the current iterate.
//!
//! Unknowns of the different equations are stacked: the degrees of freedom of space `i` occupy
//! the global range `offsets[i]..offsets[i] + spaces[i].num_dofs()`.
//!
//! Quadrature is chosen per form and per assembly from the form's symbolic order estimate.
use crate::config::ConfigurationError;
use crate::element::{edge_reference_point, Quad4Geometry};
use crate::order::Order;
use crate::quadrature::tensor::quadrilateral_gauss;
use crate::quadrature::univariate::gauss;
use crate::quadrature::{gauss_points_for_degree, MAX_GAUSS_POINTS};
use crate::space::{H1Space, NodeDof};
use crate::weakform::{Domain, FieldSamples, GeomSamples, SymFlag, WeakForm};
use eyre::eyre;
use log::{debug, warn};
use nalgebra::{DMatrix, DVector, DVectorView, DVectorViewMut, Point2, Vector2};
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use rustc_hash::FxHashMap;

/// A weak form bound to one space per equation.
#[derive(Debug, Clone)]
pub struct DiscreteProblem<'p, 'a> {
    weak_form: &'p WeakForm<'a>,
    spaces: Vec<&'p H1Space<'p>>,
    offsets: Vec<usize>,
    num_dofs: usize,
}

impl<'p, 'a> DiscreteProblem<'p, 'a> {
    /// Binds `weak_form` to `spaces`, one per equation. All spaces must share the same mesh.
    pub fn new(weak_form: &'p WeakForm<'a>, spaces: Vec<&'p H1Space<'p>>) -> Result<Self, ConfigurationError> {
        if spaces.len() != weak_form.neq() {
            return Err(ConfigurationError::SpaceCountMismatch {
                expected: weak_form.neq(),
                actual: spaces.len(),
            });
        }
        if let Some(first) = spaces.first() {
            if spaces.iter().any(|s| !std::ptr::eq(s.mesh(), first.mesh())) {
                return Err(ConfigurationError::MeshMismatch);
            }
        }
        for form in weak_form.multi_component_vector_forms() {
            let degrees: Vec<_> = form
                .header()
                .coordinates
                .iter()
                .map(|&i| spaces[i].degree())
                .collect();
            if degrees.windows(2).any(|w| w[0] != w[1]) {
                return Err(ConfigurationError::InvalidMultiComponentForm(
                    "all coordinates must use spaces of the same degree".to_string(),
                ));
            }
        }

        let mut offsets = Vec::with_capacity(spaces.len());
        let mut num_dofs = 0;
        for space in &spaces {
            offsets.push(num_dofs);
            num_dofs += space.num_dofs();
        }

        Ok(Self {
            weak_form,
            spaces,
            offsets,
            num_dofs,
        })
    }

    pub fn weak_form(&self) -> &'p WeakForm<'a> {
        self.weak_form
    }

    pub fn spaces(&self) -> &[&'p H1Space<'p>] {
        &self.spaces
    }

    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Total number of free degrees of freedom over all spaces.
    pub fn num_dofs(&self) -> usize {
        self.num_dofs
    }

    /// Assembles the Jacobian and the residual at `coefficients`.
    pub fn assemble(&self, coefficients: DVectorView<f64>) -> eyre::Result<(CsrMatrix<f64>, DVector<f64>)> {
        let mut jacobian = CooMatrix::new(self.num_dofs, self.num_dofs);
        let mut residual = DVector::zeros(self.num_dofs);
        self.assemble_into(coefficients, Some(&mut jacobian), Some(DVectorViewMut::from(&mut residual)))?;
        Ok((CsrMatrix::from(&jacobian), residual))
    }

    pub fn assemble_residual(&self, coefficients: DVectorView<f64>) -> eyre::Result<DVector<f64>> {
        let mut residual = DVector::zeros(self.num_dofs);
        self.assemble_into(coefficients, None, Some(DVectorViewMut::from(&mut residual)))?;
        Ok(residual)
    }

    pub fn assemble_jacobian(&self, coefficients: DVectorView<f64>) -> eyre::Result<CsrMatrix<f64>> {
        let mut jacobian = CooMatrix::new(self.num_dofs, self.num_dofs);
        self.assemble_into(coefficients, Some(&mut jacobian), None)?;
        Ok(CsrMatrix::from(&jacobian))
    }

    /// Accumulates the Jacobian and/or the residual at `coefficients` into caller-owned storage.
    ///
    /// Contributions are added, so the storage must be cleared by the caller beforehand.
    pub fn assemble_into(
        &self,
        coefficients: DVectorView<f64>,
        mut jacobian: Option<&mut CooMatrix<f64>>,
        mut residual: Option<DVectorViewMut<f64>>,
    ) -> eyre::Result<()> {
        if coefficients.len() != self.num_dofs {
            return Err(eyre!(
                "coefficient vector has length {}, but the problem has {} degrees of freedom",
                coefficients.len(),
                self.num_dofs
            ));
        }
        if let Some(jacobian) = &jacobian {
            if jacobian.nrows() != self.num_dofs || jacobian.ncols() != self.num_dofs {
                return Err(eyre!(
                    "Jacobian has dimensions {}x{}, expected {}x{}",
                    jacobian.nrows(),
                    jacobian.ncols(),
                    self.num_dofs,
                    self.num_dofs
                ));
            }
        }
        if let Some(residual) = &residual {
            if residual.len() != self.num_dofs {
                return Err(eyre!(
                    "residual has length {}, expected {}",
                    residual.len(),
                    self.num_dofs
                ));
            }
        }

        let plan = self.quadrature_plan();
        let mesh = match self.spaces.first() {
            Some(space) => space.mesh(),
            None => return Ok(()),
        };
        debug!(
            "Assembling {} elements and {} boundary edges, {} dofs",
            mesh.num_elements(),
            mesh.boundary_edges().len(),
            self.num_dofs
        );

        let mut data = PointData::default();
        let mut target = Target {
            jacobian: jacobian.as_deref_mut(),
            residual: residual.as_mut(),
        };

        for element in 0..mesh.num_elements() {
            let marker = mesh.element_marker(element);
            let geometry = mesh.element_geometry(element);
            for (&n, forms) in &plan.volume {
                if !forms.is_active(self.weak_form, marker) {
                    continue;
                }
                let (weights, points) = &plan.volume_rules[&n];
                let points = points.iter().map(|&[x, y]| Point2::new(x, y));
                data.populate(self, coefficients, element, &geometry, points, weights, None)?;
                self.evaluate_forms(forms, marker, element, &data, &mut target);
            }
        }

        for edge in mesh.boundary_edges() {
            let geometry = mesh.element_geometry(edge.element);
            let (normal, tangent, length) = geometry.edge_frame(edge.local_edge);
            for (&n, forms) in &plan.surface {
                if !forms.is_active(self.weak_form, &edge.marker) {
                    continue;
                }
                let (weights, points) = &plan.surface_rules[&n];
                let points = points
                    .iter()
                    .map(|&[t]| edge_reference_point(edge.local_edge, t));
                let frame = EdgeFrame {
                    normal,
                    tangent,
                    half_length: 0.5 * length,
                };
                data.populate(self, coefficients, edge.element, &geometry, points, weights, Some(frame))?;
                self.evaluate_forms(forms, &edge.marker, edge.element, &data, &mut target);
            }
        }

        Ok(())
    }

    /// Groups the forms by the number of Gauss points their order estimates require.
    fn quadrature_plan(&self) -> QuadraturePlan {
        let degree = |space: usize| Order::new(self.spaces[space].degree() as u32);
        let u_ext: Vec<_> = (0..self.spaces.len())
            .map(|s| FieldSamples::of_order(degree(s)))
            .collect();
        let geometry = |domain: Domain| GeomSamples::symbolic(domain == Domain::Surface);

        let mut plan = QuadraturePlan::default();
        for (index, form) in self.weak_form.matrix_forms().iter().enumerate() {
            let header = form.header();
            let order = form.order(
                &u_ext,
                &FieldSamples::of_order(degree(header.j)),
                &FieldSamples::of_order(degree(header.i)),
                &geometry(header.domain),
            );
            plan.group(header.domain, order, "matrix form", index).matrix.push(index);
        }
        for (index, form) in self.weak_form.vector_forms().iter().enumerate() {
            let header = form.header();
            let order = form.order(&u_ext, &FieldSamples::of_order(degree(header.i)), &geometry(header.domain));
            plan.group(header.domain, order, "vector form", index).vector.push(index);
        }
        for (index, form) in self.weak_form.multi_component_vector_forms().iter().enumerate() {
            let header = form.header();
            let test_degree = header.coordinates.first().map(|&i| degree(i)).unwrap_or(Order::ZERO);
            let order = form.order(&u_ext, &FieldSamples::of_order(test_degree), &geometry(header.domain));
            plan.group(header.domain, order, "multi-component form", index)
                .multi_component
                .push(index);
        }

        plan.volume_rules = plan
            .volume
            .keys()
            .map(|&n| (n, quadrilateral_gauss(n)))
            .collect();
        plan.surface_rules = plan.surface.keys().map(|&n| (n, gauss(n))).collect();
        plan
    }

    fn evaluate_forms(&self, forms: &FormGroup, marker: &str, element: usize, data: &PointData, target: &mut Target) {
        let wt = &data.weights;
        let e = &data.geometry;
        let u_ext = &data.u_ext;

        if let Some(jacobian) = target.jacobian.as_deref_mut() {
            for &index in &forms.matrix {
                let form = &self.weak_form.matrix_forms()[index];
                let header = form.header();
                if !header.area.contains(marker) {
                    continue;
                }
                let (test, trial) = (&data.basis[header.i], &data.basis[header.j]);
                let mut local = DMatrix::zeros(test.len(), trial.len());
                let mirrored = header.i == header.j && header.sym != SymFlag::NonSymmetric;
                for (a, v) in test.iter().enumerate() {
                    for (b, u) in trial.iter().enumerate() {
                        if mirrored && b < a {
                            continue;
                        }
                        local[(a, b)] = form.value(wt, u_ext, u, v, e);
                    }
                }
                if mirrored {
                    let sign = if header.sym == SymFlag::AntiSymmetric { -1.0 } else { 1.0 };
                    for a in 0..test.len() {
                        // The diagonal of an antisymmetric form vanishes, so it is never evaluated
                        if header.sym == SymFlag::AntiSymmetric {
                            local[(a, a)] = 0.0;
                        }
                        for b in 0..a {
                            local[(a, b)] = sign * local[(b, a)];
                        }
                    }
                }

                let rows = self.spaces[header.i].element_nodes(element);
                let cols = self.spaces[header.j].element_nodes(element);
                for (a, &row_node) in rows.iter().enumerate() {
                    let NodeDof::Free(row) = self.spaces[header.i].node_dof(row_node) else {
                        continue;
                    };
                    for (b, &col_node) in cols.iter().enumerate() {
                        if let NodeDof::Free(col) = self.spaces[header.j].node_dof(col_node) {
                            jacobian.push(
                                self.offsets[header.i] + row,
                                self.offsets[header.j] + col,
                                local[(a, b)],
                            );
                        }
                    }
                }
            }
        }

        if let Some(residual) = target.residual.as_deref_mut() {
            for &index in &forms.vector {
                let form = &self.weak_form.vector_forms()[index];
                let header = form.header();
                if !header.area.contains(marker) {
                    continue;
                }
                let space = self.spaces[header.i];
                for (v, &node) in data.basis[header.i].iter().zip(space.element_nodes(element)) {
                    if let NodeDof::Free(dof) = space.node_dof(node) {
                        residual[self.offsets[header.i] + dof] += form.value(wt, u_ext, v, e);
                    }
                }
            }

            let mut values = Vec::new();
            for &index in &forms.multi_component {
                let form = &self.weak_form.multi_component_vector_forms()[index];
                let header = form.header();
                let Some(&first) = header.coordinates.first() else {
                    continue;
                };
                if !header.area.contains(marker) {
                    continue;
                }
                values.resize(header.coordinates.len(), 0.0);
                for (a, v) in data.basis[first].iter().enumerate() {
                    form.value(wt, u_ext, v, e, &mut values);
                    for (&i, value) in header.coordinates.iter().zip(&values) {
                        let node = self.spaces[i].element_nodes(element)[a];
                        if let NodeDof::Free(dof) = self.spaces[i].node_dof(node) {
                            residual[self.offsets[i] + dof] += value;
                        }
                    }
                }
            }
        }
    }
}

struct Target<'t, 'r> {
    jacobian: Option<&'t mut CooMatrix<f64>>,
    residual: Option<&'t mut DVectorViewMut<'r, f64>>,
}

/// Indices of the forms sharing one quadrature rule.
#[derive(Debug, Default)]
struct FormGroup {
    matrix: Vec<usize>,
    vector: Vec<usize>,
    multi_component: Vec<usize>,
}

impl FormGroup {
    fn is_active(&self, weak_form: &WeakForm, marker: &str) -> bool {
        self.matrix
            .iter()
            .any(|&i| weak_form.matrix_forms()[i].header().area.contains(marker))
            || self
                .vector
                .iter()
                .any(|&i| weak_form.vector_forms()[i].header().area.contains(marker))
            || self
                .multi_component
                .iter()
                .any(|&i| weak_form.multi_component_vector_forms()[i].header().area.contains(marker))
    }
}

#[derive(Debug, Default)]
struct QuadraturePlan {
    volume: FxHashMap<usize, FormGroup>,
    surface: FxHashMap<usize, FormGroup>,
    volume_rules: FxHashMap<usize, crate::quadrature::Rule2d>,
    surface_rules: FxHashMap<usize, crate::quadrature::Rule1d>,
}

impl QuadraturePlan {
    fn group(&mut self, domain: Domain, order: Order, kind: &str, index: usize) -> &mut FormGroup {
        let n = quadrature_points_for_order(order);
        debug!("{} {} has order {}, using {} Gauss points per dimension", kind, index, order, n);
        match domain {
            Domain::Volume => self.volume.entry(n).or_default(),
            Domain::Surface => self.surface.entry(n).or_default(),
        }
    }
}

/// Number of Gauss points per dimension for an integrand of the given order.
///
/// Orders beyond the largest available rule are clamped to that rule.
pub fn quadrature_points_for_order(order: Order) -> usize {
    gauss_points_for_degree(order.degree() as usize).unwrap_or_else(|_| {
        warn!(
            "No Gauss rule integrates {} exactly, using {} points per dimension",
            order, MAX_GAUSS_POINTS
        );
        MAX_GAUSS_POINTS
    })
}

#[derive(Debug, Copy, Clone)]
struct EdgeFrame {
    normal: Vector2<f64>,
    tangent: Vector2<f64>,
    half_length: f64,
}

/// Everything the forms see at the quadrature points of one element or boundary edge.
#[derive(Debug, Default)]
struct PointData {
    weights: Vec<f64>,
    geometry: GeomSamples<f64>,
    /// `basis[s][k]` holds local basis function `k` of space `s`.
    basis: Vec<Vec<FieldSamples<f64>>>,
    /// The current iterate of every unknown.
    u_ext: Vec<FieldSamples<f64>>,
    nodal_values: Vec<Vec<f64>>,
    basis_values: Vec<f64>,
    basis_gradients: Vec<Vector2<f64>>,
}

impl PointData {
    #[allow(clippy::too_many_arguments)]
    fn populate(
        &mut self,
        problem: &DiscreteProblem,
        coefficients: DVectorView<f64>,
        element: usize,
        geometry: &Quad4Geometry,
        points: impl Iterator<Item = Point2<f64>>,
        weights: &[f64],
        edge: Option<EdgeFrame>,
    ) -> eyre::Result<()> {
        let spaces = problem.spaces();
        self.weights.clear();
        self.geometry.clear();
        self.basis.resize_with(spaces.len(), Vec::new);
        self.u_ext.resize_with(spaces.len(), FieldSamples::default);
        self.nodal_values.resize_with(spaces.len(), Vec::new);

        for (s, space) in spaces.iter().enumerate() {
            let n = space.basis().num_nodes();
            self.basis[s].resize_with(n, FieldSamples::default);
            self.basis[s].iter_mut().for_each(FieldSamples::clear);
            self.u_ext[s].clear();
            space.populate_element_values(element, coefficients, problem.offsets()[s], &mut self.nodal_values[s]);
        }

        for (xi, &w) in points.zip(weights) {
            let jacobian = geometry.reference_jacobian(&xi);
            let inverse_transpose = jacobian
                .try_inverse()
                .ok_or_else(|| eyre!("element {} has a singular reference Jacobian", element))?
                .transpose();
            let x = geometry.map_reference_coords(&xi);

            match edge {
                Some(frame) => {
                    self.weights.push(w * frame.half_length);
                    self.geometry.push_edge_point(
                        x.x,
                        x.y,
                        [frame.normal.x, frame.normal.y],
                        [frame.tangent.x, frame.tangent.y],
                    );
                }
                None => {
                    self.weights.push(w * jacobian.determinant().abs());
                    self.geometry.push_point(x.x, x.y);
                }
            }

            for (s, space) in spaces.iter().enumerate() {
                let basis = space.basis();
                self.basis_values.resize(basis.num_nodes(), 0.0);
                self.basis_gradients.resize(basis.num_nodes(), Vector2::zeros());
                basis.populate_basis(&mut self.basis_values, &xi);
                basis.populate_basis_gradients(&mut self.basis_gradients, &xi);

                let (mut u, mut u_dx, mut u_dy) = (0.0, 0.0, 0.0);
                for k in 0..basis.num_nodes() {
                    let phi = self.basis_values[k];
                    let grad = inverse_transpose * self.basis_gradients[k];
                    self.basis[s][k].push(phi, grad.x, grad.y);

                    let c = self.nodal_values[s][k];
                    u += c * phi;
                    u_dx += c * grad.x;
                    u_dy += c * grad.y;
                }
                self.u_ext[s].push(u, u_dx, u_dy);
            }
        }
        Ok(())
    }
}
