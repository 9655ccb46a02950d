//! Discretized body: mesh, boundary tables and full-DOF state
//!
//! The `Domain` owns the element arena and keeps the full displacement
//! vectors consistent with the reduced state held by `GlobalData`.

use nalgebra::{Point2, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::{FemError, FemResult};
use crate::mechanics::{ContinuumElement, MaterialProperties, DOFS_PER_NODE};
use super::dof::parse_codes;
use super::{Assembler, DofKind, DofMap, ElementShape, GlobalData};

/// Connectivity of one element in a problem description
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementSpec {
    pub shape: ElementShape,
    pub nodes: Vec<usize>,
    /// Index into `ProblemSetup::materials`
    pub material: usize,
}

/// Problem description produced by a driver
///
/// Boundary tables hold one row per node and one column per DOF. `g` and
/// `f` may be left empty, meaning all static values are zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemSetup {
    pub nodes: Vec<[f64; 2]>,
    pub elements: Vec<ElementSpec>,
    pub materials: Vec<MaterialProperties>,
    pub ebc: Vec<Vec<i32>>,
    #[serde(default)]
    pub g: Vec<Vec<f64>>,
    pub nbc: Vec<Vec<i32>>,
    #[serde(default)]
    pub f: Vec<Vec<f64>>,
}

/// Append-only log of accepted steps
#[derive(Debug, Clone, Default)]
pub struct History {
    /// Internal force at the free DOFs
    pub fint: Vec<Vec<f64>>,
    /// External force at the free DOFs
    pub fext: Vec<Vec<f64>>,
    pub time: Vec<f64>,
}

impl History {
    pub fn push(&mut self, fint: Vec<f64>, fext: Vec<f64>, time: f64) {
        self.fint.push(fint);
        self.fext.push(fext);
        self.time.push(time);
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Most recent (fint, fext, time) entry
    pub fn last(&self) -> Option<(&[f64], &[f64], f64)> {
        let i = self.len().checked_sub(1)?;
        Some((self.fint[i].as_slice(), self.fext[i].as_slice(), self.time[i]))
    }
}

/// Mesh, elements, boundary tables and full-DOF displacement state
#[derive(Debug)]
pub struct Domain {
    nodes: Vec<Point2<f64>>,
    elements: Vec<ContinuumElement>,
    dof_map: DofMap,
    /// Static prescribed displacement per full DOF
    g: Vec<f64>,
    nbc: Vec<DofKind>,
    /// Full DOF indices of `-2` NBC entries, increasing
    nbc_time_dofs: Vec<usize>,
    /// Static nodal force per full DOF
    f: Vec<f64>,
    /// Current full displacement
    pub state: Vec<f64>,
    /// Full displacement at the start of the current step
    pub dstate: Vec<f64>,
    pub history: History,
    mass_assembled: bool,
    sparse_threshold: usize,
}

/// Default `neqs` above which system matrices are held sparse
pub const DEFAULT_SPARSE_THRESHOLD: usize = 400;

impl Domain {
    /// Build a domain from nodes, elements and boundary tables
    ///
    /// # Arguments
    /// * `nodes` - Node coordinates
    /// * `elements` - Elements referencing indices into `nodes`
    /// * `ebc` - Essential boundary codes per (node, dof)
    /// * `g` - Static prescribed displacements (empty = zero)
    /// * `nbc` - Natural boundary codes per (node, dof)
    /// * `f` - Static nodal forces (empty = zero)
    pub fn new(
        nodes: Vec<Point2<f64>>,
        elements: Vec<ContinuumElement>,
        ebc: &[Vec<i32>],
        g: &[Vec<f64>],
        nbc: &[Vec<i32>],
        f: &[Vec<f64>],
    ) -> FemResult<Self> {
        let num_nodes = nodes.len();

        for (e, elem) in elements.iter().enumerate() {
            if let Some(&bad) = elem.nodes().iter().find(|&&n| n >= num_nodes) {
                return Err(FemError::InvalidInput(format!(
                    "element {} references node {} but the mesh has {} nodes",
                    e, bad, num_nodes
                )));
            }
        }

        let kinds = parse_codes(ebc, num_nodes, DOFS_PER_NODE, "EBC")?;
        let dof_map = DofMap::new(num_nodes, DOFS_PER_NODE, kinds)?;
        let g = flatten_values(g, num_nodes, "g")?;

        let nbc = parse_codes(nbc, num_nodes, DOFS_PER_NODE, "NBC")?;
        let nbc_time_dofs = nbc
            .iter()
            .enumerate()
            .filter(|&(_, &k)| k == DofKind::TimeDependent)
            .map(|(dof, _)| dof)
            .collect();
        let f = flatten_values(f, num_nodes, "f")?;

        let total = dof_map.total_dofs();
        let mut state = vec![0.0; total];
        for dof in 0..total {
            if dof_map.kind(dof) == DofKind::Fixed {
                state[dof] = g[dof];
            }
        }
        let dstate = state.clone();

        Ok(Self {
            nodes,
            elements,
            dof_map,
            g,
            nbc,
            nbc_time_dofs,
            f,
            state,
            dstate,
            history: History::default(),
            mass_assembled: false,
            sparse_threshold: DEFAULT_SPARSE_THRESHOLD,
        })
    }

    /// Build a domain from a problem description
    ///
    /// Every element gets fresh material instances from its property record.
    pub fn from_setup(setup: &ProblemSetup) -> FemResult<Self> {
        let nodes: Vec<Point2<f64>> = setup.nodes.iter().map(|p| Point2::new(p[0], p[1])).collect();

        let elements = setup
            .elements
            .iter()
            .enumerate()
            .map(|(e, spec)| {
                let props = setup.materials.get(spec.material).ok_or_else(|| {
                    FemError::InvalidInput(format!(
                        "element {} references material {} but only {} are defined",
                        e,
                        spec.material,
                        setup.materials.len()
                    ))
                })?;
                let coords = spec
                    .nodes
                    .iter()
                    .map(|&n| {
                        nodes.get(n).copied().ok_or_else(|| {
                            FemError::InvalidInput(format!(
                                "element {} references node {} but the mesh has {} nodes",
                                e,
                                n,
                                nodes.len()
                            ))
                        })
                    })
                    .collect::<FemResult<Vec<_>>>()?;
                ContinuumElement::from_properties(spec.shape, spec.nodes.clone(), coords, props)
            })
            .collect::<FemResult<Vec<_>>>()?;

        Self::new(nodes, elements, &setup.ebc, &setup.g, &setup.nbc, &setup.f)
    }

    /// Hold system matrices sparse once `neqs` exceeds `threshold`
    pub fn with_sparse_threshold(mut self, threshold: usize) -> Self {
        self.sparse_threshold = threshold;
        self
    }

    pub fn nodes(&self) -> &[Point2<f64>] {
        &self.nodes
    }

    pub fn elements(&self) -> &[ContinuumElement] {
        &self.elements
    }

    pub fn dof_map(&self) -> &DofMap {
        &self.dof_map
    }

    pub fn neqs(&self) -> usize {
        self.dof_map.neqs()
    }

    pub fn use_sparse(&self) -> bool {
        self.neqs() > self.sparse_threshold
    }

    pub fn is_mass_assembled(&self) -> bool {
        self.mass_assembled
    }

    pub(crate) fn assembly_view(&mut self) -> (&mut [ContinuumElement], &[f64], &[f64], &DofMap) {
        (&mut self.elements, &self.state, &self.dstate, &self.dof_map)
    }

    pub(crate) fn check_global_data(&self, globdat: &GlobalData) -> FemResult<()> {
        let neqs = self.neqs();
        for (name, len) in [
            ("GlobalData.state", globdat.state.len()),
            ("GlobalData.dstate", globdat.dstate.len()),
            ("GlobalData.velo", globdat.velo.len()),
            ("GlobalData.acce", globdat.acce.len()),
        ] {
            if len != neqs {
                return Err(FemError::DimensionMismatch {
                    context: name.to_string(),
                    expected: neqs,
                    actual: len,
                });
            }
        }
        Ok(())
    }

    /// Write prescribed displacements for `globdat.time` into `state`
    ///
    /// `-1` DOFs take their static `g` value and `-2` DOFs the value of the
    /// EBC time function, matched in increasing full-DOF order.
    pub fn update_domain_state_boundary(&mut self, globdat: &GlobalData) -> FemResult<()> {
        for dof in 0..self.dof_map.total_dofs() {
            if self.dof_map.kind(dof) == DofKind::Fixed {
                self.state[dof] = self.g[dof];
            }
        }

        let td = self.dof_map.time_dependent_dofs();
        if td.is_empty() {
            return Ok(());
        }
        let values = globdat.ebc_values(globdat.time).ok_or_else(|| {
            FemError::InvalidInput(format!(
                "{} time-dependent EBC DOFs but no EBC function is set",
                td.len()
            ))
        })?;
        if values.len() != td.len() {
            return Err(FemError::DimensionMismatch {
                context: "EBC time function output".to_string(),
                expected: td.len(),
                actual: values.len(),
            });
        }
        for (&dof, v) in td.iter().zip(values) {
            self.state[dof] = v;
        }
        Ok(())
    }

    /// Push the free-DOF displacement of `globdat` into `state`
    pub fn update_states(&mut self, globdat: &GlobalData) {
        self.set_free_state(&globdat.state);
    }

    /// Write a free-DOF displacement (e.g. a Newton predictor) into `state`
    pub(crate) fn set_free_state(&mut self, free: &[f64]) {
        self.dof_map.scatter(free, &mut self.state);
    }

    /// External force over all DOFs at `globdat.time`
    pub fn external_force_full(&self, globdat: &GlobalData) -> FemResult<Vec<f64>> {
        let mut fext = vec![0.0; self.dof_map.total_dofs()];
        for (dof, kind) in self.nbc.iter().enumerate() {
            if *kind == DofKind::Fixed {
                fext[dof] = self.f[dof];
            }
        }

        if !self.nbc_time_dofs.is_empty() {
            let values = globdat.fbc_values(globdat.time).ok_or_else(|| {
                FemError::InvalidInput(format!(
                    "{} time-dependent NBC DOFs but no force function is set",
                    self.nbc_time_dofs.len()
                ))
            })?;
            if values.len() != self.nbc_time_dofs.len() {
                return Err(FemError::DimensionMismatch {
                    context: "NBC time function output".to_string(),
                    expected: self.nbc_time_dofs.len(),
                    actual: values.len(),
                });
            }
            for (&dof, v) in self.nbc_time_dofs.iter().zip(values) {
                fext[dof] = v;
            }
        }
        Ok(fext)
    }

    /// External force at the free DOFs at `globdat.time`
    pub fn external_force(&self, globdat: &GlobalData) -> FemResult<Vec<f64>> {
        let full = self.external_force_full(globdat)?;
        Ok(self.dof_map.gather(&full))
    }

    /// Assemble M and its lumped form into `globdat`
    ///
    /// Mass is deformation independent, so a second call is an error.
    pub fn assemble_mass_matrix(&mut self, globdat: &mut GlobalData) -> FemResult<()> {
        if self.mass_assembled || globdat.mass.is_some() {
            return Err(FemError::MassAlreadyAssembled);
        }
        self.check_global_data(globdat)?;

        let (mass, lumped) = Assembler::mass_matrix(self);
        globdat.mass = Some(mass);
        globdat.mass_lumped = lumped;
        self.mass_assembled = true;
        Ok(())
    }

    /// Promote every material trial state to committed
    pub fn commit_history(&mut self) {
        for elem in &mut self.elements {
            elem.commit_history();
        }
    }

    /// Committed stress per element and quadrature point
    pub fn element_stresses(&self) -> Vec<Vec<Vector3<f64>>> {
        self.elements.iter().map(|e| e.stresses()).collect()
    }
}

fn flatten_values(table: &[Vec<f64>], num_nodes: usize, context: &str) -> FemResult<Vec<f64>> {
    if table.is_empty() {
        return Ok(vec![0.0; num_nodes * DOFS_PER_NODE]);
    }
    if table.len() != num_nodes {
        return Err(FemError::DimensionMismatch {
            context: format!("{} rows", context),
            expected: num_nodes,
            actual: table.len(),
        });
    }
    let mut flat = Vec::with_capacity(num_nodes * DOFS_PER_NODE);
    for (node, row) in table.iter().enumerate() {
        if row.len() != DOFS_PER_NODE {
            return Err(FemError::DimensionMismatch {
                context: format!("{} row {}", context, node),
                expected: DOFS_PER_NODE,
                actual: row.len(),
            });
        }
        flat.extend_from_slice(row);
    }
    Ok(flat)
}
