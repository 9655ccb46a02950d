use crate::error::{FemError, FemResult};

/// Classification of one (node, dof) entry of a boundary table
///
/// Encoded in problem input as `0` (free), `-1` (static value) and
/// `-2` (time-dependent value).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DofKind {
    Free,
    Fixed,
    TimeDependent,
}

impl DofKind {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(DofKind::Free),
            -1 => Some(DofKind::Fixed),
            -2 => Some(DofKind::TimeDependent),
            _ => None,
        }
    }
}

/// Parse a per-node code table into a flat `DofKind` vector
pub(crate) fn parse_codes(
    table: &[Vec<i32>],
    num_nodes: usize,
    dofs_per_node: usize,
    context: &str,
) -> FemResult<Vec<DofKind>> {
    if table.len() != num_nodes {
        return Err(FemError::DimensionMismatch {
            context: format!("{} rows", context),
            expected: num_nodes,
            actual: table.len(),
        });
    }

    let mut kinds = Vec::with_capacity(num_nodes * dofs_per_node);
    for (node, row) in table.iter().enumerate() {
        if row.len() != dofs_per_node {
            return Err(FemError::DimensionMismatch {
                context: format!("{} row {}", context, node),
                expected: dofs_per_node,
                actual: row.len(),
            });
        }
        for (dof, &code) in row.iter().enumerate() {
            let kind = DofKind::from_code(code)
                .ok_or(FemError::InvalidBoundaryCode { node, dof, code })?;
            kinds.push(kind);
        }
    }
    Ok(kinds)
}

/// Degree of Freedom (DOF) map between full and equation numbering
///
/// Full DOF vectors are interleaved: `dof = node * dofs_per_node + component`.
/// Free DOFs are numbered contiguously into equations `0..neqs` in increasing
/// full-index order; the numbering never changes after construction.
#[derive(Debug, Clone)]
pub struct DofMap {
    /// Number of nodes in the mesh
    num_nodes: usize,

    /// DOFs per node (2 for plane problems)
    dofs_per_node: usize,

    /// Essential boundary classification per full DOF
    kinds: Vec<DofKind>,

    /// Full DOF index of each equation
    eq_to_dof: Vec<usize>,

    /// Equation index of each full DOF (None when constrained)
    dof_to_eq: Vec<Option<usize>>,

    /// Full DOF indices tagged time-dependent, in increasing order
    time_dependent: Vec<usize>,
}

impl DofMap {
    /// Build the map from a flat classification table
    pub fn new(num_nodes: usize, dofs_per_node: usize, kinds: Vec<DofKind>) -> FemResult<Self> {
        let total = num_nodes * dofs_per_node;
        if kinds.len() != total {
            return Err(FemError::DimensionMismatch {
                context: "EBC table".to_string(),
                expected: total,
                actual: kinds.len(),
            });
        }

        let mut eq_to_dof = Vec::new();
        let mut dof_to_eq = vec![None; total];
        let mut time_dependent = Vec::new();

        for (dof, kind) in kinds.iter().enumerate() {
            match kind {
                DofKind::Free => {
                    dof_to_eq[dof] = Some(eq_to_dof.len());
                    eq_to_dof.push(dof);
                }
                DofKind::TimeDependent => time_dependent.push(dof),
                DofKind::Fixed => {}
            }
        }

        Ok(Self {
            num_nodes,
            dofs_per_node,
            kinds,
            eq_to_dof,
            dof_to_eq,
            time_dependent,
        })
    }

    pub fn kind(&self, dof: usize) -> DofKind {
        self.kinds[dof]
    }

    /// Check if a DOF is constrained (static or time-dependent)
    pub fn is_constrained(&self, dof: usize) -> bool {
        self.kinds[dof] != DofKind::Free
    }

    /// Equation number of a full DOF, if free
    pub fn equation(&self, dof: usize) -> Option<usize> {
        self.dof_to_eq[dof]
    }

    pub fn eq_to_dof(&self) -> &[usize] {
        &self.eq_to_dof
    }

    /// Full DOF indices of the `-2` entries, in the order time functions return values
    pub fn time_dependent_dofs(&self) -> &[usize] {
        &self.time_dependent
    }

    /// Number of free equations
    pub fn neqs(&self) -> usize {
        self.eq_to_dof.len()
    }

    /// Total number of DOFs
    pub fn total_dofs(&self) -> usize {
        self.kinds.len()
    }

    pub fn dofs_per_node(&self) -> usize {
        self.dofs_per_node
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// Gather a full vector at the free DOFs
    pub fn gather(&self, full: &[f64]) -> Vec<f64> {
        self.eq_to_dof.iter().map(|&dof| full[dof]).collect()
    }

    /// Scatter a free-DOF vector into a full vector (constrained entries untouched)
    pub fn scatter(&self, free: &[f64], full: &mut [f64]) {
        for (eq, &dof) in self.eq_to_dof.iter().enumerate() {
            full[dof] = free[eq];
        }
    }
}
