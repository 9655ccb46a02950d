use nalgebra::DMatrix;
use sprs::{CsMat, TriMat};

/// Global system matrix with dense or sparse backing
///
/// Small systems are held dense and factorized directly; large systems are
/// held in CSR form. The choice is made at assembly time from the number of
/// equations.
#[derive(Debug, Clone)]
pub enum SystemMatrix {
    Dense(DMatrix<f64>),
    Sparse(CsMat<f64>),
}

impl SystemMatrix {
    /// Build from accumulated triplets (duplicates are summed)
    pub fn from_triplets(triplets: TriMat<f64>, sparse: bool) -> Self {
        if sparse {
            SystemMatrix::Sparse(triplets.to_csr())
        } else {
            let (rows, cols) = triplets.shape();
            let mut dense = DMatrix::zeros(rows, cols);
            for (&val, (i, j)) in triplets.triplet_iter() {
                dense[(i, j)] += val;
            }
            SystemMatrix::Dense(dense)
        }
    }

    pub fn nrows(&self) -> usize {
        match self {
            SystemMatrix::Dense(m) => m.nrows(),
            SystemMatrix::Sparse(m) => m.rows(),
        }
    }

    pub fn ncols(&self) -> usize {
        match self {
            SystemMatrix::Dense(m) => m.ncols(),
            SystemMatrix::Sparse(m) => m.cols(),
        }
    }

    pub fn is_sparse(&self) -> bool {
        matches!(self, SystemMatrix::Sparse(_))
    }

    /// Entry (i, j); structural zeros of a sparse matrix read as 0
    pub fn get(&self, i: usize, j: usize) -> f64 {
        match self {
            SystemMatrix::Dense(m) => m[(i, j)],
            SystemMatrix::Sparse(m) => m.get(i, j).copied().unwrap_or(0.0),
        }
    }

    /// y = A x
    pub fn mul_vec(&self, x: &[f64]) -> Vec<f64> {
        match self {
            SystemMatrix::Dense(m) => {
                let mut y = vec![0.0; m.nrows()];
                for (i, yi) in y.iter_mut().enumerate() {
                    *yi = m.row(i).iter().zip(x.iter()).map(|(a, b)| a * b).sum();
                }
                y
            }
            SystemMatrix::Sparse(m) => {
                let mut y = vec![0.0; m.rows()];
                for (row_idx, row) in m.outer_iterator().enumerate() {
                    y[row_idx] = row.iter().map(|(col_idx, &val)| val * x[col_idx]).sum();
                }
                y
            }
        }
    }

    /// Row sums Σ_j A_ij
    pub fn row_sums(&self) -> Vec<f64> {
        match self {
            SystemMatrix::Dense(m) => (0..m.nrows()).map(|i| m.row(i).sum()).collect(),
            SystemMatrix::Sparse(m) => m
                .outer_iterator()
                .map(|row| row.iter().map(|(_, &v)| v).sum())
                .collect(),
        }
    }

    /// Diagonal entries
    pub fn diagonal(&self) -> Vec<f64> {
        (0..self.nrows()).map(|i| self.get(i, i)).collect()
    }

    pub fn to_dense(&self) -> DMatrix<f64> {
        match self {
            SystemMatrix::Dense(m) => m.clone(),
            SystemMatrix::Sparse(m) => {
                let mut dense = DMatrix::zeros(m.rows(), m.cols());
                for (&val, (i, j)) in m.iter() {
                    dense[(i, j)] += val;
                }
                dense
            }
        }
    }

    /// a·X + b·Y, sparse only when both operands are sparse
    pub fn linear_combination(a: f64, x: &SystemMatrix, b: f64, y: &SystemMatrix) -> SystemMatrix {
        match (x, y) {
            (SystemMatrix::Sparse(xs), SystemMatrix::Sparse(ys)) => {
                let mut tri = TriMat::new((xs.rows(), xs.cols()));
                for (&val, (i, j)) in xs.iter() {
                    tri.add_triplet(i, j, a * val);
                }
                for (&val, (i, j)) in ys.iter() {
                    tri.add_triplet(i, j, b * val);
                }
                SystemMatrix::Sparse(tri.to_csr())
            }
            _ => SystemMatrix::Dense(x.to_dense() * a + y.to_dense() * b),
        }
    }
}
