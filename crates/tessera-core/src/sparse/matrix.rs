//! Compressed sparse row matrix

use super::rows::{SparseRow, SparseRowIter, SparseRowIterMut, SparseRowMut};
use super::vector::CompressedVector;
use crate::backend::{Host, HostContext};
use crate::dense::DenseMatrix;
use crate::expression::MatrixExpression;
use crate::numeric::Numeric;
use crate::tags::{RowMajor, Sparse};
use crate::{Error, Result};
use tracing::trace;

/// CSR matrix: row `i` owns entries `offsets[i]..offsets[i + 1]`
///
/// Column indices within a row are sorted and unique. Non-zero storage is
/// reserved up front with [`CompressedMatrix::with_capacity`] so that rows
/// can be appended without reallocating.
#[derive(Clone, Debug)]
pub struct CompressedMatrix<T: Numeric> {
    cols: usize,
    offsets: Vec<usize>,
    indices: Vec<usize>,
    values: Vec<T>,
    context: HostContext,
}

impl<T: Numeric> CompressedMatrix<T> {
    /// `rows x cols` matrix with no stored entries
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            cols,
            offsets: vec![0; rows + 1],
            indices: Vec::new(),
            values: Vec::new(),
            context: HostContext::default(),
        }
    }

    /// Empty matrix of width `cols` with room for `rows` rows holding `nnz`
    /// entries in total
    pub fn with_capacity(rows: usize, cols: usize, nnz: usize) -> Self {
        let mut offsets = Vec::with_capacity(rows + 1);
        offsets.push(0);
        Self {
            cols,
            offsets,
            indices: Vec::with_capacity(nnz),
            values: Vec::with_capacity(nnz),
            context: HostContext::default(),
        }
    }

    /// Keep the non-zero entries of a row-major host matrix
    pub fn from_dense(dense: &DenseMatrix<T, Host, RowMajor>) -> Self {
        let nnz = dense.as_slice().iter().filter(|value| !value.is_zero()).count();
        let mut matrix = Self::with_capacity(dense.rows(), dense.cols(), nnz);
        for row in dense.row_iter() {
            for (col, &value) in row.iter().enumerate() {
                if !value.is_zero() {
                    matrix.indices.push(col);
                    matrix.values.push(value);
                }
            }
            matrix.offsets.push(matrix.indices.len());
        }
        matrix
    }

    pub fn rows(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of stored entries
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Entries that fit without reallocating
    pub fn nnz_capacity(&self) -> usize {
        self.values.capacity()
    }

    /// Reserve room for `additional` more entries
    pub fn reserve(&mut self, additional: usize) {
        self.indices.reserve_exact(additional);
        self.values.reserve_exact(additional);
    }

    pub fn context(&self) -> &HostContext {
        &self.context
    }

    /// Append a row given as `(column, value)` pairs in increasing column
    /// order
    ///
    /// On error the matrix is left as it was.
    pub fn push_row<I>(&mut self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (usize, T)>,
    {
        let start = self.nnz();
        for (col, value) in entries {
            let in_order = self.indices.len() == start || self.indices.last() < Some(&col);
            if col >= self.cols || !in_order {
                self.indices.truncate(start);
                self.values.truncate(start);
                return Err(Error::InvalidLayout(format!(
                    "column {col} out of order or out of range for row {} of width {}",
                    self.rows(),
                    self.cols
                )));
            }
            self.indices.push(col);
            self.values.push(value);
        }
        self.offsets.push(self.nnz());
        Ok(())
    }

    /// Append a sparse vector as a new row
    pub fn push_vector(&mut self, vector: &CompressedVector<T>) -> Result<()> {
        if vector.len() != self.cols {
            return Err(Error::dimension_mismatch("sparse matrix row", self.cols, vector.len()));
        }
        self.indices.extend_from_slice(vector.indices());
        self.values.extend_from_slice(vector.values());
        self.offsets.push(self.nnz());
        Ok(())
    }

    /// Value at `(row, col)`, zero when not stored
    pub fn get(&self, row: usize, col: usize) -> Option<T> {
        self.row(row)
            .filter(|_| col < self.cols)
            .map(|view| view.get(col))
    }

    /// Store `value` at `(row, col)`, inserting the entry if needed
    ///
    /// Inserting shifts every later entry, so this is linear in `nnz`.
    pub fn insert(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        if row >= self.rows() || col >= self.cols {
            return Err(Error::InvalidLayout(format!(
                "entry ({row}, {col}) outside a {}x{} matrix",
                self.rows(),
                self.cols
            )));
        }
        let (start, end) = (self.offsets[row], self.offsets[row + 1]);
        match self.indices[start..end].binary_search(&col) {
            Ok(pos) => self.values[start + pos] = value,
            Err(pos) => {
                self.indices.insert(start + pos, col);
                self.values.insert(start + pos, value);
                self.offsets[row + 1..].iter_mut().for_each(|offset| *offset += 1);
            }
        }
        Ok(())
    }

    /// Change the shape
    ///
    /// Changing only the row count truncates or appends empty rows in
    /// place. Changing the width rebuilds the entry storage into a fresh
    /// allocation that keeps the reserved capacity, dropping entries whose
    /// column no longer fits.
    pub fn resize(&mut self, rows: usize, cols: usize) {
        let current = self.rows();
        if rows <= current {
            self.offsets.truncate(rows + 1);
            let nnz = self.offsets[rows];
            self.indices.truncate(nnz);
            self.values.truncate(nnz);
        } else {
            let nnz = self.nnz();
            self.offsets.resize(rows + 1, nnz);
        }

        if cols != self.cols {
            trace!(from = self.cols, to = cols, "rebuilding compressed matrix storage");
            let capacity = self.values.capacity();
            let mut offsets = Vec::with_capacity(self.offsets.len());
            let mut indices = Vec::with_capacity(capacity);
            let mut values = Vec::with_capacity(capacity);
            offsets.push(0);
            for row in 0..rows {
                let (start, end) = (self.offsets[row], self.offsets[row + 1]);
                for pos in start..end {
                    if self.indices[pos] < cols {
                        indices.push(self.indices[pos]);
                        values.push(self.values[pos]);
                    }
                }
                offsets.push(indices.len());
            }
            self.offsets = offsets;
            self.indices = indices;
            self.values = values;
            self.cols = cols;
        }
    }

    pub fn to_dense(&self) -> DenseMatrix<T, Host, RowMajor> {
        let mut dense = DenseMatrix::<T, Host, RowMajor>::new(self.rows(), self.cols);
        for row in self.row_iter() {
            for (col, value) in row.iter() {
                dense[(row.index(), col)] = value;
            }
        }
        dense.with_context(self.context)
    }

    pub fn row(&self, index: usize) -> Option<SparseRow<'_, T>> {
        (index < self.rows()).then(|| {
            let (start, end) = (self.offsets[index], self.offsets[index + 1]);
            SparseRow::new(
                &self.indices[start..end],
                &self.values[start..end],
                self.cols,
                index,
                &self.context,
            )
        })
    }

    pub fn row_mut(&mut self, index: usize) -> Option<SparseRowMut<'_, T>> {
        if index >= self.rows() {
            return None;
        }
        let (start, end) = (self.offsets[index], self.offsets[index + 1]);
        Some(SparseRowMut::new(
            &self.indices[start..end],
            &mut self.values[start..end],
            self.cols,
            index,
        ))
    }

    pub fn row_iter(&self) -> SparseRowIter<'_, T> {
        SparseRowIter::new(self, 0, self.rows())
    }

    pub fn row_iter_mut(&mut self) -> SparseRowIterMut<'_, T> {
        SparseRowIterMut::new(&self.offsets, &self.indices, &mut self.values, self.cols)
    }
}

impl<T: Numeric> PartialEq for CompressedMatrix<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cols == other.cols
            && self.offsets == other.offsets
            && self.indices == other.indices
            && self.values == other.values
    }
}

impl<T: Numeric> MatrixExpression for CompressedMatrix<T> {
    type Value = T;
    type Backend = Host;
    type Orientation = RowMajor;
    type Category = Sparse;

    fn rows(&self) -> usize {
        self.offsets.len() - 1
    }

    fn cols(&self) -> usize {
        self.cols
    }

    fn context(&self) -> &HostContext {
        &self.context
    }
}

impl<'a, T: Numeric> IntoIterator for &'a CompressedMatrix<T> {
    type Item = SparseRow<'a, T>;
    type IntoIter = SparseRowIter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.row_iter()
    }
}

impl<'a, T: Numeric> IntoIterator for &'a mut CompressedMatrix<T> {
    type Item = SparseRowMut<'a, T>;
    type IntoIter = SparseRowIterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.row_iter_mut()
    }
}
