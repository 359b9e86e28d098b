//! Row views over row-major host matrices
//!
//! A row-major matrix doubles as a batch of equally long vectors, one per
//! row. The views here expose a single row without copying it, and the
//! `IntoIterator` impls register them as the matrix's element sequence so
//! `for row in &matrix` walks the logical elements in order.

use crate::backend::{Host, HostContext};
use crate::dense::{DenseMatrix, DenseVector};
use crate::expression::{DenseVectorStorage, VectorExpression};
use crate::numeric::Numeric;
use crate::storage::VectorDescriptor;
use crate::tags::{Dense, RowMajor};
use std::iter::FusedIterator;
use std::ops::{Index, IndexMut};

/// Read-only view of row `index` of a matrix
#[derive(Clone, Copy, Debug)]
pub struct MatrixRow<'a, T: Numeric> {
    matrix: &'a DenseMatrix<T, Host, RowMajor>,
    index: usize,
}

impl<'a, T: Numeric> MatrixRow<'a, T> {
    /// Position of the row inside its matrix
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.matrix.cols()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_slice(&self) -> &'a [T] {
        let cols = self.matrix.cols();
        let start = self.index * cols;
        &self.matrix.as_slice()[start..start + cols]
    }

    pub fn get(&self, col: usize) -> Option<T> {
        self.as_slice().get(col).copied()
    }

    pub fn iter(&self) -> std::slice::Iter<'a, T> {
        self.as_slice().iter()
    }

    /// Owned copy of the row
    pub fn to_vector(&self) -> DenseVector<T, Host> {
        DenseVector::from_slice(self.as_slice())
    }
}

impl<T: Numeric> Index<usize> for MatrixRow<'_, T> {
    type Output = T;

    fn index(&self, col: usize) -> &T {
        &self.as_slice()[col]
    }
}

impl<T: Numeric> PartialEq for MatrixRow<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Numeric> PartialEq<DenseVector<T, Host>> for MatrixRow<'_, T> {
    fn eq(&self, other: &DenseVector<T, Host>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Numeric> PartialEq<[T]> for MatrixRow<'_, T> {
    fn eq(&self, other: &[T]) -> bool {
        self.as_slice() == other
    }
}

impl<T: Numeric> VectorExpression for MatrixRow<'_, T> {
    type Value = T;
    type Backend = Host;
    type Category = Dense;

    fn len(&self) -> usize {
        self.matrix.cols()
    }

    fn context(&self) -> &HostContext {
        self.matrix.context()
    }
}

impl<T: Numeric> DenseVectorStorage for MatrixRow<'_, T> {
    fn raw_storage(&self) -> VectorDescriptor<'_, Host, T> {
        let cols = self.matrix.cols();
        VectorDescriptor::contiguous_unchecked(self.matrix.buffer(), self.index * cols, cols)
    }
}

/// Writable view of one row
#[derive(Debug)]
pub struct MatrixRowMut<'a, T: Numeric> {
    values: &'a mut [T],
    index: usize,
}

impl<'a, T: Numeric> MatrixRowMut<'a, T> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &*self.values
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut *self.values
    }

    /// Overwrite the row with `values`, which must have the row's length
    pub fn copy_from_slice(&mut self, values: &[T]) {
        self.values.copy_from_slice(values);
    }

    pub fn fill(&mut self, value: T) {
        self.values.fill(value);
    }

    pub fn into_slice(self) -> &'a mut [T] {
        self.values
    }
}

impl<T: Numeric> Index<usize> for MatrixRowMut<'_, T> {
    type Output = T;

    fn index(&self, col: usize) -> &T {
        &self.values[col]
    }
}

impl<T: Numeric> IndexMut<usize> for MatrixRowMut<'_, T> {
    fn index_mut(&mut self, col: usize) -> &mut T {
        &mut self.values[col]
    }
}

/// Iterator over the rows of a row-major matrix
#[derive(Clone, Debug)]
pub struct RowIter<'a, T: Numeric> {
    matrix: &'a DenseMatrix<T, Host, RowMajor>,
    front: usize,
    back: usize,
}

impl<'a, T: Numeric> Iterator for RowIter<'a, T> {
    type Item = MatrixRow<'a, T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        let row = MatrixRow {
            matrix: self.matrix,
            index: self.front,
        };
        self.front += 1;
        Some(row)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl<T: Numeric> DoubleEndedIterator for RowIter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        Some(MatrixRow {
            matrix: self.matrix,
            index: self.back,
        })
    }
}

impl<T: Numeric> ExactSizeIterator for RowIter<'_, T> {}
impl<T: Numeric> FusedIterator for RowIter<'_, T> {}

/// Iterator over writable rows
///
/// Works for zero-column matrices, where every row is an empty slice.
#[derive(Debug)]
pub struct RowIterMut<'a, T: Numeric> {
    rest: &'a mut [T],
    cols: usize,
    front: usize,
    back: usize,
}

impl<'a, T: Numeric> Iterator for RowIterMut<'a, T> {
    type Item = MatrixRowMut<'a, T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        let (values, rest) = std::mem::take(&mut self.rest).split_at_mut(self.cols);
        self.rest = rest;
        let index = self.front;
        self.front += 1;
        Some(MatrixRowMut { values, index })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl<T: Numeric> DoubleEndedIterator for RowIterMut<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        let slice = std::mem::take(&mut self.rest);
        let split = slice.len() - self.cols;
        let (rest, values) = slice.split_at_mut(split);
        self.rest = rest;
        self.back -= 1;
        Some(MatrixRowMut {
            values,
            index: self.back,
        })
    }
}

impl<T: Numeric> ExactSizeIterator for RowIterMut<'_, T> {}
impl<T: Numeric> FusedIterator for RowIterMut<'_, T> {}

impl<T: Numeric> DenseMatrix<T, Host, RowMajor> {
    /// View of row `index`, or `None` past the last row
    pub fn row(&self, index: usize) -> Option<MatrixRow<'_, T>> {
        (index < self.rows()).then_some(MatrixRow {
            matrix: self,
            index,
        })
    }

    pub fn row_mut(&mut self, index: usize) -> Option<MatrixRowMut<'_, T>> {
        if index >= self.rows() {
            return None;
        }
        let cols = self.cols();
        let start = index * cols;
        Some(MatrixRowMut {
            values: &mut self.as_mut_slice()[start..start + cols],
            index,
        })
    }

    pub fn row_iter(&self) -> RowIter<'_, T> {
        RowIter {
            matrix: self,
            front: 0,
            back: self.rows(),
        }
    }

    pub fn row_iter_mut(&mut self) -> RowIterMut<'_, T> {
        let (rows, cols) = self.shape();
        RowIterMut {
            rest: self.as_mut_slice(),
            cols,
            front: 0,
            back: rows,
        }
    }
}

impl<'a, T: Numeric> IntoIterator for &'a DenseMatrix<T, Host, RowMajor> {
    type Item = MatrixRow<'a, T>;
    type IntoIter = RowIter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.row_iter()
    }
}

impl<'a, T: Numeric> IntoIterator for &'a mut DenseMatrix<T, Host, RowMajor> {
    type Item = MatrixRowMut<'a, T>;
    type IntoIter = RowIterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.row_iter_mut()
    }
}
