//! Row views over compressed matrices

use super::matrix::CompressedMatrix;
use super::vector::CompressedVector;
use crate::backend::{Host, HostContext};
use crate::expression::VectorExpression;
use crate::numeric::Numeric;
use crate::tags::Sparse;
use std::iter::FusedIterator;

/// Read-only view of one compressed row
#[derive(Clone, Copy, Debug)]
pub struct SparseRow<'a, T: Numeric> {
    indices: &'a [usize],
    values: &'a [T],
    dim: usize,
    index: usize,
    context: &'a HostContext,
}

impl<'a, T: Numeric> SparseRow<'a, T> {
    pub(crate) fn new(
        indices: &'a [usize],
        values: &'a [T],
        dim: usize,
        index: usize,
        context: &'a HostContext,
    ) -> Self {
        Self {
            indices,
            values,
            dim,
            index,
            context,
        }
    }

    /// Position of the row inside its matrix
    pub fn index(&self) -> usize {
        self.index
    }

    /// Declared dimension (matrix width)
    pub fn len(&self) -> usize {
        self.dim
    }

    pub fn is_empty(&self) -> bool {
        self.dim == 0
    }

    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    pub fn indices(&self) -> &'a [usize] {
        self.indices
    }

    pub fn values(&self) -> &'a [T] {
        self.values
    }

    pub fn get(&self, col: usize) -> T {
        match self.indices.binary_search(&col) {
            Ok(pos) => self.values[pos],
            Err(_) => T::zero(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, T)> + 'a {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// Owned copy with the same dimension and sparsity pattern
    pub fn to_vector(&self) -> CompressedVector<T> {
        CompressedVector::from_sorted_parts(self.dim, self.indices.to_vec(), self.values.to_vec())
    }

    pub fn to_dense(&self) -> Vec<T> {
        let mut dense = vec![T::zero(); self.dim];
        for (col, value) in self.iter() {
            dense[col] = value;
        }
        dense
    }
}

impl<T: Numeric> PartialEq for SparseRow<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        self.dim == other.dim && self.indices == other.indices && self.values == other.values
    }
}

impl<T: Numeric> PartialEq<CompressedVector<T>> for SparseRow<'_, T> {
    fn eq(&self, other: &CompressedVector<T>) -> bool {
        self.dim == other.len() && self.indices == other.indices() && self.values == other.values()
    }
}

impl<T: Numeric> VectorExpression for SparseRow<'_, T> {
    type Value = T;
    type Backend = Host;
    type Category = Sparse;

    fn len(&self) -> usize {
        self.dim
    }

    fn context(&self) -> &HostContext {
        self.context
    }
}

/// Writable view of one compressed row
///
/// The sparsity pattern is fixed; only stored values can change. New
/// entries go through [`CompressedMatrix::insert`].
#[derive(Debug)]
pub struct SparseRowMut<'a, T: Numeric> {
    indices: &'a [usize],
    values: &'a mut [T],
    dim: usize,
    index: usize,
}

impl<'a, T: Numeric> SparseRowMut<'a, T> {
    pub(crate) fn new(indices: &'a [usize], values: &'a mut [T], dim: usize, index: usize) -> Self {
        Self {
            indices,
            values,
            dim,
            index,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.dim
    }

    pub fn is_empty(&self) -> bool {
        self.dim == 0
    }

    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    pub fn indices(&self) -> &[usize] {
        self.indices
    }

    pub fn values(&self) -> &[T] {
        &*self.values
    }

    pub fn values_mut(&mut self) -> &mut [T] {
        &mut *self.values
    }

    /// Mutable reference to the stored value at `col`, if there is one
    pub fn get_mut(&mut self, col: usize) -> Option<&mut T> {
        let pos = self.indices.binary_search(&col).ok()?;
        Some(&mut self.values[pos])
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut T)> + '_ {
        self.indices.iter().copied().zip(self.values.iter_mut())
    }
}

/// Iterator over the rows of a compressed matrix
#[derive(Clone, Debug)]
pub struct SparseRowIter<'a, T: Numeric> {
    matrix: &'a CompressedMatrix<T>,
    front: usize,
    back: usize,
}

impl<'a, T: Numeric> SparseRowIter<'a, T> {
    pub(crate) fn new(matrix: &'a CompressedMatrix<T>, front: usize, back: usize) -> Self {
        Self {
            matrix,
            front,
            back,
        }
    }
}

impl<'a, T: Numeric> Iterator for SparseRowIter<'a, T> {
    type Item = SparseRow<'a, T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        let row = self.matrix.row(self.front);
        self.front += 1;
        row
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl<T: Numeric> DoubleEndedIterator for SparseRowIter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        self.matrix.row(self.back)
    }
}

impl<T: Numeric> ExactSizeIterator for SparseRowIter<'_, T> {}
impl<T: Numeric> FusedIterator for SparseRowIter<'_, T> {}

/// Iterator over writable compressed rows
#[derive(Debug)]
pub struct SparseRowIterMut<'a, T: Numeric> {
    offsets: &'a [usize],
    indices: &'a [usize],
    rest: &'a mut [T],
    dim: usize,
    front: usize,
    back: usize,
}

impl<'a, T: Numeric> SparseRowIterMut<'a, T> {
    pub(crate) fn new(
        offsets: &'a [usize],
        indices: &'a [usize],
        values: &'a mut [T],
        dim: usize,
    ) -> Self {
        Self {
            offsets,
            indices,
            rest: values,
            dim,
            front: 0,
            back: offsets.len() - 1,
        }
    }
}

impl<'a, T: Numeric> Iterator for SparseRowIterMut<'a, T> {
    type Item = SparseRowMut<'a, T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        let (start, end) = (self.offsets[self.front], self.offsets[self.front + 1]);
        let (values, rest) = std::mem::take(&mut self.rest).split_at_mut(end - start);
        self.rest = rest;
        let indices: &'a [usize] = self.indices;
        let index = self.front;
        self.front += 1;
        Some(SparseRowMut::new(&indices[start..end], values, self.dim, index))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl<'a, T: Numeric> DoubleEndedIterator for SparseRowIterMut<'a, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        let (start, end) = (self.offsets[self.back], self.offsets[self.back + 1]);
        let slice = std::mem::take(&mut self.rest);
        let split = slice.len() - (end - start);
        let (rest, values) = slice.split_at_mut(split);
        self.rest = rest;
        let indices: &'a [usize] = self.indices;
        Some(SparseRowMut::new(&indices[start..end], values, self.dim, self.back))
    }
}

impl<T: Numeric> ExactSizeIterator for SparseRowIterMut<'_, T> {}
impl<T: Numeric> FusedIterator for SparseRowIterMut<'_, T> {}
