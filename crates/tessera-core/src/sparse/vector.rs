//! Compressed sparse vector

use crate::backend::{Host, HostContext};
use crate::expression::VectorExpression;
use crate::numeric::Numeric;
use crate::tags::Sparse;
use crate::{Error, Result};

/// Sparse vector storing only its non-zero entries
///
/// The declared dimension is independent of the number of stored entries.
/// Indices are kept sorted and unique.
///
/// # Examples
///
/// ```
/// use tessera_core::sparse::CompressedVector;
///
/// let v = CompressedVector::new(10, vec![7, 1, 3], vec![0.3, 0.2, 0.5]).unwrap();
/// assert_eq!(v.get(1), 0.2);
/// assert_eq!(v.get(2), 0.0);
/// assert_eq!(v.indices(), &[1, 3, 7]);
///
/// // Integer element types work the same way
/// let counts = CompressedVector::from_dense(&[0u32, 4, 0, 1]);
/// assert_eq!(counts.nnz(), 2);
/// ```
#[derive(Clone, Debug)]
pub struct CompressedVector<T: Numeric> {
    dim: usize,
    indices: Vec<usize>,
    values: Vec<T>,
    context: HostContext,
}

impl<T: Numeric> CompressedVector<T> {
    /// Build from unsorted `(index, value)` columns
    ///
    /// Fails when the columns differ in length, an index is out of range or
    /// an index appears twice.
    pub fn new(dim: usize, indices: Vec<usize>, values: Vec<T>) -> Result<Self> {
        if indices.len() != values.len() {
            return Err(Error::dimension_mismatch(
                "sparse vector values",
                indices.len(),
                values.len(),
            ));
        }
        let mut entries: Vec<(usize, T)> = indices.into_iter().zip(values).collect();
        entries.sort_unstable_by_key(|&(index, _)| index);

        let mut vector = Self::zeros(dim);
        vector.indices.reserve_exact(entries.len());
        vector.values.reserve_exact(entries.len());
        for (index, value) in entries {
            vector.push(index, value)?;
        }
        Ok(vector)
    }

    /// Vector of dimension `dim` with no stored entries
    pub fn zeros(dim: usize) -> Self {
        Self {
            dim,
            indices: Vec::new(),
            values: Vec::new(),
            context: HostContext::default(),
        }
    }

    /// Parts already known to be sorted, unique and in range
    pub(crate) fn from_sorted_parts(dim: usize, indices: Vec<usize>, values: Vec<T>) -> Self {
        debug_assert!(indices.windows(2).all(|pair| pair[0] < pair[1]));
        debug_assert!(indices.last().map_or(true, |&last| last < dim));
        Self {
            dim,
            indices,
            values,
            context: HostContext::default(),
        }
    }

    /// Keep the non-zero entries of a dense slice
    pub fn from_dense(dense: &[T]) -> Self {
        let (indices, values) = dense
            .iter()
            .enumerate()
            .filter(|(_, value)| !value.is_zero())
            .map(|(index, &value)| (index, value))
            .unzip();
        Self {
            dim: dense.len(),
            indices,
            values,
            context: HostContext::default(),
        }
    }

    /// Append an entry past the last stored index
    pub fn push(&mut self, index: usize, value: T) -> Result<()> {
        if index >= self.dim {
            return Err(Error::InvalidLayout(format!(
                "sparse index {index} out of range for dimension {}",
                self.dim
            )));
        }
        if let Some(&last) = self.indices.last() {
            if index <= last {
                return Err(Error::InvalidLayout(format!(
                    "sparse index {index} does not follow {last}"
                )));
            }
        }
        self.indices.push(index);
        self.values.push(value);
        Ok(())
    }

    pub fn to_dense(&self) -> Vec<T> {
        let mut dense = vec![T::zero(); self.dim];
        for (index, value) in self.iter() {
            dense[index] = value;
        }
        dense
    }

    /// Value at `index`, zero when not stored
    pub fn get(&self, index: usize) -> T {
        match self.indices.binary_search(&index) {
            Ok(pos) => self.values[pos],
            Err(_) => T::zero(),
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        self.indices.binary_search(&index).is_ok()
    }

    /// Declared dimension
    pub fn len(&self) -> usize {
        self.dim
    }

    pub fn is_empty(&self) -> bool {
        self.dim == 0
    }

    /// Number of stored entries
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [T] {
        &mut self.values
    }

    /// Stored `(index, value)` pairs in index order
    pub fn iter(&self) -> impl Iterator<Item = (usize, T)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// Change the declared dimension, dropping entries that fall outside
    pub fn resize(&mut self, dim: usize) {
        let keep = self.indices.partition_point(|&index| index < dim);
        self.indices.truncate(keep);
        self.values.truncate(keep);
        self.dim = dim;
    }
}

impl<T: Numeric> PartialEq for CompressedVector<T> {
    fn eq(&self, other: &Self) -> bool {
        self.dim == other.dim && self.indices == other.indices && self.values == other.values
    }
}

impl<T: Numeric> VectorExpression for CompressedVector<T> {
    type Value = T;
    type Backend = Host;
    type Category = Sparse;

    fn len(&self) -> usize {
        self.dim
    }

    fn context(&self) -> &HostContext {
        &self.context
    }
}
