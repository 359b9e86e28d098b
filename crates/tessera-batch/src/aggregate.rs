//! Containers that hold many logical elements
//!
//! A [`BatchAggregate`] exposes its slots through element views: a plain
//! reference for scalar and default aggregates, a row view for matrix
//! aggregates. Views borrow the aggregate, so resizing or dropping it while
//! a view is alive does not compile.

use tessera_core::{
    CompressedMatrix, CompressedVector, DenseMatrix, DenseVector, Host, MatrixRow, MatrixRowMut,
    Numeric, RowIter, RowIterMut, RowMajor, SparseRow, SparseRowIter, SparseRowIterMut,
    SparseRowMut,
};

/// Slot access for a batch container
pub trait BatchAggregate {
    /// Owned type of one logical element
    type Element;

    /// Read-only view of one slot
    type Ref<'a>
    where
        Self: 'a;

    /// Writable view of one slot
    type Mut<'a>
    where
        Self: 'a;

    type Iter<'a>: Iterator<Item = Self::Ref<'a>>
    where
        Self: 'a;

    type IterMut<'a>: Iterator<Item = Self::Mut<'a>>
    where
        Self: 'a;

    /// Number of logical elements
    fn slots(&self) -> usize;

    fn get(&self, slot: usize) -> Option<Self::Ref<'_>>;

    fn get_mut(&mut self, slot: usize) -> Option<Self::Mut<'_>>;

    /// Views of every slot, in order
    fn iter(&self) -> Self::Iter<'_>;

    fn iter_mut(&mut self) -> Self::IterMut<'_>;

    /// Owned copy of slot `slot`
    fn element(&self, slot: usize) -> Option<Self::Element>;

    fn is_empty(&self) -> bool {
        self.slots() == 0
    }
}

impl<T: Clone> BatchAggregate for Vec<T> {
    type Element = T;
    type Ref<'a> = &'a T where Self: 'a;
    type Mut<'a> = &'a mut T where Self: 'a;
    type Iter<'a> = std::slice::Iter<'a, T> where Self: 'a;
    type IterMut<'a> = std::slice::IterMut<'a, T> where Self: 'a;

    fn slots(&self) -> usize {
        self.len()
    }

    fn get(&self, slot: usize) -> Option<&T> {
        self.as_slice().get(slot)
    }

    fn get_mut(&mut self, slot: usize) -> Option<&mut T> {
        self.as_mut_slice().get_mut(slot)
    }

    fn iter(&self) -> std::slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.as_mut_slice().iter_mut()
    }

    fn element(&self, slot: usize) -> Option<T> {
        self.as_slice().get(slot).cloned()
    }
}

impl<T: Numeric> BatchAggregate for DenseVector<T, Host> {
    type Element = T;
    type Ref<'a> = &'a T;
    type Mut<'a> = &'a mut T;
    type Iter<'a> = std::slice::Iter<'a, T>;
    type IterMut<'a> = std::slice::IterMut<'a, T>;

    fn slots(&self) -> usize {
        self.len()
    }

    fn get(&self, slot: usize) -> Option<&T> {
        self.as_slice().get(slot)
    }

    fn get_mut(&mut self, slot: usize) -> Option<&mut T> {
        self.as_mut_slice().get_mut(slot)
    }

    fn iter(&self) -> std::slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.as_mut_slice().iter_mut()
    }

    fn element(&self, slot: usize) -> Option<T> {
        self.as_slice().get(slot).copied()
    }
}

/// A batch of dense vectors: one row per slot
impl<T: Numeric> BatchAggregate for DenseMatrix<T, Host, RowMajor> {
    type Element = DenseVector<T, Host>;
    type Ref<'a> = MatrixRow<'a, T>;
    type Mut<'a> = MatrixRowMut<'a, T>;
    type Iter<'a> = RowIter<'a, T>;
    type IterMut<'a> = RowIterMut<'a, T>;

    fn slots(&self) -> usize {
        self.rows()
    }

    fn get(&self, slot: usize) -> Option<MatrixRow<'_, T>> {
        self.row(slot)
    }

    fn get_mut(&mut self, slot: usize) -> Option<MatrixRowMut<'_, T>> {
        self.row_mut(slot)
    }

    fn iter(&self) -> RowIter<'_, T> {
        self.row_iter()
    }

    fn iter_mut(&mut self) -> RowIterMut<'_, T> {
        self.row_iter_mut()
    }

    fn element(&self, slot: usize) -> Option<DenseVector<T, Host>> {
        self.row(slot).map(|row| row.to_vector())
    }
}

/// A batch of sparse vectors: one compressed row per slot
impl<T: Numeric> BatchAggregate for CompressedMatrix<T> {
    type Element = CompressedVector<T>;
    type Ref<'a> = SparseRow<'a, T>;
    type Mut<'a> = SparseRowMut<'a, T>;
    type Iter<'a> = SparseRowIter<'a, T>;
    type IterMut<'a> = SparseRowIterMut<'a, T>;

    fn slots(&self) -> usize {
        self.rows()
    }

    fn get(&self, slot: usize) -> Option<SparseRow<'_, T>> {
        self.row(slot)
    }

    fn get_mut(&mut self, slot: usize) -> Option<SparseRowMut<'_, T>> {
        self.row_mut(slot)
    }

    fn iter(&self) -> SparseRowIter<'_, T> {
        self.row_iter()
    }

    fn iter_mut(&mut self) -> SparseRowIterMut<'_, T> {
        self.row_iter_mut()
    }

    fn element(&self, slot: usize) -> Option<CompressedVector<T>> {
        self.row(slot).map(|row| row.to_vector())
    }
}
