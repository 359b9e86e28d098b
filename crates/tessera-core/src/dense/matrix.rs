//! Dense matrix container

use crate::backend::{Backend, Host, HostContext};
use crate::expression::{
    DenseStorage, DenseStorageMut, Evaluate, Evaluated, MatrixExpression, Scaled, Transposed,
};
use crate::numeric::Numeric;
use crate::storage::{StorageDescriptor, StorageDescriptorMut};
use crate::tags::{Dense, Layout, Orientation, RowMajor};
use crate::{Error, Result};
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

/// Packed dense matrix owning one backend buffer
///
/// Elements are stored in `O` order with leading dimension equal to the
/// minor extent, so `buffer.len() == rows * cols` always holds.
#[derive(Debug)]
pub struct DenseMatrix<T: Numeric, B: Backend = Host, O: Orientation = RowMajor> {
    buffer: B::Buffer<T>,
    rows: usize,
    cols: usize,
    context: B::Context,
    _orientation: PhantomData<O>,
}

fn checked_len(rows: usize, cols: usize) -> Result<usize> {
    rows.checked_mul(cols)
        .ok_or_else(|| Error::InvalidLayout(format!("{rows}x{cols} matrix overflows usize")))
}

impl<T: Numeric, B: Backend, O: Orientation> DenseMatrix<T, B, O> {
    /// Allocate a zero-filled matrix on the backend of `context`
    pub fn zeros(context: &B::Context, rows: usize, cols: usize) -> Result<Self> {
        let buffer = B::allocate(context, checked_len(rows, cols)?)?;
        Ok(Self {
            buffer,
            rows,
            cols,
            context: context.clone(),
            _orientation: PhantomData,
        })
    }

    /// Build from elements already laid out in `O` order
    pub fn from_vec(context: &B::Context, rows: usize, cols: usize, data: Vec<T>) -> Result<Self> {
        let expected = checked_len(rows, cols)?;
        if data.len() != expected {
            return Err(Error::dimension_mismatch("matrix construction", expected, data.len()));
        }
        let buffer = B::upload(context, data)?;
        Ok(Self {
            buffer,
            rows,
            cols,
            context: context.clone(),
            _orientation: PhantomData,
        })
    }

    /// Build from a sequence of equally long rows
    pub fn from_rows<R: AsRef<[T]>>(context: &B::Context, rows: &[R]) -> Result<Self> {
        let cols = rows.first().map_or(0, |row| row.as_ref().len());
        let ld = O::min_leading_dimension(rows.len(), cols);
        let mut data = vec![T::zero(); checked_len(rows.len(), cols)?];
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != cols {
                return Err(Error::dimension_mismatch("matrix row", cols, row.len()));
            }
            for (j, &value) in row.iter().enumerate() {
                data[O::index(i, j, ld)] = value;
            }
        }
        Self::from_vec(context, rows.len(), cols, data)
    }

    /// Copy a host matrix of the same orientation onto this backend
    pub fn upload(context: &B::Context, host: &DenseMatrix<T, Host, O>) -> Result<Self> {
        Self::from_vec(context, host.rows, host.cols, host.buffer.clone())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn context(&self) -> &B::Context {
        &self.context
    }

    pub fn buffer(&self) -> &B::Buffer<T> {
        &self.buffer
    }

    /// Distance between consecutive major lines
    pub fn leading_dimension(&self) -> usize {
        O::min_leading_dimension(self.rows, self.cols)
    }

    /// Elements in `O` order, read after all pending work on the backend
    pub fn to_vec(&self) -> Result<Vec<T>> {
        B::download(&self.context, &self.buffer)
    }

    /// Copy to a host matrix of the same orientation
    pub fn to_host(&self) -> Result<DenseMatrix<T, Host, O>> {
        let data = self.to_vec()?;
        DenseMatrix::from_vec(&HostContext::default(), self.rows, self.cols, data)
    }

    /// Reinterpret the buffer as the transposed matrix in the opposite
    /// orientation
    pub fn into_transposed(self) -> DenseMatrix<T, B, O::Transposed> {
        DenseMatrix {
            buffer: self.buffer,
            rows: self.cols,
            cols: self.rows,
            context: self.context,
            _orientation: PhantomData,
        }
    }

    /// Lazy `alpha * self`
    pub fn scaled(&self, alpha: T) -> Scaled<&Self> {
        Scaled::new(alpha, self)
    }

    /// Storage-backed transposed view
    pub fn t(&self) -> Transposed<&Self> {
        Transposed::new(self)
    }
}

impl<T: Numeric, O: Orientation> DenseMatrix<T, Host, O> {
    /// Zero-filled host matrix with the default host context
    ///
    /// # Panics
    ///
    /// When `rows * cols` overflows `usize`, like `Vec` on capacity
    /// overflow. [`try_new`](Self::try_new) reports it as an error instead.
    pub fn new(rows: usize, cols: usize) -> Self {
        match Self::try_new(rows, cols) {
            Ok(matrix) => matrix,
            Err(err) => panic!("{err}"),
        }
    }

    /// Zero-filled host matrix, or `InvalidLayout` when the element count
    /// overflows
    pub fn try_new(rows: usize, cols: usize) -> Result<Self> {
        Ok(Self {
            buffer: vec![T::zero(); checked_len(rows, cols)?],
            rows,
            cols,
            context: HostContext::default(),
            _orientation: PhantomData,
        })
    }

    /// Build from row-major data, whatever the orientation of the result
    pub fn from_row_slice(rows: usize, cols: usize, data: &[T]) -> Result<Self> {
        let expected = checked_len(rows, cols)?;
        if data.len() != expected {
            return Err(Error::dimension_mismatch("matrix construction", expected, data.len()));
        }
        Self::from_fn(rows, cols, |i, j| data[i * cols + j])
    }

    /// Build by evaluating `f(row, col)` for every element
    pub fn from_fn(
        rows: usize,
        cols: usize,
        mut f: impl FnMut(usize, usize) -> T,
    ) -> Result<Self> {
        let mut matrix = Self::try_new(rows, cols)?;
        for i in 0..rows {
            for j in 0..cols {
                matrix[(i, j)] = f(i, j);
            }
        }
        Ok(matrix)
    }

    /// Replace the execution context
    pub fn with_context(mut self, context: HostContext) -> Self {
        self.context = context;
        self
    }

    pub fn get(&self, row: usize, col: usize) -> Option<T> {
        (row < self.rows && col < self.cols)
            .then(|| self.buffer[O::index(row, col, self.leading_dimension())])
    }

    /// Elements in `O` order
    pub fn as_slice(&self) -> &[T] {
        &self.buffer
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.buffer
    }

    /// Change the shape, keeping the elements of the overlapping block
    ///
    /// New elements are zero. The buffer is reallocated whenever the minor
    /// extent changes. Fails without touching the matrix when the new
    /// element count overflows.
    pub fn resize(&mut self, rows: usize, cols: usize) -> Result<()> {
        let len = checked_len(rows, cols)?;
        let same_minor = match O::LAYOUT {
            Layout::RowMajor => cols == self.cols,
            Layout::ColumnMajor => rows == self.rows,
        };
        if same_minor {
            // Major lines keep their stride: grow or truncate in place
            self.buffer.resize(len, T::zero());
        } else {
            let mut next = vec![T::zero(); len];
            let next_ld = O::min_leading_dimension(rows, cols);
            let ld = self.leading_dimension();
            for i in 0..rows.min(self.rows) {
                for j in 0..cols.min(self.cols) {
                    next[O::index(i, j, next_ld)] = self.buffer[O::index(i, j, ld)];
                }
            }
            self.buffer = next;
        }
        self.rows = rows;
        self.cols = cols;
        Ok(())
    }

    /// Row-major copy of the elements
    pub fn to_row_major_vec(&self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.rows * self.cols);
        for i in 0..self.rows {
            for j in 0..self.cols {
                out.push(self[(i, j)]);
            }
        }
        out
    }
}

impl<T: Numeric, O: Orientation> Clone for DenseMatrix<T, Host, O> {
    fn clone(&self) -> Self {
        Self {
            buffer: self.buffer.clone(),
            rows: self.rows,
            cols: self.cols,
            context: self.context,
            _orientation: PhantomData,
        }
    }
}

impl<T: Numeric, O: Orientation> PartialEq for DenseMatrix<T, Host, O> {
    fn eq(&self, other: &Self) -> bool {
        self.rows == other.rows && self.cols == other.cols && self.buffer == other.buffer
    }
}

impl<T: Numeric, O: Orientation> Index<(usize, usize)> for DenseMatrix<T, Host, O> {
    type Output = T;

    fn index(&self, (row, col): (usize, usize)) -> &T {
        assert!(
            row < self.rows && col < self.cols,
            "index ({row}, {col}) out of bounds for {}x{} matrix",
            self.rows,
            self.cols
        );
        &self.buffer[O::index(row, col, self.leading_dimension())]
    }
}

impl<T: Numeric, O: Orientation> IndexMut<(usize, usize)> for DenseMatrix<T, Host, O> {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut T {
        assert!(
            row < self.rows && col < self.cols,
            "index ({row}, {col}) out of bounds for {}x{} matrix",
            self.rows,
            self.cols
        );
        let ld = self.leading_dimension();
        &mut self.buffer[O::index(row, col, ld)]
    }
}

impl<T: Numeric, B: Backend, O: Orientation> MatrixExpression for DenseMatrix<T, B, O> {
    type Value = T;
    type Backend = B;
    type Orientation = O;
    type Category = Dense;

    fn rows(&self) -> usize {
        self.rows
    }

    fn cols(&self) -> usize {
        self.cols
    }

    fn context(&self) -> &B::Context {
        &self.context
    }
}

impl<T: Numeric, B: Backend, O: Orientation> DenseStorage for DenseMatrix<T, B, O> {
    fn raw_storage(&self) -> StorageDescriptor<'_, B, T, O> {
        StorageDescriptor::packed(&self.buffer, self.rows, self.cols)
    }
}

impl<T: Numeric, B: Backend, O: Orientation> DenseStorageMut for DenseMatrix<T, B, O> {
    fn raw_storage_mut(&mut self) -> StorageDescriptorMut<'_, B, T, O> {
        StorageDescriptorMut::packed(&mut self.buffer, self.rows, self.cols)
    }
}

impl<T: Numeric, B: Backend, O: Orientation> Evaluate for DenseMatrix<T, B, O> {
    fn evaluate(&self) -> Result<Evaluated<'_, T, B, O>> {
        Ok(Evaluated::Borrowed(self.raw_storage()))
    }
}
