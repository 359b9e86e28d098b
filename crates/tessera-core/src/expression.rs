//! Expression traits and the evaluation adapter
//!
//! Kernels accept any [`MatrixExpression`] or [`VectorExpression`], but only
//! ever hand storage descriptors to native routines. The bridge between the
//! two is [`Evaluate`]: an expression either lends out its own storage
//! ([`Evaluated::Borrowed`]) or is materialized into a temporary of the same
//! shape ([`Evaluated::Materialized`]). Which of the two happens is visible
//! in the returned value rather than decided behind the caller's back.
//!
//! ```
//! use tessera_core::prelude::*;
//!
//! let a = DenseMatrix::<f64>::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]).unwrap();
//! assert!(!a.evaluate().unwrap().is_materialized());
//!
//! let scaled = a.scaled(2.0);
//! let evaluated = scaled.evaluate().unwrap();
//! assert!(evaluated.is_materialized());
//! assert_eq!(evaluated.storage().buffer()[3], 8.0);
//! ```

use crate::backend::Backend;
use crate::dense::DenseMatrix;
use crate::numeric::Numeric;
use crate::storage::{StorageDescriptor, StorageDescriptorMut, VectorDescriptor};
use crate::tags::{Dense, Orientation, StorageCategory};
use crate::Result;
use tracing::trace;

/// A matrix that can be evaluated, tagged with everything a kernel needs to
/// pick a native routine
pub trait MatrixExpression {
    type Value: Numeric;
    type Backend: Backend;
    type Orientation: Orientation;
    type Category: StorageCategory;

    fn rows(&self) -> usize;

    fn cols(&self) -> usize;

    /// Execution context the expression lives in
    fn context(&self) -> &<Self::Backend as Backend>::Context;

    fn shape(&self) -> (usize, usize) {
        (self.rows(), self.cols())
    }
}

/// Expressions already backed by addressable dense memory
pub trait DenseStorage: MatrixExpression<Category = Dense> {
    fn raw_storage(&self) -> StorageDescriptor<'_, Self::Backend, Self::Value, Self::Orientation>;
}

/// Dense storage that can be the output of a kernel
pub trait DenseStorageMut: DenseStorage {
    fn raw_storage_mut(
        &mut self,
    ) -> StorageDescriptorMut<'_, Self::Backend, Self::Value, Self::Orientation>;
}

/// Evaluate-if-needed
pub trait Evaluate: MatrixExpression<Category = Dense> {
    fn evaluate(&self) -> Result<Evaluated<'_, Self::Value, Self::Backend, Self::Orientation>>;
}

/// Outcome of [`Evaluate::evaluate`]
#[derive(Debug)]
pub enum Evaluated<'a, T: Numeric, B: Backend, O: Orientation> {
    /// The expression's own storage
    Borrowed(StorageDescriptor<'a, B, T, O>),
    /// A temporary holding the evaluated expression
    Materialized(DenseMatrix<T, B, O>),
}

impl<T: Numeric, B: Backend, O: Orientation> Evaluated<'_, T, B, O> {
    /// Descriptor of the evaluated data
    pub fn storage(&self) -> StorageDescriptor<'_, B, T, O> {
        match self {
            Evaluated::Borrowed(descriptor) => *descriptor,
            Evaluated::Materialized(matrix) => matrix.raw_storage(),
        }
    }

    pub fn is_materialized(&self) -> bool {
        matches!(self, Evaluated::Materialized(_))
    }
}

impl<M: MatrixExpression + ?Sized> MatrixExpression for &M {
    type Value = M::Value;
    type Backend = M::Backend;
    type Orientation = M::Orientation;
    type Category = M::Category;

    fn rows(&self) -> usize {
        (**self).rows()
    }

    fn cols(&self) -> usize {
        (**self).cols()
    }

    fn context(&self) -> &<Self::Backend as Backend>::Context {
        (**self).context()
    }
}

impl<M: DenseStorage + ?Sized> DenseStorage for &M {
    fn raw_storage(&self) -> StorageDescriptor<'_, Self::Backend, Self::Value, Self::Orientation> {
        (**self).raw_storage()
    }
}

impl<M: Evaluate + ?Sized> Evaluate for &M {
    fn evaluate(&self) -> Result<Evaluated<'_, Self::Value, Self::Backend, Self::Orientation>> {
        (**self).evaluate()
    }
}

/// Transposed view sharing the storage of `M`
///
/// A `rows x cols` matrix in orientation `O` is read as a `cols x rows`
/// matrix in `O::Transposed`; no data moves.
#[derive(Clone, Copy, Debug)]
pub struct Transposed<M> {
    inner: M,
}

impl<M> Transposed<M> {
    pub fn new(inner: M) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &M {
        &self.inner
    }

    pub fn into_inner(self) -> M {
        self.inner
    }
}

impl<M: MatrixExpression> MatrixExpression for Transposed<M> {
    type Value = M::Value;
    type Backend = M::Backend;
    type Orientation = <M::Orientation as Orientation>::Transposed;
    type Category = M::Category;

    fn rows(&self) -> usize {
        self.inner.cols()
    }

    fn cols(&self) -> usize {
        self.inner.rows()
    }

    fn context(&self) -> &<Self::Backend as Backend>::Context {
        self.inner.context()
    }
}

impl<M: DenseStorage> DenseStorage for Transposed<M> {
    fn raw_storage(&self) -> StorageDescriptor<'_, Self::Backend, Self::Value, Self::Orientation> {
        self.inner.raw_storage().transposed()
    }
}

impl<M: Evaluate> Evaluate for Transposed<M> {
    fn evaluate(&self) -> Result<Evaluated<'_, Self::Value, Self::Backend, Self::Orientation>> {
        Ok(match self.inner.evaluate()? {
            Evaluated::Borrowed(descriptor) => Evaluated::Borrowed(descriptor.transposed()),
            Evaluated::Materialized(matrix) => Evaluated::Materialized(matrix.into_transposed()),
        })
    }
}

/// Lazy `alpha * M`
///
/// Not backed by storage: evaluating it allocates a temporary on the
/// backend of `M` and fills it with a copy-scale command.
#[derive(Clone, Copy, Debug)]
pub struct Scaled<M: MatrixExpression> {
    alpha: M::Value,
    inner: M,
}

impl<M: MatrixExpression> Scaled<M> {
    pub fn new(alpha: M::Value, inner: M) -> Self {
        Self { alpha, inner }
    }

    pub fn alpha(&self) -> M::Value {
        self.alpha
    }

    pub fn inner(&self) -> &M {
        &self.inner
    }
}

impl<M: Evaluate> MatrixExpression for Scaled<M> {
    type Value = M::Value;
    type Backend = M::Backend;
    type Orientation = M::Orientation;
    type Category = Dense;

    fn rows(&self) -> usize {
        self.inner.rows()
    }

    fn cols(&self) -> usize {
        self.inner.cols()
    }

    fn context(&self) -> &<Self::Backend as Backend>::Context {
        self.inner.context()
    }
}

impl<M: Evaluate> Evaluate for Scaled<M> {
    fn evaluate(&self) -> Result<Evaluated<'_, Self::Value, Self::Backend, Self::Orientation>> {
        let (rows, cols) = self.shape();
        trace!(
            backend = <M::Backend as Backend>::NAME,
            rows,
            cols,
            "materializing scaled expression"
        );
        let source = self.inner.evaluate()?;
        let mut target =
            DenseMatrix::<M::Value, M::Backend, M::Orientation>::zeros(self.context(), rows, cols)?;
        // Device copies are ordered ahead of every later command on the
        // queue, so the completion is not awaited here.
        let _pending = <M::Backend as Backend>::copy_scaled(
            self.context(),
            self.alpha,
            source.storage(),
            target.raw_storage_mut(),
        )?;
        Ok(Evaluated::Materialized(target))
    }
}

/// A vector that can be evaluated
pub trait VectorExpression {
    type Value: Numeric;
    type Backend: Backend;
    type Category: StorageCategory;

    /// Number of logical elements (the declared dimension for sparse vectors)
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn context(&self) -> &<Self::Backend as Backend>::Context;
}

/// Vectors backed by addressable dense memory
pub trait DenseVectorStorage: VectorExpression<Category = Dense> {
    fn raw_storage(&self) -> VectorDescriptor<'_, Self::Backend, Self::Value>;
}

impl<V: VectorExpression + ?Sized> VectorExpression for &V {
    type Value = V::Value;
    type Backend = V::Backend;
    type Category = V::Category;

    fn len(&self) -> usize {
        (**self).len()
    }

    fn context(&self) -> &<Self::Backend as Backend>::Context {
        (**self).context()
    }
}

impl<V: DenseVectorStorage + ?Sized> DenseVectorStorage for &V {
    fn raw_storage(&self) -> VectorDescriptor<'_, Self::Backend, Self::Value> {
        (**self).raw_storage()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Device, Host, Queue};
    use crate::tags::{ColumnMajor, Layout, RowMajor};

    #[test]
    fn test_storage_backed_matrix_is_borrowed() {
        let m = DenseMatrix::<f32, Host, RowMajor>::new(2, 3);
        let evaluated = m.evaluate().unwrap();
        assert!(!evaluated.is_materialized());
        assert_eq!(evaluated.storage().rows(), 2);
        assert_eq!(evaluated.storage().leading_dimension(), 3);
    }

    #[test]
    fn test_transposed_view_flips_orientation() {
        let m = DenseMatrix::<f64, Host, RowMajor>::from_row_slice(2, 3, &[1., 2., 3., 4., 5., 6.])
            .unwrap();
        let t = m.t();
        assert_eq!(t.shape(), (3, 2));
        assert_eq!(
            <<Transposed<&DenseMatrix<f64>> as MatrixExpression>::Orientation as Orientation>::LAYOUT,
            Layout::ColumnMajor
        );

        let desc = t.raw_storage();
        // Element (2, 1) of the transpose is element (1, 2) of the source
        assert_eq!(desc.buffer()[ColumnMajor::index(2, 1, desc.leading_dimension())], 6.0);
        assert!(!t.evaluate().unwrap().is_materialized());
    }

    #[test]
    fn test_scaled_is_materialized() {
        let m = DenseMatrix::<f64, Host, ColumnMajor>::from_row_slice(2, 2, &[1., 2., 3., 4.])
            .unwrap();
        let scaled = m.scaled(-1.0);
        let evaluated = scaled.evaluate().unwrap();
        assert!(evaluated.is_materialized());
        let desc = evaluated.storage();
        assert_eq!(desc.buffer(), &vec![-1.0, -3.0, -2.0, -4.0]);
        // Source untouched
        assert_eq!(m[(1, 0)], 3.0);
    }

    #[test]
    fn test_transposed_scaled_keeps_temporary() {
        let m = DenseMatrix::<i32, Host, RowMajor>::from_row_slice(1, 2, &[1, 2]).unwrap();
        let expr = Transposed::new(m.scaled(3));
        assert_eq!(expr.shape(), (2, 1));
        match expr.evaluate().unwrap() {
            Evaluated::Materialized(temp) => {
                assert_eq!(temp.shape(), (2, 1));
                assert_eq!(temp.as_slice(), &[3, 6]);
            }
            Evaluated::Borrowed(_) => panic!("scaled expression has no storage to borrow"),
        }
    }

    #[test]
    fn test_scaled_on_device() {
        let queue = Queue::with_defaults().unwrap();
        let m = DenseMatrix::<f32, Device, RowMajor>::from_vec(&queue, 2, 2, vec![1., 2., 3., 4.])
            .unwrap();
        let scaled = m.scaled(0.5);
        let evaluated = scaled.evaluate().unwrap();
        let Evaluated::Materialized(temp) = evaluated else {
            panic!("expected a temporary");
        };
        assert_eq!(temp.to_vec().unwrap(), vec![0.5, 1.0, 1.5, 2.0]);
    }
}
