//! Per-element-type choice of batch aggregate
//!
//! | element type                | aggregate                         |
//! |-----------------------------|-----------------------------------|
//! | `DenseVector<T>`            | `DenseMatrix<T>`, one row a slot  |
//! | `CompressedVector<T>`       | `CompressedMatrix<T>`, CSR rows   |
//! | `f32`, `f64`, `i32`, ...    | `DenseVector<T>`                  |
//! | anything else (opted in)    | `Vec<T>`                          |
//!
//! Vector types are matched first because they are not [`Numeric`]; the
//! scalar rule covers exactly the `Numeric` types; everything else goes
//! through [`default_batch!`](crate::default_batch).

use crate::aggregate::BatchAggregate;
use std::marker::PhantomData;
use tessera_core::{
    CompressedMatrix, CompressedVector, DenseMatrix, DenseVector, Error, Host, Numeric, Result,
    RowMajor,
};
use tracing::trace;

/// Element types that know how to batch themselves
pub trait BatchElement: Sized {
    /// Container holding many elements of this type
    type Aggregate: BatchAggregate<Element = Self>;

    /// Aggregate of `size` slots shaped like `blueprint`
    ///
    /// Scalar and default aggregates fill every slot with `blueprint`.
    /// Vector aggregates only take its dimension: slots start out zero.
    fn create_batch(blueprint: &Self, size: usize) -> Self::Aggregate;

    /// Aggregate holding copies of the elements of `range`, in order
    ///
    /// The range is traversed more than once by the vector aggregates (a
    /// validation and sizing pass, then a copy pass), so its iterator must
    /// be `Clone`; a single-pass iterator is rejected at compile time.
    fn create_batch_from_range<'r, R>(range: R) -> Result<Self::Aggregate>
    where
        Self: 'r,
        R: IntoIterator<Item = &'r Self>,
        R::IntoIter: Clone;

    /// Change the slot count and, for vector aggregates, the dimension of
    /// every slot
    ///
    /// `dimension` is ignored by scalar and default aggregates.
    fn resize(aggregate: &mut Self::Aggregate, slots: usize, dimension: usize) -> Result<()>;
}

macro_rules! numeric_batch {
    ($($ty:ty),*) => {
        $(
            impl BatchElement for $ty {
                type Aggregate = DenseVector<$ty, Host>;

                fn create_batch(blueprint: &$ty, size: usize) -> DenseVector<$ty, Host> {
                    DenseVector::filled(size, *blueprint)
                }

                fn create_batch_from_range<'r, R>(range: R) -> Result<DenseVector<$ty, Host>>
                where
                    R: IntoIterator<Item = &'r $ty>,
                    R::IntoIter: Clone,
                {
                    Ok(range.into_iter().copied().collect())
                }

                fn resize(
                    aggregate: &mut DenseVector<$ty, Host>,
                    slots: usize,
                    _dimension: usize,
                ) -> Result<()> {
                    aggregate.resize(slots);
                    Ok(())
                }
            }
        )*
    };
}

numeric_batch!(f32, f64, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

/// Shared implementation of the `Vec`-backed fallback
///
/// Used by [`default_batch!`](crate::default_batch); callers normally go
/// through [`Batch`](crate::Batch) instead.
pub struct DefaultBatch<T>(PhantomData<T>);

impl<T: Clone + Default> DefaultBatch<T> {
    pub fn create(blueprint: &T, size: usize) -> Vec<T> {
        vec![blueprint.clone(); size]
    }

    pub fn from_range<'r, R>(range: R) -> Vec<T>
    where
        T: 'r,
        R: IntoIterator<Item = &'r T>,
    {
        range.into_iter().cloned().collect()
    }

    /// Truncate, or grow with default values
    pub fn resize(aggregate: &mut Vec<T>, slots: usize) {
        aggregate.resize_with(slots, T::default);
    }
}

/// Store an element type in a plain `Vec` when batched
///
/// ```rust
/// use tessera_batch::{default_batch, Batch};
///
/// #[derive(Clone, Debug, Default, PartialEq)]
/// struct Label(u8);
///
/// default_batch!(Label);
///
/// let batch = Batch::create(&Label(3), 2);
/// assert_eq!(batch, vec![Label(3), Label(3)]);
/// ```
///
/// Generic types list their parameters: `default_batch!(impl<T> MyBox<T>)`.
#[macro_export]
macro_rules! default_batch {
    (@impl [$($generics:ident),*] $ty:ty) => {
        impl<$($generics),*> $crate::BatchElement for $ty
        where
            $ty: ::std::clone::Clone + ::std::default::Default,
        {
            type Aggregate = ::std::vec::Vec<$ty>;

            fn create_batch(blueprint: &Self, size: usize) -> ::std::vec::Vec<$ty> {
                $crate::DefaultBatch::create(blueprint, size)
            }

            fn create_batch_from_range<'r, R>(range: R) -> $crate::Result<::std::vec::Vec<$ty>>
            where
                Self: 'r,
                R: ::std::iter::IntoIterator<Item = &'r Self>,
                R::IntoIter: ::std::clone::Clone,
            {
                Ok($crate::DefaultBatch::from_range(range))
            }

            fn resize(
                aggregate: &mut ::std::vec::Vec<$ty>,
                slots: usize,
                _dimension: usize,
            ) -> $crate::Result<()> {
                $crate::DefaultBatch::resize(aggregate, slots);
                Ok(())
            }
        }
    };
    (impl<$($generics:ident),+> $ty:ty) => {
        $crate::default_batch!(@impl [$($generics),+] $ty);
    };
    ($($ty:ty),+ $(,)?) => {
        $($crate::default_batch!(@impl [] $ty);)+
    };
}

default_batch!(String, bool, char);
default_batch!(impl<T> Option<T>);
default_batch!(impl<T> Vec<T>);
default_batch!(impl<A, B> (A, B));

/// A batch of dense vectors is a row-major matrix, one row per slot
impl<T: Numeric> BatchElement for DenseVector<T, Host> {
    type Aggregate = DenseMatrix<T, Host, RowMajor>;

    fn create_batch(blueprint: &Self, size: usize) -> DenseMatrix<T, Host, RowMajor> {
        DenseMatrix::new(size, blueprint.len()).with_context(*blueprint.context())
    }

    fn create_batch_from_range<'r, R>(range: R) -> Result<DenseMatrix<T, Host, RowMajor>>
    where
        R: IntoIterator<Item = &'r Self>,
        R::IntoIter: Clone,
    {
        let items = range.into_iter();

        // Sizing pass: the first element fixes the column count
        let mut scan = items.clone();
        let first = scan.next().ok_or(Error::EmptyRange("dense vector batch"))?;
        let cols = first.len();
        let mut rows = 1;
        for vector in scan {
            if vector.len() != cols {
                return Err(Error::dimension_mismatch(
                    "dense vector batch",
                    cols,
                    vector.len(),
                ));
            }
            rows += 1;
        }

        let mut batch = DenseMatrix::new(rows, cols).with_context(*first.context());
        for (mut row, vector) in batch.row_iter_mut().zip(items) {
            row.copy_from_slice(vector.as_slice());
        }
        trace!(rows, cols, "dense vector batch");
        Ok(batch)
    }

    fn resize(
        aggregate: &mut DenseMatrix<T, Host, RowMajor>,
        slots: usize,
        dimension: usize,
    ) -> Result<()> {
        aggregate.resize(slots, dimension)
    }
}

/// A batch of sparse vectors is a CSR matrix, one compressed row per slot
impl<T: Numeric> BatchElement for CompressedVector<T> {
    type Aggregate = CompressedMatrix<T>;

    fn create_batch(blueprint: &Self, size: usize) -> CompressedMatrix<T> {
        CompressedMatrix::new(size, blueprint.len())
    }

    fn create_batch_from_range<'r, R>(range: R) -> Result<CompressedMatrix<T>>
    where
        R: IntoIterator<Item = &'r Self>,
        R::IntoIter: Clone,
    {
        let items = range.into_iter();

        // Pre-pass: total non-zeros for a single allocation. Inconsistent
        // dimensions are rejected here, before any row is copied.
        let mut scan = items.clone();
        let first = scan.next().ok_or(Error::EmptyRange("sparse vector batch"))?;
        let dim = first.len();
        let (mut rows, mut nnz) = (1, first.nnz());
        for (offset, vector) in scan.enumerate() {
            if vector.len() != dim {
                return Err(Error::SparseConstruction {
                    index: offset + 1,
                    expected: dim,
                    actual: vector.len(),
                });
            }
            rows += 1;
            nnz += vector.nnz();
        }

        let mut batch = CompressedMatrix::with_capacity(rows, dim, nnz);
        for vector in items {
            batch.push_vector(vector)?;
        }
        trace!(rows, dim, nnz, "sparse vector batch");
        Ok(batch)
    }

    fn resize(aggregate: &mut CompressedMatrix<T>, slots: usize, dimension: usize) -> Result<()> {
        aggregate.resize(slots, dimension);
        Ok(())
    }
}
