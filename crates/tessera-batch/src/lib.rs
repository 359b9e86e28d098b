//! Batch aggregates for scalars, vectors and sparse vectors
//!
//! [`Batch<T>`] picks, for an element type `T`, the container that stores
//! many `T` contiguously, and builds, resizes and views it:
//!
//! - a batch of dense vectors is a matrix with one row per vector
//! - a batch of sparse vectors is a compressed matrix with one compressed
//!   row per vector
//! - a batch of numbers is a dense vector
//! - anything else is a `Vec`
//!
//! Slots are read through element views ([`BatchAggregate::Ref`]), which for
//! matrix aggregates are row views usable anywhere a vector expression is.
//!
//! # Example
//!
//! ```rust
//! use tessera_batch::{Batch, BatchAggregate};
//! use tessera_core::DenseVector;
//!
//! let points = vec![
//!     DenseVector::from_slice(&[1.0, 2.0]),
//!     DenseVector::from_slice(&[3.0, 4.0]),
//!     DenseVector::from_slice(&[5.0, 6.0]),
//! ];
//! let batch = Batch::create_from_range(&points).unwrap();
//! assert_eq!(batch.shape(), (3, 2));
//!
//! for (row, point) in batch.iter().zip(&points) {
//!     assert_eq!(row, *point);
//! }
//! ```

mod aggregate;
mod element;

pub use aggregate::BatchAggregate;
pub use element::{BatchElement, DefaultBatch};
pub use tessera_core::{Error, Result};

use std::marker::PhantomData;

/// Aggregate type used to batch `T`
pub type BatchOf<T> = <T as BatchElement>::Aggregate;

/// Read-only view of one slot of a batch of `T`
pub type ElementRef<'a, T> = <BatchOf<T> as BatchAggregate>::Ref<'a>;

/// Writable view of one slot of a batch of `T`
pub type ElementMut<'a, T> = <BatchOf<T> as BatchAggregate>::Mut<'a>;

pub type BatchIter<'a, T> = <BatchOf<T> as BatchAggregate>::Iter<'a>;

pub type BatchIterMut<'a, T> = <BatchOf<T> as BatchAggregate>::IterMut<'a>;

/// Entry point bundling the batch operations of one element type
///
/// `Batch::<T>::create(..)` and the free functions [`create_batch`],
/// [`create_batch_from_range`] and [`resize_batch`] are equivalent.
pub struct Batch<T>(PhantomData<T>);

impl<T: BatchElement> Batch<T> {
    /// Aggregate of `size` slots shaped like `blueprint`
    pub fn create(blueprint: &T, size: usize) -> BatchOf<T> {
        T::create_batch(blueprint, size)
    }

    /// Aggregate holding a single slot shaped like `blueprint`
    pub fn single(blueprint: &T) -> BatchOf<T> {
        T::create_batch(blueprint, 1)
    }

    /// Aggregate holding copies of every element of `range`, in order
    pub fn create_from_range<'r, R>(range: R) -> Result<BatchOf<T>>
    where
        T: 'r,
        R: IntoIterator<Item = &'r T>,
        R::IntoIter: Clone,
    {
        T::create_batch_from_range(range)
    }

    /// Change the slot count and, for vector batches, the slot dimension
    pub fn resize(aggregate: &mut BatchOf<T>, slots: usize, dimension: usize) -> Result<()> {
        T::resize(aggregate, slots, dimension)
    }
}

pub fn create_batch<T: BatchElement>(blueprint: &T, size: usize) -> BatchOf<T> {
    Batch::create(blueprint, size)
}

pub fn create_batch_from_range<'r, T, R>(range: R) -> Result<BatchOf<T>>
where
    T: BatchElement + 'r,
    R: IntoIterator<Item = &'r T>,
    R::IntoIter: Clone,
{
    Batch::create_from_range(range)
}

pub fn resize_batch<T: BatchElement>(
    aggregate: &mut BatchOf<T>,
    slots: usize,
    dimension: usize,
) -> Result<()> {
    Batch::<T>::resize(aggregate, slots, dimension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::{CompressedVector, DenseVector};

    #[test]
    fn test_facade_matches_free_functions() {
        let a = Batch::create(&1.5f64, 3);
        let b = create_batch(&1.5f64, 3);
        assert_eq!(a, b);
        assert_eq!(Batch::single(&'x'), vec!['x']);
    }

    #[test]
    fn test_aliases_name_the_views() {
        let batch: BatchOf<DenseVector<f64>> =
            Batch::create(&DenseVector::from_slice(&[0.0, 0.0]), 2);
        let row: ElementRef<'_, DenseVector<f64>> = BatchAggregate::get(&batch, 1).unwrap();
        assert_eq!(row.len(), 2);

        let sparse = CompressedVector::new(4, vec![3], vec![1.0f32]).unwrap();
        let mut batch: BatchOf<CompressedVector<f32>> =
            Batch::create_from_range([&sparse, &sparse]).unwrap();
        resize_batch::<CompressedVector<f32>>(&mut batch, 3, 4).unwrap();
        let views: BatchIter<'_, CompressedVector<f32>> = batch.iter();
        assert_eq!(views.map(|row| row.nnz()).collect::<Vec<_>>(), vec![1, 1, 0]);
    }
}
