//! Dense vector container

use crate::backend::{Backend, Host, HostContext};
use crate::expression::{DenseVectorStorage, VectorExpression};
use crate::numeric::Numeric;
use crate::storage::VectorDescriptor;
use crate::tags::Dense;
use crate::Result;
use std::ops::{Index, IndexMut};

/// Contiguous vector owning one backend buffer
#[derive(Debug)]
pub struct DenseVector<T: Numeric, B: Backend = Host> {
    buffer: B::Buffer<T>,
    context: B::Context,
}

impl<T: Numeric, B: Backend> DenseVector<T, B> {
    /// Allocate a zero-filled vector on the backend of `context`
    pub fn zeros(context: &B::Context, len: usize) -> Result<Self> {
        Ok(Self {
            buffer: B::allocate(context, len)?,
            context: context.clone(),
        })
    }

    pub fn from_vec(context: &B::Context, data: Vec<T>) -> Result<Self> {
        Ok(Self {
            buffer: B::upload(context, data)?,
            context: context.clone(),
        })
    }

    /// Copy a host vector onto this backend
    pub fn upload(context: &B::Context, host: &DenseVector<T, Host>) -> Result<Self> {
        Self::from_vec(context, host.buffer.clone())
    }

    pub fn len(&self) -> usize {
        B::buffer_len(&self.buffer)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn context(&self) -> &B::Context {
        &self.context
    }

    pub fn buffer(&self) -> &B::Buffer<T> {
        &self.buffer
    }

    /// Elements, read after all pending work on the backend
    pub fn to_vec(&self) -> Result<Vec<T>> {
        B::download(&self.context, &self.buffer)
    }

    pub fn to_host(&self) -> Result<DenseVector<T, Host>> {
        Ok(DenseVector::from(self.to_vec()?))
    }
}

impl<T: Numeric> DenseVector<T, Host> {
    /// Zero-filled host vector
    pub fn new(len: usize) -> Self {
        Self::filled(len, T::zero())
    }

    /// `len` copies of `value`
    pub fn filled(len: usize, value: T) -> Self {
        Self::from(vec![value; len])
    }

    pub fn from_slice(data: &[T]) -> Self {
        Self::from(data.to_vec())
    }

    pub fn with_context(mut self, context: HostContext) -> Self {
        self.context = context;
        self
    }

    pub fn get(&self, index: usize) -> Option<T> {
        self.buffer.get(index).copied()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.buffer
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.buffer
    }

    /// Grow with zeros or truncate
    pub fn resize(&mut self, len: usize) {
        self.buffer.resize(len, T::zero());
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.buffer.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.buffer.iter_mut()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.buffer
    }
}

impl<T: Numeric> From<Vec<T>> for DenseVector<T, Host> {
    fn from(buffer: Vec<T>) -> Self {
        Self {
            buffer,
            context: HostContext::default(),
        }
    }
}

impl<T: Numeric> FromIterator<T> for DenseVector<T, Host> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

impl<T: Numeric> Clone for DenseVector<T, Host> {
    fn clone(&self) -> Self {
        Self {
            buffer: self.buffer.clone(),
            context: self.context,
        }
    }
}

impl<T: Numeric> PartialEq for DenseVector<T, Host> {
    fn eq(&self, other: &Self) -> bool {
        self.buffer == other.buffer
    }
}

impl<T: Numeric> Index<usize> for DenseVector<T, Host> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.buffer[index]
    }
}

impl<T: Numeric> IndexMut<usize> for DenseVector<T, Host> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.buffer[index]
    }
}

impl<'a, T: Numeric> IntoIterator for &'a DenseVector<T, Host> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.buffer.iter()
    }
}

impl<'a, T: Numeric> IntoIterator for &'a mut DenseVector<T, Host> {
    type Item = &'a mut T;
    type IntoIter = std::slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.buffer.iter_mut()
    }
}

impl<T: Numeric, B: Backend> VectorExpression for DenseVector<T, B> {
    type Value = T;
    type Backend = B;
    type Category = Dense;

    fn len(&self) -> usize {
        B::buffer_len(&self.buffer)
    }

    fn context(&self) -> &B::Context {
        &self.context
    }
}

impl<T: Numeric, B: Backend> DenseVectorStorage for DenseVector<T, B> {
    fn raw_storage(&self) -> VectorDescriptor<'_, B, T> {
        VectorDescriptor::contiguous_unchecked(&self.buffer, 0, B::buffer_len(&self.buffer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Device, Queue};

    #[test]
    fn test_host_vector_basics() {
        let mut v: DenseVector<f64> = (1..=4).map(f64::from).collect();
        assert_eq!(v.len(), 4);
        assert_eq!(v[2], 3.0);
        v[0] = 10.0;
        assert_eq!(v.get(0), Some(10.0));
        assert_eq!(v.get(4), None);

        v.resize(6);
        assert_eq!(v.as_slice(), &[10.0, 2.0, 3.0, 4.0, 0.0, 0.0]);
        for x in &mut v {
            *x *= 2.0;
        }
        assert_eq!(v.iter().copied().sum::<f64>(), 38.0);
    }

    #[test]
    fn test_filled_and_equality() {
        let a = DenseVector::filled(3, 7u32);
        let b = DenseVector::from_slice(&[7u32, 7, 7]);
        assert_eq!(a, b);
        assert_ne!(a, DenseVector::new(3));
    }

    #[test]
    fn test_descriptor_covers_vector() {
        let v = DenseVector::from_slice(&[1i64, 2, 3]);
        let desc = v.raw_storage();
        assert_eq!((desc.offset(), desc.stride(), desc.len()), (0, 1, 3));
    }

    #[test]
    fn test_device_vector_round_trip() {
        let queue = Queue::with_defaults().unwrap();
        let host = DenseVector::from_slice(&[1.5f32, -2.0]);
        let device = DenseVector::<f32, Device>::upload(&queue, &host).unwrap();
        assert_eq!(VectorExpression::len(&device), 2);
        assert_eq!(device.to_host().unwrap(), host);

        let zeros = DenseVector::<f32, Device>::zeros(&queue, 3).unwrap();
        assert_eq!(zeros.to_vec().unwrap(), vec![0.0; 3]);
    }
}
