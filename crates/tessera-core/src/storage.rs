//! Storage descriptors: buffer handle, offset and leading dimension
//!
//! A descriptor is the only form in which kernels see dense memory. It can
//! only be obtained through [`StorageDescriptor::new`] (or its mutable and
//! vector counterparts), which checks that the leading dimension matches the
//! orientation and that the described region fits inside the buffer. Native
//! routines can therefore trust every descriptor they receive.

use crate::backend::Backend;
use crate::numeric::Numeric;
use crate::tags::Orientation;
use crate::{Error, Result};
use std::marker::PhantomData;

/// Number of elements spanned by `major` lines of `minor` elements with
/// stride `leading_dimension`, or `None` on overflow
fn region_span(major: usize, minor: usize, leading_dimension: usize) -> Option<usize> {
    if major == 0 || minor == 0 {
        return Some(0);
    }
    (major - 1)
        .checked_mul(leading_dimension)?
        .checked_add(minor)
}

fn validate_region<O: Orientation>(
    buffer_len: usize,
    offset: usize,
    rows: usize,
    cols: usize,
    leading_dimension: usize,
) -> Result<()> {
    let minor = O::minor_len(rows, cols);
    if leading_dimension < O::min_leading_dimension(rows, cols) {
        return Err(Error::InvalidLayout(format!(
            "leading dimension {leading_dimension} is smaller than {minor} for a {rows}x{cols} {:?} matrix",
            O::LAYOUT
        )));
    }
    let end = region_span(O::major_len(rows, cols), minor, leading_dimension)
        .and_then(|span| span.checked_add(offset))
        .ok_or_else(|| Error::InvalidLayout("region size overflows usize".to_string()))?;
    if end > buffer_len {
        return Err(Error::InvalidLayout(format!(
            "region ends at element {end} but the buffer holds {buffer_len}"
        )));
    }
    Ok(())
}

/// Read-only view of a dense matrix region
pub struct StorageDescriptor<'a, B: Backend, T: Numeric, O: Orientation> {
    buffer: &'a B::Buffer<T>,
    offset: usize,
    leading_dimension: usize,
    rows: usize,
    cols: usize,
    _orientation: PhantomData<O>,
}

impl<B: Backend, T: Numeric, O: Orientation> Clone for StorageDescriptor<'_, B, T, O> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<B: Backend, T: Numeric, O: Orientation> Copy for StorageDescriptor<'_, B, T, O> {}

impl<B: Backend, T: Numeric, O: Orientation> std::fmt::Debug for StorageDescriptor<'_, B, T, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageDescriptor")
            .field("backend", &B::NAME)
            .field("layout", &O::LAYOUT)
            .field("offset", &self.offset)
            .field("leading_dimension", &self.leading_dimension)
            .field("rows", &self.rows)
            .field("cols", &self.cols)
            .finish()
    }
}

impl<'a, B: Backend, T: Numeric, O: Orientation> StorageDescriptor<'a, B, T, O> {
    /// Describe a `rows x cols` region starting at `offset`
    pub fn new(
        buffer: &'a B::Buffer<T>,
        offset: usize,
        rows: usize,
        cols: usize,
        leading_dimension: usize,
    ) -> Result<Self> {
        validate_region::<O>(B::buffer_len(buffer), offset, rows, cols, leading_dimension)?;
        Ok(Self {
            buffer,
            offset,
            leading_dimension,
            rows,
            cols,
            _orientation: PhantomData,
        })
    }

    /// Packed region of a container whose buffer holds exactly
    /// `rows * cols` elements
    pub(crate) fn packed(buffer: &'a B::Buffer<T>, rows: usize, cols: usize) -> Self {
        debug_assert_eq!(B::buffer_len(buffer), rows * cols);
        Self {
            buffer,
            offset: 0,
            leading_dimension: O::min_leading_dimension(rows, cols),
            rows,
            cols,
            _orientation: PhantomData,
        }
    }

    /// Describe a packed region starting at element 0
    pub fn contiguous(buffer: &'a B::Buffer<T>, rows: usize, cols: usize) -> Result<Self> {
        Self::new(buffer, 0, rows, cols, O::min_leading_dimension(rows, cols))
    }

    pub fn buffer(&self) -> &'a B::Buffer<T> {
        self.buffer
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn leading_dimension(&self) -> usize {
        self.leading_dimension
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// The same memory read as the transposed matrix
    pub fn transposed(self) -> StorageDescriptor<'a, B, T, O::Transposed> {
        // A rows x cols region in O is a cols x rows region in O::Transposed
        // with identical major lines, so the invariant carries over.
        StorageDescriptor {
            buffer: self.buffer,
            offset: self.offset,
            leading_dimension: self.leading_dimension,
            rows: self.cols,
            cols: self.rows,
            _orientation: PhantomData,
        }
    }
}

/// Writable view of a dense matrix region
pub struct StorageDescriptorMut<'a, B: Backend, T: Numeric, O: Orientation> {
    buffer: &'a mut B::Buffer<T>,
    offset: usize,
    leading_dimension: usize,
    rows: usize,
    cols: usize,
    _orientation: PhantomData<O>,
}

impl<B: Backend, T: Numeric, O: Orientation> std::fmt::Debug
    for StorageDescriptorMut<'_, B, T, O>
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageDescriptorMut")
            .field("backend", &B::NAME)
            .field("layout", &O::LAYOUT)
            .field("offset", &self.offset)
            .field("leading_dimension", &self.leading_dimension)
            .field("rows", &self.rows)
            .field("cols", &self.cols)
            .finish()
    }
}

impl<'a, B: Backend, T: Numeric, O: Orientation> StorageDescriptorMut<'a, B, T, O> {
    /// Describe a writable `rows x cols` region starting at `offset`
    pub fn new(
        buffer: &'a mut B::Buffer<T>,
        offset: usize,
        rows: usize,
        cols: usize,
        leading_dimension: usize,
    ) -> Result<Self> {
        validate_region::<O>(B::buffer_len(buffer), offset, rows, cols, leading_dimension)?;
        Ok(Self {
            buffer,
            offset,
            leading_dimension,
            rows,
            cols,
            _orientation: PhantomData,
        })
    }

    pub(crate) fn packed(buffer: &'a mut B::Buffer<T>, rows: usize, cols: usize) -> Self {
        debug_assert_eq!(B::buffer_len(buffer), rows * cols);
        Self {
            buffer,
            offset: 0,
            leading_dimension: O::min_leading_dimension(rows, cols),
            rows,
            cols,
            _orientation: PhantomData,
        }
    }

    pub fn buffer(&self) -> &B::Buffer<T> {
        &*self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut B::Buffer<T> {
        &mut *self.buffer
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn leading_dimension(&self) -> usize {
        self.leading_dimension
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Reborrow as a read-only descriptor
    pub fn as_const(&self) -> StorageDescriptor<'_, B, T, O> {
        StorageDescriptor {
            buffer: &*self.buffer,
            offset: self.offset,
            leading_dimension: self.leading_dimension,
            rows: self.rows,
            cols: self.cols,
            _orientation: PhantomData,
        }
    }
}

/// Read-only view of a strided dense vector
pub struct VectorDescriptor<'a, B: Backend, T: Numeric> {
    buffer: &'a B::Buffer<T>,
    offset: usize,
    stride: usize,
    len: usize,
}

impl<B: Backend, T: Numeric> Clone for VectorDescriptor<'_, B, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<B: Backend, T: Numeric> Copy for VectorDescriptor<'_, B, T> {}

impl<B: Backend, T: Numeric> std::fmt::Debug for VectorDescriptor<'_, B, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorDescriptor")
            .field("backend", &B::NAME)
            .field("offset", &self.offset)
            .field("stride", &self.stride)
            .field("len", &self.len)
            .finish()
    }
}

impl<'a, B: Backend, T: Numeric> VectorDescriptor<'a, B, T> {
    /// Describe `len` elements starting at `offset`, `stride` apart
    pub fn new(buffer: &'a B::Buffer<T>, offset: usize, len: usize, stride: usize) -> Result<Self> {
        if stride == 0 && len > 1 {
            return Err(Error::InvalidLayout(
                "vector stride must be positive".to_string(),
            ));
        }
        let buffer_len = B::buffer_len(buffer);
        let end = region_span(len, 1, stride)
            .and_then(|span| span.checked_add(offset))
            .ok_or_else(|| Error::InvalidLayout("vector size overflows usize".to_string()))?;
        if end > buffer_len {
            return Err(Error::InvalidLayout(format!(
                "vector ends at element {end} but the buffer holds {buffer_len}"
            )));
        }
        Ok(Self {
            buffer,
            offset,
            stride: stride.max(1),
            len,
        })
    }

    /// Contiguous run of `len` elements that a container knows to be in
    /// bounds
    pub(crate) fn contiguous_unchecked(buffer: &'a B::Buffer<T>, offset: usize, len: usize) -> Self {
        debug_assert!(offset + len <= B::buffer_len(buffer));
        Self {
            buffer,
            offset,
            stride: 1,
            len,
        }
    }

    pub fn buffer(&self) -> &'a B::Buffer<T> {
        self.buffer
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Distance between consecutive elements
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Host;
    use crate::tags::{ColumnMajor, Layout, RowMajor};

    #[test]
    fn test_leading_dimension_must_cover_minor_extent() {
        let buffer = vec![0.0f64; 12];
        assert!(StorageDescriptor::<Host, f64, RowMajor>::new(&buffer, 0, 3, 4, 4).is_ok());
        assert!(matches!(
            StorageDescriptor::<Host, f64, RowMajor>::new(&buffer, 0, 3, 4, 3),
            Err(Error::InvalidLayout(_))
        ));
        // Column-major leading dimension counts rows
        assert!(StorageDescriptor::<Host, f64, ColumnMajor>::new(&buffer, 0, 3, 4, 3).is_ok());
    }

    #[test]
    fn test_region_must_fit_in_buffer() {
        let buffer = vec![0.0f32; 10];
        // 2 rows of 3 with stride 5 starting at 2: last element at 2 + 5 + 2
        assert!(StorageDescriptor::<Host, f32, RowMajor>::new(&buffer, 2, 2, 3, 5).is_ok());
        assert!(StorageDescriptor::<Host, f32, RowMajor>::new(&buffer, 3, 2, 3, 5).is_err());
        // Empty regions fit anywhere inside the buffer
        assert!(StorageDescriptor::<Host, f32, RowMajor>::new(&buffer, 10, 0, 3, 3).is_ok());
    }

    #[test]
    fn test_transposed_descriptor() {
        let buffer = vec![0i32; 6];
        let desc = StorageDescriptor::<Host, i32, RowMajor>::contiguous(&buffer, 2, 3).unwrap();
        let t = desc.transposed();
        assert_eq!((t.rows(), t.cols()), (3, 2));
        assert_eq!(t.leading_dimension(), 3);
        assert_eq!(<ColumnMajor as Orientation>::LAYOUT, Layout::ColumnMajor);
        // Same element seen from both sides
        assert_eq!(
            RowMajor::index(1, 2, desc.leading_dimension()),
            ColumnMajor::index(2, 1, t.leading_dimension())
        );
    }

    #[test]
    fn test_mutable_descriptor_reborrow() {
        let mut buffer = vec![1u32; 4];
        let mut desc =
            StorageDescriptorMut::<Host, u32, ColumnMajor>::new(&mut buffer, 0, 2, 2, 2).unwrap();
        desc.buffer_mut()[3] = 7;
        assert_eq!(desc.as_const().buffer()[3], 7);
        assert_eq!(desc.as_const().rows(), 2);
    }

    #[test]
    fn test_vector_descriptor() {
        let buffer = vec![0.0f64; 7];
        let v = VectorDescriptor::<Host, f64>::new(&buffer, 1, 3, 3).unwrap();
        assert_eq!((v.offset(), v.len(), v.stride()), (1, 3, 3));
        assert!(VectorDescriptor::<Host, f64>::new(&buffer, 2, 3, 3).is_err());
        assert!(VectorDescriptor::<Host, f64>::new(&buffer, 0, 2, 0).is_err());
        assert!(VectorDescriptor::<Host, f64>::new(&buffer, 0, 0, 1).unwrap().is_empty());
    }
}
