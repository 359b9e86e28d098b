//! Zero-size capability tags
//!
//! Storage category, orientation and triangle half are all resolved at
//! compile time through these marker types. Each tag family is sealed: the
//! variant set is closed and kernels can rely on exhaustive handling.
//!
//! The flag enums ([`Layout`], [`Transpose`], [`Triangle`]) are the flat
//! values handed to native routines; tags translate into them through
//! associated constants, never through runtime inspection.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

pub(crate) mod sealed {
    pub trait Sealed {}
}

/// Memory order of a dense matrix as reported to native routines
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layout {
    /// Consecutive elements of a row are adjacent
    RowMajor,
    /// Consecutive elements of a column are adjacent
    ColumnMajor,
}

/// Whether a native routine reads an operand as stored or transposed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Transpose {
    No,
    Yes,
}

/// Which half of a symmetric matrix a routine reads or writes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Triangle {
    Upper,
    Lower,
}

impl Triangle {
    /// Whether element `(row, col)` belongs to this half (diagonal included)
    #[inline]
    pub fn contains(self, row: usize, col: usize) -> bool {
        match self {
            Triangle::Upper => row <= col,
            Triangle::Lower => row >= col,
        }
    }
}

/// Structural category of an expression
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StorageKind {
    Dense,
    Sparse,
}

/// Dense/sparse storage tag
pub trait StorageCategory: sealed::Sealed + Copy + Default + Debug + Send + Sync + 'static {
    const KIND: StorageKind;
}

/// Every element is addressable at `offset + index`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Dense;

/// Only non-zero elements are stored, with explicit indices
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Sparse;

impl sealed::Sealed for Dense {}
impl sealed::Sealed for Sparse {}

impl StorageCategory for Dense {
    const KIND: StorageKind = StorageKind::Dense;
}

impl StorageCategory for Sparse {
    const KIND: StorageKind = StorageKind::Sparse;
}

/// Row-major / column-major orientation tag
///
/// The leading dimension of a region is the stride between consecutive
/// major lines: rows for [`RowMajor`], columns for [`ColumnMajor`].
pub trait Orientation: sealed::Sealed + Copy + Default + Debug + Send + Sync + 'static {
    /// Flag reported to native routines
    const LAYOUT: Layout;

    /// The orientation obtained by swapping rows and columns
    type Transposed: Orientation<Transposed = Self>;

    /// Number of major lines in a `rows x cols` matrix
    fn major_len(rows: usize, cols: usize) -> usize;

    /// Number of elements in each major line of a `rows x cols` matrix
    fn minor_len(rows: usize, cols: usize) -> usize;

    /// Element position of `(row, col)` relative to the region offset
    fn index(row: usize, col: usize, leading_dimension: usize) -> usize;

    /// Smallest leading dimension that keeps major lines disjoint
    ///
    /// Never below 1, even for empty matrices; native routines reject 0.
    #[inline]
    fn min_leading_dimension(rows: usize, cols: usize) -> usize {
        Self::minor_len(rows, cols).max(1)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RowMajor;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ColumnMajor;

impl sealed::Sealed for RowMajor {}
impl sealed::Sealed for ColumnMajor {}

impl Orientation for RowMajor {
    const LAYOUT: Layout = Layout::RowMajor;
    type Transposed = ColumnMajor;

    #[inline]
    fn major_len(rows: usize, _cols: usize) -> usize {
        rows
    }

    #[inline]
    fn minor_len(_rows: usize, cols: usize) -> usize {
        cols
    }

    #[inline]
    fn index(row: usize, col: usize, leading_dimension: usize) -> usize {
        row * leading_dimension + col
    }
}

impl Orientation for ColumnMajor {
    const LAYOUT: Layout = Layout::ColumnMajor;
    type Transposed = RowMajor;

    #[inline]
    fn major_len(_rows: usize, cols: usize) -> usize {
        cols
    }

    #[inline]
    fn minor_len(rows: usize, _cols: usize) -> usize {
        rows
    }

    #[inline]
    fn index(row: usize, col: usize, leading_dimension: usize) -> usize {
        col * leading_dimension + row
    }
}

/// Transpose flag for an operand of orientation `A` consumed by a routine
/// that reports the layout of `C`
///
/// Differing orientations are the same data read transposed.
pub const fn transpose_between<A: Orientation, C: Orientation>() -> Transpose {
    match (A::LAYOUT, C::LAYOUT) {
        (Layout::RowMajor, Layout::RowMajor) | (Layout::ColumnMajor, Layout::ColumnMajor) => {
            Transpose::No
        }
        _ => Transpose::Yes,
    }
}

/// Compile-time selection of a symmetric half
pub trait TriangleTag: sealed::Sealed + Copy + Default + Debug + Send + Sync + 'static {
    const TRIANGLE: Triangle;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Upper;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Lower;

impl sealed::Sealed for Upper {}
impl sealed::Sealed for Lower {}

impl TriangleTag for Upper {
    const TRIANGLE: Triangle = Triangle::Upper;
}

impl TriangleTag for Lower {
    const TRIANGLE: Triangle = Triangle::Lower;
}
