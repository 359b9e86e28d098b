//! Host compute primitives
//!
//! The reference routines spend nearly all their time in dot products of
//! contiguous rows, so that is the one operation specialized per
//! instruction set. Selection happens at compile time through
//! [`SelectPrimitives`]; the only runtime check is CPU feature detection
//! when an AVX2 build runs on a machine without it.

mod avx2;
mod scalar;

pub use avx2::Avx2Primitives;
pub use scalar::ScalarPrimitives;

use std::fmt::Debug;
use tessera_core::Numeric;

/// Dot-product primitives for one element type
pub trait DotPrimitives<T: Numeric>: Clone + Copy + Debug + Send + Sync {
    /// Name used in log output
    fn backend_name(&self) -> &'static str;

    /// Number of elements processed per instruction
    fn simd_width(&self) -> usize {
        1
    }

    /// `sum(a[i] * b[i])` over the common length, starting from zero
    fn dot_product(&self, a: &[T], b: &[T]) -> T {
        scalar::dot_product_scalar(a, b)
    }

    /// Dot product of `n` elements read with the given offsets and strides
    ///
    /// Callers guarantee that every accessed index is in bounds.
    #[allow(clippy::too_many_arguments)]
    fn dot_strided(
        &self,
        n: usize,
        x: &[T],
        x_offset: usize,
        incx: usize,
        y: &[T],
        y_offset: usize,
        incy: usize,
    ) -> T {
        if n == 0 {
            return T::zero();
        }
        if incx == 1 && incy == 1 {
            return self.dot_product(&x[x_offset..x_offset + n], &y[y_offset..y_offset + n]);
        }
        (0..n).fold(T::zero(), |acc, i| {
            acc + x[x_offset + i * incx] * y[y_offset + i * incy]
        })
    }
}

/// Compile-time choice of primitives per element type
pub trait SelectPrimitives: Numeric {
    type Primitives: DotPrimitives<Self>;

    fn primitives() -> Self::Primitives;
}

macro_rules! select_scalar {
    ($($ty:ty),*) => {
        $(
            impl SelectPrimitives for $ty {
                type Primitives = ScalarPrimitives;

                fn primitives() -> ScalarPrimitives {
                    ScalarPrimitives
                }
            }
        )*
    };
}

select_scalar!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

macro_rules! select_float {
    ($($ty:ty),*) => {
        $(
            impl SelectPrimitives for $ty {
                #[cfg(all(target_arch = "x86_64", feature = "avx2"))]
                type Primitives = Avx2Primitives;

                #[cfg(not(all(target_arch = "x86_64", feature = "avx2")))]
                type Primitives = ScalarPrimitives;

                fn primitives() -> Self::Primitives {
                    #[cfg(all(target_arch = "x86_64", feature = "avx2"))]
                    {
                        Avx2Primitives::detect()
                    }
                    #[cfg(not(all(target_arch = "x86_64", feature = "avx2")))]
                    {
                        ScalarPrimitives
                    }
                }
            }
        )*
    };
}

select_float!(f32, f64);

/// Name of the primitives selected for `T`
pub fn primitives_name<T: SelectPrimitives>() -> &'static str {
    T::primitives().backend_name()
}
