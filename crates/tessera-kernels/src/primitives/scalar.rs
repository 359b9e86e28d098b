//! Portable primitives for every element type

use super::DotPrimitives;
use tessera_core::Numeric;

/// Scalar primitives, no SIMD
#[derive(Clone, Copy, Debug, Default)]
pub struct ScalarPrimitives;

impl<T: Numeric> DotPrimitives<T> for ScalarPrimitives {
    fn backend_name(&self) -> &'static str {
        "scalar"
    }
}

pub(crate) fn dot_product_scalar<T: Numeric>(a: &[T], b: &[T]) -> T {
    a.iter()
        .zip(b.iter())
        .fold(T::zero(), |acc, (&x, &y)| acc + x * y)
}
