//! Element types accepted by containers and kernels
//!
//! `Numeric` is the "elementary arithmetic type" predicate: a scalar that can
//! live in a backend buffer, be copied bytewise and take part in sums and
//! products. Anything else is an opaque value type.

use bytemuck::Pod;
use num_traits::{Num, NumAssign};
use std::fmt::Debug;

/// Base trait for element types stored in dense and sparse containers
pub trait Numeric:
    Pod + Num + NumAssign + Copy + PartialOrd + Debug + Default + Send + Sync + 'static
{
    /// Short type name used in log output
    const NAME: &'static str;

    /// Convert to f64 for tolerance checks and diagnostics
    fn to_f64(self) -> f64;
}

macro_rules! impl_numeric {
    ($($ty:ty),*) => {
        $(
            impl Numeric for $ty {
                const NAME: &'static str = stringify!($ty);

                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }
            }
        )*
    };
}

impl_numeric!(f32, f64, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
