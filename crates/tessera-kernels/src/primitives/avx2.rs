//! AVX2 + FMA dot products for `f32` and `f64`
//!
//! Compiled only for x86_64 with the `avx2` feature. The CPU check happens
//! once in [`Avx2Primitives::detect`]; a handle created on a machine
//! without AVX2 runs the scalar loop instead.

use super::{scalar, DotPrimitives};
use tessera_core::Numeric;

/// AVX2 primitives
#[derive(Clone, Copy, Debug)]
pub struct Avx2Primitives {
    available: bool,
}

impl Avx2Primitives {
    /// Probe the CPU for AVX2 and FMA
    pub fn detect() -> Self {
        Self {
            available: Self::is_available(),
        }
    }

    pub fn is_available() -> bool {
        #[cfg(all(target_arch = "x86_64", feature = "avx2"))]
        {
            is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma")
        }
        #[cfg(not(all(target_arch = "x86_64", feature = "avx2")))]
        {
            false
        }
    }
}

/// Element types with an AVX2 dot product
pub trait Avx2Dot: Numeric {
    const LANES: usize;

    /// # Safety
    /// The CPU must support AVX2 and FMA.
    unsafe fn dot_avx2(a: &[Self], b: &[Self]) -> Self;
}

#[cfg(all(target_arch = "x86_64", feature = "avx2"))]
mod x86 {
    use std::arch::x86_64::*;

    #[target_feature(enable = "avx2", enable = "fma")]
    pub unsafe fn dot_f64(a: &[f64], b: &[f64]) -> f64 {
        let n = a.len().min(b.len());
        let chunks = n / 4;
        let mut acc = _mm256_setzero_pd();
        for i in 0..chunks {
            let va = _mm256_loadu_pd(a.as_ptr().add(i * 4));
            let vb = _mm256_loadu_pd(b.as_ptr().add(i * 4));
            acc = _mm256_fmadd_pd(va, vb, acc);
        }
        let lanes = std::mem::transmute::<__m256d, [f64; 4]>(acc);
        let mut sum = (lanes[0] + lanes[1]) + (lanes[2] + lanes[3]);
        for i in chunks * 4..n {
            sum += a[i] * b[i];
        }
        sum
    }

    #[target_feature(enable = "avx2", enable = "fma")]
    pub unsafe fn dot_f32(a: &[f32], b: &[f32]) -> f32 {
        let n = a.len().min(b.len());
        let chunks = n / 8;
        let mut acc = _mm256_setzero_ps();
        for i in 0..chunks {
            let va = _mm256_loadu_ps(a.as_ptr().add(i * 8));
            let vb = _mm256_loadu_ps(b.as_ptr().add(i * 8));
            acc = _mm256_fmadd_ps(va, vb, acc);
        }
        let lanes = std::mem::transmute::<__m256, [f32; 8]>(acc);
        let mut sum = lanes.iter().sum::<f32>();
        for i in chunks * 8..n {
            sum += a[i] * b[i];
        }
        sum
    }
}

impl Avx2Dot for f64 {
    const LANES: usize = 4;

    unsafe fn dot_avx2(a: &[f64], b: &[f64]) -> f64 {
        #[cfg(all(target_arch = "x86_64", feature = "avx2"))]
        {
            x86::dot_f64(a, b)
        }
        #[cfg(not(all(target_arch = "x86_64", feature = "avx2")))]
        {
            scalar::dot_product_scalar(a, b)
        }
    }
}

impl Avx2Dot for f32 {
    const LANES: usize = 8;

    unsafe fn dot_avx2(a: &[f32], b: &[f32]) -> f32 {
        #[cfg(all(target_arch = "x86_64", feature = "avx2"))]
        {
            x86::dot_f32(a, b)
        }
        #[cfg(not(all(target_arch = "x86_64", feature = "avx2")))]
        {
            scalar::dot_product_scalar(a, b)
        }
    }
}

impl<T: Avx2Dot> DotPrimitives<T> for Avx2Primitives {
    fn backend_name(&self) -> &'static str {
        if self.available {
            "avx2"
        } else {
            "avx2 (scalar fallback)"
        }
    }

    fn simd_width(&self) -> usize {
        if self.available {
            T::LANES
        } else {
            1
        }
    }

    fn dot_product(&self, a: &[T], b: &[T]) -> T {
        if self.available {
            // Safety: `available` is only set after detecting AVX2 and FMA
            unsafe { T::dot_avx2(a, b) }
        } else {
            scalar::dot_product_scalar(a, b)
        }
    }
}
