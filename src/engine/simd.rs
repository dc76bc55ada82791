//! Vectorized elementwise row addition for the vertical prefix pass
//!
//! The vertical accumulation adds each previous table row into the current
//! one; with the `simd` feature on x86_64 that add runs four lanes at a time
//! with a scalar loop for the remainder. Results are bit-identical to the
//! scalar path.

/// Add `src` into `dst` elementwise
pub fn add_rows(dst: &mut [u32], src: &[u32]) {
    debug_assert_eq!(dst.len(), src.len());

    #[cfg(all(target_arch = "x86_64", feature = "simd"))]
    {
        // SAFETY: SSE2 is part of the x86_64 baseline
        unsafe { sse2::add_rows(dst, src) };
    }

    #[cfg(not(all(target_arch = "x86_64", feature = "simd")))]
    add_rows_scalar(dst, src);
}

/// Scalar path; always available, used for remainders and non-x86 targets
pub fn add_rows_scalar(dst: &mut [u32], src: &[u32]) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d = d.wrapping_add(*s);
    }
}

#[cfg(all(target_arch = "x86_64", feature = "simd"))]
mod sse2 {
    use core::arch::x86_64::*;

    const LANES: usize = 4;

    /// Four 32-bit adds per iteration, scalar tail for the remainder
    #[target_feature(enable = "sse2")]
    pub unsafe fn add_rows(dst: &mut [u32], src: &[u32]) {
        let aligned = dst.len() - dst.len() % LANES;

        let mut i = 0;
        while i < aligned {
            let d = _mm_loadu_si128(dst.as_ptr().add(i) as *const __m128i);
            let s = _mm_loadu_si128(src.as_ptr().add(i) as *const __m128i);
            _mm_storeu_si128(dst.as_mut_ptr().add(i) as *mut __m128i, _mm_add_epi32(d, s));
            i += LANES;
        }

        for (d, s) in dst[aligned..].iter_mut().zip(&src[aligned..]) {
            *d = d.wrapping_add(*s);
        }
    }
}
