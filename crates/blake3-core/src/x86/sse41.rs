//! SSE4.1 kernels: row-layout single block, 4-way batch.
//!
//! Same shape as the SSE2 tier; the 16- and 8-bit rotates become one `pshufb`
//! each.

#[cfg(target_arch = "x86")]
use core::arch::x86::*;
#[cfg(target_arch = "x86_64")]
use core::arch::x86_64::*;

use super::{load_msg4 as load_msg, store_cvs4 as store_cvs};

pub(crate) const DEGREE: usize = 4;

/// `pshufb` control rotating each 32-bit lane right by 16.
const ROT16_SHUFFLE: [u8; 16] = [2, 3, 0, 1, 6, 7, 4, 5, 10, 11, 8, 9, 14, 15, 12, 13];
/// `pshufb` control rotating each 32-bit lane right by 8.
const ROT8_SHUFFLE: [u8; 16] = [1, 2, 3, 0, 5, 6, 7, 4, 9, 10, 11, 8, 13, 14, 15, 12];

#[inline(always)]
unsafe fn add(a: __m128i, b: __m128i) -> __m128i {
  _mm_add_epi32(a, b)
}

#[inline(always)]
unsafe fn xor(a: __m128i, b: __m128i) -> __m128i {
  _mm_xor_si128(a, b)
}

#[inline(always)]
unsafe fn set1(x: u32) -> __m128i {
  _mm_set1_epi32(x as i32)
}

#[inline(always)]
unsafe fn load_words(words: &[u32; DEGREE]) -> __m128i {
  _mm_loadu_si128(words.as_ptr().cast())
}

#[inline(always)]
unsafe fn rot16(x: __m128i) -> __m128i {
  _mm_shuffle_epi8(x, _mm_loadu_si128(ROT16_SHUFFLE.as_ptr().cast()))
}

#[inline(always)]
unsafe fn rot12(x: __m128i) -> __m128i {
  _mm_or_si128(_mm_srli_epi32(x, 12), _mm_slli_epi32(x, 20))
}

#[inline(always)]
unsafe fn rot8(x: __m128i) -> __m128i {
  _mm_shuffle_epi8(x, _mm_loadu_si128(ROT8_SHUFFLE.as_ptr().cast()))
}

#[inline(always)]
unsafe fn rot7(x: __m128i) -> __m128i {
  _mm_or_si128(_mm_srli_epi32(x, 7), _mm_slli_epi32(x, 25))
}

row_kernels!("sse2,ssse3,sse4.1");
lane_kernels!(__m128i, "sse2,ssse3,sse4.1");
