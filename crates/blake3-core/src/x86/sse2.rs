//! SSE2 kernels: row-layout single block, 4-way batch.
//!
//! SSE2 has no byte shuffle, so the 16-bit rotate swaps halfwords and the
//! others are shift pairs.

#[cfg(target_arch = "x86")]
use core::arch::x86::*;
#[cfg(target_arch = "x86_64")]
use core::arch::x86_64::*;

use super::{load_msg4 as load_msg, store_cvs4 as store_cvs};

pub(crate) const DEGREE: usize = 4;

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
  _mm_shufflehi_epi16(_mm_shufflelo_epi16(x, 0xB1), 0xB1)
}

#[inline(always)]
unsafe fn rot12(x: __m128i) -> __m128i {
  _mm_or_si128(_mm_srli_epi32(x, 12), _mm_slli_epi32(x, 20))
}

#[inline(always)]
unsafe fn rot8(x: __m128i) -> __m128i {
  _mm_or_si128(_mm_srli_epi32(x, 8), _mm_slli_epi32(x, 24))
}

#[inline(always)]
unsafe fn rot7(x: __m128i) -> __m128i {
  _mm_or_si128(_mm_srli_epi32(x, 7), _mm_slli_epi32(x, 25))
}

row_kernels!("sse2");
lane_kernels!(__m128i, "sse2");
