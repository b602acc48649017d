//! AVX2 kernels: 8-way batch only.
//!
//! A single block gains nothing from 256-bit registers, so this tier has no
//! row kernels; inputs left over after the last full batch go to the portable
//! compressor.

#[cfg(target_arch = "x86")]
use core::arch::x86::*;
#[cfg(target_arch = "x86_64")]
use core::arch::x86_64::*;

use crate::{BLOCK_LEN, OUT_LEN, portable};

pub(crate) const DEGREE: usize = 8;

#[inline(always)]
unsafe fn loadu(src: *const u8) -> __m256i {
  _mm256_loadu_si256(src.cast())
}

#[inline(always)]
unsafe fn storeu(src: __m256i, dest: *mut u8) {
  _mm256_storeu_si256(dest.cast(), src)
}

#[inline(always)]
unsafe fn add(a: __m256i, b: __m256i) -> __m256i {
  _mm256_add_epi32(a, b)
}

#[inline(always)]
unsafe fn xor(a: __m256i, b: __m256i) -> __m256i {
  _mm256_xor_si256(a, b)
}

#[inline(always)]
unsafe fn set1(x: u32) -> __m256i {
  _mm256_set1_epi32(x as i32)
}

#[inline(always)]
unsafe fn load_words(words: &[u32; DEGREE]) -> __m256i {
  _mm256_loadu_si256(words.as_ptr().cast())
}

#[inline(always)]
unsafe fn rot16(x: __m256i) -> __m256i {
  _mm256_or_si256(_mm256_srli_epi32(x, 16), _mm256_slli_epi32(x, 16))
}

#[inline(always)]
unsafe fn rot12(x: __m256i) -> __m256i {
  _mm256_or_si256(_mm256_srli_epi32(x, 12), _mm256_slli_epi32(x, 20))
}

#[inline(always)]
unsafe fn rot8(x: __m256i) -> __m256i {
  _mm256_or_si256(_mm256_srli_epi32(x, 8), _mm256_slli_epi32(x, 24))
}

#[inline(always)]
unsafe fn rot7(x: __m256i) -> __m256i {
  _mm256_or_si256(_mm256_srli_epi32(x, 7), _mm256_slli_epi32(x, 25))
}

#[inline(always)]
unsafe fn interleave128(a: __m256i, b: __m256i) -> (__m256i, __m256i) {
  (
    _mm256_permute2x128_si256(a, b, 0x20),
    _mm256_permute2x128_si256(a, b, 0x31),
  )
}

/// 8x8 transpose of 32-bit words.
#[inline(always)]
unsafe fn transpose8(vecs: &mut [__m256i; DEGREE]) {
  let ab_0145 = _mm256_unpacklo_epi32(vecs[0], vecs[1]);
  let ab_2367 = _mm256_unpackhi_epi32(vecs[0], vecs[1]);
  let cd_0145 = _mm256_unpacklo_epi32(vecs[2], vecs[3]);
  let cd_2367 = _mm256_unpackhi_epi32(vecs[2], vecs[3]);
  let ef_0145 = _mm256_unpacklo_epi32(vecs[4], vecs[5]);
  let ef_2367 = _mm256_unpackhi_epi32(vecs[4], vecs[5]);
  let gh_0145 = _mm256_unpacklo_epi32(vecs[6], vecs[7]);
  let gh_2367 = _mm256_unpackhi_epi32(vecs[6], vecs[7]);

  let abcd_04 = _mm256_unpacklo_epi64(ab_0145, cd_0145);
  let abcd_15 = _mm256_unpackhi_epi64(ab_0145, cd_0145);
  let abcd_26 = _mm256_unpacklo_epi64(ab_2367, cd_2367);
  let abcd_37 = _mm256_unpackhi_epi64(ab_2367, cd_2367);
  let efgh_04 = _mm256_unpacklo_epi64(ef_0145, gh_0145);
  let efgh_15 = _mm256_unpackhi_epi64(ef_0145, gh_0145);
  let efgh_26 = _mm256_unpacklo_epi64(ef_2367, gh_2367);
  let efgh_37 = _mm256_unpackhi_epi64(ef_2367, gh_2367);

  (vecs[0], vecs[4]) = interleave128(abcd_04, efgh_04);
  (vecs[1], vecs[5]) = interleave128(abcd_15, efgh_15);
  (vecs[2], vecs[6]) = interleave128(abcd_26, efgh_26);
  (vecs[3], vecs[7]) = interleave128(abcd_37, efgh_37);
}

/// Message words of block `block` for eight inputs, word-major.
#[inline(always)]
unsafe fn load_msg(inputs: &[&[u8]], block: usize) -> [__m256i; 16] {
  let offset = block * BLOCK_LEN;
  let mut m = [_mm256_setzero_si256(); 16];
  for (half, dst) in m.chunks_exact_mut(DEGREE).enumerate() {
    let at = offset + 32 * half;
    let mut vecs = [_mm256_setzero_si256(); DEGREE];
    for (vec, input) in vecs.iter_mut().zip(inputs) {
      *vec = loadu(input.as_ptr().add(at));
    }
    transpose8(&mut vecs);
    dst.copy_from_slice(&vecs);
  }
  m
}

/// The 8x8 transpose is its own inverse: word-major in, one chaining value per
/// vector out.
#[inline(always)]
unsafe fn store_cvs(mut h: [__m256i; 8], out: &mut [[u8; OUT_LEN]]) {
  transpose8(&mut h);
  for (cv, dst) in h.into_iter().zip(out.iter_mut()) {
    storeu(cv, dst.as_mut_ptr());
  }
}

#[inline(always)]
fn hash_one(
  input: &[u8],
  blocks: usize,
  key: &[u32; 8],
  counter: u64,
  flags: u8,
  flags_start: u8,
  flags_end: u8,
) -> [u8; OUT_LEN] {
  portable::hash_one_with(
    portable::compress_in_place,
    input,
    blocks,
    key,
    counter,
    flags,
    flags_start,
    flags_end,
  )
}

lane_kernels!(__m256i, "avx2");
