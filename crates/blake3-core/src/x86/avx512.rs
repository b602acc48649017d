//! AVX-512 kernels: row-layout single block on the VL forms, 16-way batch and
//! 16-way extended output on full `zmm` registers.
//!
//! All rotates are native (`vprord`). Leftover inputs and output blocks after
//! the last full batch use this tier's own row kernels.

#[cfg(target_arch = "x86")]
use core::arch::x86::*;
#[cfg(target_arch = "x86_64")]
use core::arch::x86_64::*;

pub(crate) use self::rows::{compress_in_place, compress_xof};
use self::rows::hash_one;
use crate::{BLOCK_LEN, OUT_LEN, portable};

pub(crate) const DEGREE: usize = 16;

/// 128-bit row kernels using the EVEX-encoded VL rotates.
mod rows {
  #[cfg(target_arch = "x86")]
  use core::arch::x86::*;
  #[cfg(target_arch = "x86_64")]
  use core::arch::x86_64::*;

  #[inline(always)]
  unsafe fn add(a: __m128i, b: __m128i) -> __m128i {
    _mm_add_epi32(a, b)
  }

  #[inline(always)]
  unsafe fn xor(a: __m128i, b: __m128i) -> __m128i {
    _mm_xor_si128(a, b)
  }

  #[inline(always)]
  unsafe fn rot16(x: __m128i) -> __m128i {
    _mm_ror_epi32(x, 16)
  }

  #[inline(always)]
  unsafe fn rot12(x: __m128i) -> __m128i {
    _mm_ror_epi32(x, 12)
  }

  #[inline(always)]
  unsafe fn rot8(x: __m128i) -> __m128i {
    _mm_ror_epi32(x, 8)
  }

  #[inline(always)]
  unsafe fn rot7(x: __m128i) -> __m128i {
    _mm_ror_epi32(x, 7)
  }

  row_kernels!("avx512f,avx512vl");
}

#[inline(always)]
unsafe fn add(a: __m512i, b: __m512i) -> __m512i {
  _mm512_add_epi32(a, b)
}

#[inline(always)]
unsafe fn xor(a: __m512i, b: __m512i) -> __m512i {
  _mm512_xor_si512(a, b)
}

#[inline(always)]
unsafe fn set1(x: u32) -> __m512i {
  _mm512_set1_epi32(x as i32)
}

#[inline(always)]
unsafe fn load_words(words: &[u32; DEGREE]) -> __m512i {
  _mm512_loadu_si512(words.as_ptr().cast())
}

#[inline(always)]
unsafe fn store_words(v: __m512i) -> [u32; DEGREE] {
  let mut words = [0u32; DEGREE];
  _mm512_storeu_si512(words.as_mut_ptr().cast(), v);
  words
}

#[inline(always)]
unsafe fn rot16(x: __m512i) -> __m512i {
  _mm512_ror_epi32(x, 16)
}

#[inline(always)]
unsafe fn rot12(x: __m512i) -> __m512i {
  _mm512_ror_epi32(x, 12)
}

#[inline(always)]
unsafe fn rot8(x: __m512i) -> __m512i {
  _mm512_ror_epi32(x, 8)
}

#[inline(always)]
unsafe fn rot7(x: __m512i) -> __m512i {
  _mm512_ror_epi32(x, 7)
}

/// Message words of block `block` for sixteen inputs, word-major.
///
/// Gathered through a scalar 16x16 transpose in stack memory.
#[inline(always)]
unsafe fn load_msg(inputs: &[&[u8]], block: usize) -> [__m512i; 16] {
  let lanes: [[u32; 16]; DEGREE] = core::array::from_fn(|lane| {
    let (blocks, _) = inputs[lane].as_chunks::<BLOCK_LEN>();
    portable::block_words(&blocks[block])
  });
  let mut m = [_mm512_setzero_si512(); 16];
  for (word, dst) in m.iter_mut().enumerate() {
    let column: [u32; DEGREE] = core::array::from_fn(|lane| lanes[lane][word]);
    *dst = load_words(&column);
  }
  m
}

#[inline(always)]
unsafe fn store_cvs(h: [__m512i; 8], out: &mut [[u8; OUT_LEN]]) {
  let mut words = [[0u32; DEGREE]; 8];
  for (column, v) in words.iter_mut().zip(h) {
    *column = store_words(v);
  }
  for (lane, dst) in out.iter_mut().take(DEGREE).enumerate() {
    let cv: [u32; 8] = core::array::from_fn(|i| words[i][lane]);
    *dst = portable::cv_bytes(&cv);
  }
}

lane_kernels!(__m512i, "avx512f,avx512vl");

/// Sixteen extended-output blocks of one `(cv, block)` at `counter..counter + 16`.
#[cfg(not(windows))]
#[inline(always)]
unsafe fn xof_lanes(
  cv: &[u32; 8],
  block: &[u8; BLOCK_LEN],
  block_len: u8,
  counter: u64,
  flags: u8,
  out: &mut [[u8; 2 * OUT_LEN]],
) {
  let iv = &crate::IV;
  let mut m = [_mm512_setzero_si512(); 16];
  for (dst, word) in m.iter_mut().zip(portable::block_words(block)) {
    *dst = set1(word);
  }
  let mut cv_vecs = [_mm512_setzero_si512(); 8];
  for (dst, &word) in cv_vecs.iter_mut().zip(cv) {
    *dst = set1(word);
  }
  let (counter_lo, counter_hi) = load_counters(counter, crate::IncrementCounter::Yes);

  let mut v = [
    cv_vecs[0],
    cv_vecs[1],
    cv_vecs[2],
    cv_vecs[3],
    cv_vecs[4],
    cv_vecs[5],
    cv_vecs[6],
    cv_vecs[7],
    set1(iv[0]),
    set1(iv[1]),
    set1(iv[2]),
    set1(iv[3]),
    counter_lo,
    counter_hi,
    set1(u32::from(block_len)),
    set1(u32::from(flags)),
  ];
  for s in &crate::MSG_SCHEDULE {
    round_lanes(&mut v, &m, s);
  }

  let mut words = [[0u32; DEGREE]; 16];
  for i in 0..8 {
    words[i] = store_words(xor(v[i], v[i + 8]));
    words[i + 8] = store_words(xor(v[i + 8], cv_vecs[i]));
  }

  for (lane, dst) in out.iter_mut().take(DEGREE).enumerate() {
    let (quads, _) = dst.as_chunks_mut::<4>();
    for (quad, column) in quads.iter_mut().zip(&words) {
      *quad = column[lane].to_le_bytes();
    }
  }
}

/// Extended output for `out.len()` consecutive counters.
///
/// # Safety
///
/// The CPU must support AVX-512F and AVX-512VL.
#[cfg(not(windows))]
#[target_feature(enable = "avx512f,avx512vl")]
pub(crate) unsafe fn xof_many(
  cv: &[u32; 8],
  block: &[u8; BLOCK_LEN],
  block_len: u8,
  counter: u64,
  flags: u8,
  out: &mut [[u8; 2 * OUT_LEN]],
) {
  let mut groups = out.chunks_exact_mut(DEGREE);
  let mut done = 0usize;
  for group in &mut groups {
    xof_lanes(cv, block, block_len, counter.wrapping_add(done as u64), flags, group);
    done += DEGREE;
  }
  for (i, dst) in groups.into_remainder().iter_mut().enumerate() {
    *dst = compress_xof(cv, block, block_len, counter.wrapping_add((done + i) as u64), flags);
  }
}
