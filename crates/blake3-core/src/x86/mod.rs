//! x86 and x86_64 kernels.
//!
//! | Module | Target features | Single block | `hash_many` lanes |
//! |--------|-----------------|--------------|-------------------|
//! | [`sse2`] | sse2 | rows, shift rotates | 4 |
//! | [`sse41`] | sse4.1 | rows, `pshufb` rotates | 4 |
//! | [`avx2`] | avx2 | - | 8 |
//! | [`avx512`] | avx512f, avx512vl | rows, `vprord` | 16 |
//!
//! Two layouts are used:
//!
//! - **Rows**: one block, the 4x4 state held as four 128-bit row vectors.
//!   Diagonal steps rotate rows 1-3 with lane shuffles and rotate them back.
//! - **Lanes**: one vector per state word, one input per lane. Message words
//!   are transposed on load and chaining values transposed back on store.
//!
//! # Safety
//!
//! Every `pub(crate)` function here is `unsafe` and compiled with its tier's
//! target features. Callers must have confirmed those features through
//! [`platform::caps()`].

#![allow(unsafe_code)]
#![allow(unsafe_op_in_unsafe_fn)]
#![allow(clippy::indexing_slicing)]
#![allow(clippy::many_single_char_names)]

#[cfg(target_arch = "x86")]
use core::arch::x86::*;
#[cfg(target_arch = "x86_64")]
use core::arch::x86_64::*;

/// Row-layout single-block kernels over `__m128i`.
///
/// Expands to `compress_in_place`, `compress_xof` and `hash_one`, built on the
/// invoking module's `add`, `xor`, `rot16`, `rot12`, `rot8` and `rot7`.
macro_rules! row_kernels {
  ($features:literal) => {
    #[inline(always)]
    unsafe fn set4(a: u32, b: u32, c: u32, d: u32) -> __m128i {
      _mm_setr_epi32(a as i32, b as i32, c as i32, d as i32)
    }

    #[inline(always)]
    unsafe fn g(rows: &mut [__m128i; 4], mx: __m128i, my: __m128i) {
      let [a, b, c, d] = rows;
      *a = add(add(*a, mx), *b);
      *d = rot16(xor(*d, *a));
      *c = add(*c, *d);
      *b = rot12(xor(*b, *c));
      *a = add(add(*a, my), *b);
      *d = rot8(xor(*d, *a));
      *c = add(*c, *d);
      *b = rot7(xor(*b, *c));
    }

    // Rows 1, 2, 3 rotate left by 1, 2, 3 lanes so each diagonal becomes a column.
    #[inline(always)]
    unsafe fn diagonalize(rows: &mut [__m128i; 4]) {
      rows[1] = _mm_shuffle_epi32(rows[1], 0b00_11_10_01);
      rows[2] = _mm_shuffle_epi32(rows[2], 0b01_00_11_10);
      rows[3] = _mm_shuffle_epi32(rows[3], 0b10_01_00_11);
    }

    #[inline(always)]
    unsafe fn undiagonalize(rows: &mut [__m128i; 4]) {
      rows[1] = _mm_shuffle_epi32(rows[1], 0b10_01_00_11);
      rows[2] = _mm_shuffle_epi32(rows[2], 0b01_00_11_10);
      rows[3] = _mm_shuffle_epi32(rows[3], 0b00_11_10_01);
    }

    /// The 16 output words as four rows: `[cv_lo, cv_hi, xof_lo, xof_hi]`.
    #[inline(always)]
    unsafe fn compress_rows(
      cv: &[u32; 8],
      block: &[u8; $crate::BLOCK_LEN],
      block_len: u8,
      counter: u64,
      flags: u8,
    ) -> [__m128i; 4] {
      let m = $crate::portable::block_words(block);
      let iv = &$crate::IV;
      let cv_lo = set4(cv[0], cv[1], cv[2], cv[3]);
      let cv_hi = set4(cv[4], cv[5], cv[6], cv[7]);
      let mut rows = [
        cv_lo,
        cv_hi,
        set4(iv[0], iv[1], iv[2], iv[3]),
        set4(
          $crate::x86::counter_low(counter),
          $crate::x86::counter_high(counter),
          u32::from(block_len),
          u32::from(flags),
        ),
      ];

      for s in &$crate::MSG_SCHEDULE {
        g(
          &mut rows,
          set4(m[s[0]], m[s[2]], m[s[4]], m[s[6]]),
          set4(m[s[1]], m[s[3]], m[s[5]], m[s[7]]),
        );
        diagonalize(&mut rows);
        g(
          &mut rows,
          set4(m[s[8]], m[s[10]], m[s[12]], m[s[14]]),
          set4(m[s[9]], m[s[11]], m[s[13]], m[s[15]]),
        );
        undiagonalize(&mut rows);
      }

      let [r0, r1, r2, r3] = rows;
      [xor(r0, r2), xor(r1, r3), xor(r2, cv_lo), xor(r3, cv_hi)]
    }

    /// # Safety
    ///
    /// The CPU must support this tier's target features.
    #[target_feature(enable = $features)]
    pub(crate) unsafe fn compress_in_place(
      cv: &mut [u32; 8],
      block: &[u8; $crate::BLOCK_LEN],
      block_len: u8,
      counter: u64,
      flags: u8,
    ) {
      let [lo, hi, _, _] = compress_rows(cv, block, block_len, counter, flags);
      let (dst_lo, dst_hi) = cv.split_at_mut(4);
      _mm_storeu_si128(dst_lo.as_mut_ptr().cast(), lo);
      _mm_storeu_si128(dst_hi.as_mut_ptr().cast(), hi);
    }

    /// # Safety
    ///
    /// The CPU must support this tier's target features.
    #[target_feature(enable = $features)]
    pub(crate) unsafe fn compress_xof(
      cv: &[u32; 8],
      block: &[u8; $crate::BLOCK_LEN],
      block_len: u8,
      counter: u64,
      flags: u8,
    ) -> [u8; 2 * $crate::OUT_LEN] {
      let rows = compress_rows(cv, block, block_len, counter, flags);
      let mut out = [0u8; 2 * $crate::OUT_LEN];
      let (quarters, _) = out.as_chunks_mut::<16>();
      for (dst, row) in quarters.iter_mut().zip(rows) {
        _mm_storeu_si128(dst.as_mut_ptr().cast(), row);
      }
      out
    }

    /// One input of a batch, chained through the row kernel.
    #[inline(always)]
    pub(super) unsafe fn hash_one(
      input: &[u8],
      blocks: usize,
      key: &[u32; 8],
      counter: u64,
      flags: u8,
      flags_start: u8,
      flags_end: u8,
    ) -> [u8; $crate::OUT_LEN] {
      $crate::portable::hash_one_with(
        // SAFETY: reached only from kernels whose callers confirmed this tier.
        |cv, block, len, ctr, f| unsafe { compress_in_place(cv, block, len, ctr, f) },
        input,
        blocks,
        key,
        counter,
        flags,
        flags_start,
        flags_end,
      )
    }
  };
}

/// Lane-layout batch kernel over the vector type `$v`.
///
/// Needs from the invoking module: `DEGREE`, `add`, `xor`, `set1`, the four
/// rotations, `load_words` (one `[u32; DEGREE]` into a vector), `load_msg`
/// (transpose block `i` of every input) and `store_cvs` (transpose back).
/// A single `hash_one` handles inputs left over after the last full batch.
macro_rules! lane_kernels {
  ($v:ty, $features:literal) => {
    #[inline(always)]
    unsafe fn g_lanes(v: &mut [$v; 16], a: usize, b: usize, c: usize, d: usize, mx: $v, my: $v) {
      v[a] = add(add(v[a], mx), v[b]);
      v[d] = rot16(xor(v[d], v[a]));
      v[c] = add(v[c], v[d]);
      v[b] = rot12(xor(v[b], v[c]));
      v[a] = add(add(v[a], my), v[b]);
      v[d] = rot8(xor(v[d], v[a]));
      v[c] = add(v[c], v[d]);
      v[b] = rot7(xor(v[b], v[c]));
    }

    #[inline(always)]
    unsafe fn round_lanes(v: &mut [$v; 16], m: &[$v; 16], s: &[usize; 16]) {
      g_lanes(v, 0, 4, 8, 12, m[s[0]], m[s[1]]);
      g_lanes(v, 1, 5, 9, 13, m[s[2]], m[s[3]]);
      g_lanes(v, 2, 6, 10, 14, m[s[4]], m[s[5]]);
      g_lanes(v, 3, 7, 11, 15, m[s[6]], m[s[7]]);
      g_lanes(v, 0, 5, 10, 15, m[s[8]], m[s[9]]);
      g_lanes(v, 1, 6, 11, 12, m[s[10]], m[s[11]]);
      g_lanes(v, 2, 7, 8, 13, m[s[12]], m[s[13]]);
      g_lanes(v, 3, 4, 9, 14, m[s[14]], m[s[15]]);
    }

    #[inline(always)]
    unsafe fn load_counters(counter: u64, increment: $crate::IncrementCounter) -> ($v, $v) {
      let counters: [u64; DEGREE] = core::array::from_fn(|lane| increment.counter_for(counter, lane));
      let lo = counters.map($crate::x86::counter_low);
      let hi = counters.map($crate::x86::counter_high);
      (load_words(&lo), load_words(&hi))
    }

    /// Hash exactly `DEGREE` inputs, one per lane.
    #[inline(always)]
    unsafe fn hash_lanes(
      inputs: &[&[u8]],
      blocks: usize,
      key: &[u32; 8],
      counter: u64,
      increment: $crate::IncrementCounter,
      flags: u8,
      flags_start: u8,
      flags_end: u8,
      out: &mut [[u8; $crate::OUT_LEN]],
    ) {
      debug_assert_eq!(inputs.len(), DEGREE);
      let iv = &$crate::IV;
      let mut h = [
        set1(key[0]),
        set1(key[1]),
        set1(key[2]),
        set1(key[3]),
        set1(key[4]),
        set1(key[5]),
        set1(key[6]),
        set1(key[7]),
      ];
      let (counter_lo, counter_hi) = load_counters(counter, increment);
      let block_len = set1($crate::BLOCK_LEN as u32);

      for block in 0..blocks {
        let mut block_flags = flags;
        if block == 0 {
          block_flags |= flags_start;
        }
        if block + 1 == blocks {
          block_flags |= flags_end;
        }

        let m = load_msg(inputs, block);
        let mut v = [
          h[0],
          h[1],
          h[2],
          h[3],
          h[4],
          h[5],
          h[6],
          h[7],
          set1(iv[0]),
          set1(iv[1]),
          set1(iv[2]),
          set1(iv[3]),
          counter_lo,
          counter_hi,
          block_len,
          set1(u32::from(block_flags)),
        ];
        for s in &$crate::MSG_SCHEDULE {
          round_lanes(&mut v, &m, s);
        }
        for i in 0..8 {
          h[i] = xor(v[i], v[i + 8]);
        }
      }

      store_cvs(h, out);
    }

    /// # Safety
    ///
    /// The CPU must support this tier's target features, and every input must
    /// hold at least `blocks * BLOCK_LEN` bytes.
    #[target_feature(enable = $features)]
    pub(crate) unsafe fn hash_many(
      inputs: &[&[u8]],
      blocks: usize,
      key: &[u32; 8],
      counter: u64,
      increment: $crate::IncrementCounter,
      flags: u8,
      flags_start: u8,
      flags_end: u8,
      out: &mut [[u8; $crate::OUT_LEN]],
    ) {
      debug_assert!(out.len() >= inputs.len());
      debug_assert!(inputs.iter().all(|input| input.len() >= blocks * $crate::BLOCK_LEN));

      let mut groups = inputs.chunks_exact(DEGREE);
      let mut done = 0;
      for (group, dst) in (&mut groups).zip(out.chunks_exact_mut(DEGREE)) {
        let group_counter = increment.counter_for(counter, done);
        hash_lanes(group, blocks, key, group_counter, increment, flags, flags_start, flags_end, dst);
        done += DEGREE;
      }

      for (i, (input, dst)) in groups.remainder().iter().zip(&mut out[done..]).enumerate() {
        let input_counter = increment.counter_for(counter, done + i);
        *dst = hash_one(input, blocks, key, input_counter, flags, flags_start, flags_end);
      }
    }
  };
}

pub(crate) mod avx2;
pub(crate) mod avx512;
pub(crate) mod sse2;
pub(crate) mod sse41;

#[inline(always)]
const fn counter_low(counter: u64) -> u32 {
  counter as u32
}

#[inline(always)]
const fn counter_high(counter: u64) -> u32 {
  (counter >> 32) as u32
}

#[inline(always)]
unsafe fn loadu128(src: *const u8) -> __m128i {
  _mm_loadu_si128(src.cast())
}

#[inline(always)]
unsafe fn storeu128(src: __m128i, dest: *mut u8) {
  _mm_storeu_si128(dest.cast(), src)
}

/// 4x4 transpose of 32-bit words.
#[inline(always)]
unsafe fn transpose4(vecs: &mut [__m128i; 4]) {
  let ab_01 = _mm_unpacklo_epi32(vecs[0], vecs[1]);
  let ab_23 = _mm_unpackhi_epi32(vecs[0], vecs[1]);
  let cd_01 = _mm_unpacklo_epi32(vecs[2], vecs[3]);
  let cd_23 = _mm_unpackhi_epi32(vecs[2], vecs[3]);

  vecs[0] = _mm_unpacklo_epi64(ab_01, cd_01);
  vecs[1] = _mm_unpackhi_epi64(ab_01, cd_01);
  vecs[2] = _mm_unpacklo_epi64(ab_23, cd_23);
  vecs[3] = _mm_unpackhi_epi64(ab_23, cd_23);
}

/// Message words of block `block` for four inputs, word-major.
#[inline(always)]
unsafe fn load_msg4(inputs: &[&[u8]], block: usize) -> [__m128i; 16] {
  let offset = block * crate::BLOCK_LEN;
  let mut m = [_mm_setzero_si128(); 16];
  for (quarter, dst) in m.chunks_exact_mut(4).enumerate() {
    let at = offset + 16 * quarter;
    let mut vecs = [
      loadu128(inputs[0].as_ptr().add(at)),
      loadu128(inputs[1].as_ptr().add(at)),
      loadu128(inputs[2].as_ptr().add(at)),
      loadu128(inputs[3].as_ptr().add(at)),
    ];
    transpose4(&mut vecs);
    dst.copy_from_slice(&vecs);
  }
  m
}

/// Transpose eight word-major vectors back into four 32-byte chaining values.
#[inline(always)]
unsafe fn store_cvs4(h: [__m128i; 8], out: &mut [[u8; crate::OUT_LEN]]) {
  let mut lo = [h[0], h[1], h[2], h[3]];
  let mut hi = [h[4], h[5], h[6], h[7]];
  transpose4(&mut lo);
  transpose4(&mut hi);
  for (lane, dst) in out.iter_mut().take(4).enumerate() {
    storeu128(lo[lane], dst.as_mut_ptr());
    storeu128(hi[lane], dst.as_mut_ptr().add(16));
  }
}
