//! aarch64 NEON kernel: 4-way batch compression.
//!
//! NEON is only ever enabled at compile time (`target_feature = "neon"`);
//! there is no runtime probe on this architecture. Single-block operations on
//! aarch64 use the portable kernels.
//!
//! - `vrev32q_u16` for the 16-bit rotate (one instruction)
//! - `vsliq_n_u32` (shift-left-insert) for the 12/8/7-bit rotates
//! - `vtrnq_u32` + `vcombine_u32` for the 4x4 transposes

#![allow(unsafe_code)]
#![allow(unsafe_op_in_unsafe_fn)]
#![allow(clippy::indexing_slicing)]

use core::arch::aarch64::*;

use crate::{BLOCK_LEN, IV, IncrementCounter, MSG_SCHEDULE, OUT_LEN, portable};

pub(crate) const DEGREE: usize = 4;

// ─────────────────────────────────────────────────────────────────────────────
// Vector helpers
// ─────────────────────────────────────────────────────────────────────────────

#[inline(always)]
unsafe fn rot16(v: uint32x4_t) -> uint32x4_t {
  vreinterpretq_u32_u16(vrev32q_u16(vreinterpretq_u16_u32(v)))
}

#[inline(always)]
unsafe fn rot12(v: uint32x4_t) -> uint32x4_t {
  vsliq_n_u32(vshrq_n_u32(v, 12), v, 20)
}

#[inline(always)]
unsafe fn rot8(v: uint32x4_t) -> uint32x4_t {
  vsliq_n_u32(vshrq_n_u32(v, 8), v, 24)
}

#[inline(always)]
unsafe fn rot7(v: uint32x4_t) -> uint32x4_t {
  vsliq_n_u32(vshrq_n_u32(v, 7), v, 25)
}

#[inline(always)]
unsafe fn loadu(src: *const u8) -> uint32x4_t {
  vreinterpretq_u32_u8(vld1q_u8(src))
}

#[inline(always)]
unsafe fn storeu(src: uint32x4_t, dest: *mut u8) {
  vst1q_u8(dest, vreinterpretq_u8_u32(src));
}

/// 4x4 transpose of 32-bit words.
#[inline(always)]
unsafe fn transpose(vecs: &mut [uint32x4_t; 4]) {
  let rows01 = vtrnq_u32(vecs[0], vecs[1]);
  let rows23 = vtrnq_u32(vecs[2], vecs[3]);

  vecs[0] = vcombine_u32(vget_low_u32(rows01.0), vget_low_u32(rows23.0));
  vecs[1] = vcombine_u32(vget_low_u32(rows01.1), vget_low_u32(rows23.1));
  vecs[2] = vcombine_u32(vget_high_u32(rows01.0), vget_high_u32(rows23.0));
  vecs[3] = vcombine_u32(vget_high_u32(rows01.1), vget_high_u32(rows23.1));
}

#[inline(always)]
unsafe fn g(v: &mut [uint32x4_t; 16], a: usize, b: usize, c: usize, d: usize, mx: uint32x4_t, my: uint32x4_t) {
  v[a] = vaddq_u32(vaddq_u32(v[a], mx), v[b]);
  v[d] = rot16(veorq_u32(v[d], v[a]));
  v[c] = vaddq_u32(v[c], v[d]);
  v[b] = rot12(veorq_u32(v[b], v[c]));
  v[a] = vaddq_u32(vaddq_u32(v[a], my), v[b]);
  v[d] = rot8(veorq_u32(v[d], v[a]));
  v[c] = vaddq_u32(v[c], v[d]);
  v[b] = rot7(veorq_u32(v[b], v[c]));
}

#[inline(always)]
unsafe fn round(v: &mut [uint32x4_t; 16], m: &[uint32x4_t; 16], s: &[usize; 16]) {
  g(v, 0, 4, 8, 12, m[s[0]], m[s[1]]);
  g(v, 1, 5, 9, 13, m[s[2]], m[s[3]]);
  g(v, 2, 6, 10, 14, m[s[4]], m[s[5]]);
  g(v, 3, 7, 11, 15, m[s[6]], m[s[7]]);
  g(v, 0, 5, 10, 15, m[s[8]], m[s[9]]);
  g(v, 1, 6, 11, 12, m[s[10]], m[s[11]]);
  g(v, 2, 7, 8, 13, m[s[12]], m[s[13]]);
  g(v, 3, 4, 9, 14, m[s[14]], m[s[15]]);
}

/// Message words of block `block` for four inputs; `m[i]` holds word `i` of
/// every input.
#[inline(always)]
unsafe fn load_msg(inputs: &[&[u8]], block: usize) -> [uint32x4_t; 16] {
  let offset = block * BLOCK_LEN;
  let mut m = [vdupq_n_u32(0); 16];
  for (quarter, dst) in m.chunks_exact_mut(4).enumerate() {
    let at = offset + 16 * quarter;
    let mut vecs = [
      loadu(inputs[0].as_ptr().add(at)),
      loadu(inputs[1].as_ptr().add(at)),
      loadu(inputs[2].as_ptr().add(at)),
      loadu(inputs[3].as_ptr().add(at)),
    ];
    transpose(&mut vecs);
    dst.copy_from_slice(&vecs);
  }
  m
}

// ─────────────────────────────────────────────────────────────────────────────
// Kernels
// ─────────────────────────────────────────────────────────────────────────────

#[inline(always)]
unsafe fn hash4(
  inputs: &[&[u8]],
  blocks: usize,
  key: &[u32; 8],
  counter: u64,
  increment: IncrementCounter,
  flags: u8,
  flags_start: u8,
  flags_end: u8,
  out: &mut [[u8; OUT_LEN]],
) {
  debug_assert_eq!(inputs.len(), DEGREE);

  let mut h = [
    vdupq_n_u32(key[0]),
    vdupq_n_u32(key[1]),
    vdupq_n_u32(key[2]),
    vdupq_n_u32(key[3]),
    vdupq_n_u32(key[4]),
    vdupq_n_u32(key[5]),
    vdupq_n_u32(key[6]),
    vdupq_n_u32(key[7]),
  ];

  let counters: [u64; DEGREE] = core::array::from_fn(|lane| increment.counter_for(counter, lane));
  let counter_lo = vld1q_u32(counters.map(|c| c as u32).as_ptr());
  let counter_hi = vld1q_u32(counters.map(|c| (c >> 32) as u32).as_ptr());

  let mut block_flags = flags | flags_start;
  for block in 0..blocks {
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
      vdupq_n_u32(IV[0]),
      vdupq_n_u32(IV[1]),
      vdupq_n_u32(IV[2]),
      vdupq_n_u32(IV[3]),
      counter_lo,
      counter_hi,
      vdupq_n_u32(BLOCK_LEN as u32),
      vdupq_n_u32(u32::from(block_flags)),
    ];
    for s in &MSG_SCHEDULE {
      round(&mut v, &m, s);
    }
    for i in 0..8 {
      h[i] = veorq_u32(v[i], v[i + 8]);
    }

    block_flags = flags;
  }

  let mut lo = [h[0], h[1], h[2], h[3]];
  let mut hi = [h[4], h[5], h[6], h[7]];
  transpose(&mut lo);
  transpose(&mut hi);
  for (lane, dst) in out.iter_mut().take(DEGREE).enumerate() {
    storeu(lo[lane], dst.as_mut_ptr());
    storeu(hi[lane], dst.as_mut_ptr().add(16));
  }
}

/// Batch compression, four inputs per step; the tail goes through the portable
/// compressor.
///
/// # Safety
///
/// The build must enable NEON, and every input must hold at least
/// `blocks * BLOCK_LEN` bytes.
#[target_feature(enable = "neon")]
pub(crate) unsafe fn hash_many(
  inputs: &[&[u8]],
  blocks: usize,
  key: &[u32; 8],
  counter: u64,
  increment: IncrementCounter,
  flags: u8,
  flags_start: u8,
  flags_end: u8,
  out: &mut [[u8; OUT_LEN]],
) {
  debug_assert!(out.len() >= inputs.len());
  debug_assert!(inputs.iter().all(|input| input.len() >= blocks * BLOCK_LEN));

  let mut groups = inputs.chunks_exact(DEGREE);
  let mut done = 0;
  for (group, dst) in (&mut groups).zip(out.chunks_exact_mut(DEGREE)) {
    hash4(
      group,
      blocks,
      key,
      increment.counter_for(counter, done),
      increment,
      flags,
      flags_start,
      flags_end,
      dst,
    );
    done += DEGREE;
  }

  for (i, (input, dst)) in groups.remainder().iter().zip(&mut out[done..]).enumerate() {
    *dst = portable::hash_one_with(
      portable::compress_in_place,
      input,
      blocks,
      key,
      increment.counter_for(counter, done + i),
      flags,
      flags_start,
      flags_end,
    );
  }
}
