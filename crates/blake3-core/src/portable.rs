//! Scalar kernels. Always available; the reference every vector tier must match.

#![allow(clippy::indexing_slicing)] // Fixed-size state arrays indexed by constants.

use crate::{BLOCK_LEN, IV, IncrementCounter, OUT_LEN};

/// Little-endian message words of one block.
#[inline(always)]
pub(crate) fn block_words(block: &[u8; BLOCK_LEN]) -> [u32; 16] {
  let mut words = [0u32; 16];
  let (quads, _) = block.as_chunks::<4>();
  for (word, quad) in words.iter_mut().zip(quads) {
    *word = u32::from_le_bytes(*quad);
  }
  words
}

/// Serialize a chaining value.
#[inline(always)]
pub(crate) fn cv_bytes(cv: &[u32; 8]) -> [u8; OUT_LEN] {
  let mut out = [0u8; OUT_LEN];
  let (quads, _) = out.as_chunks_mut::<4>();
  for (quad, word) in quads.iter_mut().zip(cv) {
    *quad = word.to_le_bytes();
  }
  out
}

/// The full 16-word compression output, before truncation.
#[inline]
fn compress(cv: &[u32; 8], block: &[u8; BLOCK_LEN], block_len: u8, counter: u64, flags: u8) -> [u32; 16] {
  let m = block_words(block);

  let mut v0 = cv[0];
  let mut v1 = cv[1];
  let mut v2 = cv[2];
  let mut v3 = cv[3];
  let mut v4 = cv[4];
  let mut v5 = cv[5];
  let mut v6 = cv[6];
  let mut v7 = cv[7];
  let mut v8 = IV[0];
  let mut v9 = IV[1];
  let mut v10 = IV[2];
  let mut v11 = IV[3];
  let mut v12 = counter as u32;
  let mut v13 = (counter >> 32) as u32;
  let mut v14 = u32::from(block_len);
  let mut v15 = u32::from(flags);

  macro_rules! g {
    ($a:ident, $b:ident, $c:ident, $d:ident, $mx:expr, $my:expr) => {{
      $a = $a.wrapping_add($b).wrapping_add($mx);
      $d = ($d ^ $a).rotate_right(16);
      $c = $c.wrapping_add($d);
      $b = ($b ^ $c).rotate_right(12);
      $a = $a.wrapping_add($b).wrapping_add($my);
      $d = ($d ^ $a).rotate_right(8);
      $c = $c.wrapping_add($d);
      $b = ($b ^ $c).rotate_right(7);
    }};
  }

  for s in &crate::MSG_SCHEDULE {
    // Columns.
    g!(v0, v4, v8, v12, m[s[0]], m[s[1]]);
    g!(v1, v5, v9, v13, m[s[2]], m[s[3]]);
    g!(v2, v6, v10, v14, m[s[4]], m[s[5]]);
    g!(v3, v7, v11, v15, m[s[6]], m[s[7]]);
    // Diagonals.
    g!(v0, v5, v10, v15, m[s[8]], m[s[9]]);
    g!(v1, v6, v11, v12, m[s[10]], m[s[11]]);
    g!(v2, v7, v8, v13, m[s[12]], m[s[13]]);
    g!(v3, v4, v9, v14, m[s[14]], m[s[15]]);
  }

  [
    v0 ^ v8,
    v1 ^ v9,
    v2 ^ v10,
    v3 ^ v11,
    v4 ^ v12,
    v5 ^ v13,
    v6 ^ v14,
    v7 ^ v15,
    v8 ^ cv[0],
    v9 ^ cv[1],
    v10 ^ cv[2],
    v11 ^ cv[3],
    v12 ^ cv[4],
    v13 ^ cv[5],
    v14 ^ cv[6],
    v15 ^ cv[7],
  ]
}

pub(crate) fn compress_in_place(cv: &mut [u32; 8], block: &[u8; BLOCK_LEN], block_len: u8, counter: u64, flags: u8) {
  let state = compress(cv, block, block_len, counter, flags);
  cv.copy_from_slice(&state[..8]);
}

pub(crate) fn compress_xof(
  cv: &[u32; 8],
  block: &[u8; BLOCK_LEN],
  block_len: u8,
  counter: u64,
  flags: u8,
) -> [u8; 2 * OUT_LEN] {
  let state = compress(cv, block, block_len, counter, flags);
  let mut out = [0u8; 2 * OUT_LEN];
  let (quads, _) = out.as_chunks_mut::<4>();
  for (quad, word) in quads.iter_mut().zip(state) {
    *quad = word.to_le_bytes();
  }
  out
}

/// Chain `blocks` blocks of one input through `compress`.
///
/// Shared by every tier for inputs that do not fill a full vector batch.
#[inline(always)]
pub(crate) fn hash_one_with(
  compress: impl Fn(&mut [u32; 8], &[u8; BLOCK_LEN], u8, u64, u8),
  input: &[u8],
  blocks: usize,
  key: &[u32; 8],
  counter: u64,
  flags: u8,
  flags_start: u8,
  flags_end: u8,
) -> [u8; OUT_LEN] {
  let (input_blocks, _) = input.as_chunks::<BLOCK_LEN>();
  debug_assert!(input_blocks.len() >= blocks);

  let mut cv = *key;
  let mut block_flags = flags | flags_start;
  for (i, block) in input_blocks.iter().take(blocks).enumerate() {
    if i + 1 == blocks {
      block_flags |= flags_end;
    }
    compress(&mut cv, block, BLOCK_LEN as u8, counter, block_flags);
    block_flags = flags;
  }
  cv_bytes(&cv)
}

pub(crate) fn hash_many(
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
  for (i, (input, dst)) in inputs.iter().zip(out.iter_mut()).enumerate() {
    *dst = hash_one_with(
      compress_in_place,
      input,
      blocks,
      key,
      increment.counter_for(counter, i),
      flags,
      flags_start,
      flags_end,
    );
  }
}
