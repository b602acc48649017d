//! Every compiled kernel the host can run, checked against portable.
//!
//! Build toggles and `BLAKE3_CORE_FORCE` only steer dispatch; they do not
//! remove kernels from the binary, so each list is walked in full here.

#![allow(unsafe_code)]

extern crate std;

use std::vec::Vec;

use backend::Candidate;

use crate::{
  BLOCK_LEN, IV, IncrementCounter, OUT_LEN,
  dispatch::{COMPRESS_IN_PLACE, COMPRESS_XOF, HASH_MANY, XOF_MANY},
  flags::{CHUNK_END, CHUNK_START, KEYED_HASH, PARENT, ROOT},
  portable,
};

const COUNTERS: [u64; 5] = [0, 1, 0xFFFF_FFFF, 1 << 32, u64::MAX - 2];

fn runnable<F: Copy>(list: &'static [Candidate<F>]) -> impl Iterator<Item = &'static Candidate<F>> {
  let caps = platform::caps();
  list.iter().filter(move |candidate| caps.has(candidate.requires))
}

fn block(seed: u8) -> [u8; BLOCK_LEN] {
  core::array::from_fn(|i| (i as u8).wrapping_mul(31).wrapping_add(seed))
}

fn cv(seed: u32) -> [u32; 8] {
  core::array::from_fn(|i| IV[i] ^ seed.wrapping_mul(0x9E37_79B9).rotate_left(i as u32))
}

fn data(len: usize, seed: usize) -> Vec<u8> {
  (0..len).map(|i| ((i * 13 + seed * 101) % 251) as u8).collect()
}

#[test]
fn compress_in_place_matches_portable() {
  for kernel in runnable(COMPRESS_IN_PLACE) {
    for (seed, &counter) in COUNTERS.iter().enumerate() {
      for (block_len, flags) in [(64u8, 0u8), (0, CHUNK_START | CHUNK_END | ROOT), (17, KEYED_HASH | CHUNK_END)] {
        let input = block(seed as u8);
        let mut expected = cv(seed as u32);
        portable::compress_in_place(&mut expected, &input, block_len, counter, flags);

        let mut actual = cv(seed as u32);
        // SAFETY: `runnable` filtered on detected capabilities.
        unsafe { (kernel.func)(&mut actual, &input, block_len, counter, flags) };
        assert_eq!(actual, expected, "{} counter={counter:#x} flags={flags:#x}", kernel.name);
      }
    }
  }
}

#[test]
fn compress_xof_matches_portable() {
  for kernel in runnable(COMPRESS_XOF) {
    for (seed, &counter) in COUNTERS.iter().enumerate() {
      let key = cv(seed as u32 + 7);
      let input = block(seed as u8 + 3);
      let expected = portable::compress_xof(&key, &input, 64, counter, PARENT | ROOT);
      // SAFETY: `runnable` filtered on detected capabilities.
      let actual = unsafe { (kernel.func)(&key, &input, 64, counter, PARENT | ROOT) };
      assert_eq!(actual, expected, "{} counter={counter:#x}", kernel.name);
    }
  }
}

#[test]
fn xof_many_matches_portable() {
  let key = cv(42);
  let input = block(9);
  for kernel in runnable(XOF_MANY) {
    for n in [0usize, 1, 15, 16, 17, 33] {
      for &counter in &COUNTERS {
        let expected: Vec<[u8; 2 * OUT_LEN]> = (0..n)
          .map(|i| portable::compress_xof(&key, &input, 64, counter.wrapping_add(i as u64), ROOT))
          .collect();

        let mut actual = std::vec![[0u8; 2 * OUT_LEN]; n];
        // SAFETY: `runnable` filtered on detected capabilities.
        unsafe { (kernel.func)(&key, &input, 64, counter, ROOT, &mut actual) };
        assert_eq!(actual, expected, "{} n={n} counter={counter:#x}", kernel.name);
      }
    }
  }
}

#[test]
fn hash_many_matches_portable() {
  let key = cv(3);
  for kernel in runnable(HASH_MANY) {
    for blocks in [0usize, 1, 2, 16] {
      for count in [0usize, 1, 3, 4, 5, 8, 9, 16, 17, 35] {
        let inputs: Vec<Vec<u8>> = (0..count).map(|i| data(blocks * BLOCK_LEN, i)).collect();
        let refs: Vec<&[u8]> = inputs.iter().map(Vec::as_slice).collect();

        for increment in [IncrementCounter::Yes, IncrementCounter::No] {
          for &counter in &COUNTERS {
            let mut expected = std::vec![[0u8; OUT_LEN]; count];
            portable::hash_many(
              &refs,
              blocks,
              &key,
              counter,
              increment,
              KEYED_HASH,
              CHUNK_START,
              CHUNK_END,
              &mut expected,
            );

            let mut actual = std::vec![[0u8; OUT_LEN]; count];
            // SAFETY: `runnable` filtered on detected capabilities; every
            // input holds `blocks` blocks.
            unsafe {
              (kernel.func)(
                &refs,
                blocks,
                &key,
                counter,
                increment,
                KEYED_HASH,
                CHUNK_START,
                CHUNK_END,
                &mut actual,
              )
            };
            assert_eq!(
              actual, expected,
              "{} blocks={blocks} count={count} counter={counter:#x} {increment:?}",
              kernel.name
            );
          }
        }
      }
    }
  }
}

#[test]
fn hash_many_leaves_extra_outputs_alone() {
  let inputs: Vec<Vec<u8>> = (0..5).map(|i| data(BLOCK_LEN, i)).collect();
  let refs: Vec<&[u8]> = inputs.iter().map(Vec::as_slice).collect();
  for kernel in runnable(HASH_MANY) {
    let mut out = [[0xEEu8; OUT_LEN]; 8];
    // SAFETY: `runnable` filtered on detected capabilities.
    unsafe { (kernel.func)(&refs, 1, &IV, 0, IncrementCounter::Yes, 0, 0, 0, &mut out) };
    assert!(out[5..].iter().all(|cv| *cv == [0xEE; OUT_LEN]), "{}", kernel.name);
  }
}
