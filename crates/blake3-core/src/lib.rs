//! BLAKE3 compression with runtime kernel dispatch.
//!
//! This crate is the layer between a BLAKE3 tree/chunking construction and the
//! per-ISA compression kernels. It answers one question per call: which kernel
//! may run here, and which of those is fastest?
//!
//! # Entry Points
//!
//! | Function | Work |
//! |----------|------|
//! | [`compress_in_place`] | one block, chaining value updated in place |
//! | [`compress_xof`] | one block, full 64-byte extended output |
//! | [`xof_many`] | N extended-output blocks at consecutive counters |
//! | [`hash_many`] | many independent inputs, one chaining value each |
//! | [`simd_degree`] | inputs per [`hash_many`] kernel call on this host |
//!
//! ```
//! use blake3_core::{IV, compress_xof, flags};
//!
//! let block = [0u8; 64];
//! let out = compress_xof(&IV, &block, 0, 0, flags::CHUNK_START | flags::CHUNK_END | flags::ROOT);
//! assert_eq!(&out[..4], &blake3::hash(b"").as_bytes()[..4]);
//! ```
//!
//! # Selection
//!
//! Every call resolves a [`Dispatch`] from three inputs:
//!
//! 1. Detected CPU capabilities ([`platform::caps()`], probed once and cached).
//! 2. Cargo toggles (`no_sse2`, `no_sse41`, `no_avx2`, `no_avx512`, `no_neon`).
//! 3. The `BLAKE3_CORE_FORCE` environment override (see [`config`]).
//!
//! Disabled tiers are removed from the capability set before candidate lists
//! are scanned, so they can never be selected whatever the hardware reports.
//! Every tier produces bit-identical output for identical input.

#![no_std]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::indexing_slicing))]
#![deny(unsafe_code)]

#[cfg(feature = "std")]
extern crate std;

#[cfg(all(target_arch = "aarch64", target_endian = "little", not(feature = "no_neon")))]
mod aarch64;
pub mod config;
#[cfg(feature = "diag")]
pub mod diag;
pub mod dispatch;
#[cfg(test)]
mod kernel_test;
mod portable;
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
mod x86;

pub use backend::{Tier, Toggles};
pub use dispatch::{
  Dispatch, compress_in_place, compress_tier, compress_xof, hash_many, hash_many_tier, simd_degree, simd_degree_for,
  xof_many, xof_many_tier,
};
pub use platform::Caps;

/// Bytes per compression block.
pub const BLOCK_LEN: usize = 64;
/// Bytes in a chaining value / default hash output.
pub const OUT_LEN: usize = 32;

/// Initial chaining value (the SHA-256 IV).
pub const IV: [u32; 8] = [
  0x6A09_E667,
  0xBB67_AE85,
  0x3C6E_F372,
  0xA54F_F53A,
  0x510E_527F,
  0x9B05_688C,
  0x1F83_D9AB,
  0x5BE0_CD19,
];

/// `MSG_SCHEDULE[round][i]` is the message word fed to position `i` in `round`.
pub(crate) const MSG_SCHEDULE: [[usize; 16]; 7] = [
  [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15],
  [2, 6, 3, 10, 7, 0, 4, 13, 1, 11, 12, 5, 9, 14, 15, 8],
  [3, 4, 10, 12, 13, 2, 7, 14, 6, 5, 9, 0, 11, 15, 8, 1],
  [10, 7, 12, 9, 14, 3, 13, 15, 4, 0, 11, 2, 5, 8, 1, 6],
  [12, 13, 9, 11, 15, 10, 14, 8, 7, 2, 5, 3, 0, 1, 6, 4],
  [9, 14, 11, 5, 8, 12, 15, 1, 13, 3, 0, 10, 2, 6, 4, 7],
  [11, 15, 5, 0, 1, 9, 8, 6, 14, 10, 2, 12, 3, 4, 7, 13],
];

/// Domain-separation flags carried in the last state word.
pub mod flags {
  pub const CHUNK_START: u8 = 1 << 0;
  pub const CHUNK_END: u8 = 1 << 1;
  pub const PARENT: u8 = 1 << 2;
  pub const ROOT: u8 = 1 << 3;
  pub const KEYED_HASH: u8 = 1 << 4;
  pub const DERIVE_KEY_CONTEXT: u8 = 1 << 5;
  pub const DERIVE_KEY_MATERIAL: u8 = 1 << 6;
}

/// Whether [`hash_many`] gives each input its own counter.
///
/// Chunk hashing increments (input `i` is chunk `counter + i`); parent hashing
/// keeps every counter at zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IncrementCounter {
  Yes,
  No,
}

impl IncrementCounter {
  /// Counter used by input `index` of a batch starting at `base`.
  #[inline(always)]
  #[must_use]
  pub const fn counter_for(self, base: u64, index: usize) -> u64 {
    match self {
      Self::Yes => base.wrapping_add(index as u64),
      Self::No => base,
    }
  }
}

// ─────────────────────────────────────────────────────────────────────────────
// Kernel Signatures
// ─────────────────────────────────────────────────────────────────────────────
//
// Every tier exposes exactly these shapes so any kernel is a drop-in substitute.
// All are `unsafe fn`: vector kernels require the caller to have confirmed the
// tier's capabilities. Safe portable functions coerce to them.

/// `(cv, block, block_len, counter, flags)`, updating `cv` in place.
pub(crate) type CompressInPlaceFn = unsafe fn(&mut [u32; 8], &[u8; BLOCK_LEN], u8, u64, u8);

/// `(cv, block, block_len, counter, flags) -> 64-byte extended output`.
pub(crate) type CompressXofFn = unsafe fn(&[u32; 8], &[u8; BLOCK_LEN], u8, u64, u8) -> [u8; 2 * OUT_LEN];

/// `(cv, block, block_len, counter, flags, out)`: block `i` of `out` uses
/// `counter + i`.
pub(crate) type XofManyFn = unsafe fn(&[u32; 8], &[u8; BLOCK_LEN], u8, u64, u8, &mut [[u8; 2 * OUT_LEN]]);

/// `(inputs, blocks, key, counter, increment, flags, flags_start, flags_end, out)`.
///
/// Each input holds at least `blocks * BLOCK_LEN` bytes; `out` holds at least
/// `inputs.len()` entries.
pub(crate) type HashManyFn =
  unsafe fn(&[&[u8]], usize, &[u32; 8], u64, IncrementCounter, u8, u8, u8, &mut [[u8; OUT_LEN]]);
