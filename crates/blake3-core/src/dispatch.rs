//! Dispatch table, lane-width oracle and the operation façade.
//!
//! Each operation owns an ordered candidate list. Selection restricts the
//! capability set by the enabled [`Toggles`], then takes the first candidate
//! whose requirements it covers:
//!
//! | Operation | Chain |
//! |-----------|-------|
//! | `compress_in_place`, `compress_xof` | avx512 (VL) → sse4.1 → sse2 → portable |
//! | `hash_many` | avx512 (F+VL) → avx2 → sse4.1 → sse2 → neon → portable |
//! | `xof_many` | avx512 (VL, not Windows), else repeated `compress_xof` |
//!
//! AVX2 has no single-block kernel: one block leaves nothing to interleave
//! across its extra lanes.
//!
//! Nothing is cached per operation. A selection costs one atomic load plus a
//! few mask tests, so it is repeated on every call.

use backend::{Candidate, Tier, Toggles, select, try_select};
use platform::Caps;
#[cfg(all(target_arch = "aarch64", target_endian = "little", not(feature = "no_neon")))]
use platform::caps::aarch64;
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
use platform::caps::x86;

#[cfg(all(target_arch = "aarch64", target_endian = "little", not(feature = "no_neon")))]
use crate::aarch64 as neon;
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
use crate::x86::{avx2, avx512, sse2, sse41};
use crate::{
  BLOCK_LEN, CompressInPlaceFn, CompressXofFn, HashManyFn, IncrementCounter, OUT_LEN, XofManyFn, config, portable,
};

/// Most inputs any batch kernel consumes per call.
pub const MAX_SIMD_DEGREE: usize = Tier::Avx512.lanes();

// ─────────────────────────────────────────────────────────────────────────────
// Compile-time toggles
// ─────────────────────────────────────────────────────────────────────────────

/// Tiers this build may dispatch to, from the `no_*` Cargo features.
///
/// NEON is only a member on little-endian aarch64.
pub const BUILD: Toggles = {
  let mut toggles = Toggles::ALL;
  if cfg!(feature = "no_sse2") {
    toggles = toggles.without(Tier::Sse2);
  }
  if cfg!(feature = "no_sse41") {
    toggles = toggles.without(Tier::Sse41);
  }
  if cfg!(feature = "no_avx2") {
    toggles = toggles.without(Tier::Avx2);
  }
  if cfg!(feature = "no_avx512") {
    toggles = toggles.without(Tier::Avx512);
  }
  if cfg!(feature = "no_neon") || !cfg!(all(target_arch = "aarch64", target_endian = "little")) {
    toggles = toggles.without(Tier::Neon);
  }
  toggles
};

// ─────────────────────────────────────────────────────────────────────────────
// Candidate lists
// ─────────────────────────────────────────────────────────────────────────────

pub(crate) const COMPRESS_IN_PLACE: &[Candidate<CompressInPlaceFn>] = &[
  #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
  Candidate::new("x86/avx512", Tier::Avx512, x86::AVX512VL, avx512::compress_in_place),
  #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
  Candidate::new("x86/sse41", Tier::Sse41, x86::SSE41, sse41::compress_in_place),
  #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
  Candidate::new("x86/sse2", Tier::Sse2, x86::SSE2, sse2::compress_in_place),
  Candidate::new("portable", Tier::Portable, Caps::NONE, portable::compress_in_place),
];

pub(crate) const COMPRESS_XOF: &[Candidate<CompressXofFn>] = &[
  #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
  Candidate::new("x86/avx512", Tier::Avx512, x86::AVX512VL, avx512::compress_xof),
  #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
  Candidate::new("x86/sse41", Tier::Sse41, x86::SSE41, sse41::compress_xof),
  #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
  Candidate::new("x86/sse2", Tier::Sse2, x86::SSE2, sse2::compress_xof),
  Candidate::new("portable", Tier::Portable, Caps::NONE, portable::compress_xof),
];

/// No portable tail: an empty match means "loop over [`COMPRESS_XOF`]".
pub(crate) const XOF_MANY: &[Candidate<XofManyFn>] = &[
  #[cfg(all(any(target_arch = "x86", target_arch = "x86_64"), not(windows)))]
  Candidate::new("x86/avx512", Tier::Avx512, x86::AVX512VL, avx512::xof_many),
];

pub(crate) const HASH_MANY: &[Candidate<HashManyFn>] = &[
  #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
  Candidate::new("x86/avx512", Tier::Avx512, x86::AVX512_READY, avx512::hash_many),
  #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
  Candidate::new("x86/avx2", Tier::Avx2, x86::AVX2, avx2::hash_many),
  #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
  Candidate::new("x86/sse41", Tier::Sse41, x86::SSE41, sse41::hash_many),
  #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
  Candidate::new("x86/sse2", Tier::Sse2, x86::SSE2, sse2::hash_many),
  #[cfg(all(target_arch = "aarch64", target_endian = "little", not(feature = "no_neon")))]
  Candidate::new("aarch64/neon", Tier::Neon, aarch64::NEON, neon::hash_many),
  Candidate::new("portable", Tier::Portable, Caps::NONE, portable::hash_many),
];

// ─────────────────────────────────────────────────────────────────────────────
// Pure selection
// ─────────────────────────────────────────────────────────────────────────────
//
// These take an arbitrary capability set, so they answer "what would run on
// that machine" without touching the hardware. `BUILD` always applies.

#[inline]
const fn effective(caps: Caps, toggles: Toggles) -> Caps {
  toggles.intersection(BUILD).restrict(caps)
}

/// Tier serving `compress_in_place` and `compress_xof`.
#[must_use]
pub fn compress_tier(caps: Caps, toggles: Toggles) -> Tier {
  select(effective(caps, toggles), COMPRESS_IN_PLACE).tier
}

/// Tier serving `hash_many`.
#[must_use]
pub fn hash_many_tier(caps: Caps, toggles: Toggles) -> Tier {
  select(effective(caps, toggles), HASH_MANY).tier
}

/// Dedicated `xof_many` tier, or `None` when the operation decomposes into
/// single-block calls.
#[must_use]
pub fn xof_many_tier(caps: Caps, toggles: Toggles) -> Option<Tier> {
  try_select(effective(caps, toggles), XOF_MANY).map(|kernel| kernel.tier)
}

/// Inputs per `hash_many` kernel call for the given state.
#[must_use]
pub fn simd_degree_for(caps: Caps, toggles: Toggles) -> usize {
  hash_many_tier(caps, toggles).lanes()
}

// ─────────────────────────────────────────────────────────────────────────────
// Dispatch
// ─────────────────────────────────────────────────────────────────────────────

/// An effective capability set that is safe to dispatch on.
///
/// The only constructors start from the detected capabilities and can only
/// remove bits, so every kernel a `Dispatch` selects is executable here.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dispatch {
  caps: Caps,
}

impl Dispatch {
  /// Detected capabilities, restricted by [`BUILD`] and [`config::get`].
  #[inline]
  #[must_use]
  pub fn current() -> Self {
    Self {
      caps: effective(platform::caps(), config::get().toggles),
    }
  }

  /// The scalar path only.
  #[inline]
  #[must_use]
  pub const fn portable() -> Self {
    Self { caps: Caps::NONE }
  }

  /// `self` with every tier outside `toggles` removed.
  #[inline]
  #[must_use]
  pub const fn restricted(self, toggles: Toggles) -> Self {
    Self {
      caps: toggles.restrict(self.caps),
    }
  }

  /// Capability bits selection runs against.
  #[inline]
  #[must_use]
  pub const fn caps(self) -> Caps {
    self.caps
  }

  #[inline]
  #[must_use]
  pub fn compress_tier(self) -> Tier {
    select(self.caps, COMPRESS_IN_PLACE).tier
  }

  #[inline]
  #[must_use]
  pub fn hash_many_tier(self) -> Tier {
    select(self.caps, HASH_MANY).tier
  }

  #[inline]
  #[must_use]
  pub fn xof_many_tier(self) -> Option<Tier> {
    try_select(self.caps, XOF_MANY).map(|kernel| kernel.tier)
  }

  /// Inputs the selected `hash_many` kernel processes in parallel.
  #[inline]
  #[must_use]
  pub fn simd_degree(self) -> usize {
    self.hash_many_tier().lanes()
  }

  #[inline]
  #[allow(unsafe_code)]
  pub fn compress_in_place(self, cv: &mut [u32; 8], block: &[u8; BLOCK_LEN], block_len: u8, counter: u64, flags: u8) {
    let kernel = select(self.caps, COMPRESS_IN_PLACE);
    // SAFETY: `self.caps` is a subset of the detected capabilities and covers
    // `kernel`'s requirements.
    unsafe { (kernel.func)(cv, block, block_len, counter, flags) }
  }

  #[inline]
  #[must_use]
  #[allow(unsafe_code)]
  pub fn compress_xof(
    self,
    cv: &[u32; 8],
    block: &[u8; BLOCK_LEN],
    block_len: u8,
    counter: u64,
    flags: u8,
  ) -> [u8; 2 * OUT_LEN] {
    let kernel = select(self.caps, COMPRESS_XOF);
    // SAFETY: `self.caps` is a subset of the detected capabilities and covers
    // `kernel`'s requirements.
    unsafe { (kernel.func)(cv, block, block_len, counter, flags) }
  }

  /// Fill `out` with extended output; block `i` uses counter `counter + i`.
  #[inline]
  #[allow(unsafe_code)]
  pub fn xof_many(
    self,
    cv: &[u32; 8],
    block: &[u8; BLOCK_LEN],
    block_len: u8,
    counter: u64,
    flags: u8,
    out: &mut [[u8; 2 * OUT_LEN]],
  ) {
    if out.is_empty() {
      return;
    }

    if let Some(kernel) = try_select(self.caps, XOF_MANY) {
      // SAFETY: `self.caps` is a subset of the detected capabilities and
      // covers `kernel`'s requirements.
      unsafe { (kernel.func)(cv, block, block_len, counter, flags, out) }
      return;
    }

    let kernel = select(self.caps, COMPRESS_XOF);
    let mut block_counter = counter;
    for dst in out {
      // SAFETY: `self.caps` is a subset of the detected capabilities and
      // covers `kernel`'s requirements.
      *dst = unsafe { (kernel.func)(cv, block, block_len, block_counter, flags) };
      block_counter = block_counter.wrapping_add(1);
    }
  }

  /// Hash each input to one chaining value.
  ///
  /// Every input is `N / BLOCK_LEN` whole blocks; `N` not being a multiple of
  /// [`BLOCK_LEN`] fails to compile.
  ///
  /// # Panics
  ///
  /// If `out` is shorter than `inputs`.
  #[inline]
  #[allow(unsafe_code)]
  pub fn hash_many<const N: usize>(
    self,
    inputs: &[&[u8; N]],
    key: &[u32; 8],
    counter: u64,
    increment: IncrementCounter,
    flags: u8,
    flags_start: u8,
    flags_end: u8,
    out: &mut [[u8; OUT_LEN]],
  ) {
    const { assert!(N.is_multiple_of(BLOCK_LEN), "hash_many inputs must be whole blocks") };
    assert!(
      out.len() >= inputs.len(),
      "hash_many: {} inputs but room for only {} outputs",
      inputs.len(),
      out.len()
    );

    let blocks = N / BLOCK_LEN;
    let kernel = select(self.caps, HASH_MANY);

    let mut group: [&[u8]; MAX_SIMD_DEGREE] = [&[]; MAX_SIMD_DEGREE];
    for (index, (chunk, dst)) in inputs
      .chunks(MAX_SIMD_DEGREE)
      .zip(out.chunks_mut(MAX_SIMD_DEGREE))
      .enumerate()
    {
      for (slot, input) in group.iter_mut().zip(chunk) {
        *slot = input.as_slice();
      }
      let (live, _) = group.split_at(chunk.len());
      let group_counter = increment.counter_for(counter, index * MAX_SIMD_DEGREE);

      // SAFETY: `self.caps` is a subset of the detected capabilities and
      // covers `kernel`'s requirements. Every input holds `blocks` blocks and
      // `dst` has room for one output per input.
      unsafe {
        (kernel.func)(
          live,
          blocks,
          key,
          group_counter,
          increment,
          flags,
          flags_start,
          flags_end,
          dst,
        )
      }
    }
  }
}

// ─────────────────────────────────────────────────────────────────────────────
// Façade
// ─────────────────────────────────────────────────────────────────────────────

/// Compress one block, updating `cv` in place.
#[inline]
pub fn compress_in_place(cv: &mut [u32; 8], block: &[u8; BLOCK_LEN], block_len: u8, counter: u64, flags: u8) {
  Dispatch::current().compress_in_place(cv, block, block_len, counter, flags);
}

/// Compress one block, returning all 64 bytes of extended output.
#[inline]
#[must_use]
pub fn compress_xof(cv: &[u32; 8], block: &[u8; BLOCK_LEN], block_len: u8, counter: u64, flags: u8) -> [u8; 2 * OUT_LEN] {
  Dispatch::current().compress_xof(cv, block, block_len, counter, flags)
}

/// Produce `out.len()` extended-output blocks at counters `counter..`.
///
/// An empty `out` is a no-op.
#[inline]
pub fn xof_many(
  cv: &[u32; 8],
  block: &[u8; BLOCK_LEN],
  block_len: u8,
  counter: u64,
  flags: u8,
  out: &mut [[u8; 2 * OUT_LEN]],
) {
  Dispatch::current().xof_many(cv, block, block_len, counter, flags, out);
}

/// Hash many equal-length inputs, one chaining value each. See
/// [`Dispatch::hash_many`].
///
/// # Panics
///
/// If `out` is shorter than `inputs`.
#[inline]
pub fn hash_many<const N: usize>(
  inputs: &[&[u8; N]],
  key: &[u32; 8],
  counter: u64,
  increment: IncrementCounter,
  flags: u8,
  flags_start: u8,
  flags_end: u8,
  out: &mut [[u8; OUT_LEN]],
) {
  Dispatch::current().hash_many(inputs, key, counter, increment, flags, flags_start, flags_end, out);
}

/// Inputs per `hash_many` kernel call on this host: 16, 8, 4 or 1.
#[inline]
#[must_use]
pub fn simd_degree() -> usize {
  Dispatch::current().simd_degree()
}
