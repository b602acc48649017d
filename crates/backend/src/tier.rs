//! Vector-instruction tiers and the toggles that disable them.
//!
//! # Tier Overview
//!
//! | Tier | Requires | Lanes | Description |
//! |------|----------|-------|-------------|
//! | Portable | - | 1 | Scalar code, always available |
//! | Sse2 | SSE2 | 4 | 128-bit baseline on x86_64 |
//! | Sse41 | SSE4.1 | 4 | 128-bit with byte shuffles and blends |
//! | Avx2 | AVX2 | 8 | 256-bit |
//! | Avx512 | AVX-512 F+VL | 16 | 512-bit with native rotates |
//! | Neon | NEON | 4 | aarch64 Advanced SIMD |
//!
//! "Lanes" is how many independent inputs the tier's widest kernel hashes in
//! parallel. Callers batching inputs size their batches by it.

use core::fmt;

use platform::caps::{Caps, aarch64, x86};

/// Kernel tier.
///
/// Declaration order is not a preference order: Neon and the x86 tiers never
/// coexist on one target, and each operation orders its own candidates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Tier {
  /// Scalar reference path. Always enabled.
  #[default]
  Portable = 0,
  Sse2 = 1,
  Sse41 = 2,
  Avx2 = 3,
  Avx512 = 4,
  Neon = 5,
}

impl Tier {
  /// Every tier, portable first.
  pub const ALL: [Self; 6] = [
    Self::Portable,
    Self::Sse2,
    Self::Sse41,
    Self::Avx2,
    Self::Avx512,
    Self::Neon,
  ];

  #[inline]
  #[must_use]
  pub const fn name(self) -> &'static str {
    match self {
      Self::Portable => "portable",
      Self::Sse2 => "sse2",
      Self::Sse41 => "sse41",
      Self::Avx2 => "avx2",
      Self::Avx512 => "avx512",
      Self::Neon => "neon",
    }
  }

  /// Capabilities the tier's widest kernels need.
  #[inline]
  #[must_use]
  pub const fn caps(self) -> Caps {
    match self {
      Self::Portable => Caps::NONE,
      Self::Sse2 => x86::SSE2,
      Self::Sse41 => x86::SSE41,
      Self::Avx2 => x86::AVX2,
      Self::Avx512 => x86::AVX512_READY,
      Self::Neon => aarch64::NEON,
    }
  }

  /// Inputs hashed in parallel by the tier's multi-input kernel.
  #[inline]
  #[must_use]
  pub const fn lanes(self) -> usize {
    match self {
      Self::Portable => 1,
      Self::Sse2 | Self::Sse41 | Self::Neon => 4,
      Self::Avx2 => 8,
      Self::Avx512 => 16,
    }
  }

  /// Parse a tier name, ignoring ASCII case. Accepts `sse4.1` for `Sse41`.
  #[must_use]
  pub fn from_name(name: &str) -> Option<Self> {
    if name.eq_ignore_ascii_case("sse4.1") {
      return Some(Self::Sse41);
    }
    Self::ALL.into_iter().find(|tier| name.eq_ignore_ascii_case(tier.name()))
  }

  #[inline]
  const fn mask(self) -> u8 {
    1 << self as u8
  }
}

impl fmt::Display for Tier {
  #[inline]
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

// ─────────────────────────────────────────────────────────────────────────────
// Toggles
// ─────────────────────────────────────────────────────────────────────────────

/// Set of enabled tiers. [`Tier::Portable`] is always a member.
///
/// Toggles act on selection by masking capabilities: [`restrict`](Self::restrict)
/// removes the feature bits of every disabled tier, so no candidate of a
/// disabled tier can match. Restriction can only remove bits, which keeps any
/// toggle combination safe to apply to a detected set.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Toggles(u8);

impl Toggles {
  /// Every tier enabled.
  pub const ALL: Self = Self(0b11_1111);
  /// Only the scalar path.
  pub const PORTABLE_ONLY: Self = Self(Tier::Portable.mask());

  /// Portable plus `tier`.
  #[inline]
  #[must_use]
  pub const fn only(tier: Tier) -> Self {
    Self(Tier::Portable.mask() | tier.mask())
  }

  /// `self` with `tier` disabled. Disabling Portable is a no-op.
  #[inline]
  #[must_use]
  pub const fn without(self, tier: Tier) -> Self {
    Self((self.0 & !tier.mask()) | Tier::Portable.mask())
  }

  #[inline]
  #[must_use]
  pub const fn with(self, tier: Tier) -> Self {
    Self(self.0 | tier.mask())
  }

  #[inline]
  #[must_use]
  pub const fn allows(self, tier: Tier) -> bool {
    self.0 & tier.mask() != 0
  }

  /// Tiers enabled in both sets.
  #[inline]
  #[must_use]
  pub const fn intersection(self, other: Self) -> Self {
    Self(self.0 & other.0)
  }

  /// Capability bits belonging to disabled tiers.
  #[must_use]
  pub const fn disabled_caps(self) -> Caps {
    self
      .off(Tier::Sse2)
      .union(self.off(Tier::Sse41))
      .union(self.off(Tier::Avx2))
      .union(self.off(Tier::Avx512))
      .union(self.off(Tier::Neon))
  }

  #[inline]
  const fn off(self, tier: Tier) -> Caps {
    if self.allows(tier) { Caps::NONE } else { tier.caps() }
  }

  /// Remove the capability bits of every disabled tier from `caps`.
  #[inline]
  #[must_use]
  pub const fn restrict(self, caps: Caps) -> Caps {
    caps.difference(self.disabled_caps())
  }

  /// Iterate over the enabled tiers.
  pub fn iter(self) -> impl Iterator<Item = Tier> {
    Tier::ALL.into_iter().filter(move |&tier| self.allows(tier))
  }
}

impl Default for Toggles {
  #[inline]
  fn default() -> Self {
    Self::ALL
  }
}

impl fmt::Debug for Toggles {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_set().entries(self.iter()).finish()
  }
}

#[cfg(test)]
mod tests {
  extern crate std;

  use super::*;

  #[test]
  fn tier_names_round_trip() {
    for tier in Tier::ALL {
      assert_eq!(Tier::from_name(tier.name()), Some(tier));
    }
    assert_eq!(Tier::from_name("AVX512"), Some(Tier::Avx512));
    assert_eq!(Tier::from_name("sse4.1"), Some(Tier::Sse41));
    assert_eq!(Tier::from_name("avx"), None);
    assert_eq!(Tier::from_name(""), None);
  }

  #[test]
  fn tier_lanes() {
    assert_eq!(Tier::Portable.lanes(), 1);
    assert_eq!(Tier::Sse2.lanes(), 4);
    assert_eq!(Tier::Sse41.lanes(), 4);
    assert_eq!(Tier::Avx2.lanes(), 8);
    assert_eq!(Tier::Avx512.lanes(), 16);
    assert_eq!(Tier::Neon.lanes(), 4);
  }

  #[test]
  fn avx512_tier_needs_both_bits() {
    assert!(Tier::Avx512.caps().has(x86::AVX512F));
    assert!(Tier::Avx512.caps().has(x86::AVX512VL));
  }

  #[test]
  fn portable_cannot_be_disabled() {
    assert!(Toggles::PORTABLE_ONLY.allows(Tier::Portable));
    assert!(Toggles::ALL.without(Tier::Portable).allows(Tier::Portable));
    assert!(Toggles::only(Tier::Avx2).allows(Tier::Portable));
    assert!(
      Toggles::only(Tier::Avx2)
        .intersection(Toggles::only(Tier::Sse2))
        .allows(Tier::Portable)
    );
  }

  #[test]
  fn toggles_membership() {
    let t = Toggles::ALL.without(Tier::Avx512).without(Tier::Sse2);
    assert!(!t.allows(Tier::Avx512));
    assert!(!t.allows(Tier::Sse2));
    assert!(t.allows(Tier::Sse41));
    assert!(t.with(Tier::Sse2).allows(Tier::Sse2));
    assert_eq!(Toggles::ALL.iter().count(), Tier::ALL.len());
    assert_eq!(Toggles::PORTABLE_ONLY.iter().collect::<std::vec::Vec<_>>(), [Tier::Portable]);
  }

  #[test]
  fn restrict_only_removes_bits() {
    let full = x86::SSE2 | x86::SSSE3 | x86::SSE41 | x86::AVX | x86::AVX2 | x86::AVX512_READY;
    assert_eq!(Toggles::ALL.restrict(full), full);
    assert_eq!(Toggles::PORTABLE_ONLY.restrict(full), x86::SSSE3 | x86::AVX);

    let no512 = Toggles::ALL.without(Tier::Avx512).restrict(full);
    assert!(!no512.has(x86::AVX512F));
    assert!(!no512.has(x86::AVX512VL));
    assert!(no512.has(x86::AVX2));

    for tier in Tier::ALL {
      let restricted = Toggles::only(tier).restrict(full);
      assert!(full.has(restricted));
    }
  }

  #[test]
  fn restrict_never_adds() {
    assert_eq!(Toggles::ALL.restrict(Caps::NONE), Caps::NONE);
    assert_eq!(Toggles::only(Tier::Neon).restrict(x86::SSE2), Caps::NONE);
  }
}
