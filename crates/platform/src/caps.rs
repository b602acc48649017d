//! CPU capability representation.
//!
//! [`Caps`] answers one question: "which vector-instruction tiers may this
//! process legally execute?" It is a small bitset so that the whole set fits in
//! a single atomic word (see [`crate::caps()`]).
//!
//! # Bit Layout
//!
//! - Bits 0-15: x86/x86_64 features
//! - Bits 16-23: aarch64 features
//! - Bit 31: never assigned (`u32::MAX` is the cache's "not yet probed" sentinel)

use core::fmt;

// ─────────────────────────────────────────────────────────────────────────────
// Core Capability Type
// ─────────────────────────────────────────────────────────────────────────────

/// CPU capabilities: a feature bitset.
///
/// Use [`has()`](Caps::has) to check if required features are available.
///
/// # Example
///
/// ```
/// use platform::caps::{Caps, x86};
///
/// let caps = x86::SSE2 | x86::SSE41;
/// assert!(caps.has(x86::SSE41));
/// assert!(!caps.has(x86::AVX512_READY));
/// ```
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Caps(u32);

impl Caps {
  /// Empty capability set (portable code only).
  pub const NONE: Self = Self(0);

  /// Mask of every bit that may legally appear in a `Caps`.
  const VALID: u32 = 0x00FF_FFFF;

  /// Create a capability set with a single bit set.
  #[inline]
  #[must_use]
  pub(crate) const fn bit(bit: u8) -> Self {
    Self(1u32 << bit)
  }

  /// Rebuild a set from raw bits, dropping any bit outside the assigned range.
  ///
  /// The sentinel value `u32::MAX` can therefore never round-trip into a
  /// capability set.
  #[inline]
  #[must_use]
  pub(crate) const fn from_bits_truncate(bits: u32) -> Self {
    Self(bits & Self::VALID)
  }

  /// Raw bit representation.
  #[inline]
  #[must_use]
  pub const fn bits(self) -> u32 {
    self.0
  }

  /// Check if all features in `required` are present.
  #[inline(always)]
  #[must_use]
  pub const fn has(self, required: Self) -> bool {
    (self.0 & required.0) == required.0
  }

  /// Union of two capability sets.
  #[inline]
  #[must_use]
  pub const fn union(self, other: Self) -> Self {
    Self(self.0 | other.0)
  }

  /// Intersection of two capability sets.
  #[inline]
  #[must_use]
  pub const fn intersection(self, other: Self) -> Self {
    Self(self.0 & other.0)
  }

  /// Features in `self` that are not in `other`.
  #[inline]
  #[must_use]
  pub const fn difference(self, other: Self) -> Self {
    Self(self.0 & !other.0)
  }

  #[inline]
  #[must_use]
  pub const fn is_empty(self) -> bool {
    self.0 == 0
  }

  /// Number of features present.
  #[inline]
  #[must_use]
  pub const fn count(self) -> u32 {
    self.0.count_ones()
  }

  /// Iterate over the names of the features present, weakest first.
  pub fn names(self) -> impl Iterator<Item = &'static str> {
    NAMES
      .iter()
      .filter(move |&&(feature, _)| self.has(feature))
      .map(|&(_, name)| name)
  }
}

impl core::ops::BitOr for Caps {
  type Output = Self;

  #[inline]
  fn bitor(self, rhs: Self) -> Self {
    self.union(rhs)
  }
}

impl core::ops::BitOrAssign for Caps {
  #[inline]
  fn bitor_assign(&mut self, rhs: Self) {
    *self = self.union(rhs);
  }
}

impl core::ops::BitAnd for Caps {
  type Output = Self;

  #[inline]
  fn bitand(self, rhs: Self) -> Self {
    self.intersection(rhs)
  }
}

impl fmt::Debug for Caps {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("Caps(")?;
    let mut first = true;
    for name in self.names() {
      if !first {
        f.write_str("|")?;
      }
      f.write_str(name)?;
      first = false;
    }
    if first {
      f.write_str("none")?;
    }
    f.write_str(")")
  }
}

// ─────────────────────────────────────────────────────────────────────────────
// x86 / x86_64
// ─────────────────────────────────────────────────────────────────────────────

/// x86 and x86_64 features, ordered weakest to strongest.
pub mod x86 {
  use super::Caps;

  pub const SSE2: Caps = Caps::bit(0);
  pub const SSSE3: Caps = Caps::bit(1);
  pub const SSE41: Caps = Caps::bit(2);
  pub const AVX: Caps = Caps::bit(3);
  pub const AVX2: Caps = Caps::bit(4);
  /// AVX-512 Foundation.
  pub const AVX512F: Caps = Caps::bit(5);
  /// AVX-512 Vector Length extensions (EVEX-encoded 128/256-bit forms).
  pub const AVX512VL: Caps = Caps::bit(6);

  /// Both AVX-512 bits: what a 16-lane kernel needs.
  pub const AVX512_READY: Caps = AVX512F.union(AVX512VL);
}

// ─────────────────────────────────────────────────────────────────────────────
// aarch64
// ─────────────────────────────────────────────────────────────────────────────

/// aarch64 features.
pub mod aarch64 {
  use super::Caps;

  /// Advanced SIMD. Compile-time only: set when the build enables
  /// `target_feature = "neon"`, never probed at runtime.
  pub const NEON: Caps = Caps::bit(16);
}

const NAMES: &[(Caps, &str)] = &[
  (x86::SSE2, "sse2"),
  (x86::SSSE3, "ssse3"),
  (x86::SSE41, "sse4.1"),
  (x86::AVX, "avx"),
  (x86::AVX2, "avx2"),
  (x86::AVX512F, "avx512f"),
  (x86::AVX512VL, "avx512vl"),
  (aarch64::NEON, "neon"),
];

#[cfg(test)]
mod tests {
  extern crate alloc;

  use alloc::{format, vec::Vec};

  use super::*;

  #[test]
  fn has_requires_every_bit() {
    let caps = x86::SSE2 | x86::AVX512F;
    assert!(caps.has(x86::SSE2));
    assert!(caps.has(Caps::NONE));
    assert!(!caps.has(x86::AVX512_READY), "AVX512F alone is not AVX512_READY");
    assert!((caps | x86::AVX512VL).has(x86::AVX512_READY));
  }

  #[test]
  fn set_operations() {
    let a = x86::SSE2 | x86::SSE41 | x86::AVX2;
    let b = x86::SSE41 | x86::AVX;
    assert_eq!(a & b, x86::SSE41);
    assert_eq!(a.difference(b), x86::SSE2 | x86::AVX2);
    assert_eq!(a.union(b).count(), 4);
    assert!(Caps::NONE.is_empty());
    assert!(!a.is_empty());
  }

  #[test]
  fn bits_are_distinct() {
    let mut seen = Caps::NONE;
    for &(feature, _) in NAMES {
      assert_eq!(feature.count(), 1);
      assert!(!seen.has(feature), "duplicate bit for {feature:?}");
      seen |= feature;
    }
  }

  #[test]
  fn sentinel_is_not_a_valid_set() {
    assert_ne!(Caps::from_bits_truncate(u32::MAX).bits(), u32::MAX);
    for &(feature, _) in NAMES {
      assert_eq!(Caps::from_bits_truncate(feature.bits()), feature);
    }
  }

  #[test]
  fn debug_lists_names() {
    assert_eq!(format!("{:?}", Caps::NONE), "Caps(none)");
    assert_eq!(format!("{:?}", x86::SSE2 | x86::AVX2), "Caps(sse2|avx2)");
    let names: Vec<_> = (aarch64::NEON | x86::SSE41).names().collect();
    assert_eq!(names, ["sse4.1", "neon"]);
  }
}
