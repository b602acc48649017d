//! Kernel selection.
//!
//! - [`Candidate`]: a kernel with capability requirements
//! - [`Selected`]: the result of kernel selection
//! - [`select`] / [`try_select`]: choose the best kernel from a candidate list
//!
//! Lists are ordered best first. Selection is a linear scan that returns the
//! first candidate whose requirements are a subset of the given capabilities,
//! so a list ending in a `Caps::NONE` fallback always selects something.
//!
//! Selection never consults the cache itself: callers pass the (possibly
//! restricted) capability set, which keeps every choice a pure function of its
//! inputs and lets tests drive it with synthetic sets.

use platform::Caps;

use crate::tier::Tier;

// ─────────────────────────────────────────────────────────────────────────────
// Core Types
// ─────────────────────────────────────────────────────────────────────────────

/// A candidate kernel with capability requirements.
///
/// `requires` may be narrower than `tier.caps()`: a single-block kernel can
/// need only part of what the tier's wide kernels need.
#[derive(Clone, Copy, Debug)]
pub struct Candidate<F> {
  /// Human-readable name for diagnostics (e.g., "x86/avx512vl").
  pub name: &'static str,
  /// Tier the kernel belongs to.
  pub tier: Tier,
  /// Required CPU capabilities. Must be a subset of the detected set.
  pub requires: Caps,
  /// The kernel function pointer.
  pub func: F,
}

impl<F> Candidate<F> {
  #[inline]
  #[must_use]
  pub const fn new(name: &'static str, tier: Tier, requires: Caps, func: F) -> Self {
    Self {
      name,
      tier,
      requires,
      func,
    }
  }
}

/// The result of kernel selection.
#[derive(Clone, Copy, Debug)]
pub struct Selected<F> {
  /// Human-readable name of the selected kernel.
  pub name: &'static str,
  pub tier: Tier,
  /// The selected kernel function.
  pub func: F,
}

impl<F: Copy> From<&Candidate<F>> for Selected<F> {
  #[inline]
  fn from(candidate: &Candidate<F>) -> Self {
    Self {
      name: candidate.name,
      tier: candidate.tier,
      func: candidate.func,
    }
  }
}

/// Select the first candidate whose requirements `caps` satisfies.
///
/// Returns `None` when nothing matches, which only happens for lists without a
/// `Caps::NONE` fallback.
#[inline]
#[must_use]
pub fn try_select<F: Copy>(caps: Caps, candidates: &[Candidate<F>]) -> Option<Selected<F>> {
  candidates
    .iter()
    .find(|candidate| caps.has(candidate.requires))
    .map(Selected::from)
}

/// Select the best kernel from a candidate list.
///
/// # Panics
///
/// Panics if no candidate matches. Every list passed here must end with a
/// `Caps::NONE` fallback, which makes this unreachable.
#[inline]
#[must_use]
pub fn select<F: Copy>(caps: Caps, candidates: &[Candidate<F>]) -> Selected<F> {
  match try_select(caps, candidates) {
    Some(selected) => selected,
    None => panic!("no matching kernel: candidate list must end with a portable fallback"),
  }
}
