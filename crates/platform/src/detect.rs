//! Capability probe and process-wide cache.
//!
//! The cache is one `AtomicU32` holding either [`UNDEFINED`] or the bits of a
//! probed [`Caps`]. It has exactly one transition, `UNDEFINED -> probed`, and
//! every thread that makes it writes the same value because the probe is a pure
//! function of fixed hardware. So there is no lock and no compare-exchange:
//! racing first readers may each probe once, and the stores are idempotent.
//!
//! `Relaxed` ordering is sufficient: the cached word carries no payload
//! published elsewhere, and atomicity alone rules out torn reads.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::caps::Caps;

#[cfg(any(target_arch = "x86", target_arch = "x86_64", test))]
pub mod x86;


/// Sentinel for "not yet probed". Never a valid capability word.
pub(crate) const UNDEFINED: u32 = u32::MAX;

static CACHE: AtomicU32 = AtomicU32::new(UNDEFINED);

/// Features the build already guarantees through `target_feature`.
#[must_use]
pub const fn compile_time_caps() -> Caps {
  #[allow(unused_mut)]
  let mut caps = Caps::NONE;

  #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
  {
    use crate::caps::x86;
    if cfg!(target_feature = "sse2") {
      caps = caps.union(x86::SSE2);
    }
    if cfg!(target_feature = "ssse3") {
      caps = caps.union(x86::SSSE3);
    }
    if cfg!(target_feature = "sse4.1") {
      caps = caps.union(x86::SSE41);
    }
    if cfg!(target_feature = "avx") {
      caps = caps.union(x86::AVX);
    }
    if cfg!(target_feature = "avx2") {
      caps = caps.union(x86::AVX2);
    }
    if cfg!(target_feature = "avx512f") {
      caps = caps.union(x86::AVX512F);
    }
    if cfg!(target_feature = "avx512vl") {
      caps = caps.union(x86::AVX512VL);
    }
  }

  // No runtime probe exists for NEON; the build configuration is the only
  // source of truth.
  #[cfg(target_arch = "aarch64")]
  if cfg!(target_feature = "neon") {
    caps = caps.union(crate::caps::aarch64::NEON);
  }

  caps
}

/// Run the capability probe, bypassing the cache.
///
/// Idempotent and deterministic on fixed hardware. Architectures without a
/// defined runtime probe report only [`compile_time_caps()`].
#[must_use]
pub fn probe() -> Caps {
  #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
  {
    let runtime = x86::decode(&x86::read(), cfg!(target_arch = "x86_64"));
    compile_time_caps().union(runtime)
  }

  #[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
  {
    compile_time_caps()
  }
}

/// Cached capabilities, probing on first use.
#[inline]
#[must_use]
pub fn get() -> Caps {
  if cfg!(miri) {
    return Caps::NONE;
  }

  let bits = CACHE.load(Ordering::Relaxed);
  if bits != UNDEFINED {
    return Caps::from_bits_truncate(bits);
  }
  probe_and_store()
}

#[cold]
#[inline(never)]
fn probe_and_store() -> Caps {
  let caps = probe();
  CACHE.store(caps.bits(), Ordering::Relaxed);

  #[cfg(feature = "tracing")]
  tracing::debug!(caps = ?caps, "cpu capabilities probed");

  caps
}

/// Whether a probed value has been stored.
#[inline]
#[must_use]
pub fn is_initialized() -> bool {
  CACHE.load(Ordering::Relaxed) != UNDEFINED
}
