//! CPU capability detection for blake3-core.
//!
//! This crate is the **single source of truth** for which vector-instruction
//! tiers the current process may execute. Algorithm crates query [`caps()`]
//! instead of doing ad-hoc detection.
//!
//! # Main Entry Point
//!
//! ```
//! use platform::caps::x86;
//!
//! let caps = platform::caps();
//! if caps.has(x86::AVX512_READY) {
//!   // 16-lane kernels are legal here.
//! }
//! ```
//!
//! # Design
//!
//! 1. **Probe**: CPUID + XGETBV on x86, with extended-state gating. The raw
//!    instructions sit behind one small function; decoding is pure safe code.
//! 2. **Cache**: one atomic word with an "undefined" sentinel. First use probes,
//!    racing first users probe redundantly and store the same value.
//! 3. **Compile-time**: features enabled by `target_feature` are always
//!    included. On aarch64 that is the only source (no runtime probe).
//! 4. **Miri-safe**: under Miri, [`caps()`] returns [`Caps::NONE`].

#![no_std]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::indexing_slicing))]
#![deny(unsafe_code)]

#[cfg(feature = "std")]
extern crate std;

pub mod caps;
mod detect;

pub use caps::Caps;
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub use detect::x86::{CpuidReport, decode as decode_x86, read as read_x86};
pub use detect::{compile_time_caps, is_initialized, probe};

/// Detected CPU capabilities (cached).
///
/// The first call runs [`probe()`] and stores the result process-wide; later
/// calls are a single relaxed atomic load.
#[inline]
#[must_use]
pub fn caps() -> Caps {
  detect::get()
}
