//! Backend crate: kernel selection primitives for blake3-core.
//!
//! - **Dispatch**: ordered candidate lists scanned against a capability set
//! - **Tiers**: named vector-instruction tiers and the toggles that disable them
//!
//! # Usage
//!
//! Algorithm crates register kernels as an ordered list of `Candidate`s, best
//! first, with a `Caps::NONE` fallback last:
//!
//! ```ignore
//! use backend::{Candidate, Tier, Toggles, select};
//! use platform::caps::{Caps, x86};
//!
//! const COMPRESS: &[Candidate<CompressFn>] = &[
//!   Candidate::new("x86/sse41", Tier::Sse41, x86::SSE41, sse41::compress),
//!   Candidate::new("portable", Tier::Portable, Caps::NONE, portable::compress),
//! ];
//!
//! let caps = Toggles::ALL.restrict(platform::caps());
//! let selected = select(caps, COMPRESS);
//! ```

// Fallibility discipline: deny unwrap/expect in production, allow in tests.
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::indexing_slicing))]
#![forbid(unsafe_code)]
#![no_std]

#[cfg(feature = "std")]
extern crate std;

pub mod dispatch;
pub mod tier;

pub use dispatch::{Candidate, Selected, select, try_select};
// Re-export platform types for convenience.
pub use platform;
pub use platform::Caps;
pub use tier::{Tier, Toggles};
