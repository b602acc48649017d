//! Selection diagnostics.
//!
//! Reports which kernel each operation resolves to in this process, and why.
//! Intended for bug reports and CI logs:
//!
//! ```
//! let diag = blake3_core::diag::selection();
//! assert!(diag.simd_degree >= 1);
//! ```

use backend::{Toggles, select, try_select};
use platform::Caps;

use crate::{
  config::{self, Blake3Force},
  dispatch::{COMPRESS_IN_PLACE, COMPRESS_XOF, Dispatch, HASH_MANY, XOF_MANY},
};

/// Kernel choices for the current process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SelectionDiag {
  /// Capabilities reported by the probe, before any restriction.
  pub detected: Caps,
  /// Capabilities dispatch actually runs against.
  pub effective: Caps,
  pub toggles: Toggles,
  pub requested_force: Blake3Force,
  pub effective_force: Blake3Force,
  pub compress_in_place: &'static str,
  pub compress_xof: &'static str,
  /// `None` when `xof_many` loops over `compress_xof`.
  pub xof_many: Option<&'static str>,
  pub hash_many: &'static str,
  pub simd_degree: usize,
}

/// Resolve every operation against the current dispatch state.
#[must_use]
pub fn selection() -> SelectionDiag {
  let config = config::get();
  let dispatch = Dispatch::current();
  let caps = dispatch.caps();

  SelectionDiag {
    detected: platform::caps(),
    effective: caps,
    toggles: config.toggles,
    requested_force: config.requested_force,
    effective_force: config.effective_force,
    compress_in_place: select(caps, COMPRESS_IN_PLACE).name,
    compress_xof: select(caps, COMPRESS_XOF).name,
    xof_many: try_select(caps, XOF_MANY).map(|kernel| kernel.name),
    hash_many: select(caps, HASH_MANY).name,
    simd_degree: dispatch.simd_degree(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn selection_is_consistent_with_dispatch() {
    let diag = selection();
    let dispatch = Dispatch::current();
    assert!(diag.detected.has(diag.effective));
    assert_eq!(diag.simd_degree, dispatch.simd_degree());
    assert_eq!(diag.compress_in_place, diag.compress_xof);
    assert!(diag.hash_many.ends_with(dispatch.hash_many_tier().name()));
  }
}
