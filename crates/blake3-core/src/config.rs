//! Runtime configuration (forced tier selection).
//!
//! `BLAKE3_CORE_FORCE` pins every operation to one tier, for benchmarking and
//! for reproducing tier-specific bugs:
//!
//! ```text
//! BLAKE3_CORE_FORCE=auto|portable|sse2|sse41|avx2|avx512|neon
//! ```
//!
//! The variable is read once per process. Unknown values mean `auto`.
//!
//! Safety note: a forced tier is always clamped to the detected CPU
//! capabilities and the build toggles. Forcing a tier the machine cannot run
//! falls back to `auto`, never to the forced kernel.

use backend::{Tier, Toggles};
use platform::Caps;

use crate::dispatch::BUILD;

/// Forced tier selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Blake3Force {
  /// Use the best tier the machine supports.
  #[default]
  Auto,
  Portable,
  Sse2,
  Sse41,
  Avx2,
  Avx512,
  Neon,
}

impl Blake3Force {
  #[must_use]
  pub const fn as_str(self) -> &'static str {
    match self.tier() {
      Some(tier) => tier.name(),
      None => "auto",
    }
  }

  /// The pinned tier, or `None` for [`Auto`](Self::Auto).
  #[must_use]
  pub const fn tier(self) -> Option<Tier> {
    match self {
      Self::Auto => None,
      Self::Portable => Some(Tier::Portable),
      Self::Sse2 => Some(Tier::Sse2),
      Self::Sse41 => Some(Tier::Sse41),
      Self::Avx2 => Some(Tier::Avx2),
      Self::Avx512 => Some(Tier::Avx512),
      Self::Neon => Some(Tier::Neon),
    }
  }

  #[must_use]
  pub const fn from_tier(tier: Tier) -> Self {
    match tier {
      Tier::Portable => Self::Portable,
      Tier::Sse2 => Self::Sse2,
      Tier::Sse41 => Self::Sse41,
      Tier::Avx2 => Self::Avx2,
      Tier::Avx512 => Self::Avx512,
      Tier::Neon => Self::Neon,
    }
  }
}

/// Effective configuration (after clamping overrides).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Blake3Config {
  /// Force mode as written in the environment.
  pub requested_force: Blake3Force,
  /// Force mode clamped to detected CPU capabilities.
  pub effective_force: Blake3Force,
  /// Tiers dispatch may use.
  pub toggles: Toggles,
}

/// Parse a force value. `None` for empty or unrecognised input.
#[must_use]
pub fn parse_force(value: &str) -> Option<Blake3Force> {
  let value = value.trim();
  if value.is_empty() {
    return None;
  }
  if value.eq_ignore_ascii_case("auto") {
    return Some(Blake3Force::Auto);
  }
  if value.eq_ignore_ascii_case("scalar") {
    return Some(Blake3Force::Portable);
  }
  Tier::from_name(value).map(Blake3Force::from_tier)
}

#[cfg(feature = "std")]
fn read_env_force() -> Blake3Force {
  force_from_var(std::env::var("BLAKE3_CORE_FORCE"))
}

/// Interpret the result of reading `BLAKE3_CORE_FORCE`. Anything unusable
/// falls back to auto; set but unusable values are logged.
#[cfg(feature = "std")]
fn force_from_var(var: Result<std::string::String, std::env::VarError>) -> Blake3Force {
  use std::env::VarError;

  let value = match var {
    Ok(value) => value,
    Err(VarError::NotPresent) => return Blake3Force::Auto,
    Err(VarError::NotUnicode(_raw)) => {
      #[cfg(feature = "tracing")]
      tracing::warn!(value = ?_raw, "BLAKE3_CORE_FORCE is not valid UTF-8, using auto");
      return Blake3Force::Auto;
    }
  };
  match parse_force(&value) {
    Some(force) => force,
    None => {
      #[cfg(feature = "tracing")]
      if !value.trim().is_empty() {
        tracing::warn!(value = %value, "unrecognised BLAKE3_CORE_FORCE, using auto");
      }
      Blake3Force::Auto
    }
  }
}

#[cfg(feature = "std")]
fn requested_force() -> Blake3Force {
  use std::sync::OnceLock;
  static FORCE: OnceLock<Blake3Force> = OnceLock::new();
  *FORCE.get_or_init(|| {
    let force = read_env_force();
    #[cfg(feature = "tracing")]
    {
      let config = resolve(force, platform::caps());
      tracing::debug!(
        requested = config.requested_force.as_str(),
        effective = config.effective_force.as_str(),
        toggles = ?config.toggles,
        "blake3-core configuration resolved"
      );
    }
    force
  })
}

#[cfg(not(feature = "std"))]
fn requested_force() -> Blake3Force {
  Blake3Force::Auto
}

#[inline]
#[must_use]
fn clamp_force_to_caps(requested: Blake3Force, caps: Caps) -> Blake3Force {
  match requested.tier() {
    Some(tier) if BUILD.allows(tier) && caps.has(tier.caps()) => requested,
    _ => Blake3Force::Auto,
  }
}

/// Configuration for `requested` on a machine with `caps`.
#[must_use]
pub fn resolve(requested: Blake3Force, caps: Caps) -> Blake3Config {
  let effective_force = clamp_force_to_caps(requested, caps);
  let toggles = match effective_force.tier() {
    Some(tier) => Toggles::only(tier),
    None => Toggles::ALL,
  };
  Blake3Config {
    requested_force: requested,
    effective_force,
    toggles,
  }
}

/// The effective configuration for this process.
#[inline]
#[must_use]
pub fn get() -> Blake3Config {
  resolve(requested_force(), platform::caps())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_is_trimmed_and_case_insensitive() {
    assert_eq!(parse_force(" AUTO "), Some(Blake3Force::Auto));
    assert_eq!(parse_force("Portable"), Some(Blake3Force::Portable));
    assert_eq!(parse_force("scalar"), Some(Blake3Force::Portable));
    assert_eq!(parse_force("sse4.1"), Some(Blake3Force::Sse41));
    assert_eq!(parse_force("AVX512\n"), Some(Blake3Force::Avx512));
    assert_eq!(parse_force("neon"), Some(Blake3Force::Neon));
  }

  #[test]
  fn parse_rejects_empty_and_unknown() {
    assert_eq!(parse_force(""), None);
    assert_eq!(parse_force("   "), None);
    assert_eq!(parse_force("avx"), None);
    assert_eq!(parse_force("fastest"), None);
  }

  #[test]
  fn names_round_trip() {
    for tier in Tier::ALL {
      let force = Blake3Force::from_tier(tier);
      assert_eq!(force.tier(), Some(tier));
      assert_eq!(parse_force(force.as_str()), Some(force));
    }
    assert_eq!(Blake3Force::Auto.as_str(), "auto");
  }

  #[test]
  fn portable_force_always_applies() {
    let config = resolve(Blake3Force::Portable, Caps::NONE);
    assert_eq!(config.effective_force, Blake3Force::Portable);
    assert_eq!(config.toggles, Toggles::PORTABLE_ONLY);
  }

  #[test]
  fn missing_hardware_falls_back_to_auto() {
    for force in [Blake3Force::Sse2, Blake3Force::Avx2, Blake3Force::Avx512, Blake3Force::Neon] {
      let config = resolve(force, Caps::NONE);
      assert_eq!(config.requested_force, force);
      assert_eq!(config.effective_force, Blake3Force::Auto);
      assert_eq!(config.toggles, Toggles::ALL);
    }
  }

  #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
  #[test]
  fn supported_force_pins_one_tier() {
    use platform::caps::x86;

    let caps = x86::SSE2.union(x86::SSE41).union(x86::AVX2);
    let config = resolve(Blake3Force::Avx2, caps);
    if BUILD.allows(Tier::Avx2) {
      assert_eq!(config.effective_force, Blake3Force::Avx2);
      assert_eq!(config.toggles, Toggles::only(Tier::Avx2));
    } else {
      assert_eq!(config.effective_force, Blake3Force::Auto);
    }

    // AVX-512 needs both F and VL.
    let config = resolve(Blake3Force::Avx512, caps.union(x86::AVX512F));
    assert_eq!(config.effective_force, Blake3Force::Auto);
  }

  #[test]
  fn auto_enables_everything() {
    let config = resolve(Blake3Force::Auto, platform::caps());
    assert_eq!(config.effective_force, Blake3Force::Auto);
    assert_eq!(config.toggles, Toggles::ALL);
  }

  #[cfg(all(feature = "std", unix))]
  #[test]
  fn non_utf8_env_value_falls_back_to_auto() {
    use std::{env::VarError, ffi::OsString, os::unix::ffi::OsStringExt};

    let raw = OsString::from_vec(std::vec![b'a', b'v', b'x', 0xFF]);
    assert_eq!(force_from_var(Err(VarError::NotUnicode(raw))), Blake3Force::Auto);
  }

  #[cfg(feature = "std")]
  #[test]
  fn env_var_result_is_parsed() {
    use std::{env::VarError, string::ToString};

    assert_eq!(force_from_var(Err(VarError::NotPresent)), Blake3Force::Auto);
    assert_eq!(force_from_var(Ok(" Portable ".to_string())), Blake3Force::Portable);
    assert_eq!(force_from_var(Ok("sse41".to_string())), Blake3Force::Sse41);
    assert_eq!(force_from_var(Ok("bogus".to_string())), Blake3Force::Auto);
    assert_eq!(force_from_var(Ok(std::string::String::new())), Blake3Force::Auto);
  }
}
