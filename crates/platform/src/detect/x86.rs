//! x86/x86_64 capability probe.
//!
//! Split in two halves:
//!
//! - [`read()`]: the raw boundary. Issues CPUID and XGETBV and returns the
//!   register words untouched. This is the only `unsafe` in the crate.
//! - [`decode()`]: pure bit decoding over a [`CpuidReport`]. Safe, `const`,
//!   and testable with synthetic reports on any host.
//!
//! CPUID reports what the CPU implements, not what the OS allows. AVX-class
//! bits are only trusted after XCR0 confirms the OS saves the matching
//! register state; using them without that check faults.

use crate::caps::{Caps, x86};

// Leaf 1 EDX
const EDX_SSE2: u32 = 1 << 26;
// Leaf 1 ECX
const ECX_SSSE3: u32 = 1 << 9;
const ECX_SSE41: u32 = 1 << 19;
const ECX_OSXSAVE: u32 = 1 << 27;
const ECX_AVX: u32 = 1 << 28;
// Leaf 7 (sub-leaf 0) EBX
const EBX7_AVX2: u32 = 1 << 5;
const EBX7_AVX512F: u32 = 1 << 16;
const EBX7_AVX512VL: u32 = 1 << 31;

/// XCR0 bits 1-2: XMM + YMM state.
const XCR0_AVX_MASK: u64 = 0x6;
/// XCR0 bits 5-7: opmask + ZMM_Hi256 + Hi16_ZMM state.
const XCR0_AVX512_MASK: u64 = 0xE0;

/// Raw register words the decoder needs.
///
/// `leaf7_ebx` is zero when `max_leaf < 7`; `xcr0` is zero when OSXSAVE is
/// clear (XGETBV is not executed in that case).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CpuidReport {
  /// Leaf 0 EAX: highest supported standard leaf.
  pub max_leaf: u32,
  pub leaf1_ecx: u32,
  pub leaf1_edx: u32,
  pub leaf7_ebx: u32,
  /// Extended-state enable mask (`XGETBV(0)`).
  pub xcr0: u64,
}

/// Decode a report into a capability set.
///
/// `long_mode` is true on x86_64, where SSE2 is architectural.
#[must_use]
pub const fn decode(report: &CpuidReport, long_mode: bool) -> Caps {
  let mut caps = Caps::NONE;

  if long_mode || report.leaf1_edx & EDX_SSE2 != 0 {
    caps = caps.union(x86::SSE2);
  }
  if report.leaf1_ecx & ECX_SSSE3 != 0 {
    caps = caps.union(x86::SSSE3);
  }
  if report.leaf1_ecx & ECX_SSE41 != 0 {
    caps = caps.union(x86::SSE41);
  }

  // Without OSXSAVE the OS has not enabled extended state: stop here.
  if report.leaf1_ecx & ECX_OSXSAVE == 0 {
    return caps;
  }

  let os_avx = (report.xcr0 & XCR0_AVX_MASK) == XCR0_AVX_MASK;
  if !os_avx {
    return caps;
  }

  if report.leaf1_ecx & ECX_AVX != 0 {
    caps = caps.union(x86::AVX);
  }

  if report.max_leaf < 7 {
    return caps;
  }

  // AVX2 only needs the YMM state; the AVX bit itself is not consulted.
  if report.leaf7_ebx & EBX7_AVX2 != 0 {
    caps = caps.union(x86::AVX2);
  }

  let os_avx512 = (report.xcr0 & XCR0_AVX512_MASK) == XCR0_AVX512_MASK;
  if os_avx512 {
    if report.leaf7_ebx & EBX7_AVX512VL != 0 {
      caps = caps.union(x86::AVX512VL);
    }
    if report.leaf7_ebx & EBX7_AVX512F != 0 {
      caps = caps.union(x86::AVX512F);
    }
  }

  caps
}

/// Read the raw CPUID/XGETBV words from the executing CPU.
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
#[allow(unsafe_code, unused_unsafe)]
#[must_use]
pub fn read() -> CpuidReport {
  #[cfg(target_arch = "x86")]
  use core::arch::x86::{__cpuid, __cpuid_count, _xgetbv};
  #[cfg(target_arch = "x86_64")]
  use core::arch::x86_64::{__cpuid, __cpuid_count, _xgetbv};

  // SAFETY: every x86 target Rust supports implements CPUID, and it has no
  // side effects beyond writing its output registers.
  let leaf0 = unsafe { __cpuid(0) };
  // SAFETY: as above; leaf 1 exists on every CPUID-capable processor.
  let leaf1 = unsafe { __cpuid(1) };

  let leaf7_ebx = if leaf0.eax >= 7 {
    // SAFETY: leaf 7 is within the reported maximum leaf.
    let leaf7 = unsafe { __cpuid_count(7, 0) };
    leaf7.ebx
  } else {
    0
  };

  let xcr0 = if leaf1.ecx & ECX_OSXSAVE != 0 {
    // SAFETY: OSXSAVE is set, so the OS has enabled XGETBV.
    unsafe { _xgetbv(0) }
  } else {
    0
  };

  CpuidReport {
    max_leaf: leaf0.eax,
    leaf1_ecx: leaf1.ecx,
    leaf1_edx: leaf1.edx,
    leaf7_ebx,
    xcr0,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  /// A Skylake-X style report: everything present and enabled.
  const FULL: CpuidReport = CpuidReport {
    max_leaf: 0x16,
    leaf1_ecx: ECX_SSSE3 | ECX_SSE41 | ECX_OSXSAVE | ECX_AVX,
    leaf1_edx: EDX_SSE2,
    leaf7_ebx: EBX7_AVX2 | EBX7_AVX512F | EBX7_AVX512VL,
    xcr0: 0xE7,
  };

  #[test]
  fn full_report_decodes_every_tier() {
    let caps = decode(&FULL, true);
    assert!(caps.has(x86::SSE2 | x86::SSSE3 | x86::SSE41 | x86::AVX | x86::AVX2 | x86::AVX512_READY));
  }

  #[test]
  fn empty_report() {
    assert_eq!(decode(&CpuidReport::default(), false), Caps::NONE);
    assert_eq!(decode(&CpuidReport::default(), true), x86::SSE2);
  }

  #[test]
  fn sse2_from_edx_only_outside_long_mode() {
    let report = CpuidReport {
      leaf1_edx: 0,
      ..FULL
    };
    assert!(!decode(&report, false).has(x86::SSE2));
    assert!(decode(&report, true).has(x86::SSE2));
    assert!(decode(&FULL, false).has(x86::SSE2));
  }

  #[test]
  fn no_osxsave_hides_avx_family() {
    // Hardware bits set, XCR0 even claims full state: without OSXSAVE none of
    // it may be trusted.
    let report = CpuidReport {
      leaf1_ecx: FULL.leaf1_ecx & !ECX_OSXSAVE,
      ..FULL
    };
    let caps = decode(&report, true);
    assert!(caps.has(x86::SSE2 | x86::SSSE3 | x86::SSE41));
    assert!(!caps.has(x86::AVX));
    assert!(!caps.has(x86::AVX2));
    assert!(!caps.has(x86::AVX512F));
    assert!(!caps.has(x86::AVX512VL));
  }

  #[test]
  fn partial_ymm_state_hides_avx_family() {
    for xcr0 in [0x0, 0x1, 0x2, 0x4, 0x5, 0xE1, 0xE3, 0xE5] {
      let caps = decode(&CpuidReport { xcr0, ..FULL }, true);
      assert!(!caps.has(x86::AVX), "xcr0={xcr0:#x}");
      assert!(!caps.has(x86::AVX2), "xcr0={xcr0:#x}");
      assert!(!caps.has(x86::AVX512F), "xcr0={xcr0:#x}");
      assert!(!caps.has(x86::AVX512VL), "xcr0={xcr0:#x}");
    }
  }

  #[test]
  fn partial_zmm_state_hides_avx512_only() {
    for xcr0 in [0x07, 0x27, 0x47, 0x87, 0x67, 0xA7, 0xC7] {
      let caps = decode(&CpuidReport { xcr0, ..FULL }, true);
      assert!(caps.has(x86::AVX | x86::AVX2), "xcr0={xcr0:#x}");
      assert!(!caps.has(x86::AVX512F), "xcr0={xcr0:#x}");
      assert!(!caps.has(x86::AVX512VL), "xcr0={xcr0:#x}");
    }
  }

  #[test]
  fn avx2_does_not_require_the_avx_bit() {
    let report = CpuidReport {
      leaf1_ecx: FULL.leaf1_ecx & !ECX_AVX,
      ..FULL
    };
    let caps = decode(&report, true);
    assert!(!caps.has(x86::AVX));
    assert!(caps.has(x86::AVX2));
  }

  #[test]
  fn low_max_leaf_ignores_leaf7() {
    let report = CpuidReport { max_leaf: 6, ..FULL };
    let caps = decode(&report, true);
    assert!(caps.has(x86::AVX));
    assert!(!caps.has(x86::AVX2));
    assert!(!caps.has(x86::AVX512F));
  }

  #[test]
  fn avx512_bits_decode_independently() {
    let vl_only = CpuidReport {
      leaf7_ebx: EBX7_AVX2 | EBX7_AVX512VL,
      ..FULL
    };
    let caps = decode(&vl_only, true);
    assert!(caps.has(x86::AVX512VL));
    assert!(!caps.has(x86::AVX512F));
    assert!(!caps.has(x86::AVX512_READY));
  }

  #[test]
  fn decode_is_deterministic_across_threads() {
    extern crate std;
    use std::{thread, vec::Vec};

    let reports = [
      FULL,
      CpuidReport::default(),
      CpuidReport { xcr0: 0x7, ..FULL },
      CpuidReport {
        leaf1_ecx: 0,
        ..FULL
      },
    ];
    for report in reports {
      let expected = decode(&report, true);
      let handles: Vec<_> = (0..8).map(|_| thread::spawn(move || decode(&report, true))).collect();
      for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
      }
    }
  }

  #[test]
  #[cfg(all(any(target_arch = "x86", target_arch = "x86_64"), not(miri)))]
  fn live_read_decodes_consistently() {
    let a = read();
    let b = read();
    assert_eq!(a, b);
    let caps = decode(&a, cfg!(target_arch = "x86_64"));

    extern crate std;
    assert_eq!(caps.has(x86::SSE41), std::is_x86_feature_detected!("sse4.1"));
    assert_eq!(caps.has(x86::AVX2), std::is_x86_feature_detected!("avx2"));
  }

  #[test]
  #[cfg(all(any(target_arch = "x86", target_arch = "x86_64"), not(miri)))]
  fn live_read_always_issues_cpuid() {
    let report = read();
    assert!(report.max_leaf >= 1, "leaf 0 not read: {report:?}");

    // Outside long mode SSE2 comes from leaf-1 EDX alone.
    extern crate std;
    let caps = decode(&report, false);
    assert_eq!(caps.has(x86::SSE2), std::is_x86_feature_detected!("sse2"));
  }
}
