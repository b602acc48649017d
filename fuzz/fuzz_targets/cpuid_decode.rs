//! Fuzz target for the CPUID/XGETBV decoder.
//!
//! Tests that:
//! - AVX-class bits never appear without OS-enabled extended state
//! - AVX-512 bits never appear without the opmask/ZMM state components
//! - the dispatch chains never pick a tier whose bits were not decoded

#![no_main]

use blake3_core::{Tier, Toggles, compress_tier, hash_many_tier};
use libfuzzer_sys::fuzz_target;
use platform::{CpuidReport, caps::x86, decode_x86};

fuzz_target!(|input: (u32, u32, u32, u32, u64, bool)| {
  let (max_leaf, leaf1_ecx, leaf1_edx, leaf7_ebx, xcr0, long_mode) = input;
  let report = CpuidReport {
    max_leaf,
    leaf1_ecx,
    leaf1_edx,
    leaf7_ebx,
    xcr0,
  };
  let caps = decode_x86(&report, long_mode);

  let osxsave = leaf1_ecx & (1 << 27) != 0;
  let os_avx = osxsave && xcr0 & 0b110 == 0b110;
  let os_avx512 = os_avx && xcr0 & 0xE0 == 0xE0;

  let avx_class = x86::AVX | x86::AVX2 | x86::AVX512F | x86::AVX512VL;
  if !os_avx {
    assert!(caps.intersection(avx_class).is_empty(), "{caps:?} without OS AVX state");
  }
  if !os_avx512 {
    assert!(caps.intersection(x86::AVX512_READY).is_empty(), "{caps:?} without OS AVX-512 state");
  }
  if max_leaf < 7 {
    assert!(!caps.has(x86::AVX2), "leaf 7 bit used below max leaf 7");
  }
  assert_eq!(caps.has(x86::SSE2), long_mode || leaf1_edx & (1 << 26) != 0);

  // ─── Invariant: selection stays inside the decoded set ───
  for tier in [compress_tier(caps, Toggles::ALL), hash_many_tier(caps, Toggles::ALL)] {
    if tier != Tier::Portable {
      assert!(caps.intersection(tier.caps()).count() > 0, "{tier} picked from {caps:?}");
    }
  }
  assert!(caps.has(hash_many_tier(caps, Toggles::ALL).caps()));
});
