//! Differential fuzzing of the dispatched kernels.
//!
//! Every tier the host can run must agree with the portable path, and a
//! single-chunk hash built from the dispatched operations must agree with the
//! official `blake3` crate.

#![no_main]

use blake3_core::{BLOCK_LEN, Dispatch, IV, IncrementCounter, OUT_LEN, Tier, Toggles, flags};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
  let Some((header, body)) = data.split_first_chunk::<9>() else {
    return;
  };
  let counter = u64::from_le_bytes(header[..8].try_into().unwrap());
  let block_flags = header[8];

  test_tiers_agree(body, counter, block_flags);
  test_single_chunk(body);
});

fn tiers() -> impl Iterator<Item = Dispatch> {
  let current = Dispatch::current();
  Tier::ALL
    .into_iter()
    .map(move |tier| current.restricted(Toggles::only(tier)))
}

fn test_tiers_agree(body: &[u8], counter: u64, block_flags: u8) {
  let mut block = [0u8; BLOCK_LEN];
  let len = body.len().min(BLOCK_LEN);
  block[..len].copy_from_slice(&body[..len]);

  let portable = Dispatch::portable();
  let expected_xof = portable.compress_xof(&IV, &block, len as u8, counter, block_flags);
  let mut expected_many = [[0u8; 2 * OUT_LEN]; 19];
  portable.xof_many(&IV, &block, len as u8, counter, block_flags, &mut expected_many);

  let (inputs, _) = body.as_chunks::<BLOCK_LEN>();
  let refs: Vec<&[u8; BLOCK_LEN]> = inputs.iter().collect();
  let mut expected_cvs = vec![[0u8; OUT_LEN]; refs.len()];
  portable.hash_many(&refs, &IV, counter, IncrementCounter::Yes, block_flags, 1, 2, &mut expected_cvs);

  for d in tiers() {
    assert_eq!(d.compress_xof(&IV, &block, len as u8, counter, block_flags), expected_xof, "{:?}", d);

    let mut many = [[0u8; 2 * OUT_LEN]; 19];
    d.xof_many(&IV, &block, len as u8, counter, block_flags, &mut many);
    assert_eq!(many, expected_many, "{:?}", d);

    let mut cvs = vec![[0u8; OUT_LEN]; refs.len()];
    d.hash_many(&refs, &IV, counter, IncrementCounter::Yes, block_flags, 1, 2, &mut cvs);
    assert_eq!(cvs, expected_cvs, "{:?}", d);
  }
}

fn test_single_chunk(body: &[u8]) {
  let chunk = &body[..body.len().min(1024)];

  let mut cv = IV;
  let mut blocks = chunk.chunks(BLOCK_LEN).peekable();
  let mut start = flags::CHUNK_START;
  let mut last = [0u8; BLOCK_LEN];
  let mut last_len = 0usize;
  while let Some(block) = blocks.next() {
    if blocks.peek().is_none() {
      last[..block.len()].copy_from_slice(block);
      last_len = block.len();
      break;
    }
    blake3_core::compress_in_place(&mut cv, block.try_into().unwrap(), BLOCK_LEN as u8, 0, start);
    start = 0;
  }

  let out = blake3_core::compress_xof(&cv, &last, last_len as u8, 0, start | flags::CHUNK_END | flags::ROOT);
  assert_eq!(&out[..OUT_LEN], blake3::hash(chunk).as_bytes(), "len={}", chunk.len());
}
