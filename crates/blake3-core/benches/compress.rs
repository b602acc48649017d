use std::hint::black_box;

use blake3_core::{BLOCK_LEN, Dispatch, IV, IncrementCounter, OUT_LEN, Tier, Toggles, flags};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

const CHUNK_LEN: usize = 1024;

/// Dispatch pinned to each tier the host can run, portable first.
fn tiers() -> Vec<(Tier, Dispatch)> {
  let current = Dispatch::current();
  let mut out = vec![(Tier::Portable, Dispatch::portable())];
  for tier in [Tier::Sse2, Tier::Sse41, Tier::Avx2, Tier::Avx512, Tier::Neon] {
    let d = current.restricted(Toggles::only(tier));
    if d.hash_many_tier() == tier {
      out.push((tier, d));
    }
  }
  out
}

fn block() -> [u8; BLOCK_LEN] {
  core::array::from_fn(|i| (i as u8).wrapping_mul(31).wrapping_add(7))
}

fn single_block(c: &mut Criterion) {
  let block = block();
  let mut group = c.benchmark_group("blake3-core/compress");
  group.throughput(Throughput::Bytes(BLOCK_LEN as u64));

  for (tier, d) in tiers() {
    group.bench_function(BenchmarkId::new("in_place", tier), |b| {
      b.iter(|| {
        let mut cv = IV;
        d.compress_in_place(&mut cv, black_box(&block), 64, 0, flags::CHUNK_START);
        black_box(cv)
      })
    });
    group.bench_function(BenchmarkId::new("xof", tier), |b| {
      b.iter(|| black_box(d.compress_xof(&IV, black_box(&block), 64, 0, flags::ROOT)))
    });
  }

  group.finish();
}

fn xof_many(c: &mut Criterion) {
  let block = block();
  let mut group = c.benchmark_group("blake3-core/xof_many");

  for blocks in [1usize, 16, 64] {
    group.throughput(Throughput::Bytes((blocks * 2 * OUT_LEN) as u64));
    for (tier, d) in tiers() {
      let mut out = vec![[0u8; 2 * OUT_LEN]; blocks];
      group.bench_function(BenchmarkId::new(tier.name(), blocks), |b| {
        b.iter(|| {
          d.xof_many(&IV, black_box(&block), 64, 0, flags::ROOT, &mut out);
          black_box(&out);
        })
      });
    }
  }

  group.finish();
}

fn hash_many(c: &mut Criterion) {
  let chunks: Vec<[u8; CHUNK_LEN]> = (0..64)
    .map(|i| core::array::from_fn(|j| ((i * 7 + j) % 251) as u8))
    .collect();
  let mut group = c.benchmark_group("blake3-core/hash_many");

  for count in [1usize, 4, 8, 16, 64] {
    let refs: Vec<&[u8; CHUNK_LEN]> = chunks.iter().take(count).collect();
    group.throughput(Throughput::Bytes((count * CHUNK_LEN) as u64));
    for (tier, d) in tiers() {
      let mut out = vec![[0u8; OUT_LEN]; count];
      group.bench_function(BenchmarkId::new(tier.name(), count), |b| {
        b.iter(|| {
          d.hash_many(
            black_box(&refs),
            &IV,
            0,
            IncrementCounter::Yes,
            0,
            flags::CHUNK_START,
            flags::CHUNK_END,
            &mut out,
          );
          black_box(&out);
        })
      });
    }
  }

  group.finish();
}

criterion_group!(benches, single_block, xof_many, hash_many);
criterion_main!(benches);
