//! Performance benchmarks for ske-crypto.
//!
//! Run with: `cargo bench -p ske-crypto`

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rand::RngCore;
use ske_crypto::envelope::{Envelope, Iv, decrypt, encrypt, encrypt_into, envelope_len};
use ske_crypto::keys::{DerivationKey, KeyPair};

const SIZES: [usize; 6] = [64, 256, 1024, 4096, 16384, 65536];

fn bench_keys() -> KeyPair {
    KeyPair::new([0x42u8; 32], [0x24u8; 32])
}

// ============================================================================
// Envelope Benchmarks
// ============================================================================

fn bench_encrypt(c: &mut Criterion) {
    let mut group = c.benchmark_group("envelope_encrypt");
    let keys = bench_keys();
    let iv = Iv::from_bytes([0u8; 16]);

    for size in SIZES {
        let plaintext = vec![0xAA; size];

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| encrypt(black_box(&plaintext), black_box(&keys), Some(&iv)))
        });
    }

    group.finish();
}

fn bench_encrypt_into(c: &mut Criterion) {
    let mut group = c.benchmark_group("envelope_encrypt_into");
    let keys = bench_keys();
    let iv = Iv::from_bytes([0u8; 16]);

    for size in SIZES {
        let plaintext = vec![0xAA; size];
        let mut out = vec![0u8; envelope_len(size)];

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| encrypt_into(black_box(&plaintext), &mut out, &keys, Some(&iv)))
        });
    }

    group.finish();
}

fn bench_decrypt(c: &mut Criterion) {
    let mut group = c.benchmark_group("envelope_decrypt");
    let keys = bench_keys();

    for size in SIZES {
        let mut plaintext = vec![0u8; size];
        rand::thread_rng().fill_bytes(&mut plaintext);
        let sealed = encrypt(&plaintext, &keys, None).unwrap();

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| decrypt(black_box(&sealed), black_box(&keys)))
        });
    }

    group.finish();
}

fn bench_verify_only(c: &mut Criterion) {
    let mut group = c.benchmark_group("envelope_verify");
    let keys = bench_keys();

    for size in SIZES {
        let sealed = encrypt(&vec![0xAA; size], &keys, None).unwrap();

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                Envelope::parse(black_box(&sealed))
                    .and_then(|envelope| envelope.verify(&keys))
                    .map(|verified| verified.plaintext_len())
            })
        });
    }

    group.finish();
}

// ============================================================================
// Key Benchmarks
// ============================================================================

fn bench_keys_generate(c: &mut Criterion) {
    c.bench_function("keys_generate", |b| b.iter(KeyPair::generate));
}

fn bench_keys_derive(c: &mut Criterion) {
    let secret = DerivationKey::new(vec![0x5Cu8; 32]).unwrap();
    let entropy = [0x36u8; 64];

    c.bench_function("keys_derive", |b| {
        b.iter(|| KeyPair::derive(black_box(&entropy), black_box(&secret)))
    });
}

criterion_group!(
    benches,
    bench_encrypt,
    bench_encrypt_into,
    bench_decrypt,
    bench_verify_only,
    bench_keys_generate,
    bench_keys_derive,
);
criterion_main!(benches);
