use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;
use shardvault::key::{KeyConfig, KeyOperation};
use shardvault::sss::{combine_shares, split_secret, ShamirSharer};
use shardvault::transform::{conceal, reveal};

fn cluster_key(nodes: usize) -> shardvault::key::ConcealKey {
    KeyConfig::DeriveClusterKey {
        operation: KeyOperation::Store,
        threshold: None,
    }
    .resolve(nodes)
    .unwrap()
}

fn bench_split_secret(c: &mut Criterion) {
    c.bench_function("split_secret", |b| {
        let secret = b"this is a very secret message";
        let threshold = 5;
        let shares = 10;
        b.iter(|| split_secret(black_box(secret), black_box(threshold), black_box(shares)))
    });
}

fn bench_combine_shares(c: &mut Criterion) {
    c.bench_function("combine_shares", |b| {
        let secret = b"this is a very secret message";
        let shares = split_secret(secret, 5, 10).unwrap();
        b.iter(|| combine_shares(black_box(&shares)))
    });
}

fn bench_conceal(c: &mut Criterion) {
    c.bench_function("conceal", |b| {
        let key = cluster_key(3);
        let doc = json!({
            "_id": "doc1",
            "patientId": { "%allot": "P12345" },
            "ssn": { "%allot": "123-45-6789" },
            "hospital": "General Hospital"
        });
        b.iter(|| conceal(black_box(&ShamirSharer), black_box(&key), black_box(&doc)))
    });
}

fn bench_reveal(c: &mut Criterion) {
    c.bench_function("reveal", |b| {
        let key = cluster_key(3);
        let doc = json!({
            "_id": "doc1",
            "patientId": { "%allot": "P12345" },
            "ssn": { "%allot": "123-45-6789" },
            "hospital": "General Hospital"
        });
        let variants = conceal(&ShamirSharer, &key, &doc).unwrap();
        b.iter(|| reveal(black_box(&ShamirSharer), black_box(&key), black_box(&variants)))
    });
}

criterion_group!(
    benches,
    bench_split_secret,
    bench_combine_shares,
    bench_conceal,
    bench_reveal
);
criterion_main!(benches);
