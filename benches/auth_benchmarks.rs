use chrono::{Duration, Utc};
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use uuid::Uuid;

use library_catalog::auth::{PasswordHasher, Role, TokenCodec};

fn bench_token_codec(c: &mut Criterion) {
    let codec = TokenCodec::new(b"bench-secret", Duration::seconds(3600));
    let id = Uuid::new_v4();
    let now = Utc::now();

    c.bench_function("token_issue", |b| {
        b.iter(|| codec.issue(black_box(id), black_box(Role::Moderator), now))
    });

    let token = codec.issue(id, Role::Moderator, now).unwrap();
    c.bench_function("token_verify", |b| {
        b.iter(|| codec.verify(black_box(&token), now))
    });

    c.bench_function("token_identify", |b| {
        b.iter(|| codec.identify(black_box(&token)))
    });
}

fn bench_password_hasher(c: &mut Criterion) {
    let mut group = c.benchmark_group("password");
    group.sample_size(10);

    for cost in [4u32, 8] {
        let hasher = PasswordHasher::new(cost);
        let digest = hasher.hash("pw123").unwrap();

        group.bench_function(format!("hash_cost_{}", cost), |b| {
            b.iter(|| hasher.hash(black_box("pw123")))
        });
        group.bench_function(format!("verify_cost_{}", cost), |b| {
            b.iter(|| hasher.verify(black_box("pw123"), &digest))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_token_codec, bench_password_hasher);
criterion_main!(benches);
