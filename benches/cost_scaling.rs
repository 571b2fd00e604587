use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use bcrypt_rust::{engine, Cost, Salt};

// Each step up in cost should roughly double the time per hash.
fn bench_cost_scaling(c: &mut Criterion) {
    let salt = Salt::from([0u8; 16]);
    let mut group = c.benchmark_group("bcrypt_cost");
    group.sample_size(10);

    for cost in 4..=8 {
        let cost = Cost::new(cost).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(cost.get()), &cost, |b, &cost| {
            b.iter(|| engine::hash(black_box(b"correct horse battery staple"), &salt, cost).unwrap())
        });
    }
    group.finish();
}

fn bench_verify(c: &mut Criterion) {
    let stored = "$2a$04$TI13sbmh3IHnmRepeEFoJOkVZWsn5S1O8QOwm8ZU5gNIpJog9pXZm";
    c.bench_function("verify_cost_4", |b| {
        b.iter(|| bcrypt_rust::verify(black_box("vapor"), stored).unwrap())
    });
}

criterion_group!(benches, bench_cost_scaling, bench_verify);
criterion_main!(benches);
