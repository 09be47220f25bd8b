use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use promise_cell::Promise;

fn wait_paths(c: &mut Criterion) {
    let mut settled = c.benchmark_group("settled-wait");

    settled.bench_function("promise_cell", |b| {
        b.iter_batched(
            || {
                let promise = Promise::<u64>::new();
                promise.complete(7).unwrap();
                promise
            },
            |promise| {
                black_box(*promise.wait().unwrap());
            },
            BatchSize::SmallInput,
        );
    });

    settled.bench_function("tokio", |b| {
        b.iter_batched(
            || {
                let (tx, rx) = tokio::sync::oneshot::channel();
                tx.send(7_u64).unwrap();
                rx
            },
            |rx| {
                black_box(rx.blocking_recv().unwrap());
            },
            BatchSize::SmallInput,
        );
    });
    settled.finish();

    c.bench_function("try_get", |b| {
        let promise = Promise::<u64>::new();
        promise.complete(7).unwrap();
        b.iter(|| black_box(promise.try_get()));
    });

    c.bench_function("complete", |b| {
        b.iter_batched(
            Promise::<u64>::new,
            |promise| {
                promise.complete(7).unwrap();
                black_box(promise);
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, wait_paths);
criterion_main!(benches);
