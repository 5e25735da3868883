use criterion::{black_box, criterion_group, criterion_main, Criterion};

use unitscope_core::context::ExecutionContext;
use unitscope_core::registrar::{clean, Registrar};
use unitscope_core::unit::Store;

fn getter_cache_hit(c: &mut Criterion) {
    let registrar = Registrar::default();
    let get_store = registrar.register("bench", |_: ()| Store::new(0u64));

    let context = ExecutionContext::new();
    let _guard = context.enter();
    get_store.get().unwrap();

    c.bench_function("getter_cache_hit", |b| {
        b.iter(|| black_box(get_store.get().unwrap()))
    });
}

fn getter_create_after_clean(c: &mut Criterion) {
    let registrar = Registrar::default();
    let get_store = registrar.register("bench", |_: ()| Store::new(0u64));

    let context = ExecutionContext::new();
    let _guard = context.enter();

    c.bench_function("getter_create_after_clean", |b| {
        b.iter(|| {
            clean().unwrap();
            black_box(get_store.get().unwrap())
        })
    });
}

criterion_group!(benches, getter_cache_hit, getter_create_after_clean);
criterion_main!(benches);
