use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use portal_core::create_imperative_portal;

fn show_and_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("show_and_resolve");

    for live in [0usize, 16, 256] {
        group.bench_with_input(BenchmarkId::from_parameter(live), &live, |b, &live| {
            let portal = create_imperative_portal::<u64>();
            let _background: Vec<_> = (0..live as u64).map(|n| portal.show::<()>(n)).collect();

            b.iter(|| {
                let handle = portal.show::<u64>(black_box(7));
                handle.update(8);
                handle.resolve(black_box(1));
            });
        });
    }

    group.finish();
}

fn render_outlet(c: &mut Criterion) {
    let portal = create_imperative_portal::<u64>();
    let _live: Vec<_> = (0..64u64).map(|n| portal.show::<()>(n)).collect();
    let outlet = portal.outlet();

    c.bench_function("render_outlet_64", |b| {
        b.iter(|| {
            outlet.render_wrapped(
                |entry| {
                    let key = portal.current_handle::<()>().map(|h| h.key().raw());
                    *entry.content() + key.unwrap_or_default()
                },
                |values| values.into_iter().sum::<u64>(),
            )
        });
    });
}

criterion_group!(benches, show_and_resolve, render_outlet);
criterion_main!(benches);
