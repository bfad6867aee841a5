use criterion::{black_box, criterion_group, criterion_main, Criterion};

const SMALL: &str = "x >= 0 && x <= n";
const MEDIUM: &str = "(x == 0 || y >= x * 2) && c <= n && 2 * x - y + 1 >= 0";
const PRIMED: &str = "c < n && x! == x + y && y! == y + 2 ==> x! == (c + 1) * (c + 1)";

fn bench_parse_small(c: &mut Criterion) {
    c.bench_function("parse_small", |b| {
        b.iter(|| galago_expr::parse(black_box(SMALL), "small.inv").unwrap())
    });
}

fn bench_parse_medium(c: &mut Criterion) {
    c.bench_function("parse_medium", |b| {
        b.iter(|| galago_expr::parse(black_box(MEDIUM), "medium.inv").unwrap())
    });
}

fn bench_parse_primed(c: &mut Criterion) {
    c.bench_function("parse_primed", |b| {
        b.iter(|| galago_expr::parse(black_box(PRIMED), "primed.inv").unwrap())
    });
}

criterion_group!(
    benches,
    bench_parse_small,
    bench_parse_medium,
    bench_parse_primed
);
criterion_main!(benches);
