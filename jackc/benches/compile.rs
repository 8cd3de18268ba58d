use criterion::{black_box, criterion_group, criterion_main, Criterion};

use jackc::prelude::*;

const AVERAGE: &str = include_str!("../tests/average.jack");
const POINT: &str = include_str!("../tests/point.jack");

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("scan average", |b| {
        b.iter(|| black_box(Lexer::new(black_box(AVERAGE)).tokenize()))
    });

    {
        let conf = CompileConf::default();
        let mut buf = Vec::with_capacity(4096);

        c.bench_function("compile point", |b| {
            b.iter(|| {
                buf.clear();
                black_box(compile(black_box(POINT), &mut buf, &conf))
            })
        });
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
