//! Benchmarks for expression building and evaluation.
//!
//! Run with: `cargo bench --bench mathexpr_bench`

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dynwave::mathexpr::MathExpr;

const FORMULA: &str = "2*(A+3)^2 - STEP(A) + SQRT(ABS(B))*TANH(A/4)";

fn resolve(name: &str) -> Option<usize> {
    match name {
        "A" => Some(0),
        "B" => Some(1),
        _ => None,
    }
}

fn bench_build(c: &mut Criterion) {
    c.bench_function("mathexpr_build", |b| {
        b.iter(|| MathExpr::build(black_box(FORMULA), resolve).unwrap());
    });
}

fn bench_evaluate(c: &mut Criterion) {
    let expr = MathExpr::build(FORMULA, resolve).unwrap();
    let mut x = 0.0;
    c.bench_function("mathexpr_evaluate", |b| {
        b.iter(|| {
            x += 1.0e-3;
            expr.evaluate(|i| if i == 0 { black_box(x) } else { 2.5 })
        });
    });
}

criterion_group!(benches, bench_build, bench_evaluate);
criterion_main!(benches);
