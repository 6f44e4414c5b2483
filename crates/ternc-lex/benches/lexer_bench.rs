//! Lexer throughput benchmark.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn synthetic_source(functions: usize) -> String {
    let mut source = String::new();
    source.push_str("var total: int = 0;\n");
    for i in 0..functions {
        source.push_str(&format!(
            "func step{i}(n: int): int {{\n  var acc: int = n;\n  while (acc < 100) {{\n    # tight loop\n    acc = acc + (n * 3) % 7;\n    if (acc == 42) {{ break; }}\n  }}\n  return acc;\n}}\n"
        ));
    }
    source
}

fn bench_lexer(c: &mut Criterion) {
    let small = synthetic_source(4);
    let large = synthetic_source(256);

    c.bench_function("lex_small", |b| {
        b.iter(|| ternc_lex::tokenize(black_box(&small)).unwrap())
    });

    c.bench_function("lex_large", |b| {
        b.iter(|| ternc_lex::tokenize(black_box(&large)).unwrap())
    });
}

criterion_group!(benches, bench_lexer);
criterion_main!(benches);
