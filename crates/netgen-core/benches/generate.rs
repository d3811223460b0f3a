use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use netgen_core::{GeneratorConfig, Mode, generate_run, parse, replay};

const TARGETS: [(Mode, usize); 3] = [
    (Mode::Mutual, 500),
    (Mode::Mutual, 3_000),
    (Mode::Public, 10_000),
];

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate.full_run");
    group.sample_size(10);

    for (mode, target) in TARGETS {
        group.throughput(Throughput::Elements(target as u64));
        group.bench_with_input(
            BenchmarkId::new(mode.as_str(), target),
            &target,
            |b, &target| {
                b.iter(|| {
                    let generation = generate_run(GeneratorConfig::new(mode, target, 0xC0FFEE))
                        .expect("valid config");
                    black_box(generation.report.lines)
                });
            },
        );
    }

    group.finish();
}

fn bench_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("replay");
    let generation =
        generate_run(GeneratorConfig::new(Mode::Mutual, 3_000, 7)).expect("valid config");
    let text = generation.render();
    group.throughput(Throughput::Elements(generation.instructions.len() as u64));

    group.bench_function("parse", |b| b.iter(|| black_box(parse(&text).map(|v| v.len()))));
    group.bench_function("classify_and_apply", |b| {
        b.iter(|| black_box(replay(&generation.instructions).instructions));
    });

    group.finish();
}

criterion_group!(benches, bench_generate, bench_replay);
criterion_main!(benches);
