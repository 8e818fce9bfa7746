use bencher::{RouteTable, TestCase};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use micro_mvc::PathPattern;
use std::hint::black_box;

static SMALL_TABLE: RouteTable = RouteTable::new(4);
static NORMAL_TABLE: RouteTable = RouteTable::new(32);
static LARGE_TABLE: RouteTable = RouteTable::new(256);

fn create_test_cases() -> Vec<TestCase> {
    vec![
        TestCase::small("small_route_table", SMALL_TABLE),
        TestCase::normal("normal_route_table", NORMAL_TABLE),
        TestCase::large("large_route_table", LARGE_TABLE),
    ]
}

fn benchmark_route_matching(criterion: &mut Criterion) {
    for case in create_test_cases() {
        let mut group = criterion.benchmark_group(format!("route_matching/{}", case.group().name()));
        group.sample_size(case.group().sample_size());

        let router = case.table().router().expect("generated routes should compile");
        let first = case.table().first_path();
        let last = case.table().last_path();

        group.bench_with_input(BenchmarkId::new("first_registered", case.name()), &first, |b, path| {
            b.iter(|| black_box(router.match_route(black_box(path))));
        });
        group.bench_with_input(BenchmarkId::new("last_registered", case.name()), &last, |b, path| {
            b.iter(|| black_box(router.match_route(black_box(path))));
        });
        group.bench_with_input(BenchmarkId::new("miss", case.name()), "/does/not/exist", |b, path| {
            b.iter(|| black_box(router.match_route(black_box(path))));
        });
        group.bench_with_input(BenchmarkId::new("captures", case.name()), &first, |b, path| {
            b.iter(|| black_box(router.match_captures(None, black_box(path))));
        });

        group.finish();
    }
}

fn benchmark_pattern_compilation(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("pattern_compilation");
    for pattern in ["/", "/users/{id}", "/shops/{shop}/items/{item}/reviews/{review}"] {
        group.bench_with_input(BenchmarkId::from_parameter(pattern), pattern, |b, pattern| {
            b.iter(|| PathPattern::compile(black_box(pattern)).expect("pattern should compile"));
        });
    }
    group.finish();
}

fn benchmark_redirect_substitution(criterion: &mut Criterion) {
    let pattern = PathPattern::compile("/shops/{shop}/items/{item}").expect("pattern should compile");
    criterion.bench_function("redirect_substitution", |b| {
        b.iter(|| black_box(pattern.substitute(black_box([("shop", "books"), ("item", "42")]))));
    });
}

criterion_group!(router, benchmark_route_matching, benchmark_pattern_compilation, benchmark_redirect_substitution);
criterion_main!(router);
