//! Resolver Benchmark
//!
//! Measures a full resolution pass over synthetic control libraries, and
//! compares the parallel and sequential pipelines.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use xom::model::{Declaration, DeclarationSet, RawAttribute};
use xom::{DeclKind, ResolverOptions, resolve};

// =============================================================================
// Synthetic Schemas
// =============================================================================

/// A contract with `versions` versions, then `types` classes in chains of
/// `depth`, each with a handful of gated, stored and indexed members.
fn generate_library(types: usize, depth: usize, versions: u32) -> DeclarationSet {
    let mut set = DeclarationSet::new();

    let contract = (1..=versions).fold(
        Declaration::class("Bench", "BenchContract").with_attr(RawAttribute::new("Contract")),
        |decl, v| decl.with_attr(RawAttribute::new("ContractVersion").arg(v)),
    );
    set.push(contract);
    set.push(Declaration::class("Bench", "IBenchElement").with_attr(RawAttribute::new("Interface")));

    for i in 0..types {
        let version = 1 + (i as u32 % versions);
        let mut class = Declaration::class("Bench", format!("Type{i}"))
            .with_attr(RawAttribute::new("Platform").arg("BenchContract").arg(version))
            .with_attr(RawAttribute::new("Guids").arg(format!("{{00000000-0000-0000-0000-{i:012x}}}")))
            .with_attr(RawAttribute::new("StableIndex"));
        if i % depth == 0 {
            class = class.implementing("IBenchElement");
        } else {
            class = class.with_base(format!("Type{}", i - 1));
        }
        if i % 7 == 0 {
            class = class.with_attr(RawAttribute::new("CodeGen").arg("IdlAndPartialStub"));
        }
        set.push(class);

        let owner = format!("Bench.Type{i}");
        for m in 0..4 {
            let mut property = Declaration::property(owner.clone(), format!("Prop{m}"))
                .with_value_type("Double")
                .with_attr(RawAttribute::new("StableIndex"));
            if m % 2 == 0 {
                property = property
                    .with_attr(RawAttribute::new("OffsetFieldName").arg(format!("m_prop{m}")))
                    .with_attr(RawAttribute::new("NativeStorageType").arg("Double"));
            }
            set.push(property);
        }
        set.push(
            Declaration::member(DeclKind::Event, owner.clone(), "Changed")
                .with_attr(RawAttribute::new("StableIndex")),
        );
        set.push(
            Declaration::method(owner, "Refresh").with_attr(RawAttribute::new("StableIndex")),
        );
    }
    set
}

// =============================================================================
// Benchmarks
// =============================================================================

/// Benchmark: resolve small and large libraries
fn bench_resolve_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");
    let options = ResolverOptions::default();
    for types in [50, 500, 2_000] {
        let set = generate_library(types, 8, 4);
        group.throughput(Throughput::Elements(set.len() as u64));
        group.bench_with_input(BenchmarkId::new("types", types), &set, |b, set| {
            b.iter(|| black_box(resolve(set, &options)))
        });
    }
    group.finish();
}

/// Benchmark: parallel vs sequential pipeline on the same input
fn bench_parallel_vs_sequential(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_threading");
    let set = generate_library(2_000, 8, 4);
    let parallel = ResolverOptions::default();
    let sequential = ResolverOptions::default().with_parallel(false);

    group.bench_function("parallel", |b| {
        b.iter(|| black_box(resolve(&set, &parallel)))
    });
    group.bench_function("sequential", |b| {
        b.iter(|| black_box(resolve(&set, &sequential)))
    });
    group.finish();
}

/// Benchmark: deep inheritance chains stress ordering and core exclusion
fn bench_deep_hierarchy(c: &mut Criterion) {
    let set = generate_library(1_000, 1_000, 2);
    let options = ResolverOptions::default();
    c.bench_function("resolve_deep_chain", |b| {
        b.iter(|| black_box(resolve(&set, &options)))
    });
}

criterion_group!(
    benches,
    bench_resolve_sizes,
    bench_parallel_vs_sequential,
    bench_deep_hierarchy
);
criterion_main!(benches);
