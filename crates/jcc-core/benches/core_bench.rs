//! Criterion benchmarks for jcc-core.
//!
//! ## Benchmark groups
//!
//! 1. **index_build** : Universe assembly with duplicate handling.
//! 2. **resolution** : Member lookup through deep superclass chains and
//!    interface fan-out.
//! 3. **check** : Full runs over synthetic artifacts at several sizes, with
//!    one and many workers.
//!
//! ## Running
//!
//! ```sh
//! cargo bench --manifest-path crates/jcc-core/Cargo.toml
//! # Run only the full-check group:
//! cargo bench --manifest-path crates/jcc-core/Cargo.toml -- check
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use jcc_core::classpath::index::ClasspathIndex;
use jcc_core::classpath::universe::UniverseInputs;
use jcc_core::models::{MemberCategory, MemberKey};
use jcc_core::query::resolver::{ancestry, resolve};
use jcc_core::{check, CheckerConfig, ClassKind, ClassModel, MemberModel, Visibility};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A linear hierarchy `p.C0 <- p.C1 <- ... <- p.C{depth-1}` where every class
/// declares a few methods and fields of its own and implements one interface.
fn hierarchy(depth: usize) -> Vec<ClassModel> {
    let mut classes = Vec::with_capacity(depth * 2);
    for i in 0..depth {
        let mut class = ClassModel::new(format!("p.C{i}"))
            .with_interface(format!("p.I{i}"))
            .with_field(MemberModel::new(format!("f{i}"), "I"))
            .with_method(MemberModel::new(format!("m{i}"), "()V"))
            .with_method(MemberModel::new(format!("n{i}"), "(Ljava/lang/String;)J"));
        if i > 0 {
            class = class.with_superclass(format!("p.C{}", i - 1));
        }
        classes.push(class);

        let mut iface = ClassModel::new(format!("p.I{i}"))
            .with_kind(ClassKind::Interface)
            .with_method(MemberModel::new(format!("i{i}"), "()I"));
        if i > 0 {
            iface = iface.with_interface(format!("p.I{}", i - 1));
        }
        classes.push(iface);
    }
    classes
}

/// The candidate side: every tenth class removed, every seventh method
/// narrowed, everything else unchanged.
fn mutated(base: &[ClassModel]) -> Vec<ClassModel> {
    base.iter()
        .enumerate()
        .filter(|(i, _)| i % 10 != 9)
        .map(|(i, class)| {
            let mut class = class.clone();
            if i % 7 == 0 {
                for method in &mut class.methods {
                    method.visibility = Visibility::Protected;
                }
            }
            class
        })
        .collect()
}

fn inputs(size: usize) -> UniverseInputs {
    let base = hierarchy(size);
    let candidate = mutated(&base);
    UniverseInputs {
        base_artifact: base,
        candidate_artifact: candidate,
        shared_libraries: hierarchy(size / 4),
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Benchmark: index build
// ---------------------------------------------------------------------------

fn bench_index_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_build");

    for &size in &[100, 1_000, 5_000] {
        let run = inputs(size);
        group.bench_with_input(BenchmarkId::new("base_universe", size), &run, |b, run| {
            b.iter(|| black_box(run.base_universe()));
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmark: member resolution
// ---------------------------------------------------------------------------

fn bench_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolution");

    for &depth in &[10, 100, 500] {
        let index = ClasspathIndex::build("bench", hierarchy(depth));
        let leaf = format!("p.C{}", depth - 1);

        // Declared on the root: walks the whole superclass chain.
        let root_method = MemberKey::new("m0", "()V");
        group.bench_with_input(BenchmarkId::new("superclass_chain", depth), &depth, |b, _| {
            b.iter(|| {
                black_box(resolve(
                    &index,
                    black_box(&leaf),
                    &root_method,
                    MemberCategory::Method,
                ))
            });
        });

        // Declared on the deepest interface: exhausts the chain first.
        let root_iface_method = MemberKey::new("i0", "()I");
        group.bench_with_input(BenchmarkId::new("interfaces", depth), &depth, |b, _| {
            b.iter(|| {
                black_box(resolve(
                    &index,
                    black_box(&leaf),
                    &root_iface_method,
                    MemberCategory::Method,
                ))
            });
        });

        group.bench_with_input(BenchmarkId::new("ancestry", depth), &depth, |b, _| {
            b.iter(|| black_box(ancestry(&index, black_box(&leaf))));
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmark: full check
// ---------------------------------------------------------------------------

fn bench_check(c: &mut Criterion) {
    let mut group = c.benchmark_group("check");
    group.sample_size(20);

    for &size in &[100, 1_000] {
        let run = inputs(size);
        for &workers in &[1, 8] {
            let config = CheckerConfig::default().with_workers(workers);
            group.bench_with_input(
                BenchmarkId::new(format!("workers_{workers}"), size),
                &run,
                |b, run| {
                    b.iter(|| black_box(check(run, config.clone()).unwrap()));
                },
            );
        }
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Register all benchmark groups
// ---------------------------------------------------------------------------

criterion_group!(benches, bench_index_build, bench_resolution, bench_check);
criterion_main!(benches);
