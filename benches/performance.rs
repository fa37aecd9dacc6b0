//! Performance benchmarks for membrane-mesh
//!
//! # Running Benchmarks
//!
//! Run all benchmarks:
//! ```bash
//! cargo bench
//! ```
//!
//! Run specific benchmark group:
//! ```bash
//! cargo bench --bench performance connectivity
//! cargo bench --bench performance derived
//! cargo bench --bench performance density
//! cargo bench --bench performance periodic
//! ```
//!
//! Compare against the parallel density evaluation:
//! ```bash
//! cargo bench --features parallel --bench performance density
//! ```
//!
//! # Benchmark Groups
//!
//! - **connectivity**: neighbors, adjacent faces, across-edge links and boundary edges
//! - **derived**: normals and mixed Voronoi point areas
//! - **density**: kernel density estimation with full scan, k-d tree cutoff and hop limit
//! - **periodic**: wrapping and ghost duplication of a periodic lattice

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use membrane_mesh::{DensityKernel, MeshView};

use synthetic_mesh::{calculate_grid_dimensions, generate_membrane_grid, generate_periodic_lattice};

/// Benchmark connectivity construction at different scales
fn benchmark_connectivity(c: &mut Criterion) {
    let mut group = c.benchmark_group("connectivity");

    let scales = vec![("1K", 1_000), ("10K", 10_000), ("100K", 100_000)];

    for (name, target_faces) in scales {
        let (nx, ny) = calculate_grid_dimensions(target_faces);
        let mesh = generate_membrane_grid(nx, ny, 1.0);

        group.throughput(Throughput::Elements(2 * (nx * ny) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), &mesh, |b, mesh| {
            b.iter(|| {
                // Clone so every iteration starts with empty caches
                let mut mesh = mesh.clone();
                mesh.rebuild();
                black_box(mesh.neighbors().total_entries());
                black_box(mesh.boundary_edges().unwrap().len());
            });
        });
    }

    group.finish();
}

/// Benchmark normals and point areas
fn benchmark_derived(c: &mut Criterion) {
    let mut group = c.benchmark_group("derived");

    let (nx, ny) = calculate_grid_dimensions(100_000);
    let mesh = generate_membrane_grid(nx, ny, 1.0);
    group.throughput(Throughput::Elements(mesh.faces().len() as u64));

    group.bench_function("normals", |b| {
        b.iter(|| {
            let mut mesh = mesh.clone();
            mesh.rebuild();
            black_box(mesh.normals().len());
        });
    });

    group.bench_function("point_areas", |b| {
        b.iter(|| {
            let mut mesh = mesh.clone();
            mesh.rebuild();
            black_box(mesh.point_areas().iter().sum::<f64>());
        });
    });

    group.finish();
}

/// Benchmark density estimation strategies
fn benchmark_density(c: &mut Criterion) {
    let mut group = c.benchmark_group("density");
    group.sample_size(20);

    let (nx, ny) = calculate_grid_dimensions(10_000);
    let mesh = generate_membrane_grid(nx, ny, 1.0);
    group.throughput(Throughput::Elements(mesh.vertices().len() as u64));

    let kernels = vec![
        ("full_scan", DensityKernel::gaussian(2.0)),
        ("kdtree_cutoff", DensityKernel::gaussian(2.0).with_cutoff(3.0)),
        ("hop_limited", DensityKernel::gaussian(2.0).with_max_hops(3)),
    ];

    for (name, kernel) in kernels {
        group.bench_with_input(BenchmarkId::from_parameter(name), &kernel, |b, kernel| {
            let mut mesh = mesh.clone();
            b.iter(|| {
                let values = mesh.kde(black_box(kernel), "density", None).unwrap();
                black_box(values);
            });
        });
    }

    group.finish();
}

/// Benchmark wrapping and ghost duplication
fn benchmark_periodic(c: &mut Criterion) {
    let mut group = c.benchmark_group("periodic");

    for n in [32usize, 128, 256] {
        let mesh = generate_periodic_lattice(n);

        group.throughput(Throughput::Elements(2 * (n * n) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &mesh, |b, mesh| {
            b.iter(|| {
                let mut mesh = mesh.clone();
                mesh.wrap_vertices(2).unwrap();
                mesh.create_duplicate_vertices().unwrap();
                black_box(mesh.duplicate_origins().unwrap().len());
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_connectivity,
    benchmark_derived,
    benchmark_density,
    benchmark_periodic,
);

criterion_main!(benches);
