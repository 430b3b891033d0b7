use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use pmt_sim::discretization::generator::TubeDimensions;
use pmt_sim::models::pmt::Preset;
use pmt_sim::numerics::relaxation::{RelaxationSolver, relax_interior};
use pmt_sim::physics::field::compute_field;

fn grid_scales() -> Vec<f64> {
    vec![10.0, 20.0]
}

fn bench_relaxation_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("relaxation_sweep");
    for &scale in &grid_scales() {
        let geometry = TubeDimensions {
            scale,
            ..TubeDimensions::default()
        }
        .build()
        .unwrap();
        let grid = geometry.initial_grid();
        let cells = geometry.ny * geometry.nx;
        group.bench_with_input(BenchmarkId::from_parameter(cells), &cells, |b, &_| {
            b.iter_batched(
                || grid.clone(),
                |mut next| {
                    relax_interior(std::hint::black_box(&grid), &mut next);
                    std::hint::black_box(next);
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_relaxation_solve(c: &mut Criterion) {
    let mut group = c.benchmark_group("relaxation_solve");
    group.sample_size(10);
    for &scale in &grid_scales() {
        let geometry = TubeDimensions {
            scale,
            ..TubeDimensions::default()
        }
        .build()
        .unwrap();
        let solver = RelaxationSolver::new(1e-2, 200);
        let cells = geometry.ny * geometry.nx;
        group.bench_with_input(BenchmarkId::from_parameter(cells), &cells, |b, &_| {
            b.iter(|| {
                let result = solver.solve_tube(&geometry).unwrap();
                std::hint::black_box(result.final_delta);
            });
        });
    }
    group.finish();
}

fn bench_field_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("field_extraction");
    for &scale in &grid_scales() {
        let geometry = TubeDimensions {
            scale,
            ..TubeDimensions::default()
        }
        .build()
        .unwrap();
        let solved = RelaxationSolver::new(1e-1, 2_000)
            .solve_tube(&geometry)
            .unwrap();
        let cells = geometry.ny * geometry.nx;
        group.bench_with_input(BenchmarkId::from_parameter(cells), &cells, |b, &_| {
            b.iter(|| {
                let field = compute_field(std::hint::black_box(&solved.solution), scale).unwrap();
                std::hint::black_box(field);
            });
        });
    }
    group.finish();
}

fn bench_trajectory(c: &mut Criterion) {
    let mut group = c.benchmark_group("trajectory");
    for preset in [Preset::Standard, Preset::StandardRebound] {
        let config = preset.config();
        let geometry = config.validate().unwrap();
        let solved = RelaxationSolver::new(1e-1, 2_000)
            .solve_tube(&geometry)
            .unwrap();
        let field = compute_field(&solved.solution, geometry.scale).unwrap();
        let integrator = config.integrator();
        let start = config.initial_state(&geometry);
        group.bench_function(preset.name(), |b| {
            b.iter(|| {
                let traj = integrator
                    .integrate(&field, &solved.solution, &geometry.electrodes, start)
                    .unwrap();
                std::hint::black_box(traj.steps());
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_relaxation_sweep,
    bench_relaxation_solve,
    bench_field_extraction,
    bench_trajectory
);
criterion_main!(benches);
