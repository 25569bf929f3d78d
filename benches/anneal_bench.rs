//! Criterion benchmarks for u-anneal.
//!
//! Uses a synthetic objective (Sphere function) to measure pure annealer
//! overhead independent of any domain.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use u_anneal::asa::{AnnealState, Annealer, AsaConfig, AsaProblem, AsaRunner, Evaluation, Request};

// ===========================================================================
// Sphere function: minimize sum(x_i^2)
// ===========================================================================

struct SphereAsa {
    dim: usize,
}

impl AsaProblem for SphereAsa {
    fn initial_params(&self) -> Vec<f64> {
        vec![3.0; self.dim]
    }

    fn ranges(&self) -> Vec<(f64, f64)> {
        vec![(-5.0, 5.0); self.dim]
    }

    fn objective(&self, x: &[f64]) -> f64 {
        x.iter().map(|v| v * v).sum()
    }
}

// ===========================================================================
// Benchmarks
// ===========================================================================

fn bench_asa_sphere(c: &mut Criterion) {
    let mut group = c.benchmark_group("asa_sphere");
    group.sample_size(10);

    for &dim in &[2, 10, 50] {
        let problem = SphereAsa { dim };
        let config = AsaConfig::default().with_max_steps(1000).with_seed(42);
        group.bench_with_input(BenchmarkId::from_parameter(dim), &(problem, config), |b, (p, c)| {
            b.iter(|| {
                let result = AsaRunner::run(black_box(p), black_box(c)).unwrap();
                black_box(result.best_cost)
            })
        });
    }
    group.finish();
}

fn bench_step_protocol(c: &mut Criterion) {
    let mut group = c.benchmark_group("asa_step");
    group.sample_size(10);

    for &dim in &[2, 10, 50] {
        group.bench_with_input(BenchmarkId::from_parameter(dim), &dim, |b, &dim| {
            b.iter(|| {
                let config = AsaConfig::default().with_max_steps(1000).with_seed(42);
                let mut annealer =
                    Annealer::with_config(vec![3.0; dim], &vec![(-5.0, 5.0); dim], config).unwrap();
                annealer.init().unwrap();
                let f = |x: &[f64]| x.iter().map(|v| v * v).sum::<f64>();
                while annealer.state() != AnnealState::ReadyToStop {
                    let evaluation = match annealer.request().unwrap() {
                        Request::Candidate(x) => Evaluation::Candidate(f(x)),
                        Request::ReannealSet { x_plusdelta, .. } => Evaluation::ReannealSet {
                            f_x: None,
                            f_x_plusdelta: f(x_plusdelta),
                        },
                    };
                    annealer.step(black_box(evaluation)).unwrap();
                }
                black_box(annealer.f_x_best())
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_asa_sphere, bench_step_protocol);
criterion_main!(benches);
