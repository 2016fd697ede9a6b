//! Benchmarks for single-configuration evaluation and a small grid search.

use chrono::{Months, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use saidi_forecast::core::TimeSeries;
use saidi_forecast::models::{ModelSpec, NeverInterrupt};
use saidi_forecast::search::{
    CancellationController, MetricsEvaluator, NullProgressSink, ParameterGrid, ProgressReporter,
    SearchConfig, SearchOrchestrator,
};

fn generate_saidi(n: usize) -> TimeSeries {
    let base = Utc.with_ymd_and_hms(2015, 1, 1, 0, 0, 0).unwrap();
    let timestamps = (0..n)
        .map(|i| base.checked_add_months(Months::new(i as u32)).unwrap())
        .collect();
    let values = (0..n)
        .map(|i| {
            let season = 2.0 * std::f64::consts::PI * (i % 12) as f64 / 12.0;
            20.0 + 0.03 * i as f64 + 5.0 * season.sin() + ((i * 37) % 11) as f64 * 0.1
        })
        .collect();
    TimeSeries::univariate(timestamps, values).unwrap()
}

fn bench_evaluator(c: &mut Criterion) {
    let mut group = c.benchmark_group("metrics_evaluator");
    let evaluator = MetricsEvaluator::new();
    let specs = [
        ("arima_100", ModelSpec::arima(1, 0, 0)),
        ("arima_111", ModelSpec::arima(1, 1, 1)),
        ("sarima_111_111_12", ModelSpec::new((1, 1, 1), (1, 1, 1, 12))),
    ];

    for size in [48, 96, 144].iter() {
        let series = generate_saidi(*size);
        for (name, spec) in specs.iter() {
            group.bench_with_input(BenchmarkId::new(*name, size), size, |b, _| {
                b.iter(|| evaluator.evaluate(black_box(&series), *spec, &NeverInterrupt))
            });
        }
    }

    group.finish();
}

fn bench_small_grid(c: &mut Criterion) {
    let series = generate_saidi(48);
    let grid = ParameterGrid::default()
        .with_order(0..2, 0..2, 0..2)
        .with_seasonal_order(0..2, 0..1, 0..2)
        .with_periods(12..13);

    c.bench_function("grid_search_32", |b| {
        b.iter(|| {
            let reporter = ProgressReporter::new(NullProgressSink, CancellationController::new());
            let mut orchestrator =
                SearchOrchestrator::new(SearchConfig::default().with_grid(grid.clone()), reporter);
            orchestrator.search(black_box(&series))
        })
    });
}

criterion_group!(benches, bench_evaluator, bench_small_grid);
criterion_main!(benches);
