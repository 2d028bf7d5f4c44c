//! Throughput of the residual window and the full per-tick engine path
//!
//! The window update must stay O(1) regardless of period.

use chrono::{DateTime, Duration, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pairtrade_rs::config::{EngineConfig, RiskConfig};
use pairtrade_rs::data::LegId;
use pairtrade_rs::engine::PairsEngine;
use pairtrade_rs::exchange::OrderRequest;
use pairtrade_rs::error::ExecutionError;
use pairtrade_rs::indicators::RollingStatistics;

fn residual_series(len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| (i as f64 * 0.37).sin() * 3.0 + (i % 11) as f64 * 0.1)
        .collect()
}

fn bench_window_push(c: &mut Criterion) {
    let series = residual_series(10_000);
    let mut group = c.benchmark_group("rolling_window_push");
    group.throughput(Throughput::Elements(series.len() as u64));

    for period in [20usize, 200, 2_000] {
        group.bench_with_input(BenchmarkId::from_parameter(period), &period, |b, &period| {
            b.iter(|| {
                let mut stats = RollingStatistics::new(period);
                for &value in &series {
                    stats.push(black_box(value));
                    if stats.is_ready() {
                        black_box(stats.std_dev().ok());
                    }
                }
            })
        });
    }
    group.finish();
}

fn bench_engine_ticks(c: &mut Criterion) {
    let series = residual_series(10_000);
    let start: DateTime<Utc> = DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default();
    let mut group = c.benchmark_group("engine_paired_updates");
    group.throughput(Throughput::Elements(series.len() as u64));

    group.bench_function("period_20", |b| {
        b.iter(|| {
            let config = EngineConfig::new("A", "B").with_period(20);
            let sink = |_: &OrderRequest| -> Result<(), ExecutionError> { Ok(()) };
            let mut engine = match PairsEngine::new(config, RiskConfig::default(), sink) {
                Ok(engine) => engine,
                Err(err) => panic!("invalid bench config: {err}"),
            };
            for (i, &residual) in series.iter().enumerate() {
                let ts = start + Duration::seconds(i as i64);
                let _ = engine.on_leg_update(LegId::Leg1, 100.0 + residual, ts);
                let _ = black_box(engine.on_leg_update(LegId::Leg2, 100.0, ts));
            }
        })
    });
    group.finish();
}

criterion_group!(benches, bench_window_push, bench_engine_ticks);
criterion_main!(benches);
