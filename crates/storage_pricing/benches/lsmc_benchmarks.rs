//! Criterion benchmarks for storage_pricing.
//!
//! Benchmarks cover:
//! - Spot path simulation for the three-factor seasonal model
//! - Full LSMC valuation with varying path counts
//! - Intrinsic valuation with varying grid sizes

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use storage_core::market_data::{ForwardCurve, InterestRateCurve};
use storage_core::types::Date;
use storage_models::models::MultiFactorModel;
use storage_models::schedules::Frequency;
use storage_models::storage::{ConstraintSchedule, RatchetInterp, StorageSpecification};
use storage_pricing::{intrinsic_value, value_storage, DaysAfterMonthEnd, LsmcConfig, SpotSimulator, ValuationRequest};

const BASIS: &str = "1 + x_st + x_sw + x_lt + s + x_st**2 + x_sw**2 + x_lt**2 + s**2 + s * x_st";

fn d(y: i32, m: u32, day: u32) -> Date {
    Date::from_ymd(y, m, day).unwrap()
}

fn ratchet_storage(end: Date) -> StorageSpecification {
    let schedule = ConstraintSchedule::builder()
        .entry(d(2021, 4, 1))
        .point(0.0, 150.0, 250.0)
        .point(2_000.0, 200.0, 175.0)
        .point(5_000.0, 260.0, 155.0)
        .point(7_000.0, 275.0, 132.0)
        .build(RatchetInterp::Linear)
        .unwrap();
    StorageSpecification::builder(Frequency::Daily, d(2021, 4, 1), end)
        .ratchets(schedule)
        .injection_cost(0.01)
        .withdrawal_cost(0.025)
        .build()
        .unwrap()
}

fn forward_curve() -> ForwardCurve {
    let prices = [16.61, 15.68, 15.42, 15.31, 15.27, 15.13, 15.96, 17.22, 17.32, 17.66, 17.59, 16.81, 15.36];
    let points = prices
        .iter()
        .enumerate()
        .map(|(i, &p)| (d(2021, 4, 1).add_months(i as u32), p))
        .collect();
    ForwardCurve::from_points(points).unwrap()
}

fn bench_simulation(c: &mut Criterion) {
    let mut group = c.benchmark_group("spot_simulation");
    let model = MultiFactorModel::three_factor_seasonal(91.0, 0.85, 0.30, 0.19).unwrap();
    let curve = forward_curve();
    let val = d(2021, 4, 25);
    let dates: Vec<Date> = (0..90).map(|i| val.add_days(i)).collect();
    let simulator = SpotSimulator::new(&model, &curve, val, dates).unwrap();

    for n_paths in [1_000, 10_000] {
        group.bench_with_input(BenchmarkId::new("three_factor_90d", n_paths), &n_paths, |b, &n| {
            b.iter(|| black_box(simulator.simulate(n, 12).mean_spot(89)));
        });
    }
    group.finish();
}

fn bench_valuation(c: &mut Criterion) {
    let mut group = c.benchmark_group("lsmc_valuation");
    group.sample_size(10);

    let storage = ratchet_storage(d(2021, 7, 1));
    let curve = forward_curve();
    let rates = InterestRateCurve::flat(0.005);
    let model = MultiFactorModel::three_factor_seasonal(91.0, 0.85, 0.30, 0.19).unwrap();
    let settlement = DaysAfterMonthEnd(20);
    let request = ValuationRequest {
        storage: &storage,
        valuation_date: d(2021, 4, 25),
        inventory: 1_500.0,
        forward_curve: &curve,
        interest_rates: &rates,
        settlement_rule: &settlement,
        model: &model,
        basis: BASIS,
    };

    for n_paths in [500, 2_000] {
        group.bench_with_input(BenchmarkId::new("ratchets_67d", n_paths), &n_paths, |b, &n| {
            let config = LsmcConfig::builder().num_paths(n).seed(12).grid_points(50).build().unwrap();
            b.iter(|| black_box(value_storage(&request, &config, None).unwrap().npv));
        });
    }

    for grid_points in [50, 100, 200] {
        group.bench_with_input(BenchmarkId::new("intrinsic_67d", grid_points), &grid_points, |b, &g| {
            let config = LsmcConfig::builder().num_paths(1).grid_points(g).build().unwrap();
            b.iter(|| black_box(intrinsic_value(&request, &config).unwrap().npv));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_simulation, bench_valuation);
criterion_main!(benches);
