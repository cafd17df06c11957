//! End-to-end storage valuations.

use std::ops::ControlFlow;
use std::sync::Mutex;

use approx::assert_relative_eq;
use storage_core::market_data::{ForwardCurve, InterestRateCurve};
use storage_core::types::Date;
use storage_models::models::{Factor, MultiFactorModel};
use storage_models::schedules::Frequency;
use storage_models::storage::{
    ConstraintSchedule, MaintenanceOutage, RatchetInterp, StorageSpecification, TerminalCondition,
};
use storage_pricing::basis::BasisError;
use storage_pricing::{
    intrinsic_value, value_storage, LsmcConfig, SameDay, ValuationError, ValuationRequest,
};

fn d(y: i32, m: u32, day: u32) -> Date {
    Date::from_ymd(y, m, day).unwrap()
}

fn seasonal_curve(start: Date, days: i64) -> ForwardCurve {
    let prices = (0..days)
        .map(|i| 20.0 + 4.0 * (i as f64 * 2.0 * std::f64::consts::PI / 30.0).sin())
        .collect();
    ForwardCurve::daily(start, prices).unwrap()
}

fn daily_storage(start: Date, days: i64) -> StorageSpecification {
    StorageSpecification::builder(Frequency::Daily, start, start.add_days(days))
        .simple_constraints(0.0, 100.0, 10.0, 10.0)
        .injection_cost(0.05)
        .withdrawal_cost(0.05)
        .build()
        .unwrap()
}

fn one_factor(vol: f64) -> MultiFactorModel {
    MultiFactorModel::new(vec![Factor::new(12.0, vol)], 1.0).unwrap()
}

fn request<'a>(
    storage: &'a StorageSpecification,
    valuation_date: Date,
    inventory: f64,
    forward: &'a ForwardCurve,
    rates: &'a InterestRateCurve,
    model: &'a MultiFactorModel,
    basis: &'a str,
) -> ValuationRequest<'a> {
    ValuationRequest {
        storage,
        valuation_date,
        inventory,
        forward_curve: forward,
        interest_rates: rates,
        settlement_rule: &SameDay,
        model,
        basis,
    }
}

#[test]
fn test_spread_trade_intrinsic_value() {
    let jan = d(2021, 1, 1);
    let feb = d(2021, 2, 1);
    let storage = StorageSpecification::builder(Frequency::Monthly, jan, d(2021, 3, 1))
        .simple_constraints(0.0, 100.0, 100.0, 100.0)
        .injection_cost(0.1)
        .withdrawal_cost(0.2)
        .injection_fuel(0.01)
        .build()
        .unwrap();
    let forward = ForwardCurve::from_points(vec![(jan, 10.0), (feb, 15.0)]).unwrap();
    let rates = InterestRateCurve::flat(0.0);
    let model = one_factor(0.5);
    let req = request(&storage, jan, 0.0, &forward, &rates, &model, "1 + s");
    let config = LsmcConfig::builder().num_paths(1).build().unwrap();

    let result = intrinsic_value(&req, &config).unwrap();

    // Buy 101 at 10 and pay 10 injection cost; sell 100 at 15 less 20 cost.
    assert_relative_eq!(result.npv, 460.0, epsilon = 1e-9);
    assert_eq!(result.dates, vec![jan, feb]);
    assert_relative_eq!(result.deltas[0], -101.0, epsilon = 1e-9);
    assert_relative_eq!(result.deltas[1], 100.0, epsilon = 1e-9);

    let profile = &result.intrinsic_profile;
    assert_eq!(profile.inventory, vec![0.0, 100.0]);
    assert_eq!(profile.injected, vec![100.0, 0.0]);
    assert_eq!(profile.withdrawn, vec![0.0, 100.0]);
    assert_relative_eq!(profile.consumed[0], 1.0, epsilon = 1e-12);
    assert_eq!(profile.end_inventory, 0.0);

    let jan_trigger = result.trigger_prices[0];
    assert_relative_eq!(jan_trigger.inject_price.unwrap(), 1470.0 / 101.0, epsilon = 1e-9);
    assert_eq!(jan_trigger.inject_volume, Some(100.0));
    assert!(jan_trigger.withdraw_price.is_none());
    // February can only empty the facility: no discretion either way.
    assert_eq!(result.trigger_prices[1], Default::default());
}

#[test]
fn test_discounted_deltas() {
    let jan = d(2021, 1, 1);
    let feb = d(2021, 2, 1);
    let storage = StorageSpecification::builder(Frequency::Monthly, jan, d(2021, 3, 1))
        .simple_constraints(0.0, 100.0, 100.0, 100.0)
        .build()
        .unwrap();
    let forward = ForwardCurve::from_points(vec![(jan, 10.0), (feb, 15.0)]).unwrap();
    let rates = InterestRateCurve::flat(0.05);
    let model = one_factor(0.5);
    let req = request(&storage, jan, 0.0, &forward, &rates, &model, "1 + s");

    let plain = LsmcConfig::builder().num_paths(1).build().unwrap();
    let discounted = LsmcConfig::builder().num_paths(1).discount_deltas(true).build().unwrap();
    let a = intrinsic_value(&req, &plain).unwrap();
    let b = intrinsic_value(&req, &discounted).unwrap();

    let df = (-0.05_f64 * 31.0 / 365.0).exp();
    assert_relative_eq!(a.deltas[1], 100.0, epsilon = 1e-9);
    assert_relative_eq!(b.deltas[1], 100.0 * df, epsilon = 1e-9);
    assert_relative_eq!(a.npv, -1_000.0 + 1_500.0 * df, epsilon = 1e-9);
}

#[test]
fn test_inventory_loss_and_holding_cost_intrinsic_value() {
    let jan = d(2021, 1, 1);
    let feb = d(2021, 2, 1);
    let storage = StorageSpecification::builder(Frequency::Monthly, jan, d(2021, 3, 1))
        .simple_constraints(0.0, 100.0, 100.0, 100.0)
        .inventory_loss(0.1)
        .inventory_cost(0.5)
        .build()
        .unwrap();
    let forward = ForwardCurve::from_points(vec![(jan, 10.0), (feb, 15.0)]).unwrap();
    let rates = InterestRateCurve::flat(0.0);
    let model = one_factor(0.5);
    let req = request(&storage, jan, 0.0, &forward, &rates, &model, "1 + s");
    let config = LsmcConfig::builder().num_paths(1).build().unwrap();

    let result = intrinsic_value(&req, &config).unwrap();

    // Buy 100 at 10; a tenth is lost and 0.5 per unit is paid to hold the
    // rest into February, where the remaining 90 sell at 15.
    assert_relative_eq!(result.npv, -1_000.0 + 90.0 * 15.0 - 50.0, epsilon = 1e-9);
    assert_relative_eq!(result.deltas[0], -100.0, epsilon = 1e-9);
    assert_relative_eq!(result.deltas[1], 90.0, epsilon = 1e-9);

    let profile = &result.intrinsic_profile;
    assert_eq!(profile.inventory, vec![0.0, 100.0]);
    assert_relative_eq!(profile.loss[1], 10.0, epsilon = 1e-9);
    assert_relative_eq!(profile.withdrawn[1], 90.0, epsilon = 1e-9);
    assert_relative_eq!(profile.pv[1], 1_300.0, epsilon = 1e-9);
    assert_relative_eq!(profile.end_inventory, 0.0, epsilon = 1e-9);
}

#[test]
fn test_withdrawal_fuel_intrinsic_value() {
    let jan = d(2021, 1, 1);
    let feb = d(2021, 2, 1);
    let storage = StorageSpecification::builder(Frequency::Monthly, jan, d(2021, 3, 1))
        .simple_constraints(0.0, 100.0, 100.0, 100.0)
        .withdrawal_fuel(0.02)
        .build()
        .unwrap();
    let forward = ForwardCurve::from_points(vec![(jan, 10.0), (feb, 15.0)]).unwrap();
    let rates = InterestRateCurve::flat(0.0);
    let model = one_factor(0.5);
    let req = request(&storage, jan, 0.0, &forward, &rates, &model, "1 + s");
    let config = LsmcConfig::builder().num_paths(1).build().unwrap();

    let result = intrinsic_value(&req, &config).unwrap();

    // Withdrawing 100 delivers 98 to market.
    assert_relative_eq!(result.npv, -1_000.0 + 98.0 * 15.0, epsilon = 1e-9);
    assert_relative_eq!(result.deltas[1], 98.0, epsilon = 1e-9);
    assert_relative_eq!(result.intrinsic_profile.consumed[1], 2.0, epsilon = 1e-9);
    assert_eq!(result.intrinsic_profile.withdrawn, vec![0.0, 100.0]);
}

#[test]
fn test_linear_ratchets_with_outage_intrinsic_value() {
    let start = d(2021, 1, 1);
    // Injection falls from 20 to 10 and withdrawal rises from 10 to 30 as
    // the facility fills.
    let schedule = ConstraintSchedule::builder()
        .entry(start)
        .point(0.0, 10.0, 20.0)
        .point(100.0, 30.0, 10.0)
        .build(RatchetInterp::Linear)
        .unwrap();
    let storage = StorageSpecification::builder(Frequency::Daily, start, d(2021, 1, 5))
        .ratchets(schedule)
        .maintenance(MaintenanceOutage::full(d(2021, 1, 2), d(2021, 1, 3)))
        .build()
        .unwrap();
    let forward = ForwardCurve::daily(start, vec![10.0, 8.0, 30.0, 25.0, 25.0]).unwrap();
    let rates = InterestRateCurve::flat(0.0);
    let model = one_factor(0.5);
    let req = request(&storage, start, 0.0, &forward, &rates, &model, "1 + s");
    let config = LsmcConfig::builder().num_paths(1).build().unwrap();

    let result = intrinsic_value(&req, &config).unwrap();

    // Inject 20 on day one; the outage blocks buying at 8 on day two. At 20
    // the ratchet allows 10 + 0.2 * 20 = 14 out at 30, leaving 6 for 25.
    assert_relative_eq!(result.npv, -200.0 + 14.0 * 30.0 + 6.0 * 25.0, epsilon = 1e-9);
    let profile = &result.intrinsic_profile;
    let expected_inventory = [0.0, 20.0, 20.0, 6.0];
    let expected_volume = [20.0, 0.0, -14.0, -6.0];
    for k in 0..4 {
        assert_relative_eq!(profile.inventory[k], expected_inventory[k], epsilon = 1e-9);
        assert_relative_eq!(profile.net_volume[k], expected_volume[k], epsilon = 1e-9);
    }
}

#[test]
fn test_zero_volatility_has_no_extrinsic_value() {
    let start = d(2021, 6, 1);
    let storage = daily_storage(start, 40);
    let forward = seasonal_curve(start, 60);
    let rates = InterestRateCurve::flat(0.02);
    let model = one_factor(0.0);
    let req = request(&storage, start, 0.0, &forward, &rates, &model, "1 + s + s**2 + x0");
    let config = LsmcConfig::builder().num_paths(64).seed(3).grid_points(21).build().unwrap();

    let result = value_storage(&req, &config, None).unwrap();

    assert!(result.intrinsic_npv > 0.0);
    assert_relative_eq!(result.npv, result.intrinsic_npv, max_relative = 1e-9);
    assert!(result.extrinsic_npv.abs() <= 1e-9 * result.intrinsic_npv);
    assert!(result.npv_std_error <= 1e-9 * result.intrinsic_npv);
}

#[test]
fn test_seeded_valuation_is_reproducible() {
    let start = d(2021, 6, 1);
    let storage = daily_storage(start, 30);
    let forward = seasonal_curve(start, 60);
    let rates = InterestRateCurve::flat(0.02);
    let model = one_factor(0.8);
    let req = request(&storage, start, 20.0, &forward, &rates, &model, "1 + s + s**2");
    let config = LsmcConfig::builder().num_paths(200).seed(11).grid_points(21).build().unwrap();

    let first = value_storage(&req, &config, None).unwrap();
    let second = value_storage(&req, &config, None).unwrap();
    assert_eq!(first, second);

    let other_forward = LsmcConfig::builder()
        .num_paths(200)
        .seed(11)
        .forward_seed(12)
        .grid_points(21)
        .build()
        .unwrap();
    let third = value_storage(&req, &other_forward, None).unwrap();
    assert_ne!(first.npv, third.npv);
    assert_eq!(first.intrinsic_npv, third.intrinsic_npv);
}

#[test]
fn test_two_factor_ratchet_valuation_is_independent_of_thread_count() {
    let start = d(2019, 12, 1);
    let schedule = ConstraintSchedule::builder()
        .entry(start)
        .point(0.0, 150.0, 250.0)
        .point(2_000.0, 200.0, 175.0)
        .point(5_000.0, 260.0, 155.0)
        .point(7_000.0, 275.0, 132.0)
        .build(RatchetInterp::Linear)
        .unwrap();
    let storage = StorageSpecification::builder(Frequency::Daily, start, d(2020, 4, 1))
        .ratchets(schedule)
        .injection_cost(0.01)
        .withdrawal_cost(0.025)
        .build()
        .unwrap();
    let forward = ForwardCurve::from_points(vec![
        (start, 18.5),
        (d(2020, 1, 1), 19.2),
        (d(2020, 2, 1), 18.9),
        (d(2020, 3, 1), 17.6),
    ])
    .unwrap();
    let rates = InterestRateCurve::flat(0.03);
    let model = MultiFactorModel::new(vec![Factor::new(16.2, 1.15), Factor::new(0.0, 0.14)], 0.64).unwrap();
    let req = request(&storage, start, 0.0, &forward, &rates, &model, "1 + x0 + x1 + s + s**2");
    let config = LsmcConfig::builder().num_paths(500).seed(11).build().unwrap();

    let run_on = |threads: usize| {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .unwrap()
            .install(|| value_storage(&req, &config, None).unwrap())
    };
    let single = run_on(1);
    let pooled = run_on(4);
    let repeated = run_on(4);

    assert_eq!(single.npv.to_bits(), pooled.npv.to_bits());
    assert_eq!(single, pooled);
    assert_eq!(pooled, repeated);
    assert!(single.intrinsic_npv > 0.0);
    assert!(single.npv > single.intrinsic_npv);
}

#[test]
fn test_three_factor_seasonal_valuation() {
    let start = d(2021, 6, 1);
    let storage = daily_storage(start, 30);
    let forward = seasonal_curve(start, 60);
    let rates = InterestRateCurve::flat(0.005);
    let model = MultiFactorModel::three_factor_seasonal(91.0, 0.85, 0.30, 0.19).unwrap();
    let basis = "1 + x_st + x_sw + x_lt + s + x_st**2 + s**2";
    let req = request(&storage, start, 0.0, &forward, &rates, &model, basis);
    let config = LsmcConfig::builder().num_paths(300).seed(12).grid_points(21).build().unwrap();

    let result = value_storage(&req, &config, None).unwrap();

    assert!(result.intrinsic_npv > 0.0);
    assert!(result.npv > result.intrinsic_npv);
    assert_relative_eq!(result.extrinsic_npv, result.npv - result.intrinsic_npv);
    assert!(result.npv_std_error > 0.0);
    assert_eq!(result.deltas.len(), 30);
    assert_eq!(result.trigger_prices.len(), 30);
    assert_eq!(result, value_storage(&req, &config, None).unwrap());
}

#[test]
fn test_volatility_adds_value() {
    let start = d(2021, 6, 1);
    let storage = daily_storage(start, 30);
    let forward = seasonal_curve(start, 60);
    let rates = InterestRateCurve::flat(0.0);
    let model = one_factor(1.2);
    let req = request(&storage, start, 0.0, &forward, &rates, &model, "1 + s + s**2");
    let config = LsmcConfig::builder()
        .num_paths(400)
        .seed(5)
        .forward_seed(6)
        .grid_points(21)
        .keep_panels(true)
        .build()
        .unwrap();

    let result = value_storage(&req, &config, None).unwrap();

    assert!(result.npv > result.intrinsic_npv);
    assert_relative_eq!(result.extrinsic_npv, result.npv - result.intrinsic_npv);
    assert_eq!(result.deltas.len(), 30);
    assert_eq!(result.expected_profile.len(), 30);
    assert!(result
        .expected_profile
        .inventory
        .iter()
        .all(|&v| (-1e-9..=100.0 + 1e-9).contains(&v)));

    let panels = result.panels.unwrap();
    assert_eq!(panels.spot.num_paths(), 400);
    for p in 0..400 {
        let net = panels.net_volume.get(3, p);
        assert_relative_eq!(
            panels.inventory.get(4, p),
            panels.inventory.get(3, p) + net,
            epsilon = 1e-9
        );
    }
}

#[test]
fn test_starting_inventory_outside_bounds_is_infeasible() {
    let start = d(2021, 6, 1);
    let storage = daily_storage(start, 30);
    let forward = seasonal_curve(start, 60);
    let rates = InterestRateCurve::flat(0.0);
    let model = one_factor(0.5);
    let req = request(&storage, start, 150.0, &forward, &rates, &model, "1 + s");
    let config = LsmcConfig::builder().num_paths(10).build().unwrap();

    let err = value_storage(&req, &config, None).unwrap_err();
    assert!(err.is_infeasible(), "unexpected error {err:?}");

    // Too full to empty by the end at 10 per day.
    let storage = daily_storage(start, 5);
    let req = request(&storage, start, 80.0, &forward, &rates, &model, "1 + s");
    assert!(value_storage(&req, &config, None).unwrap_err().is_infeasible());
}

#[test]
fn test_unknown_basis_variable_fails_before_simulation() {
    let start = d(2021, 6, 1);
    let storage = daily_storage(start, 30);
    let forward = seasonal_curve(start, 60);
    let rates = InterestRateCurve::flat(0.0);
    let model = one_factor(0.5);
    let req = request(&storage, start, 0.0, &forward, &rates, &model, "1 + s + x_lt");
    let config = LsmcConfig::builder().num_paths(10).build().unwrap();

    let err = value_storage(&req, &config, None).unwrap_err();
    assert!(matches!(
        err,
        ValuationError::Basis(BasisError::UnknownBasisVariable { ref name, .. }) if name == "x_lt"
    ));
    assert!(err.is_configuration_error());
}

#[test]
fn test_negative_inventory_rejected() {
    let start = d(2021, 6, 1);
    let storage = daily_storage(start, 30);
    let forward = seasonal_curve(start, 60);
    let rates = InterestRateCurve::flat(0.0);
    let model = one_factor(0.5);
    let req = request(&storage, start, -1.0, &forward, &rates, &model, "1 + s");
    let config = LsmcConfig::builder().num_paths(10).build().unwrap();
    assert!(matches!(
        value_storage(&req, &config, None),
        Err(ValuationError::InvalidRequest(_))
    ));
}

#[test]
fn test_finer_grid_does_not_lower_intrinsic_value() {
    let start = d(2021, 6, 1);
    let storage = daily_storage(start, 30);
    let forward = seasonal_curve(start, 60);
    let rates = InterestRateCurve::flat(0.01);
    let model = one_factor(0.5);
    let req = request(&storage, start, 0.0, &forward, &rates, &model, "1 + s");

    let npvs: Vec<f64> = [11, 21, 41, 101]
        .iter()
        .map(|&n| {
            let config = LsmcConfig::builder().num_paths(1).grid_points(n).build().unwrap();
            intrinsic_value(&req, &config).unwrap().npv
        })
        .collect();
    for pair in npvs.windows(2) {
        assert!(pair[1] >= pair[0] - 1e-9, "NPV fell from {} to {}", pair[0], pair[1]);
    }
}

#[test]
fn test_finer_grid_does_not_lower_seeded_value() {
    let start = d(2021, 6, 1);
    let storage = daily_storage(start, 30);
    let forward = seasonal_curve(start, 60);
    let rates = InterestRateCurve::flat(0.01);
    let model = one_factor(0.8);
    let req = request(&storage, start, 0.0, &forward, &rates, &model, "1 + s + s**2");

    // Same seed throughout: only the inventory grid changes.
    let npvs: Vec<f64> = [11, 21, 41, 81]
        .iter()
        .map(|&n| {
            let config = LsmcConfig::builder().num_paths(200).seed(7).grid_points(n).build().unwrap();
            value_storage(&req, &config, None).unwrap().npv
        })
        .collect();
    for pair in npvs.windows(2) {
        assert!(
            pair[1] >= pair[0] - 1e-9 * pair[0].abs().max(1.0),
            "NPV fell from {} to {}",
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn test_expired_storage_is_worthless() {
    let start = d(2021, 6, 1);
    let storage = daily_storage(start, 30);
    let forward = seasonal_curve(start, 60);
    let rates = InterestRateCurve::flat(0.0);
    let model = one_factor(0.5);
    let req = request(&storage, d(2021, 8, 1), 50.0, &forward, &rates, &model, "1 + s");
    let config = LsmcConfig::builder().num_paths(10).build().unwrap();

    let result = value_storage(&req, &config, None).unwrap();
    assert_eq!(result.npv, 0.0);
    assert!(result.deltas.is_empty());
    assert!(result.trigger_prices.is_empty());
}

#[test]
fn test_valuation_on_end_date() {
    let start = d(2021, 6, 1);
    let end = start.add_days(30);
    let forward = seasonal_curve(start, 60);
    let rates = InterestRateCurve::flat(0.0);
    let model = one_factor(0.5);
    let config = LsmcConfig::builder().num_paths(10).build().unwrap();

    let empty = daily_storage(start, 30);
    let req = request(&empty, end, 0.0, &forward, &rates, &model, "1 + s");
    let result = value_storage(&req, &config, None).unwrap();
    assert_eq!(result.npv, 0.0);
    assert!(result.dates.is_empty());

    let req = request(&empty, end, 10.0, &forward, &rates, &model, "1 + s");
    assert!(value_storage(&req, &config, None).unwrap_err().is_infeasible());

    let valued = StorageSpecification::builder(Frequency::Daily, start, end)
        .simple_constraints(0.0, 100.0, 10.0, 10.0)
        .terminal(TerminalCondition::value(|spot, inventory| 0.9 * spot * inventory))
        .build()
        .unwrap();
    let req = request(&valued, end, 10.0, &forward, &rates, &model, "1 + s");
    let result = value_storage(&req, &config, None).unwrap();
    let expected = 0.9 * forward.price(end).unwrap() * 10.0;
    assert_relative_eq!(result.npv, expected, max_relative = 1e-12);
}

#[test]
fn test_progress_is_ascending_and_can_cancel() {
    let start = d(2021, 6, 1);
    let storage = daily_storage(start, 10);
    let forward = seasonal_curve(start, 60);
    let rates = InterestRateCurve::flat(0.0);
    let model = one_factor(0.5);
    let req = request(&storage, start, 0.0, &forward, &rates, &model, "1 + s");
    let config = LsmcConfig::builder().num_paths(50).grid_points(11).build().unwrap();

    let seen = Mutex::new(Vec::new());
    let record = |fraction: f64| -> ControlFlow<()> {
        seen.lock().unwrap().push(fraction);
        ControlFlow::Continue(())
    };
    value_storage(&req, &config, Some(&record)).unwrap();
    let seen = seen.into_inner().unwrap();
    assert_eq!(seen.len(), 11);
    assert!(seen.windows(2).all(|w| w[1] > w[0]));
    assert!(seen.iter().all(|&f| (0.0..=1.0).contains(&f)));
    assert_eq!(*seen.last().unwrap(), 1.0);

    let cancel = |_: f64| -> ControlFlow<()> { ControlFlow::Break(()) };
    assert!(matches!(
        value_storage(&req, &config, Some(&cancel)),
        Err(ValuationError::Cancelled)
    ));
}
