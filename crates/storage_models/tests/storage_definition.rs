//! Integration tests for facility construction and model moments through
//! the public API.

use approx::assert_relative_eq;
use storage_core::types::Date;
use storage_models::models::{Factor, MultiFactorModel};
use storage_models::schedules::Frequency;
use storage_models::storage::{
    build_storage, RatchetEntry, RatchetInterp, RatchetPoint, StorageConstraints, StorageParams,
};
use storage_models::StorageError;

fn d(y: i32, m: u32, day: u32) -> Date {
    Date::from_ymd(y, m, day).unwrap()
}

fn ratchet_params() -> StorageParams {
    StorageParams {
        frequency: Frequency::Daily,
        start: d(2019, 12, 1),
        end: d(2020, 4, 1),
        injection_cost: 0.01,
        withdrawal_cost: 0.025,
        constraints: StorageConstraints::Ratchets {
            entries: vec![
                RatchetEntry {
                    date: d(2019, 12, 1),
                    points: vec![
                        RatchetPoint::new(0.0, 150.0, 250.0),
                        RatchetPoint::new(2_000.0, 200.0, 210.0),
                        RatchetPoint::new(5_000.0, 260.0, 135.0),
                    ],
                },
                RatchetEntry {
                    date: d(2020, 2, 1),
                    points: vec![
                        RatchetPoint::new(0.0, 130.0, 260.0),
                        RatchetPoint::new(2_000.0, 190.0, 243.0),
                        RatchetPoint::new(5_000.0, 230.0, 120.0),
                    ],
                },
            ],
            interpolation: RatchetInterp::Linear,
        },
        injection_fuel: 0.0,
        withdrawal_fuel: 0.0,
    }
}

#[test]
fn test_ratchet_storage_from_params() {
    let storage = build_storage(&ratchet_params()).unwrap();

    let early = storage.constraints_at(d(2020, 1, 15), 1_000.0).unwrap();
    assert_relative_eq!(early.max_injection_rate, 230.0, epsilon = 1e-9);
    assert_relative_eq!(early.max_withdrawal_rate, 175.0, epsilon = 1e-9);

    let late = storage.constraints_at(d(2020, 2, 15), 1_000.0).unwrap();
    assert_relative_eq!(late.max_injection_rate, 251.5, epsilon = 1e-9);
    assert_relative_eq!(late.max_withdrawal_rate, 160.0, epsilon = 1e-9);
}

#[test]
fn test_unsorted_breakpoints_rejected() {
    let mut params = ratchet_params();
    if let StorageConstraints::Ratchets { entries, .. } = &mut params.constraints {
        entries[0].points.swap(1, 2);
    }
    assert!(matches!(
        build_storage(&params),
        Err(StorageError::InvalidStorageConfiguration(_))
    ));
}

#[test]
fn test_params_deserialise_from_json() {
    let json = r#"{
        "frequency": "monthly",
        "start": "2021-04-01",
        "end": "2022-04-01",
        "injection_cost": 0.1,
        "withdrawal_cost": 0.1,
        "constraints": {
            "type": "simple",
            "min_inventory": 0.0,
            "max_inventory": 10000.0,
            "max_injection_rate": 2500.0,
            "max_withdrawal_rate": 3000.0
        }
    }"#;
    let params: StorageParams = serde_json::from_str(json).unwrap();
    assert_eq!(params.injection_fuel, 0.0);
    let storage = build_storage(&params).unwrap();
    assert_eq!(storage.decision_dates(d(2021, 1, 1)).len(), 12);
    assert_eq!(storage.inventory_bounds(d(2021, 6, 1)).unwrap(), (0.0, 10_000.0));
}

#[test]
fn test_inventory_space_over_monthly_schedule() {
    let mut params = ratchet_params();
    params.frequency = Frequency::Monthly;
    let storage = build_storage(&params).unwrap();
    let mut dates = storage.decision_dates(d(2019, 12, 1));
    dates.push(storage.end());
    let space = storage.inventory_space(&dates, 0.0, 1e-10).unwrap();
    assert_eq!(space.bounds().len(), 5);
    assert_eq!(space.bounds()[4], (0.0, 0.0));
    // One month of injection from empty.
    assert_relative_eq!(space.bounds()[1].1, 250.0, epsilon = 1e-9);
}

#[test]
fn test_starting_inventory_outside_ratchet_bounds() {
    let storage = build_storage(&ratchet_params()).unwrap();
    let dates = vec![d(2019, 12, 1), d(2019, 12, 2)];
    let err = storage.inventory_space(&dates, 6_000.0, 1e-10).unwrap_err();
    assert!(matches!(err, StorageError::InfeasibleConstraint { .. }));
}

#[test]
fn test_two_factor_moments() {
    let model = MultiFactorModel::new(vec![Factor::new(16.2, 1.15), Factor::new(0.0, 0.14)], 0.64).unwrap();
    let val = d(2019, 12, 1);
    let fwd = d(2020, 3, 1);

    // Far in the past relative to delivery the long-term factor dominates.
    let vol = model.integrated_vol(val, d(2019, 12, 2), fwd).unwrap();
    assert!(vol > 0.14 && vol < 0.2);

    let near = model.integrated_vol(d(2020, 2, 28), d(2020, 2, 29), fwd).unwrap();
    assert!(near > 1.0);

    let corr = model.integrated_correlation(val, d(2020, 1, 1), fwd, d(2020, 3, 2)).unwrap();
    assert!(corr > 0.99 && corr <= 1.0 + 1e-12);
}
