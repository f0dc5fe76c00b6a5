use std::f64::consts::PI;

use preload_core::calculations::preload::{
    calculate_final_torque, calculate_final_torque_with, calculate_preload, FinalTorqueMethod,
};
use preload_core::calculations::torque::{classify_risk, RiskLevel};
use proptest::prelude::*;

/// Valid `(tightening, removal, pitch)` triples.
fn measurement_strategy() -> impl Strategy<Value = (f64, f64, f64)> {
    (1.0f64..100.0, 0.0f64..0.99, 0.01f64..0.2).prop_map(|(tt, removal_fraction, pitch)| {
        (tt, tt * removal_fraction, pitch)
    })
}

fn relative_eq(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol * a.abs().max(b.abs()).max(1.0)
}

proptest! {
    /// P = (Tt - Tr)·π / p
    #[test]
    fn preload_matches_formula((tt, tr, p) in measurement_strategy()) {
        let preload = calculate_preload(tt, tr, p).unwrap();
        prop_assert!(relative_eq(preload, (tt - tr) * PI / p, 1e-9));
        prop_assert!(preload > 0.0);
    }

    /// Larger torque difference, larger preload
    #[test]
    fn preload_increases_with_torque_difference(
        (tt, tr, p) in measurement_strategy(),
        extra in 0.1f64..50.0,
    ) {
        let base = calculate_preload(tt, tr, p).unwrap();
        let more = calculate_preload(tt + extra, tr, p).unwrap();
        prop_assert!(more > base);
    }

    /// Finer pitch, larger preload
    #[test]
    fn preload_decreases_with_pitch(
        (tt, tr, p) in measurement_strategy(),
        extra in 0.001f64..0.1,
    ) {
        let fine = calculate_preload(tt, tr, p).unwrap();
        let coarse = calculate_preload(tt, tr, p + extra).unwrap();
        prop_assert!(coarse < fine);
    }

    /// Asking for the preload already present returns the original torque
    #[test]
    fn final_torque_round_trip((tt, tr, p) in measurement_strategy()) {
        let preload = calculate_preload(tt, tr, p).unwrap();
        let final_torque = calculate_final_torque(tt, tr, preload, preload, p).unwrap();
        prop_assert!(relative_eq(final_torque, tt, 1e-9));
    }

    /// Both forms agree when the initial preload comes from the same measurement
    #[test]
    fn exact_and_ratio_forms_agree(
        (tt, tr, p) in measurement_strategy(),
        factor in 0.1f64..5.0,
    ) {
        let initial = calculate_preload(tt, tr, p).unwrap();
        let desired = initial * factor;
        let exact = calculate_final_torque_with(FinalTorqueMethod::Exact, tt, tr, initial, desired, p).unwrap();
        let ratio = calculate_final_torque_with(FinalTorqueMethod::Ratio, tt, tr, initial, desired, p).unwrap();
        prop_assert!(relative_eq(exact, ratio, 1e-9));
    }

    /// Final torque is linear in the desired preload
    #[test]
    fn doubling_desired_preload_doubles_torque(
        (tt, tr, p) in measurement_strategy(),
        desired in 10.0f64..2000.0,
    ) {
        let initial = calculate_preload(tt, tr, p).unwrap();
        let single = calculate_final_torque(tt, tr, initial, desired, p).unwrap();
        let double = calculate_final_torque(tt, tr, initial, 2.0 * desired, p).unwrap();
        prop_assert!(relative_eq(double, 2.0 * single, 1e-12));
    }

    /// Repeated calls are bit-identical
    #[test]
    fn calculations_are_idempotent((tt, tr, p) in measurement_strategy()) {
        let a = calculate_preload(tt, tr, p).unwrap();
        let b = calculate_preload(tt, tr, p).unwrap();
        prop_assert_eq!(a.to_bits(), b.to_bits());
    }

    /// Removal at or above tightening is always invalid
    #[test]
    fn removal_not_below_tightening_rejected(
        tt in 1.0f64..100.0,
        excess in 0.0f64..50.0,
        p in 0.01f64..0.2,
    ) {
        let err = calculate_preload(tt, tt + excess, p).unwrap_err();
        prop_assert!(err.is_validation());
    }

    /// Risk never improves as the safety factor drops
    #[test]
    fn risk_is_monotonic(a in 0.0f64..10.0, b in 0.0f64..10.0) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(classify_risk(low) >= classify_risk(high));
    }
}

#[test]
fn risk_level_ordering_is_severity() {
    assert!(RiskLevel::Low < RiskLevel::Medium);
    assert!(RiskLevel::Medium < RiskLevel::High);
}
