//! Bundled catalogs, checked against the engine end to end.

use preload_core::calculations::comparison::{compare_system, MethodComparisonInput};
use preload_core::calculations::preload::{calculate_final_torque, calculate_preload, TorqueMeasurement};
use preload_core::calculations::torque::{
    assess_stress, estimate_conventional_preload, tensile_stress_area_mm2, tensile_stress_diameter_mm, RiskLevel,
};
use preload_core::catalog::{builtin_catalog, BuiltinCatalog, ImplantCatalog, SchemaVersion};
use preload_core::errors::CalcError;
use preload_core::settings::AnalysisSettings;

fn sample() -> &'static ImplantCatalog {
    builtin_catalog(BuiltinCatalog::Sample).unwrap()
}

fn enhanced() -> &'static ImplantCatalog {
    builtin_catalog(BuiltinCatalog::Enhanced).unwrap()
}

#[test]
fn golden_preload_vector() {
    let preload = calculate_preload(35.0, 29.5, 0.04).unwrap();
    // 5.5 · π / 0.04
    assert!((preload - 431.969).abs() < 0.001);
}

#[test]
fn golden_final_torque_doubles_with_desired_preload() {
    let initial = calculate_preload(25.0, 21.4, 0.04).unwrap();
    let at_400 = calculate_final_torque(25.0, 21.4, initial, 400.0, 0.04).unwrap();
    let at_800 = calculate_final_torque(25.0, 21.4, initial, 800.0, 0.04).unwrap();

    assert!((at_400 - 35.368).abs() < 0.001);
    assert!((at_800 - 2.0 * at_400).abs() < 1e-9);
}

#[test]
fn golden_conventional_vector() {
    let preload = estimate_conventional_preload(35.0, 0.04, 0.16, 0.2, 0.2).unwrap();
    assert!((preload - 875.0).abs() < 1e-9);

    let area = tensile_stress_area_mm2(2.0, 0.4).unwrap();
    assert!((area - 2.074).abs() < 0.001);
}

#[test]
fn equal_torques_are_rejected() {
    match calculate_preload(35.0, 35.0, 0.04).unwrap_err() {
        CalcError::Validation { field, .. } => assert_eq!(field, "removal_torque_ncm"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn both_schemas_load_through_one_loader() {
    assert_eq!(sample().schema, SchemaVersion::V1);
    assert_eq!(enhanced().schema, SchemaVersion::V2);

    let mut shared = 0;
    for (manufacturer, system, v1) in sample().iter_systems() {
        let Ok(v2) = enhanced().system(manufacturer, system) else {
            continue;
        };
        shared += 1;

        assert_eq!(v1.standard_screw.diameter_mm, v2.standard_screw.diameter_mm);
        assert_eq!(v1.standard_screw.thread_pitch_mm, v2.standard_screw.thread_pitch_mm);
        assert_eq!(v1.platform_diameters_mm, v2.platform_diameters_mm);

        let screw = enhanced().screw(manufacturer, system, "standard").unwrap();
        assert!(screw.thread_pitch_cm() > 0.0);
    }
    assert_eq!(shared, sample().len());
}

#[test]
fn enhanced_catalog_carries_v2_fields() {
    let nobel = enhanced().system("Nobel_Biocare", "NobelActive").unwrap();
    assert!(!nobel.implant_lengths_mm.is_empty());
    assert!(nobel.standard_screw.torque_range.is_some());
    assert!(nobel.standard_screw.coating.is_some());
    assert!(nobel.screw("prosthetic").is_ok());

    assert!(enhanced().manufacturers().any(|m| m == "Zimmer_Biomet"));
    assert!(sample().manufacturers().all(|m| m != "Zimmer_Biomet"));
}

#[test]
fn human_typed_keys_resolve() {
    let screw = enhanced().standard_screw("nobel biocare", "nobelactive").unwrap();
    assert_eq!(screw.diameter_mm, 2.0);

    let err = enhanced().system("Nobel Biocare", "Unknown").unwrap_err();
    assert!(err.is_catalog_lookup());
    assert!(err.to_string().contains("system"));
}

#[test]
fn every_bundled_system_is_plausible() {
    let settings = AnalysisSettings::default();

    for catalog in [sample(), enhanced()] {
        for (manufacturer, system, spec) in catalog.iter_systems() {
            let row = compare_system(manufacturer, system, spec, &settings).unwrap();
            let conventional = row.comparison.conventional.preload_n;
            let wadhwani_hess = row.comparison.wadhwani_hess.preload_n;

            assert!(
                (200.0..=1500.0).contains(&conventional),
                "{manufacturer}/{system}: conventional {conventional}"
            );
            assert!(
                (200.0..=1500.0).contains(&wadhwani_hess),
                "{manufacturer}/{system}: W-H {wadhwani_hess}"
            );
            assert!(row.comparison.conventional.stress.below_yield(), "{manufacturer}/{system}");
            assert_ne!(row.comparison.wadhwani_hess.stress.risk_level, RiskLevel::High);
        }
    }
}

#[test]
fn measurement_from_catalog_screw_matches_manual_units() {
    let screw = enhanced().standard_screw("Straumann", "Bone_Level").unwrap();
    let from_screw = TorqueMeasurement::from_screw(screw, 35.0, 29.5).unwrap().preload().unwrap();
    let manual = calculate_preload(35.0, 29.5, 0.045).unwrap();
    assert!((from_screw.preload_n - manual).abs() < 1e-9);

    let stress_diameter = tensile_stress_diameter_mm(screw.diameter_mm, screw.thread_pitch_mm).unwrap();
    let assessment = assess_stress(from_screw.preload_n, stress_diameter, screw.yield_strength_mpa).unwrap();
    assert_eq!(assessment.risk_level, RiskLevel::Low);

    let input = MethodComparisonInput::from_screw(screw, 0.85, false);
    assert!((input.thread_pitch_cm - 0.045).abs() < 1e-12);
}

#[test]
fn out_of_range_k_factor_fails_at_load_naming_the_system() {
    let screw = |k: f64| {
        format!(
            r#"{{"standard": {{
                "diameter": 2.0, "thread_pitch": 0.4, "head_diameter": 2.4,
                "material": "Ti", "yield_strength": 880, "elastic_modulus": 114,
                "coefficient_of_friction": 0.16, "K_factor": {k}, "recommended_torque": 30
            }}}}"#
        )
    };
    let system = |k: f64| {
        format!(
            r#"{{"connection_type": "External hex", "diameters": [4.0],
                "materials": {{"implant": "Ti", "abutment": "Ti", "screw": "Ti"}},
                "screws": {}}}"#,
            screw(k)
        )
    };
    let json = format!(
        r#"{{"metadata": {{"version": "1.0.0"}},
            "implant_systems": {{"Acme": {{"Good": {}, "Loose": {}}}}}}}"#,
        system(0.2),
        system(1.5)
    );

    match ImplantCatalog::from_json_str(&json).unwrap_err() {
        CalcError::Validation { field, .. } => assert_eq!(field, "Acme.Loose.screws.standard.K_factor"),
        other => panic!("unexpected error: {other:?}"),
    }
}
