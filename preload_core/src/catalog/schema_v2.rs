//! Enhanced (v2) catalog layout.
//!
//! Differs from v1 in three places:
//! - `diameters` is renamed `platform_diameters`
//! - systems may list `implant_lengths` and free-text `notes`
//! - screws may carry `total_length`, `thread_length`, a `torque_range`
//!   object (`{"min": .., "max": ..}`), `coating` and `surface_treatment`

use std::collections::BTreeMap;

use serde::Deserialize;

use super::schema_v1::{require_diameters, split_screws, RawScrew};
use super::{ImplantSystemSpec, MaterialSet, ScrewSpec, SystemMap};
use crate::calculations::torque::TorqueRange;
use crate::errors::{CalcError, CalcResult};

#[derive(Debug, Deserialize)]
struct RawCatalog {
    implant_systems: BTreeMap<String, BTreeMap<String, RawSystem>>,
}

#[derive(Debug, Deserialize)]
struct RawSystem {
    connection_type: String,
    platform_diameters: Vec<f64>,
    materials: MaterialSet,
    #[serde(default)]
    implant_lengths: Vec<f64>,
    #[serde(default)]
    notes: Option<String>,
    screws: BTreeMap<String, RawScrewV2>,
}

#[derive(Debug, Deserialize)]
struct RawScrewV2 {
    #[serde(flatten)]
    base: RawScrew,
    #[serde(default)]
    total_length: Option<f64>,
    #[serde(default)]
    thread_length: Option<f64>,
    #[serde(default)]
    torque_range: Option<TorqueRange>,
    #[serde(default)]
    coating: Option<String>,
    #[serde(default)]
    surface_treatment: Option<String>,
}

impl RawScrewV2 {
    fn into_spec(self) -> ScrewSpec {
        ScrewSpec {
            torque_range: self.torque_range,
            total_length_mm: self.total_length,
            thread_length_mm: self.thread_length,
            coating: self.coating,
            surface_treatment: self.surface_treatment,
            ..self.base.into_spec()
        }
    }
}

/// Parse a v2 document into the normalized system map.
pub(super) fn parse(json: &str) -> CalcResult<BTreeMap<String, SystemMap>> {
    let raw: RawCatalog = serde_json::from_str(json)
        .map_err(|e| CalcError::serialization(format!("Invalid v2 catalog: {}", e)))?;

    let mut out = BTreeMap::new();
    for (manufacturer, systems) in raw.implant_systems {
        let mut normalized = SystemMap::new();
        for (name, system) in systems {
            let path = format!("{}.{}", manufacturer, name);
            require_diameters(&system.platform_diameters, &path, "platform_diameters")?;

            let screws = system
                .screws
                .into_iter()
                .map(|(component, screw)| (component, screw.into_spec()))
                .collect();
            let (standard_screw, other_screws) = split_screws(screws, &path)?;

            if standard_screw.torque_range.is_none() {
                tracing::warn!(system = %path, "v2 catalog entry has no torque range");
            }

            normalized.insert(
                name,
                ImplantSystemSpec {
                    connection_type: system.connection_type,
                    platform_diameters_mm: system.platform_diameters,
                    materials: system.materials,
                    standard_screw,
                    other_screws,
                    implant_lengths_mm: system.implant_lengths,
                    notes: system.notes,
                },
            );
        }
        out.insert(manufacturer, normalized);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use crate::catalog::{ImplantCatalog, SchemaVersion};

    const MINIMAL_V2: &str = r#"{
        "metadata": {"version": "2.0.0", "date": "2025-01-20", "source": "test"},
        "implant_systems": {
            "Acme_Dental": {
                "Tapered": {
                    "connection_type": "Internal hex",
                    "platform_diameters": [3.7, 4.7],
                    "materials": {"implant": "Ti", "abutment": "Ti", "screw": "Ti-6Al-4V"},
                    "implant_lengths": [8, 10, 11.5],
                    "notes": "Short screw",
                    "screws": {
                        "standard": {
                            "diameter": 2.0, "thread_pitch": 0.4, "head_diameter": 2.4,
                            "material": "Ti-6Al-4V", "yield_strength": 880, "elastic_modulus": 114,
                            "coefficient_of_friction": 0.16, "K_factor": 0.2, "recommended_torque": 30,
                            "total_length": 8.5, "thread_length": 3.0,
                            "torque_range": {"min": 25, "max": 30},
                            "coating": "Gold", "surface_treatment": "Anodized"
                        },
                        "prosthetic": {
                            "diameter": 1.4, "thread_pitch": 0.3, "head_diameter": 2.0,
                            "material": "Ti-6Al-4V", "yield_strength": 880, "elastic_modulus": 114,
                            "coefficient_of_friction": 0.16, "K_factor": 0.2, "recommended_torque": 15
                        }
                    }
                }
            }
        }
    }"#;

    #[test]
    fn test_parse_enhanced_fields() {
        let catalog = ImplantCatalog::from_json_str(MINIMAL_V2).unwrap();
        assert_eq!(catalog.schema, SchemaVersion::V2);

        let system = catalog.system("Acme_Dental", "Tapered").unwrap();
        assert_eq!(system.platform_diameters_mm, vec![3.7, 4.7]);
        assert_eq!(system.implant_lengths_mm, vec![8.0, 10.0, 11.5]);
        assert_eq!(system.notes.as_deref(), Some("Short screw"));

        let screw = &system.standard_screw;
        assert_eq!(screw.recommended_torque_ncm, 30.0);
        assert_eq!(screw.total_length_mm, Some(8.5));
        assert_eq!(screw.coating.as_deref(), Some("Gold"));
        let range = screw.torque_range.unwrap();
        assert_eq!((range.min, range.max), (25.0, 30.0));
    }

    #[test]
    fn test_optional_fields_default_to_none() {
        let catalog = ImplantCatalog::from_json_str(MINIMAL_V2).unwrap();
        let prosthetic = catalog.screw("Acme_Dental", "Tapered", "prosthetic").unwrap();
        assert!(prosthetic.torque_range.is_none());
        assert!(prosthetic.coating.is_none());
        assert_eq!(prosthetic.thread_pitch_mm, 0.3);

        let system = catalog.system("Acme_Dental", "Tapered").unwrap();
        assert_eq!(system.screw_components(), vec!["standard", "prosthetic"]);
    }

    #[test]
    fn test_v1_field_names_rejected_under_v2() {
        let json = MINIMAL_V2.replace("platform_diameters", "diameters");
        let err = ImplantCatalog::from_json_str(&json).unwrap_err();
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
    }

    #[test]
    fn test_inverted_torque_range_rejected() {
        let json = MINIMAL_V2.replace(r#"{"min": 25, "max": 30}"#, r#"{"min": 35, "max": 30}"#);
        let err = ImplantCatalog::from_json_str(&json).unwrap_err();
        assert!(err.is_validation());
    }
}
