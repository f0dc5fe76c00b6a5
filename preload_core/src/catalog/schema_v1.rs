//! Legacy (v1) catalog layout.
//!
//! ```json
//! {
//!   "metadata": { "version": "1.0.0", "date": "...", "source": "..." },
//!   "implant_systems": {
//!     "Nobel_Biocare": {
//!       "Branemark": {
//!         "connection_type": "External hex",
//!         "diameters": [3.3, 3.75, 4.0, 5.0],
//!         "materials": { "implant": "...", "abutment": "...", "screw": "..." },
//!         "screws": {
//!           "standard": {
//!             "diameter": 2.0, "thread_pitch": 0.4, "head_diameter": 2.5,
//!             "material": "...", "yield_strength": 880, "elastic_modulus": 114,
//!             "coefficient_of_friction": 0.16, "K_factor": 0.2,
//!             "recommended_torque": 35
//!           }
//!         }
//!       }
//!     }
//!   }
//! }
//! ```

use std::collections::BTreeMap;

use serde::Deserialize;

use super::{ImplantSystemSpec, MaterialSet, ScrewSpec, SystemMap, STANDARD_SCREW};
use crate::errors::{CalcError, CalcResult};

#[derive(Debug, Deserialize)]
struct RawCatalog {
    implant_systems: BTreeMap<String, BTreeMap<String, RawSystem>>,
}

#[derive(Debug, Deserialize)]
struct RawSystem {
    connection_type: String,
    diameters: Vec<f64>,
    materials: MaterialSet,
    screws: BTreeMap<String, RawScrew>,
}

/// Screw record common to both schema versions.
#[derive(Debug, Clone, Deserialize)]
pub(super) struct RawScrew {
    pub diameter: f64,
    pub thread_pitch: f64,
    pub head_diameter: f64,
    pub material: String,
    pub yield_strength: f64,
    pub elastic_modulus: f64,
    pub coefficient_of_friction: f64,
    #[serde(rename = "K_factor")]
    pub k_factor: f64,
    pub recommended_torque: f64,
}

impl RawScrew {
    pub(super) fn into_spec(self) -> ScrewSpec {
        ScrewSpec {
            diameter_mm: self.diameter,
            thread_pitch_mm: self.thread_pitch,
            head_diameter_mm: self.head_diameter,
            material: self.material,
            yield_strength_mpa: self.yield_strength,
            elastic_modulus_gpa: self.elastic_modulus,
            coefficient_of_friction: self.coefficient_of_friction,
            k_factor: self.k_factor,
            recommended_torque_ncm: self.recommended_torque,
            torque_range: None,
            total_length_mm: None,
            thread_length_mm: None,
            coating: None,
            surface_treatment: None,
        }
    }
}

/// Split a screw map into the mandatory standard screw and the rest.
pub(super) fn split_screws(
    mut screws: BTreeMap<String, ScrewSpec>,
    path: &str,
) -> CalcResult<(ScrewSpec, BTreeMap<String, ScrewSpec>)> {
    let standard = screws
        .remove(STANDARD_SCREW)
        .ok_or_else(|| CalcError::missing_field(format!("{}.screws.{}", path, STANDARD_SCREW)))?;

    standard.validate(&format!("{}.screws.{}", path, STANDARD_SCREW))?;
    for (name, screw) in &screws {
        screw.validate(&format!("{}.screws.{}", path, name))?;
    }
    Ok((standard, screws))
}

pub(super) fn require_diameters(diameters: &[f64], path: &str, field: &str) -> CalcResult<()> {
    if diameters.is_empty() {
        return Err(CalcError::missing_field(format!("{}.{}", path, field)));
    }
    Ok(())
}

/// Parse a v1 document into the normalized system map.
pub(super) fn parse(json: &str) -> CalcResult<BTreeMap<String, SystemMap>> {
    let raw: RawCatalog = serde_json::from_str(json)
        .map_err(|e| CalcError::serialization(format!("Invalid v1 catalog: {}", e)))?;

    let mut out = BTreeMap::new();
    for (manufacturer, systems) in raw.implant_systems {
        let mut normalized = SystemMap::new();
        for (name, system) in systems {
            let path = format!("{}.{}", manufacturer, name);
            require_diameters(&system.diameters, &path, "diameters")?;

            let screws = system
                .screws
                .into_iter()
                .map(|(component, screw)| (component, screw.into_spec()))
                .collect();
            let (standard_screw, other_screws) = split_screws(screws, &path)?;

            normalized.insert(
                name,
                ImplantSystemSpec {
                    connection_type: system.connection_type,
                    platform_diameters_mm: system.diameters,
                    materials: system.materials,
                    standard_screw,
                    other_screws,
                    implant_lengths_mm: Vec::new(),
                    notes: None,
                },
            );
        }
        out.insert(manufacturer, normalized);
    }
    Ok(out)
}
