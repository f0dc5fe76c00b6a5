//! # Implant Systems Catalog
//!
//! Read-only reference data for dental implant systems: connection geometry,
//! platform diameters, materials and abutment screw properties, keyed by
//! manufacturer → system → screw component.
//!
//! ## Schema versions
//!
//! Catalog files exist in two JSON layouts. Both load through
//! [`ImplantCatalog::from_json_str`], which reads `metadata.version` and
//! hands the document to the matching adapter:
//!
//! - **v1** (legacy, [`schema_v1`]): `diameters`, minimal screw record
//! - **v2** (enhanced, [`schema_v2`]): `platform_diameters`, plus optional
//!   screw lengths, torque range, coating and surface treatment
//!
//! Either way the result is the same normalized [`ImplantCatalog`].
//!
//! ## Example
//!
//! ```rust
//! use preload_core::catalog::{builtin_catalog, BuiltinCatalog};
//!
//! let catalog = builtin_catalog(BuiltinCatalog::Sample).unwrap();
//! let screw = catalog.standard_screw("Nobel_Biocare", "Branemark").unwrap();
//! assert_eq!(screw.thread_pitch_mm, 0.4);
//!
//! // Human-typed keys resolve too
//! assert!(catalog.system("nobel biocare", "branemark").is_ok());
//! ```

pub mod builtin;
pub mod schema_v1;
pub mod schema_v2;

pub use builtin::{builtin_catalog, default_catalog, BuiltinCatalog};

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calculations::torque::TorqueRange;
use crate::errors::{CalcError, CalcResult, CatalogLevel};
use crate::units::{Centimeters, MegaPascals, Millimeters, NewtonCm};

/// Name of the screw component every system must define
pub const STANDARD_SCREW: &str = "standard";

/// Catalog file schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVersion {
    V1,
    V2,
}

impl SchemaVersion {
    /// Select the schema from a semver-style `metadata.version` string.
    pub fn from_version_str(version: &str) -> CalcResult<Self> {
        let major = version
            .trim()
            .split('.')
            .next()
            .and_then(|p| p.parse::<u32>().ok());

        match major {
            Some(1) => Ok(SchemaVersion::V1),
            Some(2) => Ok(SchemaVersion::V2),
            _ => Err(CalcError::VersionMismatch {
                file_version: version.to_string(),
                expected_version: "1.x or 2.x".to_string(),
            }),
        }
    }
}

impl std::fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaVersion::V1 => write!(f, "v1"),
            SchemaVersion::V2 => write!(f, "v2"),
        }
    }
}

/// File header shared by both schema versions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogMetadata {
    pub version: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub source: String,
}

impl CatalogMetadata {
    /// Publication date, when `date` is an ISO `YYYY-MM-DD` string
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d").ok()
    }
}

/// Material descriptors for the implant, abutment and screw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialSet {
    pub implant: String,
    pub abutment: String,
    pub screw: String,
}

/// Abutment screw record, normalized across schema versions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrewSpec {
    /// Nominal thread diameter (mm)
    pub diameter_mm: f64,
    /// Thread pitch (mm)
    pub thread_pitch_mm: f64,
    /// Head diameter (mm)
    pub head_diameter_mm: f64,
    pub material: String,
    /// Yield strength (MPa)
    pub yield_strength_mpa: f64,
    /// Elastic modulus (GPa)
    pub elastic_modulus_gpa: f64,
    pub coefficient_of_friction: f64,
    pub k_factor: f64,
    /// Manufacturer recommended tightening torque (N·cm)
    pub recommended_torque_ncm: f64,

    // v2 only
    pub torque_range: Option<TorqueRange>,
    pub total_length_mm: Option<f64>,
    pub thread_length_mm: Option<f64>,
    pub coating: Option<String>,
    pub surface_treatment: Option<String>,
}

impl ScrewSpec {
    /// Thread pitch converted to the cm used by the preload formulas
    pub fn thread_pitch_cm(&self) -> f64 {
        Centimeters::from(Millimeters(self.thread_pitch_mm)).value()
    }

    /// Nominal diameter converted to the cm used by the K-factor relation
    pub fn diameter_cm(&self) -> f64 {
        Centimeters::from(Millimeters(self.diameter_mm)).value()
    }

    pub fn recommended_torque(&self) -> NewtonCm {
        NewtonCm(self.recommended_torque_ncm)
    }

    pub fn yield_strength(&self) -> MegaPascals {
        MegaPascals(self.yield_strength_mpa)
    }

    /// Check that every numeric property is a positive, finite number, and
    /// that friction and K-factor lie in (0, 1].
    ///
    /// `path` prefixes the reported field, e.g. `Straumann.Bone_Level.screws.standard`.
    pub fn validate(&self, path: &str) -> CalcResult<()> {
        let positive = [
            ("diameter", self.diameter_mm),
            ("thread_pitch", self.thread_pitch_mm),
            ("head_diameter", self.head_diameter_mm),
            ("yield_strength", self.yield_strength_mpa),
            ("elastic_modulus", self.elastic_modulus_gpa),
            ("coefficient_of_friction", self.coefficient_of_friction),
            ("K_factor", self.k_factor),
            ("recommended_torque", self.recommended_torque_ncm),
        ];
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(CalcError::validation(
                    format!("{}.{}", path, field),
                    value.to_string(),
                    "Catalog value must be a positive number",
                ));
            }
        }
        for (field, value) in [
            ("coefficient_of_friction", self.coefficient_of_friction),
            ("K_factor", self.k_factor),
        ] {
            if value > 1.0 {
                return Err(CalcError::validation(
                    format!("{}.{}", path, field),
                    value.to_string(),
                    "Catalog value must be in (0, 1]",
                ));
            }
        }
        if let Some(range) = &self.torque_range {
            if range.min > range.max {
                return Err(CalcError::validation(
                    format!("{}.torque_range", path),
                    format!("{}..{}", range.min, range.max),
                    "Torque range minimum exceeds maximum",
                ));
            }
        }
        Ok(())
    }
}

/// One implant system (e.g. Straumann Bone Level).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImplantSystemSpec {
    pub connection_type: String,
    /// Platform diameters in catalog order (mm)
    pub platform_diameters_mm: Vec<f64>,
    pub materials: MaterialSet,
    pub standard_screw: ScrewSpec,
    /// Additional screw components keyed by name (v2 catalogs may list them)
    #[serde(default)]
    pub other_screws: BTreeMap<String, ScrewSpec>,
    /// Available implant lengths (mm); empty for v1 catalogs
    #[serde(default)]
    pub implant_lengths_mm: Vec<f64>,
    pub notes: Option<String>,
}

impl ImplantSystemSpec {
    /// Look up a screw component; `"standard"` is always present.
    pub fn screw(&self, component: &str) -> CalcResult<&ScrewSpec> {
        if key_matches(STANDARD_SCREW, component) {
            return Ok(&self.standard_screw);
        }
        resolve(&self.other_screws, component)
            .map(|(_, screw)| screw)
            .or_not_found(CatalogLevel::Component, component)
    }

    /// Names of all screw components, standard first
    pub fn screw_components(&self) -> Vec<&str> {
        std::iter::once(STANDARD_SCREW)
            .chain(self.other_screws.keys().map(|k| k.as_str()))
            .collect()
    }
}

/// Systems of one manufacturer, keyed by system name
pub type SystemMap = BTreeMap<String, ImplantSystemSpec>;

/// Normalized, immutable implant systems catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImplantCatalog {
    pub metadata: CatalogMetadata,
    pub schema: SchemaVersion,
    systems: BTreeMap<String, SystemMap>,
}

/// Only the header, read first to pick an adapter
#[derive(Deserialize)]
struct Envelope {
    metadata: CatalogMetadata,
}

impl ImplantCatalog {
    /// Parse a catalog document of either schema version.
    pub fn from_json_str(json: &str) -> CalcResult<Self> {
        let envelope: Envelope = serde_json::from_str(json)
            .map_err(|e| CalcError::serialization(format!("Invalid catalog header: {}", e)))?;
        let schema = SchemaVersion::from_version_str(&envelope.metadata.version)?;

        let systems = match schema {
            SchemaVersion::V1 => schema_v1::parse(json)?,
            SchemaVersion::V2 => schema_v2::parse(json)?,
        };

        let catalog = ImplantCatalog {
            metadata: envelope.metadata,
            schema,
            systems,
        };
        tracing::info!(
            version = %catalog.metadata.version,
            schema = %catalog.schema,
            manufacturers = catalog.systems.len(),
            systems = catalog.len(),
            "loaded implant catalog"
        );
        Ok(catalog)
    }

    /// Load a catalog from a JSON file.
    pub fn load(path: &Path) -> CalcResult<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| CalcError::file_error("read", path.display().to_string(), e.to_string()))?;

        Self::from_json_str(&contents).map_err(|e| match e {
            CalcError::SerializationError { reason } => CalcError::SerializationError {
                reason: format!("{} ({})", reason, path.display()),
            },
            other => other,
        })
    }

    /// Manufacturer names in sorted order
    pub fn manufacturers(&self) -> impl Iterator<Item = &str> {
        self.systems.keys().map(|k| k.as_str())
    }

    /// All systems of a manufacturer.
    pub fn manufacturer(&self, manufacturer: &str) -> CalcResult<&SystemMap> {
        resolve(&self.systems, manufacturer)
            .map(|(_, systems)| systems)
            .or_not_found(CatalogLevel::Manufacturer, manufacturer)
    }

    /// One system by manufacturer and system name.
    ///
    /// Keys match exactly first, then case-insensitively with spaces and
    /// dashes read as underscores.
    pub fn system(&self, manufacturer: &str, system: &str) -> CalcResult<&ImplantSystemSpec> {
        let systems = self.manufacturer(manufacturer)?;
        resolve(systems, system)
            .map(|(_, spec)| spec)
            .or_not_found(CatalogLevel::System, format!("{}/{}", manufacturer, system))
    }

    /// One screw component of a system.
    pub fn screw(&self, manufacturer: &str, system: &str, component: &str) -> CalcResult<&ScrewSpec> {
        self.system(manufacturer, system)?.screw(component)
    }

    pub fn standard_screw(&self, manufacturer: &str, system: &str) -> CalcResult<&ScrewSpec> {
        Ok(&self.system(manufacturer, system)?.standard_screw)
    }

    /// Canonical (file) keys for a possibly human-typed manufacturer/system pair.
    pub fn canonical_keys(&self, manufacturer: &str, system: &str) -> CalcResult<(&str, &str)> {
        let (m_key, systems) =
            resolve(&self.systems, manufacturer).or_not_found(CatalogLevel::Manufacturer, manufacturer)?;
        let (s_key, _) = resolve(systems, system)
            .or_not_found(CatalogLevel::System, format!("{}/{}", manufacturer, system))?;
        Ok((m_key, s_key))
    }

    /// Every `(manufacturer, system, spec)` triple in sorted order.
    pub fn iter_systems(&self) -> impl Iterator<Item = (&str, &str, &ImplantSystemSpec)> {
        self.systems.iter().flat_map(|(manufacturer, systems)| {
            systems
                .iter()
                .map(move |(name, spec)| (manufacturer.as_str(), name.as_str(), spec))
        })
    }

    /// Total number of systems across all manufacturers
    pub fn len(&self) -> usize {
        self.systems.values().map(|s| s.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Catalog keys use underscores for spaces ("Nobel_Biocare")
pub fn display_key(key: &str) -> String {
    key.replace('_', " ")
}

fn normalize_key(key: &str) -> String {
    key.trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}

fn key_matches(stored: &str, requested: &str) -> bool {
    stored == requested || normalize_key(stored) == normalize_key(requested)
}

trait OrNotFound<T> {
    fn or_not_found(self, level: CatalogLevel, key: impl Into<String>) -> CalcResult<T>;
}

impl<T> OrNotFound<T> for Option<T> {
    fn or_not_found(self, level: CatalogLevel, key: impl Into<String>) -> CalcResult<T> {
        self.ok_or_else(|| CalcError::catalog_lookup(level, key))
    }
}

/// Exact lookup, falling back to a normalized comparison.
fn resolve<'a, V>(map: &'a BTreeMap<String, V>, key: &str) -> Option<(&'a str, &'a V)> {
    if let Some((k, v)) = map.get_key_value(key) {
        return Some((k.as_str(), v));
    }
    let wanted = normalize_key(key);
    map.iter()
        .find(|(k, _)| normalize_key(k) == wanted)
        .map(|(k, v)| (k.as_str(), v))
}
