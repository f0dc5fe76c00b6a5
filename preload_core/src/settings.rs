//! # Analysis Settings
//!
//! Tunable assumptions for catalog analysis, persisted as a small JSON file:
//!
//! ```json
//! {
//!   "version": "0.1.0",
//!   "removal_torque_factor": 0.85,
//!   "desired_preload_factor": 1.2,
//!   "lubricated": false,
//!   "catalog": { "builtin": "enhanced" }
//! }
//! ```
//!
//! Saves are atomic: the JSON is written to a `.tmp` sibling, synced, then
//! renamed over the target.

use std::borrow::Cow;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::catalog::{builtin_catalog, BuiltinCatalog, ImplantCatalog};
use crate::errors::{require_finite, CalcError, CalcResult};

/// Current settings file schema version
pub const SETTINGS_VERSION: &str = "0.1.0";

/// Removal torque assumed as a fraction of tightening torque
pub const DEFAULT_REMOVAL_TORQUE_FACTOR: f64 = 0.85;

/// Target preload as a multiple of the measured preload
pub const DEFAULT_DESIRED_PRELOAD_FACTOR: f64 = 1.2;

/// Where the implant catalog comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogSource {
    Builtin(BuiltinCatalog),
    File(PathBuf),
}

impl Default for CatalogSource {
    fn default() -> Self {
        CatalogSource::Builtin(BuiltinCatalog::default())
    }
}

impl CatalogSource {
    /// Resolve to a catalog: borrowed for built-ins, owned for files.
    pub fn load(&self) -> CalcResult<Cow<'static, ImplantCatalog>> {
        match self {
            CatalogSource::Builtin(which) => builtin_catalog(*which).map(Cow::Borrowed),
            CatalogSource::File(path) => ImplantCatalog::load(path).map(Cow::Owned),
        }
    }
}

impl std::fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogSource::Builtin(which) => write!(f, "builtin:{}", which),
            CatalogSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSettings {
    pub version: String,
    /// Fraction of the recommended torque assumed to be measured on removal
    pub removal_torque_factor: f64,
    /// Multiple of the measured preload used as the retightening target
    pub desired_preload_factor: f64,
    /// Selects the lubricated conventional uncertainty (25 % instead of 35 %)
    #[serde(default)]
    pub lubricated: bool,
    #[serde(default)]
    pub catalog: CatalogSource,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        AnalysisSettings {
            version: SETTINGS_VERSION.to_string(),
            removal_torque_factor: DEFAULT_REMOVAL_TORQUE_FACTOR,
            desired_preload_factor: DEFAULT_DESIRED_PRELOAD_FACTOR,
            lubricated: false,
            catalog: CatalogSource::default(),
        }
    }
}

impl AnalysisSettings {
    pub fn validate(&self) -> CalcResult<()> {
        require_finite("removal_torque_factor", self.removal_torque_factor)?;
        require_finite("desired_preload_factor", self.desired_preload_factor)?;

        if !(0.0..1.0).contains(&self.removal_torque_factor) {
            return Err(CalcError::validation(
                "removal_torque_factor",
                self.removal_torque_factor.to_string(),
                "Removal torque factor must be in [0, 1)",
            ));
        }
        if self.desired_preload_factor <= 0.0 {
            return Err(CalcError::validation(
                "desired_preload_factor",
                self.desired_preload_factor.to_string(),
                "Desired preload factor must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Load and validate a settings file.
pub fn load_settings(path: &Path) -> CalcResult<AnalysisSettings> {
    let contents = fs::read_to_string(path)
        .map_err(|e| CalcError::file_error("read", path.display().to_string(), e.to_string()))?;

    let settings: AnalysisSettings = serde_json::from_str(&contents).map_err(|e| {
        CalcError::serialization(format!("Invalid JSON in {}: {}", path.display(), e))
    })?;

    validate_version(&settings.version)?;
    settings.validate()?;

    tracing::debug!(path = %path.display(), catalog = %settings.catalog, "loaded settings");
    Ok(settings)
}

/// Write settings with atomic replace semantics.
pub fn save_settings(settings: &AnalysisSettings, path: &Path) -> CalcResult<()> {
    settings.validate()?;
    let json = serde_json::to_string_pretty(settings).map_err(|e| CalcError::serialization(e.to_string()))?;

    let tmp_path = tmp_path_for(path);
    let mut tmp_file = File::create(&tmp_path).map_err(|e| {
        CalcError::file_error("create temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.write_all(json.as_bytes()).map_err(|e| {
        CalcError::file_error("write temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.sync_all().map_err(|e| {
        CalcError::file_error("sync temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        CalcError::file_error("rename to final", path.display().to_string(), e.to_string())
    })?;

    Ok(())
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Same major version required; while on 0.x a newer minor is rejected too.
fn validate_version(file_version: &str) -> CalcResult<()> {
    let mismatch = || CalcError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SETTINGS_VERSION.to_string(),
    };

    let file_parts: Vec<u32> = file_version.split('.').filter_map(|p| p.parse().ok()).collect();
    let current_parts: Vec<u32> = SETTINGS_VERSION.split('.').filter_map(|p| p.parse().ok()).collect();

    match (file_parts.as_slice(), current_parts.as_slice()) {
        ([file_major, ..], [current_major, ..]) if file_major != current_major => Err(mismatch()),
        ([0, file_minor, ..], [0, current_minor, ..]) if file_minor > current_minor => Err(mismatch()),
        ([_, ..], [_, ..]) => Ok(()),
        _ => Err(mismatch()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env::temp_dir;

    fn temp_settings_path(name: &str) -> PathBuf {
        temp_dir().join(format!("preload_settings_test_{}_{}.json", name, std::process::id()))
    }

    #[test]
    fn test_defaults_are_valid() {
        let settings = AnalysisSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.catalog, CatalogSource::Builtin(BuiltinCatalog::Enhanced));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let path = temp_settings_path("roundtrip");
        let settings = AnalysisSettings {
            removal_torque_factor: 0.8,
            lubricated: true,
            catalog: CatalogSource::Builtin(BuiltinCatalog::Sample),
            ..Default::default()
        };

        save_settings(&settings, &path).unwrap();
        assert!(!tmp_path_for(&path).exists());

        let loaded = load_settings(&path).unwrap();
        assert_eq!(loaded, settings);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_catalog_source_json_shape() {
        let json = serde_json::to_string(&CatalogSource::Builtin(BuiltinCatalog::Sample)).unwrap();
        assert_eq!(json, r#"{"builtin":"sample"}"#);

        let file: CatalogSource = serde_json::from_str(r#"{"file":"/tmp/catalog.json"}"#).unwrap();
        assert_eq!(file, CatalogSource::File(PathBuf::from("/tmp/catalog.json")));
    }

    #[test]
    fn test_out_of_range_factor_rejected() {
        let path = temp_settings_path("bad_factor");
        fs::write(
            &path,
            r#"{"version": "0.1.0", "removal_torque_factor": 1.0, "desired_preload_factor": 1.2}"#,
        )
        .unwrap();

        let err = load_settings(&path).unwrap_err();
        assert!(err.is_validation());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_version_check() {
        assert!(validate_version("0.1.0").is_ok());
        assert!(validate_version("0.1.7").is_ok());
        assert!(validate_version("0.0.9").is_ok());
        assert!(matches!(validate_version("0.2.0"), Err(CalcError::VersionMismatch { .. })));
        assert!(matches!(validate_version("1.0.0"), Err(CalcError::VersionMismatch { .. })));
        assert!(validate_version("garbage").is_err());
    }

    #[test]
    fn test_builtin_source_loads() {
        let catalog = CatalogSource::default().load().unwrap();
        assert!(matches!(catalog, Cow::Borrowed(_)));
        assert!(!catalog.is_empty());
    }
}
