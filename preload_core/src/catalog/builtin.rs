//! Catalogs compiled into the binary.
//!
//! Two data sets ship with the crate: the legacy `sample` catalog (v1) and
//! the `enhanced` catalog (v2). Each is parsed once on first use and shared
//! for the rest of the process.

use once_cell::sync::Lazy;
use rust_embed::Embed;
use serde::{Deserialize, Serialize};

use super::ImplantCatalog;
use crate::errors::{CalcError, CalcResult};

#[derive(Embed)]
#[folder = "../assets/implant_systems/"]
struct CatalogAssets;

/// Identifies one of the embedded catalogs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuiltinCatalog {
    Sample,
    #[default]
    Enhanced,
}

impl BuiltinCatalog {
    pub const ALL: [BuiltinCatalog; 2] = [BuiltinCatalog::Sample, BuiltinCatalog::Enhanced];

    pub fn file_name(&self) -> &'static str {
        match self {
            BuiltinCatalog::Sample => "sample_systems.json",
            BuiltinCatalog::Enhanced => "enhanced_systems.json",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BuiltinCatalog::Sample => "sample",
            BuiltinCatalog::Enhanced => "enhanced",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(name.trim()))
    }
}

impl std::fmt::Display for BuiltinCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

static SAMPLE: Lazy<CalcResult<ImplantCatalog>> = Lazy::new(|| load_embedded(BuiltinCatalog::Sample));
static ENHANCED: Lazy<CalcResult<ImplantCatalog>> = Lazy::new(|| load_embedded(BuiltinCatalog::Enhanced));

fn load_embedded(which: BuiltinCatalog) -> CalcResult<ImplantCatalog> {
    let name = which.file_name();
    let file = CatalogAssets::get(name)
        .ok_or_else(|| CalcError::file_error("open embedded", name, "asset not found"))?;
    let text = std::str::from_utf8(&file.data)
        .map_err(|e| CalcError::file_error("decode embedded", name, e.to_string()))?;
    ImplantCatalog::from_json_str(text)
}

/// Shared, parsed copy of an embedded catalog.
pub fn builtin_catalog(which: BuiltinCatalog) -> CalcResult<&'static ImplantCatalog> {
    let cell = match which {
        BuiltinCatalog::Sample => &SAMPLE,
        BuiltinCatalog::Enhanced => &ENHANCED,
    };
    Lazy::force(cell).as_ref().map_err(|e| e.clone())
}

/// The enhanced catalog.
pub fn default_catalog() -> CalcResult<&'static ImplantCatalog> {
    builtin_catalog(BuiltinCatalog::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SchemaVersion;

    #[test]
    fn test_both_builtins_parse() {
        let sample = builtin_catalog(BuiltinCatalog::Sample).unwrap();
        assert_eq!(sample.schema, SchemaVersion::V1);
        assert!(!sample.is_empty());

        let enhanced = builtin_catalog(BuiltinCatalog::Enhanced).unwrap();
        assert_eq!(enhanced.schema, SchemaVersion::V2);
        assert!(enhanced.len() >= sample.len());
    }

    #[test]
    fn test_default_is_enhanced() {
        let default = default_catalog().unwrap();
        assert_eq!(default.schema, SchemaVersion::V2);
        assert!(std::ptr::eq(default, builtin_catalog(BuiltinCatalog::Enhanced).unwrap()));
    }

    #[test]
    fn test_from_name() {
        assert_eq!(BuiltinCatalog::from_name("Sample"), Some(BuiltinCatalog::Sample));
        assert_eq!(BuiltinCatalog::from_name("enhanced"), Some(BuiltinCatalog::Enhanced));
        assert_eq!(BuiltinCatalog::from_name("full"), None);
    }
}
