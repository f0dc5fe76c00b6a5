//! # Error Types
//!
//! Structured error types for preload_core. Every failure carries enough
//! context for a caller (a UI, a report generator, or another program) to
//! tell the user which input or key was at fault.
//!
//! ## Error kinds
//!
//! - [`CalcError::Validation`] - an input breaks a stated precondition
//! - [`CalcError::Domain`] - inputs pass their range checks but the formula
//!   is undefined for their combination (e.g. zero initial preload)
//! - [`CalcError::CatalogLookup`] - a manufacturer/system/component key is absent
//!
//! The remaining variants belong to catalog and settings loading.
//!
//! ## Example
//!
//! ```rust
//! use preload_core::errors::{CalcError, CalcResult};
//!
//! fn validate_pitch(thread_pitch_cm: f64) -> CalcResult<()> {
//!     if thread_pitch_cm <= 0.0 {
//!         return Err(CalcError::validation(
//!             "thread_pitch_cm",
//!             thread_pitch_cm.to_string(),
//!             "Thread pitch must be greater than zero",
//!         ));
//!     }
//!     Ok(())
//! }
//!
//! assert_eq!(validate_pitch(0.0).unwrap_err().error_code(), "VALIDATION_ERROR");
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for preload_core operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Level of the catalog hierarchy a lookup failed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogLevel {
    Manufacturer,
    System,
    Component,
}

impl std::fmt::Display for CatalogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CatalogLevel::Manufacturer => "manufacturer",
            CatalogLevel::System => "system",
            CatalogLevel::Component => "component",
        };
        write!(f, "{}", name)
    }
}

/// Structured error type for calculation and catalog operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    /// An input value violates a precondition (non-positive torque, removal
    /// torque not below tightening torque, K-factor out of range, ...)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    Validation {
        field: String,
        value: String,
        reason: String,
    },

    /// The formula is mathematically undefined for this combination of inputs
    #[error("Undefined result in {operation}: {reason}")]
    Domain { operation: String, reason: String },

    /// Requested key is absent from the loaded catalog
    #[error("Catalog lookup failed: {level} '{key}' not found")]
    CatalogLookup { level: CatalogLevel, key: String },

    /// A required field is missing from a catalog record
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },
}

impl CalcError {
    /// Create a Validation error
    pub fn validation(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::Validation {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a Domain error
    pub fn domain(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::Domain {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Attach the catalog record a failure came from, e.g.
    /// `k_factor` → `Nobel_Biocare.Branemark.k_factor`.
    pub fn within(self, record: &str) -> Self {
        match self {
            CalcError::Validation { field, value, reason } => CalcError::Validation {
                field: format!("{}.{}", record, field),
                value,
                reason,
            },
            CalcError::Domain { operation, reason } => CalcError::Domain {
                operation: format!("{} ({})", operation, record),
                reason,
            },
            other => other,
        }
    }

    /// Create a CatalogLookup error
    pub fn catalog_lookup(level: CatalogLevel, key: impl Into<String>) -> Self {
        CalcError::CatalogLookup {
            level,
            key: key.into(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(field: impl Into<String>) -> Self {
        CalcError::MissingField {
            field: field.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a SerializationError
    pub fn serialization(reason: impl Into<String>) -> Self {
        CalcError::SerializationError {
            reason: reason.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, CalcError::Validation { .. })
    }

    pub fn is_domain(&self) -> bool {
        matches!(self, CalcError::Domain { .. })
    }

    pub fn is_catalog_lookup(&self) -> bool {
        matches!(self, CalcError::CatalogLookup { .. })
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::Validation { .. } => "VALIDATION_ERROR",
            CalcError::Domain { .. } => "DOMAIN_ERROR",
            CalcError::CatalogLookup { .. } => "CATALOG_LOOKUP_ERROR",
            CalcError::MissingField { .. } => "MISSING_FIELD",
            CalcError::FileError { .. } => "FILE_ERROR",
            CalcError::SerializationError { .. } => "SERIALIZATION_ERROR",
            CalcError::VersionMismatch { .. } => "VERSION_MISMATCH",
        }
    }
}

/// Reject NaN and infinities before they reach a formula.
pub(crate) fn require_finite(field: &str, value: f64) -> CalcResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(CalcError::validation(field, value.to_string(), "Value must be a finite number"))
    }
}

/// Reject a non-finite formula output (overflow on extreme inputs).
pub(crate) fn finite_result(operation: &str, value: f64) -> CalcResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CalcError::domain(operation, format!("result is not finite ({})", value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = CalcError::validation("removal_torque_ncm", "35", "Removal torque must be less than tightening torque");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"type\":\"Validation\""));
        let roundtrip: CalcError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_within_prefixes_record() {
        let err = CalcError::validation("k_factor", "1.5", "Value must be in (0, 1]").within("Acme.Basic");
        assert_eq!(err.to_string(), "Invalid input for 'Acme.Basic.k_factor': 1.5 - Value must be in (0, 1]");

        let err = CalcError::domain("final torque", "zero preload").within("Acme.Basic");
        assert!(err.to_string().contains("final torque (Acme.Basic)"));

        let err = CalcError::missing_field("pitch_cm");
        assert_eq!(err.clone().within("Acme.Basic"), err);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(CalcError::missing_field("screws.standard").error_code(), "MISSING_FIELD");
        assert_eq!(CalcError::domain("final torque", "zero preload").error_code(), "DOMAIN_ERROR");
        assert_eq!(
            CalcError::catalog_lookup(CatalogLevel::System, "Active").error_code(),
            "CATALOG_LOOKUP_ERROR"
        );
    }

    #[test]
    fn test_lookup_message_names_level() {
        let err = CalcError::catalog_lookup(CatalogLevel::Manufacturer, "Acme");
        assert_eq!(err.to_string(), "Catalog lookup failed: manufacturer 'Acme' not found");
        assert!(err.is_catalog_lookup());
        assert!(!err.is_validation());
    }

    #[test]
    fn test_finite_guards() {
        assert!(require_finite("x", 1.0).is_ok());
        assert!(require_finite("x", f64::NAN).unwrap_err().is_validation());
        assert!(finite_result("op", f64::INFINITY).unwrap_err().is_domain());
        assert_eq!(finite_result("op", 2.0).unwrap(), 2.0);
    }
}
