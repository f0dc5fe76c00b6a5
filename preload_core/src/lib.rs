//! # preload_core - Dental Implant Screw Preload Engine
//!
//! `preload_core` estimates the clamping force (preload) in dental implant
//! abutment screws and judges how close that force brings the screw to
//! yield. All inputs and outputs are JSON-serializable.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: Pure functions that take input and return results
//! - **JSON-First**: All types implement Serialize/Deserialize
//! - **Rich Errors**: Structured error types, never NaN or sentinel values
//!
//! ## Quick Start
//!
//! ```rust
//! use preload_core::calculations::preload::TorqueMeasurement;
//! use preload_core::catalog::default_catalog;
//!
//! let catalog = default_catalog().unwrap();
//! let screw = catalog.standard_screw("Straumann", "Bone_Level").unwrap();
//!
//! // Tightened to 35 N·cm, 29.5 N·cm measured on removal
//! let measurement = TorqueMeasurement::from_screw(screw, 35.0, 29.5).unwrap();
//! let preload = measurement.preload().unwrap();
//! assert!(preload.preload_n > 0.0);
//! ```
//!
//! ## Modules
//!
//! - [`calculations`] - Preload, final torque, stress, risk and method comparison
//! - [`catalog`] - Implant systems reference data (v1 and v2 JSON schemas)
//! - [`settings`] - Analysis assumptions with atomic save/load
//! - [`units`] - Type-safe unit wrappers
//! - [`errors`] - Structured error types

pub mod calculations;
pub mod catalog;
pub mod errors;
pub mod settings;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use calculations::{evaluate, CalculationOutput, CalculationRequest};
pub use catalog::{builtin_catalog, default_catalog, BuiltinCatalog, ImplantCatalog, ScrewSpec};
pub use errors::{CalcError, CalcResult};
pub use settings::{load_settings, save_settings, AnalysisSettings, CatalogSource};
