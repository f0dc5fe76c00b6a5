//! # Preload Calculations
//!
//! Each calculation follows the pattern:
//!
//! - `*Input` / `*Request` - Input parameters (JSON-serializable)
//! - `*Result` - Calculation results (JSON-serializable)
//! - `calculate()` - Pure function returning `CalcResult<*Result>`
//!
//! ## Available Calculations
//!
//! - [`preload`] - Wadhwani-Hess preload and final torque
//! - [`torque`] - Conventional K-factor preload, stress and risk
//! - [`comparison`] - Both methods side by side, per screw or per catalog
//!
//! [`CalculationRequest`] wraps every calculation in one tagged enum so a
//! single JSON document can drive the engine:
//!
//! ```rust
//! use preload_core::calculations::{evaluate, CalculationOutput, CalculationRequest};
//!
//! let request: CalculationRequest = serde_json::from_str(r#"{
//!     "type": "Preload",
//!     "tightening_torque_ncm": 35.0,
//!     "removal_torque_ncm": 29.5,
//!     "thread_pitch_cm": 0.04
//! }"#).unwrap();
//!
//! match evaluate(&request).unwrap() {
//!     CalculationOutput::Preload(result) => assert!((result.preload_n - 431.97).abs() < 0.01),
//!     other => panic!("unexpected output: {:?}", other),
//! }
//! ```

pub mod comparison;
pub mod preload;
pub mod torque;

use serde::{Deserialize, Serialize};

use crate::errors::CalcResult;

pub use comparison::{
    analyze_catalog, compare_methods, compare_system, CatalogAnalysis, MethodComparison, MethodComparisonInput,
    MethodEstimate, SystemAnalysis,
};
pub use preload::{
    calculate_final_torque, calculate_preload, FinalTorqueMethod, FinalTorqueRequest, FinalTorqueResult,
    PreloadMethod, PreloadResult, TorqueMeasurement,
};
pub use torque::{
    assess_stress, classify_risk, estimate_conventional_preload, ConventionalPreloadInput,
    ConventionalPreloadResult, RiskLevel, StressAssessment, StressDiameter, StressInput, TorqueRange,
};

/// Any single calculation, tagged by `"type"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CalculationRequest {
    Preload(TorqueMeasurement),
    FinalTorque(FinalTorqueRequest),
    ConventionalPreload(ConventionalPreloadInput),
    Stress(StressInput),
    Compare(MethodComparisonInput),
}

impl CalculationRequest {
    /// Get the calculation type as a string
    pub fn calc_type(&self) -> &'static str {
        match self {
            CalculationRequest::Preload(_) => "Preload",
            CalculationRequest::FinalTorque(_) => "FinalTorque",
            CalculationRequest::ConventionalPreload(_) => "ConventionalPreload",
            CalculationRequest::Stress(_) => "Stress",
            CalculationRequest::Compare(_) => "Compare",
        }
    }
}

/// Output matching the request variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CalculationOutput {
    Preload(PreloadResult),
    FinalTorque(FinalTorqueResult),
    ConventionalPreload(ConventionalPreloadResult),
    Stress(StressAssessment),
    Compare(MethodComparison),
}

/// Run one calculation.
pub fn evaluate(request: &CalculationRequest) -> CalcResult<CalculationOutput> {
    tracing::debug!(calc_type = request.calc_type(), "evaluating request");
    Ok(match request {
        CalculationRequest::Preload(m) => CalculationOutput::Preload(m.preload()?),
        CalculationRequest::FinalTorque(r) => CalculationOutput::FinalTorque(r.calculate()?),
        CalculationRequest::ConventionalPreload(c) => CalculationOutput::ConventionalPreload(c.calculate()?),
        CalculationRequest::Stress(s) => CalculationOutput::Stress(s.calculate()?),
        CalculationRequest::Compare(c) => CalculationOutput::Compare(c.calculate()?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_final_torque_request_json() {
        let json = r#"{
            "type": "FinalTorque",
            "measurement": {"tightening_torque_ncm": 25.0, "removal_torque_ncm": 21.4, "thread_pitch_cm": 0.04},
            "initial_preload_n": 282.74333882308139,
            "desired_preload_n": 400.0
        }"#;
        let request: CalculationRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.calc_type(), "FinalTorque");

        let CalculationOutput::FinalTorque(result) = evaluate(&request).unwrap() else {
            panic!("wrong output variant");
        };
        // 25 · 400 / 282.743
        assert!((result.final_torque_ncm - 35.368).abs() < 0.01);
    }

    #[test]
    fn test_output_is_tagged() {
        let request = CalculationRequest::Preload(TorqueMeasurement {
            tightening_torque_ncm: 35.0,
            removal_torque_ncm: 29.5,
            thread_pitch_cm: 0.04,
        });
        let output = evaluate(&request).unwrap();
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["type"], "Preload");
        assert!((json["preload_n"].as_f64().unwrap() - 431.969).abs() < 0.001);
    }

    #[test]
    fn test_errors_propagate() {
        let request = CalculationRequest::Preload(TorqueMeasurement {
            tightening_torque_ncm: 35.0,
            removal_torque_ncm: 35.0,
            thread_pitch_cm: 0.04,
        });
        assert!(evaluate(&request).unwrap_err().is_validation());
    }

    #[test]
    fn test_unknown_type_rejected() {
        let result: Result<CalculationRequest, _> = serde_json::from_str(r#"{"type": "Beam"}"#);
        assert!(result.is_err());
    }
}
