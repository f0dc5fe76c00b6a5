//! # Method Comparison
//!
//! Side-by-side evaluation of the conventional K-factor estimate and the
//! Wadhwani-Hess torque-difference model for one screw, and a batch
//! analysis over every system in a catalog.
//!
//! Stress for both methods is taken over the tensile stress diameter
//! `d - 0.9382·p` of the screw.
//!
//! ## Example
//!
//! ```rust
//! use preload_core::calculations::comparison::MethodComparisonInput;
//!
//! let input = MethodComparisonInput {
//!     tightening_torque_ncm: 35.0,
//!     removal_torque_ncm: 29.75,
//!     thread_pitch_cm: 0.04,
//!     screw_diameter_cm: 0.2,
//!     coefficient_of_friction: 0.16,
//!     k_factor: 0.2,
//!     yield_strength_mpa: 880.0,
//!     lubricated: false,
//! };
//! let comparison = input.calculate().unwrap();
//! assert!((comparison.conventional.preload_n - 875.0).abs() < 1e-9);
//! assert!(comparison.uncertainty_reduction_percent > 70.0);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::preload::{
    calculate_final_torque, calculate_preload, calculate_preload_range, preload_uncertainty_percent,
    PreloadMethod, PreloadRange, TorqueMeasurement,
};
use super::torque::{
    assess_stress, calculate_torque_range, estimate_conventional_preload, tensile_stress_diameter_mm,
    RiskLevel, StressAssessment, TorqueRange,
};
use crate::catalog::{ImplantCatalog, ImplantSystemSpec, ScrewSpec};
use crate::errors::{require_finite, CalcError, CalcResult};
use crate::settings::AnalysisSettings;
use crate::units::{Centimeters, Millimeters};

/// Everything both methods need for one screw.
///
/// ## JSON Example
///
/// ```json
/// {
///   "tightening_torque_ncm": 35.0,
///   "removal_torque_ncm": 29.75,
///   "thread_pitch_cm": 0.04,
///   "screw_diameter_cm": 0.2,
///   "coefficient_of_friction": 0.16,
///   "k_factor": 0.2,
///   "yield_strength_mpa": 880.0,
///   "lubricated": false
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MethodComparisonInput {
    pub tightening_torque_ncm: f64,
    pub removal_torque_ncm: f64,
    pub thread_pitch_cm: f64,
    pub screw_diameter_cm: f64,
    pub coefficient_of_friction: f64,
    pub k_factor: f64,
    pub yield_strength_mpa: f64,
    #[serde(default)]
    pub lubricated: bool,
}

impl MethodComparisonInput {
    /// Input for a catalog screw tightened to its recommended torque, with
    /// removal torque estimated as `recommended × removal_torque_factor`.
    pub fn from_screw(screw: &ScrewSpec, removal_torque_factor: f64, lubricated: bool) -> Self {
        let tightening = screw.recommended_torque();
        MethodComparisonInput {
            tightening_torque_ncm: tightening.value(),
            removal_torque_ncm: (tightening * removal_torque_factor).value(),
            thread_pitch_cm: screw.thread_pitch_cm(),
            screw_diameter_cm: screw.diameter_cm(),
            coefficient_of_friction: screw.coefficient_of_friction,
            k_factor: screw.k_factor,
            yield_strength_mpa: screw.yield_strength().value(),
            lubricated,
        }
    }

    fn measurement(&self) -> TorqueMeasurement {
        TorqueMeasurement {
            tightening_torque_ncm: self.tightening_torque_ncm,
            removal_torque_ncm: self.removal_torque_ncm,
            thread_pitch_cm: self.thread_pitch_cm,
        }
    }

    pub fn validate(&self) -> CalcResult<()> {
        self.measurement().validate()?;
        require_finite("yield_strength_mpa", self.yield_strength_mpa)?;
        if self.yield_strength_mpa <= 0.0 {
            return Err(CalcError::validation(
                "yield_strength_mpa",
                self.yield_strength_mpa.to_string(),
                "Yield strength must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Run both methods and compare them.
    pub fn calculate(&self) -> CalcResult<MethodComparison> {
        self.validate()?;

        let conventional_preload = estimate_conventional_preload(
            self.tightening_torque_ncm,
            self.thread_pitch_cm,
            self.coefficient_of_friction,
            self.k_factor,
            self.screw_diameter_cm,
        )?;
        let wh_preload = calculate_preload(
            self.tightening_torque_ncm,
            self.removal_torque_ncm,
            self.thread_pitch_cm,
        )?;

        let diameter_mm = Millimeters::from(Centimeters(self.screw_diameter_cm)).value();
        let pitch_mm = Millimeters::from(Centimeters(self.thread_pitch_cm)).value();
        let stress_diameter_mm = tensile_stress_diameter_mm(diameter_mm, pitch_mm)?;

        let conventional = self.estimate(PreloadMethod::Conventional, conventional_preload, stress_diameter_mm)?;
        let wadhwani_hess = self.estimate(PreloadMethod::WadhwaniHess, wh_preload, stress_diameter_mm)?;

        let uncertainty_reduction_percent = (conventional.uncertainty_percent - wadhwani_hess.uncertainty_percent)
            / conventional.uncertainty_percent
            * 100.0;
        let preload_difference_percent = (conventional.preload_n - wadhwani_hess.preload_n) / conventional.preload_n * 100.0;

        Ok(MethodComparison {
            wadhwani_hess_within_conventional_range: conventional.range.contains(wadhwani_hess.preload_n),
            conventional,
            wadhwani_hess,
            uncertainty_reduction_percent,
            preload_difference_percent,
        })
    }

    fn estimate(&self, method: PreloadMethod, preload_n: f64, stress_diameter_mm: f64) -> CalcResult<MethodEstimate> {
        let uncertainty_percent = preload_uncertainty_percent(method, self.lubricated);
        Ok(MethodEstimate {
            method,
            preload_n,
            uncertainty_percent,
            range: calculate_preload_range(preload_n, uncertainty_percent)?,
            stress: assess_stress(preload_n, stress_diameter_mm, self.yield_strength_mpa)?,
        })
    }
}

/// One method's preload estimate with its uncertainty band and stress.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MethodEstimate {
    pub method: PreloadMethod,
    pub preload_n: f64,
    pub uncertainty_percent: f64,
    pub range: PreloadRange,
    pub stress: StressAssessment,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MethodComparison {
    pub conventional: MethodEstimate,
    pub wadhwani_hess: MethodEstimate,
    /// Whether the W-H preload falls inside the conventional uncertainty band
    pub wadhwani_hess_within_conventional_range: bool,
    /// `(u_conv - u_wh) / u_conv · 100`
    pub uncertainty_reduction_percent: f64,
    /// `(P_conv - P_wh) / P_conv · 100`
    pub preload_difference_percent: f64,
}

/// Compare both methods for a given input.
pub fn compare_methods(input: &MethodComparisonInput) -> CalcResult<MethodComparison> {
    input.calculate()
}

// ============================================================================
// Catalog analysis
// ============================================================================

/// Comparison for one catalog system's standard screw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemAnalysis {
    pub manufacturer: String,
    pub system: String,
    pub connection_type: String,
    pub screw_diameter_mm: f64,
    pub thread_pitch_mm: f64,
    pub recommended_torque_ncm: f64,
    /// Removal torque assumed for the W-H estimate (N·cm)
    pub removal_torque_ncm: f64,
    /// Catalog torque range, or the conventional ±25/35 % band when absent
    pub torque_range: TorqueRange,
    pub comparison: MethodComparison,
    /// W-H preload scaled by the desired preload factor (N)
    pub desired_preload_n: f64,
    /// Tightening torque needed to reach `desired_preload_n` (N·cm)
    pub final_torque_ncm: f64,
}

/// Build the comparison row for one system from its standard screw.
///
/// Errors name the failing record, e.g. `Nobel_Biocare.Branemark.k_factor`.
pub fn compare_system(
    manufacturer: &str,
    system: &str,
    spec: &ImplantSystemSpec,
    settings: &AnalysisSettings,
) -> CalcResult<SystemAnalysis> {
    system_row(manufacturer, system, spec, settings)
        .map_err(|e| e.within(&format!("{}.{}", manufacturer, system)))
}

fn system_row(
    manufacturer: &str,
    system: &str,
    spec: &ImplantSystemSpec,
    settings: &AnalysisSettings,
) -> CalcResult<SystemAnalysis> {
    let screw = &spec.standard_screw;
    let input = MethodComparisonInput::from_screw(screw, settings.removal_torque_factor, settings.lubricated);
    let comparison = input.calculate()?;

    let torque_range = match screw.torque_range {
        Some(range) => range,
        None => {
            tracing::debug!(manufacturer, system, "no catalog torque range, using conventional band");
            calculate_torque_range(screw.recommended_torque_ncm, settings.lubricated)?
        }
    };

    let initial = comparison.wadhwani_hess.preload_n;
    let desired_preload_n = initial * settings.desired_preload_factor;
    let final_torque_ncm = calculate_final_torque(
        input.tightening_torque_ncm,
        input.removal_torque_ncm,
        initial,
        desired_preload_n,
        input.thread_pitch_cm,
    )?;

    Ok(SystemAnalysis {
        manufacturer: manufacturer.to_string(),
        system: system.to_string(),
        connection_type: spec.connection_type.clone(),
        screw_diameter_mm: screw.diameter_mm,
        thread_pitch_mm: screw.thread_pitch_mm,
        recommended_torque_ncm: screw.recommended_torque_ncm,
        removal_torque_ncm: input.removal_torque_ncm,
        torque_range,
        comparison,
        desired_preload_n,
        final_torque_ncm,
    })
}

/// Count of systems per risk level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskCounts {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

impl RiskCounts {
    fn record(&mut self, level: RiskLevel) {
        match level {
            RiskLevel::Low => self.low += 1,
            RiskLevel::Medium => self.medium += 1,
            RiskLevel::High => self.high += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.low + self.medium + self.high
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub system_count: usize,
    pub average_conventional_preload_n: f64,
    pub average_wadhwani_hess_preload_n: f64,
    pub average_uncertainty_reduction_percent: f64,
    /// Systems whose W-H preload lies inside the conventional band
    pub within_conventional_range: usize,
    pub conventional_risk: RiskCounts,
    pub wadhwani_hess_risk: RiskCounts,
}

impl AnalysisSummary {
    fn from_rows(rows: &[SystemAnalysis]) -> Self {
        let mut summary = AnalysisSummary {
            system_count: rows.len(),
            ..Default::default()
        };
        if rows.is_empty() {
            return summary;
        }

        for row in rows {
            let c = &row.comparison;
            summary.average_conventional_preload_n += c.conventional.preload_n;
            summary.average_wadhwani_hess_preload_n += c.wadhwani_hess.preload_n;
            summary.average_uncertainty_reduction_percent += c.uncertainty_reduction_percent;
            if c.wadhwani_hess_within_conventional_range {
                summary.within_conventional_range += 1;
            }
            summary.conventional_risk.record(c.conventional.stress.risk_level);
            summary.wadhwani_hess_risk.record(c.wadhwani_hess.stress.risk_level);
        }

        let n = rows.len() as f64;
        summary.average_conventional_preload_n /= n;
        summary.average_wadhwani_hess_preload_n /= n;
        summary.average_uncertainty_reduction_percent /= n;
        summary
    }
}

/// Comparison of every system in a catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogAnalysis {
    pub generated_at: DateTime<Utc>,
    pub catalog_version: String,
    pub rows: Vec<SystemAnalysis>,
    pub summary: AnalysisSummary,
}

/// Analyze all systems, in sorted manufacturer/system order.
pub fn analyze_catalog(catalog: &ImplantCatalog, settings: &AnalysisSettings) -> CalcResult<CatalogAnalysis> {
    settings.validate()?;

    let rows = catalog
        .iter_systems()
        .map(|(manufacturer, system, spec)| compare_system(manufacturer, system, spec, settings))
        .collect::<CalcResult<Vec<_>>>()?;
    let summary = AnalysisSummary::from_rows(&rows);

    tracing::info!(
        systems = summary.system_count,
        avg_conventional = summary.average_conventional_preload_n,
        avg_wadhwani_hess = summary.average_wadhwani_hess_preload_n,
        "analyzed catalog"
    );

    Ok(CatalogAnalysis {
        generated_at: Utc::now(),
        catalog_version: catalog.metadata.version.clone(),
        rows,
        summary,
    })
}
