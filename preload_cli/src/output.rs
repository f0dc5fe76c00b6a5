//! Human and JSON rendering.

use preload_core::calculations::torque::{RiskLevel, StressAssessment};
use preload_core::errors::{CalcError, CalcResult};
use serde::Serialize;

const RULE: &str = "═══════════════════════════════════════";

/// Print `value` as JSON when `--json` is set, otherwise run `human` and
/// append the JSON block.
pub fn emit<T: Serialize>(json_only: bool, value: &T, human: impl FnOnce()) -> CalcResult<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| CalcError::serialization(e.to_string()))?;
    if json_only {
        println!("{}", json);
        return Ok(());
    }

    human();
    println!();
    println!("JSON Output:");
    println!("{}", json);
    Ok(())
}

/// Print an error: a human line on stderr, the structured error on stdout
/// for `--json`.
pub fn report_error(json_only: bool, error: &CalcError) {
    eprintln!("Error: {}", error);
    if json_only {
        if let Ok(json) = serde_json::to_string_pretty(error) {
            println!("{}", json);
        }
    }
}

pub fn heading(title: &str) {
    println!("{}", RULE);
    println!("  {}", title);
    println!("{}", RULE);
}

pub fn risk_tag(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Low => "[OK]",
        RiskLevel::Medium => "[CHECK]",
        RiskLevel::High => "[FAIL]",
    }
}

pub fn print_stress(stress: &StressAssessment) {
    println!("  Stress:        {:.1} MPa", stress.stress_mpa);
    println!("  Safety factor: {:.2}", stress.safety_factor);
    println!(
        "  Risk:          {} {}",
        stress.risk_level,
        risk_tag(stress.risk_level)
    );
    println!("  {}", stress.risk_level.recommendation());
}
