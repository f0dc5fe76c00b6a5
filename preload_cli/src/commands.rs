//! Subcommand implementations.

use std::borrow::Cow;
use std::fs;
use std::io::Read;

use preload_core::calculations::comparison::{analyze_catalog, compare_methods, MethodComparisonInput};
use preload_core::calculations::preload::{
    calculate_preload_range, estimate_primary_locking, estimate_self_loosening, FinalTorqueMethod,
    FinalTorqueRequest, FinalTorqueResult, PreloadRange, PreloadResult, TorqueMeasurement,
    WADHWANI_HESS_UNCERTAINTY_PERCENT,
};
use preload_core::calculations::torque::{ConventionalPreloadInput, StressDiameter, StressInput};
use preload_core::calculations::{evaluate, CalculationOutput, CalculationRequest};
use preload_core::catalog::{display_key, ImplantCatalog, ImplantSystemSpec, ScrewSpec};
use preload_core::errors::{CalcError, CalcResult};
use preload_core::settings::{load_settings, save_settings, AnalysisSettings, CatalogSource};
use serde::Serialize;

use crate::args::{
    Commands, CompareArgs, ConfigCommands, ConventionalArgs, EvalArgs, FinalTorqueArgs, GlobalOpts,
    MeasurementArgs, ScrewSelect, StressArgs, SystemsCommands,
};
use crate::output::{emit, heading, print_stress, risk_tag};

/// Effective options for one invocation.
pub struct Context {
    pub global: GlobalOpts,
    pub settings: AnalysisSettings,
}

impl Context {
    /// Settings file first, then `--catalog` / `--builtin` on top.
    pub fn new(global: GlobalOpts) -> CalcResult<Self> {
        let mut settings = match &global.config {
            Some(path) => load_settings(path)?,
            None => AnalysisSettings::default(),
        };
        if let Some(path) = &global.catalog {
            settings.catalog = CatalogSource::File(path.clone());
        } else if let Some(builtin) = global.builtin {
            settings.catalog = CatalogSource::Builtin(builtin.into());
        }
        Ok(Context { global, settings })
    }

    fn catalog(&self) -> CalcResult<Cow<'static, ImplantCatalog>> {
        self.settings.catalog.load()
    }

    fn json(&self) -> bool {
        self.global.json
    }
}

pub fn run(command: Commands, ctx: &Context) -> CalcResult<()> {
    match command {
        Commands::Preload(args) => preload(&args, ctx),
        Commands::FinalTorque(args) => final_torque(&args, ctx),
        Commands::Conventional(args) => conventional(&args, ctx),
        Commands::Stress(args) => stress(&args, ctx),
        Commands::Compare(args) => compare(&args, ctx),
        Commands::Systems(cmd) => systems(cmd, ctx),
        Commands::Eval(args) => eval(&args, ctx),
        Commands::Config(cmd) => config(cmd, ctx),
    }
}

fn with_screw<T>(
    select: &ScrewSelect,
    ctx: &Context,
    f: impl FnOnce(&ScrewSpec) -> T,
) -> CalcResult<Option<T>> {
    let Some((manufacturer, system)) = select.selected() else {
        return Ok(None);
    };
    let catalog = ctx.catalog()?;
    let screw = catalog.screw(manufacturer, system, &select.component)?;
    Ok(Some(f(screw)))
}

fn measurement(args: &MeasurementArgs, ctx: &Context) -> CalcResult<TorqueMeasurement> {
    let pitch_cm = match args.pitch_cm {
        Some(pitch) => pitch,
        None => with_screw(&args.screw, ctx, ScrewSpec::thread_pitch_cm)?
            .ok_or_else(|| CalcError::missing_field("pitch_cm"))?,
    };
    TorqueMeasurement::new(args.tightening, args.removal, pitch_cm)
}

// ============================================================================
// Single calculations
// ============================================================================

#[derive(Serialize)]
struct PreloadReport {
    measurement: TorqueMeasurement,
    #[serde(flatten)]
    result: PreloadResult,
    range: PreloadRange,
    self_loosening_ncm: f64,
    primary_locking_ncm: f64,
}

fn preload(args: &MeasurementArgs, ctx: &Context) -> CalcResult<()> {
    let measurement = measurement(args, ctx)?;
    let result = measurement.preload()?;
    let report = PreloadReport {
        measurement,
        result,
        range: calculate_preload_range(result.preload_n, WADHWANI_HESS_UNCERTAINTY_PERCENT)?,
        self_loosening_ncm: estimate_self_loosening(&measurement)?,
        primary_locking_ncm: estimate_primary_locking(&measurement)?,
    };

    emit(ctx.json(), &report, || {
        heading("PRELOAD (Wadhwani-Hess)");
        println!();
        println!("  Tightening torque: {:.2} N·cm", measurement.tightening_torque_ncm);
        println!("  Removal torque:    {:.2} N·cm", measurement.removal_torque_ncm);
        println!("  Thread pitch:      {:.4} cm", measurement.thread_pitch_cm);
        println!();
        println!("  Preload:           {:.2} N", report.result.preload_n);
        println!(
            "  Range (±{:.0}%):     {:.1} - {:.1} N",
            WADHWANI_HESS_UNCERTAINTY_PERCENT, report.range.min_n, report.range.max_n
        );
        println!("  Self-loosening:    {:.2} N·cm", report.self_loosening_ncm);
        println!("  Primary locking:   {:.2} N·cm", report.primary_locking_ncm);
    })
}

#[derive(Serialize)]
struct FinalTorqueReport {
    request: FinalTorqueRequest,
    #[serde(flatten)]
    result: FinalTorqueResult,
}

fn final_torque(args: &FinalTorqueArgs, ctx: &Context) -> CalcResult<()> {
    let measurement = measurement(&args.measurement, ctx)?;
    let method = if args.ratio {
        FinalTorqueMethod::Ratio
    } else {
        FinalTorqueMethod::Exact
    };
    let request = match args.initial {
        Some(initial_preload_n) => FinalTorqueRequest {
            measurement,
            initial_preload_n,
            desired_preload_n: args.desired,
            method,
        },
        None => FinalTorqueRequest::from_measurement(measurement, args.desired, method)?,
    };
    let result = request.calculate()?;

    emit(ctx.json(), &FinalTorqueReport { request, result }, || {
        heading("FINAL TORQUE");
        println!();
        println!("  Initial preload:   {:.2} N", request.initial_preload_n);
        println!("  Desired preload:   {:.2} N", request.desired_preload_n);
        println!("  Preload ratio:     {:.3}", result.preload_ratio);
        println!();
        println!("  Final torque:      {:.2} N·cm", result.final_torque_ncm);
        println!("  Change:            {:+.2} N·cm", result.torque_increase_ncm);
    })
}

fn conventional(args: &ConventionalArgs, ctx: &Context) -> CalcResult<()> {
    let screw = with_screw(&args.screw, ctx, |s| s.clone())?;
    let screw = screw.as_ref();

    let input = ConventionalPreloadInput {
        torque_ncm: pick(args.torque, screw, |s| s.recommended_torque_ncm, "torque")?,
        thread_pitch_cm: pick(args.pitch_cm, screw, ScrewSpec::thread_pitch_cm, "pitch_cm")?,
        coefficient_of_friction: pick(args.friction, screw, |s| s.coefficient_of_friction, "friction")?,
        k_factor: pick(args.k_factor, screw, |s| s.k_factor, "k_factor")?,
        screw_diameter_cm: pick(args.diameter_cm, screw, ScrewSpec::diameter_cm, "diameter_cm")?,
        lubricated: args.lubricated || ctx.settings.lubricated,
    };
    let result = input.calculate()?;

    emit(ctx.json(), &result, || {
        heading("PRELOAD (Conventional, K-factor)");
        println!();
        println!("  Torque:    {:.2} N·cm", input.torque_ncm);
        println!("  K-factor:  {:.3}", input.k_factor);
        println!("  Diameter:  {:.3} cm", input.screw_diameter_cm);
        println!();
        println!("  Preload:   {:.2} N", result.preload_n);
        println!(
            "  Range (±{:.0}%): {:.1} - {:.1} N",
            result.uncertainty_percent, result.range.min_n, result.range.max_n
        );
    })
}

/// Explicit value, else the catalog screw's, else a missing-field error.
fn pick(given: Option<f64>, screw: Option<&ScrewSpec>, from_screw: fn(&ScrewSpec) -> f64, field: &str) -> CalcResult<f64> {
    given
        .or_else(|| screw.map(from_screw))
        .ok_or_else(|| CalcError::missing_field(field))
}

fn stress(args: &StressArgs, ctx: &Context) -> CalcResult<()> {
    let diameter = match (args.diameter_mm, args.nominal_mm, args.pitch_mm) {
        (Some(diameter_mm), _, _) => StressDiameter::Minor { diameter_mm },
        (None, Some(nominal_diameter_mm), Some(thread_pitch_mm)) => StressDiameter::Thread {
            nominal_diameter_mm,
            thread_pitch_mm,
        },
        _ => return Err(CalcError::missing_field("diameter_mm")),
    };
    let input = StressInput {
        preload_n: args.preload,
        diameter,
        yield_strength_mpa: args.yield_strength,
    };
    let assessment = input.calculate()?;

    emit(ctx.json(), &assessment, || {
        heading("SCREW STRESS");
        println!();
        println!("  Preload:       {:.2} N", input.preload_n);
        println!("  Yield:         {:.0} MPa", input.yield_strength_mpa);
        print_stress(&assessment);
    })
}

fn compare(args: &CompareArgs, ctx: &Context) -> CalcResult<()> {
    let catalog = ctx.catalog()?;
    let screw = catalog.standard_screw(&args.manufacturer, &args.system)?;
    let lubricated = args.lubricated || ctx.settings.lubricated;

    let mut input = MethodComparisonInput::from_screw(screw, ctx.settings.removal_torque_factor, lubricated);
    if let Some(tightening) = args.tightening {
        input.tightening_torque_ncm = tightening;
        input.removal_torque_ncm = tightening * ctx.settings.removal_torque_factor;
    }
    if let Some(removal) = args.removal {
        input.removal_torque_ncm = removal;
    }
    let comparison = compare_methods(&input)?;

    emit(ctx.json(), &comparison, || {
        heading(&format!(
            "METHOD COMPARISON: {} {}",
            display_key(&args.manufacturer),
            display_key(&args.system)
        ));
        for estimate in [&comparison.conventional, &comparison.wadhwani_hess] {
            println!();
            println!("{}:", estimate.method);
            println!(
                "  Preload:       {:.1} N (±{:.0}%: {:.1} - {:.1} N)",
                estimate.preload_n, estimate.uncertainty_percent, estimate.range.min_n, estimate.range.max_n
            );
            print_stress(&estimate.stress);
        }
        println!();
        println!("Uncertainty reduction: {:.1}%", comparison.uncertainty_reduction_percent);
        println!("Preload difference:    {:.1}%", comparison.preload_difference_percent);
        println!(
            "W-H within conventional range: {}",
            if comparison.wadhwani_hess_within_conventional_range { "yes" } else { "no" }
        );
    })
}

// ============================================================================
// Catalog
// ============================================================================

#[derive(Serialize)]
struct SystemListing<'a> {
    catalog_version: &'a str,
    systems: Vec<SystemRow<'a>>,
}

#[derive(Serialize)]
struct SystemRow<'a> {
    manufacturer: &'a str,
    system: &'a str,
    connection_type: &'a str,
    platform_diameters_mm: &'a [f64],
    recommended_torque_ncm: f64,
}

#[derive(Serialize)]
struct SystemDetail<'a> {
    manufacturer: &'a str,
    system: &'a str,
    #[serde(flatten)]
    spec: &'a ImplantSystemSpec,
}

fn systems(cmd: SystemsCommands, ctx: &Context) -> CalcResult<()> {
    let catalog = ctx.catalog()?;

    match cmd {
        SystemsCommands::List => {
            let listing = SystemListing {
                catalog_version: &catalog.metadata.version,
                systems: catalog
                    .iter_systems()
                    .map(|(manufacturer, system, spec)| SystemRow {
                        manufacturer,
                        system,
                        connection_type: &spec.connection_type,
                        platform_diameters_mm: &spec.platform_diameters_mm,
                        recommended_torque_ncm: spec.standard_screw.recommended_torque_ncm,
                    })
                    .collect(),
            };
            emit(ctx.json(), &listing, || {
                heading(&format!("IMPLANT SYSTEMS (catalog {})", listing.catalog_version));
                for row in &listing.systems {
                    println!(
                        "  {:<16} {:<20} {:<28} {:>5.1} N·cm",
                        display_key(row.manufacturer),
                        display_key(row.system),
                        row.connection_type,
                        row.recommended_torque_ncm
                    );
                }
            })
        }

        SystemsCommands::Show { manufacturer, system } => {
            let (manufacturer, system) = catalog.canonical_keys(&manufacturer, &system)?;
            let spec = catalog.system(manufacturer, system)?;
            let detail = SystemDetail {
                manufacturer,
                system,
                spec,
            };
            emit(ctx.json(), &detail, || {
                heading(&format!("{} {}", display_key(manufacturer), display_key(system)));
                println!("  Connection:  {}", spec.connection_type);
                println!("  Platforms:   {:?} mm", spec.platform_diameters_mm);
                println!("  Implant:     {}", spec.materials.implant);
                if let Some(notes) = &spec.notes {
                    println!("  Notes:       {}", notes);
                }
                for component in spec.screw_components() {
                    if let Ok(screw) = spec.screw(component) {
                        println!();
                        println!("  Screw '{}':", component);
                        println!("    Diameter:  {} mm, pitch {} mm", screw.diameter_mm, screw.thread_pitch_mm);
                        println!("    Material:  {} (yield {} MPa)", screw.material, screw.yield_strength_mpa);
                        println!("    Torque:    {} N·cm", screw.recommended_torque_ncm);
                        if let Some(range) = &screw.torque_range {
                            println!("    Range:     {} - {} N·cm", range.min, range.max);
                        }
                    }
                }
            })
        }

        SystemsCommands::Analyze { removal_factor } => {
            let mut settings = ctx.settings.clone();
            if let Some(factor) = removal_factor {
                settings.removal_torque_factor = factor;
            }
            let analysis = analyze_catalog(&catalog, &settings)?;

            emit(ctx.json(), &analysis, || {
                heading(&format!("CATALOG ANALYSIS (catalog {})", analysis.catalog_version));
                println!(
                    "  {:<16} {:<20} {:>10} {:>10} {:>8} {:>8}",
                    "Manufacturer", "System", "Conv (N)", "W-H (N)", "SF conv", "SF W-H"
                );
                for row in &analysis.rows {
                    let c = &row.comparison;
                    println!(
                        "  {:<16} {:<20} {:>10.1} {:>10.1} {:>8.2} {:>8.2} {}",
                        display_key(&row.manufacturer),
                        display_key(&row.system),
                        c.conventional.preload_n,
                        c.wadhwani_hess.preload_n,
                        c.conventional.stress.safety_factor,
                        c.wadhwani_hess.stress.safety_factor,
                        risk_tag(c.conventional.stress.risk_level)
                    );
                }
                let s = &analysis.summary;
                println!();
                println!("  Systems analyzed:              {}", s.system_count);
                println!("  Average conventional preload:  {:.1} N", s.average_conventional_preload_n);
                println!("  Average W-H preload:           {:.1} N", s.average_wadhwani_hess_preload_n);
                println!("  Average uncertainty reduction: {:.1}%", s.average_uncertainty_reduction_percent);
                println!(
                    "  W-H inside conventional band:  {}/{}",
                    s.within_conventional_range, s.system_count
                );
            })
        }
    }
}

// ============================================================================
// Eval / config
// ============================================================================

fn eval(args: &EvalArgs, ctx: &Context) -> CalcResult<()> {
    let text = if args.input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| CalcError::file_error("read", "<stdin>", e.to_string()))?;
        buf
    } else {
        fs::read_to_string(&args.input).map_err(|e| CalcError::file_error("read", &args.input, e.to_string()))?
    };

    let request: CalculationRequest = serde_json::from_str(&text)
        .map_err(|e| CalcError::serialization(format!("Invalid calculation request: {}", e)))?;
    let output: CalculationOutput = evaluate(&request)?;

    emit(ctx.json(), &output, || {
        heading(&format!("EVALUATED: {}", request.calc_type()));
    })
}

fn config(cmd: ConfigCommands, ctx: &Context) -> CalcResult<()> {
    match cmd {
        ConfigCommands::Init { path, force } => {
            if path.exists() && !force {
                return Err(CalcError::file_error(
                    "create",
                    path.display().to_string(),
                    "file already exists (use --force to overwrite)",
                ));
            }
            let settings = AnalysisSettings::default();
            save_settings(&settings, &path)?;
            tracing::info!(path = %path.display(), "wrote default settings");

            emit(ctx.json(), &settings, || {
                println!("Wrote settings to {}", path.display());
            })
        }
        ConfigCommands::Show => emit(ctx.json(), &ctx.settings, || {
            heading("SETTINGS");
            println!("  Removal torque factor:  {}", ctx.settings.removal_torque_factor);
            println!("  Desired preload factor: {}", ctx.settings.desired_preload_factor);
            println!("  Lubricated:             {}", ctx.settings.lubricated);
            println!("  Catalog:                {}", ctx.settings.catalog);
        }),
    }
}
