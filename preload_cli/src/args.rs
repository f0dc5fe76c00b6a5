//! CLI argument definitions using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use preload_core::catalog::BuiltinCatalog;

#[derive(Parser)]
#[command(name = "preload")]
#[command(author, version, about = "Dental implant screw preload calculator")]
#[command(long_about = "Estimates abutment screw preload with the Wadhwani-Hess torque-difference model \
and the conventional K-factor method, and rates the resulting screw stress.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Print JSON only
    #[arg(long, global = true)]
    pub json: bool,

    /// Settings file (defaults apply when absent)
    #[arg(long, global = true, env = "PRELOAD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Catalog JSON file, overrides the settings
    #[arg(long, global = true, conflicts_with = "builtin")]
    pub catalog: Option<PathBuf>,

    /// Built-in catalog, overrides the settings
    #[arg(long, global = true, value_enum)]
    pub builtin: Option<BuiltinArg>,

    /// Enable debug logging on stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuiltinArg {
    Sample,
    Enhanced,
}

impl From<BuiltinArg> for BuiltinCatalog {
    fn from(arg: BuiltinArg) -> Self {
        match arg {
            BuiltinArg::Sample => BuiltinCatalog::Sample,
            BuiltinArg::Enhanced => BuiltinCatalog::Enhanced,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Preload from tightening and removal torque (Wadhwani-Hess)
    Preload(MeasurementArgs),

    /// Tightening torque needed to reach a desired preload
    FinalTorque(FinalTorqueArgs),

    /// Preload from torque with the K-factor method
    Conventional(ConventionalArgs),

    /// Screw stress, safety factor and risk level
    Stress(StressArgs),

    /// Both methods side by side for one catalog screw
    Compare(CompareArgs),

    /// Browse and analyze the implant catalog
    #[command(subcommand)]
    Systems(SystemsCommands),

    /// Evaluate a JSON calculation request from a file or stdin
    Eval(EvalArgs),

    /// Settings file management
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Catalog screw selector.
#[derive(clap::Args, Clone, Debug, Default)]
pub struct ScrewSelect {
    /// Manufacturer key, e.g. "Nobel_Biocare" or "nobel biocare"
    #[arg(long, short = 'm', requires = "system")]
    pub manufacturer: Option<String>,

    /// System key, e.g. "NobelActive"
    #[arg(long, short = 's', requires = "manufacturer")]
    pub system: Option<String>,

    /// Screw component
    #[arg(long, default_value = "standard")]
    pub component: String,
}

impl ScrewSelect {
    pub fn selected(&self) -> Option<(&str, &str)> {
        match (&self.manufacturer, &self.system) {
            (Some(m), Some(s)) => Some((m.as_str(), s.as_str())),
            _ => None,
        }
    }
}

#[derive(clap::Args, Clone, Debug)]
pub struct MeasurementArgs {
    /// Tightening torque (N·cm)
    #[arg(long, short = 't')]
    pub tightening: f64,

    /// Removal torque (N·cm)
    #[arg(long, short = 'r')]
    pub removal: f64,

    /// Thread pitch (cm); taken from the catalog screw when omitted
    #[arg(long, conflicts_with = "manufacturer")]
    pub pitch_cm: Option<f64>,

    #[command(flatten)]
    pub screw: ScrewSelect,
}

#[derive(clap::Args, Clone, Debug)]
pub struct FinalTorqueArgs {
    #[command(flatten)]
    pub measurement: MeasurementArgs,

    /// Desired preload (N)
    #[arg(long, short = 'd')]
    pub desired: f64,

    /// Initial preload (N); computed from the measurement when omitted
    #[arg(long)]
    pub initial: Option<f64>,

    /// Scale the tightening torque by the preload ratio instead
    #[arg(long)]
    pub ratio: bool,
}

#[derive(clap::Args, Clone, Debug)]
pub struct ConventionalArgs {
    /// Tightening torque (N·cm); defaults to the screw's recommended torque
    #[arg(long, short = 't')]
    pub torque: Option<f64>,

    /// Nut factor K
    #[arg(long, short = 'k')]
    pub k_factor: Option<f64>,

    /// Nominal screw diameter (cm)
    #[arg(long)]
    pub diameter_cm: Option<f64>,

    /// Thread pitch (cm)
    #[arg(long)]
    pub pitch_cm: Option<f64>,

    /// Thread friction coefficient
    #[arg(long)]
    pub friction: Option<f64>,

    /// Use the lubricated uncertainty band
    #[arg(long)]
    pub lubricated: bool,

    #[command(flatten)]
    pub screw: ScrewSelect,
}

#[derive(clap::Args, Clone, Debug)]
pub struct StressArgs {
    /// Preload (N)
    #[arg(long, short = 'p')]
    pub preload: f64,

    /// Minor diameter the stress acts on (mm)
    #[arg(long, conflicts_with_all = ["nominal_mm", "pitch_mm"], required_unless_present = "nominal_mm")]
    pub diameter_mm: Option<f64>,

    /// Nominal diameter (mm); used with --pitch-mm for the tensile stress diameter
    #[arg(long, requires = "pitch_mm")]
    pub nominal_mm: Option<f64>,

    /// Thread pitch (mm)
    #[arg(long, requires = "nominal_mm")]
    pub pitch_mm: Option<f64>,

    /// Yield strength (MPa)
    #[arg(long = "yield", short = 'y')]
    pub yield_strength: f64,
}

#[derive(clap::Args, Clone, Debug)]
pub struct CompareArgs {
    /// Manufacturer key
    #[arg(long, short = 'm')]
    pub manufacturer: String,

    /// System key
    #[arg(long, short = 's')]
    pub system: String,

    /// Tightening torque (N·cm); defaults to the recommended torque
    #[arg(long, short = 't')]
    pub tightening: Option<f64>,

    /// Removal torque (N·cm); defaults to tightening × removal factor
    #[arg(long, short = 'r')]
    pub removal: Option<f64>,

    /// Use the lubricated uncertainty band
    #[arg(long)]
    pub lubricated: bool,
}

#[derive(Subcommand, Clone, Debug)]
pub enum SystemsCommands {
    /// List every manufacturer and system
    List,

    /// Show one system with its screws
    Show {
        manufacturer: String,
        system: String,
    },

    /// Compare both methods for every system in the catalog
    Analyze {
        /// Removal torque as a fraction of recommended torque
        #[arg(long)]
        removal_factor: Option<f64>,
    },
}

#[derive(clap::Args, Clone, Debug)]
pub struct EvalArgs {
    /// Request file, or "-" for stdin
    pub input: String,
}

#[derive(Subcommand, Clone, Debug)]
pub enum ConfigCommands {
    /// Write a settings file with default values
    Init {
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective settings
    Show,
}
