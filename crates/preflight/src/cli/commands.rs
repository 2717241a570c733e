//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::export::ExportFormat;
use crate::mission::FlightField;

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Checklist command arguments.
#[derive(Debug, Args)]
pub struct ChecklistCommand {
    /// Only show this section (1-based)
    #[arg(short, long)]
    pub section: Option<usize>,
}

/// Draft commands.
#[derive(Debug, Subcommand)]
pub enum DraftCommand {
    /// Set mission identity fields
    Set(DraftSetArgs),

    /// Show the current draft
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Discard the draft and start a new mission
    Reset,
}

/// Identity fields for `draft set`. Omitted fields are left unchanged.
#[derive(Debug, Args)]
pub struct DraftSetArgs {
    /// Remote pilot in command
    #[arg(long)]
    pub pilot: Option<String>,

    /// Flight location
    #[arg(long)]
    pub location: Option<String>,

    /// Aircraft make and model
    #[arg(long)]
    pub aircraft: Option<String>,

    /// Remote pilot certificate number
    #[arg(long)]
    pub cert: Option<String>,
}

/// Check command arguments.
#[derive(Debug, Args)]
pub struct CheckCommand {
    /// Checklist item id
    pub item: String,
}

/// Value command arguments.
#[derive(Debug, Args)]
pub struct ValueCommand {
    /// Id of a text checklist item
    pub item: String,

    /// Free-text answer; an empty string clears it
    pub text: String,
}

/// Sub-field command arguments.
#[derive(Debug, Args)]
pub struct SubFieldCommand {
    /// Checklist item id
    pub item: String,

    /// Sub-field id, e.g. `battery1`
    pub subfield: String,

    /// Value to record; numeric sub-fields take a number
    pub value: String,
}

/// Weather commands.
#[derive(Debug, Subcommand)]
pub enum WeatherCommand {
    /// Enter weather by hand
    Set {
        /// Temperature, e.g. "72°F"
        #[arg(long)]
        temperature: Option<String>,

        /// Wind, e.g. "5 mph NW"
        #[arg(long)]
        wind: Option<String>,

        /// Precipitation or short forecast
        #[arg(long)]
        precipitation: Option<String>,
    },

    /// Fetch the current forecast from the National Weather Service
    Fetch {
        /// Latitude; defaults to weather.latitude in the config
        #[arg(long, allow_negative_numbers = true, requires = "lon")]
        lat: Option<f64>,

        /// Longitude; defaults to weather.longitude in the config
        #[arg(long, allow_negative_numbers = true, requires = "lat")]
        lon: Option<f64>,
    },
}

/// Flight log commands.
#[derive(Debug, Subcommand)]
pub enum FlightCommand {
    /// Append an empty flight record
    Add,

    /// Set one field of a flight
    Update {
        /// Flight number (1-based)
        number: usize,

        /// Field to set
        #[arg(value_enum)]
        field: FlightFieldArg,

        /// New value
        value: String,
    },

    /// List the draft's flights
    List,
}

/// Saved mission commands.
#[derive(Debug, Subcommand)]
pub enum MissionsCommand {
    /// List saved missions, newest first
    List {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Export a saved mission to a file
    Export {
        /// Mission number
        number: String,

        /// Export format
        #[arg(short, long, value_enum, default_value = "json")]
        format: ExportFormatArg,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },
}

/// Aircraft profile commands.
#[derive(Debug, Subcommand)]
pub enum ProfileCommand {
    /// List saved profiles
    List {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Save a new profile and select it
    Add {
        /// Display name
        name: String,

        /// Aircraft make and model
        #[arg(long)]
        aircraft: String,

        /// Remote pilot certificate number
        #[arg(long, default_value = "")]
        cert: String,
    },

    /// Select a profile for the draft
    Use {
        /// Profile id
        id: String,
    },

    /// Delete a profile
    Delete {
        /// Profile id
        id: String,
    },
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Flight record field argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FlightFieldArg {
    /// Take-off location
    TakeoffLoc,
    /// Landing location
    LandingLoc,
    /// Launch time
    LaunchTime,
    /// Landing time
    LandingTime,
    /// Elapsed flight time
    ElapsedTime,
    /// Battery voltage after landing
    BatteryVoltage,
    /// Free-text notes
    Notes,
}

impl From<FlightFieldArg> for FlightField {
    fn from(arg: FlightFieldArg) -> Self {
        match arg {
            FlightFieldArg::TakeoffLoc => Self::TakeoffLoc,
            FlightFieldArg::LandingLoc => Self::LandingLoc,
            FlightFieldArg::LaunchTime => Self::LaunchTime,
            FlightFieldArg::LandingTime => Self::LandingTime,
            FlightFieldArg::ElapsedTime => Self::ElapsedTime,
            FlightFieldArg::BatteryVoltage => Self::BatteryVoltage,
            FlightFieldArg::Notes => Self::Notes,
        }
    }
}

/// Export format argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ExportFormatArg {
    /// Canonical JSON
    #[default]
    Json,
    /// Plain-text report
    Text,
}

impl From<ExportFormatArg> for ExportFormat {
    fn from(arg: ExportFormatArg) -> Self {
        match arg {
            ExportFormatArg::Json => Self::Json,
            ExportFormatArg::Text => Self::Text,
        }
    }
}
