//! Command-line interface for preflight.
//!
//! This module provides the CLI structure for the `preflight` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    CheckCommand, ChecklistCommand, ConfigCommand, DraftCommand, DraftSetArgs, ExportFormatArg,
    FlightCommand, FlightFieldArg, MissionsCommand, ProfileCommand, StatusCommand,
    SubFieldCommand, ValueCommand, WeatherCommand,
};

/// preflight - UAS pre-flight checklist and mission log
///
/// Work through the pre-flight checklist for a small unmanned aircraft,
/// record weather and flights, and keep a log of completed missions.
#[derive(Debug, Parser)]
#[command(name = "preflight")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Keep everything in memory for this run; nothing is read or written
    #[arg(long, global = true)]
    pub ephemeral: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the draft's identity, progress and open items
    Status(StatusCommand),

    /// Show the checklist with current answers
    Checklist(ChecklistCommand),

    /// Edit, show or discard the draft
    #[command(subcommand)]
    Draft(DraftCommand),

    /// Toggle a checklist item
    Check(CheckCommand),

    /// Record a free-text answer for a checklist item
    Value(ValueCommand),

    /// Record a sub-field value, e.g. a battery voltage
    Sub(SubFieldCommand),

    /// Enter or fetch weather conditions
    #[command(subcommand)]
    Weather(WeatherCommand),

    /// Manage the draft's flight log
    #[command(subcommand)]
    Flight(FlightCommand),

    /// Save the draft as a completed mission
    Save,

    /// List or export saved missions
    #[command(subcommand)]
    Missions(MissionsCommand),

    /// Manage aircraft profiles
    #[command(subcommand)]
    Profile(ProfileCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn cli(verbose: u8, quiet: bool) -> Cli {
        Cli {
            config: None,
            verbose,
            quiet,
            ephemeral: false,
            command: Command::Save,
        }
    }

    #[test]
    fn test_cli_name() {
        assert_eq!(Cli::command().get_name(), "preflight");
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity() {
        use crate::logging::Verbosity;

        assert_eq!(cli(0, true).verbosity(), Verbosity::Quiet);
        assert_eq!(cli(0, false).verbosity(), Verbosity::Normal);
        assert_eq!(cli(1, false).verbosity(), Verbosity::Verbose);
        assert_eq!(cli(2, false).verbosity(), Verbosity::Trace);
    }

    #[test]
    fn test_parse_status() {
        let cli = Cli::try_parse_from(["preflight", "status", "--json"]).unwrap();
        assert!(matches!(cli.command, Command::Status(StatusCommand { json: true })));
    }

    #[test]
    fn test_parse_draft_set() {
        let cli = Cli::try_parse_from([
            "preflight", "draft", "set", "--pilot", "Jane Doe", "--aircraft", "Mavic 3",
        ])
        .unwrap();
        match cli.command {
            Command::Draft(DraftCommand::Set(args)) => {
                assert_eq!(args.pilot.as_deref(), Some("Jane Doe"));
                assert_eq!(args.aircraft.as_deref(), Some("Mavic 3"));
                assert!(args.location.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_sub() {
        let cli = Cli::try_parse_from([
            "preflight",
            "sub",
            "uav_batteries_charged",
            "battery1",
            "16.8",
        ])
        .unwrap();
        match cli.command {
            Command::Sub(cmd) => {
                assert_eq!(cmd.item, "uav_batteries_charged");
                assert_eq!(cmd.subfield, "battery1");
                assert_eq!(cmd.value, "16.8");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_weather_fetch_negative_longitude() {
        let cli = Cli::try_parse_from([
            "preflight", "weather", "fetch", "--lat", "39.7456", "--lon", "-97.0892",
        ])
        .unwrap();
        match cli.command {
            Command::Weather(WeatherCommand::Fetch { lat, lon }) => {
                assert_eq!(lat, Some(39.7456));
                assert_eq!(lon, Some(-97.0892));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_weather_fetch_requires_both_coordinates() {
        assert!(Cli::try_parse_from(["preflight", "weather", "fetch", "--lat", "39.7"]).is_err());
    }

    #[test]
    fn test_parse_flight_update() {
        let cli = Cli::try_parse_from([
            "preflight",
            "flight",
            "update",
            "2",
            "battery-voltage",
            "15.1",
        ])
        .unwrap();
        match cli.command {
            Command::Flight(FlightCommand::Update {
                number,
                field,
                value,
            }) => {
                assert_eq!(number, 2);
                assert_eq!(field, FlightFieldArg::BatteryVoltage);
                assert_eq!(value, "15.1");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_missions_export() {
        let cli = Cli::try_parse_from([
            "preflight",
            "missions",
            "export",
            "2024-06-01-1234",
            "--format",
            "text",
        ])
        .unwrap();
        match cli.command {
            Command::Missions(MissionsCommand::Export {
                number,
                format,
                out,
            }) => {
                assert_eq!(number, "2024-06-01-1234");
                assert_eq!(format, ExportFormatArg::Text);
                assert_eq!(out, PathBuf::from("."));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_profile_add() {
        let cli = Cli::try_parse_from([
            "preflight", "profile", "add", "Survey rig", "--aircraft", "Mavic 3",
        ])
        .unwrap();
        match cli.command {
            Command::Profile(ProfileCommand::Add {
                name,
                aircraft,
                cert,
            }) => {
                assert_eq!(name, "Survey rig");
                assert_eq!(aircraft, "Mavic 3");
                assert!(cert.is_empty());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_global_flags() {
        let cli = Cli::try_parse_from([
            "preflight",
            "-c",
            "/custom/config.toml",
            "-v",
            "save",
            "--ephemeral",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
        assert_eq!(cli.verbose, 1);
        assert!(cli.ephemeral);
        assert!(matches!(cli.command, Command::Save));
    }

    #[test]
    fn test_parse_with_quiet() {
        let cli = Cli::try_parse_from(["preflight", "-q", "status"]).unwrap();
        assert!(cli.quiet);
    }
}
