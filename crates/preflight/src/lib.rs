//! `preflight` - A pre-flight checklist and mission log for small unmanned aircraft
//!
//! This library provides the checklist model, the mission state controller,
//! fail-soft persistence, weather lookup and mission export used by the
//! `preflight` command-line tool.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod checklist;
pub mod cli;
pub mod config;
pub mod controller;
pub mod error;
pub mod export;
pub mod logging;
pub mod mission;
pub mod profile;
pub mod storage;
pub mod weather;

pub use checklist::{Checklist, ChecklistItem, ItemKind, Progress, Section};
pub use config::Config;
pub use controller::{ControllerOptions, MissionController};
pub use error::{Error, Result};
pub use export::ExportFormat;
pub use logging::init_logging;
pub use mission::{FlightField, FlightRecord, ItemValue, MissionDraft, MissionRecord, Weather};
pub use profile::AircraftProfile;
pub use storage::{KeyValueStore, MemoryStore, Persistence, Storage, StorageKeys, StorageStats};
pub use weather::{Coordinate, FixedPosition, NoaaClient, WeatherLookup, WeatherReport};
