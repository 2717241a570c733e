//! `preflight` - CLI for the UAS pre-flight checklist
//!
//! Every invocation restores the stored draft, applies one command, and
//! leaves the draft snapshotted for the next invocation.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::PathBuf;

use clap::Parser;
use tracing::warn;

use preflight::checklist::Checklist;
use preflight::cli::{
    ChecklistCommand, Cli, Command, ConfigCommand, DraftCommand, FlightCommand, MissionsCommand,
    ProfileCommand, WeatherCommand,
};
use preflight::export;
use preflight::mission::WeatherField;
use preflight::weather::{Coordinate, FixedPosition, NoaaClient, WeatherLookup};
use preflight::{
    init_logging, Config, Error, KeyValueStore, MemoryStore, MissionController, Persistence,
    Storage,
};

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() -> CliResult {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // `config path` and `config validate` must work with a broken config file
    if let Command::Config(config_cmd) = cli.command {
        return handle_config(cli.config, config_cmd);
    }

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;

    let mut controller = open_controller(&config, cli.ephemeral);

    match cli.command {
        Command::Status(cmd) => handle_status(&controller, cmd.json),
        Command::Checklist(cmd) => handle_checklist(&controller, &cmd),
        Command::Draft(cmd) => handle_draft(&mut controller, cmd),
        Command::Check(cmd) => {
            let done = controller.toggle(&cmd.item)?;
            println!("{}: {}", cmd.item, if done { "done" } else { "not done" });
            Ok(())
        }
        Command::Value(cmd) => {
            controller.set_text_value(&cmd.item, cmd.text)?;
            println!("{}: recorded", cmd.item);
            Ok(())
        }
        Command::Sub(cmd) => {
            controller.set_sub_field_value(&cmd.item, &cmd.subfield, cmd.value)?;
            println!("{}.{}: recorded", cmd.item, cmd.subfield);
            Ok(())
        }
        Command::Weather(cmd) => handle_weather(&mut controller, &config, cmd).await,
        Command::Flight(cmd) => handle_flight(&mut controller, cmd),
        Command::Save => handle_save(&mut controller),
        Command::Missions(cmd) => handle_missions(&controller, cmd),
        Command::Profile(cmd) => handle_profile(&mut controller, cmd),
        Command::Config(_) => Ok(()),
    }
}

/// Open the controller over the configured store.
///
/// If the database cannot be opened the session continues in memory, so
/// checklist entry is never blocked by storage.
fn open_controller(config: &Config, ephemeral: bool) -> MissionController {
    let store: Box<dyn KeyValueStore> = if ephemeral {
        Box::new(MemoryStore::new())
    } else {
        match Storage::open(config.database_path()) {
            Ok(storage) => Box::new(storage),
            Err(err) => {
                warn!("Storage unavailable, nothing will be saved: {}", err);
                eprintln!("warning: {err}; changes will not be saved");
                Box::new(MemoryStore::new())
            }
        }
    };

    let persistence = Persistence::from_boxed(store, config.storage_keys());
    MissionController::open(
        persistence,
        Checklist::standard(),
        (&config.mission).into(),
    )
}

fn handle_status(controller: &MissionController, json: bool) -> CliResult {
    let draft = controller.draft();
    let progress = controller.compute_progress();
    let missing: Vec<&str> = controller
        .checklist()
        .missing_required(&draft.completed)
        .into_iter()
        .map(|item| item.id.as_str())
        .collect();

    if json {
        let status = serde_json::json!({
            "missionNumber": draft.mission_number,
            "pilotName": draft.pilot_name,
            "location": draft.location,
            "aircraftType": draft.aircraft_type,
            "rpCert": draft.certificate_number,
            "profileId": draft.profile_id,
            "progress": {
                "satisfied": progress.satisfied,
                "total": progress.total,
                "percentage": progress.percentage,
            },
            "missing": missing,
            "weather": draft.weather,
            "flights": draft.flight_records.len(),
            "storage": controller.persistence().stats(),
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("Mission {}", draft.mission_number);
    println!("----------------------");
    println!("Pilot:         {}", or_dash(&draft.pilot_name));
    println!("RP Cert:       {}", or_dash(&draft.certificate_number));
    println!("Location:      {}", or_dash(&draft.location));
    println!("Aircraft:      {}", or_dash(&draft.aircraft_type));
    println!(
        "Progress:      {}/{} required ({}%)",
        progress.satisfied, progress.total, progress.percentage
    );
    println!("Flights:       {}", draft.flight_records.len());
    for (label, field) in [
        ("Temperature:", WeatherField::Temperature),
        ("Wind:", WeatherField::Wind),
        ("Precipitation:", WeatherField::Precipitation),
    ] {
        println!("{label:<15}{}", draft.weather.get(field).unwrap_or("-"));
    }
    match controller.persistence().stats() {
        Some(stats) => {
            println!(
                "Database:      {} ({} keys, {} bytes)",
                stats.location, stats.total_entries, stats.db_size_bytes
            );
            if let Some(updated) = stats.last_updated {
                println!("Last saved:    {}", updated.format("%Y-%m-%d %H:%M:%S UTC"));
            }
        }
        None => println!("Database:      unavailable"),
    }

    let identity = draft.missing_identity();
    if !identity.is_empty() {
        println!();
        println!("Identity missing: {}", identity.join(", "));
    }
    if !missing.is_empty() {
        println!();
        println!("Open required items:");
        for id in missing {
            println!("  {id}");
        }
    }
    Ok(())
}

fn or_dash(value: &str) -> &str {
    if value.trim().is_empty() {
        "-"
    } else {
        value
    }
}

fn handle_checklist(controller: &MissionController, cmd: &ChecklistCommand) -> CliResult {
    let sections = controller.checklist().sections();
    let draft = controller.draft();

    let selected: Vec<(usize, _)> = match cmd.section {
        Some(n) if n == 0 || n > sections.len() => {
            return Err(format!("no section {n}; there are {}", sections.len()).into());
        }
        Some(n) => vec![(n, &sections[n - 1])],
        None => sections.iter().enumerate().map(|(i, s)| (i + 1, s)).collect(),
    };

    for (number, section) in selected {
        println!("{number}. {}", section.title);
        for item in &section.items {
            let value = draft.completed.get(&item.id);
            let mark = if value.is_some_and(preflight::ItemValue::is_truthy) {
                "x"
            } else {
                " "
            };
            let required = if item.required { "*" } else { " " };
            println!("  [{mark}]{required} {:<28} {}", item.id, item.label);

            if let Some(preflight::ItemValue::Text(text)) = value {
                println!("         = {text}");
            }
            for subfield in &item.subfields {
                let recorded = draft
                    .sub_values
                    .get(&item.id)
                    .and_then(|values| values.get(&subfield.id))
                    .map_or("-", String::as_str);
                println!("         {}: {recorded}", subfield.label);
            }
        }
        println!();
    }
    println!("* required");
    Ok(())
}

fn handle_draft(controller: &mut MissionController, cmd: DraftCommand) -> CliResult {
    match cmd {
        DraftCommand::Set(args) => {
            if let Some(pilot) = args.pilot {
                controller.set_pilot_name(pilot);
            }
            if let Some(location) = args.location {
                controller.set_location(location);
            }
            if let Some(aircraft) = args.aircraft {
                controller.set_aircraft_type(aircraft);
            }
            if let Some(cert) = args.cert {
                controller.set_certificate_number(cert);
            }
            println!("Draft {} updated", controller.draft().mission_number);
        }
        DraftCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(controller.draft())?);
            } else {
                return handle_status(controller, false);
            }
        }
        DraftCommand::Reset => {
            controller.reset();
            println!("Draft discarded");
        }
    }
    Ok(())
}

async fn handle_weather(
    controller: &mut MissionController,
    config: &Config,
    cmd: WeatherCommand,
) -> CliResult {
    match cmd {
        WeatherCommand::Set {
            temperature,
            wind,
            precipitation,
        } => {
            let values = [
                (WeatherField::Temperature, temperature),
                (WeatherField::Wind, wind),
                (WeatherField::Precipitation, precipitation),
            ];
            for (field, value) in values {
                if let Some(value) = value {
                    controller.set_weather_field(field, value);
                }
            }
            println!("Weather updated");
        }
        WeatherCommand::Fetch { lat, lon } => {
            let position = match (lat, lon) {
                (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon)?),
                _ => config.home_position(),
            };
            let geolocator = FixedPosition::new(position);
            let lookup = WeatherLookup::new(NoaaClient::from_config(&config.weather)?);

            let report = controller.fetch_weather(&lookup, &geolocator).await?;
            println!("Temperature:   {}", report.temperature);
            println!("Wind:          {}", report.wind);
            println!("Precipitation: {}", report.precipitation);
        }
    }
    Ok(())
}

fn handle_flight(controller: &mut MissionController, cmd: FlightCommand) -> CliResult {
    match cmd {
        FlightCommand::Add => {
            let number = controller.add_flight();
            println!("Added flight {number}");
        }
        FlightCommand::Update {
            number,
            field,
            value,
        } => {
            let updated = number
                .checked_sub(1)
                .is_some_and(|index| controller.update_flight(index, field.into(), value));
            if !updated {
                return Err(format!("no flight {number}").into());
            }
            println!("Flight {number} updated");
        }
        FlightCommand::List => {
            let flights = &controller.draft().flight_records;
            if flights.is_empty() {
                println!("No flights recorded.");
            }
            for flight in flights {
                println!(
                    "Flight {}: {} {} -> {} {} ({}) battery {} {}",
                    flight.flight_number,
                    or_dash(&flight.takeoff_loc),
                    or_dash(&flight.launch_time),
                    or_dash(&flight.landing_loc),
                    or_dash(&flight.landing_time),
                    or_dash(&flight.elapsed_time),
                    or_dash(&flight.battery_voltage),
                    flight.notes
                );
            }
        }
    }
    Ok(())
}

fn handle_save(controller: &mut MissionController) -> CliResult {
    match controller.save_mission() {
        Ok(record) => {
            println!("Saved mission {}", record.mission_number);
            Ok(())
        }
        Err(err @ Error::ChecklistIncomplete { .. }) => {
            let draft = controller.draft();
            eprintln!("Open required items:");
            for item in controller.checklist().missing_required(&draft.completed) {
                eprintln!("  {} ({})", item.id, item.label);
            }
            Err(err.into())
        }
        Err(err) => Err(err.into()),
    }
}

fn handle_missions(controller: &MissionController, cmd: MissionsCommand) -> CliResult {
    match cmd {
        MissionsCommand::List { json } => {
            let missions = controller.missions();
            if json {
                println!("{}", serde_json::to_string_pretty(&missions)?);
            } else if missions.is_empty() {
                println!("No saved missions.");
            } else {
                for mission in missions {
                    println!(
                        "{}  {}  {}  {}  {} answers, {} flights",
                        mission.mission_number,
                        mission.timestamp.format("%Y-%m-%d %H:%M"),
                        or_dash(&mission.pilot_name),
                        or_dash(&mission.aircraft_type),
                        mission.completed_count(),
                        mission.flight_records.len()
                    );
                }
            }
        }
        MissionsCommand::Export {
            number,
            format,
            out,
        } => {
            let record = controller.find_mission(&number)?;
            let path = export::write_export(&out, &record, format.into())?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

fn handle_profile(controller: &mut MissionController, cmd: ProfileCommand) -> CliResult {
    match cmd {
        ProfileCommand::List { json } => {
            let profiles = controller.profiles();
            let selected = controller.draft().profile_id.clone();
            if json {
                println!("{}", serde_json::to_string_pretty(&profiles)?);
            } else if profiles.is_empty() {
                println!("No aircraft profiles.");
            } else {
                for profile in profiles {
                    let marker = if selected.as_deref() == Some(profile.id.as_str()) {
                        "*"
                    } else {
                        " "
                    };
                    println!(
                        "{marker} {}  {}  {}  {}",
                        profile.id,
                        profile.name,
                        profile.aircraft_type,
                        or_dash(&profile.certificate_number)
                    );
                }
            }
        }
        ProfileCommand::Add {
            name,
            aircraft,
            cert,
        } => {
            let profile = controller.create_profile(name, aircraft, cert);
            println!("Created and selected profile {}", profile.id);
        }
        ProfileCommand::Use { id } => {
            let profile = controller.select_profile(&id)?;
            println!("Selected {} ({})", profile.name, profile.aircraft_type);
        }
        ProfileCommand::Delete { id } => {
            if !controller.delete_profile(&id) {
                return Err(Error::unknown_profile(id).into());
            }
            println!("Deleted profile {id}");
        }
    }
    Ok(())
}

fn handle_config(config_path: Option<PathBuf>, cmd: ConfigCommand) -> CliResult {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = Config::load_from(config_path)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!("  Missions key:       {}", config.storage.missions_key);
                println!("  Profiles key:       {}", config.storage.profiles_key);
                println!("  Draft key:          {}", config.storage.draft_key);
                println!();
                println!("[Weather]");
                println!("  API base URL:       {}", config.weather.api_base_url);
                println!("  User agent:         {}", config.weather.user_agent);
                println!("  Timeout (secs):     {}", config.weather.timeout_secs);
                match config.home_position() {
                    Some(home) => println!("  Home position:      {home}"),
                    None => println!("  Home position:      (not set)"),
                }
                println!();
                println!("[Mission]");
                println!(
                    "  Require complete:   {}",
                    config.mission.require_complete_checklist
                );
            }
        }
        ConfigCommand::Path => {
            let path = config_path.unwrap_or_else(Config::default_config_path);
            println!("{}", path.display());
        }
        ConfigCommand::Validate { file } => {
            let path = file
                .or(config_path)
                .unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn broken_config() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[weather]\ntimeout_secs = 0\n").unwrap();
        (dir, path)
    }

    #[test]
    fn test_config_validate_reports_broken_file() {
        let (_dir, path) = broken_config();
        let cmd = ConfigCommand::Validate { file: None };
        assert!(handle_config(Some(path), cmd).is_ok());
    }

    #[test]
    fn test_config_path_ignores_broken_file() {
        let (_dir, path) = broken_config();
        assert!(handle_config(Some(path), ConfigCommand::Path).is_ok());
    }

    #[test]
    fn test_config_show_fails_on_broken_file() {
        let (_dir, path) = broken_config();
        let cmd = ConfigCommand::Show { json: true };
        assert!(handle_config(Some(path), cmd).is_err());
    }
}
