//! Export serializers for saved missions.
//!
//! Two formats: canonical JSON, which reads back into an identical
//! [`MissionRecord`], and a plain-text report for printing or filing.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{Error, Result};
use crate::mission::{MissionRecord, Weather, WeatherField};

/// Placeholder for weather slots with no value.
const NOT_AVAILABLE: &str = "N/A";

/// Output format of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    /// Pretty-printed JSON.
    Json,
    /// Plain-text report.
    Text,
}

impl ExportFormat {
    /// File extension, without the dot.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Text => "txt",
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Text => write!(f, "text"),
        }
    }
}

/// The export file name for a mission, e.g. `mission-2024-06-01-1234.json`.
#[must_use]
pub fn file_name(mission_number: &str, format: ExportFormat) -> String {
    format!("mission-{mission_number}.{}", format.extension())
}

/// Serialize a mission as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn canonical_json(record: &MissionRecord) -> Result<String> {
    Ok(serde_json::to_string_pretty(record)?)
}

/// Render a mission as a plain-text report.
///
/// Sections always appear in the same order. Blank weather slots read
/// `N/A`; checkbox answers read `YES` or `NO`, text answers verbatim.
#[must_use]
pub fn text_report(record: &MissionRecord) -> String {
    let mut lines = vec![
        "UAS PRE-FLIGHT CHECKLIST".to_string(),
        format!("Mission #: {}", record.mission_number),
        format!("Date: {}", record.timestamp.format("%Y-%m-%d %H:%M:%S UTC")),
        String::new(),
        "MISSION INFORMATION".to_string(),
        format!("Pilot: {}", record.pilot_name),
        format!("RP Cert: {}", record.certificate_number),
        format!("Location: {}", record.location),
        format!("Aircraft: {}", record.aircraft_type),
        String::new(),
        "WEATHER CONDITIONS".to_string(),
        format!("Temperature: {}", slot(&record.weather, WeatherField::Temperature)),
        format!("Wind: {}", slot(&record.weather, WeatherField::Wind)),
        format!(
            "Precipitation: {}",
            slot(&record.weather, WeatherField::Precipitation)
        ),
        String::new(),
        "CHECKLIST ITEMS COMPLETED".to_string(),
    ];

    lines.extend(
        record
            .completed
            .iter()
            .map(|(key, value)| format!("- {key}: {value}")),
    );

    lines.push(String::new());
    lines.push("FLIGHT RECORDS".to_string());
    for flight in &record.flight_records {
        lines.push(String::new());
        lines.push(format!("Flight {}", flight.flight_number));
        lines.push(format!(
            "- Takeoff: {} at {}",
            flight.takeoff_loc, flight.launch_time
        ));
        lines.push(format!(
            "- Landing: {} at {}",
            flight.landing_loc, flight.landing_time
        ));
        lines.push(format!("- Duration: {}", flight.elapsed_time));
        lines.push(format!("- Battery: {}", flight.battery_voltage));
        lines.push(format!("- Notes: {}", flight.notes));
    }

    let mut report = lines.join("\n");
    report.push('\n');
    report
}

fn slot(weather: &Weather, field: WeatherField) -> &str {
    weather
        .get(field)
        .filter(|value| !value.is_empty())
        .unwrap_or(NOT_AVAILABLE)
}

/// Render a mission in the given format.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render(record: &MissionRecord, format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Json => canonical_json(record),
        ExportFormat::Text => Ok(text_report(record)),
    }
}

/// Write a mission export into `dir`, creating it if needed.
///
/// Returns the path of the written file.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the file cannot be
/// written.
pub fn write_export(dir: &Path, record: &MissionRecord, format: ExportFormat) -> Result<PathBuf> {
    if !dir.as_os_str().is_empty() && !dir.exists() {
        std::fs::create_dir_all(dir).map_err(|source| Error::DirectoryCreate {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let path = dir.join(file_name(&record.mission_number, format));
    std::fs::write(&path, render(record, format)?)?;
    info!("Exported mission {} to {}", record.mission_number, path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mission::{FlightField, FlightRecord, ItemValue, MissionDraft};
    use chrono::{TimeZone, Utc};

    fn sample() -> MissionRecord {
        let mut draft = MissionDraft::new("2024-06-01-1234");
        draft.pilot_name = "Jane Doe".to_string();
        draft.location = "Field A".to_string();
        draft.aircraft_type = "Mavic 3".to_string();
        draft.certificate_number = "4000123".to_string();
        draft
            .completed
            .insert("airport_notified".to_string(), ItemValue::Flag(true));
        draft
            .completed
            .insert("firmware_updated".to_string(), ItemValue::Flag(false));
        draft
            .sub_values
            .entry("uav_batteries_charged".to_string())
            .or_default()
            .insert("battery1".to_string(), "16.8".to_string());
        draft.weather.set(WeatherField::Temperature, "72°F");

        let mut flight = FlightRecord::new(1);
        flight.set(FlightField::TakeoffLoc, "Pad A");
        flight.set(FlightField::LaunchTime, "09:00");
        flight.set(FlightField::LandingLoc, "Pad B");
        flight.set(FlightField::LandingTime, "09:14");
        flight.set(FlightField::ElapsedTime, "14m");
        flight.set(FlightField::BatteryVoltage, "15.1");
        flight.set(FlightField::Notes, "gusty");
        draft.flight_records.push(flight);

        draft.to_record(Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap())
    }

    #[test]
    fn test_file_name() {
        assert_eq!(
            file_name("2024-06-01-1234", ExportFormat::Json),
            "mission-2024-06-01-1234.json"
        );
        assert_eq!(
            file_name("2024-06-01-1234", ExportFormat::Text),
            "mission-2024-06-01-1234.txt"
        );
    }

    #[test]
    fn test_canonical_json_reads_back() {
        let record = sample();
        let json = canonical_json(&record).unwrap();

        let decoded: MissionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, record);
        assert!(json.contains("\"missionNumber\": \"2024-06-01-1234\""));
        assert!(json.contains("\"rpCert\""));
    }

    #[test]
    fn test_text_report_sections_in_order() {
        let report = text_report(&sample());
        let headings = [
            "UAS PRE-FLIGHT CHECKLIST",
            "MISSION INFORMATION",
            "WEATHER CONDITIONS",
            "CHECKLIST ITEMS COMPLETED",
            "FLIGHT RECORDS",
        ];
        let positions: Vec<usize> = headings
            .iter()
            .map(|h| report.find(h).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_text_report_content() {
        let report = text_report(&sample());

        assert!(report.contains("Mission #: 2024-06-01-1234"));
        assert!(report.contains("Date: 2024-06-01 09:30:00 UTC"));
        assert!(report.contains("Pilot: Jane Doe"));
        assert!(report.contains("RP Cert: 4000123"));
        assert!(report.contains("Temperature: 72°F"));
        assert!(report.contains("Wind: N/A"));
        assert!(report.contains("Precipitation: N/A"));
        assert!(report.contains("- airport_notified: YES"));
        assert!(report.contains("- firmware_updated: NO"));
        assert!(report.contains("- uav_batteries_charged.battery1: 16.8"));
        assert!(report.contains("Flight 1"));
        assert!(report.contains("- Takeoff: Pad A at 09:00"));
        assert!(report.contains("- Landing: Pad B at 09:14"));
        assert!(report.contains("- Duration: 14m"));
        assert!(report.contains("- Battery: 15.1"));
        assert!(report.contains("- Notes: gusty"));
    }

    #[test]
    fn test_text_report_blank_weather_is_na() {
        let mut record = sample();
        record.weather = Weather {
            temperature: Some(String::new()),
            wind: None,
            precipitation: None,
        };
        assert!(text_report(&record).contains("Temperature: N/A"));
    }

    #[test]
    fn test_render() {
        let record = sample();
        assert!(render(&record, ExportFormat::Json)
            .unwrap()
            .starts_with('{'));
        assert!(render(&record, ExportFormat::Text)
            .unwrap()
            .starts_with("UAS PRE-FLIGHT CHECKLIST"));
    }

    #[test]
    fn test_write_export_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("exports");
        let record = sample();

        let path = write_export(&out, &record, ExportFormat::Json).unwrap();

        assert_eq!(path, out.join("mission-2024-06-01-1234.json"));
        let written = std::fs::read_to_string(&path).unwrap();
        let decoded: MissionRecord = serde_json::from_str(&written).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_format_display() {
        assert_eq!(ExportFormat::Json.to_string(), "json");
        assert_eq!(ExportFormat::Text.to_string(), "text");
    }
}
