//! Mission data model.
//!
//! A [`MissionDraft`] is the mutable, in-progress form; saving it produces an
//! immutable [`MissionRecord`]. Both serialize with the camelCase field names
//! used by the browser version of the checklist, so stored data and exported
//! files stay interchangeable.
//!
//! Stored blobs are read leniently: every field is decoded on its own and a
//! missing or ill-typed field falls back to its default instead of failing the
//! whole record.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// The answer recorded for a checklist item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemValue {
    /// A checkbox state.
    Flag(bool),
    /// A free-text answer or sub-field value.
    Text(String),
}

impl ItemValue {
    /// Whether the value counts as "done": `true`, or a non-empty string.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Flag(flag) => *flag,
            Self::Text(text) => !text.is_empty(),
        }
    }

    /// Convert an arbitrary stored JSON value.
    ///
    /// Numbers are kept as their textual form; arrays, objects and nulls have
    /// no item meaning and yield `None`.
    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(flag) => Some(Self::Flag(*flag)),
            Value::String(text) => Some(Self::Text(text.clone())),
            Value::Number(n) => Some(Self::Text(n.to_string())),
            _ => None,
        }
    }
}

impl std::fmt::Display for ItemValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Flag(true) => write!(f, "YES"),
            Self::Flag(false) => write!(f, "NO"),
            Self::Text(text) => write!(f, "{text}"),
        }
    }
}

/// One slot of the weather triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeatherField {
    /// Temperature, e.g. `72°F`.
    Temperature,
    /// Wind, e.g. `5 mph NW`.
    Wind,
    /// Precipitation or short forecast, e.g. `Clear`.
    Precipitation,
}

impl std::fmt::Display for WeatherField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Temperature => write!(f, "temperature"),
            Self::Wind => write!(f, "wind"),
            Self::Precipitation => write!(f, "precipitation"),
        }
    }
}

/// Observed or forecast conditions at the launch site.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weather {
    /// Temperature with unit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<String>,
    /// Wind speed and direction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind: Option<String>,
    /// Precipitation or short forecast.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precipitation: Option<String>,
}

impl Weather {
    /// Overwrite one slot.
    pub fn set(&mut self, field: WeatherField, value: impl Into<String>) {
        let value = Some(value.into());
        match field {
            WeatherField::Temperature => self.temperature = value,
            WeatherField::Wind => self.wind = value,
            WeatherField::Precipitation => self.precipitation = value,
        }
    }

    /// Read one slot.
    #[must_use]
    pub fn get(&self, field: WeatherField) -> Option<&str> {
        match field {
            WeatherField::Temperature => self.temperature.as_deref(),
            WeatherField::Wind => self.wind.as_deref(),
            WeatherField::Precipitation => self.precipitation.as_deref(),
        }
    }

    /// Whether no slot has been filled in.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.temperature.is_none() && self.wind.is_none() && self.precipitation.is_none()
    }
}

/// An editable field of a [`FlightRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlightField {
    /// Take-off location.
    TakeoffLoc,
    /// Landing location.
    LandingLoc,
    /// Launch time.
    LaunchTime,
    /// Landing time.
    LandingTime,
    /// Elapsed flight time.
    ElapsedTime,
    /// Battery voltage after landing.
    BatteryVoltage,
    /// Free-text notes.
    Notes,
}

/// One take-off/landing cycle within a mission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FlightRecord {
    /// 1-based position in the mission's flight log.
    pub flight_number: u32,
    /// Take-off location.
    pub takeoff_loc: String,
    /// Landing location.
    pub landing_loc: String,
    /// Launch time.
    pub launch_time: String,
    /// Landing time.
    pub landing_time: String,
    /// Elapsed flight time, e.g. `00:23:45`.
    pub elapsed_time: String,
    /// Battery voltage, e.g. `15.2V`.
    pub battery_voltage: String,
    /// Observations, issues or notable events.
    pub notes: String,
}

impl FlightRecord {
    /// Create an empty record with the given flight number.
    #[must_use]
    pub fn new(flight_number: u32) -> Self {
        Self {
            flight_number,
            ..Self::default()
        }
    }

    /// Overwrite one field.
    pub fn set(&mut self, field: FlightField, value: impl Into<String>) {
        let value = value.into();
        match field {
            FlightField::TakeoffLoc => self.takeoff_loc = value,
            FlightField::LandingLoc => self.landing_loc = value,
            FlightField::LaunchTime => self.launch_time = value,
            FlightField::LandingTime => self.landing_time = value,
            FlightField::ElapsedTime => self.elapsed_time = value,
            FlightField::BatteryVoltage => self.battery_voltage = value,
            FlightField::Notes => self.notes = value,
        }
    }
}

/// The in-progress mission form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionDraft {
    /// Number assigned when the session started.
    pub mission_number: String,
    /// Remote pilot in command.
    pub pilot_name: String,
    /// Flight location.
    pub location: String,
    /// Aircraft make and model.
    pub aircraft_type: String,
    /// Remote pilot certificate number.
    #[serde(rename = "rpCert")]
    pub certificate_number: String,
    /// Aircraft profile the identity fields were copied from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,
    /// Toggle and text answers keyed by item id.
    pub completed: BTreeMap<String, ItemValue>,
    /// Sub-field values keyed by item id, then sub-field id.
    pub sub_values: BTreeMap<String, BTreeMap<String, String>>,
    /// Weather triple.
    pub weather: Weather,
    /// Flight log, in flight-number order.
    pub flight_records: Vec<FlightRecord>,
}

impl MissionDraft {
    /// Create an empty draft.
    #[must_use]
    pub fn new(mission_number: impl Into<String>) -> Self {
        Self {
            mission_number: mission_number.into(),
            pilot_name: String::new(),
            location: String::new(),
            aircraft_type: String::new(),
            certificate_number: String::new(),
            profile_id: None,
            completed: BTreeMap::new(),
            sub_values: BTreeMap::new(),
            weather: Weather::default(),
            flight_records: Vec::new(),
        }
    }

    /// Merge a stored draft blob over `fresh`.
    ///
    /// Fields present and well-typed in `stored` replace the fresh values;
    /// everything else keeps its default. A blob that is not a JSON object
    /// leaves `fresh` unchanged.
    #[must_use]
    pub fn restore(fresh: Self, stored: &Value) -> Self {
        let Some(map) = stored.as_object() else {
            warn!("Stored draft is not an object, starting fresh");
            return fresh;
        };

        let mut draft = fresh;
        if let Some(number) = field::<String>(map, "missionNumber").filter(|n| !n.is_empty()) {
            draft.mission_number = number;
        }
        if let Some(pilot) = field(map, "pilotName") {
            draft.pilot_name = pilot;
        }
        if let Some(location) = field(map, "location") {
            draft.location = location;
        }
        if let Some(aircraft) = field(map, "aircraftType") {
            draft.aircraft_type = aircraft;
        }
        if let Some(cert) = field(map, "rpCert") {
            draft.certificate_number = cert;
        }
        if let Some(profile) = field::<Option<String>>(map, "profileId") {
            draft.profile_id = profile.filter(|id| !id.is_empty());
        }
        if let Some(completed) = map.get("completed").and_then(completed_from_json) {
            draft.completed = completed;
        }
        if let Some(sub_values) = field(map, "subValues") {
            draft.sub_values = sub_values;
        }
        if let Some(weather) = field(map, "weather") {
            draft.weather = weather;
        }
        if let Some(flights) = field(map, "flightRecords") {
            draft.flight_records = flights;
        }
        draft
    }

    /// Whether an identity field is blank, returning the labels of those that are.
    #[must_use]
    pub fn missing_identity(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.pilot_name.trim().is_empty() {
            missing.push("Pilot Name");
        }
        if self.location.trim().is_empty() {
            missing.push("Location");
        }
        if self.aircraft_type.trim().is_empty() {
            missing.push("Aircraft Type");
        }
        missing
    }

    /// Item answers and sub-field values merged into one flat mapping.
    ///
    /// Sub-field values are keyed `"<item>.<subfield>"`.
    #[must_use]
    pub fn flattened_answers(&self) -> BTreeMap<String, ItemValue> {
        let mut flat = self.completed.clone();
        for (item, values) in &self.sub_values {
            for (subfield, value) in values {
                flat.insert(format!("{item}.{subfield}"), ItemValue::Text(value.clone()));
            }
        }
        flat
    }

    /// Build the immutable record for this draft.
    #[must_use]
    pub fn to_record(&self, timestamp: DateTime<Utc>) -> MissionRecord {
        MissionRecord {
            mission_number: self.mission_number.clone(),
            timestamp,
            pilot_name: self.pilot_name.clone(),
            location: self.location.clone(),
            aircraft_type: self.aircraft_type.clone(),
            certificate_number: self.certificate_number.clone(),
            profile_id: self.profile_id.clone(),
            completed: self.flattened_answers(),
            weather: self.weather.clone(),
            flight_records: self.flight_records.clone(),
        }
    }
}

/// A finalized mission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionRecord {
    /// Mission number, `YYYY-MM-DD-NNNN`.
    pub mission_number: String,
    /// When the mission was saved.
    pub timestamp: DateTime<Utc>,
    /// Remote pilot in command.
    pub pilot_name: String,
    /// Flight location.
    pub location: String,
    /// Aircraft make and model.
    pub aircraft_type: String,
    /// Remote pilot certificate number.
    #[serde(rename = "rpCert")]
    pub certificate_number: String,
    /// Aircraft profile active when the mission was authored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,
    /// Item answers and `"<item>.<subfield>"` values.
    pub completed: BTreeMap<String, ItemValue>,
    /// Weather triple.
    pub weather: Weather,
    /// Flight log.
    pub flight_records: Vec<FlightRecord>,
}

impl MissionRecord {
    /// Read a stored mission leniently.
    ///
    /// Returns `None` only when the blob is not an object or carries no
    /// mission number; every other field falls back to its default.
    #[must_use]
    pub fn from_stored(stored: &Value) -> Option<Self> {
        let map = stored.as_object()?;
        let mission_number = field::<String>(map, "missionNumber").filter(|n| !n.is_empty())?;

        let timestamp = field::<DateTime<Utc>>(map, "timestamp").unwrap_or_else(|| {
            debug!("Mission {} has no readable timestamp", mission_number);
            DateTime::<Utc>::UNIX_EPOCH
        });

        Some(Self {
            mission_number,
            timestamp,
            pilot_name: field(map, "pilotName").unwrap_or_default(),
            location: field(map, "location").unwrap_or_default(),
            aircraft_type: field(map, "aircraftType").unwrap_or_default(),
            certificate_number: field(map, "rpCert").unwrap_or_default(),
            profile_id: field::<Option<String>>(map, "profileId")
                .flatten()
                .filter(|id| !id.is_empty()),
            completed: map
                .get("completed")
                .and_then(completed_from_json)
                .unwrap_or_default(),
            weather: field(map, "weather").unwrap_or_default(),
            flight_records: field(map, "flightRecords").unwrap_or_default(),
        })
    }

    /// Count of truthy entries in the completed mapping.
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.completed.values().filter(|v| v.is_truthy()).count()
    }
}

/// Generate a mission number from the current time.
///
/// The format is the UTC date followed by the last four digits of the
/// millisecond timestamp. Numbers are practically, not globally, unique.
#[must_use]
pub fn mission_number(now: DateTime<Utc>) -> String {
    format!(
        "{}-{:04}",
        now.format("%Y-%m-%d"),
        now.timestamp_millis().rem_euclid(10_000)
    )
}

/// Generate a mission number that differs from `previous`.
#[must_use]
pub fn next_mission_number(previous: Option<&str>, now: DateTime<Utc>) -> String {
    let candidate = mission_number(now);
    if previous == Some(candidate.as_str()) {
        mission_number(now + Duration::milliseconds(1))
    } else {
        candidate
    }
}

/// Decode one field of a stored object, logging and discarding a bad value.
fn field<T: DeserializeOwned>(map: &Map<String, Value>, key: &str) -> Option<T> {
    let value = map.get(key)?;
    match T::deserialize(value) {
        Ok(decoded) => Some(decoded),
        Err(err) => {
            warn!("Ignoring stored field '{}': {}", key, err);
            None
        }
    }
}

/// Decode a stored `completed` mapping.
///
/// Nested objects (per-item sub-field maps written by older versions) are
/// flattened to `"<item>.<subfield>"` keys; entries of any other shape are
/// dropped.
fn completed_from_json(value: &Value) -> Option<BTreeMap<String, ItemValue>> {
    let map = value.as_object()?;
    let mut completed = BTreeMap::new();
    for (key, entry) in map {
        if let Value::Object(nested) = entry {
            for (subfield, sub_value) in nested {
                if let Some(v) = ItemValue::from_json(sub_value) {
                    completed.insert(format!("{key}.{subfield}"), v);
                }
            }
        } else if let Some(v) = ItemValue::from_json(entry) {
            completed.insert(key.clone(), v);
        } else {
            debug!("Dropping completed entry '{}' of unsupported shape", key);
        }
    }
    Some(completed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn sample_record() -> MissionRecord {
        let mut draft = MissionDraft::new("2024-06-01-1234");
        draft.pilot_name = "Jane Doe".to_string();
        draft.location = "Field A".to_string();
        draft.aircraft_type = "Mavic 3".to_string();
        draft.certificate_number = "4012345".to_string();
        draft.profile_id = Some("p-1".to_string());
        draft
            .completed
            .insert("airport_notified".to_string(), ItemValue::Flag(true));
        draft
            .completed
            .insert("notes".to_string(), ItemValue::Text("windy".to_string()));
        draft
            .sub_values
            .entry("uav_batteries_charged".to_string())
            .or_default()
            .insert("battery1".to_string(), "15.2".to_string());
        draft.weather.set(WeatherField::Temperature, "70°F");
        let mut flight = FlightRecord::new(1);
        flight.set(FlightField::Notes, "smooth");
        draft.flight_records.push(flight);
        draft.to_record(Utc.with_ymd_and_hms(2024, 6, 1, 14, 30, 0).unwrap())
    }

    #[test]
    fn test_item_value_truthiness() {
        assert!(ItemValue::Flag(true).is_truthy());
        assert!(!ItemValue::Flag(false).is_truthy());
        assert!(ItemValue::Text("x".to_string()).is_truthy());
        assert!(!ItemValue::Text(String::new()).is_truthy());
    }

    #[test]
    fn test_item_value_display() {
        assert_eq!(ItemValue::Flag(true).to_string(), "YES");
        assert_eq!(ItemValue::Flag(false).to_string(), "NO");
        assert_eq!(ItemValue::Text("15.2".to_string()).to_string(), "15.2");
    }

    #[test]
    fn test_item_value_untagged_serde() {
        let values: BTreeMap<String, ItemValue> =
            serde_json::from_str(r#"{"a": true, "b": "text"}"#).unwrap();
        assert_eq!(values["a"], ItemValue::Flag(true));
        assert_eq!(values["b"], ItemValue::Text("text".to_string()));
    }

    #[test]
    fn test_weather_set_and_get() {
        let mut weather = Weather::default();
        assert!(weather.is_empty());
        weather.set(WeatherField::Wind, "5 mph NW");
        assert_eq!(weather.get(WeatherField::Wind), Some("5 mph NW"));
        assert_eq!(weather.get(WeatherField::Temperature), None);
        assert!(!weather.is_empty());
    }

    #[test]
    fn test_flight_record_set() {
        let mut flight = FlightRecord::new(3);
        flight.set(FlightField::BatteryVoltage, "15.2V");
        flight.set(FlightField::TakeoffLoc, "Pad 1");
        assert_eq!(flight.flight_number, 3);
        assert_eq!(flight.battery_voltage, "15.2V");
        assert_eq!(flight.takeoff_loc, "Pad 1");
        assert!(flight.notes.is_empty());
    }

    #[test]
    fn test_draft_serializes_browser_field_names() {
        let draft = MissionDraft::new("n");
        let json = serde_json::to_value(&draft).unwrap();
        for key in ["missionNumber", "pilotName", "aircraftType", "rpCert", "flightRecords"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn test_restore_overwrites_present_fields_only() {
        let stored = json!({
            "pilotName": "Jane Doe",
            "completed": {"airport_notified": true},
        });
        let draft = MissionDraft::restore(MissionDraft::new("fresh-1"), &stored);
        assert_eq!(draft.pilot_name, "Jane Doe");
        assert_eq!(draft.mission_number, "fresh-1");
        assert!(draft.location.is_empty());
        assert!(draft.flight_records.is_empty());
        assert!(draft.sub_values.is_empty());
        assert_eq!(draft.completed["airport_notified"], ItemValue::Flag(true));
    }

    #[test]
    fn test_restore_ignores_ill_typed_fields() {
        let stored = json!({
            "pilotName": 42,
            "location": "Field A",
            "flightRecords": "not a list",
        });
        let draft = MissionDraft::restore(MissionDraft::new("n"), &stored);
        assert!(draft.pilot_name.is_empty());
        assert_eq!(draft.location, "Field A");
        assert!(draft.flight_records.is_empty());
    }

    #[test]
    fn test_restore_non_object_is_fresh() {
        let fresh = MissionDraft::new("n");
        let draft = MissionDraft::restore(fresh.clone(), &json!([1, 2, 3]));
        assert_eq!(draft, fresh);
    }

    #[test]
    fn test_restore_empty_profile_id_is_none() {
        let draft = MissionDraft::restore(MissionDraft::new("n"), &json!({"profileId": ""}));
        assert!(draft.profile_id.is_none());
    }

    #[test]
    fn test_restore_keeps_stored_mission_number() {
        let stored = json!({"missionNumber": "2024-01-01-0001"});
        let draft = MissionDraft::restore(MissionDraft::new("fresh"), &stored);
        assert_eq!(draft.mission_number, "2024-01-01-0001");
    }

    #[test]
    fn test_missing_identity() {
        let mut draft = MissionDraft::new("n");
        assert_eq!(
            draft.missing_identity(),
            vec!["Pilot Name", "Location", "Aircraft Type"]
        );
        draft.pilot_name = "  ".to_string();
        draft.location = "Field A".to_string();
        assert_eq!(draft.missing_identity(), vec!["Pilot Name", "Aircraft Type"]);
    }

    #[test]
    fn test_to_record_flattens_sub_values() {
        let record = sample_record();
        assert_eq!(
            record.completed["uav_batteries_charged.battery1"],
            ItemValue::Text("15.2".to_string())
        );
        assert_eq!(record.completed["airport_notified"], ItemValue::Flag(true));
        assert_eq!(record.completed_count(), 3);
    }

    #[test]
    fn test_record_json_round_trip() {
        let record = sample_record();
        let json = serde_json::to_string(&record).unwrap();
        let decoded: MissionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_from_stored_matches_strict_decode() {
        let record = sample_record();
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(MissionRecord::from_stored(&value), Some(record));
    }

    #[test]
    fn test_from_stored_flattens_nested_completed() {
        let stored = json!({
            "missionNumber": "2024-06-01-0042",
            "timestamp": "2024-06-01T10:00:00.000Z",
            "completed": {
                "uav_batteries_charged": {"battery1": "15.1", "battery2": 15.3},
                "airport_notified": true,
                "junk": [1, 2]
            }
        });
        let record = MissionRecord::from_stored(&stored).unwrap();
        assert_eq!(
            record.completed["uav_batteries_charged.battery2"],
            ItemValue::Text("15.3".to_string())
        );
        assert!(!record.completed.contains_key("junk"));
        assert!(record.pilot_name.is_empty());
    }

    #[test]
    fn test_from_stored_requires_mission_number() {
        assert!(MissionRecord::from_stored(&json!({"pilotName": "x"})).is_none());
        assert!(MissionRecord::from_stored(&json!("nope")).is_none());
    }

    #[test]
    fn test_mission_number_format() {
        let now = Utc.timestamp_millis_opt(1_717_252_201_234).unwrap();
        assert_eq!(mission_number(now), "2024-06-01-1234");
    }

    #[test]
    fn test_mission_number_pads_suffix() {
        let now = Utc.timestamp_millis_opt(1_717_252_190_007).unwrap();
        assert!(mission_number(now).ends_with("-0007"));
    }

    #[test]
    fn test_next_mission_number_differs_from_previous() {
        let now = Utc.timestamp_millis_opt(1_717_252_201_234).unwrap();
        let previous = mission_number(now);
        let next = next_mission_number(Some(&previous), now);
        assert_ne!(next, previous);
        assert_eq!(next, "2024-06-01-1235");
        assert_eq!(next_mission_number(None, now), previous);
    }
}
