//! Mission state controller.
//!
//! [`MissionController`] owns the in-progress [`MissionDraft`], applies edits
//! to it, snapshots it after every edit, and finalizes it into a saved
//! [`MissionRecord`]. Aircraft profiles are managed here too because
//! selecting one writes into the draft.

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::checklist::{Checklist, ChecklistItem, ItemKind, Progress, SubFieldKind};
use crate::config::MissionConfig;
use crate::error::{Error, Result};
use crate::mission::{
    mission_number, next_mission_number, FlightField, FlightRecord, ItemValue, MissionDraft,
    MissionRecord, WeatherField,
};
use crate::profile::AircraftProfile;
use crate::storage::Persistence;
use crate::weather::{Geolocator, WeatherLookup, WeatherReport, WeatherSource};

/// Behavioural switches for a [`MissionController`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerOptions {
    /// Refuse to save until every required item is satisfied.
    pub require_complete_checklist: bool,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            require_complete_checklist: true,
        }
    }
}

impl From<&MissionConfig> for ControllerOptions {
    fn from(config: &MissionConfig) -> Self {
        Self {
            require_complete_checklist: config.require_complete_checklist,
        }
    }
}

/// Owner of the draft mission and its persisted collections.
#[derive(Debug)]
pub struct MissionController {
    persistence: Persistence,
    checklist: Checklist,
    options: ControllerOptions,
    draft: MissionDraft,
}

impl MissionController {
    /// Open a session, restoring any stored draft.
    ///
    /// A stored draft is merged field by field over a fresh one, so a draft
    /// written by an older version still loads.
    #[must_use]
    pub fn open(persistence: Persistence, checklist: Checklist, options: ControllerOptions) -> Self {
        let fresh = MissionDraft::new(mission_number(Utc::now()));
        let draft = match persistence.draft() {
            Some(stored) => {
                debug!("Restoring stored draft");
                MissionDraft::restore(fresh, &stored)
            }
            None => fresh,
        };
        info!("Mission session {} opened", draft.mission_number);

        Self {
            persistence,
            checklist,
            options,
            draft,
        }
    }

    /// The current draft.
    #[must_use]
    pub fn draft(&self) -> &MissionDraft {
        &self.draft
    }

    /// The checklist in use.
    #[must_use]
    pub fn checklist(&self) -> &Checklist {
        &self.checklist
    }

    /// The options in effect.
    #[must_use]
    pub fn options(&self) -> ControllerOptions {
        self.options
    }

    /// The persistence adapter.
    #[must_use]
    pub fn persistence(&self) -> &Persistence {
        &self.persistence
    }

    /// Close the session and hand back the persistence adapter.
    #[must_use]
    pub fn into_persistence(self) -> Persistence {
        self.persistence
    }

    fn autosave(&self) {
        self.persistence.save_draft(&self.draft);
    }

    // === Identity ===

    /// Set the remote pilot's name.
    pub fn set_pilot_name(&mut self, value: impl Into<String>) {
        self.draft.pilot_name = value.into();
        self.autosave();
    }

    /// Set the flight location.
    pub fn set_location(&mut self, value: impl Into<String>) {
        self.draft.location = value.into();
        self.autosave();
    }

    /// Set the aircraft type.
    pub fn set_aircraft_type(&mut self, value: impl Into<String>) {
        self.draft.aircraft_type = value.into();
        self.autosave();
    }

    /// Set the remote pilot certificate number.
    pub fn set_certificate_number(&mut self, value: impl Into<String>) {
        self.draft.certificate_number = value.into();
        self.autosave();
    }

    // === Checklist answers ===

    /// Flip an item between done and not done, returning the new state.
    ///
    /// An item with no answer yet becomes done.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownItem`] if the checklist has no such item and
    /// [`Error::WrongItemKind`] if it takes a text answer.
    pub fn toggle(&mut self, item_id: &str) -> Result<bool> {
        let item = self.require_item(item_id)?;
        if item.kind == ItemKind::Text {
            return Err(Error::WrongItemKind {
                id: item_id.to_string(),
                kind: item.kind,
            });
        }
        let done = !self
            .draft
            .completed
            .get(item_id)
            .is_some_and(ItemValue::is_truthy);
        self.draft
            .completed
            .insert(item_id.to_string(), ItemValue::Flag(done));
        debug!("Item {} -> {}", item_id, done);
        self.autosave();
        Ok(done)
    }

    /// Record a free-text answer for an item.
    ///
    /// An empty string leaves the item unsatisfied.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownItem`] if the checklist has no such item and
    /// [`Error::WrongItemKind`] if it is a checkbox.
    pub fn set_text_value(&mut self, item_id: &str, value: impl Into<String>) -> Result<()> {
        let item = self.require_item(item_id)?;
        if item.kind != ItemKind::Text {
            return Err(Error::WrongItemKind {
                id: item_id.to_string(),
                kind: item.kind,
            });
        }
        self.draft
            .completed
            .insert(item_id.to_string(), ItemValue::Text(value.into()));
        self.autosave();
        Ok(())
    }

    /// Record a sub-field value, such as one battery's voltage.
    ///
    /// Sub-field values are stored apart from the item's own answer and do
    /// not count towards progress.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownItem`] or [`Error::UnknownSubField`] if the
    /// item or sub-field does not exist, and [`Error::InvalidSubFieldValue`]
    /// if a numeric sub-field is given anything but a number. An empty value
    /// clears a numeric sub-field.
    pub fn set_sub_field_value(
        &mut self,
        item_id: &str,
        subfield_id: &str,
        value: impl Into<String>,
    ) -> Result<()> {
        let item = self.require_item(item_id)?;
        let Some(subfield) = item.subfield(subfield_id) else {
            return Err(Error::UnknownSubField {
                item: item_id.to_string(),
                subfield: subfield_id.to_string(),
            });
        };
        let value = value.into();
        if subfield.kind == SubFieldKind::Number && !is_number_or_blank(&value) {
            return Err(Error::InvalidSubFieldValue {
                item: item_id.to_string(),
                subfield: subfield_id.to_string(),
                value,
            });
        }
        self.draft
            .sub_values
            .entry(item_id.to_string())
            .or_default()
            .insert(subfield_id.to_string(), value);
        self.autosave();
        Ok(())
    }

    fn require_item(&self, item_id: &str) -> Result<&ChecklistItem> {
        self.checklist
            .item(item_id)
            .ok_or_else(|| Error::unknown_item(item_id))
    }

    // === Weather ===

    /// Set one weather slot by hand.
    pub fn set_weather_field(&mut self, field: WeatherField, value: impl Into<String>) {
        self.draft.weather.set(field, value);
        self.autosave();
    }

    /// Overwrite all three weather slots at once.
    pub fn apply_weather(&mut self, report: WeatherReport) {
        self.draft.weather = report.into();
        self.autosave();
    }

    /// Resolve the current position, fetch a forecast and apply it.
    ///
    /// The draft is only touched when the whole report arrives.
    ///
    /// # Errors
    ///
    /// Returns the geolocation or lookup error; the draft's weather is left
    /// exactly as it was.
    pub async fn fetch_weather<S: WeatherSource>(
        &mut self,
        lookup: &WeatherLookup<S>,
        geolocator: &dyn Geolocator,
    ) -> Result<WeatherReport> {
        let position = geolocator.current_position()?;
        match lookup.fetch(position).await {
            Ok(report) => {
                self.apply_weather(report.clone());
                Ok(report)
            }
            Err(err) => {
                warn!("Weather lookup failed: {}", err);
                Err(err)
            }
        }
    }

    // === Flight log ===

    /// Append an empty flight record and return its flight number.
    pub fn add_flight(&mut self) -> u32 {
        let number = u32::try_from(self.draft.flight_records.len())
            .unwrap_or(u32::MAX - 1)
            .saturating_add(1);
        self.draft.flight_records.push(FlightRecord::new(number));
        self.autosave();
        number
    }

    /// Set one field of the flight at `index` (0-based).
    ///
    /// Returns `false`, changing nothing, when `index` is out of range.
    pub fn update_flight(
        &mut self,
        index: usize,
        field: FlightField,
        value: impl Into<String>,
    ) -> bool {
        let Some(record) = self.draft.flight_records.get_mut(index) else {
            debug!("No flight at index {}", index);
            return false;
        };
        record.set(field, value);
        self.autosave();
        true
    }

    // === Progress and finalization ===

    /// Completion over the required items.
    #[must_use]
    pub fn compute_progress(&self) -> Progress {
        self.checklist.progress(&self.draft.completed)
    }

    /// Finalize the draft into a saved mission and start a new one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingIdentity`] when pilot, location or aircraft
    /// type is blank, and [`Error::ChecklistIncomplete`] when completion is
    /// required and not reached. Nothing changes on error.
    pub fn save_mission(&mut self) -> Result<MissionRecord> {
        let missing = self.draft.missing_identity();
        if !missing.is_empty() {
            return Err(Error::MissingIdentity { fields: missing });
        }

        if self.options.require_complete_checklist {
            let progress = self.compute_progress();
            if !progress.is_complete() {
                return Err(Error::ChecklistIncomplete {
                    satisfied: progress.satisfied,
                    total: progress.total,
                    percentage: progress.percentage,
                });
            }
        }

        let record = self.draft.to_record(Utc::now());
        self.persistence.prepend_mission(&record);
        self.persistence.clear_draft();
        self.draft = MissionDraft::new(next_mission_number(
            Some(&record.mission_number),
            Utc::now(),
        ));

        info!(
            "Saved mission {} ({} answers, {} flights)",
            record.mission_number,
            record.completed_count(),
            record.flight_records.len()
        );
        Ok(record)
    }

    /// Discard the draft and start over with a new mission number.
    pub fn reset(&mut self) {
        self.persistence.clear_draft();
        self.draft = MissionDraft::new(next_mission_number(
            Some(&self.draft.mission_number),
            Utc::now(),
        ));
        info!("Draft discarded, new mission {}", self.draft.mission_number);
    }

    // === Saved missions ===

    /// Saved missions, newest first.
    #[must_use]
    pub fn missions(&self) -> Vec<MissionRecord> {
        self.persistence.missions()
    }

    /// Look up a saved mission by number.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissionNotFound`] if no saved mission has that number.
    pub fn find_mission(&self, number: &str) -> Result<MissionRecord> {
        self.missions()
            .into_iter()
            .find(|m| m.mission_number == number)
            .ok_or_else(|| Error::MissionNotFound {
                number: number.to_string(),
            })
    }

    // === Aircraft profiles ===

    /// Saved aircraft profiles.
    #[must_use]
    pub fn profiles(&self) -> Vec<AircraftProfile> {
        self.persistence.profiles()
    }

    /// Save a new profile and select it.
    pub fn create_profile(
        &mut self,
        name: impl Into<String>,
        aircraft_type: impl Into<String>,
        certificate_number: impl Into<String>,
    ) -> AircraftProfile {
        let profile = AircraftProfile::new(name, aircraft_type, certificate_number);
        let mut profiles = self.profiles();
        profiles.push(profile.clone());
        self.persistence.save_profiles(&profiles);
        info!("Created aircraft profile {} ({})", profile.name, profile.id);

        self.apply_profile(&profile);
        profile
    }

    /// Copy a profile's aircraft type and certificate into the draft.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownProfile`] if no profile has that id.
    pub fn select_profile(&mut self, id: &str) -> Result<AircraftProfile> {
        let profile = self
            .profiles()
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| Error::unknown_profile(id))?;
        self.apply_profile(&profile);
        Ok(profile)
    }

    fn apply_profile(&mut self, profile: &AircraftProfile) {
        self.draft.profile_id = Some(profile.id.clone());
        self.draft.aircraft_type.clone_from(&profile.aircraft_type);
        self.draft
            .certificate_number
            .clone_from(&profile.certificate_number);
        self.autosave();
    }

    /// Delete a profile, returning whether it existed.
    ///
    /// If the draft referenced it, the reference is cleared; the aircraft
    /// type and certificate already copied into the draft stay.
    pub fn delete_profile(&mut self, id: &str) -> bool {
        let mut profiles = self.profiles();
        let before = profiles.len();
        profiles.retain(|p| p.id != id);
        if profiles.len() == before {
            return false;
        }
        self.persistence.save_profiles(&profiles);

        if self.draft.profile_id.as_deref() == Some(id) {
            self.draft.profile_id = None;
            self.autosave();
        }
        info!("Deleted aircraft profile {}", id);
        true
    }
}

fn is_number_or_blank(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value.parse::<f64>().is_ok_and(f64::is_finite)
}
