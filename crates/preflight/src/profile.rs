//! Saved aircraft identities.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An aircraft identity reusable across missions.
///
/// Missions copy the type and certificate number when a profile is selected
/// and keep only the id as a back-reference, so editing or deleting a profile
/// never changes saved missions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AircraftProfile {
    /// Generated identifier.
    pub id: String,
    /// Display name, e.g. `My Mavic 3`.
    pub name: String,
    /// Aircraft make and model, e.g. `DJI Mavic 3`.
    #[serde(rename = "type")]
    pub aircraft_type: String,
    /// Remote pilot certificate number (may be empty).
    #[serde(default)]
    pub certificate_number: String,
    /// Item ids of an aircraft-specific checklist, kept as stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_checklist: Option<Vec<String>>,
}

impl AircraftProfile {
    /// Create a profile with a fresh id.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        aircraft_type: impl Into<String>,
        certificate_number: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            aircraft_type: aircraft_type.into(),
            certificate_number: certificate_number.into(),
            custom_checklist: None,
        }
    }
}
