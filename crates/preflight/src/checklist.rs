//! The static checklist taxonomy.
//!
//! A [`Checklist`] is an ordered list of [`Section`]s, each holding ordered
//! [`ChecklistItem`]s. Items flagged `required` gate mission completion; see
//! [`Checklist::progress`].

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::mission::ItemValue;

/// How a checklist item is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// A yes/no checkbox.
    Toggle,
    /// A free-text answer.
    Text,
    /// A checkbox that also shows the temperature/wind/precipitation triple.
    Weather,
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Toggle => write!(f, "toggle"),
            Self::Text => write!(f, "text"),
            Self::Weather => write!(f, "weather"),
        }
    }
}

/// Value kind of a sub-field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubFieldKind {
    /// Free text.
    Text,
    /// A number, stored as entered.
    Number,
}

/// An extra input shown under a toggle item while it is checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubField {
    /// Identifier, unique within the parent item.
    pub id: String,
    /// Display label.
    pub label: String,
    /// Value kind.
    pub kind: SubFieldKind,
}

/// One entry of the checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    /// Identifier, unique across the whole checklist.
    pub id: String,
    /// Display label.
    pub label: String,
    /// How the item is answered.
    pub kind: ItemKind,
    /// Whether the item must be truthy for the mission to be complete.
    #[serde(default)]
    pub required: bool,
    /// Sub-fields shown while the item is checked.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subfields: Vec<SubField>,
}

impl ChecklistItem {
    /// Create an item without sub-fields.
    #[must_use]
    pub fn new(id: &str, label: &str, kind: ItemKind, required: bool) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            kind,
            required,
            subfields: Vec::new(),
        }
    }

    fn toggle(id: &str, label: &str) -> Self {
        Self::new(id, label, ItemKind::Toggle, false)
    }

    fn required(id: &str, label: &str) -> Self {
        Self::new(id, label, ItemKind::Toggle, true)
    }

    fn weather(id: &str, label: &str) -> Self {
        Self::new(id, label, ItemKind::Weather, true)
    }

    fn with_subfield(mut self, id: &str, label: &str, kind: SubFieldKind) -> Self {
        self.subfields.push(SubField {
            id: id.to_string(),
            label: label.to_string(),
            kind,
        });
        self
    }

    /// Look up a sub-field by id.
    #[must_use]
    pub fn subfield(&self, id: &str) -> Option<&SubField> {
        self.subfields.iter().find(|s| s.id == id)
    }
}

/// A titled group of checklist items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Section heading.
    pub title: String,
    /// Items in display order.
    pub items: Vec<ChecklistItem>,
}

impl Section {
    /// Create a section.
    #[must_use]
    pub fn new(title: &str, items: Vec<ChecklistItem>) -> Self {
        Self {
            title: title.to_string(),
            items,
        }
    }
}

/// Completion of the required items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    /// Required items with a truthy value.
    pub satisfied: usize,
    /// Required items in the checklist.
    pub total: usize,
    /// `round(100 * satisfied / total)`, or 0 when there are no required items.
    pub percentage: u8,
}

impl Progress {
    fn new(satisfied: usize, total: usize) -> Self {
        let percentage = if total == 0 {
            0
        } else {
            // Integer round-half-up of 100 * satisfied / total.
            let scaled = (200 * satisfied + total) / (2 * total);
            u8::try_from(scaled.min(100)).unwrap_or(100)
        };
        Self {
            satisfied,
            total,
            percentage,
        }
    }

    /// Whether every required item is satisfied.
    ///
    /// A checklist without required items is never complete.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.percentage == 100
    }
}

/// An ordered, immutable checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Checklist {
    sections: Vec<Section>,
}

impl Checklist {
    /// Build a checklist from sections.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateItem`] if two items share an id, or
    /// [`Error::MisplacedSubFields`] if a non-toggle item has sub-fields.
    pub fn new(sections: Vec<Section>) -> Result<Self> {
        let mut seen = HashSet::new();
        for item in sections.iter().flat_map(|s| &s.items) {
            if !seen.insert(item.id.as_str()) {
                return Err(Error::DuplicateItem {
                    id: item.id.clone(),
                });
            }
            if !item.subfields.is_empty() && item.kind != ItemKind::Toggle {
                return Err(Error::MisplacedSubFields {
                    id: item.id.clone(),
                });
            }
        }
        Ok(Self { sections })
    }

    /// A checklist with no sections.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            sections: Vec::new(),
        }
    }

    /// The built-in small-UAS pre-flight checklist.
    #[must_use]
    pub fn standard() -> Self {
        use ChecklistItem as I;

        let sections = vec![
            Section::new(
                "Mission Checklist",
                vec![
                    I::required("airport_notified", "Airport(s) Notified"),
                    I::required("location_ok", "Location is OK to fly"),
                    I::weather("weather_ok", "Weather Forecast OK"),
                    I::toggle("firmware_updated", "Firmware up-to-date"),
                    I::toggle("microsd_formatted", "MicroSD Card Formatted"),
                ],
            ),
            Section::new(
                "Battery & Equipment",
                vec![
                    I::required("uav_batteries_charged", "UAV Batteries Charged")
                        .with_subfield("battery1", "Battery 1 volts", SubFieldKind::Number)
                        .with_subfield("battery2", "Battery 2 volts", SubFieldKind::Number)
                        .with_subfield("battery3", "Battery 3 volts", SubFieldKind::Number)
                        .with_subfield("battery4", "Battery 4 volts", SubFieldKind::Number),
                    I::required("controller_charged", "Controller Charged"),
                    I::required("tablet_charged", "Tablet Charged"),
                    I::toggle("phone_charged", "Mobile Phone Charged"),
                ],
            ),
            Section::new(
                "Gear Packed",
                vec![
                    I::toggle("gimbal_protector", "Gimbal Protector Installed"),
                    I::required("propellers_packed", "Propellers Packed"),
                    I::toggle("cables_packed", "Cables Packed"),
                    I::toggle("filters_packed", "Camera Filters Packed"),
                    I::toggle("sunshade_packed", "Sun Shade Packed"),
                    I::toggle("tools_packed", "Tools Packed"),
                    I::toggle("flight_plan", "Flight Plan designed/entered in software"),
                    I::toggle("logbook_packed", "Log Book Packed"),
                ],
            ),
            Section::new(
                "Launch Site Checklist",
                vec![
                    I::weather("weather_verified", "Verify Weather is OK to Fly"),
                    I::required("safety_briefing", "Safety Briefing"),
                    I::required("obstacles_checked", "Check for obstacles, interference"),
                    I::required(
                        "human_activity",
                        "Check for nearby human activity/dangerous situations",
                    ),
                    I::toggle(
                        "launch_pad_downwind",
                        "Verify Launch Pad is down-wind from observers",
                    ),
                    I::toggle("barriers_placed", "Launch Pad/Barriers Placed"),
                ],
            ),
            Section::new(
                "Equipment Checklist",
                vec![
                    I::required("airframe_inspected", "Airframe/Landing gear inspected"),
                    I::required("propellers_attached", "Propellers Inspected/Attached"),
                    I::required("controller_assembled", "Controller/Tablet Assembled"),
                    I::required("sd_installed", "SD Card Installed"),
                    I::required("battery_installed", "Battery Installed"),
                    I::required("gimbal_protector_removed", "Gimbal/Lens Protector Removed"),
                    I::toggle("filters_installed", "Camera Filters Installed"),
                ],
            ),
            Section::new(
                "Pre-Flight Checklist",
                vec![
                    I::required("aircraft_on_pad", "Aircraft Placed on Launch Pad"),
                    I::required(
                        "controller_on",
                        "Turn on Remote Controller/Tablet/DJI Pilot App",
                    ),
                    I::required("antennas_positioned", "Antennas Properly Positioned"),
                    I::required("aircraft_on", "Turn on Aircraft"),
                    I::required("leds_checked", "Check the aircraft status LEDs"),
                    I::required(
                        "gimbal_level",
                        "Verify the gimbal is level, can move unobstructed",
                    ),
                    I::required("rc_battery", "Check RC battery level"),
                    I::required("aircraft_battery", "Check Aircraft Battery Level"),
                    I::required("flight_mode", "Check flight mode switch (P-Mode)"),
                    I::required("satellite_compass", "Check Satellite and Compass status"),
                    I::required("rth_location", "Set RTH Location and height"),
                    I::required("camera_settings", "Check camera settings"),
                ],
            ),
            Section::new(
                "Take-Off Checklist",
                vec![
                    I::required("launch_clear", "Check launch site is clear for take off"),
                    I::required("motors_started", "Start the motors"),
                    I::required("takeoff_hover", "Take off and hover"),
                    I::required(
                        "stable_hover",
                        "Make sure the aircraft is stable while hovering",
                    ),
                    I::required(
                        "controls_responsive",
                        "Check flight controls, make sure they respond as expected",
                    ),
                    I::required("recording_started", "Start recording video"),
                ],
            ),
            Section::new(
                "Post Flight Checklist",
                vec![
                    I::required("battery_removed", "Remove Battery from Aircraft"),
                    I::required("gimbal_guard_installed", "Install Gimbal Guard"),
                    I::required("equipment_repacked", "Repack all equipment"),
                    I::required("flight_log_completed", "Complete the Flight Log"),
                ],
            ),
        ];

        Self { sections }
    }

    /// Sections in display order.
    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// All items, flattened in display order.
    pub fn items(&self) -> impl Iterator<Item = &ChecklistItem> {
        self.sections.iter().flat_map(|s| s.items.iter())
    }

    /// Look up an item by id.
    #[must_use]
    pub fn item(&self, id: &str) -> Option<&ChecklistItem> {
        self.items().find(|item| item.id == id)
    }

    /// Ids of every required item, in display order.
    #[must_use]
    pub fn required_ids(&self) -> Vec<&str> {
        self.items()
            .filter(|item| item.required)
            .map(|item| item.id.as_str())
            .collect()
    }

    /// Required items that are not yet satisfied by `completed`.
    #[must_use]
    pub fn missing_required<'a>(
        &'a self,
        completed: &BTreeMap<String, ItemValue>,
    ) -> Vec<&'a ChecklistItem> {
        self.items()
            .filter(|item| item.required)
            .filter(|item| !completed.get(&item.id).is_some_and(ItemValue::is_truthy))
            .collect()
    }

    /// Compute completion over the required items only.
    #[must_use]
    pub fn progress(&self, completed: &BTreeMap<String, ItemValue>) -> Progress {
        let required = self.required_ids();
        let satisfied = required
            .iter()
            .filter(|id| completed.get(**id).is_some_and(ItemValue::is_truthy))
            .count();
        Progress::new(satisfied, required.len())
    }
}

impl Default for Checklist {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answers(pairs: &[(&str, ItemValue)]) -> BTreeMap<String, ItemValue> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_standard_checklist_shape() {
        let checklist = Checklist::standard();
        assert_eq!(checklist.sections().len(), 8);
        assert_eq!(checklist.sections()[0].title, "Mission Checklist");
        assert_eq!(checklist.required_ids().len(), 39);
    }

    #[test]
    fn test_standard_checklist_ids_are_unique() {
        let checklist = Checklist::standard();
        assert!(Checklist::new(checklist.sections().to_vec()).is_ok());
    }

    #[test]
    fn test_new_rejects_duplicate_ids() {
        let sections = vec![
            Section::new("A", vec![ChecklistItem::toggle("x", "X")]),
            Section::new("B", vec![ChecklistItem::required("x", "X again")]),
        ];
        let err = Checklist::new(sections).unwrap_err();
        assert!(matches!(err, Error::DuplicateItem { id } if id == "x"));
    }

    #[test]
    fn test_new_rejects_subfields_on_text_item() {
        let item = ChecklistItem::new("notes", "Notes", ItemKind::Text, false).with_subfield(
            "extra",
            "Extra",
            SubFieldKind::Text,
        );
        let err = Checklist::new(vec![Section::new("A", vec![item])]).unwrap_err();
        assert!(matches!(err, Error::MisplacedSubFields { id } if id == "notes"));
    }

    #[test]
    fn test_battery_subfields() {
        let checklist = Checklist::standard();
        let item = checklist.item("uav_batteries_charged").unwrap();
        assert_eq!(item.subfields.len(), 4);
        assert_eq!(item.subfield("battery3").unwrap().kind, SubFieldKind::Number);
        assert!(item.subfield("battery5").is_none());
    }

    #[test]
    fn test_weather_items_are_required() {
        let checklist = Checklist::standard();
        for id in ["weather_ok", "weather_verified"] {
            let item = checklist.item(id).unwrap();
            assert_eq!(item.kind, ItemKind::Weather);
            assert!(item.required);
        }
    }

    #[test]
    fn test_progress_empty_checklist_is_zero() {
        let progress = Checklist::empty().progress(&BTreeMap::new());
        assert_eq!(progress.satisfied, 0);
        assert_eq!(progress.total, 0);
        assert_eq!(progress.percentage, 0);
        assert!(!progress.is_complete());
    }

    #[test]
    fn test_progress_rounds_to_nearest() {
        let sections = vec![Section::new(
            "S",
            vec![
                ChecklistItem::required("a", "A"),
                ChecklistItem::required("b", "B"),
                ChecklistItem::required("c", "C"),
                ChecklistItem::toggle("d", "D"),
            ],
        )];
        let checklist = Checklist::new(sections).unwrap();

        let one = checklist.progress(&answers(&[("a", ItemValue::Flag(true))]));
        assert_eq!(one.percentage, 33);

        let two = checklist.progress(&answers(&[
            ("a", ItemValue::Flag(true)),
            ("b", ItemValue::Flag(true)),
            ("d", ItemValue::Flag(true)),
        ]));
        assert_eq!(two.satisfied, 2);
        assert_eq!(two.percentage, 67);
    }

    #[test]
    fn test_progress_ignores_falsy_values() {
        let sections = vec![Section::new(
            "S",
            vec![
                ChecklistItem::required("a", "A"),
                ChecklistItem::required("b", "B"),
            ],
        )];
        let checklist = Checklist::new(sections).unwrap();
        let progress = checklist.progress(&answers(&[
            ("a", ItemValue::Flag(false)),
            ("b", ItemValue::Text(String::new())),
        ]));
        assert_eq!(progress.satisfied, 0);
        assert_eq!(progress.percentage, 0);
    }

    #[test]
    fn test_progress_complete() {
        let checklist = Checklist::standard();
        let completed = checklist
            .required_ids()
            .into_iter()
            .map(|id| (id.to_string(), ItemValue::Flag(true)))
            .collect();
        let progress = checklist.progress(&completed);
        assert_eq!(progress.percentage, 100);
        assert!(progress.is_complete());
        assert!(checklist.missing_required(&completed).is_empty());
    }

    #[test]
    fn test_progress_monotonic_when_toggling_required() {
        let checklist = Checklist::standard();
        let mut completed = BTreeMap::new();
        let mut last = checklist.progress(&completed).percentage;
        for id in checklist.required_ids() {
            completed.insert(id.to_string(), ItemValue::Flag(true));
            let now = checklist.progress(&completed).percentage;
            assert!(now >= last);
            last = now;
        }
        for id in checklist.required_ids() {
            completed.insert(id.to_string(), ItemValue::Flag(false));
            let now = checklist.progress(&completed).percentage;
            assert!(now <= last);
            last = now;
        }
        assert_eq!(last, 0);
    }

    #[test]
    fn test_item_kind_display() {
        assert_eq!(ItemKind::Toggle.to_string(), "toggle");
        assert_eq!(ItemKind::Weather.to_string(), "weather");
    }
}
