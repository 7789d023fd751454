use serde::{Deserialize, Serialize};

/// Discriminator shared by every record stored in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocType {
    #[serde(rename = "Event")]
    Event,
    #[serde(rename = "EventLess")]
    EventLess,
    #[serde(rename = "deviceId")]
    DeviceList,
}

impl DocType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Event => "Event",
            Self::EventLess => "EventLess",
            Self::DeviceList => "deviceId",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventShape {
    Full,
    Compact,
}

impl EventShape {
    pub const FULL_ARITY: usize = 17;
    pub const COMPACT_ARITY: usize = 5;

    pub fn from_arity(count: usize) -> Option<Self> {
        match count {
            Self::FULL_ARITY => Some(Self::Full),
            Self::COMPACT_ARITY => Some(Self::Compact),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EventDetails {
    pub device: String,
    pub is_state_change: String,
    pub id: String,
    pub description: String,
    pub description_text: String,
    pub installed_smart_app_id: String,
    pub is_digital: String,
    pub is_physical: String,
    pub location: String,
    pub source: String,
    pub unit: String,
    pub name: String,
}

/// A normalized device event. Every string is trimmed and lower-cased and
/// `date` is derived from `time`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub display_name: String,
    pub device_id: String,
    pub location_id: String,
    pub value: String,
    pub time: String,
    pub date: String,
    pub details: Option<EventDetails>,
}

impl Event {
    pub fn shape(&self) -> EventShape {
        if self.details.is_some() {
            EventShape::Full
        } else {
            EventShape::Compact
        }
    }

    pub fn acknowledgment(&self) -> &str {
        match &self.details {
            Some(details) => &details.device,
            None => &self.display_name,
        }
    }

    pub fn latest_state(&self) -> LatestState {
        LatestState {
            display_name: self.display_name.clone(),
            value: self.value.clone(),
            time: self.time.clone(),
            location_id: self.location_id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatestState {
    pub display_name: String,
    pub value: String,
    pub time: String,
    pub location_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceList {
    pub location_id: String,
    pub ids: String,
    pub names: String,
}

impl DeviceList {
    pub const DELIMITER: char = ',';

    pub fn ids(&self) -> Vec<&str> {
        split_list(&self.ids)
    }

    pub fn names(&self) -> Vec<&str> {
        split_list(&self.names)
    }
}

fn split_list(raw: &str) -> Vec<&str> {
    raw.split(DeviceList::DELIMITER)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .collect()
}
