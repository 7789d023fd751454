use serde::{Deserialize, Serialize};

use crate::domain::error::LedgerError;
use crate::domain::models::{DeviceList, DocType, Event, LatestState};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub doc_type: DocType,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_state_change: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed_smart_app_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_digital: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_physical: Option<String>,
    pub device_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub location_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub time: String,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestStateRecord {
    pub doc_type: DocType,
    pub display_name: String,
    pub value: String,
    pub time: String,
    pub location_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceListRecord {
    pub doc_type: DocType,
    pub location_id: String,
    pub ids: String,
    pub names: String,
}

impl From<&Event> for EventRecord {
    fn from(event: &Event) -> Self {
        let details = event.details.as_ref();

        Self {
            doc_type: DocType::Event,
            display_name: event.display_name.clone(),
            device: details.map(|d| d.device.clone()),
            is_state_change: details.map(|d| d.is_state_change.clone()),
            id: details.map(|d| d.id.clone()),
            description: details.map(|d| d.description.clone()),
            description_text: details.map(|d| d.description_text.clone()),
            installed_smart_app_id: details.map(|d| d.installed_smart_app_id.clone()),
            is_digital: details.map(|d| d.is_digital.clone()),
            is_physical: details.map(|d| d.is_physical.clone()),
            device_id: event.device_id.clone(),
            location: details.map(|d| d.location.clone()),
            location_id: event.location_id.clone(),
            source: details.map(|d| d.source.clone()),
            unit: details.map(|d| d.unit.clone()),
            value: event.value.clone(),
            name: details.map(|d| d.name.clone()),
            time: event.time.clone(),
            date: event.date.clone(),
        }
    }
}

impl From<&LatestState> for LatestStateRecord {
    fn from(state: &LatestState) -> Self {
        Self {
            doc_type: DocType::EventLess,
            display_name: state.display_name.clone(),
            value: state.value.clone(),
            time: state.time.clone(),
            location_id: state.location_id.clone(),
        }
    }
}

impl From<&DeviceList> for DeviceListRecord {
    fn from(list: &DeviceList) -> Self {
        Self {
            doc_type: DocType::DeviceList,
            location_id: list.location_id.clone(),
            ids: list.ids.clone(),
            names: list.names.clone(),
        }
    }
}

pub fn encode_event(event: &Event) -> Result<Vec<u8>, LedgerError> {
    encode(&EventRecord::from(event))
}

pub fn encode_latest_state(state: &LatestState) -> Result<Vec<u8>, LedgerError> {
    encode(&LatestStateRecord::from(state))
}

pub fn encode_device_list(list: &DeviceList) -> Result<Vec<u8>, LedgerError> {
    encode(&DeviceListRecord::from(list))
}

#[cfg(test)]
pub fn decode_latest_state(bytes: &[u8]) -> Result<LatestStateRecord, LedgerError> {
    serde_json::from_slice(bytes).map_err(|error| {
        LedgerError::Storage(format!("stored record is not a latest state: {error}"))
    })
}

#[cfg(test)]
pub fn decode_event(bytes: &[u8]) -> Result<EventRecord, LedgerError> {
    serde_json::from_slice(bytes)
        .map_err(|error| LedgerError::Storage(format!("stored record is not an event: {error}")))
}

fn encode<T: Serialize>(record: &T) -> Result<Vec<u8>, LedgerError> {
    serde_json::to_vec(record)
        .map_err(|error| LedgerError::Storage(format!("failed to encode record: {error}")))
}
