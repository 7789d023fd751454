use crate::domain::error::LedgerError;
use crate::domain::models::{DeviceList, Event, EventDetails, EventShape};

const SAVE_EVENT_ARITY: &str = "17 or 5";
const SAVE_DEVICE_ARGS: usize = 3;

/// Trimmed and lower-cased; saves and reads share this form.
pub fn normalize_field(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Compact `YYYYMMDD` date for an already lower-cased timestamp: hyphens are
/// removed and everything from the first `t` onward is dropped.
pub fn derive_date(time: &str) -> String {
    let stripped = time.replace('-', "");
    match stripped.split_once('t') {
        Some((date, _)) => date.to_string(),
        None => stripped,
    }
}

pub fn normalize_event(raw_args: &[String]) -> Result<Event, LedgerError> {
    let shape = EventShape::from_arity(raw_args.len())
        .ok_or_else(|| LedgerError::arity(SAVE_EVENT_ARITY, raw_args.len()))?;

    let fields: Vec<String> = raw_args.iter().map(|raw| normalize_field(raw)).collect();

    let event = match shape {
        EventShape::Full => {
            let [
                display_name,
                device,
                is_state_change,
                id,
                description,
                description_text,
                installed_smart_app_id,
                is_digital,
                is_physical,
                device_id,
                location,
                location_id,
                source,
                unit,
                value,
                name,
                time,
            ]: [String; EventShape::FULL_ARITY] = fields
                .try_into()
                .map_err(|_| LedgerError::arity(SAVE_EVENT_ARITY, raw_args.len()))?;

            Event {
                date: derive_date(&time),
                display_name,
                device_id,
                location_id,
                value,
                time,
                details: Some(EventDetails {
                    device,
                    is_state_change,
                    id,
                    description,
                    description_text,
                    installed_smart_app_id,
                    is_digital,
                    is_physical,
                    location,
                    source,
                    unit,
                    name,
                }),
            }
        }
        EventShape::Compact => {
            let [display_name, device_id, location_id, value, time]: [String;
                EventShape::COMPACT_ARITY] = fields
                .try_into()
                .map_err(|_| LedgerError::arity(SAVE_EVENT_ARITY, raw_args.len()))?;

            Event {
                date: derive_date(&time),
                display_name,
                device_id,
                location_id,
                value,
                time,
                details: None,
            }
        }
    };

    Ok(event)
}

pub fn normalize_device_list(raw_args: &[String]) -> Result<DeviceList, LedgerError> {
    if raw_args.len() != SAVE_DEVICE_ARGS {
        return Err(LedgerError::arity(SAVE_DEVICE_ARGS, raw_args.len()));
    }

    let list = DeviceList {
        location_id: normalize_field(&raw_args[0]),
        ids: normalize_field(&raw_args[1]),
        names: normalize_field(&raw_args[2]),
    };

    if list.location_id.is_empty() {
        return Err(LedgerError::argument("locationId must not be empty"));
    }

    let id_count = list.ids().len();
    let name_count = list.names().len();
    if id_count != name_count {
        return Err(LedgerError::Argument(format!(
            "device list has {id_count} ids but {name_count} names"
        )));
    }

    Ok(list)
}
