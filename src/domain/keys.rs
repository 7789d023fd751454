use std::borrow::Cow;

use crate::domain::error::LedgerError;
use crate::domain::models::Event;

/// Leading marker and attribute terminator of every composite key.
pub const COMPOSITE_KEY_NAMESPACE: char = '\u{0}';
pub const MAX_UNICODE_RUNE: char = '\u{10FFFF}';

pub const EVENT_KEY_SPACE: &str = "combined";
pub const DEVICE_LIST_KEY_SPACE: &str = "devicelist";

const DISPLAY_MARK: char = '|';
const DISPLAY_SEPARATOR: &str = "||";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryKeyMode {
    #[default]
    Time,
    Date,
}

impl std::str::FromStr for HistoryKeyMode {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "time" => Ok(Self::Time),
            "date" => Ok(Self::Date),
            other => Err(format!("unknown history key mode: {other}")),
        }
    }
}

pub fn primary_key(event: &Event) -> Result<&str, LedgerError> {
    validate_simple_key(&event.device_id)?;
    Ok(&event.device_id)
}

pub fn history_key(event: &Event, mode: HistoryKeyMode) -> Result<String, LedgerError> {
    let discriminator = match mode {
        HistoryKeyMode::Time => event.time.as_str(),
        HistoryKeyMode::Date => event.date.as_str(),
    };
    create_composite_key(EVENT_KEY_SPACE, &[&event.device_id, discriminator])
}

pub fn device_list_key(location_id: &str) -> Result<String, LedgerError> {
    create_composite_key(DEVICE_LIST_KEY_SPACE, &[location_id])
}

pub fn create_composite_key(object_type: &str, attributes: &[&str]) -> Result<String, LedgerError> {
    validate_component("object type", object_type)?;

    let mut key = String::with_capacity(
        2 + object_type.len() + attributes.iter().map(|a| a.len() + 1).sum::<usize>(),
    );
    key.push(COMPOSITE_KEY_NAMESPACE);
    key.push_str(object_type);
    key.push(COMPOSITE_KEY_NAMESPACE);

    for attribute in attributes {
        validate_component("attribute", attribute)?;
        key.push_str(attribute);
        key.push(COMPOSITE_KEY_NAMESPACE);
    }

    Ok(key)
}

/// Half-open key range `[start, end)` covering every composite key of
/// `object_type` whose attributes begin with `attributes`.
pub fn partial_composite_range(
    object_type: &str,
    attributes: &[&str],
) -> Result<(String, String), LedgerError> {
    let start = create_composite_key(object_type, attributes)?;
    let mut end = start.clone();
    end.push(MAX_UNICODE_RUNE);
    Ok((start, end))
}

pub fn validate_simple_key(key: &str) -> Result<(), LedgerError> {
    if key.is_empty() {
        return Err(LedgerError::key("key must not be empty"));
    }
    if key.starts_with(COMPOSITE_KEY_NAMESPACE) {
        return Err(LedgerError::key(
            "simple keys must not start with the composite key namespace",
        ));
    }
    Ok(())
}

pub fn is_composite_key(key: &str) -> bool {
    key.starts_with(COMPOSITE_KEY_NAMESPACE)
}

pub fn display_key(key: &str) -> Cow<'_, str> {
    if key.contains(COMPOSITE_KEY_NAMESPACE) {
        Cow::Owned(key.replace(COMPOSITE_KEY_NAMESPACE, DISPLAY_SEPARATOR))
    } else {
        Cow::Borrowed(key)
    }
}

/// Inverse of `display_key`; anything not `||`-delimited is returned as is.
pub fn parse_display_key(key: &str) -> Cow<'_, str> {
    if key.len() > 2 * DISPLAY_SEPARATOR.len()
        && key.starts_with(DISPLAY_SEPARATOR)
        && key.ends_with(DISPLAY_SEPARATOR)
    {
        Cow::Owned(key.replace(DISPLAY_SEPARATOR, &COMPOSITE_KEY_NAMESPACE.to_string()))
    } else {
        Cow::Borrowed(key)
    }
}

fn validate_component(label: &str, component: &str) -> Result<(), LedgerError> {
    if component.is_empty() {
        return Err(LedgerError::Key(format!(
            "composite key {label} must not be empty"
        )));
    }
    if component.contains([COMPOSITE_KEY_NAMESPACE, MAX_UNICODE_RUNE, DISPLAY_MARK]) {
        return Err(LedgerError::Key(format!(
            "composite key {label} contains a reserved character"
        )));
    }
    Ok(())
}
