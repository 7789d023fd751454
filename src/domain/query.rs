use std::fmt;

use serde_json::{Map, Value, json};

use crate::domain::error::LedgerError;
use crate::domain::models::DocType;
use crate::domain::normalize::normalize_field;

pub const DOC_TYPE_FIELD: &str = "docType";

/// Equality selector plus projection, evaluated by the ledger store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub doc_type: DocType,
    pub equality_filters: Vec<(&'static str, String)>,
    pub projection: Vec<&'static str>,
}

impl Predicate {
    pub fn selector(&self) -> Vec<(&'static str, &str)> {
        std::iter::once((DOC_TYPE_FIELD, self.doc_type.as_str()))
            .chain(
                self.equality_filters
                    .iter()
                    .map(|(field, value)| (*field, value.as_str())),
            )
            .collect()
    }

    /// Keeps only the projected fields of a matching record. An empty
    /// projection returns the record unchanged.
    pub fn project(&self, record: Value) -> Value {
        if self.projection.is_empty() {
            return record;
        }

        match record {
            Value::Object(mut object) => {
                let projected: Map<String, Value> = self
                    .projection
                    .iter()
                    .filter_map(|field| object.remove(*field).map(|value| (field.to_string(), value)))
                    .collect();
                Value::Object(projected)
            }
            other => other,
        }
    }

    pub fn to_query_string(&self) -> String {
        let selector: Map<String, Value> = self
            .selector()
            .into_iter()
            .map(|(field, value)| (field.to_string(), Value::String(value.to_string())))
            .collect();

        let query = if self.projection.is_empty() {
            json!({ "selector": selector })
        } else {
            json!({ "selector": selector, "fields": self.projection })
        };
        query.to_string()
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

/// Latest state of every device at a location.
pub fn build_location_query(location_id: &str) -> Result<Predicate, LedgerError> {
    Ok(Predicate {
        doc_type: DocType::EventLess,
        equality_filters: vec![("locationId", required("locationId", location_id)?)],
        projection: vec!["displayName", "value", "time"],
    })
}

/// Events of one device at a location on one `YYYYMMDD` date.
pub fn build_device_date_query(
    location_id: &str,
    device_id: &str,
    date: &str,
) -> Result<Predicate, LedgerError> {
    Ok(Predicate {
        doc_type: DocType::Event,
        equality_filters: vec![
            ("locationId", required("locationId", location_id)?),
            ("deviceId", required("deviceId", device_id)?),
            ("date", required("date", date)?),
        ],
        projection: vec!["value", "time"],
    })
}

pub fn build_device_query(location_id: &str, device_id: &str) -> Result<Predicate, LedgerError> {
    Ok(Predicate {
        doc_type: DocType::Event,
        equality_filters: vec![
            ("locationId", required("locationId", location_id)?),
            ("deviceId", required("deviceId", device_id)?),
        ],
        projection: Vec::new(),
    })
}

fn required(field: &str, raw: &str) -> Result<String, LedgerError> {
    let value = normalize_field(raw);
    if value.is_empty() {
        return Err(LedgerError::Argument(format!("{field} must not be empty")));
    }
    Ok(value)
}
