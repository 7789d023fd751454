use crate::app::services::LedgerStore;
use crate::app::transaction::LedgerStub;
use crate::domain::codec::{encode_device_list, encode_event, encode_latest_state};
use crate::domain::error::LedgerError;
use crate::domain::keys::{
    EVENT_KEY_SPACE, HistoryKeyMode, create_composite_key, device_list_key, history_key,
    is_composite_key, parse_display_key, primary_key,
};
use crate::domain::normalize::{normalize_device_list, normalize_event, normalize_field};
use crate::domain::query::Predicate;
use crate::domain::response::{ResultArray, ResultItem};

#[derive(Debug, Clone, Copy, Default)]
pub struct EventLedgerService {
    history_key_mode: HistoryKeyMode,
}

impl EventLedgerService {
    pub fn new(history_key_mode: HistoryKeyMode) -> Self {
        Self { history_key_mode }
    }

    /// Stores the latest state under the device id and the full event under
    /// its history key. Returns the acknowledgment value.
    pub fn save_event<S: LedgerStore + ?Sized>(
        &self,
        stub: &mut LedgerStub<'_, S>,
        raw_args: &[String],
    ) -> Result<String, LedgerError> {
        let event = normalize_event(raw_args)?;

        let latest_key = primary_key(&event)?;
        let event_key = history_key(&event, self.history_key_mode)?;

        stub.put_state(latest_key, encode_latest_state(&event.latest_state())?)?;
        stub.put_state(&event_key, encode_event(&event)?)?;

        tracing::debug!(
            tx_id = stub.tx_id(),
            device_id = %event.device_id,
            shape = ?event.shape(),
            "event buffered"
        );

        Ok(event.acknowledgment().to_string())
    }

    pub fn get_latest<S: LedgerStore + ?Sized>(
        &self,
        stub: &LedgerStub<'_, S>,
        device_id: &str,
    ) -> Result<Vec<u8>, LedgerError> {
        stub.require_state(&normalize_field(device_id))
    }

    /// Point read of any key. Composite keys may be given in printed form;
    /// simple keys are device ids.
    pub fn get_event<S: LedgerStore + ?Sized>(
        &self,
        stub: &LedgerStub<'_, S>,
        key: &str,
    ) -> Result<Vec<u8>, LedgerError> {
        let key = parse_display_key(key);
        if is_composite_key(&key) {
            stub.require_state(&key)
        } else {
            self.get_latest(stub, &key)
        }
    }

    pub fn get_all_latest<S: LedgerStore + ?Sized>(
        &self,
        stub: &LedgerStub<'_, S>,
    ) -> Result<Vec<u8>, LedgerError> {
        let mut results = ResultArray::new();
        stub.scan_range("", "", &mut |entry| {
            results.push(ResultItem::State {
                key: &entry.key,
                record: &entry.value,
            })
        })?;
        Ok(results.finish())
    }

    pub fn get_history<S: LedgerStore + ?Sized>(
        &self,
        stub: &LedgerStub<'_, S>,
        key: &str,
    ) -> Result<Vec<u8>, LedgerError> {
        let mut results = ResultArray::new();
        stub.scan_history(key, &mut |entry| {
            results.push(ResultItem::History {
                tx_id: &entry.tx_id,
                timestamp: entry.timestamp,
                record: &entry.value,
            })
        })?;
        Ok(results.finish())
    }

    pub fn get_history_for_device<S: LedgerStore + ?Sized>(
        &self,
        stub: &LedgerStub<'_, S>,
        device_id: &str,
    ) -> Result<Vec<u8>, LedgerError> {
        self.get_history(stub, &normalize_field(device_id))
    }

    /// History of one event key. `discriminator` is the event time or date,
    /// whichever the configured history key mode addresses events by.
    pub fn get_history_by_date<S: LedgerStore + ?Sized>(
        &self,
        stub: &LedgerStub<'_, S>,
        device_id: &str,
        discriminator: &str,
    ) -> Result<Vec<u8>, LedgerError> {
        let device_id = normalize_field(device_id);
        let discriminator = normalize_field(discriminator);
        let key = create_composite_key(EVENT_KEY_SPACE, &[&device_id, &discriminator])?;
        self.get_history(stub, &key)
    }

    pub fn get_events_for_device<S: LedgerStore + ?Sized>(
        &self,
        stub: &LedgerStub<'_, S>,
        device_id: &str,
    ) -> Result<Vec<u8>, LedgerError> {
        let device_id = normalize_field(device_id);
        let mut results = ResultArray::new();
        stub.scan_partial_composite(EVENT_KEY_SPACE, &[&device_id], &mut |entry| {
            results.push(ResultItem::Keyed {
                key: &entry.key,
                record: &entry.value,
            })
        })?;
        Ok(results.finish())
    }

    pub fn query<S: LedgerStore + ?Sized>(
        &self,
        stub: &LedgerStub<'_, S>,
        predicate: &Predicate,
    ) -> Result<Vec<u8>, LedgerError> {
        let mut results = ResultArray::new();
        stub.query(predicate, &mut |entry| {
            results.push(ResultItem::Keyed {
                key: &entry.key,
                record: &entry.value,
            })
        })?;
        tracing::debug!(matches = results.len(), "rich query complete");
        Ok(results.finish())
    }

    /// Replaces the device list of a location. Returns the location id.
    pub fn save_device_list<S: LedgerStore + ?Sized>(
        &self,
        stub: &mut LedgerStub<'_, S>,
        raw_args: &[String],
    ) -> Result<String, LedgerError> {
        let list = normalize_device_list(raw_args)?;
        let key = device_list_key(&list.location_id)?;
        stub.put_state(&key, encode_device_list(&list)?)?;
        Ok(list.location_id)
    }

    pub fn get_device_list<S: LedgerStore + ?Sized>(
        &self,
        stub: &LedgerStub<'_, S>,
        location_id: &str,
    ) -> Result<Vec<u8>, LedgerError> {
        let key = device_list_key(&normalize_field(location_id))?;
        stub.require_state(&key)
    }
}
