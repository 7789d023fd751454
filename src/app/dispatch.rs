use thiserror::Error;
use uuid::Uuid;

use crate::app::ledger::EventLedgerService;
use crate::app::services::LedgerStore;
use crate::app::transaction::LedgerStub;
use crate::domain::error::LedgerError;
use crate::domain::query::{build_device_date_query, build_device_query, build_location_query};
use crate::domain::timestamp::Clock;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvokeError {
    #[error("Invalid function name for 'invoke'")]
    UnknownFunction(String),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    SaveNewEvent,
    QueryByDate,
    QueryLocation,
    QueryDevice,
    GetAllLatest,
    GetHistoryForDevice,
    GetHistoryByDate,
    GetEvent,
    GetEventsForDevice,
    SaveDevice,
    GetDeviceList,
}

const OPERATIONS: &[(&str, Operation)] = &[
    ("saveNewEvent", Operation::SaveNewEvent),
    ("queryByDate", Operation::QueryByDate),
    ("queryLocation", Operation::QueryLocation),
    ("queryDevice", Operation::QueryDevice),
    ("getDeviceLastEvent", Operation::GetAllLatest),
    ("getAllLatest", Operation::GetAllLatest),
    ("getHistoryForDevice", Operation::GetHistoryForDevice),
    ("getHistoryByDate", Operation::GetHistoryByDate),
    ("getEvent", Operation::GetEvent),
    ("getEventsForDevice", Operation::GetEventsForDevice),
    ("saveDevice", Operation::SaveDevice),
    ("getDeviceList", Operation::GetDeviceList),
];

impl Operation {
    pub fn from_name(name: &str) -> Option<Self> {
        OPERATIONS
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, operation)| *operation)
    }

    pub fn names() -> impl Iterator<Item = &'static str> {
        OPERATIONS.iter().map(|(name, _)| *name)
    }

    pub fn is_write(self) -> bool {
        matches!(self, Self::SaveNewEvent | Self::SaveDevice)
    }

    fn run<S: LedgerStore + ?Sized>(
        self,
        service: &EventLedgerService,
        stub: &mut LedgerStub<'_, S>,
        args: &[String],
    ) -> Result<Vec<u8>, LedgerError> {
        match self {
            Self::SaveNewEvent => service.save_event(stub, args).map(String::into_bytes),
            Self::SaveDevice => service.save_device_list(stub, args).map(String::into_bytes),
            Self::QueryByDate => {
                let [location_id, device_id, date] =
                    positional(args, ["locationId", "deviceId", "date"])?;
                let predicate = build_device_date_query(location_id, device_id, date)?;
                service.query(stub, &predicate)
            }
            Self::QueryLocation => {
                let [location_id] = positional(args, ["locationId"])?;
                service.query(stub, &build_location_query(location_id)?)
            }
            Self::QueryDevice => {
                let [location_id, device_id] = positional(args, ["locationId", "deviceId"])?;
                service.query(stub, &build_device_query(location_id, device_id)?)
            }
            Self::GetAllLatest => {
                let [] = positional(args, [])?;
                service.get_all_latest(stub)
            }
            Self::GetHistoryForDevice => {
                let [device_id] = positional(args, ["deviceId"])?;
                service.get_history_for_device(stub, device_id)
            }
            Self::GetHistoryByDate => {
                let [device_id, date] = positional(args, ["deviceId", "date"])?;
                service.get_history_by_date(stub, device_id, date)
            }
            Self::GetEvent => {
                let [key] = positional(args, ["key"])?;
                service.get_event(stub, key)
            }
            Self::GetEventsForDevice => {
                let [device_id] = positional(args, ["deviceId"])?;
                service.get_events_for_device(stub, device_id)
            }
            Self::GetDeviceList => {
                let [location_id] = positional(args, ["locationId"])?;
                service.get_device_list(stub, location_id)
            }
        }
    }
}

/// Outcome of one invocation, flattened for transports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokeResponse {
    pub success: bool,
    pub payload: Vec<u8>,
    pub message: String,
}

impl InvokeResponse {
    pub fn success(payload: Vec<u8>) -> Self {
        Self {
            success: true,
            payload,
            message: String::new(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            payload: Vec::new(),
            message: message.into(),
        }
    }
}

impl From<Result<Vec<u8>, InvokeError>> for InvokeResponse {
    fn from(result: Result<Vec<u8>, InvokeError>) -> Self {
        match result {
            Ok(payload) => Self::success(payload),
            Err(error) => Self::failure(error.to_string()),
        }
    }
}

pub struct Dispatcher<S, C> {
    store: S,
    clock: C,
    service: EventLedgerService,
}

impl<S, C> Dispatcher<S, C>
where
    S: LedgerStore,
    C: Clock,
{
    pub fn new(store: S, clock: C, service: EventLedgerService) -> Self {
        Self {
            store,
            clock,
            service,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs one operation in its own transaction. Buffered writes are
    /// committed only when the operation succeeds.
    pub fn invoke(&self, function: &str, args: &[String]) -> Result<Vec<u8>, InvokeError> {
        let Some(operation) = Operation::from_name(function) else {
            tracing::warn!(function, "rejected unknown function");
            return Err(InvokeError::UnknownFunction(function.to_string()));
        };

        let tx_id = Uuid::new_v4().to_string();
        let mut stub = LedgerStub::new(&self.store, tx_id.as_str(), self.clock.now());

        let payload = match operation.run(&self.service, &mut stub, args) {
            Ok(payload) => payload,
            Err(error) if error.is_not_found() => {
                tracing::debug!(function, tx_id = %tx_id, error = %error, "key not found");
                return Err(error.into());
            }
            Err(error) => {
                tracing::warn!(
                    function,
                    tx_id = %tx_id,
                    error = %error,
                    "invocation failed, discarding buffered writes"
                );
                return Err(error.into());
            }
        };

        let write_set = stub.into_write_set();
        let writes = write_set.writes.len();
        if !write_set.is_empty() {
            self.store.commit(&write_set).map_err(|error| {
                tracing::warn!(function, tx_id = %tx_id, error = %error, "commit failed");
                LedgerError::storage(error)
            })?;
        }

        if operation.is_write() {
            tracing::info!(function, tx_id = %tx_id, writes, "invocation committed");
        } else {
            tracing::debug!(function, tx_id = %tx_id, bytes = payload.len(), "invocation served");
        }

        Ok(payload)
    }
}

/// Extracts exactly `N` non-blank positional arguments.
fn positional<'a, const N: usize>(
    args: &'a [String],
    names: [&'static str; N],
) -> Result<[&'a str; N], LedgerError> {
    if args.len() > N {
        return Err(LedgerError::arity(N, args.len()));
    }

    let mut values = [""; N];
    for (index, name) in names.iter().enumerate() {
        let value = args
            .get(index)
            .ok_or_else(|| LedgerError::Argument(format!("missing argument {name}")))?;
        if value.trim().is_empty() {
            return Err(LedgerError::Argument(format!("{name} must not be empty")));
        }
        values[index] = value.as_str();
    }
    Ok(values)
}
