use crate::app::services::LedgerStore;
use crate::domain::error::LedgerError;
use crate::domain::keys::{display_key, partial_composite_range, validate_simple_key};
use crate::domain::query::Predicate;
use crate::domain::state::{HistoryEntry, StateEntry, WriteSet};
use crate::domain::timestamp::TxTimestamp;

/// Handle of one invocation against the ledger. Reads observe committed
/// state only; writes are buffered until the dispatcher commits them.
pub struct LedgerStub<'s, S: ?Sized> {
    store: &'s S,
    write_set: WriteSet,
}

impl<'s, S> LedgerStub<'s, S>
where
    S: LedgerStore + ?Sized,
{
    pub fn new(store: &'s S, tx_id: impl Into<String>, timestamp: TxTimestamp) -> Self {
        Self {
            store,
            write_set: WriteSet::new(tx_id, timestamp),
        }
    }

    pub fn tx_id(&self) -> &str {
        &self.write_set.tx_id
    }

    pub fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError> {
        if key.is_empty() {
            return Err(LedgerError::key("key must not be empty"));
        }
        self.store.get_state(key).map_err(LedgerError::storage)
    }

    /// Like `get_state`, but an absent key is a `NotFound` error.
    pub fn require_state(&self, key: &str) -> Result<Vec<u8>, LedgerError> {
        self.get_state(key)?
            .ok_or_else(|| LedgerError::NotFound(display_key(key).into_owned()))
    }

    /// Buffers a write; nothing reaches the store before commit.
    pub fn put_state(&mut self, key: &str, value: Vec<u8>) -> Result<(), LedgerError> {
        if key.is_empty() {
            return Err(LedgerError::key("key must not be empty"));
        }
        if value.is_empty() {
            return Err(LedgerError::argument("value must not be empty"));
        }
        self.write_set.put(key, value);
        Ok(())
    }

    pub fn scan_range(
        &self,
        start: &str,
        end: &str,
        visit: &mut dyn FnMut(StateEntry),
    ) -> Result<(), LedgerError> {
        for bound in [start, end] {
            if !bound.is_empty() {
                validate_simple_key(bound)?;
            }
        }
        self.store
            .scan_range(start, end, visit)
            .map_err(LedgerError::storage)
    }

    pub fn scan_partial_composite(
        &self,
        object_type: &str,
        attributes: &[&str],
        visit: &mut dyn FnMut(StateEntry),
    ) -> Result<(), LedgerError> {
        let (start, end) = partial_composite_range(object_type, attributes)?;
        self.store
            .scan_composite_range(&start, &end, visit)
            .map_err(LedgerError::storage)
    }

    pub fn scan_history(
        &self,
        key: &str,
        visit: &mut dyn FnMut(HistoryEntry),
    ) -> Result<(), LedgerError> {
        if key.is_empty() {
            return Err(LedgerError::key("key must not be empty"));
        }
        self.store
            .scan_history(key, visit)
            .map_err(LedgerError::storage)
    }

    pub fn query(
        &self,
        predicate: &Predicate,
        visit: &mut dyn FnMut(StateEntry),
    ) -> Result<(), LedgerError> {
        tracing::debug!(query = %predicate, "evaluating rich query");
        self.store
            .query(predicate, visit)
            .map_err(LedgerError::query)
    }

    pub fn pending_writes(&self) -> usize {
        self.write_set.writes.len()
    }

    pub fn into_write_set(self) -> WriteSet {
        self.write_set
    }
}

#[cfg(test)]
mod tests {
    use super::LedgerStub;
    use crate::app::services::LedgerStore;
    use crate::domain::error::LedgerError;
    use crate::domain::timestamp::TxTimestamp;
    use crate::test_support::open_test_store;

    #[test]
    fn reads_do_not_observe_buffered_writes() {
        let store = open_test_store("stub-buffered");
        let mut stub = LedgerStub::new(&store, "tx-1", TxTimestamp::new(1, 0));

        stub.put_state("dev1", b"{}".to_vec())
            .expect("put should buffer");

        assert_eq!(stub.get_state("dev1").expect("read should succeed"), None);
        assert_eq!(stub.pending_writes(), 1);
    }

    #[test]
    fn committed_write_set_becomes_visible() {
        let store = open_test_store("stub-commit");
        let mut stub = LedgerStub::new(&store, "tx-1", TxTimestamp::new(1, 0));
        stub.put_state("dev1", b"{\"value\":\"on\"}".to_vec())
            .expect("put should buffer");

        store
            .commit(&stub.into_write_set())
            .expect("commit should succeed");

        let reader = LedgerStub::new(&store, "tx-2", TxTimestamp::new(2, 0));
        assert_eq!(
            reader.require_state("dev1").expect("state should exist"),
            b"{\"value\":\"on\"}".to_vec()
        );
    }

    #[test]
    fn missing_key_is_not_found() {
        let store = open_test_store("stub-not-found");
        let stub = LedgerStub::new(&store, "tx-1", TxTimestamp::new(1, 0));

        assert_eq!(
            stub.require_state("\u{0}combined\u{0}dev1\u{0}t1\u{0}"),
            Err(LedgerError::NotFound("||combined||dev1||t1||".to_string()))
        );
    }

    #[test]
    fn rejects_empty_key() {
        let store = open_test_store("stub-empty-key");
        let mut stub = LedgerStub::new(&store, "tx-1", TxTimestamp::new(1, 0));

        assert!(matches!(
            stub.put_state("", b"{}".to_vec()),
            Err(LedgerError::Key(_))
        ));
        assert!(matches!(stub.get_state(""), Err(LedgerError::Key(_))));
    }

    #[test]
    fn rejects_composite_range_bounds() {
        let store = open_test_store("stub-range-bounds");
        let stub = LedgerStub::new(&store, "tx-1", TxTimestamp::new(1, 0));

        let result = stub.scan_range("\u{0}combined", "", &mut |_| {});
        assert!(matches!(result, Err(LedgerError::Key(_))));
    }
}
