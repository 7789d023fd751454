use crate::domain::timestamp::TxTimestamp;

/// Current value of one key in the world state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateEntry {
    pub key: String,
    pub value: Vec<u8>,
}

/// One committed modification of a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub tx_id: String,
    pub timestamp: TxTimestamp,
    pub value: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingWrite {
    pub key: String,
    pub value: Vec<u8>,
}

/// Writes buffered by one invocation, committed together or not at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteSet {
    pub tx_id: String,
    pub timestamp: TxTimestamp,
    pub writes: Vec<PendingWrite>,
}

impl WriteSet {
    pub fn new(tx_id: impl Into<String>, timestamp: TxTimestamp) -> Self {
        Self {
            tx_id: tx_id.into(),
            timestamp,
            writes: Vec::new(),
        }
    }

    /// Buffers a write. A later write to the same key replaces the earlier one.
    pub fn put(&mut self, key: &str, value: Vec<u8>) {
        match self.writes.iter_mut().find(|write| write.key == key) {
            Some(existing) => existing.value = value,
            None => self.writes.push(PendingWrite {
                key: key.to_string(),
                value,
            }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::WriteSet;
    use crate::domain::timestamp::TxTimestamp;

    #[test]
    fn later_write_to_same_key_wins() {
        let mut write_set = WriteSet::new("tx-1", TxTimestamp::new(1, 0));
        write_set.put("dev1", b"first".to_vec());
        write_set.put("dev2", b"other".to_vec());
        write_set.put("dev1", b"second".to_vec());

        assert_eq!(write_set.writes.len(), 2);
        assert_eq!(write_set.writes[0].key, "dev1");
        assert_eq!(write_set.writes[0].value, b"second".to_vec());
    }
}
