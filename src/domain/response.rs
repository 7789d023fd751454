use serde_json::Value;

use crate::domain::keys::display_key;
use crate::domain::timestamp::TxTimestamp;

/// One element of an assembled result array. Records are embedded verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultItem<'a> {
    /// Primary-key range scan entry, labelled `DeviceId`.
    State { key: &'a str, record: &'a [u8] },
    /// Rich query or composite scan entry, labelled `Key`.
    Keyed { key: &'a str, record: &'a [u8] },
    History {
        tx_id: &'a str,
        timestamp: TxTimestamp,
        record: &'a [u8],
    },
}

/// Incrementally built JSON array payload.
#[derive(Debug)]
pub struct ResultArray {
    buffer: Vec<u8>,
    len: usize,
}

impl Default for ResultArray {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultArray {
    pub fn new() -> Self {
        Self {
            buffer: vec![b'['],
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn push(&mut self, item: ResultItem<'_>) {
        if self.len > 0 {
            self.buffer.push(b',');
        }

        match item {
            ResultItem::State { key, record } => {
                self.buffer.extend_from_slice(b"{\"DeviceId\":");
                self.write_key(key);
                self.write_record(record);
            }
            ResultItem::Keyed { key, record } => {
                self.buffer.extend_from_slice(b"{\"Key\":");
                self.write_key(key);
                self.write_record(record);
            }
            ResultItem::History {
                tx_id,
                timestamp,
                record,
            } => {
                self.buffer.extend_from_slice(b"{\"TxId\":");
                self.write_string(tx_id);
                self.buffer.extend_from_slice(b",\"Timestamp\":");
                self.write_string(&timestamp.to_display_string());
                self.write_record(record);
            }
        }

        self.buffer.push(b'}');
        self.len += 1;
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.buffer.push(b']');
        self.buffer
    }

    fn write_key(&mut self, key: &str) {
        self.write_string(&display_key(key));
    }

    fn write_string(&mut self, value: &str) {
        self.buffer
            .extend_from_slice(Value::from(value).to_string().as_bytes());
    }

    fn write_record(&mut self, record: &[u8]) {
        self.buffer.extend_from_slice(b",\"Record\":");
        if record.is_empty() {
            self.buffer.extend_from_slice(b"null");
        } else {
            self.buffer.extend_from_slice(record);
        }
    }
}

#[cfg(test)]
pub fn assemble<'a>(items: impl IntoIterator<Item = ResultItem<'a>>) -> Vec<u8> {
    let mut array = ResultArray::new();
    for item in items {
        array.push(item);
    }
    array.finish()
}
