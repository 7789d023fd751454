use chrono::{DateTime, Utc};

/// Commit time of a ledger transaction, as seconds and nanoseconds since the epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TxTimestamp {
    pub seconds: i64,
    pub nanos: u32,
}

pub trait Clock {
    fn now(&self) -> TxTimestamp;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> TxTimestamp {
        TxTimestamp::from_datetime(Utc::now())
    }
}

impl TxTimestamp {
    pub fn new(seconds: i64, nanos: u32) -> Self {
        Self { seconds, nanos }
    }

    pub fn from_datetime(datetime: DateTime<Utc>) -> Self {
        Self {
            seconds: datetime.timestamp(),
            nanos: datetime.timestamp_subsec_nanos(),
        }
    }

    /// Renders as `2018-05-01 10:00:00.5 +0000 UTC`: the fraction keeps only
    /// significant digits and is omitted on a whole second.
    pub fn to_display_string(self) -> String {
        let datetime = DateTime::<Utc>::from_timestamp(self.seconds, self.nanos)
            .unwrap_or_else(|| DateTime::<Utc>::from(std::time::UNIX_EPOCH));

        let mut rendered = datetime.format("%Y-%m-%d %H:%M:%S").to_string();
        let nanos = datetime.timestamp_subsec_nanos();
        if nanos > 0 {
            let fraction = format!("{nanos:09}");
            rendered.push('.');
            rendered.push_str(fraction.trim_end_matches('0'));
        }
        rendered.push_str(" +0000 UTC");
        rendered
    }
}
