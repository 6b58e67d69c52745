//! Record id generation.

use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use services::uuid::random_uuid;

pub const ID_PREFIX: &str = "doc-";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IdStrategy {
    /// `doc-<unix nanos>`, strictly increasing within the process.
    #[default]
    Timestamp,
    /// `doc-<uuid v4>`.
    Uuid,
}

impl FromStr for IdStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "timestamp" => Ok(IdStrategy::Timestamp),
            "uuid" => Ok(IdStrategy::Uuid),
            other => Err(format!("unknown id strategy `{other}` (timestamp|uuid)")),
        }
    }
}

/// Hands out record ids.
///
/// Timestamp ids never repeat inside one process even when the clock is
/// coarse or steps backwards: each id is `max(now, last + 1)`. Two processes
/// writing to the same index can still collide.
#[derive(Debug)]
pub struct RecordIdGenerator {
    strategy: IdStrategy,
    last: AtomicU64,
}

impl RecordIdGenerator {
    pub fn new(strategy: IdStrategy) -> Self {
        Self {
            strategy,
            last: AtomicU64::new(0),
        }
    }

    pub fn strategy(&self) -> IdStrategy {
        self.strategy
    }

    pub fn next_id(&self) -> String {
        match self.strategy {
            IdStrategy::Timestamp => format!("{ID_PREFIX}{}", self.next_nanos(unix_nanos())),
            IdStrategy::Uuid => format!("{ID_PREFIX}{}", random_uuid()),
        }
    }

    fn next_nanos(&self, now: u64) -> u64 {
        let prev = self
            .last
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                Some(now.max(last.saturating_add(1)))
            })
            .unwrap_or_else(|last| last);
        now.max(prev.saturating_add(1))
    }
}

impl Default for RecordIdGenerator {
    fn default() -> Self {
        Self::new(IdStrategy::default())
    }
}

fn unix_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
