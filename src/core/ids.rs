use chrono::Utc;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("no ids left after {0}")]
pub struct IdsExhausted(pub i64);

/// Issues time-derived ids that never repeat and never go backwards, even
/// when several are requested within the same millisecond.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    last: i64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure future ids sort after `id` (used after loading persisted data).
    pub fn observe(&mut self, id: i64) {
        self.last = self.last.max(id);
    }

    pub fn next_id(&mut self) -> Result<i64, IdsExhausted> {
        self.next_at(Utc::now().timestamp_millis())
    }

    fn next_at(&mut self, now_millis: i64) -> Result<i64, IdsExhausted> {
        let id = if now_millis > self.last {
            now_millis
        } else {
            self.last.checked_add(1).ok_or(IdsExhausted(self.last))?
        };
        self.last = id;
        Ok(id)
    }
}
