//! Record creation

use crate::error::InitError;
use crate::store::RecordStore;
use crate::types::{Authority, Record, RecordKey};
use tracing::debug;

/// Creates records. Each call is independent; there is no batching here.
pub struct RecordInitializer;

impl RecordInitializer {
    /// Persist a new record at `key`. Fails if the key is taken.
    pub fn create(
        store: &mut RecordStore,
        key: RecordKey,
        initial_value: u64,
        authority: Authority,
    ) -> Result<Record, InitError> {
        let record = Record {
            key,
            value: initial_value,
            authority,
        };
        store.insert_new(record.clone())?;
        debug!(%key, initial_value, "Record initialized");
        Ok(record)
    }
}
