//! Batch resource limits

use crate::error::BatchError;

/// Reject batches above the environment's budget. Never truncates.
pub fn validate_batch_size(len: usize, max: usize) -> Result<(), BatchError> {
    if len > max {
        return Err(BatchError::BatchTooLarge { len, max });
    }
    Ok(())
}

/// Split `total` entries into batch lengths that each fit under `max`
pub fn chunk_lengths(total: usize, max: usize) -> impl Iterator<Item = usize> {
    let max = max.max(1);
    let mut remaining = total;
    std::iter::from_fn(move || {
        if remaining == 0 {
            return None;
        }
        let len = remaining.min(max);
        remaining -= len;
        Some(len)
    })
}
