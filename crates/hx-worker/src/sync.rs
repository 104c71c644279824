//! Background sync
//!
//! Deferred delivery of messages composed while offline.

use crate::error::WorkerError;

/// Deliver queued messages
// TODO: drain the outbox once the chat backend exposes a message endpoint
pub async fn sync_messages() -> Result<(), WorkerError> {
    tracing::info!("[SW] Syncing messages...");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_messages_succeeds() {
        smol::block_on(sync_messages()).unwrap();
    }
}
