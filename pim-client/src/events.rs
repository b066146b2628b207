//! Grid events
//!
//! The render layer subscribes to a broadcast channel instead of polling.
//! Publishing never blocks and never fails: with no subscriber the event
//! is dropped, and a lagging subscriber loses the oldest events.

use crate::config::UiCopy;
use crate::edit::EditTarget;
use shared::ProductId;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// User-visible toast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn fetch_failed(copy: &UiCopy) -> Self {
        Self::error(copy.fetch_failed.clone())
    }

    pub fn mutation_failed(copy: &UiCopy, field_label: &str) -> Self {
        Self::error(copy.mutation_failed.replace("{field}", field_label))
    }

    pub fn validation_failed(copy: &UiCopy, field_label: &str) -> Self {
        Self::error(copy.validation_failed.replace("{field}", field_label))
    }

    pub fn download_ready(copy: &UiCopy, file_name: &str) -> Self {
        Self::info(copy.download_ready.replace("{file}", file_name))
    }

    pub fn download_failed(copy: &UiCopy, attempts: u32) -> Self {
        Self::error(copy.download_failed.replace("{attempts}", &attempts.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GridEvent {
    /// First page of a new query landed
    RowsReplaced { rows: usize, total: Option<u64> },
    /// A further page was appended
    RowsAppended { added: usize, total: Option<u64> },
    /// List read failed; rows on screen are unchanged
    ///
    /// `transient` is set when the same query is likely to succeed later.
    FetchFailed { transient: bool, notice: Notice },
    EditBegan { target: EditTarget },
    /// Open edit dropped without a mutation
    EditDiscarded { target: EditTarget },
    /// Optimistic value applied, request in flight
    EditCommitted { row_id: ProductId, field: String },
    /// Commit refused before leaving the client
    ValidationFailed { field: String, message: String, notice: Notice },
    /// Server rejected the change; row has been re-synced
    MutationFailed {
        row_id: ProductId,
        field: String,
        notice: Notice,
    },
    /// Row replaced by the server's canonical copy
    RowReconciled { row_id: ProductId },
    ReferenceDataLoaded,
    DownloadCompleted {
        row_id: ProductId,
        file_name: String,
        attempts: u32,
        notice: Notice,
    },
    DownloadFailed {
        row_id: ProductId,
        attempts: u32,
        notice: Notice,
    },
}

/// Broadcast sender shared by all grid components
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<GridEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn publish(&self, event: GridEvent) {
        // Err only means nobody is listening
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GridEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_templates() {
        let copy = UiCopy::default();
        assert_eq!(
            Notice::mutation_failed(&copy, "Price").message,
            "Failed to update Price. The previous value was restored."
        );
        assert_eq!(
            Notice::download_failed(&copy, 3).message,
            "Download failed after 3 attempts."
        );
        assert_eq!(Notice::download_ready(&copy, "a.zip").level, NoticeLevel::Info);
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_harmless() {
        let bus = EventBus::new();
        bus.publish(GridEvent::ReferenceDataLoaded);

        let mut rx = bus.subscribe();
        bus.publish(GridEvent::RowsReplaced { rows: 2, total: Some(2) });
        assert_eq!(
            rx.recv().await.unwrap(),
            GridEvent::RowsReplaced { rows: 2, total: Some(2) }
        );
    }
}
