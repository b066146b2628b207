//! Optimistic mutation coordinator
//!
//! A commit runs in two phases. Phase one swaps the edited row into the
//! store before any I/O. Phase two sends the PATCH; if it fails, the
//! field is re-synced from the server (a compensating read, not an undo).
//! When even that read fails, the field is put back to its pre-edit value.
//!
//! Server rows only ever feed the edited field and the version marker
//! back into the store. Other cells of the same row may have their own
//! edits in flight and each settles independently.
//!
//! Field edits are never retried. Bulk downloads are idempotent and are
//! retried on any failure, up to the configured attempt budget with a
//! fixed delay.

use crate::api::{BulkDownloadRequest, CatalogApi, Download};
use crate::config::ClientConfig;
use crate::error::{ClientError, GridError, GridResult};
use crate::events::{EventBus, GridEvent, Notice};
use crate::fetcher::CollectionFetcher;
use crate::rows::RowStore;
use serde_json::Value;
use shared::models::fields;
use shared::{Product, ProductId, ProductPatch};
use std::sync::Arc;

/// How a successful commit ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Pending value equalled the original; nothing was sent
    Unchanged,
    /// Server accepted; the optimistic row stands
    Applied,
    /// Server accepted and returned its canonical row; the field was
    /// reconciled against it
    Reconciled,
}

pub struct MutationCoordinator {
    api: Arc<dyn CatalogApi>,
    rows: RowStore,
    fetcher: Arc<CollectionFetcher>,
    events: EventBus,
    config: Arc<ClientConfig>,
}

impl MutationCoordinator {
    pub fn new(
        api: Arc<dyn CatalogApi>,
        rows: RowStore,
        fetcher: Arc<CollectionFetcher>,
        events: EventBus,
        config: Arc<ClientConfig>,
    ) -> Self {
        Self {
            api,
            rows,
            fetcher,
            events,
            config,
        }
    }

    /// Apply `value` at `field_id` locally, then on the server
    ///
    /// `field_label` names the field in the failure notice.
    pub async fn commit_edit(
        &self,
        row_id: &ProductId,
        field_id: &str,
        field_label: &str,
        value: Value,
    ) -> GridResult<CommitOutcome> {
        // Phase 1: local, before any await
        let mut applied = Ok(());
        let before = self
            .rows
            .update_row(row_id, |current| {
                let mut next = current.clone();
                applied = next.set_value(field_id, value.clone());
                if applied.is_ok() {
                    next
                } else {
                    current.clone()
                }
            })
            .ok_or_else(|| GridError::RowNotFound(row_id.to_string()))?;
        applied.map_err(|e| GridError::validation(field_id, e.to_string()))?;
        self.events.publish(GridEvent::EditCommitted {
            row_id: row_id.clone(),
            field: field_id.to_string(),
        });
        tracing::info!(product_id = %row_id, field = field_id, "Committing edit");

        // Phase 2: remote
        let patch = ProductPatch::single(field_id, value);
        let result = self.api.patch_product(row_id, &patch).await;
        self.fetcher.invalidate();

        match result {
            Ok(Some(canonical)) if canonical.id == *row_id => {
                self.merge_field(row_id, field_id, &canonical);
                self.events.publish(GridEvent::RowReconciled {
                    row_id: row_id.clone(),
                });
                Ok(CommitOutcome::Reconciled)
            }
            Ok(_) => Ok(CommitOutcome::Applied),
            Err(source) => {
                tracing::warn!(
                    product_id = %row_id,
                    field = field_id,
                    error = %source,
                    "Edit rejected, re-syncing row"
                );
                self.compensate(row_id, field_id, &before.value(field_id))
                    .await;
                self.events.publish(GridEvent::MutationFailed {
                    row_id: row_id.clone(),
                    field: field_id.to_string(),
                    notice: Notice::mutation_failed(&self.config.copy, field_label),
                });
                Err(GridError::Mutation {
                    row_id: row_id.clone(),
                    field: field_id.to_string(),
                    source,
                })
            }
        }
    }

    /// Activate or deactivate a product
    pub async fn set_active(&self, row_id: &ProductId, active: bool) -> GridResult<CommitOutcome> {
        self.commit_edit(row_id, fields::IS_ACTIVE, "Status", Value::Bool(active))
            .await
    }

    /// Re-read the row; fall back to restoring the single field
    async fn compensate(&self, row_id: &ProductId, field_id: &str, previous: &Value) {
        match self.api.get_product(row_id).await {
            Ok(truth) => {
                self.merge_field(row_id, field_id, &truth);
                self.events.publish(GridEvent::RowReconciled {
                    row_id: row_id.clone(),
                });
            }
            Err(e) => {
                tracing::warn!(
                    product_id = %row_id,
                    field = field_id,
                    error = %e,
                    "Re-sync failed, restoring pre-edit value"
                );
                self.rows.update_row(row_id, |current| {
                    current
                        .with_value(field_id, previous.clone())
                        .unwrap_or_else(|_| current.clone())
                });
            }
        }
    }

    /// Copy `field_id` and the version marker from `source` into the live row
    fn merge_field(&self, row_id: &ProductId, field_id: &str, source: &Product) {
        let value = source.value(field_id);
        self.rows.update_row(row_id, |current| {
            let mut merged = current.clone();
            if let Err(e) = merged.set_value(field_id, value) {
                tracing::warn!(
                    product_id = %row_id,
                    field = field_id,
                    error = %e,
                    "Server value not applicable"
                );
            }
            if source.updated_at.is_some() {
                merged.updated_at = source.updated_at.clone();
            }
            merged
        });
    }

    /// Download a product's assets, retrying up to the attempt budget
    pub async fn bulk_download(
        &self,
        row_id: &ProductId,
        request: &BulkDownloadRequest,
    ) -> GridResult<Download> {
        let max_attempts = self.config.download_attempts.max(1);
        let mut attempt = 0;

        let last_error: ClientError = loop {
            attempt += 1;
            match self.api.bulk_download(row_id, request).await {
                Ok(download) => {
                    tracing::info!(
                        product_id = %row_id,
                        file = %download.file_name,
                        bytes = download.len(),
                        attempt,
                        "Bulk download completed"
                    );
                    self.events.publish(GridEvent::DownloadCompleted {
                        row_id: row_id.clone(),
                        file_name: download.file_name.clone(),
                        attempts: attempt,
                        notice: Notice::download_ready(&self.config.copy, &download.file_name),
                    });
                    return Ok(download);
                }
                Err(e) if attempt < max_attempts => {
                    tracing::warn!(
                        product_id = %row_id,
                        attempt,
                        max_attempts,
                        error = %e,
                        "Bulk download failed, retrying"
                    );
                    tokio::time::sleep(self.config.retry_delay).await;
                }
                Err(e) => break e,
            }
        };

        tracing::error!(
            product_id = %row_id,
            attempts = attempt,
            error = %last_error,
            "Bulk download failed"
        );
        self.events.publish(GridEvent::DownloadFailed {
            row_id: row_id.clone(),
            attempts: attempt,
            notice: Notice::download_failed(&self.config.copy, attempt),
        });
        Err(GridError::Download {
            attempts: attempt,
            source: last_error,
        })
    }
}
