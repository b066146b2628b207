//! Product grid controller
//!
//! [`ProductGrid`] owns everything the table view renders from: the loaded
//! rows, the filter and sort, the pagination position and the single open
//! cell edit. Every method takes `&self` so the grid can sit behind an
//! `Arc` and be driven from several tasks; no lock is held across an
//! `.await`.
//!
//! Reads go through the cached [`CollectionFetcher`]; writes through the
//! optimistic [`MutationCoordinator`]. State changes are announced on the
//! [`EventBus`].

use crate::api::{BulkDownloadRequest, CatalogApi, Download, NetworkCatalogApi};
use crate::config::ClientConfig;
use crate::edit::{
    ActiveEdit, CellEditor, Displaced, EditKey, EditState, EditTarget, EditorKind, KeyAction,
    PendingValue,
};
use crate::error::{ClientResult, GridError, GridResult};
use crate::events::{EventBus, GridEvent, Notice};
use crate::fetcher::{CollectionFetcher, FetchOutcome};
use crate::mutation::{CommitOutcome, MutationCoordinator};
use crate::options::{DerivedOptions, OptionIndex};
use crate::pagination::PaginationState;
use crate::reference::{ReferenceData, ReferenceResolver};
use crate::registry::{DisplayValue, FieldDescriptor, FieldRegistry};
use crate::rows::RowStore;
use crate::validation::validate;
use parking_lot::{Mutex, RwLock};
use shared::{FilterState, PageRequest, Product, ProductId, QueryParams, RefKind, SortSpec};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Result of a list load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// Rows were applied
    Loaded { rows: usize, cached: bool },
    /// A newer load was started; this response was dropped
    Superseded,
    /// No continuation token; nothing was requested
    NoMore,
}

#[derive(Debug, Clone)]
struct ViewState {
    filter: FilterState,
    sort: Option<SortSpec>,
    pagination: PaginationState,
}

pub struct ProductGrid {
    config: Arc<ClientConfig>,
    rows: RowStore,
    fetcher: Arc<CollectionFetcher>,
    mutations: MutationCoordinator,
    references: ReferenceResolver,
    registry: RwLock<FieldRegistry>,
    editor: Mutex<CellEditor>,
    view: Mutex<ViewState>,
    options: OptionIndex,
    events: EventBus,
}

impl ProductGrid {
    pub fn new(config: ClientConfig, api: Arc<dyn CatalogApi>) -> Self {
        let config = Arc::new(config);
        let rows = RowStore::new();
        let events = EventBus::new();
        let fetcher = Arc::new(CollectionFetcher::new(
            api.clone(),
            config.cache_ttl,
            config.max_page_size,
        ));
        let mutations = MutationCoordinator::new(
            api.clone(),
            rows.clone(),
            fetcher.clone(),
            events.clone(),
            config.clone(),
        );

        Self {
            rows,
            fetcher,
            mutations,
            references: ReferenceResolver::new(api),
            registry: RwLock::new(FieldRegistry::products()),
            editor: Mutex::new(CellEditor::new(config.reselect_policy)),
            view: Mutex::new(ViewState {
                filter: FilterState::default(),
                sort: None,
                pagination: PaginationState::new(config.default_page_size),
            }),
            options: OptionIndex::new(),
            events,
            config,
        }
    }

    /// Grid backed by the HTTP API at `config.base_url`
    pub fn connect(config: ClientConfig) -> ClientResult<Self> {
        let api = NetworkCatalogApi::new(&config)?;
        Ok(Self::new(config, Arc::new(api)))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GridEvent> {
        self.events.subscribe()
    }

    // ========== Query state ==========

    pub fn filter(&self) -> FilterState {
        self.view.lock().filter.clone()
    }

    pub fn sort(&self) -> Option<SortSpec> {
        self.view.lock().sort.clone()
    }

    pub fn pagination(&self) -> PaginationState {
        self.view.lock().pagination.clone()
    }

    pub fn has_more(&self) -> bool {
        self.view.lock().pagination.has_more()
    }

    /// Total reported by the server for the current filter
    pub fn total_count(&self) -> Option<u64> {
        self.view.lock().pagination.count
    }

    /// Parameters of the first page of the current view, for deep links
    pub fn query_params(&self) -> QueryParams {
        let (filter, request) = {
            let view = self.view.lock();
            (
                view.filter.clone(),
                view.pagination.first_request(view.sort.clone()),
            )
        };
        self.fetcher.params_for(&filter, &request)
    }

    /// Replace the filter and reload from the first page
    pub async fn set_filter(&self, filter: FilterState) -> GridResult<FetchStatus> {
        {
            let mut view = self.view.lock();
            view.filter = filter;
            view.pagination.reset();
        }
        self.load_first_page().await
    }

    pub async fn clear_filters(&self) -> GridResult<FetchStatus> {
        self.set_filter(FilterState::default()).await
    }

    /// Change the server-side ordering; `None` restores the default
    pub async fn set_sort(&self, sort: Option<SortSpec>) -> GridResult<FetchStatus> {
        if let Some(spec) = &sort {
            self.registry.read().check_sort(spec)?;
        }
        {
            let mut view = self.view.lock();
            view.sort = sort;
            view.pagination.reset();
        }
        self.load_first_page().await
    }

    pub async fn set_page_size(&self, page_size: u32) -> GridResult<FetchStatus> {
        {
            let mut view = self.view.lock();
            view.pagination.page_size = page_size.clamp(1, self.config.max_page_size);
            view.pagination.reset();
        }
        self.load_first_page().await
    }

    /// Rebuild the view from deep-link parameters and load it
    ///
    /// An ordering on an unknown or unsortable column is ignored.
    pub async fn restore_view(&self, params: &QueryParams) -> GridResult<FetchStatus> {
        let filter = FilterState::from_query_params(params);
        let request = PageRequest::from_query_params(params);
        let sort = request.sort.filter(|spec| match self.registry.read().check_sort(spec) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(ordering = %spec.to_ordering(), error = %e, "Ignoring ordering from query");
                false
            }
        });
        {
            let mut view = self.view.lock();
            view.filter = filter;
            view.sort = sort;
            view.pagination.page_size = request.page_size.clamp(1, self.config.max_page_size);
            view.pagination.reset();
        }
        self.load_first_page().await
    }

    /// Drop cached pages and reload the current view
    pub async fn refresh(&self) -> GridResult<FetchStatus> {
        self.fetcher.invalidate();
        self.load_first_page().await
    }

    // ========== Loading ==========

    /// Load page one of the current view, replacing the rows
    ///
    /// On failure the rows on screen stay as they were.
    pub async fn load_first_page(&self) -> GridResult<FetchStatus> {
        let (filter, request) = {
            let view = self.view.lock();
            (
                view.filter.clone(),
                view.pagination.first_request(view.sort.clone()),
            )
        };

        let fetched = match self.fetch(&filter, &request).await? {
            FetchOutcome::Current(fetched) => fetched,
            FetchOutcome::Superseded => return Ok(FetchStatus::Superseded),
        };

        let (rows, total) = {
            let mut view = self.view.lock();
            if !self.fetcher.is_current(fetched.ticket) {
                return Ok(FetchStatus::Superseded);
            }
            view.pagination.record(&request, &fetched.page);
            self.rows.replace_all(fetched.page.results.clone());
            (fetched.page.results.len(), view.pagination.count)
        };

        self.discard_stale_edit();
        self.events.publish(GridEvent::RowsReplaced { rows, total });
        Ok(FetchStatus::Loaded {
            rows,
            cached: fetched.cached,
        })
    }

    /// Append the page after the last one loaded
    pub async fn load_next_page(&self) -> GridResult<FetchStatus> {
        let (filter, request) = {
            let view = self.view.lock();
            match view.pagination.next_request(view.sort.clone()) {
                Some(request) => (view.filter.clone(), request),
                None => return Ok(FetchStatus::NoMore),
            }
        };

        let fetched = match self.fetch(&filter, &request).await? {
            FetchOutcome::Current(fetched) => fetched,
            FetchOutcome::Superseded => return Ok(FetchStatus::Superseded),
        };

        let (added, total) = {
            let mut view = self.view.lock();
            if !self.fetcher.is_current(fetched.ticket) {
                return Ok(FetchStatus::Superseded);
            }
            view.pagination.record(&request, &fetched.page);
            let added = self.rows.append(fetched.page.results.clone());
            (added, view.pagination.count)
        };

        self.events.publish(GridEvent::RowsAppended { added, total });
        Ok(FetchStatus::Loaded {
            rows: added,
            cached: fetched.cached,
        })
    }

    async fn fetch(&self, filter: &FilterState, request: &PageRequest) -> GridResult<FetchOutcome> {
        let result = self.fetcher.fetch(filter, request).await;
        if let Err(e) = &result {
            let transient = matches!(e, GridError::Fetch(source) if source.is_transient());
            self.events.publish(GridEvent::FetchFailed {
                transient,
                notice: Notice::fetch_failed(&self.config.copy),
            });
        }
        result
    }

    /// Close the open edit if its row moved away from its index
    fn discard_stale_edit(&self) {
        let discarded = {
            let mut editor = self.editor.lock();
            let stale = editor.active().is_some_and(|edit| {
                self.rows
                    .get(edit.target.row_index)
                    .is_none_or(|row| row.id != edit.row_id)
            });
            if stale { editor.cancel() } else { None }
        };
        if let Some(edit) = discarded {
            tracing::debug!(row_id = %edit.row_id, "Open edit lost its row on reload");
            self.events.publish(GridEvent::EditDiscarded {
                target: edit.target,
            });
        }
    }

    // ========== Rows ==========

    /// Rows in server order
    pub fn rows(&self) -> Arc<Vec<Product>> {
        self.rows.snapshot()
    }

    pub fn row(&self, row_index: usize) -> Option<Product> {
        self.rows.get(row_index)
    }

    /// Loaded rows narrowed by the current filter and ordered by the sort
    ///
    /// Applies the same predicates the server does, so rows patched
    /// locally drop out of view without a reload.
    pub fn visible_rows(&self) -> Vec<Product> {
        let (filter, sort) = {
            let view = self.view.lock();
            (view.filter.clone(), view.sort.clone())
        };
        let index = self.references.index();
        let registry = self.registry.read();

        let mut rows = registry.filter_rows(&self.rows.snapshot(), &filter, &index);
        if let Some(sort) = sort
            && let Err(e) = registry.sort_rows(&mut rows, &sort, &index)
        {
            tracing::warn!(error = %e, "Local sort skipped");
        }
        rows
    }

    pub fn fields(&self) -> Vec<FieldDescriptor> {
        self.registry.read().fields().to_vec()
    }

    pub fn display_value(&self, row_index: usize, field_id: &str) -> GridResult<DisplayValue> {
        let row = self.require_row(row_index)?;
        let index = self.references.index();
        let registry = self.registry.read();
        Ok(registry.require(field_id)?.extract(&row, &index))
    }

    fn require_row(&self, row_index: usize) -> GridResult<Product> {
        self.rows
            .get(row_index)
            .ok_or_else(|| GridError::RowNotFound(format!("#{row_index}")))
    }

    // ========== Editing ==========

    pub fn edit_state(&self) -> EditState {
        self.editor.lock().state().clone()
    }

    pub fn active_edit(&self) -> Option<ActiveEdit> {
        self.editor.lock().active().cloned()
    }

    /// Open the editor on a cell
    ///
    /// Whatever edit was open is displaced first. Under the commit
    /// reselect policy its commit runs after the new edit is open, and its
    /// result is returned.
    pub async fn begin_edit(&self, row_index: usize, field_id: &str) -> GridResult<()> {
        let row = self.require_row(row_index)?;
        let (field_id, kind) = {
            let registry = self.registry.read();
            let field = registry.require(field_id)?;
            let kind = field
                .affordance
                .editor_kind()
                .ok_or_else(|| GridError::validation(field.id, "column is read-only"))?;
            (field.id, kind)
        };

        let initial = match kind {
            EditorKind::TreeSelect => PendingValue::Category(
                row.category
                    .as_ref()
                    .and_then(|raw| raw.normalize(RefKind::Category, &self.references.index()).id),
            ),
            _ => PendingValue::from_cell(kind, &row.value(field_id)),
        };
        let target = EditTarget::new(row_index, field_id);
        let edit = ActiveEdit::new(target.clone(), row.id.clone(), kind, initial);

        let displaced = self.editor.lock().begin(edit);
        let to_commit = match displaced {
            Displaced::Nothing => None,
            Displaced::Discarded(previous) => {
                self.events.publish(GridEvent::EditDiscarded {
                    target: previous.target,
                });
                None
            }
            Displaced::Commit(previous) => Some(previous),
        };

        tracing::debug!(row_id = %row.id, field = field_id, "Edit began");
        self.events.publish(GridEvent::EditBegan { target });

        if let Some(previous) = to_commit {
            self.commit_edit(previous).await?;
        }
        Ok(())
    }

    pub fn change_value(&self, value: PendingValue) -> GridResult<()> {
        self.editor.lock().change(value)
    }

    /// Close the open edit and apply its value
    ///
    /// A value that fails validation keeps the editor open.
    pub async fn commit(&self) -> GridResult<CommitOutcome> {
        let edit = self.editor.lock().take()?;
        self.commit_edit(edit).await
    }

    async fn commit_edit(&self, edit: ActiveEdit) -> GridResult<CommitOutcome> {
        if !edit.is_dirty() {
            tracing::debug!(row_id = %edit.row_id, field = %edit.target.field_id, "Edit unchanged");
            return Ok(CommitOutcome::Unchanged);
        }

        let field_id = edit.target.field_id.clone();
        let label = self.field_label(&field_id);
        let value = match validate(&field_id, &edit.pending, &edit.row_id, &self.rows.snapshot()) {
            Ok(value) => value,
            Err(e) => {
                if let GridError::Validation { field, message } = &e {
                    self.events.publish(GridEvent::ValidationFailed {
                        field: field.clone(),
                        message: message.clone(),
                        notice: Notice::validation_failed(&self.config.copy, &label),
                    });
                }
                self.editor.lock().restore(edit);
                return Err(e);
            }
        };

        self.mutations
            .commit_edit(&edit.row_id, &field_id, &label, value)
            .await
    }

    /// Close the open edit without a mutation
    pub fn cancel(&self) -> bool {
        let cancelled = self.editor.lock().cancel();
        match cancelled {
            Some(edit) => {
                self.events.publish(GridEvent::EditDiscarded {
                    target: edit.target,
                });
                true
            }
            None => false,
        }
    }

    /// Route a key press to the open editor
    pub async fn handle_key(&self, key: EditKey) -> GridResult<KeyAction> {
        let action = self.editor.lock().key_action(key);
        self.perform(action).await
    }

    /// The open editor lost focus
    pub async fn blur(&self) -> GridResult<KeyAction> {
        let action = self.editor.lock().blur_action();
        self.perform(action).await
    }

    async fn perform(&self, action: KeyAction) -> GridResult<KeyAction> {
        match action {
            KeyAction::Commit => {
                self.commit().await?;
            }
            KeyAction::Cancel => {
                self.cancel();
            }
            KeyAction::Ignore => {}
        }
        Ok(action)
    }

    fn field_label(&self, field_id: &str) -> String {
        self.registry
            .read()
            .get(field_id)
            .map(|f| f.label.clone())
            .unwrap_or_else(|| field_id.to_string())
    }

    // ========== Row actions ==========

    /// Flip a product between active and inactive
    pub async fn toggle_status(&self, row_id: &ProductId) -> GridResult<CommitOutcome> {
        let (_, row) = self
            .rows
            .find(row_id)
            .ok_or_else(|| GridError::RowNotFound(row_id.to_string()))?;
        self.mutations.set_active(row_id, !row.is_active()).await
    }

    pub async fn set_active(&self, row_id: &ProductId, active: bool) -> GridResult<CommitOutcome> {
        self.mutations.set_active(row_id, active).await
    }

    pub async fn bulk_download(
        &self,
        row_id: &ProductId,
        request: &BulkDownloadRequest,
    ) -> GridResult<Download> {
        self.mutations.bulk_download(row_id, request).await
    }

    // ========== Options ==========

    /// Load categories, tags, families, attribute groups and brands
    ///
    /// Lists that arrived are applied even if another failed; the editor
    /// pickers and reference labels update either way.
    pub async fn load_reference_data(&self) -> GridResult<()> {
        let result = self.references.load().await;

        let data = self.references.data();
        self.registry
            .write()
            .set_options(data.tag_names(), data.categories.clone());
        self.events.publish(GridEvent::ReferenceDataLoaded);

        result.map(|_| ()).map_err(GridError::Fetch)
    }

    /// Organization-wide option lists
    pub fn available_options(&self) -> Arc<ReferenceData> {
        self.references.data()
    }

    /// Filter options present in the loaded rows
    pub fn derived_options(&self) -> Arc<DerivedOptions> {
        self.options
            .get(&self.rows.snapshot(), &self.references.index())
    }
}

impl std::fmt::Debug for ProductGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProductGrid")
            .field("base_url", &self.config.base_url)
            .field("rows", &self.rows.len())
            .finish_non_exhaustive()
    }
}

