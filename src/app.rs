//! Application State
//!
//! Central application state for tplace. The UI loop owns an [`App`]; every
//! network call runs as a spawned task and reports back through an
//! [`AppEvent`] that the loop drains between frames.

use crate::api::{format_api_error, ApiClient, ApiError};
use crate::config::Config;
use crate::detail::{DetailPanel, KeyedLoads, LoadState, Ticket};
use crate::mutation::{
    apply_bulk_delete, apply_created, apply_deleted, build_comment, build_new_record, create_item,
    delete_item, delete_items, toggle_flag, BulkDeletePolicy, MutationError,
};
use crate::notification::{NotificationManager, OperationType};
use crate::pipeline::{project, Projection};
use crate::resource::{
    fetch_children, fetch_collection, fetch_thumbnail, fetch_user_name, get_resource, view_keys,
    Collection, CreateDef, Item, ItemId, ResourceDef,
};
use crate::selection::SelectionSet;
use crate::view_state::{ViewAction, ViewState};
use anyhow::Result;
use serde_json::Value;
use std::future::Future;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

/// Local-only flag toggled with `f`
pub const FAVORITE_FIELD: &str = "favorite";

const LABEL_WIDTH: usize = 32;

/// Application modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,        // Viewing list
    Command,       // : command input
    Help,          // ? help popup
    Confirm,       // Yes/no dialog for destructive actions
    Warning,       // Info dialog (OK only)
    Input,         // One-line text entry (new item, comment)
    Detail,        // Sub-resource panel for one row
    Notifications, // Notification history
}

/// Destructive action waiting for confirmation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingKind {
    Delete(ItemId),
    BulkDelete(Vec<ItemId>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAction {
    pub kind: PendingKind,
    pub message: String,
    pub selected_yes: bool,
}

/// What the text in the input box will become
#[derive(Debug, Clone)]
pub enum InputPurpose {
    NewItem {
        resource: &'static ResourceDef,
        create: &'static CreateDef,
    },
    Comment {
        parent_id: ItemId,
        ticket: Ticket,
        child: &'static ResourceDef,
        create: &'static CreateDef,
        parent_field: &'static str,
    },
}

#[derive(Debug, Clone)]
pub struct InputState {
    pub purpose: InputPurpose,
    pub prompt: String,
    pub text: String,
    /// Validation message shown under the input line
    pub error: Option<String>,
}

/// Result of a spawned request, delivered back to the UI loop
#[derive(Debug)]
pub enum AppEvent {
    CollectionLoaded {
        fetch: u64,
        result: Result<Vec<Item>, ApiError>,
    },
    Created {
        generation: u64,
        notification: Uuid,
        result: Result<Item, ApiError>,
    },
    Deleted {
        generation: u64,
        notification: Uuid,
        id: ItemId,
        result: Result<(), ApiError>,
    },
    BulkDeleted {
        generation: u64,
        notification: Uuid,
        results: Vec<(ItemId, Result<(), ApiError>)>,
    },
    ChildrenLoaded {
        ticket: Ticket,
        result: Result<Vec<Item>, ApiError>,
    },
    CommentCreated {
        ticket: Ticket,
        notification: Uuid,
        result: Result<Item, ApiError>,
    },
    ThumbnailLoaded {
        generation: u64,
        album_id: ItemId,
        result: Result<Option<String>, ApiError>,
    },
    AuthorLoaded {
        generation: u64,
        user_id: u64,
        result: Result<String, ApiError>,
    },
}

/// Main application state
pub struct App {
    pub client: ApiClient,
    event_tx: UnboundedSender<AppEvent>,
    event_rx: UnboundedReceiver<AppEvent>,

    // Current view
    pub view_key: String,
    /// Bumped whenever the view changes; mutation results from an older
    /// generation only update notifications
    generation: u64,
    /// Bumped on every collection fetch
    fetch_seq: u64,

    // Data
    pub collection: Collection,
    pub view_state: ViewState,
    pub selection: SelectionSet,
    /// Row index within the current page
    pub cursor: usize,

    // Mode state
    pub mode: Mode,
    pub filter_active: bool,
    pub pending_action: Option<PendingAction>,
    pub input: Option<InputState>,

    // Command input
    pub command_text: String,
    pub command_suggestions: Vec<String>,
    pub command_suggestion_selected: usize,
    pub command_preview: Option<String>,

    // Detail panel and per-row lazy loads
    pub detail: DetailPanel,
    pub detail_parent: Option<Item>,
    pub thumbnails: KeyedLoads<ItemId, Option<String>>,
    pub authors: KeyedLoads<u64, String>,

    // UI state
    pub loading: bool,
    pub error_message: Option<String>,
    pub warning_message: Option<String>,

    // Settings
    pub config: Config,
    pub readonly: bool,
    pub bulk_policy: BulkDeletePolicy,
    default_page_size: usize,
    save_config: bool,

    // Notifications
    pub notification_manager: NotificationManager,
    pub notifications_selected: usize,
}

impl App {
    pub fn from_initialized(
        client: ApiClient,
        config: Config,
        view_key: String,
        page_size: usize,
        bulk_policy: BulkDeletePolicy,
        readonly: bool,
    ) -> Self {
        let (event_tx, event_rx) = unbounded_channel();

        Self {
            client,
            event_tx,
            event_rx,
            view_key,
            generation: 0,
            fetch_seq: 0,
            collection: Collection::new(),
            view_state: ViewState::with_page_size(page_size),
            selection: SelectionSet::new(),
            cursor: 0,
            mode: Mode::Normal,
            filter_active: false,
            pending_action: None,
            input: None,
            command_text: String::new(),
            command_suggestions: Vec::new(),
            command_suggestion_selected: 0,
            command_preview: None,
            detail: DetailPanel::new(),
            detail_parent: None,
            thumbnails: KeyedLoads::new(),
            authors: KeyedLoads::new(),
            loading: false,
            error_message: None,
            warning_message: None,
            config,
            readonly,
            bulk_policy,
            default_page_size: page_size,
            save_config: true,
            notification_manager: NotificationManager::new(),
            notifications_selected: 0,
        }
    }

    // =========================================================================
    // Resource Definition Access
    // =========================================================================

    pub fn current_resource(&self) -> Option<&'static ResourceDef> {
        get_resource(&self.view_key)
    }

    /// Child definition of the current view's sub-resource
    pub fn sub_resource(&self) -> Option<&'static ResourceDef> {
        let sub = self.current_resource()?.sub_resource.as_ref()?;
        get_resource(&sub.resource_key)
    }

    pub fn get_available_commands(&self) -> Vec<String> {
        let mut commands: Vec<String> = view_keys().to_vec();
        commands.extend(
            [
                "refresh",
                "notifications",
                "notifications clear",
                "select all",
                "select none",
                "help",
                "quit",
            ]
            .iter()
            .map(|s| s.to_string()),
        );
        commands
    }

    // =========================================================================
    // Projection
    // =========================================================================

    /// Current page of the filtered, sorted collection
    pub fn projection(&self) -> Projection<'_> {
        match self.current_resource() {
            Some(resource) => project(self.collection.items(), &self.view_state.query(resource)),
            None => Projection {
                items: Vec::new(),
                total_matches: 0,
                total_pages: 1,
            },
        }
    }

    pub fn total_pages(&self) -> usize {
        self.projection().total_pages
    }

    pub fn selected_item(&self) -> Option<&Item> {
        self.projection().items.get(self.cursor).copied()
    }


    /// Short label for an item: `#id title`
    pub fn item_label(&self, item: &Item) -> String {
        let title = self
            .current_resource()
            .map(|r| item.text(&r.title_field))
            .unwrap_or_default();
        format!("#{} {}", item.id, truncate(&title, LABEL_WIDTH))
    }

    /// Author display name, once loaded
    pub fn author_name(&self, item: &Item) -> Option<&str> {
        let field = self.current_resource()?.author_field.as_deref()?;
        let user_id = item.field(field).and_then(Value::as_u64)?;
        self.authors.loaded(user_id).map(String::as_str)
    }

    pub fn thumbnail(&self, id: ItemId) -> Option<&LoadState<Option<String>>> {
        self.thumbnails.get(id)
    }

    // =========================================================================
    // View State
    // =========================================================================

    /// Apply a list action and keep page and cursor in range
    pub fn dispatch(&mut self, action: ViewAction) {
        let total_pages = self.total_pages();
        let page_before = self.view_state.page;
        self.view_state.reduce(action, total_pages);
        if self.view_state.page != page_before {
            self.cursor = 0;
        }
        self.clamp_view();
    }

    /// Re-clamp after the collection changed
    fn clamp_view(&mut self) {
        let total_pages = self.total_pages();
        self.view_state.reduce(ViewAction::Clamp, total_pages);
        let rows = self.projection().items.len();
        self.cursor = self.cursor.min(rows.saturating_sub(1));
    }

    pub fn cycle_sort(&mut self) {
        if let Some(resource) = self.current_resource() {
            let next = resource.next_sort_key(&self.view_state.sort_key);
            self.dispatch(ViewAction::SetSort(next));
        }
    }

    pub fn step_page_size(&mut self, forward: bool) {
        if let Some(resource) = self.current_resource() {
            let size = resource.step_page_size(self.view_state.page_size, forward);
            if size != self.view_state.page_size {
                self.dispatch(ViewAction::SetPageSize(size));
            }
        }
    }

    pub fn clear_filter(&mut self) {
        self.filter_active = false;
        self.dispatch(ViewAction::ClearFilter);
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn next(&mut self) {
        match self.mode {
            Mode::Detail => self.detail.scroll_down(),
            Mode::Notifications => {
                let len = self.notification_manager.notifications.len();
                if len > 0 {
                    self.notifications_selected = (self.notifications_selected + 1).min(len - 1);
                }
            }
            _ => {
                let rows = self.projection().items.len();
                if rows > 0 {
                    self.cursor = (self.cursor + 1).min(rows - 1);
                }
            }
        }
    }

    pub fn previous(&mut self) {
        match self.mode {
            Mode::Detail => self.detail.scroll_up(),
            Mode::Notifications => {
                self.notifications_selected = self.notifications_selected.saturating_sub(1);
            }
            _ => self.cursor = self.cursor.saturating_sub(1),
        }
    }

    pub fn go_to_top(&mut self) {
        self.cursor = 0;
    }

    pub fn go_to_bottom(&mut self) {
        self.cursor = self.projection().items.len().saturating_sub(1);
    }

    // =========================================================================
    // Data Fetching
    // =========================================================================

    /// Run `request` on the runtime and queue its event for the UI loop
    fn spawn_request<F>(&self, request: F)
    where
        F: Future<Output = AppEvent> + Send + 'static,
    {
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let event = request.await;
            if tx.send(event).is_err() {
                tracing::debug!("UI loop gone before request finished");
            }
        });
    }

    /// Re-fetch the current view's collection
    pub fn refresh(&mut self) {
        let Some(resource) = self.current_resource() else {
            self.error_message = Some(format!("Unknown view: {}", self.view_key));
            return;
        };

        self.fetch_seq += 1;
        self.loading = true;
        self.error_message = None;

        let fetch = self.fetch_seq;
        let client = self.client.clone();
        self.spawn_request(async move {
            let result = fetch_collection(&client, resource).await;
            AppEvent::CollectionLoaded { fetch, result }
        });
    }

    /// Install a fetched collection (or its failure)
    pub fn load_collection_result(&mut self, result: Result<Vec<Item>, ApiError>) {
        self.loading = false;
        match result {
            Ok(items) => {
                self.collection.replace_all(items);
                self.selection.retain_live(&self.collection);
                self.error_message = None;
            }
            Err(e) => {
                tracing::error!("Failed to load {}: {}", self.view_key, e);
                let mut message = format_api_error(&e);
                if e.is_transient() {
                    message.push_str(" (press R to retry)");
                }
                self.error_message = Some(message);
            }
        }
        self.clamp_view();
    }

    /// Switch to another top-level view; its collection is fetched fresh
    pub fn navigate_to_view(&mut self, view_key: &str) -> Result<()> {
        if !crate::resource::is_view(view_key) {
            self.error_message = Some(format!("Unknown view: {}", view_key));
            return Ok(());
        }

        tracing::info!("Switching to view {}", view_key);
        self.view_key = view_key.to_string();
        self.generation += 1;
        self.collection = Collection::new();
        self.view_state = ViewState::with_page_size(self.default_page_size);
        self.selection.clear();
        self.cursor = 0;
        self.filter_active = false;
        self.pending_action = None;
        self.input = None;
        self.detail.close();
        self.detail_parent = None;
        self.thumbnails.clear();
        self.authors.clear();
        self.mode = Mode::Normal;

        if self.save_config {
            self.config.set_last_view(view_key)?;
        }

        self.refresh();
        Ok(())
    }

    /// Start author and thumbnail loads for rows on the current page
    pub fn load_visible_extras(&mut self) {
        let Some(resource) = self.current_resource() else {
            return;
        };

        let projection = self.projection();
        let visible: Vec<ItemId> = projection.items.iter().map(|item| item.id).collect();
        let user_ids: Vec<u64> = match resource.author_field.as_deref() {
            Some(field) => projection
                .items
                .iter()
                .filter_map(|item| item.field(field).and_then(Value::as_u64))
                .collect(),
            None => Vec::new(),
        };

        if let Some(thumb) = resource.thumbnail.as_ref() {
            if let Some(child) = get_resource(&thumb.resource_key) {
                for album_id in self.thumbnails.begin(visible) {
                    let client = self.client.clone();
                    let generation = self.generation;
                    self.spawn_request(async move {
                        let result = fetch_thumbnail(&client, thumb, child, album_id).await;
                        AppEvent::ThumbnailLoaded {
                            generation,
                            album_id,
                            result,
                        }
                    });
                }
            }
        }

        if let Some(users) = get_resource("users") {
            for user_id in self.authors.begin(user_ids) {
                let client = self.client.clone();
                let generation = self.generation;
                self.spawn_request(async move {
                    let result = fetch_user_name(&client, users, user_id).await;
                    AppEvent::AuthorLoaded {
                        generation,
                        user_id,
                        result,
                    }
                });
            }
        }
    }

    // =========================================================================
    // Event Processing
    // =========================================================================

    /// Drain finished requests; returns how many were handled
    pub fn process_events(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.event_rx.try_recv() {
            self.handle_app_event(event);
            handled += 1;
        }
        handled
    }

    pub fn handle_app_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::CollectionLoaded { fetch, result } => {
                if fetch != self.fetch_seq {
                    tracing::debug!("Discarding stale collection fetch {}", fetch);
                    return;
                }
                self.load_collection_result(result);
            }
            AppEvent::Created {
                generation,
                notification,
                result,
            } => self.on_created(generation, notification, result),
            AppEvent::Deleted {
                generation,
                notification,
                id,
                result,
            } => self.on_deleted(generation, notification, id, result),
            AppEvent::BulkDeleted {
                generation,
                notification,
                results,
            } => self.on_bulk_deleted(generation, notification, results),
            AppEvent::ChildrenLoaded { ticket, result } => {
                self.detail.resolve(ticket, result.map_err(|e| format_api_error(&e)));
            }
            AppEvent::CommentCreated {
                ticket,
                notification,
                result,
            } => match result {
                Ok(comment) => {
                    let id = comment.id;
                    if self.detail.push_child(ticket, comment) {
                        self.notification_manager.mark_success(notification, None);
                    } else {
                        self.notification_manager.mark_success(
                            notification,
                            Some(format!("Comment {} was not added to the open list", id)),
                        );
                    }
                }
                Err(e) => {
                    tracing::error!("Comment create failed: {}", e);
                    self.notification_manager
                        .mark_error(notification, format_api_error(&e));
                }
            },
            AppEvent::ThumbnailLoaded {
                generation,
                album_id,
                result,
            } => {
                if generation == self.generation {
                    if let Err(e) = &result {
                        tracing::warn!("Thumbnail for album {} failed: {}", album_id, e);
                    }
                    self.thumbnails.resolve(album_id, result);
                }
            }
            AppEvent::AuthorLoaded {
                generation,
                user_id,
                result,
            } => {
                if generation == self.generation {
                    if let Err(e) = &result {
                        tracing::warn!("Author {} failed: {}", user_id, e);
                    }
                    self.authors.resolve(user_id, result);
                }
            }
        }
    }

    fn on_created(&mut self, generation: u64, notification: Uuid, result: Result<Item, ApiError>) {
        let item = match result {
            Ok(item) => item,
            Err(e) => {
                tracing::error!("Create failed: {}", e);
                self.notification_manager
                    .mark_error(notification, format_api_error(&e));
                return;
            }
        };

        if generation != self.generation {
            self.notification_manager
                .mark_success(notification, Some(format!("Created #{}", item.id)));
            return;
        }

        match apply_created(&mut self.collection, item) {
            Ok(id) => {
                self.notification_manager
                    .mark_success(notification, Some(format!("Assigned id {}", id)));
                self.clamp_view();
            }
            Err(e) => {
                tracing::warn!("Created item not added: {}", e);
                self.notification_manager.mark_error(notification, e.to_string());
            }
        }
    }

    fn on_deleted(
        &mut self,
        generation: u64,
        notification: Uuid,
        id: ItemId,
        result: Result<(), ApiError>,
    ) {
        match result {
            Ok(()) => {
                if generation == self.generation {
                    apply_deleted(&mut self.collection, &mut self.selection, id);
                    self.clamp_view();
                }
                self.notification_manager.mark_success(notification, None);
            }
            Err(e) => {
                tracing::error!("Delete of {} failed: {}", id, e);
                self.notification_manager
                    .mark_error(notification, format_api_error(&e));
            }
        }
    }

    fn on_bulk_deleted(
        &mut self,
        generation: u64,
        notification: Uuid,
        results: Vec<(ItemId, Result<(), ApiError>)>,
    ) {
        let total = results.len();

        if generation != self.generation {
            let failed = results.iter().filter(|(_, r)| r.is_err()).count();
            if failed == 0 {
                self.notification_manager.mark_success(notification, None);
            } else {
                self.notification_manager
                    .mark_error(notification, format!("{} of {} deletes failed", failed, total));
            }
            return;
        }

        let report = apply_bulk_delete(
            &mut self.collection,
            &mut self.selection,
            results,
            self.bulk_policy,
        );
        self.clamp_view();

        if report.is_success() {
            self.notification_manager.mark_success(
                notification,
                Some(format!("Removed {} items", report.removed.len())),
            );
            return;
        }

        let first = report
            .failed
            .first()
            .map(|(id, e)| format!(" (#{}: {})", id, format_api_error(e)))
            .unwrap_or_default();
        let message = match self.bulk_policy {
            BulkDeletePolicy::PerItem => format!(
                "{} of {} deletes failed{}",
                report.failed.len(),
                total,
                first
            ),
            BulkDeletePolicy::AllOrNothing => format!(
                "{} of {} deletes failed, nothing removed{}",
                report.failed.len(),
                total,
                first
            ),
        };
        self.notification_manager.mark_error(notification, message);
    }

    // =========================================================================
    // Selection
    // =========================================================================

    pub fn toggle_selection(&mut self) {
        if let Some(id) = self.selected_item().map(|item| item.id) {
            self.selection.toggle(id);
        }
    }

    /// Select every live item, filter or not, or clear when something is
    /// selected
    pub fn toggle_select_all(&mut self) {
        let select = self.selection.is_empty();
        let ids: Vec<ItemId> = self.collection.ids().collect();
        self.selection.select_all(ids, select);
    }

    pub fn is_selected(&self, id: ItemId) -> bool {
        self.selection.contains(id)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    fn guard_readonly(&mut self, action: &str) -> bool {
        if self.readonly {
            self.show_warning(&format!("Read-only mode: {} is disabled", action));
            return true;
        }
        false
    }

    pub fn request_delete(&mut self) {
        if self.guard_readonly("delete") {
            return;
        }
        let Some(item) = self.selected_item() else {
            return;
        };
        let id = item.id;
        let message = format!("Delete {}?", self.item_label(item));
        self.enter_confirm_mode(PendingAction {
            kind: PendingKind::Delete(id),
            message,
            selected_yes: false,
        });
    }

    pub fn request_bulk_delete(&mut self) {
        if self.guard_readonly("delete") {
            return;
        }
        if self.selection.is_empty() {
            self.show_warning("No items selected. Use Space to select rows.");
            return;
        }
        let ids = self.selection.sorted_ids();
        let message = format!(
            "Delete {} selected items? [{}]",
            ids.len(),
            self.bulk_policy.as_str()
        );
        self.enter_confirm_mode(PendingAction {
            kind: PendingKind::BulkDelete(ids),
            message,
            selected_yes: false,
        });
    }

    /// Run the pending action if "yes" is chosen, then leave the dialog
    pub fn confirm_pending_action(&mut self) {
        let Some(pending) = self.pending_action.take() else {
            self.mode = Mode::Normal;
            return;
        };
        self.mode = Mode::Normal;

        if !pending.selected_yes {
            return;
        }

        match pending.kind {
            PendingKind::Delete(id) => self.start_delete(id),
            PendingKind::BulkDelete(ids) => self.start_bulk_delete(ids),
        }
    }

    fn start_delete(&mut self, id: ItemId) {
        let Some(resource) = self.current_resource() else {
            return;
        };
        let target = self
            .collection
            .get(id)
            .map(|item| self.item_label(item))
            .unwrap_or_else(|| format!("#{}", id));
        let notification =
            self.notification_manager
                .start(OperationType::Delete, &resource.path, &target);

        let client = self.client.clone();
        let generation = self.generation;
        self.spawn_request(async move {
            let result = delete_item(&client, resource, id).await;
            AppEvent::Deleted {
                generation,
                notification,
                id,
                result,
            }
        });
    }

    fn start_bulk_delete(&mut self, ids: Vec<ItemId>) {
        let Some(resource) = self.current_resource() else {
            return;
        };
        let notification = self.notification_manager.start(
            OperationType::BulkDelete,
            &resource.path,
            &format!("{} items", ids.len()),
        );

        let client = self.client.clone();
        let generation = self.generation;
        self.spawn_request(async move {
            let results = delete_items(&client, resource, &ids).await;
            AppEvent::BulkDeleted {
                generation,
                notification,
                results,
            }
        });
    }

    pub fn begin_create(&mut self) {
        if self.guard_readonly("create") {
            return;
        }
        let Some(resource) = self.current_resource() else {
            return;
        };
        let Some(create) = resource.create.as_ref() else {
            self.show_warning(&format!("{} cannot be created", resource.display_name));
            return;
        };
        self.input = Some(InputState {
            purpose: InputPurpose::NewItem { resource, create },
            prompt: create.prompt.clone(),
            text: String::new(),
            error: None,
        });
        self.mode = Mode::Input;
    }

    /// Start a comment on the parent shown in the detail panel
    pub fn begin_comment(&mut self) {
        if self.guard_readonly("commenting") {
            return;
        }
        let (Some(resource), Some(parent_id)) = (self.current_resource(), self.detail.parent_id())
        else {
            return;
        };
        let Some(sub) = resource.sub_resource.as_ref() else {
            return;
        };
        let Some(child) = get_resource(&sub.resource_key) else {
            return;
        };
        let Some(create) = child.create.as_ref() else {
            self.show_warning(&format!("{} cannot be added here", child.display_name));
            return;
        };

        self.input = Some(InputState {
            purpose: InputPurpose::Comment {
                parent_id,
                ticket: self.detail.ticket(),
                child,
                create,
                parent_field: &sub.parent_field,
            },
            prompt: create.prompt.clone(),
            text: String::new(),
            error: None,
        });
        self.mode = Mode::Input;
    }

    fn build_input_body(&self, input: &InputState) -> Result<Value, MutationError> {
        match &input.purpose {
            InputPurpose::NewItem { create, .. } => build_new_record(create, &input.text),
            InputPurpose::Comment {
                parent_id,
                create,
                parent_field,
                ..
            } => build_comment(
                create,
                parent_field,
                *parent_id,
                &self.config.comment_author.name,
                &self.config.comment_author.email,
                &input.text,
            ),
        }
    }

    /// Send the input box contents; empty input keeps the box open
    pub fn submit_input(&mut self) {
        let Some(input) = self.input.clone() else {
            self.mode = Mode::Normal;
            return;
        };

        let body = match self.build_input_body(&input) {
            Ok(body) => body,
            Err(e) => {
                if let Some(open) = self.input.as_mut() {
                    open.error = Some(e.to_string());
                }
                return;
            }
        };
        self.input = None;

        let client = self.client.clone();
        let label = format!("\"{}\"", truncate(input.text.trim(), LABEL_WIDTH));

        match input.purpose {
            InputPurpose::NewItem { resource, .. } => {
                self.mode = Mode::Normal;
                let notification =
                    self.notification_manager
                        .start(OperationType::Create, &resource.path, &label);
                let generation = self.generation;
                self.spawn_request(async move {
                    let result = create_item(&client, resource, &body).await;
                    AppEvent::Created {
                        generation,
                        notification,
                        result,
                    }
                });
            }
            InputPurpose::Comment {
                parent_id,
                ticket,
                child,
                ..
            } => {
                self.mode = if self.detail.is_open() {
                    Mode::Detail
                } else {
                    Mode::Normal
                };
                let notification = self.notification_manager.start(
                    OperationType::Comment,
                    &child.path,
                    &format!("#{}", parent_id),
                );
                self.spawn_request(async move {
                    let result = create_item(&client, child, &body).await;
                    AppEvent::CommentCreated {
                        ticket,
                        notification,
                        result,
                    }
                });
            }
        }
    }

    pub fn cancel_input(&mut self) {
        let back_to_detail = matches!(
            self.input.as_ref().map(|i| &i.purpose),
            Some(InputPurpose::Comment { .. })
        ) && self.detail.is_open();
        self.input = None;
        self.mode = if back_to_detail {
            Mode::Detail
        } else {
            Mode::Normal
        };
    }

    /// Flip the view's toggle field (todo completion), locally only
    pub fn toggle_completed(&mut self) {
        let Some(resource) = self.current_resource() else {
            return;
        };
        let Some(field) = resource.toggle_field.as_deref() else {
            return;
        };
        let Some(id) = self.selected_item().map(|item| item.id) else {
            return;
        };

        if let Some(now) = toggle_flag(&mut self.collection, id, field) {
            let state = if now { "completed" } else { "not completed" };
            self.notification_manager.record_success(
                OperationType::Toggle,
                &resource.path,
                &format!("#{}", id),
                Some(format!("Marked {}", state)),
            );
            self.clamp_view();
        }
    }

    /// Flip the local favorite flag
    pub fn toggle_favorite(&mut self) {
        let Some(resource) = self.current_resource() else {
            return;
        };
        let Some(id) = self.selected_item().map(|item| item.id) else {
            return;
        };

        if let Some(now) = toggle_flag(&mut self.collection, id, FAVORITE_FIELD) {
            let message = if now { "Added to favorites" } else { "Removed from favorites" };
            self.notification_manager.record_success(
                OperationType::Favorite,
                &resource.path,
                &format!("#{}", id),
                Some(message.to_string()),
            );
        }
    }

    /// Editing is not sent anywhere; it is logged and acknowledged
    pub fn edit_selected(&mut self) {
        let Some(resource) = self.current_resource() else {
            return;
        };
        let Some(id) = self.selected_item().map(|item| item.id) else {
            return;
        };
        tracing::info!("Edit requested for {}/{}", resource.path, id);
        self.notification_manager.record_success(
            OperationType::Edit,
            &resource.path,
            &format!("#{}", id),
            Some("Editing is not supported yet".to_string()),
        );
    }

    // =========================================================================
    // Detail Panel
    // =========================================================================

    /// Open the sub-resource panel for the current row and start loading
    pub fn open_detail(&mut self) {
        let Some(resource) = self.current_resource() else {
            return;
        };
        let Some(sub) = resource.sub_resource.as_ref() else {
            self.show_warning(&format!("{} have no nested items", resource.display_name));
            return;
        };
        let Some(child) = get_resource(&sub.resource_key) else {
            self.error_message = Some(format!("Unknown resource: {}", sub.resource_key));
            return;
        };
        let Some(parent) = self.selected_item().cloned() else {
            return;
        };

        let parent_id = parent.id;
        let ticket = self.detail.open(parent_id);
        self.detail_parent = Some(parent);
        self.mode = Mode::Detail;

        let client = self.client.clone();
        self.spawn_request(async move {
            let result = fetch_children(&client, sub, child, parent_id).await;
            AppEvent::ChildrenLoaded { ticket, result }
        });
    }

    pub fn close_detail(&mut self) {
        self.detail.close();
        self.detail_parent = None;
        self.mode = Mode::Normal;
    }

    // =========================================================================
    // Mode Transitions
    // =========================================================================

    pub fn enter_command_mode(&mut self) {
        self.mode = Mode::Command;
        self.command_text.clear();
        self.command_suggestions = self.get_available_commands();
        self.command_suggestion_selected = 0;
        self.command_preview = None;
    }

    pub fn update_command_suggestions(&mut self) {
        let input = self.command_text.to_lowercase();
        let all_commands = self.get_available_commands();

        self.command_suggestions = if input.is_empty() {
            all_commands
        } else {
            all_commands
                .into_iter()
                .filter(|cmd| cmd.contains(&input))
                .collect()
        };

        if self.command_suggestion_selected >= self.command_suggestions.len() {
            self.command_suggestion_selected = 0;
        }
        self.update_preview();
    }

    fn update_preview(&mut self) {
        self.command_preview = self
            .command_suggestions
            .get(self.command_suggestion_selected)
            .cloned();
    }

    pub fn next_suggestion(&mut self) {
        if !self.command_suggestions.is_empty() {
            self.command_suggestion_selected =
                (self.command_suggestion_selected + 1) % self.command_suggestions.len();
            self.update_preview();
        }
    }

    pub fn prev_suggestion(&mut self) {
        if !self.command_suggestions.is_empty() {
            self.command_suggestion_selected = self
                .command_suggestion_selected
                .checked_sub(1)
                .unwrap_or(self.command_suggestions.len() - 1);
            self.update_preview();
        }
    }

    pub fn apply_suggestion(&mut self) {
        if let Some(preview) = &self.command_preview {
            self.command_text = preview.clone();
            self.update_command_suggestions();
        }
    }

    pub fn enter_help_mode(&mut self) {
        self.mode = Mode::Help;
    }

    pub fn enter_confirm_mode(&mut self, pending: PendingAction) {
        self.pending_action = Some(pending);
        self.mode = Mode::Confirm;
    }

    pub fn show_warning(&mut self, message: &str) {
        self.warning_message = Some(message.to_string());
        self.mode = Mode::Warning;
    }

    pub fn enter_notifications_mode(&mut self) {
        self.notifications_selected = 0;
        self.mode = Mode::Notifications;
    }

    pub fn exit_mode(&mut self) {
        self.mode = if self.detail.is_open() {
            Mode::Detail
        } else {
            Mode::Normal
        };
        self.pending_action = None;
        self.warning_message = None;
    }

    // =========================================================================
    // Command Execution
    // =========================================================================

    /// Run the command line; returns true when the app should quit
    pub fn execute_command(&mut self) -> Result<bool> {
        let command_text = if self.command_text.is_empty() {
            self.command_preview.clone().unwrap_or_default()
        } else {
            match &self.command_preview {
                Some(preview) if preview.starts_with(self.command_text.trim()) => preview.clone(),
                _ => self.command_text.clone(),
            }
        };

        let parts: Vec<&str> = command_text.split_whitespace().collect();
        let Some(&cmd) = parts.first() else {
            self.mode = Mode::Normal;
            return Ok(false);
        };

        self.mode = Mode::Normal;

        match (cmd, parts.get(1).copied()) {
            ("q" | "quit", _) => return Ok(true),
            ("refresh", _) => self.refresh(),
            ("help", _) => self.enter_help_mode(),
            ("notifications", Some("clear")) => self.notification_manager.clear(),
            ("notifications", _) => self.enter_notifications_mode(),
            ("select", Some("all")) => {
                let ids: Vec<ItemId> = self.collection.ids().collect();
                self.selection.select_all(ids, true);
            }
            ("select", Some("none")) => self.selection.clear(),
            ("page", Some(n)) => match n.parse::<usize>() {
                Ok(page) => self.dispatch(ViewAction::GoToPage(page)),
                Err(_) => self.error_message = Some(format!("Invalid page: {}", n)),
            },
            ("size", Some(n)) => match n.parse::<usize>() {
                Ok(size) if size > 0 => self.dispatch(ViewAction::SetPageSize(size)),
                _ => self.error_message = Some(format!("Invalid page size: {}", n)),
            },
            (view, _) if crate::resource::is_view(view) => self.navigate_to_view(view)?,
            _ => self.error_message = Some(format!("Unknown command: {}", cmd)),
        }

        Ok(false)
    }
}

/// Cut `text` to at most `max` characters, marking the cut with `…`
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detail::LoadState;
    use crate::notification::NotificationStatus;
    use serde_json::json;
    use std::time::Duration;

    fn app_with(view: &str, items: Vec<Value>) -> App {
        let client = ApiClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        let mut app = App::from_initialized(
            client,
            Config::default(),
            view.to_string(),
            10,
            BulkDeletePolicy::PerItem,
            false,
        );
        app.save_config = false;
        app.load_collection_result(Ok(items
            .into_iter()
            .filter_map(|v| Item::from_value(v, "id"))
            .collect()));
        app
    }

    fn posts(n: u64) -> Vec<Value> {
        (1..=n)
            .map(|id| json!({"id": id, "userId": 1, "title": format!("post {}", id), "body": "b"}))
            .collect()
    }

    fn last_status(app: &App) -> NotificationStatus {
        app.notification_manager.notifications[0].status.clone()
    }

    #[test]
    fn test_projection_pages_and_cursor() {
        let mut app = app_with("posts", posts(25));
        assert_eq!(app.total_pages(), 3);
        assert_eq!(app.projection().items.len(), 10);

        app.go_to_bottom();
        assert_eq!(app.selected_item().map(|i| i.id), Some(10));

        app.dispatch(ViewAction::LastPage);
        assert_eq!(app.cursor, 0);
        assert_eq!(app.projection().items.len(), 5);
        assert_eq!(app.selected_item().map(|i| i.id), Some(21));
    }

    #[test]
    fn test_filter_resets_page() {
        let mut app = app_with("posts", posts(25));
        app.dispatch(ViewAction::NextPage);
        for c in "post 2".chars() {
            app.dispatch(ViewAction::PushFilterChar(c));
        }
        assert_eq!(app.view_state.page, 1);
        // "post 2" and "post 20".."post 25"
        assert_eq!(app.projection().total_matches, 7);
        app.clear_filter();
        assert_eq!(app.projection().total_matches, 25);
    }

    #[test]
    fn test_stale_collection_fetch_is_ignored() {
        let mut app = app_with("posts", posts(3));
        app.handle_app_event(AppEvent::CollectionLoaded {
            fetch: 42,
            result: Ok(Vec::new()),
        });
        assert_eq!(app.collection.len(), 3);
    }

    #[test]
    fn test_fetch_failure_sets_error_message() {
        let mut app = app_with("posts", Vec::new());
        app.load_collection_result(Err(ApiError::Status { status: 503 }));
        assert_eq!(
            app.error_message.as_deref(),
            Some("Service temporarily unavailable. Please try again. (press R to retry)")
        );
    }

    #[test]
    fn test_permanent_fetch_failure_has_no_retry_hint() {
        let mut app = app_with("posts", Vec::new());
        app.load_collection_result(Err(ApiError::Status { status: 404 }));
        assert_eq!(app.error_message.as_deref(), Some("Resource not found."));
    }

    #[test]
    fn test_delete_success_removes_item_and_selection() {
        let mut app = app_with("posts", posts(3));
        app.selection.select_all([2, 3], true);
        let notification = app
            .notification_manager
            .start(OperationType::Delete, "posts", "#3");

        app.handle_app_event(AppEvent::Deleted {
            generation: 0,
            notification,
            id: 3,
            result: Ok(()),
        });

        assert!(!app.collection.contains(3));
        assert_eq!(app.selection.sorted_ids(), vec![2]);
        assert_eq!(last_status(&app), NotificationStatus::Success);
    }

    #[test]
    fn test_delete_failure_keeps_item() {
        let mut app = app_with("posts", posts(3));
        let notification = app
            .notification_manager
            .start(OperationType::Delete, "posts", "#2");

        app.handle_app_event(AppEvent::Deleted {
            generation: 0,
            notification,
            id: 2,
            result: Err(ApiError::Status { status: 404 }),
        });

        assert!(app.collection.contains(2));
        assert_eq!(
            last_status(&app),
            NotificationStatus::Error("Resource not found.".to_string())
        );
    }

    #[test]
    fn test_delete_from_previous_view_only_notifies() {
        let mut app = app_with("posts", posts(3));
        let notification = app
            .notification_manager
            .start(OperationType::Delete, "posts", "#1");
        app.generation = 1;

        app.handle_app_event(AppEvent::Deleted {
            generation: 0,
            notification,
            id: 1,
            result: Ok(()),
        });

        assert!(app.collection.contains(1));
        assert_eq!(last_status(&app), NotificationStatus::Success);
    }

    #[test]
    fn test_bulk_delete_per_item_reconciles() {
        let mut app = app_with("posts", posts(3));
        app.selection.select_all([1, 2, 3], true);
        let notification = app
            .notification_manager
            .start(OperationType::BulkDelete, "posts", "3 items");

        app.handle_app_event(AppEvent::BulkDeleted {
            generation: 0,
            notification,
            results: vec![
                (1, Ok(())),
                (2, Err(ApiError::Status { status: 500 })),
                (3, Ok(())),
            ],
        });

        assert_eq!(app.collection.ids().collect::<Vec<_>>(), vec![2]);
        assert_eq!(app.selection.sorted_ids(), vec![2]);
        assert!(matches!(last_status(&app), NotificationStatus::Error(msg) if msg.starts_with("1 of 3")));
    }

    #[test]
    fn test_bulk_delete_all_or_nothing_keeps_everything() {
        let mut app = app_with("posts", posts(3));
        app.bulk_policy = BulkDeletePolicy::AllOrNothing;
        app.selection.select_all([1, 2, 3], true);
        let notification = app
            .notification_manager
            .start(OperationType::BulkDelete, "posts", "3 items");

        app.handle_app_event(AppEvent::BulkDeleted {
            generation: 0,
            notification,
            results: vec![
                (1, Ok(())),
                (2, Err(ApiError::Network("reset".into()))),
                (3, Ok(())),
            ],
        });

        assert_eq!(app.collection.len(), 3);
        assert_eq!(app.selection.len(), 3);
    }

    #[test]
    fn test_created_duplicate_id_is_rejected() {
        let mut app = app_with("posts", posts(3));
        let notification = app
            .notification_manager
            .start(OperationType::Create, "posts", "\"x\"");

        app.handle_app_event(AppEvent::Created {
            generation: 0,
            notification,
            result: Ok(Item::from_value(json!({"id": 2, "title": "x"}), "id").unwrap()),
        });

        assert_eq!(app.collection.len(), 3);
        assert!(matches!(last_status(&app), NotificationStatus::Error(_)));
    }

    #[test]
    fn test_created_item_is_appended() {
        let mut app = app_with("posts", posts(3));
        let notification = app
            .notification_manager
            .start(OperationType::Create, "posts", "\"x\"");

        app.handle_app_event(AppEvent::Created {
            generation: 0,
            notification,
            result: Ok(Item::from_value(json!({"id": 101, "title": "x"}), "id").unwrap()),
        });

        assert_eq!(app.collection.ids().last(), Some(101));
        assert_eq!(last_status(&app), NotificationStatus::Success);
    }

    #[test]
    fn test_readonly_blocks_delete() {
        let mut app = app_with("posts", posts(3));
        app.readonly = true;
        app.request_delete();
        assert_eq!(app.mode, Mode::Warning);
        assert!(app.pending_action.is_none());
    }

    #[test]
    fn test_request_delete_asks_for_confirmation() {
        let mut app = app_with("posts", posts(3));
        app.next();
        app.request_delete();
        assert_eq!(app.mode, Mode::Confirm);
        let pending = app.pending_action.clone().unwrap();
        assert_eq!(pending.kind, PendingKind::Delete(2));
        assert!(!pending.selected_yes);

        // Declining leaves everything untouched
        app.confirm_pending_action();
        assert_eq!(app.mode, Mode::Normal);
        assert_eq!(app.collection.len(), 3);
    }

    #[test]
    fn test_bulk_delete_without_selection_warns() {
        let mut app = app_with("posts", posts(3));
        app.request_bulk_delete();
        assert_eq!(app.mode, Mode::Warning);
    }

    #[test]
    fn test_toggle_select_all() {
        let mut app = app_with("posts", posts(25));
        app.toggle_select_all();
        assert_eq!(app.selection.len(), 25);
        app.toggle_select_all();
        assert!(app.selection.is_empty());
    }

    #[test]
    fn test_select_all_ignores_filter() {
        let mut app = app_with("posts", posts(25));
        app.dispatch(ViewAction::SetFilter("post 2".to_string()));
        assert_eq!(app.projection().total_matches, 7);

        app.toggle_select_all();
        assert_eq!(app.selection.len(), 25);

        app.selection.clear();
        app.command_text = "select all".to_string();
        assert!(!app.execute_command().unwrap());
        assert_eq!(app.selection.len(), 25);
    }

    #[test]
    fn test_detail_scroll_is_clamped() {
        let mut app = app_with("posts", posts(1));
        let ticket = app.detail.open(1);
        let comments = (1..=3)
            .filter_map(|id| Item::from_value(json!({"id": id, "name": "c"}), "id"))
            .collect();
        app.detail.resolve::<String>(ticket, Ok(comments));
        app.mode = Mode::Detail;

        for _ in 0..8 {
            app.next();
        }
        assert_eq!(app.detail.scroll, 2);
        app.previous();
        assert_eq!(app.detail.scroll, 1);
    }

    #[test]
    fn test_toggle_completed_reorders_todos() {
        let mut app = app_with(
            "todos",
            vec![
                json!({"id": 1, "title": "a", "completed": false}),
                json!({"id": 2, "title": "b", "completed": false}),
            ],
        );
        app.toggle_completed();
        let order: Vec<ItemId> = app.projection().items.iter().map(|i| i.id).collect();
        assert_eq!(order, vec![2, 1]);
        assert!(app.collection.get(1).unwrap().flag("completed"));
    }

    #[test]
    fn test_favorite_and_edit_are_local() {
        let mut app = app_with("posts", posts(1));
        app.toggle_favorite();
        assert!(app.collection.get(1).unwrap().flag(FAVORITE_FIELD));
        app.edit_selected();
        assert_eq!(app.notification_manager.notifications.len(), 2);
        assert_eq!(app.collection.get(1).unwrap().text("title"), "post 1");
    }

    #[test]
    fn test_empty_input_stays_open() {
        let mut app = app_with("todos", Vec::new());
        app.begin_create();
        assert_eq!(app.mode, Mode::Input);
        app.submit_input();
        assert_eq!(app.mode, Mode::Input);
        assert_eq!(
            app.input.as_ref().and_then(|i| i.error.as_deref()),
            Some("title must not be empty")
        );
        app.cancel_input();
        assert_eq!(app.mode, Mode::Normal);
    }

    #[test]
    fn test_children_for_closed_panel_are_dropped() {
        let mut app = app_with("posts", posts(1));
        let ticket = app.detail.open(1);
        app.close_detail();
        app.handle_app_event(AppEvent::ChildrenLoaded {
            ticket,
            result: Ok(vec![Item::from_value(json!({"id": 1}), "id").unwrap()]),
        });
        assert_eq!(app.detail.state, LoadState::Idle);
    }

    #[test]
    fn test_comment_is_appended_to_open_panel() {
        let mut app = app_with("posts", posts(1));
        let ticket = app.detail.open(1);
        app.handle_app_event(AppEvent::ChildrenLoaded {
            ticket,
            result: Ok(Vec::new()),
        });
        let notification = app
            .notification_manager
            .start(OperationType::Comment, "comments", "#1");
        app.handle_app_event(AppEvent::CommentCreated {
            ticket,
            notification,
            result: Ok(Item::from_value(json!({"id": 501, "postId": 1, "body": "hi"}), "id").unwrap()),
        });
        assert_eq!(app.detail.state.loaded().map(Vec::len), Some(1));
    }

    #[test]
    fn test_author_names_from_stale_view_are_ignored() {
        let mut app = app_with("posts", posts(1));
        app.authors.begin([1]);
        app.handle_app_event(AppEvent::AuthorLoaded {
            generation: 0,
            user_id: 1,
            result: Ok("Leanne Graham".to_string()),
        });
        let item = app.collection.get(1).cloned().unwrap();
        assert_eq!(app.author_name(&item), Some("Leanne Graham"));

        app.generation = 1;
        app.handle_app_event(AppEvent::ThumbnailLoaded {
            generation: 0,
            album_id: 1,
            result: Ok(Some("http://x".to_string())),
        });
        assert!(app.thumbnail(1).is_none());
    }

    #[test]
    fn test_command_suggestions_filter() {
        let mut app = app_with("posts", Vec::new());
        app.enter_command_mode();
        app.command_text = "tod".to_string();
        app.update_command_suggestions();
        assert_eq!(app.command_suggestions, vec!["todos"]);
        assert_eq!(app.command_preview.as_deref(), Some("todos"));
    }

    #[test]
    fn test_page_command() {
        let mut app = app_with("posts", posts(25));
        app.command_text = "page 3".to_string();
        assert!(!app.execute_command().unwrap());
        assert_eq!(app.view_state.page, 3);

        app.command_text = "quit".to_string();
        assert!(app.execute_command().unwrap());
    }

    #[tokio::test]
    async fn test_navigate_resets_view_session() {
        let mut app = app_with("posts", posts(25));
        app.selection.select_all([1, 2], true);
        app.dispatch(ViewAction::NextPage);
        app.authors.begin([1]);

        app.navigate_to_view("todos").unwrap();

        assert_eq!(app.view_key, "todos");
        assert!(app.collection.is_empty());
        assert!(app.selection.is_empty());
        assert!(app.authors.is_empty());
        assert_eq!(app.view_state.page, 1);
        assert!(app.loading);

        app.navigate_to_view("nope").unwrap();
        assert_eq!(app.view_key, "todos");
        assert!(app.error_message.is_some());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
    }
}
