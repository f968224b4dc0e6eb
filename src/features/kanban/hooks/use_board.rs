use std::rc::Rc;

use crm_kanban_core::{
    Board, BoardChanged, BoardConfig, ColumnId, DropEvent, ItemId, KanbanSession, Notifier, SessionEvent,
};
use gloo_timers::future::TimeoutFuture;
use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::components::toast::Toaster;
use crate::core::services::{load_snapshot, AppServices, BoardEvents, HttpStatusUpdater, IssuedRequests};
use crate::features::kanban::components::CardEntity;

/// Reactive face of one board: what the view reads, plus the session that
/// owns the move state machine.
pub struct BoardHandle<T: Send + Sync + 'static> {
    pub board: RwSignal<Option<Board<T>>>,
    pub drag_disabled: RwSignal<bool>,
    pub can_edit: RwSignal<bool>,
    pub load_error: RwSignal<Option<String>>,
    session: StoredValue<Option<Rc<KanbanSession<T>>>, LocalStorage>,
}

impl<T: Send + Sync + 'static> Clone for BoardHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Send + Sync + 'static> Copy for BoardHandle<T> {}

impl<T: CardEntity> BoardHandle<T> {
    pub fn config(&self) -> BoardConfig<T> {
        T::config()
    }

    /// Translates a drop on the (possibly filtered) view into a board event.
    /// `before` is the card the pointer was over, `None` for the column tail.
    pub fn drop_at(&self, item_id: ItemId, destination: &ColumnId, before: Option<ItemId>) {
        let event = self.board.with_untracked(|board| {
            board
                .as_ref()
                .and_then(|board| board.drop_event(item_id, destination, before))
        });
        match event {
            Some(event) => self.drop_item(event),
            None => log::warn!("Dropped item {} is not on the board", item_id),
        }
    }

    pub fn drop_item(&self, event: DropEvent) {
        let Some(session) = self.session.try_get_value().flatten() else {
            return;
        };
        spawn_local(async move {
            let item_id = event.item_id;
            let outcome = session.handle_drop(event).await;
            log::debug!("Drop of {} {}: {:?}", T::config().entity, item_id, outcome);
        });
    }
}

/// Everything needed to (re)fetch a board snapshot.
struct Loader<T: Send + Sync + 'static> {
    handle: BoardHandle<T>,
    client: reqwest::Client,
    services: AppServices,
    toaster: Toaster,
    issued: IssuedRequests,
    project: Option<u64>,
    refresh_queued: StoredValue<bool, LocalStorage>,
}

impl<T: Send + Sync + 'static> Clone for Loader<T> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle,
            client: self.client.clone(),
            services: self.services.clone(),
            toaster: self.toaster,
            issued: self.issued.clone(),
            project: self.project,
            refresh_queued: self.refresh_queued,
        }
    }
}

impl<T: CardEntity> Loader<T> {
    fn spawn(&self) {
        let loader = self.clone();
        spawn_local(async move { loader.load().await });
    }

    async fn load(self) {
        let config = T::config();
        let snapshot = match load_snapshot::<T>(&self.client, &self.services, &config, self.project).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                log::error!("Failed to load {} board: {}", config.entity, e);
                let _ = self.handle.load_error.try_set(Some(e.to_string()));
                self.toaster.error(&format!("Failed to load {} board.", config.label.to_lowercase()));
                return;
            }
        };

        let permissions = snapshot.permissions.clone();
        let board = Board::from_snapshot(snapshot);
        log::info!("Loaded {} board with {} items", config.entity, board.item_count());
        let _ = self.handle.load_error.try_set(None);

        if let Some(session) = self.handle.session.try_get_value().flatten() {
            // A move went out while the snapshot was in flight. Fetch again
            // once it settles.
            if !session.refresh(board, permissions) {
                self.refresh_queued.set_value(true);
                return;
            }
            let _ = self.handle.can_edit.try_set(session.can_edit());
            return;
        }

        let updater = HttpStatusUpdater::new(self.client.clone(), self.services.clone(), config, self.issued.clone());
        let session = Rc::new(KanbanSession::new(
            board.clone(),
            config,
            permissions,
            Rc::new(updater),
            Rc::new(self.toaster),
        ));
        let can_edit = session.can_edit();

        let loader = self.clone();
        session.observe(move |event| loader.on_session_event(event));

        if self.handle.session.try_set_value(Some(session)).is_some() {
            // Owner already gone.
            return;
        }
        let _ = self.handle.can_edit.try_set(can_edit);
        let _ = self.handle.board.try_set(Some(board));
    }

    fn on_session_event(&self, event: SessionEvent<T>) {
        match event {
            SessionEvent::Changed { board, drag_disabled } => {
                let _ = self.handle.board.try_set(Some(board));
                let _ = self.handle.drag_disabled.try_set(drag_disabled);
                if !drag_disabled && self.refresh_queued.try_get_value() == Some(true) {
                    self.refresh_queued.set_value(false);
                    self.spawn();
                }
            }
            SessionEvent::Dispatched(op) => {
                let timeout = self.services.settings().request_timeout_ms;
                if timeout == 0 {
                    return;
                }
                let session = self.handle.session;
                spawn_local(async move {
                    TimeoutFuture::new(timeout).await;
                    if let Some(session) = session.try_get_value().flatten() {
                        if session.abandon(op) {
                            log::warn!("{} abandoned after {}ms", op, timeout);
                        }
                    }
                });
            }
        }
    }

    /// Remote change: refetch, or queue the refetch until the in-flight move
    /// settles so its response is not made stale.
    fn on_remote_change(&self) {
        if self.handle.drag_disabled.get_untracked() {
            self.refresh_queued.set_value(true);
        } else {
            self.spawn();
        }
    }
}

/// Loads the `T` board, wires it to the status endpoint and the live
/// change feed, and tears both down with the calling component.
pub fn use_board<T: CardEntity>(project: Option<u64>) -> BoardHandle<T> {
    let services = expect_context::<AppServices>();
    let toaster = expect_context::<Toaster>();

    let handle = BoardHandle {
        board: RwSignal::new(None),
        drag_disabled: RwSignal::new(false),
        can_edit: RwSignal::new(false),
        load_error: RwSignal::new(None),
        session: StoredValue::new_local(None),
    };

    let loader = Loader {
        handle,
        client: reqwest::Client::new(),
        services: services.clone(),
        toaster,
        issued: IssuedRequests::default(),
        project,
        refresh_queued: StoredValue::new_local(false),
    };
    loader.spawn();

    let events = StoredValue::new_local(None::<BoardEvents>);
    match services.route("events", &[]) {
        Ok(path) => {
            let entity = T::config().entity;
            let issued = loader.issued.clone();
            let on_change = {
                let loader = loader.clone();
                move |change: BoardChanged| {
                    if !change.concerns(entity, project) {
                        return;
                    }
                    if change.request_id.as_deref().is_some_and(|id| issued.contains(id)) {
                        return;
                    }
                    log::debug!("{} {} changed elsewhere, reloading", entity, change.item_id);
                    loader.on_remote_change();
                }
            };
            match BoardEvents::subscribe(&services.url(&path), on_change) {
                Ok(subscription) => events.set_value(Some(subscription)),
                Err(e) => log::warn!("Live updates unavailable: {:?}", e),
            }
        }
        Err(e) => log::warn!("Live updates unavailable: {}", e),
    }

    on_cleanup(move || {
        let _ = handle.session.try_update_value(|session| {
            if let Some(session) = session.take() {
                session.dispose();
            }
        });
        let _ = events.try_update_value(|events| events.take());
    });

    handle
}
