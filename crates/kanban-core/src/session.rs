use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use log::debug;

use crate::board::{Board, DropEvent};
use crate::config::BoardConfig;
use crate::controller::{BoardController, DropDecision, IgnoreReason, OpId, Settlement, StatusUpdate};
use crate::error::UpdateError;
use crate::model::BoardItem;
use crate::permissions::Permissions;

/// Successful status-update response.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateAck<T> {
    pub message: Option<String>,
    /// Server's copy of the record, when the endpoint returns one.
    pub item: Option<T>,
}

impl<T> UpdateAck<T> {
    pub fn empty() -> Self {
        Self {
            message: None,
            item: None,
        }
    }
}

/// The backend endpoint that persists a status change.
#[async_trait(?Send)]
pub trait StatusUpdater<T> {
    async fn update_status(&self, update: &StatusUpdate) -> Result<UpdateAck<T>, UpdateError>;
}

/// Toast surface. The board only pushes to it.
pub trait Notifier {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
    fn loading(&self, message: &str);
    fn dismiss(&self);
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent<T> {
    /// Board or drag-enabled state changed and should be re-rendered.
    Changed { board: Board<T>, drag_disabled: bool },
    /// A request went out for `op`.
    Dispatched(OpId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    Ignored(IgnoreReason),
    Denied,
    Committed,
    RolledBack,
    Stale,
}

type Observer<T> = Box<dyn Fn(SessionEvent<T>)>;

/// Drives one board: takes drops, talks to the updater, reconciles, and
/// reports to the notifier and an optional observer.
///
/// Single-threaded: the controller is only borrowed between awaits.
pub struct KanbanSession<T> {
    controller: RefCell<BoardController<T>>,
    updater: Rc<dyn StatusUpdater<T>>,
    notifier: Rc<dyn Notifier>,
    permissions: RefCell<Permissions>,
    observer: RefCell<Option<Observer<T>>>,
}

impl<T: BoardItem + 'static> KanbanSession<T> {
    pub fn new(
        board: Board<T>,
        config: BoardConfig<T>,
        permissions: Permissions,
        updater: Rc<dyn StatusUpdater<T>>,
        notifier: Rc<dyn Notifier>,
    ) -> Self {
        Self {
            controller: RefCell::new(BoardController::new(board, config)),
            updater,
            notifier,
            permissions: RefCell::new(permissions),
            observer: RefCell::new(None),
        }
    }

    pub fn observe(&self, observer: impl Fn(SessionEvent<T>) + 'static) {
        *self.observer.borrow_mut() = Some(Box::new(observer));
    }

    pub fn board(&self) -> Board<T> {
        self.controller.borrow().board().clone()
    }

    pub fn is_drag_disabled(&self) -> bool {
        self.controller.borrow().is_drag_disabled()
    }

    pub fn permissions(&self) -> Permissions {
        self.permissions.borrow().clone()
    }

    pub fn can_edit(&self) -> bool {
        let capability = self.controller.borrow().config().edit_capability;
        self.permissions.borrow().can(capability)
    }

    pub async fn handle_drop(&self, event: DropEvent) -> DropOutcome {
        let (decision, config) = {
            let mut ctl = self.controller.borrow_mut();
            (ctl.drop_item(&event, &self.permissions.borrow()), *ctl.config())
        };

        let update = match decision {
            DropDecision::Ignored(reason) => return DropOutcome::Ignored(reason),
            DropDecision::Denied { .. } => {
                self.notifier.error(&format!(
                    "You do not have permission to move this {}.",
                    config.label.to_lowercase()
                ));
                return DropOutcome::Denied;
            }
            DropDecision::Dispatch(update) => update,
        };

        self.emit_changed();
        self.emit(SessionEvent::Dispatched(update.op));
        self.notifier.loading("Updating status...");

        let result = self.updater.update_status(&update).await;

        let (message, item) = match result {
            Ok(ack) => (ack.message, Ok(ack.item)),
            Err(err) => (None, Err(err)),
        };
        let settlement = self.controller.borrow_mut().settle(update.op, item);

        match settlement {
            Settlement::Stale => {
                debug!("{}: late response ignored", update.op);
                DropOutcome::Stale
            }
            Settlement::Committed { .. } => {
                self.notifier.dismiss();
                let text = message.unwrap_or_else(|| self.moved_message(&update, config.label));
                self.notifier.success(&text);
                self.emit_changed();
                DropOutcome::Committed
            }
            Settlement::RolledBack(err) => {
                self.notifier.dismiss();
                self.notifier.error(&err.user_message());
                self.emit_changed();
                DropOutcome::RolledBack
            }
        }
    }

    /// Called by the request watchdog; see [`BoardController::abandon`].
    pub fn abandon(&self, op: OpId) -> bool {
        let abandoned = self.controller.borrow_mut().abandon(op);
        if abandoned {
            self.notifier.dismiss();
            self.notifier
                .error("The server did not respond in time. The board was restored.");
            self.emit_changed();
        }
        abandoned
    }

    /// Takes a freshly loaded board; any pending response becomes stale.
    pub fn reset(&self, board: Board<T>) {
        self.controller.borrow_mut().reset(board);
        self.emit_changed();
    }

    /// Takes a reloaded snapshot unless a move is in flight. Returns `false`
    /// and keeps the optimistic board when one is; the caller retries once
    /// the move settles.
    pub fn refresh(&self, board: Board<T>, permissions: Permissions) -> bool {
        if self.is_drag_disabled() {
            debug!("refresh deferred: move in flight");
            return false;
        }
        *self.permissions.borrow_mut() = permissions;
        self.reset(board);
        true
    }

    /// Detaches the observer and forgets any pending move, so a response
    /// arriving after teardown changes nothing visible.
    pub fn dispose(&self) {
        self.observer.borrow_mut().take();
        let board = self.board();
        self.controller.borrow_mut().reset(board);
    }

    fn moved_message(&self, update: &StatusUpdate, label: &str) -> String {
        let ctl = self.controller.borrow();
        match ctl.board().column(&update.destination) {
            Some(column) => format!("{label} moved to {}.", column.status.name),
            None => format!("{label} updated."),
        }
    }

    fn emit_changed(&self) {
        let event = {
            let ctl = self.controller.borrow();
            SessionEvent::Changed {
                board: ctl.board().clone(),
                drag_disabled: ctl.is_drag_disabled(),
            }
        };
        self.emit(event);
    }

    fn emit(&self, event: SessionEvent<T>) {
        if let Some(observer) = self.observer.borrow().as_ref() {
            observer(event);
        }
    }
}
