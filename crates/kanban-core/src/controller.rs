use std::fmt;
use std::mem;

use log::{debug, info, warn};

use crate::board::{Board, DropEvent};
use crate::config::BoardConfig;
use crate::error::{MoveError, UpdateError};
use crate::model::{BoardItem, ColumnId, ItemId};
use crate::permissions::Permissions;

/// Monotonic id tagging each dispatched move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OpId(u64);

impl fmt::Display for OpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MoveState<T> {
    Idle,
    Pending {
        op: OpId,
        item_id: ItemId,
        snapshot: Board<T>,
    },
}

/// The request a dispatched move needs sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub op: OpId,
    pub item_id: ItemId,
    pub source: ColumnId,
    pub destination: ColumnId,
    pub position: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    NoMove,
    Busy,
    ItemNotFound,
    UnknownColumn,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropDecision {
    Ignored(IgnoreReason),
    Denied { capability: &'static str },
    Dispatch(StatusUpdate),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Settlement {
    /// `reconciled` is set when the server's copy replaced the optimistic one.
    Committed { reconciled: bool },
    RolledBack(UpdateError),
    /// Not the pending op any more; the response was dropped.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Committed,
    RolledBack,
    Abandoned,
}

/// Board state plus the optimistic-move state machine:
/// `Idle -> Pending(snapshot) -> {Committed | RolledBack} -> Idle`.
///
/// At most one move is pending; drops arriving meanwhile are ignored.
#[derive(Debug, Clone)]
pub struct BoardController<T> {
    config: BoardConfig<T>,
    board: Board<T>,
    state: MoveState<T>,
    next_op: u64,
    last_outcome: Option<Outcome>,
}

impl<T: BoardItem> BoardController<T> {
    pub fn new(board: Board<T>, config: BoardConfig<T>) -> Self {
        Self {
            config,
            board,
            state: MoveState::Idle,
            next_op: 1,
            last_outcome: None,
        }
    }

    pub fn board(&self) -> &Board<T> {
        &self.board
    }

    pub fn config(&self) -> &BoardConfig<T> {
        &self.config
    }

    pub fn state(&self) -> &MoveState<T> {
        &self.state
    }

    pub fn last_outcome(&self) -> Option<Outcome> {
        self.last_outcome
    }

    pub fn is_drag_disabled(&self) -> bool {
        matches!(self.state, MoveState::Pending { .. })
    }

    pub fn pending_op(&self) -> Option<OpId> {
        match self.state {
            MoveState::Pending { op, .. } => Some(op),
            MoveState::Idle => None,
        }
    }

    /// Handles a drag-end. On `Dispatch` the optimistic board is already in
    /// place and the pre-move board is held as the rollback snapshot.
    pub fn drop_item(&mut self, event: &DropEvent, permissions: &Permissions) -> DropDecision {
        if event.is_no_move() {
            return DropDecision::Ignored(IgnoreReason::NoMove);
        }
        if let Some(op) = self.pending_op() {
            debug!("drop of item {} ignored while {} is in flight", event.item_id, op);
            return DropDecision::Ignored(IgnoreReason::Busy);
        }
        if !permissions.can(self.config.edit_capability) {
            info!("drop of item {} denied: missing {}", event.item_id, self.config.edit_capability);
            return DropDecision::Denied {
                capability: self.config.edit_capability,
            };
        }

        let next = match self.board.apply_move(event) {
            Ok(next) => next,
            Err(err) => {
                warn!("ignoring drop: {err}");
                return DropDecision::Ignored(match err {
                    MoveError::UnknownColumn(_) => IgnoreReason::UnknownColumn,
                    MoveError::ItemNotFound { .. } => IgnoreReason::ItemNotFound,
                });
            }
        };

        let op = OpId(self.next_op);
        self.next_op += 1;
        let position = next
            .locate(event.item_id)
            .map(|(_, pos)| pos)
            .unwrap_or(event.destination_index);
        let snapshot = mem::replace(&mut self.board, next);
        self.state = MoveState::Pending {
            op,
            item_id: event.item_id,
            snapshot,
        };
        debug!("{op}: item {} {} -> {}", event.item_id, event.source, event.destination);

        DropDecision::Dispatch(StatusUpdate {
            op,
            item_id: event.item_id,
            source: event.source.clone(),
            destination: event.destination.clone(),
            position,
        })
    }

    /// Applies the server's answer for `op`.
    pub fn settle(&mut self, op: OpId, result: Result<Option<T>, UpdateError>) -> Settlement {
        let snapshot = match mem::replace(&mut self.state, MoveState::Idle) {
            MoveState::Pending { op: pending, snapshot, .. } if pending == op => snapshot,
            other => {
                self.state = other;
                debug!("{op}: response discarded, no longer pending");
                return Settlement::Stale;
            }
        };

        match result {
            Ok(authoritative) => {
                let reconciled = match authoritative {
                    Some(item) => self.board.reconcile(item),
                    None => false,
                };
                self.last_outcome = Some(Outcome::Committed);
                debug!("{op}: committed");
                Settlement::Committed { reconciled }
            }
            Err(err) => {
                self.board = snapshot;
                self.last_outcome = Some(Outcome::RolledBack);
                warn!("{op}: rolled back: {err}");
                Settlement::RolledBack(err)
            }
        }
    }

    /// Gives up on `op` if it is still pending: restores the snapshot and
    /// re-enables dragging. A response arriving later is stale.
    pub fn abandon(&mut self, op: OpId) -> bool {
        match mem::replace(&mut self.state, MoveState::Idle) {
            MoveState::Pending { op: pending, snapshot, .. } if pending == op => {
                self.board = snapshot;
                self.last_outcome = Some(Outcome::Abandoned);
                warn!("{op}: abandoned, board restored");
                true
            }
            other => {
                self.state = other;
                false
            }
        }
    }

    /// Replaces the board with fresh server data. Any pending move is
    /// forgotten without rollback, since the new board already reflects the
    /// server.
    pub fn reset(&mut self, board: Board<T>) {
        if let Some(op) = self.pending_op() {
            debug!("{op}: superseded by board refresh");
        }
        self.state = MoveState::Idle;
        self.board = board;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BoardEntity;
    use crate::entities::Lead;
    use crate::testing::{ids, lead, lead_board, NEW, QUALIFIED};

    fn controller() -> BoardController<Lead> {
        BoardController::new(lead_board(), Lead::config())
    }

    fn editor() -> Permissions {
        Permissions::new(["edit-leads"])
    }

    fn new_to_qualified() -> DropEvent {
        DropEvent {
            source: NEW.into(),
            destination: QUALIFIED.into(),
            source_index: 1,
            destination_index: 0,
            item_id: 2,
        }
    }

    fn dispatched(decision: DropDecision) -> StatusUpdate {
        match decision {
            DropDecision::Dispatch(update) => update,
            other => panic!("expected dispatch, got {other:?}"),
        }
    }

    #[test]
    fn dropping_in_place_changes_nothing() {
        let mut ctl = controller();
        let before = ctl.board().clone();
        let decision = ctl.drop_item(
            &DropEvent {
                source: NEW.into(),
                destination: NEW.into(),
                source_index: 1,
                destination_index: 1,
                item_id: 2,
            },
            &editor(),
        );
        assert_eq!(decision, DropDecision::Ignored(IgnoreReason::NoMove));
        assert_eq!(ctl.board(), &before);
        assert!(!ctl.is_drag_disabled());
    }

    #[test]
    fn missing_capability_is_denied_before_any_change() {
        let mut ctl = controller();
        let before = ctl.board().clone();
        let decision = ctl.drop_item(&new_to_qualified(), &Permissions::new(["view-leads"]));
        assert_eq!(decision, DropDecision::Denied { capability: "edit-leads" });
        assert_eq!(ctl.board(), &before);
        assert_eq!(ctl.state(), &MoveState::Idle);
    }

    #[test]
    fn dispatch_applies_optimistic_board_and_disables_drag() {
        let mut ctl = controller();
        let update = dispatched(ctl.drop_item(&new_to_qualified(), &editor()));

        assert_eq!(update.item_id, 2);
        assert_eq!(update.destination, QUALIFIED.into());
        assert_eq!(update.position, 0);
        assert!(ctl.is_drag_disabled());
        assert_eq!(ids(ctl.board(), NEW), vec![1, 3]);
        assert_eq!(ids(ctl.board(), QUALIFIED), vec![2, 4]);

        let second = DropEvent {
            source: NEW.into(),
            destination: QUALIFIED.into(),
            source_index: 0,
            destination_index: 0,
            item_id: 1,
        };
        assert_eq!(ctl.drop_item(&second, &editor()), DropDecision::Ignored(IgnoreReason::Busy));
    }

    #[test]
    fn success_keeps_optimistic_state() {
        let mut ctl = controller();
        let update = dispatched(ctl.drop_item(&new_to_qualified(), &editor()));
        let optimistic = ctl.board().clone();

        let settlement = ctl.settle(update.op, Ok(None));
        assert_eq!(settlement, Settlement::Committed { reconciled: false });
        assert_eq!(ctl.board(), &optimistic);
        assert!(!ctl.is_drag_disabled());
        assert_eq!(ctl.last_outcome(), Some(Outcome::Committed));

        let moved = ctl.board().item(2).unwrap();
        assert_eq!(moved.lead_status.as_ref().unwrap().name, "Qualified");
        assert_eq!(moved.lead_status.as_ref().unwrap().color, "#10b981");
    }

    #[test]
    fn success_with_server_copy_reconciles() {
        let mut ctl = controller();
        let update = dispatched(ctl.drop_item(&new_to_qualified(), &editor()));
        let mut server_copy = lead(2, QUALIFIED);
        server_copy.phone = Some("+1 555 0100".into());

        let settlement = ctl.settle(update.op, Ok(Some(server_copy)));
        assert_eq!(settlement, Settlement::Committed { reconciled: true });
        assert_eq!(ctl.board().item_count(), 4);
        assert_eq!(ctl.board().item(2).unwrap().phone.as_deref(), Some("+1 555 0100"));
    }

    #[test]
    fn failure_restores_pre_move_board() {
        let mut ctl = controller();
        let before = ctl.board().clone();
        let update = dispatched(ctl.drop_item(&new_to_qualified(), &editor()));

        let err = UpdateError::Server {
            status: 500,
            message: "Server Error".into(),
        };
        assert_eq!(ctl.settle(update.op, Err(err.clone())), Settlement::RolledBack(err));
        assert_eq!(ctl.board(), &before);
        assert_eq!(ids(ctl.board(), NEW).len(), 3);
        assert_eq!(ids(ctl.board(), QUALIFIED).len(), 1);
        assert!(!ctl.is_drag_disabled());
    }

    #[test]
    fn responses_after_reset_are_stale() {
        let mut ctl = controller();
        let update = dispatched(ctl.drop_item(&new_to_qualified(), &editor()));

        let refreshed = lead_board();
        ctl.reset(refreshed.clone());
        assert!(!ctl.is_drag_disabled());

        let err = UpdateError::Transport("late".into());
        assert_eq!(ctl.settle(update.op, Err(err)), Settlement::Stale);
        assert_eq!(ctl.board(), &refreshed);
    }

    #[test]
    fn abandon_rolls_back_and_ignores_late_answer() {
        let mut ctl = controller();
        let before = ctl.board().clone();
        let update = dispatched(ctl.drop_item(&new_to_qualified(), &editor()));

        assert!(ctl.abandon(update.op));
        assert_eq!(ctl.board(), &before);
        assert_eq!(ctl.last_outcome(), Some(Outcome::Abandoned));
        assert!(!ctl.abandon(update.op));

        assert_eq!(ctl.settle(update.op, Ok(None)), Settlement::Stale);
        assert_eq!(ctl.board(), &before);
    }

    #[test]
    fn op_ids_increase_per_dispatch() {
        let mut ctl = controller();
        let first = dispatched(ctl.drop_item(&new_to_qualified(), &editor()));
        ctl.settle(first.op, Ok(None));

        let back = DropEvent {
            source: QUALIFIED.into(),
            destination: NEW.into(),
            source_index: 0,
            destination_index: 0,
            item_id: 2,
        };
        let second = dispatched(ctl.drop_item(&back, &editor()));
        assert!(second.op > first.op);
        assert_eq!(ctl.settle(first.op, Ok(None)), Settlement::Stale);
        assert!(ctl.is_drag_disabled());
    }
}
