use crm_kanban_core::{BoardItem, ColumnId, ColumnView, ItemId};
use leptos::prelude::*;
use web_sys::DragEvent;

use super::item_card::{CardEntity, ItemCard};
use crate::features::kanban::hooks::BoardHandle;

/// Where a dragged card would land: the column, and the card it would be
/// inserted before (`None` for the end of the column).
pub type DropTarget = Option<(ColumnId, Option<ItemId>)>;

fn allow_move(ev: &DragEvent) {
    ev.prevent_default();
    if let Some(transfer) = ev.data_transfer() {
        transfer.set_drop_effect("move");
    }
}

#[component]
pub fn KanbanColumn<T: CardEntity>(
    column: ColumnView<T>,
    handle: BoardHandle<T>,
    dragging: RwSignal<Option<ItemId>>,
    hover: RwSignal<DropTarget>,
) -> impl IntoView {
    let column_id = column.status.id.clone();
    let count_label = if column.count == column.total {
        column.count.to_string()
    } else {
        format!("{} / {}", column.count, column.total)
    };
    let can_drag = move || handle.can_edit.get() && !handle.drag_disabled.get();

    let is_target = {
        let column_id = column_id.clone();
        move || hover.with(|target| matches!(target, Some((id, _)) if *id == column_id))
    };

    let on_column_dragover = {
        let column_id = column_id.clone();
        move |ev: DragEvent| {
            if dragging.get_untracked().is_none() {
                return;
            }
            allow_move(&ev);
            let target = Some((column_id.clone(), None));
            if hover.with_untracked(|current| *current != target) {
                hover.set(target);
            }
        }
    };

    let on_drop = {
        let column_id = column_id.clone();
        move |ev: DragEvent| {
            ev.prevent_default();
            let Some(item_id) = dragging.get_untracked() else {
                return;
            };
            let before = hover
                .get_untracked()
                .filter(|(id, _)| *id == column_id)
                .and_then(|(_, before)| before);
            dragging.set(None);
            hover.set(None);
            handle.drop_at(item_id, &column_id, before);
        }
    };

    let cards = column
        .items
        .into_iter()
        .map(|item| {
            let item_id = item.id();
            let card_column = column_id.clone();
            let marker_column = column_id.clone();

            let on_card_dragover = move |ev: DragEvent| {
                if dragging.get_untracked().is_none() {
                    return;
                }
                allow_move(&ev);
                ev.stop_propagation();
                let target = Some((card_column.clone(), Some(item_id)));
                if hover.with_untracked(|current| *current != target) {
                    hover.set(target);
                }
            };

            view! {
                <div
                    class="item-card"
                    class:dragging=move || dragging.get() == Some(item_id)
                    class:drop-before=move || {
                        hover.with(|target| {
                            matches!(target, Some((id, Some(before))) if *id == marker_column && *before == item_id)
                        })
                    }
                    draggable=move || if can_drag() { "true" } else { "false" }
                    on:dragstart=move |ev: DragEvent| {
                        if !can_drag() {
                            ev.prevent_default();
                            return;
                        }
                        if let Some(transfer) = ev.data_transfer() {
                            transfer.set_effect_allowed("move");
                            let _ = transfer.set_data("text/plain", &item_id.to_string());
                        }
                        dragging.set(Some(item_id));
                    }
                    on:dragend=move |_| {
                        dragging.set(None);
                        hover.set(None);
                    }
                    on:dragover=on_card_dragover
                >
                    <ItemCard item=item />
                </div>
            }
        })
        .collect_view();

    view! {
        <div
            class="kanban-column"
            class:drop-target=is_target
            on:dragover=on_column_dragover
            on:drop=on_drop
        >
            <div class="column-header">
                <span class="status-dot" style=format!("background-color: {}", column.status.color)></span>
                <h3>{column.status.name.clone()}</h3>
                <span class="task-count">{count_label}</span>
            </div>
            <div class="column-content">
                {cards}
            </div>
        </div>
    }
}
