use crm_kanban_core::{ItemId, SearchFilter};
use leptos::prelude::*;

use super::column::{DropTarget, KanbanColumn};
use super::header::BoardHeader;
use super::item_card::CardEntity;
use crate::features::kanban::hooks::BoardHandle;

/// One board for any [`CardEntity`]. The search box filters the view only;
/// drops are mapped back onto the full board before they reach the session.
#[component]
pub fn KanbanBoard<T: CardEntity>(
    handle: BoardHandle<T>,
    #[prop(into)] title: String,
) -> impl IntoView {
    let config = handle.config();
    let search = RwSignal::new(String::new());
    let dragging = RwSignal::new(None::<ItemId>);
    let hover = RwSignal::<DropTarget>::new(None);

    let views = Memo::new(move |_| {
        let filter = SearchFilter::new(&search.get());
        handle.board.with(|board| {
            board
                .as_ref()
                .map(|board| board.filtered(&filter, config.filter))
                .unwrap_or_default()
        })
    });
    let total = Signal::derive(move || {
        handle
            .board
            .with(|board| board.as_ref().map_or(0, |board| board.item_count()))
    });

    view! {
        <div class="kanban-page">
            <BoardHeader
                title=title
                placeholder=format!("Search {}...", config.entity.replace('-', " "))
                search=search
                total=total
            />
            {move || {
                handle.load_error.get().map(|error| {
                    view! { <p class="board-error">"Board unavailable: " {error}</p> }
                })
            }}
            <div class="kanban-board" class:board-disabled=move || handle.drag_disabled.get()>
                {move || {
                    if handle.board.with(Option::is_none) {
                        return view! { <p class="board-loading">"Loading..."</p> }.into_any();
                    }
                    views
                        .get()
                        .into_iter()
                        .map(|column| {
                            view! {
                                <KanbanColumn
                                    column=column
                                    handle=handle
                                    dragging=dragging
                                    hover=hover
                                />
                            }
                        })
                        .collect_view()
                        .into_any()
                }}
            </div>
        </div>
    }
}
