use crm_kanban_core::{GenericItem, Lead, Opportunity, ProjectTask};
use leptos::prelude::*;
use leptos_router::hooks::use_params_map;

use crate::features::kanban::{use_board, CardEntity, KanbanBoard};

#[component]
pub fn BoardPage<T: CardEntity>(
    #[prop(into)] title: String,
    #[prop(optional)] project: Option<u64>,
    #[prop(optional)] _entity: std::marker::PhantomData<T>,
) -> impl IntoView {
    let handle = use_board::<T>(project);
    view! { <KanbanBoard handle=handle title=title /> }
}

#[component]
pub fn LeadsPage() -> impl IntoView {
    view! { <BoardPage<Lead> title="Leads" /> }
}

#[component]
pub fn OpportunitiesPage() -> impl IntoView {
    view! { <BoardPage<Opportunity> title="Opportunities" /> }
}

#[component]
pub fn ItemsPage() -> impl IntoView {
    view! { <BoardPage<GenericItem> title="Items" /> }
}

/// `/projects/:id/tasks`. A new id rebuilds the board from scratch.
#[component]
pub fn ProjectTasksPage() -> impl IntoView {
    let params = use_params_map();
    let project = move || params.with(|p| p.get("id").and_then(|id| id.parse::<u64>().ok()));

    move || match project() {
        Some(id) => view! {
            <BoardPage<ProjectTask> title=format!("Project #{id} tasks") project=id />
        }
        .into_any(),
        None => view! { <p class="board-error">"Unknown project."</p> }.into_any(),
    }
}
