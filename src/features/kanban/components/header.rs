use leptos::prelude::*;

#[component]
pub fn BoardHeader(
    #[prop(into)] title: String,
    #[prop(into)] placeholder: String,
    search: RwSignal<String>,
    /// Items on the board, ignoring the search box.
    #[prop(into)]
    total: Signal<usize>,
) -> impl IntoView {
    view! {
        <header class="kanban-header">
            <div class="kanban-header-left">
                <h1>{title}</h1>
                <span class="board-total">{move || total.get()}</span>
            </div>
            <div class="kanban-actions">
                <input
                    class="board-search"
                    type="search"
                    placeholder=placeholder
                    prop:value=move || search.get()
                    on:input=move |ev| search.set(event_target_value(&ev))
                />
                <button
                    class="btn-secondary kanban-header-btn"
                    title="Clear search"
                    disabled=move || search.with(String::is_empty)
                    on:click=move |_| search.set(String::new())
                >"×"</button>
            </div>
        </header>
    }
}
