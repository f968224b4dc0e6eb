use leptos::prelude::*;
use leptos_router::components::{Route, Router, Routes, A};
use leptos_router::path;

use crate::components::{ToastHost, Toaster};
use crate::core::config::AppSettings;
use crate::core::services::AppServices;
use crate::pages::{Home, ItemsPage, LeadsPage, OpportunitiesPage, ProjectTasksPage};

#[component]
pub fn App(settings: AppSettings) -> impl IntoView {
    let toaster = Toaster::new(settings.toast_duration_ms);
    let services = AppServices::new(settings);

    provide_context(services);
    provide_context(toaster);

    view! {
        <Router>
            <nav class="app-nav">
                <A href="/">"Boards"</A>
                <A href="/leads">"Leads"</A>
                <A href="/opportunities">"Opportunities"</A>
                <A href="/items">"Items"</A>
            </nav>
            <main class="app">
                <Routes fallback=|| view! { <p class="board-error">"Page not found."</p> }>
                    <Route path=path!("/") view=Home />
                    <Route path=path!("/leads") view=LeadsPage />
                    <Route path=path!("/opportunities") view=OpportunitiesPage />
                    <Route path=path!("/projects/:id/tasks") view=ProjectTasksPage />
                    <Route path=path!("/items") view=ItemsPage />
                </Routes>
            </main>
            <ToastHost />
        </Router>
    }
}
