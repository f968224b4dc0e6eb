use leptos::prelude::*;
use leptos_router::components::A;

#[component]
pub fn Home() -> impl IntoView {
    view! {
        <div class="projects-page">
            <header class="projects-header">
                <h1>"Pipeline boards"</h1>
            </header>

            <div class="projects-grid">
                <A href="/leads" attr:class="project-card">
                    <h3>"Leads"</h3>
                    <p>"Qualify incoming leads by status"</p>
                </A>
                <A href="/opportunities" attr:class="project-card">
                    <h3>"Opportunities"</h3>
                    <p>"Track deals through the sales stages"</p>
                </A>
                <A href="/projects/1/tasks" attr:class="project-card">
                    <h3>"Project tasks"</h3>
                    <p>"Tasks of the first project"</p>
                </A>
                <A href="/items" attr:class="project-card">
                    <h3>"Items"</h3>
                    <p>"Anything else with a status"</p>
                </A>
            </div>
        </div>
    }
}
