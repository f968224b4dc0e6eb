mod app;
mod components;
mod core;
mod features;
mod pages;

use leptos::prelude::*;

use crate::app::App;
use crate::core::config::load_app_settings;
use crate::core::logging;

fn main() {
    console_error_panic_hook::set_once();

    let settings = load_app_settings();
    logging::init(&settings.log_level);
    log::info!("Starting kanban boards against {}", settings.api_base);

    mount_to_body(move || view! { <App settings=settings /> });
}
