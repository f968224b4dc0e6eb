pub mod app_services;
pub mod events;
pub mod http;

pub use app_services::*;
pub use events::*;
pub use http::*;
