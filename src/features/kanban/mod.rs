pub mod components;
pub mod hooks;

pub use components::*;
pub use hooks::*;
