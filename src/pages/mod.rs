pub mod boards;
pub mod home;

pub use boards::{ItemsPage, LeadsPage, OpportunitiesPage, ProjectTasksPage};
pub use home::Home;
