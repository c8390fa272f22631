pub mod api;
pub mod history;
