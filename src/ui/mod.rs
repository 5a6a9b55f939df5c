//! Ratatui front-end: the booklet pane, the collapsible search bar and the
//! terminal event loop.

mod app;
mod filters;
mod helpers;
mod sidebar;
mod terminal;

pub use app::{App, AppSettings};
pub use terminal::run_app;
