//! Terminal User Interface for the traffic dashboard

mod app;
pub mod panels;
mod ui;

pub use app::{Command, TuiApp, TuiEvent};
pub use ui::draw;
