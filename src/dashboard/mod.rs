//! Terminal dashboard for a running or finished build.

mod error;
mod input;
mod render;
mod renderer;
mod terminal;
mod widgets;

pub use error::DashboardError;
pub use input::*;
pub use render::*;
pub use renderer::*;
pub use terminal::*;
pub use widgets::*;
