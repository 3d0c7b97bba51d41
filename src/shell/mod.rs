pub mod menu;
pub mod render;
pub mod signals;

pub use menu::Shell;
pub use render::{render_report, render_run_error};
pub use signals::setup_interrupt_handler;
