// UI Components
pub mod command_bar;
pub mod progress_panel;
pub mod status_bar;

// Re-export components for convenience
pub use command_bar::CommandBar;
pub use progress_panel::ProgressPanel;
pub use status_bar::StatusBar;
