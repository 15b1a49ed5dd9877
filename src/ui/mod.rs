// UI Layer
pub mod components;
pub mod theme;

pub use components::{CommandBar, ProgressPanel, StatusBar};
pub use theme::{Theme, ThemeMode};
