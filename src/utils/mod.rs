// Utilities
pub mod cancel;
pub mod error;
pub mod formatter;
pub mod glob;
pub mod logging;
