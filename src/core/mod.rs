// Core Logic
pub mod actions;
pub mod orchestrator;
pub mod reporter;

pub use orchestrator::{check_destinations, UpdateOrchestrator};
pub use reporter::{ChannelReporter, UpdateEvent};
