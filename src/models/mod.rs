// Data Models
pub mod outcome;
pub mod run_state;
pub mod settings;

pub use outcome::{DestinationOutcome, DestinationReport, DestinationView, RunReport};
pub use run_state::{ProgressStage, RunPhase, RunState};
pub use settings::{ArchiveSource, Credentials, Destination, Settings, UpdateConfig};
