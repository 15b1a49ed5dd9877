// System Layer
pub mod archive;
pub mod drives;
pub mod filesystem;
pub mod locator;
pub mod network;

pub use drives::{DriveProvider, SystemDrives};
pub use network::{default_connector, NetworkConnector};
