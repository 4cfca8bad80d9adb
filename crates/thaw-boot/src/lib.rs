//! First-boot extraction of a frozen archive blob.
//!
//! A marker file inside the extraction root records that the archive has
//! been written out. The marker is read fresh on every boot and written only
//! after every entry landed, so any failed or interrupted attempt is simply
//! retried on the next boot.

mod bootstrap;
mod config;
mod error;
mod state;

pub use bootstrap::{BootOutcome, Bootstrap};
pub use config::{BootConfig, DEFAULT_MARKER, DEFAULT_MARKER_NOTE};
pub use error::{Error, Result};
pub use state::{BootEvent, BootState};
