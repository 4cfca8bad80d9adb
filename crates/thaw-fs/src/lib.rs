//! Atomic filesystem primitives.
//!
//! Every file an extraction produces goes through [`atomic_write`], so a
//! power loss mid-write leaves either the previous file or the new one,
//! never a torn mix of both.

mod error;
pub mod permissions;
pub mod primitives;

pub use error::{Error, Result};
pub use permissions::PermissionMode;
pub use primitives::{AtomicWriteOptions, atomic_read, atomic_write, ensure_dir};
