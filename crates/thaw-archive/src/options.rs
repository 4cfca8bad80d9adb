use std::path::PathBuf;
use std::sync::Arc;

use thaw_fs::PermissionMode;

/// How entry permissions are applied on extraction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PermissionStrategy {
    /// `0o755` for executable entries, `0o644` otherwise (Unix only).
    #[default]
    Standard,
    /// Leave the platform defaults untouched.
    Skip,
}

impl PermissionStrategy {
    pub fn mode_for(self, executable: bool) -> PermissionMode {
        match self {
            Self::Standard => PermissionMode::from(executable),
            Self::Skip => PermissionMode::Inherit,
        }
    }
}

#[derive(Clone, Default)]
pub struct ExtractOptions {
    pub permissions: PermissionStrategy,
    pub on_progress: Option<Arc<dyn Fn(Progress) + Send + Sync>>,
}

#[derive(Clone, Debug)]
pub struct Progress {
    pub bytes_processed: u64,
    pub total_bytes: u64,
    pub current_file: PathBuf,
}

impl ExtractOptions {
    pub fn permissions(mut self, strategy: PermissionStrategy) -> Self {
        self.permissions = strategy;
        self
    }

    pub fn on_progress(mut self, callback: Arc<dyn Fn(Progress) + Send + Sync>) -> Self {
        self.on_progress = Some(callback);
        self
    }

    pub(crate) fn report(&self, progress: impl FnOnce() -> Progress) {
        if let Some(callback) = &self.on_progress {
            callback(progress());
        }
    }
}

impl Progress {
    pub fn percentage(&self) -> f32 {
        if self.total_bytes == 0 {
            100.0
        } else {
            (self.bytes_processed as f32 / self.total_bytes as f32) * 100.0
        }
    }
}
