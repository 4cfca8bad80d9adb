use thaw_archive::{
    ExtractOptions, ExtractReport, Target, extract_archive, read_archive, sanitize_entry_path,
};
use thaw_fs::PermissionMode;
use tracing::{debug, error, info, warn};

use crate::config::BootConfig;
use crate::error::{Error, Result};
use crate::state::{BootEvent, BootState};

/// Result of one boot-time run.
#[derive(Debug)]
pub enum BootOutcome {
    /// Marker present; nothing was written.
    Skipped,
    Extracted(ExtractReport),
    /// Marker left absent; the next boot retries.
    Failed(Error),
}

impl BootOutcome {
    /// Terminal state of this run.
    pub fn state(&self) -> BootState {
        match self {
            Self::Skipped | Self::Extracted(_) => BootState::Extracted,
            Self::Failed(_) => BootState::Failed,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }

    pub fn error(&self) -> Option<&Error> {
        match self {
            Self::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Self-extracting bootstrap over an embedded blob.
///
/// ```no_run
/// use thaw_archive::HostTarget;
/// use thaw_boot::{BootConfig, Bootstrap};
///
/// static EXAMPLES: &[u8] = &[]; // include_bytes!("examples.thaw")
///
/// let outcome = Bootstrap::new(EXAMPLES, BootConfig::new("/flash/examples"))
///     .run(HostTarget::new());
/// println!("examples: {}", outcome.state());
/// ```
pub struct Bootstrap<'a> {
    blob: &'a [u8],
    config: BootConfig,
    options: ExtractOptions,
}

impl<'a> Bootstrap<'a> {
    pub fn new(blob: &'a [u8], config: BootConfig) -> Self {
        Self {
            blob,
            config,
            options: ExtractOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    pub fn config(&self) -> &BootConfig {
        &self.config
    }

    /// Current state as seen from storage.
    pub fn state<T: Target>(&self, target: &T) -> BootState {
        BootState::observe(target.exists(&self.config.marker_path()))
    }

    /// Run once. Never fails: errors are logged and returned in the outcome
    /// so the rest of the boot sequence carries on.
    pub fn run<T: Target>(&self, mut target: T) -> BootOutcome {
        let marker = self.config.marker_path();
        let state = self.state(&target);

        if state == BootState::Extracted {
            debug!(marker = %marker.display(), "marker present, skipping extraction");
            return BootOutcome::Skipped;
        }

        let state = step(state, BootEvent::Start);
        info!(root = %self.config.root.display(), "marker absent, extracting archive");

        match self.extract(&mut target) {
            Ok(report) => {
                step(state, BootEvent::Completed);
                info!(
                    files = report.files,
                    bytes = report.total_bytes,
                    marker = %marker.display(),
                    "extraction complete"
                );
                BootOutcome::Extracted(report)
            }
            Err(err) => {
                step(state, BootEvent::Errored);
                error!(
                    kind = ?err.kind(),
                    error = %err,
                    "extraction failed, will retry on next boot"
                );
                BootOutcome::Failed(err)
            }
        }
    }

    /// Check that the blob is well formed and that no entry would land on
    /// the marker. Nothing is written.
    ///
    /// An entry at the marker path would mark the root as extracted before
    /// the remaining entries are written.
    pub fn validate(&self) -> Result<()> {
        let archive = read_archive(self.blob)?;
        let marker = self.config.marker_path();

        for entry in archive.entries() {
            let path = sanitize_entry_path(&entry.path, &self.config.root)
                .map_err(thaw_archive::Error::from)?;
            if path.resolved == marker {
                return Err(Error::MarkerCollision {
                    entry: entry.path.clone(),
                    marker,
                });
            }
        }
        Ok(())
    }

    fn extract<T: Target>(&self, target: &mut T) -> Result<ExtractReport> {
        self.validate()?;
        let report = extract_archive(self.blob, &self.config.root, &mut *target, &self.options)?;

        let marker = self.config.marker_path();
        if let Some(parent) = marker.parent() {
            target.create_dir_all(parent).map_err(Error::Marker)?;
        }
        target
            .write_file(&marker, self.config.marker_note.as_bytes(), PermissionMode::ReadWrite)
            .map_err(Error::Marker)?;

        Ok(report)
    }
}

fn step(state: BootState, event: BootEvent) -> BootState {
    match state.next(event) {
        Some(next) => {
            debug!(from = %state, to = %next, ?event, "boot state transition");
            next
        }
        None => {
            warn!(state = %state, ?event, "ignored invalid boot state transition");
            state
        }
    }
}
