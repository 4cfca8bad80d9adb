use std::path::{Path, PathBuf};

pub const DEFAULT_MARKER: &str = "restore_examples.txt";

pub const DEFAULT_MARKER_NOTE: &str = "\
This folder is frozen into the firmware and was unpacked here on first boot.

It is only unpacked when this file is missing, so you can safely edit the
files here without your changes being overwritten. To restore the original
files, delete this file and reboot the board.
";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BootConfig {
    pub root: PathBuf,
    /// Relative paths are resolved against `root`.
    pub marker: PathBuf,
    pub marker_note: String,
}

impl BootConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            marker: PathBuf::from(DEFAULT_MARKER),
            marker_note: DEFAULT_MARKER_NOTE.to_string(),
        }
    }

    pub fn marker(mut self, marker: impl Into<PathBuf>) -> Self {
        self.marker = marker.into();
        self
    }

    pub fn marker_note(mut self, note: impl Into<String>) -> Self {
        self.marker_note = note.into();
        self
    }

    pub fn marker_path(&self) -> PathBuf {
        if self.marker.is_absolute() {
            self.marker.clone()
        } else {
            self.root.join(&self.marker)
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
