use std::path::Path;

use thaw_fs::{AtomicWriteOptions, PermissionMode};

/// Filesystem primitives the extractor writes through.
///
/// Paths handed to a target are already sanitized and resolved under the
/// extraction root.
pub trait Target {
    fn exists(&self, path: &Path) -> bool;
    fn create_dir_all(&mut self, path: &Path) -> thaw_fs::Result<()>;
    fn write_file(&mut self, path: &Path, contents: &[u8], mode: PermissionMode) -> thaw_fs::Result<()>;
}

/// The local filesystem. Files are written atomically.
#[derive(Clone, Copy, Debug, Default)]
pub struct HostTarget {
    sync: bool,
}

impl HostTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flush every file to stable storage before it is renamed into place.
    pub fn sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }
}

impl Target for HostTarget {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir_all(&mut self, path: &Path) -> thaw_fs::Result<()> {
        thaw_fs::ensure_dir(path)
    }

    fn write_file(&mut self, path: &Path, contents: &[u8], mode: PermissionMode) -> thaw_fs::Result<()> {
        let options = AtomicWriteOptions::new().permissions(mode).sync(self.sync);
        thaw_fs::atomic_write(path, contents, options)
    }
}

impl<T: Target + ?Sized> Target for &mut T {
    fn exists(&self, path: &Path) -> bool {
        (**self).exists(path)
    }

    fn create_dir_all(&mut self, path: &Path) -> thaw_fs::Result<()> {
        (**self).create_dir_all(path)
    }

    fn write_file(&mut self, path: &Path, contents: &[u8], mode: PermissionMode) -> thaw_fs::Result<()> {
        (**self).write_file(path, contents, mode)
    }
}
