use crate::{Error, Result};
use std::path::Path;

/// File permission modes applied to extracted entries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PermissionMode {
    /// Leave whatever the platform created the file with.
    #[default]
    Inherit,

    /// Read-write file permissions.
    ///
    /// On Unix: Sets `0o644` (rw-r--r--)
    ReadWrite,

    /// Executable file permissions.
    ///
    /// On Unix: Sets `0o755` (rwxr-xr-x)
    Executable,
}

impl PermissionMode {
    pub fn to_unix_mode(self) -> Option<u32> {
        match self {
            Self::Inherit => None,
            Self::ReadWrite => Some(0o644),
            Self::Executable => Some(0o755),
        }
    }

    /// Apply this mode to `path`.
    ///
    /// A no-op for [`PermissionMode::Inherit`] and on non-Unix platforms.
    pub fn apply_to_path(self, path: &Path) -> Result<()> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = self.to_unix_mode() {
                let perms = std::fs::Permissions::from_mode(mode);
                std::fs::set_permissions(path, perms).map_err(|e| Error::Permissions {
                    path: path.to_path_buf(),
                    source: e,
                })?;
            }
        }

        #[cfg(not(unix))]
        {
            let _ = path;
        }

        Ok(())
    }
}

impl From<bool> for PermissionMode {
    /// Map an entry's executable flag to a concrete mode.
    fn from(executable: bool) -> Self {
        if executable { Self::Executable } else { Self::ReadWrite }
    }
}
