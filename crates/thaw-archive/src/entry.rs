use crate::error::FormatError;

const FLAG_DIRECTORY: u8 = 0b0000_0001;
const FLAG_EXECUTABLE: u8 = 0b0000_0010;
const KNOWN_FLAGS: u8 = FLAG_DIRECTORY | FLAG_EXECUTABLE;

/// One manifest record of an archive.
///
/// `path` is relative and always uses `/` as separator, independent of the
/// platform the archive was built on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    pub path: String,
    pub kind: EntryKind,
    pub executable: bool,
    pub size: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

impl Entry {
    pub fn file(path: impl Into<String>, size: u64, executable: bool) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::File,
            executable,
            size,
        }
    }

    pub fn directory(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Directory,
            executable: false,
            size: 0,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self.kind, EntryKind::File)
    }

    pub fn is_directory(&self) -> bool {
        matches!(self.kind, EntryKind::Directory)
    }

    pub fn flags(&self) -> u8 {
        let mut flags = 0;
        if self.is_directory() {
            flags |= FLAG_DIRECTORY;
        }
        if self.executable {
            flags |= FLAG_EXECUTABLE;
        }
        flags
    }

    /// Rebuild an entry from its on-disk manifest fields.
    pub fn from_flags(path: String, flags: u8, size: u64) -> Result<Self, FormatError> {
        if flags & !KNOWN_FLAGS != 0 {
            return Err(FormatError::UnknownFlags { path, flags });
        }
        let kind = if flags & FLAG_DIRECTORY != 0 {
            EntryKind::Directory
        } else {
            EntryKind::File
        };
        if kind == EntryKind::Directory && size != 0 {
            return Err(FormatError::DirectoryWithSize { path, size });
        }
        Ok(Self {
            path,
            kind,
            executable: flags & FLAG_EXECUTABLE != 0,
            size,
        })
    }
}
