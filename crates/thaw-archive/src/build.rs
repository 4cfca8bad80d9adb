use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::archive::{Archive, ArchiveWriter};
use crate::error::{Error, Result};
use crate::format::Codec;

#[derive(Clone, Debug, Default)]
pub struct BuildOptions {
    pub codec: Codec,
    pub level: Option<u32>,
    /// File or directory names skipped anywhere in the tree.
    pub exclude: Vec<String>,
}

impl BuildOptions {
    pub fn codec(mut self, codec: Codec) -> Self {
        self.codec = codec;
        self
    }

    pub fn level(mut self, level: u32) -> Self {
        self.level = Some(level);
        self
    }

    pub fn exclude(mut self, name: impl Into<String>) -> Self {
        self.exclude.push(name.into());
        self
    }

    fn is_excluded(&self, entry: &DirEntry) -> bool {
        let name = entry.file_name().to_str();
        self.exclude.iter().any(|x| name == Some(x.as_str()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildReport {
    pub codec: Codec,
    pub files: usize,
    pub directories: usize,
    pub unpacked_bytes: u64,
    pub stored_bytes: u64,
    pub blob_bytes: u64,
    pub digest: String,
}

/// A freshly built blob with its summary.
#[derive(Clone, Debug)]
pub struct Bundle {
    pub blob: Vec<u8>,
    pub report: BuildReport,
}

/// Walk `source` and encode its contents into a blob.
///
/// Siblings are visited in file-name order and directories precede their
/// contents, so an unchanged tree always yields the same bytes. Symlinks are
/// followed. Any unreadable file aborts the whole build.
pub fn build_archive(source: impl AsRef<Path>, options: &BuildOptions) -> Result<Bundle> {
    build(source.as_ref(), options, None)
}

/// Build a blob and write it atomically to `output`.
///
/// If `output` lies inside `source`, it is left out of the walk so that
/// rebuilding in place stays reproducible.
pub fn build_archive_to(
    source: impl AsRef<Path>,
    output: impl AsRef<Path>,
    options: &BuildOptions,
) -> Result<BuildReport> {
    let source = source.as_ref();
    let output = output.as_ref();

    let bundle = build(source, options, Some(output))?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        thaw_fs::ensure_dir(parent)?;
    }
    thaw_fs::atomic_write(output, &bundle.blob, thaw_fs::AtomicWriteOptions::new().sync(true))?;

    info!(
        output = %output.display(),
        bytes = bundle.report.blob_bytes,
        digest = %bundle.report.digest,
        "archive written"
    );
    Ok(bundle.report)
}

fn build(source: &Path, options: &BuildOptions, skip: Option<&Path>) -> Result<Bundle> {
    let metadata = fs::metadata(source).map_err(|e| {
        Error::Configuration(format!(
            "source directory '{}' is not accessible: {e}",
            source.display()
        ))
    })?;
    if !metadata.is_dir() {
        return Err(Error::Configuration(format!(
            "source '{}' is not a directory",
            source.display()
        )));
    }
    if !options.codec.is_enabled() {
        return Err(Error::Configuration(format!(
            "codec '{}' is not enabled in this build",
            options.codec
        )));
    }

    let mut writer = ArchiveWriter::new(options.codec);
    if let Some(level) = options.level {
        writer = writer.level(level);
    }

    let walker = WalkDir::new(source)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !options.is_excluded(e));

    for item in walker {
        let item = item.map_err(|e| walk_error(e, source))?;
        if skip.is_some_and(|s| same_path(s, item.path())) {
            warn!(path = %item.path().display(), "skipping output file inside source tree");
            continue;
        }

        let relative = entry_path(source, item.path())?;
        let file_type = item.file_type();

        if file_type.is_dir() {
            debug!(path = %relative, "add directory");
            writer.add_directory(relative);
        } else if file_type.is_file() {
            let contents = fs::read(item.path()).map_err(|e| Error::Io {
                path: item.path().to_path_buf(),
                source: e,
            })?;
            let executable = is_executable(&item)?;
            debug!(path = %relative, size = contents.len(), executable, "add file");
            writer.add_file(relative, &contents, executable);
        } else {
            warn!(path = %item.path().display(), "skipping special file");
        }
    }

    let blob = writer.finish()?;
    let report = summarize(&blob)?;

    info!(
        source = %source.display(),
        files = report.files,
        directories = report.directories,
        unpacked = report.unpacked_bytes,
        stored = report.stored_bytes,
        codec = %report.codec,
        "archive built"
    );

    Ok(Bundle { blob, report })
}

fn summarize(blob: &[u8]) -> Result<BuildReport> {
    let archive = Archive::parse(blob)?;
    let header = archive.header();
    let files = archive.entries().iter().filter(|e| e.is_file()).count();

    Ok(BuildReport {
        codec: header.codec,
        files,
        directories: archive.entries().len() - files,
        unpacked_bytes: header.unpacked_size,
        stored_bytes: header.stored_size,
        blob_bytes: blob.len() as u64,
        digest: header.digest_hex(),
    })
}

/// Convert a walked path into a `/`-separated entry path relative to `source`.
fn entry_path(source: &Path, path: &Path) -> Result<String> {
    let relative = path.strip_prefix(source).map_err(|_| {
        Error::Configuration(format!(
            "'{}' is not inside '{}'",
            path.display(),
            source.display()
        ))
    })?;

    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                let part = part.to_str().ok_or_else(|| {
                    Error::Configuration(format!("path '{}' is not valid UTF-8", path.display()))
                })?;
                segments.push(part);
            }
            _ => {
                return Err(Error::Configuration(format!(
                    "unexpected component in '{}'",
                    path.display()
                )));
            }
        }
    }

    let joined = segments.join("/");
    if joined.len() > u16::MAX as usize {
        return Err(Error::Configuration(format!(
            "path '{}' is longer than 65535 bytes",
            path.display()
        )));
    }
    Ok(joined)
}

#[cfg(unix)]
fn is_executable(entry: &DirEntry) -> Result<bool> {
    use std::os::unix::fs::PermissionsExt;
    let metadata = entry.metadata().map_err(|e| walk_error(e, entry.path()))?;
    Ok(metadata.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(_entry: &DirEntry) -> Result<bool> {
    Ok(false)
}

fn walk_error(err: walkdir::Error, fallback: &Path) -> Error {
    let path = err.path().unwrap_or(fallback).to_path_buf();
    if let Some(ancestor) = err.loop_ancestor() {
        return Error::Configuration(format!(
            "symlink loop at '{}' back to '{}'",
            path.display(),
            ancestor.display()
        ));
    }
    Error::Io {
        path,
        source: err.into(),
    }
}

fn same_path(a: &Path, b: &Path) -> bool {
    let canonical = |p: &Path| -> Option<PathBuf> { p.canonicalize().ok() };
    match (canonical(a), canonical(b)) {
        (Some(a), Some(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn tree(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        for (path, contents) in files {
            let full = dir.path().join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(full, contents).unwrap();
        }
        dir
    }

    fn paths(blob: &[u8]) -> Vec<String> {
        Archive::parse(blob)
            .unwrap()
            .entries()
            .iter()
            .map(|e| e.path.clone())
            .collect()
    }

    #[test]
    fn entries_are_sorted_with_directories_first() {
        let dir = tree(&[("z.py", "z"), ("sub/b.py", "b"), ("a.py", "a"), ("sub/a.py", "a")]);
        let bundle = build_archive(dir.path(), &BuildOptions::default()).unwrap();
        assert_eq!(paths(&bundle.blob), ["a.py", "sub", "sub/a.py", "sub/b.py", "z.py"]);
        assert_eq!(bundle.report.files, 4);
        assert_eq!(bundle.report.directories, 1);
        assert_eq!(bundle.report.unpacked_bytes, 4);
    }

    #[test]
    fn exclude_skips_names_anywhere() {
        let dir = tree(&[
            ("a.py", "a"),
            ("__pycache__/a.mpy", "c"),
            ("sub/__pycache__/b.mpy", "c"),
            ("sub/b.py", "b"),
        ]);
        let options = BuildOptions::default().exclude("__pycache__");
        let bundle = build_archive(dir.path(), &options).unwrap();
        assert_eq!(paths(&bundle.blob), ["a.py", "sub", "sub/b.py"]);
    }

    #[test]
    fn missing_source_is_configuration_error() {
        let dir = tempdir().unwrap();
        let err = build_archive(dir.path().join("nope"), &BuildOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn file_source_is_configuration_error() {
        let dir = tree(&[("a.py", "a")]);
        let err = build_archive(dir.path().join("a.py"), &BuildOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn output_inside_source_is_skipped() {
        let dir = tree(&[("a.py", "x=1")]);
        let output = dir.path().join("examples.thaw");
        let options = BuildOptions::default().codec(Codec::None);

        build_archive_to(dir.path(), &output, &options).unwrap();
        let first = fs::read(&output).unwrap();
        build_archive_to(dir.path(), &output, &options).unwrap();
        let second = fs::read(&output).unwrap();

        assert_eq!(first, second);
        assert_eq!(paths(&second), ["a.py"]);
    }

    #[cfg(unix)]
    #[test]
    fn executable_bit_is_recorded() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tree(&[("run.sh", "#!/bin/sh"), ("a.py", "a")]);
        fs::set_permissions(dir.path().join("run.sh"), fs::Permissions::from_mode(0o755)).unwrap();
        fs::set_permissions(dir.path().join("a.py"), fs::Permissions::from_mode(0o644)).unwrap();

        let bundle = build_archive(dir.path(), &BuildOptions::default()).unwrap();
        let archive = Archive::parse(&bundle.blob).unwrap();
        let flags: Vec<_> = archive.entries().iter().map(|e| (e.path.as_str(), e.executable)).collect();
        assert_eq!(flags, [("a.py", false), ("run.sh", true)]);
    }

    #[test]
    fn entry_path_uses_forward_slashes() {
        let source = Path::new("root");
        let path = source.join("sub").join("b.py");
        assert_eq!(entry_path(source, &path).unwrap(), "sub/b.py");
    }
}
