use std::fs;
use std::path::{Path, PathBuf};

use thaw_archive::{
    Archive, ArchiveWriter, BuildOptions, Codec, Error, ErrorKind, ExtractOptions, FormatError,
    HostTarget, build_archive, build_archive_to, extract_archive,
};

fn scratch(prefix: &str) -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix(prefix)
        .tempdir()
        .expect("Failed to create temp dir")
}

fn write_tree(root: &Path, files: &[(&str, &str)]) {
    for (path, contents) in files {
        let full = root.join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, contents).unwrap();
    }
}

/// Every file under `root` as (relative '/'-path, bytes), sorted.
fn snapshot(root: &Path) -> Vec<(String, Vec<u8>)> {
    fn walk(base: &Path, dir: &Path, out: &mut Vec<(String, Vec<u8>)>) {
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(base, &path, out);
            } else {
                let rel: Vec<_> = path
                    .strip_prefix(base)
                    .unwrap()
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();
                out.push((rel.join("/"), fs::read(&path).unwrap()));
            }
        }
    }
    let mut out = Vec::new();
    walk(root, root, &mut out);
    out.sort();
    out
}

fn examples_tree(root: &Path) {
    write_tree(
        root,
        &[
            ("ex01_hello_opencv.py", "import cv2 as cv\n"),
            ("ex02_camera.py", "camera.open()\n"),
            ("rv_init/__init__.py", "from . import camera\n"),
            ("rv_init/camera.py", "camera = None\n"),
            ("dvi_examples/ex01_hello_dvi.py", "print('dvi')\n"),
        ],
    );
}

#[test]
fn round_trip_reproduces_tree() {
    let codecs = if cfg!(feature = "gzip") {
        vec![Codec::None, Codec::Gzip]
    } else {
        vec![Codec::None]
    };

    for codec in codecs {
        let source = scratch("thaw-test-src-");
        let dest = scratch("thaw-test-dst-");
        examples_tree(source.path());
        fs::create_dir_all(source.path().join("empty_dir")).unwrap();

        let bundle = build_archive(source.path(), &BuildOptions::default().codec(codec))
            .expect("build failed");
        let report = extract_archive(
            &bundle.blob,
            dest.path(),
            HostTarget::new(),
            &ExtractOptions::default(),
        )
        .expect("extract failed");

        assert_eq!(report.codec, codec);
        assert_eq!(report.files, 5);
        assert_eq!(snapshot(source.path()), snapshot(dest.path()));
        assert!(dest.path().join("empty_dir").is_dir());
    }
}

#[test]
fn scenario_two_files() {
    let source = scratch("thaw-test-src-");
    let dest = scratch("thaw-test-dst-");
    write_tree(source.path(), &[("a.py", "x=1"), ("sub/b.py", "y=2")]);

    let bundle = build_archive(source.path(), &BuildOptions::default()).unwrap();
    extract_archive(&bundle.blob, dest.path(), HostTarget::new(), &ExtractOptions::default())
        .unwrap();

    assert_eq!(fs::read_to_string(dest.path().join("a.py")).unwrap(), "x=1");
    assert_eq!(
        fs::read_to_string(dest.path().join("sub").join("b.py")).unwrap(),
        "y=2"
    );
}

#[test]
fn builds_are_deterministic() {
    let source = scratch("thaw-test-src-");
    examples_tree(source.path());

    let options = BuildOptions::default();
    let first = build_archive(source.path(), &options).unwrap();
    let second = build_archive(source.path(), &options).unwrap();

    assert_eq!(first.blob, second.blob);
    assert_eq!(first.report.digest, second.report.digest);
}

#[test]
fn identical_trees_in_different_places_match() {
    let a = scratch("thaw-test-a-");
    let b = scratch("thaw-test-b-");
    examples_tree(a.path());
    examples_tree(b.path());

    let options = BuildOptions::default().codec(Codec::None);
    assert_eq!(
        build_archive(a.path(), &options).unwrap().blob,
        build_archive(b.path(), &options).unwrap().blob
    );
}

#[test]
fn parent_traversal_is_rejected() {
    let base = scratch("thaw-test-slip-");
    let root = base.path().join("root");

    let mut writer = ArchiveWriter::new(Codec::None);
    writer.add_file("../outside.py", b"evil", false);
    let blob = writer.finish().unwrap();

    let err = extract_archive(&blob, &root, HostTarget::new(), &ExtractOptions::default())
        .expect_err("traversal must fail");

    assert_eq!(err.kind(), ErrorKind::ArchiveFormat);
    assert!(matches!(err, Error::Format(FormatError::UnsafePath { .. })));
    assert!(!base.path().join("outside.py").exists());
}

#[test]
fn absolute_entry_is_rejected() {
    let base = scratch("thaw-test-abs-");

    let mut writer = ArchiveWriter::new(Codec::None);
    writer.add_file("/tmp/thaw-absolute.py", b"evil", false);
    let blob = writer.finish().unwrap();

    let err = extract_archive(&blob, base.path(), HostTarget::new(), &ExtractOptions::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ArchiveFormat);
}

#[test]
fn corrupted_payload_is_format_error() {
    let source = scratch("thaw-test-src-");
    let dest = scratch("thaw-test-dst-");
    examples_tree(source.path());

    let mut blob = build_archive(source.path(), &BuildOptions::default()).unwrap().blob;
    let middle = blob.len() - 4;
    blob[middle] ^= 0x5A;

    let err = extract_archive(&blob, dest.path(), HostTarget::new(), &ExtractOptions::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ArchiveFormat);
    assert!(snapshot(dest.path()).is_empty());
}

#[test]
fn extraction_overwrites_existing_files() {
    let source = scratch("thaw-test-src-");
    let dest = scratch("thaw-test-dst-");
    write_tree(source.path(), &[("a.py", "x=1")]);
    write_tree(dest.path(), &[("a.py", "old"), ("user.py", "mine")]);

    let bundle = build_archive(source.path(), &BuildOptions::default()).unwrap();
    extract_archive(&bundle.blob, dest.path(), HostTarget::new(), &ExtractOptions::default())
        .unwrap();

    assert_eq!(fs::read_to_string(dest.path().join("a.py")).unwrap(), "x=1");
    assert_eq!(fs::read_to_string(dest.path().join("user.py")).unwrap(), "mine");
}

#[test]
fn build_to_file_and_parse() {
    let source = scratch("thaw-test-src-");
    let out = scratch("thaw-test-out-");
    examples_tree(source.path());
    let output: PathBuf = out.path().join("nested").join("examples.thaw");

    let report = build_archive_to(source.path(), &output, &BuildOptions::default()).unwrap();

    let blob = fs::read(&output).unwrap();
    assert_eq!(report.blob_bytes, blob.len() as u64);
    let archive = Archive::parse(&blob).unwrap();
    assert_eq!(archive.header().digest_hex(), report.digest);
    assert_eq!(report.files + report.directories, archive.entries().len());
}

#[test]
fn missing_source_produces_no_artifact() {
    let out = scratch("thaw-test-out-");
    let output = out.path().join("examples.thaw");

    let err = build_archive_to(out.path().join("missing"), &output, &BuildOptions::default())
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(!output.exists());
}

#[cfg(unix)]
#[test]
fn unreadable_file_aborts_build() {
    use std::os::unix::fs::PermissionsExt;

    let source = scratch("thaw-test-src-");
    let out = scratch("thaw-test-out-");
    write_tree(source.path(), &[("a.py", "x=1"), ("secret.py", "no")]);
    let secret = source.path().join("secret.py");
    fs::set_permissions(&secret, fs::Permissions::from_mode(0o000)).unwrap();

    // Root can read anything; the check is meaningless there.
    if fs::read(&secret).is_ok() {
        return;
    }

    let output = out.path().join("examples.thaw");
    let err = build_archive_to(source.path(), &output, &BuildOptions::default()).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Io);
    assert!(!output.exists());
}

#[cfg(unix)]
#[test]
fn executable_flag_survives_round_trip() {
    use std::os::unix::fs::PermissionsExt;

    let source = scratch("thaw-test-src-");
    let dest = scratch("thaw-test-dst-");
    write_tree(source.path(), &[("tool.sh", "#!/bin/sh\n"), ("a.py", "x=1")]);
    fs::set_permissions(source.path().join("tool.sh"), fs::Permissions::from_mode(0o755)).unwrap();
    fs::set_permissions(source.path().join("a.py"), fs::Permissions::from_mode(0o644)).unwrap();

    let bundle = build_archive(source.path(), &BuildOptions::default()).unwrap();
    extract_archive(&bundle.blob, dest.path(), HostTarget::new(), &ExtractOptions::default())
        .unwrap();

    let mode = |p: &str| fs::metadata(dest.path().join(p)).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode("tool.sh"), 0o755);
    assert_eq!(mode("a.py"), 0o644);
}
