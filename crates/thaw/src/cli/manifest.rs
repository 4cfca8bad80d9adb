use anyhow::{Context, Result, anyhow, bail};
use clap::Args;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use thaw_archive::{Codec, read_archive};
use thaw_boot::{BootConfig, Bootstrap};

use crate::env::{Config, ManifestSection};

const MANIFEST_FILE: &str = "manifest.py";
const EXTRACT_TEMPLATE: &str = include_str!("../../templates/extract.py");
const BOOT_TEMPLATE: &str = include_str!("../../templates/boot.py");

#[derive(Args, Clone, Debug, Default)]
pub struct ManifestArg {
    #[arg(long, help = "Archive blob to freeze (default: [manifest].archive)")]
    archive: Option<PathBuf>,
    #[arg(short = 'd', long, help = "Directory for manifest.py and the generated modules (default: .)")]
    out_dir: Option<PathBuf>,
    #[arg(long, help = "Print the manifest instead of writing manifest.py")]
    stdout: bool,
}

/// The set of modules frozen into the firmware image.
///
/// `modules` stays empty until the archive has been built, so a firmware
/// build without examples still works.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreezeManifest {
    pub board_manifest: Option<String>,
    pub packages: Vec<String>,
    pub requires: Vec<String>,
    pub modules: Vec<String>,
}

impl From<&ManifestSection> for FreezeManifest {
    fn from(section: &ManifestSection) -> Self {
        Self {
            board_manifest: section.board_manifest.clone(),
            packages: section.packages.clone(),
            requires: section.requires.clone(),
            modules: Vec::new(),
        }
    }
}

impl FreezeManifest {
    pub fn render(&self) -> String {
        let mut out = String::from("# Generated by thaw. Do not edit.\n");

        if let Some(board) = &self.board_manifest {
            let _ = writeln!(out, "include({})", quote(board));
        }
        for package in &self.packages {
            let _ = writeln!(out, "package({})", quote(package));
        }
        for module in &self.requires {
            let _ = writeln!(out, "require({})", quote(module));
        }

        if self.modules.is_empty() {
            out.push_str("# archive not built; examples are not frozen\n");
        }
        for module in &self.modules {
            let _ = writeln!(out, "module({})", quote(module));
        }
        out
    }
}

/// The Python modules that carry an archive into the firmware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrozenModules {
    /// `(file name, source)` of the module embedding the blob.
    pub archive: (String, String),
    /// `(file name, source)` of the boot script that runs it.
    pub boot: (String, String),
}

impl FrozenModules {
    /// Render both modules for `blob`.
    ///
    /// The blob is checked the same way the bootstrap checks it, and must use
    /// a codec the device can decode.
    pub fn render(blob: &[u8], section: &ManifestSection, boot: &BootConfig) -> Result<Self> {
        let codec = read_archive(blob).context("Invalid archive")?.codec();
        if !matches!(codec, Codec::None | Codec::Gzip) {
            bail!("Codec '{codec}' cannot be decoded on the device, pack with gzip or none");
        }
        Bootstrap::new(blob, boot.clone())
            .validate()
            .context("Archive cannot be frozen")?;

        let module = module_name(&section.archive_module)?;
        let root = device_path(&boot.root)?;
        let marker = device_path(&boot.marker_path())?;
        let marker_dir = match marker.rsplit_once('/') {
            Some((dir, _)) if !dir.is_empty() => dir.to_string(),
            _ => ".".to_string(),
        };

        let archive_source = EXTRACT_TEMPLATE
            .replace("@ROOT@", &quote(&root))
            .replace("@BLOB@", &py_bytes(blob));
        let boot_source = BOOT_TEMPLATE
            .replace("@MODULE@", module)
            .replace("@MARKER_DIR@", &quote(&marker_dir))
            .replace("@MARKER@", &quote(&marker))
            .replace("@NOTE@", &quote(&boot.marker_note))
            .replace("@ROOT@", &quote(&root));

        Ok(Self {
            archive: (section.archive_module.clone(), archive_source),
            boot: (section.boot_module.clone(), boot_source),
        })
    }

    pub fn write(&self, dir: &Path) -> Result<Vec<String>> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create '{}'", dir.display()))?;
        let mut names = Vec::new();
        for (name, source) in [&self.archive, &self.boot] {
            write_file(&dir.join(name), source)?;
            names.push(name.clone());
        }
        Ok(names)
    }
}

/// Python module name for a `.py` file name.
fn module_name(file: &str) -> Result<&str> {
    let stem = file
        .strip_suffix(".py")
        .ok_or_else(|| anyhow!("Frozen module '{file}' must end in .py"))?;
    let valid = stem
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && stem.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        bail!("'{stem}' is not a valid Python module name");
    }
    Ok(stem)
}

/// Device paths are always `/`-separated.
fn device_path(path: &Path) -> Result<String> {
    let path = path
        .to_str()
        .ok_or_else(|| anyhow!("Path '{}' is not valid UTF-8", path.display()))?
        .replace('\\', "/");
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        Ok(path)
    } else {
        Ok(trimmed.to_string())
    }
}

fn quote(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('"');
    for c in s.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

/// Python bytes literal, split over lines of 64 bytes.
fn py_bytes(data: &[u8]) -> String {
    if data.is_empty() {
        return "b''".to_string();
    }
    let mut out = String::from("(\n");
    for chunk in data.chunks(64) {
        out.push_str("    b'");
        for &b in chunk {
            match b {
                b'\\' => out.push_str("\\\\"),
                b'\'' => out.push_str("\\'"),
                0x20..=0x7e => out.push(b as char),
                _ => {
                    let _ = write!(out, "\\x{b:02x}");
                }
            }
        }
        out.push_str("'\n");
    }
    out.push(')');
    out
}

fn boot_config(config: &Config, archive: &Path) -> Result<BootConfig> {
    let root = match &config.boot.root {
        Some(root) => root.clone(),
        None => archive
            .file_stem()
            .map(PathBuf::from)
            .ok_or_else(|| anyhow!("No [boot].root set and '{}' has no file name", archive.display()))?,
    };
    let mut boot = BootConfig::new(root);
    if let Some(marker) = &config.boot.marker {
        boot = boot.marker(marker.clone());
    }
    if let Some(note) = &config.boot.marker_note {
        boot = boot.marker_note(note.clone());
    }
    Ok(boot)
}

pub fn manifest(arg: ManifestArg, config: &Config) -> Result<()> {
    let section = &config.manifest;
    let archive = arg.archive.unwrap_or_else(|| section.archive.clone());
    let out_dir = arg.out_dir.unwrap_or_else(|| PathBuf::from("."));

    let mut manifest = FreezeManifest::from(section);
    if archive.is_file() {
        let blob = std::fs::read(&archive)
            .with_context(|| format!("Failed to read '{}'", archive.display()))?;
        let modules = FrozenModules::render(&blob, section, &boot_config(config, &archive)?)
            .with_context(|| format!("Failed to freeze '{}'", archive.display()))?;
        manifest.modules = modules.write(&out_dir)?;
        tracing::info!(dir = %out_dir.display(), modules = ?manifest.modules, "frozen modules written");
    } else {
        tracing::warn!(archive = %archive.display(), "archive not found, leaving it out of the manifest");
    }

    let text = manifest.render();
    if arg.stdout {
        print!("{text}");
        return Ok(());
    }
    let path = out_dir.join(MANIFEST_FILE);
    write_file(&path, &text)?;
    println!("wrote {}", path.display());
    Ok(())
}

fn write_file(path: &Path, text: &str) -> Result<()> {
    std::fs::write(path, text).with_context(|| format!("Failed to write '{}'", path.display()))
}
