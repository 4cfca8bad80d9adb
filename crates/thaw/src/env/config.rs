use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Contents of `thaw.toml`. Every field is optional; command-line flags
/// override whatever is set here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub pack: PackSection,
    pub boot: BootSection,
    pub manifest: ManifestSection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PackSection {
    pub source: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub codec: Option<String>,
    pub level: Option<u32>,
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BootSection {
    pub archive: Option<PathBuf>,
    pub root: Option<PathBuf>,
    pub marker: Option<PathBuf>,
    pub marker_note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ManifestSection {
    pub board_manifest: Option<String>,
    pub packages: Vec<String>,
    pub requires: Vec<String>,
    /// Blob produced by `thaw pack`.
    pub archive: PathBuf,
    /// Generated module that embeds the blob.
    pub archive_module: String,
    pub boot_module: String,
}

impl Default for ManifestSection {
    fn default() -> Self {
        Self {
            board_manifest: Some("$(BOARD_DIR)/manifest.py".to_string()),
            packages: Vec::new(),
            requires: Vec::new(),
            archive: PathBuf::from("examples.thaw"),
            archive_module: "extract_examples.py".to_string(),
            boot_module: "boot.py".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config '{}'", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid config '{}'", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_is_default() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn full_config() {
        let config = Config::parse(
            r#"
            [pack]
            source = "red_vision_examples"
            output = "build/examples.thaw"
            codec = "gzip"
            level = 9
            exclude = ["__pycache__", ".DS_Store"]

            [boot]
            root = "/flash/red_vision_examples"
            marker = "restore_examples.txt"

            [manifest]
            packages = ["red_vision"]
            requires = ["sdcard"]
            archive_module = "extract_red_vision_examples.py"
            "#,
        )
        .unwrap();

        assert_eq!(config.pack.source, Some(PathBuf::from("red_vision_examples")));
        assert_eq!(config.pack.level, Some(9));
        assert_eq!(config.pack.exclude, ["__pycache__", ".DS_Store"]);
        assert_eq!(config.boot.root, Some(PathBuf::from("/flash/red_vision_examples")));
        assert_eq!(config.boot.marker_note, None);
        assert_eq!(config.manifest.packages, ["red_vision"]);
        assert_eq!(config.manifest.archive_module, "extract_red_vision_examples.py");
        assert_eq!(config.manifest.boot_module, "boot.py");
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(Config::parse("[pack]\nsorce = \"x\"\n").is_err());
    }
}
