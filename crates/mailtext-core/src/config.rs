use std::{fs, path::Path, path::PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;

use crate::entities::NumericPolicy;
use crate::error::ConvertError;

pub const QUALIFIER: &str = "com";
pub const ORGANIZATION: &str = "mailtext";
pub const APPLICATION: &str = "mailtext";

pub const DEFAULT_LINK_URL_LIMIT: usize = 50;

pub fn config_root() -> Option<PathBuf> {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION).map(|p| p.config_dir().to_path_buf())
}

/// Knobs for a single conversion. Every field has a default, so a partial
/// `[convert]` table in `config.toml` is enough.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ConvertOptions {
    /// Maximum number of graphemes of a bare URL shown in a link annotation.
    pub link_url_limit: usize,
    /// Show `text [Link: url]` instead of `text [Link]`.
    pub show_link_targets: bool,
    /// Prefix only the first line of a blockquote with `> `.
    pub quote_first_line_only: bool,
    /// Decode numeric references outside printable ASCII.
    pub full_numeric_entities: bool,
    pub dedupe_lines: bool,
    /// Skip the tree walker and always use the pattern converter.
    pub force_fallback: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            link_url_limit: DEFAULT_LINK_URL_LIMIT,
            show_link_targets: false,
            quote_first_line_only: false,
            full_numeric_entities: false,
            dedupe_lines: true,
            force_fallback: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    convert: ConvertOptions,
}

impl ConvertOptions {
    pub fn numeric_policy(&self) -> NumericPolicy {
        if self.full_numeric_entities {
            NumericPolicy::Unicode
        } else {
            NumericPolicy::PrintableAscii
        }
    }

    /// Parse options from the `[convert]` table of a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConvertError> {
        let file: ConfigFile = toml::from_str(text)?;
        Ok(file.convert)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConvertError> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Load `config.toml` from the platform config dir. A missing file yields
    /// the defaults; a malformed one is an error.
    pub fn load() -> Result<Self, ConvertError> {
        let Some(root) = config_root() else {
            return Ok(Self::default());
        };
        let path = root.join("config.toml");
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::from_path(&path)
    }
}
