//! Configuration schema for scopecss
//!
//! Configuration is stored at `~/.config/scopecss/config.toml`, optionally
//! overridden per project by a `.scopecss.toml`.

use crate::error::{ScopeError, ScopeResult};
use crate::hash::{DigestEncoding, HashAlgorithm, HashMode, HashSpec};
use crate::naming::NamingConfig;
use crate::template::{HashSettings, Template};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Name template settings
    pub naming: NamingSection,

    /// Hash placeholder defaults
    pub hash: HashSection,

    /// Project layout
    pub project: ProjectConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Name template settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingSection {
    /// Template for scoped names
    pub template: String,

    /// Regex matched against the stylesheet path for `[N]` placeholders
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_regex: Option<String>,
}

impl Default for NamingSection {
    fn default() -> Self {
        Self {
            template: Template::DEFAULT.to_string(),
            path_regex: None,
        }
    }
}

/// Hash defaults applied to every hash placeholder
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HashSection {
    /// md4, md5, sha1, sha256, sha512, blake3 or xxhash64
    pub algorithm: String,

    /// hex, base64, base64url, base26/32/36/49/52/58/62
    pub encoding: String,

    /// Characters kept from the digest; 0 keeps the whole digest
    pub length: usize,

    /// Mixed into every digest ahead of the content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,

    /// "tiered" (default) or "single"
    pub mode: HashMode,
}

impl Default for HashSection {
    fn default() -> Self {
        let spec = HashSpec::default();
        Self {
            algorithm: spec.algorithm.to_string(),
            encoding: spec.encoding.to_string(),
            length: spec.length.unwrap_or(0),
            salt: None,
            mode: HashMode::default(),
        }
    }
}

impl HashSection {
    /// Validated hash settings
    pub fn settings(&self) -> ScopeResult<HashSettings> {
        let algorithm: HashAlgorithm = self.algorithm.parse()?;
        let encoding: DigestEncoding = self.encoding.parse()?;
        Ok(HashSettings {
            defaults: HashSpec {
                algorithm,
                encoding,
                length: (self.length > 0).then_some(self.length),
            },
            salt: self.salt.clone(),
            mode: self.mode,
        })
    }
}

/// Project layout settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Base directory for `[path]` and hashes; relative paths are taken
    /// from the directory the command runs in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
}

impl Config {
    /// Whether logs should be emitted as JSON
    pub fn json_logs(&self) -> bool {
        self.general.log_format.eq_ignore_ascii_case("json")
    }

    /// Validate the naming sections into a [`NamingConfig`].
    ///
    /// `base_dir` is the project root when none is configured and anchors a
    /// relative configured root.
    pub fn naming_config(&self, base_dir: &Path) -> ScopeResult<NamingConfig> {
        let template = Template::parse(&self.naming.template)?;
        let hash = self.hash.settings()?;
        let root = match &self.project.root {
            Some(root) => base_dir.join(root),
            None => base_dir.to_path_buf(),
        };

        let mut naming = NamingConfig::new(root).with_template(template).with_hash(hash);
        if let Some(pattern) = &self.naming.path_regex {
            let regex = Regex::new(pattern).map_err(|e| {
                ScopeError::config(format!("invalid naming.path_regex '{}': {}", pattern, e))
            })?;
            naming = naming.with_path_regex(regex);
        }
        Ok(naming)
    }
}
