//! Name templates
//!
//! A template such as `[path]___[name]__[local]___[hash:base64:5]` is
//! parsed once into an ordered list of segments. Placeholder names are
//! case-insensitive; unrecognised bracketed tokens are kept as literal text.
//!
//! | Placeholder | Expands to |
//! |-------------|------------|
//! | `[path]` | root-relative directory with trailing `/` |
//! | `[name]` | file name without extension |
//! | `[ext]` | extension including the dot |
//! | `[file]` | root-relative file path |
//! | `[folder]` | name of the containing directory |
//! | `[package]` | name from the closest `package.json` |
//! | `[local]` | the local class name |
//! | `[hash]`, `[contenthash]`, `[fullhash]` | digest of path and local name |
//! | `[N]` | capture group N of the path regex |

pub mod interpolate;

pub use interpolate::{interpolate, Expansion, HashSettings, RequestContext};

use crate::error::{ScopeError, ScopeResult};
use crate::hash::{DigestEncoding, HashAlgorithm, HashSpec};
use std::fmt;
use std::str::FromStr;

/// Per-placeholder overrides of the configured hash parameters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HashOverrides {
    pub algorithm: Option<HashAlgorithm>,
    pub encoding: Option<DigestEncoding>,
    pub length: Option<usize>,
}

impl HashOverrides {
    /// Apply the overrides on top of the configured defaults
    pub fn resolve(&self, defaults: &HashSpec) -> HashSpec {
        HashSpec {
            algorithm: self.algorithm.unwrap_or(defaults.algorithm),
            encoding: self.encoding.unwrap_or(defaults.encoding),
            length: self.length.or(defaults.length),
        }
    }
}

/// One parsed piece of a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Path,
    Name,
    Ext,
    File,
    Folder,
    Package,
    Local,
    Hash(HashOverrides),
    Capture(usize),
}

/// A parsed name template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Default template, matching the historical plugin output
    pub const DEFAULT: &'static str = "[path]___[name]__[local]___[hash:base64:5]";

    /// Parse a template string
    pub fn parse(source: &str) -> ScopeResult<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = source;

        while let Some(open) = rest.find('[') {
            literal.push_str(&rest[..open]);
            let after_open = &rest[open + 1..];

            let Some(close) = after_open.find(']') else {
                literal.push_str(&rest[open..]);
                rest = "";
                break;
            };

            let inner = &after_open[..close];
            // A placeholder starts at the last `[` before its `]`
            if let Some(nested) = inner.rfind('[') {
                literal.push('[');
                literal.push_str(&inner[..nested]);
                rest = &after_open[nested..];
                continue;
            }
            match parse_placeholder(inner, source)? {
                Some(segment) => {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(segment);
                }
                None => {
                    literal.push('[');
                    literal.push_str(inner);
                    literal.push(']');
                }
            }
            rest = &after_open[close + 1..];
        }

        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// The template as written
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Parsed segments in template order
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Whether expanding this template needs a `package.json` lookup
    pub fn needs_package(&self) -> bool {
        self.segments.iter().any(|s| matches!(s, Segment::Package))
    }
}

impl Default for Template {
    fn default() -> Self {
        // The default template is static and always parses
        Self::parse(Self::DEFAULT).unwrap_or_else(|_| Self {
            source: Self::DEFAULT.to_string(),
            segments: Vec::new(),
        })
    }
}

impl FromStr for Template {
    type Err = ScopeError;

    fn from_str(s: &str) -> ScopeResult<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn is_hash_name(name: &str) -> bool {
    matches!(name, "hash" | "contenthash" | "fullhash")
}

/// Classify the text between `[` and `]`.
///
/// Returns `Ok(None)` for tokens that stay literal.
fn parse_placeholder(inner: &str, source: &str) -> ScopeResult<Option<Segment>> {
    let lower = inner.to_ascii_lowercase();

    let simple = match lower.as_str() {
        "path" => Some(Segment::Path),
        "name" => Some(Segment::Name),
        "ext" => Some(Segment::Ext),
        "file" => Some(Segment::File),
        "folder" => Some(Segment::Folder),
        "package" => Some(Segment::Package),
        "local" => Some(Segment::Local),
        _ => None,
    };
    if simple.is_some() {
        return Ok(simple);
    }

    if !lower.is_empty() && lower.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(lower.parse().ok().map(Segment::Capture));
    }

    let parts: Vec<&str> = lower.split(':').collect();
    let Some(hash_at) = parts.iter().position(|p| is_hash_name(p)) else {
        return Ok(None);
    };
    if hash_at > 1 {
        return Ok(None);
    }

    let malformed = |reason: String| {
        ScopeError::config(format!(
            "malformed placeholder [{}] in template '{}': {}",
            inner, source, reason
        ))
    };

    let mut overrides = HashOverrides::default();
    if hash_at == 1 {
        overrides.algorithm = Some(
            parts[0]
                .parse()
                .map_err(|e: ScopeError| malformed(e.to_string()))?,
        );
    }

    for param in &parts[hash_at + 1..] {
        if param.is_empty() {
            return Err(malformed("empty parameter".to_string()));
        }
        if param.bytes().all(|b| b.is_ascii_digit()) {
            let length = param
                .parse()
                .map_err(|_| malformed(format!("invalid length '{}'", param)))?;
            set_once(&mut overrides.length, length, "length").map_err(malformed)?;
        } else if let Ok(algorithm) = param.parse::<HashAlgorithm>() {
            set_once(&mut overrides.algorithm, algorithm, "algorithm").map_err(malformed)?;
        } else if let Ok(encoding) = param.parse::<DigestEncoding>() {
            set_once(&mut overrides.encoding, encoding, "encoding").map_err(malformed)?;
        } else {
            return Err(malformed(format!(
                "'{}' is not a hash algorithm, digest encoding or length",
                param
            )));
        }
    }

    Ok(Some(Segment::Hash(overrides)))
}

fn set_once<T>(slot: &mut Option<T>, value: T, what: &str) -> Result<(), String> {
    if slot.is_some() {
        return Err(format!("{} given more than once", what));
    }
    *slot = Some(value);
    Ok(())
}
