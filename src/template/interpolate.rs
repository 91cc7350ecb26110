//! Template interpolation
//!
//! Expansion runs as ordered passes over the parsed segments:
//!
//! 1. hash placeholders, over the unscoped local name and the unmodified path
//! 2. path-derived placeholders (`[path]`, `[name]`, `[ext]`, `[file]`,
//!    `[folder]`, `[package]`)
//! 3. `[local]`
//! 4. `[N]` regex captures
//!
//! [`interpolate`] runs the first two passes; the caller finishes the
//! [`Expansion`] with the remaining ones.

use super::{Segment, Template};
use crate::hash::{HashMode, HashSpec};
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

/// Per-call request metadata
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Absolute path of the stylesheet being processed
    pub resource_path: PathBuf,
    /// Base directory relative paths are computed from
    pub project_root: PathBuf,
    /// The author-written class name being scoped
    pub local_name: String,
    /// Optional match resource that prefixes the hash content
    pub match_resource: Option<PathBuf>,
    /// Package name for `[package]`, when one was looked up. It also
    /// prefixes the relative path in the hash content.
    pub package_name: Option<String>,
}

impl RequestContext {
    pub fn new(
        resource_path: impl Into<PathBuf>,
        project_root: impl Into<PathBuf>,
        local_name: impl Into<String>,
    ) -> Self {
        Self {
            resource_path: resource_path.into(),
            project_root: project_root.into(),
            local_name: local_name.into(),
            match_resource: None,
            package_name: None,
        }
    }

    pub fn with_match_resource(mut self, path: impl Into<PathBuf>) -> Self {
        self.match_resource = Some(path.into());
        self
    }

    pub fn with_package_name(mut self, name: Option<String>) -> Self {
        self.package_name = name;
        self
    }

    /// Resource path relative to the project root, with `/` separators
    pub fn relative_path(&self) -> String {
        relative_to(&self.resource_path, &self.project_root)
    }

    /// Canonical hash input:
    /// `<matchResource>\0<packageName><relativePath>\0<localName>`, where the
    /// match resource and package name parts are present only when set
    pub fn hash_content(&self) -> String {
        let prefix = self
            .match_resource
            .as_ref()
            .map(|m| format!("{}\u{0}", relative_to(m, &self.project_root)))
            .unwrap_or_default();
        format!(
            "{}{}{}\u{0}{}",
            prefix,
            self.package_name.as_deref().unwrap_or_default(),
            self.relative_path(),
            self.local_name
        )
    }
}

fn relative_to(path: &Path, root: &Path) -> String {
    let relative = pathdiff::diff_paths(path, root).unwrap_or_else(|| path.to_path_buf());
    normalize_separators(&relative.to_string_lossy())
}

fn normalize_separators(path: &str) -> String {
    if MAIN_SEPARATOR == '/' {
        path.to_string()
    } else {
        path.replace(MAIN_SEPARATOR, "/")
    }
}

/// Configured hash parameters shared by every placeholder
#[derive(Debug, Clone, Default)]
pub struct HashSettings {
    pub defaults: HashSpec,
    pub salt: Option<String>,
    pub mode: HashMode,
}

/// A partially expanded template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    segments: Vec<Segment>,
}

/// Run the hash and path passes of `template` against `ctx`.
pub fn interpolate(template: &Template, ctx: &RequestContext, hash: &HashSettings) -> Expansion {
    let expansion = Expansion {
        segments: template.segments().to_vec(),
    };
    expansion.expand_hashes(ctx, hash).expand_paths(ctx)
}

impl Expansion {
    fn rewrite(self, f: impl FnMut(Segment) -> Segment) -> Self {
        Self {
            segments: self.segments.into_iter().map(f).collect(),
        }
    }

    /// Pass 1: every hash placeholder; identical parameters hash once
    fn expand_hashes(self, ctx: &RequestContext, hash: &HashSettings) -> Self {
        let content = ctx.hash_content();
        let salt = hash.salt.as_deref().map(str::as_bytes);
        let mut computed: HashMap<HashSpec, String> = HashMap::new();

        self.rewrite(|segment| match segment {
            Segment::Hash(overrides) => {
                let spec = overrides.resolve(&hash.defaults);
                let digest = computed
                    .entry(spec)
                    .or_insert_with(|| hash.mode.apply(&spec, content.as_bytes(), salt));
                Segment::Literal(digest.clone())
            }
            other => other,
        })
    }

    /// Pass 2: placeholders derived from the resource path
    fn expand_paths(self, ctx: &RequestContext) -> Self {
        let file = ctx.relative_path();
        let (dir, base) = match file.rsplit_once('/') {
            Some((dir, base)) => (dir, base),
            None => ("", file.as_str()),
        };
        let base_path = Path::new(base);
        let name = base_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = base_path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let path = if dir.is_empty() {
            String::new()
        } else {
            format!("{}/", dir)
        };
        let folder = dir.rsplit('/').next().unwrap_or_default().to_string();

        self.rewrite(|segment| match segment {
            Segment::Path => Segment::Literal(path.clone()),
            Segment::Name => Segment::Literal(name.clone()),
            Segment::Ext => Segment::Literal(ext.clone()),
            Segment::File => Segment::Literal(file.clone()),
            Segment::Folder => Segment::Literal(folder.clone()),
            Segment::Package => {
                Segment::Literal(ctx.package_name.clone().unwrap_or_default())
            }
            other => other,
        })
    }

    /// Pass 3: the local class name
    pub fn substitute_local(self, local_name: &str) -> Self {
        self.rewrite(|segment| match segment {
            Segment::Local => Segment::Literal(local_name.to_string()),
            other => other,
        })
    }

    /// Pass 4: capture groups of `regex` matched against `resource_path`.
    ///
    /// Without a match the placeholders are left as written; groups that
    /// did not participate expand to the empty string.
    pub fn substitute_captures(self, regex: Option<&Regex>, resource_path: &str) -> Self {
        let Some(captures) = regex.and_then(|r| r.captures(resource_path)) else {
            return self;
        };

        self.rewrite(|segment| match segment {
            Segment::Capture(n) if n < captures.len() => Segment::Literal(
                captures
                    .get(n)
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default(),
            ),
            other => other,
        })
    }

    /// Concatenate the expansion; unexpanded placeholders render literally
    pub fn render(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Path => out.push_str("[path]"),
                Segment::Name => out.push_str("[name]"),
                Segment::Ext => out.push_str("[ext]"),
                Segment::File => out.push_str("[file]"),
                Segment::Folder => out.push_str("[folder]"),
                Segment::Package => out.push_str("[package]"),
                Segment::Local => out.push_str("[local]"),
                Segment::Hash(_) => out.push_str("[hash]"),
                Segment::Capture(n) => out.push_str(&format!("[{}]", n)),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::{DigestEncoding, HashAlgorithm};

    fn ctx(resource: &str, local: &str) -> RequestContext {
        RequestContext::new(resource, "/project", local)
    }

    fn expand(template: &str, ctx: &RequestContext) -> String {
        let template = Template::parse(template).unwrap();
        interpolate(&template, ctx, &HashSettings::default())
            .substitute_local(&ctx.local_name)
            .render()
    }

    #[test]
    fn relative_path_and_hash_content() {
        let c = ctx("/project/src/components/Button.css", "btn");
        assert_eq!(c.relative_path(), "src/components/Button.css");
        assert_eq!(c.hash_content(), "src/components/Button.css\u{0}btn");

        let with_match = c.with_match_resource("/project/src/virtual.css");
        assert_eq!(
            with_match.hash_content(),
            "src/virtual.css\u{0}src/components/Button.css\u{0}btn"
        );
    }

    #[test]
    fn path_placeholders() {
        let c = ctx("/project/src/components/Button.module.css", "btn");
        assert_eq!(
            expand("[path]|[name]|[ext]|[file]|[folder]|[local]", &c),
            "src/components/|Button.module|.css|src/components/Button.module.css|components|btn"
        );
    }

    #[test]
    fn file_directly_under_root() {
        let c = ctx("/project/app.css", "main");
        assert_eq!(expand("[path]|[folder]|[name]", &c), "||app");
    }

    #[test]
    fn file_outside_root() {
        let c = ctx("/shared/lib/x.css", "a");
        assert_eq!(expand("[path][folder]", &c), "../shared/lib/lib");
    }

    #[test]
    fn hash_matches_direct_digest() {
        let c = ctx("/project/src/a.css", "btn");
        let spec = HashSpec {
            algorithm: HashAlgorithm::Md5,
            encoding: DigestEncoding::Hex,
            length: Some(8),
        };
        let expected = spec.tiered_digest(c.hash_content().as_bytes(), None);
        assert_eq!(expand("[md5:hash:hex:8]", &c), expected);
    }

    #[test]
    fn hash_reflects_unscoped_local_name() {
        let a = expand("[hash]", &ctx("/project/a.css", "one"));
        let b = expand("[hash]", &ctx("/project/a.css", "two"));
        assert_ne!(a, b);
        assert_eq!(a.len(), 20);
    }

    #[test]
    fn identical_hash_placeholders_expand_identically() {
        let out = expand("[hash:6]-[hash:6]", &ctx("/project/a.css", "x"));
        let (left, right) = out.split_once('-').unwrap();
        assert_eq!(left, right);
    }

    #[test]
    fn salt_changes_hash() {
        let c = ctx("/project/a.css", "x");
        let template = Template::parse("[hash]").unwrap();
        let plain = interpolate(&template, &c, &HashSettings::default()).render();
        let salted = interpolate(
            &template,
            &c,
            &HashSettings {
                salt: Some("pepper".into()),
                ..Default::default()
            },
        )
        .render();
        assert_ne!(plain, salted);
    }

    #[test]
    fn local_is_kept_until_substituted() {
        let template = Template::parse("[name]__[local]").unwrap();
        let c = ctx("/project/a.css", "x");
        let expansion = interpolate(&template, &c, &HashSettings::default());
        assert_eq!(expansion.render(), "a__[local]");
    }

    #[test]
    fn captures_substitute_last() {
        let template = Template::parse("[1]-[2]-[local]").unwrap();
        let c = ctx("/project/themes/dark/a.css", "x");
        let regex = Regex::new(r"themes/(\w+)/(\w+)?").unwrap();
        let out = interpolate(&template, &c, &HashSettings::default())
            .substitute_local("x")
            .substitute_captures(Some(&regex), "/project/themes/dark/a.css")
            .render();
        assert_eq!(out, "dark-a-x");
    }

    #[test]
    fn captures_without_match_stay_literal() {
        let template = Template::parse("[1]-[local]").unwrap();
        let c = ctx("/project/a.css", "x");
        let regex = Regex::new(r"themes/(\w+)").unwrap();
        let out = interpolate(&template, &c, &HashSettings::default())
            .substitute_local("x")
            .substitute_captures(Some(&regex), "/project/a.css")
            .render();
        assert_eq!(out, "[1]-x");
    }

    #[test]
    fn package_placeholder() {
        let template = Template::parse("[package]__[local]").unwrap();
        let c = ctx("/project/a.css", "x").with_package_name(Some("ui-kit".into()));
        assert_eq!(c.hash_content(), "ui-kita.css\u{0}x");
        let out = interpolate(&template, &c, &HashSettings::default())
            .substitute_local("x")
            .render();
        assert_eq!(out, "ui-kit__x");
    }
}
