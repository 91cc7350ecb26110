//! Scoped class name generation
//!
//! Turns a local class name declared in a stylesheet into its public,
//! CSS-legal identifier, either through a name template or through a
//! caller-supplied callback.
//!
//! Template output is always run through [`escape_local_ident`]. Callback
//! output is used verbatim: callers that bring their own naming function
//! are trusted to return legal identifiers.

pub mod package;

pub use package::{PackageInfo, PackageLookup};

use crate::ident::{escape_local_ident, unescape};
use crate::template::{interpolate, HashSettings, RequestContext, Template};
use regex::Regex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Custom naming callback: `(local_name, resource_path) -> identifier`
pub type ScopedNameFn = Arc<dyn Fn(&str, &Path) -> String + Send + Sync>;

/// How scoped names are produced
#[derive(Clone)]
pub enum NamingStrategy {
    Template(Template),
    Callback(ScopedNameFn),
}

impl fmt::Debug for NamingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Template(template) => f.debug_tuple("Template").field(template).finish(),
            Self::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

impl Default for NamingStrategy {
    fn default() -> Self {
        Self::Template(Template::default())
    }
}

/// Validated naming configuration
#[derive(Debug, Clone)]
pub struct NamingConfig {
    pub strategy: NamingStrategy,
    pub hash: HashSettings,
    /// Base directory for `[path]`, `[folder]` and hash content. Templates
    /// using `[package]` use the package root instead.
    pub project_root: PathBuf,
    /// Regex matched against the resource path for `[N]` placeholders
    pub path_regex: Option<Regex>,
}

impl NamingConfig {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            strategy: NamingStrategy::default(),
            hash: HashSettings::default(),
            project_root: project_root.into(),
            path_regex: None,
        }
    }

    pub fn with_template(mut self, template: Template) -> Self {
        self.strategy = NamingStrategy::Template(template);
        self
    }

    pub fn with_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str, &Path) -> String + Send + Sync + 'static,
    {
        self.strategy = NamingStrategy::Callback(Arc::new(callback));
        self
    }

    pub fn with_hash(mut self, hash: HashSettings) -> Self {
        self.hash = hash;
        self
    }

    pub fn with_path_regex(mut self, regex: Regex) -> Self {
        self.path_regex = Some(regex);
        self
    }
}

/// Generates public identifiers for local class names
#[derive(Debug)]
pub struct ScopedNameGenerator {
    config: NamingConfig,
    packages: PackageLookup,
}

impl ScopedNameGenerator {
    pub fn new(config: NamingConfig) -> Self {
        Self {
            config,
            packages: PackageLookup::new(),
        }
    }

    pub fn config(&self) -> &NamingConfig {
        &self.config
    }

    /// Public identifier for `local_name` declared in `resource_path`.
    ///
    /// Identical inputs always produce identical output.
    pub fn generate(&self, local_name: &str, resource_path: &Path) -> String {
        let template = match &self.config.strategy {
            NamingStrategy::Callback(callback) => return callback(local_name, resource_path),
            NamingStrategy::Template(template) => template,
        };

        // Class names from parsed stylesheets may still be CSS-escaped
        let local = unescape(local_name);

        // Package templates are relative to the package root
        let package = if template.needs_package() {
            self.packages.package_for(resource_path)
        } else {
            None
        };
        let (root, package_name) = match package {
            Some(PackageInfo { name, root }) => (root, Some(name)),
            None => (self.config.project_root.clone(), None),
        };
        let scoped_package = package_name.is_some();

        let ctx = RequestContext::new(resource_path, root, local.as_str())
            .with_package_name(package_name);

        let mut ident = interpolate(template, &ctx, &self.config.hash)
            .substitute_local(&local)
            .substitute_captures(
                self.config.path_regex.as_ref(),
                &resource_path.to_string_lossy(),
            )
            .render();
        if scoped_package {
            ident = ident.replace('@', "-");
        }

        escape_local_ident(&ident)
    }
}

/// Stateless entry point: generate one scoped name under `config`
pub fn generate_scoped_name(local_name: &str, resource_path: &Path, config: &NamingConfig) -> String {
    ScopedNameGenerator::new(config.clone()).generate(local_name, resource_path)
}
