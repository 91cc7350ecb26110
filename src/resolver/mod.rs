//! Token resolution
//!
//! Resolving a stylesheet produces its [`TokenMap`]: every locally declared
//! class mapped to its public identifier, with `composes` declarations
//! folded in. Compositions from other files are resolved recursively
//! through a shared [`ResolverCache`], so every file is parsed and named
//! once no matter how many stylesheets compose from it or how many threads
//! ask for it at the same time.

mod cache;
pub mod parser;

pub use cache::{ResolutionId, ResolverCache};
pub use parser::{
    Composition, CompositionSource, CssModuleParser, ParsedStylesheet, StylesheetParser,
};

use crate::error::{ScopeError, ScopeResult};
use crate::ident::unescape;
use crate::naming::ScopedNameGenerator;
use cache::Claim;
use indexmap::IndexMap;
use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Local class names mapped to public identifiers, in declaration order.
///
/// A composed class maps to a space-separated list of identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TokenMap {
    entries: IndexMap<String, String>,
}

impl TokenMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Insert `name` unless it is already present; the first write wins
    pub fn insert(&mut self, name: impl Into<String>, identifier: impl Into<String>) -> bool {
        match self.entries.entry(name.into()) {
            indexmap::map::Entry::Occupied(_) => false,
            indexmap::map::Entry::Vacant(slot) => {
                slot.insert(identifier.into());
                true
            }
        }
    }

    /// Add composed identifiers to `alias`.
    ///
    /// An existing entry keeps its identifiers and gains the new ones after
    /// them; a new alias maps to exactly the composed identifiers.
    pub fn compose(&mut self, alias: &str, identifiers: &[String]) {
        let value = self.entries.entry(alias.to_string()).or_default();
        for identifier in identifiers.iter().flat_map(|i| i.split_whitespace()) {
            if !value.split_whitespace().any(|existing| existing == identifier) {
                if !value.is_empty() {
                    value.push(' ');
                }
                value.push_str(identifier);
            }
        }
    }
}

impl<'a> IntoIterator for &'a TokenMap {
    type Item = (&'a String, &'a String);
    type IntoIter = indexmap::map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// One top-level resolution: its identity and the chain of files it is in
struct Resolution {
    id: ResolutionId,
    stack: Vec<PathBuf>,
}

/// Resolves stylesheets to token maps.
///
/// Cloning is cheap and clones share the generator, parser and cache, so a
/// resolver can be handed to worker threads.
#[derive(Clone)]
pub struct TokenResolver {
    generator: Arc<ScopedNameGenerator>,
    parser: Arc<dyn StylesheetParser>,
    cache: Arc<ResolverCache>,
}

impl std::fmt::Debug for TokenResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResolver")
            .field("generator", &self.generator)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl TokenResolver {
    /// Resolver with the built-in CSS Modules parser and a fresh cache
    pub fn new(generator: ScopedNameGenerator) -> Self {
        Self::with_parser(generator, CssModuleParser::new())
    }

    pub fn with_parser(
        generator: ScopedNameGenerator,
        parser: impl StylesheetParser + 'static,
    ) -> Self {
        Self {
            generator: Arc::new(generator),
            parser: Arc::new(parser),
            cache: Arc::new(ResolverCache::new()),
        }
    }

    pub fn cache(&self) -> &ResolverCache {
        &self.cache
    }

    pub fn generator(&self) -> &ScopedNameGenerator {
        &self.generator
    }

    /// Token map for the stylesheet at `path`.
    ///
    /// Relative paths are taken from the current directory. Repeated calls
    /// for the same file return the same shared map.
    pub fn resolve(&self, path: &Path) -> ScopeResult<Arc<TokenMap>> {
        let path = absolute_path(path)?;
        let mut resolution = Resolution {
            id: ResolutionId::next(),
            stack: Vec::new(),
        };
        self.resolve_in(&path, &mut resolution)
    }

    fn resolve_in(&self, path: &Path, resolution: &mut Resolution) -> ScopeResult<Arc<TokenMap>> {
        let guard = match self.cache.claim(path, resolution.id, &resolution.stack)? {
            Claim::Ready(map) => return Ok(map),
            Claim::Owned(guard) => guard,
        };

        resolution.stack.push(path.to_path_buf());
        let built = self.build(path, resolution);
        resolution.stack.pop();

        // On error the guard is dropped, which releases the slot
        let map = Arc::new(built?);
        guard.complete(Arc::clone(&map));
        Ok(map)
    }

    fn build(&self, path: &Path, resolution: &mut Resolution) -> ScopeResult<TokenMap> {
        let parsed = self.parser.parse(path)?;
        debug!(
            "Parsed {}: {} classes, {} compositions",
            path.display(),
            parsed.local_names.len(),
            parsed.compositions.len()
        );

        let mut tokens = TokenMap::new();
        for name in &parsed.local_names {
            let key = unescape(name);
            if !tokens.contains(&key) {
                let identifier = self.generator.generate(name, path);
                tokens.insert(key, identifier);
            }
        }

        for composition in &parsed.compositions {
            let identifiers = match &composition.source {
                CompositionSource::Global => composition
                    .source_tokens
                    .iter()
                    .map(|token| unescape(token))
                    .collect(),
                CompositionSource::Local => {
                    lookup(&tokens, &composition.source_tokens, path, &resolution.stack)?
                }
                CompositionSource::File {
                    specifier,
                    path: target,
                } => {
                    let target_map = match self.resolve_in(target, resolution) {
                        Err(ScopeError::StylesheetNotFound(missing)) if missing == *target => {
                            let mut chain = resolution.stack.clone();
                            chain.push(target.clone());
                            return Err(ScopeError::MissingCompositionTarget {
                                requester: path.to_path_buf(),
                                specifier: specifier.clone(),
                                chain,
                            });
                        }
                        other => other?,
                    };
                    lookup(&target_map, &composition.source_tokens, target, &resolution.stack)?
                }
            };
            tokens.compose(&unescape(&composition.local_alias), &identifiers);
        }

        Ok(tokens)
    }
}

/// Identifiers of `names` in `map`, which belongs to the stylesheet `target`
fn lookup(
    map: &TokenMap,
    names: &[String],
    target: &Path,
    stack: &[PathBuf],
) -> ScopeResult<Vec<String>> {
    names
        .iter()
        .map(|name| {
            let key = unescape(name);
            map.get(&key)
                .map(str::to_string)
                .ok_or_else(|| ScopeError::UnknownComposedToken {
                    token: key.clone(),
                    target: target.to_path_buf(),
                    chain: stack.to_vec(),
                })
        })
        .collect()
}

/// Absolute, lexically normalized form of `path`; relative paths start at the
/// current directory
pub(crate) fn absolute_path(path: &Path) -> ScopeResult<PathBuf> {
    if path.is_absolute() {
        return Ok(normalize_path(path));
    }
    let cwd = std::env::current_dir()
        .map_err(|e| ScopeError::io("reading current directory", e))?;
    Ok(normalize_path(&cwd.join(path)))
}

/// Lexically remove `.` and `..` components
pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}
