//! `package.json` lookup for the `[package]` placeholder

use parking_lot::Mutex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Deserialize)]
struct PackageManifest {
    name: Option<String>,
}

/// The package a stylesheet belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageInfo {
    /// `name` from the manifest, as written
    pub name: String,
    /// Directory holding the manifest
    pub root: PathBuf,
}

/// Finds the closest `package.json` above a stylesheet and remembers the
/// answer for every directory visited on the way.
#[derive(Debug, Default)]
pub struct PackageLookup {
    cache: Mutex<HashMap<PathBuf, Option<PackageInfo>>>,
}

impl PackageLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Package containing the stylesheet at `resource_path`
    pub fn package_for(&self, resource_path: &Path) -> Option<PackageInfo> {
        let dir = resource_path.parent()?;
        self.lookup_dir(dir)
    }

    fn lookup_dir(&self, dir: &Path) -> Option<PackageInfo> {
        if let Some(cached) = self.cache.lock().get(dir) {
            return cached.clone();
        }

        let mut visited = Vec::new();
        let mut current = Some(dir);
        let mut found = None;

        while let Some(candidate) = current {
            if let Some(cached) = self.cache.lock().get(candidate) {
                found = cached.clone();
                break;
            }
            visited.push(candidate.to_path_buf());
            if let Some(name) = read_package_name(&candidate.join("package.json")) {
                found = Some(PackageInfo {
                    name,
                    root: candidate.to_path_buf(),
                });
                break;
            }
            current = candidate.parent();
        }

        let mut cache = self.cache.lock();
        for path in visited {
            cache.insert(path, found.clone());
        }
        found
    }
}

fn read_package_name(manifest_path: &Path) -> Option<String> {
    let content = std::fs::read_to_string(manifest_path).ok()?;
    match serde_json::from_str::<PackageManifest>(&content) {
        Ok(manifest) => {
            let name = manifest.name?;
            debug!("Package {} from {}", name, manifest_path.display());
            Some(name)
        }
        Err(e) => {
            warn!("Ignoring unreadable {}: {}", manifest_path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn finds_closest_package() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("packages").join("ui").join("src");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(temp.path().join("package.json"), r#"{"name":"root"}"#).unwrap();
        std::fs::write(
            temp.path().join("packages/ui/package.json"),
            r#"{"name":"@acme/ui","version":"1.0.0"}"#,
        )
        .unwrap();

        let lookup = PackageLookup::new();
        let ui = lookup.package_for(&nested.join("button.css")).unwrap();
        assert_eq!(ui.name, "@acme/ui");
        assert_eq!(ui.root, temp.path().join("packages").join("ui"));

        let root = lookup.package_for(&temp.path().join("app.css")).unwrap();
        assert_eq!(root.name, "root");
        assert_eq!(root.root, temp.path());
    }

    #[test]
    fn caches_visited_directories() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(temp.path().join("package.json"), r#"{"name":"app"}"#).unwrap();

        let lookup = PackageLookup::new();
        let first = lookup.package_for(&nested.join("x.css")).unwrap();
        assert_eq!(first.name, "app");

        // Cached answers survive the manifest disappearing
        std::fs::remove_file(temp.path().join("package.json")).unwrap();
        assert_eq!(
            lookup.package_for(&temp.path().join("a").join("y.css")),
            Some(first)
        );
    }

    #[test]
    fn invalid_manifest_is_skipped() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("pkg");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(temp.path().join("package.json"), r#"{"name":"outer"}"#).unwrap();
        std::fs::write(nested.join("package.json"), "not json").unwrap();

        let lookup = PackageLookup::new();
        let outer = lookup.package_for(&nested.join("x.css")).unwrap();
        assert_eq!(outer.name, "outer");
        assert_eq!(outer.root, temp.path());
    }
}
