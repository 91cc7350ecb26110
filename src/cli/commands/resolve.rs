//! Resolve command - token maps for one or more stylesheets

use crate::cli::absolute_arg;
use crate::cli::args::{OutputFormat, ResolveArgs};
use crate::config::Config;
use crate::error::{ScopeError, ScopeResult};
use crate::naming::ScopedNameGenerator;
use crate::resolver::{TokenMap, TokenResolver};
use futures_util::future::join_all;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Execute the resolve command
pub async fn execute(args: ResolveArgs, config: &Config, base_dir: &Path) -> ScopeResult<()> {
    let resolver = TokenResolver::new(ScopedNameGenerator::new(config.naming_config(base_dir)?));
    let resolved = resolve_all(&resolver, &args.files).await?;
    info!(
        "Resolved {} stylesheet(s), {} cached",
        resolved.len(),
        resolver.cache().len()
    );

    match args.format {
        OutputFormat::Json => {
            let by_file: IndexMap<String, &TokenMap> = resolved
                .iter()
                .map(|(path, map)| (path.display().to_string(), map.as_ref()))
                .collect();
            println!("{}", serde_json::to_string_pretty(&by_file)?);
        }
        OutputFormat::Plain => print!("{}", render_plain(&resolved)),
    }

    Ok(())
}

/// Resolve `files` concurrently through one shared cache.
///
/// Results keep the order of `files`; the first failure in that order is
/// returned.
pub async fn resolve_all(
    resolver: &TokenResolver,
    files: &[PathBuf],
) -> ScopeResult<Vec<(PathBuf, Arc<TokenMap>)>> {
    let mut tasks = Vec::with_capacity(files.len());
    for file in files {
        let path = absolute_arg(file)?;
        let resolver = resolver.clone();
        tasks.push(tokio::task::spawn_blocking(move || resolver.resolve(&path)));
    }

    let mut resolved = Vec::with_capacity(files.len());
    for (file, joined) in files.iter().zip(join_all(tasks).await) {
        let map = joined.map_err(|e| ScopeError::Task(e.to_string()))??;
        resolved.push((file.clone(), map));
    }
    Ok(resolved)
}

fn render_plain(resolved: &[(PathBuf, Arc<TokenMap>)]) -> String {
    let mut out = String::new();
    for (index, (path, map)) in resolved.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        out.push_str(&format!("# {}\n", path.display()));
        for (name, identifier) in map.iter() {
            out.push_str(&format!("{} = {}\n", name, identifier));
        }
    }
    out
}
