//! Config command - show or edit configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager, LOCAL_CONFIG_FILE};
use crate::error::{ScopeError, ScopeResult};
use console::style;
use std::path::Path;
use tokio::fs;

/// Execute the config command
pub async fn execute(args: ConfigArgs, config: &Config, manager: &ConfigManager) -> ScopeResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => show_path(manager),
        Some(ConfigAction::Init { force, local }) => {
            if local {
                let cwd = std::env::current_dir()
                    .map_err(|e| ScopeError::io("getting current directory", e))?;
                let local_manager = ConfigManager::with_path(cwd.join(LOCAL_CONFIG_FILE));
                init_config(&local_manager, force).await?
            } else {
                init_config(manager, force).await?
            }
        }
        Some(ConfigAction::Set { key, value, local }) => {
            validate_config_key(&key)?;
            let path = if local {
                std::env::current_dir()
                    .map_err(|e| ScopeError::io("getting current directory", e))?
                    .join(LOCAL_CONFIG_FILE)
            } else {
                manager.path().to_path_buf()
            };
            set_value(&path, &key, &value).await?
        }
    }

    Ok(())
}

fn show_config(config: &Config) -> ScopeResult<()> {
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

fn show_path(manager: &ConfigManager) {
    println!("{}", manager.path().display());
}

async fn init_config(manager: &ConfigManager, force: bool) -> ScopeResult<()> {
    let path = manager.path();

    if path.exists() && !force {
        eprintln!(
            "{} Config already exists at {}",
            style("!").yellow().bold(),
            path.display()
        );
        eprintln!("  Use --force to overwrite");
        return Ok(());
    }

    manager.save(&Config::default()).await?;
    println!(
        "{} Configuration initialized: {}",
        style("✓").green().bold(),
        path.display()
    );

    Ok(())
}

/// Set one key in the TOML file at `path`, keeping every other key as is
async fn set_value(path: &Path, key: &str, value: &str) -> ScopeResult<()> {
    let mut doc: toml::Value = if path.exists() {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| ScopeError::io(format!("reading {}", path.display()), e))?;
        content
            .parse::<toml::Table>()
            .map(toml::Value::Table)
            .map_err(|e| ScopeError::ConfigInvalid {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?
    } else {
        toml::Value::Table(toml::Table::new())
    };

    set_toml_value(&mut doc, key, value)?;

    // The result must still be a valid configuration
    let checked: Config = doc.clone().try_into().map_err(|e: toml::de::Error| {
        ScopeError::config(format!("invalid value for {}: {}", key, e))
    })?;
    checked.naming_config(Path::new("/"))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| ScopeError::ConfigDirCreate {
                path: parent.to_path_buf(),
                source: e,
            })?;
    }
    let content = toml::to_string_pretty(&doc)?;
    fs::write(path, content)
        .await
        .map_err(|e| ScopeError::io(format!("writing {}", path.display()), e))?;

    println!(
        "{} Set {} = {} in {}",
        style("✓").green().bold(),
        key,
        value,
        path.display()
    );
    Ok(())
}

/// Validate that a config key is one we recognise
fn validate_config_key(key: &str) -> ScopeResult<()> {
    let parts: Vec<&str> = key.split('.').collect();
    match parts.as_slice() {
        ["general", "log_format"]
        | ["naming", "template" | "path_regex"]
        | ["hash", "algorithm" | "encoding" | "length" | "salt" | "mode"]
        | ["project", "root"] => Ok(()),
        _ => Err(ScopeError::config(format!(
            "unknown config key '{}' (valid keys: {})",
            key,
            VALID_KEYS.join(", ")
        ))),
    }
}

const VALID_KEYS: &[&str] = &[
    "general.log_format",
    "naming.template",
    "naming.path_regex",
    "hash.algorithm",
    "hash.encoding",
    "hash.length",
    "hash.salt",
    "hash.mode",
    "project.root",
];

/// Set a validated `section.field` key in a TOML tree
fn set_toml_value(doc: &mut toml::Value, key: &str, value: &str) -> ScopeResult<()> {
    let Some((section, field)) = key.split_once('.') else {
        return Err(ScopeError::config(format!("expected section.field, got '{}'", key)));
    };

    let table = doc
        .as_table_mut()
        .ok_or_else(|| ScopeError::config("configuration root is not a table"))?
        .entry(section)
        .or_insert_with(|| toml::Value::Table(toml::Table::new()))
        .as_table_mut()
        .ok_or_else(|| ScopeError::config(format!("expected table at key: {}", section)))?;

    let toml_value = match value.parse::<i64>() {
        Ok(n) if key == "hash.length" => toml::Value::Integer(n),
        _ => toml::Value::String(value.to_string()),
    };

    table.insert(field.to_string(), toml_value);
    Ok(())
}
