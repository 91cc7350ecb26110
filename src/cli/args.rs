//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// scopecss - CSS Modules scoped class names
///
/// Generates the public class names a CSS Modules build would assign and
/// resolves whole stylesheets, compositions included, to token maps.
#[derive(Parser, Debug)]
#[command(name = "scopecss")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "SCOPECSS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip local .scopecss.toml discovery
    #[arg(long, global = true)]
    pub no_local: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the scoped name of one local class name
    Name(NameArgs),

    /// Resolve stylesheets to token maps
    Resolve(ResolveArgs),

    /// Escape text as a CSS identifier
    Escape(EscapeArgs),

    /// Decode CSS escape sequences
    Unescape(UnescapeArgs),

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Arguments for the name command
#[derive(Parser, Debug)]
pub struct NameArgs {
    /// Local class name as written in the stylesheet
    pub local: String,

    /// Stylesheet the class is declared in
    pub file: PathBuf,

    /// Name template (overrides naming.template)
    #[arg(short, long)]
    pub template: Option<String>,
}

/// Output format for resolved token maps
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON object keyed by stylesheet path
    #[default]
    Json,
    /// `name = identifier` lines per stylesheet
    Plain,
}

/// Arguments for the resolve command
#[derive(Parser, Debug)]
pub struct ResolveArgs {
    /// Stylesheets to resolve
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,
}

/// Arguments for the escape command
#[derive(Parser, Debug)]
pub struct EscapeArgs {
    /// Text to escape
    pub text: String,

    /// Apply the scoped-name rules (reserved characters become '-')
    #[arg(long)]
    pub local: bool,
}

/// Arguments for the unescape command
#[derive(Parser, Debug)]
pub struct UnescapeArgs {
    /// Escaped identifier
    pub text: String,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,

        /// Write a project-local .scopecss.toml in the current directory
        #[arg(long)]
        local: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., hash.algorithm)
        key: String,
        /// Value to set
        value: String,
        /// Write to project-local .scopecss.toml instead of global config
        #[arg(long)]
        local: bool,
    },
}
