//! Name command - print one scoped class name

use crate::cli::absolute_arg;
use crate::cli::args::NameArgs;
use crate::config::Config;
use crate::error::ScopeResult;
use crate::naming::ScopedNameGenerator;
use crate::template::Template;
use std::path::Path;
use tracing::debug;

/// Execute the name command
pub async fn execute(args: NameArgs, config: &Config, base_dir: &Path) -> ScopeResult<()> {
    let mut naming = config.naming_config(base_dir)?;
    if let Some(template) = &args.template {
        naming = naming.with_template(Template::parse(template)?);
    }
    debug!("Naming with {:?}", naming.strategy);

    let file = absolute_arg(&args.file)?;
    let generator = ScopedNameGenerator::new(naming);
    println!("{}", generator.generate(&args.local, &file));
    Ok(())
}
