//! Escape and unescape commands

use crate::cli::args::{EscapeArgs, UnescapeArgs};
use crate::error::ScopeResult;
use crate::ident;

/// Execute the escape command
pub async fn escape(args: EscapeArgs) -> ScopeResult<()> {
    let escaped = if args.local {
        ident::escape_local_ident(&args.text)
    } else {
        ident::escape(&args.text)
    };
    println!("{}", escaped);
    Ok(())
}

/// Execute the unescape command
pub async fn unescape(args: UnescapeArgs) -> ScopeResult<()> {
    println!("{}", ident::unescape(&args.text));
    Ok(())
}
