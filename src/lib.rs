//! scopecss - CSS Modules scoped class names
//!
//! Escapes CSS identifiers, hashes and interpolates name templates into
//! scoped class names, and resolves stylesheets (compositions included) to
//! token maps through a shared, cycle-aware cache.

pub mod cli;
pub mod config;
pub mod error;
pub mod hash;
pub mod ident;
pub mod naming;
pub mod resolver;
pub mod template;

pub use error::{ScopeError, ScopeResult};
pub use naming::{generate_scoped_name, NamingConfig, ScopedNameGenerator};
pub use resolver::{ResolverCache, TokenMap, TokenResolver};
