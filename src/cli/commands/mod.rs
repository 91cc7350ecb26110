//! CLI command implementations

pub mod config;
pub mod escape;
pub mod name;
pub mod resolve;

pub use config::execute as config;
pub use escape::escape;
pub use escape::unescape;
pub use name::execute as name;
pub use resolve::execute as resolve;
