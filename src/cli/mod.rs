//! Command-line interface

pub mod args;
pub mod commands;

pub use args::{Cli, Commands};

pub(crate) use crate::resolver::absolute_path as absolute_arg;
