pub mod cli;
pub mod config;
pub mod core;
pub mod observability;
pub mod shell;

pub use anyhow::{Context, Result};
