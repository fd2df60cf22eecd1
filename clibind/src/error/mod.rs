//! Error types produced by binding, routing and dispatch.

mod render;
mod types;

pub use types::{BindFailures, CliError};
