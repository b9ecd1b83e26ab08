//! Support code for the `oxide-sync` command-line tool.
//!
//! - **Source** - Loading rule SQL and session parameters
//! - **Report** - Rendering diagnostics with their source location

pub mod error;
pub mod report;
pub mod source;

pub use error::{CliError, Result};
