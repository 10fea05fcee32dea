//! # depot-dl
//!
//! Command-line orchestration layer for bulk depot content downloads.
//!
//! ## Design Philosophy
//!
//! depot-dl is designed to be:
//! - **Engine-agnostic** - All network behavior sits behind the
//!   [`ContentDownloader`] trait; the orchestration layer only sequences it
//! - **Best-effort in bulk** - A failing batch entry never aborts the run
//! - **Fail-fast on usage** - Inter-flag constraints are checked before any
//!   network activity
//!
//! ## Quick Start
//!
//! ```no_run
//! use depot_dl::{ArgList, DownloadConfig, HttpContentDownloader, batch};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let args = ArgList::new(std::env::args().skip(1).collect());
//!     let config = DownloadConfig::resolve(&args, None)?;
//!     let mut engine = HttpContentDownloader::new(config.clone());
//!     let code = batch::run(&config, &mut engine).await?;
//!     std::process::exit(code);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Argument table over the raw command-line tokens
pub mod args;
/// Single/bulk dispatch loop
pub mod batch;
/// Download configuration assembly
pub mod config;
/// Engine contract and the bundled HTTP engine
pub mod engine;
/// Error types
pub mod error;
/// File-selection filter compilation
pub mod filelist;

// Re-export commonly used types
pub use args::ArgList;
pub use batch::{BatchEntry, BULK_LIST_FILE, EXIT_BULK_LIST_MISSING};
pub use config::{Credentials, DownloadConfig};
pub use engine::{ContentDownloader, HttpContentDownloader, EXIT_OK};
pub use error::{Error, Result};
pub use filelist::{FileFilter, FilterEntry};
