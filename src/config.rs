//! Download configuration assembled from the argument table
//!
//! [`DownloadConfig`] is built once per process invocation, immutable
//! thereafter, and passed by reference into every engine call. Assembly is
//! the fail-fast point for inter-flag constraints: a missing `-app` or a
//! `-manifest` without `-depot` aborts before any network activity. It is
//! also the one place this layer performs blocking user I/O, prompting for
//! a password when a username is supplied without one.

use crate::args::ArgList;
use crate::error::{Error, Result};
use crate::filelist::FileFilter;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

/// Default branch when neither `-branch` nor `-beta` is given
pub const DEFAULT_BRANCH: &str = "Public";

/// Default maximum number of content servers
pub const DEFAULT_MAX_SERVERS: usize = 8;

/// Default maximum number of concurrent chunk downloads
pub const DEFAULT_MAX_DOWNLOADS: usize = 4;

/// Account credentials handed to the engine at session bring-up
///
/// Opaque to the orchestration layer; `None` for both fields means the
/// engine's anonymous account.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Credentials {
    /// Account name, from `-username`/`-user`
    pub username: Option<String>,
    /// Account password, from `-password`/`-pass` or the interactive prompt
    #[serde(skip)]
    pub password: Option<String>,
    /// Branch password, from `-betapassword`
    #[serde(skip)]
    pub branch_password: Option<String>,
}

/// Every resolved setting for one process run
#[derive(Debug, Clone, Serialize)]
pub struct DownloadConfig {
    /// Target app id; 0 selects bulk mode
    pub app_id: u32,
    /// Target depot id, when pinned to a single depot
    pub depot_id: Option<u32>,
    /// Target manifest id; requires a depot id
    pub manifest_id: Option<u64>,
    /// Content branch to download from
    pub branch: String,
    /// Overridden cell id of the content server region
    pub cell_id: i32,
    /// Directory in which to place downloaded files
    pub install_dir: Option<PathBuf>,
    /// Account credentials for restricted content
    pub credentials: Credentials,
    /// Download a human-readable manifest instead of content
    pub manifest_only: bool,
    /// Verbose progress output
    pub verbose: bool,
    /// Download all platform-specific depots
    pub all_platforms: bool,
    /// Re-verify all previously downloaded files
    pub verify_all: bool,
    /// Download the depot even when it is not listed for the app
    pub force_depot: bool,
    /// Maximum number of content servers to use; never below `max_downloads`
    pub max_servers: usize,
    /// Maximum number of chunks to download concurrently
    pub max_downloads: usize,
    /// Compiled file-selection filter, if `-filelist` was given
    #[serde(skip)]
    pub file_filter: Option<FileFilter>,
}

impl DownloadConfig {
    /// Resolve the configuration, prompting on the terminal when a username
    /// is given without a password
    pub fn resolve(args: &ArgList, file_filter: Option<FileFilter>) -> Result<Self> {
        Self::resolve_with_prompt(args, file_filter, |prompt| {
            rpassword::prompt_password(prompt)
        })
    }

    /// Resolve the configuration with an injected password prompt
    ///
    /// The prompt runs at most once: only when `-username`/`-user` is set
    /// and neither `-password` nor `-pass` is.
    pub fn resolve_with_prompt(
        args: &ArgList,
        file_filter: Option<FileFilter>,
        prompt: impl FnOnce(&str) -> std::io::Result<String>,
    ) -> Result<Self> {
        let Some(app_id) = args.get_opt::<u32>("-app") else {
            return Err(Error::usage("-app not specified", "-app"));
        };

        let depot_id = args.get_opt::<u32>("-depot");
        let manifest_id = args.get_opt::<u64>("-manifest");
        if manifest_id.is_some() && depot_id.is_none() {
            return Err(Error::usage(
                "-manifest requires -depot to be specified",
                "-manifest",
            ));
        }

        // -1 is the legacy "unset" sentinel for the cell id
        let mut cell_id = args.get::<i32>("-cellid", -1);
        if cell_id == -1 {
            cell_id = 0;
        }

        let branch = args
            .get_opt::<String>("-branch")
            .or_else(|| args.get_opt("-beta"))
            .unwrap_or_else(|| DEFAULT_BRANCH.to_string());

        let username = args
            .get_opt::<String>("-username")
            .or_else(|| args.get_opt("-user"));
        let mut password = args
            .get_opt::<String>("-password")
            .or_else(|| args.get_opt("-pass"));

        match (&username, &password) {
            (Some(user), None) => {
                password = Some(prompt(&format!("Enter account password for \"{user}\": "))?);
            }
            (None, _) => {
                info!("no username given, using anonymous account");
            }
            _ => {}
        }

        let max_downloads = args.get::<usize>("-max-downloads", DEFAULT_MAX_DOWNLOADS);
        // Clamped upward only: the engine needs at least one server per
        // concurrent download
        let max_servers = args
            .get::<usize>("-max-servers", DEFAULT_MAX_SERVERS)
            .max(max_downloads);

        Ok(DownloadConfig {
            app_id,
            depot_id,
            manifest_id,
            branch,
            cell_id,
            install_dir: args.get_opt("-dir"),
            credentials: Credentials {
                username,
                password,
                branch_password: args.get_opt("-betapassword"),
            },
            manifest_only: args.has("-manifest-only"),
            verbose: args.has("-v"),
            all_platforms: args.has("-all-platforms"),
            verify_all: args.has("-verify-all") || args.has("-verify_all") || args.has("-validate"),
            force_depot: args.has("-force-depot"),
            max_servers,
            max_downloads,
            file_filter,
        })
    }
}
