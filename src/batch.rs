//! Single/bulk dispatch loop over the download engine
//!
//! Mode is chosen once at startup: an app id of 0 selects bulk mode, which
//! reads (app, depot) pairs from a fixed-name list file and drives one
//! engine call per pair. The batch is best-effort: a failing entry is
//! logged and the loop moves on, so only the last attempt's exit code is
//! observable in the process result.

use crate::config::DownloadConfig;
use crate::engine::{ContentDownloader, EXIT_OK};
use crate::error::Result;
use std::path::Path;
use tracing::{info, warn};

/// Fixed name of the bulk download list file
pub const BULK_LIST_FILE: &str = "depot_list.txt";

/// Exit code when bulk mode is requested but the list file is missing
pub const EXIT_BULK_LIST_MISSING: i32 = 10;

/// One (app, depot) pair of a bulk run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchEntry {
    /// App to download
    pub app_id: u32,
    /// Depot of the app to download
    pub depot_id: u32,
}

impl BatchEntry {
    /// Parse one list-file line of the form `appId,depotId[,...]`
    ///
    /// Extra fields are ignored. Lines with fewer than two fields or
    /// non-numeric ids yield `None` and are skipped by the batch loop.
    pub fn parse(line: &str) -> Option<BatchEntry> {
        let mut fields = line.split(',');
        let app_id = fields.next()?.trim().parse().ok()?;
        let depot_id = fields.next()?.trim().parse().ok()?;
        Some(BatchEntry { app_id, depot_id })
    }
}

/// Dispatch the configured run, returning the aggregate exit code
///
/// The session is acquired at most once, before the first download, and
/// released exactly once on every path that acquired it. Bulk mode with a
/// missing list file returns [`EXIT_BULK_LIST_MISSING`] without touching
/// the engine.
pub async fn run<D: ContentDownloader>(config: &DownloadConfig, engine: &mut D) -> Result<i32> {
    run_with_list(config, engine, Path::new(BULK_LIST_FILE)).await
}

/// [`run`] with an explicit bulk list path
pub async fn run_with_list<D: ContentDownloader>(
    config: &DownloadConfig,
    engine: &mut D,
    list_path: &Path,
) -> Result<i32> {
    if config.app_id != 0 {
        engine.initialize(&config.credentials).await?;
        let code = engine
            .download_app(
                config.app_id,
                config.depot_id,
                &config.branch,
                config.force_depot,
            )
            .await;
        engine.shutdown().await;
        return Ok(code);
    }

    if !list_path.exists() {
        warn!("{} does not exist, aborting", list_path.display());
        return Ok(EXIT_BULK_LIST_MISSING);
    }
    let lines = tokio::fs::read_to_string(list_path).await?;

    info!("bulk downloading apps and depots");
    engine.initialize(&config.credentials).await?;

    // Last-write-wins by design: earlier failures are logged but only the
    // final attempt's code survives into the process result
    let mut last_outcome = EXIT_OK;
    for entry in lines.lines().filter_map(BatchEntry::parse) {
        info!("app: {} | depot: {}", entry.app_id, entry.depot_id);
        last_outcome = engine
            .download_app(
                entry.app_id,
                Some(entry.depot_id),
                &config.branch,
                config.force_depot,
            )
            .await;
        if last_outcome != EXIT_OK {
            warn!(
                "app {} depot {} finished with code {}",
                entry.app_id, entry.depot_id, last_outcome
            );
        }
    }

    engine.shutdown().await;
    Ok(last_outcome)
}
