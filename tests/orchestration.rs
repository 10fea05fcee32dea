//! Tests for the single/bulk dispatch loop
//!
//! These tests drive `batch::run_with_list` against a scripted mock engine
//! and verify:
//! - Session lifecycle (initialize once, shutdown exactly once)
//! - Bulk-mode list handling (missing file, malformed lines, entry order)
//! - Last-write-wins exit code aggregation

use async_trait::async_trait;
use depot_dl::{
    ArgList, ContentDownloader, Credentials, DownloadConfig, EXIT_BULK_LIST_MISSING, Result, batch,
};
use std::collections::VecDeque;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Scripted [`ContentDownloader`] that records every call it receives
#[derive(Default)]
struct MockEngine {
    /// Exit codes to hand out, one per `download_app` call
    codes: VecDeque<i32>,
    init_calls: usize,
    shutdown_calls: usize,
    downloads: Vec<(u32, Option<u32>, String, bool)>,
}

impl MockEngine {
    fn with_codes(codes: &[i32]) -> Self {
        Self {
            codes: codes.iter().copied().collect(),
            ..Default::default()
        }
    }
}

#[async_trait]
impl ContentDownloader for MockEngine {
    async fn initialize(&mut self, _credentials: &Credentials) -> Result<()> {
        self.init_calls += 1;
        Ok(())
    }

    async fn download_app(
        &mut self,
        app_id: u32,
        depot_id: Option<u32>,
        branch: &str,
        force_depot: bool,
    ) -> i32 {
        self.downloads
            .push((app_id, depot_id, branch.to_string(), force_depot));
        self.codes.pop_front().unwrap_or(0)
    }

    async fn shutdown(&mut self) {
        self.shutdown_calls += 1;
    }
}

fn config_for(tokens: &[&str]) -> DownloadConfig {
    let args = ArgList::new(tokens.iter().map(|t| t.to_string()).collect());
    DownloadConfig::resolve_with_prompt(&args, None, |_| panic!("prompt must not run"))
        .expect("config should resolve")
}

fn write_list(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("depot_list.txt");
    let mut f = std::fs::File::create(&path).expect("create list file");
    f.write_all(contents.as_bytes()).expect("write list file");
    path
}

#[tokio::test]
async fn single_mode_passes_engine_code_through() {
    let config = config_for(&["-app", "440", "-depot", "441", "-beta", "prerelease"]);
    let mut engine = MockEngine::with_codes(&[7]);

    let code = batch::run(&config, &mut engine).await.unwrap();

    assert_eq!(code, 7);
    assert_eq!(engine.init_calls, 1);
    assert_eq!(engine.shutdown_calls, 1);
    assert_eq!(
        engine.downloads,
        vec![(440, Some(441), "prerelease".to_string(), false)]
    );
}

#[tokio::test]
async fn single_mode_without_depot_passes_none() {
    let config = config_for(&["-app", "440", "-force-depot"]);
    let mut engine = MockEngine::with_codes(&[0]);

    batch::run(&config, &mut engine).await.unwrap();

    assert_eq!(engine.downloads, vec![(440, None, "Public".to_string(), true)]);
}

#[tokio::test]
async fn bulk_mode_missing_list_exits_10_without_engine_calls() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&["-app", "0"]);
    let mut engine = MockEngine::default();

    let code = batch::run_with_list(&config, &mut engine, &dir.path().join("depot_list.txt"))
        .await
        .unwrap();

    assert_eq!(code, EXIT_BULK_LIST_MISSING);
    assert_eq!(engine.init_calls, 0, "no authentication before the list check");
    assert_eq!(engine.shutdown_calls, 0);
    assert!(engine.downloads.is_empty());
}

#[tokio::test]
async fn bulk_mode_skips_malformed_lines_and_keeps_order() {
    let dir = TempDir::new().unwrap();
    let list = write_list(&dir, "440,441\nbad line\n570,571\n");
    let config = config_for(&["-app", "0"]);
    let mut engine = MockEngine::with_codes(&[3, 9]);

    let code = batch::run_with_list(&config, &mut engine, &list).await.unwrap();

    assert_eq!(
        engine.downloads,
        vec![
            (440, Some(441), "Public".to_string(), false),
            (570, Some(571), "Public".to_string(), false),
        ]
    );
    // Exit code is the second call's, independent of the first
    assert_eq!(code, 9);
    assert_eq!(engine.init_calls, 1, "one login for the whole batch");
    assert_eq!(engine.shutdown_calls, 1);
}

#[tokio::test]
async fn bulk_mode_failure_does_not_abort_batch() {
    let dir = TempDir::new().unwrap();
    let list = write_list(&dir, "10,11\n20,21\n30,31\n");
    let config = config_for(&["-app", "0"]);
    let mut engine = MockEngine::with_codes(&[0, 5, 0]);

    let code = batch::run_with_list(&config, &mut engine, &list).await.unwrap();

    assert_eq!(engine.downloads.len(), 3, "middle failure must not stop the loop");
    assert_eq!(code, 0, "last attempt's code wins");
}

#[tokio::test]
async fn bulk_mode_last_failure_is_observable() {
    let dir = TempDir::new().unwrap();
    let list = write_list(&dir, "10,11\n20,21\n");
    let config = config_for(&["-app", "0"]);
    let mut engine = MockEngine::with_codes(&[0, 5]);

    let code = batch::run_with_list(&config, &mut engine, &list).await.unwrap();
    assert_eq!(code, 5);
}

#[tokio::test]
async fn bulk_mode_with_only_malformed_lines_exits_clean() {
    let dir = TempDir::new().unwrap();
    let list = write_list(&dir, "nonsense\n,,,\n12\n");
    let config = config_for(&["-app", "0"]);
    let mut engine = MockEngine::default();

    let code = batch::run_with_list(&config, &mut engine, &list).await.unwrap();

    assert!(engine.downloads.is_empty());
    assert_eq!(code, 0);
    assert_eq!(engine.shutdown_calls, 1, "session still released");
}

#[tokio::test]
async fn single_mode_ignores_list_file() {
    let dir = TempDir::new().unwrap();
    let list = write_list(&dir, "440,441\n");
    let config = config_for(&["-app", "730", "-depot", "731"]);
    let mut engine = MockEngine::with_codes(&[0]);

    batch::run_with_list(&config, &mut engine, &list).await.unwrap();

    assert_eq!(engine.downloads, vec![(730, Some(731), "Public".to_string(), false)]);
}

#[tokio::test]
async fn filter_compilation_failure_is_recoverable() {
    // Mirrors the driver's best-effort filter handling: unreadable file is
    // an Err the caller downgrades, then proceeds without a filter
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("no-such-filelist.txt");
    assert!(depot_dl::FileFilter::compile(&missing).is_err());

    let config = config_for(&["-app", "440"]);
    assert!(config.file_filter.is_none());

    let mut engine = MockEngine::with_codes(&[0]);
    let code = batch::run_with_list(&config, &mut engine, Path::new("unused"))
        .await
        .unwrap();
    assert_eq!(code, 0);
}
