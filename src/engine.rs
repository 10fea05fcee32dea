//! Download engine contract and the bundled HTTP engine
//!
//! The orchestration layer drives any engine through [`ContentDownloader`]:
//! one session bring-up, one `download_app` call per (app, depot) pair, one
//! shutdown. Engines own all network behavior, including how `max_servers`
//! and `max_downloads` are enforced; per-job failures are reported as a
//! nonzero exit code rather than an error so a batch can keep going.
//!
//! [`HttpContentDownloader`] is a minimal engine over a JSON manifest
//! service. Its wire format is an implementation detail of this crate.

use crate::config::{Credentials, DownloadConfig};
use crate::error::{Error, Result};
use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

/// Exit code for a successful download
pub const EXIT_OK: i32 = 0;

/// Exit code reported by the bundled engine when a download fails
pub const EXIT_DOWNLOAD_FAILED: i32 = 1;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const NAME: &str = env!("CARGO_PKG_NAME");

/// Default content service endpoint; override with `DEPOT_DL_SERVER`
pub const DEFAULT_ENDPOINT: &str = "https://cdn.depot-dl.dev";

/// Header carrying the branch password
///
/// Sent as a header rather than a query parameter so the secret never
/// appears in logged URLs or intermediary access logs.
const BRANCH_PASSWORD_HEADER: &str = "x-branch-password";

/// Abstraction over the content download engine, enabling testability
///
/// Calls arrive strictly in sequence: `initialize` once, then one
/// `download_app` per target, then `shutdown` once. Implementations must
/// not assume more than one call is in flight at a time.
#[async_trait]
pub trait ContentDownloader: Send {
    /// Bring up an authenticated session with the content network
    async fn initialize(&mut self, credentials: &Credentials) -> Result<()>;

    /// Download one app/depot pair, returning a process-style exit code
    async fn download_app(
        &mut self,
        app_id: u32,
        depot_id: Option<u32>,
        branch: &str,
        force_depot: bool,
    ) -> i32;

    /// Release the session
    async fn shutdown(&mut self);
}

/// One file entry of a depot manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ManifestFile {
    /// Path of the file relative to the install directory
    path: String,
    /// Direct content URL for the file
    url: String,
    /// File size in bytes
    size: u64,
}

/// Depot manifest payload returned by the content service
#[derive(Debug, Clone, Deserialize)]
struct DepotManifest {
    /// Manifest id this listing was generated from
    manifest_id: u64,
    /// Depot the listing belongs to
    depot_id: u32,
    /// Files contained in the depot
    files: Vec<ManifestFile>,
}

/// Engine over a JSON manifest service
///
/// Fetches a depot manifest per target, applies the configured file filter,
/// and fetches the selected files with at most `max_downloads` in flight.
pub struct HttpContentDownloader {
    config: DownloadConfig,
    endpoint: String,
    client: Option<reqwest::Client>,
    credentials: Credentials,
}

impl HttpContentDownloader {
    /// Create an engine for one process run
    ///
    /// The endpoint comes from the `DEPOT_DL_SERVER` environment variable,
    /// falling back to [`DEFAULT_ENDPOINT`].
    pub fn new(config: DownloadConfig) -> Self {
        let endpoint =
            std::env::var("DEPOT_DL_SERVER").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
        Self::with_endpoint(config, endpoint)
    }

    /// Create an engine against an explicit endpoint
    pub fn with_endpoint(config: DownloadConfig, endpoint: impl Into<String>) -> Self {
        Self {
            config,
            endpoint: endpoint.into(),
            client: None,
            credentials: Credentials::default(),
        }
    }

    fn client(&self) -> Result<&reqwest::Client> {
        self.client
            .as_ref()
            .ok_or_else(|| Error::Engine("session not initialized".to_string()))
    }

    fn authorized(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.credentials.username {
            Some(user) => req.basic_auth(user, self.credentials.password.as_deref()),
            None => req,
        }
    }

    /// Build the manifest request; query values are encoded by reqwest and
    /// the branch password travels in [`BRANCH_PASSWORD_HEADER`]
    fn manifest_request(
        &self,
        app_id: u32,
        depot_id: Option<u32>,
        branch: &str,
        force_depot: bool,
    ) -> Result<reqwest::Request> {
        let url = format!("{}/apps/{}/manifest", self.endpoint, app_id);
        let mut query: Vec<(&str, String)> = vec![
            ("branch", branch.to_string()),
            ("cell", self.config.cell_id.to_string()),
        ];
        if let Some(depot) = depot_id {
            query.push(("depot", depot.to_string()));
        }
        if let Some(manifest) = self.config.manifest_id {
            query.push(("manifest", manifest.to_string()));
        }
        if force_depot {
            query.push(("force", "1".to_string()));
        }
        if self.config.all_platforms {
            query.push(("all_platforms", "1".to_string()));
        }

        let mut req = self.authorized(self.client()?.get(&url)).query(&query);
        if let Some(pass) = &self.credentials.branch_password {
            req = req.header(BRANCH_PASSWORD_HEADER, pass);
        }
        Ok(req.build()?)
    }

    async fn fetch_manifest(
        &self,
        app_id: u32,
        depot_id: Option<u32>,
        branch: &str,
        force_depot: bool,
    ) -> Result<DepotManifest> {
        let request = self.manifest_request(app_id, depot_id, branch, force_depot)?;
        debug!("fetching manifest from {}", request.url());
        let manifest = self
            .client()?
            .execute(request)
            .await?
            .error_for_status()?
            .json::<DepotManifest>()
            .await?;
        Ok(manifest)
    }

    /// Reject paths that would escape the install directory
    fn sanitize(path: &str) -> Option<PathBuf> {
        let p = Path::new(path);
        if p.components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return None;
        }
        Some(p.to_path_buf())
    }

    async fn fetch_file(&self, file: &ManifestFile, dest_root: &Path) -> Result<()> {
        let Some(relative) = Self::sanitize(&file.path) else {
            warn!("skipping manifest entry with unsafe path: {}", file.path);
            return Ok(());
        };
        let dest = dest_root.join(relative);

        if !self.config.verify_all
            && let Ok(meta) = tokio::fs::metadata(&dest).await
            && meta.len() == file.size
        {
            debug!("{} already present, skipping", file.path);
            return Ok(());
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let bytes = self
            .authorized(self.client()?.get(&file.url))
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        tokio::fs::write(&dest, &bytes).await?;
        debug!("wrote {} ({} bytes)", dest.display(), bytes.len());
        Ok(())
    }

    async fn run_job(
        &self,
        app_id: u32,
        depot_id: Option<u32>,
        branch: &str,
        force_depot: bool,
    ) -> Result<()> {
        let manifest = self
            .fetch_manifest(app_id, depot_id, branch, force_depot)
            .await?;
        info!(
            "app {} depot {} manifest {}: {} files listed",
            app_id,
            manifest.depot_id,
            manifest.manifest_id,
            manifest.files.len()
        );

        let dest_root = self
            .config
            .install_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));

        if self.config.manifest_only {
            let listing = serde_json::to_string_pretty(&manifest.files)?;
            let name = format!("manifest_{}_{}.json", manifest.depot_id, manifest.manifest_id);
            tokio::fs::create_dir_all(&dest_root).await?;
            tokio::fs::write(dest_root.join(&name), listing).await?;
            info!("wrote manifest listing {}", name);
            return Ok(());
        }

        let selected: Vec<&ManifestFile> = match &self.config.file_filter {
            Some(filter) => manifest
                .files
                .iter()
                .filter(|f| filter.matches(&f.path))
                .collect(),
            None => manifest.files.iter().collect(),
        };
        info!("{} of {} files selected", selected.len(), manifest.files.len());

        let mut fetches = Vec::with_capacity(selected.len());
        for file in selected {
            fetches.push(self.fetch_file(file, &dest_root));
        }
        let results: Vec<Result<()>> = futures::stream::iter(fetches)
            .buffer_unordered(self.config.max_downloads.max(1))
            .collect()
            .await;

        for result in results {
            result?;
        }
        Ok(())
    }
}

#[async_trait]
impl ContentDownloader for HttpContentDownloader {
    async fn initialize(&mut self, credentials: &Credentials) -> Result<()> {
        let client = reqwest::Client::builder()
            .user_agent(format!("{NAME}/{VERSION}"))
            .build()?;
        self.credentials = credentials.clone();
        self.client = Some(client);

        // Authenticated sessions are verified up front; anonymous ones are
        // established lazily by the first request
        if self.credentials.username.is_some() {
            let url = format!("{}/session", self.endpoint);
            self.authorized(self.client()?.get(&url))
                .send()
                .await?
                .error_for_status()?;
            info!("authenticated session established");
        }
        Ok(())
    }

    async fn download_app(
        &mut self,
        app_id: u32,
        depot_id: Option<u32>,
        branch: &str,
        force_depot: bool,
    ) -> i32 {
        match self.run_job(app_id, depot_id, branch, force_depot).await {
            Ok(()) => EXIT_OK,
            Err(e) => {
                warn!("download of app {} failed: {}", app_id, e);
                EXIT_DOWNLOAD_FAILED
            }
        }
    }

    async fn shutdown(&mut self) {
        self.client = None;
        debug!("session released");
    }
}
