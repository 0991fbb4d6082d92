use std::fs;
use std::io;
use std::path::Path;

use async_trait::async_trait;
use tracing::info;

use crate::error::{PipelineError, Result};

/// Retrieves the raw bytes behind a URL.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Plain HTTP GET without retries: a failed fetch ends the run.
#[derive(Default, Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let fetch_error = |reason: String| PipelineError::Fetch {
            url: url.to_string(),
            reason,
        };
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|err| fetch_error(err.to_string()))?;
        let body = response
            .bytes()
            .await
            .map_err(|err| fetch_error(err.to_string()))?;
        check_body(&body).map_err(|reason| fetch_error(reason.to_string()))?;
        Ok(body.to_vec())
    }
}

/// Rejects bodies that cannot be a data file.
fn check_body(body: &[u8]) -> std::result::Result<(), &'static str> {
    let head = String::from_utf8_lossy(&body[..body.len().min(64)]).to_ascii_lowercase();
    let head = head.trim_start();
    if head.is_empty() {
        Err("empty response body")
    } else if head.starts_with("<!doctype html") || head.starts_with("<html") {
        Err("response is an HTML page rather than data")
    } else {
        Ok(())
    }
}

/// Local storage for downloaded files.
pub trait CacheStore: Send + Sync {
    fn exists(&self, path: &Path) -> bool;
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
    /// Writes `data`, creating missing parent directories.
    fn write(&self, path: &Path, data: &[u8]) -> io::Result<()>;
}

#[derive(Default, Debug, Clone, Copy)]
pub struct LocalCache;

impl CacheStore for LocalCache {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn write(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, data)
    }
}

/// Contents of a cached download.
#[derive(Debug, Clone)]
pub struct Cached {
    pub bytes: Vec<u8>,
    /// True when the file was downloaded during this call.
    pub fetched: bool,
}

/// Returns the file at `path`, downloading it from `url` first if it is absent.
///
/// Presence is the only check: an existing file is never refreshed.
/// Concurrent runs may both download and race on the write.
pub async fn fetch_cached<F, S>(fetcher: &F, store: &S, url: &str, path: &Path) -> Result<Cached>
where
    F: Fetcher + ?Sized,
    S: CacheStore + ?Sized,
{
    if store.exists(path) {
        info!(path = %path.display(), "cached file exists; skipping download");
        let bytes = store.read(path)?;
        return Ok(Cached {
            bytes,
            fetched: false,
        });
    }
    info!(url, path = %path.display(), "downloading");
    let bytes = fetcher.fetch(url).await?;
    store.write(path, &bytes).map_err(|source| PipelineError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Cached {
        bytes,
        fetched: true,
    })
}
