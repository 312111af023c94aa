//! Source resolution: turn a segment source into a local decodable file.
//!
//! Local paths are used in place; remote URLs are streamed into a uniquely
//! named temporary file that is deleted when the handle is dropped.

use crate::config::FetchSettings;
use crate::error::{KlippError, Result};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempPath;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument};
use url::Url;

/// A resolved source, ready for decoding.
///
/// Downloaded files are owned by this handle and removed on drop, whether or
/// not extraction succeeded. Local files are never copied or deleted.
#[derive(Debug)]
pub enum FetchedSource {
    /// An existing local file, returned unchanged.
    Local(PathBuf),
    /// A temporary download, deleted when dropped.
    Downloaded(TempPath),
}

impl FetchedSource {
    pub fn path(&self) -> &Path {
        match self {
            FetchedSource::Local(path) => path,
            FetchedSource::Downloaded(temp) => temp,
        }
    }
}

/// Resolves segment sources to local files, downloading when necessary.
pub struct SourceFetcher {
    client: reqwest::Client,
    temp_dir: PathBuf,
}

impl SourceFetcher {
    /// Create a fetcher with bounded connect/read timeouts.
    pub fn new(settings: &FetchSettings, temp_dir: PathBuf) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(settings.connect_timeout_seconds))
            .read_timeout(Duration::from_secs(settings.read_timeout_seconds))
            .build()
            .map_err(|e| KlippError::Config(format!("Failed to build HTTP client: {}", e)))?;

        std::fs::create_dir_all(&temp_dir)?;

        Ok(Self { client, temp_dir })
    }

    /// Resolve a segment source to a local decodable file.
    #[instrument(skip(self))]
    pub async fn fetch(&self, source: &str) -> Result<FetchedSource> {
        if let Some(url) = parse_remote(source) {
            return self.download(&url).await;
        }

        let path = Path::new(source);
        if path.is_file() {
            debug!("Using local source in place");
            return Ok(FetchedSource::Local(path.to_path_buf()));
        }

        Err(KlippError::Download(format!(
            "source is neither a valid URL nor an existing file: {}",
            source
        )))
    }

    /// Stream a remote video into a uniquely named temporary file.
    async fn download(&self, url: &Url) -> Result<FetchedSource> {
        info!("Downloading {}", url);

        let temp_path = tempfile::Builder::new()
            .prefix("klipp-src-")
            .suffix(".mp4")
            .tempfile_in(&self.temp_dir)
            .map_err(|e| KlippError::Download(format!("Cannot create temp file: {}", e)))?
            .into_temp_path();

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| KlippError::Download(format!("{}: {}", url, e)))?
            .error_for_status()
            .map_err(|e| KlippError::Download(format!("{}: {}", url, e)))?;

        let bytes_written =
            persist_stream(url.as_str(), &temp_path, response.bytes_stream()).await?;

        debug!("Downloaded {} bytes to {:?}", bytes_written, temp_path);
        Ok(FetchedSource::Downloaded(temp_path))
    }
}

/// Stream a response body into `path`.
///
/// Every failure, disk writes included, is a [`KlippError::Download`] of
/// this one source, so one bad download skips its segment instead of
/// aborting the run.
async fn persist_stream<S, B, E>(source: &str, path: &Path, mut stream: S) -> Result<u64>
where
    S: futures::Stream<Item = std::result::Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    let mut file = tokio::fs::File::create(path)
        .await
        .map_err(|e| KlippError::Download(format!("{}: {}", source, e)))?;
    let mut bytes_written = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| KlippError::Download(format!("{}: {}", source, e)))?;
        file.write_all(chunk.as_ref())
            .await
            .map_err(|e| KlippError::Download(format!("{}: {}", source, e)))?;
        bytes_written += chunk.as_ref().len() as u64;
    }
    file.flush()
        .await
        .map_err(|e| KlippError::Download(format!("{}: {}", source, e)))?;

    Ok(bytes_written)
}

/// Parse a source string as a remote http(s) URL.
///
/// Anything that fails to parse, or parses with another scheme, is treated
/// as a local path attempt.
fn parse_remote(source: &str) -> Option<Url> {
    let url = Url::parse(source).ok()?;
    match url.scheme() {
        "http" | "https" => Some(url),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher_in(dir: &Path) -> SourceFetcher {
        SourceFetcher::new(&FetchSettings::default(), dir.to_path_buf()).unwrap()
    }

    #[test]
    fn test_parse_remote() {
        assert!(parse_remote("https://example.com/a.mp4").is_some());
        assert!(parse_remote("http://example.com/a.mp4").is_some());
        assert!(parse_remote("/videos/a.mp4").is_none());
        assert!(parse_remote("relative/a.mp4").is_none());
        assert!(parse_remote("file:///videos/a.mp4").is_none());
    }

    #[tokio::test]
    async fn test_local_path_returned_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("a.mp4");
        std::fs::write(&video, b"fake").unwrap();

        let fetcher = fetcher_in(dir.path());
        let fetched = fetcher.fetch(video.to_str().unwrap()).await.unwrap();

        match &fetched {
            FetchedSource::Local(path) => assert_eq!(path, &video),
            other => panic!("expected local source, got {:?}", other),
        }

        // Dropping a local source must not delete the caller's file
        drop(fetched);
        assert!(video.exists());
    }

    #[tokio::test]
    async fn test_missing_local_file_is_download_error() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = fetcher_in(dir.path());

        let err = fetcher.fetch("/nonexistent/video.mp4").await.unwrap_err();
        assert!(matches!(err, KlippError::Download(_)));
        assert!(err.is_local());
    }

    #[tokio::test]
    async fn test_unreachable_url_is_download_error() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = fetcher_in(dir.path());

        // Reserved TEST-NET-1 address, connection refused or times out
        let err = fetcher
            .fetch("http://192.0.2.1:9/video.mp4")
            .await
            .unwrap_err();
        assert!(matches!(err, KlippError::Download(_)));
    }

    #[tokio::test]
    async fn test_persist_stream_writes_all_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a.mp4");

        let chunks: Vec<std::result::Result<&[u8], std::io::Error>> =
            vec![Ok(b"hello "), Ok(b"world")];
        let written = persist_stream(
            "https://example.com/a.mp4",
            &target,
            futures::stream::iter(chunks),
        )
        .await
        .unwrap();

        assert_eq!(written, 11);
        assert_eq!(std::fs::read(&target).unwrap(), b"hello world");
    }

    #[tokio::test]
    async fn test_disk_write_failure_is_download_error() {
        let dir = tempfile::tempdir().unwrap();
        // Parent directory does not exist, so the file cannot be created
        let target = dir.path().join("missing").join("a.mp4");

        let chunks: Vec<std::result::Result<&[u8], std::io::Error>> = vec![Ok(b"data")];
        let err = persist_stream(
            "https://example.com/a.mp4",
            &target,
            futures::stream::iter(chunks),
        )
        .await
        .unwrap_err();

        // A failed write skips this segment rather than aborting the run
        assert!(matches!(err, KlippError::Download(_)));
        assert!(err.is_local());
    }

    #[test]
    fn test_downloaded_temp_file_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let temp_path = tempfile::Builder::new()
            .prefix("klipp-src-")
            .tempfile_in(dir.path())
            .unwrap()
            .into_temp_path();
        let path = temp_path.to_path_buf();
        assert!(path.exists());

        drop(FetchedSource::Downloaded(temp_path));
        assert!(!path.exists());
    }
}
