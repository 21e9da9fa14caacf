//! Object fetch: download the raw bytes behind a document's URL.

use std::{
    collections::HashMap,
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::errors::RagError;

#[async_trait]
pub trait ObjectFetch: Send + Sync {
    /// # Errors
    /// [`RagError::Fetch`] on non-2xx, [`RagError::Transport`] on network failure.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, RagError>;
}

/// Parses `url` and accepts only `http` and `https` locators.
///
/// # Errors
/// [`RagError::UnsupportedUrl`] for unparsable URLs or any other scheme
/// (`file://`, `ftp://`, ...).
pub fn check_object_url(url: &str) -> Result<reqwest::Url, RagError> {
    let parsed = reqwest::Url::parse(url.trim())
        .map_err(|e| RagError::UnsupportedUrl(format!("`{url}`: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(RagError::UnsupportedUrl(format!(
            "scheme `{other}` is not allowed, expected http or https"
        ))),
    }
}

/// `reqwest`-based fetcher. Only `http(s)://` URLs are fetched.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, RagError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ObjectFetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, RagError> {
        let target = check_object_url(url)?;
        debug!(url, "fetching object");
        let resp = self.client.get(target).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(200).collect();
            warn!(status = status.as_u16(), "object fetch returned non-success status");
            return Err(RagError::Fetch {
                status: status.as_u16(),
                url: url.to_string(),
                snippet,
            });
        }
        Ok(resp.bytes().await?.to_vec())
    }
}

/// In-process object store keyed by URL. Unknown URLs answer 404.
#[derive(Default)]
pub struct MemoryFetcher {
    objects: HashMap<String, Result<Vec<u8>, u16>>,
    fetches: AtomicUsize,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(mut self, url: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.objects.insert(url.into(), Ok(bytes.into()));
        self
    }

    /// Makes `url` answer with the given HTTP status.
    pub fn with_status(mut self, url: impl Into<String>, status: u16) -> Self {
        self.objects.insert(url.into(), Err(status));
        self
    }

    /// Number of `fetch` calls served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectFetch for MemoryFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, RagError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        match self.objects.get(url) {
            Some(Ok(bytes)) => Ok(bytes.clone()),
            Some(Err(status)) => Err(RagError::Fetch {
                status: *status,
                url: url.to_string(),
                snippet: String::new(),
            }),
            None => Err(RagError::Fetch {
                status: 404,
                url: url.to_string(),
                snippet: "not found".into(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_fetcher_serves_and_counts() {
        let f = MemoryFetcher::new()
            .with_object("mem://a", "hello")
            .with_status("mem://b", 503);

        assert_eq!(f.fetch("mem://a").await.unwrap(), b"hello");
        assert!(matches!(f.fetch("mem://b").await, Err(RagError::Fetch { status: 503, .. })));
        assert!(matches!(f.fetch("mem://c").await, Err(RagError::Fetch { status: 404, .. })));
        assert_eq!(f.fetch_count(), 3);
    }

    #[test]
    fn only_http_locators_pass_the_check() {
        assert!(check_object_url("https://files.example.com/a.pdf").is_ok());
        assert!(check_object_url("http://127.0.0.1:9000/a.pdf").is_ok());
        for bad in ["file:///etc/passwd", "ftp://host/a.pdf", "/etc/passwd", "not a url"] {
            assert!(
                matches!(check_object_url(bad), Err(RagError::UnsupportedUrl(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn local_files_are_never_read() {
        let dir = std::env::temp_dir().join(format!("rag-store-fetch-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("secret.txt");
        tokio::fs::write(&path, "DB_PASSWORD=hunter2").await.unwrap();

        let f = HttpFetcher::new(Duration::from_secs(1)).unwrap();
        let err = f.fetch(&format!("file://{}", path.display())).await.unwrap_err();
        assert!(matches!(err, RagError::UnsupportedUrl(_)), "{err}");
        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
