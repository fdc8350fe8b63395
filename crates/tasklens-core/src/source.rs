use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, anyhow};
use tracing::{debug, info, instrument};

use crate::config::Config;
use crate::item::Item;

pub const DEFAULT_SOURCE_URL: &str = "https://jsonplaceholder.typicode.com/todos";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Produces the initial collection.
#[allow(async_fn_in_trait)]
pub trait ItemSource {
    async fn fetch(&self) -> anyhow::Result<Vec<Item>>;
}

#[derive(Debug, Clone)]
pub struct HttpSource {
    url: String,
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed building HTTP client for item fetch")?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl ItemSource for HttpSource {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn fetch(&self) -> anyhow::Result<Vec<Item>> {
        let response = self
            .client
            .get(self.url.as_str())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .with_context(|| format!("failed requesting {}", self.url))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .with_context(|| format!("failed reading response body from {}", self.url))?;

        if !status.is_success() {
            return Err(anyhow!("{} returned HTTP {status}", self.url));
        }

        debug!(bytes = body.len(), "received item payload");
        parse_items(&body).with_context(|| format!("invalid item payload from {}", self.url))
    }
}

#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ItemSource for FileSource {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn fetch(&self) -> anyhow::Result<Vec<Item>> {
        let body = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        parse_items(&body).with_context(|| format!("invalid item payload in {}", self.path.display()))
    }
}

#[derive(Debug, Clone)]
pub enum Source {
    Http(HttpSource),
    File(FileSource),
}

impl Source {
    /// `source.file` wins over `source.url`; with neither set the public
    /// placeholder endpoint is used.
    #[instrument(skip(cfg))]
    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        if let Some(path) = cfg.get("source.file").filter(|p| !p.trim().is_empty()) {
            info!(path = %path, "using file item source");
            return Ok(Self::File(FileSource::new(crate::config::expand_tilde(
                std::path::Path::new(path.trim()),
            ))));
        }

        let url = cfg
            .get("source.url")
            .unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string());
        let timeout = match cfg.get("source.timeout") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("invalid source.timeout: {raw}"))?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        info!(url = %url, timeout, "using http item source");
        Ok(Self::Http(HttpSource::new(
            url,
            Duration::from_secs(timeout),
        )?))
    }
}

impl ItemSource for Source {
    async fn fetch(&self) -> anyhow::Result<Vec<Item>> {
        match self {
            Self::Http(source) => source.fetch().await,
            Self::File(source) => source.fetch().await,
        }
    }
}

fn parse_items(body: &str) -> anyhow::Result<Vec<Item>> {
    let items: Vec<Item> = serde_json::from_str(body)?;
    debug!(count = items.len(), "parsed items");
    Ok(items)
}
