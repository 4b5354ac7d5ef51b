//! Dataset acquisition from S3-compatible object storage.
//!
//! Objects are plain CSV files fetched over HTTP from
//! `{endpoint}/{bucket}/{key}`; a configured local directory overrides
//! the remote store for development. Any failure — connection, missing
//! object, unreadable CSV — yields an empty record set, which downstream
//! treats identically to "no data".

use crate::config::StorageConfig;
use crate::models::{Domain, RawRecord};
use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Client for the raw dataset provider.
pub struct DatasetStore {
    http_client: reqwest::Client,
    endpoint: String,
    bucket: String,
    academic_key: String,
    placement_key: String,
    evaluation_key: String,
    local_dir: Option<PathBuf>,
}

impl DatasetStore {
    /// Create a store from explicit configuration. Credentials and
    /// endpoints live only in this constructed object; nothing is read
    /// from process-wide state.
    pub fn new(config: &StorageConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http_client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            bucket: config.bucket.clone(),
            academic_key: config.academic_key.clone(),
            placement_key: config.placement_key.clone(),
            evaluation_key: config.evaluation_key.clone(),
            local_dir: config.local_dir.clone(),
        }
    }

    fn key_for(&self, domain: Domain) -> &str {
        match domain {
            Domain::Academic => &self.academic_key,
            Domain::Placement => &self.placement_key,
            Domain::Evaluation => &self.evaluation_key,
        }
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.endpoint, self.bucket, key)
    }

    /// Fetch one domain's dataset. Failures are logged and collapse to an
    /// empty record set.
    pub async fn fetch(&self, domain: Domain) -> Vec<RawRecord> {
        match self.try_fetch(domain).await {
            Ok(rows) => {
                info!(domain = %domain, rows = rows.len(), "fetched dataset");
                rows
            }
            Err(error) => {
                warn!(domain = %domain, "failed to fetch dataset: {error:#}");
                Vec::new()
            }
        }
    }

    async fn try_fetch(&self, domain: Domain) -> Result<Vec<RawRecord>> {
        let key = self.key_for(domain).to_string();

        let bytes = if let Some(dir) = &self.local_dir {
            let path = dir.join(&key);
            debug!(path = %path.display(), "reading local dataset");
            tokio::fs::read(&path)
                .await
                .with_context(|| format!("Failed to read local dataset: {}", path.display()))?
        } else {
            let url = self.object_url(&key);
            debug!(%url, "fetching dataset object");
            let response = self
                .http_client
                .get(&url)
                .send()
                .await
                .with_context(|| format!("Failed to request {url}"))?;
            if !response.status().is_success() {
                bail!("object store returned {} for {url}", response.status());
            }
            response
                .bytes()
                .await
                .context("Failed to read object body")?
                .to_vec()
        };

        parse_csv(&bytes)
    }
}

/// Parse CSV bytes into raw records.
///
/// The reader is flexible: ragged or unreadable lines are skipped and
/// counted rather than failing the whole object, and cells are trimmed.
/// Empty cells stay absent from the record.
pub fn parse_csv(bytes: &[u8]) -> Result<Vec<RawRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .context("Failed to read CSV header row")?
        .clone();

    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(_) => {
                skipped += 1;
                continue;
            }
        };

        let mut row = RawRecord::new();
        for (column, cell) in headers.iter().zip(record.iter()) {
            if !cell.is_empty() {
                row.insert(column, cell);
            }
        }
        rows.push(row);
    }

    if skipped > 0 {
        warn!(count = skipped, "skipped unreadable CSV lines");
    }

    Ok(rows)
}
