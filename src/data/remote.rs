//! Remote-folder resource provider over HTTP.
//!
//! Transport is deliberately minimal: the pipeline only ever needs "list
//! resources / fetch bytes by name". The folder publishes a `manifest.txt`
//! with one resource name per line, and each resource is a plain GET next to
//! it. Anything richer (signed URLs, provider-specific listings) belongs in
//! a different `ResourceProvider` implementation.

use reqwest::blocking::Client;

use crate::data::provider::ResourceProvider;
use crate::error::AppError;

/// Environment variable consulted by [`RemoteFolderProvider::from_env`].
pub const BASE_URL_ENV: &str = "BANKTAB_BASE_URL";

/// Name of the listing resource at the folder base.
const MANIFEST: &str = "manifest.txt";

/// Serves resources from `<base_url>/<name>`.
pub struct RemoteFolderProvider {
    client: Client,
    base_url: String,
}

impl RemoteFolderProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            base_url,
        }
    }

    /// Build a provider from `BANKTAB_BASE_URL` (reading `.env` if present).
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let base_url = std::env::var(BASE_URL_ENV)
            .map_err(|_| AppError::usage(format!("Missing {BASE_URL_ENV} in environment (.env).")))?;
        Ok(Self::new(base_url))
    }

    fn url_for(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, name)
    }

    fn get_bytes(&self, url: &str) -> Result<Vec<u8>, AppError> {
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| AppError::remote(format!("Request to '{url}' failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::remote(format!(
                "Request to '{url}' failed with status {}.",
                resp.status()
            )));
        }

        resp.bytes()
            .map(|b| b.to_vec())
            .map_err(|e| AppError::remote(format!("Failed to read body of '{url}': {e}")))
    }
}

impl ResourceProvider for RemoteFolderProvider {
    fn describe(&self) -> String {
        self.base_url.clone()
    }

    fn list(&self) -> Result<Vec<String>, AppError> {
        let bytes = self.get_bytes(&self.url_for(MANIFEST))?;
        let text = String::from_utf8_lossy(&bytes);
        Ok(parse_manifest(&text))
    }

    fn fetch(&self, name: &str) -> Result<Vec<u8>, AppError> {
        self.get_bytes(&self.url_for(name))
    }
}

/// Extract the CSV resource names from a manifest body, sorted.
fn parse_manifest(text: &str) -> Vec<String> {
    let mut names: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && l.to_lowercase().ends_with(".csv"))
        .map(str::to_string)
        .collect();
    names.sort();
    names
}
