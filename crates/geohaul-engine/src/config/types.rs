//! Job configuration types.

use std::path::PathBuf;

use serde::Deserialize;

fn default_max_tries() -> u32 {
    5
}

fn default_retry_wait_secs() -> u64 {
    2
}

fn default_strict_json() -> bool {
    true
}

fn default_max_record_cap() -> u64 {
    10_000
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Destination flavor; decides the artifact name budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkKind {
    /// Flat files in a directory; the folder path eats into the name budget.
    #[default]
    Folder,
    /// Record-oriented workspace with a short absolute component limit.
    Workspace,
}

/// Optional credentials for token acquisition.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Referring domain to authenticate against; derived from the endpoint
    /// when absent.
    #[serde(default)]
    pub referer: Option<String>,
    /// Pre-issued token; bypasses the credential provider entirely.
    #[serde(default)]
    pub token: Option<String>,
}

/// One extraction job, as loaded from the job YAML.
#[derive(Debug, Clone, Deserialize)]
pub struct JobConfig {
    /// Catalog root, service, or single-layer endpoint.
    pub endpoint: String,
    /// Directory artifacts, sidecars, and style descriptors land in.
    pub output_dir: PathBuf,
    #[serde(default)]
    pub sink: SinkKind,
    /// Attempt cap per window fetch.
    #[serde(default = "default_max_tries")]
    pub max_tries: u32,
    /// Wait between fetch attempts.
    #[serde(default = "default_retry_wait_secs")]
    pub retry_wait_secs: u64,
    /// Require layers to advertise JSON query output.
    #[serde(default = "default_strict_json")]
    pub strict_json: bool,
    /// Row filter conjoined with every query.
    #[serde(default, rename = "where")]
    pub where_clause: Option<String>,
    #[serde(default)]
    pub auth: AuthConfig,
    /// Sanity ceiling for server-advertised record caps.
    #[serde(default = "default_max_record_cap")]
    pub max_record_cap: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl JobConfig {
    pub fn row_filter(&self) -> Option<&str> {
        self.where_clause
            .as_deref()
            .filter(|clause| !clause.trim().is_empty())
    }
}
