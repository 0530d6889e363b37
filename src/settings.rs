use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};

/// Runtime configuration for one batch run, built from the command line and
/// passed down explicitly.
#[derive(Debug, Clone)]
pub struct Settings {
    pub folder: PathBuf,
    pub access_token: String,
    pub graph_url: String,
    pub timeout: Duration,
    pub dry_run: bool,
}

impl Settings {
    pub fn new(
        folder: PathBuf,
        access_token: String,
        graph_url: String,
        timeout_secs: u64,
        dry_run: bool,
    ) -> Result<Self> {
        if !folder.is_dir() {
            bail!("{} is not a directory", folder.display());
        }
        if access_token.trim().is_empty() {
            bail!("Access token is empty; pass --access-token or set MAPILLARY_ACCESS_TOKEN");
        }
        if timeout_secs == 0 {
            bail!("Timeout must be at least 1 second");
        }
        // Request URLs are built as <graph_url>/<image_id>.
        let graph_url = graph_url.trim_end_matches('/').to_string();
        if graph_url.is_empty() {
            bail!("Graph API URL is empty");
        }

        Ok(Self {
            folder,
            access_token,
            graph_url,
            timeout: Duration::from_secs(timeout_secs),
            dry_run,
        })
    }
}
