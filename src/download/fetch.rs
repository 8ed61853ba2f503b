//! HTTP artifact fetching.

use reqwest::blocking::Client;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{HskcError, Result};

/// Fetches artifacts over HTTP/HTTPS.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher with the default 10-minute timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(600))
    }

    /// Create a fetcher with a custom overall timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("hskc/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(30))
            .timeout(timeout)
            .build()
            .map_err(|e| HskcError::Other(anyhow::anyhow!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Stream `url` into `dest`, returning the number of bytes written.
    ///
    /// The body goes to `<dest>.part` first and is renamed into place only
    /// once complete, so an interrupted transfer never looks like a finished
    /// download.
    pub fn download_to(&self, url: &str, dest: &Path) -> Result<u64> {
        let download_err = |message: String| HskcError::Download {
            url: url.to_string(),
            message,
        };

        let mut response = self
            .client
            .get(url)
            .send()
            .map_err(|e| download_err(e.to_string()))?;

        if !response.status().is_success() {
            return Err(download_err(format!("HTTP {}", response.status())));
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        let part = part_path(dest);
        let written = {
            let mut writer = BufWriter::new(File::create(&part)?);
            let n = io::copy(&mut response, &mut writer).map_err(|e| {
                let _ = fs::remove_file(&part);
                download_err(e.to_string())
            })?;
            writer.flush()?;
            n
        };
        fs::rename(&part, dest)?;

        tracing::debug!("Wrote {} bytes to {}", written, dest.display());
        Ok(written)
    }
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}
