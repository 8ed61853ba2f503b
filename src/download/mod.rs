//! Artifact download with checksum verification.
//!
//! The plugin tarball is fetched once and verified against a SHA-512 taken
//! from the environment:
//!
//! - File already present: checksum matches, skip; mismatch, fatal.
//! - File absent: download, then checksum; mismatch, fatal.
//!
//! A mismatch never deletes anything. The user removes the corrupted file
//! (or fixes the expected checksum) and re-runs.

pub mod checksum;
pub mod fetch;

pub use checksum::{sha512sum, verify_sha512};
pub use fetch::HttpFetcher;

use std::path::{Path, PathBuf};

use crate::error::{HskcError, Result};

/// What [`download_with_checks`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// A verified copy was already on disk.
    AlreadyPresent,
    /// The file was fetched and verified.
    Downloaded,
}

/// Download `url` to `path` unless a verified copy is already there.
pub fn download_with_checks(
    fetcher: &HttpFetcher,
    url: &str,
    path: &Path,
    expected: &str,
) -> Result<DownloadOutcome> {
    if path.exists() {
        match verify_sha512(path, expected) {
            Ok(_) => {
                tracing::info!(
                    "Download '{}' from '{}' already exists. Skipping....",
                    path.display(),
                    url
                );
                return Ok(DownloadOutcome::AlreadyPresent);
            }
            Err(err) => {
                tracing::warn!(
                    "Either update the checksum or delete '{}' and try again!",
                    path.display()
                );
                return Err(err);
            }
        }
    }

    tracing::info!("Downloading '{}' to '{}'...", url, path.display());
    fetcher.download_to(url, path)?;
    verify_sha512(path, expected)?;
    Ok(DownloadOutcome::Downloaded)
}

/// Like [`download_with_checks`], naming the file after the URL's last
/// path segment inside `dir`.
pub fn download_with_checks_get_path(
    fetcher: &HttpFetcher,
    url: &str,
    dir: &Path,
    expected: &str,
) -> Result<PathBuf> {
    let path = dir.join(file_name_from_url(url)?);
    download_with_checks(fetcher, url, &path, expected)?;
    Ok(path)
}

/// Last path segment of a URL, with query and fragment removed.
pub fn file_name_from_url(url: &str) -> Result<String> {
    let trimmed = url
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim_end_matches('/');
    let without_scheme = trimmed
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(trimmed);

    without_scheme
        .split_once('/')
        .and_then(|(_, path)| path.rsplit('/').next())
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
        .map(String::from)
        .ok_or_else(|| HskcError::Download {
            url: url.to_string(),
            message: "URL has no file name to save as".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    const ABC_SHA512: &str = "ddaf35a193617abacc417349ae20413112e6fa4e89a97ea20a9eeee64b55d39a2192992a274fc1a836ba3c23a3feebbd454d4423643ce80e2a9ac94fa54ca49f";

    fn fetcher() -> HttpFetcher {
        HttpFetcher::with_timeout(Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn verified_file_on_disk_is_not_fetched_again() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/plugin.tar.gz");
            then.status(200).body("abc");
        });
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("plugin.tar.gz");
        fs::write(&path, "abc").unwrap();

        let outcome =
            download_with_checks(&fetcher(), &server.url("/plugin.tar.gz"), &path, ABC_SHA512)
                .unwrap();

        assert_eq!(outcome, DownloadOutcome::AlreadyPresent);
        mock.assert_calls(0);
    }

    #[test]
    fn corrupt_file_on_disk_is_fatal_and_kept() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/plugin.tar.gz");
            then.status(200).body("abc");
        });
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("plugin.tar.gz");
        fs::write(&path, "corrupt").unwrap();

        let err =
            download_with_checks(&fetcher(), &server.url("/plugin.tar.gz"), &path, ABC_SHA512)
                .unwrap_err();

        assert!(matches!(err, HskcError::ChecksumMismatch { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "corrupt");
        mock.assert_calls(0);
    }

    #[test]
    fn absent_file_is_fetched_and_verified() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/v1/plugin.tar.gz");
            then.status(200).body("abc");
        });
        let temp = TempDir::new().unwrap();

        let path = download_with_checks_get_path(
            &fetcher(),
            &server.url("/v1/plugin.tar.gz"),
            temp.path(),
            ABC_SHA512,
        )
        .unwrap();

        assert_eq!(path, temp.path().join("plugin.tar.gz"));
        mock.assert_calls(1);
    }

    #[test]
    fn file_name_is_last_segment() {
        let url = "https://github.com/hypermine-bc/hs-authenticator/releases/download/v1.0.1/hs-authenticator.tar.gz";
        assert_eq!(file_name_from_url(url).unwrap(), "hs-authenticator.tar.gz");
    }

    #[test]
    fn file_name_ignores_query_and_fragment() {
        assert_eq!(
            file_name_from_url("http://h/a/b.tgz?token=x#frag").unwrap(),
            "b.tgz"
        );
    }

    #[test]
    fn file_name_requires_a_path() {
        assert!(file_name_from_url("https://example.com").is_err());
        assert!(file_name_from_url("https://example.com/").is_err());
    }
}
