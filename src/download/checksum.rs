//! Streaming SHA-512.

use sha2::{Digest, Sha512};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{HskcError, Result};

const CHUNK_SIZE: usize = 128 * 1024;

/// Hex SHA-512 of a file, read in 128 KiB chunks.
pub fn sha512sum(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha512::new();
    let mut buf = vec![0u8; CHUNK_SIZE];

    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(&hasher.finalize()[..]))
}

/// Check a file against an expected hex SHA-512.
///
/// Returns the actual checksum on success. Hex case is ignored.
pub fn verify_sha512(path: &Path, expected: &str) -> Result<String> {
    let actual = sha512sum(path)?;
    let expected = expected.trim();

    if actual.eq_ignore_ascii_case(expected) {
        Ok(actual)
    } else {
        tracing::warn!(
            "'{}' has checksum '{}' but expected checksum '{}'",
            path.display(),
            actual,
            expected
        );
        Err(HskcError::ChecksumMismatch {
            path: path.to_path_buf(),
            expected: expected.to_string(),
            actual,
        })
    }
}
