//! Gzipped tarball inspection and extraction.
//!
//! Plugin releases ship as a `.tar.gz` with a single top-level directory
//! holding the jar, a properties template and a nested theme tarball.

use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::path::{Component, Path, PathBuf};
use tar::Archive;

use crate::error::{HskcError, Result};

fn archive_err(path: &Path, err: impl std::fmt::Display) -> HskcError {
    HskcError::Archive {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

fn open(tarball: &Path) -> Result<Archive<GzDecoder<File>>> {
    let file = File::open(tarball).map_err(|e| archive_err(tarball, e))?;
    Ok(Archive::new(GzDecoder::new(file)))
}

/// Paths of every entry in a `.tar.gz`, as stored in the archive.
pub fn list_entries(tarball: &Path) -> Result<Vec<PathBuf>> {
    let mut archive = open(tarball)?;
    let mut names = Vec::new();

    for entry in archive.entries().map_err(|e| archive_err(tarball, e))? {
        let entry = entry.map_err(|e| archive_err(tarball, e))?;
        let path = entry.path().map_err(|e| archive_err(tarball, e))?;
        names.push(path.into_owned());
    }

    Ok(names)
}

/// Longest common leading path shared by all entries.
///
/// `./` prefixes are ignored. Returns `None` when the entries share nothing
/// (or there are none).
pub fn common_root(entries: &[PathBuf]) -> Option<PathBuf> {
    let normalized: Vec<Vec<Component<'_>>> = entries
        .iter()
        .map(|p| {
            p.components()
                .filter(|c| !matches!(c, Component::CurDir))
                .collect()
        })
        .filter(|c: &Vec<_>| !c.is_empty())
        .collect();

    let (first, rest) = normalized.split_first()?;
    let shared = rest.iter().fold(first.len(), |len, comps| {
        first
            .iter()
            .zip(comps.iter())
            .take(len)
            .take_while(|(a, b)| a == b)
            .count()
    });

    if shared == 0 {
        return None;
    }

    Some(first[..shared].iter().collect())
}

/// First entry whose name ends in `.jar`.
pub fn find_jar(entries: &[PathBuf]) -> Option<PathBuf> {
    entries
        .iter()
        .find(|p| p.extension().is_some_and(|ext| ext == "jar"))
        .cloned()
}

/// Unpack `tarball` into `into`, returning the extracted top-level directory.
///
/// If that directory already exists it is deleted first, so stale files
/// from an earlier release never linger.
pub fn extract(tarball: &Path, into: &Path) -> Result<PathBuf> {
    let entries = list_entries(tarball)?;
    let root = common_root(&entries)
        .filter(|r| r.is_relative())
        .ok_or_else(|| archive_err(tarball, "archive has no common top-level directory"))?;
    let extract_dir = into.join(&root);

    if extract_dir.exists() {
        tracing::info!(
            "Deleting directory '{}' because it already exists",
            extract_dir.display()
        );
        if extract_dir.is_dir() {
            fs::remove_dir_all(&extract_dir)?;
        } else {
            fs::remove_file(&extract_dir)?;
        }
    }

    fs::create_dir_all(into)?;
    open(tarball)?
        .unpack(into)
        .map_err(|e| archive_err(tarball, e))?;

    tracing::debug!(
        "Extracted {} entries from {} to {}",
        entries.len(),
        tarball.display(),
        extract_dir.display()
    );
    Ok(extract_dir)
}

#[cfg(test)]
pub(crate) mod testing {
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::fs::File;
    use std::path::Path;

    /// Write a `.tar.gz` holding `(path, content)` files.
    pub fn write_tarball(dest: &Path, files: &[(&str, &[u8])]) {
        let file = File::create(dest).unwrap();
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
        for (path, content) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, path, *content).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::testing::write_tarball;
    use super::*;
    use tempfile::TempDir;

    fn paths(items: &[&str]) -> Vec<PathBuf> {
        items.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn common_root_of_single_directory() {
        let entries = paths(&[
            "hs-authenticator/",
            "hs-authenticator/plugin.jar",
            "hs-authenticator/hs-theme.tar.gz",
        ]);
        assert_eq!(common_root(&entries), Some(PathBuf::from("hs-authenticator")));
    }

    #[test]
    fn common_root_ignores_dot_prefix() {
        let entries = paths(&["./hs-themes/a.ftl", "./hs-themes/b.ftl"]);
        assert_eq!(common_root(&entries), Some(PathBuf::from("hs-themes")));
    }

    #[test]
    fn common_root_is_deepest_shared_path() {
        let entries = paths(&["a/b/c.txt", "a/b/d.txt"]);
        assert_eq!(common_root(&entries), Some(PathBuf::from("a/b")));
    }

    #[test]
    fn common_root_none_for_disjoint_entries() {
        assert_eq!(common_root(&paths(&["a/x", "b/y"])), None);
        assert_eq!(common_root(&[]), None);
    }

    #[test]
    fn find_jar_picks_first_jar() {
        let entries = paths(&["d/readme.txt", "d/hs-plugin.jar", "d/other.jar"]);
        assert_eq!(find_jar(&entries), Some(PathBuf::from("d/hs-plugin.jar")));
        assert_eq!(find_jar(&paths(&["d/readme.txt"])), None);
    }

    #[test]
    fn extract_unpacks_and_returns_root() {
        let temp = TempDir::new().unwrap();
        let tarball = temp.path().join("plugin.tar.gz");
        write_tarball(
            &tarball,
            &[
                ("hs-authenticator/hs-plugin.jar", b"jar"),
                ("hs-authenticator/hypersign.properties", b"x=y"),
            ],
        );

        let entries = list_entries(&tarball).unwrap();
        assert_eq!(entries.len(), 2);

        let out = temp.path().join("work");
        let dir = extract(&tarball, &out).unwrap();
        assert_eq!(dir, out.join("hs-authenticator"));
        assert_eq!(fs::read(dir.join("hs-plugin.jar")).unwrap(), b"jar");
    }

    #[test]
    fn extract_replaces_stale_directory() {
        let temp = TempDir::new().unwrap();
        let tarball = temp.path().join("plugin.tar.gz");
        write_tarball(&tarball, &[("hs-authenticator/new.jar", b"new")]);

        let stale = temp.path().join("hs-authenticator");
        fs::create_dir_all(&stale).unwrap();
        fs::write(stale.join("old.jar"), "old").unwrap();

        let dir = extract(&tarball, temp.path()).unwrap();
        assert!(dir.join("new.jar").exists());
        assert!(!dir.join("old.jar").exists());
    }

    #[test]
    fn corrupt_archive_is_archive_error() {
        let temp = TempDir::new().unwrap();
        let tarball = temp.path().join("bad.tar.gz");
        fs::write(&tarball, b"not gzip").unwrap();

        let err = list_entries(&tarball).unwrap_err();
        assert!(matches!(err, HskcError::Archive { .. }));
    }
}
