//! Files installed into the Keycloak tree.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

use super::KeycloakHandle;

fn copy_recursive(from: &Path, to: &Path) -> Result<()> {
    if from.is_dir() {
        fs::create_dir_all(to)?;
        for entry in fs::read_dir(from)? {
            let entry = entry?;
            copy_recursive(&entry.path(), &to.join(entry.file_name()))?;
        }
    } else {
        fs::copy(from, to)?;
    }
    Ok(())
}

impl KeycloakHandle {
    /// `${KCBASE}/standalone/configuration`.
    pub fn config_dir(&self) -> PathBuf {
        self.kcbase.join("standalone").join("configuration")
    }

    /// `${KCBASE}/themes/base/login`.
    pub fn login_theme_dir(&self) -> PathBuf {
        self.kcbase.join("themes").join("base").join("login")
    }

    /// Write `text` to `name` in the server configuration directory,
    /// replacing any existing file.
    pub fn add_config_file(&self, name: &str, text: &str) -> Result<PathBuf> {
        let path = self.config_dir().join(name);
        fs::write(&path, text)?;
        tracing::debug!("Wrote {}", path.display());
        Ok(path)
    }

    /// Copy theme files (or directories) into the base login theme.
    pub fn add_login_theme_files(&self, files: &[PathBuf]) -> Result<()> {
        let install_dir = self.login_theme_dir();
        fs::create_dir_all(&install_dir)?;

        for file in files {
            let Some(name) = file.file_name() else {
                continue;
            };
            let dest = install_dir.join(name);
            tracing::debug!("Copying {} to {}", file.display(), dest.display());
            copy_recursive(file, &dest)?;
        }
        Ok(())
    }
}
