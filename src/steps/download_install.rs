//! Download the plugin and install it into Keycloak.

use std::fs;
use std::path::{Path, PathBuf};

use crate::archive;
use crate::download::download_with_checks_get_path;
use crate::error::{HskcError, Result};
use crate::keycloak::KeycloakHandle;

use super::{InstallContext, InstallStep};

/// Theme archive shipped inside the plugin archive.
pub const THEME_TARBALL_NAME: &str = "hs-theme.tar.gz";

pub const PROPERTIES_FILE_NAME: &str = "hypersign.properties";

/// JBoss modules the plugin jar links against.
pub const MODULE_DEPENDENCIES: &[&str] = &[
    "org.keycloak.keycloak-common",
    "org.keycloak.keycloak-core",
    "org.keycloak.keycloak-services",
    "org.keycloak.keycloak-model-jpa",
    "org.keycloak.keycloak-server-spi",
    "org.keycloak.keycloak-server-spi-private",
    "javax.ws.rs.api",
    "javax.persistence.api",
    "org.hibernate",
    "org.javassist",
    "org.liquibase",
    "com.fasterxml.jackson.core.jackson-core",
    "com.fasterxml.jackson.core.jackson-databind",
    "com.fasterxml.jackson.core.jackson-annotations",
    "org.jboss.resteasy.resteasy-jaxrs",
    "org.jboss.logging",
    "org.apache.httpcomponents",
    "org.apache.commons.codec",
    "org.keycloak.keycloak-wildfly-adduser",
];

/// Contents of `hypersign.properties`.
pub fn properties_text(auth_server_endpoint: &str) -> String {
    format!(
        "# Hypersign Auth Server (hs-auth-server node app) URL\nauth-server-endpoint={}\n",
        auth_server_endpoint
    )
}

/// Absolute path of the jar once `tarball` is extracted into `workdir`.
pub fn jar_path(tarball: &Path, workdir: &Path) -> Result<PathBuf> {
    let entries = archive::list_entries(tarball)?;
    let jar = archive::find_jar(&entries).ok_or_else(|| HskcError::Archive {
        path: tarball.to_path_buf(),
        message: "no .jar file in archive".to_string(),
    })?;
    Ok(workdir.join(jar))
}

/// Extract the nested theme archive and copy its top-level entries into the
/// login theme.
fn install_theme(keycloak: &KeycloakHandle, extract_dir: &Path) -> Result<PathBuf> {
    let themes_tarball = extract_dir.join(THEME_TARBALL_NAME);
    let themes_dir = archive::extract(&themes_tarball, extract_dir)?;
    tracing::info!("Themes have been extracted to {}", themes_dir.display());

    let mut files = Vec::new();
    for entry in fs::read_dir(&themes_dir)? {
        files.push(entry?.path());
    }
    files.sort();

    keycloak.add_login_theme_files(&files)?;
    Ok(themes_dir)
}

/// Replace the module with a fresh copy of the jar.
fn deploy_module(keycloak: &KeycloakHandle, module_name: &str, jar: &Path) -> Result<()> {
    keycloak.delete_module(module_name)?;
    keycloak.add_module(module_name, jar, MODULE_DEPENDENCIES)
}

/// Fetch, verify and unpack the plugin, then wire it into Keycloak.
pub struct DownloadInstall;

impl InstallStep for DownloadInstall {
    fn name(&self) -> &'static str {
        "download-install"
    }

    fn description(&self) -> &'static str {
        "Download, verify and install the authenticator plugin"
    }

    fn run(&self, ctx: &mut InstallContext<'_>) -> Result<()> {
        let settings = ctx.settings;
        let plugin = &settings.plugin;
        fs::create_dir_all(&settings.workdir)?;

        ctx.ui
            .message(&format!("Downloading plugin from {}", plugin.build_url));
        let tarball = download_with_checks_get_path(
            ctx.fetcher,
            &plugin.build_url,
            &settings.workdir,
            &plugin.checksum,
        )?;
        ctx.ui
            .message(&format!("Plugin tarball downloaded to {}", tarball.display()));

        ctx.ui.message("Extracting files...");
        let extract_dir = archive::extract(&tarball, &settings.workdir)?;

        ctx.ui.message("Installing theme...");
        install_theme(ctx.keycloak, &extract_dir)?;

        ctx.ui.message(&format!(
            "Deploying configuration. hs-auth-server is at {}",
            plugin.auth_server_endpoint
        ));
        ctx.keycloak.add_config_file(
            PROPERTIES_FILE_NAME,
            &properties_text(&plugin.auth_server_endpoint),
        )?;

        ctx.ui
            .message(&format!("Deploying module {}", plugin.module_name));
        let jar = jar_path(&tarball, &settings.workdir)?;
        deploy_module(ctx.keycloak, &plugin.module_name, &jar)?;

        ctx.start_keycloak()?;
        if ctx.keycloak.is_module_registered(&plugin.module_name)? {
            ctx.ui.message(&format!(
                "Not registering module {} since it is already registered!",
                plugin.module_name
            ));
            return Ok(());
        }

        // The server rewrites its configuration on shutdown, so edit it while
        // stopped.
        ctx.ui
            .message(&format!("Registering module {}", plugin.module_name));
        ctx.stop_keycloak()?;
        ctx.keycloak.register_module(&plugin.module_name)?;
        ctx.start_keycloak()?;
        ctx.ui
            .success(&format!("Module {} registered in keycloak!", plugin.module_name));
        Ok(())
    }
}
