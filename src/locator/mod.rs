//! Finding the mystem executable, and installing it when it is missing.
//!
//! Resolution order:
//!
//! 1. an explicit path given by the caller;
//! 2. `$MYSTEM3_PATH`;
//! 3. every directory on `$PATH`;
//! 4. the install directory (`$MYSTEM_DIR`, else `~/.local/bin`).
//!
//! The first candidate that is an executable file wins. When none is, the
//! install-directory path is returned anyway so that [`Locator::install`]
//! can put a binary there.

mod archive;

use std::ffi::OsString;
use std::fs;
use std::io::{Seek, SeekFrom};
use std::path::{Path, PathBuf};

pub use archive::{extract_binary, ArchiveEntry, ArchiveKind, ArchiveTable};

use crate::error::InstallError;

/// File name of the analyzer executable.
pub const EXE_NAME: &str = if cfg!(windows) { "mystem.exe" } else { "mystem" };

/// Environment variable naming the binary for the locator.
pub const PATH_ENV_VAR: &str = "MYSTEM3_PATH";

/// Environment variable naming the installation root.
pub const DIR_ENV_VAR: &str = "MYSTEM_DIR";

/// Resolves and installs the analyzer binary.
///
/// Built from explicit values so several sessions with different overrides
/// can coexist in one process.
#[derive(Debug, Clone)]
pub struct Locator {
    explicit: Option<PathBuf>,
    env_override: Option<PathBuf>,
    search_path: Option<OsString>,
    install_dir: PathBuf,
    archives: ArchiveTable,
}

impl Locator {
    /// Locator with no overrides, no search path and the given install
    /// directory.
    pub fn new(install_dir: impl Into<PathBuf>) -> Self {
        Self {
            explicit: None,
            env_override: None,
            search_path: None,
            install_dir: install_dir.into(),
            archives: ArchiveTable::default(),
        }
    }

    /// Locator reading `$MYSTEM3_PATH`, `$PATH` and `$MYSTEM_DIR`.
    pub fn from_env() -> Self {
        let install_dir = std::env::var_os(DIR_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(default_install_dir);
        Self {
            env_override: std::env::var_os(PATH_ENV_VAR).map(PathBuf::from),
            search_path: std::env::var_os("PATH"),
            ..Self::new(install_dir)
        }
    }

    pub fn with_explicit(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit = Some(path.into());
        self
    }

    pub fn with_env_override(mut self, path: Option<PathBuf>) -> Self {
        self.env_override = path;
        self
    }

    pub fn with_search_path(mut self, path: Option<OsString>) -> Self {
        self.search_path = path;
        self
    }

    pub fn with_install_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.install_dir = dir.into();
        self
    }

    pub fn with_archives(mut self, archives: ArchiveTable) -> Self {
        self.archives = archives;
        self
    }

    pub fn install_dir(&self) -> &Path {
        &self.install_dir
    }

    /// Where a freshly installed binary ends up.
    pub fn fallback_path(&self) -> PathBuf {
        self.install_dir.join(EXE_NAME)
    }

    /// First executable candidate, or the fallback path.
    pub fn resolve(&self) -> PathBuf {
        let search_dirs = self
            .search_path
            .as_deref()
            .map(|p| std::env::split_paths(p).collect::<Vec<_>>())
            .unwrap_or_default();

        self.explicit
            .iter()
            .chain(self.env_override.iter())
            .cloned()
            .chain(search_dirs.into_iter().map(|dir| dir.join(EXE_NAME)))
            .find(|candidate| is_executable(candidate))
            .unwrap_or_else(|| self.fallback_path())
    }

    /// Install the binary unless `resolve()` already names a file.
    ///
    /// Returns the path to use.
    pub fn autoinstall(&self) -> Result<PathBuf, InstallError> {
        let resolved = self.resolve();
        if resolved.is_file() {
            return Ok(resolved);
        }
        self.install(&self.install_dir)
    }

    /// Download the host's archive and extract the analyzer into
    /// `destination`, overwriting any existing binary.
    pub fn install(&self, destination: &Path) -> Result<PathBuf, InstallError> {
        let url = self.archives.for_host()?;
        let failure = |reason: String| InstallError::InstallFailure {
            url: url.to_string(),
            reason,
        };
        let kind = ArchiveKind::from_url(url)
            .ok_or_else(|| failure("unrecognized archive format".to_string()))?;

        tracing::info!(%url, destination = %destination.display(), "Installing mystem");

        fs::create_dir_all(destination).map_err(|e| {
            failure(format!("cannot create '{}': {e}", destination.display()))
        })?;

        let mut archive = tempfile::tempfile().map_err(|e| failure(e.to_string()))?;
        download(url, &mut archive).map_err(failure)?;
        archive
            .seek(SeekFrom::Start(0))
            .map_err(|e| failure(e.to_string()))?;

        let binary =
            extract_binary(kind, archive, destination).map_err(|e| failure(e.to_string()))?;
        make_executable(&binary).map_err(|e| failure(e.to_string()))?;

        tracing::info!(path = %binary.display(), "Installed mystem");
        Ok(binary)
    }
}

impl Default for Locator {
    fn default() -> Self {
        Self::from_env()
    }
}

fn default_install_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".local")
        .join("bin")
}

fn download(url: &str, out: &mut fs::File) -> Result<(), String> {
    let mut response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|e| e.to_string())?;
    let bytes = response.copy_to(out).map_err(|e| e.to_string())?;
    tracing::debug!(bytes, "Downloaded mystem archive");
    Ok(())
}

fn is_executable(path: &Path) -> bool {
    let Ok(metadata) = fs::metadata(path) else {
        return false;
    };
    metadata.is_file() && has_exec_bit(&metadata)
}

#[cfg(unix)]
fn has_exec_bit(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn has_exec_bit(_metadata: &fs::Metadata) -> bool {
    true
}

fn make_executable(path: &Path) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}
