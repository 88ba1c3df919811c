//! Application and credential-source paths.

use directories::{BaseDirs, ProjectDirs};
use std::path::{Path, PathBuf};

/// Application paths.
pub struct AppPaths {
    /// Configuration directory.
    pub config: PathBuf,
}

impl AppPaths {
    /// Create paths for the opencodebar application.
    #[must_use]
    pub fn new() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("com", "opencodebar", "opencodebar") {
            Self {
                config: proj_dirs.config_dir().to_path_buf(),
            }
        } else {
            // Fallback to home directory
            let home = home_dir().unwrap_or_else(|| PathBuf::from("."));
            Self {
                config: home.join(".config/opencodebar"),
            }
        }
    }

    /// Path to the config file.
    #[must_use]
    pub fn config_file(&self) -> PathBuf {
        self.config.join("config.toml")
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

/// The user's home directory.
#[must_use]
pub fn home_dir() -> Option<PathBuf> {
    BaseDirs::new().map(|d| d.home_dir().to_path_buf())
}

// =============================================================================
// OpenCode locations
// =============================================================================

/// Candidate `auth.json` files, most preferred first.
#[must_use]
pub fn opencode_auth_files(home: &Path, xdg_data_home: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = Vec::with_capacity(3);
    if let Some(xdg) = xdg_data_home {
        paths.push(xdg.join("opencode").join("auth.json"));
    }
    paths.push(home.join(".local/share/opencode/auth.json"));
    paths.push(home.join("Library/Application Support/opencode/auth.json"));
    paths
}

/// Candidate linked OAuth account files.
#[must_use]
pub fn linked_account_files(home: &Path) -> Vec<PathBuf> {
    vec![
        home.join(".config/opencode/antigravity-accounts.json"),
        home.join(".local/share/opencode/antigravity-accounts.json"),
    ]
}

/// Candidate OpenCode databases.
#[must_use]
pub fn opencode_database_files(home: &Path) -> Vec<PathBuf> {
    vec![
        home.join(".local/share/opencode/opencode.db"),
        home.join("Library/Application Support/opencode/opencode.db"),
    ]
}

/// Well-known location of gcloud application-default credentials.
#[must_use]
pub fn gcloud_adc_file(home: &Path) -> PathBuf {
    home.join(".config/gcloud/application_default_credentials.json")
}
