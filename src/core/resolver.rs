//! Credential resolution.
//!
//! Merges every credential source on the machine into one [`CredentialBag`].
//! Sources are consulted in priority order and each one only fills keys that
//! are still absent:
//!
//! 1. OpenCode `auth.json` (first existing, parseable candidate)
//! 2. Linked OAuth accounts file, nested under `antigravity`
//! 3. Environment variables
//! 4. OpenCode database token, stored under `opencode-zen-token`

use std::path::{Path, PathBuf};

use serde_json::{Map, Value, json};

use crate::core::credentials::{
    CredentialBag, CredentialSource, CredentialValue, DATABASE_TOKEN_KEY, LINKED_ACCOUNTS_KEY,
};
use crate::error::{BarError, Result};
use crate::storage::opencode_db;
use crate::storage::paths;

/// Environment variable → flat key, with an optional nested namespace that
/// also receives `{"access": value}`.
struct EnvMapping {
    var: &'static str,
    flat: &'static str,
    nested: Option<&'static str>,
}

const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var: "OPENAI_API_KEY",
        flat: "openai.key",
        nested: Some("openai"),
    },
    EnvMapping {
        var: "ANTHROPIC_API_KEY",
        flat: "anthropic.key",
        nested: Some("anthropic"),
    },
    EnvMapping {
        var: "OPENROUTER_API_KEY",
        flat: "openrouter.key",
        nested: None,
    },
    EnvMapping {
        var: "GEMINI_API_KEY",
        flat: "gemini.key",
        nested: None,
    },
    EnvMapping {
        var: "GOOGLE_API_KEY",
        flat: "googleaistudio.key",
        nested: None,
    },
    EnvMapping {
        var: "COPILOT_TOKEN",
        flat: "copilot.token",
        nested: None,
    },
    EnvMapping {
        var: "GITHUB_TOKEN",
        flat: "copilot.token",
        nested: None,
    },
];

/// Names of every environment variable the resolver reads.
#[must_use]
pub fn credential_env_vars() -> Vec<&'static str> {
    ENV_MAPPINGS.iter().map(|m| m.var).collect()
}

// =============================================================================
// Locations
// =============================================================================

/// Candidate files for each on-disk source, most preferred first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialLocations {
    pub auth_files: Vec<PathBuf>,
    pub linked_files: Vec<PathBuf>,
    pub database_files: Vec<PathBuf>,
}

impl CredentialLocations {
    /// Standard locations for the current user.
    ///
    /// Without a resolvable home directory every list is empty.
    #[must_use]
    pub fn discover() -> Self {
        let Some(home) = paths::home_dir() else {
            tracing::debug!("no home directory; skipping file-based credential sources");
            return Self::default();
        };
        let xdg = std::env::var_os("XDG_DATA_HOME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        Self::under_home(&home, xdg.as_deref())
    }

    /// Standard locations relative to an explicit home directory.
    #[must_use]
    pub fn under_home(home: &Path, xdg_data_home: Option<&Path>) -> Self {
        Self {
            auth_files: paths::opencode_auth_files(home, xdg_data_home),
            linked_files: paths::linked_account_files(home),
            database_files: paths::opencode_database_files(home),
        }
    }
}

// =============================================================================
// Resolver
// =============================================================================

type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Builds a [`CredentialBag`] from files, environment and database.
pub struct CredentialResolver {
    locations: CredentialLocations,
    env: EnvLookup,
}

impl CredentialResolver {
    /// Resolver over `locations` reading the process environment.
    #[must_use]
    pub fn new(locations: CredentialLocations) -> Self {
        Self {
            locations,
            env: Box::new(|name| std::env::var(name).ok()),
        }
    }

    /// Replace the environment lookup.
    #[must_use]
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Box::new(lookup);
        self
    }

    /// Resolve all sources into a bag.
    ///
    /// # Errors
    /// Returns [`BarError::NoCredentials`] when no source contributed a single
    /// entry.
    pub fn resolve(&self) -> Result<CredentialBag> {
        let mut bag = CredentialBag::new();

        self.load_auth_file(&mut bag);
        self.load_linked_accounts(&mut bag);
        self.load_environment(&mut bag);
        self.load_database_token(&mut bag);

        if bag.is_empty() {
            return Err(BarError::NoCredentials);
        }

        tracing::debug!(
            total = bag.len(),
            auth_file = bag.count_from(CredentialSource::AuthFile),
            linked = bag.count_from(CredentialSource::LinkedAccounts),
            environment = bag.count_from(CredentialSource::Environment),
            database = bag.count_from(CredentialSource::Database),
            "credentials resolved"
        );
        Ok(bag)
    }

    fn load_auth_file(&self, bag: &mut CredentialBag) {
        let Some((path, object)) = first_json_object(&self.locations.auth_files) else {
            return;
        };
        tracing::debug!(path = %path.display(), keys = object.len(), "loaded auth file");
        for (key, value) in object {
            bag.insert_if_absent(key, value, CredentialSource::AuthFile);
        }
    }

    fn load_linked_accounts(&self, bag: &mut CredentialBag) {
        let Some((path, object)) = first_json_object(&self.locations.linked_files) else {
            return;
        };
        let stored = bag.insert_if_absent(
            LINKED_ACCOUNTS_KEY,
            CredentialValue::Object(object),
            CredentialSource::LinkedAccounts,
        );
        tracing::debug!(path = %path.display(), stored, "loaded linked accounts file");
    }

    fn load_environment(&self, bag: &mut CredentialBag) {
        for mapping in ENV_MAPPINGS {
            let Some(value) = (self.env)(mapping.var).filter(|v| !v.is_empty()) else {
                continue;
            };
            if bag.insert_if_absent(mapping.flat, value.as_str(), CredentialSource::Environment) {
                tracing::debug!(var = mapping.var, key = mapping.flat, "credential from environment");
            }
            if let Some(namespace) = mapping.nested {
                let object = json!({ "access": value });
                bag.insert_if_absent(namespace, object, CredentialSource::Environment);
            }
        }
    }

    /// First existing database that yields a control account token.
    fn load_database_token(&self, bag: &mut CredentialBag) {
        for path in self.locations.database_files.iter().filter(|p| p.is_file()) {
            match opencode_db::read_control_token(path) {
                Ok(Some(token)) => {
                    bag.insert_if_absent(DATABASE_TOKEN_KEY, token.as_str(), CredentialSource::Database);
                    tracing::debug!(path = %path.display(), "loaded database token");
                    return;
                }
                Ok(None) => {
                    tracing::debug!(path = %path.display(), "database has no control account token");
                }
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "database token query failed");
                }
            }
        }
    }
}

impl Default for CredentialResolver {
    fn default() -> Self {
        Self::new(CredentialLocations::discover())
    }
}

/// First candidate that exists and parses as a JSON object.
fn first_json_object(candidates: &[PathBuf]) -> Option<(&Path, Map<String, Value>)> {
    for path in candidates {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "unreadable credential file");
                continue;
            }
        };
        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(object)) => return Some((path.as_path(), object)),
            Ok(_) => {
                tracing::debug!(path = %path.display(), "credential file is not a JSON object");
            }
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "unparseable credential file");
            }
        }
    }
    None
}
