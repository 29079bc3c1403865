//! Users and backends known to the gateway.
//!
//! Loaded once at startup from a JSON file:
//!
//! ```json
//! {
//!   "users": [{ "username": "alice", "password_hash": "$argon2id$..." }],
//!   "backends": [{ "name": "fermions", "description": "fermionic tweezer simulator" }]
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use qspool_core::error::CoreError;
use qspool_core::naming::{validate_backend_name, validate_username};
use serde::Deserialize;

use crate::auth::password::{is_valid_hash, verify_password};

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("failed to read registry {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid registry file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid registry entry: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserEntry {
    pub username: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendEntry {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    users: Vec<UserEntry>,
    #[serde(default)]
    backends: Vec<BackendEntry>,
}

#[derive(Debug, Default)]
pub struct Registry {
    users: HashMap<String, String>,
    backends: BTreeMap<String, BackendEntry>,
    /// A registered user's hash, verified for unknown usernames so both
    /// rejections cost one Argon2 run.
    decoy_hash: Option<String>,
}

impl Registry {
    /// Read and validate the registry file at `path`.
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let raw = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: RegistryFile = serde_json::from_str(&raw)?;
        Self::from_entries(file.users, file.backends)
    }

    /// Build a registry from already-parsed entries.
    pub fn from_entries(
        users: Vec<UserEntry>,
        backends: Vec<BackendEntry>,
    ) -> Result<Self, RegistryError> {
        let mut registry = Self::default();

        for user in users {
            validate_username(&user.username)
                .map_err(|e| RegistryError::Invalid(e.to_string()))?;
            if !is_valid_hash(&user.password_hash) {
                return Err(RegistryError::Invalid(format!(
                    "user '{}' has no valid password hash",
                    user.username
                )));
            }
            if registry
                .users
                .insert(user.username.clone(), user.password_hash)
                .is_some()
            {
                return Err(RegistryError::Invalid(format!(
                    "duplicate user '{}'",
                    user.username
                )));
            }
        }

        registry.decoy_hash = registry.users.values().next().cloned();

        for backend in backends {
            validate_backend_name(&backend.name)
                .map_err(|e| RegistryError::Invalid(e.to_string()))?;
            let name = backend.name.clone();
            if registry.backends.insert(name.clone(), backend).is_some() {
                return Err(RegistryError::Invalid(format!("duplicate backend '{name}'")));
            }
        }

        Ok(registry)
    }

    /// Check `password` for `username`.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<(), CoreError> {
        let rejected = || CoreError::Unauthorized("Invalid credentials!".into());
        let Some(hash) = self.users.get(username) else {
            if let Some(decoy) = &self.decoy_hash {
                let _ = verify_password(password, decoy);
            }
            return Err(rejected());
        };
        match verify_password(password, hash) {
            Ok(true) => Ok(()),
            Ok(false) => Err(rejected()),
            Err(e) => {
                tracing::error!(username, error = %e, "Stored password hash could not be used");
                Err(rejected())
            }
        }
    }

    /// Fail with `NotFound` unless `name` is a registered backend.
    pub fn require_backend(&self, name: &str) -> Result<&BackendEntry, CoreError> {
        self.backends.get(name).ok_or_else(|| CoreError::NotFound {
            entity: "Backend",
            id: name.to_string(),
        })
    }

    pub fn backends(&self) -> impl Iterator<Item = &BackendEntry> {
        self.backends.values()
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::auth::password::hash_password;

    fn registry() -> Registry {
        Registry::from_entries(
            vec![UserEntry {
                username: "alice".into(),
                password_hash: hash_password("alice-password").unwrap(),
            }],
            vec![BackendEntry {
                name: "fermions".into(),
                description: String::new(),
            }],
        )
        .unwrap()
    }

    #[test]
    fn authenticates_known_user() {
        let registry = registry();
        assert!(registry.authenticate("alice", "alice-password").is_ok());
        assert_matches!(
            registry.authenticate("alice", "wrong"),
            Err(CoreError::Unauthorized(_))
        );
        assert_matches!(
            registry.authenticate("mallory", "alice-password"),
            Err(CoreError::Unauthorized(_))
        );
    }

    #[test]
    fn unknown_user_is_checked_against_decoy_and_rejected() {
        let registry = registry();
        assert!(registry.decoy_hash.is_some());

        // The decoy is alice's hash, so her password must still fail for
        // a name that is not registered.
        assert_matches!(
            registry.authenticate("mallory", "alice-password"),
            Err(CoreError::Unauthorized(msg)) if msg == "Invalid credentials!"
        );
        assert_matches!(
            Registry::default().authenticate("mallory", "x"),
            Err(CoreError::Unauthorized(_))
        );
    }

    #[test]
    fn knows_registered_backends_only() {
        let registry = registry();
        assert_eq!(registry.require_backend("fermions").unwrap().name, "fermions");
        assert_matches!(
            registry.require_backend("something_weird"),
            Err(CoreError::NotFound { entity: "Backend", .. })
        );
    }

    #[test]
    fn rejects_dashed_backend_and_plaintext_password() {
        assert_matches!(
            Registry::from_entries(
                vec![],
                vec![BackendEntry {
                    name: "multi-qudit".into(),
                    description: String::new(),
                }],
            ),
            Err(RegistryError::Invalid(_))
        );
        assert_matches!(
            Registry::from_entries(
                vec![UserEntry {
                    username: "bob".into(),
                    password_hash: "hunter2".into(),
                }],
                vec![],
            ),
            Err(RegistryError::Invalid(_))
        );
    }

    #[test]
    fn loads_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");
        let body = serde_json::json!({
            "users": [{ "username": "spooler", "password_hash": hash_password("s").unwrap() }],
            "backends": [{ "name": "fermions" }, { "name": "singlequdit", "description": "one qudit" }],
        });
        std::fs::write(&path, body.to_string()).unwrap();

        let registry = Registry::load(&path).unwrap();
        assert_eq!(registry.user_count(), 1);
        let names: Vec<_> = registry.backends().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["fermions", "singlequdit"]);
    }

    #[test]
    fn missing_file_is_io_error() {
        assert_matches!(
            Registry::load(Path::new("/definitely/not/here.json")),
            Err(RegistryError::Io { .. })
        );
    }
}
