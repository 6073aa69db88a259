//! Access keys for portal servers, read from the local key file.
//!
//! The key file is a JSON object mapping an environment name to a key dict:
//!
//! ```json
//! { "fourfront-cgapdev": { "key": "ABC", "secret": "xyz", "server": "http://..." } }
//! ```
//!
//! Its location is `$CGAP_KEYS_FILE` when set, otherwise `~/.cgap-keys.json`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use crate::error::{Result, SubmitError};

pub const KEYS_FILE_ENV_VAR: &str = "CGAP_KEYS_FILE";
pub const DEFAULT_KEYS_FILENAME: &str = ".cgap-keys.json";

#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyDict {
    pub key: String,
    pub secret: String,
    pub server: String,
}

impl KeyDict {
    /// `(key, secret)` for HTTP basic auth.
    pub fn keypair(&self) -> (&str, &str) {
        (&self.key, &self.secret)
    }
}

impl std::fmt::Debug for KeyDict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyDict")
            .field("key", &self.key)
            .field("secret", &"<redacted>")
            .field("server", &self.server)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct KeyManager {
    path: PathBuf,
}

impl KeyManager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        KeyManager { path: path.into() }
    }

    /// Key manager for `$CGAP_KEYS_FILE`, or `~/.cgap-keys.json` when unset.
    pub fn from_env() -> Self {
        Self::new(Self::keys_filename())
    }

    pub fn keys_filename() -> PathBuf {
        match std::env::var_os(KEYS_FILE_ENV_VAR) {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            _ => {
                let home = std::env::var_os("HOME")
                    .or_else(|| std::env::var_os("USERPROFILE"))
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("."));
                home.join(DEFAULT_KEYS_FILENAME)
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<BTreeMap<String, KeyDict>> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            error!(error = ?e, path = %self.path.display(), "Failed to read key file");
            SubmitError::Keys(format!("cannot read {}: {e}", self.path.display()))
        })?;
        let keydicts: BTreeMap<String, KeyDict> = serde_json::from_str(&content).map_err(|e| {
            error!(error = ?e, path = %self.path.display(), "Failed to parse key file");
            SubmitError::Keys(format!("{} is not a valid key file: {e}", self.path.display()))
        })?;
        debug!(path = %self.path.display(), count = keydicts.len(), "Loaded key file");
        Ok(keydicts)
    }

    pub fn keydict_for_server(&self, server: &str) -> Result<KeyDict> {
        let wanted = server.trim_end_matches('/');
        let found = self
            .load()?
            .into_values()
            .find(|keydict| keydict.server.trim_end_matches('/') == wanted);
        match found {
            Some(keydict) => {
                info!(server = wanted, key = %keydict.key, "Found access key for server");
                Ok(keydict)
            }
            None => Err(SubmitError::Keys(format!(
                "No key is defined for {server} in {}",
                self.path.display()
            ))),
        }
    }

    pub fn keydict_for_env(&self, env: &str) -> Result<KeyDict> {
        self.load()?.remove(env).ok_or_else(|| {
            SubmitError::Keys(format!(
                "No key is defined for env {env} in {}",
                self.path.display()
            ))
        })
    }
}
