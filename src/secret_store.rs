use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::PathBuf;

/// Key used to store the default backend in the secret store
const DEFAULT_BACKEND_KEY: &str = "default";

/// Local storage for API keys and the preferred backend
///
/// Secrets live in a JSON file under the ARIA data directory
/// (`~/.aria/secrets.json`).
#[derive(Debug, Serialize, Deserialize)]
pub struct SecretStore {
    /// Map of secret keys to their values
    secrets: HashMap<String, String>,
    /// Path to the secrets file
    file_path: PathBuf,
}

impl SecretStore {
    /// Opens the store at the default location
    ///
    /// # Returns
    ///
    /// * `io::Result<Self>` - The store, or an IO error if the file exists but cannot be read
    pub fn new() -> io::Result<Self> {
        Self::at(crate::config::data_dir().join("secrets.json"))
    }

    /// Opens the store backed by `file_path`, creating its directory if needed
    ///
    /// # Arguments
    ///
    /// * `file_path` - Location of the secrets JSON file
    pub fn at(file_path: impl Into<PathBuf>) -> io::Result<Self> {
        let file_path = file_path.into();
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut store = SecretStore {
            secrets: HashMap::new(),
            file_path,
        };

        store.load()?;
        Ok(store)
    }

    fn load(&mut self) -> io::Result<()> {
        match File::open(&self.file_path) {
            Ok(mut file) => {
                let mut contents = String::new();
                file.read_to_string(&mut contents)?;
                self.secrets = serde_json::from_str(&contents).unwrap_or_else(|e| {
                    log::warn!("ignoring malformed {}: {e}", self.file_path.display());
                    HashMap::new()
                });
                Ok(())
            }
            Err(ref e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn save(&self) -> io::Result<()> {
        let contents = serde_json::to_string_pretty(&self.secrets)?;
        let mut file = File::create(&self.file_path)?;
        file.write_all(contents.as_bytes())?;
        Ok(())
    }

    /// Sets a secret value for the given key
    ///
    /// # Arguments
    ///
    /// * `key` - The key to store the secret under
    /// * `value` - The secret value to store
    pub fn set(&mut self, key: &str, value: &str) -> io::Result<()> {
        self.secrets.insert(key.to_string(), value.to_string());
        self.save()
    }

    /// Retrieves a secret value for the given key
    pub fn get(&self, key: &str) -> Option<&String> {
        self.secrets.get(key)
    }

    /// Deletes a secret with the given key
    pub fn delete(&mut self, key: &str) -> io::Result<()> {
        self.secrets.remove(key);
        self.save()
    }

    /// Sets the backend used when none is given on the command line
    ///
    /// # Arguments
    ///
    /// * `backend` - Backend name, e.g. "openai" or "demo"
    pub fn set_default_backend(&mut self, backend: &str) -> io::Result<()> {
        self.secrets
            .insert(DEFAULT_BACKEND_KEY.to_string(), backend.to_string());
        self.save()
    }

    pub fn get_default_backend(&self) -> Option<&String> {
        self.secrets.get(DEFAULT_BACKEND_KEY)
    }

    pub fn delete_default_backend(&mut self) -> io::Result<()> {
        self.secrets.remove(DEFAULT_BACKEND_KEY);
        self.save()
    }
}
