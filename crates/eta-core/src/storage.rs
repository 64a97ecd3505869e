//! Local persistence of the user's eta id, so a returning session can
//! seed the profile sync without re-deriving the id server-side.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

const ID_FILE: &str = "eta_id.json";

#[derive(Debug, thiserror::Error)]
pub enum IdStoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed id file: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Serialize, Deserialize)]
struct StoredId {
    eta_id: String,
}

pub struct IdStore {
    path: PathBuf,
}

impl IdStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(ID_FILE),
        }
    }

    /// Read the persisted id. A missing file is `Ok(None)`.
    pub fn load(&self) -> Result<Option<String>, IdStoreError> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let stored: StoredId = serde_json::from_str(&json)?;
        Ok(Some(stored.eta_id))
    }

    /// Persist the id, or remove the file when `None`. Removing an
    /// already-absent file is success.
    pub fn store(&self, value: Option<&str>) -> Result<(), IdStoreError> {
        match value {
            Some(eta_id) => {
                if let Some(parent) = self.path.parent() {
                    fs::create_dir_all(parent)?;
                }
                let json = serde_json::to_string_pretty(&StoredId {
                    eta_id: eta_id.to_string(),
                })?;
                fs::write(&self.path, json)?;
            }
            None => match fs::remove_file(&self.path) {
                Ok(()) => {}
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            },
        }
        Ok(())
    }
}
