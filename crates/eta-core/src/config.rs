use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Base URL of the ETA backend, without a trailing slash.
    pub base_url: String,
    /// Directory for voice reply audio files and the persisted eta id.
    pub data_dir: PathBuf,
}

impl CoreConfig {
    pub fn new<P: AsRef<Path>>(base_url: &str, data_dir: P) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self::new("http://localhost:3000", "eta_data")
    }
}
