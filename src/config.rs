use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::Result;

pub const DEFAULT_CONFIG_FILE: &str = "daikinskyport.conf";

/// Credential document as stored on disk.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(rename = "EMAIL", default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "PASSWORD", default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(rename = "ACCESS_TOKEN", default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(rename = "REFRESH_TOKEN", default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            password: Some(password.into()),
            ..Default::default()
        }
    }

    /// The document written after login or refresh. The password is never persisted here.
    pub(crate) fn tokens_only(&self) -> Self {
        Self {
            email: self.email.clone(),
            password: None,
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &redact(&self.password))
            .field("access_token", &redact(&self.access_token))
            .field("refresh_token", &redact(&self.refresh_token))
            .finish()
    }
}

/// Whole-document credential persistence.
pub trait ConfigStore: Send {
    fn load(&self) -> Result<Credentials>;
    fn save(&mut self, credentials: &Credentials) -> Result<()>;
}

/// JSON file on disk. A missing file reads as an empty document.
#[derive(Debug, Clone)]
pub struct FileConfig {
    path: PathBuf,
}

impl FileConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStore for FileConfig {
    fn load(&self) -> Result<Credentials> {
        if !self.path.is_file() {
            debug!(path = %self.path.display(), "no config file, starting empty");
            return Ok(Credentials::default());
        }
        let contents = fs::read_to_string(&self.path).inspect_err(|e| {
            warn!(path = %self.path.display(), "failed to read config: {e}");
        })?;
        let credentials = serde_json::from_str(&contents).inspect_err(|e| {
            warn!(path = %self.path.display(), "corrupt config: {e}");
        })?;
        Ok(credentials)
    }

    fn save(&mut self, credentials: &Credentials) -> Result<()> {
        let contents = serde_json::to_string(credentials)?;
        fs::write(&self.path, contents)?;
        Ok(())
    }
}

/// Caller-supplied configuration kept in memory only.
#[derive(Debug, Clone, Default)]
pub struct MemoryConfig {
    credentials: Credentials,
}

impl MemoryConfig {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}

impl ConfigStore for MemoryConfig {
    fn load(&self) -> Result<Credentials> {
        Ok(self.credentials.clone())
    }

    fn save(&mut self, credentials: &Credentials) -> Result<()> {
        self.credentials = credentials.clone();
        Ok(())
    }
}
