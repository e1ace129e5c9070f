//! Persisted runtime identity record
//!
//! Two lines of text, family then version:
//!
//! ```text
//! glibc
//! 2.35
//! ```

use crate::error::{NativepackError, NativepackResult};
use crate::host::RuntimeIdentity;
use serde::Serialize;
use std::path::Path;
use tokio::fs;
use tracing::debug;

/// File name used when the record lives inside the dependency cache home
pub const RECORD_FILE_NAME: &str = "runtime-identity";

/// Last runtime identity the dependency cache was validated against
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheRecord {
    pub family: String,
    pub version: String,
}

/// What was found at the record path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredRecord {
    /// No record yet (first run)
    Missing,
    /// A file exists but does not hold a usable record
    Malformed(String),
    Present(CacheRecord),
}

impl CacheRecord {
    pub fn new(family: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            version: version.into(),
        }
    }

    /// Parse record text; `None` when either line is missing or empty
    pub fn parse(content: &str) -> Option<Self> {
        let mut lines = content.lines().map(str::trim);
        let family = lines.next()?;
        let version = lines.next()?;
        if family.is_empty() || version.is_empty() {
            return None;
        }
        Some(Self::new(family, version))
    }

    /// Render as record text
    pub fn render(&self) -> String {
        format!("{}\n{}\n", self.family, self.version)
    }

    /// Read the record at `path`
    pub async fn read(path: &Path) -> NativepackResult<StoredRecord> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No cache record at {}", path.display());
                return Ok(StoredRecord::Missing);
            }
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                return Ok(StoredRecord::Malformed("record is not valid UTF-8".to_string()));
            }
            Err(e) => {
                return Err(NativepackError::io(
                    format!("reading cache record {}", path.display()),
                    e,
                ))
            }
        };

        Ok(match Self::parse(&content) {
            Some(record) => StoredRecord::Present(record),
            None => StoredRecord::Malformed(format!("unexpected content {:?}", content.trim())),
        })
    }

    /// Overwrite the record at `path`, creating parent directories
    pub async fn write(&self, path: &Path) -> NativepackResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    NativepackError::io(format!("creating directory {}", parent.display()), e)
                })?;
            }
        }
        fs::write(path, self.render()).await.map_err(|e| {
            NativepackError::io(format!("writing cache record {}", path.display()), e)
        })?;
        debug!("Wrote cache record {} to {}", self, path.display());
        Ok(())
    }
}

impl From<&RuntimeIdentity> for CacheRecord {
    fn from(identity: &RuntimeIdentity) -> Self {
        Self::new(&identity.family, &identity.version)
    }
}

impl std::fmt::Display for CacheRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.family, self.version)
    }
}
