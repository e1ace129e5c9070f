//! Keep-or-purge decision for the dependency cache

use super::record::{CacheRecord, StoredRecord};
use crate::deps::CachePurger;
use crate::error::NativepackResult;
use crate::host::RuntimeIdentity;
use semver::Version;
use serde::Serialize;
use std::cmp::Ordering;
use std::path::Path;
use tracing::{debug, info, warn};

/// Read-only comparison of a stored record against the live identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assessment {
    FirstRun,
    Compatible,
    /// The cache must be purged before reuse
    Incompatible(String),
    /// Detection failed; nothing can be concluded
    LiveUnknown,
}

/// Outcome of a validation pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum CacheVerdict {
    FirstRun,
    Compatible,
    Purged { reason: String },
    LiveUnknown,
}

impl CacheVerdict {
    pub fn purged(&self) -> bool {
        matches!(self, Self::Purged { .. })
    }
}

impl std::fmt::Display for CacheVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FirstRun => write!(f, "first run"),
            Self::Compatible => write!(f, "compatible"),
            Self::Purged { reason } => write!(f, "purged ({})", reason),
            Self::LiveUnknown => write!(f, "runtime unknown, cache kept"),
        }
    }
}

/// Parse `major[.minor[.patch]]`; anything else is incomparable
pub fn parse_version(raw: &str) -> Option<Version> {
    let parts: Vec<&str> = raw.trim().split('.').collect();
    if parts.is_empty() || parts.len() > 3 {
        return None;
    }
    let mut numbers = [0u64; 3];
    for (slot, part) in numbers.iter_mut().zip(&parts) {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        *slot = part.parse().ok()?;
    }
    Some(Version::new(numbers[0], numbers[1], numbers[2]))
}

/// Compare what is on disk with what the host provides now
pub fn assess(stored: &StoredRecord, live: &RuntimeIdentity) -> Assessment {
    if !live.is_known() {
        return Assessment::LiveUnknown;
    }
    let recorded = match stored {
        StoredRecord::Missing => return Assessment::FirstRun,
        StoredRecord::Malformed(detail) => {
            return Assessment::Incompatible(format!("cache record is malformed: {}", detail))
        }
        StoredRecord::Present(record) => record,
    };

    if recorded.family != live.family {
        return Assessment::Incompatible(format!(
            "runtime family changed from {} to {}",
            recorded.family, live.family
        ));
    }

    let (Some(then), Some(now)) = (parse_version(&recorded.version), parse_version(&live.version))
    else {
        return Assessment::Incompatible(format!(
            "cannot compare {} versions {} and {}",
            live.family, recorded.version, live.version
        ));
    };

    match then.cmp(&now) {
        Ordering::Greater => Assessment::Incompatible(format!(
            "cache was built against {} {} but the host provides {}",
            live.family, recorded.version, live.version
        )),
        _ => Assessment::Compatible,
    }
}

/// Validate the cache for `live`, purging it when incompatible
///
/// The live identity is written as the new record after every pass, except
/// when detection failed: an unknown identity neither purges nor overwrites
/// the last known good record.
pub async fn validate<P>(
    record_path: &Path,
    live: &RuntimeIdentity,
    purger: &P,
) -> NativepackResult<CacheVerdict>
where
    P: CachePurger + ?Sized,
{
    let stored = CacheRecord::read(record_path).await?;
    debug!("Stored cache record: {:?}", stored);

    let verdict = match assess(&stored, live) {
        Assessment::LiveUnknown => {
            warn!("Could not detect the C runtime, keeping the dependency cache as is");
            return Ok(CacheVerdict::LiveUnknown);
        }
        Assessment::FirstRun => {
            info!("No cache record at {}, treating as first run", record_path.display());
            CacheVerdict::FirstRun
        }
        Assessment::Compatible => {
            info!("Dependency cache is compatible with {}", live);
            CacheVerdict::Compatible
        }
        Assessment::Incompatible(reason) => {
            warn!("Dependency cache is incompatible: {}; purging", reason);
            purger.purge().await?;
            CacheVerdict::Purged { reason }
        }
    };

    CacheRecord::from(live).write(record_path).await?;
    Ok(verdict)
}
