//! Dependency cache validation
//!
//! The dependency cache is shared between builds and keyed implicitly by the
//! C runtime that produced it. A small on-disk record remembers the last
//! runtime identity the cache was used with; a build on an older or different
//! runtime purges the cache before anything is reused.
//!
//! No locking is done: concurrent runs against the same cache root must be
//! serialized by the caller.

pub mod record;
pub mod validator;

pub use record::{CacheRecord, StoredRecord, RECORD_FILE_NAME};
pub use validator::{assess, parse_version, validate, Assessment, CacheVerdict};

use crate::error::{NativepackError, NativepackResult};
use crate::host::ExecutionContext;
use std::path::PathBuf;

/// Where the runtime identity record lives for this run
///
/// An explicit record file wins; otherwise the record sits inside the
/// dependency cache home.
pub fn record_location(context: &ExecutionContext) -> NativepackResult<PathBuf> {
    context
        .container_record()
        .or_else(|| context.container_home().map(|home| home.join(RECORD_FILE_NAME)))
        .ok_or_else(|| NativepackError::MissingSetting {
            name: "LIBC_CACHE_ID_FILE".to_string(),
            hint: "Set LIBC_CACHE_ID_FILE or CONAN_HOME, or pass --record-file".to_string(),
        })
}
