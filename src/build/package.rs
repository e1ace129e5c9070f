//! Output package assembly and build receipt

use super::config::BuildType;
use crate::error::{NativepackError, NativepackResult};
use crate::host::RuntimeIdentity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

/// Receipt written next to the toolchain state after packaging
pub const RECEIPT_FILE_NAME: &str = "nativepack-receipt.json";

/// Final layout of a packaged build
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageLayout {
    /// Directory holding the built artifact and the package directory
    pub root: PathBuf,
    pub artifact: PathBuf,
    /// Stub installed under the package's entry-point name
    pub stub: PathBuf,
}

impl PackageLayout {
    /// Copy `stub` to `<package_dir>/<entry_point>`
    ///
    /// The artifact must already be inside the output tree; filesystem errors
    /// are fatal.
    pub async fn assemble(
        artifact: &Path,
        stub: &Path,
        package_dir: &Path,
        entry_point: &str,
    ) -> NativepackResult<Self> {
        if !artifact.is_file() {
            return Err(NativepackError::ArtifactNotFound {
                name: artifact
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                dir: artifact.parent().map(Path::to_path_buf).unwrap_or_default(),
            });
        }

        fs::create_dir_all(package_dir).await.map_err(|e| {
            NativepackError::io(
                format!("creating package directory {}", package_dir.display()),
                e,
            )
        })?;

        let installed = package_dir.join(entry_point);
        fs::copy(stub, &installed).await.map_err(|e| {
            NativepackError::io(
                format!("copying {} to {}", stub.display(), installed.display()),
                e,
            )
        })?;
        info!("Installed stub as {}", installed.display());

        Ok(Self {
            root: package_dir
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| package_dir.to_path_buf()),
            artifact: artifact.to_path_buf(),
            stub: installed,
        })
    }
}

/// SHA-256 digest of a packaged file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDigest {
    pub path: PathBuf,
    pub sha256: String,
}

impl FileDigest {
    pub async fn of(path: &Path) -> NativepackResult<Self> {
        let contents = fs::read(path)
            .await
            .map_err(|e| NativepackError::io(format!("reading {}", path.display()), e))?;

        let mut hasher = Sha256::new();
        hasher.update(&contents);
        Ok(Self {
            path: path.to_path_buf(),
            sha256: hex::encode(hasher.finalize()),
        })
    }
}

/// Record of what a successful pipeline run produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildReceipt {
    pub created_at: DateTime<Utc>,
    pub build_type: String,
    pub runtime: Option<RuntimeIdentity>,
    pub artifact: FileDigest,
    pub stub: FileDigest,
}

impl BuildReceipt {
    pub async fn for_layout(
        layout: &PackageLayout,
        build_type: BuildType,
        runtime: Option<RuntimeIdentity>,
    ) -> NativepackResult<Self> {
        Ok(Self {
            created_at: Utc::now(),
            build_type: build_type.to_string(),
            runtime,
            artifact: FileDigest::of(&layout.artifact).await?,
            stub: FileDigest::of(&layout.stub).await?,
        })
    }

    /// Write as pretty JSON to `<dir>/nativepack-receipt.json`
    pub async fn write(&self, dir: &Path) -> NativepackResult<PathBuf> {
        let path = dir.join(RECEIPT_FILE_NAME);
        let content = serde_json::to_string_pretty(self)?;
        fs::write(&path, content)
            .await
            .map_err(|e| NativepackError::io(format!("writing receipt {}", path.display()), e))?;
        Ok(path)
    }
}
