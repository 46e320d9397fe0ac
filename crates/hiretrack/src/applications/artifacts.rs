use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Which of the two documents an artifact holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Resume,
    CoverLetter,
}

impl ArtifactKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Resume => "resume",
            Self::CoverLetter => "cover_letter",
        }
    }
}

/// Opaque reference to a stored artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactLocator(pub String);

impl std::fmt::Display for ArtifactLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Upload payload as received from the multipart form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactUpload {
    pub bytes: Vec<u8>,
    pub original_name: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("artifact '{0}' not found")]
    NotFound(ArtifactLocator),
    #[error("artifact storage failed: {0}")]
    Storage(#[from] io::Error),
}

/// Storage contract for the two binary documents carried per application.
///
/// `put` must hand back a locator that is collision-resistant across
/// concurrent writes; `get` treats an empty payload the same as a missing
/// one.
pub trait ArtifactStore: Send + Sync {
    fn put(
        &self,
        bytes: &[u8],
        kind: ArtifactKind,
        original_name: &str,
    ) -> Result<ArtifactLocator, ArtifactError>;

    fn get(&self, locator: &ArtifactLocator) -> Result<Vec<u8>, ArtifactError>;
}

static ARTIFACT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Filesystem-backed store writing under a configurable upload directory,
/// created on demand.
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn file_name(kind: ArtifactKind, original_name: &str) -> String {
        let sequence = ARTIFACT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        format!(
            "{sequence:08}_{}_{}",
            kind.label(),
            sanitize_name(original_name)
        )
    }
}

fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "document".to_string()
    } else {
        cleaned
    }
}

impl ArtifactStore for FsArtifactStore {
    fn put(
        &self,
        bytes: &[u8],
        kind: ArtifactKind,
        original_name: &str,
    ) -> Result<ArtifactLocator, ArtifactError> {
        fs::create_dir_all(&self.root)?;
        let path = self.root.join(Self::file_name(kind, original_name));
        fs::write(&path, bytes)?;
        Ok(ArtifactLocator(path.to_string_lossy().into_owned()))
    }

    fn get(&self, locator: &ArtifactLocator) -> Result<Vec<u8>, ArtifactError> {
        let bytes = match fs::read(Path::new(&locator.0)) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(ArtifactError::NotFound(locator.clone()))
            }
            Err(err) => return Err(ArtifactError::Storage(err)),
        };

        if bytes.is_empty() {
            return Err(ArtifactError::NotFound(locator.clone()));
        }

        Ok(bytes)
    }
}
