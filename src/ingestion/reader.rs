use super::types::{Feature, SourceDocument};

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failures while turning a source file into features.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The file could not be read.
    #[error("source {} is unavailable: {source}", .path.display())]
    Unavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The bytes are not a GeoJSON Feature or FeatureCollection.
    #[error("source {} is malformed: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Reads the source file fully.
pub async fn read_source(path: &Path) -> Result<Vec<u8>, SourceError> {
    tokio::fs::read(path)
        .await
        .map_err(|source| SourceError::Unavailable {
            path: path.to_path_buf(),
            source,
        })
}

/// Parses source bytes into the list of features to insert.
///
/// `path` is only used for error reporting.
pub fn parse_features(path: &Path, bytes: &[u8]) -> Result<Vec<Feature>, SourceError> {
    let document: SourceDocument =
        serde_json::from_slice(bytes).map_err(|source| SourceError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(document.into_features())
}
