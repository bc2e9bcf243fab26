use crate::scene::{DocumentError, SceneDocument};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid document: {0}")]
    Invalid(#[from] DocumentError),
}

pub type Result<T> = std::result::Result<T, SerializationError>;

/// Decode and validate a document; nothing partial is ever returned.
pub fn parse_document(bytes: &[u8]) -> Result<SceneDocument> {
    let document: SceneDocument = serde_json::from_slice(bytes)?;
    document.validate()?;
    Ok(document)
}

pub fn save_document_to_file(document: &SceneDocument, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(document)?;
    std::fs::write(path, json)?;
    Ok(())
}

pub fn load_document_from_file(path: &Path) -> Result<SceneDocument> {
    let bytes = std::fs::read(path)?;
    parse_document(&bytes)
}
