//! Loading case files from disk.

use std::path::Path;

use thiserror::Error;
use tracing::{debug, info};

use super::Case;

/// Errors from case loading and validation.
#[derive(Debug, Error)]
pub enum CaseError {
    #[error("Case file not found at: {0}")]
    NotFound(String),

    #[error("Failed to read case file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Error decoding case JSON from {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid case: {0}")]
    Invalid(String),
}

/// Result type for case operations.
pub type CaseResult<T> = Result<T, CaseError>;

/// Load and validate a JSON case file.
pub fn load_case(path: impl AsRef<Path>) -> CaseResult<Case> {
    let path = path.as_ref();
    let shown = path.display().to_string();

    let raw = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            CaseError::NotFound(shown.clone())
        } else {
            CaseError::Io {
                path: shown.clone(),
                source: e,
            }
        }
    })?;
    debug!(path = %shown, bytes = raw.len(), "Read case file");

    let case = parse_case(&raw).map_err(|source| CaseError::Parse {
        path: shown.clone(),
        source,
    })?;
    case.validate()?;

    info!(
        title = %case.title,
        case_type = %case.case_type,
        participants = case.participants.len(),
        evidence = case.evidence.len(),
        "Loaded case"
    );
    Ok(case)
}

/// Parse a case from a JSON string without validating it.
pub fn parse_case(raw: &str) -> Result<Case, serde_json::Error> {
    serde_json::from_str(raw)
}
