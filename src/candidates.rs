//! Reading the candidate batch produced by an external scanner.
//!
//! The batch is a JSON array of candidate objects; order is significant and
//! preserved.

use crate::domain::UpdateCandidate;
use crate::error::{PolicyError, Result};
use std::fs;
use std::io::Read;
use std::path::Path;

/// Parse a JSON array of candidates.
pub fn parse_candidates(content: &str) -> Result<Vec<UpdateCandidate>> {
    serde_json::from_str(content).map_err(|e| PolicyError::candidates(e.to_string()))
}

/// Read candidates from a file, or from stdin when the path is `-`.
pub fn load_candidates(path: &str) -> Result<Vec<UpdateCandidate>> {
    let content = if path == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(Path::new(path))?
    };

    let candidates = parse_candidates(&content)?;
    tracing::debug!(count = candidates.len(), source = %path, "loaded candidates");
    Ok(candidates)
}
