//! Model reader seam.
//!
//! Decoding compiled artifacts is the job of an external reader; the core
//! only requires that whatever it receives is a fully built, validated
//! `ClassModel` sequence.  `JsonModelReader` reads the serialized form of the
//! structural model, which is also what test fixtures and tooling exchange.

use std::path::Path;

use tracing::debug;

use crate::errors::{JccError, JccResult};
use crate::models::{ClassModel, Origin};

/// Produces class models from raw bytes.  Implementations must fail rather
/// than return a partially built model.
pub trait ModelReader {
    fn read(&self, bytes: &[u8]) -> JccResult<Vec<ClassModel>>;

    fn read_path(&self, path: &Path) -> JccResult<Vec<ClassModel>> {
        let bytes = std::fs::read(path)?;
        let models = self.read(&bytes)?;
        debug!("Read {} classes from {}", models.len(), path.display());
        Ok(models)
    }
}

/// Reads a JSON array of class models and tags each with one origin.
#[derive(Clone, Copy, Debug)]
pub struct JsonModelReader {
    origin: Origin,
}

impl JsonModelReader {
    pub fn new(origin: Origin) -> Self {
        Self { origin }
    }
}

impl Default for JsonModelReader {
    fn default() -> Self {
        Self::new(Origin::PrimaryArtifact)
    }
}

impl ModelReader for JsonModelReader {
    fn read(&self, bytes: &[u8]) -> JccResult<Vec<ClassModel>> {
        let mut models: Vec<ClassModel> = serde_json::from_slice(bytes)
            .map_err(|e| JccError::MalformedInput(format!("invalid class model JSON: {e}")))?;
        for model in &mut models {
            model.origin = self.origin;
            model.link_members();
            model.validate()?;
        }
        Ok(models)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
