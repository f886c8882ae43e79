//! Source extractors.
//!
//! Each extractor turns one raw payload into a sequence of [`RawRecord`]s in
//! source order, with `rank` set to the emitted position (starting at 1).
//! Any rank the source itself carries is ignored.
//!
//! | Source | Module | Failure mode |
//! |--------|--------|--------------|
//! | Ranking API | [`api`] | Missing structure fails the whole payload |
//! | Ranking page | [`html`] | A broken item is logged and skipped |

use crate::models::{RawPayload, RawRecord};
use thiserror::Error;

pub mod api;
pub mod html;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("expected a {expected} payload, got {actual}")]
    UnexpectedPayload {
        expected: &'static str,
        actual: &'static str,
    },
    #[error("ranking payload is missing expected structure: {0}")]
    Structure(#[from] serde_json::Error),
    #[error("ranking item could not be extracted: {0}")]
    Element(String),
}

/// Converts a raw payload into raw field mappings.
pub trait Extractor {
    fn extract(&self, payload: &RawPayload) -> Result<Vec<RawRecord>, ExtractError>;
}
