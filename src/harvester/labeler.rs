//! Age-labeling collaborator
//!
//! Labeling is an external capability consumed through a narrow interface:
//! given a saved file and a reference date, produce a label that gets
//! embedded into the filename. Implementations may do their own I/O (e.g.
//! metadata extraction) and may fail; a labeling failure never costs the
//! already-saved image.

use std::path::Path;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Error types for labeling operations
#[derive(Error, Debug)]
pub enum LabelError {
    #[error("Invalid reference date: {0}")]
    InvalidDate(#[from] chrono::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Labeling failed: {0}")]
    Failed(String),
}

/// Result type for labeling operations
pub type LabelResult<T> = Result<T, LabelError>;

/// A derived label plus the detail of which labeler produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgeLabel {
    /// The value embedded into the filename, e.g. `"14"`.
    pub value: String,
    /// Short identifier of the labeling strategy.
    pub detail: String,
}

/// Narrow interface to the age-labeling capability.
pub trait AgeLabeler: Send + Sync {
    /// Derive a label for `filename` inside `image_dir`, given the subject's
    /// RFC 3339 reference date (date of birth).
    fn label(&self, filename: &str, reference_date: &str, image_dir: &Path)
    -> LabelResult<AgeLabel>;
}

/// Default labeler: the subject's age in whole years at labeling time,
/// derived purely from the reference date.
#[derive(Debug, Default, Clone)]
pub struct SubjectAgeLabeler;

impl AgeLabeler for SubjectAgeLabeler {
    fn label(
        &self,
        _filename: &str,
        reference_date: &str,
        _image_dir: &Path,
    ) -> LabelResult<AgeLabel> {
        let born = DateTime::parse_from_rfc3339(reference_date)?.with_timezone(&Utc);
        let now = Utc::now();
        if born > now {
            return Err(LabelError::Failed(format!(
                "reference date {reference_date} lies in the future"
            )));
        }

        let years = now.years_since(born).unwrap_or(0);

        Ok(AgeLabel {
            value: years.to_string(),
            detail: "subject-age".to_string(),
        })
    }
}
