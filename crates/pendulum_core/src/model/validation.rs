//! Write-path validation errors shared by model types.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Validation failure raised before a model is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelValidationError {
    /// Pen-pal id is empty or whitespace only.
    BlankPenPalId,
    /// Photo payload contains no bytes.
    EmptyPhoto,
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankPenPalId => write!(f, "pen-pal id cannot be blank"),
            Self::EmptyPhoto => write!(f, "photo data cannot be empty"),
        }
    }
}

impl Error for ModelValidationError {}
