//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep UI/FFI layers decoupled from storage details.
//!
//! # Invariants
//! - Storage failures are logged and swallowed; callers receive an empty or
//!   default result, never a typed error.

use crate::repo::RepoResult;
use log::error;

pub mod event_service;
pub mod penpal_service;

/// Converts a repository result into `Option`, logging the failure.
fn logged<T>(operation: &'static str, result: RepoResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            error!("event={operation} module=service status=error error={err}");
            None
        }
    }
}
