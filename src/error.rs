use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by the in-memory query engine.
///
/// The timing wrappers never produce these themselves; whatever a provider
/// returns is handed back to the caller unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum QueryError {
    #[error("invalid query expression: {0}")]
    InvalidExpression(String),
}
