//! Domain-level error type.

/// Errors produced by the pure domain layer.
///
/// Collaborator-facing errors (auth, store) live in the client crate; this
/// enum covers what can go wrong before any network call is made.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CoreError {
    /// A form or field failed client-side validation.
    #[error("Validation error: {0}")]
    Validation(String),
}
