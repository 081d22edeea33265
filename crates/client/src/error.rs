//! Collaborator error types.
//!
//! Both enums are `Clone`: the query cache hands one failed result to every
//! concurrent awaiter of the same key. Messages from the collaborators are
//! carried verbatim and surfaced to the user unchanged.

/// Errors from the external auth service.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    /// The auth service answered with a non-success status.
    #[error("{message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Human-readable message from the service, verbatim.
        message: String,
    },

    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("Auth request failed: {0}")]
    Request(String),

    /// The response body did not have the expected shape.
    #[error("Unexpected auth response: {0}")]
    Decode(String),
}

/// Errors from the external relational store.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// A single-row read matched no row.
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    /// A uniqueness constraint was violated (e.g. duplicate
    /// (user, skill) association).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The store answered with any other non-success status.
    #[error("{message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Human-readable message from the store, verbatim.
        message: String,
    },

    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("Store request failed: {0}")]
    Request(String),

    /// A row could not be decoded into its entity type.
    #[error("Unexpected store response: {0}")]
    Decode(String),
}
