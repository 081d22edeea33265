//! Cross-Skill Collective application layer.
//!
//! Composes the domain crate and the collaborator clients into the pieces
//! with actual invariants: the session store, the route gate, the query
//! cache, the notice bus, and one controller per screen.

pub mod cache;
pub mod config;
pub mod gate;
pub mod notice;
pub mod screens;
pub mod session;
