//! Content API client and editing-session orchestration for the editorial
//! pipeline.
//!
//! [`session::Editor`] is the entry point: it opens an
//! [`session::EditingSession`] (empty or hydrated from an existing post),
//! loads the option lists once, and drives submits through the
//! [`api::ContentApi`] seam.

pub mod api;
pub mod config;
pub mod session;
pub mod submit;
pub mod taxonomy;
pub mod wire;
