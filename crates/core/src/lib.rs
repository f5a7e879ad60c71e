//! Editorial pipeline domain logic.
//!
//! Everything here is pure, in-memory state and validation: no HTTP, no
//! storage. The `editorial-client` crate wires these types to the external
//! content API.

pub mod draft;
pub mod error;
pub mod slug;
pub mod tags;
pub mod taxonomy;
pub mod types;
pub mod upload;
pub mod validation;
