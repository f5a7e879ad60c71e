//! Scalar aliases shared by the domain and wire types.

/// Post, category, and subcategory ids as issued by the content API.
pub type DbId = i64;

/// Publication and scheduling instants, always in UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
