///
/// sqlext SHA-1 Functions
///
/// Provides SHA-1 hashing inside SQL using the RustCrypto digest crates:
///
/// - **sha1(X)**: digest of a single value (BLOB bytes or UTF-8 text)
/// - **sha1_query(SQL)**: digest of one or more queries and all of their result rows
///
/// Both return a 40-character lowercase hex string, or NULL for a NULL argument.
///

pub mod hash;
pub mod query;

pub use hash::*;
pub use query::query_digest;
