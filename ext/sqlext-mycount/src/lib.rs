///
/// sqlext mycount Aggregate
///
/// `mycount()` counts rows; `mycount(X)` counts rows where X is not NULL.
/// The result is always a 64-bit integer, 0 for an empty group.
///
/// Functions:
/// - Entry point: sqlite3_mycount_init
/// - Registration: register
/// - Accumulator: RowCount, counts_row
///

pub mod aggregate;

pub use aggregate::*;
