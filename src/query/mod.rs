//! Record selection
//!
//! A query is a free-text substring matched, case-insensitively, against
//! each record's source file, key path and value. No ranking is applied.

pub mod filter;

pub use filter::QueryFilter;
