//! Crate-level tests exercising parsing, querying, editing and traversal
//! together.
