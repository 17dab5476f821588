//! Pipeline stage engines
//!
//! Each stage consumes its predecessor's persisted output and produces its
//! own; the engines here hold the stage logic, while file I/O lives in
//! [`crate::store`] and HTTP in [`crate::provider`] / [`crate::safety`].
//! Per-item failures never escape a batch loop: every engine reports them in
//! its result struct and keeps going.

pub mod assess;
pub mod discover;
pub mod enrich;
pub mod import_merge;
pub mod reassess;
pub mod review;
