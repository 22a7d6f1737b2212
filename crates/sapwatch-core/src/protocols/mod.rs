//! Protocol decoding modules.
//!
//! Each protocol follows a layered structure:
//! - `layout`: byte offsets, bit masks and constants (source of truth)
//! - `reader`: bounds-checked byte access
//! - `parser`: domain-level decoding (no direct byte indexing)
//! - `error`: explicit, actionable errors
//!
//! Parsers are pure and contain no I/O; sources and the listener handle
//! sockets, captures and retries.

pub mod sap;
