//! Domain layer for the batch image processing service.
//!
//! Pure types and logic with no I/O:
//!
//! - [`error::CoreError`] — shared domain error taxonomy.
//! - [`batch`] — submission row validation and URL-list explosion.
//! - [`transform`] — the image re-encode step applied to fetched bytes.
//! - [`types`] — ID and timestamp aliases shared across crates.

pub mod batch;
pub mod error;
pub mod transform;
pub mod types;
