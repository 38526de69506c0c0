//! Row models and DTOs.
//!
//! Each submodule contains a `FromRow` + `Serialize` entity struct matching
//! the database row, plus the serializable views built from it.

pub mod item;
pub mod job;
pub mod status;
pub mod task;
