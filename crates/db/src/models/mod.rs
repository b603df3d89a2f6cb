//! Row models.
//!
//! Each submodule holds a `FromRow` struct matching a table row and the
//! conversion into the core domain type.

pub mod device_assignment;
pub mod template;
