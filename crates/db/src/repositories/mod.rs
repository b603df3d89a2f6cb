//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod device_assignment_repo;
pub mod template_repo;

pub use device_assignment_repo::DeviceAssignmentRepo;
pub use template_repo::TemplateRepo;
