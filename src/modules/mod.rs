//! Feature modules. Each follows the same structure:
//!
//! - `controller.rs`: HTTP handlers
//! - `service.rs`: business logic and data access
//! - `model.rs`: entities and DTOs
//! - `router.rs`: route configuration

pub mod auth;
pub mod classes;
pub mod departments;
pub mod enrollments;
pub mod subjects;
pub mod users;
