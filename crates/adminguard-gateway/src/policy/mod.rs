//! Admission layer (entitlement, feature toggle, permission grant).
//!
//! Compiles role configuration into lookup tables and composes the providers
//! into a single [`Gate`] consulted before any protected action runs.

pub mod gate;
pub mod roles;

pub use gate::{Admission, Gate};
pub use roles::RolePermissions;
