//! `atrium-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! strongly-typed identifiers, the domain error model, the system-type
//! partition, and slug derivation.

pub mod error;
pub mod id;
pub mod slug;
pub mod system;

pub use error::{DomainError, DomainResult};
pub use id::{AddressId, CustomerId, EmployeeId, TokenId, UserId, WorkspaceId};
pub use slug::slugify;
pub use system::SystemType;
