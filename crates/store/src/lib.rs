//! `atrium-store` — persistence boundary.
//!
//! Route handlers talk to a [`Store`] trait object; the concrete backend is
//! either [`InMemoryStore`] (tests/dev) or [`PgStore`] (Postgres via sqlx).
//! Every operation is workspace-scoped where the domain requires it, so
//! cross-tenant access is impossible to express through this interface.

pub mod in_memory;
pub mod postgres;
pub mod records;
pub mod store;

pub use in_memory::InMemoryStore;
pub use postgres::PgStore;
pub use records::{
    AddressFields, AddressRecord, CustomerProfile, CustomerRecord, DocumentType, EmployeeProfile,
    EmployeeRecord, Gender, ProfileSummary, TokenKind, TokenRecord, UserRecord, WorkspaceCounts,
    WorkspaceRecord,
};
pub use store::{Store, StoreError};
