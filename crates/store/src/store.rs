//! The persistence trait route handlers depend on.

use async_trait::async_trait;
use thiserror::Error;

use atrium_core::{AddressId, CustomerId, EmployeeId, SystemType, TokenId, UserId, WorkspaceId};

use crate::records::{
    AddressFields, CustomerProfile, CustomerRecord, EmployeeProfile, EmployeeRecord,
    ProfileSummary, TokenKind, TokenRecord, UserRecord, WorkspaceCounts, WorkspaceRecord,
};

/// Infrastructure-level store failure.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend rejected or failed the operation.
    #[error("store error: {0}")]
    Backend(String),

    /// An update/delete targeted a row that does not exist.
    #[error("record not found")]
    NotFound,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Workspace-scoped data access.
///
/// Handlers receive this as `Arc<dyn Store>`; there is no shared mutable
/// process state outside the backend itself. Lookups return `Ok(None)` for
/// absence; [`StoreError::NotFound`] is reserved for writes against missing
/// rows.
#[async_trait]
pub trait Store: Send + Sync {
    // ── Workspaces ──────────────────────────────────────────────────────

    async fn insert_workspace(&self, workspace: WorkspaceRecord) -> StoreResult<()>;

    async fn workspace_by_slug(&self, slug: &str) -> StoreResult<Option<WorkspaceRecord>>;

    /// One workspace per owner: the existence probe behind workspace creation.
    async fn workspace_by_owner(&self, owner_id: UserId) -> StoreResult<Option<WorkspaceRecord>>;

    async fn rename_workspace(&self, id: WorkspaceId, name: &str) -> StoreResult<()>;

    async fn set_workspace_active(&self, id: WorkspaceId, active: bool) -> StoreResult<()>;

    /// Employee/customer counts read in one consistent snapshot.
    async fn workspace_counts(&self, id: WorkspaceId) -> StoreResult<WorkspaceCounts>;

    // ── Users ───────────────────────────────────────────────────────────

    async fn insert_user(&self, user: UserRecord) -> StoreResult<()>;

    async fn user_by_id(&self, id: UserId) -> StoreResult<Option<UserRecord>>;

    /// The identity-resolver query: user by id, constrained to membership in
    /// the workspace with `slug` and to `system_type`.
    async fn user_in_workspace(
        &self,
        id: UserId,
        slug: &str,
        system_type: SystemType,
    ) -> StoreResult<Option<(WorkspaceRecord, UserRecord)>>;

    /// Unique-key probe. `workspace_id = None` matches users without a
    /// workspace (top-level SaaS accounts).
    async fn user_by_email(
        &self,
        workspace_id: Option<WorkspaceId>,
        email: &str,
        system_type: SystemType,
    ) -> StoreResult<Option<UserRecord>>;

    /// Same probe, excluding one user. Used when changing a linked email.
    async fn user_by_email_excluding(
        &self,
        workspace_id: WorkspaceId,
        email: &str,
        system_type: SystemType,
        exclude: UserId,
    ) -> StoreResult<Option<UserRecord>>;

    async fn set_user_email(&self, id: UserId, email: &str) -> StoreResult<()>;

    async fn set_password_hash(&self, id: UserId, hash: &str) -> StoreResult<()>;

    async fn mark_email_verified(&self, id: UserId) -> StoreResult<()>;

    /// One-time link of a SaaS owner to the workspace they just created.
    async fn attach_user_to_workspace(
        &self,
        id: UserId,
        workspace_id: WorkspaceId,
    ) -> StoreResult<()>;

    // ── Addresses ───────────────────────────────────────────────────────

    /// Create or fully replace an address; returns the effective id.
    async fn upsert_address(
        &self,
        id: Option<AddressId>,
        fields: AddressFields,
    ) -> StoreResult<AddressId>;

    // ── Employees ───────────────────────────────────────────────────────

    async fn insert_employee(&self, employee: EmployeeRecord) -> StoreResult<()>;

    async fn employee_by_id(
        &self,
        workspace_id: WorkspaceId,
        id: EmployeeId,
    ) -> StoreResult<Option<EmployeeRecord>>;

    async fn update_employee(
        &self,
        id: EmployeeId,
        address_id: Option<AddressId>,
        profile: EmployeeProfile,
    ) -> StoreResult<()>;

    /// Newest first.
    async fn list_employees(&self, workspace_id: WorkspaceId) -> StoreResult<Vec<ProfileSummary>>;

    // ── Customers ───────────────────────────────────────────────────────

    async fn insert_customer(&self, customer: CustomerRecord) -> StoreResult<()>;

    async fn customer_by_id(
        &self,
        workspace_id: WorkspaceId,
        id: CustomerId,
    ) -> StoreResult<Option<CustomerRecord>>;

    async fn update_customer(
        &self,
        id: CustomerId,
        address_id: Option<AddressId>,
        profile: CustomerProfile,
    ) -> StoreResult<()>;

    /// Newest first.
    async fn list_customers(&self, workspace_id: WorkspaceId) -> StoreResult<Vec<ProfileSummary>>;

    // ── Tokens ──────────────────────────────────────────────────────────

    /// Delete any live `(user, kind)` tokens, then issue a fresh one.
    async fn rotate_token(&self, user_id: UserId, kind: TokenKind) -> StoreResult<TokenRecord>;

    async fn token_by_id(&self, id: TokenId) -> StoreResult<Option<TokenRecord>>;

    async fn delete_token(&self, id: TokenId) -> StoreResult<()>;
}
