//! In-memory store for tests and local development.
//!
//! Mirrors the Postgres backend's constraints (unique slug, unique owner,
//! unique `(workspace_id, email, system_type)`) so handler behavior is
//! identical across backends. A single `RwLock` stands in for the database's
//! snapshot isolation.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use atrium_core::{AddressId, CustomerId, EmployeeId, SystemType, TokenId, UserId, WorkspaceId};

use crate::records::{
    AddressFields, AddressRecord, CustomerProfile, CustomerRecord, EmployeeProfile,
    EmployeeRecord, ProfileSummary, TokenKind, TokenRecord, UserRecord, WorkspaceCounts,
    WorkspaceRecord,
};
use crate::store::{Store, StoreError, StoreResult};

#[derive(Default)]
struct Inner {
    workspaces: HashMap<WorkspaceId, WorkspaceRecord>,
    users: HashMap<UserId, UserRecord>,
    addresses: HashMap<AddressId, AddressRecord>,
    employees: HashMap<EmployeeId, EmployeeRecord>,
    customers: HashMap<CustomerId, CustomerRecord>,
    tokens: HashMap<TokenId, TokenRecord>,
}

#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| StoreError::Backend("store lock poisoned".into()))
    }

    fn write(&self) -> StoreResult<std::sync::RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| StoreError::Backend("store lock poisoned".into()))
    }
}

fn email_key_matches(user: &UserRecord, workspace_id: Option<WorkspaceId>, email: &str, st: SystemType) -> bool {
    user.workspace_id == workspace_id && user.email == email && user.system_type == st
}

#[async_trait]
impl Store for InMemoryStore {
    async fn insert_workspace(&self, workspace: WorkspaceRecord) -> StoreResult<()> {
        let mut inner = self.write()?;
        if inner.workspaces.values().any(|w| w.slug == workspace.slug) {
            return Err(StoreError::Backend(format!(
                "unique violation: workspace slug {}",
                workspace.slug
            )));
        }
        if inner
            .workspaces
            .values()
            .any(|w| w.owner_id == workspace.owner_id)
        {
            return Err(StoreError::Backend(
                "unique violation: workspace owner".into(),
            ));
        }
        inner.workspaces.insert(workspace.id, workspace);
        Ok(())
    }

    async fn workspace_by_slug(&self, slug: &str) -> StoreResult<Option<WorkspaceRecord>> {
        let inner = self.read()?;
        Ok(inner.workspaces.values().find(|w| w.slug == slug).cloned())
    }

    async fn workspace_by_owner(&self, owner_id: UserId) -> StoreResult<Option<WorkspaceRecord>> {
        let inner = self.read()?;
        Ok(inner
            .workspaces
            .values()
            .find(|w| w.owner_id == owner_id)
            .cloned())
    }

    async fn rename_workspace(&self, id: WorkspaceId, name: &str) -> StoreResult<()> {
        let mut inner = self.write()?;
        let ws = inner.workspaces.get_mut(&id).ok_or(StoreError::NotFound)?;
        ws.name = name.to_string();
        Ok(())
    }

    async fn set_workspace_active(&self, id: WorkspaceId, active: bool) -> StoreResult<()> {
        let mut inner = self.write()?;
        let ws = inner.workspaces.get_mut(&id).ok_or(StoreError::NotFound)?;
        ws.active = active;
        Ok(())
    }

    async fn workspace_counts(&self, id: WorkspaceId) -> StoreResult<WorkspaceCounts> {
        // One read guard = one consistent snapshot of both counts.
        let inner = self.read()?;
        Ok(WorkspaceCounts {
            employees: inner
                .employees
                .values()
                .filter(|e| e.workspace_id == id)
                .count() as i64,
            customers: inner
                .customers
                .values()
                .filter(|c| c.workspace_id == id)
                .count() as i64,
        })
    }

    async fn insert_user(&self, user: UserRecord) -> StoreResult<()> {
        let mut inner = self.write()?;
        if inner
            .users
            .values()
            .any(|u| email_key_matches(u, user.workspace_id, &user.email, user.system_type))
        {
            return Err(StoreError::Backend(format!(
                "unique violation: user email {} ({})",
                user.email, user.system_type
            )));
        }
        inner.users.insert(user.id, user);
        Ok(())
    }

    async fn user_by_id(&self, id: UserId) -> StoreResult<Option<UserRecord>> {
        let inner = self.read()?;
        Ok(inner.users.get(&id).cloned())
    }

    async fn user_in_workspace(
        &self,
        id: UserId,
        slug: &str,
        system_type: SystemType,
    ) -> StoreResult<Option<(WorkspaceRecord, UserRecord)>> {
        let inner = self.read()?;
        let Some(user) = inner.users.get(&id) else {
            return Ok(None);
        };
        if user.system_type != system_type {
            return Ok(None);
        }
        let Some(workspace_id) = user.workspace_id else {
            return Ok(None);
        };
        let Some(workspace) = inner.workspaces.get(&workspace_id) else {
            return Ok(None);
        };
        if workspace.slug != slug {
            return Ok(None);
        }
        Ok(Some((workspace.clone(), user.clone())))
    }

    async fn user_by_email(
        &self,
        workspace_id: Option<WorkspaceId>,
        email: &str,
        system_type: SystemType,
    ) -> StoreResult<Option<UserRecord>> {
        let inner = self.read()?;
        Ok(inner
            .users
            .values()
            .find(|u| email_key_matches(u, workspace_id, email, system_type))
            .cloned())
    }

    async fn user_by_email_excluding(
        &self,
        workspace_id: WorkspaceId,
        email: &str,
        system_type: SystemType,
        exclude: UserId,
    ) -> StoreResult<Option<UserRecord>> {
        let inner = self.read()?;
        Ok(inner
            .users
            .values()
            .find(|u| {
                u.id != exclude && email_key_matches(u, Some(workspace_id), email, system_type)
            })
            .cloned())
    }

    async fn set_user_email(&self, id: UserId, email: &str) -> StoreResult<()> {
        let mut inner = self.write()?;
        let user = inner.users.get_mut(&id).ok_or(StoreError::NotFound)?;
        user.email = email.to_string();
        Ok(())
    }

    async fn set_password_hash(&self, id: UserId, hash: &str) -> StoreResult<()> {
        let mut inner = self.write()?;
        let user = inner.users.get_mut(&id).ok_or(StoreError::NotFound)?;
        user.password_hash = Some(hash.to_string());
        Ok(())
    }

    async fn mark_email_verified(&self, id: UserId) -> StoreResult<()> {
        let mut inner = self.write()?;
        let user = inner.users.get_mut(&id).ok_or(StoreError::NotFound)?;
        user.email_verified = true;
        Ok(())
    }

    async fn attach_user_to_workspace(
        &self,
        id: UserId,
        workspace_id: WorkspaceId,
    ) -> StoreResult<()> {
        let mut inner = self.write()?;
        let user = inner.users.get_mut(&id).ok_or(StoreError::NotFound)?;
        user.workspace_id = Some(workspace_id);
        Ok(())
    }

    async fn upsert_address(
        &self,
        id: Option<AddressId>,
        fields: AddressFields,
    ) -> StoreResult<AddressId> {
        let mut inner = self.write()?;
        let id = match id {
            Some(id) if inner.addresses.contains_key(&id) => id,
            _ => AddressId::new(),
        };
        inner.addresses.insert(id, AddressRecord { id, fields });
        Ok(id)
    }

    async fn insert_employee(&self, employee: EmployeeRecord) -> StoreResult<()> {
        let mut inner = self.write()?;
        inner.employees.insert(employee.id, employee);
        Ok(())
    }

    async fn employee_by_id(
        &self,
        workspace_id: WorkspaceId,
        id: EmployeeId,
    ) -> StoreResult<Option<EmployeeRecord>> {
        let inner = self.read()?;
        Ok(inner
            .employees
            .get(&id)
            .filter(|e| e.workspace_id == workspace_id)
            .cloned())
    }

    async fn update_employee(
        &self,
        id: EmployeeId,
        address_id: Option<AddressId>,
        profile: EmployeeProfile,
    ) -> StoreResult<()> {
        let mut inner = self.write()?;
        let employee = inner.employees.get_mut(&id).ok_or(StoreError::NotFound)?;
        employee.address_id = address_id;
        employee.profile = profile;
        Ok(())
    }

    async fn list_employees(&self, workspace_id: WorkspaceId) -> StoreResult<Vec<ProfileSummary>> {
        let inner = self.read()?;
        let mut rows: Vec<ProfileSummary> = inner
            .employees
            .values()
            .filter(|e| e.workspace_id == workspace_id)
            .map(|e| ProfileSummary {
                id: *e.id.as_uuid(),
                name: e.profile.name.clone(),
                workspace_id: e.workspace_id,
                created_at: e.created_at,
            })
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn insert_customer(&self, customer: CustomerRecord) -> StoreResult<()> {
        let mut inner = self.write()?;
        inner.customers.insert(customer.id, customer);
        Ok(())
    }

    async fn customer_by_id(
        &self,
        workspace_id: WorkspaceId,
        id: CustomerId,
    ) -> StoreResult<Option<CustomerRecord>> {
        let inner = self.read()?;
        Ok(inner
            .customers
            .get(&id)
            .filter(|c| c.workspace_id == workspace_id)
            .cloned())
    }

    async fn update_customer(
        &self,
        id: CustomerId,
        address_id: Option<AddressId>,
        profile: CustomerProfile,
    ) -> StoreResult<()> {
        let mut inner = self.write()?;
        let customer = inner.customers.get_mut(&id).ok_or(StoreError::NotFound)?;
        customer.address_id = address_id;
        customer.profile = profile;
        Ok(())
    }

    async fn list_customers(&self, workspace_id: WorkspaceId) -> StoreResult<Vec<ProfileSummary>> {
        let inner = self.read()?;
        let mut rows: Vec<ProfileSummary> = inner
            .customers
            .values()
            .filter(|c| c.workspace_id == workspace_id)
            .map(|c| ProfileSummary {
                id: *c.id.as_uuid(),
                name: c.profile.name.clone(),
                workspace_id: c.workspace_id,
                created_at: c.created_at,
            })
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn rotate_token(&self, user_id: UserId, kind: TokenKind) -> StoreResult<TokenRecord> {
        let mut inner = self.write()?;
        inner
            .tokens
            .retain(|_, t| !(t.user_id == user_id && t.kind == kind));
        let token = TokenRecord {
            id: TokenId::new(),
            user_id,
            kind,
            created_at: chrono::Utc::now(),
        };
        inner.tokens.insert(token.id, token.clone());
        Ok(token)
    }

    async fn token_by_id(&self, id: TokenId) -> StoreResult<Option<TokenRecord>> {
        let inner = self.read()?;
        Ok(inner.tokens.get(&id).cloned())
    }

    async fn delete_token(&self, id: TokenId) -> StoreResult<()> {
        let mut inner = self.write()?;
        inner.tokens.remove(&id).ok_or(StoreError::NotFound)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(workspace_id: Option<WorkspaceId>, email: &str, st: SystemType) -> UserRecord {
        UserRecord {
            id: UserId::new(),
            workspace_id,
            name: None,
            email: email.to_string(),
            password_hash: None,
            system_type: st,
            email_verified: false,
            created_at: Utc::now(),
        }
    }

    fn workspace(slug: &str, owner_id: UserId) -> WorkspaceRecord {
        WorkspaceRecord {
            id: WorkspaceId::new(),
            slug: slug.to_string(),
            name: slug.to_string(),
            owner_id,
            active: true,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn email_triple_is_unique_per_system_type() {
        let store = InMemoryStore::new();
        let ws = workspace("acme", UserId::new());
        let ws_id = ws.id;
        store.insert_workspace(ws).await.unwrap();

        store
            .insert_user(user(Some(ws_id), "a@acme.com", SystemType::Erp))
            .await
            .unwrap();

        // Same triple conflicts...
        let err = store
            .insert_user(user(Some(ws_id), "a@acme.com", SystemType::Erp))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));

        // ...but the same email under another system type does not.
        store
            .insert_user(user(Some(ws_id), "a@acme.com", SystemType::Portal))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn one_workspace_per_owner() {
        let store = InMemoryStore::new();
        let owner = UserId::new();
        store.insert_workspace(workspace("one", owner)).await.unwrap();
        let err = store
            .insert_workspace(workspace("two", owner))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
    }

    #[tokio::test]
    async fn identity_resolution_requires_membership_and_system_type() {
        let store = InMemoryStore::new();
        let ws = workspace("acme", UserId::new());
        let ws_id = ws.id;
        store.insert_workspace(ws).await.unwrap();

        let member = user(Some(ws_id), "m@acme.com", SystemType::Erp);
        let member_id = member.id;
        store.insert_user(member).await.unwrap();

        assert!(store
            .user_in_workspace(member_id, "acme", SystemType::Erp)
            .await
            .unwrap()
            .is_some());
        // Wrong slug, wrong system type, unknown user: all resolve to nothing.
        assert!(store
            .user_in_workspace(member_id, "other", SystemType::Erp)
            .await
            .unwrap()
            .is_none());
        assert!(store
            .user_in_workspace(member_id, "acme", SystemType::Portal)
            .await
            .unwrap()
            .is_none());
        assert!(store
            .user_in_workspace(UserId::new(), "acme", SystemType::Erp)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn rotating_a_token_invalidates_the_previous_one() {
        let store = InMemoryStore::new();
        let user_id = UserId::new();

        let first = store
            .rotate_token(user_id, TokenKind::PasswordRecover)
            .await
            .unwrap();
        let second = store
            .rotate_token(user_id, TokenKind::PasswordRecover)
            .await
            .unwrap();

        assert!(store.token_by_id(first.id).await.unwrap().is_none());
        assert!(store.token_by_id(second.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn token_rotation_is_scoped_by_kind() {
        let store = InMemoryStore::new();
        let user_id = UserId::new();

        let recover = store
            .rotate_token(user_id, TokenKind::PasswordRecover)
            .await
            .unwrap();
        store
            .rotate_token(user_id, TokenKind::EmailVerification)
            .await
            .unwrap();

        assert!(store.token_by_id(recover.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn upsert_address_reuses_existing_id() {
        let store = InMemoryStore::new();
        let id = store
            .upsert_address(None, AddressFields::default())
            .await
            .unwrap();

        let updated = AddressFields {
            city: Some("Recife".into()),
            ..AddressFields::default()
        };
        let same = store.upsert_address(Some(id), updated).await.unwrap();
        assert_eq!(id, same);

        // Unknown id falls back to creating a fresh row.
        let fresh = store
            .upsert_address(Some(AddressId::new()), AddressFields::default())
            .await
            .unwrap();
        assert_ne!(fresh, id);
    }
}
