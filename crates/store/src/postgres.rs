//! Postgres-backed store.
//!
//! ## Thread safety
//!
//! Uses the sqlx connection pool, which is `Send + Sync`; there is no other
//! shared state.
//!
//! ## Tenant isolation
//!
//! Every profile query includes `workspace_id` in the WHERE clause, making
//! cross-workspace access impossible to express.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use atrium_core::{AddressId, CustomerId, EmployeeId, SystemType, TokenId, UserId, WorkspaceId};

use crate::records::{
    AddressFields, CustomerProfile, CustomerRecord, EmployeeProfile, EmployeeRecord,
    ProfileSummary, TokenKind, TokenRecord, UserRecord, WorkspaceCounts, WorkspaceRecord,
};
use crate::store::{Store, StoreError, StoreResult};

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Backend(e.to_string())
    }
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect and bring the schema up to date.
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPool::connect(database_url).await?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(Self::new(pool))
    }
}

fn parse_system_type(raw: String) -> StoreResult<SystemType> {
    raw.parse()
        .map_err(|e| StoreError::Backend(format!("corrupt system_type column: {e}")))
}

fn workspace_from_row(row: &PgRow) -> StoreResult<WorkspaceRecord> {
    Ok(WorkspaceRecord {
        id: WorkspaceId::from_uuid(row.try_get("id")?),
        slug: row.try_get("slug")?,
        name: row.try_get("name")?,
        owner_id: UserId::from_uuid(row.try_get("owner_id")?),
        active: row.try_get("active")?,
        created_at: row.try_get("created_at")?,
    })
}

fn user_from_row(row: &PgRow) -> StoreResult<UserRecord> {
    Ok(UserRecord {
        id: UserId::from_uuid(row.try_get("id")?),
        workspace_id: row
            .try_get::<Option<Uuid>, _>("workspace_id")?
            .map(WorkspaceId::from_uuid),
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        system_type: parse_system_type(row.try_get("system_type")?)?,
        email_verified: row.try_get("email_verified")?,
        created_at: row.try_get("created_at")?,
    })
}

fn employee_from_row(row: &PgRow) -> StoreResult<EmployeeRecord> {
    Ok(EmployeeRecord {
        id: EmployeeId::from_uuid(row.try_get("id")?),
        workspace_id: WorkspaceId::from_uuid(row.try_get("workspace_id")?),
        user_id: UserId::from_uuid(row.try_get("user_id")?),
        address_id: row
            .try_get::<Option<Uuid>, _>("address_id")?
            .map(AddressId::from_uuid),
        profile: EmployeeProfile {
            name: row.try_get("name")?,
            avatar_url: row.try_get("avatar_url")?,
            corporate_email: row.try_get("corporate_email")?,
            phone: row.try_get("phone")?,
            whatsapp: row.try_get("whatsapp")?,
            crmv: row.try_get("crmv")?,
        },
        created_at: row.try_get("created_at")?,
    })
}

fn customer_from_row(row: &PgRow) -> StoreResult<CustomerRecord> {
    Ok(CustomerRecord {
        id: CustomerId::from_uuid(row.try_get("id")?),
        workspace_id: WorkspaceId::from_uuid(row.try_get("workspace_id")?),
        user_id: UserId::from_uuid(row.try_get("user_id")?),
        address_id: row
            .try_get::<Option<Uuid>, _>("address_id")?
            .map(AddressId::from_uuid),
        profile: CustomerProfile {
            name: row.try_get("name")?,
            avatar_url: row.try_get("avatar_url")?,
            document_type: row
                .try_get::<Option<String>, _>("document_type")?
                .map(|s| {
                    s.parse()
                        .map_err(|e| StoreError::Backend(format!("corrupt document_type: {e}")))
                })
                .transpose()?,
            document: row.try_get("document")?,
            rg: row.try_get("rg")?,
            trade_name: row.try_get("trade_name")?,
            corporate_name: row.try_get("corporate_name")?,
            state_registration: row.try_get("state_registration")?,
            marketing_email: row.try_get("marketing_email")?,
            billing_email: row.try_get("billing_email")?,
            birth_date: row.try_get("birth_date")?,
            gender: row
                .try_get::<Option<String>, _>("gender")?
                .map(|s| {
                    s.parse()
                        .map_err(|e| StoreError::Backend(format!("corrupt gender: {e}")))
                })
                .transpose()?,
            phone: row.try_get("phone")?,
            whatsapp: row.try_get("whatsapp")?,
            icms_contributor: row.try_get("icms_contributor")?,
        },
        created_at: row.try_get("created_at")?,
    })
}

fn summary_from_row(row: &PgRow) -> StoreResult<ProfileSummary> {
    Ok(ProfileSummary {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        workspace_id: WorkspaceId::from_uuid(row.try_get("workspace_id")?),
        created_at: row.try_get("created_at")?,
    })
}

fn token_from_row(row: &PgRow) -> StoreResult<TokenRecord> {
    let kind: String = row.try_get("kind")?;
    Ok(TokenRecord {
        id: TokenId::from_uuid(row.try_get("id")?),
        user_id: UserId::from_uuid(row.try_get("user_id")?),
        kind: kind
            .parse()
            .map_err(|e| StoreError::Backend(format!("corrupt token kind: {e}")))?,
        created_at: row.try_get("created_at")?,
    })
}

fn require_row(result: sqlx::postgres::PgQueryResult) -> StoreResult<()> {
    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound);
    }
    Ok(())
}

#[async_trait]
impl Store for PgStore {
    async fn insert_workspace(&self, workspace: WorkspaceRecord) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO workspaces (id, slug, name, owner_id, active, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(workspace.id.as_uuid())
        .bind(&workspace.slug)
        .bind(&workspace.name)
        .bind(workspace.owner_id.as_uuid())
        .bind(workspace.active)
        .bind(workspace.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn workspace_by_slug(&self, slug: &str) -> StoreResult<Option<WorkspaceRecord>> {
        sqlx::query("SELECT * FROM workspaces WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?
            .map(|row| workspace_from_row(&row))
            .transpose()
    }

    async fn workspace_by_owner(&self, owner_id: UserId) -> StoreResult<Option<WorkspaceRecord>> {
        sqlx::query("SELECT * FROM workspaces WHERE owner_id = $1")
            .bind(owner_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .map(|row| workspace_from_row(&row))
            .transpose()
    }

    async fn rename_workspace(&self, id: WorkspaceId, name: &str) -> StoreResult<()> {
        let res = sqlx::query("UPDATE workspaces SET name = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(name)
            .execute(&self.pool)
            .await?;
        require_row(res)
    }

    async fn set_workspace_active(&self, id: WorkspaceId, active: bool) -> StoreResult<()> {
        let res = sqlx::query("UPDATE workspaces SET active = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(active)
            .execute(&self.pool)
            .await?;
        require_row(res)
    }

    async fn workspace_counts(&self, id: WorkspaceId) -> StoreResult<WorkspaceCounts> {
        // Both counts inside one transaction for a consistent snapshot.
        let mut tx = self.pool.begin().await?;
        let employees: i64 =
            sqlx::query_scalar("SELECT count(*) FROM employees WHERE workspace_id = $1")
                .bind(id.as_uuid())
                .fetch_one(&mut *tx)
                .await?;
        let customers: i64 =
            sqlx::query_scalar("SELECT count(*) FROM customers WHERE workspace_id = $1")
                .bind(id.as_uuid())
                .fetch_one(&mut *tx)
                .await?;
        tx.commit().await?;
        Ok(WorkspaceCounts { employees, customers })
    }

    async fn insert_user(&self, user: UserRecord) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO users
                 (id, workspace_id, name, email, password_hash, system_type,
                  email_verified, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(user.id.as_uuid())
        .bind(user.workspace_id.map(|w| *w.as_uuid()))
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.system_type.as_str())
        .bind(user.email_verified)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn user_by_id(&self, id: UserId) -> StoreResult<Option<UserRecord>> {
        sqlx::query("SELECT * FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .map(|row| user_from_row(&row))
            .transpose()
    }

    async fn user_in_workspace(
        &self,
        id: UserId,
        slug: &str,
        system_type: SystemType,
    ) -> StoreResult<Option<(WorkspaceRecord, UserRecord)>> {
        let row = sqlx::query(
            "SELECT u.*,
                    w.id AS w_id, w.slug AS w_slug, w.name AS w_name,
                    w.owner_id AS w_owner_id, w.active AS w_active,
                    w.created_at AS w_created_at
             FROM users u
             JOIN workspaces w ON w.id = u.workspace_id
             WHERE u.id = $1 AND w.slug = $2 AND u.system_type = $3",
        )
        .bind(id.as_uuid())
        .bind(slug)
        .bind(system_type.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else { return Ok(None) };

        let workspace = WorkspaceRecord {
            id: WorkspaceId::from_uuid(row.try_get("w_id")?),
            slug: row.try_get("w_slug")?,
            name: row.try_get("w_name")?,
            owner_id: UserId::from_uuid(row.try_get("w_owner_id")?),
            active: row.try_get("w_active")?,
            created_at: row.try_get("w_created_at")?,
        };
        let user = user_from_row(&row)?;
        Ok(Some((workspace, user)))
    }

    async fn user_by_email(
        &self,
        workspace_id: Option<WorkspaceId>,
        email: &str,
        system_type: SystemType,
    ) -> StoreResult<Option<UserRecord>> {
        sqlx::query(
            "SELECT * FROM users
             WHERE workspace_id IS NOT DISTINCT FROM $1
               AND email = $2 AND system_type = $3",
        )
        .bind(workspace_id.map(|w| *w.as_uuid()))
        .bind(email)
        .bind(system_type.as_str())
        .fetch_optional(&self.pool)
        .await?
        .map(|row| user_from_row(&row))
        .transpose()
    }

    async fn user_by_email_excluding(
        &self,
        workspace_id: WorkspaceId,
        email: &str,
        system_type: SystemType,
        exclude: UserId,
    ) -> StoreResult<Option<UserRecord>> {
        sqlx::query(
            "SELECT * FROM users
             WHERE workspace_id = $1 AND email = $2 AND system_type = $3
               AND id <> $4",
        )
        .bind(workspace_id.as_uuid())
        .bind(email)
        .bind(system_type.as_str())
        .bind(exclude.as_uuid())
        .fetch_optional(&self.pool)
        .await?
        .map(|row| user_from_row(&row))
        .transpose()
    }

    async fn set_user_email(&self, id: UserId, email: &str) -> StoreResult<()> {
        let res = sqlx::query("UPDATE users SET email = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(email)
            .execute(&self.pool)
            .await?;
        require_row(res)
    }

    async fn set_password_hash(&self, id: UserId, hash: &str) -> StoreResult<()> {
        let res = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(hash)
            .execute(&self.pool)
            .await?;
        require_row(res)
    }

    async fn mark_email_verified(&self, id: UserId) -> StoreResult<()> {
        let res = sqlx::query("UPDATE users SET email_verified = TRUE WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        require_row(res)
    }

    async fn attach_user_to_workspace(
        &self,
        id: UserId,
        workspace_id: WorkspaceId,
    ) -> StoreResult<()> {
        let res = sqlx::query("UPDATE users SET workspace_id = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(workspace_id.as_uuid())
            .execute(&self.pool)
            .await?;
        require_row(res)
    }

    async fn upsert_address(
        &self,
        id: Option<AddressId>,
        fields: AddressFields,
    ) -> StoreResult<AddressId> {
        let id = id.unwrap_or_default();
        sqlx::query(
            "INSERT INTO addresses
                 (id, street, number, complement, neighborhood, city, state,
                  country, zip_code, reference)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             ON CONFLICT (id) DO UPDATE SET
                 street = EXCLUDED.street, number = EXCLUDED.number,
                 complement = EXCLUDED.complement,
                 neighborhood = EXCLUDED.neighborhood, city = EXCLUDED.city,
                 state = EXCLUDED.state, country = EXCLUDED.country,
                 zip_code = EXCLUDED.zip_code, reference = EXCLUDED.reference",
        )
        .bind(id.as_uuid())
        .bind(&fields.street)
        .bind(&fields.number)
        .bind(&fields.complement)
        .bind(&fields.neighborhood)
        .bind(&fields.city)
        .bind(&fields.state)
        .bind(&fields.country)
        .bind(&fields.zip_code)
        .bind(&fields.reference)
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    async fn insert_employee(&self, employee: EmployeeRecord) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO employees
                 (id, workspace_id, user_id, address_id, name, avatar_url,
                  corporate_email, phone, whatsapp, crmv, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(employee.id.as_uuid())
        .bind(employee.workspace_id.as_uuid())
        .bind(employee.user_id.as_uuid())
        .bind(employee.address_id.map(|a| *a.as_uuid()))
        .bind(&employee.profile.name)
        .bind(&employee.profile.avatar_url)
        .bind(&employee.profile.corporate_email)
        .bind(&employee.profile.phone)
        .bind(&employee.profile.whatsapp)
        .bind(&employee.profile.crmv)
        .bind(employee.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn employee_by_id(
        &self,
        workspace_id: WorkspaceId,
        id: EmployeeId,
    ) -> StoreResult<Option<EmployeeRecord>> {
        sqlx::query("SELECT * FROM employees WHERE id = $1 AND workspace_id = $2")
            .bind(id.as_uuid())
            .bind(workspace_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .map(|row| employee_from_row(&row))
            .transpose()
    }

    async fn update_employee(
        &self,
        id: EmployeeId,
        address_id: Option<AddressId>,
        profile: EmployeeProfile,
    ) -> StoreResult<()> {
        let res = sqlx::query(
            "UPDATE employees SET
                 address_id = $2, name = $3, avatar_url = $4,
                 corporate_email = $5, phone = $6, whatsapp = $7, crmv = $8
             WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(address_id.map(|a| *a.as_uuid()))
        .bind(&profile.name)
        .bind(&profile.avatar_url)
        .bind(&profile.corporate_email)
        .bind(&profile.phone)
        .bind(&profile.whatsapp)
        .bind(&profile.crmv)
        .execute(&self.pool)
        .await?;
        require_row(res)
    }

    async fn list_employees(&self, workspace_id: WorkspaceId) -> StoreResult<Vec<ProfileSummary>> {
        sqlx::query(
            "SELECT id, name, workspace_id, created_at FROM employees
             WHERE workspace_id = $1 ORDER BY created_at DESC",
        )
        .bind(workspace_id.as_uuid())
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(summary_from_row)
        .collect()
    }

    async fn insert_customer(&self, customer: CustomerRecord) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO customers
                 (id, workspace_id, user_id, address_id, name, avatar_url,
                  document_type, document, rg, trade_name, corporate_name,
                  state_registration, marketing_email, billing_email,
                  birth_date, gender, phone, whatsapp, icms_contributor,
                  created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                     $14, $15, $16, $17, $18, $19, $20)",
        )
        .bind(customer.id.as_uuid())
        .bind(customer.workspace_id.as_uuid())
        .bind(customer.user_id.as_uuid())
        .bind(customer.address_id.map(|a| *a.as_uuid()))
        .bind(&customer.profile.name)
        .bind(&customer.profile.avatar_url)
        .bind(customer.profile.document_type.map(|d| d.as_str()))
        .bind(&customer.profile.document)
        .bind(&customer.profile.rg)
        .bind(&customer.profile.trade_name)
        .bind(&customer.profile.corporate_name)
        .bind(&customer.profile.state_registration)
        .bind(&customer.profile.marketing_email)
        .bind(&customer.profile.billing_email)
        .bind(customer.profile.birth_date)
        .bind(customer.profile.gender.map(|g| g.as_str()))
        .bind(&customer.profile.phone)
        .bind(&customer.profile.whatsapp)
        .bind(customer.profile.icms_contributor)
        .bind(customer.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn customer_by_id(
        &self,
        workspace_id: WorkspaceId,
        id: CustomerId,
    ) -> StoreResult<Option<CustomerRecord>> {
        sqlx::query("SELECT * FROM customers WHERE id = $1 AND workspace_id = $2")
            .bind(id.as_uuid())
            .bind(workspace_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .map(|row| customer_from_row(&row))
            .transpose()
    }

    async fn update_customer(
        &self,
        id: CustomerId,
        address_id: Option<AddressId>,
        profile: CustomerProfile,
    ) -> StoreResult<()> {
        let res = sqlx::query(
            "UPDATE customers SET
                 address_id = $2, name = $3, avatar_url = $4,
                 document_type = $5, document = $6, rg = $7, trade_name = $8,
                 corporate_name = $9, state_registration = $10,
                 marketing_email = $11, billing_email = $12, birth_date = $13,
                 gender = $14, phone = $15, whatsapp = $16,
                 icms_contributor = $17
             WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(address_id.map(|a| *a.as_uuid()))
        .bind(&profile.name)
        .bind(&profile.avatar_url)
        .bind(profile.document_type.map(|d| d.as_str()))
        .bind(&profile.document)
        .bind(&profile.rg)
        .bind(&profile.trade_name)
        .bind(&profile.corporate_name)
        .bind(&profile.state_registration)
        .bind(&profile.marketing_email)
        .bind(&profile.billing_email)
        .bind(profile.birth_date)
        .bind(profile.gender.map(|g| g.as_str()))
        .bind(&profile.phone)
        .bind(&profile.whatsapp)
        .bind(profile.icms_contributor)
        .execute(&self.pool)
        .await?;
        require_row(res)
    }

    async fn list_customers(&self, workspace_id: WorkspaceId) -> StoreResult<Vec<ProfileSummary>> {
        sqlx::query(
            "SELECT id, name, workspace_id, created_at FROM customers
             WHERE workspace_id = $1 ORDER BY created_at DESC",
        )
        .bind(workspace_id.as_uuid())
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(summary_from_row)
        .collect()
    }

    async fn rotate_token(&self, user_id: UserId, kind: TokenKind) -> StoreResult<TokenRecord> {
        let token = TokenRecord {
            id: TokenId::new(),
            user_id,
            kind,
            created_at: chrono::Utc::now(),
        };

        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM tokens WHERE user_id = $1 AND kind = $2")
            .bind(user_id.as_uuid())
            .bind(kind.as_str())
            .execute(&mut *tx)
            .await?;
        sqlx::query("INSERT INTO tokens (id, user_id, kind, created_at) VALUES ($1, $2, $3, $4)")
            .bind(token.id.as_uuid())
            .bind(token.user_id.as_uuid())
            .bind(token.kind.as_str())
            .bind(token.created_at)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(token)
    }

    async fn token_by_id(&self, id: TokenId) -> StoreResult<Option<TokenRecord>> {
        sqlx::query("SELECT * FROM tokens WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .map(|row| token_from_row(&row))
            .transpose()
    }

    async fn delete_token(&self, id: TokenId) -> StoreResult<()> {
        let res = sqlx::query("DELETE FROM tokens WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        require_row(res)
    }
}
