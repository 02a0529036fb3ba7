//! Persisted record types.
//!
//! These mirror the relational schema one-to-one. They carry no behavior;
//! business validation lives in the route handlers that assemble them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use atrium_core::{
    AddressId, CustomerId, DomainError, EmployeeId, SystemType, TokenId, UserId, WorkspaceId,
};

/// Identity record.
///
/// # Invariants
/// - `(workspace_id, email, system_type)` is unique; `workspace_id = None`
///   (the top-level SaaS owner) forms its own partition.
/// - `workspace_id` is immutable once set, except for the one-time link of a
///   SaaS owner to the workspace they create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: UserId,
    pub workspace_id: Option<WorkspaceId>,
    pub name: Option<String>,
    pub email: String,
    pub password_hash: Option<String>,
    pub system_type: SystemType,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    /// Drop the password hash before the record crosses the API boundary.
    pub fn without_password_hash(mut self) -> Self {
        self.password_hash = None;
        self
    }
}

/// Tenant boundary. One workspace per owner; deactivation gates all
/// authenticated ERP/Portal access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceRecord {
    pub id: WorkspaceId,
    pub slug: String,
    pub name: String,
    pub owner_id: UserId,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Free-form postal address; every field optional.
///
/// Serialized in the API's camelCase convention so it can double as the
/// request/response body shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressFields {
    pub street: Option<String>,
    pub number: Option<String>,
    pub complement: Option<String>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub zip_code: Option<String>,
    pub reference: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressRecord {
    pub id: AddressId,
    pub fields: AddressFields,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    Cpf,
    Cnpj,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cpf => "CPF",
            Self::Cnpj => "CNPJ",
        }
    }
}

impl core::str::FromStr for DocumentType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CPF" => Ok(Self::Cpf),
            "CNPJ" => Ok(Self::Cnpj),
            other => Err(DomainError::validation(format!(
                "unknown document type: {other}"
            ))),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "MALE",
            Self::Female => "FEMALE",
            Self::Other => "OTHER",
        }
    }
}

impl core::str::FromStr for Gender {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MALE" => Ok(Self::Male),
            "FEMALE" => Ok(Self::Female),
            "OTHER" => Ok(Self::Other),
            other => Err(DomainError::validation(format!("unknown gender: {other}"))),
        }
    }
}

/// Mutable employee profile fields (everything except the backing user and
/// address linkage).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmployeeProfile {
    pub name: String,
    pub avatar_url: Option<String>,
    pub corporate_email: Option<String>,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    pub crmv: Option<String>,
}

/// Workspace-scoped employee profile owning exactly one ERP user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeRecord {
    pub id: EmployeeId,
    pub workspace_id: WorkspaceId,
    pub user_id: UserId,
    pub address_id: Option<AddressId>,
    pub profile: EmployeeProfile,
    pub created_at: DateTime<Utc>,
}

/// Mutable customer profile fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerProfile {
    pub name: String,
    pub avatar_url: Option<String>,
    pub document_type: Option<DocumentType>,
    pub document: Option<String>,
    pub rg: Option<String>,
    pub trade_name: Option<String>,
    pub corporate_name: Option<String>,
    pub state_registration: Option<String>,
    pub marketing_email: Option<String>,
    pub billing_email: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    pub icms_contributor: Option<bool>,
}

/// Workspace-scoped customer profile owning exactly one Portal user
/// (customers sign into the portal, not the ERP).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerRecord {
    pub id: CustomerId,
    pub workspace_id: WorkspaceId,
    pub user_id: UserId,
    pub address_id: Option<AddressId>,
    pub profile: CustomerProfile,
    pub created_at: DateTime<Utc>,
}

/// What a token is good for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenKind {
    PasswordRecover,
    EmailVerification,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PasswordRecover => "PASSWORD_RECOVER",
            Self::EmailVerification => "EMAIL_VERIFICATION",
        }
    }
}

impl core::str::FromStr for TokenKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PASSWORD_RECOVER" => Ok(Self::PasswordRecover),
            "EMAIL_VERIFICATION" => Ok(Self::EmailVerification),
            other => Err(DomainError::validation(format!(
                "unknown token kind: {other}"
            ))),
        }
    }
}

/// Short-lived single-purpose token. The id itself is the code delivered
/// out-of-band.
///
/// # Invariants
/// - At most one live token per `(user_id, kind)`; issuing a new one deletes
///   priors first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRecord {
    pub id: TokenId,
    pub user_id: UserId,
    pub kind: TokenKind,
    pub created_at: DateTime<Utc>,
}

/// Listing row shared by employee and customer directories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileSummary {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "workspaceId")]
    pub workspace_id: WorkspaceId,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Billing snapshot read in a single store transaction.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct WorkspaceCounts {
    pub employees: i64,
    pub customers: i64,
}
