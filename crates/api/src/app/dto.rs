//! Request/response DTOs and JSON mapping helpers.
//!
//! Wire casing is camelCase throughout; identifiers serialize as UUID
//! strings via the core newtypes.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use atrium_core::{CustomerId, EmployeeId, SystemType, TokenId, UserId, WorkspaceId};
use atrium_store::{
    AddressFields, CustomerProfile, DocumentType, EmployeeProfile, Gender, ProfileSummary,
    UserRecord, WorkspaceCounts,
};

// ── Auth ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub slug: String,
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct AuthenticateRequest {
    pub slug: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct RecoverRequest {
    pub slug: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub code: TokenId,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyEmailRequest {
    pub slug: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmEmailRequest {
    pub code: TokenId,
}

#[derive(Debug, Deserialize)]
pub struct CreatePasswordRequest {
    pub slug: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: UserId,
    pub name: Option<String>,
    pub email: String,
    pub system_type: SystemType,
    pub workspace_id: Option<WorkspaceId>,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
}

/// The password hash never crosses this boundary.
pub fn user_to_dto(user: UserRecord) -> UserDto {
    UserDto {
        id: user.id,
        name: user.name,
        email: user.email,
        system_type: user.system_type,
        workspace_id: user.workspace_id,
        email_verified: user.email_verified,
        created_at: user.created_at,
    }
}

// ── Workspaces ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct WorkspaceNameRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceCreatedResponse {
    pub workspace_id: WorkspaceId,
}

#[derive(Debug, Serialize)]
pub struct BillingResponse {
    pub billing: WorkspaceCounts,
}

// ── Employees ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeBody {
    pub name: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub corporate_email: Option<String>,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    pub crmv: Option<String>,
    pub address: Option<AddressFields>,
}

impl EmployeeBody {
    pub fn profile(&self) -> EmployeeProfile {
        EmployeeProfile {
            name: self.name.clone(),
            avatar_url: self.avatar_url.clone(),
            corporate_email: self.corporate_email.clone(),
            phone: self.phone.clone(),
            whatsapp: self.whatsapp.clone(),
            crmv: self.crmv.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeCreatedResponse {
    pub employee_id: EmployeeId,
}

#[derive(Debug, Serialize)]
pub struct EmployeesResponse {
    pub employees: Vec<ProfileSummary>,
}

// ── Customers ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerBody {
    pub name: String,
    pub email: String,
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
    pub address: Option<AddressFields>,
}

impl CustomerBody {
    pub fn profile(&self) -> CustomerProfile {
        CustomerProfile {
            name: self.name.clone(),
            avatar_url: self.avatar_url.clone(),
            document_type: self.document_type,
            document: self.document.clone(),
            rg: self.rg.clone(),
            trade_name: self.trade_name.clone(),
            corporate_name: self.corporate_name.clone(),
            state_registration: self.state_registration.clone(),
            marketing_email: self.marketing_email.clone(),
            billing_email: self.billing_email.clone(),
            birth_date: self.birth_date,
            gender: self.gender,
            phone: self.phone.clone(),
            whatsapp: self.whatsapp.clone(),
            icms_contributor: self.icms_contributor,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerCreatedResponse {
    pub customer_id: CustomerId,
}

#[derive(Debug, Serialize)]
pub struct CustomersResponse {
    pub customers: Vec<ProfileSummary>,
}
