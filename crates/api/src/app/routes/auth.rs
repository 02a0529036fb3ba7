//! Account lifecycle: registration, password sessions, recovery,
//! verification, profile.
//!
//! Recovery and verification are enumeration-avoidant: a missing target
//! produces the same success response as a real one.

use std::sync::Arc;

use axum::{Extension, Json, http::StatusCode};
use chrono::Utc;

use atrium_auth::{hash_password, verify_password};
use atrium_core::{CustomerId, SystemType, UserId};
use atrium_store::{CustomerProfile, CustomerRecord, TokenKind, UserRecord};

use crate::app::dto;
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::{AuthSubject, ScopeContext};

const INVALID_CREDENTIALS: &str = "Invalid credentials.";

fn require_password(password: &str) -> Result<(), ApiError> {
    if password.len() < 6 {
        return Err(ApiError::bad_request(
            "Password must be at least 6 characters long.",
        ));
    }
    Ok(())
}

/// `POST {scope}/auth/register`
pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ScopeContext(scope)): Extension<ScopeContext>,
    Json(body): Json<dto::RegisterRequest>,
) -> Result<StatusCode, ApiError> {
    require_password(&body.password)?;

    let store = &services.store;
    let password_hash = hash_password(&body.password)?;

    match scope {
        SystemType::Saas => {
            // Top-level accounts live in the NULL-workspace partition; the
            // workspace comes later, when the owner creates one.
            if store
                .user_by_email(None, &body.email, SystemType::Saas)
                .await?
                .is_some()
            {
                return Err(ApiError::bad_request("User with same email already exists."));
            }

            store
                .insert_user(UserRecord {
                    id: UserId::new(),
                    workspace_id: None,
                    name: Some(body.name),
                    email: body.email,
                    password_hash: Some(password_hash),
                    system_type: SystemType::Saas,
                    email_verified: false,
                    created_at: Utc::now(),
                })
                .await?;
        }
        SystemType::Erp | SystemType::Portal => {
            let workspace = store
                .workspace_by_slug(&body.slug)
                .await?
                .ok_or_else(|| ApiError::bad_request("Workspace not found."))?;

            if store
                .user_by_email(Some(workspace.id), &body.email, scope)
                .await?
                .is_some()
            {
                return Err(ApiError::bad_request("User with same email already exists."));
            }

            let user = UserRecord {
                id: UserId::new(),
                workspace_id: Some(workspace.id),
                name: (scope == SystemType::Erp).then(|| body.name.clone()),
                email: body.email,
                password_hash: Some(password_hash),
                system_type: scope,
                email_verified: false,
                created_at: Utc::now(),
            };
            let user_id = user.id;
            store.insert_user(user).await?;

            // Self-registered portal users get their customer profile up
            // front; the name lives there, not on the user.
            if scope == SystemType::Portal {
                store
                    .insert_customer(CustomerRecord {
                        id: CustomerId::new(),
                        workspace_id: workspace.id,
                        user_id,
                        address_id: None,
                        profile: CustomerProfile {
                            name: body.name,
                            ..CustomerProfile::default()
                        },
                        created_at: Utc::now(),
                    })
                    .await?;
            }
        }
    }

    Ok(StatusCode::CREATED)
}

/// `POST {scope}/auth/sessions/password`
pub async fn authenticate(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ScopeContext(scope)): Extension<ScopeContext>,
    Json(body): Json<dto::AuthenticateRequest>,
) -> Result<(StatusCode, Json<dto::TokenResponse>), ApiError> {
    let store = &services.store;
    let workspace = store.workspace_by_slug(&body.slug).await?;

    let user = match scope {
        // Top-level accounts may predate their workspace.
        SystemType::Saas => {
            store
                .user_by_email(workspace.map(|w| w.id), &body.email, scope)
                .await?
        }
        SystemType::Erp | SystemType::Portal => {
            let workspace =
                workspace.ok_or_else(|| ApiError::bad_request(INVALID_CREDENTIALS))?;
            store
                .user_by_email(Some(workspace.id), &body.email, scope)
                .await?
        }
    };

    let user = user.ok_or_else(|| ApiError::bad_request(INVALID_CREDENTIALS))?;

    let password_hash = user.password_hash.ok_or_else(|| {
        ApiError::bad_request("User does not have a password, use social login.")
    })?;

    if !verify_password(&body.password, &password_hash)? {
        return Err(ApiError::bad_request(INVALID_CREDENTIALS));
    }

    let token = services.jwt.issue(user.id, Utc::now())?;

    Ok((StatusCode::CREATED, Json(dto::TokenResponse { token })))
}

/// `POST {scope}/auth/password/recover` (always 201)
pub async fn request_password_recover(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ScopeContext(scope)): Extension<ScopeContext>,
    Json(body): Json<dto::RecoverRequest>,
) -> Result<StatusCode, ApiError> {
    let store = &services.store;
    let workspace = store.workspace_by_slug(&body.slug).await?;

    let Some(user) = store
        .user_by_email(workspace.map(|w| w.id), &body.email, scope)
        .await?
    else {
        // Don't disclose whether the account exists.
        return Ok(StatusCode::CREATED);
    };

    let token = store.rotate_token(user.id, TokenKind::PasswordRecover).await?;
    services.notifier.password_recovery(&user.email, token.id);

    Ok(StatusCode::CREATED)
}

/// `POST {scope}/auth/password/reset`
pub async fn reset_password(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::ResetPasswordRequest>,
) -> Result<StatusCode, ApiError> {
    require_password(&body.password)?;

    let store = &services.store;
    let token = store
        .token_by_id(body.code)
        .await?
        .filter(|t| t.kind == TokenKind::PasswordRecover)
        .ok_or_else(|| ApiError::unauthorized("Invalid token"))?;

    let password_hash = hash_password(&body.password)?;
    store.set_password_hash(token.user_id, &password_hash).await?;
    store.delete_token(token.id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// `POST {scope}/auth/sessions/password/verify` (always 201)
pub async fn request_email_verification(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ScopeContext(scope)): Extension<ScopeContext>,
    Json(body): Json<dto::VerifyEmailRequest>,
) -> Result<StatusCode, ApiError> {
    let store = &services.store;
    let workspace = store.workspace_by_slug(&body.slug).await?;

    let user = store
        .user_by_email(workspace.map(|w| w.id), &body.email, scope)
        .await?;

    // Absent or already verified both succeed silently.
    let Some(user) = user.filter(|u| !u.email_verified) else {
        return Ok(StatusCode::CREATED);
    };

    let token = store
        .rotate_token(user.id, TokenKind::EmailVerification)
        .await?;
    services.notifier.email_verification(&user.email, token.id);

    Ok(StatusCode::CREATED)
}

/// `POST {scope}/auth/email/confirm`
pub async fn confirm_email(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::ConfirmEmailRequest>,
) -> Result<StatusCode, ApiError> {
    let store = &services.store;
    let token = store
        .token_by_id(body.code)
        .await?
        .filter(|t| t.kind == TokenKind::EmailVerification)
        .ok_or_else(|| ApiError::unauthorized("Invalid token"))?;

    store.mark_email_verified(token.user_id).await?;
    store.delete_token(token.id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// `POST /portal/auth/password`
///
/// First password for an onboarded portal user (created via ERP customer
/// onboarding, no credentials yet).
pub async fn create_password(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreatePasswordRequest>,
) -> Result<StatusCode, ApiError> {
    require_password(&body.password)?;

    let store = &services.store;
    let workspace = store
        .workspace_by_slug(&body.slug)
        .await?
        .ok_or_else(|| ApiError::bad_request("Workspace not found."))?;

    let user = store
        .user_by_email(Some(workspace.id), &body.email, SystemType::Portal)
        .await?
        .ok_or_else(|| ApiError::bad_request("User not found."))?;

    if user.password_hash.is_some() {
        return Err(ApiError::bad_request("User already has a password."));
    }

    let password_hash = hash_password(&body.password)?;
    store.set_password_hash(user.id, &password_hash).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// `GET {scope}/auth/profile`: the subject's own user record.
pub async fn profile(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ScopeContext(scope)): Extension<ScopeContext>,
    Extension(AuthSubject(subject)): Extension<AuthSubject>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = services
        .store
        .user_by_id(subject)
        .await?
        .filter(|u| u.system_type == scope)
        .ok_or_else(|| ApiError::unauthorized("User not found"))?;

    Ok(Json(serde_json::json!({
        "user": dto::user_to_dto(user.without_password_hash()),
    })))
}
