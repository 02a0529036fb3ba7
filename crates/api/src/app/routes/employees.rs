//! Employee onboarding and maintenance.
//!
//! Each employee owns exactly one ERP user. Creation issues no password;
//! the employee sets one through the recovery flow.

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::Path,
    http::StatusCode,
};
use chrono::Utc;

use atrium_core::{EmployeeId, SystemType, UserId};
use atrium_store::{EmployeeRecord, UserRecord};

use crate::app::dto;
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::Identity;

/// `POST /workspaces/:slug/employees`
pub async fn create_employee(
    Extension(services): Extension<Arc<AppServices>>,
    identity: Identity,
    Json(body): Json<dto::EmployeeBody>,
) -> Result<(StatusCode, Json<dto::EmployeeCreatedResponse>), ApiError> {
    let store = &services.store;
    let workspace_id = identity.workspace.id;

    if store
        .user_by_email(Some(workspace_id), &body.email, SystemType::Erp)
        .await?
        .is_some()
    {
        return Err(ApiError::bad_request("Email already exists."));
    }

    let user = UserRecord {
        id: UserId::new(),
        workspace_id: Some(workspace_id),
        name: None,
        email: body.email.clone(),
        password_hash: None,
        system_type: SystemType::Erp,
        email_verified: false,
        created_at: Utc::now(),
    };
    let user_id = user.id;
    store.insert_user(user).await?;

    let address_id = match &body.address {
        Some(fields) => Some(store.upsert_address(None, fields.clone()).await?),
        None => None,
    };

    let employee = EmployeeRecord {
        id: EmployeeId::new(),
        workspace_id,
        user_id,
        address_id,
        profile: body.profile(),
        created_at: Utc::now(),
    };
    let employee_id = employee.id;
    store.insert_employee(employee).await?;

    services.notifier.credentials_issued(&body.email);

    Ok((
        StatusCode::CREATED,
        Json(dto::EmployeeCreatedResponse { employee_id }),
    ))
}

/// `PUT /workspaces/:slug/employees/:employee_id`
pub async fn update_employee(
    Extension(services): Extension<Arc<AppServices>>,
    identity: Identity,
    Path((_slug, employee_id)): Path<(String, EmployeeId)>,
    Json(body): Json<dto::EmployeeBody>,
) -> Result<StatusCode, ApiError> {
    let store = &services.store;
    let workspace_id = identity.workspace.id;

    let employee = store
        .employee_by_id(workspace_id, employee_id)
        .await?
        .ok_or_else(|| ApiError::bad_request("Employee not found."))?;

    if store
        .user_by_email_excluding(workspace_id, &body.email, SystemType::Erp, employee.user_id)
        .await?
        .is_some()
    {
        return Err(ApiError::bad_request("Email already exists."));
    }

    let user = store
        .user_by_id(employee.user_id)
        .await?
        .ok_or_else(|| ApiError::internal("employee without backing user"))?;
    let email_changed = user.email != body.email;

    if email_changed {
        store.set_user_email(employee.user_id, &body.email).await?;
    }

    let address_id = match &body.address {
        Some(fields) => Some(
            store
                .upsert_address(employee.address_id, fields.clone())
                .await?,
        ),
        None => employee.address_id,
    };

    store
        .update_employee(employee_id, address_id, body.profile())
        .await?;

    if email_changed {
        services.notifier.credentials_updated(&body.email);
    }

    Ok(StatusCode::NO_CONTENT)
}

/// `GET /workspaces/:slug/employees`
pub async fn list_employees(
    Extension(services): Extension<Arc<AppServices>>,
    identity: Identity,
) -> Result<Json<dto::EmployeesResponse>, ApiError> {
    let employees = services.store.list_employees(identity.workspace.id).await?;
    Ok(Json(dto::EmployeesResponse { employees }))
}
