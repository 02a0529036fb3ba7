//! Customer onboarding and maintenance.
//!
//! Each customer owns exactly one **Portal** user (customers sign into the
//! portal, not the ERP), so email uniqueness here is checked against the
//! PORTAL partition.

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::Path,
    http::StatusCode,
};
use chrono::Utc;

use atrium_core::{CustomerId, SystemType, UserId};
use atrium_store::{CustomerRecord, UserRecord};

use crate::app::dto;
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::Identity;

/// `POST /workspaces/:slug/customers`
pub async fn create_customer(
    Extension(services): Extension<Arc<AppServices>>,
    identity: Identity,
    Json(body): Json<dto::CustomerBody>,
) -> Result<(StatusCode, Json<dto::CustomerCreatedResponse>), ApiError> {
    let store = &services.store;
    let workspace_id = identity.workspace.id;

    if store
        .user_by_email(Some(workspace_id), &body.email, SystemType::Portal)
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
        system_type: SystemType::Portal,
        email_verified: false,
        created_at: Utc::now(),
    };
    let user_id = user.id;
    store.insert_user(user).await?;

    let address_id = match &body.address {
        Some(fields) => Some(store.upsert_address(None, fields.clone()).await?),
        None => None,
    };

    let customer = CustomerRecord {
        id: CustomerId::new(),
        workspace_id,
        user_id,
        address_id,
        profile: body.profile(),
        created_at: Utc::now(),
    };
    let customer_id = customer.id;
    store.insert_customer(customer).await?;

    services.notifier.credentials_issued(&body.email);

    Ok((
        StatusCode::CREATED,
        Json(dto::CustomerCreatedResponse { customer_id }),
    ))
}

/// `PUT /workspaces/:slug/customers/:customer_id`
pub async fn update_customer(
    Extension(services): Extension<Arc<AppServices>>,
    identity: Identity,
    Path((_slug, customer_id)): Path<(String, CustomerId)>,
    Json(body): Json<dto::CustomerBody>,
) -> Result<StatusCode, ApiError> {
    let store = &services.store;
    let workspace_id = identity.workspace.id;

    let customer = store
        .customer_by_id(workspace_id, customer_id)
        .await?
        .ok_or_else(|| ApiError::bad_request("Customer not found."))?;

    if store
        .user_by_email_excluding(
            workspace_id,
            &body.email,
            SystemType::Portal,
            customer.user_id,
        )
        .await?
        .is_some()
    {
        return Err(ApiError::bad_request("Email already exists."));
    }

    let user = store
        .user_by_id(customer.user_id)
        .await?
        .ok_or_else(|| ApiError::internal("customer without backing user"))?;
    let email_changed = user.email != body.email;

    if email_changed {
        store.set_user_email(customer.user_id, &body.email).await?;
    }

    let address_id = match &body.address {
        Some(fields) => Some(
            store
                .upsert_address(customer.address_id, fields.clone())
                .await?,
        ),
        None => customer.address_id,
    };

    store
        .update_customer(customer_id, address_id, body.profile())
        .await?;

    if email_changed {
        services.notifier.credentials_updated(&body.email);
    }

    Ok(StatusCode::NO_CONTENT)
}

/// `GET /workspaces/:slug/customers`
pub async fn list_customers(
    Extension(services): Extension<Arc<AppServices>>,
    identity: Identity,
) -> Result<Json<dto::CustomersResponse>, ApiError> {
    let customers = services.store.list_customers(identity.workspace.id).await?;
    Ok(Json(dto::CustomersResponse { customers }))
}
