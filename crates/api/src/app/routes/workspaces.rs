//! Workspace management (SaaS scope only).

use std::sync::Arc;

use axum::{Extension, Json, http::StatusCode};
use chrono::Utc;

use atrium_core::{WorkspaceId, slugify};
use atrium_store::WorkspaceRecord;

use crate::app::dto;
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::{AuthSubject, Identity};

/// `POST /workspaces`: authenticated subject only; no slug to resolve yet.
pub async fn create_workspace(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(AuthSubject(owner)): Extension<AuthSubject>,
    Json(body): Json<dto::WorkspaceNameRequest>,
) -> Result<(StatusCode, Json<dto::WorkspaceCreatedResponse>), ApiError> {
    let store = &services.store;

    if store.workspace_by_owner(owner).await?.is_some() {
        return Err(ApiError::bad_request("This user already has a workspace"));
    }

    let slug = slugify(&body.name);
    if slug.is_empty() {
        return Err(ApiError::bad_request("Workspace name must contain letters or digits"));
    }
    if store.workspace_by_slug(&slug).await?.is_some() {
        return Err(ApiError::bad_request("A workspace with this name already exists"));
    }

    let workspace = WorkspaceRecord {
        id: WorkspaceId::new(),
        slug,
        name: body.name,
        owner_id: owner,
        active: true,
        created_at: Utc::now(),
    };
    let workspace_id = workspace.id;
    store.insert_workspace(workspace).await?;

    // Link the owner so slug-scoped SaaS routes resolve their identity.
    store.attach_user_to_workspace(owner, workspace_id).await?;

    tracing::info!(%workspace_id, "workspace created");

    Ok((
        StatusCode::CREATED,
        Json(dto::WorkspaceCreatedResponse { workspace_id }),
    ))
}

/// `PUT /workspaces/:slug`
pub async fn update_workspace(
    Extension(services): Extension<Arc<AppServices>>,
    identity: Identity,
    Json(body): Json<dto::WorkspaceNameRequest>,
) -> Result<StatusCode, ApiError> {
    services
        .store
        .rename_workspace(identity.workspace.id, &body.name)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// `GET /workspaces/:slug/billing`: counts read in one consistent snapshot.
pub async fn get_billing(
    Extension(services): Extension<Arc<AppServices>>,
    identity: Identity,
) -> Result<Json<dto::BillingResponse>, ApiError> {
    let billing = services
        .store
        .workspace_counts(identity.workspace.id)
        .await?;

    Ok(Json(dto::BillingResponse { billing }))
}
