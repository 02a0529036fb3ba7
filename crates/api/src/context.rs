//! Typed request context: system scope, verified subject, resolved identity.
//!
//! Downstream handlers consume these instead of poking at a mutated request
//! object; each is inserted exactly once on the way in.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;

use atrium_core::{SystemType, UserId};
use atrium_store::{UserRecord, WorkspaceRecord};

use crate::app::errors::ApiError;
use crate::app::services::AppServices;

/// Which system a request targets, stamped by the outermost middleware from
/// the path prefix (`/erp`, `/portal`, else SaaS).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ScopeContext(pub SystemType);

/// The verified token subject. Present only behind the auth middleware.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AuthSubject(pub UserId);

/// Workspace-scoped identity: the identity resolver's output.
///
/// Extracting this runs the resolution contract: the subject must be a
/// member of the workspace named by the `:slug` path parameter, under the
/// request's system type, and (outside SaaS) the workspace must be active.
/// The user record arrives with its password hash already stripped.
#[derive(Debug, Clone)]
pub struct Identity {
    pub workspace: WorkspaceRecord,
    pub user: UserRecord,
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Identity {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ScopeContext(scope) = parts
            .extensions
            .get::<ScopeContext>()
            .copied()
            .ok_or_else(|| ApiError::internal("scope context not set"))?;

        let AuthSubject(subject) = parts
            .extensions
            .get::<AuthSubject>()
            .copied()
            .ok_or_else(|| ApiError::unauthorized("Invalid token"))?;

        let services = parts
            .extensions
            .get::<Arc<AppServices>>()
            .cloned()
            .ok_or_else(|| ApiError::internal("services not set"))?;

        let Path(params) = Path::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::internal("identity requires a routed path"))?;
        let slug = params
            .get("slug")
            .ok_or_else(|| ApiError::internal("identity requires a :slug path parameter"))?;

        let (workspace, user) = services
            .store
            .user_in_workspace(subject, slug, scope)
            .await?
            .ok_or_else(|| ApiError::unauthorized("User not found"))?;

        // SaaS administration stays reachable so a deactivated workspace can
        // be managed; ERP/Portal access is gated.
        if scope != SystemType::Saas && !workspace.active {
            return Err(ApiError::unauthorized("Workspace is deactivated"));
        }

        Ok(Identity {
            workspace,
            user: user.without_password_hash(),
        })
    }
}
