use axum::{
    routing::{get, post, put},
    Router,
};
use atrium_core::SystemType;

use crate::middleware::{self, AuthState};

pub mod auth;
pub mod customers;
pub mod employees;
pub mod system;
pub mod workspaces;

/// Router for one scope (SAAS root, `/erp`, `/portal`). Public auth routes
/// are merged with the bearer-protected routes for that scope.
pub fn scope_router(scope: SystemType, auth_state: AuthState) -> Router {
    let mut public = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/sessions/password", post(auth::authenticate))
        .route("/auth/password/recover", post(auth::request_password_recover))
        .route("/auth/password/reset", post(auth::reset_password));

    if matches!(scope, SystemType::Erp | SystemType::Portal) {
        public = public
            .route(
                "/auth/sessions/password/verify",
                post(auth::request_email_verification),
            )
            .route("/auth/email/confirm", post(auth::confirm_email));
    }
    if scope == SystemType::Portal {
        public = public.route("/auth/password", post(auth::create_password));
    }

    let mut protected = Router::new().route("/auth/profile", get(auth::profile));

    if scope == SystemType::Saas {
        protected = protected
            .route("/workspaces", post(workspaces::create_workspace))
            .route("/workspaces/:slug", put(workspaces::update_workspace))
            .route("/workspaces/:slug/billing", get(workspaces::get_billing));
    }
    // Employees are managed from both back offices; customer onboarding and
    // the directory are ERP concerns, SAAS only edits existing customers.
    if matches!(scope, SystemType::Saas | SystemType::Erp) {
        protected = protected
            .route(
                "/workspaces/:slug/employees",
                post(employees::create_employee).get(employees::list_employees),
            )
            .route(
                "/workspaces/:slug/employees/:employee_id",
                put(employees::update_employee),
            )
            .route(
                "/workspaces/:slug/customers/:customer_id",
                put(customers::update_customer),
            );
    }
    if scope == SystemType::Erp {
        protected = protected.route(
            "/workspaces/:slug/customers",
            post(customers::create_customer).get(customers::list_customers),
        );
    }

    let protected = protected.layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    public.merge(protected)
}
