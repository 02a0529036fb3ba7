//! Service wiring shared by every request.

use std::sync::Arc;

use atrium_auth::Hs256Jwt;
use atrium_store::Store;

use crate::notify::{Notifier, TracingNotifier};

/// Explicitly passed per-request dependencies. No global state: handlers get
/// this via an `Extension` layer and nothing else.
pub struct AppServices {
    pub store: Arc<dyn Store>,
    pub jwt: Arc<Hs256Jwt>,
    pub notifier: Arc<dyn Notifier>,
}

impl AppServices {
    pub fn new(store: Arc<dyn Store>, jwt_secret: &str) -> Self {
        Self::with_notifier(store, jwt_secret, Arc::new(TracingNotifier))
    }

    /// Tests substitute a recording notifier here.
    pub fn with_notifier(
        store: Arc<dyn Store>,
        jwt_secret: &str,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            jwt: Arc::new(Hs256Jwt::new(jwt_secret.as_bytes())),
            notifier,
        }
    }
}
