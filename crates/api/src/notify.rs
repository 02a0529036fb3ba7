//! Outbound notification boundary.
//!
//! Recovery codes, verification codes, and issued credentials leave the
//! system here. Delivery is at-least-once: implementations may retry, and
//! receivers must tolerate duplicates (codes are idempotent to redeliver).

use atrium_core::TokenId;

/// Abstract notification collaborator.
pub trait Notifier: Send + Sync {
    /// Deliver a password-recovery code to `email`.
    fn password_recovery(&self, email: &str, code: TokenId);

    /// Deliver an email-verification code to `email`.
    fn email_verification(&self, email: &str, code: TokenId);

    /// Tell a freshly onboarded user how to sign in.
    fn credentials_issued(&self, email: &str);

    /// Tell a user their sign-in email changed.
    fn credentials_updated(&self, email: &str);
}

/// Log-backed notifier used until a real mail provider is wired in.
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn password_recovery(&self, email: &str, code: TokenId) {
        tracing::info!(%email, %code, "password recovery code issued");
    }

    fn email_verification(&self, email: &str, code: TokenId) {
        tracing::info!(%email, %code, "email verification code issued");
    }

    fn credentials_issued(&self, email: &str) {
        tracing::info!(%email, "login credentials issued");
    }

    fn credentials_updated(&self, email: &str) {
        tracing::info!(%email, "login credentials updated");
    }
}
