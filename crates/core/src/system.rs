//! System-type partition of the identity space.
//!
//! The same email may belong to three independent identities in one
//! workspace, one per system context. The context is inferred from the
//! request path prefix by the API layer (`/erp`, `/portal`, else SaaS).

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Which system a user/request belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SystemType {
    Saas,
    Erp,
    Portal,
}

impl SystemType {
    /// Infer the system type from a request path.
    ///
    /// Matching is on whole path segments: `/erpx/...` is SaaS, not ERP.
    pub fn from_path(path: &str) -> Self {
        if path == "/erp" || path.starts_with("/erp/") {
            Self::Erp
        } else if path == "/portal" || path.starts_with("/portal/") {
            Self::Portal
        } else {
            Self::Saas
        }
    }

    /// Stable storage/wire name, matching the persisted enum.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Saas => "SAAS",
            Self::Erp => "ERP",
            Self::Portal => "PORTAL",
        }
    }
}

impl core::fmt::Display for SystemType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for SystemType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SAAS" => Ok(Self::Saas),
            "ERP" => Ok(Self::Erp),
            "PORTAL" => Ok(Self::Portal),
            other => Err(DomainError::validation(format!(
                "unknown system type: {other}"
            ))),
        }
    }
}
