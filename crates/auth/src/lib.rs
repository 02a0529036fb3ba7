//! `atrium-auth` — pure authentication boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: it knows how
//! to mint/verify bearer tokens and hash/verify passwords, nothing else.

pub mod claims;
pub mod jwt;
pub mod password;

pub use claims::{Claims, TokenValidationError, validate_claims};
pub use jwt::{Hs256Jwt, JwtVerifier, SESSION_TTL};
pub use password::{hash_password, verify_password};
