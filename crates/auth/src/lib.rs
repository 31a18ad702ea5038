//! `membership-auth`: authentication/authorization boundary.
//!
//! This crate is decoupled from HTTP and storage: it knows how to verify a
//! bearer token and how to check a permission, nothing more.

pub mod authorize;
pub mod claims;
pub mod jwt;
pub mod permissions;
pub mod roles;

pub use authorize::{AuthzError, Principal, authorize};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256JwtValidator, JwtError, JwtValidator};
pub use permissions::Permission;
pub use roles::Role;
