//! API-side authorization guard.
//!
//! Every handler checks the explicit request principal against the permission
//! its route needs before calling a service; services and domain crates stay
//! auth-agnostic.

use membership_auth::{AuthzError, Permission, Principal, Role, authorize, permissions};

use crate::context::PrincipalContext;

/// Check that the request principal holds `required`.
pub fn authorize_request(principal: &PrincipalContext, required: &Permission) -> Result<(), AuthzError> {
    let principal = Principal {
        user_id: principal.user_id(),
        login: principal.login().to_string(),
        roles: principal.roles().to_vec(),
        permissions: permissions_from_roles(principal.roles()),
    };
    authorize(&principal, required)
}

/// Static role → permission policy.
///
/// `admin` grants everything. The workshop manager runs the shop (catalogue,
/// stock, members) but cannot export member data. A plain user works the till.
/// Unknown roles grant nothing.
pub fn permissions_from_roles(roles: &[Role]) -> Vec<Permission> {
    if roles.iter().any(|r| r == &Role::ADMIN) {
        return vec![permissions::ALL];
    }

    let mut granted: Vec<Permission> = Vec::new();
    for permission in roles.iter().flat_map(role_permissions) {
        if !granted.contains(&permission) {
            granted.push(permission);
        }
    }
    granted
}

fn role_permissions(role: &Role) -> Vec<Permission> {
    match role.as_str() {
        "workshop_manager" => vec![
            permissions::SALES_READ,
            permissions::SALES_WRITE,
            permissions::STATISTICS_READ,
            permissions::ARTICLES_READ,
            permissions::ARTICLES_WRITE,
            permissions::STOCK_REASSORT,
            permissions::STOCK_REPAIR,
            permissions::ADHERENTS_READ,
            permissions::ADHERENTS_WRITE,
            permissions::ADHERENTS_DELETE,
        ],
        "user" => vec![
            permissions::SALES_READ,
            permissions::SALES_WRITE,
            permissions::STATISTICS_READ,
            permissions::ARTICLES_READ,
            permissions::ADHERENTS_READ,
            permissions::ADHERENTS_WRITE,
        ],
        _ => Vec::new(),
    }
}
