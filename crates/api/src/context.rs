use membership_auth::Role;
use membership_core::UserId;

/// Principal context for a request (authenticated identity + roles).
///
/// Inserted by the auth middleware and passed explicitly to every
/// authorization check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    user_id: UserId,
    login: String,
    roles: Vec<Role>,
}

impl PrincipalContext {
    pub fn new(user_id: UserId, login: String, roles: Vec<Role>) -> Self {
        Self {
            user_id,
            login,
            roles,
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn login(&self) -> &str {
        &self.login
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }
}
