//! The authentication collaborator seam.
//!
//! The portal does not implement login, session refresh or token handling;
//! it only needs to know who the current user is. Hosts provide that
//! through [`CurrentUser`].

use atrium_shared::{PortalError, Result};

/// Externally-provided accessor for the signed-in user's id.
///
/// Implementations fail with [`PortalError::Backend`] when there is no
/// usable session.
pub trait CurrentUser: Send + Sync {
    fn current_user_id(&self) -> Result<String>;
}

/// A fixed user id, for tests and single-user tooling.
pub struct FixedUser(pub String);

impl FixedUser {
    pub fn new(user_id: &str) -> Self {
        Self(user_id.to_string())
    }
}

impl CurrentUser for FixedUser {
    fn current_user_id(&self) -> Result<String> {
        if self.0.is_empty() {
            return Err(PortalError::Backend("no authenticated user".to_string()));
        }
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_user_yields_its_id() {
        assert_eq!(FixedUser::new("u1").current_user_id().unwrap(), "u1");
    }

    #[test]
    fn empty_user_is_an_error() {
        assert!(FixedUser::new("").current_user_id().is_err());
    }
}
