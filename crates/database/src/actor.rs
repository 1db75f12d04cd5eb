use crate::error::{Error, Result};
use models::Role;
use sea_orm::prelude::Uuid;

/// An already-authenticated caller
///
/// Identity is resolved at the API boundary; the core only sees the pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn require_admin(&self) -> Result<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(Error::Forbidden)
        }
    }

    /// Admins see everything, students only what they own
    pub fn require_access(&self, owner: Uuid) -> Result<()> {
        if self.is_admin() || self.user_id == owner {
            Ok(())
        } else {
            Err(Error::Forbidden)
        }
    }
}
