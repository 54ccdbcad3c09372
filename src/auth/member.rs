use uuid::Uuid;

use super::{Permission, PermissionSet};
use crate::database::models::{Organization, Role, User};
use crate::services::ServiceError;

/// Authenticated account, injected by the JWT middleware after the
/// account row has been loaded.
#[derive(Clone, Debug)]
pub struct Account(pub User);

/// Authenticated organization member with resolved permissions.
#[derive(Clone, Debug)]
pub struct Member {
    pub user: User,
    pub organization: Organization,
    pub role: Option<Role>,
    pub permissions: PermissionSet,
}

impl Member {
    pub fn new(user: User, organization: Organization, role: Option<Role>) -> Self {
        let is_owner = organization.owner_id == user.id;
        let permissions = PermissionSet::resolve(is_owner, role.as_ref());
        Self {
            user,
            organization,
            role,
            permissions,
        }
    }

    pub fn id(&self) -> Uuid {
        self.user.id
    }

    pub fn organization_id(&self) -> Uuid {
        self.organization.id
    }

    pub fn is_owner(&self) -> bool {
        self.permissions.is_owner
    }

    /// Owner or holder of an administrator role
    pub fn is_admin(&self) -> bool {
        self.permissions.is_owner || self.permissions.is_admin
    }

    pub fn can(&self, permission: Permission) -> bool {
        self.permissions.allows(permission)
    }

    pub fn require(&self, permission: Permission) -> Result<(), ServiceError> {
        if self.can(permission) {
            return Ok(());
        }
        tracing::warn!(
            "Permission '{}' denied for user {} in organization {}",
            permission.as_str(),
            self.user.id,
            self.organization.id
        );
        Err(ServiceError::forbidden(format!(
            "Missing permission: {}",
            permission.as_str()
        )))
    }
}
