use serde::{Deserialize, Serialize};

use crate::database::models::Role;

/// Capabilities a role can grant inside an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ManageEmployees,
    ManageDepartments,
    ManageRoles,
    ManageTasks,
    PostNews,
    ManageEvents,
    ManageAttendance,
    ViewStatistics,
    ReviewJoinRequests,
}

impl Permission {
    pub const ALL: [Permission; 9] = [
        Permission::ManageEmployees,
        Permission::ManageDepartments,
        Permission::ManageRoles,
        Permission::ManageTasks,
        Permission::PostNews,
        Permission::ManageEvents,
        Permission::ManageAttendance,
        Permission::ViewStatistics,
        Permission::ReviewJoinRequests,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ManageEmployees => "manage_employees",
            Permission::ManageDepartments => "manage_departments",
            Permission::ManageRoles => "manage_roles",
            Permission::ManageTasks => "manage_tasks",
            Permission::PostNews => "post_news",
            Permission::ManageEvents => "manage_events",
            Permission::ManageAttendance => "manage_attendance",
            Permission::ViewStatistics => "view_statistics",
            Permission::ReviewJoinRequests => "review_join_requests",
        }
    }
}

/// Effective permissions of one member, resolved from ownership and role flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet {
    pub is_owner: bool,
    pub is_admin: bool,
    granted: Vec<Permission>,
}

impl PermissionSet {
    pub fn resolve(is_owner: bool, role: Option<&Role>) -> Self {
        let is_admin = role.map(|r| r.is_admin).unwrap_or(false);
        let granted = match role {
            Some(role) => Permission::ALL
                .into_iter()
                .filter(|p| role_flag(role, *p))
                .collect(),
            None => Vec::new(),
        };

        Self {
            is_owner,
            is_admin,
            granted,
        }
    }

    pub fn allows(&self, permission: Permission) -> bool {
        self.is_owner || self.is_admin || self.granted.contains(&permission)
    }

    pub fn list(&self) -> Vec<Permission> {
        Permission::ALL
            .into_iter()
            .filter(|p| self.allows(*p))
            .collect()
    }
}

fn role_flag(role: &Role, permission: Permission) -> bool {
    match permission {
        Permission::ManageEmployees => role.can_manage_employees,
        Permission::ManageDepartments => role.can_manage_departments,
        Permission::ManageRoles => role.can_manage_roles,
        Permission::ManageTasks => role.can_manage_tasks,
        Permission::PostNews => role.can_post_news,
        Permission::ManageEvents => role.can_manage_events,
        Permission::ManageAttendance => role.can_manage_attendance,
        Permission::ViewStatistics => role.can_view_statistics,
        Permission::ReviewJoinRequests => role.can_review_join_requests,
    }
}
