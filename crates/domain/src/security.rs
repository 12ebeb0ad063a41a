//! Permissions, roles and the static role table.
//!
//! The role table below is the only place that maps roles to permissions.
//! Views and API callers must go through [`is_allowed`] instead of deriving
//! access locally.

use std::collections::BTreeSet;
use std::str::FromStr;

use admanager_core::AppError;
use serde::{Deserialize, Serialize};

/// Role name that satisfies every permission check.
pub const ADMINISTRATOR_ROLE: &str = "Administrator";

/// Permissions gating console actions and routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Permission {
    /// Allows creating directory users.
    CreateUsers,
    /// Allows editing directory user attributes.
    ModifyUsers,
    /// Allows unlocking locked-out accounts.
    UnlockUsers,
    /// Allows disabling accounts.
    DisableUsers,
    /// Allows re-enabling disabled accounts.
    EnableUsers,
    /// Allows resetting user passwords.
    ResetPasswords,
    /// Allows querying user details.
    ViewUserDetails,
    /// Allows provisioning a clinic environment.
    CreateClinicEnvironment,
    /// Allows opening the dashboard.
    ViewDashboard,
    /// Allows reading the caller's own basic information.
    ViewBasicInfo,
    /// Allows changing console settings.
    ModifySettings,
}

impl Permission {
    /// Returns the stable wire value for this permission.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateUsers => "CreateUsers",
            Self::ModifyUsers => "ModifyUsers",
            Self::UnlockUsers => "UnlockUsers",
            Self::DisableUsers => "DisableUsers",
            Self::EnableUsers => "EnableUsers",
            Self::ResetPasswords => "ResetPasswords",
            Self::ViewUserDetails => "ViewUserDetails",
            Self::CreateClinicEnvironment => "CreateClinicEnvironment",
            Self::ViewDashboard => "ViewDashboard",
            Self::ViewBasicInfo => "ViewBasicInfo",
            Self::ModifySettings => "ModifySettings",
        }
    }

    /// Returns all known permissions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Permission] = &[
            Permission::CreateUsers,
            Permission::ModifyUsers,
            Permission::UnlockUsers,
            Permission::DisableUsers,
            Permission::EnableUsers,
            Permission::ResetPasswords,
            Permission::ViewUserDetails,
            Permission::CreateClinicEnvironment,
            Permission::ViewDashboard,
            Permission::ViewBasicInfo,
            Permission::ModifySettings,
        ];

        ALL
    }
}

impl FromStr for Permission {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|permission| permission.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown permission value '{value}'")))
    }
}

/// Roles the backend may assign to a console user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Satisfies every permission, known or not.
    Administrator,
    /// Manages directory user accounts.
    UserManager,
    /// Provisions clinic environments.
    ClinicCreator,
    /// Read-only operator.
    Viewer,
    /// Ordinary user with access to their own information.
    BasicUser,
}

impl Role {
    /// Returns the stable wire value for this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Administrator => ADMINISTRATOR_ROLE,
            Self::UserManager => "UserManager",
            Self::ClinicCreator => "ClinicCreator",
            Self::Viewer => "Viewer",
            Self::BasicUser => "BasicUser",
        }
    }

    /// Returns all known roles.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Role] = &[
            Role::Administrator,
            Role::UserManager,
            Role::ClinicCreator,
            Role::Viewer,
            Role::BasicUser,
        ];

        ALL
    }

    /// Returns the permissions granted by this role.
    #[must_use]
    pub fn permissions(&self) -> &'static [Permission] {
        match self {
            Self::Administrator => Permission::all(),
            Self::UserManager => &[
                Permission::CreateUsers,
                Permission::ModifyUsers,
                Permission::UnlockUsers,
                Permission::DisableUsers,
                Permission::EnableUsers,
                Permission::ResetPasswords,
                Permission::ViewUserDetails,
            ],
            Self::ClinicCreator => &[
                Permission::CreateClinicEnvironment,
                Permission::ViewDashboard,
            ],
            Self::Viewer => &[Permission::ViewDashboard, Permission::ViewUserDetails],
            Self::BasicUser => &[Permission::ViewBasicInfo],
        }
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|role| role.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown role value '{value}'")))
    }
}

/// Decides whether a role set grants a permission given by its wire name.
///
/// The Administrator role grants everything, including permission names this
/// build does not know. Unknown roles grant nothing. Matching is exact.
#[must_use]
pub fn is_allowed<R: AsRef<str>>(roles: &[R], permission: &str) -> bool {
    if roles.iter().any(|role| role.as_ref() == ADMINISTRATOR_ROLE) {
        return true;
    }

    roles
        .iter()
        .filter_map(|role| Role::from_str(role.as_ref()).ok())
        .any(|role| {
            role.permissions()
                .iter()
                .any(|granted| granted.as_str() == permission)
        })
}

/// Typed variant of [`is_allowed`].
#[must_use]
pub fn is_permitted<R: AsRef<str>>(roles: &[R], permission: Permission) -> bool {
    is_allowed(roles, permission.as_str())
}

/// Returns the union of known permissions granted by a role set.
#[must_use]
pub fn permissions_for_roles<R: AsRef<str>>(roles: &[R]) -> BTreeSet<Permission> {
    Permission::all()
        .iter()
        .copied()
        .filter(|permission| is_permitted(roles, *permission))
        .collect()
}
