use serde::{Deserialize, Serialize};

use crate::Permission;

/// Console destinations and the permission each one requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConsoleRoute {
    /// Public sign-in page.
    Login,
    /// Landing dashboard.
    Dashboard,
    /// Clinic environment provisioning form.
    CreateEnvironment,
    /// Saved directory queries.
    Queries,
    /// Single user lookup.
    UserQuery,
    /// Cloud tenant lookup.
    CloudQuery,
    /// Console settings.
    Settings,
}

impl ConsoleRoute {
    /// Returns the browser path for this route.
    #[must_use]
    pub fn path(&self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Dashboard => "/dashboard",
            Self::CreateEnvironment => "/create-environment",
            Self::Queries => "/queries",
            Self::UserQuery => "/user-query",
            Self::CloudQuery => "/cloud-query",
            Self::Settings => "/settings",
        }
    }

    /// Returns a short menu label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Login => "Login",
            Self::Dashboard => "Dashboard",
            Self::CreateEnvironment => "Create environment",
            Self::Queries => "Queries",
            Self::UserQuery => "User query",
            Self::CloudQuery => "Cloud query",
            Self::Settings => "Settings",
        }
    }

    /// Returns the permission needed to open this route, if any.
    #[must_use]
    pub fn required_permission(&self) -> Option<Permission> {
        match self {
            Self::Login | Self::CloudQuery => None,
            Self::Dashboard => Some(Permission::ViewDashboard),
            Self::CreateEnvironment => Some(Permission::CreateClinicEnvironment),
            Self::Queries | Self::UserQuery => Some(Permission::ViewUserDetails),
            Self::Settings => Some(Permission::ModifySettings),
        }
    }

    /// Returns whether the route is only reachable with a session.
    #[must_use]
    pub fn requires_session(&self) -> bool {
        !matches!(self, Self::Login)
    }

    /// Returns every route.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[ConsoleRoute] = &[
            ConsoleRoute::Login,
            ConsoleRoute::Dashboard,
            ConsoleRoute::CreateEnvironment,
            ConsoleRoute::Queries,
            ConsoleRoute::UserQuery,
            ConsoleRoute::CloudQuery,
            ConsoleRoute::Settings,
        ];

        ALL
    }

    /// Returns the sidebar routes in display order.
    #[must_use]
    pub fn menu() -> &'static [Self] {
        const MENU: &[ConsoleRoute] = &[
            ConsoleRoute::Dashboard,
            ConsoleRoute::CreateEnvironment,
            ConsoleRoute::Queries,
            ConsoleRoute::UserQuery,
            ConsoleRoute::CloudQuery,
            ConsoleRoute::Settings,
        ];

        MENU
    }

    /// Resolves a browser path; `/` maps to the dashboard.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        let trimmed = path.trim_end_matches('/');
        if trimmed.is_empty() {
            return Some(Self::Dashboard);
        }

        Self::all()
            .iter()
            .copied()
            .find(|route| route.path() == trimmed)
    }
}
