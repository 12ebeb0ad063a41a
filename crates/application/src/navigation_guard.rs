use std::sync::Arc;

use admanager_domain::{ConsoleRoute, Permission, is_permitted};

use crate::{AuthState, SessionLifecycleController};

/// Outcome of a navigation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// Startup check or login still in flight; show a loading indicator.
    Pending,
    /// Render the route.
    Allow,
    /// No session; send the user to the login page.
    RedirectToLogin,
    /// Signed in but lacking the permission the route needs.
    Forbidden(Permission),
}

/// Route gate consuming the session state and the role table.
#[derive(Clone)]
pub struct NavigationGuard {
    controller: Arc<SessionLifecycleController>,
}

impl NavigationGuard {
    /// Creates a guard reading from the controller's state and store.
    #[must_use]
    pub fn new(controller: Arc<SessionLifecycleController>) -> Self {
        Self { controller }
    }

    /// Decides whether the current session may open a route.
    #[must_use]
    pub fn decide(&self, route: ConsoleRoute) -> RouteDecision {
        if !route.requires_session() {
            return RouteDecision::Allow;
        }

        let status = self.controller.status();
        if !status.initialized || status.state == AuthState::Authenticating {
            return RouteDecision::Pending;
        }

        if status.state != AuthState::Authenticated {
            return RouteDecision::RedirectToLogin;
        }

        let Some(session) = self.controller.store().load() else {
            return RouteDecision::RedirectToLogin;
        };

        match route.required_permission() {
            Some(permission) if !is_permitted(session.roles(), permission) => {
                RouteDecision::Forbidden(permission)
            }
            _ => RouteDecision::Allow,
        }
    }

    /// Returns the sidebar entries the current session may open.
    ///
    /// Empty while no session is established.
    #[must_use]
    pub fn visible_routes(&self) -> Vec<ConsoleRoute> {
        ConsoleRoute::menu()
            .iter()
            .copied()
            .filter(|route| self.decide(*route) == RouteDecision::Allow)
            .collect()
    }
}
