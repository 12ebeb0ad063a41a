use std::collections::BTreeSet;
use std::sync::Arc;

use admanager_core::{AppError, AppResult};
use admanager_domain::{Permission, is_allowed, is_permitted, permissions_for_roles};

use crate::SessionStore;


/// Application service for permission checks against the cached session.
///
/// Decisions are recomputed from the stored role list on every call.
#[derive(Clone)]
pub struct AuthorizationService {
    store: Arc<SessionStore>,
}

impl AuthorizationService {
    /// Creates a new authorization service over the session store.
    #[must_use]
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self { store }
    }

    /// Returns whether the signed-in user holds the permission.
    #[must_use]
    pub fn current_user_can(&self, permission: Permission) -> bool {
        self.store
            .load()
            .is_some_and(|session| is_permitted(session.roles(), permission))
    }

    /// Returns whether the signed-in user holds a permission given by name.
    #[must_use]
    pub fn current_user_can_named(&self, permission: &str) -> bool {
        self.store
            .load()
            .is_some_and(|session| is_allowed(session.roles(), permission))
    }

    /// Ensures a session exists and grants the permission.
    pub fn require_permission(&self, permission: Permission) -> AppResult<()> {
        let session = self
            .store
            .load()
            .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

        if is_permitted(session.roles(), permission) {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "user '{}' is missing permission '{}'",
            session.username(),
            permission.as_str()
        )))
    }

    /// Returns every known permission the signed-in user holds.
    #[must_use]
    pub fn effective_permissions(&self) -> BTreeSet<Permission> {
        self.store
            .load()
            .map(|session| permissions_for_roles(session.roles()))
            .unwrap_or_default()
    }
}
