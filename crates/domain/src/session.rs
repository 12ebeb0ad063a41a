//! Credentials, user profile and session snapshot types.

use std::fmt::{Debug, Formatter};

use admanager_core::{AccessToken, AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::{Permission, is_allowed, is_permitted};

/// Login input. Lives only for the duration of one login call.
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: String,
    remember_me: bool,
}

impl Credentials {
    /// Creates credentials, rejecting blank usernames and empty passwords.
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        remember_me: bool,
    ) -> AppResult<Self> {
        let username = username.into().trim().to_owned();
        let password = password.into();

        if username.is_empty() {
            return Err(AppError::Validation("username must not be empty".to_owned()));
        }

        if password.is_empty() {
            return Err(AppError::Validation("password must not be empty".to_owned()));
        }

        Ok(Self {
            username,
            password,
            remember_me,
        })
    }

    /// Returns the submitted username.
    #[must_use]
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Returns the submitted password.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.as_str()
    }

    /// Returns whether the user asked for a long-lived session.
    #[must_use]
    pub fn remember_me(&self) -> bool {
        self.remember_me
    }
}

impl Debug for Credentials {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("remember_me", &self.remember_me)
            .finish()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserProfilePayload {
    username: String,
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    groups: Vec<String>,
    #[serde(default)]
    roles: Vec<String>,
}

impl TryFrom<UserProfilePayload> for UserProfile {
    type Error = AppError;

    fn try_from(value: UserProfilePayload) -> Result<Self, Self::Error> {
        Self::new(value.username, value.full_name, value.groups, value.roles)
    }
}

/// Identity and entitlement snapshot of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "UserProfilePayload")]
pub struct UserProfile {
    username: String,
    full_name: Option<String>,
    groups: Vec<String>,
    roles: Vec<String>,
}

impl UserProfile {
    /// Creates a profile; the username must not be blank.
    pub fn new(
        username: impl Into<String>,
        full_name: Option<String>,
        groups: Vec<String>,
        roles: Vec<String>,
    ) -> AppResult<Self> {
        let username = username.into();
        if username.trim().is_empty() {
            return Err(AppError::Validation(
                "profile username must not be empty".to_owned(),
            ));
        }

        Ok(Self {
            username,
            full_name,
            groups,
            roles,
        })
    }

    /// Returns the directory account name.
    #[must_use]
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Returns the display name, if the directory has one.
    #[must_use]
    pub fn full_name(&self) -> Option<&str> {
        self.full_name.as_deref()
    }

    /// Returns directory group names in backend order.
    #[must_use]
    pub fn groups(&self) -> &[String] {
        self.groups.as_slice()
    }

    /// Returns console role names in backend order.
    #[must_use]
    pub fn roles(&self) -> &[String] {
        self.roles.as_slice()
    }

    /// Returns whether this profile's roles grant the permission.
    #[must_use]
    pub fn can(&self, permission: Permission) -> bool {
        is_permitted(&self.roles, permission)
    }

    /// Returns whether this profile's roles grant a permission by wire name.
    #[must_use]
    pub fn can_named(&self, permission: &str) -> bool {
        is_allowed(&self.roles, permission)
    }
}

/// Authenticated session: the bearer token plus the profile it was issued for.
///
/// A value of this type is always complete; partial sessions cannot be built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    token: AccessToken,
    profile: UserProfile,
}

impl Session {
    /// Creates a session from a token and its profile.
    #[must_use]
    pub fn new(token: AccessToken, profile: UserProfile) -> Self {
        Self { token, profile }
    }

    /// Returns the bearer token.
    #[must_use]
    pub fn token(&self) -> &AccessToken {
        &self.token
    }

    /// Returns the cached profile.
    #[must_use]
    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    /// Returns the account name of the session owner.
    #[must_use]
    pub fn username(&self) -> &str {
        self.profile.username()
    }

    /// Returns the role names cached with the session.
    #[must_use]
    pub fn roles(&self) -> &[String] {
        self.profile.roles()
    }

    /// Splits the session into its token and profile.
    #[must_use]
    pub fn into_parts(self) -> (AccessToken, UserProfile) {
        (self.token, self.profile)
    }
}
