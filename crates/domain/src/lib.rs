//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod navigation;
mod security;
mod session;

pub use navigation::ConsoleRoute;
pub use security::{
    ADMINISTRATOR_ROLE, Permission, Role, is_allowed, is_permitted, permissions_for_roles,
};
pub use session::{Credentials, Session, UserProfile};
