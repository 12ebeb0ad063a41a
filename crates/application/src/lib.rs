//! Application services and ports.

#![forbid(unsafe_code)]

mod authorization_service;
mod navigation_guard;
mod session_interceptor;
mod session_lifecycle_controller;
mod session_ports;
mod session_store;

pub use authorization_service::AuthorizationService;
pub use navigation_guard::{NavigationGuard, RouteDecision};
pub use session_interceptor::{
    RequestTicket, ResponseDisposition, SessionInterceptor, UNAUTHORIZED_STATUS,
};
pub use session_lifecycle_controller::{
    AuthState, AuthStatus, INVALID_LOGIN_RESPONSE_MESSAGE, LOGIN_FAILED_MESSAGE,
    LOGIN_SUPERSEDED_MESSAGE, LogoutReason, SessionLifecycleController,
};
pub use session_ports::{AuthBackend, BackendReply, LoginGrant, SessionStorage, StorageWrite};
pub use session_store::{PROFILE_KEY, SessionStore, TOKEN_KEY};
