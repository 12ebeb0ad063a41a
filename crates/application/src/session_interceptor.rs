//! Explicit request/response hooks binding outbound API calls to the session.

use std::sync::Arc;

use crate::{LogoutReason, SessionLifecycleController};

/// Status code that ends the session wherever it is observed.
pub const UNAUTHORIZED_STATUS: u16 = 401;

/// Per-request state handed out by [`SessionInterceptor::before_request`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTicket {
    authorization: Option<String>,
    generation: u64,
}

impl RequestTicket {
    /// Returns the `Authorization` header value to attach, if any.
    #[must_use]
    pub fn authorization(&self) -> Option<&str> {
        self.authorization.as_deref()
    }
}

/// What the caller should do after a response came back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseDisposition {
    /// Handle the response normally.
    Proceed,
    /// The session was ended; the UI must redirect to the login page.
    SessionEnded,
}

/// Hooks every outbound call layer runs around a request.
#[derive(Clone)]
pub struct SessionInterceptor {
    controller: Arc<SessionLifecycleController>,
}

impl SessionInterceptor {
    /// Creates the interceptor for a controller.
    #[must_use]
    pub fn new(controller: Arc<SessionLifecycleController>) -> Self {
        Self { controller }
    }

    /// Pre-request hook: captures the bearer header for the current session.
    #[must_use]
    pub fn before_request(&self) -> RequestTicket {
        let generation = self.controller.current_generation();
        let authorization = self
            .controller
            .store()
            .current_token()
            .map(|token| token.bearer_header());

        RequestTicket {
            authorization,
            generation,
        }
    }

    /// Post-response hook: a 401 forces logout with reason `Unauthorized`.
    ///
    /// A 401 for a request issued before a newer login does not end the
    /// newer session.
    #[must_use]
    pub fn after_response(&self, ticket: &RequestTicket, status: u16) -> ResponseDisposition {
        if status != UNAUTHORIZED_STATUS {
            return ResponseDisposition::Proceed;
        }

        if self
            .controller
            .end_session_if_current(ticket.generation, LogoutReason::Unauthorized)
        {
            return ResponseDisposition::SessionEnded;
        }

        if self.controller.store().load().is_none() {
            ResponseDisposition::SessionEnded
        } else {
            ResponseDisposition::Proceed
        }
    }
}
