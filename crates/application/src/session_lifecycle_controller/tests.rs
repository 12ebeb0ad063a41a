use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use admanager_core::{AccessToken, AppError, AppResult};
use admanager_domain::{Credentials, UserProfile};
use async_trait::async_trait;
use tokio::sync::Notify;

use crate::session_store::tests::{FakeSessionStorage, session};
use crate::{AuthBackend, BackendReply, LoginGrant, SessionStore};

use super::{
    AuthState, INVALID_LOGIN_RESPONSE_MESSAGE, LOGIN_FAILED_MESSAGE, LOGIN_SUPERSEDED_MESSAGE,
    LogoutReason, SessionLifecycleController,
};

#[derive(Clone)]
pub(crate) enum Scripted<T> {
    Reply(BackendReply<T>),
    TransportFailure,
    Malformed,
}

impl<T> Scripted<T> {
    fn resolve(self) -> AppResult<BackendReply<T>> {
        match self {
            Self::Reply(reply) => Ok(reply),
            Self::TransportFailure => Err(AppError::Transport("connection refused".to_owned())),
            Self::Malformed => Err(AppError::Internal("unexpected end of JSON".to_owned())),
        }
    }
}

#[derive(Clone)]
struct LoginGate {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

struct LoginScript {
    reply: Scripted<LoginGrant>,
    gate: Option<LoginGate>,
}

#[derive(Default)]
pub(crate) struct FakeAuthBackend {
    logins: HashMap<String, LoginScript>,
    validation: Option<Scripted<bool>>,
    current_user: Option<Scripted<Option<UserProfile>>>,
    pub(crate) login_calls: AtomicUsize,
    pub(crate) validate_calls: AtomicUsize,
}

impl FakeAuthBackend {
    pub(crate) fn with_login(self, username: &str, token: &str, roles: &[&str]) -> Self {
        self.with_login_reply(
            username,
            Scripted::Reply(BackendReply::Accepted(grant(username, token, roles))),
        )
    }

    pub(crate) fn with_login_reply(mut self, username: &str, reply: Scripted<LoginGrant>) -> Self {
        self.logins.insert(username.to_owned(), LoginScript { reply, gate: None });
        self
    }

    fn with_gated_login(
        mut self,
        username: &str,
        token: &str,
        roles: &[&str],
        gate: LoginGate,
    ) -> Self {
        self.logins.insert(
            username.to_owned(),
            LoginScript {
                reply: Scripted::Reply(BackendReply::Accepted(grant(username, token, roles))),
                gate: Some(gate),
            },
        );
        self
    }

    pub(crate) fn with_validation(mut self, reply: Scripted<bool>) -> Self {
        self.validation = Some(reply);
        self
    }

    pub(crate) fn with_current_user(mut self, reply: Scripted<Option<UserProfile>>) -> Self {
        self.current_user = Some(reply);
        self
    }
}

#[async_trait]
impl AuthBackend for FakeAuthBackend {
    async fn login(&self, credentials: &Credentials) -> AppResult<BackendReply<LoginGrant>> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        let Some(script) = self.logins.get(credentials.username()) else {
            return Ok(BackendReply::Rejected {
                status: 401,
                message: Some("Invalid credentials".to_owned()),
            });
        };

        if let Some(gate) = &script.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        script.reply.clone().resolve()
    }

    async fn validate_token(&self, _token: &AccessToken) -> AppResult<BackendReply<bool>> {
        self.validate_calls.fetch_add(1, Ordering::SeqCst);
        self.validation
            .clone()
            .unwrap_or(Scripted::Reply(BackendReply::Accepted(true)))
            .resolve()
    }

    async fn current_user(
        &self,
        _token: Option<&AccessToken>,
    ) -> AppResult<BackendReply<Option<UserProfile>>> {
        self.current_user
            .clone()
            .unwrap_or(Scripted::Reply(BackendReply::Accepted(None)))
            .resolve()
    }
}

fn grant(username: &str, token: &str, roles: &[&str]) -> LoginGrant {
    LoginGrant {
        token: Some(token.to_owned()),
        username: Some(username.to_owned()),
        full_name: Some(format!("{username} full name")),
        groups: vec!["GG-Console".to_owned()],
        roles: roles.iter().map(|role| (*role).to_owned()).collect(),
    }
}

pub(crate) fn controller_with_backend(
    backend: FakeAuthBackend,
) -> (Arc<SessionLifecycleController>, Arc<FakeAuthBackend>) {
    let backend = Arc::new(backend);
    let store = Arc::new(SessionStore::new(Arc::new(FakeSessionStorage::default())));
    let controller = Arc::new(SessionLifecycleController::new(backend.clone(), store));
    (controller, backend)
}

fn credentials(username: &str, password: &str) -> Credentials {
    match Credentials::new(username, password, false) {
        Ok(credentials) => credentials,
        Err(error) => panic!("test credentials must be valid: {error}"),
    }
}

fn stored_token(controller: &SessionLifecycleController) -> Option<String> {
    controller
        .store()
        .current_token()
        .map(|token| token.as_str().to_owned())
}

fn gate() -> LoginGate {
    LoginGate {
        entered: Arc::new(Notify::new()),
        release: Arc::new(Notify::new()),
    }
}

#[tokio::test]
async fn login_persists_backend_session() {
    let backend = FakeAuthBackend::default().with_login("csb1", "token-1", &["ClinicCreator"]);
    let (controller, _) = controller_with_backend(backend);

    let session = controller.login(credentials("csb1", "secret")).await;
    assert!(session.is_ok());

    let loaded = controller.store().load();
    assert_eq!(loaded.as_ref().map(|s| s.token().as_str()), Some("token-1"));
    assert_eq!(loaded, session.ok());
    let status = controller.status();
    assert_eq!(status.state, AuthState::Authenticated);
    assert!(status.initialized);
}

#[tokio::test]
async fn logout_clears_session() {
    let backend = FakeAuthBackend::default().with_login("csb1", "token-1", &["Viewer"]);
    let (controller, _) = controller_with_backend(backend);
    assert!(controller.login(credentials("csb1", "secret")).await.is_ok());

    controller.logout();

    assert!(controller.store().load().is_none());
    let status = controller.status();
    assert_eq!(status.state, AuthState::Unauthenticated);
    assert_eq!(status.ended_by, Some(LogoutReason::UserRequested));
    assert!(!LogoutReason::UserRequested.requires_login_redirect());
}

#[tokio::test]
async fn rejected_login_surfaces_backend_message_and_keeps_store() {
    let (controller, backend) = controller_with_backend(FakeAuthBackend::default());
    let previous = session("token-prev", "admin", &["Administrator"]);
    assert!(controller.store().save(&previous).is_ok());

    let result = controller.login(credentials("csb1", "wrongpass")).await;

    assert!(matches!(
        result,
        Err(AppError::Authentication(ref message)) if message == "Invalid credentials"
    ));
    assert_eq!(backend.login_calls.load(Ordering::SeqCst), 1);
    assert_eq!(controller.store().load(), Some(previous));
    assert_eq!(controller.state(), AuthState::Authenticated);
}

#[tokio::test]
async fn rejected_login_from_empty_store_is_unauthenticated() {
    let (controller, _) = controller_with_backend(FakeAuthBackend::default());

    assert!(controller.login(credentials("csb1", "wrongpass")).await.is_err());
    assert!(controller.store().load().is_none());
    assert_eq!(controller.state(), AuthState::Unauthenticated);
}

#[tokio::test]
async fn rejection_without_message_uses_fallback() {
    let backend = FakeAuthBackend::default().with_login_reply(
        "csb1",
        Scripted::Reply(BackendReply::Rejected {
            status: 500,
            message: None,
        }),
    );
    let (controller, _) = controller_with_backend(backend);

    let result = controller.login(credentials("csb1", "secret")).await;
    assert!(matches!(
        result,
        Err(AppError::Authentication(ref message)) if message == LOGIN_FAILED_MESSAGE
    ));
}

#[tokio::test]
async fn transport_failure_surfaces_as_authentication_error() {
    let backend = FakeAuthBackend::default().with_login_reply("csb1", Scripted::TransportFailure);
    let (controller, _) = controller_with_backend(backend);

    let result = controller.login(credentials("csb1", "secret")).await;
    assert!(matches!(
        result,
        Err(AppError::Authentication(ref message)) if message == LOGIN_FAILED_MESSAGE
    ));
    assert!(controller.store().load().is_none());
}

#[tokio::test]
async fn success_without_token_is_invalid_response() {
    let backend = FakeAuthBackend::default().with_login_reply(
        "csb1",
        Scripted::Reply(BackendReply::Accepted(LoginGrant {
            username: Some("csb1".to_owned()),
            ..LoginGrant::default()
        })),
    );
    let (controller, _) = controller_with_backend(backend);

    let result = controller.login(credentials("csb1", "secret")).await;
    assert!(matches!(
        result,
        Err(AppError::Authentication(ref message)) if message == INVALID_LOGIN_RESPONSE_MESSAGE
    ));
    assert!(controller.store().load().is_none());
}

#[tokio::test]
async fn unreadable_login_body_is_invalid_response() {
    let backend = FakeAuthBackend::default().with_login_reply("csb1", Scripted::Malformed);
    let (controller, _) = controller_with_backend(backend);

    let result = controller.login(credentials("csb1", "secret")).await;
    assert!(matches!(
        result,
        Err(AppError::Authentication(ref message)) if message == INVALID_LOGIN_RESPONSE_MESSAGE
    ));
}

#[tokio::test]
async fn validation_without_token_skips_backend() {
    let (controller, backend) = controller_with_backend(FakeAuthBackend::default());

    assert!(!controller.validate_cached_session().await);
    assert_eq!(backend.validate_calls.load(Ordering::SeqCst), 0);
    let status = controller.status();
    assert!(status.initialized);
    assert_eq!(status.state, AuthState::Unauthenticated);
}

#[tokio::test]
async fn accepted_validation_confirms_session() {
    let (controller, backend) = controller_with_backend(FakeAuthBackend::default());
    let stored = session("token-1", "csb1", &["Viewer"]);
    assert!(controller.store().save(&stored).is_ok());

    assert!(controller.validate_cached_session().await);
    assert_eq!(backend.validate_calls.load(Ordering::SeqCst), 1);
    assert_eq!(controller.state(), AuthState::Authenticated);
    assert_eq!(controller.store().load(), Some(stored));
}

#[tokio::test]
async fn failed_validation_forces_logout() {
    let failures = [
        Scripted::Reply(BackendReply::Rejected {
            status: 401,
            message: None,
        }),
        Scripted::Reply(BackendReply::Rejected {
            status: 503,
            message: Some("maintenance".to_owned()),
        }),
        Scripted::Reply(BackendReply::Accepted(false)),
        Scripted::TransportFailure,
    ];

    for failure in failures {
        let backend = FakeAuthBackend::default().with_validation(failure);
        let (controller, _) = controller_with_backend(backend);
        assert!(
            controller
                .store()
                .save(&session("token-1", "csb1", &["Viewer"]))
                .is_ok()
        );

        assert!(!controller.validate_cached_session().await);
        assert!(controller.store().load().is_none());
        let status = controller.status();
        assert_eq!(status.state, AuthState::Unauthenticated);
        assert_eq!(status.ended_by, Some(LogoutReason::ValidationFailed));
        assert!(LogoutReason::ValidationFailed.requires_login_redirect());
    }
}

#[tokio::test]
async fn logout_during_login_wins() {
    let login_gate = gate();
    let backend = FakeAuthBackend::default().with_gated_login(
        "csb1",
        "token-1",
        &["Viewer"],
        login_gate.clone(),
    );
    let (controller, _) = controller_with_backend(backend);

    let interrupt = async {
        login_gate.entered.notified().await;
        controller.logout();
        login_gate.release.notify_one();
    };
    let (result, ()) = tokio::join!(controller.login(credentials("csb1", "secret")), interrupt);

    assert!(matches!(
        result,
        Err(AppError::Authentication(ref message)) if message == LOGIN_SUPERSEDED_MESSAGE
    ));
    assert!(controller.store().load().is_none());
    assert_eq!(controller.state(), AuthState::Unauthenticated);
}

#[tokio::test]
async fn superseded_login_does_not_overwrite_newer_session() {
    let slow_gate = gate();
    let backend = FakeAuthBackend::default()
        .with_gated_login("slow", "token-slow", &["Viewer"], slow_gate.clone())
        .with_login("fast", "token-fast", &["Administrator"]);
    let (controller, _) = controller_with_backend(backend);

    let newer = async {
        slow_gate.entered.notified().await;
        let result = controller.login(credentials("fast", "secret")).await;
        slow_gate.release.notify_one();
        result
    };
    let (slow, fast) = tokio::join!(controller.login(credentials("slow", "secret")), newer);

    assert!(slow.is_err());
    assert!(fast.is_ok());
    assert_eq!(stored_token(&controller), Some("token-fast".to_owned()));
    assert_eq!(controller.state(), AuthState::Authenticated);
}

#[tokio::test]
async fn validation_failure_after_newer_login_is_discarded() {
    let backend = FakeAuthBackend::default().with_login("csb1", "token-2", &["Viewer"]);
    let (controller, _) = controller_with_backend(backend);
    assert!(
        controller
            .store()
            .save(&session("token-1", "csb1", &["Viewer"]))
            .is_ok()
    );

    let attempt = controller.current_generation();
    assert!(controller.login(credentials("csb1", "secret")).await.is_ok());

    assert!(!controller.end_session_if_current(attempt, LogoutReason::ValidationFailed));
    assert_eq!(stored_token(&controller), Some("token-2".to_owned()));
}

#[tokio::test]
async fn abandoned_login_does_not_stay_authenticating() {
    let login_gate = gate();
    let backend = FakeAuthBackend::default().with_gated_login(
        "csb1",
        "token-1",
        &["Viewer"],
        login_gate.clone(),
    );
    let (controller, _) = controller_with_backend(backend);

    let abandoned = tokio::time::timeout(
        Duration::from_millis(20),
        controller.login(credentials("csb1", "secret")),
    )
    .await;
    assert!(abandoned.is_err());

    login_gate.release.notify_one();
    assert!(controller.store().load().is_none());
    assert_eq!(controller.state(), AuthState::Unauthenticated);
}

#[tokio::test]
async fn subscribers_observe_transitions() {
    let backend = FakeAuthBackend::default().with_login("csb1", "token-1", &["Viewer"]);
    let (controller, _) = controller_with_backend(backend);
    let mut receiver = controller.subscribe();

    assert!(controller.login(credentials("csb1", "secret")).await.is_ok());
    assert!(receiver.has_changed().unwrap_or(false));
    assert_eq!(receiver.borrow_and_update().state, AuthState::Authenticated);

    controller.force_logout(LogoutReason::Unauthorized);
    let status = *receiver.borrow_and_update();
    assert_eq!(status.state, AuthState::Unauthenticated);
    assert_eq!(status.ended_by, Some(LogoutReason::Unauthorized));
}

#[tokio::test]
async fn current_user_unauthorized_forces_logout() {
    let backend = FakeAuthBackend::default().with_current_user(Scripted::Reply(
        BackendReply::Rejected {
            status: 401,
            message: None,
        },
    ));
    let (controller, _) = controller_with_backend(backend);
    assert!(
        controller
            .store()
            .save(&session("token-1", "csb1", &["Viewer"]))
            .is_ok()
    );

    assert!(controller.current_user().await.is_none());
    assert!(controller.store().load().is_none());
    assert_eq!(controller.status().ended_by, Some(LogoutReason::Unauthorized));
}

#[tokio::test]
async fn current_user_server_error_keeps_session() {
    let backend = FakeAuthBackend::default().with_current_user(Scripted::Reply(
        BackendReply::Rejected {
            status: 500,
            message: None,
        },
    ));
    let (controller, _) = controller_with_backend(backend);
    let stored = session("token-1", "csb1", &["Viewer"]);
    assert!(controller.store().save(&stored).is_ok());

    assert!(controller.current_user().await.is_none());
    assert_eq!(controller.store().load(), Some(stored));
}

#[tokio::test]
async fn current_user_returns_backend_profile() {
    let profile = UserProfile::new("csb1", None, Vec::new(), vec!["Viewer".to_owned()]).ok();
    let backend = FakeAuthBackend::default()
        .with_current_user(Scripted::Reply(BackendReply::Accepted(profile.clone())));
    let (controller, _) = controller_with_backend(backend);

    assert_eq!(controller.current_user().await, profile);
}
