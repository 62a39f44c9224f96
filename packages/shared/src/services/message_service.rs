use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::models::response::{
    CANCEL_MATCH_MESSAGE, LOGIN_MESSAGE, LOGOUT_MESSAGE, MATCH_MESSAGE,
};
use crate::models::session::{SessionId, SessionRef};
use crate::repositories::session_directory::SessionDirectory;
use crate::services::auth_service::AuthService;
use crate::services::matchmaking_service::MatchmakingService;
use crate::services::response_service::{ResponseService, OK, OK_DOT};
use crate::services::session_executor::SessionExecutor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Login,
    Logout,
    Match,
    CancelMatch,
}

impl MessageKind {
    pub fn parse(message_type: &str) -> Option<Self> {
        match message_type {
            LOGIN_MESSAGE => Some(MessageKind::Login),
            LOGOUT_MESSAGE => Some(MessageKind::Logout),
            MATCH_MESSAGE => Some(MessageKind::Match),
            CANCEL_MATCH_MESSAGE => Some(MessageKind::CancelMatch),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Login => LOGIN_MESSAGE,
            MessageKind::Logout => LOGOUT_MESSAGE,
            MessageKind::Match => MATCH_MESSAGE,
            MessageKind::CancelMatch => CANCEL_MATCH_MESSAGE,
        }
    }
}

/// Entry point for everything the session gateway reports: session
/// lifecycle and client requests. Each event is queued on its session's
/// executor.
#[derive(Clone)]
pub struct MessageService {
    sessions: Arc<dyn SessionDirectory + Send + Sync>,
    executor: SessionExecutor,
    responses: ResponseService,
    auth: AuthService,
    matchmaking: MatchmakingService,
}

impl MessageService {
    pub fn new(
        sessions: Arc<dyn SessionDirectory + Send + Sync>,
        executor: SessionExecutor,
        responses: ResponseService,
        auth: AuthService,
        matchmaking: MatchmakingService,
    ) -> Self {
        MessageService {
            sessions,
            executor,
            responses,
            auth,
            matchmaking,
        }
    }

    pub fn session_opened(&self, session_id: SessionId) {
        let sessions = self.sessions.clone();
        self.executor.invoke(session_id, async move {
            sessions.open_session(session_id);
        });
    }

    /// Cancels matchmaking, logs out silently and forgets the session.
    pub fn session_closed(&self, session_id: SessionId) {
        let service = self.clone();
        self.executor.invoke(session_id, async move {
            service.matchmaking.cancel_for_session(session_id).await;
            if let Ok(account_id) = service.auth.logout(session_id) {
                debug!(
                    "Logged out on close: session_id={}, account_id={}",
                    session_id, account_id
                );
            }
            service.sessions.close_session(session_id);
            info!("Session closed: session_id={}", session_id);
        });
    }

    /// The transport went away but the session may come back, so only
    /// matchmaking is dropped.
    pub fn transport_detached(&self, session_id: SessionId) {
        let matchmaking = self.matchmaking.clone();
        self.executor.invoke(session_id, async move {
            matchmaking.cancel_for_session(session_id).await;
        });
    }

    /// Queues a client request. Returns `false` for message types the server
    /// does not handle; those are dropped.
    pub fn handle_message(&self, session_id: SessionId, message_type: &str, body: Value) -> bool {
        let Some(kind) = MessageKind::parse(message_type) else {
            warn!(
                "Unknown message type: session_id={}, message_type={}",
                session_id, message_type
            );
            return false;
        };

        let service = self.clone();
        self.executor.invoke(session_id, async move {
            service.process_message(session_id, kind, body).await;
        });
        true
    }

    async fn process_message(&self, session_id: SessionId, kind: MessageKind, body: Value) {
        if !self.sessions.is_open(session_id) {
            warn!(
                "Message for closed session: session_id={}, message_type={}",
                session_id,
                kind.as_str()
            );
            return;
        }

        match kind {
            MessageKind::Login => self.process_login(session_id, &body).await,
            MessageKind::Logout => self.process_logout(session_id).await,
            MessageKind::Match => self.process_match(session_id, &body).await,
            MessageKind::CancelMatch => self.process_cancel_match(session_id, &body).await,
        }
    }

    async fn process_login(&self, session_id: SessionId, body: &Value) {
        let target = SessionRef::Session(session_id);
        match self.auth.login(session_id, body).await {
            Ok(outcome) => {
                info!(
                    "Logged in: session_id={}, account_id={}",
                    session_id, outcome.account_id
                );
                if let Some(displaced) = outcome.displaced_session {
                    let matchmaking = self.matchmaking.clone();
                    self.executor.invoke(displaced, async move {
                        matchmaking.cancel_for_session(displaced).await;
                    });
                }
                self.responses
                    .dispatch(
                        target,
                        LOGIN_MESSAGE,
                        200,
                        OK,
                        json!({ "account_id": outcome.account_id }),
                    )
                    .await;
            }
            Err(e) => {
                let (code, message) = e.response();
                self.responses
                    .dispatch_empty(target, LOGIN_MESSAGE, code, message)
                    .await;
            }
        }
    }

    async fn process_logout(&self, session_id: SessionId) {
        let target = SessionRef::Session(session_id);
        match self.auth.logout(session_id) {
            Ok(account_id) => {
                info!(
                    "Logged out: session_id={}, account_id={}",
                    session_id, account_id
                );
                self.matchmaking.cancel_for_session(session_id).await;
                self.responses
                    .dispatch_empty(target, LOGOUT_MESSAGE, 200, OK)
                    .await;
            }
            Err(e) => {
                let (code, message) = e.response();
                self.responses
                    .dispatch_empty(target, LOGOUT_MESSAGE, code, message)
                    .await;
            }
        }
    }

    async fn process_match(&self, session_id: SessionId, body: &Value) {
        if let Err(e) = self.matchmaking.request_match(session_id, body).await {
            let (code, message) = e.response();
            self.responses
                .dispatch_empty(SessionRef::Session(session_id), MATCH_MESSAGE, code, message)
                .await;
        }
    }

    async fn process_cancel_match(&self, session_id: SessionId, body: &Value) {
        let (code, message) = match self.matchmaking.cancel_match(session_id, body).await {
            Ok(()) => (200, OK_DOT),
            Err(e) => e.response(),
        };
        self.responses
            .dispatch_empty(
                SessionRef::Session(session_id),
                CANCEL_MATCH_MESSAGE,
                code,
                message,
            )
            .await;
    }
}
