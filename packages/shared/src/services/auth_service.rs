use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::models::auth::requests::LoginRequest;
use crate::models::response::LOGOUT_MESSAGE;
use crate::models::session::{SessionId, SessionRef};
use crate::repositories::platform_authenticator::PlatformAuthenticator;
use crate::repositories::session_directory::SessionDirectory;
use crate::services::errors::auth_service_errors::AuthServiceError;
use crate::services::response_service::ResponseService;

pub const DUPLICATED_LOGIN: &str = "Duplicated login";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub account_id: String,
    /// Session that was holding the account and got logged out to make room.
    pub displaced_session: Option<SessionId>,
}

/// A duplicate login is resolved by logging the other session out and trying
/// exactly once more.
enum LoginState {
    AttemptingLogin,
    RetryingAfterForcedLogout,
    Done(Result<(), AuthServiceError>),
}

#[derive(Clone)]
pub struct AuthService {
    sessions: Arc<dyn SessionDirectory + Send + Sync>,
    authenticator: Arc<dyn PlatformAuthenticator + Send + Sync>,
    responses: ResponseService,
}

impl AuthService {
    pub fn new(
        sessions: Arc<dyn SessionDirectory + Send + Sync>,
        authenticator: Arc<dyn PlatformAuthenticator + Send + Sync>,
        responses: ResponseService,
    ) -> Self {
        AuthService {
            sessions,
            authenticator,
            responses,
        }
    }

    pub async fn login(
        &self,
        session_id: SessionId,
        body: &Value,
    ) -> Result<LoginOutcome, AuthServiceError> {
        let request = LoginRequest::parse(body)?;

        if request.requires_platform_auth() {
            let access_token = request.access_token.as_deref().unwrap_or_default();
            self.authenticator
                .authenticate(&request.platform, &request.account_id, access_token)
                .await
                .map_err(|e| {
                    warn!(
                        "Platform authentication failed: account_id={}, error={}",
                        request.account_id, e
                    );
                    AuthServiceError::from(e)
                })?;
        }

        let mut displaced_session = None;
        let mut state = LoginState::AttemptingLogin;
        loop {
            state = match state {
                LoginState::AttemptingLogin => {
                    if self
                        .sessions
                        .check_and_set_logged_in(&request.account_id, session_id)
                    {
                        LoginState::Done(Ok(()))
                    } else {
                        info!(
                            "Account logged in elsewhere, forcing logout: account_id={}",
                            request.account_id
                        );
                        displaced_session = self.force_logout(&request.account_id).await;
                        LoginState::RetryingAfterForcedLogout
                    }
                }
                LoginState::RetryingAfterForcedLogout => {
                    if self
                        .sessions
                        .check_and_set_logged_in(&request.account_id, session_id)
                    {
                        LoginState::Done(Ok(()))
                    } else {
                        error!(
                            "Login failed after forced logout: account_id={}, session_id={}",
                            request.account_id, session_id
                        );
                        LoginState::Done(Err(AuthServiceError::DuplicateLogin))
                    }
                }
                LoginState::Done(result) => {
                    return result.map(|()| LoginOutcome {
                        account_id: request.account_id,
                        displaced_session,
                    });
                }
            };
        }
    }

    async fn force_logout(&self, account_id: &str) -> Option<SessionId> {
        let previous = self.sessions.set_logged_out(account_id)?;
        self.responses
            .dispatch_empty(
                SessionRef::Session(previous),
                LOGOUT_MESSAGE,
                200,
                DUPLICATED_LOGIN,
            )
            .await;
        Some(previous)
    }

    /// Logs out whichever account `session_id` is logged in as.
    pub fn logout(&self, session_id: SessionId) -> Result<String, AuthServiceError> {
        let account_id = self
            .sessions
            .find_account(session_id)
            .ok_or(AuthServiceError::NotLoggedIn)?;
        self.sessions.set_logged_out(&account_id);
        Ok(account_id)
    }
}
