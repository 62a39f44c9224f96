use serde_json::Value;
use std::future::{poll_fn, Future};
use std::sync::Arc;
use std::task::Poll;
use tracing::{debug, info, warn};

use crate::models::match_type::MatchType;
use crate::models::matchmaking::requests::{CancelMatchRequest, MatchRequest};
use crate::models::matchmaking::PlayerEntry;
use crate::models::response::MATCH_MESSAGE;
use crate::models::session::{SessionId, SessionMatchHistory, SessionRef};
use crate::repositories::matchmaking_client::{CancelOutcome, MatchOutcome, MatchmakingClient};
use crate::repositories::session_directory::SessionDirectory;
use crate::services::dedicated_server_service::DedicatedServerService;
use crate::services::errors::matchmaking_service_errors::MatchmakingServiceError;
use crate::services::response_service::ResponseService;
use crate::services::session_executor::{current_session, SessionExecutor};

/// Handles `match` and `cancel_match` requests and keeps each session's
/// [`SessionMatchHistory`] in step with its outstanding request.
///
/// Every method that reads or writes history must run on the session's
/// executor.
#[derive(Clone)]
pub struct MatchmakingService {
    sessions: Arc<dyn SessionDirectory + Send + Sync>,
    matchmaker: Arc<dyn MatchmakingClient + Send + Sync>,
    dedicated_servers: Arc<DedicatedServerService>,
    responses: ResponseService,
    executor: SessionExecutor,
}

impl MatchmakingService {
    pub fn new(
        sessions: Arc<dyn SessionDirectory + Send + Sync>,
        matchmaker: Arc<dyn MatchmakingClient + Send + Sync>,
        dedicated_servers: Arc<DedicatedServerService>,
        responses: ResponseService,
        executor: SessionExecutor,
    ) -> Self {
        MatchmakingService {
            sessions,
            matchmaker,
            dedicated_servers,
            responses,
            executor,
        }
    }

    fn ensure_owner(
        &self,
        account_id: &str,
        session_id: SessionId,
    ) -> Result<(), MatchmakingServiceError> {
        if self.sessions.find_session(account_id) == Some(session_id) {
            Ok(())
        } else {
            warn!(
                "Account does not belong to session: account_id={}, session_id={}",
                account_id, session_id
            );
            Err(MatchmakingServiceError::AccessDenied)
        }
    }

    fn set_history(&self, session_id: SessionId, history: SessionMatchHistory) {
        debug_assert_eq!(current_session(), Some(session_id));
        self.sessions.set_match_history(session_id, history);
    }

    fn clear_history(&self, session_id: SessionId) {
        debug_assert_eq!(current_session(), Some(session_id));
        self.sessions.clear_match_history(session_id);
    }

    /// Validates a `match` request and hands it to the queue. The outcome
    /// reaches the client later, either from the dedicated server service or
    /// from [`Self::on_match_outcome`].
    pub async fn request_match(
        &self,
        session_id: SessionId,
        body: &Value,
    ) -> Result<(), MatchmakingServiceError> {
        let request = MatchRequest::parse(body)?;
        self.ensure_owner(&request.account_id, session_id)?;
        let user_data = request.user_data()?;
        let account_id = request.account_id;
        let match_type = request.match_type;

        if match_type == MatchType::NoMatching {
            let dedicated_servers = self.dedicated_servers.clone();
            tokio::spawn(async move {
                dedicated_servers
                    .try_join_then_spawn(&account_id, user_data, match_type)
                    .await;
            });
            return Ok(());
        }

        if let Some(outstanding) = self.sessions.match_history(session_id) {
            warn!(
                "Session already matchmaking: session_id={}, account_id={}, match_type={}",
                session_id, outstanding.account_id, outstanding.match_type
            );
            return Err(MatchmakingServiceError::AlreadyRequested);
        }

        self.set_history(
            session_id,
            SessionMatchHistory {
                account_id: account_id.clone(),
                match_type,
            },
        );
        info!(
            "Matchmaking started: account_id={}, match_type={}",
            account_id, match_type
        );

        let matchmaker = self.matchmaker.clone();
        let player = PlayerEntry::new(&account_id, user_data);
        let mut outcome = Box::pin(async move { matchmaker.start(match_type, player).await });

        // the queue holds the request after the first poll, so a cancel queued
        // behind this job always finds it
        let first_poll = poll_fn(|cx| Poll::Ready(outcome.as_mut().poll(cx))).await;
        match first_poll {
            Poll::Ready(outcome) => self.on_match_outcome(session_id, outcome).await,
            Poll::Pending => {
                let service = self.clone();
                tokio::spawn(async move {
                    let outcome = outcome.await;
                    let executor = service.executor.clone();
                    executor.invoke(session_id, async move {
                        service.on_match_outcome(session_id, outcome).await;
                    });
                });
            }
        }
        Ok(())
    }

    /// Runs on the session executor once the queue has settled a request.
    pub async fn on_match_outcome(&self, session_id: SessionId, outcome: MatchOutcome) {
        let error = match outcome {
            MatchOutcome::Success { match_id } => {
                debug!(
                    "Match formed: session_id={}, match_id={}",
                    session_id, match_id
                );
                self.clear_history(session_id);
                return;
            }
            // whoever cancelled has already cleared the history, and a newer
            // request may own it by now
            MatchOutcome::Cancelled => return,
            MatchOutcome::AlreadyRequested => {
                self.clear_history(session_id);
                MatchmakingServiceError::AlreadyRequested
            }
            MatchOutcome::Timeout => {
                self.clear_history(session_id);
                MatchmakingServiceError::Timeout
            }
            MatchOutcome::Error => {
                self.clear_history(session_id);
                MatchmakingServiceError::MatchmakingError
            }
        };

        let (code, message) = error.response();
        self.responses
            .dispatch_empty(SessionRef::Session(session_id), MATCH_MESSAGE, code, message)
            .await;
    }

    /// Handles a `cancel_match` request. `Ok` is reported to the client as a
    /// plain success.
    pub async fn cancel_match(
        &self,
        session_id: SessionId,
        body: &Value,
    ) -> Result<(), MatchmakingServiceError> {
        let request = CancelMatchRequest::parse(body)?;
        if request.match_type == MatchType::NoMatching {
            return Ok(());
        }
        self.ensure_owner(&request.account_id, session_id)?;

        let Some(history) = self.sessions.match_history(session_id) else {
            debug!("No matchmaking to cancel: session_id={}", session_id);
            return Ok(());
        };

        match self
            .matchmaker
            .cancel(history.match_type, &history.account_id)
            .await
        {
            CancelOutcome::Success | CancelOutcome::NoRequest => {
                self.clear_history(session_id);
                Ok(())
            }
            CancelOutcome::Error => {
                warn!(
                    "Failed to cancel matchmaking: account_id={}, match_type={}",
                    history.account_id, history.match_type
                );
                Err(MatchmakingServiceError::MatchmakingError)
            }
        }
    }

    /// Drops the session's outstanding request, if any, without telling the
    /// client. Used on logout and when the connection goes away.
    pub async fn cancel_for_session(&self, session_id: SessionId) {
        let Some(history) = self.sessions.match_history(session_id) else {
            return;
        };

        let outcome = self
            .matchmaker
            .cancel(history.match_type, &history.account_id)
            .await;
        if outcome == CancelOutcome::Error {
            warn!(
                "Failed to cancel matchmaking for session: session_id={}, account_id={}",
                session_id, history.account_id
            );
        }
        self.clear_history(session_id);
    }
}
