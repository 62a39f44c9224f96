use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::models::response::ResponseEnvelope;
use crate::models::session::{SessionId, SessionMatchHistory};
use crate::repositories::errors::session_directory_errors::SessionDirectoryError;

#[cfg(test)]
use mockall::automock;

/// Live client sessions, the account each is logged in as, and the per
/// session matchmaking history.
///
/// Match history must only be read or written from inside the owning
/// session's executor.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SessionDirectory: Send + Sync {
    fn open_session(&self, session_id: SessionId);
    /// Forgets the session, and its login if any. Returns the account that
    /// was bound to it.
    fn close_session(&self, session_id: SessionId) -> Option<String>;
    fn is_open(&self, session_id: SessionId) -> bool;

    fn find_session(&self, account_id: &str) -> Option<SessionId>;
    fn find_account(&self, session_id: SessionId) -> Option<String>;
    /// Binds `account_id` to `session_id`. Fails if the account is already
    /// logged in on another session.
    fn check_and_set_logged_in(&self, account_id: &str, session_id: SessionId) -> bool;
    /// Unbinds `account_id`, returning the session it was logged in on.
    fn set_logged_out(&self, account_id: &str) -> Option<SessionId>;

    fn match_history(&self, session_id: SessionId) -> Option<SessionMatchHistory>;
    fn set_match_history(&self, session_id: SessionId, history: SessionMatchHistory);
    fn clear_match_history(&self, session_id: SessionId);

    async fn send_message(
        &self,
        session_id: SessionId,
        message_type: &str,
        envelope: &ResponseEnvelope,
    ) -> Result<(), SessionDirectoryError>;
}

#[derive(Debug, Default)]
struct SessionEntry {
    account_id: Option<String>,
    match_history: Option<SessionMatchHistory>,
}

#[derive(Debug, Default)]
struct SessionTable {
    sessions: HashMap<SessionId, SessionEntry>,
    accounts: HashMap<String, SessionId>,
}

/// Outgoing side of the session gateway.
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn deliver(
        &self,
        session_id: SessionId,
        message_type: &str,
        envelope: &ResponseEnvelope,
    ) -> Result<(), SessionDirectoryError>;
}

/// Pushes messages to the session gateway over HTTP.
pub struct HttpMessageSink {
    client: reqwest::Client,
    base_url: String,
}

impl HttpMessageSink {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        HttpMessageSink {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl MessageSink for HttpMessageSink {
    async fn deliver(
        &self,
        session_id: SessionId,
        message_type: &str,
        envelope: &ResponseEnvelope,
    ) -> Result<(), SessionDirectoryError> {
        let url = format!(
            "{}/sessions/{}/messages/{}",
            self.base_url, session_id, message_type
        );
        let response = self
            .client
            .post(&url)
            .json(envelope)
            .send()
            .await
            .map_err(|e| SessionDirectoryError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SessionDirectoryError::Http(format!(
                "status {} from {}",
                response.status(),
                url
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub session_id: SessionId,
    pub message_type: String,
    pub envelope: ResponseEnvelope,
}

/// Hands messages to an in-process channel, for embedding the manager next to
/// the transport that owns the sessions.
pub struct ChannelMessageSink {
    sender: mpsc::UnboundedSender<OutboundMessage>,
}

impl ChannelMessageSink {
    pub fn new(sender: mpsc::UnboundedSender<OutboundMessage>) -> Self {
        ChannelMessageSink { sender }
    }
}

#[async_trait]
impl MessageSink for ChannelMessageSink {
    async fn deliver(
        &self,
        session_id: SessionId,
        message_type: &str,
        envelope: &ResponseEnvelope,
    ) -> Result<(), SessionDirectoryError> {
        self.sender
            .send(OutboundMessage {
                session_id,
                message_type: message_type.to_string(),
                envelope: envelope.clone(),
            })
            .map_err(|_| SessionDirectoryError::SessionClosed(session_id.to_string()))
    }
}

/// Session and login bookkeeping held in process memory.
pub struct LocalSessionDirectory {
    table: Mutex<SessionTable>,
    sink: Arc<dyn MessageSink + Send + Sync>,
}

impl LocalSessionDirectory {
    pub fn new(sink: Arc<dyn MessageSink + Send + Sync>) -> Self {
        LocalSessionDirectory {
            table: Mutex::new(SessionTable::default()),
            sink,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl SessionDirectory for LocalSessionDirectory {
    fn open_session(&self, session_id: SessionId) {
        let mut table = self.lock();
        if !table.sessions.contains_key(&session_id) {
            table.sessions.insert(session_id, SessionEntry::default());
            debug!("Session opened: session_id={}", session_id);
        }
    }

    fn close_session(&self, session_id: SessionId) -> Option<String> {
        let mut table = self.lock();
        let entry = table.sessions.remove(&session_id)?;
        let account_id = entry.account_id?;
        if table.accounts.get(&account_id) == Some(&session_id) {
            table.accounts.remove(&account_id);
        }
        debug!(
            "Session closed: session_id={}, account_id={}",
            session_id, account_id
        );
        Some(account_id)
    }

    fn is_open(&self, session_id: SessionId) -> bool {
        self.lock().sessions.contains_key(&session_id)
    }

    fn find_session(&self, account_id: &str) -> Option<SessionId> {
        self.lock().accounts.get(account_id).copied()
    }

    fn find_account(&self, session_id: SessionId) -> Option<String> {
        self.lock()
            .sessions
            .get(&session_id)
            .and_then(|entry| entry.account_id.clone())
    }

    fn check_and_set_logged_in(&self, account_id: &str, session_id: SessionId) -> bool {
        let mut table = self.lock();
        match table.accounts.get(account_id) {
            Some(existing) if *existing != session_id => return false,
            Some(_) => return true,
            None => {}
        }

        let table = &mut *table;
        let entry = table.sessions.entry(session_id).or_default();
        if let Some(previous) = entry.account_id.replace(account_id.to_string()) {
            table.accounts.remove(&previous);
        }
        table.accounts.insert(account_id.to_string(), session_id);
        info!(
            "Account logged in: account_id={}, session_id={}",
            account_id, session_id
        );
        true
    }

    fn set_logged_out(&self, account_id: &str) -> Option<SessionId> {
        let mut table = self.lock();
        let session_id = table.accounts.remove(account_id)?;
        if let Some(entry) = table.sessions.get_mut(&session_id) {
            entry.account_id = None;
        }
        info!(
            "Account logged out: account_id={}, session_id={}",
            account_id, session_id
        );
        Some(session_id)
    }

    fn match_history(&self, session_id: SessionId) -> Option<SessionMatchHistory> {
        self.lock()
            .sessions
            .get(&session_id)
            .and_then(|entry| entry.match_history.clone())
    }

    fn set_match_history(&self, session_id: SessionId, history: SessionMatchHistory) {
        if let Some(entry) = self.lock().sessions.get_mut(&session_id) {
            entry.match_history = Some(history);
        }
    }

    fn clear_match_history(&self, session_id: SessionId) {
        if let Some(entry) = self.lock().sessions.get_mut(&session_id) {
            entry.match_history = None;
        }
    }

    async fn send_message(
        &self,
        session_id: SessionId,
        message_type: &str,
        envelope: &ResponseEnvelope,
    ) -> Result<(), SessionDirectoryError> {
        if !self.is_open(session_id) {
            return Err(SessionDirectoryError::SessionClosed(session_id.to_string()));
        }

        self.sink
            .deliver(session_id, message_type, envelope)
            .await?;

        debug!(
            "Sent message: session_id={}, message_type={}, code={}",
            session_id, message_type, envelope.error.code
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::match_type::MatchType;

    fn directory() -> LocalSessionDirectory {
        let (sender, _receiver) = mpsc::unbounded_channel();
        LocalSessionDirectory::new(Arc::new(ChannelMessageSink::new(sender)))
    }

    #[test]
    fn test_login_binds_account_to_session() {
        let directory = directory();
        let session_id = SessionId::new();
        directory.open_session(session_id);

        assert!(directory.check_and_set_logged_in("a", session_id));

        assert_eq!(directory.find_session("a"), Some(session_id));
        assert_eq!(directory.find_account(session_id), Some("a".to_string()));
    }

    #[test]
    fn test_login_on_second_session_fails_until_logged_out() {
        let directory = directory();
        let first = SessionId::new();
        let second = SessionId::new();
        directory.open_session(first);
        directory.open_session(second);
        assert!(directory.check_and_set_logged_in("a", first));

        assert!(!directory.check_and_set_logged_in("a", second));
        assert!(directory.check_and_set_logged_in("a", first));

        assert_eq!(directory.set_logged_out("a"), Some(first));
        assert_eq!(directory.find_account(first), None);
        assert!(directory.check_and_set_logged_in("a", second));
        assert_eq!(directory.find_session("a"), Some(second));
    }

    #[test]
    fn test_relogin_with_other_account_releases_previous() {
        let directory = directory();
        let session_id = SessionId::new();
        directory.open_session(session_id);
        directory.check_and_set_logged_in("a", session_id);

        directory.check_and_set_logged_in("b", session_id);

        assert_eq!(directory.find_session("a"), None);
        assert_eq!(directory.find_session("b"), Some(session_id));
    }

    #[test]
    fn test_close_session_releases_account() {
        let directory = directory();
        let session_id = SessionId::new();
        directory.open_session(session_id);
        directory.check_and_set_logged_in("a", session_id);

        assert_eq!(directory.close_session(session_id), Some("a".to_string()));

        assert!(!directory.is_open(session_id));
        assert_eq!(directory.find_session("a"), None);
        assert_eq!(directory.close_session(session_id), None);
    }

    #[test]
    fn test_match_history_set_and_clear() {
        let directory = directory();
        let session_id = SessionId::new();
        directory.open_session(session_id);
        let history = SessionMatchHistory {
            account_id: "a".to_string(),
            match_type: MatchType::OneVsOne,
        };

        directory.set_match_history(session_id, history.clone());
        assert_eq!(directory.match_history(session_id), Some(history));

        directory.clear_match_history(session_id);
        assert_eq!(directory.match_history(session_id), None);
    }

    #[test]
    fn test_match_history_ignored_for_unknown_session() {
        let directory = directory();
        let session_id = SessionId::new();

        directory.set_match_history(
            session_id,
            SessionMatchHistory {
                account_id: "a".to_string(),
                match_type: MatchType::OneVsOne,
            },
        );

        assert_eq!(directory.match_history(session_id), None);
    }

    #[tokio::test]
    async fn test_send_message_to_closed_session_fails() {
        let directory = directory();

        let result = directory
            .send_message(
                SessionId::new(),
                "login",
                &ResponseEnvelope::empty(200, "OK"),
            )
            .await;

        assert!(matches!(
            result,
            Err(SessionDirectoryError::SessionClosed(_))
        ));
    }

    #[tokio::test]
    async fn test_send_message_goes_through_sink() {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let directory = LocalSessionDirectory::new(Arc::new(ChannelMessageSink::new(sender)));
        let session_id = SessionId::new();
        directory.open_session(session_id);

        directory
            .send_message(session_id, "logout", &ResponseEnvelope::empty(200, "Duplicated login"))
            .await
            .unwrap();

        let sent = receiver.recv().await.unwrap();
        assert_eq!(sent.session_id, session_id);
        assert_eq!(sent.message_type, "logout");
        assert_eq!(sent.envelope.error.message, "Duplicated login");
    }
}
