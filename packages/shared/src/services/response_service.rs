use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::models::response::ResponseEnvelope;
use crate::models::session::SessionRef;
use crate::repositories::session_directory::SessionDirectory;

pub const OK: &str = "OK";
pub const OK_DOT: &str = "OK.";
pub const INTERNAL_SERVER_ERROR: &str = "Internal server error.";

/// Delivers response envelopes to clients. Messages for sessions that are
/// gone are dropped.
#[derive(Clone)]
pub struct ResponseService {
    sessions: Arc<dyn SessionDirectory + Send + Sync>,
}

impl ResponseService {
    pub fn new(sessions: Arc<dyn SessionDirectory + Send + Sync>) -> Self {
        ResponseService { sessions }
    }

    /// Returns whether the message was handed to the session gateway.
    pub async fn dispatch(
        &self,
        target: SessionRef,
        message_type: &str,
        code: u16,
        message: &str,
        data: Value,
    ) -> bool {
        let session_id = match &target {
            SessionRef::Session(session_id) => {
                Some(*session_id).filter(|id| self.sessions.is_open(*id))
            }
            SessionRef::Account(account_id) => self.sessions.find_session(account_id),
        };

        let Some(session_id) = session_id else {
            debug!(
                "Dropping message for missing session: {}, message_type={}, code={}",
                target, message_type, code
            );
            return false;
        };

        let envelope = ResponseEnvelope::new(code, message, data);
        match self
            .sessions
            .send_message(session_id, message_type, &envelope)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    "Failed to send message: session_id={}, message_type={}, error={}",
                    session_id, message_type, e
                );
                false
            }
        }
    }

    pub async fn dispatch_empty(
        &self,
        target: SessionRef,
        message_type: &str,
        code: u16,
        message: &str,
    ) -> bool {
        self.dispatch(target, message_type, code, message, Value::Object(Default::default()))
            .await
    }
}
