use serde_json::Value;
use std::fmt;

use crate::models::match_type::MatchType;
use crate::models::matchmaking::UserData;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestValidationError {
    MissingFields,
    InvalidArguments,
}

impl fmt::Display for RequestValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestValidationError::MissingFields => write!(f, "Missing required fields."),
            RequestValidationError::InvalidArguments => write!(f, "Invalid arguments."),
        }
    }
}

impl std::error::Error for RequestValidationError {}

/// Body of a `match` message. `user_data` is only checked to be an object
/// here; its required fields are read by [`MatchRequest::user_data`] once the
/// caller has confirmed the account belongs to the session.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRequest {
    pub account_id: String,
    pub match_type: MatchType,
    raw_user_data: Value,
}

impl MatchRequest {
    pub fn parse(body: &Value) -> Result<Self, RequestValidationError> {
        let account_id = body.get("account_id").and_then(Value::as_str);
        let match_type = body.get("match_type").and_then(Value::as_i64);
        let user_data = body.get("user_data").filter(|v| v.is_object());

        let (Some(account_id), Some(match_type), Some(user_data)) =
            (account_id, match_type, user_data)
        else {
            return Err(RequestValidationError::MissingFields);
        };

        let match_type = MatchType::try_from(match_type)
            .map_err(|_| RequestValidationError::InvalidArguments)?;

        Ok(MatchRequest {
            account_id: account_id.to_string(),
            match_type,
            raw_user_data: user_data.clone(),
        })
    }

    pub fn user_data(&self) -> Result<UserData, RequestValidationError> {
        let has_level = self.raw_user_data.get("level").is_some_and(Value::is_i64);
        let has_mmr = self
            .raw_user_data
            .get("mmr_score")
            .is_some_and(Value::is_i64);
        if !has_level || !has_mmr {
            return Err(RequestValidationError::MissingFields);
        }

        serde_json::from_value(self.raw_user_data.clone())
            .map_err(|_| RequestValidationError::MissingFields)
    }
}

/// Body of a `cancel_match` message.
#[derive(Debug, Clone, PartialEq)]
pub struct CancelMatchRequest {
    pub account_id: String,
    pub match_type: MatchType,
}

impl CancelMatchRequest {
    pub fn parse(body: &Value) -> Result<Self, RequestValidationError> {
        let account_id = body.get("account_id").and_then(Value::as_str);
        let match_type = body.get("match_type").and_then(Value::as_i64);

        let (Some(account_id), Some(match_type)) = (account_id, match_type) else {
            return Err(RequestValidationError::MissingFields);
        };

        let match_type = MatchType::try_from(match_type)
            .map_err(|_| RequestValidationError::InvalidArguments)?;

        Ok(CancelMatchRequest {
            account_id: account_id.to_string(),
            match_type,
        })
    }
}
