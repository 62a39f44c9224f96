use serde_json::Value;

use crate::models::matchmaking::requests::RequestValidationError;

pub const FACEBOOK_PLATFORM: &str = "facebook";

/// Body of a `login` message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRequest {
    pub account_id: String,
    pub platform: String,
    pub access_token: Option<String>,
}

impl LoginRequest {
    pub fn parse(body: &Value) -> Result<Self, RequestValidationError> {
        let account_id = body.get("account_id").and_then(Value::as_str);
        let platform = body.get("platform").and_then(Value::as_str);

        let (Some(account_id), Some(platform)) = (account_id, platform) else {
            return Err(RequestValidationError::MissingFields);
        };

        let access_token = body
            .get("access_token")
            .and_then(Value::as_str)
            .map(str::to_string);

        if platform == FACEBOOK_PLATFORM && access_token.is_none() {
            return Err(RequestValidationError::MissingFields);
        }

        Ok(LoginRequest {
            account_id: account_id.to_string(),
            platform: platform.to_string(),
            access_token,
        })
    }

    pub fn requires_platform_auth(&self) -> bool {
        self.platform == FACEBOOK_PLATFORM
    }
}
