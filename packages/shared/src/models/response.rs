use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const LOGIN_MESSAGE: &str = "login";
pub const LOGOUT_MESSAGE: &str = "logout";
pub const MATCH_MESSAGE: &str = "match";
pub const CANCEL_MATCH_MESSAGE: &str = "cancel_match";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: u16,
    pub message: String,
}

/// Envelope for every message sent back to a client. `data` is always a
/// JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub error: ErrorBody,
    pub data: Map<String, Value>,
}

impl ResponseEnvelope {
    pub fn new(code: u16, message: &str, data: Value) -> Self {
        let data = match data {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        ResponseEnvelope {
            error: ErrorBody {
                code,
                message: message.to_string(),
            },
            data,
        }
    }

    pub fn empty(code: u16, message: &str) -> Self {
        Self::new(code, message, Value::Object(Map::new()))
    }
}
