pub mod auth_service;
pub mod dedicated_server_service;
pub mod errors;
pub mod match_policy;
pub mod matchmaking_service;
pub mod message_service;
pub mod response_service;
pub mod session_executor;
