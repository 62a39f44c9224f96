pub mod auth_service_errors;
pub mod dedicated_server_service_errors;
pub mod matchmaking_service_errors;
