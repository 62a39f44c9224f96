pub mod errors;
pub mod launch_service;
pub mod matchmaking_client;
pub mod platform_authenticator;
pub mod server_pool;
pub mod session_directory;
