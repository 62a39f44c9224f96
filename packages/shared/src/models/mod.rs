pub mod auth;
pub mod match_type;
pub mod matchmaking;
pub mod response;
pub mod server;
pub mod session;
