pub mod platform_auth_errors;
pub mod server_pool_errors;
pub mod session_directory_errors;
