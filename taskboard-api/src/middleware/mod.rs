/// Middleware modules for the API server
///
/// - `auth`: Bearer token validation
/// - `security`: Security response headers

pub mod auth;
pub mod security;
