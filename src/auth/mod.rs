// Authentication collaborator: credential -> user id

// Public API - what other modules can use
pub use authenticator::{Authenticator, JwtAuthenticator, TrustedAuthenticator};
pub use middleware::jwt_auth;
pub use token::TokenConfig;
pub use types::{AuthenticatedUser, UserClaims};

// Internal modules
mod authenticator;
mod middleware;
mod token;
mod types;
