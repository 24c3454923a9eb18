use serde::{Deserialize, Serialize};

/// JWT claims carried by client credentials
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserClaims {
    pub sub: String, // User id
    pub exp: usize,  // Expiration timestamp (standard JWT claim)
    pub iat: usize,  // Issued at timestamp (standard JWT claim)
}

/// Verified user identity, inserted into request extensions by `jwt_auth`
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedUser(pub String);
