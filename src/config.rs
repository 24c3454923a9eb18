use std::str::FromStr;
use strum_macros::{AsRefStr, Display, EnumString};
use tracing::warn;

/// How credentials presented by clients are verified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AuthMode {
    /// HS256 JWT, user id taken from `sub`
    Jwt,
    /// The credential is the user id
    Trusted,
}

/// Server configuration read from the environment
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub auth_mode: AuthMode,
    pub cors_origin: String,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup, unset or unparsable values fall back to defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let auth_mode = match lookup("AUTH_MODE") {
            Some(raw) => AuthMode::from_str(&raw).unwrap_or_else(|e: strum::ParseError| {
                warn!(auth_mode = %raw, error = %e, "Unknown AUTH_MODE, using jwt");
                AuthMode::Jwt
            }),
            None => AuthMode::Jwt,
        };

        Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3001".to_string()),
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            jwt_secret: lookup("JWT_SECRET")
                .unwrap_or_else(|| "your-secret-key-change-in-production".to_string()),
            auth_mode,
            cors_origin: lookup("CORS_ORIGIN").unwrap_or_else(|| "*".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let c = config(&[]);
        assert_eq!(c.bind_addr, "0.0.0.0:3001");
        assert_eq!(c.database_url, None);
        assert_eq!(c.jwt_secret, "your-secret-key-change-in-production");
        assert_eq!(c.auth_mode, AuthMode::Jwt);
        assert_eq!(c.cors_origin, "*");
    }

    #[test]
    fn test_overrides() {
        let c = config(&[
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("DATABASE_URL", "postgres://localhost/tasks"),
            ("CORS_ORIGIN", "http://localhost:3000"),
        ]);
        assert_eq!(c.bind_addr, "127.0.0.1:9000");
        assert_eq!(c.database_url.as_deref(), Some("postgres://localhost/tasks"));
        assert_eq!(c.cors_origin, "http://localhost:3000");
    }

    #[rstest]
    #[case("jwt", AuthMode::Jwt)]
    #[case("trusted", AuthMode::Trusted)]
    #[case("TRUSTED", AuthMode::Trusted)]
    #[case("oauth", AuthMode::Jwt)]
    #[case("", AuthMode::Jwt)]
    fn test_auth_mode(#[case] raw: &str, #[case] expected: AuthMode) {
        assert_eq!(config(&[("AUTH_MODE", raw)]).auth_mode, expected);
    }

    #[test]
    fn test_empty_database_url_means_in_memory() {
        assert_eq!(config(&[("DATABASE_URL", "")]).database_url, None);
    }
}
