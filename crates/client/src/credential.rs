//! Credential model.
//!
//! A configuration holds at most one credential; the enum makes the
//! "two auth headers at once" state unrepresentable.

use std::str::FromStr;

use crate::error::{Error, ErrorKind};

/// A single authentication credential.
///
/// The token value is redacted in Debug output to prevent accidental
/// exposure in logs.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Knox-style API key, sent as `Authorization: Api-Key <token>`.
    ApiKey(String),
    /// JWT bearer token, sent as `Authorization: Bearer <token>`.
    Jwt(String),
    /// Session token, sent as `X-Session-Token: <token>`.
    SessionToken(String),
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            Credential::ApiKey(_) => "ApiKey",
            Credential::Jwt(_) => "Jwt",
            Credential::SessionToken(_) => "SessionToken",
        };
        write!(f, "Credential::{}([REDACTED])", kind)
    }
}

impl Credential {
    /// The token type of this credential.
    pub fn token_type(&self) -> TokenType {
        match self {
            Credential::ApiKey(_) => TokenType::ApiKey,
            Credential::Jwt(_) => TokenType::Jwt,
            Credential::SessionToken(_) => TokenType::SessionToken,
        }
    }

    /// The HTTP header this credential is carried in.
    pub fn header(&self) -> (&'static str, String) {
        match self {
            Credential::ApiKey(token) => ("Authorization", format!("Api-Key {}", token)),
            Credential::Jwt(token) => ("Authorization", format!("Bearer {}", token)),
            Credential::SessionToken(token) => ("X-Session-Token", token.clone()),
        }
    }
}

/// Kind of authentication token accepted by sign-in operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    Jwt,
    ApiKey,
    SessionToken,
}

impl TokenType {
    /// Wrap a raw token value into a [`Credential`] of this type.
    pub fn credential(self, token: impl Into<String>) -> Credential {
        match self {
            TokenType::Jwt => Credential::Jwt(token.into()),
            TokenType::ApiKey => Credential::ApiKey(token.into()),
            TokenType::SessionToken => Credential::SessionToken(token.into()),
        }
    }

    /// Wire name of this token type.
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Jwt => "jwt",
            TokenType::ApiKey => "api_key",
            TokenType::SessionToken => "session_token",
        }
    }
}

impl FromStr for TokenType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "jwt" => Ok(TokenType::Jwt),
            "api_key" => Ok(TokenType::ApiKey),
            "session_token" => Ok(TokenType::SessionToken),
            other => Err(Error::new(ErrorKind::InvalidInput(format!(
                "invalid token_type '{}'. Must be one of: jwt, api_key, session_token",
                other
            )))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_derivation() {
        let (name, value) = Credential::ApiKey("knox_abc".into()).header();
        assert_eq!(name, "Authorization");
        assert_eq!(value, "Api-Key knox_abc");

        let (name, value) = Credential::Jwt("eyJ".into()).header();
        assert_eq!(name, "Authorization");
        assert_eq!(value, "Bearer eyJ");

        let (name, value) = Credential::SessionToken("sess_1".into()).header();
        assert_eq!(name, "X-Session-Token");
        assert_eq!(value, "sess_1");
    }

    #[test]
    fn test_token_type_parsing() {
        assert_eq!("jwt".parse::<TokenType>().unwrap(), TokenType::Jwt);
        assert_eq!("api_key".parse::<TokenType>().unwrap(), TokenType::ApiKey);
        assert_eq!(
            "session_token".parse::<TokenType>().unwrap(),
            TokenType::SessionToken
        );

        let err = "oauth".parse::<TokenType>().unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidInput(_)));
    }

    #[test]
    fn test_debug_redacts_token() {
        let debug = format!("{:?}", Credential::Jwt("super-secret".into()));
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_round_trip_through_token_type() {
        let cred = TokenType::SessionToken.credential("t");
        assert_eq!(cred.token_type(), TokenType::SessionToken);
        assert_eq!(cred, Credential::SessionToken("t".into()));
    }
}
