//! Authentication operations.
//!
//! Every sign-in variant returns a fresh [`Client`] carrying the new
//! credential; the receiver is never mutated, so clients can be shared
//! freely across tasks while one of them re-authenticates.

use serde_json::json;
use taruvi_client::{Error, ErrorKind, Request, Result, TokenType};
use tracing::debug;

use crate::client::Client;
use crate::types::User;

const TOKEN_PATH: &str = "/api/cloud/auth/jwt/token/";
const TOKEN_REFRESH_PATH: &str = "/api/cloud/auth/jwt/token/refresh/";
const ME_PATH: &str = "/api/cloud/users/me/";

/// Auth facade; obtained from [`Client::auth`].
pub struct Auth<'a> {
    client: &'a Client,
}

impl<'a> Auth<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Sign in with a token obtained out of band.
    ///
    /// Replaces any prior credential wholesale; no network call is made,
    /// the token is validated by the server on first use. The returned
    /// client carries a fresh connection pool.
    pub fn sign_in_with_token(
        &self,
        token: impl Into<String>,
        token_type: TokenType,
    ) -> Result<Client> {
        self.client
            .with_credential(Some(token_type.credential(token.into())))
    }

    /// Exchange a username (or email) and password for a JWT client.
    pub async fn sign_in_with_password(
        &self,
        identifier: impl AsRef<str>,
        password: impl AsRef<str>,
    ) -> Result<Client> {
        let request = Request::post(TOKEN_PATH)
            .json_value(json!({
                "username": identifier.as_ref(),
                "password": password.as_ref(),
            }))
            .build();
        let response = self
            .client
            .transport()
            .send(&request)
            .await
            .map_err(sign_in_error)?;

        let access = extract_access_token(&response.json()?)?;
        debug!("password sign-in succeeded");
        self.sign_in_with_token(access, TokenType::Jwt)
    }

    /// Exchange a refresh token for a new JWT client.
    pub async fn refresh_token(&self, refresh: impl AsRef<str>) -> Result<Client> {
        let request = Request::post(TOKEN_REFRESH_PATH)
            .json_value(json!({"refresh": refresh.as_ref()}))
            .build();
        let response = self.client.transport().send(&request).await?;
        let access = extract_access_token(&response.json()?)?;
        self.sign_in_with_token(access, TokenType::Jwt)
    }

    /// A client with the credential cleared.
    pub fn sign_out(&self) -> Result<Client> {
        self.client.with_credential(None)
    }

    /// The account behind the current credential.
    pub async fn current_user(&self) -> Result<User> {
        let request = Request::get(ME_PATH).build();
        self.client.transport().send(&request).await?.json()
    }
}

/// The token endpoint rejects bad credentials with 400 or 401 depending on
/// the backend path, and on a not-yet-signed-in client a 401 surfaces as
/// `NotAuthenticated`. All of those mean the password was rejected, and any
/// other failure still leaves the caller unauthenticated, so every error
/// from the endpoint becomes an authentication error.
fn sign_in_error(error: Error) -> Error {
    match error.kind {
        ErrorKind::Validation(message) | ErrorKind::Authentication(message) => {
            Error::new(ErrorKind::Authentication(message))
        }
        ErrorKind::NotAuthenticated(_) => Error::new(ErrorKind::Authentication(
            "username or password was rejected".to_string(),
        )),
        _ => {
            let message = format!("sign-in failed: {error}");
            Error::with_source(ErrorKind::Authentication(message), error)
        }
    }
}

fn extract_access_token(body: &serde_json::Value) -> Result<String> {
    body.get("access")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| {
            Error::new(ErrorKind::Authentication(
                "token endpoint response did not contain an access token".to_string(),
            ))
        })
}
