//! Login and logout: the only operations that create or destroy a session.

use serde::Deserialize;
use serde_json::{Value, json};

use crate::client::HttpClient;
use crate::error::{Error, Result};
use crate::session::Session;

/// Path of the login endpoint, relative to the gateway base URL.
pub const LOGIN_PATH: &str = "api/auth/login";

#[derive(Deserialize)]
struct LoginResponse {
    #[serde(alias = "accessToken")]
    token: Option<String>,
    #[serde(default)]
    user: Option<Value>,
}

/// Log in with `username` and `password` and make the result the current session.
///
/// The gateway answers with the token under `token` (or `accessToken`) and,
/// optionally, the user record under `user`.  A successful answer without a
/// token is a client error and leaves the session untouched.  Rejected
/// credentials (401/403) surface as an auth failure without redirecting to
/// login.
pub async fn login(client: &HttpClient, username: &str, password: &str) -> Result<Session> {
    let payload = client
        .post_credentials(
            LOGIN_PATH,
            json!({ "username": username, "password": password }),
        )
        .await?;
    let response = serde_json::from_value::<LoginResponse>(payload.clone()).ok();
    let Some(LoginResponse {
        token: Some(token),
        user,
    }) = response.filter(|r| r.token.as_deref().is_some_and(|t| !t.is_empty()))
    else {
        return Err(Error::client(
            "login response did not include a token",
            None,
            Some(payload),
        ));
    };
    let user = user.filter(|u| !u.is_null());
    client.session().set(token, user);
    Ok(client.session().get())
}

/// Drop the current session.
pub fn logout(client: &HttpClient) {
    client.session().clear();
}
