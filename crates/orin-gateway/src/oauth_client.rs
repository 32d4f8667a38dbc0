//! Google OAuth authorization-code flow used to sign users in.

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

const GOOGLE_AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/auth";
const GOOGLE_TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_ENDPOINT: &str = "https://www.googleapis.com/oauth2/v1/userinfo";
const OAUTH_SCOPES: &str = "openid email profile";

#[derive(Debug, Clone)]
/// Public struct `GoogleOAuthConfig` used across Orin components.
pub struct GoogleOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

#[derive(Debug, Error)]
/// Enumerates failures while talking to the identity provider.
pub enum AuthError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("identity provider returned non-success status {status}: {body}")]
    HttpStatus { status: u16, body: String },
    #[error("identity provider response is missing field `{0}`")]
    MissingField(&'static str),
}

#[derive(Debug, Deserialize)]
struct GoogleTokenResponse {
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleUserinfo {
    email: Option<String>,
}

fn url_encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Builds the consent-screen URL the browser is redirected to on login.
pub fn authorize_url(config: &GoogleOAuthConfig) -> String {
    format!(
        "{GOOGLE_AUTH_ENDPOINT}?client_id={}&redirect_uri={}&response_type=code&scope={}",
        url_encode(&config.client_id),
        url_encode(&config.redirect_uri),
        url_encode(OAUTH_SCOPES),
    )
}

/// Redeems an authorization code for an access token.
pub async fn exchange_code(
    http: &Client,
    config: &GoogleOAuthConfig,
    code: &str,
) -> Result<String, AuthError> {
    exchange_code_at(http, GOOGLE_TOKEN_ENDPOINT, config, code).await
}

async fn exchange_code_at(
    http: &Client,
    token_endpoint: &str,
    config: &GoogleOAuthConfig,
    code: &str,
) -> Result<String, AuthError> {
    let response = http
        .post(token_endpoint)
        .form(&[
            ("code", code),
            ("client_id", config.client_id.as_str()),
            ("client_secret", config.client_secret.as_str()),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ])
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AuthError::HttpStatus {
            status: status.as_u16(),
            body,
        });
    }

    let token: GoogleTokenResponse = response.json().await?;
    token
        .access_token
        .filter(|value| !value.is_empty())
        .ok_or(AuthError::MissingField("access_token"))
}

/// Looks up the signed-in user's email address with a fresh access token.
pub async fn fetch_user_email(http: &Client, access_token: &str) -> Result<String, AuthError> {
    fetch_user_email_at(http, GOOGLE_USERINFO_ENDPOINT, access_token).await
}

async fn fetch_user_email_at(
    http: &Client,
    userinfo_endpoint: &str,
    access_token: &str,
) -> Result<String, AuthError> {
    let response = http
        .get(userinfo_endpoint)
        .header("Authorization", format!("Bearer {access_token}"))
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AuthError::HttpStatus {
            status: status.as_u16(),
            body,
        });
    }

    let userinfo: GoogleUserinfo = response.json().await?;
    userinfo
        .email
        .filter(|value| !value.is_empty())
        .ok_or(AuthError::MissingField("email"))
}
