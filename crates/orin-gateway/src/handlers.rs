//! Request handlers for the chat routes.

use std::sync::Arc;

use axum::extract::{Multipart, Query, State};
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;

use orin_agent::RespondError;
use orin_extract::UploadedDocument;

use crate::auth_runtime::{
    clear_session_cookie, identity_from_headers, session_cookie, session_cookie_payload,
};
use crate::chat_page::{render_chat_page, render_error_page, UPSTREAM_NOTICE};
use crate::oauth_client::{authorize_url, exchange_code, fetch_user_email, AuthError};
use crate::types::ServerState;

pub const ROUTE_ROOT: &str = "/";
pub const ROUTE_CHAT: &str = "/chat";
pub const ROUTE_UPLOAD: &str = "/upload";
pub const ROUTE_LOGIN: &str = "/login";
pub const ROUTE_AUTH_CALLBACK: &str = "/auth";
pub const ROUTE_LOGOUT: &str = "/logout";

#[derive(Debug, Deserialize)]
pub struct RootQuery {
    pub notice: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatForm {
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AuthCallbackQuery {
    pub code: Option<String>,
    pub error: Option<String>,
}

fn login_redirect() -> Response {
    Redirect::to(ROUTE_LOGIN).into_response()
}

fn internal_error_page(message: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html(render_error_page(message)),
    )
        .into_response()
}

fn bad_request_page(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Html(render_error_page(message))).into_response()
}

fn respond_failure_response(error: &RespondError) -> Response {
    match error {
        RespondError::Upstream(error) => {
            tracing::warn!(error = %error, "chat completion failed; transcript not updated");
            Redirect::to(&format!("{ROUTE_ROOT}?notice={UPSTREAM_NOTICE}")).into_response()
        }
        RespondError::Storage(error) => {
            tracing::error!(error = %error, "conversation state is unavailable");
            internal_error_page("Your conversation state could not be read or written.")
        }
    }
}

pub async fn handle_root(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<RootQuery>,
    headers: HeaderMap,
) -> Response {
    let Some(identity) = identity_from_headers(&headers, &state.session_secret) else {
        return login_redirect();
    };

    let transcript = match state.responder.transcript(&identity) {
        Ok(transcript) => transcript,
        Err(error) => {
            tracing::error!(error = %error, "failed to load transcript");
            return internal_error_page("Your conversation history could not be loaded.");
        }
    };

    let pending_upload = match state.pending_uploads.lock() {
        Ok(pending) => pending.get(&identity).map(|upload| upload.file_name.clone()),
        Err(_) => return internal_error_page("Server state is unavailable."),
    };

    Html(render_chat_page(
        &identity,
        &transcript,
        pending_upload.as_deref(),
        query.notice.as_deref(),
    ))
    .into_response()
}

pub async fn handle_chat(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    Form(form): Form<ChatForm>,
) -> Response {
    let Some(identity) = identity_from_headers(&headers, &state.session_secret) else {
        return login_redirect();
    };

    let message = form.message.unwrap_or_default();
    let upload = match state.pending_uploads.lock() {
        Ok(mut pending) => pending.remove(&identity),
        Err(_) => return internal_error_page("Server state is unavailable."),
    };

    match state
        .responder
        .respond(&identity, &message, upload.as_ref())
        .await
    {
        Ok(_) => Redirect::to(ROUTE_ROOT).into_response(),
        Err(error) => respond_failure_response(&error),
    }
}

pub async fn handle_upload(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    let Some(identity) = identity_from_headers(&headers, &state.session_secret) else {
        return login_redirect();
    };

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(error) => {
                tracing::warn!(error = %error, "rejected malformed upload body");
                return bad_request_page("The upload could not be read.");
            }
        };

        if field.name() != Some("file") {
            continue;
        }
        let Some(file_name) = field
            .file_name()
            .map(str::to_string)
            .filter(|name| !name.is_empty())
        else {
            continue;
        };

        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(error) => {
                tracing::warn!(error = %error, file_name = %file_name, "upload body ended early");
                return bad_request_page("The upload could not be read.");
            }
        };

        match state.pending_uploads.lock() {
            Ok(mut pending) => {
                pending.insert(
                    identity.clone(),
                    UploadedDocument::new(file_name, bytes.to_vec()),
                );
            }
            Err(_) => return internal_error_page("Server state is unavailable."),
        }
    }

    Redirect::to(ROUTE_ROOT).into_response()
}

pub async fn handle_login(State(state): State<Arc<ServerState>>) -> Response {
    Redirect::to(&authorize_url(&state.oauth)).into_response()
}

async fn authenticate_code(state: &ServerState, code: &str) -> Result<String, AuthError> {
    let access_token = exchange_code(&state.http, &state.oauth, code).await?;
    fetch_user_email(&state.http, &access_token).await
}

pub async fn handle_auth_callback(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<AuthCallbackQuery>,
) -> Response {
    if let Some(error) = query.error.filter(|value| !value.is_empty()) {
        tracing::warn!(error = %error, "identity provider reported a sign-in error");
        return login_redirect();
    }
    let Some(code) = query.code.filter(|value| !value.is_empty()) else {
        return login_redirect();
    };

    let email = match authenticate_code(&state, &code).await {
        Ok(email) => email,
        Err(error) => {
            tracing::warn!(error = %error, "sign-in could not be completed");
            return login_redirect();
        }
    };

    let expires_unix = orin_core::current_unix_timestamp() + state.session_ttl_seconds;
    let Some(payload) = session_cookie_payload(&state.session_secret, &email, expires_unix) else {
        return internal_error_page("A session could not be created.");
    };

    let cookie = session_cookie(&payload, state.session_ttl_seconds);
    let Ok(cookie_value) = HeaderValue::from_str(&cookie) else {
        return internal_error_page("A session could not be created.");
    };

    let mut response = Redirect::to(ROUTE_ROOT).into_response();
    response.headers_mut().append(SET_COOKIE, cookie_value);
    response
}

pub async fn handle_logout() -> Response {
    let mut response = login_redirect();
    if let Ok(cookie_value) = HeaderValue::from_str(&clear_session_cookie()) {
        response.headers_mut().append(SET_COOKIE, cookie_value);
    }
    response
}
