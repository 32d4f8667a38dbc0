//! HTTP surface for the Orin chat application.
//!
//! Serves the server-rendered chat page, the chat and upload form endpoints,
//! and the Google sign-in flow that gates all of them.

pub mod auth_runtime;
mod chat_page;
mod handlers;
pub mod oauth_client;
pub mod server_bootstrap;
pub mod types;

pub use oauth_client::GoogleOAuthConfig;
pub use server_bootstrap::run;
pub use types::{GatewayConfig, ServerState};
