use std::path::PathBuf;

use clap::Parser;

use orin_agent::DEFAULT_MODEL;

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    match value.parse::<u64>() {
        Ok(0) => Err("value must be at least 1".to_string()),
        Ok(parsed) => Ok(parsed),
        Err(error) => Err(format!("not a whole number: {error}")),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "orin-server",
    about = "Orin chat web application with Google sign-in and file-aware replies",
    version
)]
/// Public struct `Cli` used across Orin components.
pub struct Cli {
    #[arg(
        long,
        env = "ORIN_BIND",
        default_value = "127.0.0.1:8080",
        help = "Socket address the chat server listens on"
    )]
    pub bind: String,

    #[arg(
        long = "state-dir",
        env = "ORIN_STATE_DIR",
        default_value = ".orin",
        help = "Directory holding the profile and transcript stores"
    )]
    pub state_dir: PathBuf,

    #[arg(
        long,
        env = "ORIN_MODEL",
        default_value = DEFAULT_MODEL,
        help = "Chat completion model requested from the OpenAI-compatible API"
    )]
    pub model: String,

    #[arg(
        long = "google-client-id",
        env = "GOOGLE_CLIENT_ID",
        help = "Google OAuth client id used for sign-in"
    )]
    pub google_client_id: String,

    #[arg(
        long = "google-client-secret",
        env = "GOOGLE_CLIENT_SECRET",
        help = "Google OAuth client secret used for sign-in"
    )]
    pub google_client_secret: String,

    #[arg(
        long = "redirect-uri",
        env = "ORIN_REDIRECT_URI",
        default_value = "http://127.0.0.1:8080/auth",
        help = "OAuth redirect URI registered with Google; must resolve to this server's /auth route"
    )]
    pub redirect_uri: String,

    #[arg(
        long = "session-secret",
        env = "ORIN_SESSION_SECRET",
        help = "Secret used to sign session cookies; rotating it signs everyone out"
    )]
    pub session_secret: String,

    #[arg(
        long = "session-ttl-seconds",
        env = "ORIN_SESSION_TTL_SECONDS",
        default_value_t = 1_209_600,
        value_parser = parse_positive_u64,
        help = "Session cookie lifetime in seconds"
    )]
    pub session_ttl_seconds: u64,
}
