use huddle_core::{MemberId, SessionId};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum CreateSessionError {
    #[error("create-meeting request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("registry rejected create-meeting ({status}): {message}")]
    Rejected { status: StatusCode, message: String },

    #[error("registry returned an unusable session id: {0:?}")]
    InvalidEndpoint(String),
}

#[derive(Serialize)]
struct CreateMeetingRequest<'a> {
    host: &'a str,
}

#[derive(Deserialize)]
struct CreateMeetingResponse {
    endpoint: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Asks the registry at `base_url` (e.g. `http://127.0.0.1:8000`) for a new
/// session hosted by `host`.
pub async fn create_session(
    base_url: &str,
    host: &MemberId,
) -> Result<SessionId, CreateSessionError> {
    let url = format!("{}/create-meeting", base_url.trim_end_matches('/'));
    let response = reqwest::Client::new()
        .post(&url)
        .json(&CreateMeetingRequest {
            host: host.as_str(),
        })
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.error)
            .unwrap_or(body);
        return Err(CreateSessionError::Rejected { status, message });
    }

    let created: CreateMeetingResponse = response.json().await?;
    let session = SessionId::parse(created.endpoint.clone())
        .map_err(|_| CreateSessionError::InvalidEndpoint(created.endpoint))?;
    info!("Created session {} hosted by {}", session, host);
    Ok(session)
}

/// WebSocket URL of a session's control channel. `ws_base` is the registry
/// root with a `ws://` or `wss://` scheme; `http(s)://` is converted.
pub fn session_endpoint(ws_base: &str, session: &SessionId) -> String {
    let base = ws_base.trim_end_matches('/');
    let base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        base.to_string()
    };
    format!("{}/session/{}", base, session)
}
