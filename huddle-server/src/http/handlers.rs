use crate::registry::{RegistryError, SessionManager};
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use huddle_core::MemberId;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

pub async fn root() -> &'static str {
    "Welcome to the Huddle signaling api"
}

#[derive(Debug, Deserialize)]
pub struct CreateMeetingRequest {
    #[serde(default)]
    pub host: String,
}

#[derive(Debug, Serialize)]
pub struct MeetingCreated {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub endpoint: String,
}

pub async fn create_meeting(
    State(manager): State<SessionManager>,
    payload: Result<Json<CreateMeetingRequest>, JsonRejection>,
) -> Response {
    let host = payload
        .ok()
        .and_then(|Json(request)| MemberId::parse(request.host).ok());
    let Some(host) = host else {
        warn!("create-meeting without a host");
        return error_response(StatusCode::BAD_REQUEST, "Invalid request, host is required");
    };

    match manager.create(host) {
        Ok(id) => {
            info!("Meeting {} created", id);
            Json(MeetingCreated {
                kind: "MEETING_CREATED",
                endpoint: id.to_string(),
            })
            .into_response()
        }
        Err(RegistryError::SessionExists(id)) => {
            warn!("Generated session id {} collided", id);
            error_response(StatusCode::CONFLICT, "Session ID already exists")
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
