//! OpenAPI description of the service, served at `/swagger/doc.json`.

use axum::Json;
use schedule_engine::{
    Meeting, MeetingId, Participant, Period, Presence, RecurrenceDef, User, UserId,
};
use utoipa::{OpenApi, ToSchema};

use crate::handlers;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Schedule API",
        description = "Users, recurring meetings, presence responses and free-time search"
    ),
    paths(
        handlers::health_check,
        handlers::get_user,
        handlers::create_user,
        handlers::get_meeting,
        handlers::create_meeting,
        handlers::put_response,
        handlers::get_user_meetings,
        handlers::find_free_time,
    ),
    components(schemas(
        User,
        UserId,
        Meeting,
        MeetingId,
        Participant,
        RecurrenceDef,
        Period,
        Presence,
        handlers::Created,
        NewUserForm,
        NewMeetingForm,
        PresenceForm,
    )),
    tags(
        (name = "users", description = "User registry"),
        (name = "meetings", description = "Meetings, presence responses and calendar queries"),
        (name = "service", description = "Service status"),
    )
)]
pub struct ApiDoc;

// Form bodies are parsed by `params::Args`; these types only describe them.

/// Body of `POST /user`.
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct NewUserForm {
    /// User name
    #[schema(example = "John Doe")]
    name: String,
}

/// Body of `POST /meeting`.
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct NewMeetingForm {
    /// Organizer id
    creator_id: u32,
    /// Member ids separated with commas; the field may repeat
    #[schema(example = "1,2,3")]
    member_ids: String,
    /// First occurrence start, RFC 3339
    #[schema(example = "2022-11-20T08:00:00Z")]
    start_at: String,
    /// Occurrence length such as `1h2m3s`; any unit may be omitted
    #[schema(example = "1h30m")]
    duration: String,
    /// Repeat period, `Once` when omitted
    period: Option<Period>,
}

/// Body of `PUT /response`.
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct PresenceForm {
    user_id: u32,
    meeting_id: u32,
    presence: Presence,
}

/// `GET /swagger/doc.json`
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_endpoint() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
        assert_eq!(doc["info"]["title"], "Schedule API");
        assert_eq!(doc["info"]["version"], env!("CARGO_PKG_VERSION"));
        let paths = doc["paths"].as_object().unwrap();
        for path in [
            "/health",
            "/user",
            "/meeting",
            "/response",
            "/user_meetings",
            "/find_free_time",
        ] {
            assert!(paths.contains_key(path), "{path} is not documented");
        }
        assert!(doc["paths"]["/user"]["get"].is_object());
        assert!(doc["paths"]["/user"]["post"].is_object());
        assert!(doc["paths"]["/response"]["put"].is_object());
    }

    #[test]
    fn document_carries_wire_schemas() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
        let schemas = &doc["components"]["schemas"];
        assert!(schemas["User"]["properties"]["Name"].is_object());
        assert!(schemas["Participant"]["properties"]["Status"].is_object());
        assert_eq!(schemas["Created"]["properties"]["Id"]["type"], "integer");
        assert_eq!(schemas["Period"]["enum"][1], "EveryDay");
    }
}
