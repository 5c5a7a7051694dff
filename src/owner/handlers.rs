use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use tracing::{error, instrument};

use crate::{
    auth::{
        role::Role,
        services::{not_found, storage_unavailable, AuthSession},
    },
    owner::{
        dto::{OwnerSchedule, ScheduledEvent},
        repo,
    },
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new().route("/owner", get(schedule))
}

#[instrument(skip(state, session))]
pub async fn schedule(
    State(state): State<AppState>,
    session: AuthSession,
) -> Result<Json<OwnerSchedule>, (StatusCode, String)> {
    if session.role != Role::Owner {
        return Err(not_found());
    }

    let events = repo::list_scheduled_with_staff(&state.db)
        .await
        .map_err(|e| {
            error!(error = %e, "owner schedule query failed");
            storage_unavailable()
        })?;

    Ok(Json(OwnerSchedule {
        scheduled_events: events.into_iter().map(ScheduledEvent::from).collect(),
    }))
}

#[cfg(test)]
mod dto_tests {
    use super::*;
    use crate::events::repo::Event;
    use crate::owner::repo::StaffedEvent;
    use time::OffsetDateTime;
    use uuid::Uuid;

    #[test]
    fn unstaffed_event_serializes_an_empty_list() {
        let staffed = StaffedEvent {
            event: Event {
                id: Uuid::new_v4(),
                name: "Birthday".into(),
                event_date: "2024-06-01".into(),
                number_of_staff: 0,
                customer_id: Uuid::new_v4(),
                created_at: OffsetDateTime::now_utc(),
            },
            staff: Vec::new(),
        };
        let json = serde_json::to_string(&ScheduledEvent::from(staffed)).unwrap();
        assert!(json.contains(r#""staff":[]"#));
        assert!(json.contains(r#""date":"2024-06-01""#));
    }
}
