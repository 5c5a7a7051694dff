use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::MessageResponse,
        role::Role,
        services::{not_found, storage_unavailable, AuthSession},
    },
    events::{
        dto::{CreateEventRequest, CustomerEvents, EventSummary},
        repo::{CreateEventError, Event},
    },
    state::AppState,
};

const MAX_EVENT_NAME_LEN: usize = 100;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/customer", get(list_own_events).post(create_event))
        .route("/cancel_event/:date", get(cancel_event))
}

/// The date doubles as the event key, so its shape is pinned here rather
/// than left to whatever the client's date picker produces.
fn is_valid_date(date: &str) -> bool {
    lazy_static! {
        static ref DATE_RE: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap();
    }
    DATE_RE.is_match(date)
}

fn validate_new_event(name: &str, date: &str) -> Result<(), &'static str> {
    if name.is_empty() {
        Err("You have to enter an event name")
    } else if date.is_empty() {
        Err("You have to enter an event date")
    } else if name.chars().count() > MAX_EVENT_NAME_LEN {
        Err("The event name is too long. It can only be up to 100 characters in length.")
    } else if !is_valid_date(date) {
        Err("The event date must be a date in the form YYYY-MM-DD")
    } else {
        Ok(())
    }
}

#[instrument(skip(state, session))]
pub async fn list_own_events(
    State(state): State<AppState>,
    session: AuthSession,
) -> Result<Json<CustomerEvents>, (StatusCode, String)> {
    if session.role != Role::Customer {
        return Err(not_found());
    }

    let events = Event::list_by_customer(&state.db, session.user_id)
        .await
        .map_err(|e| {
            error!(error = %e, "list customer events failed");
            storage_unavailable()
        })?;

    Ok(Json(CustomerEvents {
        events: events.into_iter().map(EventSummary::from).collect(),
    }))
}

#[instrument(skip(state, session, payload))]
pub async fn create_event(
    State(state): State<AppState>,
    session: AuthSession,
    Json(payload): Json<CreateEventRequest>,
) -> Result<Json<MessageResponse>, (StatusCode, String)> {
    if session.role != Role::Customer {
        return Err(not_found());
    }

    if let Err(msg) = validate_new_event(&payload.name, &payload.date) {
        warn!(%msg, "event request rejected");
        return Err((StatusCode::BAD_REQUEST, msg.into()));
    }

    match Event::create(&state.db, &payload.name, &payload.date, session.user_id).await {
        Ok(event) => {
            info!(
                event_id = %event.id,
                date = %event.event_date,
                customer_id = %session.user_id,
                "event requested"
            );
            Ok(Json(MessageResponse {
                message: "You successfully requested an event",
            }))
        }
        Err(e @ CreateEventError::DateBooked) => {
            warn!(date = %payload.date, "date already booked");
            Err((StatusCode::CONFLICT, e.to_string()))
        }
        Err(CreateEventError::Storage(e)) => {
            error!(error = %e, "create event failed");
            Err(storage_unavailable())
        }
    }
}

#[instrument(skip(state, session))]
pub async fn cancel_event(
    State(state): State<AppState>,
    session: AuthSession,
    Path(date): Path<String>,
) -> Result<Json<MessageResponse>, (StatusCode, String)> {
    if session.role != Role::Customer {
        return Err(not_found());
    }

    let deleted = Event::delete_owned(&state.db, &date, session.user_id)
        .await
        .map_err(|e| {
            error!(error = %e, "cancel event failed");
            storage_unavailable()
        })?;

    if !deleted {
        return Err(not_found());
    }

    info!(date = %date, customer_id = %session.user_id, "event cancelled");
    Ok(Json(MessageResponse {
        message: "You successfully cancelled the event",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_shape_is_checked() {
        assert!(is_valid_date("2024-06-01"));
        assert!(!is_valid_date("2024-6-1"));
        assert!(!is_valid_date("06/01/2024"));
        assert!(!is_valid_date("next friday"));
    }

    #[test]
    fn event_validation_order_matches_the_form() {
        assert_eq!(
            validate_new_event("", ""),
            Err("You have to enter an event name")
        );
        assert_eq!(
            validate_new_event("Birthday", ""),
            Err("You have to enter an event date")
        );
        let long = "x".repeat(MAX_EVENT_NAME_LEN + 1);
        assert_eq!(
            validate_new_event(&long, "2024-06-01"),
            Err("The event name is too long. It can only be up to 100 characters in length.")
        );
        assert_eq!(validate_new_event("Birthday", "2024-06-01"), Ok(()));
    }
}
