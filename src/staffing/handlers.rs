use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::MessageResponse,
        role::Role,
        services::{not_found, storage_unavailable, AuthSession},
    },
    events::dto::EventSummary,
    staffing::{
        dto::StaffBoard,
        repo::{self, SignUpError, SignUpOutcome},
    },
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/staff", get(staff_board))
        .route("/sign_up_event/:date", get(sign_up_event))
}

#[instrument(skip(state, session))]
pub async fn staff_board(
    State(state): State<AppState>,
    session: AuthSession,
) -> Result<Json<StaffBoard>, (StatusCode, String)> {
    if session.role != Role::Staff {
        return Err(not_found());
    }

    let worked = repo::list_worked(&state.db, session.user_id)
        .await
        .map_err(|e| {
            error!(error = %e, "list worked events failed");
            storage_unavailable()
        })?;
    let available = repo::list_available(&state.db, session.user_id)
        .await
        .map_err(|e| {
            error!(error = %e, "list available events failed");
            storage_unavailable()
        })?;

    Ok(Json(StaffBoard {
        worked_events: worked.into_iter().map(EventSummary::from).collect(),
        available_events: available.into_iter().map(EventSummary::from).collect(),
    }))
}

#[instrument(skip(state, session))]
pub async fn sign_up_event(
    State(state): State<AppState>,
    session: AuthSession,
    Path(date): Path<String>,
) -> Result<Json<MessageResponse>, (StatusCode, String)> {
    if session.role != Role::Staff {
        return Err(not_found());
    }

    match repo::sign_up(&state.db, session.user_id, &date).await {
        Ok(SignUpOutcome::SignedUp) => {
            info!(username = %session.username, date = %date, "staff signed up for event");
            Ok(Json(MessageResponse {
                message: "You successfully signed up to work the event",
            }))
        }
        Ok(SignUpOutcome::AlreadySignedUp) => Ok(Json(MessageResponse {
            message: "You already signed up for that event",
        })),
        Err(SignUpError::EventNotFound) => Err(not_found()),
        Err(e @ (SignUpError::FullyStaffed | SignUpError::Conflict)) => {
            warn!(date = %date, %e, "sign-up rejected");
            Err((StatusCode::CONFLICT, e.to_string()))
        }
        Err(SignUpError::Storage(e)) => {
            error!(error = %e, "sign-up failed");
            Err(storage_unavailable())
        }
    }
}
