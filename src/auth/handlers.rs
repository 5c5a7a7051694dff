use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use time::Duration as TimeDuration;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AuthResponse, CreateStaffRequest, LoginRequest, MessageResponse, PublicUser,
            RegisterRequest, SessionInfo, SessionKeys,
        },
        repo::{Session, User},
        role::Role,
        services::{
            hash_password, not_found, storage_unavailable, validate_registration,
            validate_staff_registration, verify_password, AuthSession,
        },
    },
    state::AppState,
};

pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(session_probe).post(login))
        .route("/logout", get(logout))
}

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/register", get(register_probe).post(register))
        .route(
            "/create_staff_account",
            get(create_staff_probe).post(create_staff_account),
        )
}

/// The old login page doubled as the role dispatcher; its JSON shape reports
/// who is logged in and where that role belongs.
#[instrument(skip_all)]
pub async fn session_probe(session: Option<AuthSession>) -> Json<SessionInfo> {
    match session {
        Some(s) => Json(SessionInfo {
            landing: Some(s.role.landing()),
            user: Some(PublicUser {
                id: s.user_id,
                username: s.username,
                role: s.role,
            }),
        }),
        None => Json(SessionInfo {
            user: None,
            landing: None,
        }),
    }
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    let user = match User::find_by_username(&state.db, &payload.username).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!(username = %payload.username, "login unknown username");
            return Err((StatusCode::UNAUTHORIZED, "Invalid credentials".into()));
        }
        Err(e) => {
            error!(error = %e, "find_by_username failed");
            return Err(storage_unavailable());
        }
    };

    let ok = match verify_password(&payload.password, &user.password_hash) {
        Ok(v) => v,
        Err(e) => {
            error!(error = %e, "verify_password failed");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
        }
    };

    if !ok {
        warn!(username = %payload.username, user_id = %user.id, "login invalid password");
        return Err((StatusCode::UNAUTHORIZED, "Invalid credentials".into()));
    }

    let ttl = TimeDuration::minutes(state.config.session.ttl_minutes);
    let session = match Session::create(&state.db, user.id, ttl).await {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "create session failed");
            return Err(storage_unavailable());
        }
    };

    let keys = SessionKeys::from_ref(&state);
    let token = keys.sign_session(user.id, session.id).map_err(|e| {
        error!(error = %e, "session token sign failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    info!(user_id = %user.id, username = %user.username, "user logged in");
    Ok(Json(AuthResponse {
        token,
        user: PublicUser {
            id: user.id,
            username: user.username,
            role: user.role,
        },
    }))
}

#[instrument(skip_all)]
pub async fn register_probe(
    session: Option<AuthSession>,
) -> Result<&'static str, (StatusCode, String)> {
    // registration is for anonymous visitors only
    if session.is_some() {
        return Err(not_found());
    }
    Ok("ok")
}

#[instrument(skip(state, session, payload))]
pub async fn register(
    State(state): State<AppState>,
    session: Option<AuthSession>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<MessageResponse>, (StatusCode, String)> {
    if session.is_some() {
        return Err(not_found());
    }

    if let Err(msg) = validate_registration(&payload.username, &payload.password) {
        warn!(username = %payload.username, %msg, "registration rejected");
        return Err((StatusCode::BAD_REQUEST, msg.into()));
    }

    let taken = match User::username_taken(&state.db, &payload.username).await {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "username lookup failed");
            return Err(storage_unavailable());
        }
    };
    // Reserved namespaces get the same answer as a taken name so the staff
    // naming convention stays hidden.
    if taken || Role::resolve(&payload.username) != Role::Customer {
        warn!(username = %payload.username, "username rejected as taken");
        return Err((
            StatusCode::CONFLICT,
            "The username is already taken".into(),
        ));
    }

    let hash = hash_password(&payload.password).map_err(|e| {
        error!(error = %e, "hash_password failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    let user = match User::create(&state.db, &payload.username, &hash, Role::Customer).await {
        Ok(u) => u,
        Err(e) => {
            error!(error = %e, "create user failed");
            return Err(storage_unavailable());
        }
    };

    info!(user_id = %user.id, username = %user.username, "customer registered");
    Ok(Json(MessageResponse {
        message: "You were successfully registered and can login now",
    }))
}

#[instrument(skip_all)]
pub async fn create_staff_probe(
    session: AuthSession,
) -> Result<&'static str, (StatusCode, String)> {
    if session.role != Role::Owner {
        return Err(not_found());
    }
    Ok("ok")
}

#[instrument(skip(state, session, payload))]
pub async fn create_staff_account(
    State(state): State<AppState>,
    session: AuthSession,
    Json(payload): Json<CreateStaffRequest>,
) -> Result<Json<MessageResponse>, (StatusCode, String)> {
    if session.role != Role::Owner {
        return Err(not_found());
    }

    if let Err(msg) = validate_staff_registration(&payload.username, &payload.password) {
        warn!(username = %payload.username, %msg, "staff registration rejected");
        return Err((StatusCode::BAD_REQUEST, msg.into()));
    }

    let taken = match User::username_taken(&state.db, &payload.username).await {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "username lookup failed");
            return Err(storage_unavailable());
        }
    };
    if taken {
        warn!(username = %payload.username, "staff username already taken");
        return Err((
            StatusCode::CONFLICT,
            "The staff username is already taken".into(),
        ));
    }

    let hash = hash_password(&payload.password).map_err(|e| {
        error!(error = %e, "hash_password failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    let user = match User::create(&state.db, &payload.username, &hash, Role::Staff).await {
        Ok(u) => u,
        Err(e) => {
            error!(error = %e, "create staff user failed");
            return Err(storage_unavailable());
        }
    };

    info!(user_id = %user.id, username = %user.username, "staff account created");
    Ok(Json(MessageResponse {
        message: "The staff member was successfully registered",
    }))
}

#[instrument(skip(state, session))]
pub async fn logout(
    State(state): State<AppState>,
    session: AuthSession,
) -> Result<Json<MessageResponse>, (StatusCode, String)> {
    Session::delete(&state.db, session.session_id)
        .await
        .map_err(|e| {
            error!(error = %e, "session delete failed");
            storage_unavailable()
        })?;

    info!(user_id = %session.user_id, "user logged out");
    Ok(Json(MessageResponse {
        message: "You were logged out",
    }))
}

#[cfg(test)]
mod dto_tests {
    use super::*;

    #[test]
    fn public_user_serializes_role_lowercase() {
        let user = PublicUser {
            id: uuid::Uuid::new_v4(),
            username: "staff_jane".to_string(),
            role: Role::Staff,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains("staff_jane"));
        assert!(json.contains("\"role\":\"staff\""));
    }

    #[test]
    fn anonymous_session_probe_is_all_null() {
        let info = SessionInfo {
            user: None,
            landing: None,
        };
        let json = serde_json::to_string(&info).unwrap();
        assert_eq!(json, r#"{"user":null,"landing":null}"#);
    }
}
