pub(crate) use crate::auth::dto::{Claims, SessionKeys};
use crate::auth::repo::User;
use crate::auth::role::Role;
use crate::config::SessionConfig;
use crate::state::AppState;
use argon2::{password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::rngs::OsRng;
use std::time::Duration;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Usernames and passwords share the same length ceiling.
pub(crate) const MAX_CREDENTIAL_LEN: usize = 24;

/// Role checks, missing sessions and missing entities all surface the same
/// way, so a probing client cannot tell a forbidden route from an absent one.
pub(crate) fn not_found() -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, "not found".into())
}

/// Store-layer failures collapse to one opaque class, never echoing detail.
pub(crate) fn storage_unavailable() -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, "storage unavailable".into())
}

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Emptiness and length checks for self-service registration. The reserved
/// namespaces ("owner", anything containing "staff") are handled by the
/// caller so they come back as the generic taken-conflict.
pub(crate) fn validate_registration(username: &str, password: &str) -> Result<(), &'static str> {
    if username.is_empty() {
        Err("You have to enter a username")
    } else if password.is_empty() {
        Err("You have to enter a password")
    } else if username.chars().count() > MAX_CREDENTIAL_LEN {
        Err("The username is too long. It can only be up to 24 characters in length.")
    } else if password.chars().count() > MAX_CREDENTIAL_LEN {
        Err("The password is too long. It can only be up to 24 characters in length.")
    } else {
        Ok(())
    }
}

/// Same shape checks for owner-provisioned staff accounts, which must sit in
/// the staff namespace.
pub(crate) fn validate_staff_registration(
    username: &str,
    password: &str,
) -> Result<(), &'static str> {
    if username.is_empty() {
        Err("You have to enter a staff username")
    } else if password.is_empty() {
        Err("You have to enter a staff password")
    } else if username.chars().count() > MAX_CREDENTIAL_LEN {
        Err("The staff username is too long. It can only be up to 24 characters in length.")
    } else if password.chars().count() > MAX_CREDENTIAL_LEN {
        Err("The staff password is too long. It can only be up to 24 characters in length.")
    } else if Role::resolve(username) != Role::Staff {
        Err("Staff usernames must contain the word staff")
    } else {
        Ok(())
    }
}

impl FromRef<AppState> for SessionKeys {
    fn from_ref(state: &AppState) -> Self {
        let SessionConfig {
            secret,
            issuer,
            audience,
            ttl_minutes,
        } = state.config.session.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            audience,
            ttl: Duration::from_secs((ttl_minutes as u64) * 60),
        }
    }
}

impl SessionKeys {
    pub fn sign_session(&self, user_id: Uuid, session_id: Uuid) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = Claims {
            sub: user_id,
            sid: session_id,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user_id, session_id = %session_id, "session token signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }
}

/// Identity resolved from the bearer session token. The token signature is
/// only half of it: the session row has to still exist and be unexpired, so
/// logout genuinely revokes access.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
    pub session_id: Uuid,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthSession {
    type Rejection = (StatusCode, String);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(not_found)?;

        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or_else(not_found)?;

        let keys = SessionKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|_| {
            warn!("invalid or expired session token");
            not_found()
        })?;

        let row = sqlx::query_as::<_, (Uuid, String, Role)>(
            r#"
            SELECT u.id, u.username, u.role
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.id = $1 AND s.user_id = $2 AND s.expires_at > now()
            "#,
        )
        .bind(claims.sid)
        .bind(claims.sub)
        .fetch_optional(&state.db)
        .await
        .map_err(|e| {
            error!(error = %e, "session lookup failed");
            storage_unavailable()
        })?
        .ok_or_else(|| {
            warn!(session_id = %claims.sid, "token for a revoked or expired session");
            not_found()
        })?;

        Ok(AuthSession {
            user_id: row.0,
            username: row.1,
            role: row.2,
            session_id: claims.sid,
        })
    }
}

/// Create the `owner` account on first boot. Without OWNER_PASSWORD the
/// service still runs, it just has nobody who can provision staff.
pub async fn ensure_owner_account(state: &AppState) -> anyhow::Result<()> {
    if User::find_by_username(&state.db, "owner").await?.is_some() {
        return Ok(());
    }
    match state.config.owner_password.as_deref() {
        Some(password) => {
            let hash = hash_password(password)?;
            let user = User::create(&state.db, "owner", &hash, Role::Owner).await?;
            info!(user_id = %user.id, "owner account created");
        }
        None => warn!("no owner account exists and OWNER_PASSWORD is not set"),
    }
    Ok(())
}

#[cfg(test)]
mod password_tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let password = "c4tering!";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(verify_password(password, &hash).expect("verify should succeed"));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let hash = hash_password("right-password").expect("hashing should succeed");
        assert!(!verify_password("wrong-password", &hash).expect("verify should not error"));
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        let err = verify_password("anything", "not-a-valid-hash").unwrap_err();
        assert!(!err.to_string().is_empty());
    }
}

#[cfg(test)]
mod validation_tests {
    use super::*;

    #[test]
    fn registration_requires_both_fields() {
        assert_eq!(
            validate_registration("", "pw"),
            Err("You have to enter a username")
        );
        assert_eq!(
            validate_registration("alice", ""),
            Err("You have to enter a password")
        );
    }

    #[test]
    fn registration_enforces_length_ceiling() {
        let long = "a".repeat(MAX_CREDENTIAL_LEN + 1);
        assert!(validate_registration(&long, "pw").is_err());
        assert!(validate_registration("alice", &long).is_err());
        let max = "a".repeat(MAX_CREDENTIAL_LEN);
        assert_eq!(validate_registration(&max, "pw"), Ok(()));
    }

    #[test]
    fn staff_registration_rejects_names_outside_the_namespace() {
        assert_eq!(
            validate_staff_registration("bob", "pw"),
            Err("Staff usernames must contain the word staff")
        );
        assert_eq!(
            validate_staff_registration("owner", "pw"),
            Err("Staff usernames must contain the word staff")
        );
        assert_eq!(validate_staff_registration("staff_bob", "pw"), Ok(()));
    }

    #[test]
    fn staff_registration_uses_staff_wording() {
        assert_eq!(
            validate_staff_registration("", "pw"),
            Err("You have to enter a staff username")
        );
        assert_eq!(
            validate_staff_registration("staff_bob", ""),
            Err("You have to enter a staff password")
        );
    }
}

#[cfg(test)]
mod token_tests {
    use super::*;

    fn make_keys() -> SessionKeys {
        let state = AppState::fake();
        SessionKeys::from_ref(&state)
    }

    #[tokio::test]
    async fn sign_and_verify_session_token() {
        let keys = make_keys();
        let user_id = Uuid::new_v4();
        let session_id = Uuid::new_v4();
        let token = keys.sign_session(user_id, session_id).expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.sid, session_id);
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
    }

    #[tokio::test]
    async fn verify_rejects_tampered_token() {
        let keys = make_keys();
        let token = keys
            .sign_session(Uuid::new_v4(), Uuid::new_v4())
            .expect("sign");
        let mut tampered = token;
        tampered.push('x');
        assert!(keys.verify(&tampered).is_err());
    }

    #[tokio::test]
    async fn verify_rejects_foreign_secret() {
        let keys = make_keys();
        let foreign = SessionKeys {
            encoding: EncodingKey::from_secret(b"someone-else"),
            decoding: DecodingKey::from_secret(b"someone-else"),
            issuer: keys.issuer.clone(),
            audience: keys.audience.clone(),
            ttl: keys.ttl,
        };
        let token = foreign
            .sign_session(Uuid::new_v4(), Uuid::new_v4())
            .expect("sign");
        assert!(keys.verify(&token).is_err());
    }
}
