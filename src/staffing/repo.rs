use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::events::repo::Event;

/// Page size for the worked-events list.
const WORKED_PAGE_SIZE: i64 = 30;
/// Staff an event needs before it leaves the available list.
pub(crate) const STAFF_CAPACITY: i32 = 3;

#[derive(Debug, PartialEq, Eq)]
pub enum SignUpOutcome {
    SignedUp,
    /// The pair already existed; nothing changed.
    AlreadySignedUp,
}

#[derive(Debug, thiserror::Error)]
pub enum SignUpError {
    #[error("event not found")]
    EventNotFound,
    #[error("The event already has a full staff")]
    FullyStaffed,
    #[error("The event is being filled right now, try again")]
    Conflict,
    #[error(transparent)]
    Storage(#[from] sqlx::Error),
}

/// Events the staff member is assigned to, soonest first.
pub async fn list_worked(db: &PgPool, staff_id: Uuid) -> anyhow::Result<Vec<Event>> {
    let rows = sqlx::query_as::<_, Event>(
        r#"
        SELECT e.id, e.name, e.event_date, e.number_of_staff, e.customer_id, e.created_at
        FROM events e
        JOIN works w ON w.event_id = e.id
        WHERE w.staff_id = $1
        ORDER BY e.event_date ASC
        LIMIT $2
        "#,
    )
    .bind(staff_id)
    .bind(WORKED_PAGE_SIZE)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Events still below the capacity ceiling that this staff member has not
/// signed up for.
pub async fn list_available(db: &PgPool, staff_id: Uuid) -> anyhow::Result<Vec<Event>> {
    let rows = sqlx::query_as::<_, Event>(
        r#"
        SELECT e.id, e.name, e.event_date, e.number_of_staff, e.customer_id, e.created_at
        FROM events e
        WHERE e.number_of_staff < $2
          AND NOT EXISTS (
              SELECT 1 FROM works w WHERE w.event_id = e.id AND w.staff_id = $1
          )
        ORDER BY e.event_date ASC
        "#,
    )
    .bind(staff_id)
    .bind(STAFF_CAPACITY)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Assign the staff member to the event on `date`.
///
/// The whole check-insert-increment sequence runs in one serializable
/// transaction, so `number_of_staff` always equals the number of works rows
/// and two racers for the last slot cannot both get it. A duplicate pair is
/// an informational no-op, not an error.
pub async fn sign_up(
    db: &PgPool,
    staff_id: Uuid,
    date: &str,
) -> Result<SignUpOutcome, SignUpError> {
    match sign_up_tx(db, staff_id, date).await {
        Err(SignUpError::Storage(e)) if is_serialization_failure(&e) => Err(SignUpError::Conflict),
        other => other,
    }
}

async fn sign_up_tx(
    db: &PgPool,
    staff_id: Uuid,
    date: &str,
) -> Result<SignUpOutcome, SignUpError> {
    let mut tx = db.begin().await?;
    set_transaction_serializable(&mut tx).await?;

    let event = sqlx::query_as::<_, (Uuid, i32)>(
        "SELECT id, number_of_staff FROM events WHERE event_date = $1",
    )
    .bind(date)
    .fetch_optional(&mut *tx)
    .await?;
    let Some((event_id, number_of_staff)) = event else {
        return Err(SignUpError::EventNotFound);
    };

    let already = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM works WHERE staff_id = $1 AND event_id = $2",
    )
    .bind(staff_id)
    .bind(event_id)
    .fetch_one(&mut *tx)
    .await?;
    if already > 0 {
        return Ok(SignUpOutcome::AlreadySignedUp);
    }

    if number_of_staff >= STAFF_CAPACITY {
        return Err(SignUpError::FullyStaffed);
    }

    sqlx::query("INSERT INTO works (staff_id, event_id) VALUES ($1, $2)")
        .bind(staff_id)
        .bind(event_id)
        .execute(&mut *tx)
        .await?;

    let updated = sqlx::query("UPDATE events SET number_of_staff = number_of_staff + 1 WHERE id = $1")
        .bind(event_id)
        .execute(&mut *tx)
        .await?;
    if updated.rows_affected() < 1 {
        // the event vanished between the read and the write
        return Err(SignUpError::EventNotFound);
    }

    tx.commit().await?;
    Ok(SignUpOutcome::SignedUp)
}

async fn set_transaction_serializable(
    tx: &mut Transaction<'_, Postgres>,
) -> Result<(), sqlx::Error> {
    sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
        .execute(&mut **tx)
        .await?;
    Ok(())
}

fn is_serialization_failure(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some("40001"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_up_messages_are_user_facing() {
        assert_eq!(
            SignUpError::FullyStaffed.to_string(),
            "The event already has a full staff"
        );
        assert_eq!(
            SignUpError::Conflict.to_string(),
            "The event is being filled right now, try again"
        );
    }

    #[test]
    fn duplicate_pair_is_not_an_error() {
        assert_eq!(SignUpOutcome::AlreadySignedUp, SignUpOutcome::AlreadySignedUp);
        assert_ne!(SignUpOutcome::SignedUp, SignUpOutcome::AlreadySignedUp);
    }
}
