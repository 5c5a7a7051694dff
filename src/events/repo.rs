use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

/// Event record in the database. `event_date` is the natural key: the
/// company takes at most one engagement per calendar date.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Event {
    pub id: Uuid,
    pub name: String,
    pub event_date: String,
    pub number_of_staff: i32,
    pub customer_id: Uuid,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, thiserror::Error)]
pub enum CreateEventError {
    #[error("The company is booked on that date")]
    DateBooked,
    #[error(transparent)]
    Storage(#[from] sqlx::Error),
}

impl Event {
    pub async fn find_by_date(db: &PgPool, date: &str) -> sqlx::Result<Option<Event>> {
        sqlx::query_as::<_, Event>(
            r#"
            SELECT id, name, event_date, number_of_staff, customer_id, created_at
            FROM events
            WHERE event_date = $1
            "#,
        )
        .bind(date)
        .fetch_optional(db)
        .await
    }

    pub async fn create(
        db: &PgPool,
        name: &str,
        date: &str,
        customer_id: Uuid,
    ) -> Result<Event, CreateEventError> {
        if Event::find_by_date(db, date).await?.is_some() {
            return Err(CreateEventError::DateBooked);
        }
        let res = sqlx::query_as::<_, Event>(
            r#"
            INSERT INTO events (name, event_date, customer_id)
            VALUES ($1, $2, $3)
            RETURNING id, name, event_date, number_of_staff, customer_id, created_at
            "#,
        )
        .bind(name)
        .bind(date)
        .bind(customer_id)
        .fetch_one(db)
        .await;
        match res {
            Ok(event) => Ok(event),
            // lost the race on the unique date; same outcome as the pre-check
            Err(e) if is_unique_violation(&e) => Err(CreateEventError::DateBooked),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<Event>> {
        let rows = sqlx::query_as::<_, Event>(
            r#"
            SELECT id, name, event_date, number_of_staff, customer_id, created_at
            FROM events
            ORDER BY event_date ASC
            "#,
        )
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn list_by_customer(db: &PgPool, customer_id: Uuid) -> anyhow::Result<Vec<Event>> {
        let rows = sqlx::query_as::<_, Event>(
            r#"
            SELECT id, name, event_date, number_of_staff, customer_id, created_at
            FROM events
            WHERE customer_id = $1
            ORDER BY event_date ASC
            "#,
        )
        .bind(customer_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Delete the event on `date` if it belongs to `customer_id`. Returns
    /// whether a row went away; a foreign event is indistinguishable from a
    /// missing one.
    pub async fn delete_owned(db: &PgPool, date: &str, customer_id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM events WHERE event_date = $1 AND customer_id = $2")
            .bind(date)
            .bind(customer_id)
            .execute(db)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}
