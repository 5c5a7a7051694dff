use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;

use crate::events::repo::Event;

/// An event with the usernames of the staff working it.
#[derive(Debug)]
pub struct StaffedEvent {
    pub event: Event,
    pub staff: Vec<String>,
}

/// Every scheduled event, soonest first, each with its assigned staff.
pub async fn list_scheduled_with_staff(db: &PgPool) -> anyhow::Result<Vec<StaffedEvent>> {
    let events = Event::list_all(db).await?;
    let assignments = sqlx::query_as::<_, (Uuid, String)>(
        r#"
        SELECT w.event_id, u.username
        FROM works w
        JOIN users u ON u.id = w.staff_id
        ORDER BY u.username ASC
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(group_staff(events, assignments))
}

/// Attach each event's staff usernames. An event nobody signed up for keeps
/// an empty list; the client renders its own placeholder for that.
fn group_staff(events: Vec<Event>, assignments: Vec<(Uuid, String)>) -> Vec<StaffedEvent> {
    let mut by_event: HashMap<Uuid, Vec<String>> = HashMap::new();
    for (event_id, username) in assignments {
        by_event.entry(event_id).or_default().push(username);
    }
    events
        .into_iter()
        .map(|event| {
            let staff = by_event.remove(&event.id).unwrap_or_default();
            StaffedEvent { event, staff }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn event(date: &str) -> Event {
        Event {
            id: Uuid::new_v4(),
            name: format!("event on {date}"),
            event_date: date.to_string(),
            number_of_staff: 0,
            customer_id: Uuid::new_v4(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn staff_land_on_their_events() {
        let first = event("2024-06-01");
        let second = event("2024-06-02");
        let assignments = vec![
            (first.id, "staff_bob".to_string()),
            (first.id, "staff_jane".to_string()),
        ];
        let grouped = group_staff(vec![first, second], assignments);

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].staff, vec!["staff_bob", "staff_jane"]);
        assert!(grouped[1].staff.is_empty());
    }

    #[test]
    fn event_order_is_preserved() {
        let dates = ["2024-01-05", "2024-02-01", "2024-03-20"];
        let events: Vec<Event> = dates.iter().map(|d| event(d)).collect();
        let grouped = group_staff(events, Vec::new());
        let out: Vec<&str> = grouped.iter().map(|s| s.event.event_date.as_str()).collect();
        assert_eq!(out, dates);
    }
}
