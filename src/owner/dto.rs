use serde::Serialize;
use uuid::Uuid;

use crate::owner::repo::StaffedEvent;

/// One scheduled event with its assigned staff. An empty `staff` list means
/// nobody signed up yet.
#[derive(Debug, Serialize)]
pub struct ScheduledEvent {
    pub id: Uuid,
    pub name: String,
    pub date: String,
    pub number_of_staff: i32,
    pub staff: Vec<String>,
}

impl From<StaffedEvent> for ScheduledEvent {
    fn from(s: StaffedEvent) -> Self {
        Self {
            id: s.event.id,
            name: s.event.name,
            date: s.event.event_date,
            number_of_staff: s.event.number_of_staff,
            staff: s.staff,
        }
    }
}

/// Body of the owner page.
#[derive(Debug, Serialize)]
pub struct OwnerSchedule {
    pub scheduled_events: Vec<ScheduledEvent>,
}
