use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::events::repo::Event;

/// Request body for an event booking.
#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub name: String,
    pub date: String,
}

/// Event as shown to its customer or to staff.
#[derive(Debug, Serialize)]
pub struct EventSummary {
    pub id: Uuid,
    pub name: String,
    pub date: String,
    pub number_of_staff: i32,
}

impl From<Event> for EventSummary {
    fn from(e: Event) -> Self {
        Self {
            id: e.id,
            name: e.name,
            date: e.event_date,
            number_of_staff: e.number_of_staff,
        }
    }
}

/// Body of the customer page: the caller's own requested events.
#[derive(Debug, Serialize)]
pub struct CustomerEvents {
    pub events: Vec<EventSummary>,
}
