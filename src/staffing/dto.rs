use serde::Serialize;

use crate::events::dto::EventSummary;

/// Body of the staff page: events the caller works, plus events that still
/// need staff.
#[derive(Debug, Serialize)]
pub struct StaffBoard {
    pub worked_events: Vec<EventSummary>,
    pub available_events: Vec<EventSummary>,
}
