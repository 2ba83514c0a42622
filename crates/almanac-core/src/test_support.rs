//! Record fixtures shared by unit tests.

use jiff::Timestamp;

use crate::models::{Coverage, Event, EventDates, Planning, Record};

pub(crate) fn ts(text: &str) -> Timestamp {
    text.parse().expect("fixture timestamp should parse")
}

pub(crate) fn planning_on(id: &str, scheduled: &str) -> Record {
    Record::Planning(Planning {
        id: Some(id.to_string()),
        slugline: Some(format!("{id}-slug")),
        coverages: vec![Coverage::scheduled_at(ts(scheduled))],
        ..Default::default()
    })
}

pub(crate) fn event_on(id: &str, start: &str) -> Record {
    let start = ts(start);
    Record::Event(Event {
        id: id.to_string(),
        name: Some(format!("{id} event")),
        dates: Some(EventDates {
            start,
            end: start,
            tz: None,
        }),
        ..Default::default()
    })
}
