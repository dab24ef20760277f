use chrono::Utc;
use serde_json::Value;

use crate::data::dashboard_api::EVENT_LIMIT;
use crate::data::types::{Event, ScannerStatus};

/// Displayed event list plus the latest scanner status.
///
/// A feed refresh replaces the list with the server's items. Local
/// insertions (backtest results) are prepended and survive until the next
/// refresh. The list never holds more than `EVENT_LIMIT` entries; the oldest
/// fall off the end.
#[derive(Debug, Default)]
pub struct EventFeed {
    events: Vec<Event>,
    status: Option<ScannerStatus>,
}

impl EventFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&mut self, events: Vec<Event>, status: ScannerStatus) {
        self.events = events;
        self.status = Some(status);
    }

    pub fn prepend(&mut self, event: Event) {
        self.events.insert(0, event);
        self.events.truncate(EVENT_LIMIT);
    }

    pub fn prepend_backtest(&mut self, result: Value) {
        self.prepend(Event {
            ts: Utc::now().to_rfc3339(),
            kind: "backtest".to_string(),
            payload: result,
        });
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn status(&self) -> Option<&ScannerStatus> {
        self.status.as_ref()
    }
}
