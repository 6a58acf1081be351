//! Highlight side panel: list, debounced filter, selection

use std::rc::Rc;
use std::time::{Duration, Instant};

use log::{debug, warn};

use super::bus::{EventBus, ViewerEvent};
use super::timer::Clock;
use super::types::{HighlightError, HighlightRecord, parse_highlights};

/// Default delay between the last filter keystroke and re-filtering
pub const DEFAULT_FILTER_DEBOUNCE: Duration = Duration::from_millis(250);

#[derive(Debug)]
struct PendingFilter {
    query: String,
    apply_at: Instant,
}

/// Highlight list with a text filter, publishing selections on the bus
pub struct HighlightPanel {
    records: Vec<HighlightRecord>,
    visible: Vec<usize>,
    filter: String,
    pending_filter: Option<PendingFilter>,
    selected: Option<usize>,
    debounce: Duration,
    bus: EventBus,
    clock: Rc<dyn Clock>,
}

impl HighlightPanel {
    #[must_use]
    pub fn new(bus: EventBus, clock: Rc<dyn Clock>, debounce: Duration) -> Self {
        Self {
            records: Vec::new(),
            visible: Vec::new(),
            filter: String::new(),
            pending_filter: None,
            selected: None,
            debounce,
            bus,
            clock,
        }
    }

    /// Replace the list with the highlights in `json`
    pub fn load_json(&mut self, json: &str) -> Result<usize, HighlightError> {
        let records = parse_highlights(json)?;
        Ok(self.load(records))
    }

    /// Replace the list. Records with page 0 are dropped. Returns the number
    /// of records kept.
    pub fn load(&mut self, records: Vec<HighlightRecord>) -> usize {
        let total = records.len();
        let mut records: Vec<_> = records.into_iter().filter(|r| r.page >= 1).collect();
        if records.len() < total {
            warn!(
                "Dropped {} highlight(s) without a valid page number",
                total - records.len()
            );
        }
        // Stable: keeps file order within a page
        records.sort_by_key(|r| r.page);

        self.records = records;
        self.selected = None;
        self.refilter();
        debug!(
            "Loaded {} highlights, {} visible",
            self.records.len(),
            self.visible.len()
        );
        self.records.len()
    }

    /// Queue a new filter query; it applies once the debounce delay passes
    /// without another call.
    pub fn set_filter(&mut self, query: impl Into<String>) {
        self.pending_filter = Some(PendingFilter {
            query: query.into(),
            apply_at: self.clock.now() + self.debounce,
        });
    }

    /// Apply a due filter query. Returns true when the visible list changed.
    pub fn tick(&mut self) -> bool {
        let due = self
            .pending_filter
            .as_ref()
            .is_some_and(|p| p.apply_at <= self.clock.now());
        if !due {
            return false;
        }
        let Some(pending) = self.pending_filter.take() else {
            return false;
        };

        if pending.query == self.filter {
            return false;
        }
        self.filter = pending.query;
        let before = self.visible.clone();
        self.refilter();
        debug!(
            "Filter {:?} matches {} of {} highlights",
            self.filter,
            self.visible.len(),
            self.records.len()
        );
        before != self.visible
    }

    /// When the pending filter applies
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending_filter.as_ref().map(|p| p.apply_at)
    }

    /// The filter currently applied
    #[must_use]
    pub fn filter(&self) -> &str {
        &self.filter
    }

    #[must_use]
    pub fn records(&self) -> &[HighlightRecord] {
        &self.records
    }

    /// Records matching the applied filter, ordered by page
    pub fn visible(&self) -> impl Iterator<Item = &HighlightRecord> {
        self.visible.iter().map(|&i| &self.records[i])
    }

    #[must_use]
    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    /// Currently selected record
    #[must_use]
    pub fn selected(&self) -> Option<&HighlightRecord> {
        self.selected.map(|i| &self.records[i])
    }

    /// Select the `index`-th visible record and announce it on the bus.
    ///
    /// A record without a usable rectangle falls back to page navigation.
    pub fn select(&mut self, index: usize) -> Option<ViewerEvent> {
        let record_index = *self.visible.get(index)?;
        self.selected = Some(record_index);

        let record = &self.records[record_index];
        let event = match record.location.filter(|l| l.is_finite()) {
            Some(location) => ViewerEvent::HighlightSelected {
                page_number: record.page,
                location,
            },
            None => ViewerEvent::PageRequested {
                page_number: record.page,
            },
        };
        self.bus.publish(event.clone());
        Some(event)
    }

    /// Drop the selection and tell listeners
    pub fn clear_selection(&mut self) {
        self.selected = None;
        self.bus.publish(ViewerEvent::HighlightCleared);
    }

    fn refilter(&mut self) {
        let needle = self.filter.trim().to_lowercase();
        self.visible = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, r)| needle.is_empty() || r.text.to_lowercase().contains(&needle))
            .map(|(i, _)| i)
            .collect();

        if let Some(selected) = self.selected {
            if !self.visible.contains(&selected) {
                self.selected = None;
            }
        }
    }
}
