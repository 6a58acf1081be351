//! Headless viewer session: panel, bus, projector and in-memory pages wired
//! together the way a viewer host wires them, driven on a manual clock.

use std::rc::Rc;

use log::debug;
use serde::Serialize;

use crate::highlight::{
    Clock, EventBus, HeadlessViewer, HighlightOverlayProjector, HighlightPanel, ManualClock,
    OverlayRect, PageTransform, ProjectorConfig, ViewerEvent,
};

/// Outcome of selecting one highlight
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OverlayReport {
    pub page: u32,
    pub text: String,
    /// `None` when the highlight only navigates to its page
    pub overlay: Option<OverlayRect>,
}

pub struct HeadlessSession {
    clock: Rc<ManualClock>,
    panel: HighlightPanel,
    projector: HighlightOverlayProjector<Rc<HeadlessViewer>>,
    viewer: Rc<HeadlessViewer>,
}

impl HeadlessSession {
    #[must_use]
    pub fn new(
        page_count: u32,
        transform: PageTransform,
        config: ProjectorConfig,
        panel_debounce: std::time::Duration,
    ) -> Self {
        let clock = Rc::new(ManualClock::new());
        let bus = EventBus::new();
        let viewer = Rc::new(HeadlessViewer::uniform(page_count, transform));

        let mut projector = HighlightOverlayProjector::new(viewer.clone(), clock.clone(), config);
        projector.subscribe(&bus);
        let panel = HighlightPanel::new(bus, clock.clone(), panel_debounce);

        Self {
            clock,
            panel,
            projector,
            viewer,
        }
    }

    pub fn panel(&self) -> &HighlightPanel {
        &self.panel
    }

    pub fn panel_mut(&mut self) -> &mut HighlightPanel {
        &mut self.panel
    }

    pub fn viewer(&self) -> &HeadlessViewer {
        &self.viewer
    }

    /// Apply a filter query and wait out its debounce
    pub fn apply_filter(&mut self, query: &str) {
        self.panel.set_filter(query);
        self.run_until_idle();
    }

    /// Select the `index`-th visible highlight and run the loop until the
    /// overlay has settled and faded in.
    pub fn select(&mut self, index: usize) -> Option<OverlayReport> {
        let event = self.panel.select(index)?;
        self.run_until_idle();

        let record = self.panel.selected()?;
        let overlay = match event {
            ViewerEvent::HighlightSelected { .. } => {
                self.projector.overlay().map(|element| element.rect)
            }
            _ => None,
        };
        Some(OverlayReport {
            page: record.page,
            text: record.text.clone(),
            overlay,
        })
    }

    /// Select every visible highlight in turn
    pub fn select_all(&mut self) -> Vec<OverlayReport> {
        (0..self.panel.visible_len())
            .filter_map(|index| self.select(index))
            .collect()
    }

    /// Clear the selection and let the fade-out finish
    pub fn clear(&mut self) {
        self.panel.clear_selection();
        self.run_until_idle();
    }

    /// Drive ticks, animation frames and the clock until nothing is pending
    fn run_until_idle(&mut self) {
        loop {
            self.panel.tick();
            self.projector.tick();
            if self.projector.wants_animation_frame() {
                self.projector.on_animation_frame();
                continue;
            }

            let next = [self.panel.next_deadline(), self.projector.next_deadline()]
                .into_iter()
                .flatten()
                .min();
            let Some(deadline) = next else {
                break;
            };
            let wait = deadline.saturating_duration_since(self.clock.now());
            debug!("headless: advancing clock by {wait:?}");
            self.clock.advance(wait);
        }
    }
}
