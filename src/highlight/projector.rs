//! Highlight overlay projector
//!
//! Shows a single translucent box over the rendered page a highlight belongs
//! to. Each `show_highlight` first retires the current overlay, then waits for
//! the target page to settle before mounting the new one. A page has settled
//! on whichever comes first: its layout-ready signal or the settle delay.
//! Retired overlays fade to zero opacity and are removed on transition end or
//! after the fade delay. A settled show mounts only once every retired overlay
//! is gone.

use std::rc::Rc;
use std::time::Duration;

use log::{debug, info};

use super::bus::{EventBus, Subscription, ViewerEvent};
use super::geometry::project;
use super::timer::{Clock, TimerId, TimerQueue};
use super::types::Location;
use super::viewer::{OverlayContainer, OverlayElement, OverlayId, OverlayStyle, PageViewer};

/// Default wait for a page's layout to settle before mounting
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Default fade-out duration before an overlay is removed
pub const DEFAULT_FADE_OUT: Duration = Duration::from_millis(300);

/// Projector timing and look
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectorConfig {
    /// Fallback wait when the page never reports layout-ready
    pub settle_delay: Duration,
    /// Fallback wait when the rendering layer never reports transition end
    pub fade_out: Duration,
    pub style: OverlayStyle,
}

impl Default for ProjectorConfig {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
            fade_out: DEFAULT_FADE_OUT,
            style: OverlayStyle::default(),
        }
    }
}

#[derive(Debug)]
enum Timer {
    Settle { generation: u64 },
    FadeOut { overlay: OverlayId },
}

#[derive(Debug)]
struct PendingShow {
    generation: u64,
    page_number: u32,
    location: Location,
    /// Settle timer; `None` once the page has settled and the show only waits
    /// for fading overlays to go
    timer: Option<TimerId>,
}

struct LiveOverlay {
    element: OverlayElement,
    page_number: u32,
    container: Rc<dyn OverlayContainer>,
    faded_in: bool,
}

struct FadingOverlay {
    id: OverlayId,
    container: Rc<dyn OverlayContainer>,
    timer: TimerId,
}

/// Projects highlight rectangles onto rendered pages
pub struct HighlightOverlayProjector<V: PageViewer> {
    viewer: V,
    clock: Rc<dyn Clock>,
    config: ProjectorConfig,
    subscription: Option<Subscription>,
    timers: TimerQueue<Timer>,
    pending: Option<PendingShow>,
    live: Option<LiveOverlay>,
    fading: Vec<FadingOverlay>,
    frame_requested: bool,
    next_generation: u64,
    next_overlay_id: u64,
}

impl<V: PageViewer> HighlightOverlayProjector<V> {
    #[must_use]
    pub fn new(viewer: V, clock: Rc<dyn Clock>, mut config: ProjectorConfig) -> Self {
        config.style.transition = config.fade_out;
        Self {
            viewer,
            clock,
            config,
            subscription: None,
            timers: TimerQueue::new(),
            pending: None,
            live: None,
            fading: Vec::new(),
            frame_requested: false,
            next_generation: 1,
            next_overlay_id: 1,
        }
    }

    /// Listen for viewer events on `bus`. Events are handled in [`Self::tick`].
    pub fn subscribe(&mut self, bus: &EventBus) {
        self.subscription = Some(bus.subscribe());
    }

    #[must_use]
    pub fn viewer(&self) -> &V {
        &self.viewer
    }

    #[must_use]
    pub fn config(&self) -> &ProjectorConfig {
        &self.config
    }

    /// The current overlay, if one is mounted and not fading out
    #[must_use]
    pub fn overlay(&self) -> Option<&OverlayElement> {
        self.live.as_ref().map(|live| &live.element)
    }

    /// Page the current overlay sits on
    #[must_use]
    pub fn overlay_page(&self) -> Option<u32> {
        self.live.as_ref().map(|live| live.page_number)
    }

    /// A show is waiting for its page to settle
    #[must_use]
    pub fn has_pending_show(&self) -> bool {
        self.pending.is_some()
    }

    /// Number of overlays fading out
    #[must_use]
    pub fn fading_count(&self) -> usize {
        self.fading.len()
    }

    /// The host should call [`Self::on_animation_frame`] on its next frame
    #[must_use]
    pub fn wants_animation_frame(&self) -> bool {
        self.frame_requested
    }

    /// When the next timer is due
    #[must_use]
    pub fn next_deadline(&self) -> Option<std::time::Instant> {
        self.timers.next_deadline()
    }

    /// Nothing scheduled, nothing pending
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.timers.is_empty() && !self.frame_requested
    }

    /// Retire the current overlay and show `location` on `page_number` once
    /// the page has settled.
    ///
    /// A missing or non-finite location only retires the current overlay.
    pub fn show_highlight(&mut self, page_number: u32, location: Option<&Location>) {
        self.clear_highlight();

        let Some(location) = location.filter(|l| l.is_finite()) else {
            debug!("No usable rectangle for page {page_number}, overlay skipped");
            return;
        };

        let generation = self.next_generation;
        self.next_generation += 1;

        let deadline = self.clock.now() + self.config.settle_delay;
        let timer = self.timers.schedule(deadline, Timer::Settle { generation });
        self.pending = Some(PendingShow {
            generation,
            page_number,
            location: *location,
            timer: Some(timer),
        });
        debug!("Highlight on page {page_number} waiting for layout (generation {generation})");
    }

    /// Fade out and then remove the current overlay. Also drops a show that
    /// has not been mounted yet. No-op when there is nothing to clear.
    pub fn clear_highlight(&mut self) {
        if let Some(pending) = self.pending.take() {
            if let Some(timer) = pending.timer {
                self.timers.cancel(timer);
            }
            debug!(
                "Discarded pending highlight for page {} (generation {})",
                pending.page_number, pending.generation
            );
        }
        self.retire_live();
    }

    /// Layout-ready signal from the viewer; settles a pending show for this
    /// page without waiting for the settle delay.
    pub fn page_layout_ready(&mut self, page_number: u32) {
        let Some(pending) = self.pending.as_mut() else {
            return;
        };
        if pending.page_number != page_number {
            return;
        }
        if let Some(timer) = pending.timer.take() {
            self.timers.cancel(timer);
            self.settle();
        }
    }

    /// Transition-end signal from the rendering layer; removes a fading
    /// overlay without waiting for the fade delay.
    pub fn transition_ended(&mut self, overlay: OverlayId) {
        if let Some(pos) = self.fading.iter().position(|f| f.id == overlay) {
            let fading = self.fading.remove(pos);
            self.timers.cancel(fading.timer);
            fading.container.remove(fading.id);
            debug!("Overlay {} removed on transition end", overlay.0);
            self.mount_when_clear();
        }
    }

    /// Start the fade-in of a freshly mounted overlay
    pub fn on_animation_frame(&mut self) {
        if !std::mem::take(&mut self.frame_requested) {
            return;
        }
        if let Some(live) = self.live.as_mut().filter(|live| !live.faded_in) {
            live.element.opacity = live.element.style.target_opacity;
            live.faded_in = true;
            live.container.update(&live.element);
        }
    }

    /// Handle queued bus events, then fire every timer that is due
    pub fn tick(&mut self) {
        let events = self
            .subscription
            .as_ref()
            .map(Subscription::drain)
            .unwrap_or_default();
        for event in events {
            self.handle_event(event);
        }

        let now = self.clock.now();
        let due: Vec<Timer> = std::iter::from_fn(|| self.timers.pop_due(now)).collect();
        for timer in due {
            self.fire(timer);
        }
    }

    /// Apply a single bus event
    pub fn handle_event(&mut self, event: ViewerEvent) {
        match event {
            ViewerEvent::HighlightSelected {
                page_number,
                location,
            } => self.show_highlight(page_number, Some(&location)),
            ViewerEvent::PageRequested { page_number } => self.show_highlight(page_number, None),
            ViewerEvent::HighlightCleared => self.clear_highlight(),
            ViewerEvent::PageRendered { page_number } => self.page_layout_ready(page_number),
            ViewerEvent::TransitionEnded { overlay } => self.transition_ended(overlay),
        }
    }

    fn fire(&mut self, timer: Timer) {
        match timer {
            Timer::Settle { generation } => match self.pending.as_mut() {
                Some(pending) if pending.generation == generation => {
                    pending.timer = None;
                    self.settle();
                }
                // Superseded by a newer show or a clear
                _ => debug!("Dropped stale settle timer (generation {generation})"),
            },
            Timer::FadeOut { overlay } => {
                if let Some(pos) = self.fading.iter().position(|f| f.id == overlay) {
                    let fading = self.fading.remove(pos);
                    fading.container.remove(fading.id);
                    debug!("Overlay {} removed after fade delay", overlay.0);
                    self.mount_when_clear();
                }
            }
        }
    }

    /// The pending show's page has settled: mount now, or once the retired
    /// overlays are removed
    fn settle(&mut self) {
        if self.fading.is_empty() {
            if let Some(pending) = self.pending.take() {
                self.mount(pending);
            }
        } else {
            debug!(
                "Page settled, waiting for {} overlay(s) to fade out",
                self.fading.len()
            );
        }
    }

    fn mount_when_clear(&mut self) {
        let settled = self.pending.as_ref().is_some_and(|p| p.timer.is_none());
        if settled && self.fading.is_empty() {
            if let Some(pending) = self.pending.take() {
                self.mount(pending);
            }
        }
    }

    fn mount(&mut self, pending: PendingShow) {
        let PendingShow {
            page_number,
            location,
            ..
        } = pending;

        let resolved = self.viewer.page_view(page_number).map(|view| {
            let rect = project(&location, |x, y| view.pdf_point_to_viewport_point(x, y));
            (rect, view.container())
        });
        let Some((rect, container)) = resolved else {
            debug!("Page {page_number} is not rendered, highlight not shown");
            return;
        };

        let id = OverlayId(self.next_overlay_id);
        self.next_overlay_id += 1;

        let element = OverlayElement {
            id,
            rect,
            style: self.config.style.clone(),
            opacity: 0.0,
        };
        container.append(&element);
        info!(
            "Highlight overlay {} on page {page_number} at ({:.1}, {:.1}) size {:.1}x{:.1}",
            id.0, rect.left, rect.top, rect.width, rect.height
        );

        self.live = Some(LiveOverlay {
            element,
            page_number,
            container,
            faded_in: false,
        });
        self.frame_requested = true;
    }

    fn retire_live(&mut self) {
        let Some(mut live) = self.live.take() else {
            return;
        };
        // The fade-in request only concerns the live element
        self.frame_requested = false;

        live.element.opacity = 0.0;
        live.container.update(&live.element);

        let deadline = self.clock.now() + self.config.fade_out;
        let id = live.element.id;
        let timer = self.timers.schedule(deadline, Timer::FadeOut { overlay: id });
        self.fading.push(FadingOverlay {
            id,
            container: live.container,
            timer,
        });
        debug!("Overlay {} fading out", id.0);
    }
}
