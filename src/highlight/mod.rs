//! Highlight navigation for the PDF viewer
//!
//! The panel lists highlights and publishes selections on the bus; the
//! projector subscribes and draws one overlay box on the matching page.

mod bus;
mod geometry;
mod panel;
mod projector;
mod timer;
mod types;
mod viewer;

pub use bus::{EventBus, Subscription, ViewerEvent};
pub use geometry::{OverlayRect, PageTransform, project};
pub use panel::{DEFAULT_FILTER_DEBOUNCE, HighlightPanel};
pub use projector::{
    DEFAULT_FADE_OUT, DEFAULT_SETTLE_DELAY, HighlightOverlayProjector, ProjectorConfig,
};
pub use timer::{Clock, ManualClock, SystemClock, TimerId, TimerQueue};
pub use types::{HighlightError, HighlightRecord, Location, parse_highlights};
pub use viewer::{
    HeadlessPage, HeadlessViewer, MemoryContainer, Mutation, OverlayContainer, OverlayElement,
    OverlayId, OverlayStyle, PageView, PageViewer, Rgba,
};
