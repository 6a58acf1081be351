//! Publish/subscribe bus between the highlight panel, the page viewer and
//! the overlay projector

use std::sync::{Arc, Mutex, PoisonError};

use flume::{Receiver, Sender};
use log::trace;

use super::types::Location;
use super::viewer::OverlayId;

/// Events carried on the viewer bus
#[derive(Clone, Debug, PartialEq)]
pub enum ViewerEvent {
    /// A highlight with a usable rectangle was picked in the panel
    HighlightSelected { page_number: u32, location: Location },
    /// The panel selection was cleared
    HighlightCleared,
    /// Page-level navigation, used when a highlight has no usable rectangle
    PageRequested { page_number: u32 },
    /// The viewer finished laying out a page
    PageRendered { page_number: u32 },
    /// The rendering layer finished an overlay's opacity transition
    TransitionEnded { overlay: OverlayId },
}

/// Cloneable handle to a shared bus.
///
/// Every subscription gets its own unbounded queue; publishing fans out to
/// all of them. Subscriptions that were dropped are pruned on the next
/// publish.
#[derive(Clone, Debug, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<Sender<ViewerEvent>>>>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = flume::unbounded();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        Subscription { rx }
    }

    pub fn publish(&self, event: ViewerEvent) {
        trace!("bus: {event:?}");
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Receiving end of a bus subscription
#[derive(Debug)]
pub struct Subscription {
    rx: Receiver<ViewerEvent>,
}

impl Subscription {
    /// Take every event queued so far without blocking
    pub fn drain(&self) -> Vec<ViewerEvent> {
        self.rx.try_iter().collect()
    }
}
