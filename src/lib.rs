// Export modules for use in tests
pub mod highlight;
pub mod iconset;
pub mod panic_handler;
pub mod session;
pub mod settings;

pub use highlight::{HighlightOverlayProjector, HighlightPanel, Location};
pub use session::{HeadlessSession, OverlayReport};
