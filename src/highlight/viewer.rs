//! Page viewer collaborator contract and a headless implementation

use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;
use std::time::Duration;

use serde::Serialize;

use super::geometry::{OverlayRect, PageTransform};

/// Identifier of an overlay element
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct OverlayId(pub u64);

/// Straight-alpha colour
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `RRGGBB` (optionally `#`-prefixed) with the given alpha
    #[must_use]
    pub fn from_hex(hex: &str, alpha: f32) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self::new(
            channel(0)?,
            channel(2)?,
            channel(4)?,
            alpha.clamp(0.0, 1.0),
        ))
    }
}

/// Fixed look of the highlight overlay
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OverlayStyle {
    /// Semi-transparent fill
    pub fill: Rgba,
    /// Solid border
    pub border: Rgba,
    pub border_width: f64,
    /// Stacking order above the page's text and annotation layers
    pub z_index: i32,
    /// Overlays never take pointer input
    pub interactive: bool,
    /// Opacity after fade-in
    pub target_opacity: f32,
    /// Duration of the opacity transition
    #[serde(skip)]
    pub transition: Duration,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            fill: Rgba::new(0xFF, 0xEB, 0x3B, 0.35),
            border: Rgba::new(0xF9, 0xA8, 0x25, 1.0),
            border_width: 2.0,
            z_index: 100,
            interactive: false,
            target_opacity: 1.0,
            transition: Duration::from_millis(300),
        }
    }
}

/// Overlay as handed to a page's container
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OverlayElement {
    pub id: OverlayId,
    pub rect: OverlayRect,
    pub style: OverlayStyle,
    pub opacity: f32,
}

/// Node of a rendered page that overlay content is appended into.
///
/// Containers are shared between the viewer and the projector, so mutation
/// goes through `&self`.
pub trait OverlayContainer {
    fn append(&self, element: &OverlayElement);
    fn update(&self, element: &OverlayElement);
    fn remove(&self, id: OverlayId);
}

/// A rendered page
pub trait PageView {
    /// Map a PDF-space point to viewport pixels
    fn pdf_point_to_viewport_point(&self, x: f64, y: f64) -> (f64, f64);

    fn container(&self) -> Rc<dyn OverlayContainer>;
}

/// Resolves page numbers to rendered pages
pub trait PageViewer {
    /// Page view for a 1-based page number, `None` when not rendered
    fn page_view(&self, page_number: u32) -> Option<&dyn PageView>;
}

impl<V: PageViewer + ?Sized> PageViewer for Rc<V> {
    fn page_view(&self, page_number: u32) -> Option<&dyn PageView> {
        (**self).page_view(page_number)
    }
}

/// Container mutation, as recorded by [`MemoryContainer`]
#[derive(Clone, Debug, PartialEq)]
pub enum Mutation {
    Append(OverlayId),
    Update { id: OverlayId, opacity: f32 },
    Remove(OverlayId),
}

/// In-memory overlay container
#[derive(Debug, Default)]
pub struct MemoryContainer {
    elements: RefCell<Vec<OverlayElement>>,
    log: RefCell<Vec<Mutation>>,
}

impl MemoryContainer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn elements(&self) -> Ref<'_, Vec<OverlayElement>> {
        self.elements.borrow()
    }

    #[must_use]
    pub fn get(&self, id: OverlayId) -> Option<OverlayElement> {
        self.elements.borrow().iter().find(|e| e.id == id).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.borrow().is_empty()
    }

    /// Every mutation applied so far, oldest first
    #[must_use]
    pub fn mutations(&self) -> Vec<Mutation> {
        self.log.borrow().clone()
    }
}

impl OverlayContainer for MemoryContainer {
    fn append(&self, element: &OverlayElement) {
        self.log.borrow_mut().push(Mutation::Append(element.id));
        self.elements.borrow_mut().push(element.clone());
    }

    fn update(&self, element: &OverlayElement) {
        self.log.borrow_mut().push(Mutation::Update {
            id: element.id,
            opacity: element.opacity,
        });
        if let Some(slot) = self
            .elements
            .borrow_mut()
            .iter_mut()
            .find(|e| e.id == element.id)
        {
            *slot = element.clone();
        }
    }

    fn remove(&self, id: OverlayId) {
        self.log.borrow_mut().push(Mutation::Remove(id));
        self.elements.borrow_mut().retain(|e| e.id != id);
    }
}

/// Page of a [`HeadlessViewer`]
#[derive(Debug)]
pub struct HeadlessPage {
    transform: PageTransform,
    container: Rc<MemoryContainer>,
    rendered: Cell<bool>,
}

impl HeadlessPage {
    #[must_use]
    pub fn new(transform: PageTransform) -> Self {
        Self {
            transform,
            container: Rc::new(MemoryContainer::new()),
            rendered: Cell::new(true),
        }
    }

    #[must_use]
    pub fn transform(&self) -> &PageTransform {
        &self.transform
    }

    #[must_use]
    pub fn overlays(&self) -> &MemoryContainer {
        &self.container
    }

    #[must_use]
    pub fn is_rendered(&self) -> bool {
        self.rendered.get()
    }

    pub fn set_rendered(&self, rendered: bool) {
        self.rendered.set(rendered);
    }
}

impl PageView for HeadlessPage {
    fn pdf_point_to_viewport_point(&self, x: f64, y: f64) -> (f64, f64) {
        self.transform.apply(x, y)
    }

    fn container(&self) -> Rc<dyn OverlayContainer> {
        self.container.clone()
    }
}

/// Viewer that keeps pages in memory instead of drawing them
#[derive(Debug, Default)]
pub struct HeadlessViewer {
    pages: Vec<HeadlessPage>,
}

impl HeadlessViewer {
    #[must_use]
    pub fn new(pages: Vec<HeadlessPage>) -> Self {
        Self { pages }
    }

    /// `page_count` pages sharing one transform
    #[must_use]
    pub fn uniform(page_count: u32, transform: PageTransform) -> Self {
        Self::new(
            (0..page_count)
                .map(|_| HeadlessPage::new(transform))
                .collect(),
        )
    }

    /// Page by 1-based number, rendered or not
    #[must_use]
    pub fn page(&self, page_number: u32) -> Option<&HeadlessPage> {
        let index = usize::try_from(page_number.checked_sub(1)?).ok()?;
        self.pages.get(index)
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Overlays across all pages
    #[must_use]
    pub fn overlay_count(&self) -> usize {
        self.pages.iter().map(|p| p.container.len()).sum()
    }
}

impl PageViewer for HeadlessViewer {
    fn page_view(&self, page_number: u32) -> Option<&dyn PageView> {
        self.page(page_number)
            .filter(|p| p.is_rendered())
            .map(|p| p as &dyn PageView)
    }
}
