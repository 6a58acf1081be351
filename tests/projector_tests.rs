use std::rc::Rc;
use std::time::Duration;

use pagelight::highlight::{
    DEFAULT_FADE_OUT, DEFAULT_FILTER_DEBOUNCE, DEFAULT_SETTLE_DELAY, EventBus, HeadlessViewer,
    HighlightOverlayProjector, HighlightPanel, Location, ManualClock, Mutation, PageTransform,
    ProjectorConfig, ViewerEvent,
};

const HIGHLIGHTS: &str = include_str!("testdata/highlights.json");

struct Harness {
    clock: Rc<ManualClock>,
    viewer: Rc<HeadlessViewer>,
    panel: HighlightPanel,
    projector: HighlightOverlayProjector<Rc<HeadlessViewer>>,
    bus: EventBus,
}

impl Harness {
    fn new(transform: PageTransform) -> Self {
        let clock = Rc::new(ManualClock::new());
        let bus = EventBus::new();
        let viewer = Rc::new(HeadlessViewer::uniform(5, transform));
        let mut projector = HighlightOverlayProjector::new(
            viewer.clone(),
            clock.clone(),
            ProjectorConfig::default(),
        );
        projector.subscribe(&bus);
        let mut panel = HighlightPanel::new(bus.clone(), clock.clone(), DEFAULT_FILTER_DEBOUNCE);
        panel.load_json(HIGHLIGHTS).unwrap();

        Self {
            clock,
            viewer,
            panel,
            projector,
            bus,
        }
    }

    fn advance(&mut self, by: Duration) {
        self.clock.advance(by);
        self.panel.tick();
        self.projector.tick();
    }
}

#[test]
fn fixture_highlight_projects_with_identity_transform() {
    let mut h = Harness::new(PageTransform::identity());

    // Page 2 "Ownership" entry carries the reference rectangle
    let index = h
        .panel
        .visible()
        .position(|r| r.text == "Ownership")
        .unwrap();
    h.panel.select(index);
    h.projector.tick();
    h.advance(DEFAULT_SETTLE_DELAY);
    h.projector.on_animation_frame();

    let overlays = h.viewer.page(2).unwrap().overlays();
    let element = overlays.elements()[0].clone();
    assert_eq!(element.rect.left, 10.0);
    assert_eq!(element.rect.top, -80.0);
    assert_eq!(element.rect.width, 20.0);
    assert_eq!(element.rect.height, 30.0);
    assert_eq!(element.opacity, 1.0);
}

#[test]
fn panel_selection_round_trip_on_top_anchored_pages() {
    let transform = PageTransform::top_anchored(612.0, 792.0, 2.0, 0).unwrap();
    let mut h = Harness::new(transform);

    let index = h
        .panel
        .visible()
        .position(|r| r.text == "Ownership")
        .unwrap();
    h.panel.select(index);
    h.projector.tick();
    h.bus.publish(ViewerEvent::PageRendered { page_number: 2 });
    h.projector.tick();

    let rect = h.projector.overlay().unwrap().rect;
    assert!((rect.left - 20.0).abs() < 1e-9);
    assert!((rect.top - 100.0).abs() < 1e-9);
    assert!((rect.width - 40.0).abs() < 1e-9);
    assert!((rect.height - 60.0).abs() < 1e-9);
}

#[test]
fn every_listed_highlight_yields_non_negative_box() {
    for rotation in [0, 90, 180, 270] {
        let transform = PageTransform::top_anchored(612.0, 792.0, 1.25, rotation).unwrap();
        let mut h = Harness::new(transform);

        for index in 0..h.panel.visible_len() {
            let Some(ViewerEvent::HighlightSelected { .. }) = h.panel.select(index) else {
                continue;
            };
            h.projector.tick();
            h.advance(DEFAULT_SETTLE_DELAY);

            let rect = h.projector.overlay().unwrap().rect;
            assert!(
                rect.width >= 0.0 && rect.height >= 0.0,
                "rotation {rotation}: {rect:?}"
            );
            assert!(h.viewer.overlay_count() <= 1);
        }
    }
}

#[test]
fn rapid_selection_leaves_single_overlay() {
    let mut h = Harness::new(PageTransform::identity());
    let count = h.panel.visible_len();
    for index in 0..count {
        h.panel.select(index);
        h.projector.tick();
        h.advance(Duration::from_millis(50));
    }
    h.advance(DEFAULT_SETTLE_DELAY);
    h.advance(DEFAULT_FADE_OUT);

    assert!(h.viewer.overlay_count() <= 1);
}

#[test]
fn page_only_record_clears_overlay_without_new_one() {
    let mut h = Harness::new(PageTransform::identity());
    let with_box = h
        .panel
        .visible()
        .position(|r| r.location.is_some())
        .unwrap();
    let without_box = h
        .panel
        .visible()
        .position(|r| r.location.is_none())
        .unwrap();

    h.panel.select(with_box);
    h.projector.tick();
    h.advance(DEFAULT_SETTLE_DELAY);
    assert_eq!(h.viewer.overlay_count(), 1);

    assert!(matches!(
        h.panel.select(without_box),
        Some(ViewerEvent::PageRequested { .. })
    ));
    h.projector.tick();
    assert!(h.projector.overlay().is_none());

    h.advance(DEFAULT_FADE_OUT);
    h.advance(DEFAULT_SETTLE_DELAY);
    assert_eq!(h.viewer.overlay_count(), 0);
}

#[test]
fn fade_out_precedes_removal() {
    let mut h = Harness::new(PageTransform::identity());
    h.bus.publish(ViewerEvent::HighlightSelected {
        page_number: 1,
        location: Location::new(0.0, -10.0, 10.0, -10.0),
    });
    h.projector.tick();
    h.advance(DEFAULT_SETTLE_DELAY);
    h.projector.on_animation_frame();
    let id = h.projector.overlay().unwrap().id;

    h.panel.clear_selection();
    h.projector.tick();
    let viewer = h.viewer.clone();
    let overlays = viewer.page(1).unwrap().overlays();
    assert_eq!(overlays.len(), 1);
    assert_eq!(
        overlays.mutations().last(),
        Some(&Mutation::Update { id, opacity: 0.0 })
    );

    h.advance(DEFAULT_FADE_OUT);
    assert!(overlays.is_empty());
}

#[test]
fn unrendered_page_is_a_silent_miss() {
    let mut h = Harness::new(PageTransform::identity());
    h.viewer.page(2).unwrap().set_rendered(false);

    h.bus.publish(ViewerEvent::HighlightSelected {
        page_number: 2,
        location: Location::new(10.0, -50.0, 20.0, -30.0),
    });
    h.projector.tick();
    h.advance(DEFAULT_SETTLE_DELAY);

    assert!(h.viewer.page(2).unwrap().overlays().mutations().is_empty());
    assert!(h.projector.overlay().is_none());
}

#[test]
fn rendered_page_waits_for_previous_fade() {
    let mut h = Harness::new(PageTransform::identity());
    let first = h.panel.visible().position(|r| r.page == 1).unwrap();
    let second = h.panel.visible().position(|r| r.page == 2).unwrap();

    h.panel.select(first);
    h.bus.publish(ViewerEvent::PageRendered { page_number: 1 });
    h.projector.tick();
    h.projector.on_animation_frame();
    let old = h.projector.overlay().unwrap().id;

    h.panel.select(second);
    h.bus.publish(ViewerEvent::PageRendered { page_number: 2 });
    h.projector.tick();

    let viewer = h.viewer.clone();
    let page1 = viewer.page(1).unwrap().overlays();
    assert_eq!(page1.len(), 1);
    assert_eq!(
        page1.mutations().last(),
        Some(&Mutation::Update {
            id: old,
            opacity: 0.0
        })
    );
    assert!(viewer.page(2).unwrap().overlays().is_empty());

    h.advance(DEFAULT_FADE_OUT);
    assert!(page1.is_empty());
    assert_eq!(viewer.page(2).unwrap().overlays().len(), 1);
    assert_eq!(h.projector.overlay_page(), Some(2));
}
