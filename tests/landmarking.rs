use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::{Duration, Instant};

use futures::future::{FutureExt, LocalBoxFuture};
use landmarker::prelude::*;
use landmarker::session::LogNotifier;
use serde_json::json;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn empty_group(len: usize, connectivity: Vec<[usize; 2]>) -> LandmarkGroup {
    LandmarkGroup::new(
        GroupKey::new("face", "ibug68"),
        vec![None; len],
        3,
        connectivity,
        Vec::new(),
        LandmarkTracker::default(),
    )
    .unwrap()
}

#[test]
fn insert_reset_and_delete_three_landmarks() {
    init_logger();
    let mut group = empty_group(3, vec![[0, 1]]);
    assert_eq!(group.next_available(), Some(0));

    group.insert_new(Point3::new(0.1, 0.2, 0.3)).unwrap();
    assert_eq!(
        group.to_document().landmarks.coordinates(),
        vec![Some(vec![0.1, 0.2, 0.3]), None, None]
    );
    assert_eq!(group.next_available(), Some(1));
    assert_eq!(group.selected(), vec![0]);

    assert_eq!(group.delete_selected(), vec![0]);
    assert_eq!(group.to_document().landmarks.coordinates(), vec![None, None, None]);

    assert!(group.undo());
    assert_eq!(
        group.to_document().landmarks.coordinates()[0],
        Some(vec![0.1, 0.2, 0.3])
    );
}

#[test]
fn connectivity_past_the_end_fails_construction() {
    let err = LandmarkGroup::new(
        GroupKey::new("face", "t"),
        vec![None; 3],
        3,
        vec![[0, 3]],
        Vec::new(),
        LandmarkTracker::default(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::ConnectivityOutOfRange { index: 3, .. }));
}

#[test]
fn unmodified_document_round_trips() {
    let original = json!({
        "landmarks": {
            "points": [[1.5, -2.0, 0.25], null, [0, 3.5, -1]],
            "connectivity": [[0, 1], [1, 2]]
        },
        "labels": [
            { "label": "left", "mask": [0] },
            { "label": "right", "mask": [1, 2] }
        ],
        "version": 2
    });

    let document = LandmarkDocument::from_value(original.clone()).unwrap();
    let group = LandmarkGroup::from_document(
        &document,
        GroupKey::new("face", "t"),
        3,
        LandmarkTracker::default(),
    )
    .unwrap();

    assert_eq!(group.to_document().to_value().unwrap(), original);
}

#[test]
fn integer_pixel_coordinates_round_trip() {
    let original = json!({
        "landmarks": { "points": [[12, 40], null], "connectivity": [[0, 1]] },
        "labels": [],
        "version": 2
    });
    let document = LandmarkDocument::from_value(original.clone()).unwrap();
    let group = LandmarkGroup::from_document(
        &document,
        GroupKey::new("scan", "t"),
        2,
        LandmarkTracker::default(),
    )
    .unwrap();

    assert_eq!(group.to_document().to_value().unwrap(), original);
}

#[test]
fn mesh_click_then_drag_renders_once_per_step() {
    init_logger();
    let mut viewport = Viewport::new(800.0, 600.0, Settings::default());
    viewport
        .set_asset(&Asset::mesh("plane", generate_plane(2.0, 2.0, 4, 4)))
        .unwrap();
    let mut group = empty_group(2, vec![[0, 1]]);
    viewport.set_landmarks(group.landmarks(), group.connectivity());

    let click = PointerEvent::new(400.0, 300.0, MouseButton::Left);
    viewport.mouse_down(&mut group, &click);
    viewport.mouse_up(&mut group, &click);
    assert!(group.landmark(0).is_some_and(|lm| !lm.is_empty()));
    let before = group.landmark(0).and_then(|lm| lm.point()).unwrap();

    viewport.mouse_down(&mut group, &click);
    let frames = viewport.frames_rendered();
    viewport.mouse_move(&mut group, &PointerEvent::new(440.0, 320.0, MouseButton::Left));
    assert_eq!(viewport.frames_rendered(), frames + 1);
    viewport.mouse_up(&mut group, &PointerEvent::new(440.0, 320.0, MouseButton::Left));

    let after = group.landmark(0).and_then(|lm| lm.point()).unwrap();
    assert!(after.x > before.x);
    assert!(after.y < before.y);
    assert!(viewport.listeners().is_empty());

    assert!(group.undo());
    assert_eq!(group.landmark(0).and_then(|lm| lm.point()), Some(before));
}

#[test]
fn disabling_mid_drag_detaches_every_listener() {
    let mut viewport = Viewport::new(800.0, 600.0, Settings::default());
    viewport
        .set_asset(&Asset::mesh("ball", generate_sphere(32, 16)))
        .unwrap();
    let mut group = empty_group(1, Vec::new());
    viewport.set_landmarks(group.landmarks(), group.connectivity());

    let press = PointerEvent::new(100.0, 100.0, MouseButton::Left);
    viewport.mouse_down(&mut group, &press);
    assert!(!viewport.listeners().is_empty());

    viewport.disable();
    assert!(viewport.listeners().is_empty());
    assert!(!viewport.mouse().is_pressed());
}

#[test]
fn stylus_is_ignored_right_after_a_pinch() {
    let mut viewport = Viewport::new(800.0, 600.0, Settings::default());
    viewport
        .set_asset(&Asset::mesh("plane", generate_plane(2.0, 2.0, 4, 4)))
        .unwrap();
    let mut group = empty_group(1, Vec::new());
    viewport.set_landmarks(group.landmarks(), group.connectivity());

    let start = Instant::now();
    for (id, x) in [(1, 350.0), (2, 450.0)] {
        viewport.touch(
            &mut group,
            &TouchPoint::finger(id, TouchPhase::Started, x, 300.0),
            start,
        );
    }
    let pinch_end = start + Duration::from_millis(50);
    viewport.touch(
        &mut group,
        &TouchPoint::finger(2, TouchPhase::Ended, 450.0, 300.0),
        pinch_end,
    );
    viewport.touch(
        &mut group,
        &TouchPoint::finger(1, TouchPhase::Ended, 350.0, 300.0),
        pinch_end,
    );

    let early = pinch_end + Duration::from_millis(100);
    viewport.touch(&mut group, &TouchPoint::stylus(9, TouchPhase::Started, 400.0, 300.0), early);
    viewport.touch(&mut group, &TouchPoint::stylus(9, TouchPhase::Ended, 400.0, 300.0), early);
    assert!(group.landmark(0).is_some_and(|lm| lm.is_empty()));

    let late = pinch_end + Duration::from_millis(400);
    viewport.touch(&mut group, &TouchPoint::stylus(9, TouchPhase::Started, 400.0, 300.0), late);
    viewport.touch(&mut group, &TouchPoint::stylus(9, TouchPhase::Ended, 400.0, 300.0), late);
    assert!(group.landmark(0).is_some_and(|lm| !lm.is_empty()));
}

#[test]
fn shift_drag_selects_landmarks_inside_the_box() {
    let mut viewport = Viewport::new(800.0, 600.0, Settings::default());
    viewport
        .set_asset(&Asset::mesh("plane", generate_plane(2.0, 2.0, 4, 4)))
        .unwrap();
    let mut group = empty_group(2, Vec::new());
    group.insert_new(Point3::new(-0.5, 0.5, 0.0));
    group.insert_new(Point3::new(0.5, -0.5, 0.0));
    group.deselect_all();
    viewport.set_landmarks(group.landmarks(), group.connectivity());

    let inside = viewport
        .scene()
        .local_to_screen(viewport.rig(), Point3::new(-0.5, 0.5, 0.0));
    let shift = ModifiersState::SHIFT;
    let down = PointerEvent::new(inside.x - 20.0, inside.y - 20.0, MouseButton::Left)
        .with_modifiers(shift);
    let up = PointerEvent::new(inside.x + 20.0, inside.y + 20.0, MouseButton::Left)
        .with_modifiers(shift);

    viewport.mouse_down(&mut group, &down);
    viewport.mouse_move(&mut group, &up);
    assert!(viewport.overlay().selection_box.is_some());
    viewport.mouse_up(&mut group, &up);

    assert_eq!(group.selected(), vec![0]);
    assert!(viewport.overlay().selection_box.is_none());
}

#[derive(Default)]
struct MemoryBackend {
    documents: RefCell<HashMap<String, LandmarkDocument>>,
    fail_saves: Cell<bool>,
}

impl Backend for MemoryBackend {
    fn fetch_asset(&self, asset_id: &str) -> LocalBoxFuture<'static, anyhow::Result<Asset>> {
        let asset = Asset::mesh(asset_id, generate_plane(2.0, 2.0, 4, 4));
        async move { Ok(asset) }.boxed_local()
    }

    fn fetch_landmarks(
        &self,
        asset_id: &str,
        _template: &str,
    ) -> LocalBoxFuture<'static, anyhow::Result<LandmarkDocument>> {
        let document = self
            .documents
            .borrow()
            .get(asset_id)
            .cloned()
            .unwrap_or_else(|| LandmarkDocument::empty(2));
        async move { Ok(document) }.boxed_local()
    }

    fn save_landmarks(
        &self,
        asset_id: &str,
        _template: &str,
        document: LandmarkDocument,
    ) -> LocalBoxFuture<'static, anyhow::Result<()>> {
        let result = if self.fail_saves.get() {
            Err(anyhow::anyhow!("connection reset"))
        } else {
            self.documents
                .borrow_mut()
                .insert(asset_id.to_string(), document);
            Ok(())
        };
        async move { result }.boxed_local()
    }
}

#[test]
fn annotate_save_and_come_back() {
    init_logger();
    let backend = Rc::new(MemoryBackend::default());
    let mut session = Session::new(backend.clone(), LogNotifier, HistorySettings::default());
    let mut viewport = Viewport::new(800.0, 600.0, Settings::default());

    let response = pollster::block_on(session.request_asset("plane"));
    let asset = session.accept_asset(response).unwrap().clone();
    viewport.set_asset(&asset).unwrap();

    let group =
        pollster::block_on(session.switch_group("plane", "t", 3, UnsavedChanges::Autosave))
            .unwrap();
    viewport.set_landmarks(group.landmarks(), group.connectivity());
    let click = PointerEvent::new(400.0, 300.0, MouseButton::Left);
    viewport.mouse_down(&mut *group, &click);
    viewport.mouse_up(&mut *group, &click);
    assert!(!group.is_up_to_date());

    backend.fail_saves.set(true);
    assert!(pollster::block_on(session.save()).is_err());
    assert!(backend.documents.borrow().is_empty());
    assert!(!session.group().unwrap().is_up_to_date());

    backend.fail_saves.set(false);
    pollster::block_on(session.switch_group("other", "t", 3, UnsavedChanges::Autosave))
        .unwrap();
    let saved = backend.documents.borrow().get("plane").cloned().unwrap();
    assert!(saved.landmarks.points[0].is_some());

    let group =
        pollster::block_on(session.switch_group("plane", "t", 3, UnsavedChanges::Autosave))
            .unwrap();
    assert!(group.is_up_to_date());
    assert!(group.landmark(0).is_some_and(|lm| !lm.is_empty()));
    assert!(group.undo());
    assert!(group.landmark(0).is_some_and(|lm| lm.is_empty()));
}
