//! Assisted segmentation round trips.

use crate::constants::DEXTR_POINT_COUNT;
use crate::dextr::SOURCE_DEXTR;
use crate::model::LabelDocument;
use crate::tools::{DextrTool, Mods, Tool, ToolKind, ToolRequest};

use super::{Session, pt, square};

/// The canonical four extreme points of a diamond, in placement order
/// (top, left, bottom, right). None of these need clamping.
const EXTREMES: [(f64, f64); 4] = [(50.0, 0.0), (0.0, 50.0), (50.0, 100.0), (100.0, 50.0)];

fn click_extremes(tool: &mut DextrTool, session: &mut Session) {
    for (x, y) in EXTREMES {
        tool.on_left_click(&mut session.ctx(), pt(x, y), Mods::default());
    }
}

#[test]
fn test_four_clicks_dispatch_a_request() {
    let mut session = Session::new();
    session.view.set_model(LabelDocument::new("img-1"));

    let mut tool = DextrTool::new();
    tool.on_init(&mut session.ctx());
    assert_eq!(session.view.placeholders().len(), 1);

    click_extremes(&mut tool, &mut session);

    assert_eq!(session.transport.sent.len(), 1);
    let request = &session.transport.sent[0];
    assert_eq!(request.image_id, "img-1");
    assert_eq!(request.dextr_id, 1);
    assert_eq!(request.dextr_points.len(), DEXTR_POINT_COUNT);
    assert_eq!(
        request.dextr_points,
        EXTREMES.map(|(x, y)| pt(x, y)).to_vec()
    );
    assert_eq!(session.dextr.open_ids(), vec![1]);

    // The sent placeholder stays attached alongside the fresh one
    assert_eq!(session.view.placeholders().len(), 2);
    assert_eq!(tool.placeholder().borrow().n_points(), 0);
}

#[test]
fn test_resolution_creates_selected_label() {
    let mut session = Session::new();
    session.view.set_model(LabelDocument::new("img-1"));

    let mut tool = DextrTool::new();
    tool.on_init(&mut session.ctx());
    click_extremes(&mut tool, &mut session);

    let entity = session
        .dextr
        .resolve(&mut session.view, 1, vec![square(20.0, 20.0, 80.0, 80.0)])
        .expect("resolution creates a label");

    assert_eq!(session.view.root_entities().len(), 1);
    assert_eq!(session.view.selection().len(), 1);
    assert_eq!(entity.borrow().meta().source, SOURCE_DEXTR);
    assert_eq!(entity.borrow().label_class(), Some("tree"));
    assert!(session.dextr.open_ids().is_empty());
    // Only the tool's fresh placeholder remains
    assert_eq!(session.view.placeholders().len(), 1);
}

#[test]
fn test_empty_resolution_discards_quietly() {
    let mut session = Session::new();
    session.view.set_model(LabelDocument::new("img-1"));

    let mut tool = DextrTool::new();
    tool.on_init(&mut session.ctx());
    click_extremes(&mut tool, &mut session);

    assert!(
        session
            .dextr
            .resolve(&mut session.view, 1, Vec::new())
            .is_none()
    );
    assert!(session.view.root_entities().is_empty());
    assert_eq!(session.view.placeholders().len(), 1);
}

#[test]
fn test_unknown_resolution_is_ignored() {
    let mut session = Session::new();
    session.view.set_model(LabelDocument::new("img-1"));
    assert!(
        session
            .dextr
            .resolve(&mut session.view, 99, vec![square(0.0, 0.0, 1.0, 1.0)])
            .is_none()
    );
    assert!(session.view.root_entities().is_empty());
}

#[test]
fn test_transport_rejection_drops_the_request() {
    let mut session = Session::new();
    session.view.set_model(LabelDocument::new("img-1"));
    session.transport.reject = true;

    let mut tool = DextrTool::new();
    tool.on_init(&mut session.ctx());
    click_extremes(&mut tool, &mut session);

    assert!(session.transport.sent.is_empty());
    assert!(session.dextr.open_ids().is_empty());
    assert!(!session.dextr.polling_active());
}

#[test]
fn test_polling_follows_open_requests() {
    let mut session = Session::new();
    session.view.set_model(LabelDocument::new("img-1"));
    session.settings.dextr_polling_interval_ms = Some(500);

    let mut tool = DextrTool::new();
    tool.on_init(&mut session.ctx());
    click_extremes(&mut tool, &mut session);
    assert!(session.dextr.polling_active());

    session.dextr.poll(&mut session.transport);
    assert_eq!(session.transport.polls, vec![vec![1]]);

    session
        .dextr
        .resolve(&mut session.view, 1, vec![square(20.0, 20.0, 80.0, 80.0)]);
    assert!(!session.dextr.polling_active());
    session.dextr.poll(&mut session.transport);
    assert_eq!(session.transport.polls.len(), 1);
}

#[test]
fn test_polling_disabled_for_push_hosts() {
    let mut session = Session::new();
    session.view.set_model(LabelDocument::new("img-1"));
    // Default settings: no polling interval
    let mut tool = DextrTool::new();
    tool.on_init(&mut session.ctx());
    click_extremes(&mut tool, &mut session);

    assert!(!session.dextr.polling_active());
    session.dextr.poll(&mut session.transport);
    assert!(session.transport.polls.is_empty());
}

#[test]
fn test_stale_placeholder_discards_result() {
    let mut session = Session::new();
    session.view.set_model(LabelDocument::new("img-1"));

    let mut tool = DextrTool::new();
    tool.on_init(&mut session.ctx());
    click_extremes(&mut tool, &mut session);

    // Image change detaches every placeholder before the response arrives
    session.view.set_model(LabelDocument::new("img-2"));
    assert!(
        session
            .dextr
            .resolve(&mut session.view, 1, vec![square(20.0, 20.0, 80.0, 80.0)])
            .is_none()
    );
    assert!(session.view.root_entities().is_empty());
}

#[test]
fn test_cancel_unwinds_points_then_releases() {
    let mut session = Session::new();
    session.view.set_model(LabelDocument::new("img-1"));

    let mut tool = DextrTool::new();
    tool.on_init(&mut session.ctx());
    tool.on_left_click(&mut session.ctx(), pt(50.0, 0.0), Mods::default());
    tool.on_left_click(&mut session.ctx(), pt(0.0, 50.0), Mods::default());
    assert_eq!(tool.placeholder().borrow().n_points(), 2);

    assert!(tool.on_cancel(&mut session.ctx(), pt(0.0, 50.0)));
    assert_eq!(tool.placeholder().borrow().n_points(), 1);
    assert!(tool.on_cancel(&mut session.ctx(), pt(0.0, 50.0)));
    assert!(session.requests.is_empty());

    assert!(tool.on_cancel(&mut session.ctx(), pt(0.0, 50.0)));
    assert_eq!(
        session.requests,
        vec![ToolRequest::SwitchTool(ToolKind::Select)]
    );
}

#[test]
fn test_clicks_are_clamped_to_wind_correctly() {
    let mut session = Session::new();
    session.view.set_model(LabelDocument::new("img-1"));

    let mut tool = DextrTool::new();
    tool.on_init(&mut session.ctx());
    tool.on_left_click(&mut session.ctx(), pt(50.0, 0.0), Mods::default());
    // A "left" point up and to the right of the top point gets pushed back
    tool.on_left_click(&mut session.ctx(), pt(60.0, -5.0), Mods::default());

    let points = tool.placeholder().borrow().points.clone();
    assert_eq!(points[1], pt(49.0, 1.0));
}
