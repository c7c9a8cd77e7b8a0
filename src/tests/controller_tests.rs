//! End-to-end event flow through the [`Labeller`] controller.

use std::cell::RefCell;
use std::rc::Rc;

use crate::controller::{ImageData, Labeller};
use crate::model::{LabelDocument, LabelModel};
use crate::tools::{Key, Mods, ToolKind, ToolSettings};

use super::{FakeTransport, pt, square, square_polygon_model, test_registry};

fn image_with(labels: Vec<LabelModel>) -> ImageData {
    let mut document = LabelDocument::new("img-1");
    document.labels = labels;
    ImageData {
        width: 640,
        height: 480,
        document,
    }
}

fn new_labeller() -> Labeller {
    Labeller::new(
        Box::new(test_registry()),
        Box::new(FakeTransport::default()),
        ToolSettings::default(),
    )
}

#[test]
fn test_set_image_rebuilds_the_view() {
    let mut labeller = new_labeller();
    labeller.set_image(image_with(vec![square_polygon_model(
        Some("tree"),
        0.0,
        0.0,
        10.0,
        10.0,
    )]));

    assert_eq!(labeller.image_size(), Some((640, 480)));
    assert_eq!(labeller.tool_kind(), ToolKind::Select);
    assert_eq!(labeller.view().root_entities().len(), 1);
    // Loading is not a change the host needs pushed back
    assert!(labeller.take_pending_document().is_none());
}

#[test]
fn test_hover_click_select_delete_flow() {
    let mut labeller = new_labeller();
    labeller.set_image(image_with(vec![
        square_polygon_model(None, 0.0, 0.0, 10.0, 10.0),
        square_polygon_model(None, 20.0, 0.0, 30.0, 10.0),
    ]));
    let target = labeller.view().root_entities()[0].clone();

    // Enter the working area, then move over the first square
    labeller.pointer_move(pt(50.0, 50.0), Mods::default());
    labeller.pointer_move(pt(5.0, 5.0), Mods::default());
    assert!(target.borrow().common().hovered);

    labeller.left_click(pt(5.0, 5.0), Mods::default());
    assert!(target.borrow().common().selected);
    assert_eq!(labeller.view().selection().len(), 1);

    // Delete falls through the select tool to the selection
    assert!(labeller.key_down(Key::Delete));
    assert_eq!(labeller.view().root_entities().len(), 1);

    let pushed = labeller.take_pending_document().expect("change pending");
    assert_eq!(pushed.labels.len(), 1);
    // The push is debounced
    assert!(labeller.take_pending_document().is_none());
}

#[test]
fn test_keyboard_armed_only_inside() {
    let mut labeller = new_labeller();
    labeller.set_image(image_with(vec![square_polygon_model(
        None, 0.0, 0.0, 10.0, 10.0,
    )]));
    let entity = labeller.view().root_entities()[0].clone();
    labeller.select_entity(&entity, false, false);

    assert!(!labeller.key_down(Key::Delete));
    assert_eq!(labeller.view().root_entities().len(), 1);

    labeller.pointer_move(pt(5.0, 5.0), Mods::default());
    assert!(labeller.key_down(Key::Delete));
    assert!(labeller.view().root_entities().is_empty());
}

#[test]
fn test_selection_hook_fires() {
    let mut labeller = new_labeller();
    labeller.set_image(image_with(vec![square_polygon_model(
        None, 0.0, 0.0, 10.0, 10.0,
    )]));
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    labeller.set_selection_changed_hook(Box::new(move |view| {
        sink.borrow_mut().push(view.selection().len());
    }));

    let entity = labeller.view().root_entities()[0].clone();
    labeller.select_entity(&entity, false, false);
    labeller.unselect_all();
    assert_eq!(*seen.borrow(), vec![1, 0]);
}

#[test]
fn test_draw_polygon_through_the_controller() {
    let mut labeller = new_labeller();
    labeller.set_image(image_with(Vec::new()));
    labeller.set_current_tool(ToolKind::DrawPolygon);

    labeller.pointer_move(pt(0.0, 0.0), Mods::default());
    labeller.left_click(pt(0.0, 0.0), Mods::default());
    labeller.pointer_move(pt(10.0, 0.0), Mods::default());
    labeller.left_click(pt(10.0, 0.0), Mods::default());
    labeller.pointer_move(pt(10.0, 10.0), Mods::default());
    labeller.left_click(pt(10.0, 10.0), Mods::default());
    assert!(labeller.cancel(pt(10.0, 10.0)));

    let pushed = labeller.take_pending_document().expect("change pending");
    assert_eq!(pushed.labels.len(), 1);
    let LabelModel::Polygon(p) = &pushed.labels[0] else {
        panic!("expected polygon label");
    };
    assert_eq!(p.regions[0].len(), 3);

    // With no draft in progress, cancel falls back to the select tool
    assert!(labeller.cancel(pt(10.0, 10.0)));
    assert_eq!(labeller.tool_kind(), ToolKind::Select);
}

#[test]
fn test_tool_switch_resumes_selected_polygon() {
    let mut labeller = new_labeller();
    labeller.set_image(image_with(vec![square_polygon_model(
        None, 0.0, 0.0, 10.0, 10.0,
    )]));
    let entity = labeller.view().root_entities()[0].clone();
    labeller.select_entity(&entity, false, false);

    // The polygon tool picks up the selected polygon and, with the pointer
    // inside, immediately adds its trailing vertex
    labeller.pointer_move(pt(5.0, 5.0), Mods::default());
    labeller.set_current_tool(ToolKind::DrawPolygon);
    {
        let ent = entity.borrow();
        let polygon = ent.as_polygon().expect("polygon");
        assert_eq!(polygon.model.regions[0].len(), 5);
    }

    // Switching away removes it again
    labeller.set_current_tool(ToolKind::Select);
    let ent = entity.borrow();
    let polygon = ent.as_polygon().expect("polygon");
    assert_eq!(polygon.model.regions[0].len(), 4);
}

#[test]
fn test_pointer_leave_switches_out_and_disarms() {
    let mut labeller = new_labeller();
    labeller.set_image(image_with(vec![square_polygon_model(
        None, 0.0, 0.0, 10.0, 10.0,
    )]));
    let entity = labeller.view().root_entities()[0].clone();

    labeller.pointer_move(pt(50.0, 50.0), Mods::default());
    labeller.pointer_move(pt(5.0, 5.0), Mods::default());
    assert!(entity.borrow().common().hovered);

    labeller.pointer_leave(pt(5.0, 5.0));
    assert!(!entity.borrow().common().hovered);
    assert!(!labeller.key_down(Key::Delete));
}

#[test]
fn test_dextr_round_trip_through_the_controller() {
    let mut labeller = new_labeller();
    labeller.set_image(image_with(Vec::new()));
    labeller.set_current_tool(ToolKind::Dextr);

    labeller.pointer_move(pt(50.0, 0.0), Mods::default());
    for (x, y) in [(50.0, 0.0), (0.0, 50.0), (50.0, 100.0), (100.0, 50.0)] {
        labeller.left_click(pt(x, y), Mods::default());
    }
    assert_eq!(labeller.open_dextr_requests(), vec![1]);

    labeller.dextr_success(1, vec![square(20.0, 20.0, 80.0, 80.0)]);
    assert!(labeller.open_dextr_requests().is_empty());
    let pushed = labeller.take_pending_document().expect("change pending");
    assert_eq!(pushed.labels.len(), 1);
    assert_eq!(pushed.labels[0].meta().source, "auto:dextr");
}

#[test]
fn test_group_and_composite_from_selection() {
    let mut labeller = new_labeller();
    labeller.set_image(image_with(vec![
        square_polygon_model(None, 0.0, 0.0, 10.0, 10.0),
        square_polygon_model(None, 20.0, 0.0, 30.0, 10.0),
    ]));
    let a = labeller.view().root_entities()[0].clone();
    let b = labeller.view().root_entities()[1].clone();

    labeller.select_entity(&a, false, false);
    labeller.select_entity(&b, true, false);
    let group = labeller.create_group_from_selection().expect("group");
    assert!(group.borrow().common().selected);
    assert_eq!(labeller.view().root_entities().len(), 1);
    assert!(labeller.take_pending_document().is_some());

    let composite = labeller
        .create_composite_from_selection()
        .expect("composite");
    // The composite references the group but does not take the selection
    assert!(!composite.borrow().common().selected);
    assert_eq!(labeller.view().root_entities().len(), 2);
}

#[test]
fn test_merge_selected_polygons_through_the_controller() {
    let mut labeller = new_labeller();
    labeller.set_image(image_with(vec![
        square_polygon_model(Some("tree"), 0.0, 0.0, 10.0, 10.0),
        square_polygon_model(Some("tree"), 5.0, 0.0, 15.0, 10.0),
    ]));
    let a = labeller.view().root_entities()[0].clone();
    let b = labeller.view().root_entities()[1].clone();
    labeller.select_entity(&a, false, false);
    labeller.select_entity(&b, true, false);

    let merged = labeller.merge_selected_polygons().expect("merge applies");
    assert_eq!(labeller.view().root_entities().len(), 1);
    assert!(merged.borrow().common().selected);
    assert_eq!(merged.borrow().label_class(), Some("tree"));
}

#[test]
fn test_image_change_tears_down_draft_state() {
    let mut labeller = new_labeller();
    labeller.set_image(image_with(Vec::new()));
    labeller.set_current_tool(ToolKind::DrawPolygon);
    labeller.pointer_move(pt(0.0, 0.0), Mods::default());
    labeller.left_click(pt(0.0, 0.0), Mods::default());
    assert_eq!(labeller.view().root_entities().len(), 1);

    labeller.set_image(image_with(Vec::new()));
    assert_eq!(labeller.tool_kind(), ToolKind::Select);
    assert!(labeller.view().root_entities().is_empty());
    assert!(labeller.take_pending_document().is_none());
}
