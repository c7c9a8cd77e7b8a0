//! The top-level controller.
//!
//! [`Labeller`] owns the root view, the active tool and the session
//! services, and routes host input events to the tool. Hosts feed it plain
//! pointer/keyboard events plus segmentation responses, and collect
//! document pushes with [`take_pending_document`](Labeller::take_pending_document).

use std::rc::Rc;

use crate::dextr::{DextrTracker, DextrTransport};
use crate::entity::{EntityRef, merge_polygonal_labels};
use crate::math::Point2;
use crate::model::{LabelClassRegistry, LabelDocument};
use crate::tools::{
    BrushSelectEntityTool, DextrTool, DrawOrientedEllipseTool, DrawPolygonTool, EditPolyTool, Key,
    Mods, SelectEntityTool, Tool, ToolCtx, ToolKind, ToolRequest, ToolSettings,
};
use crate::view::{RootLabelView, ViewEvent};

/// An image handed to the labeller: its pixel dimensions and its label
/// document. Pixel data stays on the host side.
#[derive(Debug, Clone)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub document: LabelDocument,
}

/// Callback invoked after every selection change.
pub type SelectionChangedHook = Box<dyn FnMut(&RootLabelView)>;

/// The annotation session controller.
pub struct Labeller {
    view: RootLabelView,
    tool: Option<Box<dyn Tool>>,
    tool_kind: ToolKind,
    classes: Box<dyn LabelClassRegistry>,
    settings: ToolSettings,
    dextr: DextrTracker,
    transport: Box<dyn DextrTransport>,
    selection_hook: Option<SelectionChangedHook>,

    /// A document change is waiting to be pulled by the host.
    push_pending: bool,

    button_down: bool,
    mouse_within: bool,
    last_pos: Option<Point2>,
    /// Root entities currently under the pointer, for hover synthesis.
    hovered: Vec<EntityRef>,
    image_size: Option<(u32, u32)>,
}

impl Labeller {
    pub fn new(
        classes: Box<dyn LabelClassRegistry>,
        transport: Box<dyn DextrTransport>,
        settings: ToolSettings,
    ) -> Self {
        let mut labeller = Labeller {
            view: RootLabelView::new(),
            tool: None,
            tool_kind: ToolKind::Select,
            classes,
            settings,
            dextr: DextrTracker::new(),
            transport,
            selection_hook: None,
            push_pending: false,
            button_down: false,
            mouse_within: false,
            last_pos: None,
            hovered: Vec::new(),
            image_size: None,
        };
        labeller.set_current_tool(ToolKind::Select);
        labeller
    }

    pub fn view(&self) -> &RootLabelView {
        &self.view
    }

    pub fn tool_kind(&self) -> ToolKind {
        self.tool_kind
    }

    pub fn image_size(&self) -> Option<(u32, u32)> {
        self.image_size
    }

    pub fn set_selection_changed_hook(&mut self, hook: SelectionChangedHook) {
        self.selection_hook = Some(hook);
    }

    // ========================================================================
    // Image and document flow
    // ========================================================================

    /// Switch to a new image. The previous tool is torn down, the view is
    /// rebuilt from the new document, and the select tool becomes active.
    /// Placeholders of in-flight segmentation requests are detached, so
    /// stale responses will be discarded.
    pub fn set_image(&mut self, image: ImageData) {
        self.set_current_tool(ToolKind::Select);
        self.view.set_model(image.document);
        self.image_size = Some((image.width, image.height));
        self.hovered.clear();
        self.push_pending = false;
    }

    /// A document snapshot, assembled on demand.
    pub fn document(&self) -> LabelDocument {
        self.view.document()
    }

    /// The debounced push: returns a document snapshot if anything changed
    /// since the last call, else `None`. Hosts call this after feeding
    /// events (or on a timer) and send the result upstream.
    pub fn take_pending_document(&mut self) -> Option<LabelDocument> {
        if self.push_pending {
            self.push_pending = false;
            Some(self.view.document())
        } else {
            None
        }
    }

    // ========================================================================
    // Tool management
    // ========================================================================

    fn make_tool(&self, kind: ToolKind) -> Box<dyn Tool> {
        match kind {
            ToolKind::Select => Box::new(SelectEntityTool::new()),
            ToolKind::BrushSelect => Box::new(BrushSelectEntityTool::new()),
            ToolKind::DrawPolygon => Box::new(DrawPolygonTool::new(self.selected_polygon())),
            ToolKind::EditPoly => Box::new(EditPolyTool::new(self.selected_polygon())),
            ToolKind::DrawOrientedEllipse => Box::new(DrawOrientedEllipseTool::new()),
            ToolKind::Dextr => Box::new(DextrTool::new()),
        }
    }

    /// The drawing tools continue editing a selected polygon.
    fn selected_polygon(&self) -> Option<EntityRef> {
        self.view
            .get_selected_entity()
            .filter(|e| e.borrow().as_polygon().is_some())
    }

    /// Activate a tool: the old one is switched out (if the pointer is
    /// inside) and shut down, the new one initialized and switched in.
    pub fn set_current_tool(&mut self, kind: ToolKind) {
        let old = self.tool.take();
        let mut new_tool = self.make_tool(kind);
        let mut requests = Vec::new();
        {
            let mut ctx = ToolCtx {
                view: &mut self.view,
                settings: &self.settings,
                classes: self.classes.as_ref(),
                dextr: &mut self.dextr,
                transport: self.transport.as_mut(),
                requests: &mut requests,
            };
            if let Some(mut old) = old {
                if self.mouse_within
                    && let Some(pos) = self.last_pos
                {
                    old.on_switch_out(&mut ctx, pos);
                }
                old.on_shutdown(&mut ctx);
            }
            new_tool.on_init(&mut ctx);
            if self.mouse_within
                && let Some(pos) = self.last_pos
            {
                new_tool.on_switch_in(&mut ctx, pos);
            }
        }
        self.tool = Some(new_tool);
        self.tool_kind = kind;
        self.finish(requests);
    }

    // ========================================================================
    // Event dispatch plumbing
    // ========================================================================

    fn dispatch<R>(&mut self, f: impl FnOnce(&mut dyn Tool, &mut ToolCtx<'_>) -> R) -> Option<R> {
        let mut tool = self.tool.take()?;
        let mut requests = Vec::new();
        let result = {
            let mut ctx = ToolCtx {
                view: &mut self.view,
                settings: &self.settings,
                classes: self.classes.as_ref(),
                dextr: &mut self.dextr,
                transport: self.transport.as_mut(),
                requests: &mut requests,
            };
            f(tool.as_mut(), &mut ctx)
        };
        self.tool = Some(tool);
        self.finish(requests);
        Some(result)
    }

    fn finish(&mut self, requests: Vec<ToolRequest>) {
        self.drain_view_events();
        for request in requests {
            match request {
                ToolRequest::SwitchTool(kind) => self.set_current_tool(kind),
            }
        }
    }

    fn drain_view_events(&mut self) {
        for event in self.view.take_events() {
            match event {
                ViewEvent::RootListChanged => self.push_pending = true,
                ViewEvent::SelectionChanged => {
                    if let Some(hook) = &mut self.selection_hook {
                        hook(&self.view);
                    }
                }
                ViewEvent::EntityDeleted(entity) => {
                    self.hovered.retain(|h| !Rc::ptr_eq(h, &entity));
                    if let Some(tool) = &mut self.tool {
                        tool.notify_entity_deleted(&entity);
                    }
                }
            }
        }
    }

    /// Diff the set of root entities under the pointer against the previous
    /// set and fire the synthetic entity mouse-out/mouse-in transitions.
    fn sync_hover(&mut self, pos: Point2) {
        let current: Vec<EntityRef> = self
            .view
            .root_entities()
            .iter()
            .filter(|e| e.borrow().contains_pointer_position(&self.view, pos))
            .cloned()
            .collect();

        let outs: Vec<EntityRef> = self
            .hovered
            .iter()
            .filter(|h| !current.iter().any(|c| Rc::ptr_eq(c, h)))
            .cloned()
            .collect();
        let ins: Vec<EntityRef> = current
            .iter()
            .filter(|c| !self.hovered.iter().any(|h| Rc::ptr_eq(c, h)))
            .cloned()
            .collect();
        self.hovered = current;

        for entity in &outs {
            self.dispatch(|tool, ctx| tool.on_entity_mouse_out(ctx, entity));
        }
        for entity in &ins {
            self.dispatch(|tool, ctx| tool.on_entity_mouse_in(ctx, entity));
        }
    }

    // ========================================================================
    // Host input events
    // ========================================================================

    /// Pointer moved. While a button is held this is a drag; otherwise the
    /// first move inside the working area switches the tool in, and later
    /// moves update hover state and forward to the tool.
    pub fn pointer_move(&mut self, pos: Point2, mods: Mods) {
        self.last_pos = Some(pos);
        if self.button_down {
            self.dispatch(|tool, ctx| tool.on_drag(ctx, pos, mods));
        } else if !self.mouse_within {
            self.mouse_within = true;
            self.dispatch(|tool, ctx| tool.on_switch_in(ctx, pos));
        } else {
            self.sync_hover(pos);
            self.dispatch(|tool, ctx| tool.on_move(ctx, pos));
        }
    }

    /// Pointer left the working area. Hovered entities get their mouse-out
    /// before the tool is switched out, and the keyboard hook disarms.
    pub fn pointer_leave(&mut self, pos: Point2) {
        if !self.mouse_within {
            return;
        }
        let hovered = std::mem::take(&mut self.hovered);
        for entity in &hovered {
            self.dispatch(|tool, ctx| tool.on_entity_mouse_out(ctx, entity));
        }
        self.dispatch(|tool, ctx| tool.on_switch_out(ctx, pos));
        self.mouse_within = false;
        self.button_down = false;
        self.last_pos = None;
    }

    pub fn button_down(&mut self, pos: Point2, mods: Mods) {
        self.last_pos = Some(pos);
        self.button_down = true;
        self.dispatch(|tool, ctx| tool.on_button_down(ctx, pos, mods));
    }

    pub fn button_up(&mut self, pos: Point2, mods: Mods) {
        self.button_down = false;
        self.dispatch(|tool, ctx| tool.on_button_up(ctx, pos, mods));
    }

    pub fn left_click(&mut self, pos: Point2, mods: Mods) {
        self.dispatch(|tool, ctx| tool.on_left_click(ctx, pos, mods));
    }

    /// Cancel gesture (right click or escape).
    pub fn cancel(&mut self, pos: Point2) -> bool {
        self.dispatch(|tool, ctx| tool.on_cancel(ctx, pos))
            .unwrap_or(false)
    }

    pub fn wheel(&mut self, pos: Point2, dx: f64, dy: f64) -> bool {
        self.dispatch(|tool, ctx| tool.on_wheel(ctx, pos, dx, dy))
            .unwrap_or(false)
    }

    /// Keyboard input. Only armed while the pointer is inside the working
    /// area. The tool gets first refusal; an unconsumed delete destroys the
    /// selection.
    pub fn key_down(&mut self, key: Key) -> bool {
        if !self.mouse_within {
            return false;
        }
        if self
            .dispatch(|tool, ctx| tool.on_key_down(ctx, key))
            .unwrap_or(false)
        {
            return true;
        }
        if key == Key::Delete {
            self.delete_selection();
            return true;
        }
        false
    }

    // ========================================================================
    // Segmentation round trip
    // ========================================================================

    /// A segmentation result arrived from the host.
    pub fn dextr_success(&mut self, dextr_id: u64, regions: Vec<Vec<Point2>>) {
        self.dextr.resolve(&mut self.view, dextr_id, regions);
        self.drain_view_events();
    }

    /// Polling tick; forwards outstanding request ids to the transport.
    pub fn poll_tick(&mut self) {
        self.dextr.poll(self.transport.as_mut());
    }

    pub fn open_dextr_requests(&self) -> Vec<u64> {
        self.dextr.open_ids()
    }

    // ========================================================================
    // Direct editing surface (host buttons and menus)
    // ========================================================================

    pub fn select_entity(&mut self, entity: &EntityRef, multi_select: bool, invert: bool) {
        self.view.select_entity(entity, multi_select, invert);
        self.drain_view_events();
    }

    pub fn unselect_all(&mut self) {
        self.view.unselect_all_entities();
        self.drain_view_events();
    }

    pub fn delete_selection(&mut self) {
        self.view.delete_selection();
        self.drain_view_events();
    }

    pub fn set_selection_label_class(&mut self, label_class: Option<String>) {
        self.view.set_selection_label_class(label_class);
        self.drain_view_events();
    }

    pub fn set_task_complete(&mut self, task: &str, complete: bool) {
        self.view.set_task_complete(task, complete);
        self.drain_view_events();
    }

    /// Group the selected labels; the new group becomes the selection.
    pub fn create_group_from_selection(&mut self) -> Option<EntityRef> {
        let label_class = self.classes.class_for_new_label();
        let group = self.view.create_group_label_from_selection(label_class);
        if let Some(group) = &group {
            self.view.select_entity(group, false, false);
        }
        self.drain_view_events();
        group
    }

    /// Create a composite referencing the selected labels.
    pub fn create_composite_from_selection(&mut self) -> Option<EntityRef> {
        let label_class = self.classes.class_for_new_label();
        let composite = self.view.create_composite_label_from_selection(label_class);
        self.drain_view_events();
        composite
    }

    /// Merge the selected polygons into one; the merged label becomes the
    /// selection.
    pub fn merge_selected_polygons(&mut self) -> Option<EntityRef> {
        let merged = merge_polygonal_labels(&mut self.view);
        if let Some(entity) = &merged {
            self.view.select_entity(entity, false, false);
        }
        self.drain_view_events();
        merged
    }
}
