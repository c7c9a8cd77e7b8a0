//! Boolean polygon editing: draft shapes combined with an existing polygon.
//!
//! [`EditPolyTool`] wraps one of two draft sub-tools behind a
//! [`ProxyTool`]: a single-ring outline drawer and a brush. Completed drafts
//! land in a shared queue; after forwarding each event the edit tool drains
//! the queue and applies every draft to its target entity under the current
//! boolean mode.

use std::cell::RefCell;
use std::rc::Rc;

use crate::constants::{BRUSH_SEGMENTS, DEFAULT_BRUSH_RADIUS, MIN_BRUSH_RADIUS};
use crate::entity::EntityRef;
use crate::math::Point2;
use crate::model::{LabelModel, SOURCE_MANUAL};
use crate::polyops::{self, Regions};
use crate::tools::{Key, Mods, ProxyTool, Tool, ToolCtx, ToolKind, ToolRequest};

/// Completed drafts handed from a sub-tool to the edit tool that owns it.
pub type DraftQueue = Rc<RefCell<Vec<Regions>>>;

/// How a completed draft combines with the target entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BooleanMode {
    /// The draft becomes a new label, which becomes the target.
    #[default]
    New,
    /// Union the draft into the target.
    Add,
    /// Subtract the draft from the target; an emptied target is destroyed.
    Subtract,
    /// Carve the draft's overlap out of the target into a separate label.
    /// Applies only when both sides of the cut are non-empty.
    Split,
}

impl BooleanMode {
    /// The '/' key cycles through the three common modes.
    fn cycled(self) -> BooleanMode {
        match self {
            BooleanMode::New => BooleanMode::Add,
            BooleanMode::Add => BooleanMode::Subtract,
            BooleanMode::Subtract | BooleanMode::Split => BooleanMode::New,
        }
    }
}

// ============================================================================
// Outline sub-tool
// ============================================================================

/// Draws a single closed ring, vertex by vertex, as a draft.
///
/// Same trailing-vertex interaction as the standalone polygon tool, but the
/// result goes to the draft queue instead of an entity.
pub struct DrawSinglePolygonTool {
    vertices: Vec<Point2>,
    drafts: DraftQueue,
}

impl DrawSinglePolygonTool {
    pub fn new(drafts: DraftQueue) -> Self {
        DrawSinglePolygonTool {
            vertices: Vec::new(),
            drafts,
        }
    }
}

impl Tool for DrawSinglePolygonTool {
    fn on_switch_in(&mut self, _ctx: &mut ToolCtx<'_>, pos: Point2) {
        self.vertices.push(pos);
    }

    fn on_switch_out(&mut self, _ctx: &mut ToolCtx<'_>, _pos: Point2) {
        self.vertices.pop();
    }

    fn on_left_click(&mut self, _ctx: &mut ToolCtx<'_>, pos: Point2, _mods: Mods) {
        self.vertices.push(pos);
    }

    fn on_move(&mut self, _ctx: &mut ToolCtx<'_>, pos: Point2) {
        if let Some(last) = self.vertices.last_mut() {
            *last = pos;
        }
    }

    fn on_drag(&mut self, _ctx: &mut ToolCtx<'_>, pos: Point2, mods: Mods) -> bool {
        if mods.shift {
            self.vertices.push(pos);
            return true;
        }
        false
    }

    fn on_cancel(&mut self, _ctx: &mut ToolCtx<'_>, pos: Point2) -> bool {
        self.vertices.pop();
        if self.vertices.len() >= 3 {
            self.drafts.borrow_mut().push(vec![self.vertices.clone()]);
        }
        let handled = !self.vertices.is_empty();
        self.vertices.clear();
        self.vertices.push(pos);
        handled
    }
}

// ============================================================================
// Brush sub-tool
// ============================================================================

/// Capsule polygon covering a brush step from `start` to `end`.
///
/// Points are sampled around a circle; each offset attaches to whichever
/// endpoint it leads (positive dot product with the motion) or trails, which
/// traces both end caps joined by the stroke edges.
pub fn make_brush_poly(start: Point2, end: Point2, radius: f64) -> Vec<Point2> {
    let delta = end - start;
    let n = BRUSH_SEGMENTS * 2;
    let mut poly = Vec::with_capacity(n);
    for i in 0..n {
        let angle = (i as f64 / n as f64) * std::f64::consts::TAU;
        let offset = Point2::new(angle.cos(), angle.sin()) * radius;
        let centre = if offset.dot(delta) >= 0.0 { end } else { start };
        poly.push(centre + offset);
    }
    poly
}

/// Paints a draft region with a round brush.
///
/// Each drag step unions a capsule into the stroke; releasing the button
/// completes the draft.
pub struct DrawBrushTool {
    stroke: Regions,
    last_pos: Option<Point2>,
    radius: f64,
    drafts: DraftQueue,
}

impl DrawBrushTool {
    pub fn new(drafts: DraftQueue) -> Self {
        DrawBrushTool {
            stroke: Regions::new(),
            last_pos: None,
            radius: DEFAULT_BRUSH_RADIUS,
            drafts,
        }
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    fn resize(&mut self, delta: f64) {
        self.radius = (self.radius + delta).max(MIN_BRUSH_RADIUS);
    }
}

impl Tool for DrawBrushTool {
    fn on_button_down(&mut self, _ctx: &mut ToolCtx<'_>, pos: Point2, _mods: Mods) {
        self.last_pos = Some(pos);
    }

    fn on_button_up(&mut self, _ctx: &mut ToolCtx<'_>, _pos: Point2, _mods: Mods) {
        self.last_pos = None;
        if !self.stroke.is_empty() {
            let stroke = std::mem::take(&mut self.stroke);
            self.drafts.borrow_mut().push(stroke);
        }
    }

    fn on_drag(&mut self, _ctx: &mut ToolCtx<'_>, pos: Point2, _mods: Mods) -> bool {
        let Some(last) = self.last_pos else {
            return false;
        };
        let step = vec![make_brush_poly(last, pos, self.radius)];
        self.stroke = polyops::union(&self.stroke, &step);
        self.last_pos = Some(pos);
        true
    }

    fn on_wheel(&mut self, ctx: &mut ToolCtx<'_>, _pos: Point2, _dx: f64, dy: f64) -> bool {
        self.resize(dy * ctx.settings.brush_wheel_rate);
        true
    }

    fn on_key_down(&mut self, ctx: &mut ToolCtx<'_>, key: Key) -> bool {
        match key {
            Key::LeftBracket => {
                self.resize(-ctx.settings.brush_key_rate);
                true
            }
            Key::RightBracket => {
                self.resize(ctx.settings.brush_key_rate);
                true
            }
            _ => false,
        }
    }

    fn on_cancel(&mut self, _ctx: &mut ToolCtx<'_>, _pos: Point2) -> bool {
        // Abandon an in-progress stroke
        if self.last_pos.is_some() || !self.stroke.is_empty() {
            self.last_pos = None;
            self.stroke.clear();
            return true;
        }
        false
    }
}

// ============================================================================
// Edit tool
// ============================================================================

/// Which sub-tool is drawing drafts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubToolKind {
    Outline,
    Brush,
}

/// Boolean polygon editor.
///
/// Key bindings while active: '/' cycles new/add/subtract, '\\' switches to
/// split, ',' swaps the outline and brush sub-tools. Cancel finishes the
/// current draft first; a further cancel releases the target entity, and one
/// more falls back to the select tool.
pub struct EditPolyTool {
    entity: Option<EntityRef>,
    boolean_mode: BooleanMode,
    sub_tool: SubToolKind,
    proxy: ProxyTool,
    drafts: DraftQueue,
}

impl EditPolyTool {
    /// `entity` is the polygon to edit; `None` starts from scratch with the
    /// first draft creating the target.
    pub fn new(entity: Option<EntityRef>) -> Self {
        let drafts: DraftQueue = Rc::new(RefCell::new(Vec::new()));
        let inner = DrawSinglePolygonTool::new(drafts.clone());
        EditPolyTool {
            entity,
            boolean_mode: BooleanMode::default(),
            sub_tool: SubToolKind::Outline,
            proxy: ProxyTool::new(Some(Box::new(inner))),
            drafts,
        }
    }

    pub fn boolean_mode(&self) -> BooleanMode {
        self.boolean_mode
    }

    pub fn set_boolean_mode(&mut self, mode: BooleanMode) {
        self.boolean_mode = mode;
    }

    fn swap_sub_tool(&mut self, ctx: &mut ToolCtx<'_>) {
        let (kind, tool): (SubToolKind, Box<dyn Tool>) = match self.sub_tool {
            SubToolKind::Outline => (
                SubToolKind::Brush,
                Box::new(DrawBrushTool::new(self.drafts.clone())),
            ),
            SubToolKind::Brush => (
                SubToolKind::Outline,
                Box::new(DrawSinglePolygonTool::new(self.drafts.clone())),
            ),
        };
        self.sub_tool = kind;
        self.proxy.set_underlying_tool(ctx, Some(tool));
    }

    fn target_regions(&self) -> Option<Regions> {
        self.entity
            .as_ref()
            .and_then(|e| e.borrow().as_polygon().map(|p| p.model.regions.clone()))
    }

    fn set_target_regions(&self, ctx: &mut ToolCtx<'_>, regions: Regions) {
        if let Some(entity) = &self.entity {
            {
                let mut ent = entity.borrow_mut();
                if let Some(polygon) = ent.as_polygon_mut() {
                    polygon.model.regions = regions;
                    // A hand edit overrides any automatic provenance
                    polygon.model.meta.source = SOURCE_MANUAL.to_string();
                    polygon.rebuild_caches();
                }
            }
            ctx.view.commit(entity);
        }
    }

    fn create_target(&mut self, ctx: &mut ToolCtx<'_>, regions: Regions) {
        let label_class = ctx.classes.class_for_new_label();
        let mut model = LabelModel::new_polygon(label_class, SOURCE_MANUAL);
        if let LabelModel::Polygon(p) = &mut model {
            p.regions = regions;
        }
        let entity = ctx.view.get_or_create_entity_for_model(&mut model);
        ctx.view.add_child(&entity);
        ctx.view.select_entity(&entity, false, false);
        self.entity = Some(entity);
    }

    fn apply_draft(&mut self, ctx: &mut ToolCtx<'_>, draft: Regions) {
        match self.boolean_mode {
            BooleanMode::New => self.create_target(ctx, draft),
            BooleanMode::Add => match self.target_regions() {
                Some(existing) => {
                    let merged = polyops::union(&existing, &draft);
                    self.set_target_regions(ctx, merged);
                }
                None => self.create_target(ctx, draft),
            },
            BooleanMode::Subtract => {
                if let Some(existing) = self.target_regions() {
                    let remaining = polyops::difference(&existing, &draft);
                    if remaining.is_empty() {
                        if let Some(entity) = self.entity.take() {
                            ctx.view.destroy_entity(&entity);
                        }
                    } else {
                        self.set_target_regions(ctx, remaining);
                    }
                }
            }
            BooleanMode::Split => {
                if let Some(existing) = self.target_regions() {
                    let remaining = polyops::difference(&existing, &draft);
                    let split_off = polyops::intersection(&existing, &draft);
                    if !remaining.is_empty() && !split_off.is_empty() {
                        let label_class = self
                            .entity
                            .as_ref()
                            .and_then(|e| e.borrow().meta().label_class.clone());
                        self.set_target_regions(ctx, remaining);
                        let mut model = LabelModel::new_polygon(label_class, SOURCE_MANUAL);
                        if let LabelModel::Polygon(p) = &mut model {
                            p.regions = split_off;
                        }
                        let entity = ctx.view.get_or_create_entity_for_model(&mut model);
                        ctx.view.add_child(&entity);
                    }
                }
            }
        }
    }

    fn apply_drafts(&mut self, ctx: &mut ToolCtx<'_>) {
        loop {
            let draft = self.drafts.borrow_mut().pop();
            match draft {
                Some(draft) => self.apply_draft(ctx, draft),
                None => break,
            }
        }
    }
}

impl Tool for EditPolyTool {
    fn on_init(&mut self, ctx: &mut ToolCtx<'_>) {
        self.proxy.on_init(ctx);
    }

    fn on_shutdown(&mut self, ctx: &mut ToolCtx<'_>) {
        self.proxy.on_shutdown(ctx);
    }

    fn on_switch_in(&mut self, ctx: &mut ToolCtx<'_>, pos: Point2) {
        self.proxy.on_switch_in(ctx, pos);
    }

    fn on_switch_out(&mut self, ctx: &mut ToolCtx<'_>, pos: Point2) {
        self.proxy.on_switch_out(ctx, pos);
    }

    fn on_left_click(&mut self, ctx: &mut ToolCtx<'_>, pos: Point2, mods: Mods) {
        self.proxy.on_left_click(ctx, pos, mods);
        self.apply_drafts(ctx);
    }

    fn on_button_down(&mut self, ctx: &mut ToolCtx<'_>, pos: Point2, mods: Mods) {
        self.proxy.on_button_down(ctx, pos, mods);
    }

    fn on_button_up(&mut self, ctx: &mut ToolCtx<'_>, pos: Point2, mods: Mods) {
        self.proxy.on_button_up(ctx, pos, mods);
        self.apply_drafts(ctx);
    }

    fn on_move(&mut self, ctx: &mut ToolCtx<'_>, pos: Point2) {
        self.proxy.on_move(ctx, pos);
    }

    fn on_drag(&mut self, ctx: &mut ToolCtx<'_>, pos: Point2, mods: Mods) -> bool {
        let handled = self.proxy.on_drag(ctx, pos, mods);
        self.apply_drafts(ctx);
        handled
    }

    fn on_wheel(&mut self, ctx: &mut ToolCtx<'_>, pos: Point2, dx: f64, dy: f64) -> bool {
        self.proxy.on_wheel(ctx, pos, dx, dy)
    }

    fn on_cancel(&mut self, ctx: &mut ToolCtx<'_>, pos: Point2) -> bool {
        let handled = self.proxy.on_cancel(ctx, pos);
        self.apply_drafts(ctx);
        if handled {
            return true;
        }
        match self.entity.take() {
            Some(entity) => ctx.view.commit(&entity),
            None => {
                ctx.view.unselect_all_entities();
                ctx.requests.push(ToolRequest::SwitchTool(ToolKind::Select));
            }
        }
        true
    }

    fn on_key_down(&mut self, ctx: &mut ToolCtx<'_>, key: Key) -> bool {
        if self.proxy.on_key_down(ctx, key) {
            return true;
        }
        match key {
            Key::Slash => {
                self.boolean_mode = self.boolean_mode.cycled();
                true
            }
            Key::Backslash => {
                self.boolean_mode = BooleanMode::Split;
                true
            }
            Key::Comma => {
                self.swap_sub_tool(ctx);
                true
            }
            _ => false,
        }
    }

    fn notify_entity_deleted(&mut self, entity: &EntityRef) {
        if self.entity.as_ref().is_some_and(|e| Rc::ptr_eq(e, entity)) {
            self.entity = None;
        }
        self.proxy.notify_entity_deleted(entity);
    }
}
