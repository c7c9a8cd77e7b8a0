//! Selection tools.

use std::rc::Rc;

use crate::constants::MIN_BRUSH_RADIUS;
use crate::entity::EntityRef;
use crate::math::Point2;
use crate::tools::{Key, Mods, Tool, ToolCtx};

/// Point-and-click selection.
///
/// Keeps a stack of the entities under the pointer, hover-highlighting the
/// topmost; a click acts on it. Shift extends the selection, and clicking an
/// already-selected entity with shift toggles it out.
#[derive(Default)]
pub struct SelectEntityTool {
    under_pointer: Vec<EntityRef>,
}

impl SelectEntityTool {
    pub fn new() -> Self {
        SelectEntityTool::default()
    }

    fn top(&self) -> Option<EntityRef> {
        self.under_pointer.last().cloned()
    }

    /// Apply hover transitions after the stack changed.
    fn stack_modified(&mut self, old_top: Option<EntityRef>) {
        let new_top = self.top();
        let same = match (&old_top, &new_top) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        if !same {
            if let Some(old) = old_top {
                old.borrow_mut().set_hovered(false);
            }
            if let Some(new) = new_top {
                new.borrow_mut().set_hovered(true);
            }
        }
    }
}

impl Tool for SelectEntityTool {
    fn on_shutdown(&mut self, _ctx: &mut ToolCtx<'_>) {
        if let Some(top) = self.top() {
            top.borrow_mut().set_hovered(false);
        }
        self.under_pointer.clear();
    }

    fn on_left_click(&mut self, ctx: &mut ToolCtx<'_>, _pos: Point2, mods: Mods) {
        match self.top() {
            Some(entity) => ctx.view.select_entity(&entity, mods.shift, true),
            None => {
                if !mods.shift {
                    ctx.view.unselect_all_entities();
                }
            }
        }
    }

    fn on_entity_mouse_in(&mut self, _ctx: &mut ToolCtx<'_>, entity: &EntityRef) {
        let old_top = self.top();
        self.under_pointer.push(entity.clone());
        self.stack_modified(old_top);
    }

    fn on_entity_mouse_out(&mut self, _ctx: &mut ToolCtx<'_>, entity: &EntityRef) {
        let old_top = self.top();
        self.under_pointer.retain(|e| !Rc::ptr_eq(e, entity));
        self.stack_modified(old_top);
    }

    fn notify_entity_deleted(&mut self, entity: &EntityRef) {
        let old_top = self.top();
        self.under_pointer.retain(|e| !Rc::ptr_eq(e, entity));
        self.stack_modified(old_top);
    }
}

/// Radius-based selection: every top-level entity within the brush radius of
/// the pointer is highlighted, and pressing the button selects the batch.
pub struct BrushSelectEntityTool {
    highlighted: Vec<EntityRef>,
    radius: f64,
}

// Brush-select resize rates are fixed; the configurable rates belong to the
// drawing brush.
const SELECT_WHEEL_RATE: f64 = 0.1;
const SELECT_KEY_RATE: f64 = 2.0;

impl BrushSelectEntityTool {
    pub fn new() -> Self {
        BrushSelectEntityTool {
            highlighted: Vec::new(),
            radius: crate::constants::DEFAULT_BRUSH_RADIUS,
        }
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    fn entities_in_range(&self, ctx: &ToolCtx<'_>, pos: Point2) -> Vec<EntityRef> {
        ctx.view
            .root_entities()
            .iter()
            .filter(|e| {
                e.borrow()
                    .distance_to_point(ctx.view, pos)
                    .is_some_and(|d| d <= self.radius)
            })
            .cloned()
            .collect()
    }

    fn highlight(&mut self, entities: Vec<EntityRef>) {
        for entity in &self.highlighted {
            entity.borrow_mut().set_hovered(false);
        }
        for entity in &entities {
            entity.borrow_mut().set_hovered(true);
        }
        self.highlighted = entities;
    }

    fn resize(&mut self, delta: f64) {
        self.radius = (self.radius + delta).max(MIN_BRUSH_RADIUS);
    }
}

impl Default for BrushSelectEntityTool {
    fn default() -> Self {
        BrushSelectEntityTool::new()
    }
}

impl Tool for BrushSelectEntityTool {
    fn on_shutdown(&mut self, _ctx: &mut ToolCtx<'_>) {
        self.highlight(Vec::new());
    }

    fn on_switch_in(&mut self, ctx: &mut ToolCtx<'_>, pos: Point2) {
        let in_range = self.entities_in_range(ctx, pos);
        self.highlight(in_range);
    }

    fn on_switch_out(&mut self, _ctx: &mut ToolCtx<'_>, _pos: Point2) {
        self.highlight(Vec::new());
    }

    fn on_button_down(&mut self, ctx: &mut ToolCtx<'_>, pos: Point2, mods: Mods) {
        self.highlight(Vec::new());
        let in_range = self.entities_in_range(ctx, pos);
        // The first hit replaces the selection unless shift is held; the
        // rest of the batch always extends it.
        for (i, entity) in in_range.iter().enumerate() {
            ctx.view.select_entity(entity, mods.shift || i > 0, false);
        }
    }

    fn on_button_up(&mut self, ctx: &mut ToolCtx<'_>, pos: Point2, _mods: Mods) {
        let in_range = self.entities_in_range(ctx, pos);
        self.highlight(in_range);
    }

    fn on_move(&mut self, ctx: &mut ToolCtx<'_>, pos: Point2) {
        let in_range = self.entities_in_range(ctx, pos);
        self.highlight(in_range);
    }

    fn on_drag(&mut self, ctx: &mut ToolCtx<'_>, pos: Point2, _mods: Mods) -> bool {
        let in_range = self.entities_in_range(ctx, pos);
        for entity in &in_range {
            ctx.view.select_entity(entity, true, false);
        }
        true
    }

    fn on_wheel(&mut self, _ctx: &mut ToolCtx<'_>, _pos: Point2, _dx: f64, dy: f64) -> bool {
        self.resize(dy * SELECT_WHEEL_RATE);
        true
    }

    fn on_key_down(&mut self, _ctx: &mut ToolCtx<'_>, key: Key) -> bool {
        match key {
            Key::LeftBracket => {
                self.resize(-SELECT_KEY_RATE);
                true
            }
            Key::RightBracket => {
                self.resize(SELECT_KEY_RATE);
                true
            }
            _ => false,
        }
    }

    fn notify_entity_deleted(&mut self, entity: &EntityRef) {
        self.highlighted.retain(|e| !Rc::ptr_eq(e, entity));
    }
}
