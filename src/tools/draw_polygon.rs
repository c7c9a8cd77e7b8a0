//! Vertex-by-vertex polygon drawing.

use std::rc::Rc;

use crate::entity::EntityRef;
use crate::math::Point2;
use crate::model::{LabelModel, SOURCE_MANUAL};
use crate::tools::{Mods, Tool, ToolCtx, ToolKind, ToolRequest};

/// Draws a polygon one click at a time.
///
/// The last vertex trails the pointer; each click pins it and starts a new
/// trailing vertex. Cancel removes the trailing vertex and either finalizes
/// the draft or, if too little remains, destroys it. Can be constructed with
/// an existing polygon entity to continue editing its outline.
pub struct DrawPolygonTool {
    entity: Option<EntityRef>,
}

impl DrawPolygonTool {
    pub fn new(entity: Option<EntityRef>) -> Self {
        DrawPolygonTool { entity }
    }

    fn vertex_count(&self) -> usize {
        self.entity
            .as_ref()
            .and_then(|e| {
                e.borrow()
                    .as_polygon()
                    .map(|p| p.model.regions.last().map_or(0, Vec::len))
            })
            .unwrap_or(0)
    }

    /// Mutate the ring being drawn, then refresh the entity and commit.
    fn edit_ring(&self, ctx: &mut ToolCtx<'_>, f: impl FnOnce(&mut Vec<Point2>)) {
        let Some(entity) = &self.entity else {
            return;
        };
        {
            let mut ent = entity.borrow_mut();
            let Some(polygon) = ent.as_polygon_mut() else {
                return;
            };
            if polygon.model.regions.is_empty() {
                polygon.model.regions.push(Vec::new());
            }
            if let Some(ring) = polygon.model.regions.last_mut() {
                f(ring);
            }
            polygon.rebuild_caches();
        }
        ctx.view.commit(entity);
    }

    fn create_entity(&mut self, ctx: &mut ToolCtx<'_>) {
        let label_class = ctx.classes.class_for_new_label();
        let mut model = LabelModel::new_polygon(label_class, SOURCE_MANUAL);
        if let LabelModel::Polygon(p) = &mut model {
            p.regions.push(Vec::new());
        }
        ctx.view.freeze();
        let entity = ctx.view.get_or_create_entity_for_model(&mut model);
        ctx.view.add_child(&entity);
        ctx.view.select_entity(&entity, false, false);
        ctx.view.thaw();
        self.entity = Some(entity);
    }

    fn destroy_entity(&mut self, ctx: &mut ToolCtx<'_>) {
        if let Some(entity) = self.entity.take() {
            ctx.view.freeze();
            ctx.view.destroy_entity(&entity);
            ctx.view.thaw();
        }
    }

    fn add_point(&mut self, ctx: &mut ToolCtx<'_>, pos: Point2) {
        let entity_is_new = self.entity.is_none();
        if entity_is_new {
            self.create_entity(ctx);
        }
        self.edit_ring(ctx, |ring| {
            // A fresh draft needs both the pinned vertex and the trailing one
            if entity_is_new {
                ring.push(pos);
            }
            ring.push(pos);
        });
    }

    fn update_last_point(&mut self, ctx: &mut ToolCtx<'_>, pos: Point2) {
        self.edit_ring(ctx, |ring| {
            if let Some(last) = ring.last_mut() {
                *last = pos;
            }
        });
    }

    fn remove_last_point(&mut self, ctx: &mut ToolCtx<'_>) {
        self.edit_ring(ctx, |ring| {
            ring.pop();
        });
        if self.vertex_count() == 0 {
            self.destroy_entity(ctx);
        }
    }
}

impl Tool for DrawPolygonTool {
    fn on_switch_in(&mut self, ctx: &mut ToolCtx<'_>, pos: Point2) {
        if self.entity.is_some() {
            self.add_point(ctx, pos);
        }
    }

    fn on_switch_out(&mut self, ctx: &mut ToolCtx<'_>, _pos: Point2) {
        if self.entity.is_some() {
            self.remove_last_point(ctx);
        }
    }

    fn on_left_click(&mut self, ctx: &mut ToolCtx<'_>, pos: Point2, _mods: Mods) {
        self.add_point(ctx, pos);
    }

    fn on_move(&mut self, ctx: &mut ToolCtx<'_>, pos: Point2) {
        self.update_last_point(ctx, pos);
    }

    fn on_cancel(&mut self, ctx: &mut ToolCtx<'_>, _pos: Point2) -> bool {
        if self.entity.is_some() {
            self.remove_last_point(ctx);
            if let Some(entity) = self.entity.clone() {
                if self.vertex_count() <= 1 {
                    self.destroy_entity(ctx);
                } else {
                    ctx.view.commit(&entity);
                    self.entity = None;
                }
            }
        } else {
            ctx.view.unselect_all_entities();
            ctx.requests.push(ToolRequest::SwitchTool(ToolKind::Select));
        }
        true
    }

    fn notify_entity_deleted(&mut self, entity: &EntityRef) {
        if self.entity.as_ref().is_some_and(|e| Rc::ptr_eq(e, entity)) {
            self.entity = None;
        }
    }
}
