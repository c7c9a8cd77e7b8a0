//! Oriented ellipse drawing.

use std::rc::Rc;

use crate::constants::ELLIPSE_MINOR_AXIS_FRACTION;
use crate::entity::EntityRef;
use crate::math::Point2;
use crate::model::{LabelModel, SOURCE_MANUAL};
use crate::tools::{Mods, Tool, ToolCtx, ToolKind, ToolRequest};

/// Draws an oriented ellipse from three control points.
///
/// The first two clicks pin the ends of the major axis; until the third
/// click the minor radius is a fixed fraction of the major one. The third
/// click sets the minor radius from the point's offset normal to the axis
/// and finalizes the label. The working point trails the pointer, so the
/// shape previews continuously.
pub struct DrawOrientedEllipseTool {
    entity: Option<EntityRef>,
    points: Vec<Point2>,
}

impl DrawOrientedEllipseTool {
    pub fn new() -> Self {
        DrawOrientedEllipseTool {
            entity: None,
            points: Vec::new(),
        }
    }

    fn create_entity(&mut self, ctx: &mut ToolCtx<'_>, pos: Point2) {
        let label_class = ctx.classes.class_for_new_label();
        let mut model = LabelModel::new_oriented_ellipse(label_class, SOURCE_MANUAL, pos);
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

    /// Re-derive the ellipse parameters from the control points.
    fn update_entity(&self, ctx: &mut ToolCtx<'_>) {
        let Some(entity) = &self.entity else {
            return;
        };
        if self.points.is_empty() {
            return;
        }
        let p0 = self.points[0];
        let p1 = self.points.get(1).copied().unwrap_or(p0);
        let axis = p1 - p0;
        let radius1 = axis.length() * 0.5;
        let radius2 = match self.points.get(2) {
            Some(&p2) => {
                let normal = axis.perp().normalized();
                (normal.dot(p2) - normal.dot(p0)).abs()
            }
            None => radius1 * ELLIPSE_MINOR_AXIS_FRACTION,
        };
        {
            let mut ent = entity.borrow_mut();
            if let crate::entity::LabelEntity::OrientedEllipse(e) = &mut *ent {
                e.model.centre = (p0 + p1) * 0.5;
                e.model.radius1 = radius1;
                e.model.radius2 = radius2;
                e.model.orientation_radians = axis.y.atan2(axis.x);
            }
        }
        ctx.view.commit(entity);
    }

    fn commit_entity(&mut self, ctx: &mut ToolCtx<'_>, pos: Point2) {
        self.update_entity(ctx);
        if let Some(entity) = self.entity.take() {
            ctx.view.select_entity(&entity, false, false);
            ctx.view.commit(&entity);
        }
        self.points.clear();
        self.points.push(pos);
    }
}

impl Default for DrawOrientedEllipseTool {
    fn default() -> Self {
        DrawOrientedEllipseTool::new()
    }
}

impl Tool for DrawOrientedEllipseTool {
    fn on_switch_in(&mut self, ctx: &mut ToolCtx<'_>, pos: Point2) {
        if self.entity.is_some() {
            self.points.push(pos);
            self.update_entity(ctx);
        }
    }

    fn on_switch_out(&mut self, ctx: &mut ToolCtx<'_>, _pos: Point2) {
        if self.entity.is_some() {
            self.points.pop();
            self.update_entity(ctx);
        }
    }

    fn on_left_click(&mut self, ctx: &mut ToolCtx<'_>, pos: Point2, _mods: Mods) {
        if self.entity.is_none() {
            self.create_entity(ctx, pos);
            // Pinned point plus the trailing working point
            self.points.clear();
            self.points.push(pos);
        }
        self.points.push(pos);
        if self.points.len() >= 4 {
            self.commit_entity(ctx, pos);
        } else {
            self.update_entity(ctx);
        }
    }

    fn on_move(&mut self, ctx: &mut ToolCtx<'_>, pos: Point2) {
        if self.entity.is_some() {
            if let Some(last) = self.points.last_mut() {
                *last = pos;
            }
            self.update_entity(ctx);
        }
    }

    fn on_cancel(&mut self, ctx: &mut ToolCtx<'_>, pos: Point2) -> bool {
        if self.entity.is_some() {
            self.destroy_entity(ctx);
            self.points.clear();
            self.points.push(pos);
        } else {
            ctx.view.unselect_all_entities();
            ctx.requests.push(ToolRequest::SwitchTool(ToolKind::Select));
        }
        true
    }

    fn notify_entity_deleted(&mut self, entity: &EntityRef) {
        if self.entity.as_ref().is_some_and(|e| Rc::ptr_eq(e, entity)) {
            self.entity = None;
            self.points.clear();
        }
    }
}
