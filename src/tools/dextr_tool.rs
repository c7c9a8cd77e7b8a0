//! Extreme-point collection for assisted segmentation.

use crate::constants::DEXTR_POINT_COUNT;
use crate::dextr::{DextrPlaceholder, PlaceholderRef, attach_placeholder, detach_placeholder};
use crate::math::Point2;
use crate::tools::{Mods, Tool, ToolCtx, ToolKind, ToolRequest};

/// Collects the four extreme points of an object (top, left, bottom, right,
/// in that order) and dispatches a segmentation request.
///
/// Each click is clamped by the corner-routing rules so the implied box
/// always winds correctly. Once four points are down the request goes out
/// and a fresh placeholder starts; the sent placeholder stays attached until
/// its request resolves.
pub struct DextrTool {
    state: PlaceholderRef,
}

impl DextrTool {
    pub fn new() -> Self {
        DextrTool {
            state: DextrPlaceholder::new(),
        }
    }

    pub fn placeholder(&self) -> &PlaceholderRef {
        &self.state
    }
}

impl Default for DextrTool {
    fn default() -> Self {
        DextrTool::new()
    }
}

impl Tool for DextrTool {
    fn on_init(&mut self, ctx: &mut ToolCtx<'_>) {
        attach_placeholder(ctx.view, &self.state);
    }

    fn on_shutdown(&mut self, ctx: &mut ToolCtx<'_>) {
        detach_placeholder(ctx.view, &self.state);
    }

    fn on_left_click(&mut self, ctx: &mut ToolCtx<'_>, pos: Point2, _mods: Mods) {
        let (_, clamped) = self.state.borrow().segment_at_end(pos);
        self.state.borrow_mut().add_point(clamped);

        if self.state.borrow().n_points() == DEXTR_POINT_COUNT {
            let image_id = ctx.view.image_id().to_string();
            let label_class = ctx.classes.class_for_new_label();
            let enable_polling = ctx.settings.dextr_polling_interval_ms.is_some();
            ctx.dextr.send(
                &image_id,
                ctx.transport,
                label_class,
                &self.state,
                enable_polling,
            );
            // The sent placeholder now belongs to the open request
            self.state = DextrPlaceholder::new();
            attach_placeholder(ctx.view, &self.state);
        }
    }

    fn on_cancel(&mut self, ctx: &mut ToolCtx<'_>, _pos: Point2) -> bool {
        if self.state.borrow().n_points() > 0 {
            self.state.borrow_mut().remove_last_point();
        } else {
            ctx.requests.push(ToolRequest::SwitchTool(ToolKind::Select));
        }
        true
    }
}
