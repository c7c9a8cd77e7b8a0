//! Tool state machines.
//!
//! Exactly one tool is active at a time. The controller routes input events
//! to it together with a [`ToolCtx`] giving access to the view and session
//! services. Tools request side effects that outlive the event (switching
//! tools) through the context's request queue rather than performing them
//! re-entrantly.

mod dextr_tool;
mod draw_ellipse;
mod draw_polygon;
mod edit_poly;
mod select;

pub use dextr_tool::DextrTool;
pub use draw_ellipse::DrawOrientedEllipseTool;
pub use draw_polygon::DrawPolygonTool;
pub use edit_poly::{
    BooleanMode, DrawBrushTool, DrawSinglePolygonTool, EditPolyTool, make_brush_poly,
};
pub use select::{BrushSelectEntityTool, SelectEntityTool};

use serde::Deserialize;

use crate::constants::{DEFAULT_BRUSH_KEY_RATE, DEFAULT_BRUSH_WHEEL_RATE};
use crate::dextr::{DextrTracker, DextrTransport};
use crate::entity::EntityRef;
use crate::math::Point2;
use crate::model::LabelClassRegistry;
use crate::view::RootLabelView;

/// Keyboard keys the tools react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    LeftBracket,
    RightBracket,
    Slash,
    Backslash,
    Comma,
    Delete,
}

/// Modifier state accompanying pointer events.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mods {
    pub shift: bool,
}

/// The tools available for activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Select,
    BrushSelect,
    DrawPolygon,
    EditPoly,
    DrawOrientedEllipse,
    Dextr,
}

/// Deferred side effects requested by a tool during an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolRequest {
    SwitchTool(ToolKind),
}

/// Tunable tool behaviour, typically loaded from host configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    /// Scale applied to wheel deltas when resizing the draw brush.
    pub brush_wheel_rate: f64,
    /// Step applied per bracket-key press when resizing the draw brush.
    pub brush_key_rate: f64,
    /// Polling interval hint for assisted segmentation, in milliseconds.
    /// `None` disables polling (push-style hosts).
    pub dextr_polling_interval_ms: Option<u64>,
}

impl Default for ToolSettings {
    fn default() -> Self {
        ToolSettings {
            brush_wheel_rate: DEFAULT_BRUSH_WHEEL_RATE,
            brush_key_rate: DEFAULT_BRUSH_KEY_RATE,
            dextr_polling_interval_ms: None,
        }
    }
}

/// Everything a tool may touch while handling an event.
pub struct ToolCtx<'a> {
    pub view: &'a mut RootLabelView,
    pub settings: &'a ToolSettings,
    pub classes: &'a dyn LabelClassRegistry,
    pub dextr: &'a mut DextrTracker,
    pub transport: &'a mut dyn DextrTransport,
    pub requests: &'a mut Vec<ToolRequest>,
}

/// A tool's event interface. All handlers default to no-ops; boolean
/// handlers return whether the event was consumed.
#[allow(unused_variables)]
pub trait Tool {
    fn on_init(&mut self, ctx: &mut ToolCtx<'_>) {}
    fn on_shutdown(&mut self, ctx: &mut ToolCtx<'_>) {}

    /// Pointer entered the working area (or the tool became active while
    /// the pointer was inside).
    fn on_switch_in(&mut self, ctx: &mut ToolCtx<'_>, pos: Point2) {}
    fn on_switch_out(&mut self, ctx: &mut ToolCtx<'_>, pos: Point2) {}

    fn on_left_click(&mut self, ctx: &mut ToolCtx<'_>, pos: Point2, mods: Mods) {}
    fn on_cancel(&mut self, ctx: &mut ToolCtx<'_>, pos: Point2) -> bool {
        false
    }
    fn on_button_down(&mut self, ctx: &mut ToolCtx<'_>, pos: Point2, mods: Mods) {}
    fn on_button_up(&mut self, ctx: &mut ToolCtx<'_>, pos: Point2, mods: Mods) {}
    fn on_move(&mut self, ctx: &mut ToolCtx<'_>, pos: Point2) {}
    fn on_drag(&mut self, ctx: &mut ToolCtx<'_>, pos: Point2, mods: Mods) -> bool {
        false
    }
    fn on_wheel(&mut self, ctx: &mut ToolCtx<'_>, pos: Point2, dx: f64, dy: f64) -> bool {
        false
    }
    fn on_key_down(&mut self, ctx: &mut ToolCtx<'_>, key: Key) -> bool {
        false
    }

    fn on_entity_mouse_in(&mut self, ctx: &mut ToolCtx<'_>, entity: &EntityRef) {}
    fn on_entity_mouse_out(&mut self, ctx: &mut ToolCtx<'_>, entity: &EntityRef) {}

    /// An entity was destroyed; tools drop any handle they hold to it.
    fn notify_entity_deleted(&mut self, entity: &EntityRef) {}
}

/// A tool that forwards every event to an optional inner tool, remembering
/// the last pointer position so the inner tool can be swapped mid-session
/// with proper switch-out/switch-in sequencing.
pub struct ProxyTool {
    inner: Option<Box<dyn Tool>>,
    last_pos: Option<Point2>,
}

impl ProxyTool {
    pub fn new(inner: Option<Box<dyn Tool>>) -> Self {
        ProxyTool {
            inner,
            last_pos: None,
        }
    }

    /// Replace the inner tool, shutting the old one down and initializing
    /// the new one in place.
    pub fn set_underlying_tool(&mut self, ctx: &mut ToolCtx<'_>, tool: Option<Box<dyn Tool>>) {
        if let Some(old) = &mut self.inner {
            if let Some(pos) = self.last_pos {
                old.on_switch_out(ctx, pos);
            }
            old.on_shutdown(ctx);
        }
        self.inner = tool;
        if let Some(new) = &mut self.inner {
            new.on_init(ctx);
            if let Some(pos) = self.last_pos {
                new.on_switch_in(ctx, pos);
            }
        }
    }
}

impl Tool for ProxyTool {
    fn on_init(&mut self, ctx: &mut ToolCtx<'_>) {
        if let Some(inner) = &mut self.inner {
            inner.on_init(ctx);
        }
    }

    fn on_shutdown(&mut self, ctx: &mut ToolCtx<'_>) {
        if let Some(inner) = &mut self.inner {
            inner.on_shutdown(ctx);
        }
    }

    fn on_switch_in(&mut self, ctx: &mut ToolCtx<'_>, pos: Point2) {
        self.last_pos = Some(pos);
        if let Some(inner) = &mut self.inner {
            inner.on_switch_in(ctx, pos);
        }
    }

    fn on_switch_out(&mut self, ctx: &mut ToolCtx<'_>, pos: Point2) {
        if let Some(inner) = &mut self.inner {
            inner.on_switch_out(ctx, pos);
        }
        self.last_pos = None;
    }

    fn on_left_click(&mut self, ctx: &mut ToolCtx<'_>, pos: Point2, mods: Mods) {
        self.last_pos = Some(pos);
        if let Some(inner) = &mut self.inner {
            inner.on_left_click(ctx, pos, mods);
        }
    }

    fn on_cancel(&mut self, ctx: &mut ToolCtx<'_>, pos: Point2) -> bool {
        self.last_pos = Some(pos);
        match &mut self.inner {
            Some(inner) => inner.on_cancel(ctx, pos),
            None => false,
        }
    }

    fn on_button_down(&mut self, ctx: &mut ToolCtx<'_>, pos: Point2, mods: Mods) {
        self.last_pos = Some(pos);
        if let Some(inner) = &mut self.inner {
            inner.on_button_down(ctx, pos, mods);
        }
    }

    fn on_button_up(&mut self, ctx: &mut ToolCtx<'_>, pos: Point2, mods: Mods) {
        self.last_pos = Some(pos);
        if let Some(inner) = &mut self.inner {
            inner.on_button_up(ctx, pos, mods);
        }
    }

    fn on_move(&mut self, ctx: &mut ToolCtx<'_>, pos: Point2) {
        self.last_pos = Some(pos);
        if let Some(inner) = &mut self.inner {
            inner.on_move(ctx, pos);
        }
    }

    fn on_drag(&mut self, ctx: &mut ToolCtx<'_>, pos: Point2, mods: Mods) -> bool {
        self.last_pos = Some(pos);
        match &mut self.inner {
            Some(inner) => inner.on_drag(ctx, pos, mods),
            None => false,
        }
    }

    fn on_wheel(&mut self, ctx: &mut ToolCtx<'_>, pos: Point2, dx: f64, dy: f64) -> bool {
        self.last_pos = Some(pos);
        match &mut self.inner {
            Some(inner) => inner.on_wheel(ctx, pos, dx, dy),
            None => false,
        }
    }

    fn on_key_down(&mut self, ctx: &mut ToolCtx<'_>, key: Key) -> bool {
        match &mut self.inner {
            Some(inner) => inner.on_key_down(ctx, key),
            None => false,
        }
    }

    fn on_entity_mouse_in(&mut self, ctx: &mut ToolCtx<'_>, entity: &EntityRef) {
        if let Some(inner) = &mut self.inner {
            inner.on_entity_mouse_in(ctx, entity);
        }
    }

    fn on_entity_mouse_out(&mut self, ctx: &mut ToolCtx<'_>, entity: &EntityRef) {
        if let Some(inner) = &mut self.inner {
            inner.on_entity_mouse_out(ctx, entity);
        }
    }

    fn notify_entity_deleted(&mut self, entity: &EntityRef) {
        if let Some(inner) = &mut self.inner {
            inner.notify_entity_deleted(entity);
        }
    }
}
