//! Integration tests across the view, tools and controller.

mod controller_tests;
mod dextr_tests;

use crate::dextr::{DextrRequest, DextrTracker, DextrTransport};
use crate::math::Point2;
use crate::model::{LabelClass, LabelModel, SOURCE_MANUAL, StaticClassRegistry};
use crate::tools::{ToolCtx, ToolRequest, ToolSettings};
use crate::view::RootLabelView;

/// Transport double that records traffic.
#[derive(Default)]
pub(crate) struct FakeTransport {
    pub sent: Vec<DextrRequest>,
    pub polls: Vec<Vec<u64>>,
    pub reject: bool,
}

impl DextrTransport for FakeTransport {
    fn send_request(&mut self, request: &DextrRequest) -> bool {
        if self.reject {
            return false;
        }
        self.sent.push(request.clone());
        true
    }

    fn send_poll(&mut self, dextr_ids: &[u64]) {
        self.polls.push(dextr_ids.to_vec());
    }
}

pub(crate) fn test_registry() -> StaticClassRegistry {
    StaticClassRegistry::new(vec![
        LabelClass::new("tree", "Tree", [0, 255, 0]),
        LabelClass::new("building", "Building", [128, 128, 128]),
    ])
    .with_new_label_class("tree")
}

pub(crate) fn pt(x: f64, y: f64) -> Point2 {
    Point2::new(x, y)
}

pub(crate) fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<Point2> {
    vec![pt(x0, y0), pt(x1, y0), pt(x1, y1), pt(x0, y1)]
}

pub(crate) fn square_polygon_model(
    label_class: Option<&str>,
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
) -> LabelModel {
    let mut model = LabelModel::new_polygon(label_class.map(str::to_string), SOURCE_MANUAL);
    if let LabelModel::Polygon(p) = &mut model {
        p.regions = vec![square(x0, y0, x1, y1)];
    }
    model
}

/// Bundles everything a [`ToolCtx`] borrows, for driving tools directly.
pub(crate) struct Session {
    pub view: RootLabelView,
    pub settings: ToolSettings,
    pub classes: StaticClassRegistry,
    pub dextr: DextrTracker,
    pub transport: FakeTransport,
    pub requests: Vec<ToolRequest>,
}

impl Session {
    pub fn new() -> Self {
        Session {
            view: RootLabelView::new(),
            settings: ToolSettings::default(),
            classes: test_registry(),
            dextr: DextrTracker::new(),
            transport: FakeTransport::default(),
            requests: Vec::new(),
        }
    }

    pub fn ctx(&mut self) -> ToolCtx<'_> {
        ToolCtx {
            view: &mut self.view,
            settings: &self.settings,
            classes: &self.classes,
            dextr: &mut self.dextr,
            transport: &mut self.transport,
            requests: &mut self.requests,
        }
    }
}
