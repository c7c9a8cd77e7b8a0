//! Assisted segmentation ("extreme points") support.
//!
//! The user places four extreme points (top, left, bottom, right); the
//! segmentation itself runs on the host side. This module tracks the
//! in-progress point placeholder, the open requests and their resolution.
//! All I/O goes through the [`DextrTransport`] trait so the core stays free
//! of any networking.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::constants::DEXTR_POINT_COUNT;
use crate::entity::EntityRef;
use crate::math::Point2;
use crate::model::LabelModel;
use crate::view::RootLabelView;

/// Source tag for labels produced by assisted segmentation.
pub const SOURCE_DEXTR: &str = "auto:dextr";

/// Shared handle to an in-progress point placeholder.
pub type PlaceholderRef = Rc<RefCell<DextrPlaceholder>>;

// ============================================================================
// Corner routing
// ============================================================================

/// Compute the L-shaped path segment from `prev` (the previous extreme
/// point) to a candidate point `p` for segment index `i` (0 = top-to-left,
/// 1 = left-to-bottom, 2 = bottom-to-right, 3 = right-to-top).
///
/// Returns `(corner, clamped)`: the elbow of the L and the candidate point
/// clamped so the path always makes progress in the winding direction.
///
/// Panics if `i > 3`.
pub fn dextr_segment(i: usize, prev: Point2, p: Point2) -> (Point2, Point2) {
    let (corner, cur);
    match i {
        0 => {
            // Top to left
            cur = Point2::new(p.x.min(prev.x - 1.0), p.y.max(prev.y + 1.0));
            corner = Point2::new(cur.x, prev.y);
        }
        1 => {
            // Left to bottom
            cur = Point2::new(p.x.max(prev.x + 1.0), p.y.max(prev.y + 1.0));
            corner = Point2::new(prev.x, cur.y);
        }
        2 => {
            // Bottom to right
            cur = Point2::new(p.x.max(prev.x + 1.0), p.y.min(prev.y - 1.0));
            corner = Point2::new(cur.x, prev.y);
        }
        3 => {
            // Right to top
            cur = Point2::new(p.x.min(prev.x - 1.0), p.y.min(prev.y - 1.0));
            corner = Point2::new(prev.x, cur.y);
        }
        _ => panic!("invalid dextr segment index {i}"),
    }
    (corner, cur)
}

// ============================================================================
// Placeholder
// ============================================================================

/// The in-progress extreme point set. Not a label: it registers with the
/// view as a placeholder so hosts can render it, and is discarded once its
/// request resolves.
#[derive(Debug, Default)]
pub struct DextrPlaceholder {
    pub points: Vec<Point2>,
    pub attached: bool,
}

impl DextrPlaceholder {
    pub fn new() -> PlaceholderRef {
        Rc::new(RefCell::new(DextrPlaceholder::default()))
    }

    pub fn n_points(&self) -> usize {
        self.points.len()
    }

    pub fn first_point(&self) -> Option<Point2> {
        self.points.first().copied()
    }

    pub fn last_point(&self) -> Option<Point2> {
        self.points.last().copied()
    }

    pub fn add_point(&mut self, p: Point2) {
        self.points.push(p);
    }

    pub fn remove_last_point(&mut self) {
        self.points.pop();
    }

    /// The L-path segment from the last placed point towards `p`; no corner
    /// when no point has been placed yet.
    pub fn segment_at_end(&self, p: Point2) -> (Option<Point2>, Point2) {
        match self.points.last() {
            None => (None, p),
            Some(&prev) => {
                let (corner, cur) = dextr_segment(self.points.len() - 1, prev, p);
                (Some(corner), cur)
            }
        }
    }

    /// The corner-routed outline through the placed points, closing the loop
    /// once all four are present. For host-side rendering.
    pub fn outline_path(&self) -> Vec<Point2> {
        let mut path: Vec<Point2> = self.points.iter().take(1).copied().collect();
        for i in 1..self.points.len() {
            let (corner, cur) = dextr_segment(i - 1, path[path.len() - 1], self.points[i]);
            path.push(corner);
            path.push(cur);
        }
        if self.points.len() == DEXTR_POINT_COUNT {
            let (corner, cur) = dextr_segment(3, path[path.len() - 1], self.points[0]);
            path.push(corner);
            path.push(cur);
        }
        path
    }
}

/// Register a placeholder with the view and mark it attached.
pub fn attach_placeholder(view: &mut RootLabelView, placeholder: &PlaceholderRef) {
    view.register_placeholder(placeholder);
    placeholder.borrow_mut().attached = true;
}

/// Unregister an attached placeholder. No-op if already detached.
pub fn detach_placeholder(view: &mut RootLabelView, placeholder: &PlaceholderRef) {
    if placeholder.borrow().attached {
        view.unregister_placeholder(placeholder);
        placeholder.borrow_mut().attached = false;
    }
}

// ============================================================================
// Requests
// ============================================================================

/// A segmentation request handed to the transport.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DextrRequest {
    pub image_id: String,
    pub dextr_id: u64,
    pub dextr_points: Vec<Point2>,
}

/// Host-side dispatch of segmentation requests and polls.
pub trait DextrTransport {
    /// Dispatch a request. Returns false if the request could not be sent.
    fn send_request(&mut self, request: &DextrRequest) -> bool;

    /// Ask the host to poll for results of the given outstanding requests.
    fn send_poll(&mut self, dextr_ids: &[u64]);
}

#[derive(Debug)]
struct OpenRequest {
    label_class: Option<String>,
    placeholder: PlaceholderRef,
}

/// Tracks open segmentation requests across their round trip.
///
/// Request ids are session-unique and monotonic. Polling is flagged active
/// while requests are outstanding; the host drives the actual schedule and
/// calls [`poll`](Self::poll) on each tick.
pub struct DextrTracker {
    next_id: u64,
    open: BTreeMap<u64, OpenRequest>,
    polling_active: bool,
}

impl DextrTracker {
    pub fn new() -> Self {
        DextrTracker {
            next_id: 1,
            open: BTreeMap::new(),
            polling_active: false,
        }
    }

    /// Send a request for the placeholder's points. On success the request
    /// is tracked until resolved; on transport rejection it is dropped with
    /// a warning.
    pub fn send(
        &mut self,
        image_id: &str,
        transport: &mut dyn DextrTransport,
        label_class: Option<String>,
        placeholder: &PlaceholderRef,
        enable_polling: bool,
    ) -> Option<u64> {
        let request = DextrRequest {
            image_id: image_id.to_string(),
            dextr_id: self.next_id,
            dextr_points: placeholder.borrow().points.clone(),
        };
        self.next_id += 1;

        if !transport.send_request(&request) {
            log::warn!(
                "segmentation transport rejected request {}",
                request.dextr_id
            );
            return None;
        }
        self.open.insert(
            request.dextr_id,
            OpenRequest {
                label_class,
                placeholder: placeholder.clone(),
            },
        );
        if enable_polling {
            self.polling_active = true;
        }
        Some(request.dextr_id)
    }

    /// Resolve a request with the regions returned by the segmenter.
    ///
    /// If the placeholder is still attached, a non-empty result becomes a
    /// new selected top-level polygon label tagged [`SOURCE_DEXTR`], and the
    /// placeholder is detached either way. A stale placeholder (detached by
    /// an image change) discards the result. Unknown ids are logged and
    /// ignored.
    pub fn resolve(
        &mut self,
        view: &mut RootLabelView,
        dextr_id: u64,
        regions: Vec<Vec<Point2>>,
    ) -> Option<EntityRef> {
        let Some(open) = self.open.remove(&dextr_id) else {
            log::warn!("response for unknown segmentation request {dextr_id}");
            return None;
        };

        let mut created = None;
        if open.placeholder.borrow().attached {
            if !regions.is_empty() {
                let mut model = LabelModel::new_polygon(open.label_class, SOURCE_DEXTR);
                if let LabelModel::Polygon(p) = &mut model {
                    p.regions = regions;
                }
                let entity = view.get_or_create_entity_for_model(&mut model);
                view.add_child(&entity);
                view.select_entity(&entity, false, false);
                created = Some(entity);
            }
            detach_placeholder(view, &open.placeholder);
        }

        if self.open.is_empty() {
            self.polling_active = false;
        }
        created
    }

    /// Poll the transport for all outstanding requests, if polling is
    /// active.
    pub fn poll(&mut self, transport: &mut dyn DextrTransport) {
        if self.polling_active && !self.open.is_empty() {
            let ids: Vec<u64> = self.open.keys().copied().collect();
            transport.send_poll(&ids);
        }
    }

    pub fn open_ids(&self) -> Vec<u64> {
        self.open.keys().copied().collect()
    }

    pub fn polling_active(&self) -> bool {
        self.polling_active
    }
}

impl Default for DextrTracker {
    fn default() -> Self {
        DextrTracker::new()
    }
}
