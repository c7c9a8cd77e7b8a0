//! Composite label entities.

use crate::constants::COMPOSITE_BOX_HALF_EXTENT;
use crate::entity::EntityCommon;
use crate::math::{AABox, Point2, centroid_of};
use crate::model::CompositeLabel;
use crate::view::RootLabelView;

/// Live entity for a composite label.
///
/// A composite marks the joint centroid of other labels. Components are
/// referenced weakly by object id: a dangling id contributes nothing, and
/// ids are pruned when their label is destroyed.
#[derive(Debug)]
pub struct CompositeEntity {
    pub model: CompositeLabel,
    pub common: EntityCommon,
}

impl CompositeEntity {
    pub fn new(model: CompositeLabel) -> Self {
        CompositeEntity {
            model,
            common: EntityCommon::default(),
        }
    }

    /// Centroid of the component centroids, resolved through the view at
    /// query time. Components that no longer resolve are skipped.
    pub fn centroid(&self, view: &RootLabelView) -> Option<Point2> {
        let centroids: Vec<Point2> = self
            .model
            .components
            .iter()
            .filter_map(|&id| view.entity_for_object_id(id))
            .filter_map(|e| e.borrow().centroid(view))
            .collect();
        Some(centroid_of(&centroids))
    }

    /// A fixed-size marker box around the centroid.
    pub fn bounding_box(&self, view: &RootLabelView) -> Option<AABox> {
        let c = self.centroid(view)?;
        let half = Point2::new(COMPOSITE_BOX_HALF_EXTENT, COMPOSITE_BOX_HALF_EXTENT);
        Some(AABox::new(c - half, c + half))
    }

    pub fn remove_component(&mut self, object_id: u64) {
        self.model.components.retain(|&id| id != object_id);
    }
}
