//! Group label entities.

use crate::entity::{EntityCommon, EntityRef};
use crate::math::{AABox, Point2};
use crate::model::{GroupLabel, LabelMeta, LabelModel};
use crate::view::RootLabelView;

/// Live entity for a group label.
///
/// A group owns its children outright: they are real entities, registered
/// with the view but not top-level, and they serialize inside the group's
/// model. Child models present at construction are parked in
/// `pending_models` until the group attaches to a view, which turns them
/// into entities.
#[derive(Debug)]
pub struct GroupEntity {
    pub meta: LabelMeta,
    pub children: Vec<EntityRef>,
    pub(crate) pending_models: Vec<LabelModel>,
    pub common: EntityCommon,
}

impl GroupEntity {
    pub fn new(model: GroupLabel) -> Self {
        GroupEntity {
            meta: model.meta,
            children: Vec::new(),
            pending_models: model.component_models,
            common: EntityCommon::default(),
        }
    }

    pub fn to_model(&self) -> LabelModel {
        let mut component_models: Vec<LabelModel> =
            self.children.iter().map(|c| c.borrow().to_model()).collect();
        component_models.extend(self.pending_models.iter().cloned());
        LabelModel::Group(GroupLabel {
            meta: self.meta.clone(),
            component_models,
        })
    }

    /// Union of the children's bounding boxes.
    pub fn bounding_box(&self, view: &RootLabelView) -> Option<AABox> {
        let boxes: Vec<AABox> = self
            .children
            .iter()
            .filter_map(|c| c.borrow().bounding_box(view))
            .collect();
        let union = AABox::union_of(&boxes);
        union.is_valid().then_some(union)
    }

    /// Minimum distance over the children.
    pub fn distance_to_point(&self, view: &RootLabelView, p: Point2) -> Option<f64> {
        self.children
            .iter()
            .filter_map(|c| c.borrow().distance_to_point(view, p))
            .min_by(|a, b| a.total_cmp(b))
    }

    pub fn contains_pointer_position(&self, view: &RootLabelView, p: Point2) -> bool {
        self.children
            .iter()
            .any(|c| c.borrow().contains_pointer_position(view, p))
    }
}
