//! Live label entities.
//!
//! An entity wraps a label model for the duration of a session: it carries
//! interaction state (selection, hover, parentage), answers geometry queries
//! and serializes back to a model on demand. Entities are shared between the
//! view, the tools and group parents as `Rc<RefCell<LabelEntity>>`; identity
//! is pointer identity.

mod composite;
mod ellipse;
mod group;
mod polygon;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

pub use composite::CompositeEntity;
pub use ellipse::OrientedEllipseEntity;
pub use group::GroupEntity;
pub use polygon::{PolygonEntity, merge_polygonal_labels};

use crate::math::{AABox, Point2};
use crate::model::{LabelMeta, LabelModel};
use crate::view::RootLabelView;

/// Shared handle to a live entity.
pub type EntityRef = Rc<RefCell<LabelEntity>>;

/// Weak handle used for child-to-parent links.
pub type WeakEntityRef = Weak<RefCell<LabelEntity>>;

/// Where an entity currently sits in the hierarchy.
#[derive(Debug, Clone, Default)]
pub enum ParentLink {
    /// Not part of the document structure (freshly created or removed).
    #[default]
    Detached,
    /// A top-level label owned by the root view.
    Root,
    /// Owned by a group entity.
    Group(WeakEntityRef),
}

/// Interaction state common to every entity.
#[derive(Debug, Default)]
pub struct EntityCommon {
    /// True while registered with the root view.
    pub attached: bool,
    pub hovered: bool,
    pub selected: bool,
    pub parent: ParentLink,
}

/// Any live label entity.
#[derive(Debug)]
pub enum LabelEntity {
    Polygon(PolygonEntity),
    OrientedEllipse(OrientedEllipseEntity),
    Composite(CompositeEntity),
    Group(GroupEntity),
}

impl LabelEntity {
    /// Build the entity for a model. Group children are held back as pending
    /// models until the group is attached to a view.
    pub fn from_model(model: LabelModel) -> LabelEntity {
        match model {
            LabelModel::Polygon(m) => LabelEntity::Polygon(PolygonEntity::new(m)),
            LabelModel::OrientedEllipse(m) => {
                LabelEntity::OrientedEllipse(OrientedEllipseEntity::new(m))
            }
            LabelModel::Composite(m) => LabelEntity::Composite(CompositeEntity::new(m)),
            LabelModel::Group(m) => LabelEntity::Group(GroupEntity::new(m)),
        }
    }

    pub fn common(&self) -> &EntityCommon {
        match self {
            LabelEntity::Polygon(e) => &e.common,
            LabelEntity::OrientedEllipse(e) => &e.common,
            LabelEntity::Composite(e) => &e.common,
            LabelEntity::Group(e) => &e.common,
        }
    }

    pub fn common_mut(&mut self) -> &mut EntityCommon {
        match self {
            LabelEntity::Polygon(e) => &mut e.common,
            LabelEntity::OrientedEllipse(e) => &mut e.common,
            LabelEntity::Composite(e) => &mut e.common,
            LabelEntity::Group(e) => &mut e.common,
        }
    }

    pub fn meta(&self) -> &LabelMeta {
        match self {
            LabelEntity::Polygon(e) => &e.model.meta,
            LabelEntity::OrientedEllipse(e) => &e.model.meta,
            LabelEntity::Composite(e) => &e.model.meta,
            LabelEntity::Group(e) => &e.meta,
        }
    }

    pub fn meta_mut(&mut self) -> &mut LabelMeta {
        match self {
            LabelEntity::Polygon(e) => &mut e.model.meta,
            LabelEntity::OrientedEllipse(e) => &mut e.model.meta,
            LabelEntity::Composite(e) => &mut e.model.meta,
            LabelEntity::Group(e) => &mut e.meta,
        }
    }

    pub fn object_id(&self) -> Option<u64> {
        self.meta().object_id
    }

    pub fn label_class(&self) -> Option<&str> {
        self.meta().label_class.as_deref()
    }

    /// Set the classification on the underlying model. Callers that need
    /// change notification go through the view instead.
    pub fn set_label_class(&mut self, label_class: Option<String>) {
        self.meta_mut().label_class = label_class;
    }

    /// Serialize back to a model, descendants included.
    pub fn to_model(&self) -> LabelModel {
        match self {
            LabelEntity::Polygon(e) => LabelModel::Polygon(e.model.clone()),
            LabelEntity::OrientedEllipse(e) => LabelModel::OrientedEllipse(e.model.clone()),
            LabelEntity::Composite(e) => LabelModel::Composite(e.model.clone()),
            LabelEntity::Group(e) => e.to_model(),
        }
    }

    /// Recompute cached derived geometry after a model edit.
    pub fn update(&mut self) {
        if let LabelEntity::Polygon(e) = self {
            e.rebuild_caches();
        }
    }

    pub fn centroid(&self, view: &RootLabelView) -> Option<Point2> {
        match self {
            LabelEntity::Polygon(e) => e.centroid(),
            LabelEntity::OrientedEllipse(e) => Some(e.model.centre),
            LabelEntity::Composite(e) => e.centroid(view),
            LabelEntity::Group(e) => e.bounding_box(view).map(|b| b.centre()),
        }
    }

    pub fn bounding_box(&self, view: &RootLabelView) -> Option<AABox> {
        match self {
            LabelEntity::Polygon(e) => e.bounding_box(),
            LabelEntity::OrientedEllipse(e) => Some(e.shape().bounding_box()),
            LabelEntity::Composite(e) => e.bounding_box(view),
            LabelEntity::Group(e) => e.bounding_box(view),
        }
    }

    /// Distance from a pointer position, or `None` when the entity has no
    /// hit-testable geometry.
    pub fn distance_to_point(&self, view: &RootLabelView, p: Point2) -> Option<f64> {
        match self {
            LabelEntity::Polygon(e) => e.distance_to_point(p),
            LabelEntity::OrientedEllipse(e) => Some(e.shape().distance_to_point(p)),
            LabelEntity::Composite(_) => None,
            LabelEntity::Group(e) => e.distance_to_point(view, p),
        }
    }

    pub fn contains_pointer_position(&self, view: &RootLabelView, p: Point2) -> bool {
        match self {
            LabelEntity::Polygon(e) => e.contains_point(p),
            LabelEntity::OrientedEllipse(e) => e.shape().contains_point(p),
            LabelEntity::Composite(e) => e.bounding_box(view).is_some_and(|b| b.contains_point(p)),
            LabelEntity::Group(e) => e.contains_pointer_position(view, p),
        }
    }

    /// Set the selection flag. Groups propagate to their children.
    pub fn set_selected(&mut self, selected: bool) {
        self.common_mut().selected = selected;
        if let LabelEntity::Group(e) = self {
            for child in &e.children {
                child.borrow_mut().set_selected(selected);
            }
        }
    }

    /// Set the hover flag. Groups propagate to their children.
    pub fn set_hovered(&mut self, hovered: bool) {
        self.common_mut().hovered = hovered;
        if let LabelEntity::Group(e) = self {
            for child in &e.children {
                child.borrow_mut().set_hovered(hovered);
            }
        }
    }

    /// Broadcast: some other entity's model was destroyed. Composites drop
    /// dangling component references.
    pub fn notify_model_destroyed(&mut self, object_id: u64) {
        if let LabelEntity::Composite(e) = self {
            e.remove_component(object_id);
        }
    }

    pub fn as_polygon(&self) -> Option<&PolygonEntity> {
        match self {
            LabelEntity::Polygon(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_polygon_mut(&mut self) -> Option<&mut PolygonEntity> {
        match self {
            LabelEntity::Polygon(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, LabelEntity::Group(_))
    }
}

/// Create a shared entity handle for a model.
pub fn new_entity_for_model(model: LabelModel) -> EntityRef {
    Rc::new(RefCell::new(LabelEntity::from_model(model)))
}

/// The label class held most often among `entities`, ties going to the
/// class seen earliest. `None` when the unclassified labels win.
pub fn majority_label_class(entities: &[EntityRef]) -> Option<String> {
    let mut counts: Vec<(Option<String>, usize)> = Vec::new();
    for entity in entities {
        let class = entity.borrow().meta().label_class.clone();
        match counts.iter_mut().find(|(c, _)| *c == class) {
            Some((_, n)) => *n += 1,
            None => counts.push((class, 1)),
        }
    }
    let mut winner = None;
    let mut best = 0;
    for (class, n) in counts {
        if n > best {
            winner = class;
            best = n;
        }
    }
    winner
}

// ============================================================================
// Group structure helpers
// ============================================================================
//
// These operate on shared handles because a child's parent link holds a weak
// reference to the group it joins.

/// Add `child` to `group`, taking ownership of its place in the hierarchy.
///
/// Panics if `group` is not a group entity.
pub fn group_add_child(group: &EntityRef, child: &EntityRef) {
    child.borrow_mut().common_mut().parent = ParentLink::Group(Rc::downgrade(group));
    match &mut *group.borrow_mut() {
        LabelEntity::Group(g) => g.children.push(child.clone()),
        _ => panic!("group_add_child called on a non-group entity"),
    }
}

/// Remove `child` from `group`, leaving it detached.
///
/// Panics if the child is not present.
pub fn group_remove_child(group: &EntityRef, child: &EntityRef) {
    match &mut *group.borrow_mut() {
        LabelEntity::Group(g) => {
            let index = g
                .children
                .iter()
                .position(|c| Rc::ptr_eq(c, child))
                .unwrap_or_else(|| panic!("attempting to remove child that is not present"));
            g.children.remove(index);
        }
        _ => panic!("group_remove_child called on a non-group entity"),
    }
    child.borrow_mut().common_mut().parent = ParentLink::Detached;
}

/// Detach and return all of a group's children.
pub fn group_take_children(group: &EntityRef) -> Vec<EntityRef> {
    let children = match &mut *group.borrow_mut() {
        LabelEntity::Group(g) => std::mem::take(&mut g.children),
        _ => Vec::new(),
    };
    for child in &children {
        child.borrow_mut().common_mut().parent = ParentLink::Detached;
    }
    children
}

/// Take the child models a freshly built group is still holding; they are
/// turned into entities when the group attaches to a view.
pub fn group_take_pending_models(group: &EntityRef) -> Vec<LabelModel> {
    match &mut *group.borrow_mut() {
        LabelEntity::Group(g) => std::mem::take(&mut g.pending_models),
        _ => Vec::new(),
    }
}
