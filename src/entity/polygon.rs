//! Polygonal label entities.

use crate::entity::{EntityCommon, EntityRef, majority_label_class};
use crate::math::{AABox, Point2, centroid_of, ring_edge_distance, rings_contain_point};
use crate::model::{LabelModel, PolygonLabel, SOURCE_MANUAL};
use crate::polyops;
use crate::view::RootLabelView;

/// Live entity for a multi-region polygon label.
///
/// Keeps a flattened copy of the model's rings for hit testing, along with a
/// cached centroid and bounding box; all three are rebuilt by
/// [`rebuild_caches`](Self::rebuild_caches) after any model edit.
#[derive(Debug)]
pub struct PolygonEntity {
    pub model: PolygonLabel,
    pub common: EntityCommon,
    hit_regions: Vec<Vec<Point2>>,
    cached_centroid: Option<Point2>,
    cached_box: Option<AABox>,
}

impl PolygonEntity {
    pub fn new(model: PolygonLabel) -> Self {
        let mut entity = PolygonEntity {
            model,
            common: EntityCommon::default(),
            hit_regions: Vec::new(),
            cached_centroid: None,
            cached_box: None,
        };
        entity.rebuild_caches();
        entity
    }

    pub fn rebuild_caches(&mut self) {
        self.hit_regions = self.model.regions.clone();
        let flat: Vec<Point2> = self.model.regions.iter().flatten().copied().collect();
        if flat.is_empty() {
            self.cached_centroid = None;
            self.cached_box = None;
        } else {
            self.cached_centroid = Some(centroid_of(&flat));
            self.cached_box = Some(AABox::from_points(&flat));
        }
    }

    pub fn centroid(&self) -> Option<Point2> {
        self.cached_centroid
    }

    pub fn bounding_box(&self) -> Option<AABox> {
        self.cached_box
    }

    pub fn contains_point(&self, p: Point2) -> bool {
        match self.cached_box {
            Some(b) if b.contains_point(p) => rings_contain_point(&self.hit_regions, p),
            _ => false,
        }
    }

    /// Zero inside the polygon, otherwise the distance to the nearest edge
    /// of any ring. `None` when the polygon has no geometry yet.
    pub fn distance_to_point(&self, p: Point2) -> Option<f64> {
        if self.hit_regions.is_empty() {
            return None;
        }
        if self.contains_point(p) {
            return Some(0.0);
        }
        let d = self
            .hit_regions
            .iter()
            .map(|ring| ring_edge_distance(ring, p))
            .fold(f64::INFINITY, f64::min);
        Some(d)
    }
}

/// Merge the currently selected polygon entities into one.
///
/// Requires at least two selected entities, all polygonal; otherwise the
/// selection is left untouched and `None` is returned. The merged label
/// takes the class held by a strict majority of the inputs, with ties going
/// to the earliest-selected contender. Inputs are destroyed and the merged
/// entity is added as a new top-level label.
pub fn merge_polygonal_labels(view: &mut RootLabelView) -> Option<EntityRef> {
    let selection: Vec<EntityRef> = view.selection().to_vec();
    if selection.len() <= 1 {
        return None;
    }
    if !selection.iter().all(|e| e.borrow().as_polygon().is_some()) {
        return None;
    }

    view.unselect_all_entities();

    let winner = majority_label_class(&selection);

    let region_sets: Vec<Vec<Vec<Point2>>> = selection
        .iter()
        .map(|e| {
            e.borrow()
                .as_polygon()
                .map(|p| p.model.regions.clone())
                .unwrap_or_default()
        })
        .collect();
    let merged = polyops::union_all(&region_sets);

    for entity in &selection {
        view.destroy_entity(entity);
    }

    let mut model = LabelModel::new_polygon(winner, SOURCE_MANUAL);
    if let LabelModel::Polygon(p) = &mut model {
        p.regions = merged;
    }
    let entity = view.get_or_create_entity_for_model(&mut model);
    view.add_child(&entity);
    Some(entity)
}
