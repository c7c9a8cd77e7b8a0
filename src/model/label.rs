//! Label models and the label document.
//!
//! Models are the persistent form of a label: plain data, serialized as JSON
//! with a `label_type` tag. The live entity layer wraps these.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::AnnoResult;
use crate::math::Point2;

/// Source tag for labels drawn by hand.
pub const SOURCE_MANUAL: &str = "manual";

// ============================================================================
// Shared metadata
// ============================================================================

/// Fields common to every label model.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LabelMeta {
    /// Classification, or `None` for an unclassified label.
    #[serde(default)]
    pub label_class: Option<String>,

    /// Provenance: [`SOURCE_MANUAL`] or `"auto:<algorithm>"`.
    #[serde(default = "default_source")]
    pub source: String,

    /// Free-form per-label annotation data attached by the host.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub anno_data: Map<String, Value>,

    /// Session-unique id, assigned when the label is registered.
    #[serde(default)]
    pub object_id: Option<u64>,
}

fn default_source() -> String {
    SOURCE_MANUAL.to_string()
}

impl LabelMeta {
    pub fn new(label_class: Option<String>, source: &str) -> Self {
        LabelMeta {
            label_class,
            source: source.to_string(),
            anno_data: Map::new(),
            object_id: None,
        }
    }
}

// ============================================================================
// Concrete label models
// ============================================================================

/// Wire form of a polygon label; accepts the legacy single-ring `vertices`
/// field as well as the current `regions` field.
#[derive(Deserialize)]
struct PolygonLabelWire {
    #[serde(flatten)]
    meta: LabelMeta,
    #[serde(default)]
    regions: Option<Vec<Vec<Point2>>>,
    #[serde(default)]
    vertices: Option<Vec<Point2>>,
}

/// A polygonal label: a list of rings combined with even-odd parity, so a
/// ring nested inside another forms a hole.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(from = "PolygonLabelWire")]
pub struct PolygonLabel {
    #[serde(flatten)]
    pub meta: LabelMeta,
    pub regions: Vec<Vec<Point2>>,
}

impl From<PolygonLabelWire> for PolygonLabel {
    fn from(wire: PolygonLabelWire) -> Self {
        let regions = match (wire.regions, wire.vertices) {
            (Some(regions), _) => regions,
            (None, Some(vertices)) => vec![vertices],
            (None, None) => Vec::new(),
        };
        PolygonLabel {
            meta: wire.meta,
            regions,
        }
    }
}

/// An oriented ellipse label.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OrientedEllipseLabel {
    #[serde(flatten)]
    pub meta: LabelMeta,
    pub centre: Point2,
    pub radius1: f64,
    pub radius2: f64,
    pub orientation_radians: f64,
}

/// A composite label: marks the joint centroid of other labels, referenced
/// weakly by object id.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CompositeLabel {
    #[serde(flatten)]
    pub meta: LabelMeta,
    #[serde(default)]
    pub components: Vec<u64>,
}

/// A group label: owns its child labels outright.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GroupLabel {
    #[serde(flatten)]
    pub meta: LabelMeta,
    #[serde(default)]
    pub component_models: Vec<LabelModel>,
}

/// Any label model, tagged by `label_type` on the wire.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "label_type", rename_all = "snake_case")]
pub enum LabelModel {
    Polygon(PolygonLabel),
    OrientedEllipse(OrientedEllipseLabel),
    Composite(CompositeLabel),
    Group(GroupLabel),
}

impl LabelModel {
    /// New empty polygon model.
    pub fn new_polygon(label_class: Option<String>, source: &str) -> Self {
        LabelModel::Polygon(PolygonLabel {
            meta: LabelMeta::new(label_class, source),
            regions: Vec::new(),
        })
    }

    /// New oriented ellipse model.
    pub fn new_oriented_ellipse(
        label_class: Option<String>,
        source: &str,
        centre: Point2,
    ) -> Self {
        LabelModel::OrientedEllipse(OrientedEllipseLabel {
            meta: LabelMeta::new(label_class, source),
            centre,
            radius1: 0.0,
            radius2: 0.0,
            orientation_radians: 0.0,
        })
    }

    /// New composite model referencing the given object ids.
    pub fn new_composite(label_class: Option<String>, source: &str, components: Vec<u64>) -> Self {
        LabelModel::Composite(CompositeLabel {
            meta: LabelMeta::new(label_class, source),
            components,
        })
    }

    /// New group model owning the given child models.
    pub fn new_group(
        label_class: Option<String>,
        source: &str,
        component_models: Vec<LabelModel>,
    ) -> Self {
        LabelModel::Group(GroupLabel {
            meta: LabelMeta::new(label_class, source),
            component_models,
        })
    }

    pub fn meta(&self) -> &LabelMeta {
        match self {
            LabelModel::Polygon(m) => &m.meta,
            LabelModel::OrientedEllipse(m) => &m.meta,
            LabelModel::Composite(m) => &m.meta,
            LabelModel::Group(m) => &m.meta,
        }
    }

    pub fn meta_mut(&mut self) -> &mut LabelMeta {
        match self {
            LabelModel::Polygon(m) => &mut m.meta,
            LabelModel::OrientedEllipse(m) => &mut m.meta,
            LabelModel::Composite(m) => &mut m.meta,
            LabelModel::Group(m) => &mut m.meta,
        }
    }

    pub fn label_type(&self) -> &'static str {
        match self {
            LabelModel::Polygon(_) => "polygon",
            LabelModel::OrientedEllipse(_) => "oriented_ellipse",
            LabelModel::Composite(_) => "composite",
            LabelModel::Group(_) => "group",
        }
    }

    /// Visit this model's metadata and that of all nested child models.
    pub fn for_each_meta_mut(&mut self, f: &mut impl FnMut(&mut LabelMeta)) {
        f(self.meta_mut());
        if let LabelModel::Group(g) = self {
            for child in &mut g.component_models {
                child.for_each_meta_mut(f);
            }
        }
    }
}

// ============================================================================
// Label document
// ============================================================================

/// The per-image label document exchanged with the host.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct LabelDocument {
    #[serde(default)]
    pub image_id: String,

    /// Names of annotation tasks marked complete for this image.
    #[serde(default)]
    pub completed_tasks: Vec<String>,

    /// Top-level labels, in stacking order.
    #[serde(default)]
    pub labels: Vec<LabelModel>,
}

impl LabelDocument {
    pub fn new(image_id: &str) -> Self {
        LabelDocument {
            image_id: image_id.to_string(),
            completed_tasks: Vec::new(),
            labels: Vec::new(),
        }
    }

    pub fn from_json(json: &str) -> AnnoResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> AnnoResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

// ============================================================================
// Tests
// ============================================================================
