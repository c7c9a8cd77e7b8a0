//! Serializable label data: models, documents, classes and object ids.

mod class;
mod label;
mod object_id;

pub use class::{LabelClass, LabelClassRegistry, StaticClassRegistry};
pub use label::{
    CompositeLabel, GroupLabel, LabelDocument, LabelMeta, LabelModel, OrientedEllipseLabel,
    PolygonLabel, SOURCE_MANUAL,
};
pub use object_id::ObjectIdTable;
