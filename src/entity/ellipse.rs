//! Oriented ellipse label entities.

use crate::entity::EntityCommon;
use crate::math::OrientedEllipse;
use crate::model::OrientedEllipseLabel;

/// Live entity for an oriented ellipse label.
///
/// The model's five scalars fully describe the shape, so nothing is cached.
#[derive(Debug)]
pub struct OrientedEllipseEntity {
    pub model: OrientedEllipseLabel,
    pub common: EntityCommon,
}

impl OrientedEllipseEntity {
    pub fn new(model: OrientedEllipseLabel) -> Self {
        OrientedEllipseEntity {
            model,
            common: EntityCommon::default(),
        }
    }

    /// The geometric shape described by the model.
    pub fn shape(&self) -> OrientedEllipse {
        OrientedEllipse {
            centre: self.model.centre,
            radius1: self.model.radius1,
            radius2: self.model.radius2,
            orientation_rad: self.model.orientation_radians,
        }
    }
}
