//! annolab: the interaction core of an image annotation editor.
//!
//! Provides the label document model, live label entities, the root label
//! view with selection and change tracking, and the editing tool state
//! machines, all independent of any rendering or I/O. Hosts feed pointer
//! and keyboard events into a [`Labeller`] and pull document snapshots back
//! out.

pub mod constants;
pub mod controller;
pub mod dextr;
pub mod entity;
pub mod error;
pub mod math;
pub mod model;
pub mod polyops;
pub mod tools;
pub mod view;

#[cfg(test)]
mod tests;

pub use controller::{ImageData, Labeller, SelectionChangedHook};
pub use error::{AnnoError, AnnoResult};
pub use math::{AABox, Point2};
pub use model::{
    LabelClass, LabelClassRegistry, LabelDocument, LabelModel, StaticClassRegistry,
};
pub use tools::{Key, Mods, ToolKind, ToolSettings};
pub use view::RootLabelView;
