//! Label class definitions and lookup.

use serde::{Deserialize, Serialize};

/// Colour used when a label has no class or its class is unknown.
const UNKNOWN_CLASS_COLOUR: [u8; 3] = [0, 0, 0];

/// A named label classification.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LabelClass {
    /// Identifier stored in label models.
    pub name: String,
    /// Display name.
    pub human_name: String,
    /// Display colour as RGB.
    pub colour: [u8; 3],
}

impl LabelClass {
    pub fn new(name: &str, human_name: &str, colour: [u8; 3]) -> Self {
        LabelClass {
            name: name.to_string(),
            human_name: human_name.to_string(),
            colour,
        }
    }
}

/// Lookup interface the tools and controller use to resolve classes.
pub trait LabelClassRegistry {
    fn class_for(&self, name: &str) -> Option<&LabelClass>;

    /// Display colour for an optional class name; black for unclassified or
    /// unknown classes.
    fn colour_for(&self, name: Option<&str>) -> [u8; 3] {
        name.and_then(|n| self.class_for(n))
            .map(|c| c.colour)
            .unwrap_or(UNKNOWN_CLASS_COLOUR)
    }

    /// Class assigned to labels created by the tools.
    fn class_for_new_label(&self) -> Option<String>;
}

/// A fixed class list configured up front.
#[derive(Debug, Clone, Default)]
pub struct StaticClassRegistry {
    classes: Vec<LabelClass>,
    new_label_class: Option<String>,
}

impl StaticClassRegistry {
    pub fn new(classes: Vec<LabelClass>) -> Self {
        StaticClassRegistry {
            classes,
            new_label_class: None,
        }
    }

    /// Set the class applied to newly created labels.
    pub fn with_new_label_class(mut self, name: &str) -> Self {
        self.new_label_class = Some(name.to_string());
        self
    }

    pub fn set_new_label_class(&mut self, name: Option<String>) {
        self.new_label_class = name;
    }

    pub fn classes(&self) -> &[LabelClass] {
        &self.classes
    }
}

impl LabelClassRegistry for StaticClassRegistry {
    fn class_for(&self, name: &str) -> Option<&LabelClass> {
        self.classes.iter().find(|c| c.name == name)
    }

    fn class_for_new_label(&self) -> Option<String> {
        self.new_label_class.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colour_lookup() {
        let registry = StaticClassRegistry::new(vec![
            LabelClass::new("tree", "Tree", [0, 255, 0]),
            LabelClass::new("building", "Building", [128, 128, 128]),
        ]);
        assert_eq!(registry.colour_for(Some("tree")), [0, 255, 0]);
        assert_eq!(registry.colour_for(Some("lake")), [0, 0, 0]);
        assert_eq!(registry.colour_for(None), [0, 0, 0]);
    }

    #[test]
    fn test_new_label_class() {
        let registry = StaticClassRegistry::new(vec![LabelClass::new("tree", "Tree", [0, 255, 0])])
            .with_new_label_class("tree");
        assert_eq!(registry.class_for_new_label().as_deref(), Some("tree"));
    }
}
