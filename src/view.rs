//! The root label view: the live counterpart of a label document.
//!
//! The view owns the entity registries, the top-level label list, the
//! selection and the object id table. Structure edits go through it so that
//! change events fire and registrations stay consistent. Hosts observe it
//! through a drained event queue rather than callbacks.

use std::collections::HashMap;
use std::rc::Rc;

use crate::dextr::PlaceholderRef;
use crate::entity::{
    EntityRef, LabelEntity, ParentLink, group_add_child, group_remove_child, group_take_children,
    group_take_pending_models, majority_label_class, new_entity_for_model,
};
use crate::model::{LabelDocument, LabelModel, ObjectIdTable};

/// Events emitted by the view, drained by the controller.
#[derive(Debug, Clone)]
pub enum ViewEvent {
    /// The selection changed (or was redundantly re-applied).
    SelectionChanged,
    /// The document structure changed; the host should pull a fresh
    /// document.
    RootListChanged,
    /// An entity was shut down and unregistered.
    EntityDeleted(EntityRef),
}

/// Live view over one image's label document.
pub struct RootLabelView {
    image_id: String,
    completed_tasks: Vec<String>,

    /// Every registered entity, top-level or nested.
    all_entities: Vec<EntityRef>,
    /// Top-level labels in stacking order.
    root_entities: Vec<EntityRef>,
    /// Selection, in selection order.
    selected_entities: Vec<EntityRef>,

    id_table: ObjectIdTable,
    id_to_entity: HashMap<u64, EntityRef>,

    placeholders: Vec<PlaceholderRef>,

    events: Vec<ViewEvent>,
    frozen_depth: u32,
    deferred_root_list_changed: bool,
}

impl RootLabelView {
    pub fn new() -> Self {
        RootLabelView {
            image_id: String::new(),
            completed_tasks: Vec::new(),
            all_entities: Vec::new(),
            root_entities: Vec::new(),
            selected_entities: Vec::new(),
            id_table: ObjectIdTable::new(),
            id_to_entity: HashMap::new(),
            placeholders: Vec::new(),
            events: Vec::new(),
            frozen_depth: 0,
            deferred_root_list_changed: false,
        }
    }

    // ========================================================================
    // Document loading and assembly
    // ========================================================================

    /// Replace the entire view contents with a new document.
    ///
    /// All existing entities are torn down, registries are reset, then the
    /// document's labels are seeded with object ids and rebuilt as entities.
    pub fn set_model(&mut self, doc: LabelDocument) {
        let old_roots = self.root_entities.clone();
        for entity in &old_roots {
            self.shutdown_entity(entity);
        }
        for placeholder in &self.placeholders {
            placeholder.borrow_mut().attached = false;
        }
        self.placeholders.clear();

        self.root_entities.clear();
        self.selected_entities.clear();
        self.all_entities.clear();
        self.id_to_entity.clear();
        self.id_table = ObjectIdTable::new();
        self.events.clear();
        self.frozen_depth = 0;
        self.deferred_root_list_changed = false;

        self.image_id = doc.image_id;
        self.completed_tasks = doc.completed_tasks;

        // Seed: preset ids advance the counter before any assignment happens,
        // so freshly assigned ids cannot collide with loaded ones.
        let mut labels = doc.labels;
        for label in &mut labels {
            label.for_each_meta_mut(&mut |meta| {
                if meta.object_id.is_some() {
                    self.id_table.register(meta);
                }
            });
        }

        for mut label in labels {
            let entity = self.get_or_create_entity_for_model(&mut label);
            self.register_child(&entity);
        }
    }

    /// Assemble a fresh document snapshot from the live entities.
    pub fn document(&self) -> LabelDocument {
        LabelDocument {
            image_id: self.image_id.clone(),
            completed_tasks: self.completed_tasks.clone(),
            labels: self.root_entities.iter().map(|e| e.borrow().to_model()).collect(),
        }
    }

    pub fn image_id(&self) -> &str {
        &self.image_id
    }

    pub fn completed_tasks(&self) -> &[String] {
        &self.completed_tasks
    }

    /// Mark an annotation task as complete or incomplete.
    pub fn set_task_complete(&mut self, task: &str, complete: bool) {
        let present = self.completed_tasks.iter().any(|t| t == task);
        if complete && !present {
            self.completed_tasks.push(task.to_string());
            self.root_list_changed();
        } else if !complete && present {
            self.completed_tasks.retain(|t| t != task);
            self.root_list_changed();
        }
    }

    // ========================================================================
    // Events and freezing
    // ========================================================================

    /// Drain pending events.
    pub fn take_events(&mut self) -> Vec<ViewEvent> {
        std::mem::take(&mut self.events)
    }

    /// Defer root-list-changed events until the matching [`thaw`](Self::thaw).
    pub fn freeze(&mut self) {
        self.frozen_depth += 1;
    }

    /// Undo one freeze; a deferred root-list-changed fires once the last
    /// freeze is released.
    pub fn thaw(&mut self) {
        self.frozen_depth = self.frozen_depth.saturating_sub(1);
        if self.frozen_depth == 0 && self.deferred_root_list_changed {
            self.deferred_root_list_changed = false;
            self.events.push(ViewEvent::RootListChanged);
        }
    }

    fn root_list_changed(&mut self) {
        if self.frozen_depth > 0 {
            self.deferred_root_list_changed = true;
        } else {
            self.events.push(ViewEvent::RootListChanged);
        }
    }

    /// Notify that an entity's model was edited in place. Fires a change
    /// event only for entities that are currently top-level labels.
    pub fn commit(&mut self, entity: &EntityRef) {
        if self.root_entities.iter().any(|e| Rc::ptr_eq(e, entity)) {
            self.root_list_changed();
        }
    }

    // ========================================================================
    // Selection
    // ========================================================================

    pub fn selection(&self) -> &[EntityRef] {
        &self.selected_entities
    }

    /// The sole selected entity, if exactly one is selected.
    pub fn get_selected_entity(&self) -> Option<EntityRef> {
        if self.selected_entities.len() == 1 {
            Some(self.selected_entities[0].clone())
        } else {
            None
        }
    }

    /// Select an entity.
    ///
    /// With `multi_select` the entity joins the selection (or, with
    /// `invert`, toggles in and out of it). Without it the entity replaces
    /// the selection; this fires a selection-changed event even when the
    /// entity was already the sole selection.
    pub fn select_entity(&mut self, entity: &EntityRef, multi_select: bool, invert: bool) {
        let multi_select = !self.selected_entities.is_empty() && multi_select;
        if multi_select {
            let index = self.selected_entities.iter().position(|e| Rc::ptr_eq(e, entity));
            let mut changed = false;
            match index {
                Some(i) if invert => {
                    self.selected_entities.remove(i);
                    entity.borrow_mut().set_selected(false);
                    changed = true;
                }
                None => {
                    self.selected_entities.push(entity.clone());
                    entity.borrow_mut().set_selected(true);
                    changed = true;
                }
                Some(_) => {}
            }
            if changed {
                self.events.push(ViewEvent::SelectionChanged);
            }
        } else {
            let already_sole = self.selected_entities.len() == 1
                && Rc::ptr_eq(&self.selected_entities[0], entity);
            if !already_sole {
                for selected in &self.selected_entities {
                    selected.borrow_mut().set_selected(false);
                }
                self.selected_entities.clear();
                self.selected_entities.push(entity.clone());
                entity.borrow_mut().set_selected(true);
            }
            self.events.push(ViewEvent::SelectionChanged);
        }
    }

    pub fn unselect_all_entities(&mut self) {
        for entity in &self.selected_entities {
            entity.borrow_mut().set_selected(false);
        }
        self.selected_entities.clear();
        self.events.push(ViewEvent::SelectionChanged);
    }

    /// Set the classification of one entity and commit the change.
    pub fn set_entity_label_class(&mut self, entity: &EntityRef, label_class: Option<String>) {
        entity.borrow_mut().set_label_class(label_class);
        self.commit(entity);
    }

    /// Set the classification of every selected entity.
    pub fn set_selection_label_class(&mut self, label_class: Option<String>) {
        let selection = self.selected_entities.clone();
        for entity in &selection {
            self.set_entity_label_class(entity, label_class.clone());
        }
    }

    // ========================================================================
    // Entity registration
    // ========================================================================

    /// All registered entities, nested ones included.
    pub fn all_entities(&self) -> &[EntityRef] {
        &self.all_entities
    }

    /// Top-level entities in stacking order.
    pub fn root_entities(&self) -> &[EntityRef] {
        &self.root_entities
    }

    pub fn entity_for_object_id(&self, object_id: u64) -> Option<EntityRef> {
        self.id_to_entity.get(&object_id).cloned()
    }

    /// Look up the live entity for a model by object id, creating, attaching
    /// and registering one if the model has none yet. A freshly assigned id
    /// is copied back into the caller's model, so repeated calls with the
    /// same model return the same entity.
    pub fn get_or_create_entity_for_model(&mut self, model: &mut LabelModel) -> EntityRef {
        if let Some(id) = model.meta().object_id
            && let Some(existing) = self.id_to_entity.get(&id)
        {
            return existing.clone();
        }
        let entity = new_entity_for_model(model.clone());
        self.attach_entity(&entity);
        model.meta_mut().object_id = entity.borrow().object_id();
        entity
    }

    /// Register an entity with the view and mark it attached. Group children
    /// parked as pending models are built and linked here.
    pub fn attach_entity(&mut self, entity: &EntityRef) {
        self.register_entity(entity);
        entity.borrow_mut().common_mut().attached = true;
        let pending = group_take_pending_models(entity);
        for mut model in pending {
            let child = self.get_or_create_entity_for_model(&mut model);
            group_add_child(entity, &child);
        }
    }

    fn register_entity(&mut self, entity: &EntityRef) {
        self.all_entities.push(entity.clone());
        let id = {
            let mut e = entity.borrow_mut();
            self.id_table.register(e.meta_mut());
            e.object_id()
        };
        if let Some(id) = id {
            self.id_to_entity.insert(id, entity.clone());
        }
    }

    /// Unregister an entity, broadcasting the destruction of its model to
    /// every remaining entity before the id is released.
    ///
    /// Panics if the entity is not registered.
    fn unregister_entity(&mut self, entity: &EntityRef) {
        let index = self
            .all_entities
            .iter()
            .position(|e| Rc::ptr_eq(e, entity))
            .unwrap_or_else(|| panic!("attempting to unregister entity that is not registered"));

        if let Some(id) = entity.borrow().object_id() {
            let others: Vec<EntityRef> = self
                .all_entities
                .iter()
                .filter(|e| !Rc::ptr_eq(e, entity))
                .cloned()
                .collect();
            for other in &others {
                other.borrow_mut().notify_model_destroyed(id);
            }
            self.id_to_entity.remove(&id);
        }
        self.id_table.unregister(entity.borrow_mut().meta_mut());
        self.all_entities.remove(index);
    }

    /// Detach and unregister an entity (and, for groups, its children).
    pub fn shutdown_entity(&mut self, entity: &EntityRef) {
        let children: Vec<EntityRef> = match &*entity.borrow() {
            LabelEntity::Group(g) => g.children.clone(),
            _ => Vec::new(),
        };
        for child in &children {
            self.shutdown_entity(child);
        }
        entity.borrow_mut().common_mut().attached = false;
        self.unregister_entity(entity);
        self.events.push(ViewEvent::EntityDeleted(entity.clone()));
    }

    // ========================================================================
    // Top-level label list
    // ========================================================================

    fn register_child(&mut self, entity: &EntityRef) {
        self.root_entities.push(entity.clone());
        entity.borrow_mut().common_mut().parent = ParentLink::Root;
    }

    fn unregister_child(&mut self, entity: &EntityRef) {
        let index = self
            .root_entities
            .iter()
            .position(|e| Rc::ptr_eq(e, entity))
            .unwrap_or_else(|| panic!("attempting to remove root label that is not present"));
        self.root_entities.remove(index);

        if let Some(i) = self.selected_entities.iter().position(|e| Rc::ptr_eq(e, entity)) {
            self.selected_entities.remove(i);
            entity.borrow_mut().set_selected(false);
        }
        entity.borrow_mut().common_mut().parent = ParentLink::Detached;
    }

    /// Append an entity to the top-level label list.
    pub fn add_child(&mut self, entity: &EntityRef) {
        self.register_child(entity);
        self.root_list_changed();
    }

    /// Remove an entity from the top-level label list, leaving it attached
    /// but structurally detached.
    ///
    /// Panics if the entity is not a top-level label.
    pub fn remove_child(&mut self, entity: &EntityRef) {
        self.unregister_child(entity);
        self.root_list_changed();
    }

    // ========================================================================
    // Destruction
    // ========================================================================

    /// Destroy an entity: unlink it from its parent, promote any group
    /// children into its place, then shut it down.
    pub fn destroy_entity(&mut self, entity: &EntityRef) {
        let parent = entity.borrow().common().parent.clone();

        if entity.borrow().is_group() {
            let children = group_take_children(entity);
            for child in &children {
                match &parent {
                    ParentLink::Root => self.add_child(child),
                    ParentLink::Group(weak) => {
                        if let Some(group) = weak.upgrade() {
                            group_add_child(&group, child);
                        }
                    }
                    ParentLink::Detached => {}
                }
            }
        }

        match &parent {
            ParentLink::Root => self.remove_child(entity),
            ParentLink::Group(weak) => {
                if let Some(group) = weak.upgrade() {
                    group_remove_child(&group, entity);
                }
            }
            ParentLink::Detached => {}
        }

        self.shutdown_entity(entity);
    }

    /// Destroy every selected entity.
    pub fn delete_selection(&mut self) {
        let selection = self.selected_entities.clone();
        self.unselect_all_entities();
        for entity in &selection {
            self.destroy_entity(entity);
        }
    }

    // ========================================================================
    // Structure creation
    // ========================================================================

    /// Create a composite label referencing the selected entities by object
    /// id. Returns `None` for an empty selection.
    pub fn create_composite_label_from_selection(
        &mut self,
        label_class: Option<String>,
    ) -> Option<EntityRef> {
        if self.selected_entities.is_empty() {
            return None;
        }
        let components: Vec<u64> = self
            .selected_entities
            .iter()
            .filter_map(|e| e.borrow().object_id())
            .collect();
        let mut model =
            LabelModel::new_composite(label_class, crate::model::SOURCE_MANUAL, components);
        let entity = self.get_or_create_entity_for_model(&mut model);
        self.add_child(&entity);
        Some(entity)
    }

    /// Move the selected entities into a new group label. The children stay
    /// registered and keep their ids; only their place in the hierarchy
    /// changes. With no explicit `label_class` the group takes the class
    /// held by the majority of its components, ties going to the earliest.
    /// Returns `None` for an empty selection.
    pub fn create_group_label_from_selection(
        &mut self,
        label_class: Option<String>,
    ) -> Option<EntityRef> {
        let selection = self.selected_entities.clone();
        if selection.is_empty() {
            return None;
        }
        let label_class = label_class.or_else(|| majority_label_class(&selection));
        self.unselect_all_entities();

        let group = new_entity_for_model(LabelModel::new_group(
            label_class,
            crate::model::SOURCE_MANUAL,
            Vec::new(),
        ));
        self.attach_entity(&group);
        for child in &selection {
            self.remove_child(child);
            group_add_child(&group, child);
        }
        self.add_child(&group);
        Some(group)
    }

    // ========================================================================
    // Placeholders
    // ========================================================================

    /// Track a placeholder (an in-progress marker that is not a label).
    pub fn register_placeholder(&mut self, placeholder: &PlaceholderRef) {
        self.placeholders.push(placeholder.clone());
    }

    /// Stop tracking a placeholder.
    ///
    /// Panics if the placeholder is not registered.
    pub fn unregister_placeholder(&mut self, placeholder: &PlaceholderRef) {
        let index = self
            .placeholders
            .iter()
            .position(|p| Rc::ptr_eq(p, placeholder))
            .unwrap_or_else(|| {
                panic!("attempting to unregister placeholder that is not registered")
            });
        self.placeholders.remove(index);
    }

    pub fn placeholders(&self) -> &[PlaceholderRef] {
        &self.placeholders
    }
}

impl Default for RootLabelView {
    fn default() -> Self {
        RootLabelView::new()
    }
}
