//! Session-unique object id assignment.

use std::collections::HashSet;

use super::label::LabelMeta;

/// Assigns and tracks per-session object ids.
///
/// Ids start at 1 and only ever grow, so an id freed by unregistration is
/// never handed out again within the same session.
#[derive(Debug)]
pub struct ObjectIdTable {
    next_id: u64,
    registered: HashSet<u64>,
}

impl ObjectIdTable {
    pub fn new() -> Self {
        ObjectIdTable {
            next_id: 1,
            registered: HashSet::new(),
        }
    }

    /// Register a label's metadata. A label with no id is assigned the next
    /// free one; a label arriving with a preset id keeps it, and the counter
    /// advances past it.
    pub fn register(&mut self, meta: &mut LabelMeta) {
        match meta.object_id {
            Some(id) => {
                self.next_id = self.next_id.max(id + 1);
                self.registered.insert(id);
            }
            None => {
                let id = self.next_id;
                self.next_id += 1;
                meta.object_id = Some(id);
                self.registered.insert(id);
            }
        }
    }

    /// Drop a label's registration and clear its id. No-op for an
    /// unregistered label.
    pub fn unregister(&mut self, meta: &mut LabelMeta) {
        if let Some(id) = meta.object_id.take() {
            self.registered.remove(&id);
        }
    }

    pub fn contains(&self, id: u64) -> bool {
        self.registered.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.registered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }
}

impl Default for ObjectIdTable {
    fn default() -> Self {
        ObjectIdTable::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SOURCE_MANUAL;

    #[test]
    fn test_ids_start_at_one() {
        let mut table = ObjectIdTable::new();
        let mut meta = LabelMeta::new(None, SOURCE_MANUAL);
        table.register(&mut meta);
        assert_eq!(meta.object_id, Some(1));
    }

    #[test]
    fn test_preset_id_advances_counter() {
        let mut table = ObjectIdTable::new();
        let mut preset = LabelMeta::new(None, SOURCE_MANUAL);
        preset.object_id = Some(7);
        table.register(&mut preset);
        assert!(table.contains(7));

        let mut fresh = LabelMeta::new(None, SOURCE_MANUAL);
        table.register(&mut fresh);
        assert_eq!(fresh.object_id, Some(8));
    }

    #[test]
    fn test_no_reuse_after_unregister() {
        let mut table = ObjectIdTable::new();
        let mut a = LabelMeta::new(None, SOURCE_MANUAL);
        table.register(&mut a);
        let first = a.object_id.unwrap();
        table.unregister(&mut a);
        assert_eq!(a.object_id, None);
        assert!(!table.contains(first));

        let mut b = LabelMeta::new(None, SOURCE_MANUAL);
        table.register(&mut b);
        assert_ne!(b.object_id.unwrap(), first);
    }
}
