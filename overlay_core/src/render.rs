//! Renderer registration.

use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

use crate::{EntityId, PathingEntity};

/// The world renderer as seen by the pack state: it only holds registrations.
pub trait WorldRenderer: Send + Sync {
    /// Start drawing an entity.
    fn add_entity(&self, entity: Arc<dyn PathingEntity>);

    /// Stop drawing every given entity.
    fn remove_entities(&self, entities: &[Arc<dyn PathingEntity>]);
}

/// In-memory renderer registry for headless hosts.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    entities: Mutex<Vec<Arc<dyn PathingEntity>>>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered entities.
    pub fn len(&self) -> usize {
        self.entities.lock().len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entities.lock().is_empty()
    }

    /// Whether an entity with this id is registered.
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.lock().iter().any(|e| e.id() == id)
    }

    /// Visit every registered entity, e.g. to draw it.
    pub fn for_each(&self, mut f: impl FnMut(&dyn PathingEntity)) {
        for entity in self.entities.lock().iter() {
            f(entity.as_ref());
        }
    }
}

impl WorldRenderer for EntityRegistry {
    fn add_entity(&self, entity: Arc<dyn PathingEntity>) {
        self.entities.lock().push(entity);
    }

    /// Matches by allocation, not id, so duplicate pack GUIDs stay distinct.
    fn remove_entities(&self, entities: &[Arc<dyn PathingEntity>]) {
        let removed: HashSet<*const ()> = entities.iter().map(entity_address).collect();

        self.entities
            .lock()
            .retain(|registered| !removed.contains(&entity_address(registered)));
    }
}

fn entity_address(entity: &Arc<dyn PathingEntity>) -> *const () {
    Arc::as_ptr(entity) as *const ()
}
