//! Process-lifetime cache of resolved entity configurations, keyed by record type.

use crate::config::{resolve, Entity, EntityConfiguration};
use crate::error::ConfigError;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

type Resolved = Result<Arc<dyn Any + Send + Sync>, ConfigError>;

/// Resolves each entity type at most once and hands out the shared result.
///
/// Owned by the caller's composition root and shared as `Arc<SchemaRegistry>`. Every type
/// gets its own slot; concurrent first callers for a type block on that slot until the
/// single resolution finishes, and a resolution error is replayed to every caller.
#[derive(Default)]
pub struct SchemaRegistry {
    slots: Mutex<HashMap<TypeId, Arc<OnceLock<Resolved>>>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn configuration<E: Entity>(&self) -> Result<Arc<EntityConfiguration<E>>, ConfigError> {
        let slot = self.slot(TypeId::of::<E>());
        let resolved = slot.get_or_init(|| {
            resolve::<E>().map(|config| Arc::new(config) as Arc<dyn Any + Send + Sync>)
        });
        match resolved {
            Ok(any) => Arc::clone(any)
                .downcast::<EntityConfiguration<E>>()
                .map_err(|_| {
                    ConfigError::Validation(format!(
                        "cached configuration for '{}' has an unexpected type",
                        std::any::type_name::<E>()
                    ))
                }),
            Err(e) => Err(e.clone()),
        }
    }

    /// Whether a resolution (successful or not) has completed for `E`.
    pub fn contains<E: Entity>(&self) -> bool {
        self.lock()
            .get(&TypeId::of::<E>())
            .is_some_and(|slot| slot.get().is_some())
    }

    /// Number of types with a started or completed resolution.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, type_id: TypeId) -> Arc<OnceLock<Resolved>> {
        Arc::clone(self.lock().entry(type_id).or_default())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<TypeId, Arc<OnceLock<Resolved>>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
