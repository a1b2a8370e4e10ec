//! In-memory material store backed by DashMap.
//!
//! The fastest backend and the default when no data directory is
//! configured. All data is lost on process exit.

use dashmap::DashMap;

use crate::filter::FilterExpr;
use crate::model::{Material, MaterialId};
use crate::store::{Allocators, DEFAULT_MAX_COMPOUND_LEN, MaterialStore, StoreResult};

/// Concurrent in-memory store using a sharded hashmap.
#[derive(Debug)]
pub struct MemStore {
    data: DashMap<MaterialId, Material>,
    alloc: Allocators,
}

impl MemStore {
    pub fn new() -> Self {
        Self {
            data: DashMap::new(),
            alloc: Allocators::new(DEFAULT_MAX_COMPOUND_LEN),
        }
    }

    /// Override the compound length limit.
    pub fn with_max_compound_len(mut self, max: usize) -> Self {
        self.alloc.set_max_compound_len(max);
        self
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MaterialStore for MemStore {
    fn save(&self, material: &mut Material) -> StoreResult<MaterialId> {
        let id = self.alloc.prepare(material)?;
        self.data.insert(id, material.clone());
        Ok(id)
    }

    fn get(&self, id: MaterialId) -> StoreResult<Option<Material>> {
        Ok(self.data.get(&id).map(|entry| entry.value().clone()))
    }

    fn contains(&self, id: MaterialId) -> StoreResult<bool> {
        Ok(self.data.contains_key(&id))
    }

    fn execute(&self, filter: &FilterExpr) -> StoreResult<Vec<Material>> {
        let mut found: Vec<Material> = self
            .data
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        found.sort_by_key(|m| m.id);
        Ok(found)
    }

    fn remove(&self, id: MaterialId) -> StoreResult<Option<Material>> {
        Ok(self.data.remove(&id).map(|(_, m)| m))
    }

    fn len(&self) -> StoreResult<usize> {
        Ok(self.data.len())
    }

    fn max_compound_len(&self) -> usize {
        self.alloc.max_compound_len()
    }
}
