//! Storage collaborator for materials.
//!
//! Two backends implement [`MaterialStore`]:
//!
//! - [`MemStore`]: concurrent in-memory map (DashMap), lost on exit
//! - [`DurableStore`]: ACID transactions on disk (redb)
//!
//! Each `save` is one transaction. Properties are stored inside their
//! material's record, so removing a material removes its properties.

pub mod durable;
pub mod mem;

pub use durable::DurableStore;
pub use mem::MemStore;

use crate::error::StoreError;
use crate::filter::FilterExpr;
use crate::model::{IdAllocator, Material, MaterialId, PropertyId};

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Compound column width.
pub const DEFAULT_MAX_COMPOUND_LEN: usize = 100;

/// Persistence interface consumed by the engine.
pub trait MaterialStore: Send + Sync {
    /// Persist `material` and all of its properties.
    ///
    /// Assigns ids to the material and to any property saved for the first
    /// time, writing them back into `material`. Rejects an empty or
    /// over-long compound with [`StoreError::InvalidCompound`].
    fn save(&self, material: &mut Material) -> StoreResult<MaterialId>;

    /// Fetch a material by id.
    fn get(&self, id: MaterialId) -> StoreResult<Option<Material>>;

    /// Whether a material with this id is stored.
    fn contains(&self, id: MaterialId) -> StoreResult<bool> {
        Ok(self.get(id)?.is_some())
    }

    /// All materials satisfying `filter`, in ascending id order.
    fn execute(&self, filter: &FilterExpr) -> StoreResult<Vec<Material>>;

    /// Remove a material together with its properties.
    fn remove(&self, id: MaterialId) -> StoreResult<Option<Material>>;

    /// Number of stored materials.
    fn len(&self) -> StoreResult<usize>;

    /// Longest accepted compound, in characters.
    fn max_compound_len(&self) -> usize {
        DEFAULT_MAX_COMPOUND_LEN
    }

    fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }
}

/// Id allocation and compound checks shared by the backends.
#[derive(Debug)]
pub(crate) struct Allocators {
    materials: IdAllocator,
    properties: IdAllocator,
    max_compound_len: usize,
}

impl Allocators {
    pub(crate) fn new(max_compound_len: usize) -> Self {
        Self {
            materials: IdAllocator::new(),
            properties: IdAllocator::new(),
            max_compound_len,
        }
    }

    pub(crate) fn set_max_compound_len(&mut self, max: usize) {
        self.max_compound_len = max;
    }

    /// Resume past the ids of an already-stored material.
    pub(crate) fn observe(&self, material: &Material) {
        if let Some(id) = material.id {
            self.materials.observe(id.get());
        }
        for id in material.properties.iter().filter_map(|p| p.id) {
            self.properties.observe(id.get());
        }
    }

    pub(crate) fn max_compound_len(&self) -> usize {
        self.max_compound_len
    }

    /// Validate the compound and assign every missing id.
    pub(crate) fn prepare(&self, material: &mut Material) -> StoreResult<MaterialId> {
        check_compound(&material.compound, self.max_compound_len)?;

        let id = match material.id {
            Some(id) => id,
            None => next_id(&self.materials, MaterialId::new)?,
        };
        for property in material.properties.iter_mut().filter(|p| p.id.is_none()) {
            property.id = Some(next_id(&self.properties, PropertyId::new)?);
        }
        material.id = Some(id);
        Ok(id)
    }
}

/// Reject an empty compound or one longer than `max_len` characters.
pub fn check_compound(compound: &str, max_len: usize) -> StoreResult<()> {
    let trimmed = compound.trim();
    if trimmed.is_empty() {
        return Err(StoreError::InvalidCompound {
            compound: compound.to_string(),
            reason: "compound is empty".into(),
        });
    }
    let len = trimmed.chars().count();
    if len > max_len {
        return Err(StoreError::InvalidCompound {
            compound: compound.to_string(),
            reason: format!("compound is {len} characters long, the limit is {max_len}"),
        });
    }
    Ok(())
}

fn next_id<T>(alloc: &IdAllocator, make: impl Fn(u64) -> Option<T>) -> StoreResult<T> {
    make(alloc.next_raw()).ok_or(StoreError::Redb {
        message: "id allocator wrapped around".into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compound_limit_counts_characters() {
        // Three characters, four bytes.
        assert!(check_compound("H·O", 3).is_ok());
        assert!(check_compound("H·O2", 3).is_err());
        assert!(check_compound("  ", 3).is_err());
    }

    #[test]
    fn prepare_assigns_ids_once() {
        let alloc = Allocators::new(DEFAULT_MAX_COMPOUND_LEN);
        let mut m = Material::new("H2O");
        m.add_property("mass", "18");
        let id = alloc.prepare(&mut m).unwrap();
        assert_eq!(id.get(), 1);
        assert_eq!(m.properties[0].id.unwrap().get(), 1);

        m.add_property("density", "0.997");
        assert_eq!(alloc.prepare(&mut m).unwrap(), id);
        assert_eq!(m.properties[0].id.unwrap().get(), 1);
        assert_eq!(m.properties[1].id.unwrap().get(), 2);
    }

    #[test]
    fn prepare_rejects_bad_compounds() {
        let alloc = Allocators::new(5);
        let mut empty = Material::new("  ");
        assert!(matches!(
            alloc.prepare(&mut empty),
            Err(StoreError::InvalidCompound { .. })
        ));
        let mut long = Material::new("C6H12O6");
        assert!(matches!(
            alloc.prepare(&mut long),
            Err(StoreError::InvalidCompound { .. })
        ));
        assert!(long.id.is_none());
    }

    #[test]
    fn observe_resumes_allocation() {
        let alloc = Allocators::new(DEFAULT_MAX_COMPOUND_LEN);
        let mut stored = Material::new("H2O");
        stored.id = MaterialId::new(41);
        alloc.observe(&stored);
        let mut fresh = Material::new("NaCl");
        assert_eq!(alloc.prepare(&mut fresh).unwrap().get(), 42);
    }
}
