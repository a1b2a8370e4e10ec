//! Core record types: materials and the properties they own.
//!
//! A [`Material`] exclusively owns its [`Property`] list; removing a material
//! removes its properties with it. Identifiers are assigned by the store on
//! first save.

use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::value;

/// Store-assigned identifier of a material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct MaterialId(NonZeroU64);

impl MaterialId {
    /// Returns `None` if `raw` is zero.
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(MaterialId)
    }

    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl std::fmt::Display for MaterialId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "mat:{}", self.0)
    }
}

/// Store-assigned identifier of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct PropertyId(NonZeroU64);

impl PropertyId {
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(PropertyId)
    }

    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl std::fmt::Display for PropertyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "prop:{}", self.0)
    }
}

/// A named property value of a material.
///
/// `value_float` is present exactly when `value` classifies as numeric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: Option<PropertyId>,
    pub name: String,
    pub value: String,
    pub value_float: Option<f64>,
}

impl Property {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            id: None,
            name: name.into(),
            value_float: value::numeric(&value),
            value,
        }
    }
}

/// A chemical compound and its properties.
///
/// `elements`, `periods`, `groups` and `csv` are derived fields, refreshed by
/// [`crate::chem::prepare_for_save`] before every save. Between adding a
/// property and the next save, `csv` is stale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub id: Option<MaterialId>,
    pub compound: String,
    pub elements: String,
    pub periods: String,
    pub groups: String,
    pub csv: String,
    pub properties: Vec<Property>,
}

impl Material {
    /// A new, unsaved material with no properties.
    pub fn new(compound: impl Into<String>) -> Self {
        Self {
            id: None,
            compound: compound.into(),
            elements: String::new(),
            periods: String::new(),
            groups: String::new(),
            csv: String::new(),
            properties: Vec::new(),
        }
    }

    /// Append a property; it receives an id on the next save.
    pub fn add_property(&mut self, name: impl Into<String>, value: impl Into<String>) -> &Property {
        self.properties.push(Property::new(name, value));
        &self.properties[self.properties.len() - 1]
    }
}

impl std::fmt::Display for Material {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.compound)
    }
}

/// Thread-safe id allocator, monotonically increasing from 1.
#[derive(Debug)]
pub struct IdAllocator {
    next: AtomicU64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::starting_from(1)
    }

    /// Resume allocation after restoring persisted records.
    pub fn starting_from(start: u64) -> Self {
        Self {
            next: AtomicU64::new(start.max(1)),
        }
    }

    /// Allocate the next raw id.
    pub fn next_raw(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// Make sure future ids are strictly greater than `seen`.
    pub fn observe(&self, seen: u64) {
        self.next.fetch_max(seen.saturating_add(1), Ordering::Relaxed);
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
