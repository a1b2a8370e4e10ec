//! Derived fields of a material, computed before every save.
//!
//! [`prepare_for_save`] is the single pre-save transformation: it parses the
//! compound, fills `elements`, `periods` and `groups`, and rebuilds the
//! flattened `csv` text fed to the full-text index. It touches no storage.

pub mod formula;
pub mod periodic;

use std::collections::BTreeSet;

use crate::error::DeriveError;
use crate::model::Material;

pub use formula::{Composition, parse_formula};

/// Comma-joined derived sets of a compound.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DerivedFields {
    /// Element symbols ordered by atomic number.
    pub elements: String,
    /// Periods, ascending.
    pub periods: String,
    /// Groups, ascending.
    pub groups: String,
}

/// Compute the derived sets of a compound formula.
pub fn derive(compound: &str) -> Result<DerivedFields, DeriveError> {
    let composition = parse_formula(compound)?;

    let mut elements: Vec<_> = composition.elements().collect();
    elements.sort_by_key(|el| el.number);
    elements.dedup();
    let periods: BTreeSet<u8> = elements.iter().map(|el| el.period).collect();
    let groups: BTreeSet<u8> = elements.iter().map(|el| el.group).collect();

    Ok(DerivedFields {
        elements: join(elements.iter().map(|el| el.symbol)),
        periods: join(periods),
        groups: join(groups),
    })
}

/// Flatten a material to one upload-style line: `compound,name1,value1,...`.
pub fn csv_projection(material: &Material) -> String {
    let mut fields = Vec::with_capacity(1 + 2 * material.properties.len());
    fields.push(material.compound.as_str());
    for property in &material.properties {
        fields.push(property.name.as_str());
        fields.push(property.value.as_str());
    }
    fields.join(",")
}

/// Refresh every derived field of `material` from its current state.
pub fn prepare_for_save(material: &mut Material) -> Result<(), DeriveError> {
    let derived = derive(&material.compound)?;
    material.elements = derived.elements;
    material.periods = derived.periods;
    material.groups = derived.groups;
    material.csv = csv_projection(material);
    Ok(())
}

fn join<T: ToString>(items: impl IntoIterator<Item = T>) -> String {
    items
        .into_iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(",")
}
