//! Result projection: stored materials → external records.
//!
//! A pure shape change. Order is preserved, nothing is filtered, and the
//! derived and cached fields stay internal.

use serde::{Deserialize, Serialize};

use crate::model::Material;

/// One property in the external representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordProperty {
    #[serde(rename = "propertyName")]
    pub name: String,
    #[serde(rename = "propertyValue")]
    pub value: String,
}

/// One material in the external representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub compound: String,
    pub properties: Vec<RecordProperty>,
}

impl From<&Material> for Record {
    fn from(material: &Material) -> Self {
        Self {
            compound: material.compound.clone(),
            properties: material
                .properties
                .iter()
                .map(|p| RecordProperty {
                    name: p.name.clone(),
                    value: p.value.clone(),
                })
                .collect(),
        }
    }
}

pub fn project(results: &[Material]) -> Vec<Record> {
    results.iter().map(Record::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_order_and_property_order() {
        let mut water = Material::new("H2O");
        water.add_property("mass", "18");
        water.add_property("phase", "liquid");
        let salt = Material::new("NaCl");

        let records = project(&[water, salt]);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].compound, "H2O");
        assert_eq!(records[0].properties[1].name, "phase");
        assert!(records[1].properties.is_empty());
    }

    #[test]
    fn serializes_with_wire_names() {
        let mut m = Material::new("TiO2");
        m.add_property("gap", "3.0");
        m.elements = "O,Ti".into();
        let json = serde_json::to_value(project(&[m])).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{
                "compound": "TiO2",
                "properties": [{"propertyName": "gap", "propertyValue": "3.0"}]
            }])
        );
    }

    #[test]
    fn empty_results_project_to_empty() {
        assert!(project(&[]).is_empty());
    }
}
