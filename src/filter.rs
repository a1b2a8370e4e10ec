//! Storage-agnostic filter expressions compiled from search documents.
//!
//! A [`FilterExpr`] is a conjunction of constraints. Stores may translate it
//! into their own query language; the bundled stores evaluate it directly
//! through [`FilterExpr::matches`].

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::{Material, MaterialId, Property};
use crate::operator::Operator;

/// How a property's value is tested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValuePredicate {
    /// Compare the textual `value` field.
    Text { op: Operator, value: String },
    /// Compare the `value_float` field; properties without one never match.
    Numeric { op: Operator, value: f64 },
}

impl ValuePredicate {
    pub fn matches(&self, property: &Property) -> bool {
        match self {
            ValuePredicate::Text { op, value } => op.compare_text(&property.value, value),
            ValuePredicate::Numeric { op, value } => property
                .value_float
                .is_some_and(|stored| op.compare_f64(stored, *value)),
        }
    }
}

/// A composable filter over materials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterExpr {
    /// Every material.
    All,
    /// Every sub-expression must hold.
    And(Vec<FilterExpr>),
    /// Textual test on the compound formula.
    Compound { op: Operator, value: String },
    /// Identity is one of these ids.
    IdIn(BTreeSet<MaterialId>),
    /// At least one property whose name contains `name`, ignoring case, has
    /// a value satisfying `predicate`. Name and value are tested on the same
    /// property.
    HasProperty {
        name: String,
        predicate: ValuePredicate,
    },
}

impl FilterExpr {
    /// Conjoin two expressions, flattening nested `And`s and dropping `All`.
    pub fn and(self, other: FilterExpr) -> FilterExpr {
        match (self, other) {
            (FilterExpr::All, e) | (e, FilterExpr::All) => e,
            (FilterExpr::And(mut left), FilterExpr::And(right)) => {
                left.extend(right);
                FilterExpr::And(left)
            }
            (FilterExpr::And(mut left), e) => {
                left.push(e);
                FilterExpr::And(left)
            }
            (e, FilterExpr::And(mut right)) => {
                right.insert(0, e);
                FilterExpr::And(right)
            }
            (a, b) => FilterExpr::And(vec![a, b]),
        }
    }

    /// Number of leaf constraints.
    pub fn constraint_count(&self) -> usize {
        match self {
            FilterExpr::All => 0,
            FilterExpr::And(parts) => parts.iter().map(FilterExpr::constraint_count).sum(),
            _ => 1,
        }
    }

    /// Evaluate against a stored material.
    pub fn matches(&self, material: &Material) -> bool {
        match self {
            FilterExpr::All => true,
            FilterExpr::And(parts) => parts.iter().all(|part| part.matches(material)),
            FilterExpr::Compound { op, value } => op.compare_text(&material.compound, value),
            FilterExpr::IdIn(ids) => material.id.is_some_and(|id| ids.contains(&id)),
            FilterExpr::HasProperty { name, predicate } => {
                let name = name.to_lowercase();
                material
                    .properties
                    .iter()
                    .any(|p| p.name.to_lowercase().contains(&name) && predicate.matches(p))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn material(compound: &str, props: &[(&str, &str)]) -> Material {
        let mut m = Material::new(compound);
        m.id = MaterialId::new(1);
        for (name, value) in props {
            m.add_property(*name, *value);
        }
        m
    }

    fn has(name: &str, predicate: ValuePredicate) -> FilterExpr {
        FilterExpr::HasProperty {
            name: name.into(),
            predicate,
        }
    }

    #[test]
    fn and_flattens_and_drops_all() {
        let a = FilterExpr::Compound {
            op: Operator::Equals,
            value: "H2O".into(),
        };
        assert_eq!(FilterExpr::All.and(a.clone()), a);
        let e = a.clone().and(a.clone()).and(a.clone());
        assert_eq!(e.constraint_count(), 3);
        assert!(matches!(e, FilterExpr::And(ref v) if v.len() == 3));
    }

    #[test]
    fn compound_filter_ignores_case() {
        let m = material("NaCl", &[]);
        let eq = FilterExpr::Compound {
            op: Operator::Equals,
            value: "nacl".into(),
        };
        let contains = FilterExpr::Compound {
            op: Operator::Contains,
            value: "CL".into(),
        };
        assert!(eq.matches(&m));
        assert!(contains.matches(&m));
    }

    #[test]
    fn numeric_predicate_uses_float_field() {
        let heavy = material("H2O", &[("mass", "20")]);
        let light = material("H2O", &[("mass", "10")]);
        let text = material("H2O", &[("mass", "heavy")]);
        let f = has(
            "Mass",
            ValuePredicate::Numeric {
                op: Operator::Greater,
                value: 18.0,
            },
        );
        assert!(f.matches(&heavy));
        assert!(!f.matches(&light));
        assert!(!f.matches(&text));
    }

    #[test]
    fn name_and_value_bind_to_same_property() {
        let m = material("H2O", &[("mass", "cubic"), ("structure", "18")]);
        let f = has(
            "mass",
            ValuePredicate::Numeric {
                op: Operator::Equals,
                value: 18.0,
            },
        );
        assert!(!f.matches(&m));
    }

    #[test]
    fn separate_constraints_may_match_different_properties() {
        let m = material("H2O", &[("mass", "18"), ("structure", "hexagonal")]);
        let f = has(
            "mass",
            ValuePredicate::Numeric {
                op: Operator::Equals,
                value: 18.0,
            },
        )
        .and(has(
            "structure",
            ValuePredicate::Text {
                op: Operator::Contains,
                value: "HEX".into(),
            },
        ));
        assert!(f.matches(&m));
    }

    #[test]
    fn property_name_matches_as_substring() {
        let si = material("Si", &[("band gap", "1.1")]);
        let gap = ValuePredicate::Numeric {
            op: Operator::Greater,
            value: 1.0,
        };
        assert!(has("gap", gap.clone()).matches(&si));
        assert!(has("BAND", gap.clone()).matches(&si));
        assert!(!has("band gaps", gap).matches(&si));
    }

    #[test]
    fn id_set_membership() {
        let m = material("H2O", &[]);
        let ids: BTreeSet<_> = [MaterialId::new(1).unwrap()].into();
        assert!(FilterExpr::IdIn(ids).matches(&m));
        assert!(!FilterExpr::IdIn(BTreeSet::new()).matches(&m));
    }
}
